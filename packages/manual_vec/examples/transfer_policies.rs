//! Demonstrates the two transfer policies of `ManualVec`.
//!
//! With `MoveElements`, growing the buffer relocates elements bitwise and can never fail
//! part-way. With `CloneElements`, elements are cloned into the new buffer and the originals
//! are only dropped once every clone has succeeded. If a clone panics, the container is left
//! exactly as it was.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use manual_vec::{CloneElements, ManualVec};

/// A ticket that counts how many times it has been cloned and can refuse to be cloned.
#[derive(Debug)]
struct Ticket {
    number: u32,
    clones: Rc<Cell<u32>>,
    refuse_clone: Rc<Cell<bool>>,
}

impl Clone for Ticket {
    fn clone(&self) -> Self {
        assert!(!self.refuse_clone.get(), "ticket {} refused to be cloned", self.number);
        self.clones.set(self.clones.get().wrapping_add(1));

        Self {
            number: self.number,
            clones: Rc::clone(&self.clones),
            refuse_clone: Rc::clone(&self.refuse_clone),
        }
    }
}

fn main() {
    let clones = Rc::new(Cell::new(0));
    let refuse_clone = Rc::new(Cell::new(false));

    let ticket = |number| Ticket {
        number,
        clones: Rc::clone(&clones),
        refuse_clone: Rc::clone(&refuse_clone),
    };

    println!("=== MoveElements (default) ===");

    let mut moving = ManualVec::new();
    for number in 0..8 {
        moving.push(ticket(number));
    }

    println!(
        "Pushed {} tickets, capacity {}, clones made: {}",
        moving.len(),
        moving.capacity(),
        clones.get()
    );

    println!();
    println!("=== CloneElements ===");

    let mut cloning: ManualVec<Ticket, CloneElements> =
        ManualVec::builder().clone_on_transfer().build();
    for number in 0..8 {
        cloning.push(ticket(number));
    }

    println!(
        "Pushed {} tickets, capacity {}, clones made so far: {}",
        cloning.len(),
        cloning.capacity(),
        clones.get()
    );

    // The buffer is full, so the next insertion must reallocate and clone every element.
    refuse_clone.set(true);

    // Keep the expected panic message out of the example output.
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        cloning.insert(4, ticket(100));
    }));

    panic::set_hook(default_hook);

    println!("Insertion with refusing clones failed: {}", result.is_err());
    println!(
        "Container unchanged: len {}, capacity {}, numbers {:?}",
        cloning.len(),
        cloning.capacity(),
        cloning.iter().map(|ticket| ticket.number).collect::<Vec<_>>()
    );

    refuse_clone.set(false);
    cloning.insert(4, ticket(100));

    println!(
        "Insertion after clones are allowed again: len {}, capacity {}, numbers {:?}",
        cloning.len(),
        cloning.capacity(),
        cloning.iter().map(|ticket| ticket.number).collect::<Vec<_>>()
    );
}
