//! Basic usage example for `ManualVec`.
//!
//! This example demonstrates how the container grows, how insertion and removal shift
//! elements, and how reservation and resizing interact with capacity.

use manual_vec::ManualVec;

fn main() {
    let mut numbers = ManualVec::new();

    println!("Created ManualVec with capacity: {}", numbers.capacity());

    // Capacity doubles whenever the buffer is full.
    for value in 1..=9 {
        numbers.push(value * 10);
        println!(
            "Pushed {:>3} -> len {}, capacity {}",
            value * 10,
            numbers.len(),
            numbers.capacity()
        );
    }

    numbers.insert(0, 5);
    println!("After inserting 5 at the front: {numbers:?}");

    let removed = numbers.remove(4);
    println!("Removed {removed} from position 4: {numbers:?}");

    // Reservation is exact and never shrinks.
    numbers.reserve(100);
    println!("After reserve(100): capacity {}", numbers.capacity());

    numbers.reserve(10);
    println!("After reserve(10): capacity {}", numbers.capacity());

    // Resizing fills with default values or drops the tail, keeping the capacity.
    numbers.resize(12);
    println!("After resize(12): {numbers:?}");

    numbers.resize(3);
    println!(
        "After resize(3): {numbers:?} (capacity still {})",
        numbers.capacity()
    );

    // The container dereferences to a slice.
    let total: i32 = numbers.iter().sum();
    println!("Sum of remaining elements: {total}");

    while let Some(value) = numbers.pop() {
        println!("Popped {value}");
    }

    println!("Empty: {}", numbers.is_empty());
}
