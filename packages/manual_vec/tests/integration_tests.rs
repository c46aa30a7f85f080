//! Integration tests for `manual_vec` exercising the public API end to end.

#![allow(
    clippy::indexing_slicing,
    clippy::modulo_arithmetic,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::thread;

use manual_vec::{AllocError, CloneElements, ManualVec, RawStorage};

/// Element that panics when cloned while the shared switch is on.
#[derive(Debug)]
struct Fragile {
    id: u32,
    fail_clones: Rc<Cell<bool>>,
    live: Rc<Cell<isize>>,
}

impl Fragile {
    fn new(id: u32, fail_clones: &Rc<Cell<bool>>, live: &Rc<Cell<isize>>) -> Self {
        live.set(live.get().wrapping_add(1));

        Self {
            id,
            fail_clones: Rc::clone(fail_clones),
            live: Rc::clone(live),
        }
    }
}

impl Clone for Fragile {
    fn clone(&self) -> Self {
        assert!(!self.fail_clones.get(), "clone refused");
        Self::new(self.id, &self.fail_clones, &self.live)
    }
}

impl Drop for Fragile {
    fn drop(&mut self) {
        self.live.set(self.live.get().wrapping_sub(1));
    }
}

fn ids<P>(vec: &ManualVec<Fragile, P>) -> Vec<u32> {
    vec.iter().map(|item| item.id).collect()
}

#[test]
fn push_insert_remove_resize_walkthrough() {
    let mut vec = ManualVec::<i64>::new();

    vec.push(10);
    vec.push(20);
    vec.push(30);
    assert_eq!(vec, [10, 20, 30]);

    vec.insert(1, 99);
    assert_eq!(vec, [10, 99, 20, 30]);

    vec.remove(0);
    assert_eq!(vec, [99, 20, 30]);

    vec.resize(5);
    assert_eq!(vec, [99, 20, 30, 0, 0]);

    let capacity = vec.capacity();
    vec.resize(1);
    assert_eq!(vec, [99]);
    assert_eq!(vec.capacity(), capacity);
}

#[test]
fn strings_survive_many_reallocations() {
    let mut vec = ManualVec::new();

    for index in 0..1000 {
        vec.push(format!("item-{index}"));

        if index % 100 == 0 {
            vec.insert(0, format!("marker-{index}"));
        }
    }

    assert_eq!(vec.len(), 1010);
    assert_eq!(vec[0], "marker-900");
    assert_eq!(vec.last().map(String::as_str), Some("item-999"));

    let markers = vec.iter().filter(|item| item.starts_with("marker-")).count();
    assert_eq!(markers, 10);
}

#[test]
fn clone_policy_keeps_container_intact_when_growth_fails() {
    let fail_clones = Rc::new(Cell::new(false));
    let live = Rc::new(Cell::new(0_isize));

    let mut vec: ManualVec<Fragile, CloneElements> =
        ManualVec::builder().clone_on_transfer().capacity(3).build();

    for id in 0..3 {
        vec.push(Fragile::new(id, &fail_clones, &live));
    }
    assert_eq!(vec.len(), vec.capacity());

    let ptr = vec.as_ptr();
    fail_clones.set(true);

    let insert = panic::catch_unwind(AssertUnwindSafe(|| {
        vec.insert(1, Fragile::new(100, &fail_clones, &live));
    }));
    let reserve = panic::catch_unwind(AssertUnwindSafe(|| vec.reserve(10)));
    let push = panic::catch_unwind(AssertUnwindSafe(|| {
        vec.push(Fragile::new(200, &fail_clones, &live));
    }));

    assert!(insert.is_err());
    assert!(reserve.is_err());
    assert!(push.is_err());

    assert_eq!(ids(&vec), [0, 1, 2]);
    assert_eq!(vec.capacity(), 3);
    assert_eq!(vec.as_ptr(), ptr);
    assert_eq!(live.get(), 3);

    fail_clones.set(false);
    vec.insert(1, Fragile::new(100, &fail_clones, &live));

    assert_eq!(ids(&vec), [0, 100, 1, 2]);
    assert_eq!(vec.capacity(), 6);
    assert_eq!(live.get(), 4);

    drop(vec);
    assert_eq!(live.get(), 0);
}

#[test]
fn move_policy_grows_even_when_clones_would_fail() {
    let fail_clones = Rc::new(Cell::new(true));
    let live = Rc::new(Cell::new(0_isize));

    let mut vec = ManualVec::new();

    for id in 0..20 {
        vec.insert(0, Fragile::new(id, &fail_clones, &live));
    }

    assert_eq!(vec.len(), 20);
    assert_eq!(vec[0].id, 19);
    assert_eq!(live.get(), 20);

    drop(vec);
    assert_eq!(live.get(), 0);
}

#[test]
fn failed_reservation_reports_error_and_changes_nothing() {
    let mut vec: ManualVec<u128> = [1, 2, 3].into();

    let error = vec
        .try_reserve(usize::MAX / 8)
        .expect_err("reservation of this size cannot succeed");

    assert_eq!(
        error,
        AllocError::CapacityOverflow {
            requested: usize::MAX / 8
        }
    );
    assert_eq!(vec, [1, 2, 3]);
    assert_eq!(vec.capacity(), 3);
}

#[test]
fn clone_and_assign_are_independent() {
    let original: ManualVec<String> = ["a".to_string(), "b".to_string(), "c".to_string()].into();

    let mut assigned = ManualVec::<String>::with_capacity(10);
    assigned.push("old".to_string());
    assigned.clone_from(&original);

    let mut copy = original.clone();
    copy[1].push_str("-changed");
    assigned.clear();

    assert_eq!(original, ["a", "b", "c"]);
    assert_eq!(copy, ["a", "b-changed", "c"]);
    assert!(assigned.is_empty());
    assert_eq!(assigned.capacity(), 10);
}

#[test]
fn owning_iteration_drains_everything() {
    let vec: ManualVec<String> = (0..5).map(|index| index.to_string()).collect();

    let reversed: Vec<String> = vec.into_iter().rev().collect();

    assert_eq!(reversed, ["4", "3", "2", "1", "0"]);
}

#[test]
fn container_moves_between_threads() {
    let vec: ManualVec<u64> = (1..=100).collect();

    let sum = thread::spawn(move || vec.iter().sum::<u64>())
        .join()
        .expect("summing thread completed successfully");

    assert_eq!(sum, 5050);
}

#[test]
fn raw_storage_hands_over_block_to_new_owner() {
    let mut storage = RawStorage::<u32>::with_capacity(8);
    let ptr = storage.as_ptr();

    let taken = storage.take();

    assert_eq!(taken.as_ptr(), ptr);
    assert_eq!(taken.capacity(), 8);
    assert_eq!(storage.capacity(), 0);
}
