//! Allocator failure reported through the fallible `ManualVec` API.
//!
//! This test binary installs a global allocator that refuses large blocks of [`Page`]-aligned
//! memory. Nothing else in the process asks for that alignment, so the refusals only affect
//! the containers created here.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr;

use manual_vec::{AllocError, ManualVec};

const PAGE_SIZE: usize = 4096;

/// Largest block of pages the allocator below will hand out.
const MAX_PAGES: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(align(4096))]
struct Page(u32);

struct CappedAllocator;

impl CappedAllocator {
    fn refuses(layout: Layout) -> bool {
        layout.align() == PAGE_SIZE && layout.size() > MAX_PAGES * PAGE_SIZE
    }
}

// SAFETY: Every call is either refused with a null pointer, which the `GlobalAlloc` contract
// permits, or forwarded unchanged to the system allocator.
unsafe impl GlobalAlloc for CappedAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if Self::refuses(layout) {
            return ptr::null_mut();
        }

        // SAFETY: Forwarding the caller's guarantees about `layout`.
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: Refused layouts never produce a block, so `ptr` came from `System.alloc()`.
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: CappedAllocator = CappedAllocator;

fn full_container() -> ManualVec<Page> {
    let mut vec = ManualVec::with_capacity(MAX_PAGES);

    for index in 0..MAX_PAGES {
        vec.push(Page(u32::try_from(index).unwrap()));
    }

    assert_eq!(vec.len(), vec.capacity());
    vec
}

fn expected_failure(capacity: usize) -> AllocError {
    AllocError::AllocatorFailure {
        layout: Layout::array::<Page>(capacity).unwrap(),
    }
}

#[test]
fn try_push_reports_allocator_failure() {
    let mut vec = full_container();
    let ptr = vec.as_ptr();

    let error = vec.try_push(Page(100)).unwrap_err();

    assert_eq!(error, expected_failure(2 * MAX_PAGES));
    assert_eq!(vec, [Page(0), Page(1), Page(2), Page(3)]);
    assert_eq!(vec.capacity(), MAX_PAGES);
    assert_eq!(vec.as_ptr(), ptr);
}

#[test]
fn try_insert_with_reports_failure_before_producing_value() {
    let mut vec = full_container();
    let mut produced = false;

    let error = vec
        .try_insert_with(1, || {
            produced = true;
            Page(100)
        })
        .unwrap_err();

    assert_eq!(error, expected_failure(2 * MAX_PAGES));
    assert!(!produced);
    assert_eq!(vec, [Page(0), Page(1), Page(2), Page(3)]);
}

#[test]
fn try_resize_with_reports_allocator_failure() {
    let mut vec = full_container();

    let error = vec
        .try_resize_with(MAX_PAGES + 1, Page::default)
        .unwrap_err();

    assert_eq!(error, expected_failure(MAX_PAGES + 1));
    assert_eq!(vec.len(), MAX_PAGES);
    assert_eq!(vec.capacity(), MAX_PAGES);
}

#[test]
fn try_reserve_and_try_with_capacity_report_allocator_failure() {
    let mut vec = full_container();

    assert_eq!(vec.try_reserve(100), Err(expected_failure(100)));
    assert_eq!(vec.capacity(), MAX_PAGES);

    let error = ManualVec::<Page>::try_with_capacity(MAX_PAGES + 1).unwrap_err();
    assert_eq!(error, expected_failure(MAX_PAGES + 1));
}

#[test]
fn container_keeps_working_within_the_cap() {
    let mut vec = ManualVec::new();

    vec.try_push(Page(1)).unwrap();
    vec.try_push(Page(2)).unwrap();
    vec.try_insert(0, Page(0)).unwrap();
    assert_eq!(vec.capacity(), MAX_PAGES);

    vec.pop();
    vec.try_push(Page(3)).unwrap();
    vec.try_push(Page(4)).unwrap();

    assert_eq!(vec, [Page(0), Page(1), Page(3), Page(4)]);
}
