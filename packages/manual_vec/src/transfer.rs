use std::ptr;

use scopeguard::ScopeGuard;

/// Strategy for carrying elements from an old buffer into a new one when a
/// [`ManualVec`][crate::ManualVec] reallocates.
///
/// The strategy is a type parameter of the container, so the choice is resolved at compile
/// time and never costs a runtime branch. Two strategies exist:
///
/// * [`MoveElements`] (the default) relocates elements bitwise. Moving a value in Rust cannot
///   fail, so this is always available and never needs a rollback.
/// * [`CloneElements`] clones every element into the new buffer and only drops the originals
///   once all clones succeeded. A panicking clone discards the partial copies and leaves the
///   original buffer untouched.
///
/// Either way, a transfer happens in two phases so the container can keep the old buffer
/// authoritative until the new one is complete:
///
/// 1. [`transfer()`](Self::transfer) builds the elements in the new buffer.
/// 2. Once the container has adopted the new buffer, [`release()`](Self::release) ends the
///    lifetime of the leftovers in the old one. If the container instead abandons the new
///    buffer, `release()` is applied to the transferred elements there.
///
/// This trait is sealed and cannot be implemented outside this crate.
pub trait Transfer<T>: sealed::Sealed {
    /// Fills `count` uninitialized slots starting at `dst` with the elements starting at `src`.
    ///
    /// If this panics, nothing is left constructed in `dst` and `src` is unchanged.
    ///
    /// # Safety
    ///
    /// * `src` must point to `count` initialized elements.
    /// * `dst` must be valid for writes of `count` elements and must not overlap `src`.
    unsafe fn transfer(src: *const T, dst: *mut T, count: usize);

    /// Ends the lifetime of one of the two sides of a completed [`transfer()`](Self::transfer).
    ///
    /// After this call, the `count` slots starting at `ptr` are logically uninitialized.
    ///
    /// # Safety
    ///
    /// `ptr` must point to one side of a completed transfer of `count` elements, and the
    /// other side must remain in place as the owner of the values.
    unsafe fn release(ptr: *mut T, count: usize);
}

/// Relocates elements bitwise during reallocation. This is the default strategy.
///
/// Relocation is a plain memory copy: it cannot fail and it never runs any element code.
/// The old slots are simply forgotten afterwards.
///
/// # Examples
///
/// ```
/// use manual_vec::{ManualVec, MoveElements};
///
/// let mut items: ManualVec<String, MoveElements> = ManualVec::new();
/// items.push("moved, not cloned".to_string());
/// items.reserve(100);
///
/// assert_eq!(items[0], "moved, not cloned");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct MoveElements;

/// Clones elements into the new buffer during reallocation, dropping the originals only
/// after every clone has succeeded.
///
/// Use this strategy when element clones have observable effects that must not be lost if the
/// operation is interrupted, or to opt into the classic copy-then-destroy transfer.
///
/// # Examples
///
/// ```
/// use manual_vec::{CloneElements, ManualVec};
///
/// let mut items: ManualVec<String, CloneElements> = ManualVec::builder()
///     .clone_on_transfer()
///     .build();
///
/// items.push("cloned on growth".to_string());
/// items.reserve(100);
///
/// assert_eq!(items[0], "cloned on growth");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct CloneElements;

impl sealed::Sealed for MoveElements {}
impl sealed::Sealed for CloneElements {}

impl<T> Transfer<T> for MoveElements {
    #[inline]
    unsafe fn transfer(src: *const T, dst: *mut T, count: usize) {
        // SAFETY: Forwarding the caller's guarantees of validity and non-overlap.
        unsafe {
            ptr::copy_nonoverlapping(src, dst, count);
        }
    }

    #[inline]
    unsafe fn release(_ptr: *mut T, _count: usize) {
        // A bitwise relocation leaves two identical bit patterns, one of which is forgotten.
    }
}

impl<T: Clone> Transfer<T> for CloneElements {
    #[inline]
    unsafe fn transfer(src: *const T, dst: *mut T, count: usize) {
        // SAFETY: Forwarding the caller's guarantees of validity and non-overlap.
        unsafe {
            clone_into_uninit(src, dst, count);
        }
    }

    #[inline]
    unsafe fn release(ptr: *mut T, count: usize) {
        // SAFETY: The caller guarantees these are live clones or originals that are not
        // going to be used again.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr, count));
        }
    }
}

/// Clones `count` elements from `src` into the uninitialized slots at `dst`.
///
/// If any clone panics, the clones created so far are dropped before the panic continues,
/// leaving `dst` fully uninitialized again.
///
/// # Safety
///
/// * `src` must point to `count` initialized elements.
/// * `dst` must be valid for writes of `count` elements and must not overlap `src`.
pub(crate) unsafe fn clone_into_uninit<T: Clone>(src: *const T, dst: *mut T, count: usize) {
    let mut written = scopeguard::guard(0_usize, |written| {
        // SAFETY: Exactly `written` leading slots of `dst` were initialized below and nobody
        // else knows about them, so we are responsible for dropping them.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(dst, written));
        }
    });

    for index in 0..count {
        // SAFETY: The caller guarantees `src` has `count` initialized elements.
        let original = unsafe { &*src.add(index) };

        let clone = original.clone();

        // SAFETY: The caller guarantees `dst` is valid for `count` writes.
        unsafe {
            dst.add(index).write(clone);
        }

        // Cannot overflow because `index < count`.
        *written = index.wrapping_add(1);
    }

    // Everything was cloned, so the clones now belong to the caller.
    _ = ScopeGuard::into_inner(written);
}

mod sealed {
    #[allow(
        unnameable_types,
        unreachable_pub,
        reason = "sealed trait pattern - reachable as a supertrait but intentionally unnameable"
    )]
    pub trait Sealed {}
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::indexing_slicing,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::fmt::Debug;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::RawStorage;

    assert_impl_all!(MoveElements: Send, Sync, Copy, Default, Debug, Transfer<String>);
    assert_impl_all!(CloneElements: Send, Sync, Copy, Default, Debug, Transfer<String>);

    /// Counts clones and drops, and panics on the clone that would exceed its budget.
    #[derive(Debug)]
    struct Tracked {
        value: u32,
        clone_budget: Rc<Cell<usize>>,
        drops: Rc<Cell<usize>>,
    }

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            let budget = self.clone_budget.get();
            assert!(budget > 0, "clone budget exhausted");
            self.clone_budget.set(budget - 1);

            Self {
                value: self.value,
                clone_budget: Rc::clone(&self.clone_budget),
                drops: Rc::clone(&self.drops),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn fill(
        storage: &RawStorage<Tracked>,
        count: usize,
        budget: &Rc<Cell<usize>>,
        drops: &Rc<Cell<usize>>,
    ) {
        for i in 0..count {
            unsafe {
                storage.slot(i).write(Tracked {
                    value: i as u32,
                    clone_budget: Rc::clone(budget),
                    drops: Rc::clone(drops),
                });
            }
        }
    }

    #[test]
    fn move_elements_copies_bits_and_release_is_noop() {
        let mut src = RawStorage::<String>::with_capacity(3);
        let mut dst = RawStorage::<String>::with_capacity(3);

        for (i, text) in ["a", "b", "c"].into_iter().enumerate() {
            unsafe { src.slot(i).write(text.to_string()) };
        }

        unsafe {
            <MoveElements as Transfer<String>>::transfer(src.as_ptr(), dst.as_mut_ptr(), 3);
            <MoveElements as Transfer<String>>::release(src.as_mut_ptr(), 3);
        }

        for (i, text) in ["a", "b", "c"].into_iter().enumerate() {
            assert_eq!(unsafe { dst.slot(i).read() }, text);
        }
    }

    #[test]
    fn clone_elements_keeps_originals_until_released() {
        let budget = Rc::new(Cell::new(usize::MAX));
        let drops = Rc::new(Cell::new(0));

        let mut src = RawStorage::<Tracked>::with_capacity(4);
        let mut dst = RawStorage::<Tracked>::with_capacity(4);
        fill(&src, 4, &budget, &drops);

        unsafe { <CloneElements as Transfer<Tracked>>::transfer(src.as_ptr(), dst.as_mut_ptr(), 4) };

        // Both sides are alive now.
        assert_eq!(drops.get(), 0);
        for i in 0..4 {
            assert_eq!(unsafe { src.slot(i).as_ref() }.value, i as u32);
            assert_eq!(unsafe { dst.slot(i).as_ref() }.value, i as u32);
        }

        unsafe { <CloneElements as Transfer<Tracked>>::release(src.as_mut_ptr(), 4) };
        assert_eq!(drops.get(), 4);

        unsafe { <CloneElements as Transfer<Tracked>>::release(dst.as_mut_ptr(), 4) };
        assert_eq!(drops.get(), 8);
    }

    #[test]
    fn clone_into_uninit_rolls_back_on_panic() {
        let budget = Rc::new(Cell::new(2));
        let drops = Rc::new(Cell::new(0));

        let mut src = RawStorage::<Tracked>::with_capacity(4);
        let mut dst = RawStorage::<Tracked>::with_capacity(4);
        fill(&src, 4, &budget, &drops);

        let src_ptr = src.as_ptr();
        let dst_ptr = dst.as_mut_ptr();

        let result = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            clone_into_uninit(src_ptr, dst_ptr, 4);
        }));

        assert!(result.is_err());

        // The two clones that succeeded were dropped again.
        assert_eq!(drops.get(), 2);

        // The originals are untouched.
        for i in 0..4 {
            assert_eq!(unsafe { src.slot(i).as_ref() }.value, i as u32);
        }

        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(src.as_mut_ptr(), 4)) };
        assert_eq!(drops.get(), 6);
    }

    #[test]
    fn clone_into_uninit_of_nothing_is_noop() {
        let src = RawStorage::<String>::new();
        let mut dst = RawStorage::<String>::new();

        unsafe { clone_into_uninit(src.as_ptr(), dst.as_mut_ptr(), 0) };
    }
}
