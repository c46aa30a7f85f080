use std::fmt;
use std::iter::FusedIterator;
use std::ptr;
use std::slice;

use crate::{ManualVec, RawStorage};

/// An iterator that moves elements out of a [`ManualVec`].
///
/// Created by the [`IntoIterator`] implementation of [`ManualVec`]. Elements not yet yielded
/// are dropped together with the iterator.
///
/// # Examples
///
/// ```
/// use manual_vec::ManualVec;
///
/// let words: ManualVec<String> = ["one".to_string(), "two".to_string()].into();
///
/// let mut iter = words.into_iter();
/// assert_eq!(iter.next().as_deref(), Some("one"));
/// assert_eq!(iter.len(), 1);
/// ```
pub struct IntoIter<T> {
    storage: RawStorage<T>,

    // Slots `[front, back)` are live. Everything else has been yielded or was never used.
    front: usize,
    back: usize,
}

impl<T> IntoIter<T> {
    /// Returns the elements not yet yielded as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `front <= back <= capacity`, so this is in bounds or one past the end.
        let first = unsafe { self.storage.slot(self.front) };

        // Cannot underflow because `front <= back`.
        let remaining = self.back.wrapping_sub(self.front);

        // SAFETY: The `remaining` slots starting at `first` are live.
        unsafe { slice::from_raw_parts(first.as_ptr(), remaining) }
    }
}

impl<T, P> IntoIterator for ManualVec<T, P> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let (storage, len) = self.into_raw_parts();

        IntoIter {
            storage,
            front: 0,
            back: len,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        // SAFETY: `front < back`, so the slot is live.
        let slot = unsafe { self.storage.slot(self.front) };

        // Cannot overflow because `front < back`.
        self.front = self.front.wrapping_add(1);

        // SAFETY: The slot is no longer inside `[front, back)`, so we take ownership of it.
        Some(unsafe { slot.read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Cannot underflow because `front <= back`.
        let remaining = self.back.wrapping_sub(self.front);
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        // Cannot underflow because `back > front >= 0`.
        self.back = self.back.wrapping_sub(1);

        // SAFETY: The old `back - 1` was live.
        let slot = unsafe { self.storage.slot(self.back) };

        // SAFETY: The slot is no longer inside `[front, back)`, so we take ownership of it.
        Some(unsafe { slot.read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        // SAFETY: `front <= back <= capacity`, so this is in bounds or one past the end.
        let first = unsafe { self.storage.slot(self.front) };

        // Cannot underflow because `front <= back`.
        let remaining = self.back.wrapping_sub(self.front);

        // SAFETY: The remaining elements are live and owned by the iterator. The storage
        // frees the memory afterwards.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first.as_ptr(), remaining));
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(IntoIter<u32>: Send, Sync, ExactSizeIterator, DoubleEndedIterator, FusedIterator);
    assert_not_impl_any!(IntoIter<Rc<u32>>: Send, Sync);

    struct CountsDrops(Rc<Cell<usize>>);

    impl Drop for CountsDrops {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn yields_in_order() {
        let vec: ManualVec<u32> = [1, 2, 3].into();

        let collected: Vec<u32> = vec.into_iter().collect();

        assert_eq!(collected, [1, 2, 3]);
    }

    #[test]
    fn yields_from_both_ends() {
        let vec: ManualVec<u32> = [1, 2, 3, 4].into();
        let mut iter = vec.into_iter();

        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.as_slice(), [2, 3]);
        assert_eq!(iter.next_back(), Some(3));
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.len(), 0);
    }

    #[test]
    fn empty_yields_nothing() {
        let mut iter = ManualVec::<String>::new().into_iter();

        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert!(iter.next().is_none());
    }

    #[test]
    fn drop_releases_remaining_elements_once() {
        let drops = Rc::new(Cell::new(0));

        let mut vec = ManualVec::new();
        for _ in 0..5 {
            vec.push(CountsDrops(Rc::clone(&drops)));
        }

        let mut iter = vec.into_iter();
        drop(iter.next());
        drop(iter.next_back());
        assert_eq!(drops.get(), 2);

        drop(iter);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn debug_lists_remaining() {
        let vec: ManualVec<u32> = [7, 8].into();
        let mut iter = vec.into_iter();
        iter.next();

        assert_eq!(format!("{iter:?}"), "IntoIter([8])");
    }
}
