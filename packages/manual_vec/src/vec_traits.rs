//! Standard trait implementations that make [`ManualVec`] behave like a slice-backed sequence.

use std::borrow::{Borrow, BorrowMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};
use std::slice;

use crate::{ManualVec, Transfer, infallible};

impl<T, P> Default for ManualVec<T, P> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug, P> fmt::Debug for ManualVec<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, P> Deref for ManualVec<T, P> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, P> DerefMut for ManualVec<T, P> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, P> AsRef<[T]> for ManualVec<T, P> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T, P> AsMut<[T]> for ManualVec<T, P> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T, P> Borrow<[T]> for ManualVec<T, P> {
    #[inline]
    fn borrow(&self) -> &[T] {
        self
    }
}

impl<T, P> BorrowMut<[T]> for ManualVec<T, P> {
    #[inline]
    fn borrow_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T, U, P, Q> PartialEq<ManualVec<U, Q>> for ManualVec<T, P>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &ManualVec<U, Q>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, P> PartialEq<[U]> for ManualVec<T, P>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, P> PartialEq<&[U]> for ManualVec<T, P>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, P, const N: usize> PartialEq<[U; N]> for ManualVec<T, P>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, P> Eq for ManualVec<T, P> {}

impl<T: Hash, P> Hash for ManualVec<T, P> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T, P: Transfer<T>> Extend<T> for ManualVec<T, P> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();

        let (lower_bound, _) = iter.size_hint();
        self.reserve(self.len().saturating_add(lower_bound));

        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T: Copy + 'a, P: Transfer<T>> Extend<&'a T> for ManualVec<T, P> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, P: Transfer<T>> FromIterator<T> for ManualVec<T, P> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut result = Self::default();
        result.extend(iter);
        result
    }
}

impl<T, P, const N: usize> From<[T; N]> for ManualVec<T, P> {
    /// Moves the array elements into a container with capacity equal to `N`.
    fn from(value: [T; N]) -> Self {
        let mut result = infallible(Self::try_with_storage_capacity(N));
        result.extend_within_capacity(value);
        result
    }
}

impl<T: Clone, P> From<&[T]> for ManualVec<T, P> {
    /// Clones the slice elements into a container with capacity equal to the slice length.
    fn from(value: &[T]) -> Self {
        let mut result = infallible(Self::try_with_storage_capacity(value.len()));
        result.extend_within_capacity(value.iter().cloned());
        result
    }
}

impl<'a, T, P> IntoIterator for &'a ManualVec<T, P> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, P> IntoIterator for &'a mut ManualVec<T, P> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::modulo_arithmetic,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::CloneElements;

    #[test]
    fn default_is_empty() {
        let vec = ManualVec::<String, CloneElements>::default();

        assert!(vec.is_empty());
        assert_eq!(vec.capacity(), 0);
    }

    #[test]
    fn debug_formats_like_a_list() {
        let vec: ManualVec<u32> = [1, 2, 3].into();

        assert_eq!(format!("{vec:?}"), "[1, 2, 3]");
    }

    #[test]
    fn deref_exposes_slice_api() {
        let mut vec: ManualVec<u32> = [3, 1, 2].into();

        vec.sort_unstable();
        vec[0] = 10;

        assert_eq!(vec.first(), Some(&10));
        assert_eq!(vec.iter().sum::<u32>(), 15);
        assert!(vec.contains(&3));
    }

    #[test]
    fn equality_across_policies_and_slices() {
        let moving: ManualVec<String> = ["a".to_string(), "b".to_string()].into();
        let cloning: ManualVec<String, CloneElements> =
            ["a".to_string(), "b".to_string()].into();

        assert_eq!(moving, cloning);
        assert_eq!(moving, ["a", "b"]);
        assert_eq!(moving, *["a", "b"].as_slice());
        assert_eq!(moving, ["a", "b"].as_slice());
        assert_ne!(moving, ["a"]);
    }

    #[test]
    fn equal_containers_hash_equally() {
        let mut set = HashSet::new();

        let first: ManualVec<u32> = [1, 2].into();
        let mut second = ManualVec::<u32>::with_capacity(10);
        second.push(1);
        second.push(2);

        set.insert(first);

        assert!(set.contains(&second));
        assert!(set.contains([1, 2].as_slice()));
    }

    #[test]
    fn extend_appends_in_order() {
        let mut vec: ManualVec<u32> = [1].into();

        vec.extend([2, 3]);
        vec.extend(&[4, 5]);

        assert_eq!(vec, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn extend_reserves_lower_bound_exactly() {
        let mut vec: ManualVec<u32> = [1].into();

        vec.extend(2..=6);

        assert_eq!(vec.capacity(), 6);
    }

    #[test]
    fn collect_builds_container() {
        let vec: ManualVec<u32> = (0..10).filter(|value| value % 2 == 0).collect();

        assert_eq!(vec, [0, 2, 4, 6, 8]);
    }

    #[test]
    fn from_array_and_slice_fit_exactly() {
        let from_array: ManualVec<u8> = [1, 2, 3].into();
        let from_slice: ManualVec<u8> = ManualVec::from([4, 5].as_slice());

        assert_eq!(from_array.capacity(), 3);
        assert_eq!(from_slice, [4, 5]);
        assert_eq!(from_slice.capacity(), 2);
    }

    #[test]
    fn borrowing_iterators() {
        let mut vec: ManualVec<u32> = [1, 2, 3].into();

        for value in &mut vec {
            *value *= 2;
        }

        let mut seen = Vec::new();
        for value in &vec {
            seen.push(*value);
        }

        assert_eq!(seen, [2, 4, 6]);
    }
}
