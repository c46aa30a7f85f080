use std::any::type_name;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use crate::{AllocError, CloneElements, ManualVec, MoveElements, infallible};

/// Builder for creating an instance of [`ManualVec`].
///
/// All settings are optional. By default the container starts without any allocated capacity
/// and relocates elements bitwise when it grows.
///
/// # Examples
///
/// Preallocating room for a known number of elements:
///
/// ```
/// use manual_vec::ManualVec;
///
/// let vec = ManualVec::<u32>::builder().capacity(100).build();
///
/// assert_eq!(vec.capacity(), 100);
/// ```
///
/// Opting into the clone-then-destroy transfer policy:
///
/// ```
/// use manual_vec::{CloneElements, ManualVec};
///
/// let vec: ManualVec<String, CloneElements> = ManualVec::builder()
///     .clone_on_transfer()
///     .capacity(4)
///     .build();
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) and can be safely transferred between threads,
/// allowing container configuration to happen on different threads than where it is used.
/// However, it is not thread-safe ([`Sync`]) as it contains mutable configuration state.
#[must_use]
pub struct ManualVecBuilder<T, P = MoveElements> {
    capacity: usize,

    _types: PhantomData<fn() -> (T, P)>,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> ManualVecBuilder<T> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            capacity: 0,
            _types: PhantomData,
            _not_sync: PhantomData,
        }
    }
}

impl<T, P> ManualVecBuilder<T, P> {
    /// Sets the initial capacity of the container. Defaults to zero, which does not allocate.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let vec = ManualVec::<u8>::builder().capacity(16).build();
    ///
    /// assert_eq!(vec.capacity(), 16);
    /// assert!(vec.is_empty());
    /// ```
    #[inline]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Makes the container relocate elements bitwise when it grows. This is the default.
    #[inline]
    pub fn move_on_transfer(self) -> ManualVecBuilder<T, MoveElements> {
        self.with_policy()
    }

    /// Makes the container clone elements into the new buffer when it grows, dropping the
    /// originals only after every clone has succeeded.
    ///
    /// See [`CloneElements`] for details.
    #[inline]
    pub fn clone_on_transfer(self) -> ManualVecBuilder<T, CloneElements>
    where
        T: Clone,
    {
        self.with_policy()
    }

    fn with_policy<Q>(self) -> ManualVecBuilder<T, Q> {
        ManualVecBuilder {
            capacity: self.capacity,
            _types: PhantomData,
            _not_sync: PhantomData,
        }
    }

    /// Builds the container with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if the size in bytes of the requested capacity overflows `isize::MAX`. If the
    /// allocator fails, the process is terminated via [`std::alloc::handle_alloc_error`].
    #[must_use]
    #[inline]
    pub fn build(self) -> ManualVec<T, P> {
        infallible(self.try_build())
    }

    /// Builds the container with the specified configuration, reporting failure to acquire
    /// memory as an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::{AllocError, ManualVec};
    ///
    /// let result = ManualVec::<u64>::builder().capacity(usize::MAX).try_build();
    ///
    /// assert!(matches!(result, Err(AllocError::CapacityOverflow { .. })));
    /// ```
    #[inline]
    pub fn try_build(self) -> Result<ManualVec<T, P>, AllocError> {
        ManualVec::try_with_storage_capacity(self.capacity)
    }
}

impl<T, P> fmt::Debug for ManualVecBuilder<T, P> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualVecBuilder")
            .field("capacity", &self.capacity)
            .field("policy", &type_name::<P>())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    // Test trait implementations.
    assert_impl_all!(ManualVecBuilder<u32>: Send, fmt::Debug);
    assert_not_impl_any!(ManualVecBuilder<u32>: Sync);

    #[test]
    fn builder_new_creates_default_state() {
        let builder = ManualVecBuilder::<u32>::new();

        assert_eq!(builder.capacity, 0);
    }

    #[test]
    fn build_without_settings_does_not_allocate() {
        let vec = ManualVecBuilder::<String>::new().build();

        assert_eq!(vec.capacity(), 0);
        assert!(vec.is_empty());
    }

    #[test]
    fn capacity_sets_capacity() {
        let vec = ManualVecBuilder::<String>::new().capacity(12).build();

        assert_eq!(vec.capacity(), 12);
    }

    #[test]
    fn capacity_can_be_overridden() {
        let builder = ManualVecBuilder::<u8>::new().capacity(5).capacity(9);

        assert_eq!(builder.capacity, 9);
    }

    #[test]
    fn policy_switch_keeps_capacity() {
        let vec: ManualVec<String, CloneElements> = ManualVecBuilder::new()
            .capacity(3)
            .clone_on_transfer()
            .build();
        assert_eq!(vec.capacity(), 3);

        let vec: ManualVec<String> = ManualVecBuilder::new()
            .clone_on_transfer()
            .capacity(7)
            .move_on_transfer()
            .build();
        assert_eq!(vec.capacity(), 7);
    }

    #[test]
    fn try_build_reports_overflow() {
        let result = ManualVecBuilder::<u64>::new().capacity(usize::MAX).try_build();

        assert!(matches!(
            result,
            Err(AllocError::CapacityOverflow {
                requested: usize::MAX
            })
        ));
    }

    #[test]
    #[should_panic]
    fn build_with_overflowing_capacity_panics() {
        let _vec = ManualVecBuilder::<u64>::new().capacity(usize::MAX).build();
    }

    #[test]
    fn builder_is_debug() {
        let builder = ManualVecBuilder::<u32>::new().clone_on_transfer();
        let debug_output = format!("{builder:?}");

        assert!(debug_output.contains("ManualVecBuilder"));
        assert!(debug_output.contains("CloneElements"));
    }

    #[test]
    fn builder_can_move_between_threads() {
        let builder = ManualVecBuilder::<u64>::new().capacity(8);
        let handle = thread::spawn(move || builder.build());
        let vec = handle.join().expect("thread completed successfully");

        assert_eq!(vec.capacity(), 8);
    }
}
