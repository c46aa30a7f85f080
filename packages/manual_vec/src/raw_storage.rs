use std::alloc::{Layout, alloc, dealloc};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::{AllocError, infallible};

/// An exclusively owned block of uninitialized memory with room for a fixed number of `T`.
///
/// The storage knows its capacity but has no notion of which slots hold live values. It never
/// drops elements: whoever constructs values in the slots is responsible for dropping them
/// before the storage itself is dropped, at which point only the memory block is released.
///
/// An empty storage (capacity 0) owns no memory and reports a dangling, well-aligned address.
/// Storage for a zero-sized `T` never allocates, whatever its capacity.
///
/// # Ownership
///
/// The storage cannot be cloned, as two owners would alias the same uninitialized memory:
///
/// ```compile_fail
/// use manual_vec::RawStorage;
///
/// let storage = RawStorage::<u64>::with_capacity(4);
/// let copy = storage.clone();
/// ```
///
/// Ownership transfers by move. Use [`take()`](Self::take) to move the block out of a
/// location while leaving an empty storage behind.
///
/// # Examples
///
/// ```
/// use manual_vec::RawStorage;
///
/// let storage = RawStorage::<u64>::with_capacity(4);
/// assert_eq!(storage.capacity(), 4);
///
/// // SAFETY: Offset 0 is within capacity and the slot is uninitialized, so we may write it.
/// unsafe { storage.slot(0).write(42) };
///
/// // SAFETY: We initialized the slot above.
/// let value = unsafe { storage.slot(0).read() };
/// assert_eq!(value, 42);
/// ```
pub struct RawStorage<T> {
    /// Base address of the block. Dangling (but aligned) when no memory is owned.
    ptr: NonNull<T>,

    /// Number of `T` slots the block has room for.
    capacity: usize,

    _owns: PhantomData<T>,
}

// SAFETY: The storage exclusively owns its block, so it can move between threads whenever
// the values placed in it could.
unsafe impl<T: Send> Send for RawStorage<T> {}

// SAFETY: Shared access only exposes addresses, reading through which requires `T: Sync`
// to be sound across threads.
unsafe impl<T: Sync> Sync for RawStorage<T> {}

impl<T> RawStorage<T> {
    /// Creates an empty storage that owns no memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::RawStorage;
    ///
    /// let storage = RawStorage::<String>::new();
    /// assert_eq!(storage.capacity(), 0);
    /// ```
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    /// Allocates storage with room for exactly `capacity` elements.
    ///
    /// A capacity of zero does not allocate.
    ///
    /// # Panics
    ///
    /// Panics if the total size in bytes overflows `isize::MAX`. If the allocator fails, the
    /// process is terminated via [`std::alloc::handle_alloc_error`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        infallible(Self::try_with_capacity(capacity))
    }

    /// Allocates storage with room for exactly `capacity` elements, reporting failure to
    /// acquire memory as an error instead of panicking.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::{AllocError, RawStorage};
    ///
    /// let storage = RawStorage::<u32>::try_with_capacity(16).unwrap();
    /// assert_eq!(storage.capacity(), 16);
    ///
    /// let error = RawStorage::<u32>::try_with_capacity(usize::MAX).unwrap_err();
    /// assert!(matches!(error, AllocError::CapacityOverflow { .. }));
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            ptr: Self::allocate(capacity)?,
            capacity,
            _owns: PhantomData,
        })
    }

    /// Reserves an uninitialized block for `capacity` elements.
    ///
    /// Returns a dangling address when there is nothing to allocate: either the capacity is
    /// zero or `T` is zero-sized.
    fn allocate(capacity: usize) -> Result<NonNull<T>, AllocError> {
        if capacity == 0 {
            return Ok(NonNull::dangling());
        }

        let layout = Layout::array::<T>(capacity).map_err(|_layout_error| {
            AllocError::CapacityOverflow {
                requested: capacity,
            }
        })?;

        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: The layout has a non-zero size, which is the only requirement of `alloc()`.
        let ptr = unsafe { alloc(layout) };

        NonNull::new(ptr)
            .map(NonNull::cast::<T>)
            .ok_or(AllocError::AllocatorFailure { layout })
    }

    /// Releases a block previously obtained from [`allocate()`](Self::allocate).
    ///
    /// No-op if nothing was actually allocated for this capacity.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate(capacity)` with the same `capacity` and not
    /// yet released.
    unsafe fn deallocate(ptr: NonNull<T>, capacity: usize) {
        if capacity == 0 {
            return;
        }

        let layout = Layout::array::<T>(capacity)
            .expect("layout was valid when the block was allocated, so it is still valid now");

        if layout.size() == 0 {
            return;
        }

        // SAFETY: Forwarding the guarantee from the caller that this block came from
        // `alloc()` with this exact layout.
        unsafe {
            dealloc(ptr.as_ptr().cast::<u8>(), layout);
        }
    }

    /// Returns the number of element slots in the block.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the base address of the block.
    ///
    /// The address is dangling (but aligned and non-null) if the storage owns no memory.
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns the base address of the block for writing.
    ///
    /// The address is dangling (but aligned and non-null) if the storage owns no memory.
    #[must_use]
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the address of the slot at `offset`.
    ///
    /// An `offset` equal to the capacity is permitted and yields the past-the-end address,
    /// which must never be dereferenced.
    ///
    /// The storage does not track which slots are initialized. Reading a slot is only valid
    /// if a value was previously written there and has not been moved out or dropped.
    ///
    /// # Safety
    ///
    /// The caller must ensure `offset <= capacity`. This is checked in debug builds only.
    #[must_use]
    #[inline]
    pub unsafe fn slot(&self, offset: usize) -> NonNull<T> {
        debug_assert!(
            offset <= self.capacity,
            "slot offset {offset} out of bounds in storage of capacity {}",
            self.capacity
        );

        // SAFETY: The caller guarantees the offset stays within the block or one past its
        // end, so the resulting address is within the same allocated object.
        unsafe { self.ptr.add(offset) }
    }

    /// Exchanges the blocks owned by two storages. No elements are touched.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::RawStorage;
    ///
    /// let mut a = RawStorage::<u8>::with_capacity(1);
    /// let mut b = RawStorage::<u8>::with_capacity(8);
    ///
    /// a.swap(&mut b);
    ///
    /// assert_eq!(a.capacity(), 8);
    /// assert_eq!(b.capacity(), 1);
    /// ```
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.ptr, &mut other.ptr);
        mem::swap(&mut self.capacity, &mut other.capacity);
    }

    /// Moves the block out, leaving an empty storage in its place.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::RawStorage;
    ///
    /// let mut source = RawStorage::<u8>::with_capacity(8);
    /// let target = source.take();
    ///
    /// assert_eq!(target.capacity(), 8);
    /// assert_eq!(source.capacity(), 0);
    /// ```
    #[must_use]
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }
}

impl<T> Default for RawStorage<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawStorage<T> {
    fn drop(&mut self) {
        // SAFETY: The block was obtained from `allocate(self.capacity)` and we are its only
        // owner. Live elements (if any) are the responsibility of whoever placed them.
        unsafe {
            Self::deallocate(self.ptr, self.capacity);
        }
    }
}

impl<T> fmt::Debug for RawStorage<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(RawStorage<u32>: Send, Sync, fmt::Debug, Default);
    assert_impl_all!(RawStorage<String>: Send, Sync);
    assert_not_impl_any!(RawStorage<u32>: Clone, Copy);
    assert_not_impl_any!(RawStorage<Rc<u32>>: Send, Sync);
    assert_not_impl_any!(RawStorage<Cell<u32>>: Sync);

    #[test]
    fn new_is_empty() {
        let storage = RawStorage::<u64>::new();

        assert_eq!(storage.capacity(), 0);
        assert_eq!(storage.as_ptr(), NonNull::<u64>::dangling().as_ptr());
    }

    #[test]
    fn zero_capacity_does_not_allocate() {
        let storage = RawStorage::<u64>::with_capacity(0);

        assert_eq!(storage.capacity(), 0);
        assert_eq!(storage.as_ptr(), NonNull::<u64>::dangling().as_ptr());
    }

    #[test]
    fn with_capacity_is_aligned_and_writable() {
        let storage = RawStorage::<u64>::with_capacity(16);

        assert_eq!(storage.capacity(), 16);
        assert!(storage.as_ptr().is_aligned());

        for i in 0..16 {
            unsafe { storage.slot(i).write(i as u64 * 3) };
        }

        for i in 0..16 {
            assert_eq!(unsafe { storage.slot(i).read() }, i as u64 * 3);
        }
    }

    #[test]
    fn slot_addresses_are_contiguous() {
        let storage = RawStorage::<u32>::with_capacity(4);

        let first = unsafe { storage.slot(0) }.as_ptr() as usize;
        let past_end = unsafe { storage.slot(4) }.as_ptr() as usize;

        assert_eq!(past_end - first, 4 * size_of::<u32>());
    }

    #[test]
    fn zero_sized_type_never_allocates() {
        let storage = RawStorage::<()>::with_capacity(1_000_000);

        assert_eq!(storage.capacity(), 1_000_000);
        assert_eq!(storage.as_ptr(), NonNull::<()>::dangling().as_ptr());
    }

    #[test]
    fn overflowing_capacity_is_error() {
        let result = RawStorage::<u64>::try_with_capacity(usize::MAX / 4);

        assert_eq!(
            result.unwrap_err(),
            AllocError::CapacityOverflow {
                requested: usize::MAX / 4
            }
        );
    }

    #[test]
    #[should_panic]
    fn overflowing_capacity_panics_in_infallible_form() {
        drop(RawStorage::<u64>::with_capacity(usize::MAX / 4));
    }

    #[test]
    fn swap_exchanges_blocks() {
        let mut a = RawStorage::<u16>::with_capacity(2);
        let mut b = RawStorage::<u16>::with_capacity(5);

        let a_ptr = a.as_ptr();
        let b_ptr = b.as_ptr();

        a.swap(&mut b);

        assert_eq!(a.capacity(), 5);
        assert_eq!(a.as_ptr(), b_ptr);
        assert_eq!(b.capacity(), 2);
        assert_eq!(b.as_ptr(), a_ptr);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = RawStorage::<u16>::with_capacity(3);
        let source_ptr = source.as_ptr();

        let target = source.take();

        assert_eq!(target.capacity(), 3);
        assert_eq!(target.as_ptr(), source_ptr);
        assert_eq!(source.capacity(), 0);
    }

    #[test]
    fn move_keeps_address() {
        let storage = RawStorage::<u16>::with_capacity(3);
        let ptr = storage.as_ptr();

        let moved = storage;

        assert_eq!(moved.as_ptr(), ptr);
        assert_eq!(moved.capacity(), 3);
    }

    #[test]
    fn drop_does_not_drop_elements() {
        struct CountsDrops(Rc<Cell<usize>>);

        impl Drop for CountsDrops {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0_usize));

        let storage = RawStorage::<CountsDrops>::with_capacity(2);
        unsafe { storage.slot(0).write(CountsDrops(Rc::clone(&drops))) };

        // Read the value back out so we can drop it ourselves after the storage is gone.
        let value = unsafe { storage.slot(0).read() };

        drop(storage);
        assert_eq!(drops.get(), 0);

        drop(value);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn slot_beyond_past_the_end_panics_in_debug() {
        let storage = RawStorage::<u32>::with_capacity(2);

        let _ = unsafe { storage.slot(3) };
    }
}
