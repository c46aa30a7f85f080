use std::iter;
use std::marker::PhantomData;
use std::mem;
use std::ptr;
use std::slice;

use scopeguard::ScopeGuard;

use crate::{
    AllocError, ManualVecBuilder, MoveElements, RawStorage, Transfer, clone_into_uninit,
    infallible,
};

/// A contiguous growable sequence that manages its own raw buffer.
///
/// The container owns one [`RawStorage<T>`] and counts how many leading slots of it hold
/// constructed values. Slots `[0, len)` are live, slots `[len, capacity)` are uninitialized
/// memory. Every operation either works within the existing capacity or allocates a larger
/// storage, transfers the elements into it and only then discards the old one.
///
/// # Growth
///
/// When an insertion finds the buffer full, the capacity grows to `max(1, 2 * len)`, so a
/// sequence of pushes costs amortized O(1) each and visits the capacities 1, 2, 4, 8, ...
///
/// [`reserve()`](Self::reserve) takes the total capacity wanted (not the additional capacity)
/// and allocates exactly that much if the current capacity is smaller. Capacity never shrinks.
///
/// # Transfer policy
///
/// The `P` type parameter decides how elements are carried over when the buffer is
/// reallocated. See [`Transfer`] for details. The default, [`MoveElements`], relocates
/// elements bitwise. [`CloneElements`][crate::CloneElements] clones them and drops the
/// originals only after all clones succeeded.
///
/// # Failure behavior
///
/// Operations that reallocate (insertion into a full buffer, [`reserve()`](Self::reserve),
/// growing [`resize()`](Self::resize)) leave the container exactly as it was if the
/// allocation fails or an element clone panics while building the new buffer. Values to be
/// inserted are produced before anything is moved, so a panicking producer also leaves the
/// container untouched.
///
/// The `try_` forms of these operations return [`AllocError`] when memory cannot be acquired.
/// The other forms panic on capacity overflow and hand allocator failure to
/// [`std::alloc::handle_alloc_error`].
///
/// # Examples
///
/// ```
/// use manual_vec::ManualVec;
///
/// let mut numbers = ManualVec::new();
/// numbers.push(10);
/// numbers.push(20);
/// numbers.push(30);
///
/// numbers.insert(1, 99);
/// assert_eq!(numbers, [10, 99, 20, 30]);
///
/// assert_eq!(numbers.remove(0), 10);
/// assert_eq!(numbers, [99, 20, 30]);
///
/// numbers.resize(5);
/// assert_eq!(numbers, [99, 20, 30, 0, 0]);
/// ```
///
/// # Thread safety
///
/// The container is [`Send`] and [`Sync`] whenever `T` is. It performs no internal
/// synchronization; mutation always requires exclusive access.
pub struct ManualVec<T, P = MoveElements> {
    /// The raw buffer. Its first `len` slots are live.
    storage: RawStorage<T>,

    /// Number of leading slots that hold constructed values. Never exceeds the capacity.
    len: usize,

    _policy: PhantomData<fn() -> P>,
}

impl<T> ManualVec<T> {
    /// Creates a builder for configuring and constructing a [`ManualVec`].
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let numbers = ManualVec::<u64>::builder().capacity(32).build();
    ///
    /// assert!(numbers.is_empty());
    /// assert_eq!(numbers.capacity(), 32);
    /// ```
    #[inline]
    pub fn builder() -> ManualVecBuilder<T> {
        ManualVecBuilder::new()
    }

    /// Creates an empty container. Does not allocate.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let numbers = ManualVec::<u32>::new();
    ///
    /// assert_eq!(numbers.len(), 0);
    /// assert_eq!(numbers.capacity(), 0);
    /// ```
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self::empty()
    }

    /// Creates an empty container with room for exactly `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if the required size in bytes overflows `isize::MAX`. If the allocator fails,
    /// the process is terminated via [`std::alloc::handle_alloc_error`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        infallible(Self::try_with_capacity(capacity))
    }

    /// Creates an empty container with room for exactly `capacity` elements, reporting
    /// failure to acquire memory as an error.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::try_with_storage_capacity(capacity)
    }

    /// Creates a container holding `len` default values, with capacity equal to `len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let zeros = ManualVec::<i32>::with_len(3);
    ///
    /// assert_eq!(zeros, [0, 0, 0]);
    /// assert_eq!(zeros.capacity(), 3);
    /// ```
    #[must_use]
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        let mut result = Self::with_capacity(len);
        result.extend_within_capacity(iter::repeat_with(T::default).take(len));
        result
    }
}

impl<T, P> ManualVec<T, P> {
    #[inline]
    pub(crate) const fn empty() -> Self {
        Self {
            storage: RawStorage::new(),
            len: 0,
            _policy: PhantomData,
        }
    }

    pub(crate) fn try_with_storage_capacity(capacity: usize) -> Result<Self, AllocError> {
        Ok(Self {
            storage: RawStorage::try_with_capacity(capacity)?,
            len: 0,
            _policy: PhantomData,
        })
    }

    /// Returns the number of elements in the container.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the container holds no elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the container can hold without reallocating.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the address of the first element.
    ///
    /// The address is dangling (but aligned and non-null) while the container has no capacity.
    /// It is invalidated by any operation that reallocates.
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr()
    }

    /// Returns the address of the first element for writing.
    ///
    /// The address is dangling (but aligned and non-null) while the container has no capacity.
    /// It is invalidated by any operation that reallocates.
    #[must_use]
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_mut_ptr()
    }

    /// Returns the live elements as a slice.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` slots are initialized and the address is non-null and
        // aligned even when nothing is allocated.
        unsafe { slice::from_raw_parts(self.storage.as_ptr(), self.len) }
    }

    /// Returns the live elements as a mutable slice.
    #[must_use]
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: The first `len` slots are initialized and we hold an exclusive reference,
        // so no other reference to the elements can exist.
        unsafe { slice::from_raw_parts_mut(self.storage.as_mut_ptr(), self.len) }
    }

    /// Removes the last element and returns it, or `None` if the container is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let mut letters: ManualVec<char> = ['a', 'b'].into();
    ///
    /// assert_eq!(letters.pop(), Some('b'));
    /// assert_eq!(letters.pop(), Some('a'));
    /// assert_eq!(letters.pop(), None);
    /// ```
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        // Cannot underflow because we just checked for zero.
        self.len = self.len.wrapping_sub(1);

        // SAFETY: The old length was in bounds, so the new one is too.
        let last = unsafe { self.storage.slot(self.len) };

        // SAFETY: The slot was the last live one. It is no longer counted by `len`, so we
        // take ownership of the value by reading it out.
        Some(unsafe { last.read() })
    }

    /// Removes the element at `index`, shifting all following elements one position left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let mut numbers: ManualVec<u8> = [1, 2, 3].into();
    ///
    /// assert_eq!(numbers.remove(1), 2);
    /// assert_eq!(numbers, [1, 3]);
    /// ```
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index (is {index}) should be < len (is {})",
            self.len
        );

        // SAFETY: `index < len`, so the slot is in bounds.
        let hole = unsafe { self.storage.slot(index) };

        // SAFETY: The slot is live. Ownership of the value moves to us and the slot is
        // overwritten by the shift below.
        let value = unsafe { hole.read() };

        // Cannot underflow because `index < len`.
        let following = self.len.wrapping_sub(index).wrapping_sub(1);

        // SAFETY: `index < len`, so the slot after the hole is at most one past the end.
        let next = unsafe { hole.add(1) };

        // SAFETY: The `following` elements after the hole are live and within capacity.
        // `ptr::copy()` permits the overlapping ranges.
        unsafe {
            ptr::copy(next.as_ptr(), hole.as_ptr(), following);
        }

        // Cannot underflow because `index < len`.
        self.len = self.len.wrapping_sub(1);

        value
    }

    /// Drops trailing elements so that at most `len` remain. Capacity is unchanged.
    ///
    /// Has no effect if `len` is greater than or equal to the current length.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        // Cannot underflow because we just checked.
        let tail_len = self.len.wrapping_sub(len);

        // SAFETY: `len < self.len <= capacity`, so the slot is in bounds.
        let tail = unsafe { self.storage.slot(len) };

        // Shrink first, so a panicking element drop cannot lead to a double drop.
        self.len = len;

        // SAFETY: The tail elements were live and are no longer counted by `len`.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(tail.as_ptr(), tail_len));
        }
    }

    /// Drops all elements. Capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Appends every yielded value without ever reallocating.
    ///
    /// The length is bumped after each value, so a panicking iterator leaves exactly the
    /// values appended so far.
    ///
    /// # Panics
    ///
    /// Panics if more values are yielded than there is remaining capacity for.
    pub(crate) fn extend_within_capacity(&mut self, values: impl IntoIterator<Item = T>) {
        for value in values {
            assert!(
                self.len < self.capacity(),
                "appending within capacity {} overran the buffer",
                self.capacity()
            );

            // SAFETY: `len < capacity`, so the slot is in bounds and uninitialized.
            unsafe {
                self.storage.slot(self.len).write(value);
            }

            // Cannot overflow because `len < capacity`.
            self.len = self.len.wrapping_add(1);
        }
    }

    /// Moves the storage out of the container, leaving it empty.
    ///
    /// Returns the storage together with the number of live leading slots, which now belong
    /// to the caller.
    pub(crate) fn into_raw_parts(mut self) -> (RawStorage<T>, usize) {
        let len = mem::take(&mut self.len);
        (self.storage.take(), len)
    }
}

impl<T, P: Transfer<T>> ManualVec<T, P> {
    /// Grows the capacity to exactly `capacity` if it is currently smaller.
    ///
    /// Existing elements are transferred to the new buffer according to the transfer policy.
    /// Does nothing if the capacity is already sufficient; never shrinks.
    ///
    /// # Panics
    ///
    /// Panics if the required size in bytes overflows `isize::MAX`. If the allocator fails,
    /// the process is terminated via [`std::alloc::handle_alloc_error`].
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let mut numbers: ManualVec<u32> = [1, 2].into();
    ///
    /// numbers.reserve(10);
    /// assert_eq!(numbers.capacity(), 10);
    ///
    /// numbers.reserve(5);
    /// assert_eq!(numbers.capacity(), 10);
    /// assert_eq!(numbers, [1, 2]);
    /// ```
    pub fn reserve(&mut self, capacity: usize) {
        infallible(self.try_reserve(capacity));
    }

    /// Grows the capacity to exactly `capacity` if it is currently smaller, reporting failure
    /// to acquire memory as an error.
    ///
    /// On error, the container is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::{AllocError, ManualVec};
    ///
    /// let mut numbers: ManualVec<u64> = [1, 2, 3].into();
    ///
    /// let error = numbers.try_reserve(usize::MAX).unwrap_err();
    /// assert!(matches!(error, AllocError::CapacityOverflow { .. }));
    /// assert_eq!(numbers, [1, 2, 3]);
    /// ```
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        let mut new_storage = RawStorage::try_with_capacity(capacity)?;

        // SAFETY: The first `len` slots of our storage are live and the new storage is a
        // separate block with room for at least `len` elements.
        unsafe {
            P::transfer(self.storage.as_ptr(), new_storage.as_mut_ptr(), self.len);
        }

        self.adopt(new_storage, self.len);

        Ok(())
    }

    /// Resizes the container in place to `new_len` elements.
    ///
    /// Shrinking drops the trailing elements. Growing first reserves exactly `new_len` slots
    /// and then fills them with default values.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let mut numbers: ManualVec<u8> = [7, 8, 9].into();
    ///
    /// numbers.resize(1);
    /// assert_eq!(numbers, [7]);
    ///
    /// numbers.resize(4);
    /// assert_eq!(numbers, [7, 0, 0, 0]);
    /// ```
    pub fn resize(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    /// Resizes the container in place to `new_len` elements, filling new slots with values
    /// returned by `f`.
    ///
    /// If `f` panics, the elements produced so far remain in the container.
    ///
    /// # Panics
    ///
    /// Panics if the required size in bytes overflows `isize::MAX`. If the allocator fails,
    /// the process is terminated via [`std::alloc::handle_alloc_error`].
    pub fn resize_with(&mut self, new_len: usize, f: impl FnMut() -> T) {
        infallible(self.try_resize_with(new_len, f));
    }

    /// Resizes the container in place to `new_len` elements, filling new slots with values
    /// returned by `f` and reporting failure to acquire memory as an error.
    ///
    /// The buffer is grown before `f` is first called. On error, the container is unchanged
    /// and `f` is never called.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::{AllocError, ManualVec};
    ///
    /// let mut numbers: ManualVec<u64> = [1].into();
    ///
    /// numbers.try_resize_with(3, || 5)?;
    /// assert_eq!(numbers, [1, 5, 5]);
    ///
    /// assert!(numbers.try_resize_with(usize::MAX, || 0).is_err());
    /// assert_eq!(numbers, [1, 5, 5]);
    /// # Ok::<(), AllocError>(())
    /// ```
    pub fn try_resize_with(
        &mut self,
        new_len: usize,
        f: impl FnMut() -> T,
    ) -> Result<(), AllocError> {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        self.try_reserve(new_len)?;

        // Cannot underflow because we just checked.
        let missing = new_len.wrapping_sub(self.len);
        self.extend_within_capacity(iter::repeat_with(f).take(missing));

        Ok(())
    }

    /// Appends a value to the end of the container.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let mut words = ManualVec::new();
    /// words.push("hello");
    /// words.push("world");
    ///
    /// assert_eq!(words, ["hello", "world"]);
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) {
        self.insert_with(self.len, || value);
    }

    /// Appends a value produced by `f` and returns a reference to it.
    ///
    /// `f` is called before the container is modified, so if it panics the container is
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let mut names = ManualVec::new();
    ///
    /// let name = names.push_with(|| String::from("Ferris"));
    /// name.push_str(" the crab");
    ///
    /// assert_eq!(names[0], "Ferris the crab");
    /// ```
    #[inline]
    pub fn push_with(&mut self, f: impl FnOnce() -> T) -> &mut T {
        self.insert_with(self.len, f)
    }

    /// Appends a value to the end of the container, reporting failure to acquire memory as
    /// an error.
    ///
    /// On error, the container is unchanged and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::{AllocError, ManualVec};
    ///
    /// let mut words = ManualVec::new();
    /// words.try_push("hello")?;
    ///
    /// assert_eq!(words, ["hello"]);
    /// # Ok::<(), AllocError>(())
    /// ```
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<&mut T, AllocError> {
        self.try_insert_with(self.len, || value)
    }

    /// Inserts a value at `index`, shifting the element there and all after it one position
    /// right, and returns a reference to the inserted value.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::ManualVec;
    ///
    /// let mut numbers: ManualVec<u32> = [1, 3].into();
    ///
    /// *numbers.insert(1, 2) *= 10;
    ///
    /// assert_eq!(numbers, [1, 20, 3]);
    /// ```
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        self.insert_with(index, || value)
    }

    /// Inserts a value produced by `f` at `index`, shifting the element there and all after it
    /// one position right, and returns a reference to the inserted value.
    ///
    /// `f` is called before the container is modified, so if it panics the container is
    /// unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`, or if the grown size in bytes overflows `isize::MAX`. If the
    /// allocator fails, the process is terminated via [`std::alloc::handle_alloc_error`].
    pub fn insert_with(&mut self, index: usize, f: impl FnOnce() -> T) -> &mut T {
        infallible(self.try_insert_with(index, f))
    }

    /// Inserts a value at `index` like [`insert()`](Self::insert), reporting failure to
    /// acquire memory as an error.
    ///
    /// On error, the container is unchanged and `value` is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    #[inline]
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<&mut T, AllocError> {
        self.try_insert_with(index, || value)
    }

    /// Inserts a value produced by `f` at `index` like [`insert_with()`](Self::insert_with),
    /// reporting failure to acquire memory as an error.
    ///
    /// If the buffer is full, the larger buffer is allocated before `f` is called. On error,
    /// the container is unchanged and `f` is never called.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use manual_vec::{AllocError, ManualVec};
    ///
    /// let mut numbers: ManualVec<u32> = [1, 3].into();
    ///
    /// let inserted = numbers.try_insert_with(1, || 2)?;
    /// *inserted *= 10;
    ///
    /// assert_eq!(numbers, [1, 20, 3]);
    /// assert_eq!(numbers.capacity(), 4);
    /// # Ok::<(), AllocError>(())
    /// ```
    pub fn try_insert_with(
        &mut self,
        index: usize,
        f: impl FnOnce() -> T,
    ) -> Result<&mut T, AllocError> {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );

        if self.len < self.capacity() {
            let value = f();
            self.insert_within_capacity(index, value);
        } else {
            let new_storage = RawStorage::try_with_capacity(self.grown_capacity()?)?;
            let value = f();
            self.insert_reallocating(index, value, new_storage);
        }

        // SAFETY: `index < len` now, so the slot is in bounds.
        let mut inserted = unsafe { self.storage.slot(index) };

        // SAFETY: The slot holds the value we just inserted. The returned reference borrows
        // `self` exclusively, so the slot cannot move or be reused under it.
        Ok(unsafe { inserted.as_mut() })
    }

    /// The capacity a full buffer grows to: `max(1, 2 * len)`.
    fn grown_capacity(&self) -> Result<usize, AllocError> {
        self.len
            .checked_mul(2)
            .map(|doubled| doubled.max(1))
            .ok_or(AllocError::CapacityOverflow {
                requested: usize::MAX,
            })
    }

    /// Opens a gap at `index` by shifting the tail right and writes `value` into it.
    ///
    /// Nothing here can fail: the value already exists and the shift is a memory move.
    fn insert_within_capacity(&mut self, index: usize, value: T) {
        debug_assert!(self.len < self.capacity());
        debug_assert!(index <= self.len);

        // SAFETY: `index <= len <= capacity`, so the slot is in bounds or past-the-end.
        let gap = unsafe { self.storage.slot(index) };

        // Cannot underflow because `index <= len`.
        let following = self.len.wrapping_sub(index);

        // SAFETY: `index <= len < capacity`, so the next slot is still in bounds.
        let next = unsafe { gap.add(1) };

        // SAFETY: The `following` elements at the gap are live, and since `len < capacity`
        // there is room to shift them one slot right. `ptr::copy()` permits the overlap.
        unsafe {
            ptr::copy(gap.as_ptr(), next.as_ptr(), following);
        }

        // SAFETY: The gap slot was vacated by the shift (or was past the last element).
        unsafe {
            gap.write(value);
        }

        // Cannot overflow because `len < capacity`.
        self.len = self.len.wrapping_add(1);
    }

    /// Fills `new_storage` with the current elements plus `value` at `index` and adopts it.
    ///
    /// The old buffer stays authoritative until the new one is fully built. If a transfer
    /// panics, whatever was built in the new buffer is released, the new buffer is freed and
    /// the container is exactly as it was before the call.
    fn insert_reallocating(&mut self, index: usize, value: T, mut new_storage: RawStorage<T>) {
        debug_assert!(new_storage.capacity() > self.len);
        debug_assert!(index <= self.len);

        let old_ptr = self.storage.as_ptr();
        let new_ptr = new_storage.as_mut_ptr();

        // Cannot underflow because `index <= len`.
        let suffix_len = self.len.wrapping_sub(index);

        // SAFETY: The prefix `[0, index)` is live in the old buffer and the new buffer is a
        // separate block with room for all `len + 1` elements.
        unsafe {
            P::transfer(old_ptr, new_ptr, index);
        }

        // The prefix now exists on both sides. If the suffix transfer fails, we release the
        // new side and the old buffer remains the owner.
        let prefix_guard = scopeguard::guard((), move |()| {
            // SAFETY: The prefix transfer completed and the old buffer still holds its side.
            unsafe {
                P::release(new_ptr, index);
            }
        });

        // SAFETY: `index <= len`, so this is in bounds or one past the end of the old buffer.
        let old_suffix = unsafe { old_ptr.add(index) };

        // SAFETY: `index < len + 1 <= capacity`, so the gap is in bounds of the new buffer.
        let gap = unsafe { new_ptr.add(index) };

        // SAFETY: The gap is in bounds, so the slot after it is at most one past the end.
        let new_suffix = unsafe { gap.add(1) };

        // SAFETY: The suffix `[index, len)` is live in the old buffer. In the new buffer it
        // lands at `[index + 1, len + 1)`, which fits because the capacity is at least `len + 1`.
        unsafe {
            P::transfer(old_suffix, new_suffix, suffix_len);
        }

        ScopeGuard::into_inner(prefix_guard);

        // SAFETY: The gap slot was left empty between the prefix and the suffix.
        unsafe {
            gap.write(value);
        }

        // Cannot overflow because the new buffer has room for `len + 1` elements.
        let new_len = self.len.wrapping_add(1);
        self.adopt(new_storage, new_len);
    }

    /// Switches over to `new_storage`, whose first `new_len` slots already hold the
    /// transferred elements, and retires the old buffer.
    ///
    /// The container is consistent before the old elements are released, so even a panic
    /// from an element's `Drop` cannot leave it pointing at dead values.
    fn adopt(&mut self, mut new_storage: RawStorage<T>, new_len: usize) {
        debug_assert!(new_len <= new_storage.capacity());

        self.storage.swap(&mut new_storage);
        let old_len = mem::replace(&mut self.len, new_len);

        // `new_storage` now holds the old buffer.
        // SAFETY: Its first `old_len` slots are the source side of a completed transfer and
        // the container has adopted the other side.
        unsafe {
            P::release(new_storage.as_mut_ptr(), old_len);
        }
    }
}

impl<T: Clone, P> Clone for ManualVec<T, P> {
    /// Creates an independent deep copy with capacity equal to the length of the source.
    fn clone(&self) -> Self {
        let mut result = infallible(Self::try_with_storage_capacity(self.len));

        // SAFETY: Our first `len` slots are live and the result is a separate block with
        // room for exactly `len` elements.
        unsafe {
            clone_into_uninit(self.storage.as_ptr(), result.storage.as_mut_ptr(), self.len);
        }

        result.len = self.len;
        result
    }

    /// Makes `self` a copy of `source`, reusing the existing buffer when it is large enough.
    ///
    /// If the buffer is too small, a complete copy is built first and then swapped in, so a
    /// panicking clone leaves `self` unchanged. Otherwise the overlapping prefix is assigned
    /// element by element, surplus elements are dropped and missing ones are cloned in.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            *self = source.clone();
            return;
        }

        for (target, original) in self.iter_mut().zip(source.iter()) {
            target.clone_from(original);
        }

        if source.len < self.len {
            self.truncate(source.len);
        } else {
            let missing = source.get(self.len..).unwrap_or_default();
            self.extend_within_capacity(missing.iter().cloned());
        }
    }
}

impl<T, P> Drop for ManualVec<T, P> {
    fn drop(&mut self) {
        // SAFETY: The live elements are ours to drop. The storage releases the memory
        // afterwards when its own destructor runs.
        unsafe {
            ptr::drop_in_place(self.as_mut_slice());
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation,
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::fmt::Debug;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::CloneElements;

    assert_impl_all!(ManualVec<u32>: Send, Sync, Clone, Default, Debug);
    assert_impl_all!(ManualVec<String, CloneElements>: Send, Sync, Clone);
    assert_not_impl_any!(ManualVec<Rc<u32>>: Send, Sync);
    assert_not_impl_any!(ManualVec<Cell<u32>>: Sync);

    /// Shared counters for a family of [`Probe`] values.
    #[derive(Debug)]
    struct Ledger {
        /// Remaining clones allowed before the next clone panics.
        clone_budget: Cell<usize>,
        drops: Cell<usize>,
    }

    impl Ledger {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                clone_budget: Cell::new(usize::MAX),
                drops: Cell::new(0),
            })
        }

        fn probe(self: &Rc<Self>, value: u32) -> Probe {
            Probe {
                value,
                ledger: Rc::clone(self),
            }
        }
    }

    /// Test element that records drops and can be made to panic on clone.
    #[derive(Debug)]
    struct Probe {
        value: u32,
        ledger: Rc<Ledger>,
    }

    impl Clone for Probe {
        fn clone(&self) -> Self {
            let budget = self.ledger.clone_budget.get();
            assert!(budget > 0, "clone budget exhausted");
            self.ledger.clone_budget.set(budget - 1);

            Self {
                value: self.value,
                ledger: Rc::clone(&self.ledger),
            }
        }
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.ledger.drops.set(self.ledger.drops.get() + 1);
        }
    }

    fn values<P>(vec: &ManualVec<Probe, P>) -> Vec<u32> {
        vec.iter().map(|probe| probe.value).collect()
    }

    fn probes<P: Transfer<Probe>>(
        ledger: &Rc<Ledger>,
        count: u32,
        mut vec: ManualVec<Probe, P>,
    ) -> ManualVec<Probe, P> {
        for value in 0..count {
            vec.push(ledger.probe(value));
        }

        vec
    }

    #[test]
    fn smoke_test() {
        let mut vec = ManualVec::new();

        vec.push(10);
        vec.push(20);
        vec.push(30);
        assert_eq!(vec.len(), 3);
        assert_eq!(vec, [10, 20, 30]);

        vec.insert(1, 99);
        assert_eq!(vec.len(), 4);
        assert_eq!(vec, [10, 99, 20, 30]);

        vec.remove(0);
        assert_eq!(vec.len(), 3);
        assert_eq!(vec, [99, 20, 30]);

        vec.resize(5);
        assert_eq!(vec.len(), 5);
        assert_eq!(vec, [99, 20, 30, 0, 0]);

        let capacity_before = vec.capacity();
        vec.resize(1);
        assert_eq!(vec.len(), 1);
        assert_eq!(vec, [99]);
        assert_eq!(vec.capacity(), capacity_before);
    }

    #[test]
    fn new_is_empty_and_unallocated() {
        let vec = ManualVec::<String>::new();

        assert!(vec.is_empty());
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.capacity(), 0);
        assert!(vec.as_slice().is_empty());
    }

    #[test]
    fn with_len_default_constructs() {
        let vec = ManualVec::<String>::with_len(4);

        assert_eq!(vec.len(), 4);
        assert_eq!(vec.capacity(), 4);
        assert!(vec.iter().all(String::is_empty));
    }

    #[test]
    fn with_capacity_is_exact() {
        let vec = ManualVec::<u64>::with_capacity(7);

        assert_eq!(vec.capacity(), 7);
        assert!(vec.is_empty());
    }

    #[test]
    fn try_with_capacity_overflow_is_error() {
        let result = ManualVec::<u64>::try_with_capacity(usize::MAX);

        assert!(matches!(result, Err(AllocError::CapacityOverflow { .. })));
    }

    #[test]
    fn push_many_keeps_order() {
        for count in 0..64_u32 {
            let mut vec = ManualVec::new();

            for value in 0..count {
                vec.push(value * 7);
            }

            assert_eq!(vec.len(), count as usize);

            for (index, value) in vec.iter().enumerate() {
                assert_eq!(*value, index as u32 * 7);
            }
        }
    }

    #[test]
    fn push_growth_doubles_from_one() {
        let mut vec = ManualVec::new();
        let mut observed = Vec::new();

        for value in 0..100_u32 {
            let before = vec.capacity();
            vec.push(value);

            if vec.capacity() != before {
                observed.push(vec.capacity());
            }
        }

        assert_eq!(observed, [1, 2, 4, 8, 16, 32, 64, 128]);

        for (reallocation, capacity) in observed.iter().enumerate() {
            assert_eq!(*capacity, 1 << reallocation);
        }
    }

    #[test]
    fn growth_doubles_length_not_capacity() {
        let mut vec = ManualVec::new();
        vec.reserve(5);

        for value in 0..5 {
            vec.push(value);
        }
        assert_eq!(vec.capacity(), 5);

        // Full at 5 elements, so the next push moves to 2 * 5.
        vec.push(5);
        assert_eq!(vec.capacity(), 10);
    }

    #[test]
    fn reserve_is_exact_and_never_shrinks() {
        let mut vec: ManualVec<u32> = [1, 2, 3].into();

        vec.reserve(10);
        assert_eq!(vec.capacity(), 10);
        assert_eq!(vec, [1, 2, 3]);

        vec.reserve(4);
        assert_eq!(vec.capacity(), 10);

        vec.reserve(0);
        assert_eq!(vec.capacity(), 10);
        assert_eq!(vec.len(), 3);
        assert_eq!(vec, [1, 2, 3]);
    }

    #[test]
    fn reserve_without_growth_keeps_address() {
        let mut vec: ManualVec<u32> = [1, 2, 3].into();
        let ptr = vec.as_ptr();

        vec.reserve(3);

        assert_eq!(vec.as_ptr(), ptr);
    }

    #[test]
    fn try_reserve_failure_leaves_container_unchanged() {
        let mut vec: ManualVec<u64> = [4, 5, 6].into();
        let ptr = vec.as_ptr();
        let capacity = vec.capacity();

        let result = vec.try_reserve(usize::MAX / 2);

        assert!(matches!(result, Err(AllocError::CapacityOverflow { .. })));
        assert_eq!(vec, [4, 5, 6]);
        assert_eq!(vec.as_ptr(), ptr);
        assert_eq!(vec.capacity(), capacity);
    }

    #[test]
    fn resize_shrink_keeps_prefix_and_capacity() {
        let mut vec: ManualVec<u32> = [1, 2, 3, 4].into();
        let capacity = vec.capacity();

        vec.resize(2);

        assert_eq!(vec, [1, 2]);
        assert_eq!(vec.capacity(), capacity);
    }

    #[test]
    fn resize_grow_fills_with_default() {
        let mut vec: ManualVec<u32> = [1, 2].into();

        vec.resize(5);

        assert_eq!(vec, [1, 2, 0, 0, 0]);
        assert_eq!(vec.capacity(), 5);
    }

    #[test]
    fn resize_to_same_len_is_noop() {
        let mut vec: ManualVec<u32> = [1, 2].into();
        let capacity = vec.capacity();

        vec.resize(2);

        assert_eq!(vec, [1, 2]);
        assert_eq!(vec.capacity(), capacity);
    }

    #[test]
    fn resize_with_panicking_producer_keeps_produced_values() {
        let ledger = Ledger::new();
        let mut vec = ManualVec::new();
        vec.push(ledger.probe(100));

        let mut produced = 0;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            vec.resize_with(5, || {
                produced += 1;
                assert!(produced <= 2, "producer gave up");
                ledger.probe(produced)
            });
        }));

        assert!(result.is_err());
        assert_eq!(values(&vec), [100, 1, 2]);
        assert_eq!(vec.capacity(), 5);

        drop(vec);
        assert_eq!(ledger.drops.get(), 3);
    }

    #[test]
    fn insert_matches_model_at_every_position() {
        for len in 0..9_u32 {
            for index in 0..=len as usize {
                let mut vec = ManualVec::new();
                let mut model = Vec::new();

                for value in 0..len {
                    vec.push(value);
                    model.push(value);
                }

                let inserted = vec.insert(index, 1000);
                assert_eq!(*inserted, 1000);

                model.insert(index, 1000);

                assert_eq!(vec.len(), len as usize + 1);
                assert_eq!(vec.as_slice(), model.as_slice());
            }
        }
    }

    #[test]
    fn insert_within_capacity_does_not_reallocate() {
        let mut vec = ManualVec::with_capacity(4);
        vec.push(1);
        vec.push(3);
        let ptr = vec.as_ptr();

        vec.insert(1, 2);
        vec.insert(3, 4);

        assert_eq!(vec, [1, 2, 3, 4]);
        assert_eq!(vec.as_ptr(), ptr);
        assert_eq!(vec.capacity(), 4);
    }

    #[test]
    fn insert_reallocating_moves_to_new_buffer() {
        let mut vec = ManualVec::with_capacity(2);
        vec.push(1);
        vec.push(3);

        vec.insert(1, 2);

        assert_eq!(vec, [1, 2, 3]);
        assert_eq!(vec.capacity(), 4);
    }

    #[test]
    fn insert_returns_reference_to_new_element() {
        let mut vec: ManualVec<String> = ["a".to_string(), "c".to_string()].into();

        vec.insert(1, "b".to_string()).push('!');

        assert_eq!(vec, ["a", "b!", "c"]);
    }

    #[test]
    fn push_with_returns_reference_to_new_element() {
        let mut vec = ManualVec::new();

        *vec.push_with(|| 5) += 1;

        assert_eq!(vec, [6]);
    }

    #[test]
    #[should_panic]
    fn insert_past_end_panics() {
        let mut vec: ManualVec<u32> = [1, 2].into();

        vec.insert(3, 0);
    }

    #[test]
    fn remove_matches_model_at_every_position() {
        for len in 1..9_u32 {
            for index in 0..len as usize {
                let mut vec = ManualVec::new();
                let mut model = Vec::new();

                for value in 0..len {
                    vec.push(value);
                    model.push(value);
                }

                assert_eq!(vec.remove(index), model.remove(index));
                assert_eq!(vec.len(), len as usize - 1);
                assert_eq!(vec.as_slice(), model.as_slice());
            }
        }
    }

    #[test]
    #[should_panic]
    fn remove_out_of_bounds_panics() {
        let mut vec: ManualVec<u32> = [1, 2].into();

        vec.remove(2);
    }

    #[test]
    fn pop_takes_from_back() {
        let mut vec: ManualVec<u32> = [1, 2, 3].into();
        let capacity = vec.capacity();

        assert_eq!(vec.pop(), Some(3));
        assert_eq!(vec, [1, 2]);
        assert_eq!(vec.capacity(), capacity);
    }

    #[test]
    fn pop_empty_is_none() {
        let mut vec = ManualVec::<u32>::new();

        assert_eq!(vec.pop(), None);
        assert!(vec.is_empty());
    }

    #[test]
    fn truncate_and_clear_drop_elements() {
        let ledger = Ledger::new();
        let mut vec = probes(&ledger, 5, ManualVec::new());
        let capacity = vec.capacity();

        vec.truncate(10);
        assert_eq!(vec.len(), 5);
        assert_eq!(ledger.drops.get(), 0);

        vec.truncate(3);
        assert_eq!(values(&vec), [0, 1, 2]);
        assert_eq!(ledger.drops.get(), 2);

        vec.clear();
        assert!(vec.is_empty());
        assert_eq!(ledger.drops.get(), 5);
        assert_eq!(vec.capacity(), capacity);
    }

    #[test]
    fn every_element_dropped_exactly_once() {
        let ledger = Ledger::new();

        {
            let mut vec = probes(&ledger, 20, ManualVec::new());

            drop(vec.remove(4));
            drop(vec.pop());
            vec.insert(2, ledger.probe(500));
            vec.truncate(15);
            vec.reserve(64);

            let copy = vec.clone();
            drop(copy);
        }

        // 20 originals plus 1 inserted plus 15 clones.
        assert_eq!(ledger.drops.get(), 36);
    }

    #[test]
    fn clone_is_deep_and_independent() {
        let original: ManualVec<String> = ["x".to_string(), "y".to_string()].into();
        let mut copy = original.clone();

        assert_eq!(copy, original);
        assert_ne!(copy.as_ptr(), original.as_ptr());

        copy.push("z".to_string());
        copy[0].push('!');
        copy.remove(1);

        assert_eq!(original, ["x", "y"]);
        assert_eq!(original.len(), 2);
        assert_eq!(copy, ["x!", "z"]);
    }

    #[test]
    fn clone_capacity_matches_len() {
        let mut original = ManualVec::<u32>::with_capacity(50);
        original.push(1);
        original.push(2);

        let copy = original.clone();

        assert_eq!(copy.capacity(), 2);
    }

    #[test]
    fn clone_from_into_larger_target_reuses_buffer() {
        let mut target: ManualVec<String> =
            ["a".to_string(), "b".to_string(), "c".to_string()].into();
        let source: ManualVec<String> = ["x".to_string()].into();
        let ptr = target.as_ptr();

        target.clone_from(&source);

        assert_eq!(target, ["x"]);
        assert_eq!(target.as_ptr(), ptr);
        assert_eq!(target.capacity(), 3);
    }

    #[test]
    fn clone_from_grows_within_capacity() {
        let mut target = ManualVec::<String>::with_capacity(8);
        target.push("a".to_string());
        let source: ManualVec<String> = ["x".to_string(), "y".to_string(), "z".to_string()].into();
        let ptr = target.as_ptr();

        target.clone_from(&source);

        assert_eq!(target, ["x", "y", "z"]);
        assert_eq!(target.as_ptr(), ptr);
        assert_eq!(target.capacity(), 8);
    }

    #[test]
    fn clone_from_beyond_capacity_reallocates() {
        let mut target: ManualVec<u32> = [1].into();
        let source: ManualVec<u32> = [7, 8, 9].into();

        target.clone_from(&source);

        assert_eq!(target, [7, 8, 9]);
        assert_eq!(target.capacity(), 3);
    }

    #[test]
    fn clone_from_panic_beyond_capacity_leaves_target_unchanged() {
        let ledger = Ledger::new();
        let mut target = probes(&ledger, 1, ManualVec::new());
        let source = probes(&ledger, 4, ManualVec::new());
        let ptr = target.as_ptr();

        ledger.clone_budget.set(2);

        let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));

        assert!(result.is_err());
        assert_eq!(values(&target), [0]);
        assert_eq!(target.as_ptr(), ptr);

        // The two clones that succeeded were discarded.
        assert_eq!(ledger.drops.get(), 2);
    }

    #[test]
    fn move_transfers_buffer_without_element_work() {
        let ledger = Ledger::new();
        ledger.clone_budget.set(0);

        let original = probes(&ledger, 3, ManualVec::new());
        let ptr = original.as_ptr();

        let moved = original;

        assert_eq!(moved.as_ptr(), ptr);
        assert_eq!(moved.len(), 3);
        assert_eq!(ledger.drops.get(), 0);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut original: ManualVec<u32> = [1, 2, 3].into();
        let ptr = original.as_ptr();

        let moved = mem::take(&mut original);

        assert_eq!(moved.as_ptr(), ptr);
        assert_eq!(moved, [1, 2, 3]);
        assert_eq!(original.len(), 0);
        assert_eq!(original.capacity(), 0);
    }

    #[test]
    fn move_assignment_drops_previous_contents() {
        let ledger = Ledger::new();
        let mut target = probes(&ledger, 4, ManualVec::new());
        let source = probes(&ledger, 2, ManualVec::new());
        let source_ptr = source.as_ptr();

        let previous = mem::replace(&mut target, source);
        assert_eq!(ledger.drops.get(), 0);

        drop(previous);

        assert_eq!(ledger.drops.get(), 4);
        assert_eq!(values(&target), [0, 1]);
        assert_eq!(target.as_ptr(), source_ptr);
    }

    #[test]
    fn panicking_producer_leaves_container_untouched() {
        for capacity in [3, 8] {
            let mut vec = ManualVec::with_capacity(capacity);
            vec.push(1);
            vec.push(2);
            vec.push(3);
            let ptr = vec.as_ptr();

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                vec.insert_with(1, || panic!("producer failed"));
            }));

            assert!(result.is_err());
            assert_eq!(vec, [1, 2, 3]);
            assert_eq!(vec.as_ptr(), ptr);
            assert_eq!(vec.capacity(), capacity);
        }
    }

    #[test]
    fn clone_transfer_grows_by_cloning() {
        let ledger = Ledger::new();
        let vec = probes(&ledger, 5, ManualVec::<Probe>::builder().clone_on_transfer().build());

        // Reallocations at lengths 0, 1, 2 and 4 cloned 0 + 1 + 2 + 4 elements and
        // dropped the originals afterwards.
        assert_eq!(ledger.drops.get(), 7);
        assert_eq!(values(&vec), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn clone_transfer_insert_failure_in_prefix_is_strong() {
        let ledger = Ledger::new();
        let mut vec = probes(&ledger, 4, ManualVec::<Probe>::builder().clone_on_transfer().build());
        assert_eq!(vec.len(), vec.capacity());

        let drops_before = ledger.drops.get();
        let ptr = vec.as_ptr();

        // Fails on the second clone, while transferring the prefix.
        ledger.clone_budget.set(1);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            vec.insert(3, ledger.probe(77));
        }));

        assert!(result.is_err());
        assert_eq!(values(&vec), [0, 1, 2, 3]);
        assert_eq!(vec.capacity(), 4);
        assert_eq!(vec.as_ptr(), ptr);

        // One partial clone and the value to insert were dropped.
        assert_eq!(ledger.drops.get(), drops_before + 2);
    }

    #[test]
    fn clone_transfer_insert_failure_in_suffix_is_strong() {
        let ledger = Ledger::new();
        let mut vec = probes(&ledger, 4, ManualVec::<Probe>::builder().clone_on_transfer().build());

        let drops_before = ledger.drops.get();
        let ptr = vec.as_ptr();

        // Prefix [0, 1) clones fine, the suffix fails on its second clone.
        ledger.clone_budget.set(2);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            vec.insert(1, ledger.probe(77));
        }));

        assert!(result.is_err());
        assert_eq!(values(&vec), [0, 1, 2, 3]);
        assert_eq!(vec.capacity(), 4);
        assert_eq!(vec.as_ptr(), ptr);

        // The prefix clone, the partial suffix clone and the value to insert were dropped.
        assert_eq!(ledger.drops.get(), drops_before + 3);

        // The container is fully usable afterwards.
        ledger.clone_budget.set(usize::MAX);
        vec.insert(1, ledger.probe(77));
        assert_eq!(values(&vec), [0, 77, 1, 2, 3]);
    }

    #[test]
    fn clone_transfer_reserve_failure_is_strong() {
        let ledger = Ledger::new();
        let mut vec = probes(&ledger, 3, ManualVec::<Probe>::builder().clone_on_transfer().build());

        let drops_before = ledger.drops.get();
        let ptr = vec.as_ptr();
        let capacity = vec.capacity();

        ledger.clone_budget.set(2);

        let result = panic::catch_unwind(AssertUnwindSafe(|| vec.reserve(100)));

        assert!(result.is_err());
        assert_eq!(values(&vec), [0, 1, 2]);
        assert_eq!(vec.capacity(), capacity);
        assert_eq!(vec.as_ptr(), ptr);
        assert_eq!(ledger.drops.get(), drops_before + 2);
    }

    #[test]
    fn clone_transfer_resize_failure_is_strong() {
        let ledger = Ledger::new();
        let mut vec = probes(&ledger, 4, ManualVec::<Probe>::builder().clone_on_transfer().build());

        let drops_before = ledger.drops.get();
        let ptr = vec.as_ptr();
        let capacity = vec.capacity();
        let produced = Cell::new(0);

        ledger.clone_budget.set(3);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            vec.resize_with(10, || {
                produced.set(produced.get() + 1);
                ledger.probe(99)
            });
        }));

        assert!(result.is_err());
        assert_eq!(produced.get(), 0);
        assert_eq!(values(&vec), [0, 1, 2, 3]);
        assert_eq!(vec.capacity(), capacity);
        assert_eq!(vec.as_ptr(), ptr);
        // Only the three completed clones were dropped.
        assert_eq!(ledger.drops.get(), drops_before + 3);

        ledger.clone_budget.set(usize::MAX);
        vec.resize_with(6, || ledger.probe(99));
        assert_eq!(values(&vec), [0, 1, 2, 3, 99, 99]);
        assert_eq!(vec.capacity(), 6);
    }

    #[test]
    fn try_push_and_try_insert_grow_like_infallible_forms() {
        let mut vec = ManualVec::new();

        vec.try_push(1).unwrap();
        vec.try_push(3).unwrap();
        assert_eq!(vec.capacity(), 2);

        *vec.try_insert(1, 2).unwrap() += 20;
        assert_eq!(vec, [1, 22, 3]);
        assert_eq!(vec.capacity(), 4);

        let inserted = vec.try_insert_with(0, || 0).unwrap();
        assert_eq!(*inserted, 0);
        assert_eq!(vec, [0, 1, 22, 3]);
        assert_eq!(vec.capacity(), 4);
    }

    #[test]
    #[should_panic]
    fn try_insert_past_end_panics() {
        let mut vec: ManualVec<u32> = [1, 2].into();

        _ = vec.try_insert(3, 9);
    }

    #[test]
    fn try_resize_with_overflow_leaves_container_unchanged() {
        let mut vec: ManualVec<u128> = [1, 2, 3].into();
        let ptr = vec.as_ptr();
        let mut calls = 0;

        let error = vec
            .try_resize_with(usize::MAX / 8, || {
                calls += 1;
                0
            })
            .unwrap_err();

        assert_eq!(
            error,
            AllocError::CapacityOverflow {
                requested: usize::MAX / 8
            }
        );
        assert_eq!(calls, 0);
        assert_eq!(vec, [1, 2, 3]);
        assert_eq!(vec.capacity(), 3);
        assert_eq!(vec.as_ptr(), ptr);
    }

    #[test]
    fn try_resize_with_shrinks_and_grows() {
        let mut vec: ManualVec<u32> = [1, 2, 3, 4].into();

        vec.try_resize_with(2, || unreachable!()).unwrap();
        assert_eq!(vec, [1, 2]);
        assert_eq!(vec.capacity(), 4);

        vec.try_resize_with(5, || 7).unwrap();
        assert_eq!(vec, [1, 2, 7, 7, 7]);
        assert_eq!(vec.capacity(), 5);
    }

    #[test]
    fn grown_capacity_doubles_with_minimum_of_one() {
        let mut vec = ManualVec::<u8>::new();
        assert_eq!(vec.grown_capacity(), Ok(1));

        vec.push(1);
        vec.push(2);
        vec.push(3);
        assert_eq!(vec.grown_capacity(), Ok(6));
    }

    #[test]
    fn move_transfer_never_clones() {
        let ledger = Ledger::new();
        ledger.clone_budget.set(0);

        let mut vec = probes(&ledger, 50, ManualVec::new());
        vec.insert(0, ledger.probe(1000));
        vec.reserve(500);

        assert_eq!(vec.len(), 51);
        assert_eq!(ledger.drops.get(), 0);
    }

    #[test]
    fn zero_sized_elements() {
        let mut vec = ManualVec::new();

        for _ in 0..10 {
            vec.push(());
        }
        vec.insert(3, ());
        vec.remove(0);

        assert_eq!(vec.len(), 10);
        assert_eq!(vec.capacity(), 16);
        assert_eq!(vec.pop(), Some(()));
    }

    #[test]
    fn into_raw_parts_empties_container() {
        let vec: ManualVec<u32> = [1, 2].into();
        let ptr = vec.as_ptr();

        let (storage, len) = vec.into_raw_parts();

        assert_eq!(storage.as_ptr(), ptr);
        assert_eq!(len, 2);
    }
}
