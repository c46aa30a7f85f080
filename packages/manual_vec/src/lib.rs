//! A growable contiguous sequence built on an explicitly managed raw buffer.
//!
//! This crate provides two layers:
//!
//! - [`RawStorage<T>`] owns an uninitialized block of memory with room for a fixed number of
//!   `T`. It never constructs or drops elements; it only acquires and releases memory.
//! - [`ManualVec<T, P>`] builds a sequence on top of that block, tracking which leading slots
//!   hold constructed values and moving them to a larger block when it runs out of room.
//!
//! # Key Features
//!
//! - **Amortized O(1) append**: When full, the capacity grows to `max(1, 2 * len)`
//! - **Exact reservation**: [`reserve()`](ManualVec::reserve) allocates exactly what you ask for
//!   and never shrinks
//! - **Failure safety**: Reallocating operations build the complete new buffer before touching
//!   the old one, so an allocation failure or panicking element clone leaves the container as
//!   it was
//! - **Compile-time transfer policy**: Choose between bitwise relocation ([`MoveElements`], the
//!   default) and clone-then-drop ([`CloneElements`]) per container type
//! - **Fallible allocation**: Construction, reservation, insertion and growing resize each have
//!   a `try_` variant that returns [`AllocError`] instead of aborting
//! - **Slice access**: The container dereferences to `[T]`, giving access to the whole slice API
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```rust
//! use manual_vec::ManualVec;
//!
//! let mut numbers = ManualVec::new();
//!
//! for value in 1..=5 {
//!     numbers.push(value * 10);
//! }
//!
//! assert_eq!(numbers.len(), 5);
//! assert_eq!(numbers.capacity(), 8);
//! assert_eq!(numbers, [10, 20, 30, 40, 50]);
//!
//! numbers.insert(0, 0);
//! assert_eq!(numbers.remove(3), 30);
//! assert_eq!(numbers.pop(), Some(50));
//!
//! assert_eq!(numbers, [0, 10, 20, 40]);
//! ```
//!
//! ## Fallible Allocation
//!
//! ```rust
//! use manual_vec::{AllocError, ManualVec};
//!
//! let mut numbers: ManualVec<u64> = [1, 2, 3].into();
//!
//! match numbers.try_reserve(usize::MAX) {
//!     Ok(()) => unreachable!("no system has that much memory"),
//!     Err(AllocError::CapacityOverflow { requested }) => assert_eq!(requested, usize::MAX),
//!     Err(other) => panic!("unexpected error: {other}"),
//! }
//!
//! // The container is unchanged after a failed reservation.
//! assert_eq!(numbers, [1, 2, 3]);
//! ```
//!
//! ## Working With Raw Storage
//!
//! ```rust
//! use manual_vec::RawStorage;
//!
//! let storage = RawStorage::<u32>::with_capacity(4);
//!
//! // SAFETY: Offset 0 is within the capacity and the slot is uninitialized.
//! unsafe { storage.slot(0).write(42) };
//!
//! // SAFETY: We just initialized the slot. `u32` has no destructor, so we do not need to
//! // drop it before the storage goes away.
//! assert_eq!(unsafe { storage.slot(0).read() }, 42);
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod builder;
mod error;
mod into_iter;
mod raw_storage;
mod transfer;
mod vec;
mod vec_traits;

pub use builder::*;
pub use error::AllocError;
pub(crate) use error::infallible;
pub use into_iter::*;
pub use raw_storage::*;
pub(crate) use transfer::clone_into_uninit;
pub use transfer::{CloneElements, MoveElements, Transfer};
pub use vec::*;
