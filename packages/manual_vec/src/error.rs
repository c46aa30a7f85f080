use std::alloc::{Layout, handle_alloc_error};

use thiserror::Error;

/// Errors that can occur when acquiring memory for a [`RawStorage`][crate::RawStorage].
///
/// Only the fallible `try_` family of methods returns this error. The infallible methods
/// panic on [`CapacityOverflow`][AllocError::CapacityOverflow] and hand
/// [`AllocatorFailure`][AllocError::AllocatorFailure] to [`std::alloc::handle_alloc_error`].
///
/// Allocation always happens before any element is touched, so a container that returns this
/// error is left exactly as it was before the call.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum AllocError {
    /// The requested number of elements does not fit in a single allocation because the
    /// total size in bytes would exceed `isize::MAX`.
    #[error("capacity overflow: storage for {requested} elements exceeds the maximum allocation size")]
    CapacityOverflow {
        /// The number of element slots that was requested.
        requested: usize,
    },

    /// The global allocator could not satisfy the request.
    #[error("memory allocator failed to provide a block of {layout:?}")]
    AllocatorFailure {
        /// The layout that was passed to the allocator.
        layout: Layout,
    },
}

/// Unwraps the result of a fallible allocation for the infallible API surface.
///
/// Capacity overflow is a caller bug and panics. Allocator failure is routed to
/// [`handle_alloc_error`], matching the behavior of the standard collections.
pub(crate) fn infallible<T>(result: Result<T, AllocError>) -> T {
    match result {
        Ok(value) => value,
        Err(AllocError::CapacityOverflow { requested }) => {
            panic!("capacity overflow: cannot allocate storage for {requested} elements")
        }
        Err(AllocError::AllocatorFailure { layout }) => handle_alloc_error(layout),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AllocError: Send, Sync, Debug, Clone, std::error::Error);

    #[test]
    fn infallible_passes_through_success() {
        assert_eq!(infallible::<u32>(Ok(42)), 42);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn infallible_panics_on_capacity_overflow() {
        infallible::<()>(Err(AllocError::CapacityOverflow { requested: usize::MAX }));
    }

    #[test]
    fn display_mentions_requested_count() {
        let error = AllocError::CapacityOverflow { requested: 12345 };

        assert!(error.to_string().contains("12345"));
    }

    #[test]
    fn display_mentions_layout() {
        let layout = Layout::new::<u64>();
        let error = AllocError::AllocatorFailure { layout };

        assert!(error.to_string().contains("size: 8"));
    }
}
