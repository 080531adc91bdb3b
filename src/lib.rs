pub mod count;
pub mod error;
mod shared;
mod unique;

pub use error::{Error, Result};
pub use shared::Shared;
pub use unique::Unique;

/// Allocates `value` on the heap and hands it to a new `Unique`.
pub fn make_unique<T>(value: T) -> Unique<T> {
    Unique::new(value)
}

/// Like [`make_unique`], building the value in place from `f`.
pub fn make_unique_with<T, F: FnOnce() -> T>(f: F) -> Unique<T> {
    Unique::new(f())
}

/// Allocates `value` next to a fresh owner count of 1 and returns the first owner.
///
/// This and `Clone` are the only safe ways to create shared owners, so two
/// independent counts can never exist for one value.
pub fn make_shared<T>(value: T) -> Shared<T> {
    Shared::new(value)
}

/// Like [`make_shared`], building the value in place from `f`.
pub fn make_shared_with<T, F: FnOnce() -> T>(f: F) -> Shared<T> {
    Shared::new(f())
}

/*
# Unique
## Exclusive Ownership:
Exactly one handle owns the value. Ownership moves (`take`, `assign`, plain moves) and is never copied.

## Explicit Hand-off:
`release` gives the raw pointer back to the caller without freeing; `reset` frees early.

# Shared
## Multiple Ownership:
Handles made by `clone` share one value and one counter; the last one dropped frees both.

## Single Threaded:
The counter is a plain integer, so handles are !Send and !Sync. No weak handles, so cycles leak.
*/
