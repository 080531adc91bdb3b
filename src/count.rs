use std::cell::UnsafeCell;

/// Non-atomic owner counter shared by the handles of one `Shared` allocation.
///
/// The count is mutated through `&self` the same way a `Cell` is: no reference
/// to the inner integer is ever handed out, and the type is `!Sync` because of
/// the `UnsafeCell`, so only one thread can touch it at a time.
/// ```compile_fail
/// use pointers::count::RefCount;
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<RefCount>();
/// ```
pub struct RefCount {
    value: UnsafeCell<usize>,
}

impl RefCount {
    pub fn new(value: usize) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    pub fn get(&self) -> usize {
        // SAFETY: !Sync, and no reference to the inner value escapes this type.
        unsafe { *self.value.get() }
    }

    pub fn increment(&self) -> usize {
        let next = self
            .get()
            .checked_add(1)
            .unwrap_or_else(|| std::process::abort());
        // SAFETY: same as `get`.
        unsafe { *self.value.get() = next };
        next
    }

    /// Returns the count left after this owner is gone.
    pub fn decrement(&self) -> usize {
        let current = self.get();
        assert!(current > 0, "reference count decremented below zero");
        // SAFETY: same as `get`.
        unsafe { *self.value.get() = current - 1 };
        current - 1
    }
}

#[cfg(test)]
mod tests {
    use super::RefCount;

    #[test]
    fn test_count() {
        let count = RefCount::new(1);
        assert_eq!(count.increment(), 2);
        assert_eq!(count.increment(), 3);
        assert_eq!(count.get(), 3);
        assert_eq!(count.decrement(), 2);
        assert_eq!(count.decrement(), 1);
        assert_eq!(count.decrement(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    #[should_panic(expected = "below zero")]
    fn decrement_past_zero() {
        let count = RefCount::new(0);
        count.decrement();
    }
}
