use crate::error::{Error, Result};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

/// An exclusively owned heap value, or nothing.
///
/// A `Unique<T>` frees its value exactly once: when it is dropped, reset, or
/// overwritten by assignment. Ownership can be moved to another handle but
/// never duplicated; there is no `Clone` impl.
///
/// ```compile_fail
/// use pointers::Unique;
/// let a = Unique::new(5);
/// let b: Unique<i32> = Clone::clone(&a);
/// ```
pub struct Unique<T> {
    ptr: Option<NonNull<T>>,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for Unique<T> {}
unsafe impl<T: Sync> Sync for Unique<T> {}

impl<T> Unique<T> {
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    pub fn empty() -> Self {
        Self {
            ptr: None,
            _marker: PhantomData,
        }
    }

    pub fn from_box(value: Box<T>) -> Self {
        Self {
            // SAFETY: Box::into_raw never returns null.
            ptr: Some(unsafe { NonNull::new_unchecked(Box::into_raw(value)) }),
            _marker: PhantomData,
        }
    }

    /// Takes ownership of a raw pointer. A null pointer gives an empty handle.
    ///
    /// # Safety
    /// `ptr` must be null or come from `Box::into_raw` (or `Unique::release`),
    /// and nothing else may free it afterwards.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            ptr: NonNull::new(ptr),
            _marker: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// The owned address, or null. Ownership stays with `self`.
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    pub fn get(&self) -> Option<&T> {
        // SAFETY: we own the allocation and hand out a borrow tied to &self.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: &mut self guarantees no other borrow of the pointee exists.
        self.ptr.map(|p| unsafe { &mut *p.as_ptr() })
    }

    pub fn try_deref(&self) -> Result<&T> {
        self.get().ok_or(Error::NullAccess { handle: "Unique" })
    }

    pub fn try_deref_mut(&mut self) -> Result<&mut T> {
        self.get_mut().ok_or(Error::NullAccess { handle: "Unique" })
    }

    /// Moves ownership out into a new handle, leaving `self` empty.
    pub fn take(&mut self) -> Unique<T> {
        Unique {
            ptr: self.ptr.take(),
            _marker: PhantomData,
        }
    }

    /// Move-assignment: frees the current value, adopts `other`'s and leaves
    /// `other` empty.
    pub fn assign(&mut self, other: &mut Unique<T>) {
        *self = other.take();
    }

    /// Frees the current value, if any, and leaves the handle empty.
    pub fn reset(&mut self) {
        self.free();
    }

    /// Frees the current value and adopts `value` in its place.
    pub fn reset_to(&mut self, value: T) {
        *self = Self::new(value);
    }

    /// Frees the current value and adopts `ptr`.
    ///
    /// Passing the address already owned is a no-op: the value is not freed.
    ///
    /// # Safety
    /// Same contract as [`Unique::from_raw`].
    pub unsafe fn reset_raw(&mut self, ptr: *mut T) {
        if ptr == self.as_ptr() {
            return;
        }
        self.free();
        self.ptr = NonNull::new(ptr);
    }

    /// Gives up ownership without freeing. The caller becomes responsible for
    /// the returned pointer, which is null if the handle was empty.
    pub fn release(&mut self) -> *mut T {
        match self.ptr.take() {
            Some(p) => {
                log::trace!("Unique released {:p} to caller", p);
                p.as_ptr()
            }
            None => ptr::null_mut(),
        }
    }

    pub fn into_box(mut self) -> Option<Box<T>> {
        // SAFETY: the pointer came from Box::into_raw and is no longer owned by self.
        self.ptr.take().map(|p| unsafe { Box::from_raw(p.as_ptr()) })
    }

    fn free(&mut self) {
        if let Some(p) = self.ptr.take() {
            log::trace!("Unique freeing {:p}", p);
            // SAFETY: take ownership back from the raw pointer and drop T.
            unsafe { drop(Box::from_raw(p.as_ptr())) };
        }
    }
}

impl<T> Default for Unique<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Box<T>> for Unique<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T> Deref for Unique<T> {
    type Target = T;
    fn deref(&self) -> &T {
        match self.try_deref() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> DerefMut for Unique<T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.try_deref_mut() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> Drop for Unique<T> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<T: fmt::Debug> fmt::Debug for Unique<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Unique").field(value).finish(),
            None => f.write_str("Unique(<empty>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Unique;
    use crate::error::Error;
    use std::cell::Cell;

    struct Counter<'a>(&'a Cell<usize>);
    impl Drop for Counter<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_unique() {
        let mut a = Unique::new(String::from("hello"));
        assert_eq!(*a, "hello");
        a.push_str(" world");
        assert_eq!(a.get().map(String::as_str), Some("hello world"));
    }

    #[test]
    fn drop_once() {
        let d = Cell::new(0);
        {
            let _a = Unique::new(Counter(&d));
        }
        assert_eq!(d.get(), 1, "Drop must happen exactly once");
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut a = Unique::new(7);
        let addr = a.as_ptr();
        let b = a.take();
        assert!(a.is_empty());
        assert!(a.as_ptr().is_null());
        assert_eq!(b.as_ptr(), addr);
        assert_eq!(*b, 7);
    }

    #[test]
    fn assign_frees_previous_value() {
        let d = Cell::new(0);
        let mut a = Unique::new(Counter(&d));
        let mut b = Unique::new(Counter(&d));
        let addr = b.as_ptr();

        a.assign(&mut b);
        assert_eq!(d.get(), 1);
        assert!(b.is_empty());
        assert_eq!(a.as_ptr(), addr);

        drop(a);
        drop(b);
        assert_eq!(d.get(), 2);
    }

    #[test]
    fn reset_frees_and_empties() {
        let d = Cell::new(0);
        let mut a = Unique::new(Counter(&d));
        a.reset();
        assert!(a.is_empty());
        assert_eq!(d.get(), 1);
        a.reset();
        drop(a);
        assert_eq!(d.get(), 1);
    }

    #[test]
    fn reset_raw_with_own_address_is_noop() {
        let d = Cell::new(0);
        let mut a = Unique::new(Counter(&d));
        let addr = a.as_ptr();
        unsafe { a.reset_raw(addr) };
        assert_eq!(d.get(), 0);
        assert_eq!(a.as_ptr(), addr);
        drop(a);
        assert_eq!(d.get(), 1);
    }

    #[test]
    fn reset_raw_adopts_new_pointer() {
        let mut a = Unique::new(1);
        let raw = Box::into_raw(Box::new(2));
        unsafe { a.reset_raw(raw) };
        assert_eq!(a.as_ptr(), raw);
        assert_eq!(*a, 2);
    }

    #[test]
    fn release_does_not_free() {
        let d = Cell::new(0);
        let mut a = Unique::new(Counter(&d));
        let raw = a.release();
        assert!(a.is_empty());
        drop(a);
        assert_eq!(d.get(), 0);
        unsafe { drop(Box::from_raw(raw)) };
        assert_eq!(d.get(), 1);
    }

    #[test]
    fn release_empty_is_null() {
        let mut a = Unique::<u8>::empty();
        assert!(a.release().is_null());
    }

    #[test]
    fn from_raw_null_is_empty() {
        let a = unsafe { Unique::<i32>::from_raw(std::ptr::null_mut()) };
        assert!(a.is_empty());
        assert_eq!(
            a.try_deref().unwrap_err(),
            Error::NullAccess { handle: "Unique" }
        );
    }

    #[test]
    #[should_panic(expected = "null access")]
    fn deref_empty_panics() {
        let a = Unique::<i32>::default();
        let _ = *a;
    }

    #[test]
    fn into_box_hands_back_value() {
        let a = Unique::new(vec![1, 2, 3]);
        let boxed = a.into_box().unwrap();
        assert_eq!(*boxed, vec![1, 2, 3]);
        assert!(Unique::<u8>::empty().into_box().is_none());
    }

    #[test]
    fn debug_output() {
        assert_eq!(format!("{:?}", Unique::new(3)), "Unique(3)");
        assert_eq!(format!("{:?}", Unique::<i32>::empty()), "Unique(<empty>)");
    }
}
