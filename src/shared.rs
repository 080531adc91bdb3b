use crate::count::RefCount;
use crate::error::{Error, Result};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::{self, NonNull};

/// Single-threaded shared ownership of a heap value with a manual owner count.
///
/// Cloning a `Shared<T>` adds an owner to the same allocation; dropping, resetting
/// or overwriting a handle removes one. The value and its count live in one
/// allocation and are freed together when the last owner goes away.
///
/// Every constructed handle owns a count, even one made with no value
/// (`empty`, `Default`, a null `from_raw`). Only a handle whose share was
/// moved out or given up (`take`, `assign`, `reset`) holds no count and
/// reports a `use_count` of 0.
///
/// The count is not atomic, so handles cannot leave their thread:
/// ```compile_fail
/// use pointers::Shared;
/// let a = Shared::new(5);
/// std::thread::spawn(move || println!("{}", *a));
/// ```
pub struct Shared<T> {
    inner: Option<NonNull<SharedInner<T>>>,
    _marker: PhantomData<SharedInner<T>>,
}

struct SharedInner<T> {
    value: Option<T>,
    count: RefCount,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self::with_value(Some(value))
    }

    /// A handle that owns no value but still starts its own count of 1.
    pub fn empty() -> Self {
        Self::with_value(None)
    }

    fn with_value(value: Option<T>) -> Self {
        let inner = Box::new(SharedInner {
            value,
            count: RefCount::new(1),
        });
        Self {
            // SAFETY: Box::into_raw never returns null.
            inner: Some(unsafe { NonNull::new_unchecked(Box::into_raw(inner)) }),
            _marker: PhantomData,
        }
    }

    /// Moves the boxed value into a fresh shared allocation with a count of 1.
    pub fn from_box(value: Box<T>) -> Self {
        Self::new(*value)
    }

    /// Takes ownership of a raw pointer. A null pointer gives a valueless
    /// handle with a count of 1, like [`Shared::empty`].
    ///
    /// The pointee is moved into a new allocation next to its count, so
    /// `as_ptr` on the result does not return `ptr`.
    ///
    /// # Safety
    /// `ptr` must be null or come from `Box::into_raw`. The allocation behind
    /// `ptr` is freed before this returns: `ptr` must not be read, written,
    /// freed or passed to `from_raw` again afterwards. Further owners are
    /// made with `clone`.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        if ptr.is_null() {
            return Self::empty();
        }
        // SAFETY: caller guarantees `ptr` is a live Box allocation we now own.
        Self::from_box(unsafe { Box::from_raw(ptr) })
    }

    fn inner(&self) -> Option<&SharedInner<T>> {
        // SAFETY: the allocation stays alive while this handle holds a count.
        self.inner.map(|p| unsafe { &*p.as_ptr() })
    }

    /// True when the handle gives access to no value, whether or not it
    /// still holds a count.
    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }

    /// Number of handles sharing this count, or 0 for a handle that holds none.
    pub fn use_count(&self) -> usize {
        self.inner().map_or(0, |inner| inner.count.get())
    }

    /// Address of the shared value, or null. Ownership is unchanged.
    pub fn as_ptr(&self) -> *mut T {
        self.get()
            .map_or(ptr::null_mut(), |value| value as *const T as *mut T)
    }

    pub fn get(&self) -> Option<&T> {
        self.inner().and_then(|inner| inner.value.as_ref())
    }

    /// Mutable access, only while this is the sole owner.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.use_count() != 1 {
            return None;
        }
        // SAFETY: count is 1 and we hold &mut self, so nobody else can see the value.
        self.inner
            .and_then(|p| unsafe { (*p.as_ptr()).value.as_mut() })
    }

    pub fn try_deref(&self) -> Result<&T> {
        self.get().ok_or(Error::NullAccess { handle: "Shared" })
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.inner == other.inner
    }

    /// Moves this handle's share into a new handle, leaving `self` empty.
    /// The count does not change.
    pub fn take(&mut self) -> Shared<T> {
        Shared {
            inner: self.inner.take(),
            _marker: PhantomData,
        }
    }

    /// Move-assignment: gives up this handle's share, adopts `other`'s and
    /// leaves `other` empty.
    pub fn assign(&mut self, other: &mut Shared<T>) {
        *self = other.take();
    }

    /// Gives up this handle's share and leaves it empty.
    pub fn reset(&mut self) {
        self.release();
    }

    /// Returns the value if this is the last owner, otherwise hands the
    /// handle back unchanged.
    pub fn try_unwrap(mut self) -> std::result::Result<T, Self> {
        if self.use_count() != 1 || self.is_empty() {
            return Err(self);
        }
        match self.inner.take() {
            Some(p) => {
                // SAFETY: sole owner; the allocation came from Box::into_raw.
                let inner = unsafe { Box::from_raw(p.as_ptr()) };
                inner.value.ok_or(self)
            }
            None => Err(self),
        }
    }

    fn release(&mut self) {
        let Some(p) = self.inner.take() else {
            return;
        };
        // SAFETY: this handle still held a count, so the allocation is live.
        let remaining = unsafe { p.as_ref() }.count.decrement();
        if remaining == 0 {
            log::trace!("Shared freeing {:p}, last owner released", p);
            // take ownership and drop SharedInner: value and count together
            unsafe { drop(Box::from_raw(p.as_ptr())) };
        }
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner() {
            inner.count.increment();
        }
        Self {
            inner: self.inner,
            _marker: PhantomData,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if Shared::ptr_eq(self, source) {
            return;
        }
        *self = source.clone();
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Box<T>> for Shared<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;
    fn deref(&self) -> &T {
        match self.try_deref() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f
                .debug_struct("Shared")
                .field("value", value)
                .field("use_count", &self.use_count())
                .finish(),
            None => f
                .debug_struct("Shared")
                .field("value", &format_args!("<empty>"))
                .field("use_count", &self.use_count())
                .finish(),
        }
    }
}
