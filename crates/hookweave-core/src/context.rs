//! Owned value with an explicit accessor pair.
//!
//! Callers that want to observe reads or writes wrap the accessors
//! themselves; nothing is intercepted implicitly.

/// A single owned value read through [`Context::get`] and written through
/// [`Context::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context<T> {
    current: T,
}

impl<T> Context<T> {
    /// Creates a context holding `value`.
    pub fn new(value: T) -> Self {
        Self { current: value }
    }

    /// Returns the current value.
    pub fn get(&self) -> &T {
        &self.current
    }

    /// Stores `value` and returns a reference to it.
    pub fn set(&mut self, value: T) -> &T {
        self.current = value;
        &self.current
    }

    /// Stores `value` and returns the previous one.
    pub fn replace(&mut self, value: T) -> T {
        std::mem::replace(&mut self.current, value)
    }

    /// Applies `f` to the current value in place.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> &T {
        f(&mut self.current);
        &self.current
    }

    /// Consumes the context and returns the value.
    pub fn into_inner(self) -> T {
        self.current
    }
}

impl<T> From<T> for Context<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
