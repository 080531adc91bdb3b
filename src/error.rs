//! Error types for ownership handles

use thiserror::Error;

/// Errors reported by the checked accessors of `Unique` and `Shared`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The handle owns nothing, either because it was created empty or
    /// because its value was moved out, reset or released.
    #[error("null access: dereferenced an empty {handle} handle")]
    NullAccess {
        /// Which handle type was accessed
        handle: &'static str,
    },
}

/// Result type alias for handle accessors
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn null_access_message() {
        let err = Error::NullAccess { handle: "Unique" };
        assert_eq!(
            err.to_string(),
            "null access: dereferenced an empty Unique handle"
        );
    }
}
