//! Unified error interface for nosleep.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that the
//! RPC layer and the CLI can report failures with a stable,
//! machine-readable code.
//!
//! # Code Format
//!
//! - UPPER_SNAKE_CASE
//! - Prefixed with the owning layer (`PLATFORM_`, `MANAGER_`, `SERVICE_`,
//!   `RPC_`, `CONFIG_`)
//! - Stable once published (clients may match on them)
//!
//! # Example
//!
//! ```
//! use nosleep_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Busy,
//!     Broken,
//! }
//!
//! impl ErrorCode for MyError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Busy => "MY_BUSY",
//!             Self::Broken => "MY_BROKEN",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! assert_eq!(MyError::Busy.code(), "MY_BUSY");
//! assert!(!MyError::Broken.is_recoverable());
//! ```

/// Machine-readable error code plus a retry hint.
pub trait ErrorCode {
    /// Returns the stable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying (or a user action) may succeed.
    ///
    /// A failed platform call is recoverable: the manager keeps running
    /// and the next call may go through. Calling a stopped manager is not.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Validates every variant of an error enum at once.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
