//! Utility macros shared by the sender and its configuration.

/// Returns early with the given error when the predicate does not hold.
///
/// Works like `assert!`, but hands the error back to the caller instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(config.capacity > 0, SenderError::invalid_config("capacity must be positive"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
