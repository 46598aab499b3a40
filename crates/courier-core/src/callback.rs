//! Completion handlers.

use crate::error::ClientError;

/// Receives the outcome of one client call, exactly once.
///
/// Transports may complete on any thread, so handlers must be `Send + 'static`.
/// Any `FnOnce(Result<T, ClientError>)` closure is a callback:
///
/// ```
/// use courier_core::{Callback, ClientError};
///
/// fn deliver(cb: impl Callback<u32>) {
///     cb.on_success(7);
/// }
///
/// deliver(|result: Result<u32, ClientError>| assert_eq!(result.unwrap(), 7));
/// ```
pub trait Callback<T>: Send + 'static {
    fn on_success(self, value: T);

    fn on_failure(self, error: ClientError);

    /// Dispatch on a result.
    fn complete(self, result: Result<T, ClientError>)
    where
        Self: Sized,
    {
        match result {
            Ok(value) => self.on_success(value),
            Err(error) => self.on_failure(error),
        }
    }
}

impl<T, F> Callback<T> for F
where
    F: FnOnce(Result<T, ClientError>) + Send + 'static,
{
    fn on_success(self, value: T) {
        self(Ok(value))
    }

    fn on_failure(self, error: ClientError) {
        self(Err(error))
    }
}
