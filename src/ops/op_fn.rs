use std::future::Future;

use async_trait::async_trait;

use crate::ops::operation::Operation;

/// Function-backed operation.
///
/// Wraps an `FnMut` closure that creates a fresh future per attempt. Context
/// and positional arguments are whatever the closure captures; no retry logic
/// lives here.
#[derive(Debug)]
pub struct OperationFn<F> {
    f: F,
}

impl<F> OperationFn<F> {
    /// Wraps a closure as an [`Operation`].
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut, T, E> Operation for OperationFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    async fn call(&mut self) -> Result<T, E> {
        (self.f)().await
    }
}
