// ABOUTME: Tokio wrapper running blocking state machine operations on the blocking thread pool
// ABOUTME: A mutex keeps one operation in flight per handle, as the engine requires

use crate::client::error::{GammuError, GammuResult};
use crate::client::state_machine::StateMachine;
use crate::engine::Driver;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Async handle around a [`StateMachine`]
///
/// Every call moves to `tokio::task::spawn_blocking`, so a send waiting for its
/// confirmation never stalls the runtime. Calls on one handle run one after the
/// other; clones share the same state machine.
///
/// ```rust
/// use gammu::client::{AsyncStateMachine, StateMachine};
/// use gammu::engine::dummy::DummyDriver;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), gammu::client::GammuError> {
/// let sm = StateMachine::with_driver(DummyDriver::new(), None)?;
/// let phone = AsyncStateMachine::new(sm);
///
/// phone.connect().await?;
/// phone.send_sms("123456", "hi").await?;
/// phone.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncStateMachine<D: Driver> {
    inner: Arc<Mutex<StateMachine<D>>>,
}

impl<D: Driver> Clone for AsyncStateMachine<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Driver> fmt::Debug for AsyncStateMachine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncStateMachine").finish_non_exhaustive()
    }
}

impl<D> AsyncStateMachine<D>
where
    D: Driver + Send + 'static,
    D::Context: Send + 'static,
{
    pub fn new(sm: StateMachine<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sm)),
        }
    }

    /// See [`StateMachine::connect`]
    pub async fn connect(&self) -> GammuResult<()> {
        self.run(|sm| sm.connect()).await
    }

    /// See [`StateMachine::disconnect`]
    pub async fn disconnect(&self) -> GammuResult<()> {
        self.run(|sm| sm.disconnect()).await
    }

    /// See [`StateMachine::send_sms`]
    pub async fn send_sms(
        &self,
        number: impl Into<String>,
        text: impl Into<String>,
    ) -> GammuResult<i32> {
        let (number, text) = (number.into(), text.into());
        self.run(move |sm| sm.send_sms(&number, &text)).await
    }

    /// See [`StateMachine::send_long_sms`]
    pub async fn send_long_sms(
        &self,
        number: impl Into<String>,
        text: impl Into<String>,
    ) -> GammuResult<Vec<i32>> {
        let (number, text) = (number.into(), text.into());
        self.run(move |sm| sm.send_long_sms(&number, &text)).await
    }

    /// See [`StateMachine::free`]
    pub async fn free(&self) -> GammuResult<()> {
        self.run(|sm| {
            sm.free();
            Ok(())
        })
        .await
    }

    /// Waits for any running operation, then reads the timeout
    pub async fn timeout(&self) -> Duration {
        self.inner.lock().await.timeout()
    }

    /// Waits for any running operation, then sets the timeout
    pub async fn set_timeout(&self, timeout: Duration) {
        self.inner.lock().await.set_timeout(timeout);
    }

    /// Returns the state machine once no other clone is left
    pub fn into_inner(self) -> Result<StateMachine<D>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }

    async fn run<T, F>(&self, operation: F) -> GammuResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StateMachine<D>) -> GammuResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let worker = tokio::task::spawn_blocking(move || {
            let mut sm = inner.blocking_lock();
            operation(&mut sm)
        });

        match worker.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                debug!("Blocking worker did not complete: {}", err);
                Err(GammuError::Worker(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::ErrorCode;
    use crate::engine::dummy::{DummyDriver, SendOutcome};

    fn phone(driver: &DummyDriver) -> AsyncStateMachine<DummyDriver> {
        AsyncStateMachine::new(StateMachine::with_driver(driver.clone(), None).unwrap())
    }

    #[tokio::test]
    async fn test_async_send_flow() {
        let driver = DummyDriver::new();
        let phone = phone(&driver);

        phone.connect().await.unwrap();
        assert_eq!(phone.send_sms("123456", "hi").await, Ok(1));
        let refs = phone.send_long_sms("123456", "x".repeat(200)).await.unwrap();
        assert_eq!(refs, vec![2, 3]);
        phone.disconnect().await.unwrap();

        assert_eq!(driver.submitted().len(), 3);
    }

    #[tokio::test]
    async fn test_async_timeout_settings() {
        let driver = DummyDriver::new().with_outcomes([SendOutcome::Silent]);
        let phone = phone(&driver);
        phone.set_timeout(Duration::from_millis(20)).await;
        assert_eq!(phone.timeout().await, Duration::from_millis(20));

        phone.connect().await.unwrap();
        let err = phone.send_sms("1", "lost").await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Timeout));
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_serialized() {
        let driver = DummyDriver::new();
        let phone = phone(&driver);
        phone.connect().await.unwrap();

        let first = phone.clone();
        let second = phone.clone();
        let (a, b) = tokio::join!(first.send_sms("1", "a"), second.send_sms("2", "b"));

        let mut refs = vec![a.unwrap(), b.unwrap()];
        refs.sort();
        assert_eq!(refs, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_free_and_into_inner() {
        let driver = DummyDriver::new();
        let phone = phone(&driver);
        phone.connect().await.unwrap();
        phone.free().await.unwrap();

        assert_eq!(phone.connect().await, Err(GammuError::Freed));
        let sm = phone.into_inner().unwrap();
        assert!(sm.is_freed());
        assert_eq!(driver.frees(), 1);
    }
}
