//! Async factory support for providers whose construction has to await.
//!
//! This module provides the factory trait behind `Provider::class_async` and
//! `Provider::factory_async`, for services that need asynchronous
//! initialization such as connection pools, network handshakes or warm-up.

use async_trait::async_trait;

use crate::error::BoxError;
use crate::injection::Args;

/// Trait for factories that create services asynchronously.
///
/// The factory receives its resolved parameters as owned [`Args`]. Closures
/// taking `Args` and returning a future implement it automatically.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use tokenized_di::{Annotations, Args, AsyncFactory, BoxError, Injector, Provider, Token};
///
/// struct DatabasePool {
///     connection_string: String,
/// }
///
/// struct PoolFactory {
///     connection_string: String,
/// }
///
/// #[async_trait]
/// impl AsyncFactory<DatabasePool> for PoolFactory {
///     async fn create(&self, _args: Args) -> Result<DatabasePool, BoxError> {
///         Ok(DatabasePool { connection_string: self.connection_string.clone() })
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let injector = Injector::new(vec![Provider::class_async(
///     &Annotations::new(),
///     PoolFactory { connection_string: "postgres://localhost".to_string() },
/// )]);
///
/// let pool = injector.get_promise::<DatabasePool>(&Token::of::<DatabasePool>()).await?;
/// assert_eq!(pool.connection_string, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait AsyncFactory<T: Send + Sync + 'static>: Send + Sync {
    /// Creates a new instance of the service asynchronously.
    async fn create(&self, args: Args) -> Result<T, BoxError>;
}

/// Helper impl for creating async factories from closures.
#[async_trait]
impl<T, F, Fut> AsyncFactory<T> for F
where
    T: Send + Sync + 'static,
    F: Fn(Args) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<T, BoxError>> + Send,
{
    async fn create(&self, args: Args) -> Result<T, BoxError> {
        self(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct AsyncService {
        value: String,
    }

    struct AsyncServiceFactory {
        init_count: Arc<AtomicU32>,
    }

    #[async_trait]
    impl AsyncFactory<AsyncService> for AsyncServiceFactory {
        async fn create(&self, _args: Args) -> Result<AsyncService, BoxError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.init_count.fetch_add(1, Ordering::Relaxed);
            Ok(AsyncService {
                value: "async initialized".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn struct_factory_creates_value() {
        let init_count = Arc::new(AtomicU32::new(0));
        let factory = AsyncServiceFactory {
            init_count: init_count.clone(),
        };

        let service = factory.create(Args::default()).await.unwrap();
        assert_eq!(service.value, "async initialized");
        assert_eq!(init_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn closure_factory_creates_value() {
        let factory = |args: Args| async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok::<_, BoxError>(format!("closure with {} args", args.len()))
        };

        let service = factory.create(Args::default()).await.unwrap();
        assert_eq!(service, "closure with 0 args");
    }
}
