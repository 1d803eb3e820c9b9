//! Resolver traits for typed resolution.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{DiError, DiResult};
use crate::injection::Promise;
use crate::injector::Injector;
use crate::registration::AnyArc;
use crate::token::Token;

/// Object-safe core of a resolver: token in, type-erased value out.
///
/// Implemented by [`Injector`]. Code that only needs to resolve things can
/// take `&dyn ResolverCore` and stay independent of the injector hierarchy.
pub trait ResolverCore: Send + Sync {
    /// Resolve `token` synchronously.
    fn resolve_any(&self, token: &Token) -> DiResult<AnyArc>;

    /// Resolve `token` through the promise path.
    fn resolve_promise_any(&self, token: &Token) -> Promise;
}

/// Typed helpers over [`ResolverCore`], keyed by the requested type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tokenized_di::{Injector, Provider, Resolver, Token};
///
/// trait Logger: Send + Sync {
///     fn prefix(&self) -> &str;
/// }
///
/// struct Console;
/// impl Logger for Console {
///     fn prefix(&self) -> &str { "[console]" }
/// }
///
/// let logger = Token::symbol("logger");
/// let injector = Injector::new(vec![
///     Provider::value(Token::of::<u16>(), 8080u16),
///     Provider::value(logger.clone(), Arc::new(Console) as Arc<dyn Logger>),
/// ]);
///
/// assert_eq!(*injector.resolve::<u16>().unwrap(), 8080);
/// assert_eq!(injector.resolve_trait::<dyn Logger>(&logger).unwrap().prefix(), "[console]");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolve the type token of `T`.
    fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let token = Token::of::<T>();
        crate::injection::downcast(self.resolve_any(&token)?)
    }

    /// Resolve the type token of `T`, panicking on failure.
    fn resolve_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.resolve::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolve a trait object bound as `Arc<dyn Trait>` under `token`.
    fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        let any = self.resolve_any(token)?;
        // Stored as Arc<Arc<dyn Trait>>
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolve the type token of `T` through the promise path.
    fn resolve_async<T: Send + Sync + 'static>(&self) -> BoxFuture<'static, DiResult<Arc<T>>> {
        self.resolve_promise_any(&Token::of::<T>()).get::<T>().boxed()
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

impl ResolverCore for Injector {
    fn resolve_any(&self, token: &Token) -> DiResult<AnyArc> {
        self.get_any(token)
    }

    fn resolve_promise_any(&self, token: &Token) -> Promise {
        self.get_promise_any(token)
    }
}
