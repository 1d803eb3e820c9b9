use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult};
use crate::injector::WeakInjector;
use crate::internal::{Construction, ResolutionChain};
use crate::registration::AnyArc;
use crate::token::Token;

/// Deferred accessor for a lazily injected dependency.
///
/// Nothing is resolved until the first call to [`get`](Lazy::get) (or one of
/// its variants). The first successful resolution is memoized, so every later
/// call on this accessor and on its clones returns the same value. A failed
/// resolution is not memoized and is retried on the next call.
///
/// The accessor resolves against the injector that built its owner, and holds
/// that injector weakly: once the injector is dropped the accessor fails with
/// [`DiError::InjectorDropped`].
///
/// Using the accessor while its owner's constructor is still running resolves
/// along the owner's resolution chain, so asking for the owner itself (or
/// anything that needs it) fails with [`DiError::CyclicDependency`].
#[derive(Clone)]
pub struct Lazy {
    inner: Arc<LazyInner>,
}

struct LazyInner {
    injector: WeakInjector,
    token: Token,
    cell: OnceCell<AnyArc>,
    /// Chain and constructor of the instantiation this accessor was made for
    origin: Option<(ResolutionChain, Construction)>,
}

impl Lazy {
    pub(crate) fn new(injector: WeakInjector, token: Token) -> Self {
        Self::with_origin(injector, token, None)
    }

    /// Accessor injected into a constructor resolving along `chain`.
    pub(crate) fn within(
        injector: WeakInjector,
        token: Token,
        chain: ResolutionChain,
        construction: Construction,
    ) -> Self {
        Self::with_origin(injector, token, Some((chain, construction)))
    }

    fn with_origin(
        injector: WeakInjector,
        token: Token,
        origin: Option<(ResolutionChain, Construction)>,
    ) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                injector,
                token,
                cell: OnceCell::new(),
                origin,
            }),
        }
    }

    /// The token this accessor resolves.
    pub fn token(&self) -> &Token {
        &self.inner.token
    }

    /// Whether the value has already been resolved and memoized.
    pub fn is_resolved(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// Resolve synchronously, or return the memoized value.
    pub fn get_any(&self) -> DiResult<AnyArc> {
        self.inner
            .cell
            .get_or_try_init(|| {
                let injector = self.inner.injector.upgrade().ok_or_else(|| self.dropped())?;
                injector.resolve_sync(&self.inner.token, &self.chain())
            })
            .cloned()
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        super::downcast(self.get_any()?)
    }

    /// Resolve through the injector's promise path, or return the memoized value.
    ///
    /// Concurrent first calls share the injector's in-flight promise, so they
    /// still observe one instance.
    pub async fn get_async_any(&self) -> DiResult<AnyArc> {
        if let Some(value) = self.inner.cell.get() {
            return Ok(value.clone());
        }

        let pending = match self.inner.injector.upgrade() {
            Some(injector) => injector.resolve_promise(&self.inner.token, &self.chain())?,
            None => return Err(self.dropped()),
        };
        let value = pending.await?;

        // A racing caller may have memoized first; keep theirs
        Ok(self.inner.cell.get_or_init(|| value).clone())
    }

    pub async fn get_async<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        super::downcast(self.get_async_any().await?)
    }

    /// The owner's chain while its constructor runs, a fresh one afterwards.
    fn chain(&self) -> ResolutionChain {
        match &self.inner.origin {
            Some((chain, construction)) if construction.is_running() => chain.clone(),
            _ => ResolutionChain::root(),
        }
    }

    fn dropped(&self) -> DiError {
        DiError::InjectorDropped {
            token: self.inner.token.clone(),
        }
    }
}

impl std::fmt::Debug for Lazy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy")
            .field("token", &self.inner.token)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
