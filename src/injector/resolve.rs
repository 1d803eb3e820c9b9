//! The recursive resolution procedure behind `get` and `get_promise`.
//!
//! Both paths share the same steps: cycle check, cache check, provider lookup,
//! parameter resolution, instantiation and caching in the owning injector.
//! The synchronous path never suspends. The promise path starts every
//! parameter's resolution before it returns, then either instantiates on the
//! spot (when everything it needs has already settled) or installs a pending
//! placeholder that concurrent requests share.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{self, BoxFuture, FutureExt};

use crate::descriptors::{InjectionMode, ProviderKind};
use crate::error::{DiError, DiResult};
use crate::injection::{Arg, Args, Lazy, Promise, SharedResolution, SuperConstructor};
use crate::internal::{Construction, ResolutionChain};
use crate::observer::Observers;
use crate::registration::{AnyArc, Ctor, Provider};
use crate::token::Token;

use super::{CacheSlot, Injector};

/// Parameter of a promise-mode resolution, possibly still in flight.
enum PendingArg {
    Ready(Arg),
    Value(Promise),
    Promise(Promise),
    /// Base constructor whose own parameters may still be in flight
    Super { base: Arc<Provider>, args: Vec<PendingArg> },
}

impl PendingArg {
    fn settle(self) -> BoxFuture<'static, DiResult<Arg>> {
        async move {
            Ok(match self {
                PendingArg::Ready(arg) => arg,
                PendingArg::Value(promise) => Arg::Value(promise.value().await?),
                PendingArg::Promise(promise) => Arg::Promise(Promise::resolved(promise.value().await?)),
                PendingArg::Super { base, args } => {
                    let args = future::try_join_all(args.into_iter().map(PendingArg::settle)).await?;
                    Arg::Super(SuperConstructor::new(base, Args::new(args)))
                }
            })
        }
        .boxed()
    }

    /// `None` while pending.
    fn try_settled(&self) -> Option<DiResult<Arg>> {
        match self {
            PendingArg::Ready(arg) => Some(Ok(arg.clone())),
            PendingArg::Value(promise) => promise.peek().map(|r| r.map(Arg::Value)),
            PendingArg::Promise(promise) => promise
                .peek()
                .map(|r| r.map(|value| Arg::Promise(Promise::resolved(value)))),
            PendingArg::Super { base, args } => Some(match settled_now(args) {
                Ok(Some(args)) => Ok(Arg::Super(SuperConstructor::new(base.clone(), args))),
                Ok(None) => return None,
                Err(error) => Err(error),
            }),
        }
    }
}

/// The arguments, if every one of them has already settled.
fn settled_now(pending: &[PendingArg]) -> DiResult<Option<Args>> {
    let mut args = Vec::with_capacity(pending.len());
    for arg in pending {
        match arg.try_settled() {
            Some(settled) => args.push(settled?),
            None => return Ok(None),
        }
    }
    Ok(Some(Args::new(args)))
}

/// The provider a `SuperConstructor` parameter of `provider` builds.
fn super_base(provider: &Provider) -> DiResult<Arc<Provider>> {
    match provider.base_provider() {
        Some(base) if provider.kind() == ProviderKind::Class => Ok(base),
        _ => Err(DiError::MissingSuperConstructor {
            token: provider.token().clone(),
        }),
    }
}

/// Run a provider's constructor, reporting to observers.
async fn construct(
    token: &Token,
    provider: &Provider,
    args: Args,
    observers: &Observers,
    building: &Construction,
) -> DiResult<AnyArc> {
    let start = observers.has_observers().then(Instant::now);
    observers.resolving(token);

    let result = {
        let _running = building.start();
        match &provider.ctor {
            Ctor::Sync(ctor) => ctor(&args),
            Ctor::Async(ctor) => ctor(args).await,
        }
    }
    .map_err(|cause| DiError::instantiation(token, cause));

    match &result {
        Ok(_) => observers.resolved(token, start.map(|s| s.elapsed()).unwrap_or_default()),
        Err(error) => observers.failed(token, error),
    }
    result
}

impl Injector {
    pub(crate) fn resolve_sync(&self, token: &Token, chain: &ResolutionChain) -> DiResult<AnyArc> {
        let chain = chain.enter(token, self.inner.config.max_depth)?;

        if let Some(slot) = self.cached(token) {
            return slot.into_sync(token);
        }

        let (owner, provider) = self.locate(token, &chain)?;
        if provider.is_promise() {
            return Err(DiError::AsyncDependencyInSyncContext {
                token: token.clone(),
            });
        }

        let transient = provider.is_transient();
        if !transient && !owner.ptr_eq(self) {
            if let Some(slot) = owner.cached(token) {
                return slot.into_sync(token);
            }
        }

        let building = Construction::default();
        let args = owner.sync_args(&provider, &chain, &building)?;
        let value = owner.instantiate(token, &provider, &args, &building)?;
        if transient {
            Ok(value)
        } else {
            Ok(owner.store_ready(token, value, false))
        }
    }

    pub(crate) fn resolve_promise(&self, token: &Token, chain: &ResolutionChain) -> DiResult<Promise> {
        let chain = chain.enter(token, self.inner.config.max_depth)?;

        if let Some(slot) = self.cached(token) {
            return Ok(slot.into_promise());
        }

        let (owner, provider) = self.locate(token, &chain)?;
        let transient = provider.is_transient();
        if !transient && !owner.ptr_eq(self) {
            if let Some(slot) = owner.cached(token) {
                return Ok(slot.into_promise());
            }
        }

        let building = Construction::default();
        let pending = owner.promise_args(&provider, &chain, &building)?;

        // A synchronous constructor whose inputs are all in hand runs right away
        if let Ctor::Sync(_) = provider.ctor {
            if let Some(args) = settled_now(&pending)? {
                let value = owner.instantiate(token, &provider, &args, &building)?;
                let value = if transient {
                    value
                } else {
                    owner.store_ready(token, value, provider.is_promise())
                };
                return Ok(Promise::resolved(value));
            }
        }

        Ok(owner.start_pending(token, provider, pending, building))
    }

    /// Nearest injector binding `token`, with its provider.
    ///
    /// Falls back to the token's default provider, registered implicitly in
    /// the injector that should own it.
    fn locate(&self, token: &Token, chain: &ResolutionChain) -> DiResult<(Injector, Arc<Provider>)> {
        let mut current = Some(self);
        while let Some(injector) = current {
            if let Some(provider) = injector.inner.registry.read().get(token) {
                return Ok((injector.clone(), provider.clone()));
            }
            current = injector.inner.parent.as_ref();
        }

        match token.default_provider() {
            Some(provider) => {
                let owner = self.default_owner(&provider);
                let provider = owner.register_implicit(token, provider);
                Ok((owner, provider))
            }
            None => Err(DiError::NoProvider {
                token: token.clone(),
                chain: chain.tokens(),
            }),
        }
    }

    /// The root, unless a nearer injector forces new instances of one of the provider's scopes.
    fn default_owner(&self, provider: &Provider) -> Injector {
        let mut current = self;
        loop {
            let forced = current
                .inner
                .force_new_instances_of
                .iter()
                .any(|scope| provider.has_scope(scope));
            match &current.inner.parent {
                Some(parent) if !forced => current = parent,
                _ => return current.clone(),
            }
        }
    }

    fn register_implicit(&self, token: &Token, provider: Provider) -> Arc<Provider> {
        let mut registry = self.inner.registry.write();
        // Double-checked: another thread may have registered it first
        if let Some(existing) = registry.get(token) {
            return existing.clone();
        }
        let provider = Arc::new(provider);
        registry.insert_as(token.clone(), provider.clone());
        tracing::debug!(
            injector = self.inner.config.label(),
            token = %token,
            "registered default provider"
        );
        provider
    }

    fn lazy(&self, token: &Token, chain: &ResolutionChain, building: &Construction) -> Lazy {
        Lazy::within(self.downgrade(), token.clone(), chain.clone(), building.clone())
    }

    fn sync_args(&self, provider: &Provider, chain: &ResolutionChain, building: &Construction) -> DiResult<Args> {
        provider.ensure_annotated()?;

        let mut args = Vec::with_capacity(provider.params().len());
        for param in provider.params() {
            let arg = if param.token.is::<SuperConstructor>() {
                let base = super_base(provider)?;
                let base_args = self.sync_args(&base, chain, building)?;
                Arg::Super(SuperConstructor::new(base, base_args))
            } else {
                match param.mode {
                    InjectionMode::Lazy => Arg::Lazy(self.lazy(&param.token, chain, building)),
                    InjectionMode::Promise => Arg::Promise(self.resolve_promise(&param.token, chain)?),
                    InjectionMode::Direct => Arg::Value(self.resolve_sync(&param.token, chain)?),
                }
            };
            args.push(arg);
        }
        Ok(Args::new(args))
    }

    /// Starts every parameter's resolution without waiting on any of them.
    fn promise_args(
        &self,
        provider: &Provider,
        chain: &ResolutionChain,
        building: &Construction,
    ) -> DiResult<Vec<PendingArg>> {
        provider.ensure_annotated()?;

        let mut args = Vec::with_capacity(provider.params().len());
        for param in provider.params() {
            let arg = if param.token.is::<SuperConstructor>() {
                let base = super_base(provider)?;
                let base_args = self.promise_args(&base, chain, building)?;
                PendingArg::Super { base, args: base_args }
            } else {
                match param.mode {
                    InjectionMode::Lazy => PendingArg::Ready(Arg::Lazy(self.lazy(&param.token, chain, building))),
                    InjectionMode::Promise => PendingArg::Promise(self.resolve_promise(&param.token, chain)?),
                    InjectionMode::Direct => PendingArg::Value(self.resolve_promise(&param.token, chain)?),
                }
            };
            args.push(arg);
        }
        Ok(args)
    }

    fn instantiate(
        &self,
        token: &Token,
        provider: &Provider,
        args: &Args,
        building: &Construction,
    ) -> DiResult<AnyArc> {
        let Ctor::Sync(ctor) = &provider.ctor else {
            return Err(DiError::AsyncDependencyInSyncContext {
                token: token.clone(),
            });
        };

        let observers = &self.inner.observers;
        let start = observers.has_observers().then(Instant::now);
        observers.resolving(token);

        let result = {
            let _running = building.start();
            ctor(args)
        };
        match result {
            Ok(value) => {
                observers.resolved(token, start.map(|s| s.elapsed()).unwrap_or_default());
                Ok(value)
            }
            Err(cause) => {
                let error = DiError::instantiation(token, cause);
                observers.failed(token, &error);
                Err(error)
            }
        }
    }

    /// Wraps the rest of the resolution in a shared future and caches it as pending.
    fn start_pending(
        &self,
        token: &Token,
        provider: Arc<Provider>,
        pending: Vec<PendingArg>,
        building: Construction,
    ) -> Promise {
        let id = self.inner.next_slot.fetch_add(1, Ordering::Relaxed);
        let transient = provider.is_transient();
        let promised = provider.is_promise();
        let owner = self.downgrade();
        let observers = self.inner.observers.clone();
        let token_owned = token.clone();

        let resolution: SharedResolution = async move {
            let token = token_owned;
            let result = match future::try_join_all(pending.into_iter().map(PendingArg::settle)).await {
                Ok(args) => construct(&token, &provider, Args::new(args), &observers, &building).await,
                Err(error) => {
                    observers.failed(&token, &error);
                    Err(error)
                }
            };

            // The cache dies with its injector; waiters still get the result
            if !transient {
                if let Some(owner) = owner.upgrade() {
                    owner.settle(&token, id, &result);
                }
            }
            result
        }
        .boxed()
        .shared();

        if transient {
            return Promise::pending(resolution);
        }
        self.store_pending(token, id, promised, resolution)
    }

    fn cached(&self, token: &Token) -> Option<CacheSlot> {
        let slot = self.inner.cache.lock().get(token).cloned();
        if slot.is_some() {
            tracing::trace!(injector = self.inner.config.label(), token = %token, "cache hit");
        }
        slot
    }

    /// Caches `value` unless an instance got there first, returning the winner.
    ///
    /// `promised` values stay reachable only through promises.
    fn store_ready(&self, token: &Token, value: AnyArc, promised: bool) -> AnyArc {
        let mut cache = self.inner.cache.lock();
        if let Some(CacheSlot::Ready(existing) | CacheSlot::Promised(existing)) = cache.get(token) {
            return existing.clone();
        }
        cache.insert(token.clone(), CacheSlot::settled(value.clone(), promised));
        value
    }

    /// Installs the pending placeholder, or joins the one already there.
    fn store_pending(&self, token: &Token, id: u64, promised: bool, resolution: SharedResolution) -> Promise {
        let mut cache = self.inner.cache.lock();
        if let Some(slot) = cache.get(token) {
            return slot.clone().into_promise();
        }
        cache.insert(
            token.clone(),
            CacheSlot::Pending {
                id,
                promised,
                resolution: resolution.clone(),
            },
        );
        Promise::pending(resolution)
    }

    /// Replaces this resolution's pending slot with its outcome: the value on
    /// success, nothing on failure.
    fn settle(&self, token: &Token, id: u64, result: &DiResult<AnyArc>) {
        let mut cache = self.inner.cache.lock();
        let promised = match cache.get(token) {
            Some(CacheSlot::Pending { id: slot, promised, .. }) if *slot == id => *promised,
            _ => return,
        };

        match result {
            Ok(value) => {
                cache.insert(token.clone(), CacheSlot::settled(value.clone(), promised));
            }
            Err(error) => {
                cache.remove(token);
                drop(cache);
                tracing::warn!(
                    injector = self.inner.config.label(),
                    token = %token,
                    error = %error,
                    "evicted rejected promise"
                );
            }
        }
    }
}
