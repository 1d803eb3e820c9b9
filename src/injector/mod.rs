//! The injector: provider lookup across the hierarchy, per-injector instance
//! caches and the public resolution API.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::config::InjectorConfig;
use crate::error::{DiError, DiResult};
use crate::injection::{downcast, Lazy, Promise, SharedResolution};
use crate::internal::ResolutionChain;
use crate::observer::Observers;
use crate::registration::{AnyArc, Provider, Registry};
use crate::token::Token;

mod builder;
mod resolve;

pub use builder::InjectorBuilder;

/// Cached state of one token in its owning injector.
#[derive(Clone)]
pub(crate) enum CacheSlot {
    Ready(AnyArc),
    /// Settled value of a promise provider; never handed out synchronously
    Promised(AnyArc),
    /// In-flight resolution; `id` tells a settling future whether the slot is still its own
    Pending {
        id: u64,
        promised: bool,
        resolution: SharedResolution,
    },
}

impl CacheSlot {
    fn settled(value: AnyArc, promised: bool) -> Self {
        if promised {
            CacheSlot::Promised(value)
        } else {
            CacheSlot::Ready(value)
        }
    }

    fn into_sync(self, token: &Token) -> DiResult<AnyArc> {
        let refused = || DiError::AsyncDependencyInSyncContext {
            token: token.clone(),
        };
        match self {
            CacheSlot::Ready(value) => Ok(value),
            CacheSlot::Promised(_) | CacheSlot::Pending { promised: true, .. } => Err(refused()),
            CacheSlot::Pending { resolution, .. } => match resolution.peek() {
                Some(Ok(value)) => Ok(value.clone()),
                _ => Err(refused()),
            },
        }
    }

    fn into_promise(self) -> Promise {
        match self {
            CacheSlot::Ready(value) | CacheSlot::Promised(value) => Promise::resolved(value),
            CacheSlot::Pending { resolution, .. } => Promise::pending(resolution),
        }
    }
}

/// Dependency injection container.
///
/// An injector owns a local provider map and a local instance cache, and
/// optionally a parent. Resolving a token walks up the hierarchy to the
/// nearest injector that binds it; that injector builds the instance and
/// caches it, so children that do not override a token share their
/// ancestor's instance.
///
/// Injectors are cheap to clone; clones share the same registry and cache.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tokenized_di::{Injector, Provider, Token};
///
/// let greeting = Token::symbol("greeting");
///
/// let parent = Injector::new(vec![Provider::value(greeting.clone(), "hello")]);
/// let child = parent.create_child(vec![Provider::value(greeting.clone(), "hi")]);
///
/// assert_eq!(*child.get::<&str>(&greeting).unwrap(), "hi");
/// assert_eq!(*parent.get::<&str>(&greeting).unwrap(), "hello");
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

pub(crate) struct InjectorInner {
    registry: RwLock<Registry>,
    cache: Mutex<HashMap<Token, CacheSlot>>,
    parent: Option<Injector>,
    force_new_instances_of: Vec<Token>,
    config: InjectorConfig,
    observers: Arc<Observers>,
    next_slot: AtomicU64,
}

/// Non-owning handle held by lazy accessors and in-flight promises.
#[derive(Clone)]
pub(crate) struct WeakInjector(Weak<InjectorInner>);

impl WeakInjector {
    pub(crate) fn upgrade(&self) -> Option<Injector> {
        self.0.upgrade().map(|inner| Injector { inner })
    }
}

impl Injector {
    /// Root injector over `providers`.
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self::builder().providers(providers).build()
    }

    /// Injector over `providers` whose parent is `parent`.
    ///
    /// Same as [`parent.create_child(providers)`](Injector::create_child).
    pub fn with_parent(providers: impl IntoIterator<Item = Provider>, parent: &Injector) -> Self {
        Self::builder().parent(parent).providers(providers).build()
    }

    /// Root injector over `providers` with an explicit configuration.
    pub fn with_config(providers: impl IntoIterator<Item = Provider>, config: InjectorConfig) -> Self {
        Self::builder().config(config).providers(providers).build()
    }

    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    /// Child injector whose own bindings shadow this injector's.
    ///
    /// The child never writes to this injector's registry or cache.
    pub fn create_child(&self, providers: impl IntoIterator<Item = Provider>) -> Injector {
        self.create_child_with_scopes(providers, [])
    }

    /// Child injector that also builds its own instances of every ancestor
    /// provider annotated with one of `force_new_instances_of`.
    ///
    /// Those providers are copied into the child's registry, so the child
    /// owns (and caches) fresh instances instead of sharing the ancestor's.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tokenized_di::{Annotations, Injector, Provider, Token};
    ///
    /// struct RequestScope;
    /// struct Session;
    ///
    /// let root = Injector::new(vec![Provider::class(
    ///     &Annotations::new().scope(Token::of::<RequestScope>()),
    ///     |_| Ok(Session),
    /// )]);
    /// let request = root.create_child_with_scopes(Vec::new(), [Token::of::<RequestScope>()]);
    ///
    /// let token = Token::of::<Session>();
    /// let outer = root.get::<Session>(&token).unwrap();
    /// let inner = request.get::<Session>(&token).unwrap();
    /// assert!(!Arc::ptr_eq(&outer, &inner));
    /// ```
    pub fn create_child_with_scopes(
        &self,
        providers: impl IntoIterator<Item = Provider>,
        force_new_instances_of: impl IntoIterator<Item = Token>,
    ) -> Injector {
        Self::builder()
            .parent(self)
            .providers(providers)
            .force_new_instances_of(force_new_instances_of)
            .build()
    }

    /// Resolve `token` synchronously.
    ///
    /// Fails with [`DiError::AsyncDependencyInSyncContext`] if the token, or
    /// any directly injected dependency of it, is provided as a promise.
    pub fn get_any(&self, token: &Token) -> DiResult<AnyArc> {
        self.resolve_sync(token, &ResolutionChain::root())
    }

    /// Resolve `token` synchronously and downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        downcast(self.get_any(token)?)
    }

    /// Resolve `token` synchronously, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error's message.
    pub fn get_required<T: Send + Sync + 'static>(&self, token: &Token) -> Arc<T> {
        match self.get::<T>(token) {
            Ok(value) => value,
            Err(e) => panic!("Failed to resolve {}: {}", token, e),
        }
    }

    /// Resolve `token` asynchronously.
    ///
    /// Everything that can be resolved synchronously is resolved before this
    /// returns; asynchronous providers make progress when the promise is
    /// awaited. Concurrent requests for the same token share one promise.
    pub fn get_promise_any(&self, token: &Token) -> Promise {
        match self.resolve_promise(token, &ResolutionChain::root()) {
            Ok(promise) => promise,
            Err(error) => Promise::rejected(error),
        }
    }

    /// Resolve `token` asynchronously and downcast to `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokenized_di::{Annotations, Args, BoxError, Injector, Provider, Token};
    ///
    /// struct Pool { size: usize }
    ///
    /// # tokio_test(async {
    /// let injector = Injector::new(vec![Provider::factory_async::<Pool, _>(
    ///     &Annotations::new(),
    ///     |_args: Args| async { Ok::<_, BoxError>(Pool { size: 8 }) },
    /// )]);
    ///
    /// let pool = injector.get_promise::<Pool>(&Token::of::<Pool>()).await.unwrap();
    /// assert_eq!(pool.size, 8);
    /// # });
    /// # fn tokio_test<F: std::future::Future>(f: F) {
    /// #     tokio::runtime::Runtime::new().unwrap().block_on(f);
    /// # }
    /// ```
    pub fn get_promise<T: Send + Sync + 'static>(
        &self,
        token: &Token,
    ) -> impl std::future::Future<Output = DiResult<Arc<T>>> + Send + 'static {
        self.get_promise_any(token).get::<T>()
    }

    /// Accessor that resolves `token` from this injector on first use.
    pub fn get_lazy(&self, token: &Token) -> Lazy {
        Lazy::new(self.downgrade(), token.clone())
    }

    /// Register or overwrite a binding in this injector only.
    ///
    /// Any instance this injector cached for the token is dropped so the new
    /// binding takes effect. Ancestors are untouched.
    pub fn register(&self, provider: Provider) {
        let token = provider.token().clone();
        self.inner.registry.write().insert(Arc::new(provider));
        if self.inner.cache.lock().remove(&token).is_some() {
            tracing::debug!(injector = self.inner.config.label(), token = %token, "rebinding dropped cached instance");
        }
    }

    /// The nearest binding for `token`, searching this injector then its ancestors.
    pub fn lookup(&self, token: &Token) -> Option<Arc<Provider>> {
        let mut current = Some(self);
        while let Some(injector) = current {
            if let Some(provider) = injector.inner.registry.read().get(token) {
                return Some(provider.clone());
            }
            current = injector.inner.parent.as_ref();
        }
        None
    }

    /// Whether `token` is bound here or in an ancestor.
    pub fn has_provider(&self, token: &Token) -> bool {
        self.lookup(token).is_some()
    }

    /// Whether this injector holds a cached instance or in-flight promise for `token`.
    pub fn is_cached(&self, token: &Token) -> bool {
        self.inner.cache.lock().contains_key(token)
    }

    /// Tokens bound locally in this injector.
    pub fn provider_tokens(&self) -> Vec<Token> {
        self.inner
            .registry
            .read()
            .iter()
            .map(|(token, _)| token.clone())
            .collect()
    }

    pub fn parent(&self) -> Option<&Injector> {
        self.inner.parent.as_ref()
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.inner.config
    }

    pub(crate) fn downgrade(&self) -> WeakInjector {
        WeakInjector(Arc::downgrade(&self.inner))
    }

    #[inline]
    pub(crate) fn ptr_eq(&self, other: &Injector) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.inner.config.name)
            .field("providers", &self.inner.registry.read().len())
            .field("cached", &self.inner.cache.lock().len())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
