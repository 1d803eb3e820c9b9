//! Provider specifications and the per-injector provider registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::annotations::{read_annotations, Annotations};
use crate::async_factories::AsyncFactory;
use crate::descriptors::{Descriptor, ParamSpec, ProviderKind};
use crate::error::{BoxError, DiError, DiResult};
use crate::injection::Args;
use crate::lifetime::Lifetime;
use crate::token::Token;

// Type-erased Arc for storage
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type SyncCtor = Arc<dyn Fn(&Args) -> Result<AnyArc, BoxError> + Send + Sync>;
pub(crate) type AsyncCtor =
    Arc<dyn Fn(Args) -> BoxFuture<'static, Result<AnyArc, BoxError>> + Send + Sync>;

/// Type-erased constructor of a provider.
#[derive(Clone)]
pub(crate) enum Ctor {
    Sync(SyncCtor),
    Async(AsyncCtor),
}

/// The binding for a token within one injector.
///
/// A provider pairs a [`Descriptor`] (what it provides and what it needs) with
/// the constructor that builds the value. Class providers model "instantiate
/// this type"; factory providers model "call this function". Both receive their
/// resolved parameters as [`Args`], in declared order.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tokenized_di::{Annotations, Injector, Provider, Token};
///
/// struct Engine { cylinders: u8 }
/// struct Car { engine: Arc<Engine> }
///
/// let injector = Injector::new(vec![
///     Provider::value(Token::of::<Engine>(), Engine { cylinders: 4 }),
///     Provider::class(
///         &Annotations::new().inject([Token::of::<Engine>()]),
///         |args| Ok(Car { engine: args.get::<Engine>(0)? }),
///     ),
/// ]);
///
/// let car = injector.get::<Car>(&Token::of::<Car>()).unwrap();
/// assert_eq!(car.engine.cylinders, 4);
/// ```
#[derive(Clone)]
pub struct Provider {
    token: Token,
    kind: ProviderKind,
    is_promise: bool,
    params: Vec<ParamSpec>,
    unannotated: Vec<usize>,
    scopes: Vec<Token>,
    lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    base: Option<Arc<Provider>>,
}

impl Provider {
    /// Class provider built from annotations. Binds `T` unless annotated otherwise.
    pub fn class<T, F>(annotations: &Annotations, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::from_descriptor(read_annotations(annotations), ProviderKind::Class, ctor)
    }

    /// Factory provider built from annotations. Binds `T` unless annotated otherwise.
    pub fn factory<T, F>(annotations: &Annotations, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::from_descriptor(read_annotations(annotations), ProviderKind::Factory, f)
    }

    /// Asynchronous class provider. Its output is always a promise.
    pub fn class_async<T, A>(annotations: &Annotations, factory: A) -> Self
    where
        T: Send + Sync + 'static,
        A: AsyncFactory<T> + 'static,
    {
        Self::from_descriptor_async(read_annotations(annotations), ProviderKind::Class, factory)
    }

    /// Asynchronous factory provider. Its output is always a promise.
    pub fn factory_async<T, A>(annotations: &Annotations, factory: A) -> Self
    where
        T: Send + Sync + 'static,
        A: AsyncFactory<T> + 'static,
    {
        Self::from_descriptor_async(read_annotations(annotations), ProviderKind::Factory, factory)
    }

    /// Binds an already-built value to `token`.
    pub fn value<T>(token: Token, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        let arc: AnyArc = Arc::new(value);
        let descriptor = Descriptor {
            provide: crate::descriptors::ProvideSpec {
                token: Some(token),
                is_promise: false,
            },
            ..Descriptor::default()
        };
        Self::with_ctor::<T>(
            descriptor,
            ProviderKind::Factory,
            Ctor::Sync(Arc::new(move |_: &Args| Ok(arc.clone()))),
        )
    }

    /// Synchronous provider from an explicit descriptor.
    ///
    /// `kind` is used unless the descriptor carries its own override. A
    /// descriptor that declares `is_promise` makes the provider asynchronous
    /// even though the constructor itself is not.
    pub fn from_descriptor<T, F>(descriptor: Descriptor, kind: ProviderKind, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let ctor: SyncCtor = Arc::new(move |args: &Args| ctor(args).map(|v| Arc::new(v) as AnyArc));
        Self::with_ctor::<T>(descriptor, kind, Ctor::Sync(ctor))
    }

    /// Asynchronous provider from an explicit descriptor.
    pub fn from_descriptor_async<T, A>(descriptor: Descriptor, kind: ProviderKind, factory: A) -> Self
    where
        T: Send + Sync + 'static,
        A: AsyncFactory<T> + 'static,
    {
        let factory = Arc::new(factory);
        let ctor: AsyncCtor = Arc::new(move |args: Args| {
            let factory = factory.clone();
            Box::pin(async move { factory.create(args).await.map(|v| Arc::new(v) as AnyArc) })
        });
        Self::with_ctor::<T>(descriptor, kind, Ctor::Async(ctor))
    }

    fn with_ctor<T: 'static>(descriptor: Descriptor, kind: ProviderKind, ctor: Ctor) -> Self {
        let is_promise = descriptor.provide.is_promise || matches!(ctor, Ctor::Async(_));
        Self {
            token: descriptor.provide.token.unwrap_or_else(Token::of::<T>),
            kind: descriptor.kind.unwrap_or(kind),
            is_promise,
            lifetime: Lifetime::from_scopes(&descriptor.scopes),
            params: descriptor.params,
            unannotated: descriptor.unannotated,
            scopes: descriptor.scopes,
            ctor,
            base: None,
        }
    }

    /// Sets the parent constructor handed out for [`SuperConstructor`](crate::SuperConstructor).
    pub fn extends(mut self, base: Provider) -> Self {
        self.base = Some(Arc::new(base));
        self
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// The provider's declared output is asynchronous.
    pub fn is_promise(&self) -> bool {
        self.is_promise
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn scopes(&self) -> &[Token] {
        &self.scopes
    }

    pub fn has_scope(&self, scope: &Token) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn is_transient(&self) -> bool {
        self.lifetime == Lifetime::Transient
    }

    pub fn base(&self) -> Option<&Provider> {
        self.base.as_deref()
    }

    pub(crate) fn base_provider(&self) -> Option<Arc<Provider>> {
        self.base.clone()
    }

    /// Fails if the annotations left a parameter position without a token.
    pub(crate) fn ensure_annotated(&self) -> DiResult<()> {
        match self.unannotated.first() {
            Some(&index) => Err(DiError::UnannotatedParameter {
                token: self.token.clone(),
                index,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("token", &self.token)
            .field("kind", &self.kind)
            .field("is_promise", &self.is_promise)
            .field("params", &self.params)
            .field("lifetime", &self.lifetime)
            .field("base", &self.base.as_ref().map(|b| b.token.clone()))
            .finish()
    }
}

/// Local provider map of one injector.
#[derive(Default, Clone)]
pub(crate) struct Registry {
    providers: HashMap<Token, Arc<Provider>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores or overwrites the binding for the provider's token.
    pub(crate) fn insert(&mut self, provider: Arc<Provider>) {
        self.providers.insert(provider.token().clone(), provider);
    }

    /// Stores the binding under `token`, whatever the provider declares.
    pub(crate) fn insert_as(&mut self, token: Token, provider: Arc<Provider>) {
        self.providers.insert(token, provider);
    }

    pub(crate) fn get(&self, token: &Token) -> Option<&Arc<Provider>> {
        self.providers.get(token)
    }

    pub(crate) fn len(&self) -> usize {
        self.providers.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Token, &Arc<Provider>)> {
        self.providers.iter()
    }
}

impl FromIterator<Provider> for Registry {
    fn from_iter<I: IntoIterator<Item = Provider>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for provider in iter {
            registry.insert(Arc::new(provider));
        }
        registry
    }
}
