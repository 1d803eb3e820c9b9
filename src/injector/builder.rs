use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::InjectorConfig;
use crate::observer::{DiObserver, Observers};
use crate::registration::{Provider, Registry};
use crate::token::Token;

use super::{Injector, InjectorInner};

/// Builder for root and child injectors.
///
/// A child built from a parent inherits the parent's configuration (unless
/// one is set explicitly) and all of its observers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tokenized_di::{Injector, InjectorConfig, Provider, Token, TracingObserver};
///
/// let port = Token::symbol("port");
///
/// let injector = Injector::builder()
///     .provider(Provider::value(port.clone(), 8080u16))
///     .config(InjectorConfig::default().with_name("root"))
///     .observer(Arc::new(TracingObserver::new()))
///     .build();
///
/// assert_eq!(*injector.get::<u16>(&port).unwrap(), 8080);
/// ```
#[derive(Default)]
pub struct InjectorBuilder {
    providers: Vec<Provider>,
    parent: Option<Injector>,
    force_new_instances_of: Vec<Token>,
    config: Option<InjectorConfig>,
    observers: Vec<Arc<dyn DiObserver>>,
}

impl InjectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding. A later binding for the same token replaces an earlier one.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn parent(mut self, parent: &Injector) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Scopes whose ancestor providers the new injector instantiates itself.
    pub fn force_new_instances_of(mut self, scopes: impl IntoIterator<Item = Token>) -> Self {
        self.force_new_instances_of.extend(scopes);
        self
    }

    pub fn config(mut self, config: InjectorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DiObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> Injector {
        let mut registry = match &self.parent {
            Some(parent) => collect_forced(parent, &self.force_new_instances_of),
            None => Registry::new(),
        };
        for provider in self.providers {
            registry.insert(Arc::new(provider));
        }

        let config = self
            .config
            .or_else(|| self.parent.as_ref().map(|p| p.inner.config.clone()))
            .unwrap_or_default();

        let mut observers = self
            .parent
            .as_ref()
            .map(|p| Observers::clone(&p.inner.observers))
            .unwrap_or_default();
        for observer in self.observers {
            observers.add(observer);
        }

        tracing::trace!(
            injector = config.label(),
            providers = registry.len(),
            child = self.parent.is_some(),
            "injector created"
        );

        Injector {
            inner: Arc::new(InjectorInner {
                registry: RwLock::new(registry),
                cache: Mutex::new(HashMap::new()),
                parent: self.parent,
                force_new_instances_of: self.force_new_instances_of,
                config,
                observers: Arc::new(observers),
                next_slot: AtomicU64::new(0),
            }),
        }
    }
}

/// Ancestor providers carrying one of `scopes`, nearest binding first.
///
/// A token shadowed by a nearer ancestor that does not carry the scope is not
/// resurrected from further up.
fn collect_forced(parent: &Injector, scopes: &[Token]) -> Registry {
    let mut registry = Registry::new();
    if scopes.is_empty() {
        return registry;
    }

    let mut seen = HashSet::new();
    let mut current = Some(parent);
    while let Some(injector) = current {
        for (token, provider) in injector.inner.registry.read().iter() {
            if !seen.insert(token.clone()) {
                continue;
            }
            if scopes.iter().any(|scope| provider.has_scope(scope)) {
                registry.insert_as(token.clone(), provider.clone());
            }
        }
        current = injector.inner.parent.as_ref();
    }
    registry
}
