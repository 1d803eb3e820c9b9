//! Diagnostic observers for injector resolution events.
//!
//! Observers see every instantiation an injector performs: when a provider's
//! constructor is about to run, when it finished, and when it failed. Cache
//! hits are not instantiations and are not reported.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::token::Token;

/// Observer trait for dependency injection resolution events.
///
/// Observers are registered on an [`InjectorBuilder`](crate::InjectorBuilder)
/// and inherited by every child injector.
///
/// # Performance
///
/// Observer calls are made synchronously during resolution, while no injector
/// lock is held. Keep implementations lightweight; an asynchronous provider
/// reports `resolved` or `failed` from whichever task drives its promise.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
/// use tokenized_di::{Annotations, DiError, DiObserver, Injector, Provider, Token};
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl DiObserver for Counter {
///     fn resolving(&self, _token: &Token) {}
///
///     fn resolved(&self, _token: &Token, _duration: Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
///
///     fn failed(&self, _token: &Token, _error: &DiError) {}
/// }
///
/// struct Service;
///
/// let counter = Arc::new(Counter::default());
/// let injector = Injector::builder()
///     .provider(Provider::class(&Annotations::new(), |_| Ok(Service)))
///     .observer(counter.clone())
///     .build();
///
/// injector.get::<Service>(&Token::of::<Service>()).unwrap();
/// injector.get::<Service>(&Token::of::<Service>()).unwrap();
/// assert_eq!(counter.0.load(Ordering::Relaxed), 1);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called right before a provider's constructor runs.
    fn resolving(&self, token: &Token);

    /// Called after the constructor produced a value.
    ///
    /// For asynchronous providers `duration` covers the awaited constructor,
    /// not the time spent waiting on its parameters.
    fn resolved(&self, token: &Token, duration: Duration);

    /// Called when the constructor or one of its parameters failed.
    fn failed(&self, token: &Token, error: &DiError);
}

/// Container for registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, token: &Token) {
        for observer in &self.observers {
            observer.resolving(token);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, token: &Token, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(token, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, token: &Token, error: &DiError) {
        for observer in &self.observers {
            observer.failed(token, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Instantiations are emitted at `DEBUG`, failures at `WARN`. Install a
/// subscriber (for example `tracing-subscriber`) to see them.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tokenized_di::{Injector, TracingObserver};
///
/// let injector = Injector::builder()
///     .observer(Arc::new(TracingObserver::with_target_name("app-di")))
///     .build();
/// assert!(injector.provider_tokens().is_empty());
/// ```
pub struct TracingObserver {
    name: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            name: "tokenized-di".to_string(),
        }
    }

    /// Observer whose events carry `name` in their `injector` field.
    pub fn with_target_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, token: &Token) {
        tracing::trace!(injector = %self.name, token = %token, "instantiating");
    }

    fn resolved(&self, token: &Token, duration: Duration) {
        tracing::debug!(
            injector = %self.name,
            token = %token,
            elapsed_us = duration.as_micros() as u64,
            "instantiated"
        );
    }

    fn failed(&self, token: &Token, error: &DiError) {
        tracing::warn!(injector = %self.name, token = %token, error = %error, "instantiation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl DiObserver for Recording {
        fn resolving(&self, token: &Token) {
            self.0.lock().push(format!("resolving {token}"));
        }

        fn resolved(&self, token: &Token, _duration: Duration) {
            self.0.lock().push(format!("resolved {token}"));
        }

        fn failed(&self, token: &Token, _error: &DiError) {
            self.0.lock().push(format!("failed {token}"));
        }
    }

    #[test]
    fn fans_out_to_every_observer() {
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());
        let mut observers = Observers::default();
        assert!(!observers.has_observers());
        observers.add(first.clone());
        observers.add(second.clone());

        let token = Token::symbol("db");
        observers.resolving(&token);
        observers.resolved(&token, Duration::from_millis(1));
        observers.failed(&token, &DiError::InjectorDropped { token: token.clone() });

        for rec in [first, second] {
            assert_eq!(
                *rec.0.lock(),
                vec!["resolving db", "resolved db", "failed db"]
            );
        }
    }
}
