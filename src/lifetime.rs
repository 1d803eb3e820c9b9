//! Caching policy for provider instances.

use crate::token::Token;

/// Scope marker: never cache instances of the annotated provider.
///
/// Attach it with `Annotations::scope(Token::of::<TransientScope>())`.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tokenized_di::{Annotations, Injector, Provider, Token, TransientScope};
///
/// struct RequestId(u64);
///
/// let injector = Injector::new(vec![Provider::factory(
///     &Annotations::new().scope(Token::of::<TransientScope>()),
///     |_| Ok(RequestId(7)),
/// )]);
///
/// let token = Token::of::<RequestId>();
/// let a = injector.get::<RequestId>(&token).unwrap();
/// let b = injector.get::<RequestId>(&token).unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientScope;

impl TransientScope {
    /// The scope token to annotate providers with.
    pub fn token() -> Token {
        Token::of::<TransientScope>()
    }
}

/// Service lifetimes controlling instance caching behavior
///
/// Derived from a provider's scope annotations: anything carrying
/// [`TransientScope`] is transient, everything else is a singleton of the
/// injector that owns the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance per owning injector, cached for the injector's lifetime
    ///
    /// The instance lives in the cache of the injector where the provider is
    /// registered, so children that do not override the token share it.
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// Even two parameters of the same factory that name the same transient
    /// token receive two distinct instances.
    Transient,
}

impl Lifetime {
    pub(crate) fn from_scopes(scopes: &[Token]) -> Self {
        if scopes.iter().any(|s| s.is::<TransientScope>()) {
            Lifetime::Transient
        } else {
            Lifetime::Singleton
        }
    }
}
