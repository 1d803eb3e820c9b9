//! Tokens: the identities used as dependency-graph keys.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::registration::Provider;

/// Identity of a node in the dependency graph.
///
/// Tokens are compared by identity, never structurally. A type token compares
/// by `TypeId`; a symbol token compares by the identity of its allocation, so
/// two symbols created with the same name are still different tokens while
/// clones of one symbol are equal.
///
/// # Token Types
///
/// - **Type**: a concrete type, the common "inject this struct" case
/// - **Injectable**: a type that also knows how to build itself (see
///   [`Injectable`]); equal to the plain `Type` token of the same type
/// - **Symbol**: an opaque identifier for values that have no type of their
///   own, such as configuration strings or trait-object bindings
///
/// # Examples
///
/// ```rust
/// use tokenized_di::Token;
///
/// struct Database;
///
/// let a = Token::of::<Database>();
/// let b = Token::of::<Database>();
/// assert_eq!(a, b);
///
/// let url = Token::symbol("database_url");
/// let other_url = Token::symbol("database_url");
/// assert_eq!(url, url.clone());
/// assert_ne!(url, other_url);
/// ```
#[derive(Clone)]
pub enum Token {
    /// Concrete type token with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Type token carrying the default provider used when nothing is bound
    Injectable(TypeId, &'static str, fn() -> Provider),
    /// Opaque identifier compared by allocation identity
    Symbol(Arc<str>),
}

/// A type that can be instantiated without an explicit binding.
///
/// Requesting `Token::injectable::<T>()` from an injector whose hierarchy has
/// no provider for `T` registers `T::provider()` as an implicit class provider
/// in the root injector and resolves it there.
///
/// # Examples
///
/// ```rust
/// use tokenized_di::{Annotations, Injectable, Injector, Provider, Token};
///
/// struct Clock;
///
/// impl Injectable for Clock {
///     fn provider() -> Provider {
///         Provider::class(&Annotations::new(), |_| Ok(Clock))
///     }
/// }
///
/// let injector = Injector::new(Vec::new());
/// assert!(injector.get::<Clock>(&Token::injectable::<Clock>()).is_ok());
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Builds the provider used for self-registration.
    fn provider() -> Provider;
}

impl Token {
    /// Token for the concrete type `T`.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Token for `T` that can fall back to `T::provider()`.
    #[inline]
    pub fn injectable<T: Injectable>() -> Self {
        Token::Injectable(TypeId::of::<T>(), std::any::type_name::<T>(), T::provider)
    }

    /// A fresh symbol token. Every call returns a distinct identity.
    pub fn symbol(name: impl Into<Arc<str>>) -> Self {
        Token::Symbol(name.into())
    }

    /// Get the type or symbol name for display
    ///
    /// ```rust
    /// use tokenized_di::Token;
    ///
    /// assert_eq!(Token::of::<u32>().display_name(), "u32");
    /// assert_eq!(Token::symbol("port").display_name(), "port");
    /// ```
    pub fn display_name(&self) -> &str {
        match self {
            Token::Type(_, name) | Token::Injectable(_, name, _) => name,
            Token::Symbol(name) => name,
        }
    }

    /// The provider this token can build itself with, if any.
    pub fn default_provider(&self) -> Option<Provider> {
        match self {
            Token::Injectable(_, _, make) => Some(make()),
            _ => None,
        }
    }

    /// Whether this token is the type token of `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }

    fn type_id(&self) -> Option<TypeId> {
        match self {
            Token::Type(id, _) | Token::Injectable(id, _, _) => Some(*id),
            Token::Symbol(_) => None,
        }
    }
}

impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Symbol(a), Token::Symbol(b)) => Arc::ptr_eq(a, b),
            (Token::Symbol(_), _) | (_, Token::Symbol(_)) => false,
            // Injectable and Type tokens of one type are the same node
            _ => self.type_id() == other.type_id(),
        }
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Token::Type(id, _) | Token::Injectable(id, _, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Symbol(name) => {
                1u8.hash(state);
                (Arc::as_ptr(name) as *const u8 as usize).hash(state);
            }
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(_, name) => write!(f, "Type({})", name),
            Token::Injectable(_, name, _) => write!(f, "Injectable({})", name),
            Token::Symbol(name) => write!(f, "Symbol({})", name),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// Helper function for creating type tokens
#[inline(always)]
pub fn token_of<T: 'static>() -> Token {
    Token::of::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Engine;

    #[test]
    fn symbol_identity_is_allocation_identity() {
        let a = Token::symbol("config");
        let b = Token::symbol("config");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&a));
        assert!(!set.contains(&b));
    }

    #[test]
    fn type_tokens_never_equal_symbols() {
        let ty = Token::of::<Engine>();
        let sym = Token::symbol(std::any::type_name::<Engine>());
        assert_ne!(ty, sym);
        assert!(ty.is::<Engine>());
        assert!(!sym.is::<Engine>());
        assert_eq!(ty, token_of::<Engine>());
    }
}
