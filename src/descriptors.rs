//! Normalized provider descriptors consumed by the injector.

use crate::token::Token;

/// How a parameter wants its dependency delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjectionMode {
    /// The resolved value itself
    #[default]
    Direct,
    /// A [`Promise`](crate::Promise) of the value, not unwrapped
    Promise,
    /// A [`Lazy`](crate::Lazy) accessor resolved on first use
    Lazy,
}

/// Whether a provider is constructed like a class or invoked like a function.
///
/// Only class providers may receive a [`SuperConstructor`](crate::SuperConstructor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Class,
    Factory,
}

/// Description of the provided value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvideSpec {
    /// Token the provider is bound to; `None` means "the type it builds"
    pub token: Option<Token>,
    /// The provider's declared output is asynchronous
    pub is_promise: bool,
}

/// Description of one constructor/factory parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub token: Token,
    pub mode: InjectionMode,
}

impl ParamSpec {
    pub fn direct(token: Token) -> Self {
        Self { token, mode: InjectionMode::Direct }
    }

    pub fn promise(token: Token) -> Self {
        Self { token, mode: InjectionMode::Promise }
    }

    pub fn lazy(token: Token) -> Self {
        Self { token, mode: InjectionMode::Lazy }
    }

    /// Caller wants the promise, not the awaited value.
    #[inline]
    pub fn is_promise(&self) -> bool {
        self.mode == InjectionMode::Promise
    }

    /// Caller wants an accessor that resolves on first invocation.
    #[inline]
    pub fn is_lazy(&self) -> bool {
        self.mode == InjectionMode::Lazy
    }
}

/// Read-only description of a factory's shape.
///
/// Produced by [`read_annotations`](crate::read_annotations) or built by hand;
/// the injector never looks behind it.
///
/// # Examples
///
/// ```rust
/// use tokenized_di::{Annotations, InjectionMode, Token, read_annotations};
///
/// struct Engine;
/// struct Tires;
///
/// let descriptor = read_annotations(
///     &Annotations::new()
///         .inject([Token::of::<Engine>()])
///         .inject_lazy([Token::of::<Tires>()]),
/// );
///
/// assert_eq!(descriptor.params.len(), 2);
/// assert_eq!(descriptor.params[1].mode, InjectionMode::Lazy);
/// assert!(!descriptor.provide.is_promise);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub provide: ProvideSpec,
    pub params: Vec<ParamSpec>,
    /// Scope annotations such as [`TransientScope`](crate::TransientScope)
    pub scopes: Vec<Token>,
    /// Explicit kind override, if the annotations carried one
    pub kind: Option<ProviderKind>,
    /// Parameter positions no annotation gave a token to
    ///
    /// `params` then only lists the annotated positions, and a provider built
    /// from this descriptor fails to resolve instead of shifting its arguments.
    pub unannotated: Vec<usize>,
}

impl Descriptor {
    /// Whether any of the scope annotations equals `scope`.
    pub fn has_scope(&self, scope: &Token) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
