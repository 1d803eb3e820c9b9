//! Error types for the dependency injection container.

use std::error::Error;
use std::sync::Arc;

use crate::token::Token;

/// Boxed error returned by user factories.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Dependency injection errors
///
/// Every error is reported to the caller of `get`/`get_promise`; nothing is
/// swallowed or retried. The type is `Clone` so that one rejected in-flight
/// promise can hand the same error to every waiter.
///
/// # Examples
///
/// ```rust
/// use tokenized_di::{DiError, Injector, Token};
///
/// struct Missing;
///
/// let injector = Injector::new(Vec::new());
/// match injector.get_any(&Token::of::<Missing>()) {
///     Err(DiError::NoProvider { token, .. }) => assert!(token.is::<Missing>()),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// No binding anywhere in the ancestor chain and the token cannot build itself
    #[error("No provider for {token}!{}", chain_suffix(.chain))]
    NoProvider { token: Token, chain: Vec<Token> },
    /// A token reappeared in its own resolution chain
    #[error("Cyclic dependency: {}", render_chain(.chain))]
    CyclicDependency { chain: Vec<Token> },
    /// A synchronous resolution reached an asynchronous provider
    #[error("Cannot instantiate {token} synchronously, it is provided as a promise")]
    AsyncDependencyInSyncContext { token: Token },
    /// The factory or constructor itself failed
    #[error("Error during instantiation of {token}: {cause}")]
    Instantiation {
        token: Token,
        #[source]
        cause: Arc<dyn Error + Send + Sync>,
    },
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A class asked for `SuperConstructor` but has no base constructor
    #[error("{token} requested SuperConstructor but extends nothing")]
    MissingSuperConstructor { token: Token },
    /// A lazy accessor or in-flight promise outlived its injector
    #[error("Injector dropped before {token} could be resolved")]
    InjectorDropped { token: Token },
    /// A factory read an argument slot that does not exist
    #[error("Argument {index} out of range, factory received {len}")]
    ArgumentOutOfRange { index: usize, len: usize },
    /// Parameter annotations skipped a position, so no token is known for it
    #[error("Parameter {index} of {token} has no injection token")]
    UnannotatedParameter { token: Token, index: usize },
    /// A factory read an argument slot as the wrong injection mode
    #[error("Argument {index} is not {expected}")]
    ArgumentKind { index: usize, expected: &'static str },
}

impl DiError {
    /// Wraps a factory failure, keeping the original cause.
    ///
    /// A cycle hit from inside the constructor (through a lazy accessor) is
    /// passed through unwrapped.
    pub(crate) fn instantiation(token: &Token, cause: BoxError) -> Self {
        let cause = match cause.downcast::<DiError>() {
            Ok(inner) if matches!(*inner, DiError::CyclicDependency { .. }) => return *inner,
            Ok(inner) => inner as BoxError,
            Err(cause) => cause,
        };
        DiError::Instantiation {
            token: token.clone(),
            cause: Arc::from(cause),
        }
    }

    /// The resolution chain attached to this error, if it carries one.
    pub fn chain(&self) -> Option<&[Token]> {
        match self {
            DiError::NoProvider { chain, .. } | DiError::CyclicDependency { chain } => Some(chain),
            _ => None,
        }
    }
}

fn render_chain(chain: &[Token]) -> String {
    chain
        .iter()
        .map(|token| token.display_name())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn chain_suffix(chain: &[Token]) -> String {
    if chain.len() > 1 {
        format!(" ({})", render_chain(chain))
    } else {
        String::new()
    }
}

/// Result type for DI operations
///
/// A convenience type alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;
