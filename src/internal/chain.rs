//! Per-call resolution chain used for cycle detection.
//!
//! The chain is an explicit value threaded through one top-level resolution
//! call, never shared state: each nested resolution extends its caller's
//! chain without touching it, so nothing survives the call and unrelated
//! resolutions can never observe each other's progress, even when their
//! promises interleave. A lazy accessor handed to a constructor keeps the
//! chain that built it, so using it before that constructor returns is
//! still checked against the same path.

use std::iter;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::token::Token;

/// Resolution path, innermost token at the head.
///
/// Links are shared, so entering one more level costs one allocation no
/// matter how deep the chain already is.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionChain {
    head: Option<Arc<Link>>,
}

#[derive(Debug)]
struct Link {
    token: Token,
    parent: Option<Arc<Link>>,
    depth: usize,
}

impl ResolutionChain {
    /// Empty chain for a top-level call.
    pub(crate) fn root() -> Self {
        Self::default()
    }

    /// Extends the chain with `token`, failing if it is already being resolved.
    pub(crate) fn enter(&self, token: &Token, max_depth: usize) -> DiResult<Self> {
        // Circular detection BEFORE pushing the new token
        if self.innermost_first().any(|t| t == token) {
            return Err(DiError::CyclicDependency {
                chain: self.including(token),
            });
        }

        let depth = self.len();
        if depth >= max_depth {
            return Err(DiError::DepthExceeded(depth));
        }

        Ok(Self {
            head: Some(Arc::new(Link {
                token: token.clone(),
                parent: self.head.clone(),
                depth: depth + 1,
            })),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |link| link.depth)
    }

    /// The chain with `token` appended, for diagnostics.
    pub(crate) fn including(&self, token: &Token) -> Vec<Token> {
        let mut tokens = self.tokens();
        tokens.push(token.clone());
        tokens
    }

    /// Tokens in the chain, outermost first.
    pub(crate) fn tokens(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.innermost_first().cloned().collect();
        tokens.reverse();
        tokens
    }

    fn innermost_first(&self) -> impl Iterator<Item = &Token> {
        iter::successors(self.head.as_deref(), |link| link.parent.as_deref()).map(|link| &link.token)
    }
}
