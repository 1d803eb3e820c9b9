use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

pub(crate) type SharedResolution = Shared<BoxFuture<'static, DiResult<AnyArc>>>;

/// Asynchronous-completion handle for a resolved value.
///
/// Cloning a promise shares the underlying resolution: every clone observes
/// the same value or the same error. Promises do not run on their own; they
/// make progress when awaited by the caller's executor.
#[derive(Clone)]
pub struct Promise {
    state: State,
}

#[derive(Clone)]
enum State {
    Settled(DiResult<AnyArc>),
    Pending(SharedResolution),
}

impl Promise {
    pub(crate) fn resolved(value: AnyArc) -> Self {
        Self {
            state: State::Settled(Ok(value)),
        }
    }

    pub(crate) fn settled(result: DiResult<AnyArc>) -> Self {
        Self {
            state: State::Settled(result),
        }
    }

    pub(crate) fn pending(resolution: SharedResolution) -> Self {
        Self {
            state: State::Pending(resolution),
        }
    }

    /// The outcome, if the promise has already settled.
    pub fn peek(&self) -> Option<DiResult<AnyArc>> {
        match &self.state {
            State::Settled(result) => Some(result.clone()),
            State::Pending(shared) => shared.peek().cloned(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }

    /// Awaits the type-erased value.
    pub async fn value(self) -> DiResult<AnyArc> {
        match self.state {
            State::Settled(result) => result,
            State::Pending(shared) => shared.await,
        }
    }

    /// Awaits the value and downcasts it to `T`.
    pub async fn get<T: Send + Sync + 'static>(self) -> DiResult<Arc<T>> {
        super::downcast(self.value().await?)
    }

    pub(crate) fn rejected(error: DiError) -> Self {
        Self::settled(Err(error))
    }
}

impl IntoFuture for Promise {
    type Output = DiResult<AnyArc>;
    type IntoFuture = BoxFuture<'static, DiResult<AnyArc>>;

    fn into_future(self) -> Self::IntoFuture {
        self.value().boxed()
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.peek() {
            None => "pending",
            Some(Ok(_)) => "resolved",
            Some(Err(_)) => "rejected",
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}
