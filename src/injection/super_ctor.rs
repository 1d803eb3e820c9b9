use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::registration::{AnyArc, Ctor, Provider};
use crate::token::Token;

use super::Args;

/// Parent-constructor capability handed to a class that extends another.
///
/// The injector resolves the base provider's parameters when it builds the
/// derived class, then passes this bound constructor as an argument. Calling
/// it runs the base constructor with those parameters. Nothing it produces is
/// cached: each call builds a fresh base value.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tokenized_di::{Annotations, Injector, Provider, SuperConstructor, Token};
///
/// struct Base { port: u16 }
/// struct Derived { base: Arc<Base>, tls: bool }
///
/// let base = Provider::class(&Annotations::new(), |_| Ok(Base { port: 443 }));
/// let derived = Provider::class(
///     &Annotations::new().inject([Token::of::<SuperConstructor>()]),
///     |args| {
///         let base = args.super_constructor(0)?.call::<Base>()?;
///         Ok(Derived { base, tls: true })
///     },
/// )
/// .extends(base);
///
/// let injector = Injector::new(vec![derived]);
/// let value = injector.get::<Derived>(&Token::of::<Derived>()).unwrap();
/// assert_eq!(value.base.port, 443);
/// assert!(value.tls);
/// ```
#[derive(Clone)]
pub struct SuperConstructor {
    base: Arc<Provider>,
    args: Args,
}

impl SuperConstructor {
    pub(crate) fn new(base: Arc<Provider>, args: Args) -> Self {
        Self { base, args }
    }

    /// Token of the base provider.
    pub fn base_token(&self) -> &Token {
        self.base.token()
    }

    /// Run the base constructor.
    pub fn call_any(&self) -> DiResult<AnyArc> {
        match &self.base.ctor {
            Ctor::Sync(ctor) => {
                ctor(&self.args).map_err(|cause| DiError::instantiation(self.base.token(), cause))
            }
            Ctor::Async(_) => Err(DiError::AsyncDependencyInSyncContext {
                token: self.base.token().clone(),
            }),
        }
    }

    pub fn call<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        super::downcast(self.call_any()?)
    }

    /// Run an asynchronous base constructor. Sync bases work here too.
    pub async fn call_async_any(&self) -> DiResult<AnyArc> {
        match &self.base.ctor {
            Ctor::Sync(_) => self.call_any(),
            Ctor::Async(ctor) => ctor(self.args.clone())
                .await
                .map_err(|cause| DiError::instantiation(self.base.token(), cause)),
        }
    }

    pub async fn call_async<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        super::downcast(self.call_async_any().await?)
    }
}

impl std::fmt::Debug for SuperConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperConstructor")
            .field("base", self.base.token())
            .finish()
    }
}
