//! Values handed to factories: direct values, promises, lazy accessors and
//! parent constructors.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

mod lazy;
mod promise;
mod super_ctor;

pub use lazy::Lazy;
pub use promise::Promise;
pub(crate) use promise::SharedResolution;
pub use super_ctor::SuperConstructor;

/// One resolved parameter.
#[derive(Clone)]
pub enum Arg {
    /// Directly injected value
    Value(AnyArc),
    /// Promise-injected value, possibly still pending
    Promise(Promise),
    /// Lazily injected accessor
    Lazy(Lazy),
    /// Parent constructor of the class being built
    Super(SuperConstructor),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Value(_) => "a value",
            Arg::Promise(_) => "a promise",
            Arg::Lazy(_) => "a lazy accessor",
            Arg::Super(_) => "a super constructor",
        }
    }
}

/// Resolved parameters of a factory, in declared order.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tokenized_di::{Annotations, Injector, Provider, Token};
///
/// struct Config { name: &'static str }
/// struct Greeter { greeting: String }
///
/// let injector = Injector::new(vec![
///     Provider::value(Token::of::<Config>(), Config { name: "world" }),
///     Provider::factory(
///         &Annotations::new().inject([Token::of::<Config>()]),
///         |args| {
///             let config = args.get::<Config>(0)?;
///             Ok(Greeter { greeting: format!("hello {}", config.name) })
///         },
///     ),
/// ]);
///
/// let greeter = injector.get::<Greeter>(&Token::of::<Greeter>()).unwrap();
/// assert_eq!(greeter.greeting, "hello world");
/// ```
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<Arg>,
}

impl Args {
    pub(crate) fn new(values: Vec<Arg>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.values.iter()
    }

    fn arg(&self, index: usize) -> DiResult<&Arg> {
        self.values.get(index).ok_or(DiError::ArgumentOutOfRange {
            index,
            len: self.values.len(),
        })
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> DiError {
        tracing::trace!(index, found = self.values[index].kind(), expected, "argument kind mismatch");
        DiError::ArgumentKind { index, expected }
    }

    /// The type-erased value at `index`.
    pub fn get_any(&self, index: usize) -> DiResult<AnyArc> {
        match self.arg(index)? {
            Arg::Value(value) => Ok(value.clone()),
            _ => Err(self.mismatch(index, "a value")),
        }
    }

    /// The value at `index`, downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        downcast(self.get_any(index)?)
    }

    /// The promise at `index`.
    pub fn promise(&self, index: usize) -> DiResult<Promise> {
        match self.arg(index)? {
            Arg::Promise(promise) => Ok(promise.clone()),
            _ => Err(self.mismatch(index, "a promise")),
        }
    }

    /// The lazy accessor at `index`.
    pub fn lazy(&self, index: usize) -> DiResult<Lazy> {
        match self.arg(index)? {
            Arg::Lazy(lazy) => Ok(lazy.clone()),
            _ => Err(self.mismatch(index, "a lazy accessor")),
        }
    }

    /// The parent constructor at `index`.
    pub fn super_constructor(&self, index: usize) -> DiResult<SuperConstructor> {
        match self.arg(index)? {
            Arg::Super(ctor) => Ok(ctor.clone()),
            _ => Err(self.mismatch(index, "a super constructor")),
        }
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub(crate) fn downcast<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
