//! # tokenized-di
//!
//! Token-driven hierarchical dependency injection with promise and lazy
//! injection.
//!
//! ## Features
//!
//! - **Identity tokens**: types, self-instantiable types and opaque symbols
//! - **Per-injector singletons**: every non-transient token is built at most once per owning injector
//! - **Transient scope**: opt out of caching with [`TransientScope`]
//! - **Hierarchy**: child injectors shadow bindings without touching their ancestors
//! - **Promise injection**: asynchronous providers, shared in-flight promises, eviction on rejection
//! - **Lazy injection**: deferred, memoized accessors
//! - **Cycle detection**: full chain reported, scoped to one resolution call
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tokenized_di::{Annotations, Injector, Provider, Token};
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let injector = Injector::new(vec![
//!     Provider::value(
//!         Token::of::<Database>(),
//!         Database { connection_string: "postgres://localhost".to_string() },
//!     ),
//!     Provider::class(
//!         &Annotations::new().inject([Token::of::<Database>()]),
//!         |args| Ok(UserService { db: args.get::<Database>(0)? }),
//!     ),
//! ]);
//!
//! let users = injector.get::<UserService>(&Token::of::<UserService>()).unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Injection Modes
//!
//! Each parameter is injected in one of three modes:
//!
//! - **Direct** ([`Annotations::inject`]): the resolved value
//! - **Promise** ([`Annotations::inject_promise`]): a [`Promise`] of the value
//! - **Lazy** ([`Annotations::inject_lazy`]): a [`Lazy`] accessor resolved on first use
//!
//! ```rust
//! use tokenized_di::{Annotations, Args, BoxError, Injector, Provider, Token};
//!
//! struct Config { url: String }
//! struct Client { url: String }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let injector = Injector::new(vec![
//!     Provider::factory_async::<Config, _>(&Annotations::new(), |_args: Args| async {
//!         Ok::<_, BoxError>(Config { url: "https://example.com".into() })
//!     }),
//!     Provider::factory_async::<Client, _>(
//!         &Annotations::new().inject([Token::of::<Config>()]),
//!         |args: Args| async move {
//!             let config = args.get::<Config>(0)?;
//!             Ok::<_, BoxError>(Client { url: config.url.clone() })
//!         },
//!     ),
//! ]);
//!
//! let client = injector.get_promise::<Client>(&Token::of::<Client>()).await.unwrap();
//! assert_eq!(client.url, "https://example.com");
//!
//! // Asynchronous providers cannot be resolved synchronously
//! assert!(injector.get_any(&Token::of::<Config>()).is_err());
//! # });
//! ```
//!
//! ## Child Injectors
//!
//! ```rust
//! use std::sync::Arc;
//! use tokenized_di::{Injector, Provider, Token};
//!
//! let level = Token::symbol("log_level");
//! let root = Injector::new(vec![Provider::value(level.clone(), "info")]);
//! let debug = root.create_child(vec![Provider::value(level.clone(), "debug")]);
//! let plain = root.create_child(Vec::new());
//!
//! assert_eq!(*debug.get::<&str>(&level).unwrap(), "debug");
//! assert_eq!(*root.get::<&str>(&level).unwrap(), "info");
//!
//! // Children without an override share the root's instance
//! assert!(Arc::ptr_eq(
//!     &plain.get::<&str>(&level).unwrap(),
//!     &root.get::<&str>(&level).unwrap(),
//! ));
//! ```

// Module declarations
pub mod annotations;
pub mod async_factories;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod injection;
pub mod injector;
pub mod lifetime;
pub mod observer;
pub mod token;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use annotations::{
    annotate, has_annotation, read_annotations, Annotation, AnnotationKind, Annotations, ParamAnnotation,
};
pub use async_factories::AsyncFactory;
pub use config::InjectorConfig;
pub use descriptors::{Descriptor, InjectionMode, ParamSpec, ProvideSpec, ProviderKind};
pub use error::{BoxError, DiError, DiResult};
pub use injection::{Arg, Args, Lazy, Promise, SuperConstructor};
pub use injector::{Injector, InjectorBuilder};
pub use lifetime::{Lifetime, TransientScope};
pub use observer::{DiObserver, TracingObserver};
pub use registration::{AnyArc, Provider};
pub use token::{token_of, Injectable, Token};
pub use traits::{Resolver, ResolverCore};
