//! Lazy dependency injection for Rust.
//!
//! `lattice-di` wires an application's object graph from factory
//! functions. Providers are registered up front; values are constructed
//! lazily, on first request, with each factory's arguments resolved
//! recursively from the container. Singletons (the default) are built
//! once and shared everywhere; prototypes are rebuilt per request.
//! Dependency cycles are caught by a graph walk before any factory runs.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use lattice_di::Container;
//!
//! struct Config { addr: &'static str }
//! struct Server { config: Arc<Config> }
//!
//! let mut container = Container::new();
//! container.provide(|| Config { addr: "127.0.0.1:8080" }).register()?;
//! container.provide(|config: Arc<Config>| Server { config }).register()?;
//!
//! let server = container.resolve::<Server>()?;
//! assert_eq!(server.config.addr, "127.0.0.1:8080");
//! # Ok::<(), lattice_di::DiError>(())
//! ```
//!
//! # Factory shapes
//!
//! The registration method fixes the factory's output shape, so an
//! unsupported signature is a compile error rather than a runtime one:
//!
//! - [`Container::provide`] — `fn(..) -> T`
//! - [`Container::try_provide`] — `fn(..) -> Result<T, E>`
//! - [`Container::provide_with_cleanup`] — `fn(..) -> (T, Cleanup)`
//! - [`Container::try_provide_with_cleanup`] — `fn(..) -> Result<(T, Cleanup), E>`
//!
//! Arguments come in three families: `Arc<D>` for a required dependency,
//! `Option<Arc<D>>` for an optional one, and `Vec<Arc<D>>` to collect
//! every provider of `D` in registration order.
//!
//! # Names, tags, and traits
//!
//! Several providers of one type coexist when distinguished by a name or
//! tags; requests filter with [`ResolveOptions`]. A provider is exposed
//! under a trait-object identity with
//! [`as_trait`](Binding::as_trait), sharing the same instance between the
//! concrete and trait views. When a trait gains a second implementation,
//! direct resolution of it becomes an ambiguity error and
//! [`Container::resolve_all`] or [`Container::iterate`] collects the
//! group.
//!
//! ```rust
//! use std::sync::Arc;
//! use lattice_di::Container;
//!
//! trait Handler: Send + Sync { fn name(&self) -> &'static str; }
//! struct Http;
//! struct Grpc;
//! impl Handler for Http { fn name(&self) -> &'static str { "http" } }
//! impl Handler for Grpc { fn name(&self) -> &'static str { "grpc" } }
//!
//! let mut container = Container::new();
//! container.provide(|| Http).as_trait::<dyn Handler>(|a| a).register()?;
//! container.provide(|| Grpc).as_trait::<dyn Handler>(|a| a).register()?;
//!
//! let handlers = container.resolve_all::<dyn Handler>()?;
//! let names: Vec<_> = handlers.iter().map(|h| h.name()).collect();
//! assert_eq!(names, ["http", "grpc"]);
//! # Ok::<(), lattice_di::DiError>(())
//! ```
//!
//! # Cleanup
//!
//! A factory registered with a cleanup returns its teardown callback next
//! to the value. [`Container::cleanup`] runs all pending callbacks in
//! reverse construction order, so dependents are torn down before the
//! things they depend on.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod container;
mod cycle;
mod error;
mod factory;
mod injectable;
mod key;
mod lifecycle;
mod lifetime;
mod observer;
mod parameter;
mod provider;
mod registry;
mod tags;

pub use binding::Binding;
pub use container::{Container, GroupItem, ResolveOptions};
pub use error::{BoxError, DiError, DiResult};
pub use factory::Constructor;
pub use injectable::{FieldSet, Injectable};
pub use key::Key;
pub use lifecycle::Cleanup;
pub use lifetime::Lifetime;
pub use observer::{LoggingObserver, NoopObserver, ResolutionObserver};
pub use parameter::{AnyArc, Dependency, Parameter};
pub use tags::Tags;
