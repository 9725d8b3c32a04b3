//! A dependency-injection container with an eager, fail-fast build step.
//!
//! Registrations are collected by a [`ContainerBuilder`]; calling
//! [`ContainerBuilder::build()`] resolves the whole dependency graph,
//! schedules every service in dependency order, and constructs them all up
//! front, so a misconfigured graph (a missing dependency, a cycle, a
//! duplicate registration) is reported once at `build()` time rather than
//! the first time some unlucky caller happens to resolve it.
//!
//! Documentation is under construction!
//!
//! # Examples
//!
//! ## Basic dependency resolution
//!
//! As a user of type `A` we only care about getting an instance to use - the
//! life-cycle of `A` and its dependency `B` is handled by the container.
//!
//! ```
//! use bindgraph::*;
//! use std::sync::Arc;
//!
//! struct B;
//! impl B {
//!     fn bar(&self) -> String {
//!         "b".to_owned()
//!     }
//! }
//!
//! struct A {
//!     b: Arc<B>,
//! }
//! impl A {
//!     fn foo(&self) -> String {
//!         format!("a::{}", self.b.bar())
//!     }
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.add::<B>(Provider::factory::<B, _, ()>(|| B));
//! builder.add::<A>(Provider::factory::<A, _, (Arc<B>,)>(|b| A { b }));
//! let container = builder.build().unwrap();
//!
//! let a = container.injector().get::<A>().unwrap();
//! assert_eq!(a.foo(), "a::b");
//! ```
//!
//! ## Using trait objects (aka interfaces)
//!
//! A concrete service's field can be exposed as a separate, independently
//! injectable dependency via [`ContainerBuilder::add_field_ref()`] - handy
//! for handing out `Arc<dyn Trait>` without the consumer ever naming the
//! concrete type.
//!
//! ```
//! use bindgraph::*;
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter;
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "hello".to_owned()
//!     }
//! }
//!
//! struct GreeterModule {
//!     interface: Arc<dyn Greeter>,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.add::<GreeterModule>(Provider::factory::<GreeterModule, _, ()>(|| GreeterModule {
//!     interface: Arc::new(EnglishGreeter),
//! }));
//! builder.add_field_ref::<dyn Greeter>(Provider::field_ref::<GreeterModule, dyn Greeter>(
//!     "interface",
//!     |m: &GreeterModule| m.interface.clone(),
//! ));
//! let container = builder.build().unwrap();
//!
//! let greeter = container.injector().get::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "hello");
//! ```
//!
//! ## Overriding a registration
//!
//! [`ContainerBuilder::add_override()`] replaces an already-registered
//! provider - useful for swapping in configuration-driven values after a
//! module has declared its defaults.
//!
//! ```
//! use bindgraph::*;
//!
//! let mut builder = ContainerBuilder::new();
//! builder.add_value(8080i32);
//! builder.add_override::<i32>(Provider::value(9090i32));
//! let container = builder.build().unwrap();
//!
//! assert_eq!(*container.injector().get::<i32>().unwrap(), 9090);
//! ```
//!
//! ## Declaring a module with `#[derive(Module)]`
//!
//! A module bundles a set of services declared together; every field of a
//! `#[derive(Module)]` struct contributes one implicit dependency, resolved
//! the same way a field on a `#[derive(Service)]` struct would be.
//!
//! ```
//! use bindgraph::*;
//! use std::sync::Arc;
//!
//! #[derive(Service)]
//! struct Database {
//!     #[bindgraph(default = "localhost".to_owned())]
//!     host: String,
//! }
//!
//! #[derive(Service)]
//! struct Repository {
//!     db: Arc<Database>,
//! }
//!
//! #[derive(Module)]
//! struct AppModule {
//!     database: Arc<Database>,
//!     repository: Arc<Repository>,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder.add_module::<AppModule>();
//! let container = builder.build().unwrap();
//!
//! let repo = container.injector().get::<Repository>().unwrap();
//! assert_eq!(repo.db.host, "localhost");
//! ```

pub use bindgraph_macros::{Module, Service};

mod collector;
pub use collector::{Collector, DepEntry};

mod container;
pub use container::{Container, ContainerBuilder, ContainerHandle, ContainerState, GlobalHostAllocator, HostAllocator, InjectorHandle};

mod errors;
pub use errors::{ContainerError, InjectionError, MissingDependencyError, RefTableOverflowError};

mod executor;

mod hooks;
pub use hooks::{HookEntry, HookKind};

mod injection_context;
pub use injection_context::{InjectionContext, InjectionStack, InjectionStackFrame};

mod injector;
pub use injector::Injector;

mod mask;
pub use mask::{DepMask, MASK_HARD_CEILING};

mod module;
pub use module::{Autowire, Configure, FieldRefSpec, FieldSpec, ModuleDescriptor, Provider};

mod plan;
pub use plan::{Op, Plan};

mod reference_table;
pub use reference_table::ReferenceTable;

mod registry;
pub use registry::TypeInfo;

mod request;
pub use request::{Callable, InitCallable, Request};

mod scheduler;

#[cfg(feature = "logging")]
mod logging;
#[cfg(feature = "logging")]
pub use logging::LoggingBuilder;
