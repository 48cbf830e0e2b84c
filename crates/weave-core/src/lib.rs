//! # weave-core
//!
//! A small dependency-injection resolution engine.
//!
//! A [`Context`] binds component keys (any Rust type, including trait
//! objects) either to a fixed instance or to an implementation type. For
//! implementation types a single constructor is selected at bind time; on
//! `get`, its parameters are resolved recursively through the same context.
//!
//! - **Selector**: picks the marked injection constructor, or falls back to a
//!   zero-argument constructor.
//! - **Provider**: the lazy factory stored behind each binding.
//! - **Cycle detection**: a request-scoped set of in-flight keys; a cycle is
//!   reported with every component on it.
//! - **Graph**: an optional `petgraph` snapshot of the bindings for start-up
//!   validation and DOT output.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use weave_core::{Constructor, Context, Injectable, implements};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct Polite {
//!     name: Arc<String>,
//! }
//!
//! impl Greeter for Polite {
//!     fn greet(&self) -> String {
//!         format!("Good day, {}", self.name)
//!     }
//! }
//!
//! impl Injectable for Polite {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![
//!             Constructor::inject()
//!                 .param::<String>()
//!                 .build(|args| Ok(Self { name: args.take::<String>()? })),
//!         ]
//!     }
//! }
//!
//! implements!(Polite => dyn Greeter);
//!
//! let context = Context::new();
//! context.bind_type::<dyn Greeter, Polite>().expect("bindable");
//! context.bind_value(String::from("Ada"));
//!
//! let greeter = context.require::<dyn Greeter>().expect("resolves");
//! assert_eq!(greeter.greet(), "Good day, Ada");
//! ```

pub mod constructor;
pub mod context;
pub mod cycle;
pub mod error;
pub mod graph;
pub mod selector;

mod provider;

pub use constructor::{Arguments, Constructor, InjectionPoint, Injectable, Instance, Upcast};
pub use context::Context;
pub use cycle::CycleTrace;
pub use error::{ConstructionError, IllegalComponent, ResolutionError};
pub use graph::DependencyGraph;
pub use weave_common::config::ContextConfig;
pub use weave_common::types::ComponentKey;
