//! Wires a small service graph, validates it, and resolves the entry point.
//!
//! Run with `RUST_LOG=debug cargo run --example composition_root [config.json]`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use weave_core::{Constructor, Context, ContextConfig, Injectable, implements};

trait Store: Send + Sync {
    fn describe(&self) -> String;
}

trait Handler: Send + Sync {
    fn handle(&self, request: &str) -> String;
}

struct Settings {
    database_url: String,
}

struct PostgresStore {
    settings: Arc<Settings>,
}

impl Store for PostgresStore {
    fn describe(&self) -> String {
        format!("postgres at {}", self.settings.database_url)
    }
}

impl Injectable for PostgresStore {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::inject()
                .param::<Settings>()
                .build(|args| {
                    Ok(Self {
                        settings: args.take::<Settings>()?,
                    })
                }),
        ]
    }
}

struct EchoHandler {
    store: Arc<dyn Store>,
}

impl Handler for EchoHandler {
    fn handle(&self, request: &str) -> String {
        format!("{request} (backed by {})", self.store.describe())
    }
}

impl Injectable for EchoHandler {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::inject()
                .param::<dyn Store>()
                .build(|args| {
                    Ok(Self {
                        store: args.take::<dyn Store>()?,
                    })
                }),
        ]
    }
}

implements!(PostgresStore => dyn Store);
implements!(EchoHandler => dyn Handler);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ContextConfig::load(Path::new(&path))
            .with_context(|| format!("loading configuration from {path}"))?,
        None => ContextConfig::default(),
    };

    let context = Context::with_config(config)?;
    context.bind_value(Settings {
        database_url: String::from("postgres://localhost/app"),
    });
    context.bind_type::<dyn Store, PostgresStore>()?;
    context.bind_type::<dyn Handler, EchoHandler>()?;

    context.validate().context("composition root is incomplete")?;

    let graph = context.dependency_graph();
    let order = graph
        .resolve_order()
        .map_err(|cycle| anyhow::anyhow!("cycle: {cycle}"))?;
    for (step, key) in order.iter().enumerate() {
        tracing::info!(step, component = %key.short_name(), "instantiation order");
    }
    tracing::info!(dot = %graph.to_dot(), "dependency graph");

    let handler = context.require::<dyn Handler>()?;
    tracing::info!(response = %handler.handle("GET /health"), "resolved handler");
    Ok(())
}
