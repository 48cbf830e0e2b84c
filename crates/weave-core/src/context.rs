//! The registry: binds component keys to providers and resolves them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use weave_common::config::ContextConfig;
use weave_common::types::ComponentKey;

use crate::constructor::{Constructor, Injectable, Instance, Upcast, downcast, erase};
use crate::cycle::ResolutionScope;
use crate::error::{IllegalComponent, ResolutionError};
use crate::graph::{BindingKind, DependencyGraph};
use crate::provider::{ConstructorProvider, Provider};
use crate::selector::select_constructor;

/// A dependency-injection registry.
///
/// Each key maps to at most one provider; binding a key again replaces its
/// provider. Resolution takes a snapshot of the provider it needs and runs
/// without holding the binding table lock, so independent `get` calls may run
/// concurrently on the same context.
///
/// ```rust
/// use std::sync::Arc;
/// use weave_core::Context;
///
/// let context = Context::new();
/// let greeting = Arc::new(String::from("hello"));
/// context.bind_instance::<String>(Arc::clone(&greeting));
///
/// let resolved = context.get::<String>().expect("resolves").expect("bound");
/// assert!(Arc::ptr_eq(&resolved, &greeting));
/// ```
pub struct Context {
    config: ContextConfig,
    providers: RwLock<HashMap<ComponentKey, Arc<Provider>>>,
}

impl Context {
    /// Creates an empty context with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(ContextConfig::default())
    }

    /// Creates an empty context with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::Config`](weave_common::error::WeaveError::Config)
    /// if the configuration does not pass [`ContextConfig::validate`].
    pub fn with_config(config: ContextConfig) -> weave_common::error::Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ContextConfig) -> Self {
        Self {
            config,
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration this context was created with.
    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Binds `K` to a fixed instance. Every `get::<K>()` returns this `Arc`.
    pub fn bind_instance<K>(&self, instance: Arc<K>)
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.install(ComponentKey::of::<K>(), Provider::Constant(erase(instance)));
    }

    /// Binds `K` to a fixed value.
    pub fn bind_value<K>(&self, value: K)
    where
        K: Send + Sync + 'static,
    {
        self.bind_instance(Arc::new(value));
    }

    /// Binds `K` to implementation type `I`, built with the constructor
    /// selected from [`Injectable::constructors`].
    ///
    /// # Errors
    ///
    /// Returns [`IllegalComponent`] if `I` has no single usable constructor.
    /// The existing binding for `K`, if any, is left in place.
    pub fn bind_type<K, I>(&self) -> Result<(), IllegalComponent>
    where
        K: ?Sized + Send + Sync + 'static,
        I: Injectable + Upcast<K>,
    {
        self.bind_constructors::<K, I>(I::constructors())
    }

    /// Binds `K` to implementation type `I`, built with the constructor
    /// selected from `constructors`.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalComponent`] if the set has no single usable
    /// constructor. The existing binding for `K`, if any, is left in place.
    pub fn bind_constructors<K, I>(
        &self,
        constructors: impl IntoIterator<Item = Constructor<I>>,
    ) -> Result<(), IllegalComponent>
    where
        K: ?Sized + Send + Sync + 'static,
        I: Upcast<K> + Send + Sync + 'static,
    {
        let selected = select_constructor(constructors).inspect_err(|e| {
            tracing::debug!(
                component = %ComponentKey::of::<K>(),
                error = %e,
                "rejected implementation type"
            );
        })?;
        let provider = ConstructorProvider::new::<K, I>(selected);
        self.install(ComponentKey::of::<K>(), Provider::Constructor(provider));
        Ok(())
    }

    /// Resolves `K`.
    ///
    /// Returns `Ok(None)` when `K` has no binding.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] if a transitive dependency is unbound, the
    /// dependencies form a cycle, or a constructor fails.
    pub fn get<K>(&self) -> Result<Option<Arc<K>>, ResolutionError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        let key = ComponentKey::of::<K>();
        tracing::trace!(component = %key, "resolving component");
        let mut scope = ResolutionScope::new(self.config.max_resolution_depth);
        match self.resolve_key(key, &mut scope)? {
            Some(instance) => downcast::<K>(&instance)
                .map(Some)
                .ok_or(ResolutionError::TypeMismatch { component: key }),
            None => Ok(None),
        }
    }

    /// Resolves `K`, treating a missing binding as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::DependencyNotFound`] with no requiring
    /// component if `K` itself is unbound, and otherwise fails like
    /// [`get`](Self::get).
    pub fn require<K>(&self) -> Result<Arc<K>, ResolutionError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.get::<K>()?
            .ok_or(ResolutionError::DependencyNotFound {
                dependency: ComponentKey::of::<K>(),
                component: None,
            })
    }

    /// Returns `true` if `K` has a binding.
    #[must_use]
    pub fn is_bound<K: ?Sized + 'static>(&self) -> bool {
        self.read().contains_key(&ComponentKey::of::<K>())
    }

    /// Number of bound keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns every bound key, sorted by type name.
    #[must_use]
    pub fn keys(&self) -> Vec<ComponentKey> {
        let mut keys: Vec<_> = self.read().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Snapshots the bindings into an explicit dependency graph.
    #[must_use]
    pub fn dependency_graph(&self) -> DependencyGraph {
        let providers = self.read();
        let mut bindings: Vec<_> = providers
            .iter()
            .map(|(key, provider)| {
                let kind = match provider.as_ref() {
                    Provider::Constant(_) => BindingKind::Instance,
                    Provider::Constructor(_) => BindingKind::Constructor,
                };
                (*key, kind, provider.dependencies().to_vec())
            })
            .collect();
        drop(providers);
        bindings.sort_by_key(|(key, _, _)| *key);
        DependencyGraph::from_bindings(&bindings)
    }

    /// Checks every binding without constructing anything.
    ///
    /// # Errors
    ///
    /// Returns the first unbound dependency as
    /// [`ResolutionError::DependencyNotFound`], or else the first cycle as
    /// [`ResolutionError::CyclicDependency`].
    pub fn validate(&self) -> Result<(), ResolutionError> {
        let graph = self.dependency_graph();
        if let Some(missing) = graph.missing().into_iter().next() {
            return Err(ResolutionError::DependencyNotFound {
                dependency: missing.dependency,
                component: missing.required_by.first().copied(),
            });
        }
        if let Some(cycle) = graph.cycles().into_iter().next() {
            return Err(ResolutionError::CyclicDependency(cycle));
        }
        tracing::debug!(bindings = graph.len(), "context validated");
        Ok(())
    }

    /// Resolves one key within an ongoing resolution.
    pub(crate) fn resolve_key(
        &self,
        key: ComponentKey,
        scope: &mut ResolutionScope,
    ) -> Result<Option<Instance>, ResolutionError> {
        let Some(provider) = self.provider(key) else {
            return Ok(None);
        };
        provider.resolve(self, scope).map(Some)
    }

    fn provider(&self, key: ComponentKey) -> Option<Arc<Provider>> {
        self.read().get(&key).cloned()
    }

    fn install(&self, key: ComponentKey, provider: Provider) {
        let dependencies = provider.dependencies().len();
        let previous = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(provider));

        match previous {
            Some(_) if self.config.warn_on_rebind => {
                tracing::warn!(component = %key, dependencies, "replaced existing binding");
            }
            Some(_) => {
                tracing::debug!(component = %key, dependencies, "replaced existing binding");
            }
            None => tracing::debug!(component = %key, dependencies, "bound component"),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ComponentKey, Arc<Provider>>> {
        self.providers.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("bindings", &self.keys())
            .finish()
    }
}
