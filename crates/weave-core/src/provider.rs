//! Providers: the lazy factories stored behind each binding.
//!
//! A constant provider hands out the instance it was bound with. A
//! constructor provider runs the depth-first resolution walk: it opens a frame
//! in the caller's [`ResolutionScope`], resolves its parameters left to right
//! through the registry, and invokes its selected constructor.

use std::fmt;
use std::sync::Arc;

use weave_common::types::{ComponentKey, format_path};

use crate::constructor::{Arguments, Constructor, Instance, Upcast, erase};
use crate::context::Context;
use crate::cycle::ResolutionScope;
use crate::error::{ConstructionError, ResolutionError};

type Factory = dyn Fn(&mut Arguments) -> Result<Instance, ConstructionError> + Send + Sync;

/// How a binding produces its instance.
pub(crate) enum Provider {
    /// Always returns the same instance.
    Constant(Instance),
    /// Builds a fresh instance from a selected constructor.
    Constructor(ConstructorProvider),
}

impl Provider {
    /// Keys this provider needs resolved before it can produce a value.
    pub(crate) fn dependencies(&self) -> &[ComponentKey] {
        match self {
            Self::Constant(_) => &[],
            Self::Constructor(provider) => &provider.parameters,
        }
    }

    /// Produces an instance, resolving dependencies through `context`.
    pub(crate) fn resolve(
        &self,
        context: &Context,
        scope: &mut ResolutionScope,
    ) -> Result<Instance, ResolutionError> {
        match self {
            Self::Constant(instance) => Ok(Arc::clone(instance)),
            Self::Constructor(provider) => provider.resolve(context, scope),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(_) => f.write_str("Constant"),
            Self::Constructor(provider) => fmt::Debug::fmt(provider, f),
        }
    }
}

/// Provider backed by the constructor chosen at bind time.
pub(crate) struct ConstructorProvider {
    component: ComponentKey,
    implementation: ComponentKey,
    parameters: Vec<ComponentKey>,
    factory: Arc<Factory>,
}

impl ConstructorProvider {
    /// Wraps a selected constructor of `I` so it yields instances of key `K`.
    pub(crate) fn new<K, I>(constructor: Constructor<I>) -> Self
    where
        K: ?Sized + Send + Sync + 'static,
        I: Upcast<K> + Send + Sync + 'static,
    {
        let (parameters, invoke) = constructor.into_parts();
        let factory = move |args: &mut Arguments| -> Result<Instance, ConstructionError> {
            let built: Arc<K> = <I as Upcast<K>>::upcast(Arc::new(invoke(args)?));
            Ok(erase(built))
        };
        Self {
            component: ComponentKey::of::<K>(),
            implementation: ComponentKey::of::<I>(),
            parameters,
            factory: Arc::new(factory),
        }
    }

    fn resolve(
        &self,
        context: &Context,
        scope: &mut ResolutionScope,
    ) -> Result<Instance, ResolutionError> {
        let mut frame = scope.enter(self.component)?;
        tracing::trace!(
            component = %self.component,
            implementation = %self.implementation,
            depth = frame.depth(),
            path = %format_path(frame.path()),
            "resolving constructor dependencies"
        );

        let mut values = Vec::with_capacity(self.parameters.len());
        for &dependency in &self.parameters {
            match context.resolve_key(dependency, &mut frame) {
                Ok(Some(instance)) => values.push((dependency, instance)),
                Ok(None) => {
                    tracing::debug!(
                        dependency = %dependency,
                        component = %self.component,
                        "dependency has no binding"
                    );
                    return Err(ResolutionError::DependencyNotFound {
                        dependency,
                        component: Some(self.component),
                    });
                }
                Err(ResolutionError::CyclicDependency(trace)) => {
                    return Err(ResolutionError::CyclicDependency(
                        trace.extend(self.component),
                    ));
                }
                Err(other) => return Err(other),
            }
        }

        (self.factory)(&mut Arguments::new(values)).map_err(|source| {
            tracing::debug!(component = %self.component, error = %source, "constructor failed");
            ResolutionError::Construction {
                component: self.component,
                source,
            }
        })
    }
}

impl fmt::Debug for ConstructorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorProvider")
            .field("component", &self.component)
            .field("implementation", &self.implementation)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
