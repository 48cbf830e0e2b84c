//! Error types for binding and resolution.
//!
//! Binding failures are static and raised by `bind_*` before the registry is
//! touched. Resolution failures are raised by `get` and propagate unchanged to
//! the caller; the engine never retries.

use thiserror::Error;
use weave_common::types::ComponentKey;

use crate::cycle::CycleTrace;

/// An implementation type offers no single constructor the engine can use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalComponent {
    /// More than one constructor is marked as the injection point.
    #[error("ambiguous injection point: {component} declares {count} injection constructors")]
    AmbiguousInjectionPoint {
        /// Implementation type being bound.
        component: ComponentKey,
        /// Number of marked constructors found.
        count: usize,
    },

    /// Neither a marked constructor nor a zero-argument constructor exists.
    #[error(
        "no usable constructor: {component} has neither an injection constructor nor a zero-argument constructor"
    )]
    NoUsableConstructor {
        /// Implementation type being bound.
        component: ComponentKey,
    },
}

impl IllegalComponent {
    /// Returns the implementation type that was rejected.
    #[must_use]
    pub const fn component(&self) -> ComponentKey {
        match self {
            Self::AmbiguousInjectionPoint { component, .. }
            | Self::NoUsableConstructor { component } => *component,
        }
    }
}

/// A constructor could not build its value from the resolved arguments.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// The constructor asked for more arguments than it declared.
    #[error("argument {index} ({requested}) was requested but not declared")]
    MissingArgument {
        /// Zero-based position of the missing argument.
        index: usize,
        /// Type the constructor asked for.
        requested: &'static str,
    },

    /// The constructor asked for a different type than it declared.
    #[error("argument {index} was declared as {declared} but requested as {requested}")]
    ArgumentType {
        /// Zero-based position of the argument.
        index: usize,
        /// Declared parameter type.
        declared: &'static str,
        /// Type the constructor asked for.
        requested: &'static str,
    },

    /// The constructor body itself failed.
    #[error("{message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },

    /// The constructor body failed with an underlying error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ConstructionError {
    /// Shorthand for [`ConstructionError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Resolving a component failed.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// A required component has no binding.
    #[error("dependency not found: {dependency}{}", required_by(.component))]
    DependencyNotFound {
        /// Type that has no binding.
        dependency: ComponentKey,
        /// Component whose constructor needs it, or `None` when the missing
        /// type was requested directly.
        component: Option<ComponentKey>,
    },

    /// Resolving a component requires resolving itself.
    #[error("cyclic dependency: {0}")]
    CyclicDependency(CycleTrace),

    /// A constructor failed while building its value.
    #[error("failed to construct {component}: {source}")]
    Construction {
        /// Component whose constructor failed.
        component: ComponentKey,
        /// Underlying construction fault.
        source: ConstructionError,
    },

    /// The chain of nested constructors grew past the configured limit.
    #[error("resolution depth limit of {limit} exceeded while resolving {component}")]
    DepthExceeded {
        /// Component that would have opened the frame over the limit.
        component: ComponentKey,
        /// Configured `max_resolution_depth`.
        limit: usize,
    },

    /// A binding produced a value of a different type than its key.
    ///
    /// Every provider stored under key `K` yields an `Arc<K>`, so this is an
    /// internal invariant guard and is not raised by a correct registry.
    #[error("binding for {component} produced a value of another type")]
    TypeMismatch {
        /// Key whose value could not be recovered.
        component: ComponentKey,
    },
}

impl ResolutionError {
    /// Returns the cycle trace when this is a cyclic dependency failure.
    #[must_use]
    pub const fn cycle(&self) -> Option<&CycleTrace> {
        match self {
            Self::CyclicDependency(trace) => Some(trace),
            _ => None,
        }
    }
}

fn required_by(component: &Option<ComponentKey>) -> String {
    component.map_or_else(String::new, |c| format!(" (required by {c})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Component;
    struct Dependency;

    #[test]
    fn dependency_not_found_names_requirer() {
        let err = ResolutionError::DependencyNotFound {
            dependency: ComponentKey::of::<Dependency>(),
            component: Some(ComponentKey::of::<Component>()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Dependency"), "got: {msg}");
        assert!(msg.contains("required by"), "got: {msg}");
    }

    #[test]
    fn dependency_not_found_without_requirer() {
        let err = ResolutionError::DependencyNotFound {
            dependency: ComponentKey::of::<Dependency>(),
            component: None,
        };
        let msg = err.to_string();
        assert!(!msg.contains("required by"), "got: {msg}");
    }

    #[test]
    fn illegal_component_reports_component() {
        let err = IllegalComponent::AmbiguousInjectionPoint {
            component: ComponentKey::of::<Component>(),
            count: 2,
        };
        assert_eq!(err.component(), ComponentKey::of::<Component>());
        let msg = err.to_string();
        assert!(msg.contains("2 injection constructors"), "got: {msg}");
    }

    #[test]
    fn construction_error_from_boxed_error() {
        let io = std::io::Error::other("disk on fire");
        let err = ConstructionError::from(Box::new(io) as Box<dyn std::error::Error + Send + Sync>);
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn cycle_accessor_only_matches_cycles() {
        let err = ResolutionError::TypeMismatch {
            component: ComponentKey::of::<Component>(),
        };
        assert!(err.cycle().is_none());
    }
}
