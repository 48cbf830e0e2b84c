//! Request-scoped cycle detection.
//!
//! Every top-level resolution owns a [`ResolutionScope`] holding the keys of
//! the constructor providers currently on its call stack. Nothing is stored on
//! the providers themselves, so independent resolutions running on different
//! threads never observe each other's in-flight state.
//!
//! Re-entering a key that is already in flight is a cycle. The failure starts
//! as a [`CycleTrace`] seeded with that key and grows by one component per
//! frame as it unwinds, until it reaches the frame of the seed key itself.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

use weave_common::constants::PATH_SEPARATOR;
use weave_common::types::ComponentKey;

use crate::error::ResolutionError;

/// Components forming a dependency cycle.
///
/// The components are listed in resolution order, starting with the component
/// whose re-entrance was detected: for `A -> B -> C -> A` the trace holds
/// `[A, B, C]`. Every component appears once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleTrace {
    components: Vec<ComponentKey>,
    complete: bool,
}

impl CycleTrace {
    /// Starts a trace at the component that was re-entered.
    pub(crate) fn seed(reentered: ComponentKey) -> Self {
        Self {
            components: vec![reentered],
            complete: false,
        }
    }

    /// Builds a finished trace from a known set of members.
    pub(crate) const fn from_components(components: Vec<ComponentKey>) -> Self {
        Self {
            components,
            complete: true,
        }
    }

    /// Adds the component of an enclosing frame while the trace unwinds.
    ///
    /// Frames between the re-entrance and the first resolution of the seed
    /// are prepended. Reaching the seed's own frame closes the trace, and
    /// frames outside the cycle leave it untouched.
    #[must_use]
    pub(crate) fn extend(mut self, component: ComponentKey) -> Self {
        if self.complete {
            return self;
        }
        if self.components.last() == Some(&component) {
            // the seed was pushed first and sits at the end; move it to the front
            self.components.rotate_right(1);
            self.complete = true;
        } else {
            self.components.insert(0, component);
        }
        self
    }

    /// Returns the cycle members in resolution order.
    #[must_use]
    pub fn components(&self) -> &[ComponentKey] {
        &self.components
    }

    /// Returns `true` if `key` is part of the cycle.
    #[must_use]
    pub fn contains(&self, key: ComponentKey) -> bool {
        self.components.contains(&key)
    }

    /// Number of distinct components on the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the trace has no members. Traces built by the
    /// engine always hold at least the re-entered component.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns `true` once every frame on the cycle has been recorded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }
}

impl fmt::Display for CycleTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.components {
            write!(f, "{key}{PATH_SEPARATOR}")?;
        }
        match self.components.first() {
            Some(first) => write!(f, "{first}"),
            None => Ok(()),
        }
    }
}

/// In-flight state of one top-level resolution.
#[derive(Debug)]
pub(crate) struct ResolutionScope {
    in_flight: HashSet<ComponentKey>,
    path: Vec<ComponentKey>,
    limit: usize,
}

impl ResolutionScope {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            in_flight: HashSet::new(),
            path: Vec::new(),
            limit,
        }
    }

    /// Marks `component` as in flight for the lifetime of the returned frame.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::CyclicDependency`] seeded with `component`
    /// if it is already in flight, or [`ResolutionError::DepthExceeded`] if
    /// the scope is full.
    pub(crate) fn enter(&mut self, component: ComponentKey) -> Result<Frame<'_>, ResolutionError> {
        if self.is_in_flight(component) {
            tracing::debug!(
                component = %component,
                depth = self.path.len(),
                "re-entrant resolution, dependency cycle detected"
            );
            return Err(ResolutionError::CyclicDependency(CycleTrace::seed(component)));
        }
        if self.path.len() >= self.limit {
            return Err(ResolutionError::DepthExceeded {
                component,
                limit: self.limit,
            });
        }
        let _ = self.in_flight.insert(component);
        self.path.push(component);
        Ok(Frame {
            scope: self,
            component,
        })
    }

    /// Number of frames currently open.
    pub(crate) fn depth(&self) -> usize {
        self.path.len()
    }

    /// Keys of the open frames, outermost first.
    pub(crate) fn path(&self) -> &[ComponentKey] {
        &self.path
    }

    pub(crate) fn is_in_flight(&self, component: ComponentKey) -> bool {
        self.in_flight.contains(&component)
    }
}

/// RAII guard for one constructor frame.
///
/// Dereferences to the scope so nested resolutions can open further frames;
/// dropping it marks the component idle again on every exit path.
#[derive(Debug)]
pub(crate) struct Frame<'a> {
    scope: &'a mut ResolutionScope,
    component: ComponentKey,
}

impl Deref for Frame<'_> {
    type Target = ResolutionScope;

    fn deref(&self) -> &Self::Target {
        self.scope
    }
}

impl DerefMut for Frame<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scope
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        let _ = self.scope.in_flight.remove(&self.component);
        if let Some(pos) = self.scope.path.iter().rposition(|k| *k == self.component) {
            let _ = self.scope.path.remove(pos);
        }
    }
}
