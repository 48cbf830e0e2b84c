//! Domain primitive types used across the Weave workspace.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies an abstract component type in a registry.
///
/// A key is derived from a Rust type, sized or not, so trait objects such as
/// `dyn Repository` are valid keys. Two keys are equal exactly when they were
/// derived from the same type; the type name is carried for diagnostics only.
#[derive(Clone, Copy)]
pub struct ComponentKey {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKey {
    /// Returns the key for type `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the fully qualified type name this key was derived from.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without module paths, e.g. `dyn Repository`
    /// instead of `dyn my_app::storage::Repository`.
    #[must_use]
    pub fn short_name(&self) -> String {
        let mut short = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            match ch {
                ':' => segment.clear(),
                '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                    short.push_str(&segment);
                    segment.clear();
                    short.push(ch);
                }
                _ => segment.push(ch),
            }
        }
        short.push_str(&segment);
        short
    }

    /// Returns the underlying [`TypeId`].
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

// Orders by name first so listings are stable across builds; the type id
// only breaks ties between distinct types that share a name.
impl Ord for ComponentKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.type_id.cmp(&other.type_id))
    }
}

impl PartialOrd for ComponentKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentKey").field(&self.name).finish()
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Renders keys as `A -> B -> C` using their short names.
#[must_use]
pub fn format_path(keys: &[ComponentKey]) -> String {
    keys.iter()
        .map(ComponentKey::short_name)
        .collect::<Vec<_>>()
        .join(crate::constants::PATH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    trait Repository {}
    struct Postgres;

    mod nested {
        pub struct Postgres;
    }

    #[test]
    fn keys_of_same_type_are_equal() {
        assert_eq!(ComponentKey::of::<Postgres>(), ComponentKey::of::<Postgres>());
    }

    #[test]
    fn keys_of_types_sharing_a_short_name_differ() {
        let outer = ComponentKey::of::<Postgres>();
        let inner = ComponentKey::of::<nested::Postgres>();
        assert_ne!(outer, inner);
        assert_eq!(outer.short_name(), inner.short_name());

        let set: HashSet<_> = [outer, inner].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn trait_objects_are_valid_keys() {
        let key = ComponentKey::of::<dyn Repository>();
        assert_eq!(key.short_name(), "dyn Repository");
        assert!(key.name().ends_with("Repository"));
    }

    #[test]
    fn short_name_strips_generic_arguments_paths() {
        let key = ComponentKey::of::<Vec<std::string::String>>();
        assert_eq!(key.short_name(), "Vec<String>");
    }

    #[test]
    fn display_uses_full_type_name() {
        let key = ComponentKey::of::<String>();
        assert_eq!(key.to_string(), "alloc::string::String");
    }

    #[test]
    fn format_path_joins_short_names() {
        let path = [ComponentKey::of::<Postgres>(), ComponentKey::of::<String>()];
        assert_eq!(format_path(&path), "Postgres -> String");
    }

    #[test]
    fn ordering_is_by_name() {
        let mut keys = vec![ComponentKey::of::<bool>(), ComponentKey::of::<String>()];
        keys.sort();
        // "alloc::string::String" sorts before "bool"
        assert_eq!(keys[0], ComponentKey::of::<String>());
    }
}
