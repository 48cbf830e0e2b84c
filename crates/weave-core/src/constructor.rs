//! Constructor descriptors and the resolved arguments handed to them.
//!
//! Implementation types describe how they can be built instead of being
//! discovered through introspection: each [`Constructor`] declares whether it
//! is the designated injection point, the ordered component keys it needs,
//! and a function that builds the value once those keys are resolved.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use weave_common::types::ComponentKey;

use crate::error::ConstructionError;

/// Type-erased instance as stored and passed around by the engine.
///
/// The payload is always an `Arc<K>` for the key `K` it was produced for.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps a typed instance so it can travel through the engine.
pub(crate) fn erase<K>(value: Arc<K>) -> Instance
where
    K: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

/// Recovers the typed `Arc<K>` from an erased instance.
pub(crate) fn downcast<K>(instance: &Instance) -> Option<Arc<K>>
where
    K: ?Sized + Send + Sync + 'static,
{
    instance.downcast_ref::<Arc<K>>().cloned()
}

/// Marks how a constructor participates in selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionPoint {
    /// Designated injection constructor. At most one per type.
    Inject,
    /// Ordinary public constructor. Only used when it takes no arguments
    /// and no injection constructor exists.
    Plain,
}

type Invoke<I> = dyn Fn(&mut Arguments) -> Result<I, ConstructionError> + Send + Sync;

/// A public constructor of implementation type `I`.
pub struct Constructor<I> {
    point: InjectionPoint,
    parameters: Vec<ComponentKey>,
    invoke: Arc<Invoke<I>>,
}

impl<I: 'static> Constructor<I> {
    /// Starts describing the designated injection constructor.
    #[must_use]
    pub const fn inject() -> ConstructorBuilder<I> {
        ConstructorBuilder::new(InjectionPoint::Inject)
    }

    /// Starts describing an unmarked public constructor.
    #[must_use]
    pub const fn plain() -> ConstructorBuilder<I> {
        ConstructorBuilder::new(InjectionPoint::Plain)
    }

    /// An unmarked zero-argument constructor.
    #[must_use]
    pub fn no_args<F>(build: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
    {
        Self::plain().build(move |_| Ok(build()))
    }

    /// An unmarked zero-argument constructor backed by [`Default`].
    #[must_use]
    pub fn from_default() -> Self
    where
        I: Default,
    {
        Self::no_args(I::default)
    }

    /// Returns how this constructor participates in selection.
    #[must_use]
    pub const fn point(&self) -> InjectionPoint {
        self.point
    }

    /// Returns the declared parameter keys in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ComponentKey] {
        &self.parameters
    }

    pub(crate) fn into_parts(self) -> (Vec<ComponentKey>, Arc<Invoke<I>>) {
        (self.parameters, self.invoke)
    }
}

impl<I> Clone for Constructor<I> {
    fn clone(&self) -> Self {
        Self {
            point: self.point,
            parameters: self.parameters.clone(),
            invoke: Arc::clone(&self.invoke),
        }
    }
}

impl<I> fmt::Debug for Constructor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("point", &self.point)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for a [`Constructor`].
///
/// ```rust
/// use std::sync::Arc;
/// use weave_core::constructor::Constructor;
///
/// struct Greeter {
///     greeting: Arc<String>,
/// }
///
/// let ctor = Constructor::<Greeter>::inject()
///     .param::<String>()
///     .build(|args| Ok(Greeter { greeting: args.take::<String>()? }));
/// assert_eq!(ctor.parameters().len(), 1);
/// ```
#[derive(Debug)]
pub struct ConstructorBuilder<I> {
    point: InjectionPoint,
    parameters: Vec<ComponentKey>,
    _marker: PhantomData<fn() -> I>,
}

impl<I: 'static> ConstructorBuilder<I> {
    const fn new(point: InjectionPoint) -> Self {
        Self {
            point,
            parameters: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Appends a parameter of component type `T`.
    #[must_use]
    pub fn param<T: ?Sized + 'static>(mut self) -> Self {
        self.parameters.push(ComponentKey::of::<T>());
        self
    }

    /// Finishes the descriptor with the function that builds the value.
    ///
    /// The function receives the resolved parameters in declaration order.
    pub fn build<F>(self, invoke: F) -> Constructor<I>
    where
        F: Fn(&mut Arguments) -> Result<I, ConstructionError> + Send + Sync + 'static,
    {
        Constructor {
            point: self.point,
            parameters: self.parameters,
            invoke: Arc::new(invoke),
        }
    }
}

/// Resolved constructor parameters, consumed in declaration order.
#[derive(Debug)]
pub struct Arguments {
    values: Vec<(ComponentKey, Instance)>,
    next: usize,
}

impl Arguments {
    pub(crate) const fn new(values: Vec<(ComponentKey, Instance)>) -> Self {
        Self { values, next: 0 }
    }

    /// Takes the next argument, which must have been declared as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::MissingArgument`] when every declared
    /// argument has already been taken, and
    /// [`ConstructionError::ArgumentType`] when the next declared parameter
    /// is not `T`.
    pub fn take<T>(&mut self) -> Result<Arc<T>, ConstructionError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let index = self.next;
        let requested = ComponentKey::of::<T>();
        let Some((declared, value)) = self.values.get(index) else {
            return Err(ConstructionError::MissingArgument {
                index,
                requested: requested.name(),
            });
        };
        let mismatch = || ConstructionError::ArgumentType {
            index,
            declared: declared.name(),
            requested: requested.name(),
        };
        if *declared != requested {
            return Err(mismatch());
        }
        let value = downcast::<T>(value).ok_or_else(mismatch)?;
        self.next += 1;
        Ok(value)
    }

    /// Number of arguments not yet taken.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len() - self.next
    }

    /// Total number of resolved arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a zero-parameter constructor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Lists the public constructors of an implementation type.
///
/// This is the only metadata the engine consumes about a type: which
/// constructors exist, which of them is marked as the injection point, and
/// what each one needs.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Returns every public constructor of `Self`.
    fn constructors() -> Vec<Constructor<Self>>;
}

/// Converts a shared implementation into the shared form of key `K`.
///
/// Every type converts into itself. Conversions into trait objects are
/// declared with [`implements!`](crate::implements).
pub trait Upcast<K: ?Sized> {
    /// Performs the conversion.
    fn upcast(self: Arc<Self>) -> Arc<K>;
}

impl<T: Send + Sync + 'static> Upcast<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares that an implementation type can be bound under trait-object keys.
///
/// ```rust
/// use weave_core::implements;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// implements!(SystemClock => dyn Clock);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($key:ty),+ $(,)?) => {
        $(
            impl $crate::constructor::Upcast<$key> for $implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$key> {
                    self
                }
            }
        )+
    };
}
