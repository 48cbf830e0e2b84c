//! Constructor selection.
//!
//! Picks the single constructor an implementation type is built with:
//!
//! 1. Exactly one constructor marked [`InjectionPoint::Inject`] wins.
//! 2. More than one marked constructor is ambiguous.
//! 3. With no marked constructor, an unmarked zero-argument constructor is
//!    used.
//! 4. Otherwise the type cannot be bound.
//!
//! Selection runs once per `bind_*` call.

use weave_common::types::ComponentKey;

use crate::constructor::{Constructor, InjectionPoint};
use crate::error::IllegalComponent;

/// Selects the constructor the engine should use for `I`.
///
/// # Errors
///
/// Returns [`IllegalComponent::AmbiguousInjectionPoint`] if several
/// constructors are marked, or [`IllegalComponent::NoUsableConstructor`] if
/// none is marked and no zero-argument constructor exists.
pub fn select_constructor<I: 'static>(
    constructors: impl IntoIterator<Item = Constructor<I>>,
) -> Result<Constructor<I>, IllegalComponent> {
    let component = ComponentKey::of::<I>();
    let (marked, plain): (Vec<_>, Vec<_>) = constructors
        .into_iter()
        .partition(|c| c.point() == InjectionPoint::Inject);

    if marked.len() > 1 {
        return Err(IllegalComponent::AmbiguousInjectionPoint {
            component,
            count: marked.len(),
        });
    }

    if let Some(selected) = marked.into_iter().next() {
        tracing::debug!(
            component = %component,
            parameters = selected.parameters().len(),
            "selected injection constructor"
        );
        return Ok(selected);
    }

    plain
        .into_iter()
        .find(|c| c.parameters().is_empty())
        .inspect(|_| {
            tracing::debug!(component = %component, "selected zero-argument constructor");
        })
        .ok_or(IllegalComponent::NoUsableConstructor { component })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Widget;

    fn marked_with_one_param() -> Constructor<Widget> {
        Constructor::inject()
            .param::<String>()
            .build(|args| {
                let _ = args.take::<String>()?;
                Ok(Widget)
            })
    }

    fn marked_with_two_params() -> Constructor<Widget> {
        Constructor::inject()
            .param::<String>()
            .param::<u32>()
            .build(|_| Ok(Widget))
    }

    fn plain_with_params() -> Constructor<Widget> {
        Constructor::plain()
            .param::<String>()
            .param::<String>()
            .build(|_| Ok(Widget))
    }

    #[test]
    fn single_marked_constructor_is_selected() {
        let selected = select_constructor(vec![Constructor::from_default(), marked_with_one_param()])
            .expect("should select");
        assert_eq!(selected.point(), InjectionPoint::Inject);
        assert_eq!(selected.parameters(), &[ComponentKey::of::<String>()]);
    }

    #[test]
    fn marked_constructor_wins_over_zero_argument() {
        let selected = select_constructor(vec![marked_with_two_params(), Constructor::from_default()])
            .expect("should select");
        assert_eq!(selected.parameters().len(), 2);
    }

    #[test]
    fn multiple_marked_constructors_are_ambiguous() {
        let err = select_constructor(vec![marked_with_one_param(), marked_with_two_params()])
            .unwrap_err();
        assert_eq!(
            err,
            IllegalComponent::AmbiguousInjectionPoint {
                component: ComponentKey::of::<Widget>(),
                count: 2,
            }
        );
    }

    #[test]
    fn zero_argument_constructor_is_fallback() {
        let selected = select_constructor(vec![plain_with_params(), Constructor::from_default()])
            .expect("should select");
        assert_eq!(selected.point(), InjectionPoint::Plain);
        assert!(selected.parameters().is_empty());
    }

    #[test]
    fn no_marked_and_no_zero_argument_is_illegal() {
        let err = select_constructor(vec![plain_with_params()]).unwrap_err();
        assert_eq!(
            err,
            IllegalComponent::NoUsableConstructor {
                component: ComponentKey::of::<Widget>(),
            }
        );
    }

    #[test]
    fn empty_constructor_set_is_illegal() {
        let err = select_constructor(Vec::<Constructor<Widget>>::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no usable constructor"), "got: {msg}");
    }
}
