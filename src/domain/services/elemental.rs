//! Elemental infusion rules

use crate::domain::value_objects::{ActionModifier, Element, ElementIntensity, ElementalState};

pub fn generate(state: ElementalState, element: Element) -> ElementalState {
    state.with(element, ElementIntensity::Strong)
}

pub fn can_consume(state: &ElementalState, element: Element) -> bool {
    matches!(
        state.get(element),
        ElementIntensity::Strong | ElementIntensity::Waning
    )
}

pub fn consume(state: ElementalState, element: Element) -> ElementalState {
    state.with(element, ElementIntensity::Inert)
}

/// End-of-round decay: strong becomes waning, waning becomes inert
pub fn decay(state: ElementalState) -> ElementalState {
    Element::ALL.iter().fold(state, |acc, element| {
        let next = match acc.get(*element) {
            ElementIntensity::Strong => ElementIntensity::Waning,
            ElementIntensity::Waning | ElementIntensity::Inert => ElementIntensity::Inert,
        };
        acc.with(*element, next)
    })
}

/// Consume every available element an action asks for.
///
/// Returns the new state, the summed damage bonus and the elements consumed.
pub fn consume_for_action(
    state: ElementalState,
    modifiers: &[ActionModifier],
) -> (ElementalState, i32, Vec<Element>) {
    let mut state = state;
    let mut bonus = 0;
    let mut consumed = Vec::new();
    for modifier in modifiers {
        if let ActionModifier::ConsumeElement { element, bonus: value } = modifier {
            if can_consume(&state, *element) {
                state = consume(state, *element);
                bonus += value;
                consumed.push(*element);
            }
        }
    }
    (state, bonus, consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_consume() {
        let state = generate(ElementalState::default(), Element::Fire);
        assert_eq!(state.get(Element::Fire), ElementIntensity::Strong);
        assert!(can_consume(&state, Element::Fire));
        let state = consume(state, Element::Fire);
        assert!(!can_consume(&state, Element::Fire));
    }

    #[test]
    fn test_waning_element_can_be_consumed() {
        let state = decay(generate(ElementalState::default(), Element::Ice));
        assert_eq!(state.get(Element::Ice), ElementIntensity::Waning);
        assert!(can_consume(&state, Element::Ice));
    }

    #[test]
    fn test_all_elements_inert_within_two_decays() {
        let mut state = ElementalState::default();
        for element in Element::ALL {
            state = generate(state, element);
        }
        let once = decay(state);
        assert!(Element::ALL
            .iter()
            .all(|e| once.get(*e) == ElementIntensity::Waning));
        assert!(decay(once).is_all_inert());
        assert!(decay(decay(decay(once))).is_all_inert());
    }

    #[test]
    fn test_consume_for_action_skips_inert_elements() {
        let state = generate(ElementalState::default(), Element::Air);
        let modifiers = [
            ActionModifier::ConsumeElement {
                element: Element::Air,
                bonus: 2,
            },
            ActionModifier::ConsumeElement {
                element: Element::Dark,
                bonus: 1,
            },
        ];
        let (state, bonus, consumed) = consume_for_action(state, &modifiers);
        assert_eq!(bonus, 2);
        assert_eq!(consumed, vec![Element::Air]);
        assert!(state.is_all_inert());
    }
}
