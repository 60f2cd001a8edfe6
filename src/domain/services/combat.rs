//! Attack resolution
//!
//! Resolves one attack between two combatants: element bonuses, modifier
//! draw, shield and pierce, equipped defense, retaliate, forced movement,
//! conditions, infusions and experience. Loot, exhaustion and objective checks
//! are left to the caller.

use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;

use crate::domain::entities::{BoardMap, CombatantCore, EntityType};
use crate::domain::services::elemental;
use crate::domain::services::modifier_deck::{DrawnModifier, ModifierDeck};
use crate::domain::value_objects::{
    ActionModifier, AxialCoord, Condition, Element, ElementalState, ModifierEffect, ModifierValue,
};

/// Everything about an attack that is not the two combatants
#[derive(Debug, Clone, Copy)]
pub struct AttackContext<'a> {
    pub base_attack: i32,
    pub action_modifiers: &'a [ActionModifier],
    /// Equipped-item defense of a character target
    pub defense_bonus: i32,
    pub board: &'a BoardMap,
    /// Hexes a forced move may not enter (the target's own hex excluded)
    pub occupied: &'a HashSet<AxialCoord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackOutcome {
    pub modifier: ModifierValue,
    pub reshuffled: bool,
    pub element_bonus: i32,
    pub consumed_elements: Vec<Element>,
    pub raw_damage: i32,
    pub shield_blocked: i32,
    pub damage: i32,
    pub target_dead: bool,
    pub retaliate_damage: i32,
    pub attacker_dead: bool,
    /// Hexes the target was pushed or pulled through, last one is where it ended
    pub forced_path: Vec<AxialCoord>,
    pub conditions_applied: Vec<Condition>,
    pub infused_elements: Vec<Element>,
    pub experience: u32,
}

/// Damage before shield and defense, never negative
pub fn raw_damage(base_attack: i32, modifier: ModifierValue, element_bonus: i32) -> i32 {
    match modifier {
        ModifierValue::Add(value) => (base_attack + value + element_bonus).max(0),
        ModifierValue::Miss => 0,
        ModifierValue::Double => ((base_attack + element_bonus) * 2).max(0),
    }
}

/// Damage absorbed by a shield after pierce
pub fn shield_reduction(damage: i32, shield: u32, pierce: u32) -> i32 {
    let effective = shield.saturating_sub(pierce) as i32;
    effective.min(damage.max(0))
}

/// Walk a target up to `steps` hexes away from (push) or toward (pull) the attacker.
///
/// Each step takes the first neighbour, in direction order, that changes the
/// distance the right way and is on the board, standable and unoccupied.
pub fn forced_movement(
    target: AxialCoord,
    attacker: AxialCoord,
    steps: u32,
    push: bool,
    board: &BoardMap,
    occupied: &HashSet<AxialCoord>,
) -> Vec<AxialCoord> {
    let mut path = Vec::new();
    let mut position = target;
    for _ in 0..steps {
        let current = position.distance(&attacker);
        let next = position.neighbors().into_iter().find(|hex| {
            let distance = hex.distance(&attacker);
            let direction_ok = if push { distance > current } else { distance < current };
            direction_ok
                && *hex != attacker
                && board.can_stand_on(hex)
                && !occupied.contains(hex)
                && !path.contains(hex)
        });
        match next {
            Some(hex) => {
                path.push(hex);
                position = hex;
            }
            None => break,
        }
    }
    path
}

/// Draw for an attack, with advantage from strengthen and disadvantage from muddle
fn draw_modifier<R: Rng + ?Sized>(
    attacker: &CombatantCore,
    deck: &mut ModifierDeck,
    rng: &mut R,
    base_attack: i32,
    element_bonus: i32,
) -> DrawnModifier {
    let strengthened = attacker.has_condition(Condition::Strengthen);
    let muddled = attacker.has_condition(Condition::Muddle);
    let first = deck.draw(rng);
    if strengthened == muddled {
        return first;
    }

    let second = deck.draw(rng);
    let reshuffled = first.reshuffled || second.reshuffled;
    let first_damage = raw_damage(base_attack, first.card.modifier, element_bonus);
    let second_damage = raw_damage(base_attack, second.card.modifier, element_bonus);
    let keep_second = if strengthened {
        second_damage > first_damage
    } else {
        second_damage < first_damage
    };
    let card = if keep_second { second.card } else { first.card };
    DrawnModifier { card, reshuffled }
}

pub fn resolve_attack<R: Rng + ?Sized>(
    attacker: &mut CombatantCore,
    target: &mut CombatantCore,
    deck: &mut ModifierDeck,
    rng: &mut R,
    elements: &mut ElementalState,
    ctx: &AttackContext<'_>,
) -> AttackOutcome {
    let (consumed_state, element_bonus, consumed_elements) =
        elemental::consume_for_action(*elements, ctx.action_modifiers);
    *elements = consumed_state;

    let drawn = draw_modifier(attacker, deck, rng, ctx.base_attack, element_bonus);
    let card = drawn.card;

    let mut pierce = 0;
    let mut push = 0;
    let mut pull = 0;
    let mut conditions = Vec::new();
    let mut infusions = Vec::new();
    let mut experience = 0;
    for modifier in ctx.action_modifiers {
        match modifier {
            ActionModifier::Pierce { value } => pierce += value,
            ActionModifier::Push { value } => push += value,
            ActionModifier::Pull { value } => pull += value,
            ActionModifier::Condition { condition } => conditions.push(*condition),
            ActionModifier::Infuse { element } => infusions.push(*element),
            ActionModifier::Experience { value } => experience += value,
            ActionModifier::ConsumeElement { .. } => {}
        }
    }
    for effect in &card.effects {
        match effect {
            ModifierEffect::Pierce(value) => pierce += value,
            ModifierEffect::Push(value) => push += value,
            ModifierEffect::Pull(value) => pull += value,
            ModifierEffect::Condition(condition) => conditions.push(*condition),
            ModifierEffect::Infuse(element) => infusions.push(*element),
        }
    }

    let raw = raw_damage(ctx.base_attack, card.modifier, element_bonus);
    let shield_blocked = shield_reduction(raw, target.shield, pierce);
    let mut damage = raw - shield_blocked;
    if target.entity_type == EntityType::Character {
        damage = (damage - ctx.defense_bonus.max(0)).max(0);
    }

    let target_dead = target.apply_damage(damage);

    let mut retaliate_damage = 0;
    let mut attacker_dead = false;
    if !target_dead && damage > 0 {
        if let Some(retaliate) = target.retaliate {
            if attacker.position.distance(&target.position) <= retaliate.range {
                retaliate_damage = retaliate.value as i32;
                attacker_dead = attacker.apply_damage(retaliate_damage);
            }
        }
    }

    let mut forced_path = Vec::new();
    let mut conditions_applied = Vec::new();
    if !target_dead {
        if push > 0 {
            forced_path = forced_movement(
                target.position,
                attacker.position,
                push,
                true,
                ctx.board,
                ctx.occupied,
            );
        } else if pull > 0 {
            forced_path = forced_movement(
                target.position,
                attacker.position,
                pull,
                false,
                ctx.board,
                ctx.occupied,
            );
        }
        if let Some(last) = forced_path.last() {
            target.position = *last;
        }

        for condition in conditions {
            if target.conditions.insert(condition) {
                conditions_applied.push(condition);
            }
        }
    }

    for element in &infusions {
        *elements = elemental::generate(*elements, *element);
    }

    tracing::debug!(
        attacker = %attacker.id,
        target = %target.id,
        modifier = %card.modifier,
        damage,
        target_dead,
        "Attack resolved"
    );

    AttackOutcome {
        modifier: card.modifier,
        reshuffled: drawn.reshuffled,
        element_bonus,
        consumed_elements,
        raw_damage: raw,
        shield_blocked,
        damage,
        target_dead,
        retaliate_damage,
        attacker_dead,
        forced_path,
        conditions_applied,
        infused_elements: infusions,
        experience,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Retaliate;
    use crate::domain::value_objects::{ElementIntensity, EntityId, ModifierCard};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn figure(entity_type: EntityType, q: i32, health: i32) -> CombatantCore {
        CombatantCore::new(
            EntityId::new(),
            "figure",
            entity_type,
            AxialCoord::new(q, 0),
            health,
        )
    }

    fn attack(
        attacker: &mut CombatantCore,
        target: &mut CombatantCore,
        cards: Vec<ModifierCard>,
        base_attack: i32,
        modifiers: &[ActionModifier],
    ) -> (AttackOutcome, ModifierDeck, ElementalState) {
        let board = BoardMap::hexagon(4);
        let occupied = HashSet::from([attacker.position]);
        let mut deck = ModifierDeck::from_cards(cards);
        let mut rng = StdRng::seed_from_u64(21);
        let mut elements = ElementalState::default();
        let ctx = AttackContext {
            base_attack,
            action_modifiers: modifiers,
            defense_bonus: 0,
            board: &board,
            occupied: &occupied,
        };
        let outcome = resolve_attack(attacker, target, &mut deck, &mut rng, &mut elements, &ctx);
        (outcome, deck, elements)
    }

    #[test]
    fn test_plus_one_adds_to_base_attack() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 10);
        let (outcome, _, _) = attack(&mut a, &mut t, vec![ModifierCard::add(1)], 3, &[]);
        assert_eq!(outcome.damage, 4);
        assert_eq!(t.current_health, 6);
    }

    #[test]
    fn test_miss_deals_nothing_and_reshuffles() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 10);
        let (outcome, deck, _) = attack(
            &mut a,
            &mut t,
            vec![ModifierCard::miss(), ModifierCard::add(0), ModifierCard::add(1)],
            3,
            &[],
        );
        assert_eq!(outcome.damage, 0);
        assert!(outcome.reshuffled);
        assert_eq!(deck.remaining(), 3);
    }

    #[test]
    fn test_double_against_pierced_shield() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 20);
        t.shield = 2;
        let (outcome, _, _) = attack(
            &mut a,
            &mut t,
            vec![ModifierCard::double()],
            4,
            &[ActionModifier::Pierce { value: 1 }],
        );
        assert_eq!(outcome.raw_damage, 8);
        assert_eq!(outcome.shield_blocked, 1);
        assert_eq!(outcome.damage, 7);
    }

    #[test]
    fn test_damage_never_negative() {
        for base in 0..6 {
            for value in [
                ModifierValue::Add(-2),
                ModifierValue::Add(-1),
                ModifierValue::Add(0),
                ModifierValue::Add(2),
                ModifierValue::Double,
                ModifierValue::Miss,
            ] {
                assert!(raw_damage(base, value, 0) >= 0);
            }
        }
    }

    #[test]
    fn test_shield_reduction_respects_pierce() {
        assert_eq!(shield_reduction(5, 3, 1), 2);
        assert_eq!(shield_reduction(1, 3, 0), 1);
        assert_eq!(shield_reduction(5, 1, 4), 0);
    }

    #[test]
    fn test_defense_bonus_only_protects_characters() {
        let board = BoardMap::hexagon(3);
        let occupied = HashSet::new();
        let ctx = AttackContext {
            base_attack: 3,
            action_modifiers: &[],
            defense_bonus: 2,
            board: &board,
            occupied: &occupied,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut elements = ElementalState::default();

        let mut monster = figure(EntityType::Monster, 0, 10);
        let mut hero = figure(EntityType::Character, 1, 10);
        let mut deck = ModifierDeck::from_cards(vec![ModifierCard::add(0)]);
        let outcome = resolve_attack(&mut monster, &mut hero, &mut deck, &mut rng, &mut elements, &ctx);
        assert_eq!(outcome.damage, 1);

        let mut deck = ModifierDeck::from_cards(vec![ModifierCard::add(0)]);
        let outcome = resolve_attack(&mut hero, &mut monster, &mut deck, &mut rng, &mut elements, &ctx);
        assert_eq!(outcome.damage, 3);
    }

    #[test]
    fn test_retaliate_hits_adjacent_attacker() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 10);
        t.retaliate = Some(Retaliate { value: 2, range: 1 });
        let (outcome, _, _) = attack(&mut a, &mut t, vec![ModifierCard::add(0)], 2, &[]);
        assert_eq!(outcome.retaliate_damage, 2);
        assert_eq!(a.current_health, 8);
    }

    #[test]
    fn test_retaliate_ignores_ranged_attacker() {
        let mut a = figure(EntityType::Character, -2, 10);
        let mut t = figure(EntityType::Monster, 1, 10);
        t.retaliate = Some(Retaliate { value: 2, range: 1 });
        let (outcome, _, _) = attack(&mut a, &mut t, vec![ModifierCard::add(0)], 2, &[]);
        assert_eq!(outcome.retaliate_damage, 0);
        assert_eq!(a.current_health, 10);
    }

    #[test]
    fn test_push_moves_target_away() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 10);
        let (outcome, _, _) = attack(
            &mut a,
            &mut t,
            vec![ModifierCard::add(0)],
            1,
            &[ActionModifier::Push { value: 2 }],
        );
        assert_eq!(outcome.forced_path.len(), 2);
        assert_eq!(t.position.distance(&a.position), 3);
    }

    #[test]
    fn test_pull_stops_next_to_attacker() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 3, 10);
        let (_, _, _) = attack(
            &mut a,
            &mut t,
            vec![ModifierCard::add(0)],
            1,
            &[ActionModifier::Pull { value: 5 }],
        );
        assert_eq!(t.position.distance(&a.position), 1);
    }

    #[test]
    fn test_push_blocked_by_board_edge() {
        let board = BoardMap::hexagon(1);
        let path = forced_movement(
            AxialCoord::new(1, 0),
            AxialCoord::new(0, 0),
            3,
            true,
            &board,
            &HashSet::new(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn test_conditions_and_infusions_applied() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 10);
        let card = ModifierCard::add(0).with_effect(ModifierEffect::Infuse(Element::Light));
        let (outcome, _, elements) = attack(
            &mut a,
            &mut t,
            vec![card],
            1,
            &[
                ActionModifier::Condition {
                    condition: Condition::Poison,
                },
                ActionModifier::Infuse {
                    element: Element::Fire,
                },
                ActionModifier::Experience { value: 1 },
            ],
        );
        assert!(t.has_condition(Condition::Poison));
        assert_eq!(outcome.conditions_applied, vec![Condition::Poison]);
        assert_eq!(elements.get(Element::Fire), ElementIntensity::Strong);
        assert_eq!(elements.get(Element::Light), ElementIntensity::Strong);
        assert_eq!(outcome.experience, 1);
    }

    #[test]
    fn test_consumed_element_adds_damage() {
        let board = BoardMap::hexagon(3);
        let occupied = HashSet::new();
        let modifiers = [ActionModifier::ConsumeElement {
            element: Element::Ice,
            bonus: 2,
        }];
        let ctx = AttackContext {
            base_attack: 2,
            action_modifiers: &modifiers,
            defense_bonus: 0,
            board: &board,
            occupied: &occupied,
        };
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 10);
        let mut rng = StdRng::seed_from_u64(1);
        let mut elements = elemental::generate(ElementalState::default(), Element::Ice);
        let mut deck = ModifierDeck::from_cards(vec![ModifierCard::add(0)]);

        let outcome = resolve_attack(&mut a, &mut t, &mut deck, &mut rng, &mut elements, &ctx);
        assert_eq!(outcome.damage, 4);
        assert_eq!(outcome.consumed_elements, vec![Element::Ice]);
        assert_eq!(elements.get(Element::Ice), ElementIntensity::Inert);
    }

    #[test]
    fn test_kill_skips_side_effects() {
        let mut a = figure(EntityType::Character, 0, 10);
        let mut t = figure(EntityType::Monster, 1, 2);
        t.retaliate = Some(Retaliate { value: 3, range: 1 });
        let (outcome, _, _) = attack(
            &mut a,
            &mut t,
            vec![ModifierCard::add(0)],
            3,
            &[ActionModifier::Condition {
                condition: Condition::Wound,
            }],
        );
        assert!(outcome.target_dead);
        assert_eq!(outcome.retaliate_damage, 0);
        assert!(outcome.conditions_applied.is_empty());
    }

    #[test]
    fn test_strengthen_keeps_better_card() {
        let mut a = figure(EntityType::Character, 0, 10);
        a.conditions.insert(Condition::Strengthen);
        let mut t = figure(EntityType::Monster, 1, 20);
        let (outcome, _, _) = attack(
            &mut a,
            &mut t,
            vec![ModifierCard::add(-1), ModifierCard::add(2)],
            3,
            &[],
        );
        assert_eq!(outcome.damage, 5);
    }
}
