//! Attack-modifier decks
//!
//! Each character draws from its own deck, all monsters share one deck and all
//! ownerless allies share another. Drawing an `x2` or `miss` card reshuffles
//! the whole deck right away, so the next draw always comes from a full deck.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::domain::value_objects::{EntityId, ModifierCard};

/// A drawn card and whether the draw triggered a reshuffle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawnModifier {
    pub card: ModifierCard,
    pub reshuffled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ModifierDeck {
    /// Next card to draw is at the end
    draw_pile: Vec<ModifierCard>,
    discard: Vec<ModifierCard>,
}

impl ModifierDeck {
    /// The 20-card starting deck, unshuffled
    pub fn standard_cards() -> Vec<ModifierCard> {
        let mut cards = Vec::with_capacity(20);
        cards.extend(std::iter::repeat_with(|| ModifierCard::add(0)).take(6));
        cards.extend(std::iter::repeat_with(|| ModifierCard::add(1)).take(5));
        cards.extend(std::iter::repeat_with(|| ModifierCard::add(-1)).take(5));
        cards.push(ModifierCard::add(2));
        cards.push(ModifierCard::add(-2));
        cards.push(ModifierCard::double());
        cards.push(ModifierCard::miss());
        cards
    }

    pub fn standard<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::from_cards(Self::standard_cards());
        deck.reshuffle(rng);
        deck
    }

    /// A deck that draws the given cards in order until its first reshuffle
    pub fn from_cards(cards: Vec<ModifierCard>) -> Self {
        let mut draw_pile = cards;
        draw_pile.reverse();
        Self {
            draw_pile,
            discard: Vec::new(),
        }
    }

    /// Total cards owned by the deck
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discarded(&self) -> usize {
        self.discard.len()
    }

    pub fn check_reshuffle(card: &ModifierCard) -> bool {
        card.modifier.forces_reshuffle()
    }

    /// Put the discard back into the draw pile and shuffle everything
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.draw_pile.append(&mut self.discard);
        self.draw_pile.shuffle(rng);
    }

    /// Draw the next card. An exhausted pile is refilled from the discard
    /// first; a deck with no cards at all draws a neutral `+0`.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DrawnModifier {
        if self.draw_pile.is_empty() {
            self.reshuffle(rng);
        }
        let Some(card) = self.draw_pile.pop() else {
            return DrawnModifier {
                card: ModifierCard::add(0),
                reshuffled: false,
            };
        };

        self.discard.push(card.clone());
        let reshuffled = Self::check_reshuffle(&card);
        if reshuffled {
            self.reshuffle(rng);
        }
        DrawnModifier { card, reshuffled }
    }
}

/// Whose deck an attack draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckOwner {
    Character(EntityId),
    Monsters,
    Allies,
}

/// All modifier decks of one room
#[derive(Debug, Clone, Default)]
pub struct DeckSet {
    characters: HashMap<EntityId, ModifierDeck>,
    monsters: ModifierDeck,
    allies: ModifierDeck,
}

impl DeckSet {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            characters: HashMap::new(),
            monsters: ModifierDeck::standard(rng),
            allies: ModifierDeck::standard(rng),
        }
    }

    /// Replace one deck, e.g. with a fixed-order deck
    pub fn set_deck(&mut self, owner: DeckOwner, deck: ModifierDeck) {
        match owner {
            DeckOwner::Character(id) => {
                self.characters.insert(id, deck);
            }
            DeckOwner::Monsters => self.monsters = deck,
            DeckOwner::Allies => self.allies = deck,
        }
    }

    /// Deck for the owner; character decks are created on first use
    pub fn deck_mut<R: Rng + ?Sized>(&mut self, owner: DeckOwner, rng: &mut R) -> &mut ModifierDeck {
        match owner {
            DeckOwner::Character(id) => self
                .characters
                .entry(id)
                .or_insert_with(|| ModifierDeck::standard(rng)),
            DeckOwner::Monsters => &mut self.monsters,
            DeckOwner::Allies => &mut self.allies,
        }
    }

    pub fn deck(&self, owner: DeckOwner) -> Option<&ModifierDeck> {
        match owner {
            DeckOwner::Character(id) => self.characters.get(&id),
            DeckOwner::Monsters => Some(&self.monsters),
            DeckOwner::Allies => Some(&self.allies),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ModifierValue;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_standard_deck_composition() {
        let cards = ModifierDeck::standard_cards();
        assert_eq!(cards.len(), 20);
        let count = |value: ModifierValue| cards.iter().filter(|c| c.modifier == value).count();
        assert_eq!(count(ModifierValue::Add(0)), 6);
        assert_eq!(count(ModifierValue::Add(1)), 5);
        assert_eq!(count(ModifierValue::Add(-1)), 5);
        assert_eq!(count(ModifierValue::Double), 1);
        assert_eq!(count(ModifierValue::Miss), 1);
    }

    #[test]
    fn test_fixed_deck_draws_in_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut deck = ModifierDeck::from_cards(vec![ModifierCard::add(1), ModifierCard::add(-1)]);
        assert_eq!(deck.draw(&mut rng).card, ModifierCard::add(1));
        assert_eq!(deck.draw(&mut rng).card, ModifierCard::add(-1));
        assert_eq!(deck.remaining(), 0);
        assert_eq!(deck.discarded(), 2);
    }

    #[test]
    fn test_reshuffle_card_restores_full_deck() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut deck = ModifierDeck::from_cards(vec![
            ModifierCard::add(0),
            ModifierCard::miss(),
            ModifierCard::add(1),
            ModifierCard::double(),
        ]);

        assert!(!deck.draw(&mut rng).reshuffled);
        let drawn = deck.draw(&mut rng);
        assert_eq!(drawn.card, ModifierCard::miss());
        assert!(drawn.reshuffled);
        assert_eq!(deck.remaining(), 4);
        assert_eq!(deck.discarded(), 0);
    }

    #[test]
    fn test_every_reshuffle_card_resets_standard_deck() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut deck = ModifierDeck::standard(&mut rng);
        for _ in 0..200 {
            let drawn = deck.draw(&mut rng);
            assert_eq!(deck.len(), 20);
            if drawn.reshuffled {
                assert_eq!(deck.remaining(), 20);
            }
        }
    }

    #[test]
    fn test_empty_pile_refills_from_discard() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut deck = ModifierDeck::from_cards(vec![ModifierCard::add(2)]);
        deck.draw(&mut rng);
        assert_eq!(deck.draw(&mut rng).card, ModifierCard::add(2));
    }

    #[test]
    fn test_deck_set_creates_character_decks_lazily() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut decks = DeckSet::new(&mut rng);
        let hero = EntityId::from_rng(&mut rng);
        assert!(decks.deck(DeckOwner::Character(hero)).is_none());
        assert_eq!(decks.deck_mut(DeckOwner::Character(hero), &mut rng).len(), 20);
        assert!(decks.deck(DeckOwner::Character(hero)).is_some());
    }
}
