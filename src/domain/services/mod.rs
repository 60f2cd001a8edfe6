//! Domain services - Game rules that span several entities

pub mod combat;
pub mod elemental;
pub mod modifier_deck;
pub mod objective_context;
pub mod objective_evaluator;
pub mod turn_order;

pub use combat::{resolve_attack, AttackContext, AttackOutcome};
pub use modifier_deck::{DeckOwner, DeckSet, DrawnModifier, ModifierDeck};
pub use objective_context::{
    build_context, ContextInput, EntityRecord, EvaluationContext, IntoSnapshot,
};
pub use objective_evaluator::{
    record_progress, CustomPredicate, CustomPredicateRegistry, ObjectiveEvaluator,
    ObjectiveProgress, ObjectiveResult, PredicateOutcome,
};
pub use turn_order::{InitiativeRules, NextTurn, TurnOrderEntry, TurnOrderError};
