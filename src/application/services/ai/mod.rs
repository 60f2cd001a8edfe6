//! Decision making for figures no player controls

pub mod monster_ai;
pub mod summon_ai;
pub mod targeting;

pub use monster_ai::plan_monster_turn;
pub use summon_ai::plan_summon_turn;
pub use targeting::{
    determine_movement, plan_activation, select_focus_target, should_attack, ActorView, AiPlan,
    MovementPlan, TargetCandidate,
};
