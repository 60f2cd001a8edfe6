//! Value objects - Immutable objects defined by their attributes

mod condition;
mod element;
mod hex;
mod ids;
mod modifier;
mod settings;

pub use condition::Condition;
pub use element::{Element, ElementIntensity, ElementalState};
pub use hex::{AxialCoord, HEX_DIRECTIONS};
pub use ids::*;
pub use modifier::{ActionModifier, ModifierCard, ModifierEffect, ModifierValue};
pub use settings::EngineSettings;
