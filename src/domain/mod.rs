//! Domain layer - Game rules with no I/O
//!
//! This layer contains:
//! - Entities: Character, Monster, Summon, board, objectives, scenarios
//! - Value Objects: ids, hex coordinates, elements, conditions, modifier cards
//! - Aggregates: the RoomSession root
//! - Domain Events: notifications broadcast to a room
//! - Domain Services: turn order, modifier decks, combat, elements, objectives

pub mod aggregates;
pub mod entities;
pub mod events;
pub mod services;
pub mod value_objects;
