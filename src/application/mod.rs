//! Application layer - Use cases over the domain
//!
//! Services here orchestrate domain logic and talk to the outside world only
//! through the outbound ports.

pub mod dto;
pub mod ports;
pub mod services;
