//! Station health tiers and maintenance advice.
//!
//! - `health`         : deterministic tier classification from the analysis signals.
//! - `recommendations`: ordered advisory text derived from the same signals.

pub mod health;
pub mod recommendations;
