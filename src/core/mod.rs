//! Core assistant components
//!
//! The response engine, its fixed content, and the stores and sessions
//! that sit around it.

pub mod content;
pub mod dashboard;
pub mod db;
mod engine;
mod profile;
mod random;
mod surface;

pub use engine::{action_message, emergency_acknowledgment, ActionKind, Reply, ResponseEngine};
pub use profile::{
    InMemoryProfileRepository, Profile, ProfileError, ProfileRepository, SqliteProfileRepository,
};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
#[cfg(test)]
pub use random::FixedRandom;
pub use surface::{SessionError, SessionExpiry, Sessions, TypingPacing};
