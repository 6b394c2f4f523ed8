//! Domain model for devotion content and admin profiles.
//!
//! # Invariants
//! - Every devotion is identified by a stable `DevotionId`.
//! - Deletion is permanent; there are no tombstones.

pub mod devotion;
pub mod profile;
