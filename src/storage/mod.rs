mod session;

pub use session::*;

/// SQL migration for the session slot table
pub const MIGRATION_001_SESSION_SLOTS: &str = include_str!("migrations/001_session_slots.sql");
