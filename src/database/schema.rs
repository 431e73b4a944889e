// Database schema definitions and migrations

pub const EVENTS_SCHEMA: &str = include_str!("../../migrations/001_events.sql");
