// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod board;
pub mod celebration;
pub mod config;
pub mod daily;
pub mod notice;
pub mod phrase;
pub mod runtime;
pub mod score;
pub mod session;

/// Cadence of the periodic clock while a session is on screen.
pub const TICK_RATE_MS: u64 = 50;
