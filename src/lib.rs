//! Concurrent game-installation locator with fuzzy catalog matching.
//!
//! [`core::session::GameLocator`] walks filesystem roots under a bounded
//! worker pool and reports game candidates; [`matcher::GameMatcher`] resolves
//! those candidates against a game catalog and scores each match.

pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod matcher;
pub mod models;
