pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use error::{DbError, Result};
pub use models::{Match, MatchState, Player, Team};
pub use service::MatchService;
