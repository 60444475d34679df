//! Web layer for the crowding server.
//!
//! A thin JSON surface over [`CrowdingEngine`](crate::engine::CrowdingEngine).

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
