//! Server core functionality
//!
//! This module contains the main server implementation, the shared request
//! state and the route table.

pub mod core;
pub mod routes;
pub mod state;

pub use self::core::Server;
pub use routes::create_router;
pub use state::AppState;
