pub mod archive;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod tasks;
pub mod transfer;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{AppState, Server, create_router};
pub use transfer::FileService;
