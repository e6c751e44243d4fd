pub mod config;
pub mod error;
pub mod inference;
pub mod remote;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use routes::configure_routes;
pub use state::AppState;
