pub mod error;
pub mod observability;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use observability::{apply_logging_level, init_tracing};
pub use server::{TablegateServer, build_app};
pub use state::AppState;
