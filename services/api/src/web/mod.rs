pub mod auth;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod router;
pub mod state;
pub mod sync;

// Re-export the router builder to make it easily accessible to the binary
// that runs the web server.
pub use router::{build_router, cors_layer};
