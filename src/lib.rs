// Module declarations
pub mod config;
pub mod fallback;
pub mod mediator;
pub mod upstream;

// Server module (HTTP API)
pub mod server;
