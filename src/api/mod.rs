//! This mod holds the library's public API for starting and talking to a herd server.
mod handle;
mod options;
mod wiring;

pub use handle::HerdServer;
pub use options::HerdOptions;
pub use wiring::try_create_herd_server;
pub use wiring::HerdServerConfig;
pub use wiring::HerdServerCreationError;
