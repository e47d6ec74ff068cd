//! Message-passing facade between the host application and the controllers
//!
//! - `errors`: Error type returned across the boundary
//! - `host`: Push channel from the bridge to the host
//! - `plugin`: The bridge itself, routing host calls to the current controllers
//! - `types`: Wire types and the JSON request/reply envelope

mod errors;
mod host;
mod plugin;
mod types;

pub use errors::BridgeError;
pub use host::HostMessenger;
pub use plugin::AuthQrBridge;
pub use types::{AuthConfig, AuthResult, BridgeReply, BridgeRequest, channel_name};
