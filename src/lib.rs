pub mod client;
pub mod scp;
pub mod ssh_session;

pub use client::ClientConfig;
pub use scp::{ScpMode, ScpSession, ScpState};
pub use ssh_session::{SshChannel, SshTransport};
