pub mod channel;
pub mod codec;
pub mod counters;
pub mod error;
pub mod handlers;
pub mod session;
pub mod session_state;
pub mod types;
pub mod utils;

pub use channel::{ScpChannel, ScpTransport};
pub use counters::TransferCounters;
pub use error::{ScpError, ScpErrorKind, ScpResult};
pub use session::ScpSession;
pub use session_state::{ScpOperation, ScpState};
pub use types::*;
