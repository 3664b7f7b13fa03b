use std::fmt;
use std::io;

/// Coarse classification of an SCP failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScpErrorKind {
    /// Operation called in a state that does not allow it.
    InvalidState,
    /// Caller supplied a value that cannot be put on the wire.
    InvalidArgument,
    /// The channel collaborator failed.
    Transport,
    /// The peer sent something the protocol does not allow.
    Protocol,
}

impl fmt::Display for ScpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScpErrorKind::InvalidState => "invalid state",
            ScpErrorKind::InvalidArgument => "invalid argument",
            ScpErrorKind::Transport => "transport error",
            ScpErrorKind::Protocol => "protocol error",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{kind}: {message}")]
pub struct ScpError {
    kind: ScpErrorKind,
    message: String,
    #[source]
    source: Option<io::Error>,
}

impl ScpError {
    pub fn new(kind: ScpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::InvalidState, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::InvalidArgument, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ScpErrorKind::Protocol, message)
    }

    /// Wraps a channel failure, `context` names the channel call that failed.
    pub fn transport(context: &str, source: io::Error) -> Self {
        Self {
            kind: ScpErrorKind::Transport,
            message: format!("{context}: {source}"),
            source: Some(source),
        }
    }

    pub fn kind(&self) -> ScpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the session is left in `Error` by this failure.
    pub fn is_fatal(&self) -> bool {
        self.kind != ScpErrorKind::InvalidArgument
    }
}

pub type ScpResult<T> = Result<T, ScpError>;
