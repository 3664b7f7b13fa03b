use std::fmt;

/// Direction of a session, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScpMode {
    /// Remote runs `scp -t` and receives what we send.
    Push,
    /// Remote runs `scp -f` and sends what we receive.
    Pull,
}

impl fmt::Display for ScpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScpMode::Push => f.write_str("push"),
            ScpMode::Pull => f.write_str("pull"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    NewFile,
    NewDirectory,
}

/// An object announced by the remote source, waiting for accept or deny.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScpRequest {
    pub kind: RequestKind,
    pub name: String,
    pub permissions: String,
    /// Always 0 for directories.
    pub declared_size: u64,
}

/// Result of asking the remote source for its next object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    NewFile,
    NewDirectory,
    /// The peer closed the stream between two objects.
    EndOfStream,
}

impl From<RequestKind> for PullOutcome {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::NewFile => PullOutcome::NewFile,
            RequestKind::NewDirectory => PullOutcome::NewDirectory,
        }
    }
}
