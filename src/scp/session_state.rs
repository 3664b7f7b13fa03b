use std::fmt;

use crate::scp::counters::TransferCounters;
use crate::scp::error::{ScpError, ScpResult};
use crate::scp::types::{RequestKind, ScpMode, ScpRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScpState {
    New,
    WriteInited,
    WriteWriting,
    ReadInited,
    ReadRequested,
    ReadReading,
    Error,
}

/// Operations whose legality depends on the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScpOperation {
    Init,
    PushDirectory,
    LeaveDirectory,
    PushFile,
    Write,
    PullRequest,
    DenyRequest,
    AcceptRequest,
    Read,
}

impl fmt::Display for ScpOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScpOperation::Init => "init",
            ScpOperation::PushDirectory => "push_directory",
            ScpOperation::LeaveDirectory => "leave_directory",
            ScpOperation::PushFile => "push_file",
            ScpOperation::Write => "write",
            ScpOperation::PullRequest => "pull_request",
            ScpOperation::DenyRequest => "deny_request",
            ScpOperation::AcceptRequest => "accept_request",
            ScpOperation::Read => "read",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed exchange, fed to [`SessionState::apply`].
#[derive(Debug)]
pub(crate) enum Transition {
    Initialized,
    DirectoryAcked,
    FileHeaderAcked(u64),
    Wrote(usize),
    Requested(ScpRequest),
    Denied,
    Accepted,
    ReadBytes(usize),
}

/// State plus the data that is only meaningful in that state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum SessionState {
    #[default]
    New,
    WriteInited,
    WriteWriting(TransferCounters),
    ReadInited,
    ReadRequested(ScpRequest),
    ReadReading(TransferCounters),
    Error,
}

impl SessionState {
    pub fn state(&self) -> ScpState {
        match self {
            SessionState::New => ScpState::New,
            SessionState::WriteInited => ScpState::WriteInited,
            SessionState::WriteWriting(_) => ScpState::WriteWriting,
            SessionState::ReadInited => ScpState::ReadInited,
            SessionState::ReadRequested(_) => ScpState::ReadRequested,
            SessionState::ReadReading(_) => ScpState::ReadReading,
            SessionState::Error => ScpState::Error,
        }
    }

    pub fn permits(&self, op: ScpOperation) -> bool {
        use ScpOperation as Op;
        match (self, op) {
            (SessionState::New, Op::Init) => true,
            (SessionState::WriteInited, Op::PushDirectory | Op::LeaveDirectory | Op::PushFile) => {
                true
            }
            (SessionState::WriteWriting(_), Op::Write) => true,
            (SessionState::ReadInited, Op::PullRequest) => true,
            (SessionState::ReadRequested(_), Op::DenyRequest | Op::AcceptRequest) => true,
            // read on a pending file request accepts it first
            (SessionState::ReadRequested(request), Op::Read) => {
                request.kind == RequestKind::NewFile
            }
            (SessionState::ReadReading(_), Op::Read) => true,
            _ => false,
        }
    }

    pub fn counters(&self) -> TransferCounters {
        match self {
            SessionState::WriteWriting(counters) | SessionState::ReadReading(counters) => *counters,
            _ => TransferCounters::default(),
        }
    }

    pub fn request(&self) -> Option<&ScpRequest> {
        match self {
            SessionState::ReadRequested(request) => Some(request),
            _ => None,
        }
    }

    pub fn apply(self, transition: Transition, mode: ScpMode) -> ScpResult<SessionState> {
        let next = match (self, transition) {
            (SessionState::New, Transition::Initialized) => match mode {
                ScpMode::Push => SessionState::WriteInited,
                ScpMode::Pull => SessionState::ReadInited,
            },
            (SessionState::WriteInited, Transition::DirectoryAcked) => SessionState::WriteInited,
            (SessionState::WriteInited, Transition::FileHeaderAcked(size)) => {
                SessionState::WriteWriting(TransferCounters::new(size))
            }
            (SessionState::WriteWriting(mut counters), Transition::Wrote(n)) => {
                counters.advance(n);
                if counters.is_complete() {
                    SessionState::WriteInited
                } else {
                    SessionState::WriteWriting(counters)
                }
            }
            (SessionState::ReadInited, Transition::Requested(request)) => {
                SessionState::ReadRequested(request)
            }
            (SessionState::ReadRequested(_), Transition::Denied) => SessionState::ReadInited,
            (SessionState::ReadRequested(request), Transition::Accepted) => match request.kind {
                RequestKind::NewFile => {
                    SessionState::ReadReading(TransferCounters::new(request.declared_size))
                }
                RequestKind::NewDirectory => SessionState::ReadInited,
            },
            (SessionState::ReadReading(mut counters), Transition::ReadBytes(n)) => {
                counters.advance(n);
                if counters.is_complete() {
                    SessionState::ReadInited
                } else {
                    SessionState::ReadReading(counters)
                }
            }
            (state, transition) => {
                return Err(ScpError::invalid_state(format!(
                    "{transition:?} is not a valid transition from {:?}",
                    state.state()
                )));
            }
        };
        Ok(next)
    }
}
