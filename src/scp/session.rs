use log::{error, info, warn};

use crate::scp::channel::{ScpChannel, ScpTransport};
use crate::scp::counters::TransferCounters;
use crate::scp::error::{ScpError, ScpResult};
use crate::scp::handlers::{pull_ops, push_ops};
use crate::scp::session_state::{ScpOperation, ScpState, SessionState, Transition};
use crate::scp::types::{PullOutcome, ScpMode, ScpRequest};
use crate::scp::utils::remote_path::{check_line_safe, remote_command};
use crate::scp::utils::status;

/// One SCP exchange with a remote `scp -t` or `scp -f` helper.
///
/// The session owns the channel it opens in [`init`](Self::init) until
/// [`close`](Self::close). Operations must be issued in protocol order; an
/// operation that its current state does not allow fails and leaves the
/// session in [`ScpState::Error`], from which only `close` and `free` work.
pub struct ScpSession<T: ScpTransport> {
    transport: T,
    mode: ScpMode,
    location: String,
    channel: Option<T::Channel>,
    state: SessionState,
}

impl<T: ScpTransport> ScpSession<T> {
    pub fn new(transport: T, mode: ScpMode, location: impl Into<String>) -> ScpResult<Self> {
        let location = location.into();
        if location.is_empty() {
            return Err(ScpError::invalid_argument("scp location must not be empty"));
        }
        check_line_safe("location", &location)?;

        Ok(Self {
            transport,
            mode,
            location,
            channel: None,
            state: SessionState::New,
        })
    }

    pub fn mode(&self) -> ScpMode {
        self.mode
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn state(&self) -> ScpState {
        self.state.state()
    }

    /// `(0, 0)` unless a file is being written or read.
    pub fn counters(&self) -> TransferCounters {
        self.state.counters()
    }

    /// Object announced by the last [`pull_request`](Self::pull_request),
    /// until it is accepted or denied.
    pub fn request(&self) -> Option<&ScpRequest> {
        self.state.request()
    }

    pub fn request_name(&self) -> Option<&str> {
        self.request().map(|r| r.name.as_str())
    }

    pub fn request_permissions(&self) -> Option<&str> {
        self.request().map(|r| r.permissions.as_str())
    }

    pub fn request_size(&self) -> Option<u64> {
        self.request().map(|r| r.declared_size)
    }

    /// Opens the channel, starts the remote helper and waits for its
    /// readiness byte.
    pub async fn init(&mut self) -> ScpResult<()> {
        let op = ScpOperation::Init;
        self.begin(op)?;

        match self.start_remote().await {
            Ok(()) => {
                info!("scp {} session ready on {}", self.mode, self.location);
                self.advance(op, Transition::Initialized)
            }
            Err(e) => Err(self.fail(op, e)),
        }
    }

    async fn start_remote(&mut self) -> ScpResult<()> {
        let channel = self
            .transport
            .open_channel()
            .await
            .map_err(|e| ScpError::transport("channel open", e))?;
        // owned from here on, so close releases it whatever happens next
        let channel = self.channel.insert(channel);

        let command = remote_command(self.mode, &self.location);
        info!("exec: {}", command);
        channel
            .request_exec(&command)
            .await
            .map_err(|e| ScpError::transport("channel exec", e))?;

        status::read_status(channel).await
    }

    pub async fn push_directory(&mut self, name: &str, perms: &str) -> ScpResult<()> {
        push_ops::handle_push_directory(self, name, perms).await
    }

    pub async fn leave_directory(&mut self) -> ScpResult<()> {
        push_ops::handle_leave_directory(self).await
    }

    /// Announces a file of exactly `size` bytes; the data follows through
    /// [`write`](Self::write).
    ///
    /// A 0 byte file still leaves the session in `WriteWriting` until one
    /// zero-length `write` finishes it.
    pub async fn push_file(&mut self, name: &str, size: u64, perms: &str) -> ScpResult<()> {
        push_ops::handle_push_file(self, name, size, perms).await
    }

    /// Sends file data and returns how much of `data` was accepted.
    ///
    /// Never sends more than the header announced. Once the last byte is
    /// sent the session is back in `WriteInited`.
    pub async fn write(&mut self, data: &[u8]) -> ScpResult<usize> {
        push_ops::handle_write(self, data).await
    }

    /// Reads the next control line from the remote source.
    pub async fn pull_request(&mut self) -> ScpResult<PullOutcome> {
        pull_ops::handle_pull_request(self).await
    }

    pub async fn deny_request(&mut self, reason: &str) -> ScpResult<()> {
        pull_ops::handle_deny_request(self, reason).await
    }

    /// Accepting a 0 byte file enters `ReadReading`; one zero-length
    /// [`read`](Self::read) is needed before the next `pull_request`.
    pub async fn accept_request(&mut self) -> ScpResult<()> {
        pull_ops::handle_accept_request(self).await
    }

    /// Reads file data into `buf`, at most 64 KiB per call.
    ///
    /// A pending file request is accepted first. Once the announced size is
    /// read the session is back in `ReadInited`.
    pub async fn read(&mut self, buf: &mut [u8]) -> ScpResult<usize> {
        pull_ops::handle_read(self, buf).await
    }

    /// Sends EOF, closes and releases the channel. Safe to call in any
    /// state and more than once.
    pub async fn close(&mut self) -> ScpResult<()> {
        let Some(mut channel) = self.channel.take() else {
            self.state = SessionState::New;
            return Ok(());
        };

        let eof = channel
            .send_eof()
            .await
            .map_err(|e| ScpError::transport("channel send eof", e));
        let closed = channel
            .close()
            .await
            .map_err(|e| ScpError::transport("channel close", e));
        channel.release();

        match eof.and(closed) {
            Ok(()) => {
                info!("scp session on {} closed", self.location);
                self.state = SessionState::New;
                Ok(())
            }
            Err(e) => {
                error!("scp close failed: {}", e);
                self.state = SessionState::Error;
                Err(e)
            }
        }
    }

    /// Closes the session if needed and drops it.
    pub async fn free(mut self) -> ScpResult<()> {
        if self.channel.is_some() || self.state() != ScpState::New {
            self.close().await?;
        }
        Ok(())
    }

    /// Checks `op` against the current state before any I/O.
    pub(crate) fn begin(&mut self, op: ScpOperation) -> ScpResult<()> {
        if self.state.permits(op) {
            return Ok(());
        }
        let err = ScpError::invalid_state(format!(
            "{op} called under invalid state {:?}",
            self.state()
        ));
        Err(self.fail(op, err))
    }

    pub(crate) fn advance(&mut self, op: ScpOperation, transition: Transition) -> ScpResult<()> {
        let current = std::mem::replace(&mut self.state, SessionState::Error);
        match current.apply(transition, self.mode) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err(e) => Err(self.fail(op, e)),
        }
    }

    /// Records a failed operation; fatal errors leave the session in `Error`.
    pub(crate) fn fail(&mut self, op: ScpOperation, err: ScpError) -> ScpError {
        if err.is_fatal() {
            error!("scp {} failed: {}", op, err);
            self.state = SessionState::Error;
        } else {
            warn!("scp {} rejected: {}", op, err);
        }
        err
    }

    pub(crate) fn channel(&mut self) -> ScpResult<&mut T::Channel> {
        self.channel
            .as_mut()
            .ok_or_else(|| ScpError::invalid_state("scp session has no open channel"))
    }
}
