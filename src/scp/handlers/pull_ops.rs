use log::{debug, info, warn};

use crate::scp::channel::{ScpChannel, ScpTransport};
use crate::scp::codec::{self, MAX_CONTROL_LINE};
use crate::scp::error::{ScpError, ScpResult};
use crate::scp::session::ScpSession;
use crate::scp::session_state::{ScpOperation, ScpState, Transition};
use crate::scp::types::{PullOutcome, ScpRequest};
use crate::scp::utils::status::{self, Line};

pub async fn handle_pull_request<T: ScpTransport>(
    session: &mut ScpSession<T>,
) -> ScpResult<PullOutcome> {
    let op = ScpOperation::PullRequest;
    session.begin(op)?;

    let outcome: ScpResult<Option<ScpRequest>> = async {
        let channel = session.channel()?;
        match status::read_line(channel, MAX_CONTROL_LINE).await? {
            Line::Complete(line) => codec::decode_request(&line).map(Some),
            Line::EndOfStream => Ok(None),
        }
    }
    .await;

    match outcome {
        Ok(Some(request)) => {
            info!(
                "remote announced {:?} {:?} (mode {}, {} bytes)",
                request.kind, request.name, request.permissions, request.declared_size
            );
            let kind = request.kind;
            session.advance(op, Transition::Requested(request))?;
            Ok(kind.into())
        }
        Ok(None) => {
            info!("remote source ended the stream");
            Ok(PullOutcome::EndOfStream)
        }
        Err(e) => Err(session.fail(op, e)),
    }
}

pub async fn handle_deny_request<T: ScpTransport>(
    session: &mut ScpSession<T>,
    reason: &str,
) -> ScpResult<()> {
    let op = ScpOperation::DenyRequest;
    session.begin(op)?;

    if let Some(name) = session.request_name() {
        warn!("denying {:?}: {}", name, reason);
    }
    let message = codec::encode_deny(reason);
    let outcome: ScpResult<()> = async {
        let channel = session.channel()?;
        status::write_all(channel, &message).await
    }
    .await;

    match outcome {
        Ok(()) => session.advance(op, Transition::Denied),
        Err(e) => Err(session.fail(op, e)),
    }
}

pub async fn handle_accept_request<T: ScpTransport>(session: &mut ScpSession<T>) -> ScpResult<()> {
    let op = ScpOperation::AcceptRequest;
    session.begin(op)?;

    let outcome: ScpResult<()> = async {
        let channel = session.channel()?;
        status::write_all(channel, codec::ACCEPT).await
    }
    .await;

    match outcome {
        Ok(()) => session.advance(op, Transition::Accepted),
        Err(e) => Err(session.fail(op, e)),
    }
}

pub async fn handle_read<T: ScpTransport>(
    session: &mut ScpSession<T>,
    buf: &mut [u8],
) -> ScpResult<usize> {
    let op = ScpOperation::Read;
    session.begin(op)?;

    if session.state() == ScpState::ReadRequested {
        debug!("read on a pending file request, accepting it");
        handle_accept_request(session).await?;
    }

    let counters = session.counters();
    let len = counters.clamp_read(buf.len());

    let outcome: ScpResult<usize> = async {
        if len == 0 {
            return Ok(0);
        }
        let channel = session.channel()?;
        let n = channel
            .read(&mut buf[..len])
            .await
            .map_err(|e| ScpError::transport("channel read", e))?;
        if n == 0 {
            return Err(ScpError::protocol(format!(
                "end of file after {} of {} bytes",
                counters.processed, counters.declared_size
            )));
        }
        Ok(n.min(len))
    }
    .await;

    match outcome {
        Ok(n) => {
            debug!(
                "read {} bytes ({} of {})",
                n,
                counters.processed + n as u64,
                counters.declared_size
            );
            session.advance(op, Transition::ReadBytes(n))?;
            Ok(n)
        }
        Err(e) => Err(session.fail(op, e)),
    }
}
