use log::{debug, info};

use crate::scp::channel::{ScpChannel, ScpTransport};
use crate::scp::codec;
use crate::scp::error::{ScpError, ScpResult};
use crate::scp::session::ScpSession;
use crate::scp::session_state::{ScpOperation, Transition};
use crate::scp::utils::status;

pub async fn handle_push_directory<T: ScpTransport>(
    session: &mut ScpSession<T>,
    name: &str,
    perms: &str,
) -> ScpResult<()> {
    let op = ScpOperation::PushDirectory;
    session.begin(op)?;
    let line = codec::encode_directory(name, perms).map_err(|e| session.fail(op, e))?;

    info!("push directory: {}", codec::printable(&line));
    send_control_line(session, op, &line, Transition::DirectoryAcked).await
}

pub async fn handle_leave_directory<T: ScpTransport>(session: &mut ScpSession<T>) -> ScpResult<()> {
    let op = ScpOperation::LeaveDirectory;
    session.begin(op)?;

    info!("leave directory");
    send_control_line(session, op, codec::END_DIRECTORY, Transition::DirectoryAcked).await
}

pub async fn handle_push_file<T: ScpTransport>(
    session: &mut ScpSession<T>,
    name: &str,
    size: u64,
    perms: &str,
) -> ScpResult<()> {
    let op = ScpOperation::PushFile;
    session.begin(op)?;
    let line = codec::encode_file(name, size, perms).map_err(|e| session.fail(op, e))?;

    info!("push file: {}", codec::printable(&line));
    send_control_line(session, op, &line, Transition::FileHeaderAcked(size)).await
}

async fn send_control_line<T: ScpTransport>(
    session: &mut ScpSession<T>,
    op: ScpOperation,
    line: &[u8],
    on_ack: Transition,
) -> ScpResult<()> {
    let outcome: ScpResult<()> = async {
        let channel = session.channel()?;
        status::exchange(channel, line).await
    }
    .await;

    match outcome {
        Ok(()) => session.advance(op, on_ack),
        Err(e) => Err(session.fail(op, e)),
    }
}

pub async fn handle_write<T: ScpTransport>(
    session: &mut ScpSession<T>,
    data: &[u8],
) -> ScpResult<usize> {
    let op = ScpOperation::Write;
    session.begin(op)?;

    let counters = session.counters();
    let len = counters.clamp_write(data.len());

    let outcome: ScpResult<usize> = async {
        if len == 0 {
            return Ok(0);
        }
        let channel = session.channel()?;
        // hack to avoid waiting for window change
        channel
            .poll()
            .await
            .map_err(|e| ScpError::transport("channel poll", e))?;
        let written = channel
            .write(&data[..len])
            .await
            .map_err(|e| ScpError::transport("channel write", e))?;
        if written == 0 {
            return Err(ScpError::transport(
                "channel write",
                std::io::Error::new(std::io::ErrorKind::WriteZero, "channel accepted no data"),
            ));
        }
        Ok(written.min(len))
    }
    .await;

    match outcome {
        Ok(written) => {
            debug!(
                "wrote {} bytes ({} of {})",
                written,
                counters.processed + written as u64,
                counters.declared_size
            );
            session.advance(op, Transition::Wrote(written))?;
            Ok(written)
        }
        Err(e) => Err(session.fail(op, e)),
    }
}
