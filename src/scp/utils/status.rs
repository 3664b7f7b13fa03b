use log::{debug, warn};

use crate::scp::channel::ScpChannel;
use crate::scp::codec::{self, STATUS_OK};
use crate::scp::error::{ScpError, ScpResult};

/// Longest reason text read after a non-zero status byte.
const MAX_STATUS_REASON: usize = 1024;

/// A line read from the peer.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    /// Bytes up to and including `\n`.
    Complete(Vec<u8>),
    /// The stream ended before the first byte.
    EndOfStream,
}

/// Reads a `\n` terminated line one byte at a time, so that no byte behind
/// the line is consumed from the channel.
pub async fn read_line<C: ScpChannel>(channel: &mut C, limit: usize) -> ScpResult<Line> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    while line.len() < limit {
        let n = channel
            .read(&mut byte)
            .await
            .map_err(|e| ScpError::transport("channel read", e))?;
        if n == 0 {
            if line.is_empty() {
                return Ok(Line::EndOfStream);
            }
            return Err(ScpError::protocol(format!(
                "end of file while reading string: {}",
                codec::printable(&line)
            )));
        }
        line.push(byte[0]);
        if byte[0] == b'\n' {
            return Ok(Line::Complete(line));
        }
    }

    Err(ScpError::protocol(format!(
        "line longer than {limit} bytes: {}...",
        codec::printable(&line[..line.len().min(64)])
    )))
}

/// Writes all of `data`, retrying short writes.
pub async fn write_all<C: ScpChannel>(channel: &mut C, mut data: &[u8]) -> ScpResult<()> {
    while !data.is_empty() {
        let n = channel
            .write(data)
            .await
            .map_err(|e| ScpError::transport("channel write", e))?;
        if n == 0 {
            return Err(ScpError::transport(
                "channel write",
                std::io::Error::new(std::io::ErrorKind::WriteZero, "channel accepted no data"),
            ));
        }
        data = &data[n.min(data.len())..];
    }
    Ok(())
}

/// Reads the one byte acknowledgement that follows init and each control line.
pub async fn read_status<C: ScpChannel>(channel: &mut C) -> ScpResult<()> {
    let mut code = [0u8; 1];
    let n = channel
        .read(&mut code)
        .await
        .map_err(|e| ScpError::transport("channel read", e))?;
    if n == 0 {
        return Err(ScpError::protocol("end of file while waiting for status"));
    }
    if code[0] == STATUS_OK {
        debug!("scp status ok");
        return Ok(());
    }

    let reason = read_reason(channel).await;
    warn!("scp peer replied with status {}: {}", code[0], reason);
    if reason.is_empty() {
        Err(ScpError::protocol(format!("scp status code {} not valid", code[0])))
    } else {
        Err(ScpError::protocol(format!(
            "scp status code {} not valid: {reason}",
            code[0]
        )))
    }
}

/// Best effort, the status byte already decided the outcome.
///
/// This is one more blocking read: a peer that sends a bare status byte and
/// then neither a line nor end of stream keeps the caller waiting here.
async fn read_reason<C: ScpChannel>(channel: &mut C) -> String {
    match read_line(channel, MAX_STATUS_REASON).await {
        Ok(Line::Complete(line)) => codec::printable(&line),
        Ok(Line::EndOfStream) => String::new(),
        Err(e) => {
            debug!("no reason after status byte: {e}");
            String::new()
        }
    }
}

/// Writes a control line and waits for its acknowledgement.
pub async fn exchange<C: ScpChannel>(channel: &mut C, line: &[u8]) -> ScpResult<()> {
    write_all(channel, line).await?;
    read_status(channel).await
}
