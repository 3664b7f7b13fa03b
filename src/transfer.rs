use std::path::Path;

use anyhow::{Context, bail};
use log::{info, warn};
use rustedbytes_scp::scp::counters::MAX_READ_CHUNK;
use rustedbytes_scp::scp::{PullOutcome, ScpMode, ScpSession, ScpState};
use rustedbytes_scp::SshTransport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::local_file::LocalFile;

const PUSH_CHUNK: usize = 32768;

pub async fn push(
    transport: &mut SshTransport,
    local_file: &Path,
    remote_location: &str,
) -> anyhow::Result<()> {
    let mut source = LocalFile::open(local_file.to_path_buf())
        .await
        .with_context(|| format!("open {}", local_file.display()))?;
    let name = local_file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no UTF-8 file name", local_file.display()))?;

    let mut session = ScpSession::new(transport, ScpMode::Push, remote_location)?;
    session.init().await?;
    session
        .push_file(name, source.size, &source.permissions)
        .await?;

    let mut buffer = vec![0u8; PUSH_CHUNK];
    while session.state() == ScpState::WriteWriting {
        let remaining = session.counters().remaining();
        if remaining == 0 {
            session.write(&[]).await?;
            continue;
        }

        let want = usize::try_from(remaining).map_or(buffer.len(), |r| r.min(buffer.len()));
        let n = source
            .file
            .read(&mut buffer[..want])
            .await
            .with_context(|| format!("read {}", source.path.display()))?;
        if n == 0 {
            bail!(
                "{} ended {} bytes before its announced size",
                source.path.display(),
                remaining
            );
        }

        let mut chunk = &buffer[..n];
        while !chunk.is_empty() {
            let written = session.write(chunk).await?;
            chunk = &chunk[written..];
        }
    }

    info!("sent {} ({} bytes)", name, source.size);
    session.free().await?;
    Ok(())
}

/// Receives files into `local_dir` until the source ends the stream.
///
/// The source has to speak first and must not wait for a per-file
/// acknowledgement, so an OpenSSH `scp -f` will not talk to this.
pub async fn pull(
    transport: &mut SshTransport,
    remote_path: &str,
    local_dir: &Path,
) -> anyhow::Result<()> {
    if !local_dir.is_dir() {
        bail!("{} is not a directory", local_dir.display());
    }

    let mut session = ScpSession::new(transport, ScpMode::Pull, remote_path)?;
    session.init().await?;

    let mut buffer = vec![0u8; MAX_READ_CHUNK];
    let mut received = 0usize;
    loop {
        match session.pull_request().await? {
            PullOutcome::EndOfStream => break,
            PullOutcome::NewDirectory => {
                warn!(
                    "skipping remote directory {:?}",
                    session.request_name().unwrap_or_default()
                );
                session
                    .deny_request("recursive copy is not supported")
                    .await?;
            }
            PullOutcome::NewFile => {
                let request = session
                    .request()
                    .cloned()
                    .context("no pending request after pull")?;
                let mut target = match LocalFile::create(
                    local_dir,
                    &request.name,
                    request.declared_size,
                    &request.permissions,
                )
                .await
                {
                    Ok(target) => target,
                    Err(e) => {
                        session
                            .deny_request(&format!("{}: {}", request.name, e))
                            .await?;
                        return Err(e).context(format!("create {}", request.name));
                    }
                };

                session.accept_request().await?;
                while session.state() == ScpState::ReadReading {
                    let n = session.read(&mut buffer).await?;
                    target
                        .file
                        .write_all(&buffer[..n])
                        .await
                        .with_context(|| format!("write {}", target.path.display()))?;
                }
                target.file.flush().await?;

                info!("received {:?} ({} bytes)", target.path, target.size);
                received += 1;
            }
        }
    }

    info!("pulled {} file(s) from {}", received, remote_path);
    session.free().await?;
    Ok(())
}
