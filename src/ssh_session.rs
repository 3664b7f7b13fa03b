use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use log::{debug, info, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::keys::ssh_key::HashAlg;
use russh::{Channel, ChannelMsg, Disconnect};

use crate::client::ClientConfig;
use crate::scp::{ScpChannel, ScpTransport};

pub struct SshSession {
    config: Arc<ClientConfig>,
}

impl SshSession {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }
}

impl client::Handler for SshSession {
    type Error = anyhow::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();

        match &self.config.host_key_fingerprint {
            Some(expected) if *expected == fingerprint => {
                info!("host key verified: {}", fingerprint);
                Ok(true)
            }
            Some(expected) => {
                warn!(
                    "host key mismatch for {}: got {}, expected {}",
                    self.config.host, fingerprint, expected
                );
                Ok(false)
            }
            None => {
                warn!(
                    "accepting unverified host key {} for {}",
                    fingerprint, self.config.host
                );
                Ok(true)
            }
        }
    }
}

/// Authenticated SSH connection that opens one session channel per SCP
/// session.
pub struct SshTransport {
    handle: Handle<SshSession>,
}

impl SshTransport {
    pub async fn connect(config: Arc<ClientConfig>) -> anyhow::Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: config.inactivity_timeout,
            ..Default::default()
        });

        info!("connecting to {}:{}", config.host, config.port);
        let mut handle = client::connect(
            ssh_config,
            (config.host.as_str(), config.port),
            SshSession::new(config.clone()),
        )
        .await
        .with_context(|| format!("connect to {}:{}", config.host, config.port))?;

        let auth = handle
            .authenticate_password(&config.username, &config.password)
            .await
            .context("password authentication")?;
        if !auth.success() {
            bail!("authentication rejected for user {:?}", config.username);
        }
        info!("authenticated as {}", config.username);

        Ok(Self { handle })
    }

    pub async fn disconnect(&self) -> anyhow::Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "scp session finished", "en-US")
            .await
            .context("disconnect")?;
        Ok(())
    }
}

impl ScpTransport for SshTransport {
    type Channel = SshChannel;

    async fn open_channel(&mut self) -> io::Result<SshChannel> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(io::Error::other)?;
        debug!("opened session channel {:?}", channel.id());
        Ok(SshChannel::new(channel))
    }
}

/// Byte stream view of a russh session channel.
///
/// russh delivers data in messages; bytes past what a read asked for stay
/// in `inbound` for the next read.
pub struct SshChannel {
    channel: Channel<Msg>,
    inbound: VecDeque<u8>,
    eof: bool,
}

impl SshChannel {
    pub fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            inbound: VecDeque::new(),
            eof: false,
        }
    }

    fn absorb(&mut self, msg: ChannelMsg) {
        match msg {
            ChannelMsg::Data { data } => self.inbound.extend(data.iter().copied()),
            ChannelMsg::ExtendedData { data, ext } => {
                warn!(
                    "remote stderr ({}): {}",
                    ext,
                    String::from_utf8_lossy(&data).trim_end()
                );
            }
            ChannelMsg::ExitStatus { exit_status } if exit_status != 0 => {
                warn!("remote scp exited with status {}", exit_status);
            }
            ChannelMsg::ExitStatus { .. } => debug!("remote scp exited"),
            ChannelMsg::Eof | ChannelMsg::Close => self.eof = true,
            _ => {}
        }
    }
}

impl ScpChannel for SshChannel {
    async fn request_exec(&mut self, command: &str) -> io::Result<()> {
        self.channel
            .exec(true, command)
            .await
            .map_err(io::Error::other)?;

        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Success) => return Ok(()),
                Some(ChannelMsg::Failure) => {
                    return Err(io::Error::other(format!(
                        "remote refused to run {command:?}"
                    )));
                }
                Some(msg) => self.absorb(msg),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "channel closed before exec reply",
                    ));
                }
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        // russh waits for window space itself
        self.channel.data(data).await.map_err(io::Error::other)?;
        Ok(data.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.inbound.is_empty() && !self.eof {
            match self.channel.wait().await {
                Some(msg) => self.absorb(msg),
                None => self.eof = true,
            }
        }

        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn poll(&mut self) -> io::Result<()> {
        while !self.eof {
            match tokio::time::timeout(Duration::ZERO, self.channel.wait()).await {
                Ok(Some(msg)) => self.absorb(msg),
                Ok(None) => self.eof = true,
                Err(_) => break,
            }
        }
        Ok(())
    }

    async fn send_eof(&mut self) -> io::Result<()> {
        self.channel.eof().await.map_err(io::Error::other)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.channel.close().await.map_err(io::Error::other)
    }
}
