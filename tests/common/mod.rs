#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::{Future, ready};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use rustedbytes_scp::scp::{ScpChannel, ScpMode, ScpSession, ScpTransport};

#[derive(Default)]
struct Shared {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    execs: Vec<String>,
    io_calls: usize,
    polls: usize,
    write_limit: Option<usize>,
    overreport_writes: bool,
    fail_open: bool,
    fail_exec: bool,
    fail_reads: bool,
    fail_writes: bool,
    fail_close: bool,
    eof_sent: bool,
    closed: bool,
    released: bool,
}

/// Scripted remote end. Bytes queued with [`Peer::reply`] are what the
/// session reads; everything the session writes is recorded.
#[derive(Clone, Default)]
pub struct Peer {
    shared: Arc<Mutex<Shared>>,
}

impl Peer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap()
    }

    pub fn transport(&self) -> MockTransport {
        MockTransport { peer: self.clone() }
    }

    pub fn reply(&self, bytes: &[u8]) -> &Self {
        self.lock().inbound.extend(bytes.iter().copied());
        self
    }

    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    pub fn clear_written(&self) {
        self.lock().written.clear();
    }

    pub fn execs(&self) -> Vec<String> {
        self.lock().execs.clone()
    }

    pub fn io_calls(&self) -> usize {
        self.lock().io_calls
    }

    pub fn polls(&self) -> usize {
        self.lock().polls
    }

    pub fn set_write_limit(&self, limit: usize) {
        self.lock().write_limit = Some(limit);
    }

    /// Makes every write claim one byte more than it was handed.
    pub fn overreport_writes(&self) {
        self.lock().overreport_writes = true;
    }

    pub fn fail_open(&self) {
        self.lock().fail_open = true;
    }

    pub fn fail_exec(&self) {
        self.lock().fail_exec = true;
    }

    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    pub fn fail_close(&self) {
        self.lock().fail_close = true;
    }

    pub fn eof_sent(&self) -> bool {
        self.lock().eof_sent
    }

    pub fn closed(&self) -> bool {
        self.lock().closed
    }

    pub fn released(&self) -> bool {
        self.lock().released
    }
}

pub struct MockTransport {
    peer: Peer,
}

impl ScpTransport for MockTransport {
    type Channel = MockChannel;

    fn open_channel(&mut self) -> impl Future<Output = io::Result<MockChannel>> + Send {
        let result = if self.peer.lock().fail_open {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "open refused"))
        } else {
            Ok(MockChannel {
                peer: self.peer.clone(),
            })
        };
        ready(result)
    }
}

pub struct MockChannel {
    peer: Peer,
}

fn broken(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, format!("{what} failed"))
}

impl ScpChannel for MockChannel {
    fn request_exec(&mut self, command: &str) -> impl Future<Output = io::Result<()>> + Send {
        let mut shared = self.peer.lock();
        shared.io_calls += 1;
        shared.execs.push(command.to_string());
        let result = if shared.fail_exec {
            Err(broken("exec"))
        } else {
            Ok(())
        };
        ready(result)
    }

    fn write(&mut self, data: &[u8]) -> impl Future<Output = io::Result<usize>> + Send {
        let mut shared = self.peer.lock();
        shared.io_calls += 1;
        let result = if shared.fail_writes {
            Err(broken("write"))
        } else {
            let n = shared.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
            shared.written.extend_from_slice(&data[..n]);
            Ok(if shared.overreport_writes { n + 1 } else { n })
        };
        ready(result)
    }

    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send {
        let mut shared = self.peer.lock();
        shared.io_calls += 1;
        let result = if shared.fail_reads {
            Err(broken("read"))
        } else {
            let n = buf.len().min(shared.inbound.len());
            for (slot, byte) in buf.iter_mut().zip(shared.inbound.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        };
        ready(result)
    }

    fn poll(&mut self) -> impl Future<Output = io::Result<()>> + Send {
        self.peer.lock().polls += 1;
        ready(Ok(()))
    }

    fn send_eof(&mut self) -> impl Future<Output = io::Result<()>> + Send {
        let mut shared = self.peer.lock();
        shared.io_calls += 1;
        shared.eof_sent = true;
        ready(Ok(()))
    }

    fn close(&mut self) -> impl Future<Output = io::Result<()>> + Send {
        let mut shared = self.peer.lock();
        shared.io_calls += 1;
        let result = if shared.fail_close {
            Err(broken("close"))
        } else {
            shared.closed = true;
            Ok(())
        };
        ready(result)
    }

    fn release(self) {
        self.peer.lock().released = true;
    }
}

pub type MockSession = ScpSession<MockTransport>;

/// Session whose remote helper has already confirmed readiness.
pub async fn inited_session(peer: &Peer, mode: ScpMode, location: &str) -> MockSession {
    peer.reply(&[0]);
    let mut session = ScpSession::new(peer.transport(), mode, location).unwrap();
    session.init().await.unwrap();
    session
}
