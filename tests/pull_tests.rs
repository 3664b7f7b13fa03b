mod common;

use common::{Peer, inited_session};
use rustedbytes_scp::scp::{
    PullOutcome, RequestKind, ScpErrorKind, ScpMode, ScpState, TransferCounters,
};

#[tokio::test]
async fn test_pull_announces_file() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;
    assert_eq!(peer.execs(), vec!["scp -f /tmp/src".to_string()]);
    assert_eq!(session.state(), ScpState::ReadInited);

    peer.reply(b"C0644 1234 data.bin\n");
    assert_eq!(session.pull_request().await.unwrap(), PullOutcome::NewFile);
    assert_eq!(session.state(), ScpState::ReadRequested);
    assert_eq!(session.request_name(), Some("data.bin"));
    assert_eq!(session.request_permissions(), Some("0644"));
    assert_eq!(session.request_size(), Some(1234));
    assert_eq!(session.request().map(|r| r.kind), Some(RequestKind::NewFile));
}

#[tokio::test]
async fn test_deny_pull_request() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 10 x\n");
    assert_eq!(session.pull_request().await.unwrap(), PullOutcome::NewFile);
    assert_eq!(session.request_name(), Some("x"));
    assert_eq!(session.request_size(), Some(10));

    session.deny_request("not allowed").await.unwrap();
    assert_eq!(session.state(), ScpState::ReadInited);
    assert_eq!(peer.written(), b"\x02not allowed\n");
    assert!(session.request().is_none());

    let mut buf = [0u8; 16];
    let calls = peer.io_calls();
    let err = session.read(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::InvalidState);
    assert_eq!(peer.io_calls(), calls);
}

#[tokio::test]
async fn test_accept_and_read_file() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0600 5 notes.txt\nhello");
    session.pull_request().await.unwrap();
    session.accept_request().await.unwrap();
    assert_eq!(peer.written(), &[0]);
    assert_eq!(session.state(), ScpState::ReadReading);
    assert_eq!(session.counters(), TransferCounters::new(5));

    let mut buf = [0u8; 100];
    let n = session.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hello");
    assert_eq!(session.state(), ScpState::ReadInited);
    assert_eq!(session.counters(), TransferCounters::default());
}

#[tokio::test]
async fn test_read_accepts_pending_file() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 3 a\nabc");
    session.pull_request().await.unwrap();

    let mut buf = [0u8; 8];
    let n = session.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"abc");
    assert_eq!(peer.written(), &[0]);
    assert_eq!(session.state(), ScpState::ReadInited);
}

#[tokio::test]
async fn test_directory_requests() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"D0755 0 docs\n");
    assert_eq!(session.pull_request().await.unwrap(), PullOutcome::NewDirectory);
    assert_eq!(session.request_size(), Some(0));
    session.accept_request().await.unwrap();
    assert_eq!(session.state(), ScpState::ReadInited);

    peer.reply(b"D0755 0 more\n");
    session.pull_request().await.unwrap();
    let mut buf = [0u8; 8];
    let err = session.read(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::InvalidState);
    assert_eq!(session.state(), ScpState::Error);
}

#[tokio::test]
async fn test_read_is_clamped_to_chunk_limit() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 200000 big\n");
    peer.reply(&vec![7u8; 200_000]);
    session.pull_request().await.unwrap();
    session.accept_request().await.unwrap();

    let mut buf = vec![0u8; 100_000];
    let mut total = 0;
    while session.state() == ScpState::ReadReading {
        let n = session.read(&mut buf).await.unwrap();
        assert!(n <= 65536);
        total += n;
    }
    assert_eq!(total, 200_000);
}

#[tokio::test]
async fn test_read_stops_at_declared_size() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 3 first\nabcC0644 1 second\nz");
    session.pull_request().await.unwrap();

    let mut buf = [0u8; 10];
    let n = session.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"abc");
    assert_eq!(session.state(), ScpState::ReadInited);

    assert_eq!(session.pull_request().await.unwrap(), PullOutcome::NewFile);
    assert_eq!(session.request_name(), Some("second"));
}

#[tokio::test]
async fn test_malformed_line_is_fatal() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"Xgarbage\n");
    let err = session.pull_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Protocol);
    assert_eq!(session.state(), ScpState::Error);

    peer.reply(b"C0644 1 ok\n");
    let calls = peer.io_calls();
    let err = session.pull_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::InvalidState);
    assert_eq!(peer.io_calls(), calls);
}

#[tokio::test]
async fn test_timestamp_line_is_rejected() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"T1700000000 0 1700000000 0\n");
    let err = session.pull_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Protocol);
    assert_eq!(session.state(), ScpState::Error);
}

#[tokio::test]
async fn test_unsafe_name_is_rejected() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 4 ../../etc/passwd\n");
    let err = session.pull_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Protocol);
}

#[tokio::test]
async fn test_end_of_stream_between_objects() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 2 a\nok");
    session.pull_request().await.unwrap();
    let mut buf = [0u8; 2];
    session.read(&mut buf).await.unwrap();

    assert_eq!(session.pull_request().await.unwrap(), PullOutcome::EndOfStream);
    assert_eq!(session.state(), ScpState::ReadInited);
}

#[tokio::test]
async fn test_end_of_stream_inside_line() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 1");
    let err = session.pull_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Protocol);
    assert_eq!(session.state(), ScpState::Error);
}

#[tokio::test]
async fn test_overlong_line_is_rejected() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    let mut line = b"C0644 1 ".to_vec();
    line.extend(std::iter::repeat_n(b'a', 5000));
    line.push(b'\n');
    peer.reply(&line);

    let err = session.pull_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Protocol);
    assert_eq!(session.state(), ScpState::Error);
}

#[tokio::test]
async fn test_truncated_file_data() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 10 short\nabcd");
    session.pull_request().await.unwrap();

    let mut buf = [0u8; 10];
    assert_eq!(session.read(&mut buf).await.unwrap(), 4);
    assert_eq!(session.counters().processed, 4);

    let err = session.read(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Protocol);
    assert_eq!(session.state(), ScpState::Error);
}

#[tokio::test]
async fn test_channel_read_failure_is_fatal() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.fail_reads();
    let err = session.pull_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Transport);
    assert_eq!(session.state(), ScpState::Error);
}

#[tokio::test]
async fn test_accept_write_failure_is_fatal() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 1 f\n");
    session.pull_request().await.unwrap();
    peer.fail_writes();

    let err = session.accept_request().await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Transport);
    assert_eq!(session.state(), ScpState::Error);
}

#[tokio::test]
async fn test_deny_write_failure_is_fatal() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 1 f\n");
    session.pull_request().await.unwrap();
    peer.fail_writes();

    let err = session.deny_request("no thanks").await.unwrap_err();
    assert_eq!(err.kind(), ScpErrorKind::Transport);
    assert_eq!(session.state(), ScpState::Error);
    assert!(session.request().is_none());
}

#[tokio::test]
async fn test_empty_file_needs_a_final_read() {
    let peer = Peer::new();
    let mut session = inited_session(&peer, ScpMode::Pull, "/tmp/src").await;

    peer.reply(b"C0644 0 empty\n");
    session.pull_request().await.unwrap();
    session.accept_request().await.unwrap();
    assert_eq!(session.state(), ScpState::ReadReading);

    let calls = peer.io_calls();
    let mut buf = [0u8; 4];
    assert_eq!(session.read(&mut buf).await.unwrap(), 0);
    assert_eq!(session.state(), ScpState::ReadInited);
    assert_eq!(peer.io_calls(), calls);
}
