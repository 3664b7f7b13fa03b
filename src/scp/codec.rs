//! SCP control lines and status bytes.
//!
//! Everything here works on byte buffers only; moving the bytes over a
//! channel is done by [`crate::scp::utils::status`].

use crate::scp::error::{ScpError, ScpResult};
use crate::scp::types::{RequestKind, ScpRequest};
use crate::scp::utils::remote_path::{basename, check_line_safe};

/// Longest control line accepted from the peer, newline included.
pub const MAX_CONTROL_LINE: usize = 4096;

pub const STATUS_OK: u8 = 0x00;
pub const STATUS_FATAL: u8 = 0x02;

pub const END_DIRECTORY: &[u8] = b"E\n";
pub const ACCEPT: &[u8] = &[STATUS_OK];

/// `D<perms> 0 <basename>\n`
pub fn encode_directory(path: &str, perms: &str) -> ScpResult<Vec<u8>> {
    let name = checked_name(path)?;
    check_perms(perms)?;
    Ok(format!("D{perms} 0 {name}\n").into_bytes())
}

/// `C<perms> <size> <basename>\n`
pub fn encode_file(path: &str, size: u64, perms: &str) -> ScpResult<Vec<u8>> {
    let name = checked_name(path)?;
    check_perms(perms)?;
    Ok(format!("C{perms} {size} {name}\n").into_bytes())
}

/// Status byte `0x02` followed by the reason, on a single line.
pub fn encode_deny(reason: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(reason.len() + 2);
    out.push(STATUS_FATAL);
    out.extend(
        reason
            .bytes()
            .map(|b| if b == b'\n' || b == b'\0' { b' ' } else { b }),
    );
    out.push(b'\n');
    out
}

fn checked_name(path: &str) -> ScpResult<&str> {
    check_line_safe("name", path)?;
    basename(path)
}

fn check_perms(perms: &str) -> ScpResult<()> {
    if perms.is_empty() || perms.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(ScpError::invalid_argument(format!(
            "permissions {perms:?} are not a single token"
        )));
    }
    Ok(())
}

/// Parses one newline terminated control line sent by a remote source.
pub fn decode_request(line: &[u8]) -> ScpResult<ScpRequest> {
    let kind = match line.first() {
        Some(b'C') => RequestKind::NewFile,
        Some(b'D') => RequestKind::NewDirectory,
        Some(b'T') => {
            return Err(ScpError::protocol(format!(
                "timestamp messages are not supported: {}",
                printable(line)
            )));
        }
        _ => {
            return Err(ScpError::protocol(format!(
                "unhandled message: {}",
                printable(line)
            )));
        }
    };

    let parse_error = || {
        ScpError::protocol(format!(
            "parsing error while parsing message: {}",
            printable(line)
        ))
    };

    let body = &line[1..];
    let (perms, rest) = split_once(body, b' ').ok_or_else(parse_error)?;
    let (size, rest) = split_once(rest, b' ').ok_or_else(parse_error)?;
    let (name, trailer) = split_once(rest, b'\n').ok_or_else(parse_error)?;
    if !trailer.is_empty() {
        return Err(parse_error());
    }

    let permissions = std::str::from_utf8(perms)
        .ok()
        .filter(|p| !p.is_empty())
        .ok_or_else(parse_error)?;
    let size = parse_size(size).ok_or_else(parse_error)?;
    let name = std::str::from_utf8(name).map_err(|_| parse_error())?;
    check_received_name(name)?;

    Ok(ScpRequest {
        kind,
        name: name.to_string(),
        permissions: permissions.to_string(),
        declared_size: match kind {
            RequestKind::NewFile => size,
            RequestKind::NewDirectory => 0,
        },
    })
}

fn split_once(buf: &[u8], separator: u8) -> Option<(&[u8], &[u8])> {
    let at = buf.iter().position(|&b| b == separator)?;
    Some((&buf[..at], &buf[at + 1..]))
}

fn parse_size(field: &[u8]) -> Option<u64> {
    if field.is_empty() {
        return None;
    }
    field.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
    })
}

fn check_received_name(name: &str) -> ScpResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(ScpError::protocol(format!(
            "peer sent an unsafe object name {name:?}"
        )));
    }
    Ok(())
}

/// Line content for error messages, without the terminator and with
/// control bytes escaped.
pub(crate) fn printable(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    text.trim_end_matches('\n').escape_debug().to_string()
}
