use crate::scp::error::{ScpError, ScpResult};
use crate::scp::types::ScpMode;

/// Final component of a caller supplied path, so that the name written in a
/// control line can never climb out of the remote destination directory.
pub fn basename(path: &str) -> ScpResult<&str> {
    let trimmed = path.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);

    match name {
        "" => Err(ScpError::invalid_argument(format!(
            "path {path:?} has no file name component"
        ))),
        "." | ".." => Err(ScpError::invalid_argument(format!(
            "path {path:?} does not name a file"
        ))),
        name => Ok(name),
    }
}

/// Remote helper command that binds the channel to the session's mode.
pub fn remote_command(mode: ScpMode, location: &str) -> String {
    match mode {
        ScpMode::Push => format!("scp -t {location}"),
        ScpMode::Pull => format!("scp -f {location}"),
    }
}

/// Rejects text that would break a newline framed control line.
pub fn check_line_safe(what: &str, value: &str) -> ScpResult<()> {
    if value.contains(['\n', '\0']) {
        return Err(ScpError::invalid_argument(format!(
            "{what} {value:?} contains a line terminator"
        )));
    }
    Ok(())
}
