/// Upper bound for a single channel read while pulling file data.
pub const MAX_READ_CHUNK: usize = 65536;

/// Bytes processed against the size announced in the file header.
///
/// The header size is the only framing of file data: the transfer ends
/// exactly when `processed` reaches `declared_size`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferCounters {
    pub declared_size: u64,
    pub processed: u64,
}

impl TransferCounters {
    pub fn new(declared_size: u64) -> Self {
        Self {
            declared_size,
            processed: 0,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.declared_size - self.processed
    }

    pub fn is_complete(&self) -> bool {
        self.processed == self.declared_size
    }

    pub fn clamp_write(&self, requested: usize) -> usize {
        clamp_to(requested, self.remaining())
    }

    pub fn clamp_read(&self, requested: usize) -> usize {
        clamp_to(requested.min(MAX_READ_CHUNK), self.remaining())
    }

    /// Accounts `n` transferred bytes. `n` never exceeds a clamped length,
    /// so `processed` stays within `declared_size`.
    pub fn advance(&mut self, n: usize) {
        let n = (n as u64).min(self.remaining());
        self.processed += n;
    }
}

fn clamp_to(requested: usize, remaining: u64) -> usize {
    match usize::try_from(remaining) {
        Ok(remaining) => requested.min(remaining),
        Err(_) => requested,
    }
}
