use std::future::Future;
use std::io;

/// Source of channels, usually an authenticated SSH connection.
pub trait ScpTransport: Send {
    type Channel: ScpChannel;

    fn open_channel(&mut self) -> impl Future<Output = io::Result<Self::Channel>> + Send;
}

/// Ordered, flow controlled byte stream bound to one remote command.
///
/// A session owns its channel exclusively and calls these methods one at a
/// time, in protocol order.
pub trait ScpChannel: Send {
    /// Runs `command` on the remote side, bound to this channel.
    fn request_exec(&mut self, command: &str) -> impl Future<Output = io::Result<()>> + Send;

    /// Writes some prefix of `data` and returns its length.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Waits for at least one byte. `Ok(0)` means the peer ended the stream.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Services pending channel I/O without waiting.
    fn poll(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    fn send_eof(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    fn close(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Drops whatever the channel still holds.
    fn release(self)
    where
        Self: Sized,
    {
    }
}

impl<T: ScpTransport> ScpTransport for &mut T {
    type Channel = T::Channel;

    fn open_channel(&mut self) -> impl Future<Output = io::Result<Self::Channel>> + Send {
        (**self).open_channel()
    }
}
