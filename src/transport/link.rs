//! Raw byte links.
//!
//! A [`Link`] is the only thing the protocol needs from the radio: a write
//! primitive that may accept fewer bytes than offered, and a read primitive
//! that waits for bytes. [`StreamLink`] adapts any tokio byte stream (a
//! serial port, a BLE UART bridge, a socket, an in-memory duplex).

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Byte-level link primitives.
///
/// # Contract
///
/// - `write` returns how many bytes of `buf` were accepted. `Ok(0)` or `Err`
///   means the link refused the write.
/// - `read` waits until at least one byte is available and returns how many
///   were copied into `buf`. `Ok(0)` means the link was torn down.
pub trait Link: Send {
    /// Write some prefix of `buf`.
    fn write(&mut self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Read some bytes into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// [`Link`] over a tokio byte stream.
///
/// Every write is flushed so each chunk leaves the device as its own
/// link-level write.
#[derive(Debug)]
pub struct StreamLink<T> {
    inner: T,
}

impl<T> StreamLink<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Link for StreamLink<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf).await?;
        self.inner.flush().await?;
        Ok(n)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).await
    }
}
