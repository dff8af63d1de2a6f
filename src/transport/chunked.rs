//! Chunked writes and pull reads over a [`Link`].

use std::time::Duration;

use tracing::{debug, trace};

use super::error::{TransportError, TransportResult};
use super::link::Link;
use crate::codec::{frame_length, length_field_size};
use crate::core::CodecError;
use crate::core::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_PACKET_SIZE, MAX_LINK_WRITE};

/// Fragments outbound packets into link-sized writes and reassembles inbound
/// packets by pulling exact byte counts from the link.
#[derive(Debug)]
pub struct ChunkedTransport<L> {
    link: L,
    chunk_size: usize,
    max_frame_size: usize,
}

impl<L: Link> ChunkedTransport<L> {
    /// Wrap a link with the default chunk and frame sizes.
    pub fn new(link: L) -> Self {
        Self {
            link,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }

    /// Set the chunk size, clamped to `1..=MAX_LINK_WRITE`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_LINK_WRITE);
        self
    }

    /// Set the largest inbound frame accepted by [`read_frame`](Self::read_frame).
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Current chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Largest accepted inbound frame.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Get a reference to the underlying link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Unwrap the underlying link.
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Write `bytes` to the link in pieces of at most `chunk_size`.
    ///
    /// Short writes advance the cursor by exactly the accepted count. The
    /// first write that accepts nothing (or errors) ends the send with
    /// [`TransportError::WriteFailed`]; the packet counts as undelivered.
    pub async fn send(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let total = bytes.len();
        let mut sent = 0;

        while sent < total {
            let end = total.min(sent + self.chunk_size);
            match self.link.write(&bytes[sent..end]).await {
                Ok(0) => return Err(TransportError::WriteFailed { sent, total }),
                Ok(n) => {
                    trace!(offset = sent, accepted = n, total, "chunk written");
                    sent += n.min(end - sent);
                }
                Err(e) => {
                    trace!(offset = sent, total, error = %e, "chunk write failed");
                    return Err(TransportError::WriteFailed { sent, total });
                }
            }
        }
        Ok(())
    }

    /// Fill `buf` completely, waiting on the link as needed.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> TransportResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.link.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(TransportError::LinkClosed);
            }
            filled += n;
        }
        Ok(())
    }

    /// Read exactly `count` bytes.
    pub async fn read(&mut self, count: usize) -> TransportResult<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf).await?;
        Ok(buf)
    }

    /// Throw away inbound bytes the link already holds.
    ///
    /// Returns as soon as a read would have to wait (or the link reports
    /// closed), with the number of bytes dropped. Framing restarts at the
    /// next byte to arrive.
    pub async fn discard_pending(&mut self) -> TransportResult<usize> {
        let mut buf = [0u8; 32];
        let mut discarded = 0;
        loop {
            match tokio::time::timeout(Duration::ZERO, self.link.read(&mut buf)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(e.into()),
            }
        }
        if discarded > 0 {
            debug!(discarded, "dropped stale inbound bytes");
        }
        Ok(discarded)
    }

    /// Pull one complete MQTT-SN frame, length header included.
    pub async fn read_frame(&mut self) -> TransportResult<Vec<u8>> {
        let mut frame = self.read(1).await?;
        let field_size = length_field_size(frame[0]);
        if field_size > 1 {
            frame.extend(self.read(field_size - 1).await?);
        }

        let total = frame_length(&frame)?;
        if total > self.max_frame_size {
            return Err(TransportError::Frame(CodecError::PacketTooLarge(total)));
        }

        frame.extend(self.read(total - field_size).await?);
        trace!(len = total, "frame received");
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::testing::ScriptedLink;
    use crate::transport::StreamLink;

    fn run<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[tokio::test]
    async fn test_send_splits_into_chunks() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link);

        let data: Vec<u8> = (0..40).collect();
        transport.send(&data).await.unwrap();

        let writes = handle.writes();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].len(), 18);
        assert_eq!(writes[1].len(), 18);
        assert_eq!(writes[2].len(), 4);
        assert_eq!(handle.written(), data);
    }

    #[tokio::test]
    async fn test_send_empty_does_not_write() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link);

        transport.send(&[]).await.unwrap();
        assert_eq!(handle.write_count(), 0);
    }

    #[tokio::test]
    async fn test_send_short_writes_advance_cursor() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link.with_write_limit(5));

        let data: Vec<u8> = (0..23).collect();
        transport.send(&data).await.unwrap();

        // 5 + 5 + 5 + 5 + 3
        assert_eq!(handle.write_count(), 5);
        assert_eq!(handle.written(), data);
    }

    #[tokio::test]
    async fn test_send_stops_on_zero_write() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link.failing_at(1));

        let data = [7u8; 50];
        let err = transport.send(&data).await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::WriteFailed { sent: 18, total: 50 }
        ));
        // The failing call is the last one made.
        assert_eq!(handle.write_count(), 2);
    }

    #[test]
    fn test_chunk_size_is_clamped() {
        let (link, _) = ScriptedLink::new();
        assert_eq!(ChunkedTransport::new(link).with_chunk_size(64).chunk_size(), 20);
        let (link, _) = ScriptedLink::new();
        assert_eq!(ChunkedTransport::new(link).with_chunk_size(0).chunk_size(), 1);
    }

    #[tokio::test]
    async fn test_read_pulls_until_complete() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link.with_read_limit(2));
        handle.push_inbound(b"abcdefg");

        assert_eq!(transport.read(5).await.unwrap(), b"abcde");
        assert_eq!(transport.read(2).await.unwrap(), b"fg");
    }

    #[tokio::test]
    async fn test_read_link_closed() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link);
        handle.push_inbound(b"ab");

        assert!(matches!(
            transport.read(3).await,
            Err(TransportError::LinkClosed)
        ));
    }

    #[tokio::test]
    async fn test_read_frame_short_and_long_form() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link.with_read_limit(3));

        // CONNACK followed by a long-form frame.
        handle.push_inbound(&[0x03, 0x05, 0x00]);
        let mut long = vec![0x01, 0x00, 0x0A, 0x0C];
        long.extend_from_slice(&[0xAA; 6]);
        handle.push_inbound(&long);

        assert_eq!(transport.read_frame().await.unwrap(), [0x03, 0x05, 0x00]);
        assert_eq!(transport.read_frame().await.unwrap(), long);
    }

    #[tokio::test]
    async fn test_read_frame_rejects_bad_lengths() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link).with_max_frame_size(16);

        handle.push_inbound(&[0x00]);
        assert!(matches!(
            transport.read_frame().await,
            Err(TransportError::Frame(CodecError::InvalidLength(0)))
        ));

        handle.push_inbound(&[0x20]);
        assert!(matches!(
            transport.read_frame().await,
            Err(TransportError::Frame(CodecError::PacketTooLarge(32)))
        ));
    }

    #[tokio::test]
    async fn test_discard_pending_drops_buffered_bytes() {
        let (link, handle) = ScriptedLink::new();
        let mut transport = ChunkedTransport::new(link.with_read_limit(5));
        handle.push_inbound(&[0xAA; 40]);

        assert_eq!(transport.discard_pending().await.unwrap(), 40);
        assert_eq!(transport.discard_pending().await.unwrap(), 0);

        handle.push_inbound(&[0x03, 0x05, 0x00]);
        assert_eq!(transport.read_frame().await.unwrap(), [0x03, 0x05, 0x00]);
    }

    #[tokio::test]
    async fn test_discard_pending_does_not_wait_on_idle_stream() {
        let (device, mut gateway) = tokio::io::duplex(64);
        let mut transport = ChunkedTransport::new(StreamLink::new(device));

        assert_eq!(transport.discard_pending().await.unwrap(), 0);

        // Tail of a frame the device gave up on, then a fresh CONNACK.
        gateway.write_all(&[0x0C, 0x00, 0x00, 0x01]).await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(transport.discard_pending().await.unwrap(), 4);

        gateway.write_all(&[0x03, 0x05, 0x00]).await.unwrap();
        assert_eq!(transport.read_frame().await.unwrap(), [0x03, 0x05, 0x00]);
    }

    proptest! {
        #[test]
        fn test_send_covers_payload_once_in_order(
            data in proptest::collection::vec(any::<u8>(), 0..200),
            chunk_size in 1usize..=20,
        ) {
            let (link, handle) = ScriptedLink::new();
            let mut transport = ChunkedTransport::new(link).with_chunk_size(chunk_size);

            run(transport.send(&data)).unwrap();

            let writes = handle.writes();
            prop_assert_eq!(writes.len(), data.len().div_ceil(chunk_size));
            prop_assert!(writes.iter().all(|w| !w.is_empty() && w.len() <= chunk_size));
            prop_assert_eq!(handle.written(), data);
        }

        #[test]
        fn test_send_never_writes_after_failure(
            len in 1usize..120,
            fail_at in 0usize..8,
        ) {
            let (link, handle) = ScriptedLink::new();
            let mut transport = ChunkedTransport::new(link.failing_at(fail_at));
            let data = vec![1u8; len];

            let result = run(transport.send(&data));
            let needed = len.div_ceil(DEFAULT_CHUNK_SIZE);
            if fail_at < needed {
                let is_write_failed = matches!(result, Err(TransportError::WriteFailed { .. }));
                prop_assert!(is_write_failed);
                prop_assert_eq!(handle.write_count(), fail_at + 1);
            } else {
                prop_assert!(result.is_ok());
                prop_assert_eq!(handle.write_count(), needed);
            }
        }
    }
}
