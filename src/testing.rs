//! Test doubles for links and indicators.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::Indicator;
use crate::transport::Link;

#[derive(Debug, Default)]
struct LinkState {
    writes: Vec<Vec<u8>>,
    inbound: VecDeque<u8>,
    /// Bytes that become readable once the device next writes.
    replies: VecDeque<u8>,
}

/// Scripted link: records every write call and serves queued inbound bytes.
///
/// Replies queued with [`LinkHandle::push_reply`] are held back until the
/// device writes, the way a gateway only answers after a request. An empty
/// inbound queue reads as a closed link.
#[derive(Debug, Default)]
pub(crate) struct ScriptedLink {
    state: Arc<Mutex<LinkState>>,
    /// Accept at most this many bytes per write call.
    write_limit: Option<usize>,
    /// Zero-based write call that returns `Ok(0)`.
    fail_at: Option<usize>,
    /// Return at most this many bytes per read call.
    read_limit: Option<usize>,
}

/// Test-side view of a [`ScriptedLink`].
#[derive(Debug, Clone)]
pub(crate) struct LinkHandle {
    state: Arc<Mutex<LinkState>>,
}

impl ScriptedLink {
    pub(crate) fn new() -> (Self, LinkHandle) {
        let link = Self::default();
        let handle = LinkHandle {
            state: Arc::clone(&link.state),
        };
        (link, handle)
    }

    pub(crate) fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    pub(crate) fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub(crate) fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit);
        self
    }
}

impl Link for ScriptedLink {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let call = state.writes.len();
        if self.fail_at == Some(call) {
            state.writes.push(Vec::new());
            return Ok(0);
        }
        let n = self.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        state.writes.push(buf[..n].to_vec());
        let replies = std::mem::take(&mut state.replies);
        state.inbound.extend(replies);
        Ok(n)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let max = self.read_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        let mut n = 0;
        while n < max {
            match state.inbound.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl LinkHandle {
    /// Queue bytes for the device to read.
    pub(crate) fn push_inbound(&self, bytes: &[u8]) {
        self.state.lock().unwrap().inbound.extend(bytes);
    }

    /// Queue bytes that become readable after the device's next write.
    pub(crate) fn push_reply(&self, bytes: &[u8]) {
        self.state.lock().unwrap().replies.extend(bytes);
    }

    /// Every write call, in order, with the bytes it accepted.
    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().writes.clone()
    }

    /// All accepted bytes concatenated.
    pub(crate) fn written(&self) -> Vec<u8> {
        self.writes().concat()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes.len()
    }

    pub(crate) fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }
}

/// Indicator that counts notifications.
#[derive(Debug, Default, Clone)]
pub(crate) struct CountingIndicator {
    pub(crate) connected: Arc<AtomicUsize>,
    pub(crate) disconnected: Arc<AtomicUsize>,
    pub(crate) published: Arc<AtomicUsize>,
}

impl CountingIndicator {
    pub(crate) fn connected(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnected(&self) -> usize {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub(crate) fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }
}

impl Indicator for CountingIndicator {
    fn on_connected(&self) {
        self.connected.fetch_add(1, Ordering::SeqCst);
    }

    fn on_disconnected(&self) {
        self.disconnected.fetch_add(1, Ordering::SeqCst);
    }

    fn on_publish(&self) {
        self.published.fetch_add(1, Ordering::SeqCst);
    }
}
