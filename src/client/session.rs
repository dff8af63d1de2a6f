//! Session lifecycle.
//!
//! A [`Session`] drives one CONNECT → CONNACK → REGISTER → REGACK sequence at
//! a time and records the topic alias the gateway hands back. It never
//! retries on its own: every failure leaves the session `Disconnected`, and
//! the next caller decides whether to try again.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use crate::codec::{Packet, PacketType, ReturnCode, encode_connect, encode_register};
use crate::core::constants::FIRST_PACKET_ID;
use crate::core::{CodecError, ConfigError, DeviceIdentity, Indicator, NoopIndicator};
use crate::transport::{ChunkedTransport, Link, TransportError};

/// Why the gateway's answer did not complete a handshake step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Acknowledgement carried a non-zero return code.
    #[error("return code {0:?}")]
    ReturnCode(ReturnCode),

    /// A different packet arrived.
    #[error("unexpected {0:?} packet")]
    UnexpectedPacket(PacketType),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(CodecError),

    /// REGACK acknowledged some other REGISTER.
    #[error("packet id mismatch: expected {expected}, got {actual}")]
    PacketIdMismatch {
        /// Id sent in REGISTER.
        expected: u16,
        /// Id carried by REGACK.
        actual: u16,
    },
}

/// Errors from the session state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Another connect attempt holds the in-progress guard.
    #[error("connection attempt already in progress")]
    AlreadyConnecting,

    /// CONNACK was refused or not understood.
    #[error("connect rejected: {0}")]
    ConnectRejected(Rejection),

    /// REGACK was refused or not understood.
    #[error("register rejected: {0}")]
    RegisterRejected(Rejection),

    /// The link failed to carry a request or a response.
    #[error("transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    /// The phase changed underneath the attempt (usually a link loss).
    #[error("invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Phase found.
        from: SessionPhase,
        /// Phase requested.
        to: SessionPhase,
    },

    /// The session lost its topic alias before it could be used.
    #[error("session is not ready")]
    NotReady,

    /// An outbound packet could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] CodecError),
}

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No session.
    Disconnected,
    /// CONNECT being sent.
    Connecting,
    /// Waiting for CONNACK.
    AwaitingConnAck,
    /// REGISTER being sent.
    Registering,
    /// Waiting for REGACK.
    AwaitingRegAck,
    /// Topic registered, publishing allowed.
    Ready,
}

impl SessionPhase {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// The handshake only moves forward one step at a time; any phase may
    /// drop back to `Disconnected`.
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        match self {
            Disconnected => matches!(next, Disconnected | Connecting),
            Connecting => matches!(next, Disconnected | AwaitingConnAck),
            AwaitingConnAck => matches!(next, Disconnected | Registering),
            Registering => matches!(next, Disconnected | AwaitingRegAck),
            AwaitingRegAck => matches!(next, Disconnected | Ready),
            Ready => matches!(next, Disconnected),
        }
    }

    /// Whether a handshake is between CONNECT and REGACK.
    pub fn is_handshaking(self) -> bool {
        matches!(
            self,
            SessionPhase::Connecting
                | SessionPhase::AwaitingConnAck
                | SessionPhase::Registering
                | SessionPhase::AwaitingRegAck
        )
    }
}

/// The session's single topic and the alias assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicBinding {
    name: String,
    alias: Option<u16>,
}

impl TopicBinding {
    /// Full topic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias from REGACK, if registration completed.
    pub fn alias(&self) -> Option<u16> {
        self.alias
    }
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    client_id: Option<String>,
    topic: Option<TopicBinding>,
    next_packet_id: u16,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Disconnected,
            client_id: None,
            topic: None,
            next_packet_id: FIRST_PACKET_ID,
        }
    }

    fn transition(&mut self, next: SessionPhase) -> Result<(), SessionError> {
        if !self.phase.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        debug!(from = ?self.phase, to = ?next, "session phase");
        self.phase = next;
        Ok(())
    }

    /// Start a fresh session for a new connect attempt.
    fn begin(&mut self, client_id: String, topic_name: String) -> Result<(), SessionError> {
        self.reset();
        self.client_id = Some(client_id);
        self.topic = Some(TopicBinding {
            name: topic_name,
            alias: None,
        });
        self.next_packet_id = FIRST_PACKET_ID;
        self.transition(SessionPhase::Connecting)
    }

    fn complete(&mut self, alias: u16) -> Result<(), SessionError> {
        self.transition(SessionPhase::Ready)?;
        match self.topic.as_mut() {
            Some(topic) => {
                topic.alias = Some(alias);
                Ok(())
            }
            None => {
                self.phase = SessionPhase::Disconnected;
                Err(SessionError::NotReady)
            }
        }
    }

    fn reset(&mut self) {
        self.phase = SessionPhase::Disconnected;
        if let Some(topic) = self.topic.as_mut() {
            topic.alias = None;
        }
    }

    fn next_packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = id.checked_add(1).unwrap_or(FIRST_PACKET_ID);
        id
    }

    fn topic_alias(&self) -> Option<u16> {
        match self.phase {
            SessionPhase::Ready => self.topic.as_ref().and_then(TopicBinding::alias),
            _ => None,
        }
    }
}

/// Holds the in-progress flag for the lifetime of one connect attempt.
///
/// Dropping the guard (including dropping the connect future) clears it.
struct ConnectGuard<'a>(&'a AtomicBool);

impl<'a> ConnectGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// An MQTT-SN client session over a chunked link.
///
/// All methods take `&self`, so one session can be shared by the callbacks
/// that drive it (by reference or inside an `Arc`).
///
/// # Example
///
/// ```ignore
/// use mqttsn_link::client::{Session, SessionConfig};
/// use mqttsn_link::transport::StreamLink;
///
/// let session = Session::new(StreamLink::new(uart), "zavog", SessionConfig::default())?;
/// let alias = session.connect().await?;
/// session.publish(b"A").await?;
/// ```
pub struct Session<L> {
    config: SessionConfig,
    transport: Mutex<ChunkedTransport<L>>,
    state: RwLock<SessionState>,
    connecting: AtomicBool,
    identity: Box<dyn DeviceIdentity>,
    pub(super) indicator: Box<dyn Indicator>,
}

impl<L: Link> Session<L> {
    /// Create a disconnected session.
    pub fn new(
        link: L,
        identity: impl DeviceIdentity + 'static,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = ChunkedTransport::new(link)
            .with_chunk_size(config.chunk_size)
            .with_max_frame_size(config.max_packet_size);

        Ok(Self {
            config,
            transport: Mutex::new(transport),
            state: RwLock::new(SessionState::new()),
            connecting: AtomicBool::new(false),
            identity: Box::new(identity),
            indicator: Box::new(NoopIndicator),
        })
    }

    /// Route status notifications to `indicator`.
    pub fn with_indicator(mut self, indicator: impl Indicator + 'static) -> Self {
        self.indicator = Box::new(indicator);
        self
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current phase.
    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    /// True iff the phase is `Ready` and a topic alias is held.
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.topic_alias().is_some()
    }

    /// Topic alias, only while ready.
    pub async fn topic_alias(&self) -> Option<u16> {
        self.state.read().await.topic_alias()
    }

    /// Topic binding of the current or most recent session.
    pub async fn topic(&self) -> Option<TopicBinding> {
        self.state.read().await.topic.clone()
    }

    /// Client identifier captured by the most recent connect attempt.
    pub async fn client_id(&self) -> Option<String> {
        self.state.read().await.client_id.clone()
    }

    /// Whether a connect attempt holds the in-progress guard.
    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::Acquire)
    }

    /// Run one CONNECT/REGISTER handshake and return the topic alias.
    ///
    /// Fails immediately with [`SessionError::AlreadyConnecting`] if another
    /// attempt is underway. Any failure leaves the session `Disconnected`.
    pub async fn connect(&self) -> Result<u16, SessionError> {
        let Some(guard) = ConnectGuard::acquire(&self.connecting) else {
            debug!("connect refused, attempt already in progress");
            return Err(SessionError::AlreadyConnecting);
        };

        let result = self.handshake().await;
        if result.is_err() {
            self.state.write().await.reset();
            // A late or half-read response must not be taken as the answer
            // to the next attempt.
            if let Err(e) = self.transport.lock().await.discard_pending().await {
                debug!(error = %e, "could not drain link after failed attempt");
            }
        }
        drop(guard);

        match result {
            Ok(alias) => {
                info!(alias, "session ready");
                self.indicator.on_connected();
                Ok(alias)
            }
            Err(e) => {
                warn!(error = %e, "connect attempt failed");
                Err(e)
            }
        }
    }

    /// Reset to `Disconnected` and drop the topic alias.
    ///
    /// Safe to call at any time, including while a connect attempt is
    /// waiting; that attempt fails at its next phase change.
    pub async fn disconnect(&self) {
        let from = {
            let mut state = self.state.write().await;
            let from = state.phase;
            state.reset();
            from
        };
        debug!(from = ?from, "session disconnected");
        self.indicator.on_disconnected();
    }

    /// Reset after a failure without notifying the indicator.
    pub(super) async fn reset(&self) {
        self.state.write().await.reset();
    }

    /// Hand one encoded packet to the transport.
    pub(super) async fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.transport.lock().await.send(bytes).await
    }

    async fn handshake(&self) -> Result<u16, SessionError> {
        let client_id = self.identity.client_id();
        let topic_name = self.config.topic_name(&client_id);
        self.state
            .write()
            .await
            .begin(client_id.clone(), topic_name.clone())?;

        self.transport.lock().await.discard_pending().await?;

        debug!(client_id = %client_id, "sending CONNECT");
        let connect = encode_connect(
            &client_id,
            self.config.keep_alive_secs(),
            self.config.clean_session,
        )?;
        self.send(&connect).await?;
        self.transition(SessionPhase::AwaitingConnAck).await?;

        let ack = match self.await_response().await? {
            Ok(Packet::ConnAck(ack)) => ack,
            Ok(other) => {
                return Err(SessionError::ConnectRejected(Rejection::UnexpectedPacket(
                    other.packet_type(),
                )));
            }
            Err(rejection) => return Err(SessionError::ConnectRejected(rejection)),
        };
        if !ack.return_code.is_accepted() {
            return Err(SessionError::ConnectRejected(Rejection::ReturnCode(
                ack.return_code,
            )));
        }

        self.transition(SessionPhase::Registering).await?;
        let packet_id = self.state.write().await.next_packet_id();
        debug!(topic = %topic_name, packet_id, "sending REGISTER");
        let register = encode_register(&topic_name, packet_id)?;
        self.send(&register).await?;
        self.transition(SessionPhase::AwaitingRegAck).await?;

        let ack = match self.await_response().await? {
            Ok(Packet::RegAck(ack)) => ack,
            Ok(other) => {
                return Err(SessionError::RegisterRejected(Rejection::UnexpectedPacket(
                    other.packet_type(),
                )));
            }
            Err(rejection) => return Err(SessionError::RegisterRejected(rejection)),
        };
        if ack.msg_id != packet_id {
            return Err(SessionError::RegisterRejected(Rejection::PacketIdMismatch {
                expected: packet_id,
                actual: ack.msg_id,
            }));
        }
        if !ack.return_code.is_accepted() {
            return Err(SessionError::RegisterRejected(Rejection::ReturnCode(
                ack.return_code,
            )));
        }

        self.state.write().await.complete(ack.topic_id)?;
        Ok(ack.topic_id)
    }

    async fn transition(&self, next: SessionPhase) -> Result<(), SessionError> {
        self.state.write().await.transition(next)
    }

    /// Wait the settle interval, then read one frame within the response
    /// timeout.
    async fn await_frame(&self) -> Result<Vec<u8>, TransportError> {
        tokio::time::sleep(self.config.settle_interval).await;
        let mut transport = self.transport.lock().await;
        tokio::time::timeout(self.config.response_timeout, transport.read_frame())
            .await
            .map_err(|_| TransportError::Timeout)?
    }

    /// Read and decode one response. A bad length header is a malformed
    /// response like any other decode failure; link failures stay
    /// transport errors.
    async fn await_response(&self) -> Result<Result<Packet, Rejection>, TransportError> {
        match self.await_frame().await {
            Ok(frame) => Ok(classify(frame)),
            Err(TransportError::Frame(e)) => Ok(Err(Rejection::Malformed(e))),
            Err(e) => Err(e),
        }
    }
}

/// Decode a response frame, folding codec failures into a [`Rejection`].
fn classify(frame: Vec<u8>) -> Result<Packet, Rejection> {
    Packet::decode(&frame).map_err(|e| match e {
        CodecError::UnsupportedType(byte) => match PacketType::from_byte(byte) {
            Some(packet_type) => Rejection::UnexpectedPacket(packet_type),
            None => Rejection::Malformed(e),
        },
        other => Rejection::Malformed(other),
    })
}

impl<L> fmt::Debug for Session<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("connecting", &self.connecting.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
