//! Packet encoding and decoding.
//!
//! Only the packets a publish-only client exchanges are modeled. Decoding
//! any other defined message type yields [`CodecError::UnsupportedType`].

use super::flags::{Flags, PacketType, QoS, ReturnCode, TopicId};
use super::header::{packet_length, split_packet, write_header};
use crate::core::CodecError;
use crate::core::constants::{MAX_CLIENT_ID_LEN, PROTOCOL_ID};

/// CONNECT (client → gateway).
///
/// Body: `Flags | ProtocolId | Duration(BE16) | ClientId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect {
    /// Flags (only clean session and will are meaningful).
    pub flags: Flags,
    /// Keep-alive duration in seconds.
    pub duration: u16,
    /// Client identifier, 1..=23 bytes.
    pub client_id: String,
}

/// CONNACK (gateway → client). Body: `ReturnCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnAck {
    /// Outcome of the connection request.
    pub return_code: ReturnCode,
}

/// REGISTER. Body: `TopicId(BE16) | MsgId(BE16) | TopicName`.
///
/// A client always sends topic id 0; the gateway assigns one in REGACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    /// Topic id (0 when sent by a client).
    pub topic_id: u16,
    /// Message id correlating REGISTER and REGACK.
    pub msg_id: u16,
    /// Full topic name.
    pub topic_name: String,
}

/// REGACK. Body: `TopicId(BE16) | MsgId(BE16) | ReturnCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegAck {
    /// Alias assigned to the topic.
    pub topic_id: u16,
    /// Message id of the REGISTER being acknowledged.
    pub msg_id: u16,
    /// Outcome of the registration.
    pub return_code: ReturnCode,
}

/// PUBLISH. Body: `Flags | TopicId(2) | MsgId(BE16) | Data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    /// Duplicate delivery.
    pub dup: bool,
    /// Quality of service.
    pub qos: QoS,
    /// Retain on the broker.
    pub retain: bool,
    /// Topic reference.
    pub topic: TopicId,
    /// Message id (0 for QoS 0).
    pub msg_id: u16,
    /// Application payload.
    pub data: Vec<u8>,
}

/// DISCONNECT. Body: optional `Duration(BE16)` for sleeping clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Disconnect {
    /// Sleep duration, if the client is going to sleep.
    pub duration: Option<u16>,
}

/// A decoded MQTT-SN packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// CONNECT.
    Connect(Connect),
    /// CONNACK.
    ConnAck(ConnAck),
    /// REGISTER.
    Register(Register),
    /// REGACK.
    RegAck(RegAck),
    /// PUBLISH.
    Publish(Publish),
    /// DISCONNECT.
    Disconnect(Disconnect),
}

impl Packet {
    /// Message type of this packet.
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::Connect(_) => PacketType::Connect,
            Self::ConnAck(_) => PacketType::ConnAck,
            Self::Register(_) => PacketType::Register,
            Self::RegAck(_) => PacketType::RegAck,
            Self::Publish(_) => PacketType::Publish,
            Self::Disconnect(_) => PacketType::Disconnect,
        }
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut body = Vec::new();
        match self {
            Self::Connect(p) => {
                validate_client_id(&p.client_id)?;
                body.push(p.flags.as_byte());
                body.push(PROTOCOL_ID);
                body.extend_from_slice(&p.duration.to_be_bytes());
                body.extend_from_slice(p.client_id.as_bytes());
            }
            Self::ConnAck(p) => body.push(p.return_code as u8),
            Self::Register(p) => {
                if p.topic_name.is_empty() {
                    return Err(CodecError::EmptyTopicName);
                }
                body.extend_from_slice(&p.topic_id.to_be_bytes());
                body.extend_from_slice(&p.msg_id.to_be_bytes());
                body.extend_from_slice(p.topic_name.as_bytes());
            }
            Self::RegAck(p) => {
                body.extend_from_slice(&p.topic_id.to_be_bytes());
                body.extend_from_slice(&p.msg_id.to_be_bytes());
                body.push(p.return_code as u8);
            }
            Self::Publish(p) => {
                let flags = Flags::NONE
                    .with_dup(p.dup)
                    .with_qos(p.qos)
                    .with_retain(p.retain)
                    .with_topic_id_type(p.topic.type_bits());
                body.push(flags.as_byte());
                body.extend_from_slice(&p.topic.to_bytes());
                body.extend_from_slice(&p.msg_id.to_be_bytes());
                body.extend_from_slice(&p.data);
            }
            Self::Disconnect(p) => {
                if let Some(duration) = p.duration {
                    body.extend_from_slice(&duration.to_be_bytes());
                }
            }
        }

        let mut buf = Vec::with_capacity(body.len() + 4);
        write_header(&mut buf, self.packet_type().as_byte(), body.len())?;
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Parse one complete packet.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let (type_byte, body) = split_packet(bytes)?;
        let packet_type =
            PacketType::from_byte(type_byte).ok_or(CodecError::UnknownType(type_byte))?;

        match packet_type {
            PacketType::Connect => {
                require(body, 5)?;
                let client_id = std::str::from_utf8(&body[4..])
                    .map_err(|_| CodecError::InvalidUtf8("client id"))?;
                validate_client_id(client_id)?;
                Ok(Self::Connect(Connect {
                    flags: Flags::from_byte(body[0]),
                    duration: u16::from_be_bytes([body[2], body[3]]),
                    client_id: client_id.to_string(),
                }))
            }
            PacketType::ConnAck => {
                require_exact(body, 1)?;
                Ok(Self::ConnAck(ConnAck {
                    return_code: ReturnCode::try_from(body[0])?,
                }))
            }
            PacketType::Register => {
                require(body, 5)?;
                let topic_name = std::str::from_utf8(&body[4..])
                    .map_err(|_| CodecError::InvalidUtf8("topic name"))?;
                Ok(Self::Register(Register {
                    topic_id: u16::from_be_bytes([body[0], body[1]]),
                    msg_id: u16::from_be_bytes([body[2], body[3]]),
                    topic_name: topic_name.to_string(),
                }))
            }
            PacketType::RegAck => {
                require_exact(body, 5)?;
                Ok(Self::RegAck(RegAck {
                    topic_id: u16::from_be_bytes([body[0], body[1]]),
                    msg_id: u16::from_be_bytes([body[2], body[3]]),
                    return_code: ReturnCode::try_from(body[4])?,
                }))
            }
            PacketType::Publish => {
                require(body, 5)?;
                let flags = Flags::from_byte(body[0]);
                Ok(Self::Publish(Publish {
                    dup: flags.dup(),
                    qos: flags.qos(),
                    retain: flags.retain(),
                    topic: TopicId::from_parts(flags.topic_id_type(), [body[1], body[2]])?,
                    msg_id: u16::from_be_bytes([body[3], body[4]]),
                    data: body[5..].to_vec(),
                }))
            }
            PacketType::Disconnect => match body.len() {
                0 => Ok(Self::Disconnect(Disconnect { duration: None })),
                2 => Ok(Self::Disconnect(Disconnect {
                    duration: Some(u16::from_be_bytes([body[0], body[1]])),
                })),
                n => Err(CodecError::LengthMismatch {
                    declared: 2,
                    actual: n,
                }),
            },
            other => Err(CodecError::UnsupportedType(other.as_byte())),
        }
    }
}

fn require(body: &[u8], min: usize) -> Result<(), CodecError> {
    if body.len() < min {
        return Err(CodecError::TooShort {
            expected: min,
            actual: body.len(),
        });
    }
    Ok(())
}

fn require_exact(body: &[u8], len: usize) -> Result<(), CodecError> {
    require(body, len)?;
    if body.len() != len {
        return Err(CodecError::LengthMismatch {
            declared: len,
            actual: body.len(),
        });
    }
    Ok(())
}

fn validate_client_id(client_id: &str) -> Result<(), CodecError> {
    let len = client_id.len();
    if len == 0 || len > MAX_CLIENT_ID_LEN {
        return Err(CodecError::InvalidClientId(len));
    }
    Ok(())
}

// =============================================================================
// FUNCTION CONTRACT
// =============================================================================

/// Encode a CONNECT carrying `client_id`.
pub fn encode_connect(
    client_id: &str,
    keep_alive: u16,
    clean_session: bool,
) -> Result<Vec<u8>, CodecError> {
    Packet::Connect(Connect {
        flags: Flags::NONE.with_clean_session(clean_session),
        duration: keep_alive,
        client_id: client_id.to_string(),
    })
    .encode()
}

/// Encode a client REGISTER for `topic_name`.
pub fn encode_register(topic_name: &str, packet_id: u16) -> Result<Vec<u8>, CodecError> {
    Packet::Register(Register {
        topic_id: 0,
        msg_id: packet_id,
        topic_name: topic_name.to_string(),
    })
    .encode()
}

/// Encode a PUBLISH.
pub fn encode_publish(
    topic: TopicId,
    packet_id: u16,
    qos: QoS,
    dup: bool,
    retain: bool,
    payload: &[u8],
) -> Result<Vec<u8>, CodecError> {
    Packet::Publish(Publish {
        dup,
        qos,
        retain,
        topic,
        msg_id: packet_id,
        data: payload.to_vec(),
    })
    .encode()
}

/// Encoded size of a PUBLISH carrying `payload_len` bytes.
///
/// Flags, topic id and message id precede the payload.
pub fn publish_len(payload_len: usize) -> usize {
    packet_length(5 + payload_len)
}

/// Decode a CONNACK and return its return code.
pub fn decode_connack(bytes: &[u8]) -> Result<ReturnCode, CodecError> {
    match Packet::decode(bytes)? {
        Packet::ConnAck(ack) => Ok(ack.return_code),
        other => Err(CodecError::UnsupportedType(other.packet_type().as_byte())),
    }
}

/// Decode a REGACK into `(topic alias, packet id, return code)`.
pub fn decode_regack(bytes: &[u8]) -> Result<(u16, u16, ReturnCode), CodecError> {
    match Packet::decode(bytes)? {
        Packet::RegAck(ack) => Ok((ack.topic_id, ack.msg_id, ack.return_code)),
        other => Err(CodecError::UnsupportedType(other.packet_type().as_byte())),
    }
}
