//! Message types, flags, return codes, and topic identifiers.

use crate::core::CodecError;

/// MQTT-SN message types (MQTT-SN v1.2 §5.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Gateway advertisement.
    Advertise = 0x00,
    /// Gateway search.
    SearchGw = 0x01,
    /// Gateway info.
    GwInfo = 0x02,
    /// Connection request.
    Connect = 0x04,
    /// Connection acknowledgement.
    ConnAck = 0x05,
    /// Will topic request.
    WillTopicReq = 0x06,
    /// Will topic.
    WillTopic = 0x07,
    /// Will message request.
    WillMsgReq = 0x08,
    /// Will message.
    WillMsg = 0x09,
    /// Topic registration.
    Register = 0x0A,
    /// Registration acknowledgement.
    RegAck = 0x0B,
    /// Publish.
    Publish = 0x0C,
    /// Publish acknowledgement (QoS 1).
    PubAck = 0x0D,
    /// Publish complete (QoS 2).
    PubComp = 0x0E,
    /// Publish received (QoS 2).
    PubRec = 0x0F,
    /// Publish release (QoS 2).
    PubRel = 0x10,
    /// Subscription request.
    Subscribe = 0x12,
    /// Subscription acknowledgement.
    SubAck = 0x13,
    /// Unsubscribe request.
    Unsubscribe = 0x14,
    /// Unsubscribe acknowledgement.
    UnsubAck = 0x15,
    /// Ping request.
    PingReq = 0x16,
    /// Ping response.
    PingResp = 0x17,
    /// Disconnect.
    Disconnect = 0x18,
    /// Will topic update.
    WillTopicUpd = 0x1A,
    /// Will topic update response.
    WillTopicResp = 0x1B,
    /// Will message update.
    WillMsgUpd = 0x1C,
    /// Will message update response.
    WillMsgResp = 0x1D,
    /// Forwarder encapsulation.
    Encapsulated = 0xFE,
}

impl PacketType {
    /// Parse a message type byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::Advertise,
            0x01 => Self::SearchGw,
            0x02 => Self::GwInfo,
            0x04 => Self::Connect,
            0x05 => Self::ConnAck,
            0x06 => Self::WillTopicReq,
            0x07 => Self::WillTopic,
            0x08 => Self::WillMsgReq,
            0x09 => Self::WillMsg,
            0x0A => Self::Register,
            0x0B => Self::RegAck,
            0x0C => Self::Publish,
            0x0D => Self::PubAck,
            0x0E => Self::PubComp,
            0x0F => Self::PubRec,
            0x10 => Self::PubRel,
            0x12 => Self::Subscribe,
            0x13 => Self::SubAck,
            0x14 => Self::Unsubscribe,
            0x15 => Self::UnsubAck,
            0x16 => Self::PingReq,
            0x17 => Self::PingResp,
            0x18 => Self::Disconnect,
            0x1A => Self::WillTopicUpd,
            0x1B => Self::WillTopicResp,
            0x1C => Self::WillMsgUpd,
            0x1D => Self::WillMsgResp,
            0xFE => Self::Encapsulated,
            _ => return None,
        })
    }

    /// Byte representation.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Quality of service carried in the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QoS {
    /// Fire and forget.
    #[default]
    AtMostOnce,
    /// Acknowledged delivery.
    AtLeastOnce,
    /// Assured delivery.
    ExactlyOnce,
    /// Publish without a connection (QoS -1).
    NoSession,
}

impl QoS {
    fn bits(self) -> u8 {
        match self {
            Self::AtMostOnce => 0b00,
            Self::AtLeastOnce => 0b01,
            Self::ExactlyOnce => 0b10,
            Self::NoSession => 0b11,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::AtMostOnce,
            0b01 => Self::AtLeastOnce,
            0b10 => Self::ExactlyOnce,
            _ => Self::NoSession,
        }
    }
}

/// The flags byte shared by CONNECT and PUBLISH.
///
/// ```text
/// bit  7     6-5    4       3     2        1-0
///     DUP   QoS   Retain   Will  Clean   TopicIdType
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    const DUP: u8 = 0x80;
    const QOS_SHIFT: u8 = 5;
    const RETAIN: u8 = 0x10;
    const WILL: u8 = 0x08;
    const CLEAN_SESSION: u8 = 0x04;
    const TOPIC_ID_TYPE: u8 = 0x03;

    /// Create flags from a raw byte.
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Raw byte value.
    pub fn as_byte(self) -> u8 {
        self.0
    }

    /// Duplicate delivery flag.
    pub fn dup(self) -> bool {
        self.0 & Self::DUP != 0
    }

    /// Quality of service.
    pub fn qos(self) -> QoS {
        QoS::from_bits(self.0 >> Self::QOS_SHIFT)
    }

    /// Retain flag.
    pub fn retain(self) -> bool {
        self.0 & Self::RETAIN != 0
    }

    /// Will flag.
    pub fn will(self) -> bool {
        self.0 & Self::WILL != 0
    }

    /// Clean session flag.
    pub fn clean_session(self) -> bool {
        self.0 & Self::CLEAN_SESSION != 0
    }

    /// Raw topic id type bits.
    pub fn topic_id_type(self) -> u8 {
        self.0 & Self::TOPIC_ID_TYPE
    }

    /// Set or clear DUP.
    pub fn with_dup(self, dup: bool) -> Self {
        self.set(Self::DUP, dup)
    }

    /// Set QoS.
    pub fn with_qos(self, qos: QoS) -> Self {
        Self((self.0 & !(0b11 << Self::QOS_SHIFT)) | (qos.bits() << Self::QOS_SHIFT))
    }

    /// Set or clear retain.
    pub fn with_retain(self, retain: bool) -> Self {
        self.set(Self::RETAIN, retain)
    }

    /// Set or clear clean session.
    pub fn with_clean_session(self, clean: bool) -> Self {
        self.set(Self::CLEAN_SESSION, clean)
    }

    /// Set the topic id type bits.
    pub fn with_topic_id_type(self, bits: u8) -> Self {
        Self((self.0 & !Self::TOPIC_ID_TYPE) | (bits & Self::TOPIC_ID_TYPE))
    }

    fn set(self, mask: u8, on: bool) -> Self {
        if on { Self(self.0 | mask) } else { Self(self.0 & !mask) }
    }
}

/// Return codes carried by CONNACK, REGACK, and PUBACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReturnCode {
    /// Accepted.
    Accepted = 0x00,
    /// Rejected: congestion.
    Congestion = 0x01,
    /// Rejected: invalid topic id.
    InvalidTopicId = 0x02,
    /// Rejected: not supported.
    NotSupported = 0x03,
}

impl ReturnCode {
    /// Whether the request was accepted.
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

impl TryFrom<u8> for ReturnCode {
    type Error = CodecError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(Self::Accepted),
            0x01 => Ok(Self::Congestion),
            0x02 => Ok(Self::InvalidTopicId),
            0x03 => Ok(Self::NotSupported),
            other => Err(CodecError::InvalidReturnCode(other)),
        }
    }
}

/// Topic reference used by PUBLISH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicId {
    /// Alias assigned by REGACK.
    Normal(u16),
    /// Alias agreed out of band with the gateway.
    Predefined(u16),
    /// Two-character topic name sent inline.
    Short([u8; 2]),
}

impl TopicId {
    const NORMAL: u8 = 0b00;
    const PREDEFINED: u8 = 0b01;
    const SHORT: u8 = 0b10;

    /// Topic id type bits for the flags byte.
    pub fn type_bits(self) -> u8 {
        match self {
            Self::Normal(_) => Self::NORMAL,
            Self::Predefined(_) => Self::PREDEFINED,
            Self::Short(_) => Self::SHORT,
        }
    }

    /// Two wire bytes.
    pub fn to_bytes(self) -> [u8; 2] {
        match self {
            Self::Normal(id) | Self::Predefined(id) => id.to_be_bytes(),
            Self::Short(name) => name,
        }
    }

    /// Rebuild from the flags' type bits and the two wire bytes.
    pub fn from_parts(type_bits: u8, bytes: [u8; 2]) -> Result<Self, CodecError> {
        match type_bits {
            Self::NORMAL => Ok(Self::Normal(u16::from_be_bytes(bytes))),
            Self::PREDEFINED => Ok(Self::Predefined(u16::from_be_bytes(bytes))),
            Self::SHORT => Ok(Self::Short(bytes)),
            other => Err(CodecError::InvalidFlags(other)),
        }
    }
}
