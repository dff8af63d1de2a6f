//! MQTT-SN client.
//!
//! - [`Session`]: the CONNECT/REGISTER state machine and topic alias
//! - [`Session::publish`]: QoS 0 publish that connects on demand
//! - [`EventAdapter`]: link and user-action callbacks, periodic publishing
//! - [`SessionConfig`]: timing, chunking and topic settings

mod config;
mod events;
mod publish;
mod session;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use events::{AccelerometerSample, EventAdapter, FixedPayload, LinkEvent, PayloadBuilder};
pub use publish::PublishError;
pub use session::{Rejection, Session, SessionError, SessionPhase, TopicBinding};
