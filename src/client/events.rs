//! Event adapter.
//!
//! Maps link lifecycle and user actions onto session operations. The
//! adapter only borrows the session; hosts wire their own callbacks (BLE
//! stack, buttons, timers) to these methods.

use std::time::Duration;

use serde_json::json;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::publish::PublishError;
use super::session::{Session, SessionError};
use crate::transport::Link;

/// Host events the adapter reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link came up.
    Connected,
    /// The link went down.
    Disconnected,
    /// The user asked to publish this payload.
    UserAction(Vec<u8>),
}

/// Produces a payload each time a publish is triggered.
pub trait PayloadBuilder: Send {
    /// Build the next payload.
    fn build(&mut self) -> Vec<u8>;
}

impl<F> PayloadBuilder for F
where
    F: FnMut() -> Vec<u8> + Send,
{
    fn build(&mut self) -> Vec<u8> {
        self()
    }
}

/// A constant text payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPayload(pub &'static str);

impl PayloadBuilder for FixedPayload {
    fn build(&mut self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

/// One accelerometer reading, published as `{"x":..,"y":..,"z":..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccelerometerSample {
    /// X axis (milli-g).
    pub x: i32,
    /// Y axis (milli-g).
    pub y: i32,
    /// Z axis (milli-g).
    pub z: i32,
}

impl AccelerometerSample {
    /// Create a sample.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Compact JSON encoding.
    pub fn to_json(&self) -> String {
        json!({ "x": self.x, "y": self.y, "z": self.z }).to_string()
    }
}

impl PayloadBuilder for AccelerometerSample {
    fn build(&mut self) -> Vec<u8> {
        self.to_json().into_bytes()
    }
}

/// Borrowed view that routes events to a [`Session`].
#[derive(Debug)]
pub struct EventAdapter<'s, L> {
    session: &'s Session<L>,
}

impl<'s, L: Link> EventAdapter<'s, L> {
    /// Create an adapter over `session`.
    pub fn new(session: &'s Session<L>) -> Self {
        Self { session }
    }

    /// The wrapped session.
    pub fn session(&self) -> &'s Session<L> {
        self.session
    }

    /// Link is up: run one connect attempt.
    pub async fn on_link_connected(&self) -> Result<u16, SessionError> {
        info!("link connected");
        self.session.connect().await
    }

    /// Link is down: drop the session.
    pub async fn on_link_disconnected(&self) {
        info!("link disconnected");
        self.session.disconnect().await;
    }

    /// Build a payload and publish it.
    pub async fn on_user_action(
        &self,
        builder: &mut impl PayloadBuilder,
    ) -> Result<(), PublishError> {
        let payload = builder.build();
        self.session.publish(&payload).await
    }

    /// Route one event. Failures are logged and dropped.
    pub async fn dispatch(&self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => {
                if let Err(e) = self.on_link_connected().await {
                    warn!(error = %e, "connect on link up failed");
                }
            }
            LinkEvent::Disconnected => self.on_link_disconnected().await,
            LinkEvent::UserAction(payload) => {
                if let Err(e) = self.session.publish(&payload).await {
                    warn!(error = %e, "user action publish failed");
                }
            }
        }
    }

    /// Publish a freshly built payload every `period` until `shutdown`
    /// fires or its sender is dropped.
    ///
    /// Each tick goes through [`Session::publish`], so a lost session is
    /// re-established on the next tick. Returns the number of successful
    /// publishes.
    pub async fn run_periodic(
        &self,
        period: Duration,
        mut builder: impl PayloadBuilder,
        mut shutdown: oneshot::Receiver<()>,
    ) -> usize {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut published = 0;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!(published, "periodic publish stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.session.publish(&builder.build()).await {
                        Ok(()) => published += 1,
                        Err(e) => warn!(error = %e, "periodic publish failed, retrying next tick"),
                    }
                }
            }
        }
        published
    }
}
