//! Publishing with transparent reconnect.

use thiserror::Error;
use tracing::{debug, warn};

use super::session::{Session, SessionError};
use crate::codec::{QoS, TopicId, encode_publish, publish_len};
use crate::core::CodecError;
use crate::transport::{Link, TransportError};

/// Errors from [`Session::publish`].
#[derive(Debug, Error)]
pub enum PublishError {
    /// No session and the single connect attempt failed.
    #[error("not connected: {0}")]
    NotConnected(#[source] SessionError),

    /// The encoded PUBLISH would exceed the configured packet bound.
    #[error("payload too large: packet would be {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Encoded packet size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The PUBLISH did not reach the link; the session was reset.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding failed.
    #[error("encode error: {0}")]
    Encode(#[from] CodecError),
}

impl<L: Link> Session<L> {
    /// Publish `payload` at QoS 0 on the session's topic.
    ///
    /// When the session is not ready, makes exactly one connect attempt
    /// first. Delivery is fire-and-forget: success means the packet was
    /// handed to the link in full.
    pub async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        let size = publish_len(payload.len());
        let max = self.config().max_packet_size;
        if size > max {
            return Err(PublishError::PayloadTooLarge { size, max });
        }

        let alias = match self.topic_alias().await {
            Some(alias) => alias,
            None => {
                debug!("session not ready, connecting before publish");
                self.connect().await.map_err(PublishError::NotConnected)?;
                self.topic_alias()
                    .await
                    .ok_or(PublishError::NotConnected(SessionError::NotReady))?
            }
        };

        let packet = encode_publish(
            TopicId::Normal(alias),
            0,
            QoS::AtMostOnce,
            false,
            false,
            payload,
        )?;

        if let Err(e) = self.send(&packet).await {
            warn!(error = %e, alias, link_lost = e.is_link_lost(), "publish failed, resetting session");
            self.reset().await;
            return Err(PublishError::Transport(e));
        }

        debug!(alias, len = payload.len(), "published");
        self.indicator.on_publish();
        Ok(())
    }
}
