//! Collaborator traits.
//!
//! These traits are the seams between the protocol core and the device it
//! runs on: where the client identifier comes from, and where status
//! notifications go.

/// Source of the MQTT-SN client identifier.
///
/// Called once per connect attempt. Implementations usually return a
/// device-derived name (a board's friendly name, a MAC suffix, ...).
///
/// # Example
///
/// ```
/// use mqttsn_link::core::DeviceIdentity;
///
/// struct Board;
///
/// impl DeviceIdentity for Board {
///     fn client_id(&self) -> String {
///         "zavog".to_string()
///     }
/// }
///
/// assert_eq!(Board.client_id(), "zavog");
/// ```
pub trait DeviceIdentity: Send + Sync {
    /// Current client identifier.
    fn client_id(&self) -> String;
}

impl DeviceIdentity for String {
    fn client_id(&self) -> String {
        self.clone()
    }
}

impl DeviceIdentity for &'static str {
    fn client_id(&self) -> String {
        (*self).to_string()
    }
}

/// Fire-and-forget status sink (display, LED, buzzer).
///
/// All methods default to no-ops and must not block.
pub trait Indicator: Send + Sync {
    /// Session reached the ready phase.
    fn on_connected(&self) {}

    /// Session was reset.
    fn on_disconnected(&self) {}

    /// A PUBLISH was handed to the link.
    fn on_publish(&self) {}
}

/// Indicator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndicator;

impl Indicator for NoopIndicator {}
