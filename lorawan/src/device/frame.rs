//! Application uplink frame
//!
//! The application payload is a fixed test pattern; real applications replace
//! the contents before the controller sends it.

use heapless::Vec;

/// Application data buffer size
pub const APP_DATA_MAX_SIZE: usize = 16;

/// Payload sent on every uplink
const TX_PATTERN: [u8; 4] = [0x00, 0x01, 0x02, 0x03];

const _: () = assert!(TX_PATTERN.len() <= APP_DATA_MAX_SIZE);

/// Outgoing application frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppFrame {
    /// Application port
    port: u8,
    /// Payload
    data: Vec<u8, APP_DATA_MAX_SIZE>,
}

impl AppFrame {
    /// Create an empty frame for `port`
    pub fn new(port: u8) -> Self {
        Self {
            port,
            data: Vec::new(),
        }
    }

    /// Fill the payload for the next uplink
    pub fn prepare(&mut self) {
        self.data.clear();
        self.data.extend(TX_PATTERN);
    }

    /// Application port
    pub fn port(&self) -> u8 {
        self.port
    }

    /// Payload bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Payload length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` before the first `prepare`
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
