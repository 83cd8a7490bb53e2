//! Capture data structures for received infrared signals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocols::{DecodedFrame, TICK_US};

/// Status of a captured signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureStatus {
    /// Signal captured but no protocol matched
    Unknown,
    /// Signal decoded with a known protocol
    Decoded,
}

impl std::fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureStatus::Unknown => write!(f, "Unknown"),
            CaptureStatus::Decoded => write!(f, "Decoded"),
        }
    }
}

/// One captured infrared signal: the raw tick buffer plus the decode
/// outcome, if any. This is the owned, serializable record; decoders only
/// ever see a borrowed view of `raw_ticks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    /// Unique identifier within one session or file
    pub id: u32,
    /// When the signal was captured
    pub timestamp: DateTime<Utc>,
    /// Carrier frequency in Hz, when the receiver hardware reports it.
    /// rStep decoding does not need it: both clock tables are tried.
    #[serde(default)]
    pub carrier_hz: Option<u32>,
    /// Width of one hardware tick in µs
    #[serde(default = "default_tick_us")]
    pub tick_us: u32,
    /// Raw pulse durations in ticks. Slot 0 is the leading gap artifact;
    /// odd slots are marks, even slots are spaces.
    pub raw_ticks: Vec<u16>,
    /// Protocol name if identified
    pub protocol: Option<String>,
    /// Packed protocol address field (for rStep: customer id, address,
    /// frame type, battery flag)
    pub address: u16,
    /// Payload value, big-endian
    pub value: u64,
    /// Number of valid payload bits
    pub bit_count: usize,
    /// Current status
    pub status: CaptureStatus,
}

fn default_tick_us() -> u32 {
    TICK_US
}

impl Capture {
    /// Create a new, undecoded capture from a raw tick buffer.
    pub fn from_ticks(id: u32, raw_ticks: Vec<u16>) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            carrier_hz: None,
            tick_us: TICK_US,
            raw_ticks,
            protocol: None,
            address: 0,
            value: 0,
            bit_count: 0,
            status: CaptureStatus::Unknown,
        }
    }

    /// Record a successful decode on this capture.
    pub fn apply_decode(&mut self, protocol: &str, frame: &DecodedFrame) {
        self.protocol = Some(protocol.to_string());
        self.address = frame.address;
        self.value = frame.value;
        self.bit_count = frame.bit_count;
        self.status = CaptureStatus::Decoded;
    }

    /// Get the protocol name or "Unknown"
    pub fn protocol_name(&self) -> &str {
        self.protocol.as_deref().unwrap_or("Unknown")
    }

    /// Get the address as a hex string
    pub fn address_hex(&self) -> String {
        if self.protocol.is_some() {
            format!("0x{:03X}", self.address)
        } else {
            "-".to_string()
        }
    }

    /// Get the payload as a hex string, sized to its bit count
    pub fn value_hex(&self) -> String {
        if self.protocol.is_none() {
            return "-".to_string();
        }
        let nibbles = (self.bit_count + 3) / 4;
        format!("0x{:0width$X}", self.value, width = nibbles.max(1))
    }

    /// Get payload bit count description
    pub fn bits_str(&self) -> String {
        if self.protocol.is_some() {
            format!("{} bits", self.bit_count)
        } else {
            "-".to_string()
        }
    }

    /// Get the timestamp formatted for display
    pub fn timestamp_short(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Total signal duration in µs (leading gap slot excluded)
    pub fn duration_us(&self) -> u32 {
        self.raw_ticks
            .iter()
            .skip(1)
            .map(|&t| t as u32 * self.tick_us)
            .sum()
    }

    /// Number of mark/space pulses in the raw buffer (leading gap excluded)
    pub fn pulse_count(&self) -> usize {
        self.raw_ticks.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_capture_is_unknown() {
        let capture = Capture::from_ticks(1, vec![55, 7, 13, 7]);
        assert_eq!(capture.status, CaptureStatus::Unknown);
        assert_eq!(capture.protocol_name(), "Unknown");
        assert_eq!(capture.address_hex(), "-");
        assert_eq!(capture.value_hex(), "-");
        assert_eq!(capture.pulse_count(), 3);
        assert_eq!(capture.duration_us(), (7 + 13 + 7) * 50);
    }

    #[test]
    fn apply_decode_fills_fields() {
        let mut capture = Capture::from_ticks(1, vec![55, 7, 13]);
        let frame = DecodedFrame {
            address: 0x1AD,
            value: 0x1E,
            bit_count: 8,
        };
        capture.apply_decode("rStep", &frame);
        assert_eq!(capture.status, CaptureStatus::Decoded);
        assert_eq!(capture.address_hex(), "0x1AD");
        assert_eq!(capture.value_hex(), "0x1E");
        assert_eq!(capture.bits_str(), "8 bits");
    }

    #[test]
    fn zero_width_payload_formats_as_single_digit() {
        let mut capture = Capture::from_ticks(1, vec![55]);
        capture.apply_decode(
            "rStep",
            &DecodedFrame {
                address: 0x0A5,
                value: 0,
                bit_count: 0,
            },
        );
        assert_eq!(capture.value_hex(), "0x0");
        assert_eq!(capture.bits_str(), "0 bits");
    }

    #[test]
    fn capture_survives_json_round_trip() {
        let mut capture = Capture::from_ticks(7, vec![55, 7, 13, 7, 7]);
        capture.carrier_hz = Some(38_000);
        capture.apply_decode(
            "rStep",
            &DecodedFrame {
                address: 0x1AD,
                value: 0x1E,
                bit_count: 8,
            },
        );
        let json = serde_json::to_string(&capture).unwrap();
        let back: Capture = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, 7);
        assert_eq!(back.raw_ticks, capture.raw_ticks);
        assert_eq!(back.address, 0x1AD);
        assert_eq!(back.status, CaptureStatus::Decoded);
    }
}
