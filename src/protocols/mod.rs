//! Protocol decoders for infrared remotes.
//!
//! Each decoder takes one complete capture buffer of pulse durations and
//! either produces a [DecodedFrame] or rejects the capture with a
//! [DecodeError]. Decoders are stateless between captures; the
//! [ProtocolRegistry] tries them in order against the same buffer and
//! returns the first match, the way a receive loop dispatches one captured
//! signal to several candidate protocols.
//!
//! Rejection is the routine outcome here, not an exceptional one: most
//! captures handed to any single decoder belong to some other protocol, so
//! every rejection path must be cheap and must leave no state behind.

mod rstep;

pub use rstep::{RstepAddress, RstepDecoder, TimingWindows, TIMING_38K, TIMING_56K};

use thiserror::Error;

/// Width of one hardware tick in microseconds, as produced by the capture
/// front end.
pub const TICK_US: u32 = 50;

/// Why a decoder rejected a capture.
///
/// All variants are recoverable from the caller's point of view: the
/// registry simply moves on to the next decoder (and the rStep driver
/// retries with its alternate clock table before giving up).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A pulse duration fits neither the short nor the long window of the
    /// current clock hypothesis.
    #[error("pulse of {ticks} ticks at slot {slot} fits neither pulse window")]
    UnclassifiableDuration { slot: usize, ticks: u16 },
    /// Both chips of a biphase pair carry the same level, which a valid
    /// biphase signal never produces.
    #[error("equal chips in the biphase pair starting at chip {chip}")]
    AmbiguousBiphasePair { chip: usize },
    /// Fewer data bits were recovered than the fixed frame header needs.
    #[error("only {count} data bits recovered, a frame carries at least 10")]
    InsufficientBits { count: usize },
    /// The capture expands to more chips than the accumulator holds.
    #[error("capture expands to {chips} chips, more than the 64 supported")]
    CaptureTooLong { chips: usize },
}

/// A successfully decoded frame.
///
/// `address` is the protocol's packed addressing field (for rStep: customer
/// id, address, frame type and battery flag, see [RstepAddress]); `value`
/// holds the payload bits big-endian with `bit_count` recording how many of
/// them are valid. A zero-width payload (`bit_count == 0`) is a legal
/// decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub address: u16,
    pub value: u64,
    pub bit_count: usize,
}

/// Trait for protocol decoders.
///
/// `raw` follows the capture front end's convention: durations in
/// [TICK_US] ticks, slot 0 is the leading gap artifact preceding the frame
/// (skipped, never validated), odd slots are marks and even slots are
/// spaces. The buffer is untrusted and read-only; implementations must not
/// retain any reference to it.
pub trait ProtocolDecoder: Send + Sync {
    /// Get the protocol name
    fn name(&self) -> &'static str;

    /// Carrier frequencies this protocol is transmitted on, in Hz
    fn carrier_frequencies(&self) -> &[u32];

    /// Decode one raw capture into a frame, or explain the rejection
    fn decode(&self, raw: &[u16]) -> Result<DecodedFrame, DecodeError>;
}

/// Registry of all supported protocols
pub struct ProtocolRegistry {
    decoders: Vec<Box<dyn ProtocolDecoder>>,
}

impl ProtocolRegistry {
    /// Create a new protocol registry with all built-in protocols
    pub fn new() -> Self {
        let decoders: Vec<Box<dyn ProtocolDecoder>> = vec![Box::new(RstepDecoder::new())];
        Self { decoders }
    }

    /// Try every decoder in order against one capture buffer.
    /// Returns the protocol name and frame of the first match.
    pub fn try_decode(&self, raw: &[u16]) -> Option<(String, DecodedFrame)> {
        for decoder in &self.decoders {
            match decoder.decode(raw) {
                Ok(frame) => {
                    tracing::debug!(
                        protocol = decoder.name(),
                        address = %format_args!("0x{:03X}", frame.address),
                        value = %format_args!("0x{:X}", frame.value),
                        bits = frame.bit_count,
                        "capture decoded"
                    );
                    return Some((decoder.name().to_string(), frame));
                }
                Err(err) => {
                    tracing::debug!(protocol = decoder.name(), %err, "decoder rejected capture");
                }
            }
        }
        None
    }

    /// Get a decoder by name
    pub fn get(&self, name: &str) -> Option<&dyn ProtocolDecoder> {
        self.decoders
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .map(|d| d.as_ref())
    }

    /// List all protocol names
    pub fn list_protocols(&self) -> Vec<&'static str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_rstep() {
        let registry = ProtocolRegistry::new();
        assert_eq!(registry.list_protocols(), vec!["rStep"]);
        assert!(registry.get("rstep").is_some());
        assert!(registry.get("NEC").is_none());
    }

    #[test]
    fn registry_rejects_noise() {
        let registry = ProtocolRegistry::new();
        // Durations outside every pulse window of every supported clock.
        let raw = [60u16, 40, 40, 40, 40];
        assert!(registry.try_decode(&raw).is_none());
    }
}
