//! rStep protocol decoder
//!
//! rStep (*r*uwido *st*andard *e*ngineering *p*rotocol) is the default
//! protocol of ruwido's customizable remote controls. One frame is a
//! biphase (Manchester) signal: every data bit occupies two half-bit time
//! slots ("chips") and is carried by the direction of the transition
//! between them, not by the absolute level.
//!
//! Frame layout, after biphase reconstruction:
//! - 1 start bit (always sent first, consumed but not kept)
//! - 4-bit customer id
//! - 2-bit address (selectable keycode set within one customer)
//! - 2-bit frame type (keyboard / mouse / RC / error)
//! - 1-bit battery-okay flag
//! - variable-length big-endian payload
//!
//! The customer id, address, frame type and battery bit are packed into the
//! 9-bit `address` field of the decoded frame so a caller can tell frame
//! categories apart; see [RstepAddress].
//!
//! Remotes exist with two carrier clocks, 38 kHz and 56 kHz, which produce
//! different pulse-width tables on the same 50 µs tick granularity. Nothing
//! in the signal announces which clock was used, so the decoder runs a full
//! trial decode per clock table, 38 kHz first (the common one in the
//! field). Transmission is not implemented.

use super::{DecodeError, DecodedFrame, ProtocolDecoder};

/// Minimum recovered data bits for a valid frame: start bit plus the
/// 9 fixed header bits. The payload may be empty.
const MIN_DATA_BITS: usize = 10;

/// Chip accumulator bound. Captures expanding past this cannot be an rStep
/// frame within the accumulator's width and are rejected outright.
const MAX_CHIPS: usize = 64;

/// Inclusive tick windows classifying one pulse duration for one carrier
/// clock. The short and long windows never overlap.
#[derive(Debug, Clone, Copy)]
pub struct TimingWindows {
    pub short_min: u16,
    pub short_max: u16,
    pub long_min: u16,
    pub long_max: u16,
}

/// 38 kHz carrier on 50 µs ticks. Nominal short pulse 315 µs (burst
/// 200..460 µs, gap 160..430 µs), long pulse 630 µs (burst 520..780 µs,
/// gap 470..750 µs).
pub const TIMING_38K: TimingWindows = TimingWindows {
    short_min: 4,
    short_max: 10,
    long_min: 11,
    long_max: 16,
};

/// 56 kHz carrier on 50 µs ticks. Nominal short pulse 213 µs (burst
/// 140..320 µs, gap 100..290 µs), long pulse 426 µs (burst 350..540 µs,
/// gap 320..500 µs).
pub const TIMING_56K: TimingWindows = TimingWindows {
    short_min: 2,
    short_max: 6,
    long_min: 7,
    long_max: 11,
};

/// One classified pulse: a single chip time or two chip times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PulseWidth {
    Short,
    Long,
}

impl TimingWindows {
    /// Classify one raw duration against this clock's windows.
    fn classify(&self, ticks: u16) -> Option<PulseWidth> {
        if ticks >= self.short_min && ticks <= self.short_max {
            Some(PulseWidth::Short)
        } else if ticks >= self.long_min && ticks <= self.long_max {
            Some(PulseWidth::Long)
        } else {
            None
        }
    }
}

/// The 9-bit packed address field of a decoded rStep frame.
///
/// Bit layout, most significant first: customer id (4), address (2),
/// frame type (2), battery-okay (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RstepAddress(pub u16);

impl RstepAddress {
    /// Vendor-assigned customer id (4 bits)
    pub fn customer_id(self) -> u8 {
        ((self.0 >> 5) & 0x0F) as u8
    }

    /// Selected keycode set within the customer (2 bits)
    pub fn unit_address(self) -> u8 {
        ((self.0 >> 3) & 0x03) as u8
    }

    /// Frame category: keyboard, mouse, RC or error (2 bits, raw value)
    pub fn frame_type(self) -> u8 {
        ((self.0 >> 1) & 0x03) as u8
    }

    /// Battery-okay indicator (unused by known remotes, but transmitted)
    pub fn battery_ok(self) -> bool {
        (self.0 & 1) == 1
    }
}

impl From<&DecodedFrame> for RstepAddress {
    fn from(frame: &DecodedFrame) -> Self {
        Self(frame.address)
    }
}

/// One full trial decode of a capture under a single clock hypothesis.
/// Pure: on any failure every intermediate is discarded and the caller may
/// rerun with another timing table over the same untouched buffer.
fn decode_with(raw: &[u16], windows: &TimingWindows) -> Result<DecodedFrame, DecodeError> {
    // Part I: cut the short and long marks and spaces into chips, one per
    // unit of time. Slot 0 is the leading gap artifact and is skipped;
    // from there odd slots are marks (high chips), even slots spaces (low
    // chips). The accumulator starts zeroed, so space chips only advance
    // the count.
    let mut chips: u64 = 0;
    let mut chip_count: usize = 0;

    for (slot, &ticks) in raw.iter().enumerate().skip(1) {
        let width = windows
            .classify(ticks)
            .ok_or(DecodeError::UnclassifiableDuration { slot, ticks })?;
        let n = match width {
            PulseWidth::Short => 1,
            PulseWidth::Long => 2,
        };
        if chip_count + n > MAX_CHIPS {
            return Err(DecodeError::CaptureTooLong {
                chips: chip_count + n,
            });
        }
        if slot % 2 == 1 {
            for _ in 0..n {
                chips |= 1u64 << chip_count;
                chip_count += 1;
            }
        } else {
            chip_count += n;
        }
    }

    // Part II: a capture ending mid-mark is missing its final gap
    // measurement (the receiver never times the silence after the last
    // burst). Treat the unobserved space as one implicit low chip; the
    // accumulator already holds a zero there. Deliberate leniency, real
    // hardware produces such captures routinely.
    if chip_count % 2 == 1 {
        chip_count += 1;
    }

    tracing::trace!(
        chips = %format_chip_pairs(chips, chip_count),
        count = chip_count,
        "biphase chip stream"
    );

    // Part III: one data bit per chip pair, taken from the edge between
    // the two chips. Mark then space carries a 1, space then mark a 0; an
    // equal pair cannot come from a biphase transmitter and rejects the
    // capture under this clock hypothesis.
    let mut data: u64 = 0;
    let mut data_count: usize = 0;

    for chip in (0..chip_count).step_by(2) {
        let first = (chips >> chip) & 1;
        let second = (chips >> (chip + 1)) & 1;
        if first == second {
            return Err(DecodeError::AmbiguousBiphasePair { chip });
        }
        data = (data << 1) | first;
        data_count += 1;
    }

    if data_count < MIN_DATA_BITS {
        return Err(DecodeError::InsufficientBits { count: data_count });
    }

    tracing::trace!(
        bits = %format_frame_bits(data, data_count),
        count = data_count,
        "recovered data bits"
    );

    // The start bit is consumed but not kept; the 9 header bits pack
    // MSB-first into the address field and everything after the battery
    // flag is the big-endian payload.
    let payload_bits = data_count - MIN_DATA_BITS;
    let value = if payload_bits == 0 {
        0
    } else {
        data & ((1u64 << payload_bits) - 1)
    };
    let address = ((data >> payload_bits) & 0x1FF) as u16;

    Ok(DecodedFrame {
        address,
        value,
        bit_count: payload_bits,
    })
}

/// Chip stream rendered pairwise, chronological: "10 01 10 ..."
fn format_chip_pairs(chips: u64, count: usize) -> String {
    let mut out = String::with_capacity(count + count / 2);
    for i in 0..count {
        out.push(if (chips >> i) & 1 == 1 { '1' } else { '0' });
        if i % 2 == 1 && i + 1 < count {
            out.push(' ');
        }
    }
    out
}

/// Data bits rendered with field labels, chronological:
/// "sta:1 cust:1101 addr:01 type:10 bat:1 data:00011110"
fn format_frame_bits(data: u64, count: usize) -> String {
    let mut out = String::with_capacity(count + 32);
    for i in 0..count {
        match i {
            0 => out.push_str("sta:"),
            1 => out.push_str(" cust:"),
            5 => out.push_str(" addr:"),
            7 => out.push_str(" type:"),
            9 => out.push_str(" bat:"),
            10 => out.push_str(" data:"),
            _ => {}
        }
        let bit = (data >> (count - 1 - i)) & 1;
        out.push(if bit == 1 { '1' } else { '0' });
    }
    out
}

/// rStep protocol decoder
pub struct RstepDecoder;

impl RstepDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RstepDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolDecoder for RstepDecoder {
    fn name(&self) -> &'static str {
        "rStep"
    }

    fn carrier_frequencies(&self) -> &[u32] {
        &[38_000, 56_000]
    }

    fn decode(&self, raw: &[u16]) -> Result<DecodedFrame, DecodeError> {
        // 38 kHz is the common clock in the field, so try it first; fall
        // back to the 56 kHz table on any rejection. The returned error is
        // the 56 kHz one, the 38 kHz rejection only shows up in the trace.
        match decode_with(raw, &TIMING_38K) {
            Ok(frame) => Ok(frame),
            Err(err) => {
                tracing::trace!(%err, "38 kHz timing rejected, retrying with 56 kHz table");
                decode_with(raw, &TIMING_56K)
            }
        }
    }
}
