//! irkit - Infrared remote signal decoding toolkit
//!
//! Takes raw mark/space pulse-duration captures from an infrared receiver
//! front end and reconstructs structured data frames. Currently implements
//! the rStep protocol used by ruwido remote controls, in both its 38 kHz
//! and 56 kHz timing variants.
//!
//! The capture front end (interrupt-driven sampling of the IR demodulator)
//! is external: this crate only consumes its output, a buffer of pulse
//! durations in fixed-size hardware ticks.

pub mod capture;
pub mod protocols;
pub mod storage;
