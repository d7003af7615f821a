//! Channel-voice messages and the transport seam.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::program::{ParamDef, RealtimeAddr};

/// Number of program slots on the RK-100S 2.
pub const PROGRAM_SLOTS: u16 = 200;

/// Bank select MSB controller.
pub const CC_BANK_SELECT_MSB: u8 = 0;
/// Bank select LSB controller.
pub const CC_BANK_SELECT_LSB: u8 = 32;
/// Data entry MSB controller.
pub const CC_DATA_ENTRY: u8 = 6;
/// NRPN parameter number LSB controller.
pub const CC_NRPN_LSB: u8 = 98;
/// NRPN parameter number MSB controller.
pub const CC_NRPN_MSB: u8 = 99;

const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;

fn status(kind: u8, channel: u8) -> Result<u8> {
    if !(1..=16).contains(&channel) {
        return Err(Error::Validation(format!(
            "MIDI channel must be 1-16 (got {})",
            channel
        )));
    }
    Ok(kind | (channel - 1))
}

fn data_byte(what: &str, value: u8) -> Result<u8> {
    if value > 0x7F {
        return Err(Error::Validation(format!(
            "{} must be 0-127 (got {})",
            what, value
        )));
    }
    Ok(value)
}

/// `Bn cc value`
pub fn build_control_change(channel: u8, controller: u8, value: u8) -> Result<Vec<u8>> {
    Ok(vec![
        status(CONTROL_CHANGE, channel)?,
        data_byte("Controller", controller)?,
        data_byte("Controller value", value)?,
    ])
}

/// `Cn program`
pub fn build_program_change(channel: u8, program: u8) -> Result<Vec<u8>> {
    Ok(vec![
        status(PROGRAM_CHANGE, channel)?,
        data_byte("Program", program)?,
    ])
}

/// Bank select pair followed by a program change for one of the 200 slots.
pub fn build_slot_select(channel: u8, slot: u16) -> Result<Vec<u8>> {
    if slot >= PROGRAM_SLOTS {
        return Err(Error::Validation(format!(
            "Program slot must be 0-{} (got {})",
            PROGRAM_SLOTS - 1,
            slot
        )));
    }
    let bank_lsb = (slot / 128) as u8;
    let program = (slot % 128) as u8;

    let mut msg = build_control_change(channel, CC_BANK_SELECT_MSB, 0)?;
    msg.extend(build_control_change(channel, CC_BANK_SELECT_LSB, bank_lsb)?);
    msg.extend(build_program_change(channel, program)?);
    Ok(msg)
}

/// CC#99, CC#98 and CC#6 addressing one NRPN.
pub fn build_nrpn(channel: u8, msb: u8, lsb: u8, value: u8) -> Result<Vec<u8>> {
    let mut msg = build_control_change(channel, CC_NRPN_MSB, msb)?;
    msg.extend(build_control_change(channel, CC_NRPN_LSB, lsb)?);
    msg.extend(build_control_change(channel, CC_DATA_ENTRY, value)?);
    Ok(msg)
}

/// Real-time message for a parameter value.
///
/// The value is clamped into the descriptor's range, then into 0-127.
pub fn build_param_message(def: &ParamDef, channel: u8, value: i32) -> Result<Vec<u8>> {
    let addr = def.realtime.ok_or_else(|| {
        Error::Config(format!("Parameter '{}' has no real-time address", def.name))
    })?;
    let value = def.clamp(value).clamp(0, 0x7F) as u8;

    match addr {
        RealtimeAddr::Nrpn { msb, lsb } => build_nrpn(channel, msb, lsb, value),
        RealtimeAddr::Cc(number) => build_control_change(channel, number, value),
    }
}

/// Destination for outgoing MIDI bytes.
pub trait MidiOutput: Send {
    /// Sends one or more complete messages.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// In-memory output that keeps every send.
///
/// Clones share the same log, so a test can keep one handle and give the
/// other to an editor.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingOutput {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of everything sent so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    /// Number of sends so far.
    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    /// Whether nothing was sent.
    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }

    /// Drops the recorded sends.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl MidiOutput for RecordingOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        log::trace!("MIDI: recorded {} bytes", bytes.len());
        self.sent.lock().push(bytes.to_vec());
        Ok(())
    }
}
