//! One program's packed bytes with parameter-aware access.

use super::catalog::{ParamDef, WireLayout};
use crate::error::{Error, Result};

/// Packed program bytes plus a write-coalescing dirty flag.
///
/// The buffer does no locking of its own. Writers are expected to be
/// serialized by whoever owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramBuffer {
    data: Vec<u8>,
    dirty: bool,
}

impl ProgramBuffer {
    /// An unloaded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean buffer holding `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            dirty: false,
        }
    }

    /// Replaces the whole content and clears the dirty flag.
    pub fn load(&mut self, data: &[u8]) {
        self.data = data.to_vec();
        self.dirty = false;
    }

    /// Snapshot of the current content.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Current content.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no program has been loaded.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a byte changed since the last load or [`mark_clean`](Self::mark_clean).
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Raw byte at `offset`.
    pub fn get_byte(&self, offset: usize) -> Result<u8> {
        self.data.get(offset).copied().ok_or(Error::Index {
            offset,
            len: self.data.len(),
        })
    }

    /// Stores the low 7 bits of `value` at `offset`.
    pub fn set_byte(&mut self, offset: usize, value: u8) -> Result<()> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(offset)
            .ok_or(Error::Index { offset, len })?;

        let value = value & 0x7F;
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
        Ok(())
    }

    /// Byte at `offset` read as -64..=63 with 128-wraparound.
    pub fn get_signed(&self, offset: usize) -> Result<i32> {
        Ok(decode_signed(self.get_byte(offset)?))
    }

    /// Stores -64..=63 with 128-wraparound.
    pub fn set_signed(&mut self, offset: usize, value: i32) -> Result<()> {
        self.set_byte(offset, encode_signed(value))
    }

    /// Reads a parameter through its wire address.
    ///
    /// Returns `None` when the descriptor has no wire address, nothing is
    /// loaded, or the offset lies past the end of the buffer.
    pub fn get_param(&self, def: &ParamDef) -> Option<i32> {
        let wire = def.wire?;
        let byte = *self.data.get(wire.offset)?;

        let raw = match wire.layout {
            WireLayout::Bit(bit) => return Some(if (byte >> bit) & 1 == 1 { 127 } else { 0 }),
            WireLayout::Field { mask, shift } => i32::from((byte & mask) >> shift),
            WireLayout::Byte { signed: true } => decode_signed(byte),
            WireLayout::Byte { signed: false } => i32::from(byte),
        };

        let value = def.remap.map_or(raw, |map| map.to_realtime(raw));
        Some(value + def.bias.unwrap_or(0))
    }

    /// Writes a parameter through its wire address.
    ///
    /// Field layouts read the byte first and only replace the masked bits.
    pub fn set_param(&mut self, def: &ParamDef, value: i32) -> Result<()> {
        let wire = def.wire.ok_or_else(|| {
            Error::Config(format!("Parameter '{}' has no wire address", def.name))
        })?;
        if self.data.is_empty() {
            return Err(Error::Config(
                "Buffer is empty, load program data first".to_string(),
            ));
        }
        let current = self.get_byte(wire.offset)?;

        if let WireLayout::Bit(bit) = wire.layout {
            let mask = 1 << bit;
            let next = if value >= 64 {
                current | mask
            } else {
                current & !mask
            };
            return self.set_byte(wire.offset, next);
        }

        let value = value - def.bias.unwrap_or(0);
        let code = def.remap.map_or(value, |map| map.to_wire(value));

        match wire.layout {
            WireLayout::Field { mask, shift } => {
                let bits = ((code.clamp(0, 0x7F) as u8) << shift) & mask;
                self.set_byte(wire.offset, (current & !mask) | bits)
            }
            WireLayout::Byte { signed: true } => self.set_signed(wire.offset, code),
            _ => self.set_byte(wire.offset, code.clamp(0, 0x7F) as u8),
        }
    }
}

fn decode_signed(raw: u8) -> i32 {
    let raw = i32::from(raw);
    if raw < 64 {
        raw
    } else {
        raw - 128
    }
}

fn encode_signed(value: i32) -> u8 {
    let value = if value < 0 { value + 128 } else { value };
    value.clamp(0, 0x7F) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> ProgramBuffer {
        ProgramBuffer::from_bytes(&[0u8; 64])
    }

    #[test]
    fn test_signed_round_trip() {
        let mut buffer = loaded();
        for v in -64..=63 {
            buffer.set_signed(10, v).unwrap();
            assert_eq!(buffer.get_signed(10).unwrap(), v);
        }
        buffer.set_signed(10, -1).unwrap();
        assert_eq!(buffer.get_byte(10).unwrap(), 127);
    }

    #[test]
    fn test_set_byte_masks_and_tracks_changes() {
        let mut buffer = loaded();
        buffer.set_byte(5, 0).unwrap();
        assert!(!buffer.dirty());

        buffer.set_byte(5, 0xC1).unwrap();
        assert_eq!(buffer.get_byte(5).unwrap(), 0x41);
        assert!(buffer.dirty());

        buffer.mark_clean();
        buffer.set_byte(5, 0x41).unwrap();
        assert!(!buffer.dirty());

        buffer.mark_clean();
        assert!(!buffer.dirty());
    }

    #[test]
    fn test_out_of_range_access() {
        let mut buffer = loaded();
        assert!(matches!(
            buffer.get_byte(64),
            Err(Error::Index { offset: 64, len: 64 })
        ));
        assert!(buffer.set_byte(100, 1).is_err());

        let def = ParamDef::new("far", "test", 0, 127).at(200, WireLayout::BYTE);
        assert_eq!(buffer.get_param(&def), None);
        assert!(matches!(
            buffer.set_param(&def, 1),
            Err(Error::Index { .. })
        ));
    }

    #[test]
    fn test_unaddressed_and_unloaded() {
        let realtime_only = ParamDef::new("rt", "test", 0, 127).cc(7);
        let mut buffer = loaded();
        assert_eq!(buffer.get_param(&realtime_only), None);
        assert!(matches!(
            buffer.set_param(&realtime_only, 3),
            Err(Error::Config(_))
        ));

        let def = ParamDef::new("b", "test", 0, 127).at(3, WireLayout::BYTE);
        let mut empty = ProgramBuffer::new();
        assert_eq!(empty.get_param(&def), None);
        assert!(matches!(empty.set_param(&def, 3), Err(Error::Config(_))));
    }

    #[test]
    fn test_bit_layout_uses_realtime_scale() {
        let mut buffer = loaded();
        let def = ParamDef::new("sw", "test", 0, 127).at(8, WireLayout::Bit(5));

        buffer.set_param(&def, 64).unwrap();
        assert_eq!(buffer.get_byte(8).unwrap(), 0x20);
        assert_eq!(buffer.get_param(&def), Some(127));

        buffer.set_param(&def, 63).unwrap();
        assert_eq!(buffer.get_param(&def), Some(0));
    }

    #[test]
    fn test_field_write_preserves_siblings() {
        let mut buffer = loaded();
        let low = ParamDef::new("low", "test", 0, 7).at(
            20,
            WireLayout::Field {
                mask: 0x07,
                shift: 0,
            },
        );
        let high = ParamDef::new("high", "test", 0, 3).at(
            20,
            WireLayout::Field {
                mask: 0x30,
                shift: 4,
            },
        );

        for b in 0..=3 {
            for a in 0..=7 {
                buffer.set_param(&high, b).unwrap();
                buffer.set_param(&low, a).unwrap();
                assert_eq!(buffer.get_param(&low), Some(a));
                assert_eq!(buffer.get_param(&high), Some(b));
            }
        }
    }

    #[test]
    fn test_remap_with_bias() {
        let mut buffer = loaded();
        let def = ParamDef::new("mapped", "test", -64, 42)
            .at(30, WireLayout::BYTE)
            .remap(&[(0, 0), (1, 22), (2, 43), (3, 64), (4, 85), (5, 106)])
            .bias(-64);

        for v in [-64, -42, -21, 0, 21, 42] {
            buffer.set_param(&def, v).unwrap();
            assert_eq!(buffer.get_param(&def), Some(v));
        }
        buffer.set_param(&def, 0).unwrap();
        assert_eq!(buffer.get_byte(30).unwrap(), 3);
    }

    #[test]
    fn test_bias_centres_signed_range() {
        let mut buffer = loaded();
        let def = ParamDef::new("centred", "test", -64, 63)
            .at(12, WireLayout::BYTE)
            .bias(-64);
        buffer.set_param(&def, -10).unwrap();
        assert_eq!(buffer.get_byte(12).unwrap(), 54);
        assert_eq!(buffer.get_param(&def), Some(-10));
    }

    #[test]
    fn test_load_replaces_and_cleans() {
        let mut buffer = loaded();
        buffer.set_byte(0, 9).unwrap();
        buffer.load(&[1, 2, 3]);
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.dirty());
        assert_eq!(buffer.to_bytes(), vec![1, 2, 3]);
    }
}
