//! Offset arithmetic for the 8-for-7 packed program layout.
//!
//! A program travels as one continuously packed block: every eighth byte
//! carries the high bits of the seven bytes that follow it, so the wire
//! stream only ever holds 7-bit values. The first 18 bytes form the common
//! header and are addressed directly. The rest of the program is split into
//! sections, each addressed by a logical offset that maps to a packed
//! position through
//!
//! ```text
//! packed = base + logical + ceil((logical + k) / 7)
//! ```
//!
//! where `base` and `k` are fixed per section.

use std::fmt;

/// Size of the directly mapped common header.
pub const COMMON_SIZE: usize = 18;

/// Size of one packed program.
pub const PROGRAM_SIZE: usize = 496;

/// First carrier that follows the common header.
pub const FIRST_CARRIER: usize = 24;

/// Semantic sections of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// Name, voice mode and other global settings.
    Common,
    /// Synth engine of timbre 1.
    Timbre1,
    /// Synth engine of timbre 2.
    Timbre2,
    /// Vocoder header and the 16 band pan/level pairs.
    VocoderBands,
    /// Master effects, vocoder filter and ribbon assignment.
    Gap,
    /// Arpeggiator, scale and ribbon settings.
    Arpeggiator,
}

/// Placement constants of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    /// Packed position that precedes logical byte 0.
    pub base: usize,
    /// Alignment constant of the section.
    pub k: usize,
    /// Number of logical bytes.
    pub len: usize,
}

impl Section {
    /// Every section in packed order.
    pub const ALL: [Section; 6] = [
        Section::Common,
        Section::Timbre1,
        Section::Timbre2,
        Section::VocoderBands,
        Section::Gap,
        Section::Arpeggiator,
    ];

    /// Calibrated placement of the section.
    pub const fn layout(self) -> SectionLayout {
        match self {
            Section::Common => SectionLayout {
                base: 0,
                k: 0,
                len: COMMON_SIZE,
            },
            Section::Timbre1 => SectionLayout {
                base: 18,
                k: 3,
                len: 96,
            },
            Section::Timbre2 => SectionLayout {
                base: 128,
                k: 1,
                len: 96,
            },
            Section::VocoderBands => SectionLayout {
                base: 237,
                k: 6,
                len: 40,
            },
            Section::Gap => SectionLayout {
                base: 283,
                k: 4,
                len: 88,
            },
            Section::Arpeggiator => SectionLayout {
                base: 384,
                k: 1,
                len: 24,
            },
        }
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Section::Common => "common",
            Section::Timbre1 => "timbre1",
            Section::Timbre2 => "timbre2",
            Section::VocoderBands => "vocoder_bands",
            Section::Gap => "gap",
            Section::Arpeggiator => "arp",
        }
    }

    /// Packed position of `logical` without a bounds check.
    ///
    /// Used to build constant tables; prefer [`Section::packed`] for input
    /// that is not known to be in range.
    pub const fn offset_of(self, logical: usize) -> usize {
        match self {
            Section::Common => logical,
            _ => {
                let layout = self.layout();
                pack_offset(logical, layout.base, layout.k)
            }
        }
    }

    /// Packed position of `logical`, or `None` past the end of the section.
    pub fn packed(self, logical: usize) -> Option<usize> {
        (logical < self.layout().len).then(|| self.offset_of(logical))
    }

    /// Logical offset stored at `packed`, if that position belongs to this section.
    pub fn logical(self, packed: usize) -> Option<usize> {
        let layout = self.layout();
        if self == Section::Common {
            return (packed < COMMON_SIZE).then_some(packed);
        }
        if packed <= layout.base {
            return None;
        }

        // packed - base + k == m + ceil(m / 7) with m = logical + k
        let t = packed - layout.base + layout.k;
        let (group, pos) = (t / 8, t % 8);
        let m = match pos {
            0 => group * 7,
            1 => return None,
            _ => group * 7 + pos - 1,
        };
        let logical = m.checked_sub(layout.k)?;

        (logical < layout.len && self.offset_of(logical) == packed).then_some(logical)
    }

    /// First and last packed positions holding data of this section.
    pub fn packed_bounds(self) -> (usize, usize) {
        let len = self.layout().len;
        (self.offset_of(0), self.offset_of(len - 1))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `base + logical + ceil((logical + k) / 7)`
pub const fn pack_offset(logical: usize, base: usize, k: usize) -> usize {
    base + logical + (logical + k + 6) / 7
}

/// Whether `packed` holds scattered high bits rather than section data.
///
/// The common header is mapped 1:1 and has no carriers.
pub const fn is_carrier_byte(packed: usize) -> bool {
    packed >= COMMON_SIZE && packed % 8 == 0
}

/// Carrier position and bit that hold bit 7 of the data byte at `packed`.
///
/// Only data positions past the common header's own group have a carrier.
pub fn carrier_of(packed: usize) -> Option<(usize, u8)> {
    let carrier = packed / 8 * 8;
    if carrier < FIRST_CARRIER || packed == carrier {
        return None;
    }
    Some((carrier, (packed - carrier - 1) as u8))
}

/// Section and logical offset of a packed position.
pub fn packed_to_section(packed: usize) -> Option<(Section, usize)> {
    Section::ALL
        .iter()
        .find_map(|&section| section.logical(packed).map(|logical| (section, logical)))
}

/// Position of a packed data byte in the unpacked stream, `None` for carriers.
///
/// The unpacked stream is the global inverse of the 8-for-7 packing and is
/// also the byte order used by program files.
pub const fn to_unpacked(packed: usize) -> Option<usize> {
    if packed % 8 == 0 {
        return None;
    }
    Some((packed / 8) * 7 + packed % 8 - 1)
}

/// Packed position of an unpacked stream byte.
pub const fn to_packed(unpacked: usize) -> usize {
    (unpacked / 7) * 8 + unpacked % 7 + 1
}

/// Moves bit 7 of every data byte into its carrier and clears it in place.
///
/// Returns the number of data bytes that carried a high bit. Bytes of the
/// first group (before [`FIRST_CARRIER`]) are left untouched since their
/// carrier position belongs to the common header.
pub fn fold_high_bits(packed: &mut [u8]) -> usize {
    let mut folded = 0;
    for carrier in (FIRST_CARRIER..packed.len()).step_by(8) {
        for bit in 0..7 {
            let pos = carrier + 1 + bit;
            if pos >= packed.len() {
                break;
            }
            if packed[pos] & 0x80 != 0 {
                packed[pos] &= 0x7F;
                packed[carrier] |= 1 << bit;
                folded += 1;
            }
        }
    }
    folded
}

/// Clears bit 7 of the bytes before [`FIRST_CARRIER`], which have no carrier
/// to hold it. Returns the number of bytes changed.
pub fn mask_uncarried_high_bits(packed: &mut [u8]) -> usize {
    let end = packed.len().min(FIRST_CARRIER);
    let mut masked = 0;
    for byte in &mut packed[..end] {
        if *byte & 0x80 != 0 {
            *byte &= 0x7F;
            masked += 1;
        }
    }
    masked
}

/// Restores bit 7 of every data byte from its carrier and zeroes the carrier.
pub fn unfold_high_bits(packed: &mut [u8]) {
    for carrier in (FIRST_CARRIER..packed.len()).step_by(8) {
        let bits = packed[carrier];
        for bit in 0..7 {
            let pos = carrier + 1 + bit;
            if pos < packed.len() && (bits >> bit) & 1 == 1 {
                packed[pos] |= 0x80;
            }
        }
        packed[carrier] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_do_not_collide() {
        let mut owner = vec![None; PROGRAM_SIZE];
        for section in Section::ALL {
            for logical in 0..section.layout().len {
                let packed = section.offset_of(logical);
                assert!(packed < PROGRAM_SIZE);
                assert!(
                    !is_carrier_byte(packed),
                    "{} L{} lands on carrier {}",
                    section,
                    logical,
                    packed
                );
                assert_eq!(
                    owner[packed], None,
                    "{} L{} collides at {}",
                    section, logical, packed
                );
                owner[packed] = Some((section, logical));
            }
        }
    }

    #[test]
    fn test_logical_inverts_packed() {
        for section in Section::ALL {
            for logical in 0..section.layout().len {
                let packed = section.packed(logical).unwrap();
                assert_eq!(section.logical(packed), Some(logical));
                assert_eq!(packed_to_section(packed), Some((section, logical)));
            }
        }
    }

    #[test]
    fn test_sections_follow_global_packing() {
        for section in Section::ALL.into_iter().skip(1) {
            for logical in 0..section.layout().len {
                let packed = section.offset_of(logical);
                let unpacked = to_unpacked(packed).unwrap();
                assert_eq!(to_packed(unpacked), packed);
            }
        }
    }

    #[test]
    fn test_known_offsets() {
        assert_eq!(Section::Timbre1.offset_of(74), 103);
        assert_eq!(Section::Timbre1.offset_of(91), 123);
        assert_eq!(Section::Timbre2.offset_of(91), 233);
        assert_eq!(Section::VocoderBands.offset_of(8), 247);
        assert_eq!(Section::VocoderBands.offset_of(39), 283);
        assert_eq!(Section::Gap.offset_of(0), 284);
        assert_eq!(Section::Gap.offset_of(40), 330);
        assert_eq!(Section::Arpeggiator.offset_of(2), 387);
        assert_eq!(Section::Arpeggiator.offset_of(23), 411);
    }

    #[test]
    fn test_carriers() {
        assert!(!is_carrier_byte(0));
        assert!(!is_carrier_byte(8));
        assert!(!is_carrier_byte(16));
        assert!(is_carrier_byte(24));
        assert!(is_carrier_byte(384));
        assert!(!is_carrier_byte(385));

        assert_eq!(carrier_of(385), Some((384, 0)));
        assert_eq!(carrier_of(391), Some((384, 6)));
        assert_eq!(carrier_of(384), None);
        assert_eq!(carrier_of(19), None);
    }

    #[test]
    fn test_positions_outside_sections() {
        assert_eq!(packed_to_section(18), None);
        assert_eq!(packed_to_section(128), None);
        assert_eq!(packed_to_section(450), None);
    }

    #[test]
    fn test_fold_and_unfold_high_bits() {
        let mut data = vec![0u8; 40];
        data[25] = 0x81;
        data[31] = 0xFF;
        data[33] = 0x80;

        let original = data.clone();
        assert_eq!(fold_high_bits(&mut data), 3);
        assert!(data.iter().all(|&b| b <= 0x7F));
        assert_eq!(data[24], 0b100_0001);
        assert_eq!(data[32], 0b000_0001);

        unfold_high_bits(&mut data);
        assert_eq!(data, original);

        let mut head = vec![0u8; 40];
        head[3] = 0x90;
        head[22] = 0x85;
        head[25] = 0x81;
        assert_eq!(mask_uncarried_high_bits(&mut head), 2);
        assert_eq!(&head[..24], {
            let mut expected = [0u8; 24];
            expected[3] = 0x10;
            expected[22] = 0x05;
            expected
        });
        assert_eq!(head[25], 0x81);
    }
}
