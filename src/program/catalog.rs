//! Parameter descriptors and the catalog that indexes them.

use std::collections::HashMap;

use super::bitpack::{self, Section, FIRST_CARRIER, PROGRAM_SIZE};
use super::params;

/// Display labels keyed by representative value.
pub type Labels = &'static [(i32, &'static str)];

/// Real-time channel-voice address of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeAddr {
    /// CC#99/CC#98 selector pair followed by CC#6 data entry.
    Nrpn {
        /// Parameter number MSB.
        msb: u8,
        /// Parameter number LSB.
        lsb: u8,
    },
    /// A single control change.
    Cc(u8),
}

/// How a parameter occupies its byte in the packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireLayout {
    /// The whole byte, optionally with the synth's 128-wraparound signed encoding.
    Byte {
        /// Interpret values 64..=127 as -64..=-1.
        signed: bool,
    },
    /// A single on/off bit, seen as 0/127 by callers.
    Bit(u8),
    /// A multi-bit field.
    Field {
        /// Bits occupied within the byte.
        mask: u8,
        /// Right shift applied after masking.
        shift: u8,
    },
}

impl WireLayout {
    /// Plain whole byte.
    pub const BYTE: WireLayout = WireLayout::Byte { signed: false };

    /// Signed whole byte.
    pub const SIGNED: WireLayout = WireLayout::Byte { signed: true };

    /// Bits of the byte this layout reads or writes.
    pub fn mask(self) -> u8 {
        match self {
            WireLayout::Byte { .. } => 0x7F,
            WireLayout::Bit(bit) => 1 << bit,
            WireLayout::Field { mask, .. } => mask,
        }
    }
}

/// Location of a parameter in the packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireAddr {
    /// Packed offset.
    pub offset: usize,
    /// Bit layout within the byte.
    pub layout: WireLayout,
}

/// Whether an address has been verified against the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Checked against NRPN scans or program diffs.
    Confirmed,
    /// Derived from editor tables or extrapolated.
    Provisional,
}

/// Injective mapping between wire codes and real-time values.
///
/// Entries are `(wire, realtime)` pairs sorted by real-time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueMap(pub &'static [(i32, i32)]);

impl ValueMap {
    /// Real-time value of a wire code. Unknown codes pass through.
    pub fn to_realtime(&self, wire: i32) -> i32 {
        self.0
            .iter()
            .find(|(w, _)| *w == wire)
            .map_or(wire, |&(_, realtime)| realtime)
    }

    /// Wire code for a real-time value.
    ///
    /// Values between entries select the entry at or below them, matching
    /// how the real-time protocol spreads an enumeration over 0-127.
    pub fn to_wire(&self, realtime: i32) -> i32 {
        let mut code = match self.0.first() {
            Some(&(wire, _)) => wire,
            None => return realtime,
        };
        for &(wire, value) in self.0 {
            if value <= realtime {
                code = wire;
            }
        }
        code
    }

    /// Real-time values in table order.
    pub fn realtime_values(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().map(|&(_, value)| value)
    }
}

/// Descriptor of one controllable program value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    /// Unique identifier.
    pub name: String,
    /// Human readable description.
    pub description: &'static str,
    /// Inclusive lower bound.
    pub min: i32,
    /// Inclusive upper bound.
    pub max: i32,
    /// Real-time address, if the device accepts live changes.
    pub realtime: Option<RealtimeAddr>,
    /// Position in the packed buffer, if known.
    pub wire: Option<WireAddr>,
    /// Translation between wire codes and real-time values.
    pub remap: Option<ValueMap>,
    /// Added on read, subtracted on write.
    pub bias: Option<i32>,
    /// Presentation labels.
    pub labels: Labels,
    /// Logical UI group.
    pub group: &'static str,
    /// Timbre this parameter belongs to.
    pub timbre: Option<u8>,
    /// Verification status of the addresses.
    pub confidence: Confidence,
}

impl ParamDef {
    /// A provisional descriptor with no address.
    pub fn new(name: impl Into<String>, group: &'static str, min: i32, max: i32) -> Self {
        Self {
            name: name.into(),
            description: "",
            min,
            max,
            realtime: None,
            wire: None,
            remap: None,
            bias: None,
            labels: &[],
            group,
            timbre: None,
            confidence: Confidence::Provisional,
        }
    }

    /// Sets the description.
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Adds an NRPN address.
    pub fn nrpn(mut self, msb: u8, lsb: u8) -> Self {
        self.realtime = Some(RealtimeAddr::Nrpn { msb, lsb });
        self
    }

    /// Adds a control change address.
    pub fn cc(mut self, number: u8) -> Self {
        self.realtime = Some(RealtimeAddr::Cc(number));
        self
    }

    /// Places the parameter at a packed offset.
    pub fn at(mut self, offset: usize, layout: WireLayout) -> Self {
        self.wire = Some(WireAddr { offset, layout });
        self
    }

    /// Places the parameter at a logical offset of a section.
    pub fn in_section(self, section: Section, logical: usize, layout: WireLayout) -> Self {
        self.at(section.offset_of(logical), layout)
    }

    /// Sets the wire/real-time translation table.
    pub fn remap(mut self, map: &'static [(i32, i32)]) -> Self {
        self.remap = Some(ValueMap(map));
        self
    }

    /// Sets the read/write bias.
    pub fn bias(mut self, bias: i32) -> Self {
        self.bias = Some(bias);
        self
    }

    /// Sets display labels.
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Assigns the parameter to a timbre.
    pub fn timbre(mut self, timbre: u8) -> Self {
        self.timbre = Some(timbre);
        self
    }

    /// Marks the addresses as verified.
    pub fn confirmed(mut self) -> Self {
        self.confidence = Confidence::Confirmed;
        self
    }

    /// Label for `value`, if one is defined.
    pub fn label(&self, value: i32) -> Option<&'static str> {
        self.labels
            .iter()
            .find(|(v, _)| *v == value)
            .map(|&(_, label)| label)
    }

    /// `value` limited to the declared range.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    /// Whether the wire address is a carrier byte.
    pub fn in_carrier(&self) -> bool {
        self.wire
            .is_some_and(|wire| bitpack::is_carrier_byte(wire.offset))
    }
}

/// A carrier bit that no descriptor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierBit {
    /// Packed position of the carrier byte.
    pub carrier: usize,
    /// Bit within the carrier.
    pub bit: u8,
    /// Data byte whose high bit this is.
    pub data_offset: usize,
    /// Section and logical offset of that data byte.
    pub section: (Section, usize),
}

/// Immutable registry of parameter descriptors.
///
/// Built once and shared by reference; definition order is preserved for
/// listings.
#[derive(Debug, Clone)]
pub struct Catalog {
    params: Vec<ParamDef>,
    index: HashMap<String, usize>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Catalog of every known RK-100S 2 program parameter.
    pub fn new() -> Self {
        Self::from_params(params::program_params())
    }

    /// Catalog over an explicit descriptor list. Later duplicates are dropped.
    pub fn from_params(params: Vec<ParamDef>) -> Self {
        let mut kept = Vec::with_capacity(params.len());
        let mut index = HashMap::with_capacity(params.len());
        for param in params {
            if index.contains_key(&param.name) {
                log::warn!("CATALOG: duplicate parameter '{}' ignored", param.name);
                continue;
            }
            index.insert(param.name.clone(), kept.len());
            kept.push(param);
        }
        Self {
            params: kept,
            index,
        }
    }

    /// Looks up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&ParamDef> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Every descriptor in definition order.
    pub fn list_all(&self) -> &[ParamDef] {
        &self.params
    }

    /// Descriptor names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the catalog has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Descriptors of one UI group.
    pub fn by_group(&self, group: &str) -> Vec<&ParamDef> {
        self.filter(|p| p.group == group)
    }

    /// Descriptors whose wire address lies in `section`.
    pub fn by_section(&self, section: Section) -> Vec<&ParamDef> {
        self.filter(|p| {
            p.wire.is_some_and(|wire| {
                bitpack::packed_to_section(wire.offset).is_some_and(|(s, _)| s == section)
            })
        })
    }

    /// Descriptors of one timbre.
    pub fn by_timbre(&self, timbre: u8) -> Vec<&ParamDef> {
        self.filter(|p| p.timbre == Some(timbre))
    }

    /// Descriptors with a real-time address.
    pub fn realtime(&self) -> Vec<&ParamDef> {
        self.filter(|p| p.realtime.is_some())
    }

    /// Descriptors with a wire address.
    pub fn wire(&self) -> Vec<&ParamDef> {
        self.filter(|p| p.wire.is_some())
    }

    /// Descriptors whose addresses are not yet verified.
    pub fn provisional(&self) -> Vec<&ParamDef> {
        self.filter(|p| p.confidence == Confidence::Provisional)
    }

    /// Descriptors stored in the byte at `offset`.
    pub fn at_offset(&self, offset: usize) -> Vec<&ParamDef> {
        self.filter(|p| p.wire.is_some_and(|wire| wire.offset == offset))
    }

    /// UI groups in first-appearance order.
    pub fn groups(&self) -> Vec<&'static str> {
        let mut groups: Vec<&'static str> = Vec::new();
        for param in &self.params {
            if !groups.contains(&param.group) {
                groups.push(param.group);
            }
        }
        groups
    }

    /// Carrier bits of section data that no descriptor reads.
    ///
    /// Program files drop carrier bytes, so any bit listed here is only
    /// preserved through a file when it is folded back from the data
    /// byte's high bit.
    pub fn carrier_audit(&self) -> Vec<CarrierBit> {
        let mut uncovered = Vec::new();
        for carrier in (FIRST_CARRIER..PROGRAM_SIZE).step_by(8) {
            let covered = self
                .at_offset(carrier)
                .iter()
                .filter_map(|p| p.wire)
                .fold(0u8, |bits, wire| bits | wire.layout.mask());

            for bit in 0..7u8 {
                let data_offset = carrier + 1 + bit as usize;
                let Some(section) = bitpack::packed_to_section(data_offset) else {
                    continue;
                };
                if covered & (1 << bit) == 0 {
                    uncovered.push(CarrierBit {
                        carrier,
                        bit,
                        data_offset,
                        section,
                    });
                }
            }
        }
        uncovered
    }

    fn filter(&self, pred: impl Fn(&ParamDef) -> bool) -> Vec<&ParamDef> {
        self.params.iter().filter(|p| pred(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_params(vec![
            ParamDef::new("a", "one", 0, 127).nrpn(0, 1),
            ParamDef::new("b", "two", 0, 127).at(30, WireLayout::BYTE),
            ParamDef::new("c", "one", 0, 1).at(32, WireLayout::Bit(2)),
            ParamDef::new("a", "two", 0, 1),
        ])
    }

    #[test]
    fn test_lookup_and_order() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("a").map(|p| p.group), Some("one"));
        assert!(catalog.get("missing").is_none());
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_filters_preserve_order() {
        let catalog = sample();
        let names = |v: Vec<&ParamDef>| v.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(catalog.by_group("one")), vec!["a", "c"]);
        assert_eq!(names(catalog.realtime()), vec!["a"]);
        assert_eq!(names(catalog.wire()), vec!["b", "c"]);
        assert_eq!(catalog.groups(), vec!["one", "two"]);
    }

    #[test]
    fn test_value_map() {
        let map = ValueMap(&[(0, 0), (1, 22), (2, 43)]);
        assert_eq!(map.to_realtime(1), 22);
        assert_eq!(map.to_realtime(9), 9);
        assert_eq!(map.to_wire(43), 2);
        assert_eq!(map.to_wire(30), 1);
        assert_eq!(map.to_wire(127), 2);
        assert_eq!(map.to_wire(-5), 0);
    }

    #[test]
    fn test_carrier_audit_honours_bit_layouts() {
        let catalog = sample();
        let audit = catalog.carrier_audit();
        assert!(audit.iter().any(|c| c.carrier == 32 && c.bit == 1));
        assert!(!audit.iter().any(|c| c.carrier == 32 && c.bit == 2));
        assert!(audit.iter().all(|c| c.data_offset < PROGRAM_SIZE));
    }
}
