//! Master effect types and the per-slot parameter view.
//!
//! Each of the two effect slots hosts one of 18 effect types. A type owns an
//! ordered list of sub-parameters stored in an 18-byte data area of the
//! slot; switching the type replaces the whole set of live parameters.

use super::bitpack::Section;
use super::buffer::ProgramBuffer;
use super::catalog::{Catalog, Labels, ParamDef, WireLayout};
use crate::error::{Error, Result};

/// Width of one slot's effect data area.
pub const EFFECT_AREA_WIDTH: usize = 18;

/// One parameter of an effect type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectParam {
    /// Key, unique within the type.
    pub key: &'static str,
    /// Name shown by the device.
    pub display_name: &'static str,
    /// Inclusive lower bound.
    pub min: i32,
    /// Inclusive upper bound.
    pub max: i32,
    /// Position within the effect data area.
    pub slot_index: usize,
    /// Value labels.
    pub labels: Labels,
    /// Whether the long ribbon can drive this parameter.
    pub ribbon_assignable: bool,
}

/// An effect algorithm and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectType {
    /// Type number, 0 is "Effect Off".
    pub id: u8,
    /// Display name.
    pub name: &'static str,
    /// Parameters in data-area order.
    pub params: &'static [EffectParam],
}

impl EffectType {
    /// Parameters offered as long ribbon targets, in order.
    pub fn ribbon_assigns(&self) -> Vec<&'static EffectParam> {
        self.params.iter().filter(|p| p.ribbon_assignable).collect()
    }

    /// Parameter by key.
    pub fn param(&self, key: &str) -> Option<&'static EffectParam> {
        self.params.iter().find(|p| p.key == key)
    }
}

const fn ribbon(
    key: &'static str,
    display_name: &'static str,
    min: i32,
    max: i32,
    slot_index: usize,
    labels: Labels,
) -> EffectParam {
    EffectParam {
        key,
        display_name,
        min,
        max,
        slot_index,
        labels,
        ribbon_assignable: true,
    }
}

const fn fixed(
    key: &'static str,
    display_name: &'static str,
    min: i32,
    max: i32,
    slot_index: usize,
    labels: Labels,
) -> EffectParam {
    EffectParam {
        key,
        display_name,
        min,
        max,
        slot_index,
        labels,
        ribbon_assignable: false,
    }
}

const NONE: Labels = &[];
const OFF_ON: Labels = &[(0, "Off"), (1, "On")];
const PHASE: Labels = &[(0, "+"), (1, "-")];
const LFO_WAVEFORM: Labels = &[
    (0, "Saw"),
    (1, "Square"),
    (2, "Triangle"),
    (3, "Sine"),
    (4, "S&H"),
];
const LFO_SYNC_NOTE: Labels = &[
    (0, "8/1"),
    (1, "6/1"),
    (2, "4/1"),
    (3, "3/1"),
    (4, "2/1"),
    (5, "3/2"),
    (6, "1/1"),
    (7, "3/4"),
    (8, "1/2"),
    (9, "3/8"),
    (10, "1/3"),
    (11, "1/4"),
    (12, "3/16"),
    (13, "1/6"),
    (14, "1/8"),
    (15, "3/32"),
    (16, "1/12"),
    (17, "1/16"),
    (18, "1/24"),
    (19, "1/32"),
    (20, "1/48"),
    (21, "1/64"),
];

/// Effect type names keyed by type number.
pub const EFFECT_TYPE_NAMES: Labels = &[
    (0, "Effect Off"),
    (1, "Compressor"),
    (2, "Filter"),
    (3, "4Band EQ"),
    (4, "Distortion"),
    (5, "Decimator"),
    (6, "Delay"),
    (7, "L/C/R Delay"),
    (8, "Auto Panning Delay"),
    (9, "Modulation Delay"),
    (10, "Tape Echo"),
    (11, "Chorus"),
    (12, "Flanger"),
    (13, "Vibrato"),
    (14, "Phaser"),
    (15, "Tremolo"),
    (16, "Ring Modulator"),
    (17, "Grain Shifter"),
];

const DRY_WET: EffectParam = ribbon("dry_wet", "Dry/Wet", 0, 127, 0, NONE);

/// Every effect type, indexed by type number.
pub static EFFECT_TYPES: [EffectType; 18] = [
    EffectType {
        id: 0,
        name: "Effect Off",
        params: &[],
    },
    EffectType {
        id: 1,
        name: "Compressor",
        params: &[
            DRY_WET,
            fixed(
                "envelope_select",
                "Envelope Select",
                0,
                1,
                1,
                &[(0, "LR Mix"), (1, "LR Individual")],
            ),
            ribbon("sensitivity", "Sensitivity", 0, 127, 2, NONE),
            ribbon("attack", "Attack", 0, 127, 3, NONE),
            fixed("output_level", "Output Level", 0, 127, 4, NONE),
        ],
    },
    EffectType {
        id: 2,
        name: "Filter",
        params: &[
            DRY_WET,
            fixed(
                "filter_type",
                "Filter Type",
                0,
                4,
                1,
                &[
                    (0, "LPF24"),
                    (1, "LPF18"),
                    (2, "LPF12"),
                    (3, "HPF12"),
                    (4, "BPF12"),
                ],
            ),
            ribbon("cutoff", "Cutoff", 0, 127, 2, NONE),
            ribbon("resonance", "Resonance", 0, 127, 3, NONE),
            fixed("trim", "Trim", 0, 127, 4, NONE),
            fixed(
                "mod_source",
                "Mod Source",
                0,
                1,
                5,
                &[(0, "LFO"), (1, "Control")],
            ),
            ribbon("mod_intensity", "Mod Intensity", 0, 127, 6, NONE),
            ribbon("mod_response", "Mod Response", 0, 127, 7, NONE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 8, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 9, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 10, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 11, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 12, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 13, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 14, NONE),
            fixed(
                "control_source",
                "Control Source",
                0,
                7,
                15,
                &[
                    (0, "Off"),
                    (1, "Velocity"),
                    (2, "Short Ribbon (Pitch)"),
                    (3, "Short Ribbon (Mod)"),
                    (4, "MIDI Control 1"),
                    (5, "MIDI Control 2"),
                    (6, "MIDI Control 3"),
                ],
            ),
        ],
    },
    EffectType {
        id: 3,
        name: "4Band EQ",
        params: &[
            DRY_WET,
            fixed("trim", "Trim", 0, 127, 1, NONE),
            fixed(
                "b1_type",
                "B1 Type",
                0,
                1,
                2,
                &[(0, "Peaking"), (1, "Shelving Low")],
            ),
            fixed("b1_frequency", "B1 Frequency", 0, 127, 3, NONE),
            fixed("b1_q", "B1 Q", 0, 127, 4, NONE),
            ribbon("b1_gain", "B1 Gain", 0, 36, 5, NONE),
            fixed("b2_frequency", "B2 Frequency", 0, 127, 6, NONE),
            fixed("b2_q", "B2 Q", 0, 127, 7, NONE),
            ribbon("b2_gain", "B2 Gain", 0, 36, 8, NONE),
            fixed("b3_frequency", "B3 Frequency", 0, 127, 9, NONE),
            fixed("b3_q", "B3 Q", 0, 127, 10, NONE),
            ribbon("b3_gain", "B3 Gain", 0, 36, 11, NONE),
            fixed(
                "b4_type",
                "B4 Type",
                0,
                1,
                12,
                &[(0, "Peaking"), (1, "Shelving High")],
            ),
            fixed("b4_frequency", "B4 Frequency", 0, 127, 13, NONE),
            fixed("b4_q", "B4 Q", 0, 127, 14, NONE),
            ribbon("b4_gain", "B4 Gain", 0, 36, 15, NONE),
        ],
    },
    EffectType {
        id: 4,
        name: "Distortion",
        params: &[
            DRY_WET,
            ribbon("gain", "Gain", 0, 127, 1, NONE),
            fixed("pre_eq_frequency", "Pre EQ Frequency", 0, 127, 2, NONE),
            fixed("pre_eq_q", "Pre EQ Q", 0, 127, 3, NONE),
            ribbon("pre_eq_gain", "Pre EQ Gain", 0, 36, 4, NONE),
            fixed("b1_frequency", "B1 Frequency", 0, 127, 5, NONE),
            fixed("b1_q", "B1 Q", 0, 127, 6, NONE),
            ribbon("b1_gain", "B1 Gain", 0, 36, 7, NONE),
            fixed("b2_frequency", "B2 Frequency", 0, 127, 8, NONE),
            fixed("b2_q", "B2 Q", 0, 127, 9, NONE),
            ribbon("b2_gain", "B2 Gain", 0, 36, 10, NONE),
            fixed("b3_frequency", "B3 Frequency", 0, 127, 11, NONE),
            fixed("b3_q", "B3 Q", 0, 127, 12, NONE),
            ribbon("b3_gain", "B3 Gain", 0, 36, 13, NONE),
            fixed("output_level", "Output Level", 0, 127, 14, NONE),
        ],
    },
    EffectType {
        id: 5,
        name: "Decimator",
        params: &[
            DRY_WET,
            fixed("pre_lpf", "Pre LPF", 0, 1, 1, OFF_ON),
            fixed("high_damp", "High Damp", 0, 100, 2, NONE),
            ribbon("fs", "Fs", 0, 127, 3, NONE),
            ribbon("bit", "Bit", 0, 20, 4, NONE),
            fixed("output_level", "Output Level", 0, 127, 5, NONE),
            ribbon("fs_mod_intensity", "Fs Mod Intensity", 0, 127, 6, NONE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 7, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 8, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 9, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 10, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 11, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 12, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 13, NONE),
        ],
    },
    EffectType {
        id: 6,
        name: "Delay",
        params: &[
            DRY_WET,
            fixed("delay_type", "Type", 0, 1, 1, &[(0, "Stereo"), (1, "Cross")]),
            fixed("delay_tempo_sync", "Delay Tempo Sync", 0, 1, 2, OFF_ON),
            ribbon("time_ratio", "Time Ratio", 0, 127, 3, NONE),
            fixed("l_delay_time", "L Delay Time", 0, 127, 4, NONE),
            fixed("r_delay_time", "R Delay Time", 0, 127, 5, NONE),
            ribbon("feedback", "Feedback", 0, 127, 6, NONE),
            fixed("high_damp", "High Damp", 0, 100, 7, NONE),
            fixed("trim", "Trim", 0, 127, 8, NONE),
            fixed("spread", "Spread", 0, 127, 9, NONE),
        ],
    },
    EffectType {
        id: 7,
        name: "L/C/R Delay",
        params: &[
            DRY_WET,
            fixed("delay_tempo_sync", "Delay Tempo Sync", 0, 1, 1, OFF_ON),
            ribbon("time_ratio", "Time Ratio", 0, 127, 2, NONE),
            fixed("l_delay_time", "L Delay Time", 0, 127, 3, NONE),
            fixed("c_delay_time", "C Delay Time", 0, 127, 4, NONE),
            fixed("r_delay_time", "R Delay Time", 0, 127, 5, NONE),
            fixed("l_delay_level", "L Delay Level", 0, 127, 6, NONE),
            fixed("c_delay_level", "C Delay Level", 0, 127, 7, NONE),
            fixed("r_delay_level", "R Delay Level", 0, 127, 8, NONE),
            ribbon("c_feedback", "C Feedback", 0, 127, 9, NONE),
            fixed("trim", "Trim", 0, 127, 10, NONE),
            fixed("spread", "Spread", 0, 127, 11, NONE),
        ],
    },
    EffectType {
        id: 8,
        name: "Auto Panning Delay",
        params: &[
            DRY_WET,
            fixed("delay_tempo_sync", "Delay Tempo Sync", 0, 1, 1, OFF_ON),
            ribbon("time_ratio", "Time Ratio", 0, 127, 2, NONE),
            fixed("l_delay_time", "L Delay Time", 0, 127, 3, NONE),
            fixed("r_delay_time", "R Delay Time", 0, 127, 4, NONE),
            ribbon("feedback", "Feedback", 0, 127, 5, NONE),
            ribbon("mod_depth", "Mod Depth", 0, 127, 6, NONE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 7, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 8, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 9, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 10, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 11, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 12, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 13, NONE),
            fixed("lfo_spread", "LFO Spread", 0, 127, 14, NONE),
            fixed("high_damp", "High Damp", 0, 100, 15, NONE),
            fixed("trim", "Trim", 0, 127, 16, NONE),
            fixed("spread", "Spread", 0, 127, 17, NONE),
        ],
    },
    EffectType {
        id: 9,
        name: "Modulation Delay",
        params: &[
            DRY_WET,
            fixed("delay_tempo_sync", "Delay Tempo Sync", 0, 1, 1, OFF_ON),
            ribbon("time_ratio", "Time Ratio", 0, 127, 2, NONE),
            fixed("l_delay_time", "L Delay Time", 0, 127, 3, NONE),
            fixed("r_delay_time", "R Delay Time", 0, 127, 4, NONE),
            ribbon("feedback", "Feedback", 0, 127, 5, NONE),
            ribbon("mod_depth", "Mod Depth", 0, 127, 6, NONE),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 7, NONE),
            fixed("lfo_spread", "LFO Spread", 0, 127, 8, NONE),
        ],
    },
    EffectType {
        id: 10,
        name: "Tape Echo",
        params: &[
            DRY_WET,
            fixed("delay_tempo_sync", "Delay Tempo Sync", 0, 1, 1, OFF_ON),
            ribbon("time_ratio", "Time Ratio", 0, 127, 2, NONE),
            fixed("tap1_delay_time", "Tap1 Delay Time", 0, 127, 3, NONE),
            fixed("tap2_delay_time", "Tap2 Delay Time", 0, 127, 4, NONE),
            ribbon("tap1_level", "Tap1 Level", 0, 127, 5, NONE),
            ribbon("tap2_level", "Tap2 Level", 0, 127, 6, NONE),
            ribbon("feedback", "Feedback", 0, 127, 7, NONE),
            fixed("high_damp", "High Damp", 0, 100, 8, NONE),
            fixed("low_damp", "Low Damp", 0, 100, 9, NONE),
            fixed("trim", "Trim", 0, 127, 10, NONE),
            ribbon("saturation", "Saturation", 0, 127, 11, NONE),
            fixed(
                "wow_flutter_frequency",
                "WOW Flutter Frequency",
                0,
                127,
                12,
                NONE,
            ),
            fixed("wow_flutter_depth", "WOW Flutter Depth", 0, 127, 13, NONE),
            fixed("pre_tone", "Pre Tone", 0, 127, 14, NONE),
            fixed("spread", "Spread", 0, 127, 15, NONE),
        ],
    },
    EffectType {
        id: 11,
        name: "Chorus",
        params: &[
            DRY_WET,
            ribbon("mod_depth", "Mod Depth", 0, 127, 1, NONE),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 2, NONE),
            fixed("lfo_spread", "LFO Spread", 0, 127, 3, NONE),
            fixed("predelay_l", "PreDelay L", 0, 127, 4, NONE),
            fixed("predelay_r", "PreDelay R", 0, 127, 5, NONE),
            fixed("trim", "Trim", 0, 127, 6, NONE),
            fixed("high_eq_gain", "High EQ Gain", 0, 127, 7, NONE),
        ],
    },
    EffectType {
        id: 12,
        name: "Flanger",
        params: &[
            DRY_WET,
            ribbon("delay", "Delay", 0, 127, 1, NONE),
            ribbon("mod_depth", "Mod Depth", 0, 127, 2, NONE),
            ribbon("feedback", "Feedback", 0, 127, 3, NONE),
            fixed("phase", "Phase", 0, 1, 4, PHASE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 5, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 6, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 7, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 8, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 9, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 10, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 11, NONE),
            fixed("lfo_spread", "LFO Spread", 0, 127, 12, NONE),
            fixed("high_damp", "High Damp", 0, 100, 13, NONE),
        ],
    },
    EffectType {
        id: 13,
        name: "Vibrato",
        params: &[
            DRY_WET,
            ribbon("mod_depth", "Mod Depth", 0, 127, 1, NONE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 2, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 3, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 4, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 5, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 6, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 7, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 8, NONE),
            fixed("lfo_spread", "LFO Spread", 0, 127, 9, NONE),
        ],
    },
    EffectType {
        id: 14,
        name: "Phaser",
        params: &[
            DRY_WET,
            fixed("phaser_type", "Type", 0, 1, 1, &[(0, "BLUE"), (1, "U-VB")]),
            ribbon("manual", "Manual", 0, 127, 2, NONE),
            ribbon("mod_depth", "Mod Depth", 0, 127, 3, NONE),
            ribbon("resonance", "Resonance", 0, 127, 4, NONE),
            fixed("phase", "Phase", 0, 1, 5, PHASE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 6, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 7, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 8, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 9, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 10, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 11, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 12, NONE),
            fixed("lfo_spread", "LFO Spread", 0, 127, 13, NONE),
        ],
    },
    EffectType {
        id: 15,
        name: "Tremolo",
        params: &[
            DRY_WET,
            ribbon("mod_depth", "Mod Depth", 0, 127, 1, NONE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 2, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 3, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 4, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 5, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 6, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 7, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 8, NONE),
            fixed("lfo_spread", "LFO Spread", 0, 127, 9, NONE),
        ],
    },
    EffectType {
        id: 16,
        name: "Ring Modulator",
        params: &[
            DRY_WET,
            fixed("osc_mode", "OSC Mode", 0, 1, 1, &[(0, "Fixed"), (1, "Note")]),
            ribbon("fixed_frequency", "Fixed Frequency", 0, 127, 2, NONE),
            ribbon("note_offset", "Note Offset", 0, 127, 3, NONE),
            fixed("note_fine", "Note Fine", 0, 127, 4, NONE),
            fixed(
                "osc_waveform",
                "OSC Waveform",
                0,
                2,
                5,
                &[(0, "Saw"), (1, "Triangle"), (2, "Sine")],
            ),
            ribbon("lfo_intensity", "LFO Intensity", 0, 127, 6, NONE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 7, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 8, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 9, LFO_SYNC_NOTE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 10, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 11, NONE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 12, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 13, NONE),
            fixed("pre_lpf", "Pre LPF", 0, 127, 14, NONE),
        ],
    },
    EffectType {
        id: 17,
        name: "Grain Shifter",
        params: &[
            DRY_WET,
            fixed("duration_tempo_sync", "Duration Tempo Sync", 0, 1, 1, OFF_ON),
            ribbon("time_ratio", "Time Ratio", 0, 127, 2, NONE),
            fixed("duration", "Duration", 0, 127, 3, NONE),
            fixed("lfo_tempo_sync", "LFO Tempo Sync", 0, 1, 4, OFF_ON),
            ribbon("lfo_frequency", "LFO Frequency", 0, 127, 5, NONE),
            ribbon("lfo_sync_note", "LFO Sync Note", 0, 21, 6, LFO_SYNC_NOTE),
            fixed("lfo_key_sync", "LFO KeySync", 0, 1, 7, OFF_ON),
            fixed("lfo_init_phase", "LFO Init Phase", 0, 127, 8, NONE),
            fixed("lfo_waveform", "LFO Waveform", 0, 4, 9, LFO_WAVEFORM),
            fixed("lfo_shape", "LFO Shape", 0, 127, 10, NONE),
        ],
    },
];

/// Effect type by number.
pub fn get_effect_type(id: u8) -> Option<&'static EffectType> {
    EFFECT_TYPES.get(id as usize)
}

/// One of the two master effect slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectSlot {
    /// Master effect 1.
    Fx1,
    /// Master effect 2.
    Fx2,
}

impl EffectSlot {
    /// Both slots.
    pub const ALL: [EffectSlot; 2] = [EffectSlot::Fx1, EffectSlot::Fx2];

    /// Slot from its 1-based number.
    pub fn from_number(number: u8) -> Result<Self> {
        match number {
            1 => Ok(EffectSlot::Fx1),
            2 => Ok(EffectSlot::Fx2),
            n => Err(Error::Validation(format!(
                "Effect slot must be 1 or 2 (got {})",
                n
            ))),
        }
    }

    /// 1-based slot number.
    pub fn number(self) -> u8 {
        match self {
            EffectSlot::Fx1 => 1,
            EffectSlot::Fx2 => 2,
        }
    }

    /// Catalog group of the slot's parameters.
    pub fn group(self) -> &'static str {
        match self {
            EffectSlot::Fx1 => "fx1",
            EffectSlot::Fx2 => "fx2",
        }
    }

    /// Catalog name of the slot's type selector.
    pub fn type_param(self) -> &'static str {
        match self {
            EffectSlot::Fx1 => "fx1_type",
            EffectSlot::Fx2 => "fx2_type",
        }
    }

    // Gap logical offset of the data area. Fx1's area ends below the fx2
    // selector at L24.
    fn data_base(self) -> usize {
        match self {
            EffectSlot::Fx1 => 6,
            EffectSlot::Fx2 => 42,
        }
    }

    fn index(self) -> usize {
        self.number() as usize - 1
    }
}

/// Descriptor of an effect parameter placed in `slot`.
pub fn effect_param_def(slot: EffectSlot, param: &EffectParam) -> ParamDef {
    ParamDef::new(
        format!("fx{}_{}", slot.number(), param.key),
        slot.group(),
        param.min,
        param.max,
    )
    .describe(param.display_name)
    .in_section(
        Section::Gap,
        slot.data_base() + param.slot_index,
        WireLayout::BYTE,
    )
    .labels(param.labels)
}

/// Which effect type is live in each slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectSlots {
    types: [u8; 2],
}

impl EffectSlots {
    /// Both slots off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `type_id` the live effect of `slot`.
    pub fn select(&mut self, slot: EffectSlot, type_id: u8) -> Result<&'static EffectType> {
        let effect = get_effect_type(type_id).ok_or_else(|| {
            Error::Validation(format!("Unknown effect type {} (expected 0-17)", type_id))
        })?;
        self.types[slot.index()] = type_id;
        Ok(effect)
    }

    /// Live effect type of `slot`.
    pub fn selected(&self, slot: EffectSlot) -> &'static EffectType {
        &EFFECT_TYPES[self.types[slot.index()] as usize]
    }

    /// Descriptors currently addressable through `slot`.
    pub fn addressable(&self, slot: EffectSlot) -> Vec<ParamDef> {
        self.selected(slot)
            .params
            .iter()
            .map(|param| effect_param_def(slot, param))
            .collect()
    }

    /// Descriptor of `key` for the live effect of `slot`.
    pub fn param(&self, slot: EffectSlot, key: &str) -> Option<ParamDef> {
        self.selected(slot)
            .param(key)
            .map(|param| effect_param_def(slot, param))
    }

    /// Resolves a prefixed name such as `fx2_feedback`.
    pub fn resolve(&self, name: &str) -> Option<ParamDef> {
        EffectSlot::ALL.into_iter().find_map(|slot| {
            let key = name.strip_prefix(slot.group())?.strip_prefix('_')?;
            self.param(slot, key)
        })
    }

    /// Reads both type selectors from a loaded program.
    pub fn sync_from(&mut self, buffer: &ProgramBuffer, catalog: &Catalog) {
        for slot in EffectSlot::ALL {
            let Some(value) = catalog
                .get(slot.type_param())
                .and_then(|def| buffer.get_param(def))
            else {
                continue;
            };
            match u8::try_from(value).ok().and_then(get_effect_type) {
                Some(effect) => self.types[slot.index()] = effect.id,
                None => {
                    log::warn!(
                        "EFFECTS: {} holds unknown type {}, treating as off",
                        slot.group(),
                        value
                    );
                    self.types[slot.index()] = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_counts() {
        let counts = [0, 5, 16, 16, 15, 14, 10, 12, 18, 9, 16, 8, 14, 10, 14, 10, 15, 11];
        for (effect, count) in EFFECT_TYPES.iter().zip(counts) {
            assert_eq!(effect.params.len(), count, "{}", effect.name);
        }
    }

    #[test]
    fn test_ids_and_names_line_up() {
        for (i, effect) in EFFECT_TYPES.iter().enumerate() {
            assert_eq!(effect.id as usize, i);
            assert_eq!(EFFECT_TYPE_NAMES[i], (i as i32, effect.name));
        }
    }

    #[test]
    fn test_dry_wet_leads_every_active_type() {
        for effect in EFFECT_TYPES.iter().skip(1) {
            let first = effect.params[0];
            assert_eq!(first.key, "dry_wet");
            assert_eq!(first.slot_index, 0);
            assert!(first.ribbon_assignable);
        }
    }

    #[test]
    fn test_slot_indices_fit_the_data_area() {
        for effect in &EFFECT_TYPES {
            for (i, param) in effect.params.iter().enumerate() {
                assert_eq!(param.slot_index, i, "{}.{}", effect.name, param.key);
                assert!(param.slot_index < EFFECT_AREA_WIDTH);
            }
        }
    }

    #[test]
    fn test_ribbon_assigns() {
        let keys = |id: u8| {
            get_effect_type(id)
                .unwrap()
                .ribbon_assigns()
                .iter()
                .map(|p| p.key)
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(1), vec!["dry_wet", "sensitivity", "attack"]);
        assert_eq!(
            keys(3),
            vec!["dry_wet", "b1_gain", "b2_gain", "b3_gain", "b4_gain"]
        );
        assert!(keys(0).is_empty());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut slots = EffectSlots::new();
        assert!(matches!(
            slots.select(EffectSlot::Fx1, 18),
            Err(Error::Validation(_))
        ));
        assert_eq!(slots.selected(EffectSlot::Fx1).id, 0);
    }

    #[test]
    fn test_effect_parameters_stay_clear_of_the_catalog() {
        let catalog = Catalog::new();
        let taken: Vec<usize> = catalog
            .wire()
            .iter()
            .filter_map(|p| p.wire)
            .map(|wire| wire.offset)
            .collect();

        for slot in EffectSlot::ALL {
            for i in 0..EFFECT_AREA_WIDTH {
                let offset = Section::Gap.offset_of(slot.data_base() + i);
                assert!(!taken.contains(&offset), "{} area hits {}", slot.group(), offset);
            }
        }

        for effect in &EFFECT_TYPES {
            let mut slots = EffectSlots::new();
            for slot in EffectSlot::ALL {
                slots.select(slot, effect.id).unwrap();
                for def in slots.addressable(slot) {
                    assert!(
                        catalog.get(&def.name).is_none(),
                        "{} in {} shadows a catalog parameter",
                        def.name,
                        effect.name
                    );
                    let offset = def.wire.unwrap().offset;
                    assert!(!taken.contains(&offset), "{} shares {}", def.name, offset);
                }
            }
        }
    }

    #[test]
    fn test_resolve_prefixed_names() {
        let mut slots = EffectSlots::new();
        slots.select(EffectSlot::Fx2, 6).unwrap();
        let def = slots.resolve("fx2_feedback").unwrap();
        assert_eq!(def.wire.unwrap().offset, Section::Gap.offset_of(42 + 6));
        assert!(slots.resolve("fx1_feedback").is_none());
        assert!(slots.resolve("fx2feedback").is_none());
    }
}
