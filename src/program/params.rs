//! RK-100S 2 program parameter table.
//!
//! Offsets were recovered from NRPN scans, program diffs and the Sound
//! Editor's parameter table. Only the first two sources are hardware
//! verified; everything else is built as provisional.

use super::bitpack::Section;
use super::catalog::{Labels, ParamDef, WireLayout};
use super::effects::EFFECT_TYPE_NAMES;

const OFF_ON: Labels = &[(0, "Off"), (127, "On")];

const VOICE_MODE: Labels = &[(0, "Single"), (1, "Layer"), (2, "Split"), (3, "Multi")];
const ARP_SELECT: Labels = &[(0, "Timbre 1"), (1, "Timbre 2"), (2, "Timbre 1+2")];

const UNISON: Labels = &[(0, "Off"), (1, "2 Voice"), (2, "3 Voice"), (3, "4 Voice")];
const VOICE_ASSIGN: Labels = &[(0, "Mono 1"), (1, "Mono 2"), (2, "Poly")];
const OSC1_WAVE: Labels = &[
    (0, "Saw"),
    (1, "Pulse"),
    (2, "Triangle"),
    (3, "Sine"),
    (4, "Formant"),
    (5, "Noise"),
    (6, "PCM/DWGS"),
    (7, "Audio In"),
];
const OSC1_MOD: Labels = &[(0, "Waveform"), (1, "Cross"), (2, "Unison"), (3, "VPM")];
const OSC2_WAVE: Labels = &[(0, "Saw"), (1, "Square"), (2, "Triangle")];
const OSC2_MOD: Labels = &[(0, "Off"), (1, "Ring"), (2, "Sync"), (3, "Ring Sync")];
const FILTER_ROUTING: Labels = &[
    (0, "Single"),
    (1, "Serial"),
    (2, "Parallel"),
    (3, "Individual"),
];
const FILTER2_TYPE: Labels = &[(0, "LPF"), (1, "HPF"), (2, "BPF")];
const WS_POSITION: Labels = &[(0, "Pre Filter"), (127, "Pre Amp")];
const LFO1_WAVE: Labels = &[
    (0, "Saw"),
    (1, "Square"),
    (2, "Triangle"),
    (3, "S&H"),
    (4, "Random"),
];
const LFO2_WAVE: Labels = &[
    (0, "Saw"),
    (1, "Square+"),
    (2, "Sine"),
    (3, "S&H"),
    (4, "Random"),
];
const KEY_SYNC: Labels = &[(0, "Off"), (1, "Timbre"), (2, "Voice")];

const ARP_TYPE: Labels = &[
    (0, "Up"),
    (22, "Down"),
    (43, "Alt1"),
    (64, "Alt2"),
    (85, "Random"),
    (106, "Trigger"),
];
const ARP_TYPE_MAP: &[(i32, i32)] = &[(0, 0), (1, 22), (2, 43), (3, 64), (4, 85), (5, 106)];
const ARP_RESOLUTION: Labels = &[
    (0, "1/32"),
    (1, "1/24"),
    (2, "1/16"),
    (3, "1/12"),
    (4, "1/8"),
    (5, "1/6"),
    (6, "1/4"),
];
const ARP_OCTAVES: Labels = &[(0, "1 Oct"), (1, "2 Oct"), (2, "3 Oct"), (3, "4 Oct")];
const SCALE: Labels = &[
    (0, "Chromatic"),
    (1, "Major"),
    (2, "Minor"),
    (3, "Harmonic Minor"),
    (4, "Dorian"),
    (5, "Lydian"),
    (6, "Mixolydian"),
    (7, "Major Penta"),
    (8, "Minor Penta"),
    (9, "Blues"),
];
const SHORT_RIBBON_SETTING: Labels = &[(0, "Pitch"), (127, "Mod")];
const RIBBON_POLARITY: Labels = &[(0, "Forward"), (1, "Reverse")];

/// A per-timbre entry, instantiated once for each timbre.
struct TimbreParam {
    key: &'static str,
    group: &'static str,
    logical: usize,
    min: i32,
    max: i32,
    layout: WireLayout,
    labels: Labels,
}

const fn byte(key: &'static str, group: &'static str, logical: usize, max: i32) -> TimbreParam {
    TimbreParam {
        key,
        group,
        logical,
        min: 0,
        max,
        layout: WireLayout::BYTE,
        labels: &[],
    }
}

const fn signed(key: &'static str, group: &'static str, logical: usize, span: i32) -> TimbreParam {
    TimbreParam {
        key,
        group,
        logical,
        min: -span,
        max: span,
        layout: WireLayout::SIGNED,
        labels: &[],
    }
}

const fn field(
    key: &'static str,
    group: &'static str,
    logical: usize,
    mask: u8,
    shift: u8,
    labels: Labels,
) -> TimbreParam {
    TimbreParam {
        key,
        group,
        logical,
        min: 0,
        max: (mask >> shift) as i32,
        layout: WireLayout::Field { mask, shift },
        labels,
    }
}

const TIMBRE_PARAMS: &[TimbreParam] = &[
    // voice
    TimbreParam {
        labels: UNISON,
        ..byte("unison_sw", "voice", 4, 3)
    },
    byte("unison_detune", "voice", 5, 99),
    byte("unison_spread", "voice", 6, 127),
    TimbreParam {
        labels: VOICE_ASSIGN,
        ..byte("voice_assign", "voice", 7, 2)
    },
    byte("analog_tuning", "voice", 9, 127),
    signed("transpose", "voice", 10, 48),
    signed("detune", "voice", 11, 50),
    signed("vibrato_int", "voice", 12, 63),
    signed("bend_range", "voice", 13, 12),
    byte("portamento", "voice", 14, 127),
    // osc1
    field("osc1_wave", "osc1", 16, 0x07, 0, OSC1_WAVE),
    field("osc1_osc_mod", "osc1", 16, 0x30, 4, OSC1_MOD),
    byte("osc1_control1", "osc1", 17, 127),
    byte("osc1_control2", "osc1", 18, 127),
    byte("osc1_wave_select", "osc1", 19, 127),
    // osc2
    field("osc2_wave", "osc2", 21, 0x03, 0, OSC2_WAVE),
    field("osc2_osc_mod", "osc2", 21, 0x30, 4, OSC2_MOD),
    signed("osc2_semitone", "osc2", 22, 24),
    signed("osc2_tune", "osc2", 23, 63),
    // mixer
    byte("mixer_osc1", "mixer", 24, 127),
    byte("mixer_osc2", "mixer", 25, 127),
    byte("mixer_noise", "mixer", 26, 127),
    field("mixer_punch", "mixer", 46, 0x3F, 0, &[]),
    // filters
    field("filter_routing", "filter1", 28, 0x03, 0, FILTER_ROUTING),
    byte("filter1_balance", "filter1", 29, 127),
    byte("filter1_cutoff", "filter1", 30, 127),
    byte("filter1_resonance", "filter1", 31, 127),
    signed("filter1_eg_int", "filter1", 32, 63),
    signed("filter1_key_track", "filter1", 33, 63),
    signed("filter1_velo_sens", "filter1", 34, 63),
    field("filter2_type", "filter2", 28, 0x30, 4, FILTER2_TYPE),
    byte("filter2_cutoff", "filter2", 35, 127),
    byte("filter2_resonance", "filter2", 36, 127),
    signed("filter2_eg_int", "filter2", 37, 63),
    signed("filter2_key_track", "filter2", 38, 63),
    signed("filter2_velo_sens", "filter2", 39, 63),
    // amp
    byte("amp_level", "amp", 40, 127),
    signed("amp_pan", "amp", 41, 63),
    byte("amp_ws_type", "amp", 42, 12),
    byte("amp_ws_depth", "amp", 43, 127),
    signed("amp_key_track", "amp", 45, 63),
    TimbreParam {
        layout: WireLayout::Bit(6),
        labels: WS_POSITION,
        ..byte("amp_ws_position", "amp", 46, 127)
    },
    // envelopes
    byte("filter_eg_attack", "filter_eg", 48, 127),
    byte("filter_eg_decay", "filter_eg", 49, 127),
    byte("filter_eg_sustain", "filter_eg", 50, 127),
    byte("filter_eg_release", "filter_eg", 51, 127),
    signed("filter_eg_velo", "filter_eg", 52, 63),
    byte("amp_eg_attack", "amp_eg", 54, 127),
    byte("amp_eg_decay", "amp_eg", 55, 127),
    byte("amp_eg_sustain", "amp_eg", 56, 127),
    byte("amp_eg_release", "amp_eg", 57, 127),
    signed("amp_eg_velo", "amp_eg", 58, 63),
    byte("assign_eg_attack", "assign_eg", 60, 127),
    byte("assign_eg_decay", "assign_eg", 61, 127),
    byte("assign_eg_sustain", "assign_eg", 62, 127),
    byte("assign_eg_release", "assign_eg", 63, 127),
    signed("assign_eg_velo", "assign_eg", 64, 63),
    // lfos
    TimbreParam {
        labels: LFO1_WAVE,
        ..byte("lfo1_wave", "lfo1", 66, 4)
    },
    byte("lfo1_freq", "lfo1", 67, 127),
    field("lfo1_key_sync", "lfo1", 68, 0x03, 0, KEY_SYNC),
    TimbreParam {
        layout: WireLayout::Bit(6),
        labels: OFF_ON,
        ..byte("lfo1_bpm_sync", "lfo1", 68, 127)
    },
    byte("lfo1_sync_note", "lfo1", 69, 14),
    TimbreParam {
        labels: LFO2_WAVE,
        ..byte("lfo2_wave", "lfo2", 70, 4)
    },
    byte("lfo2_freq", "lfo2", 71, 127),
    field("lfo2_key_sync", "lfo2", 72, 0x03, 0, KEY_SYNC),
    TimbreParam {
        layout: WireLayout::Bit(6),
        labels: OFF_ON,
        ..byte("lfo2_bpm_sync", "lfo2", 72, 127)
    },
    byte("lfo2_sync_note", "lfo2", 73, 14),
    // eq
    byte("eq_low_freq", "eq", 92, 29),
    signed("eq_low_gain", "eq", 93, 15),
    byte("eq_high_freq", "eq", 94, 29),
    signed("eq_high_gain", "eq", 95, 15),
];

/// Every program parameter in listing order.
pub(crate) fn program_params() -> Vec<ParamDef> {
    let mut params = Vec::with_capacity(300);

    common_params(&mut params);
    for timbre in 1..=2u8 {
        timbre_params(&mut params, timbre);
    }
    patch_params(&mut params);
    vocoder_params(&mut params);
    effect_params(&mut params);
    arp_params(&mut params);
    ribbon_params(&mut params);

    params
}

fn common_params(params: &mut Vec<ParamDef>) {
    params.push(
        ParamDef::new("voice_mode", "common", 0, 127)
            .describe("Single/Layer/Split/Multi timbre mode")
            .nrpn(0x05, 0x00)
            .in_section(Section::Common, 8, WireLayout::BYTE)
            .labels(VOICE_MODE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_select", "common", 0, 127)
            .describe("Which timbre the arpeggiator applies to")
            .nrpn(0x00, 0x0B)
            .in_section(Section::Common, 10, WireLayout::BYTE)
            .labels(ARP_SELECT)
            .confirmed(),
    );
}

fn timbre_params(params: &mut Vec<ParamDef>, timbre: u8) {
    let section = if timbre == 1 {
        Section::Timbre1
    } else {
        Section::Timbre2
    };

    for entry in TIMBRE_PARAMS {
        params.push(
            ParamDef::new(format!("t{}_{}", timbre, entry.key), entry.group, entry.min, entry.max)
                .in_section(section, entry.logical, entry.layout)
                .labels(entry.labels)
                .timbre(timbre),
        );
    }

    params.push(
        ParamDef::new(format!("t{}_long_ribbon_filter_int", timbre), "ribbon", -63, 63)
            .describe("Long ribbon to filter cutoff intensity")
            .in_section(section, 91, WireLayout::SIGNED)
            .timbre(timbre)
            .confirmed(),
    );
}

fn patch_params(params: &mut Vec<ParamDef>) {
    for patch in 1..=5usize {
        let logical = 74 + (patch - 1) * 3;

        let mut source = ParamDef::new(format!("patch{}_source", patch), "virtual_patch", 0, 127)
            .describe("Virtual patch modulation source")
            .in_section(Section::Timbre1, logical, WireLayout::BYTE)
            .confirmed();
        let mut dest = ParamDef::new(format!("patch{}_dest", patch), "virtual_patch", 0, 127)
            .describe("Virtual patch modulation destination")
            .in_section(Section::Timbre1, logical + 1, WireLayout::BYTE)
            .confirmed();
        if patch <= 3 {
            source = source.nrpn(0x04, (patch - 1) as u8);
            dest = dest.nrpn(0x04, 0x08 + (patch - 1) as u8);
        }
        params.push(source);
        params.push(dest);
        params.push(
            ParamDef::new(format!("patch{}_intensity", patch), "virtual_patch", -63, 63)
                .describe("Virtual patch modulation depth")
                .in_section(Section::Timbre1, logical + 2, WireLayout::SIGNED),
        );
    }
}

fn vocoder_params(params: &mut Vec<ParamDef>) {
    // The switch NRPN toggles carrier 232; the bit is bit 7 of vocoder L0.
    params.push(
        ParamDef::new("vocoder_sw", "vocoder", 0, 127)
            .describe("Enables/disables the vocoder")
            .nrpn(0x05, 0x04)
            .at(232, WireLayout::Bit(5))
            .labels(OFF_ON),
    );
    params.push(
        ParamDef::new("vocoder_fc_mod_source", "vocoder", 0, 127)
            .describe("Vocoder filter modulation source")
            .in_section(Section::Timbre1, 74, WireLayout::BYTE)
            .confirmed(),
    );

    let header = [
        "vocoder_gate_sens",
        "vocoder_gate_threshold",
        "vocoder_hpf_level",
        "vocoder_direct_level",
        "vocoder_timbre1_level",
        "vocoder_timbre2_level",
        "vocoder_level",
    ];
    for (i, name) in header.into_iter().enumerate() {
        params.push(
            ParamDef::new(name, "vocoder", 0, 127).in_section(
                Section::VocoderBands,
                i + 1,
                WireLayout::BYTE,
            ),
        );
    }

    for (logical, name, min, max, center) in [
        (2, "vocoder_fc_offset", -63, 63, Some(-64)),
        (3, "vocoder_resonance", 0, 127, None),
        (4, "vocoder_fc_mod_int", -63, 63, Some(-64)),
        (5, "vocoder_ef_sens", 0, 127, None),
    ] {
        let mut param = ParamDef::new(name, "vocoder", min, max)
            .in_section(Section::Gap, logical, WireLayout::BYTE)
            .confirmed();
        if let Some(center) = center {
            param = param.bias(center);
        }
        params.push(param);
    }

    for band in 1..=16usize {
        params.push(
            ParamDef::new(format!("vocoder_pan_{}", band), "vocoder_band", -63, 63)
                .in_section(Section::VocoderBands, (band - 1) * 2 + 8, WireLayout::SIGNED)
                .confirmed(),
        );
        params.push(
            ParamDef::new(format!("vocoder_level_{}", band), "vocoder_band", 0, 127)
                .in_section(Section::VocoderBands, (band - 1) * 2 + 9, WireLayout::BYTE)
                .confirmed(),
        );
    }
}

fn effect_params(params: &mut Vec<ParamDef>) {
    params.push(
        ParamDef::new("fx1_type", "fx1", 0, 17)
            .describe("Master effect 1 type")
            .in_section(Section::Gap, 0, WireLayout::BYTE)
            .labels(EFFECT_TYPE_NAMES),
    );
    params.push(
        ParamDef::new("fx1_ribbon_assign", "fx1", 0, 17)
            .describe("Effect 1 parameter driven by the long ribbon")
            .in_section(Section::Gap, 40, WireLayout::BYTE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("fx1_ribbon_polarity", "fx1", 0, 1)
            .in_section(Section::Gap, 41, WireLayout::BYTE)
            .labels(RIBBON_POLARITY)
            .confirmed(),
    );
    params.push(
        ParamDef::new("fx2_type", "fx2", 0, 17)
            .describe("Master effect 2 type")
            .in_section(Section::Gap, 24, WireLayout::Field { mask: 0x1F, shift: 0 })
            .labels(EFFECT_TYPE_NAMES),
    );
    params.push(
        ParamDef::new("fx2_on_off", "fx2", 0, 127)
            .in_section(Section::Gap, 24, WireLayout::Bit(6))
            .labels(OFF_ON),
    );
    params.push(
        ParamDef::new("fx2_ribbon_assign", "fx2", 0, 17)
            .describe("Effect 2 parameter driven by the long ribbon")
            .in_section(Section::Gap, 64, WireLayout::BYTE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("fx2_ribbon_polarity", "fx2", 0, 1)
            .in_section(Section::Gap, 65, WireLayout::BYTE)
            .labels(RIBBON_POLARITY)
            .confirmed(),
    );
}

fn arp_params(params: &mut Vec<ParamDef>) {
    params.push(
        ParamDef::new("arp_on_off", "arpeggiator", 0, 127)
            .describe("Enables/disables the arpeggiator")
            .nrpn(0x00, 0x02)
            .at(384, WireLayout::Bit(0))
            .labels(OFF_ON)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_latch", "arpeggiator", 0, 127)
            .describe("Holds the arpeggio after releasing keys")
            .nrpn(0x00, 0x04)
            .at(384, WireLayout::Bit(1))
            .labels(OFF_ON)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_type", "arpeggiator", 0, 127)
            .describe("Pattern: Up, Down, Alt1, Alt2, Random, Trigger")
            .nrpn(0x00, 0x07)
            .in_section(Section::Arpeggiator, 2, WireLayout::BYTE)
            .remap(ARP_TYPE_MAP)
            .labels(ARP_TYPE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_gate", "arpeggiator", 0, 127)
            .describe("Duration of each arpeggio note")
            .nrpn(0x00, 0x0A)
            .in_section(Section::Arpeggiator, 4, WireLayout::BYTE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_resolution", "arpeggiator", 0, 6)
            .in_section(Section::Arpeggiator, 0, WireLayout::BYTE)
            .labels(ARP_RESOLUTION),
    );
    params.push(
        ParamDef::new("arp_last_step", "arpeggiator", 1, 8)
            .in_section(Section::Arpeggiator, 1, WireLayout::BYTE)
            .bias(1),
    );
    params.push(
        ParamDef::new("arp_octave_range", "arpeggiator", 0, 3)
            .in_section(
                Section::Arpeggiator,
                3,
                WireLayout::Field {
                    mask: 0x60,
                    shift: 5,
                },
            )
            .labels(ARP_OCTAVES)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_swing", "arpeggiator", -50, 50)
            .in_section(Section::Arpeggiator, 5, WireLayout::SIGNED)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_step_switches", "arpeggiator", 0, 127)
            .describe("Steps 1-7 on/off, one bit each")
            .in_section(Section::Arpeggiator, 6, WireLayout::BYTE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("arp_key_sync", "arpeggiator", 0, 127)
            .at(384, WireLayout::Bit(6))
            .labels(OFF_ON)
            .confirmed(),
    );
}

fn ribbon_params(params: &mut Vec<ParamDef>) {
    params.push(
        ParamDef::new("short_ribbon_mod_assign", "ribbon", 0, 127)
            .describe("Control change sent by the short ribbon")
            .in_section(Section::Arpeggiator, 10, WireLayout::BYTE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("short_ribbon_mod_lock", "ribbon", 0, 127)
            .at(392, WireLayout::Bit(3))
            .labels(OFF_ON)
            .confirmed(),
    );
    params.push(
        ParamDef::new("short_ribbon_setting", "ribbon", 0, 127)
            .in_section(Section::Arpeggiator, 11, WireLayout::Bit(0))
            .labels(SHORT_RIBBON_SETTING)
            .confirmed(),
    );
    params.push(
        ParamDef::new("scale", "ribbon", 0, 9)
            .in_section(Section::Arpeggiator, 12, WireLayout::BYTE)
            .labels(SCALE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("long_ribbon_scale_range", "ribbon", 0, 127)
            .in_section(Section::Arpeggiator, 13, WireLayout::BYTE)
            .confirmed(),
    );
    params.push(
        ParamDef::new("long_ribbon_pitch_range", "ribbon", 0, 127)
            .in_section(Section::Arpeggiator, 14, WireLayout::BYTE)
            .confirmed(),
    );
}
