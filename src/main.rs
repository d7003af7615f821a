use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use rkpatch::program::bitpack::{self, Section};
use rkpatch::program::effects::{self, EffectSlots, EFFECT_TYPES};
use rkpatch::program::{file, Catalog, Confidence, ParamDef, ProgramBuffer, RealtimeAddr, WireLayout};
use rkpatch::{sysex, Config, ProgramEditor, RecordingOutput};

/// Inspect and convert Korg RK-100S 2 programs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the name and every decoded parameter of a program file
    Info {
        /// Path to a .rk100s2_prog file
        file: PathBuf,
    },
    /// List catalog parameters
    Params {
        /// Only parameters stored in this section
        #[arg(long)]
        section: Option<String>,

        /// Only parameters of this UI group
        #[arg(long)]
        group: Option<String>,

        /// Only parameters whose address is not verified
        #[arg(long)]
        provisional: bool,
    },
    /// Read one parameter from a program file
    Get {
        /// Path to a .rk100s2_prog file
        file: PathBuf,

        /// Parameter name
        param: String,
    },
    /// Change one parameter in a program file
    Set {
        /// Path to a .rk100s2_prog file
        file: PathBuf,

        /// Parameter name
        param: String,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: i32,

        /// Write here instead of modifying the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a program file into a SysEx program write
    ToSyx {
        /// Path to a .rk100s2_prog file
        prog: PathBuf,

        /// Output .syx path
        out: PathBuf,

        /// MIDI channel (overrides the config)
        #[arg(long)]
        channel: Option<u8>,
    },
    /// Convert a SysEx program dump into a program file
    ToProg {
        /// Path to a .syx file holding a program dump
        syx: PathBuf,

        /// Output .rk100s2_prog path
        out: PathBuf,
    },
    /// Explain a packed offset
    Offset {
        /// Packed position (0-495)
        packed: usize,
    },
    /// Byte-level diff of two program files
    Diff {
        /// First program file
        a: PathBuf,

        /// Second program file
        b: PathBuf,
    },
    /// List effect types, or the parameters of one type
    Effects {
        /// Effect type number (0-17)
        type_id: Option<u8>,
    },
    /// Report carrier bits no parameter reads
    Audit,
    /// Print the MIDI an editing session would send for a list of edits
    Edit {
        /// Path to a .rk100s2_prog file
        file: PathBuf,

        /// Edits as name=value
        #[arg(required = true)]
        edits: Vec<String>,

        /// Select this program slot first (0-199)
        #[arg(long)]
        slot: Option<u16>,

        /// MIDI channel (overrides the config)
        #[arg(long)]
        channel: Option<u8>,
    },
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let catalog = Catalog::new();

    match args.command {
        Commands::Info { file } => info(&catalog, &file),
        Commands::Params {
            section,
            group,
            provisional,
        } => params(&catalog, section.as_deref(), group.as_deref(), provisional),
        Commands::Get { file, param } => {
            let buffer = load_buffer(&file)?;
            let def = resolve(&catalog, &buffer, &param)?;
            let value = buffer
                .get_param(&def)
                .ok_or_else(|| anyhow!("'{}' is not stored in program data", param))?;
            println!("{} = {}", param, format_value(&def, value));
            Ok(())
        }
        Commands::Set {
            file,
            param,
            value,
            output,
        } => {
            let mut buffer = load_buffer(&file)?;
            let def = resolve(&catalog, &buffer, &param)?;
            let clamped = def.clamp(value);
            if clamped != value {
                log::warn!("{} clamped to {}", value, clamped);
            }
            buffer.set_param(&def, clamped)?;

            let out = output.as_deref().unwrap_or(file.as_path());
            file::save_program_file(out, buffer.as_slice())
                .with_context(|| format!("writing {}", out.display()))?;
            println!("{} = {} -> {}", param, format_value(&def, clamped), out.display());
            Ok(())
        }
        Commands::ToSyx { prog, out, channel } => {
            let packed = load_packed(&prog)?;
            let channel = channel.unwrap_or(config.midi_channel);
            let msg = sysex::build_program_write(channel, &packed)?;
            std::fs::write(&out, &msg).with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {} bytes to {}", msg.len(), out.display());
            Ok(())
        }
        Commands::ToProg { syx, out } => {
            let bytes =
                std::fs::read(&syx).with_context(|| format!("reading {}", syx.display()))?;
            let payload = sysex::find_program_dump(&bytes)?;
            file::save_program_file(&out, payload)?;
            let name = sysex::extract_patch_name(payload).unwrap_or_default();
            println!("Wrote '{}' to {}", name, out.display());
            Ok(())
        }
        Commands::Offset { packed } => offset(packed),
        Commands::Diff { a, b } => diff(&catalog, &a, &b),
        Commands::Effects { type_id } => list_effects(type_id),
        Commands::Audit => audit(&catalog),
        Commands::Edit {
            file,
            edits,
            slot,
            channel,
        } => {
            let packed = load_packed(&file)?;
            let channel = channel.unwrap_or(config.midi_channel);
            edit(catalog, &config, &packed, &edits, slot, channel)
        }
    }
}

fn load_packed(path: &Path) -> Result<Vec<u8>> {
    file::load_program_file(path).with_context(|| format!("reading {}", path.display()))
}

fn load_buffer(path: &Path) -> Result<ProgramBuffer> {
    Ok(ProgramBuffer::from_bytes(&load_packed(path)?))
}

// Catalog parameters first, then the live effects' parameters.
fn resolve(catalog: &Catalog, buffer: &ProgramBuffer, name: &str) -> Result<ParamDef> {
    if let Some(def) = catalog.get(name) {
        return Ok(def.clone());
    }
    let mut slots = EffectSlots::new();
    slots.sync_from(buffer, catalog);
    slots
        .resolve(name)
        .ok_or_else(|| anyhow!("Unknown parameter '{}'", name))
}

fn format_value(def: &ParamDef, value: i32) -> String {
    match def.label(value) {
        Some(label) => format!("{} ({})", value, label),
        None => value.to_string(),
    }
}

fn format_realtime(def: &ParamDef) -> String {
    match def.realtime {
        Some(RealtimeAddr::Nrpn { msb, lsb }) => format!("NRPN {:02X}/{:02X}", msb, lsb),
        Some(RealtimeAddr::Cc(number)) => format!("CC {}", number),
        None => "-".to_string(),
    }
}

fn format_wire(def: &ParamDef) -> String {
    let Some(wire) = def.wire else {
        return "-".to_string();
    };
    let location = match bitpack::packed_to_section(wire.offset) {
        Some((section, logical)) => format!("{} L{}", section, logical),
        None if bitpack::is_carrier_byte(wire.offset) => "carrier".to_string(),
        None => "?".to_string(),
    };
    let layout = match wire.layout {
        WireLayout::Byte { signed: true } => " signed".to_string(),
        WireLayout::Byte { signed: false } => String::new(),
        WireLayout::Bit(bit) => format!(" bit {}", bit),
        WireLayout::Field { mask, shift } => format!(" mask 0x{:02X}>>{}", mask, shift),
    };
    format!("@{} ({}){}", wire.offset, location, layout)
}

fn info(catalog: &Catalog, path: &Path) -> Result<()> {
    let buffer = load_buffer(path)?;
    let name = sysex::extract_patch_name(buffer.as_slice()).unwrap_or_default();
    println!("Name: {}", name);

    println!("\nSections:");
    for section in Section::ALL {
        let (first, last) = section.packed_bounds();
        println!(
            "  {:14} packed {:3}-{:3}  ({} logical bytes)",
            section.name(),
            first,
            last,
            section.layout().len
        );
    }

    let mut slots = EffectSlots::new();
    slots.sync_from(&buffer, catalog);

    for group in catalog.groups() {
        let params: Vec<_> = catalog
            .by_group(group)
            .into_iter()
            .filter_map(|def| buffer.get_param(def).map(|value| (def, value)))
            .collect();
        if params.is_empty() {
            continue;
        }
        println!("\n[{}]", group);
        for (def, value) in params {
            let marker = if def.confidence == Confidence::Provisional {
                "?"
            } else {
                ""
            };
            println!("  {:32} {}{}", def.name, format_value(def, value), marker);
        }
    }

    for slot in effects::EffectSlot::ALL {
        let effect = slots.selected(slot);
        println!("\n[{} {}]", slot.group(), effect.name);
        for def in slots.addressable(slot) {
            if let Some(value) = buffer.get_param(&def) {
                println!("  {:32} {}?", def.name, format_value(&def, value));
            }
        }
    }
    Ok(())
}

fn params(
    catalog: &Catalog,
    section: Option<&str>,
    group: Option<&str>,
    provisional: bool,
) -> Result<()> {
    let section = match section {
        Some(name) => Some(
            Section::ALL
                .into_iter()
                .find(|s| s.name() == name)
                .ok_or_else(|| anyhow!("Unknown section '{}'", name))?,
        ),
        None => None,
    };

    let selected = catalog.list_all().iter().filter(|def| {
        group.map_or(true, |g| def.group == g)
            && (!provisional || def.confidence == Confidence::Provisional)
            && section.map_or(true, |s| {
                def.wire
                    .and_then(|w| bitpack::packed_to_section(w.offset))
                    .is_some_and(|(found, _)| found == s)
            })
    });

    for def in selected {
        let marker = match def.confidence {
            Confidence::Confirmed => "",
            Confidence::Provisional => "?",
        };
        println!(
            "{:32} {:14} {:>4}..{:<4} {:12} {}{}",
            def.name,
            def.group,
            def.min,
            def.max,
            format_realtime(def),
            format_wire(def),
            marker
        );
    }
    Ok(())
}

fn offset(packed: usize) -> Result<()> {
    if packed >= bitpack::PROGRAM_SIZE {
        bail!("Packed offset must be below {}", bitpack::PROGRAM_SIZE);
    }
    if bitpack::is_carrier_byte(packed) {
        println!("Packed {} is a carrier (no file position)", packed);
        return Ok(());
    }

    let file_pos = file::packed_to_file(packed)
        .map_or_else(|| "-".to_string(), |fp| fp.to_string());
    match bitpack::packed_to_section(packed) {
        Some((section, logical)) => {
            println!("Packed {} -> file[{}] ({} L{})", packed, file_pos, section, logical)
        }
        None => println!("Packed {} -> file[{}] (no section)", packed, file_pos),
    }
    if let Some((carrier, bit)) = bitpack::carrier_of(packed) {
        println!("High bit in carrier {} bit {}", carrier, bit);
    }
    Ok(())
}

fn diff(catalog: &Catalog, a: &Path, b: &Path) -> Result<()> {
    let left = load_packed(a)?;
    let right = load_packed(b)?;

    let mut count = 0;
    for (offset, (x, y)) in left.iter().zip(&right).enumerate() {
        if x == y {
            continue;
        }
        count += 1;
        let location = match bitpack::packed_to_section(offset) {
            Some((section, logical)) => format!("{} L{}", section, logical),
            None if bitpack::is_carrier_byte(offset) => "carrier".to_string(),
            None => "-".to_string(),
        };
        let names: Vec<_> = catalog
            .at_offset(offset)
            .iter()
            .map(|def| def.name.as_str())
            .collect();
        println!(
            "{:3} {:18} {:3} -> {:3}  {}",
            offset,
            location,
            x,
            y,
            names.join(", ")
        );
    }
    println!("{} byte(s) differ", count);
    Ok(())
}

fn list_effects(type_id: Option<u8>) -> Result<()> {
    let Some(id) = type_id else {
        for effect in &EFFECT_TYPES {
            println!("{:2} {} ({} parameters)", effect.id, effect.name, effect.params.len());
        }
        return Ok(());
    };

    let effect =
        effects::get_effect_type(id).ok_or_else(|| anyhow!("Unknown effect type {}", id))?;
    println!("{}", effect.name);
    for param in effect.params {
        let ribbon = if param.ribbon_assignable { "ribbon" } else { "" };
        println!(
            "  {:2} {:24} {:>3}..{:<3} {}",
            param.slot_index, param.key, param.min, param.max, ribbon
        );
    }
    Ok(())
}

fn audit(catalog: &Catalog) -> Result<()> {
    let uncovered = catalog.carrier_audit();
    for bit in &uncovered {
        let (section, logical) = bit.section;
        println!(
            "carrier {:3} bit {}  high bit of {:3} ({} L{})",
            bit.carrier, bit.bit, bit.data_offset, section, logical
        );
    }
    println!(
        "{} carrier bit(s) not read by any parameter; program files keep them only as high bits",
        uncovered.len()
    );
    Ok(())
}

fn edit(
    catalog: Catalog,
    config: &Config,
    packed: &[u8],
    edits: &[String],
    slot: Option<u16>,
    channel: u8,
) -> Result<()> {
    let recorder = RecordingOutput::new();
    let mut editor = ProgramEditor::new(
        Arc::new(catalog),
        Box::new(recorder.clone()),
        channel,
        config.debounce(),
    )?;
    editor.load_program(packed);

    if let Some(slot) = slot {
        editor.select_slot(slot)?;
    }
    for assignment in edits {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected name=value, got '{}'", assignment))?;
        let value: i32 = value
            .trim()
            .parse()
            .with_context(|| format!("bad value in '{}'", assignment))?;
        editor.set(name.trim(), value)?;
    }
    editor.flush_now()?;

    for msg in recorder.sent() {
        let hex: Vec<_> = msg.iter().map(|b| format!("{:02X}", b)).collect();
        println!("{}", hex.join(" "));
    }
    Ok(())
}
