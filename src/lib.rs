//! Program data toolkit for the Korg RK-100S 2 keytar.
//!
//! The synth exchanges programs as bit-packed SysEx dumps and stores them on
//! disk in an unpacked `.rk100s2_prog` layout. This crate converts between
//! the two, exposes every known program parameter through a typed catalog,
//! and coalesces bursts of edits into single program writes.
//!
//! ```no_run
//! use rkpatch::program::{file, Catalog, ProgramBuffer};
//!
//! let catalog = Catalog::new();
//! let packed = file::load_program_file("lead.rk100s2_prog")?;
//! let mut buffer = ProgramBuffer::from_bytes(&packed);
//!
//! let gate = catalog.get("arp_gate").expect("known parameter");
//! buffer.set_param(gate, 90)?;
//! file::save_program_file("lead-edit.rk100s2_prog", &buffer.to_bytes())?;
//! # Ok::<(), rkpatch::Error>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod editor;
pub mod error;
pub mod library;
pub mod midi;
pub mod program;
pub mod sysex;
pub mod writer;

pub use config::Config;
pub use editor::ProgramEditor;
pub use error::{Error, Result};
pub use midi::{MidiOutput, RecordingOutput};
pub use program::{Catalog, ParamDef, ProgramBuffer, Section};
pub use writer::DebouncedWriter;
