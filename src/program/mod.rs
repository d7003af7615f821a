//! Program data: packing arithmetic, parameter catalog, buffer and file codec.

pub mod bitpack;
pub mod buffer;
pub mod catalog;
pub mod effects;
pub mod file;
mod params;

pub use bitpack::{Section, PROGRAM_SIZE};
pub use buffer::ProgramBuffer;
pub use catalog::{Catalog, Confidence, ParamDef, RealtimeAddr, WireAddr, WireLayout};
pub use effects::{EffectSlot, EffectSlots, EffectType};
