//! Live editing session for the program in the synth's edit buffer.
//!
//! Parameters with a real-time address are sent immediately as NRPN or CC
//! messages. Everything else is written into the program buffer, and the
//! whole program is sent once edits have been quiet for the debounce period.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::midi::{self, MidiOutput};
use crate::program::effects::{EffectSlot, EffectSlots, EffectType};
use crate::program::{Catalog, ParamDef, ProgramBuffer};
use crate::sysex;
use crate::writer::DebouncedWriter;

// Lock order: buffer, then output.
struct Shared {
    buffer: Mutex<ProgramBuffer>,
    output: Mutex<Box<dyn MidiOutput>>,
    channel: u8,
}

impl Shared {
    fn flush(&self) -> Result<bool> {
        let mut buffer = self.buffer.lock();
        if !buffer.dirty() || buffer.is_empty() {
            return Ok(false);
        }
        let msg = sysex::build_program_write(self.channel, buffer.as_slice())?;
        self.output.lock().send(&msg)?;
        buffer.mark_clean();
        log::debug!("EDITOR: program write sent ({} bytes)", msg.len());
        Ok(true)
    }

    fn send_realtime(&self, msg: &[u8]) -> Result<()> {
        let mut output = self.output.lock();
        for chunk in msg.chunks(3) {
            output.send(chunk)?;
        }
        Ok(())
    }
}

/// Parameter edits against one program, with debounced program writes.
///
/// Dropping the editor sends any unsent edits right away.
pub struct ProgramEditor {
    catalog: Arc<Catalog>,
    shared: Arc<Shared>,
    writer: DebouncedWriter,
    effects: EffectSlots,
}

impl ProgramEditor {
    /// Starts a session with an empty buffer.
    pub fn new(
        catalog: Arc<Catalog>,
        output: Box<dyn MidiOutput>,
        channel: u8,
        quiet: Duration,
    ) -> Result<Self> {
        if !(1..=16).contains(&channel) {
            return Err(Error::Validation(format!(
                "MIDI channel must be 1-16 (got {})",
                channel
            )));
        }

        let shared = Arc::new(Shared {
            buffer: Mutex::new(ProgramBuffer::new()),
            output: Mutex::new(output),
            channel,
        });

        let flush_shared = Arc::clone(&shared);
        let writer = DebouncedWriter::spawn(quiet, move || {
            if let Err(e) = flush_shared.flush() {
                log::warn!("EDITOR: program write failed: {}", e);
            }
        })?;

        Ok(Self {
            catalog,
            shared,
            writer,
            effects: EffectSlots::new(),
        })
    }

    /// Starts a session with channel and debounce taken from `config`.
    pub fn from_config(
        catalog: Arc<Catalog>,
        output: Box<dyn MidiOutput>,
        config: &Config,
    ) -> Result<Self> {
        Self::new(catalog, output, config.midi_channel, config.debounce())
    }

    /// MIDI channel of the session.
    pub fn channel(&self) -> u8 {
        self.shared.channel
    }

    /// Catalog used for name lookups.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Live effect types of both slots.
    pub fn effect_slots(&self) -> &EffectSlots {
        &self.effects
    }

    /// Background writer, for inspection.
    pub fn writer(&self) -> &DebouncedWriter {
        &self.writer
    }

    /// Descriptor for `name`, including the live effects' parameters.
    pub fn resolve(&self, name: &str) -> Option<ParamDef> {
        self.catalog
            .get(name)
            .cloned()
            .or_else(|| self.effects.resolve(name))
    }

    fn require(&self, name: &str) -> Result<ParamDef> {
        self.resolve(name)
            .ok_or_else(|| Error::Config(format!("Unknown parameter '{}'", name)))
    }

    /// Current buffer value of a parameter.
    pub fn get(&self, name: &str) -> Result<Option<i32>> {
        let def = self.require(name)?;
        Ok(self.shared.buffer.lock().get_param(&def))
    }

    /// Changes a parameter on the synth.
    pub fn set(&mut self, name: &str, value: i32) -> Result<()> {
        if let Some(slot) = EffectSlot::ALL
            .into_iter()
            .find(|slot| slot.type_param() == name)
        {
            let type_id = u8::try_from(value).map_err(|_| {
                Error::Validation(format!("Unknown effect type {} (expected 0-17)", value))
            })?;
            return self.select_effect(slot, type_id).map(|_| ());
        }

        let def = self.require(name)?;
        self.apply(&def, value)
    }

    fn apply(&self, def: &ParamDef, value: i32) -> Result<()> {
        let value = def.clamp(value);

        if def.realtime.is_some() {
            let msg = midi::build_param_message(def, self.shared.channel, value)?;
            self.shared.send_realtime(&msg)?;
            log::debug!("EDITOR: {} = {} (real-time)", def.name, value);

            // Keep the buffer in step without queuing a program write.
            if def.wire.is_some() {
                let mut buffer = self.shared.buffer.lock();
                if !buffer.is_empty() {
                    let was_dirty = buffer.dirty();
                    buffer.set_param(def, value)?;
                    if !was_dirty {
                        buffer.mark_clean();
                    }
                }
            }
            return Ok(());
        }

        let wire = def.wire.ok_or_else(|| {
            Error::Config(format!("Parameter '{}' has no address", def.name))
        })?;

        // Only a write that changes the byte restarts the quiet period.
        let changed = {
            let mut buffer = self.shared.buffer.lock();
            let before = buffer.get_byte(wire.offset).ok();
            buffer.set_param(def, value)?;
            buffer.get_byte(wire.offset).ok() != before
        };
        if changed {
            self.writer.schedule();
            log::debug!("EDITOR: {} = {} (buffered)", def.name, value);
        }
        Ok(())
    }

    /// Makes `type_id` the live effect of `slot` and stores it in the program.
    pub fn select_effect(&mut self, slot: EffectSlot, type_id: u8) -> Result<&'static EffectType> {
        let def = self.require(slot.type_param())?;
        let mut effects = self.effects;
        let effect = effects.select(slot, type_id)?;
        self.apply(&def, i32::from(type_id))?;
        self.effects = effects;
        Ok(effect)
    }

    /// Changes a parameter of the live effect in `slot`.
    pub fn set_effect_param(&mut self, slot: EffectSlot, key: &str, value: i32) -> Result<()> {
        let def = self.effects.param(slot, key).ok_or_else(|| {
            Error::Config(format!(
                "Effect '{}' in {} has no parameter '{}'",
                self.effects.selected(slot).name,
                slot.group(),
                key
            ))
        })?;
        self.apply(&def, value)
    }

    /// Replaces the program, dropping any pending write.
    pub fn load_program(&mut self, data: &[u8]) {
        self.writer.cancel();
        let mut buffer = self.shared.buffer.lock();
        buffer.load(data);
        self.effects.sync_from(&buffer, &self.catalog);
        log::debug!("EDITOR: loaded {} byte program", data.len());
    }

    /// Loads `msg` if it is a program dump. Returns whether it was one.
    pub fn handle_incoming(&mut self, msg: &[u8]) -> bool {
        match sysex::parse_program_dump(msg) {
            Some(payload) => {
                self.load_program(payload);
                true
            }
            None => false,
        }
    }

    /// Asks the synth for its current program.
    pub fn request_program(&self) -> Result<()> {
        let msg = sysex::build_program_dump_request(self.shared.channel)?;
        self.shared.output.lock().send(&msg)
    }

    /// Switches the synth to one of its program slots.
    pub fn select_slot(&self, slot: u16) -> Result<()> {
        let msg = midi::build_slot_select(self.shared.channel, slot)?;
        self.shared.send_realtime(&msg)
    }

    /// Copy of the current program bytes.
    pub fn snapshot(&self) -> Vec<u8> {
        self.shared.buffer.lock().to_bytes()
    }

    /// Whether the buffer holds unsent edits.
    pub fn is_dirty(&self) -> bool {
        self.shared.buffer.lock().dirty()
    }

    /// Sends the program now if it has unsent edits. Returns whether it did.
    pub fn flush_now(&self) -> Result<bool> {
        self.writer.cancel();
        self.shared.flush()
    }

    /// Holds back program writes, e.g. while a sequencer drives the port.
    pub fn suppress_writes(&self) {
        self.writer.suppress();
    }

    /// Allows program writes again, scheduling one if edits are waiting.
    pub fn resume_writes(&self) {
        let dirty = self.is_dirty();
        self.writer.resume(dirty);
    }
}

/// Unsent edits are written before the session closes, unless writes are
/// suppressed.
impl Drop for ProgramEditor {
    fn drop(&mut self) {
        let suppressed = self.writer.is_suppressed();
        self.writer.shutdown();
        if suppressed {
            if self.is_dirty() {
                log::debug!("EDITOR: closing with suppressed edits unsent");
            }
            return;
        }
        if let Err(e) = self.shared.flush() {
            log::warn!("EDITOR: final program write failed: {}", e);
        }
    }
}
