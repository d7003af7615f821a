//! On-disk patch library.
//!
//! ```text
//! <root>/patches/<slug>.json   metadata
//! <root>/patches/<slug>.syx    raw program data, optional
//! <root>/banks/<slug>.json     slot -> patch file assignments
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// Lowercase with every character outside `[a-z0-9_-]` turned into '-'.
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// A saved program with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Display name.
    pub name: String,
    /// Slot the program was pulled from.
    pub program_number: u16,
    /// Free-form category.
    pub category: String,
    /// Free-form notes.
    pub notes: String,
    /// Raw program data.
    pub sysex: Option<Vec<u8>>,
    /// Creation date, `YYYY-MM-DD`.
    pub created: String,
}

#[derive(Serialize, Deserialize)]
struct PatchFile {
    name: String,
    #[serde(default)]
    program_number: u16,
    #[serde(default)]
    category: String,
    #[serde(default)]
    notes: String,
    #[serde(default = "today")]
    created: String,
    #[serde(default)]
    sysex_file: Option<String>,
}

impl Patch {
    /// A patch created today with no data.
    pub fn new(name: impl Into<String>, program_number: u16) -> Self {
        Self {
            name: name.into(),
            program_number,
            category: String::new(),
            notes: String::new(),
            sysex: None,
            created: today(),
        }
    }

    /// Attaches program data.
    pub fn with_sysex(mut self, data: Vec<u8>) -> Self {
        self.sysex = Some(data);
        self
    }

    /// File name stem derived from the name.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Writes the metadata to `json_path` and the data to its `.syx` sibling.
    pub fn save(&self, json_path: &Path) -> Result<()> {
        let sysex_file = match &self.sysex {
            Some(data) => {
                let syx_path = json_path.with_extension("syx");
                fs::write(&syx_path, data)?;
                syx_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            }
            None => None,
        };

        let file = PatchFile {
            name: self.name.clone(),
            program_number: self.program_number,
            category: self.category.clone(),
            notes: self.notes.clone(),
            created: self.created.clone(),
            sysex_file,
        };
        fs::write(json_path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Reads a patch. A missing `.syx` file leaves the data empty.
    pub fn load(json_path: &Path) -> Result<Self> {
        let file: PatchFile = serde_json::from_str(&fs::read_to_string(json_path)?)?;

        let sysex = match file.sysex_file {
            Some(name) => {
                let syx_path = json_path.with_file_name(name);
                if syx_path.exists() {
                    Some(fs::read(syx_path)?)
                } else {
                    log::warn!("LIBRARY: {} refers to missing {}", json_path.display(), syx_path.display());
                    None
                }
            }
            None => None,
        };

        Ok(Self {
            name: file.name,
            program_number: file.program_number,
            category: file.category,
            notes: file.notes,
            sysex,
            created: file.created,
        })
    }
}

/// A named set of slot assignments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bank {
    /// Display name.
    pub name: String,
    /// Patch file per program slot.
    pub slots: BTreeMap<u16, PathBuf>,
}

#[derive(Serialize, Deserialize)]
struct BankFile {
    name: String,
    #[serde(default)]
    slots: Vec<SlotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SlotEntry {
    slot: u16,
    patch_file: PathBuf,
}

impl Bank {
    /// An empty bank.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: BTreeMap::new(),
        }
    }

    /// Puts `patch_file` into `slot`, replacing any previous assignment.
    pub fn assign(&mut self, slot: u16, patch_file: impl Into<PathBuf>) {
        self.slots.insert(slot, patch_file.into());
    }

    /// Clears `slot`.
    pub fn remove(&mut self, slot: u16) {
        self.slots.remove(&slot);
    }

    /// Assignments in slot order.
    pub fn ordered_slots(&self) -> Vec<(u16, &Path)> {
        self.slots
            .iter()
            .map(|(&slot, path)| (slot, path.as_path()))
            .collect()
    }

    /// File name stem derived from the name.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Writes the bank as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = BankFile {
            name: self.name.clone(),
            slots: self
                .slots
                .iter()
                .map(|(&slot, patch_file)| SlotEntry {
                    slot,
                    patch_file: patch_file.clone(),
                })
                .collect(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Reads a bank.
    pub fn load(path: &Path) -> Result<Self> {
        let file: BankFile = serde_json::from_str(&fs::read_to_string(path)?)?;
        let mut bank = Self::new(file.name);
        for entry in file.slots {
            bank.assign(entry.slot, entry.patch_file);
        }
        Ok(bank)
    }
}

/// Patches and banks under one root directory.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    /// Opens a library, creating its directories.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let library = Self { root: root.into() };
        fs::create_dir_all(library.patches_dir())?;
        fs::create_dir_all(library.banks_dir())?;
        Ok(library)
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding patch files.
    pub fn patches_dir(&self) -> PathBuf {
        self.root.join("patches")
    }

    /// Directory holding bank files.
    pub fn banks_dir(&self) -> PathBuf {
        self.root.join("banks")
    }

    fn unique_path(dir: &Path, slug: &str) -> PathBuf {
        let mut path = dir.join(format!("{}.json", slug));
        let mut counter = 1;
        while path.exists() {
            path = dir.join(format!("{}-{}.json", slug, counter));
            counter += 1;
        }
        path
    }

    /// Saves under a fresh file name and returns the metadata path.
    pub fn save_patch(&self, patch: &Patch) -> Result<PathBuf> {
        let slug = usable_slug("Patch", &patch.name, patch.slug())?;
        let path = Self::unique_path(&self.patches_dir(), &slug);
        patch.save(&path)?;
        log::debug!("LIBRARY: saved patch to {}", path.display());
        Ok(path)
    }

    /// Every readable patch, by file name. Malformed files are skipped.
    pub fn list_patches(&self) -> Result<Vec<Patch>> {
        Ok(json_files(&self.patches_dir())?
            .iter()
            .filter_map(|path| match Patch::load(path) {
                Ok(patch) => Some(patch),
                Err(e) => {
                    log::warn!("LIBRARY: skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect())
    }

    /// Removes a patch's metadata and data files.
    pub fn delete_patch(&self, json_path: &Path) -> Result<()> {
        for path in [json_path.with_extension("syx"), json_path.to_path_buf()] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Saves under a fresh file name and returns the path.
    pub fn save_bank(&self, bank: &Bank) -> Result<PathBuf> {
        let slug = usable_slug("Bank", &bank.name, bank.slug())?;
        let path = Self::unique_path(&self.banks_dir(), &slug);
        bank.save(&path)?;
        Ok(path)
    }

    /// Every readable bank, by file name. Malformed files are skipped.
    pub fn list_banks(&self) -> Result<Vec<Bank>> {
        Ok(json_files(&self.banks_dir())?
            .iter()
            .filter_map(|path| match Bank::load(path) {
                Ok(bank) => Some(bank),
                Err(e) => {
                    log::warn!("LIBRARY: skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect())
    }
}

fn usable_slug(what: &str, name: &str, slug: String) -> Result<String> {
    if slug.is_empty() {
        return Err(Error::Validation(format!(
            "{} name '{}' has no usable characters",
            what, name
        )));
    }
    Ok(slug)
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
