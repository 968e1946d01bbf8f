//! Player settings: tempo, instrument, output path, and MIDI port.
//!
//! Settings come from [`PlayerConfig::default`], optionally overlaid by a
//! TOML file, then by command-line flags.
//!
//! # Example TOML
//! ```toml
//! bpm = 96
//! program = 73          # Flute
//! output = "songs/brca1.mid"
//! port = "fluid"        # prefer an output port whose name contains this
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use gene_midi::TrackDirective;

use crate::error::{Error, Result};

pub const MIN_BPM:         u32  = 60;
pub const MAX_BPM:         u32  = 240;
pub const DEFAULT_BPM:     u32  = 120;
/// Lead synth.
pub const DEFAULT_PROGRAM: u8   = 81;
pub const DEFAULT_OUTPUT:  &str = "dna_music.mid";

/// Name of the config file picked up from the working directory when no
/// `--config` flag is given.
pub const CONFIG_FILE: &str = "gene_player.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Tempo in BPM, kept within [`MIN_BPM`]..=[`MAX_BPM`].
    pub bpm: u32,
    /// General MIDI program number (0–127).
    pub program: u8,
    /// Where downloads are written.
    pub output: PathBuf,
    /// Case-insensitive substring of the preferred output port name.
    pub port: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            bpm:     DEFAULT_BPM,
            program: DEFAULT_PROGRAM,
            output:  PathBuf::from(DEFAULT_OUTPUT),
            port:    None,
        }
    }
}

impl PlayerConfig {
    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Load [`CONFIG_FILE`] if it exists, otherwise use the defaults.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(s)?;
        config.validated()
    }

    /// Check the program number and pull the tempo into range.
    pub fn validated(mut self) -> Result<Self> {
        if self.program > 127 {
            return Err(Error::InvalidConfig(format!(
                "program {} is out of range (0–127)", self.program
            )));
        }
        let bpm = clamp_bpm(self.bpm);
        if bpm != self.bpm {
            warn!("Tempo {} BPM clamped to {} BPM", self.bpm, bpm);
            self.bpm = bpm;
        }
        Ok(self)
    }

    /// Set the tempo, clamped to the supported range.
    pub fn with_bpm(mut self, bpm: u32) -> Self {
        self.bpm = clamp_bpm(bpm);
        self
    }

    /// Instrument and tempo for the encoder.
    pub fn directive(&self) -> TrackDirective {
        TrackDirective::new(self.program, self.bpm)
    }
}

/// Clamp a tempo to [`MIN_BPM`]..=[`MAX_BPM`].
pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}
