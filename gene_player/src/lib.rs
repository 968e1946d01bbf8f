//! # gene_player
//!
//! Front end for gene melodies: DNA text in, MIDI out.
//!
//! | Step | Module |
//! |---|---|
//! | Settings (tempo, instrument, output, port) | [`config`], [`cli`] |
//! | Instrument selector entries | [`instruments`] |
//! | DNA → encoded `.mid` bytes | [`render`] |
//! | Play on a MIDI output port | [`playback`] |
//! | Save to disk | [`download`] |
//!
//! Playback failures are non-fatal. Callers log them and carry on, and
//! the encoded buffer stays usable for a download.

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod instruments;
pub mod playback;
pub mod render;

pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use render::{render, Rendered};
