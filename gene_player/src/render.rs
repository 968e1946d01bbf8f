//! DNA text → encoded MIDI file.

use tracing::debug;

use gene_midi::MidiBuffer;

use crate::config::PlayerConfig;
use crate::error::{Error, Result};

/// An encoded melody and the number of bases it was built from.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub midi:  MidiBuffer,
    pub bases: usize,
}

/// Translate `dna` and encode it with the tempo and instrument in `config`.
///
/// Fails with [`Error::NoValidSymbols`] if `dna` contains no bases, so no
/// file is produced for empty input.
pub fn render(dna: &str, config: &PlayerConfig) -> Result<Rendered> {
    let events = gene_sequence::translate(dna);
    if events.is_empty() {
        return Err(Error::NoValidSymbols);
    }

    let midi = gene_midi::encode(&config.directive(), &events)?;
    debug!("Rendered {} bases into {} bytes", events.len(), midi.len());

    Ok(Rendered { midi, bases: events.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bases() {
        let r = render("at cg", &PlayerConfig::default()).unwrap();
        assert_eq!(r.bases, 4);
        assert_eq!(&r.midi.as_bytes()[..4], b"MThd");
        // Program change carries the default Lead Synth program.
        assert_eq!(&r.midi.as_bytes()[22..25], &[0x00, 0xC0, 81]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(render("", &PlayerConfig::default()), Err(Error::NoValidSymbols)));
        assert!(matches!(render("xyz123", &PlayerConfig::default()), Err(Error::NoValidSymbols)));
    }

    #[test]
    fn bad_program_surfaces_encoder_error() {
        let config = PlayerConfig { program: 200, ..PlayerConfig::default() };
        let err = render("ATCG", &config).unwrap_err();
        assert!(matches!(err, Error::Encode(gene_midi::Error::Range { field: "program", value: 200 })));
    }

    #[test]
    fn tempo_follows_config() {
        let config = PlayerConfig::default().with_bpm(60);
        let r = render("A", &config).unwrap();
        // 1_000_000 µs per quarter = 0F 42 40
        assert_eq!(&r.midi.as_bytes()[25..32], &[0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40]);
    }
}
