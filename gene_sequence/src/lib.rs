//! # gene_sequence
//!
//! Turn a DNA string into an ordered list of [`NoteEvent`]s.
//!
//! Each base becomes exactly one note. Characters outside `A`, `T`, `C`,
//! and `G` (after upper-casing) are skipped, including whitespace, digits,
//! and IUPAC ambiguity codes such as `N`. Skipping is not an error. An
//! input with no bases yields an empty list, and the caller decides
//! whether that is acceptable.
//!
//! ```rust
//! use gene_sequence::translate;
//!
//! let pitches: Vec<u8> = translate("at-cg\n").iter().map(|n| n.pitch).collect();
//! assert_eq!(pitches, [60, 62, 64, 67]);
//! ```

use gene_midi::NoteEvent;

/// Velocity of every translated note.
pub const NOTE_VELOCITY: u8 = 100;

/// Ticks from each Note On to its Note Off.
///
/// Used as-is at every tempo.
pub const NOTE_TICKS: u32 = 200;

// ════════════════════════════════════════════════════════════════════════════
// Base — the four-letter alphabet
// ════════════════════════════════════════════════════════════════════════════

/// A DNA nucleotide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Base {
    A,
    T,
    C,
    G,
}

impl Base {
    pub const ALL: [Base; 4] = [Base::A, Base::T, Base::C, Base::G];

    /// Parse an upper-case base letter. Anything else is `None`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Base::A),
            'T' => Some(Base::T),
            'C' => Some(Base::C),
            'G' => Some(Base::G),
            _   => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::T => 'T',
            Base::C => 'C',
            Base::G => 'G',
        }
    }

    fn index(self) -> usize {
        match self {
            Base::A => 0,
            Base::T => 1,
            Base::C => 2,
            Base::G => 3,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PitchMap — Base → MIDI note number
// ════════════════════════════════════════════════════════════════════════════

/// Fixed mapping from [`Base`] to MIDI note number.
///
/// The standard map puts the bases on C major degrees from middle C:
/// A → C4 (60), T → D4 (62), C → E4 (64), G → G4 (67).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PitchMap {
    notes: [u8; 4],
}

impl PitchMap {
    pub const STANDARD: PitchMap = PitchMap { notes: [60, 62, 64, 67] };

    pub fn note_for(&self, base: Base) -> u8 {
        self.notes[base.index()]
    }
}

impl Default for PitchMap {
    fn default() -> Self { PitchMap::STANDARD }
}

// ════════════════════════════════════════════════════════════════════════════
// Translation
// ════════════════════════════════════════════════════════════════════════════

/// The bases of `raw`, in input order, case-insensitively.
pub fn bases(raw: &str) -> impl Iterator<Item = Base> + '_ {
    raw.chars()
        .flat_map(char::to_uppercase)
        .filter_map(Base::from_char)
}

/// `raw` reduced to its bases as an upper-case string, e.g. `"a t-g"` → `"ATG"`.
pub fn filter(raw: &str) -> String {
    bases(raw).map(Base::as_char).collect()
}

/// Translate `raw` with the standard [`PitchMap`].
pub fn translate(raw: &str) -> Vec<NoteEvent> {
    translate_with(raw, &PitchMap::STANDARD)
}

/// Translate `raw`, one [`NoteEvent`] per base, in input order.
pub fn translate_with(raw: &str, map: &PitchMap) -> Vec<NoteEvent> {
    bases(raw)
        .map(|b| NoteEvent::new(map.note_for(b), NOTE_VELOCITY, NOTE_TICKS))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
