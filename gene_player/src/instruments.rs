//! The instruments offered in the selector.
//!
//! This is display data only. The encoder accepts any program 0–127,
//! listed here or not.

use std::fmt;

/// A selectable General MIDI program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instrument {
    /// MIDI program number (0–127), as sent in Program Change.
    pub program: u8,
    pub name:    &'static str,
}

pub const INSTRUMENTS: [Instrument; 8] = [
    Instrument { program: 0,  name: "Acoustic Grand Piano" },
    Instrument { program: 40, name: "Violin" },
    Instrument { program: 41, name: "Viola" },
    Instrument { program: 56, name: "Trumpet" },
    Instrument { program: 60, name: "French Horn" },
    Instrument { program: 73, name: "Flute" },
    Instrument { program: 81, name: "Lead Synth" },
    Instrument { program: 89, name: "New Age Pad" },
];

/// Look up a listed instrument by program number.
pub fn by_program(program: u8) -> Option<&'static Instrument> {
    INSTRUMENTS.iter().find(|i| i.program == program)
}

/// Display name for `program`, or `"Program n"` if it is not listed.
pub fn name_for(program: u8) -> String {
    match by_program(program) {
        Some(i) => i.name.to_string(),
        None    => format!("Program {}", program),
    }
}

/// Recover the program number from a selector label such as
/// `"Lead Synth (81)"`.
pub fn parse_label(label: &str) -> Option<u8> {
    let (_, tail) = label.rsplit_once('(')?;
    tail.trim_end().strip_suffix(')')?.trim().parse().ok()
        .filter(|&n: &u8| n <= 127)
}

/// Parse a program given as a number (`"73"`) or a listed name
/// (`"flute"`, case-insensitive).
pub fn parse_program(s: &str) -> Option<u8> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return (n <= 127).then_some(n);
    }
    INSTRUMENTS.iter()
        .find(|i| i.name.eq_ignore_ascii_case(s))
        .map(|i| i.program)
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.program)
    }
}
