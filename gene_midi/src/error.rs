//! Error types for the MIDI encoder.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A 7-bit data byte (program, pitch, velocity) was above 127.
    #[error("{field} {value} is out of range (0–127)")]
    Range { field: &'static str, value: u8 },

    /// The tempo cannot be written as a 24-bit microseconds-per-quarter value.
    #[error("tempo {0} BPM cannot be encoded")]
    Tempo(u32),

    #[error("variable-length quantity is truncated")]
    TruncatedVlq,

    #[error("variable-length quantity does not fit in 64 bits")]
    VlqOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
