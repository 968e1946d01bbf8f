//! # gene_midi
//!
//! Encode a monophonic note sequence as a Standard MIDI File (Type 0,
//! single track).
//!
//! The track always has the same shape:
//!
//! * **Program Change** selecting the instrument
//! * **Set Tempo** meta-event
//! * one **Note On / Note Off** pair per [`NoteEvent`], strictly sequential
//! * **End of Track**
//!
//! No MIDI library is involved on the writing side. Bytes are produced
//! directly, and the track length is counted from the body it describes.
//!
//! ## Quick start
//!
//! ```rust
//! use gene_midi::{encode, NoteEvent, TrackDirective};
//!
//! let directive = TrackDirective::new(81, 120);     // Lead synth, 120 BPM
//! let notes = [60, 62, 64, 67].map(|p| NoteEvent::new(p, 100, 200));
//!
//! let midi = encode(&directive, &notes).unwrap();
//! assert_eq!(&midi.as_bytes()[0..4], b"MThd");
//! ```

mod error;

pub use error::{Error, Result};

use std::io::Write;
use tracing::debug;

/// Ticks per quarter note written into the header chunk.
///
/// Every delta-time in the track is interpreted against this resolution.
pub const DIVISION: u16 = 480;

/// MIME type of an encoded buffer.
pub const MIDI_MIME: &str = "audio/midi";

/// File extension (without the dot) for an encoded buffer.
pub const MIDI_EXTENSION: &str = "mid";

/// All channel messages go out on the first channel.
const CHANNEL: u8 = 0;

// Status bytes
const NOTE_OFF:       u8 = 0x80;
const NOTE_ON:        u8 = 0x90;
const PROGRAM_CHANGE: u8 = 0xC0;
const META:           u8 = 0xFF;

// Meta-event types
const META_TEMPO:        u8 = 0x51;
const META_END_OF_TRACK: u8 = 0x2F;

/// Largest value a 24-bit tempo field holds.
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

// ════════════════════════════════════════════════════════════════════════════
// NoteEvent — one sounding note
// ════════════════════════════════════════════════════════════════════════════

/// A single note: pitch, velocity, and how long it sounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoteEvent {
    /// MIDI note number (0–127).
    pub pitch:    u8,
    /// MIDI velocity (0–127), written on both Note On and Note Off.
    pub velocity: u8,
    /// Ticks between Note On and Note Off.
    pub duration: u32,
}

impl NoteEvent {
    pub fn new(pitch: u8, velocity: u8, duration: u32) -> Self {
        NoteEvent { pitch, velocity, duration }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackDirective — per-file settings
// ════════════════════════════════════════════════════════════════════════════

/// Instrument and tempo, fixed for the whole file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackDirective {
    /// General MIDI program number (0–127).
    pub program:   u8,
    /// Beats per minute.
    pub tempo_bpm: u32,
}

impl TrackDirective {
    pub fn new(program: u8, tempo_bpm: u32) -> Self {
        TrackDirective { program, tempo_bpm }
    }

    /// Microseconds per quarter note, `round(60_000_000 / bpm)`.
    ///
    /// Fails for 0 BPM, for tempos too slow to fit the 24-bit field
    /// (below 4 BPM), and for tempos so fast they round to 0 µs
    /// (above 120_000_000 BPM).
    pub fn micros_per_quarter(&self) -> Result<u32> {
        let bpm = self.tempo_bpm;
        if bpm == 0 {
            return Err(Error::Tempo(bpm));
        }
        let micros = (60_000_000 + bpm / 2) / bpm;
        if micros == 0 || micros > MAX_TEMPO_MICROS {
            return Err(Error::Tempo(bpm));
        }
        Ok(micros)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiBuffer — the finished file
// ════════════════════════════════════════════════════════════════════════════

/// The bytes of one complete Standard MIDI File.
///
/// Produced by [`encode`] and owned by the caller. The contents cannot be
/// changed after encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiBuffer {
    bytes: Vec<u8>,
}

impl MidiBuffer {
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }
    pub fn into_vec(self) -> Vec<u8> { self.bytes }
    pub fn len(&self) -> usize { self.bytes.len() }
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Write the file to any byte sink.
    pub fn write_to<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        w.write_all(&self.bytes)
    }
}

impl AsRef<[u8]> for MidiBuffer {
    fn as_ref(&self) -> &[u8] { &self.bytes }
}

// ════════════════════════════════════════════════════════════════════════════
// encode — directive + notes → SMF bytes
// ════════════════════════════════════════════════════════════════════════════

/// Serialise `events` under `directive` as a Type-0 MIDI file.
///
/// Notes are emitted in slice order and never overlap. Each Note On has
/// delta 0 and each Note Off follows it by the note's `duration`.
///
/// # Errors
///
/// * [`Error::Range`] if the program, a pitch, or a velocity exceeds 127.
/// * [`Error::Tempo`] if the tempo has no 24-bit representation.
pub fn encode(directive: &TrackDirective, events: &[NoteEvent]) -> Result<MidiBuffer> {
    let track = build_track_chunk(directive, events)?;

    let mut out = Vec::with_capacity(14 + 8 + track.len());
    // ── Header chunk ──────────────────────────────────────────────────────
    // MThd  length=6  format=0  ntrks=1  division
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // format 0
    out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
    out.extend_from_slice(&DIVISION.to_be_bytes());

    // ── Track chunk ───────────────────────────────────────────────────────
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(track.len() as u32).to_be_bytes());
    out.extend_from_slice(&track);

    debug!(
        notes = events.len(),
        program = directive.program,
        bpm = directive.tempo_bpm,
        bytes = out.len(),
        "encoded MIDI file"
    );

    Ok(MidiBuffer { bytes: out })
}

fn build_track_chunk(directive: &TrackDirective, events: &[NoteEvent]) -> Result<Vec<u8>> {
    let program = data_byte("program", directive.program)?;
    let micros  = directive.micros_per_quarter()?;

    // 3 (program) + 7 (tempo) + up to 13 per note + 4 (end of track)
    let mut t: Vec<u8> = Vec::with_capacity(14 + events.len() * 13);

    // ── Program Change (instrument) ───────────────────────────────────────
    t.push(0x00);
    t.push(PROGRAM_CHANGE | CHANNEL);
    t.push(program);

    // ── Tempo meta-event ──────────────────────────────────────────────────
    t.push(0x00);
    t.push(META);
    t.push(META_TEMPO);
    t.push(0x03);
    t.extend_from_slice(&micros.to_be_bytes()[1..]);

    // ── Note events ───────────────────────────────────────────────────────
    for note in events {
        let pitch    = data_byte("pitch", note.pitch)?;
        let velocity = data_byte("velocity", note.velocity)?;

        t.push(0x00);
        t.push(NOTE_ON | CHANNEL);
        t.push(pitch);
        t.push(velocity);

        write_vlq(&mut t, u64::from(note.duration));
        t.push(NOTE_OFF | CHANNEL);
        t.push(pitch);
        t.push(velocity);
    }

    // ── End of Track meta-event ───────────────────────────────────────────
    t.push(0x00);
    t.push(META);
    t.push(META_END_OF_TRACK);
    t.push(0x00);

    Ok(t)
}

/// Reject anything that would set the status bit of a data byte.
fn data_byte(field: &'static str, value: u8) -> Result<u8> {
    if value > 0x7F {
        return Err(Error::Range { field, value });
    }
    Ok(value)
}

// ════════════════════════════════════════════════════════════════════════════
// Variable-length quantities
// ════════════════════════════════════════════════════════════════════════════

/// Append `value` as a MIDI variable-length quantity.
///
/// Seven bits per byte, most significant group first. All bytes except
/// the last carry the continuation bit. Zero is the single byte `0x00`.
pub fn write_vlq(buf: &mut Vec<u8>, mut value: u64) {
    // 64 bits need at most ten 7-bit groups.
    let mut bytes = [0u8; 10];
    let mut i = bytes.len() - 1;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) as u8) | 0x80;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

/// Decode a variable-length quantity from the front of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
pub fn read_vlq(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if value > (u64::MAX >> 7) {
            return Err(Error::VlqOverflow);
        }
        value = (value << 7) | u64::from(b & 0x7F);
        if b & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::TruncatedVlq)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
    use proptest::prelude::*;

    fn atcg() -> Vec<NoteEvent> {
        [60, 62, 64, 67].iter().map(|&p| NoteEvent::new(p, 100, 200)).collect()
    }

    fn vlq(value: u64) -> Vec<u8> {
        let mut b = Vec::new();
        write_vlq(&mut b, value);
        b
    }

    // ── VLQ encoding ─────────────────────────────────────────────────────
    #[test]
    fn vlq_zero_is_single_byte() {
        assert_eq!(vlq(0), [0x00]);
    }

    #[test]
    fn vlq_single_byte() {
        assert_eq!(vlq(0x40), [0x40]);
        assert_eq!(vlq(127), [0x7F]);
    }

    #[test]
    fn vlq_two_bytes() {
        assert_eq!(vlq(128), [0x81, 0x00]);
        assert_eq!(vlq(200), [0x81, 0x48]);
        assert_eq!(vlq(16383), [0xFF, 0x7F]);
    }

    #[test]
    fn vlq_three_bytes() {
        assert_eq!(vlq(16384), [0x81, 0x80, 0x00]);
    }

    #[test]
    fn vlq_beyond_28_bits() {
        assert_eq!(vlq(0x1000_0000), [0x81, 0x80, 0x80, 0x80, 0x00]);
        assert_eq!(vlq(u64::MAX).len(), 10);
    }

    #[test]
    fn vlq_known_values_round_trip() {
        for n in [0u64, 127, 128, 16383, 16384] {
            let b = vlq(n);
            assert_eq!(read_vlq(&b).unwrap(), (n, b.len()));
        }
    }

    #[test]
    fn read_vlq_stops_at_last_byte() {
        // Trailing bytes belong to the next event.
        assert_eq!(read_vlq(&[0x81, 0x48, 0x80, 0x3C]).unwrap(), (200, 2));
    }

    #[test]
    fn read_vlq_truncated() {
        assert_eq!(read_vlq(&[]), Err(Error::TruncatedVlq));
        assert_eq!(read_vlq(&[0x81, 0x80]), Err(Error::TruncatedVlq));
    }

    #[test]
    fn read_vlq_overflow() {
        let mut b = vec![0xFF; 10];
        b.push(0x7F);
        assert_eq!(read_vlq(&b), Err(Error::VlqOverflow));
    }

    proptest! {
        #[test]
        fn vlq_round_trips(n in any::<u64>()) {
            let b = vlq(n);
            prop_assert_eq!(read_vlq(&b).unwrap(), (n, b.len()));
            // Continuation bit on every byte but the last.
            let (last, rest) = b.split_last().unwrap();
            prop_assert!(rest.iter().all(|x| x & 0x80 != 0));
            prop_assert_eq!(last & 0x80, 0);
        }
    }

    // ── Tempo ────────────────────────────────────────────────────────────
    #[test]
    fn tempo_120_bpm() {
        assert_eq!(TrackDirective::new(0, 120).micros_per_quarter().unwrap(), 500_000);
    }

    #[test]
    fn tempo_rounds_to_nearest() {
        // 60_000_000 / 7 = 8_571_428.57…
        assert_eq!(TrackDirective::new(0, 7).micros_per_quarter().unwrap(), 8_571_429);
        // 60_000_000 / 240 is exact
        assert_eq!(TrackDirective::new(0, 240).micros_per_quarter().unwrap(), 250_000);
    }

    #[test]
    fn tempo_limits() {
        assert_eq!(TrackDirective::new(0, 0).micros_per_quarter(), Err(Error::Tempo(0)));
        assert_eq!(TrackDirective::new(0, 3).micros_per_quarter(), Err(Error::Tempo(3)));
        assert_eq!(TrackDirective::new(0, 4).micros_per_quarter().unwrap(), 15_000_000);
        assert_eq!(TrackDirective::new(0, 120_000_000).micros_per_quarter().unwrap(), 1);
        assert_eq!(
            TrackDirective::new(0, 120_000_001).micros_per_quarter(),
            Err(Error::Tempo(120_000_001))
        );
    }

    #[test]
    fn zero_tempo_is_never_written() {
        let err = encode(&TrackDirective::new(0, u32::MAX), &[]).unwrap_err();
        assert_eq!(err, Error::Tempo(u32::MAX));
    }

    // ── File structure ───────────────────────────────────────────────────
    #[test]
    fn header_bytes() {
        let midi = encode(&TrackDirective::new(81, 120), &atcg()).unwrap();
        assert_eq!(
            &midi.as_bytes()[..14],
            &[0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]
        );
    }

    #[test]
    fn atcg_exact_bytes() {
        let midi = encode(&TrackDirective::new(81, 120), &atcg()).unwrap();

        let mut expected: Vec<u8> = vec![
            0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0,
            0x4D, 0x54, 0x72, 0x6B, 0, 0, 0, 50,
            0x00, 0xC0, 0x51,
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20,
        ];
        for p in [60u8, 62, 64, 67] {
            expected.extend_from_slice(&[0x00, 0x90, p, 100]);
            expected.extend_from_slice(&[0x81, 0x48, 0x80, p, 100]);
        }
        expected.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        assert_eq!(midi.as_bytes(), expected.as_slice());
    }

    #[test]
    fn track_length_matches_body() {
        for n in [0usize, 1, 7, 300] {
            let notes: Vec<NoteEvent> = (0..n)
                .map(|i| NoteEvent::new((i % 128) as u8, 100, (i * 97) as u32))
                .collect();
            let bytes = encode(&TrackDirective::new(0, 90), &notes).unwrap().into_vec();
            assert_eq!(&bytes[14..18], b"MTrk");
            let declared = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
            assert_eq!(declared as usize, bytes.len() - 22);
        }
    }

    #[test]
    fn ends_with_end_of_track() {
        let bytes = encode(&TrackDirective::new(0, 120), &atcg()).unwrap().into_vec();
        let n = bytes.len();
        assert_eq!(&bytes[n - 4..], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn empty_sequence_is_still_a_valid_file() {
        let bytes = encode(&TrackDirective::new(0, 120), &[]).unwrap().into_vec();
        assert_eq!(bytes.len(), 22 + 14);
        assert!(Smf::parse(&bytes).is_ok());
    }

    #[test]
    fn encoding_is_deterministic() {
        let d = TrackDirective::new(40, 133);
        assert_eq!(encode(&d, &atcg()).unwrap(), encode(&d, &atcg()).unwrap());
    }

    // ── Range checks ─────────────────────────────────────────────────────
    #[test]
    fn program_out_of_range() {
        let err = encode(&TrackDirective::new(128, 120), &atcg()).unwrap_err();
        assert_eq!(err, Error::Range { field: "program", value: 128 });
    }

    #[test]
    fn pitch_out_of_range() {
        let notes = [NoteEvent::new(60, 100, 200), NoteEvent::new(200, 100, 200)];
        let err = encode(&TrackDirective::new(0, 120), &notes).unwrap_err();
        assert_eq!(err, Error::Range { field: "pitch", value: 200 });
    }

    #[test]
    fn velocity_out_of_range() {
        let notes = [NoteEvent::new(60, 255, 200)];
        let err = encode(&TrackDirective::new(0, 120), &notes).unwrap_err();
        assert_eq!(err, Error::Range { field: "velocity", value: 255 });
    }

    #[test]
    fn boundary_values_accepted() {
        let notes = [NoteEvent::new(0, 0, 0), NoteEvent::new(127, 127, u32::MAX)];
        assert!(encode(&TrackDirective::new(127, 240), &notes).is_ok());
    }

    // ── Conformance against an independent reader ────────────────────────
    #[test]
    fn parses_with_midly() {
        let midi = encode(&TrackDirective::new(81, 120), &atcg()).unwrap();
        let smf = Smf::parse(midi.as_bytes()).unwrap();

        assert_eq!(smf.header.format, midly::Format::SingleTrack);
        match smf.header.timing {
            Timing::Metrical(t) => assert_eq!(t.as_int(), DIVISION),
            other => panic!("unexpected timing {:?}", other),
        }
        assert_eq!(smf.tracks.len(), 1);

        let mut programs = Vec::new();
        let mut tempos = Vec::new();
        let mut ons = Vec::new();
        let mut off_deltas = Vec::new();
        for ev in &smf.tracks[0] {
            match ev.kind {
                TrackEventKind::Midi { channel, message } => {
                    assert_eq!(channel.as_int(), 0);
                    match message {
                        MidiMessage::ProgramChange { program } => programs.push(program.as_int()),
                        MidiMessage::NoteOn { key, vel } => {
                            assert_eq!(ev.delta.as_int(), 0);
                            assert_eq!(vel.as_int(), 100);
                            ons.push(key.as_int());
                        }
                        MidiMessage::NoteOff { .. } => off_deltas.push(ev.delta.as_int()),
                        other => panic!("unexpected message {:?}", other),
                    }
                }
                TrackEventKind::Meta(MetaMessage::Tempo(t)) => tempos.push(t.as_int()),
                TrackEventKind::Meta(MetaMessage::EndOfTrack) => {}
                other => panic!("unexpected event {:?}", other),
            }
        }

        assert_eq!(programs, [0x51]);
        assert_eq!(tempos, [500_000]);
        assert_eq!(ons, [60, 62, 64, 67]);
        assert_eq!(off_deltas, [200; 4]);
    }

    #[test]
    fn long_durations_parse_with_midly() {
        // Largest delta-time an SMF reader accepts (28 bits).
        let notes = [NoteEvent::new(60, 100, 0x0FFF_FFFF), NoteEvent::new(62, 100, 16384)];
        let midi = encode(&TrackDirective::new(0, 60), &notes).unwrap();
        let smf = Smf::parse(midi.as_bytes()).unwrap();
        let deltas: Vec<u32> = smf.tracks[0].iter()
            .filter(|e| matches!(e.kind, TrackEventKind::Midi { message: MidiMessage::NoteOff { .. }, .. }))
            .map(|e| e.delta.as_int())
            .collect();
        assert_eq!(deltas, [0x0FFF_FFFF, 16384]);
    }

    #[test]
    fn write_to_sink() {
        let midi = encode(&TrackDirective::new(0, 120), &atcg()).unwrap();
        let mut sink = Vec::new();
        midi.write_to(&mut sink).unwrap();
        assert_eq!(sink, midi.as_bytes());
    }
}
