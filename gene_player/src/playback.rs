//! Real-time playback of an encoded melody on a MIDI output port.
//!
//! The buffer is read back with `midly`, flattened into a schedule of
//! channel messages at absolute times, and sent to a [`MidiOut`] sink with
//! sleeps between them.

use std::thread;
use std::time::{Duration, Instant};

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Tempo assumed until the first Set Tempo event (120 BPM).
const DEFAULT_MICROS_PER_QUARTER: u64 = 500_000;

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / test sinks
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut {
    fn program_change(&mut self, channel: u8, program: u8) -> Result<()>;
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8) -> Result<()>;
    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()>;
}

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) -> Result<()> {
        Ok(self.conn.send(&[0xC0 | (channel & 0x0F), program])?)
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        Ok(self.conn.send(&[0x90 | (channel & 0x0F), note, velocity])?)
    }
    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        Ok(self.conn.send(&[0x80 | (channel & 0x0F), note, velocity])?)
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

pub struct NullOut;

impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8) -> Result<()>         { Ok(()) }
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8) -> Result<()>        { Ok(()) }
    fn note_off(&mut self, _ch: u8, _n: u8, _v: u8) -> Result<()>       { Ok(()) }
}

/// Substrings of port names that usually belong to a General MIDI synth.
const SYNTH_HINTS: [&str; 5] = ["fluid", "timidity", "microsoft", "gm", "synth"];

/// Open a MIDI output port.
///
/// A port whose name contains `hint` wins. Failing that, a port that looks
/// like a software synth. Failing that, the first port.
pub fn open_output(hint: Option<&str>) -> Result<MidirOut> {
    let midi_out = midir::MidiOutput::new("gene_player")?;

    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    let idx = choose_port(&names, hint).ok_or_else(|| Error::MidiPort(
        "no MIDI output ports found".to_string()
    ))?;

    info!("Opening MIDI port: {}", names[idx]);
    let conn = midi_out.connect(&ports[idx], "gene-play")?;
    Ok(MidirOut { conn })
}

/// Use the opened port, or fall back to [`NullOut`] with a warning.
pub fn port_or_null(port: Result<MidirOut>) -> Box<dyn MidiOut> {
    match port {
        Ok(p)  => Box::new(p),
        Err(e) => {
            warn!("{}; using null output", e);
            warn!("Start a software synth such as `timidity -iA` or `fluidsynth`");
            Box::new(NullOut)
        }
    }
}

fn choose_port(names: &[String], hint: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    let lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let find = |needle: &str| lower.iter().position(|n| n.contains(needle));

    hint.map(str::to_lowercase)
        .and_then(|h| find(&h))
        .or_else(|| SYNTH_HINTS.iter().find_map(|h| find(h)))
        .or(Some(0))
}

// ════════════════════════════════════════════════════════════════════════════
// Schedule — SMF bytes → timed channel messages
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    ProgramChange { channel: u8, program: u8 },
    NoteOn  { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedMessage {
    /// Microseconds from the start of playback.
    pub at_micros: u64,
    pub message:   Message,
}

/// Every playable message of a MIDI file, in time order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    pub messages:        Vec<TimedMessage>,
    /// Time of the last event, End of Track included.
    pub duration_micros: u64,
}

impl Schedule {
    /// Parse an SMF. Only metrical timing is supported.
    ///
    /// Set Tempo events take effect from their own tick onward within the
    /// track they appear in.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes)?;
        let tpq = match smf.header.timing {
            Timing::Metrical(t) if t.as_int() > 0 => u64::from(t.as_int()),
            _ => return Err(Error::MidiUnsupportedTiming),
        };

        let mut messages = Vec::new();
        let mut duration_micros = 0;

        for track in &smf.tracks {
            let mut tick: u64 = 0;
            // Tempo segment start: (tick, micros) and its tempo.
            let mut seg_tick:   u64 = 0;
            let mut seg_micros: u64 = 0;
            let mut tempo = DEFAULT_MICROS_PER_QUARTER;

            for ev in track {
                tick += u64::from(ev.delta.as_int());
                let at_micros = seg_micros + ticks_to_micros(tick - seg_tick, tpq, tempo);
                duration_micros = duration_micros.max(at_micros);

                match ev.kind {
                    TrackEventKind::Midi { channel, message } => {
                        let channel = channel.as_int();
                        let message = match message {
                            MidiMessage::ProgramChange { program } => {
                                Message::ProgramChange { channel, program: program.as_int() }
                            }
                            // Note On with velocity 0 is a Note Off.
                            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => {
                                Message::NoteOff { channel, note: key.as_int(), velocity: 0 }
                            }
                            MidiMessage::NoteOn { key, vel } => {
                                Message::NoteOn { channel, note: key.as_int(), velocity: vel.as_int() }
                            }
                            MidiMessage::NoteOff { key, vel } => {
                                Message::NoteOff { channel, note: key.as_int(), velocity: vel.as_int() }
                            }
                            _ => continue,
                        };
                        messages.push(TimedMessage { at_micros, message });
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(t)) => {
                        seg_tick   = tick;
                        seg_micros = at_micros;
                        tempo      = u64::from(t.as_int());
                    }
                    _ => {}
                }
            }
        }

        // Stable, so same-time events keep file order (Note Off before the next Note On).
        messages.sort_by_key(|m| m.at_micros);

        debug!(
            "Scheduled {} messages over {:.2}s",
            messages.len(),
            duration_micros as f64 / 1_000_000.0
        );

        Ok(Schedule { messages, duration_micros })
    }
}

/// Convert ticks to microseconds at `micros_per_quarter`.
fn ticks_to_micros(ticks: u64, tpq: u64, micros_per_quarter: u64) -> u64 {
    // u128 so long files at slow tempos cannot overflow.
    (u128::from(ticks) * u128::from(micros_per_quarter) / u128::from(tpq.max(1))) as u64
}

// ════════════════════════════════════════════════════════════════════════════
// play — send a schedule in real time
// ════════════════════════════════════════════════════════════════════════════

/// Send every message in `schedule` to `out` at its scheduled time.
///
/// Blocks until the last message has been sent. If sending fails, notes
/// already started are released before the error is returned.
pub fn play(schedule: &Schedule, out: &mut dyn MidiOut) -> Result<()> {
    let start = Instant::now();
    let mut sounding: Vec<(u8, u8)> = Vec::new();

    for tm in &schedule.messages {
        let due = start + Duration::from_micros(tm.at_micros);
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }

        if let Err(e) = send(out, tm.message, &mut sounding) {
            for (channel, note) in sounding.drain(..) {
                let _ = out.note_off(channel, note, 0);
            }
            return Err(e);
        }
    }
    Ok(())
}

fn send(out: &mut dyn MidiOut, message: Message, sounding: &mut Vec<(u8, u8)>) -> Result<()> {
    match message {
        Message::ProgramChange { channel, program } => out.program_change(channel, program),
        Message::NoteOn { channel, note, velocity } => {
            out.note_on(channel, note, velocity)?;
            sounding.push((channel, note));
            Ok(())
        }
        Message::NoteOff { channel, note, velocity } => {
            out.note_off(channel, note, velocity)?;
            sounding.retain(|&s| s != (channel, note));
            Ok(())
        }
    }
}

/// Parse `bytes`, open an output port, and play to the end.
///
/// Without a usable port the schedule runs against [`NullOut`].
pub fn play_bytes(bytes: &[u8], port_hint: Option<&str>) -> Result<()> {
    let schedule = Schedule::parse(bytes)?;
    let mut out = port_or_null(open_output(port_hint));
    info!("Playing {} messages", schedule.messages.len());
    play(&schedule, out.as_mut())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
