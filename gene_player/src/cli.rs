//! Command-line flags.

use std::io::BufRead;
use std::path::PathBuf;

use tracing::warn;

use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::instruments;

pub const USAGE: &str = "\
Usage: gene_player [OPTIONS] [DNA]

With no DNA argument an interactive menu starts. Pass `-` to read the
sequence from stdin.

Options:
  --play              Play the melody on a MIDI output port
  --out <FILE>        Save the melody (default when --play is not given)
  --bpm <N>           Tempo, clamped to 60–240
  --program <P>       Instrument: program 0–127 or a listed name
  --port <NAME>       Prefer an output port whose name contains NAME
  --config <FILE>     Read settings from a TOML file
  -h, --help          Show this help";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub dna:     Option<String>,
    pub play:    bool,
    pub out:     Option<PathBuf>,
    pub bpm:     Option<u32>,
    pub program: Option<u8>,
    pub port:    Option<String>,
    pub config:  Option<PathBuf>,
    pub help:    bool,
}

impl Options {
    /// Parse arguments, not including the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where I: IntoIterator<Item = String>
    {
        let mut opts = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "--play"        => opts.play = true,
                "--out"     => opts.out    = Some(value(&mut args, &arg)?.into()),
                "--config"  => opts.config = Some(value(&mut args, &arg)?.into()),
                "--port"    => opts.port   = Some(value(&mut args, &arg)?),
                "--bpm" => {
                    let v = value(&mut args, &arg)?;
                    let bpm = v.parse().map_err(|_| usage(format!("invalid --bpm value '{}'", v)))?;
                    opts.bpm = Some(bpm);
                }
                "--program" => {
                    let v = value(&mut args, &arg)?;
                    let p = instruments::parse_program(&v)
                        .ok_or_else(|| usage(format!("unknown instrument '{}'", v)))?;
                    opts.program = Some(p);
                }
                s if s.starts_with("--") => return Err(usage(format!("unknown flag '{}'", s))),
                other => {
                    if opts.dna.is_some() {
                        return Err(usage(format!("unexpected argument '{}'", other)));
                    }
                    opts.dna = Some(other.to_string());
                }
            }
        }
        Ok(opts)
    }

    /// Overlay the flags on `config`.
    pub fn apply(&self, mut config: PlayerConfig) -> PlayerConfig {
        if let Some(bpm) = self.bpm {
            config = config.with_bpm(bpm);
        }
        if let Some(program) = self.program {
            config.program = program;
        }
        if let Some(out) = &self.out {
            config.output = out.clone();
        }
        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }
        config
    }

    /// A one-shot run saves unless it only plays.
    pub fn should_save(&self) -> bool {
        self.out.is_some() || !self.play
    }
}

/// Read one line of a menu reply, keeping the newline.
///
/// End of input and read errors both come back empty. Errors are logged.
pub fn read_reply<R: BufRead>(mut input: R) -> String {
    let mut buf = String::new();
    if let Err(e) = input.read_line(&mut buf) {
        warn!("Failed to read stdin: {}", e);
        buf.clear();
    }
    buf
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next().ok_or_else(|| usage(format!("missing value for {}", flag)))
}

fn usage(msg: String) -> Error {
    Error::Usage(msg)
}
