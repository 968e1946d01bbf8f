//! Gene Melody Player: turn a DNA sequence into music.
//!
//! One-shot:     `gene_player GATTACA --bpm 90 --program flute --out gattaca.mid`
//! Interactive:  `gene_player`

use std::env;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use gene_player::cli::{read_reply, Options, USAGE};
use gene_player::config::{clamp_bpm, MAX_BPM, MIN_BPM};
use gene_player::instruments::{self, INSTRUMENTS};
use gene_player::{download, playback, render, PlayerConfig, Result};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let opts = match Options::parse(env::args().skip(1)) {
        Ok(o)  => o,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            process::exit(2);
        }
    };
    if opts.help {
        println!("{}", USAGE);
        return;
    }

    let config = match load_config(&opts) {
        Ok(c)  => opts.apply(c),
        Err(e) => {
            eprintln!("  ⚠  {}", e);
            process::exit(2);
        }
    };

    let result = match opts.dna.as_deref() {
        Some("-") => read_stdin().and_then(|dna| one_shot(&dna, &opts, &config)),
        Some(dna) => one_shot(dna, &opts, &config),
        None      => { interactive(config); Ok(()) }
    };
    if let Err(e) = result {
        eprintln!("  ⚠  {}", e);
        process::exit(1);
    }
}

fn load_config(opts: &Options) -> Result<PlayerConfig> {
    match &opts.config {
        Some(path) => PlayerConfig::load(path),
        None       => PlayerConfig::load_or_default(&env::current_dir()?),
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn one_shot(dna: &str, opts: &Options, config: &PlayerConfig) -> Result<()> {
    let rendered = render(dna, config)?;

    if opts.play {
        play(&rendered.midi, config);
    }
    if opts.should_save() {
        let path = download::save(&rendered.midi, &config.output)?;
        println!("  ✓  Written {} notes to '{}'", rendered.bases, path.display());
    }
    Ok(())
}

/// Play, reporting failure as a warning only.
fn play(midi: &gene_midi::MidiBuffer, config: &PlayerConfig) {
    println!("  Playing music… 🎧");
    match playback::play_bytes(midi.as_bytes(), config.port.as_deref()) {
        Ok(())  => println!("  ✓  Done."),
        Err(e)  => {
            tracing::warn!("Playback error: {}", e);
            println!("  ⚠  Playback error: {}", e);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Interactive menu
// ════════════════════════════════════════════════════════════════════════════

fn interactive(mut config: PlayerConfig) {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                  Gene Melody Player                      ║");
    println!("║          Turn your DNA sequence into music 🎼            ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let mut dna = String::new();

    loop {
        println!("  Sequence: {} bases | Tempo: {} BPM | Instrument: {} ({})",
            gene_sequence::filter(&dna).len(), config.bpm,
            instruments::name_for(config.program), config.program);
        println!();
        println!("  Main menu:");
        println!("    1. Enter DNA sequence (A, T, C, G only)");
        println!("    2. Tempo (BPM)");
        println!("    3. Instrument");
        println!("    4. ▶  Play DNA music");
        println!("    5. 💾 Download MIDI file");
        println!("    q. Quit");
        println!();

        let choice = read_line("Choice: ");
        if choice.is_empty() {
            // stdin closed
            break;
        }
        match choice.trim() {
            "1" => dna = read_line("  DNA sequence: "),
            "2" => config.bpm = pick_tempo(config.bpm),
            "3" => config.program = pick_instrument(config.program),
            "4" => match render(&dna, &config) {
                Ok(r)  => play(&r.midi, &config),
                Err(e) => println!("  ⚠  {}", e),
            },
            "5" => download_menu(&dna, &config),
            "q" | "quit" => { println!("\n  Made with ❤️  to turn genes into symphonies\n"); break; }
            _   => println!("  ⚠  Enter 1–5 or q."),
        }
        println!();
    }
}

fn pick_tempo(current: u32) -> u32 {
    let prompt = format!("  Tempo BPM ({}–{}, default {}): ", MIN_BPM, MAX_BPM, current);
    let bpm = read_line(&prompt).trim().parse().unwrap_or(current);
    clamp_bpm(bpm)
}

fn pick_instrument(current: u8) -> u8 {
    println!("  Instruments:");
    for (i, inst) in INSTRUMENTS.iter().enumerate() {
        println!("    {}. {}", i + 1, inst);
    }
    let choice = read_line(&format!("  Choice (1–{}, a name, or a program 0–127; default {}): ",
        INSTRUMENTS.len(), current));
    let choice = choice.trim();
    if choice.is_empty() {
        return current;
    }
    // List numbers take precedence over raw program numbers 1–8.
    if let Some(inst) = choice.parse::<usize>().ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| INSTRUMENTS.get(i))
    {
        return inst.program;
    }
    match instruments::parse_label(choice).or_else(|| instruments::parse_program(choice)) {
        Some(p) => p,
        None    => { println!("  ⚠  Unknown instrument, keeping {}.", current); current }
    }
}

fn download_menu(dna: &str, config: &PlayerConfig) {
    let rendered = match render(dna, config) {
        Ok(r)  => r,
        Err(e) => { println!("  ⚠  {}", e); return; }
    };
    let prompt = format!("  Output filename (default: {}): ", config.output.display());
    let name = read_line(&prompt).trim().to_string();
    let path = if name.is_empty() { config.output.clone() } else { PathBuf::from(name) };

    match download::save(&rendered.midi, &path) {
        Ok(p)  => println!("\n  ✓  Written {} notes to '{}'", rendered.bases, p.display()),
        Err(e) => println!("  ⚠  File error: {}", e),
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    read_reply(io::stdin().lock())
}
