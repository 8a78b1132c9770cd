use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "midiscore",
    about = "Convert a MIDI file into a MusicXML score!"
)]
pub struct Args {
    /// Path to the source MIDI file (or a decoded performance `.json`).
    pub input: PathBuf,

    /// Where to write the MusicXML. Defaults to the input path with a `.musicxml` extension.
    pub output: Option<PathBuf>,

    /// Division units per quarter note. Defaults to the source file's ppq.
    #[arg(short, long)]
    pub divisions: Option<u32>,

    /// Tempo used to turn seconds into quarter notes. Defaults to the source file's first tempo.
    #[arg(short, long)]
    pub bpm: Option<f64>,

    /// Which track to notate: `all` merges every track, or a zero-based track index.
    #[arg(short, long, default_value = "all")]
    pub track: String,

    /// Title written into the score header.
    #[arg(long)]
    pub title: Option<String>,

    /// Print the MusicXML to stdout instead of writing a file.
    #[arg(long, default_value_t = false)]
    pub stdout: bool,

    /// Dry run (log a summary of every measure and exit without writing).
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
