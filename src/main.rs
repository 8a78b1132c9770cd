use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use midiscore::{
    Args, ConvertOptions, DEFAULT_PART_NAME, TimeBase, TrackSelection, convert,
    default_output_path, describe_measure, import_performance_file, parse_track_selection,
    to_musicxml,
};
use std::fs;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Importing performance: '{}'...", args.input.display());
    let performance = import_performance_file(&args.input)?;

    let bpm = args.bpm.unwrap_or_else(|| performance.header.initial_bpm());
    let track = parse_track_selection(&args.track);
    let part_name = match track {
        TrackSelection::Index(index) => performance
            .tracks
            .get(index)
            .and_then(|t| t.name.clone()),
        TrackSelection::All => None,
    }
    .unwrap_or_else(|| DEFAULT_PART_NAME.to_string());

    let options = ConvertOptions {
        divisions: args.divisions.unwrap_or(performance.header.ppq),
        time_base: TimeBase::from_bpm(bpm),
        track,
        title: args.title.clone().or_else(|| performance.header.name.clone()),
        part_name,
    };

    debug!(
        "Converting {} note(s) at {} divisions and {:.3} bpm, track: {:?}..!",
        performance.note_count(),
        options.divisions,
        bpm,
        options.track
    );

    let score = convert(&performance, &options)
        .with_context(|| format!("Failed to convert '{}'", args.input.display()))?;

    if args.dry_run {
        for measure in score.measures.iter() {
            info!("{}", describe_measure(measure));
        }
        return Ok(());
    }

    let xml = to_musicxml(&score);

    if args.stdout {
        print!("{}", xml);
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    fs::write(&output, &xml)
        .with_context(|| format!("Failed to write MusicXML to '{}'", output.display()))?;
    info!(
        "Wrote {} measure(s) to '{}'..!",
        score.measures.len(),
        output.display()
    );

    Ok(())
}
