use crate::model::score::{Fragment, Measure};
use crate::notation::TrackSelection;
use log::info;
use std::path::{Path, PathBuf};

pub fn parse_track_selection(input: &str) -> TrackSelection {
    match input.trim().to_lowercase().as_str() {
        "a" | "all" | "merge" => TrackSelection::All,
        other => match other.parse::<usize>() {
            Ok(index) => TrackSelection::Index(index),
            Err(_) => {
                info!("Unknown track '{}', defaulting to `all`..!", other);
                TrackSelection::All
            }
        },
    }
}

pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("musicxml")
}

/// One line per measure, e.g. `#2 [C4~ 1920] [rest 480]`.
pub fn describe_measure(measure: &Measure) -> String {
    let mut line = format!("#{}", measure.number);

    for fragment in &measure.contents {
        let label = match fragment {
            Fragment::Rest(rest) => format!("rest {}", rest.duration.units),
            Fragment::Note(note) => format!(
                "{}{}{}{}{}{} {}",
                if note.chord { "+" } else { "" },
                if note.tie.stop { "~" } else { "" },
                note.pitch.step.as_str(),
                match note.pitch.alter {
                    1 => "#",
                    -1 => "b",
                    _ => "",
                },
                note.pitch.octave,
                if note.tie.start { "~" } else { "" },
                note.duration.units
            ),
        };
        line.push_str(&format!(" [{}]", label));
    }

    line
}
