pub mod partitioner;
pub mod pitch;
pub mod quantizer;
pub mod timeline;

use crate::error::ScoreError;
use crate::model::performance::{DEFAULT_PPQ, NoteEvent, Performance, Track};
use crate::model::score::{NoteId, Pitch, Score};
use crate::notation::partitioner::{PendingNote, Partitioner};
use crate::notation::pitch::encode_pitch;
use crate::notation::quantizer::tolerance;
use crate::notation::timeline::{INSTANT_EPSILON, Timeline, is_sounding, starts_at};
use log::{debug, info, warn};

pub const DEFAULT_PART_NAME: &str = "Music";

/// How note times map onto quarter notes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeBase {
    /// Times are seconds and one quarter note lasts `quarter_seconds`.
    Seconds { quarter_seconds: f64 },
    /// Times are MIDI ticks at `ppq` ticks per quarter note.
    Ticks { ppq: u32 },
}

impl TimeBase {
    pub fn from_bpm(bpm: f64) -> Self {
        TimeBase::Seconds {
            quarter_seconds: 60.0 / bpm,
        }
    }

    fn quarters_per_unit(&self) -> Result<f64, ScoreError> {
        match *self {
            TimeBase::Seconds { quarter_seconds } if quarter_seconds.is_finite() && quarter_seconds > 0.0 => {
                Ok(1.0 / quarter_seconds)
            }
            TimeBase::Seconds { quarter_seconds } => Err(ScoreError::InvalidTimeBase(format!(
                "a quarter note cannot last {} second(s)",
                quarter_seconds
            ))),
            TimeBase::Ticks { ppq: 0 } => Err(ScoreError::InvalidTimeBase(
                "ticks per quarter note must be positive".into(),
            )),
            TimeBase::Ticks { ppq } => Ok(1.0 / ppq as f64),
        }
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        TimeBase::Seconds {
            quarter_seconds: 1.0,
        }
    }
}

/// Which notes of a performance end up on the staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackSelection {
    #[default]
    All,
    Index(usize),
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub divisions: u32,
    pub time_base: TimeBase,
    pub track: TrackSelection,
    pub title: Option<String>,
    pub part_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            divisions: DEFAULT_PPQ,
            time_base: TimeBase::default(),
            track: TrackSelection::All,
            title: None,
            part_name: DEFAULT_PART_NAME.into(),
        }
    }
}

/// Converts times into division units; every quantity is rounded exactly once.
#[derive(Debug, Clone, Copy)]
struct UnitScale(f64);

impl UnitScale {
    fn units(&self, time: f64) -> u32 {
        (time * self.0).round().max(0.0) as u32
    }

    fn span(&self, t0: f64, t1: f64) -> u32 {
        self.units(t1).saturating_sub(self.units(t0))
    }
}

fn selected_tracks<'a>(performance: &'a Performance, selection: TrackSelection) -> Result<Vec<&'a Track>, ScoreError> {
    match selection {
        TrackSelection::All => Ok(performance.tracks.iter().collect()),
        TrackSelection::Index(index) => performance
            .tracks
            .get(index)
            .map(|track| vec![track])
            .ok_or(ScoreError::TrackOutOfRange {
                index,
                count: performance.tracks.len(),
            }),
    }
}

fn is_playable(note: &NoteEvent) -> bool {
    note.start_time.is_finite() && note.start_time >= 0.0 && note.duration.is_finite() && note.duration > 0.0
}

/// Turn a performance into measures of notes and rests in a single forward pass.
///
/// The timeline is built from every track so that silences line up with the whole performance, while
/// only the selected track(s) produce notes. Notes are written when they start, for their full length;
/// a note that starts while another is still held is appended after it rather than layered.
pub fn convert(performance: &Performance, options: &ConvertOptions) -> Result<Score, ScoreError> {
    if options.divisions == 0 {
        return Err(ScoreError::InvalidDivisions(options.divisions));
    }

    let scale = UnitScale(options.divisions as f64 * options.time_base.quarters_per_unit()?);
    let tol = tolerance(options.divisions);

    let mut notes: Vec<PendingEvent> = Vec::new();
    for track in selected_tracks(performance, options.track)? {
        for note in track.notes.iter() {
            if !is_playable(note) {
                warn!(
                    "Skipping note {} with start {} and duration {}..!",
                    note.pitch, note.start_time, note.duration
                );
                continue;
            }

            let units = scale.units(note.duration);
            if units == 0 {
                warn!(
                    "Skipping note {} at {:.6}, too short to notate at {} divisions..!",
                    note.pitch, note.start_time, options.divisions
                );
                continue;
            }

            notes.push(PendingEvent {
                id: NoteId(notes.len()),
                event: *note,
                units,
                pitch: encode_pitch(note.pitch)?,
            });
        }
    }

    let mut partitioner = Partitioner::new(options.divisions);

    if notes.is_empty() {
        warn!("No notes to convert, writing a single measure of rest..!");
    } else {
        let timeline = Timeline::build(performance.tracks.iter());
        debug!(
            "Converting {} note(s) over {} timeline instant(s)..!",
            notes.len(),
            timeline.instants().len()
        );

        let mut pending_rest: u32 = timeline.first().map(|first| scale.span(0.0, first)).unwrap_or(0);

        let mut order: Vec<usize> = (0..notes.len()).collect();
        order.sort_by(|&a, &b| notes[a].event.start_time.total_cmp(&notes[b].event.start_time));
        let mut next = 0;
        let mut active: Vec<usize> = Vec::new();

        for (t0, t1) in timeline.intervals() {
            let mut starting: Vec<PendingNote> = Vec::new();
            while let Some(&i) = order.get(next) {
                let note = &notes[i];
                if note.event.start_time >= t0 + INSTANT_EPSILON {
                    break;
                }
                if !starts_at(&note.event, t0) {
                    debug!(
                        "Note {} at {:.6} fell between instants, writing it at {:.6}..!",
                        note.event.pitch, note.event.start_time, t0
                    );
                }
                starting.push(note.pending());
                active.push(i);
                next += 1;
            }
            active.retain(|&i| is_sounding(&notes[i].event, t0));

            if !starting.is_empty() {
                if pending_rest > 0 {
                    partitioner.push_rest(pending_rest);
                    pending_rest = 0;
                }
                partitioner.push_chord(&starting);
                continue;
            }

            if !active.is_empty() {
                continue;
            }

            let span = scale.span(t0, t1);
            if span <= tol {
                debug!("Skipping {} unit(s) of silence at {:.6}..!", span, t0);
                continue;
            }
            pending_rest += span;
        }

        // other tracks may keep playing after the selected one stops
        partitioner.push_rest(pending_rest);
    }

    let measures = partitioner.finish();
    info!(
        "Converted {} note(s) into {} measure(s)..!",
        notes.len(),
        measures.len()
    );

    Ok(Score {
        title: options.title.clone(),
        part_name: options.part_name.clone(),
        divisions: options.divisions,
        measures,
    })
}

#[derive(Debug, Clone, Copy)]
struct PendingEvent {
    id: NoteId,
    event: NoteEvent,
    units: u32,
    pitch: Pitch,
}

impl PendingEvent {
    fn pending(&self) -> PendingNote {
        PendingNote {
            id: self.id,
            pitch: self.pitch,
            units: self.units,
        }
    }
}
