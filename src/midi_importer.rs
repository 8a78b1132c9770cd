use crate::model::performance::*;
use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DEFAULT_MPQN: u32 = 500_000;
const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;
const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

struct NoteInterval {
    pub midi: u8,
    pub start_tick: u64,
    pub end_tick: u64,
}

#[derive(Debug, Clone)]
struct TempoSegment {
    pub mpqn: u32,
    pub start_tick: u64,
    pub seconds_at_start: f64,
}

/// How absolute ticks turn into seconds for a given file.
enum TickClock {
    Metrical {
        ticks_per_quarter: u64,
        segments: Vec<TempoSegment>,
    },
    Timecode {
        ticks_per_second: f64,
    },
}

impl TickClock {
    fn seconds(&self, tick: u64) -> f64 {
        match self {
            TickClock::Timecode { ticks_per_second } => tick as f64 / ticks_per_second,
            TickClock::Metrical {
                ticks_per_quarter,
                segments,
            } => {
                let Some(segment) = segments
                    .iter()
                    .rfind(|seg| seg.start_tick <= tick)
                    .or(segments.first())
                else {
                    return tick as f64 * DEFAULT_MPQN as f64
                        / (*ticks_per_quarter as f64)
                        / MICROSECONDS_PER_SECOND;
                };

                let delta_ticks = tick.saturating_sub(segment.start_tick) as f64;
                segment.seconds_at_start
                    + delta_ticks * (segment.mpqn as f64)
                        / (*ticks_per_quarter as f64)
                        / MICROSECONDS_PER_SECOND
            }
        }
    }
}

/// Load a performance from disk: `.json` files hold a decoded performance, anything else is read as a MIDI file.
pub fn import_performance_file<P: AsRef<Path>>(path: P) -> Result<Performance> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read performance JSON {}", path.display()))?;
        performance_from_json(&text)
    } else {
        import_midi_file(path)
    }
}

pub fn performance_from_json(text: &str) -> Result<Performance> {
    let performance: Performance =
        serde_json::from_str(text).map_err(|e| anyhow!("Failed to parse performance JSON: {}", e))?;

    debug!(
        "Loaded JSON performance with {} track(s) and {} note(s)..!",
        performance.tracks.len(),
        performance.note_count()
    );
    Ok(performance)
}

pub fn import_midi_file<P: AsRef<Path>>(path: P) -> Result<Performance> {
    let bytes = fs::read(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read MIDI file {}: {}",
            path.as_ref().display(),
            e
        )
    })?;

    let name = path
        .as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string());

    midi_bytes_to_performance(&bytes, name)
}

pub fn midi_bytes_to_performance(bytes: &[u8], name: Option<String>) -> Result<Performance> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("Failed to parse MIDI: {:?}", e))?;

    debug!(
        "MIDI format: {:?}, timing: {:?}, tracks: {}",
        smf.header.format,
        smf.header.timing,
        smf.tracks.len()
    );

    let mut tempo_changes: Vec<(u64, u32)> = Vec::new();
    tempo_changes.push((0u64, DEFAULT_MPQN)); // ~120bpm until a tempo meta appears

    let mut track_intervals: Vec<(Option<String>, Vec<NoteInterval>)> = Vec::new();
    let mut last_tick_estimate: u64 = 0;

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut abs_tick: u64 = 0;
        let mut track_name: Option<String> = None;
        let mut intervals: Vec<NoteInterval> = Vec::new();
        let mut open_notes: HashMap<(u8, u8), Vec<u64>> = HashMap::new();

        for event in track.iter() {
            abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);

            match &event.kind {
                TrackEventKind::Meta(meta) => match meta {
                    MetaMessage::Tempo(micro) => {
                        let mpqn: u32 = micro.as_int();
                        tempo_changes.push((abs_tick, mpqn));
                        debug!(
                            "Tempo change at tick {} -> {} us/qn (track {})",
                            abs_tick, mpqn, track_idx
                        );
                    }
                    MetaMessage::TrackName(bytes) => {
                        if track_name.is_none() {
                            let name = String::from_utf8_lossy(bytes).trim().to_string();
                            debug!("Track {} name: {}", track_idx, name);
                            track_name = Some(name).filter(|n| !n.is_empty());
                        }
                    }
                    _ => {}
                },
                TrackEventKind::Midi { channel, message } => {
                    let ch: u8 = channel.as_int();

                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            open_notes
                                .entry((ch, key.as_int()))
                                .or_default()
                                .push(abs_tick);
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            close_note(&mut open_notes, &mut intervals, ch, key.as_int(), abs_tick);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        last_tick_estimate = last_tick_estimate.max(abs_tick);

        for ((ch, key), stack) in open_notes.into_iter() {
            for start_tick in stack {
                let end_tick = abs_tick.max(start_tick + 1);
                warn!(
                    "Unclosed NoteOn for {}, channel: {} at tick: {} auto-closing at: {}..!",
                    key, ch, start_tick, end_tick
                );
                intervals.push(NoteInterval {
                    midi: key,
                    start_tick,
                    end_tick,
                });
            }
        }

        if intervals.is_empty() {
            debug!("Track {} holds no notes, skipping..!", track_idx);
            continue;
        }

        intervals.sort_by_key(|interval| (interval.start_tick, interval.midi));
        track_intervals.push((track_name, intervals));
    }

    let (clock, ppq) = match smf.header.timing {
        Timing::Metrical(t) => {
            let ticks_per_quarter = t.as_int() as u64;
            debug!("Ticks per quarter note: {}", ticks_per_quarter);
            (
                TickClock::Metrical {
                    ticks_per_quarter,
                    segments: tempo_segments(tempo_changes, ticks_per_quarter),
                },
                ticks_per_quarter as u32,
            )
        }
        Timing::Timecode(fps, subframe) => {
            let ticks_per_second = fps.as_f32() as f64 * subframe as f64;
            info!(
                "SMPTE timecode timing ({} ticks/s), notating with the default {} ppq..!",
                ticks_per_second, DEFAULT_PPQ
            );
            (TickClock::Timecode { ticks_per_second }, DEFAULT_PPQ)
        }
    };

    if ppq == 0 || matches!(clock, TickClock::Timecode { ticks_per_second } if ticks_per_second <= 0.0) {
        return Err(anyhow!("MIDI header declares a zero time division..!"));
    }

    let tempos = match &clock {
        // the first segment was built from our default mpqn
        TickClock::Metrical { segments, .. } => segments
            .iter()
            .skip(1)
            .map(|seg| TempoMark {
                bpm: MICROSECONDS_PER_MINUTE / (seg.mpqn as f64),
                time: seg.seconds_at_start,
            })
            .collect(),
        TickClock::Timecode { .. } => Vec::new(),
    };

    let mut tracks: Vec<Track> = Vec::new();
    for (track_name, intervals) in track_intervals.into_iter() {
        let mut notes: Vec<NoteEvent> = Vec::new();

        for interval in intervals.into_iter() {
            let start = clock.seconds(interval.start_tick);
            let end = clock.seconds(interval.end_tick);

            if end <= start {
                debug!(
                    "Skipping zero/negative duration midi note {}, start: {} end: {}..!",
                    interval.midi, start, end
                );
                continue;
            }

            notes.push(NoteEvent {
                pitch: interval.midi,
                start_time: start,
                duration: end - start,
            });
        }

        tracks.push(Track {
            name: track_name,
            notes,
        });
    }

    let performance = Performance {
        header: Header { name, ppq, tempos },
        tracks,
    };

    info!(
        "Imported {} note(s) across {} track(s), last tick {}..!",
        performance.note_count(),
        performance.tracks.len(),
        last_tick_estimate
    );

    Ok(performance)
}

fn tempo_segments(mut tempo_changes: Vec<(u64, u32)>, ticks_per_quarter: u64) -> Vec<TempoSegment> {
    let mut last_tick: u64 = 0;
    let mut seconds_accum: f64 = 0.0;
    let mut last_mpqn: u32 = DEFAULT_MPQN;
    let mut segments: Vec<TempoSegment> = Vec::new();

    tempo_changes.sort_by_key(|(tick, _)| *tick);

    for (tick, mpqn) in tempo_changes.into_iter() {
        if tick > last_tick {
            let delta_ticks = (tick - last_tick) as f64;
            seconds_accum +=
                delta_ticks * (last_mpqn as f64) / (ticks_per_quarter as f64) / MICROSECONDS_PER_SECOND;
        }

        segments.push(TempoSegment {
            start_tick: tick,
            mpqn,
            seconds_at_start: seconds_accum,
        });

        last_tick = tick;
        last_mpqn = mpqn;
    }

    segments
}

fn close_note(
    open_notes: &mut HashMap<(u8, u8), Vec<u64>>,
    intervals: &mut Vec<NoteInterval>,
    ch: u8,
    midi_num: u8,
    abs_tick: u64,
) {
    if let Some(start_tick) = open_notes.get_mut(&(ch, midi_num)).and_then(|stack| stack.pop()) {
        intervals.push(NoteInterval {
            midi: midi_num,
            start_tick,
            end_tick: abs_tick,
        });
    } else {
        debug!(
            "Orphaned NoteOff for {} ch{} at tick {}..!",
            midi_num, ch, abs_tick
        );
    }
}
