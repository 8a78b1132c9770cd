use crate::model::performance::{NoteEvent, Track};
use std::collections::BTreeSet;

/// Fractional digits kept when normalizing instants; events closer than this collapse together.
pub const INSTANT_PRECISION_DIGITS: i32 = 6;
/// Matching window for "starts at" and "sounds at" checks against a normalized instant.
pub const INSTANT_EPSILON: f64 = 1e-6;

fn instant_key(time: f64) -> i64 {
    (time * 10f64.powi(INSTANT_PRECISION_DIGITS)).round() as i64
}

fn key_instant(key: i64) -> f64 {
    key as f64 / 10f64.powi(INSTANT_PRECISION_DIGITS)
}

/// Every distinct start and end instant across a set of tracks, ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    instants: Vec<f64>,
}

impl Timeline {
    pub fn build<'a, I>(tracks: I) -> Self
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let keys: BTreeSet<i64> = tracks
            .into_iter()
            .flat_map(|track| track.notes.iter())
            .filter(|note| note.start_time.is_finite() && note.duration.is_finite())
            .flat_map(|note| [instant_key(note.start_time), instant_key(note.end_time())])
            .collect();

        Self {
            instants: keys.into_iter().map(key_instant).collect(),
        }
    }

    pub fn instants(&self) -> &[f64] {
        &self.instants
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.instants.first().copied()
    }

    /// Adjacent `(t0, t1)` pairs.
    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.instants.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

pub fn is_sounding(note: &NoteEvent, t0: f64) -> bool {
    note.start_time <= t0 + INSTANT_EPSILON && note.end_time() > t0 + INSTANT_EPSILON
}

pub fn starts_at(note: &NoteEvent, t0: f64) -> bool {
    (note.start_time - t0).abs() < INSTANT_EPSILON
}
