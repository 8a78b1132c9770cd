use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("MIDI pitch {pitch} is outside of the 0..=127 range")]
    OutOfRangePitch { pitch: u8 },

    #[error("Divisions per quarter note must be positive, got {0}")]
    InvalidDivisions(u32),

    #[error("Track {index} was requested but the performance only has {count} track(s)")]
    TrackOutOfRange { index: usize, count: usize },

    #[error("Invalid time base: {0}")]
    InvalidTimeBase(String),
}
