use crate::error::ScoreError;
use crate::model::score::{Pitch, Step};

/// Chromatic spelling of each pitch class, sharps preferred.
const PITCH_CLASSES: [(Step, i8); 12] = [
    (Step::C, 0),
    (Step::C, 1),
    (Step::D, 0),
    (Step::D, 1),
    (Step::E, 0),
    (Step::F, 0),
    (Step::F, 1),
    (Step::G, 0),
    (Step::G, 1),
    (Step::A, 0),
    (Step::A, 1),
    (Step::B, 0),
];

/// Spell a MIDI note number as step, alteration and octave (middle C, 60, is C4).
///
/// Pitches above 127 are rejected instead of clamped, since the decoder is expected to never produce them.
pub fn encode_pitch(midi: u8) -> Result<Pitch, ScoreError> {
    if midi > 127 {
        return Err(ScoreError::OutOfRangePitch { pitch: midi });
    }

    let (step, alter) = PITCH_CLASSES[(midi % 12) as usize];
    Ok(Pitch {
        step,
        alter,
        octave: (midi / 12) as i8 - 1,
    })
}
