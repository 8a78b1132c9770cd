pub const BEATS_PER_MEASURE: u32 = 4;
pub const BEAT_TYPE: u32 = 4;

/// Notated note value, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteType {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl NoteType {
    pub const ALL: [NoteType; 6] = [
        NoteType::Whole,
        NoteType::Half,
        NoteType::Quarter,
        NoteType::Eighth,
        NoteType::Sixteenth,
        NoteType::ThirtySecond,
    ];

    /// Length of the plain (undotted) value in division units.
    pub fn units(self, divisions: u32) -> u32 {
        match self {
            NoteType::Whole => divisions * 4,
            NoteType::Half => divisions * 2,
            NoteType::Quarter => divisions,
            NoteType::Eighth => divisions / 2,
            NoteType::Sixteenth => divisions / 4,
            NoteType::ThirtySecond => divisions / 8,
        }
    }

    pub fn musicxml_type(self) -> &'static str {
        match self {
            NoteType::Whole => "whole",
            NoteType::Half => "half",
            NoteType::Quarter => "quarter",
            NoteType::Eighth => "eighth",
            NoteType::Sixteenth => "16th",
            NoteType::ThirtySecond => "32nd",
        }
    }
}

/// A notated length: the glyph to draw and the division units it actually occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotatedDuration {
    pub kind: NoteType,
    pub units: u32,
    pub dotted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::A => "A",
            Step::B => "B",
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
        }
    }

    /// Semitones above C in the same octave.
    pub fn semitone(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub step: Step,
    pub alter: i8,
    pub octave: i8,
}

impl Pitch {
    /// Back to a MIDI note number.
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.step.semitone() + self.alter as i32
    }
}

/// Index of a note in the list of notes being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tie {
    pub start: bool,
    pub stop: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteFragment {
    pub note: NoteId,
    pub pitch: Pitch,
    pub duration: NotatedDuration,
    /// Shares the time slot of the preceding note fragment.
    pub chord: bool,
    pub tie: Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestFragment {
    pub duration: NotatedDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    Note(NoteFragment),
    Rest(RestFragment),
}

impl Fragment {
    pub fn duration(&self) -> NotatedDuration {
        match self {
            Fragment::Note(note) => note.duration,
            Fragment::Rest(rest) => rest.duration,
        }
    }

    /// Units this fragment moves the measure forward by; chord continuations move nothing.
    pub fn advance(&self) -> u32 {
        match self {
            Fragment::Note(note) if note.chord => 0,
            other => other.duration().units,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub divisions: u32,
    pub beats: u32,
    pub beat_type: u32,
    pub fifths: i8,
}

impl Attributes {
    pub fn common_time(divisions: u32) -> Self {
        Self {
            divisions,
            beats: BEATS_PER_MEASURE,
            beat_type: BEAT_TYPE,
            fifths: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub number: u32,
    pub capacity: u32,
    pub filled: u32,
    pub attributes: Option<Attributes>,
    pub contents: Vec<Fragment>,
}

impl Measure {
    pub fn new(number: u32, divisions: u32) -> Self {
        Self {
            number,
            capacity: divisions * BEATS_PER_MEASURE,
            filled: 0,
            attributes: (number == 1).then(|| Attributes::common_time(divisions)),
            contents: Vec::new(),
        }
    }

    pub fn space_left(&self) -> u32 {
        self.capacity - self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled >= self.capacity
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.filled += fragment.advance();
        self.contents.push(fragment);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub title: Option<String>,
    pub part_name: String,
    pub divisions: u32,
    pub measures: Vec<Measure>,
}
