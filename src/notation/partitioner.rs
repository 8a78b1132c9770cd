use crate::model::score::{Fragment, Measure, NoteFragment, NoteId, Pitch, RestFragment, Tie};
use crate::notation::quantizer::{Quantized, quantize};
use log::{debug, warn};
use std::collections::HashSet;

/// A note waiting to be written: its identity, spelling, and total length in division units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNote {
    pub id: NoteId,
    pub pitch: Pitch,
    pub units: u32,
}

/// Single forward pass accumulator that cuts a stream of notes and rests into 4/4 measures.
///
/// Measures are sealed lazily: a full measure stays current until something needs room in the next
/// one, so no empty trailing measure is ever opened.
#[derive(Debug)]
pub struct Partitioner {
    divisions: u32,
    sealed: Vec<Measure>,
    current: Measure,
    open_ties: HashSet<NoteId>,
    fallbacks: usize,
}

impl Partitioner {
    pub fn new(divisions: u32) -> Self {
        Self {
            divisions,
            sealed: Vec::new(),
            current: Measure::new(1, divisions),
            open_ties: HashSet::new(),
            fallbacks: 0,
        }
    }

    pub fn measure_number(&self) -> u32 {
        self.current.number
    }

    pub fn filled(&self) -> u32 {
        self.current.filled
    }

    /// Seal the current measure and open the next one when there is no room left.
    fn make_room(&mut self) {
        if !self.current.is_full() {
            return;
        }

        let next = Measure::new(self.current.number + 1, self.divisions);
        let sealed = std::mem::replace(&mut self.current, next);
        debug!(
            "Sealed measure {} with {} fragment(s)..!",
            sealed.number,
            sealed.contents.len()
        );
        self.sealed.push(sealed);
    }

    /// Quantize `units` bounded by the room left in the current measure.
    fn next_chunk(&mut self, units: u32) -> Quantized {
        self.make_room();
        let span = units.min(self.current.space_left());
        let quantized = quantize(span, self.divisions);

        if quantized.is_fallback() {
            self.fallbacks += 1;
            warn!(
                "No notated value fits {} unit(s) in measure {}, writing a quarter in its place..!",
                span, self.current.number
            );
        }

        quantized
    }

    pub fn push_rest(&mut self, units: u32) {
        let mut remaining = units;

        while remaining > 0 {
            let duration = self.next_chunk(remaining).duration();
            self.current.push(Fragment::Rest(RestFragment { duration }));
            remaining -= duration.units;
        }
    }

    /// Write notes that start together as one chord.
    ///
    /// The chord advances in steps as long as its shortest remaining member, so members of different
    /// lengths drop out one by one while the longer ones are tied into the next step.
    pub fn push_chord(&mut self, notes: &[PendingNote]) {
        let mut active: Vec<PendingNote> = notes.iter().copied().filter(|n| n.units > 0).collect();
        active.sort_by_key(|n| (n.pitch.midi(), n.id));

        while let Some(shortest) = active.iter().map(|n| n.units).min() {
            let duration = self.next_chunk(shortest).duration();

            for (i, note) in active.iter_mut().enumerate() {
                note.units -= duration.units;

                let tie = Tie {
                    stop: self.open_ties.remove(&note.id),
                    start: note.units > 0,
                };
                if tie.start {
                    self.open_ties.insert(note.id);
                }

                self.current.push(Fragment::Note(NoteFragment {
                    note: note.id,
                    pitch: note.pitch,
                    duration,
                    chord: i > 0,
                    tie,
                }));
            }

            active.retain(|n| n.units > 0);
        }
    }

    /// Fill the rest of the current measure one beat at a time, starting with whatever is left of the
    /// beat in progress.
    fn pad_to_barline(&mut self) {
        while !self.current.is_full() {
            let to_beat = self.divisions - self.current.filled % self.divisions;
            self.push_rest(to_beat.min(self.current.space_left()));
        }
    }

    /// Pad the last measure with rests and hand back every measure in order.
    ///
    /// A measure that never received anything becomes a single whole rest.
    pub fn finish(mut self) -> Vec<Measure> {
        if self.current.contents.is_empty() {
            if self.sealed.is_empty() {
                let space = self.current.space_left();
                self.push_rest(space);
                self.sealed.push(self.current);
            }
        } else {
            self.pad_to_barline();
            self.sealed.push(self.current);
        }

        if !self.open_ties.is_empty() {
            warn!(
                "{} tie(s) were left open at the end of the score..!",
                self.open_ties.len()
            );
        }

        if self.fallbacks > 0 {
            warn!(
                "{} fragment(s) could not be matched to a notated value..!",
                self.fallbacks
            );
        }

        self.sealed
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::score::NoteType;
    use crate::notation::pitch::encode_pitch;

    const DIVISIONS: u32 = 480;

    fn pending(id: usize, midi: u8, units: u32) -> PendingNote {
        PendingNote {
            id: NoteId(id),
            pitch: encode_pitch(midi).unwrap(),
            units,
        }
    }

    fn notes(measure: &Measure) -> Vec<NoteFragment> {
        measure
            .contents
            .iter()
            .filter_map(|f| match f {
                Fragment::Note(n) => Some(*n),
                Fragment::Rest(_) => None,
            })
            .collect()
    }

    #[test]
    fn untouched_partitioner_yields_whole_rest() {
        env_logger::try_init().unwrap_or(());

        let measures = Partitioner::new(DIVISIONS).finish();
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].number, 1);
        assert!(measures[0].attributes.is_some());
        assert_eq!(measures[0].contents.len(), 1);

        let Fragment::Rest(rest) = measures[0].contents[0] else {
            panic!("expected a rest");
        };
        assert_eq!(rest.duration.kind, NoteType::Whole);
        assert_eq!(rest.duration.units, 1920);
    }

    #[test]
    fn padding_follows_the_beats() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 720)]);
        let measures = partitioner.finish();

        assert_eq!(measures.len(), 1);
        let padding: Vec<(NoteType, u32, bool)> = measures[0].contents[1..]
            .iter()
            .map(|f| {
                assert!(matches!(f, Fragment::Rest(_)));
                let d = f.duration();
                (d.kind, d.units, d.dotted)
            })
            .collect();
        assert_eq!(
            padding,
            vec![
                (NoteType::Eighth, 240, false),
                (NoteType::Quarter, 480, false),
                (NoteType::Quarter, 480, false),
                (NoteType::Quarter, 480, false),
            ]
        );
        assert_eq!(measures[0].filled, 1920);
    }

    #[test]
    fn padding_after_a_quarter_is_three_quarter_rests() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 480)]);
        let measures = partitioner.finish();

        assert_eq!(measures[0].contents.len(), 4);
        for rest in &measures[0].contents[1..] {
            assert!(matches!(rest, Fragment::Rest(_)));
            assert_eq!(rest.duration().kind, NoteType::Quarter);
            assert!(!rest.duration().dotted);
        }
    }

    #[test]
    fn residual_after_the_barline_is_a_quarter_glyph_with_its_own_length() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 1922)]);
        let measures = partitioner.finish();

        assert_eq!(measures.len(), 2);
        let first = notes(&measures[0]);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].duration.kind, NoteType::Whole);
        assert_eq!(first[0].duration.units, 1920);
        assert_eq!(first[0].tie, Tie { start: true, stop: false });

        let second = notes(&measures[1]);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].duration.kind, NoteType::Quarter);
        assert_eq!(second[0].duration.units, 2);
        assert_eq!(second[0].tie, Tie { start: false, stop: true });

        assert_eq!(quantize(2, DIVISIONS), Quantized::Fallback(second[0].duration));

        for measure in measures.iter() {
            let sum: u32 = measure.contents.iter().map(Fragment::advance).sum();
            assert_eq!(sum, measure.capacity);
        }
        let written: u32 = first.iter().chain(second.iter()).map(|n| n.duration.units).sum();
        assert_eq!(written, 1922);
    }

    #[test]
    fn rests_split_at_barlines() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 1440)]);
        partitioner.push_rest(960);
        let measures = partitioner.finish();

        assert_eq!(measures.len(), 2);
        assert_eq!(measures[0].filled, 1920);
        assert_eq!(measures[1].filled, 1920);
        assert_eq!(measures[1].attributes, None);

        let last = measures[0].contents.last().unwrap();
        assert_eq!(last.duration().units, 480);
        let first = measures[1].contents.first().unwrap();
        assert!(matches!(first, Fragment::Rest(_)));
        assert_eq!(first.duration().units, 480);
    }

    #[test]
    fn long_note_is_tied_across_the_barline() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 2880)]);
        let measures = partitioner.finish();

        assert_eq!(measures.len(), 2);
        let first = notes(&measures[0]);
        let second = notes(&measures[1]);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].duration.kind, NoteType::Whole);
        assert_eq!(first[0].tie, Tie { start: true, stop: false });

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].duration.kind, NoteType::Half);
        assert_eq!(second[0].duration.units, 960);
        assert_eq!(second[0].tie, Tie { start: false, stop: true });
    }

    #[test]
    fn chord_fill_is_counted_once() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 64, 480), pending(1, 60, 480), pending(2, 67, 480)]);
        assert_eq!(partitioner.filled(), 480);

        let measures = partitioner.finish();
        let chord = notes(&measures[0]);
        assert_eq!(chord.len(), 3);
        assert!(!chord[0].chord);
        assert!(chord[1].chord && chord[2].chord);
        // lowest pitch leads the chord
        assert_eq!(chord[0].note, NoteId(1));
        assert_eq!(measures[0].filled, 1920);
    }

    #[test]
    fn uneven_chord_ties_only_the_longer_member() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 480), pending(1, 64, 960)]);
        let measures = partitioner.finish();
        let written = notes(&measures[0]);

        assert_eq!(written.len(), 3);
        assert_eq!(written[0].note, NoteId(0));
        assert_eq!(written[0].tie, Tie::default());
        assert_eq!(written[1].note, NoteId(1));
        assert!(written[1].chord);
        assert_eq!(written[1].tie, Tie { start: true, stop: false });

        // the held note carries on alone, so it leads its own slot
        assert_eq!(written[2].note, NoteId(1));
        assert!(!written[2].chord);
        assert_eq!(written[2].tie, Tie { start: false, stop: true });
        assert_eq!(measures[0].filled, 1920);
    }

    #[test]
    fn full_measure_is_not_followed_by_an_empty_one() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 1920)]);
        assert_eq!(partitioner.measure_number(), 1);

        let measures = partitioner.finish();
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].contents.len(), 1);
    }

    #[test]
    fn zero_length_notes_are_ignored() {
        env_logger::try_init().unwrap_or(());

        let mut partitioner = Partitioner::new(DIVISIONS);
        partitioner.push_chord(&[pending(0, 60, 0)]);
        partitioner.push_rest(0);
        let measures = partitioner.finish();

        assert_eq!(measures.len(), 1);
        assert!(notes(&measures[0]).is_empty());
    }
}
