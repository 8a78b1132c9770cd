use crate::model::score::{NotatedDuration, NoteType};

/// Absolute jitter, in division units, absorbed when matching a length against a notated value.
pub const QUANTIZE_TOLERANCE: u32 = 2;

/// Outcome of matching a span of division units against the notated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantized {
    /// The whole span is one notated value, within tolerance.
    Exact(NotatedDuration),
    /// The largest notated value that fits; the caller quantizes the remainder again.
    Chunk(NotatedDuration),
    /// Nothing fits, so the span is written with a quarter-note glyph.
    ///
    /// Only `kind` is the quarter. `units` stays the residual it was given, which becomes the
    /// fragment's `<duration>`, so measures still sum to capacity and every note keeps its length.
    /// The mismatch between glyph and duration is logged by the partitioner.
    Fallback(NotatedDuration),
}

impl Quantized {
    pub fn duration(self) -> NotatedDuration {
        match self {
            Quantized::Exact(d) | Quantized::Chunk(d) | Quantized::Fallback(d) => d,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Quantized::Fallback(_))
    }
}

/// Tolerance actually applied, kept below half a 32nd so coarse divisions don't blur neighbouring values.
pub fn tolerance(divisions: u32) -> u32 {
    QUANTIZE_TOLERANCE.min(divisions / 16)
}

/// Candidate values in descending length, dotted variant checked before the plain one.
fn candidates(divisions: u32) -> impl Iterator<Item = NotatedDuration> {
    let whole = NoteType::Whole.units(divisions);

    NoteType::ALL.into_iter().flat_map(move |kind| {
        let plain = kind.units(divisions);
        let dotted = (plain > 0 && plain % 2 == 0 && plain + plain / 2 <= whole).then(|| {
            NotatedDuration {
                kind,
                units: plain + plain / 2,
                dotted: true,
            }
        });
        let plain = (plain > 0).then_some(NotatedDuration {
            kind,
            units: plain,
            dotted: false,
        });

        dotted.into_iter().chain(plain)
    })
}

/// Match `units` against the notated values for the given `divisions`.
///
/// An exact match consumes all of `units`, so a quarter that is one unit short is still a quarter
/// lasting `units`. Anything longer than a whole note yields a whole-note chunk. A span too short for
/// any value degrades to a quarter-typed fallback covering the span.
pub fn quantize(units: u32, divisions: u32) -> Quantized {
    let tol = tolerance(divisions);
    let whole = NoteType::Whole.units(divisions);

    if units > whole + tol {
        return Quantized::Chunk(NotatedDuration {
            kind: NoteType::Whole,
            units: whole,
            dotted: false,
        });
    }

    if let Some(matched) = candidates(divisions).find(|c| c.units.abs_diff(units) <= tol) {
        return Quantized::Exact(NotatedDuration { units, ..matched });
    }

    if let Some(chunk) = candidates(divisions).find(|c| c.units <= units) {
        return Quantized::Chunk(chunk);
    }

    Quantized::Fallback(NotatedDuration {
        kind: NoteType::Quarter,
        units,
        dotted: false,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const DIVISIONS: u32 = 480;

    fn exact(kind: NoteType, units: u32, dotted: bool) -> Quantized {
        Quantized::Exact(NotatedDuration {
            kind,
            units,
            dotted,
        })
    }

    #[test]
    fn plain_values() {
        assert_eq!(quantize(1920, DIVISIONS), exact(NoteType::Whole, 1920, false));
        assert_eq!(quantize(960, DIVISIONS), exact(NoteType::Half, 960, false));
        assert_eq!(quantize(480, DIVISIONS), exact(NoteType::Quarter, 480, false));
        assert_eq!(quantize(240, DIVISIONS), exact(NoteType::Eighth, 240, false));
        assert_eq!(quantize(120, DIVISIONS), exact(NoteType::Sixteenth, 120, false));
        assert_eq!(quantize(60, DIVISIONS), exact(NoteType::ThirtySecond, 60, false));
    }

    #[test]
    fn dotted_values() {
        assert_eq!(quantize(1440, DIVISIONS), exact(NoteType::Half, 1440, true));
        assert_eq!(quantize(720, DIVISIONS), exact(NoteType::Quarter, 720, true));
        assert_eq!(quantize(360, DIVISIONS), exact(NoteType::Eighth, 360, true));
        assert_eq!(quantize(90, DIVISIONS), exact(NoteType::ThirtySecond, 90, true));
    }

    #[test]
    fn jitter_within_tolerance_keeps_its_units() {
        assert_eq!(quantize(478, DIVISIONS), exact(NoteType::Quarter, 478, false));
        assert_eq!(quantize(482, DIVISIONS), exact(NoteType::Quarter, 482, false));
        assert_eq!(
            quantize(483, DIVISIONS),
            Quantized::Chunk(NotatedDuration {
                kind: NoteType::Quarter,
                units: 480,
                dotted: false,
            })
        );
    }

    #[test]
    fn longer_than_whole_is_chunked_once() {
        let q = quantize(2880, DIVISIONS);
        assert_eq!(
            q,
            Quantized::Chunk(NotatedDuration {
                kind: NoteType::Whole,
                units: 1920,
                dotted: false,
            })
        );
    }

    #[test]
    fn between_values_takes_the_largest_fitting_chunk() {
        // 700 sits between a quarter and a dotted quarter
        let q = quantize(700, DIVISIONS);
        assert_eq!(q.duration().kind, NoteType::Quarter);
        assert_eq!(q.duration().units, 480);
        assert!(!q.duration().dotted);

        // 1200 is no single value either, the half is the largest that fits
        let q = quantize(1200, DIVISIONS);
        assert_eq!(q.duration().kind, NoteType::Half);
        assert_eq!(q.duration().units, 960);
    }

    #[test]
    fn residual_below_thirty_second_falls_back() {
        let q = quantize(7, DIVISIONS);
        assert!(q.is_fallback());
        assert_eq!(q.duration().kind, NoteType::Quarter);
        assert_eq!(q.duration().units, 7);
    }

    #[test]
    fn coarse_divisions_disable_tolerance() {
        assert_eq!(tolerance(4), 0);
        assert_eq!(tolerance(480), QUANTIZE_TOLERANCE);

        // with 4 divisions an eighth is 2 units and must not be mistaken for a quarter
        assert_eq!(quantize(2, 4), exact(NoteType::Eighth, 2, false));
        assert_eq!(quantize(6, 4), exact(NoteType::Quarter, 6, true));
    }

    #[test]
    fn repeated_chunks_cover_any_length() {
        for total in [1, 59, 61, 483, 1000, 2881, 5000] {
            let mut remaining = total;
            while remaining > 0 {
                let units = quantize(remaining, DIVISIONS).duration().units;
                assert!(units > 0 && units <= remaining);
                remaining -= units;
            }
        }
    }
}
