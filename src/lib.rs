mod error;
mod midi_importer;
mod model;
mod musicxml;
mod notation;
mod util;

pub use error::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::performance::*;
pub use model::score::*;
pub use musicxml::to_musicxml;
pub use notation::partitioner::{PendingNote, Partitioner};
pub use notation::pitch::encode_pitch;
pub use notation::quantizer::{QUANTIZE_TOLERANCE, Quantized, quantize};
pub use notation::timeline::Timeline;
pub use notation::{ConvertOptions, DEFAULT_PART_NAME, TimeBase, TrackSelection, convert};
pub use util::*;

/// Convert a performance straight to a MusicXML document.
pub fn performance_to_musicxml(
    performance: &Performance,
    options: &ConvertOptions,
) -> Result<String, ScoreError> {
    let score = convert(performance, options)?;
    Ok(to_musicxml(&score))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn one_call_matches_convert_then_serialize() {
        env_logger::try_init().unwrap_or(());

        let performance = Performance {
            tracks: vec![Track::new(vec![
                NoteEvent::new(60, 0.0, 1.0),
                NoteEvent::new(64, 0.0, 1.0),
                NoteEvent::new(67, 1.5, 3.0),
            ])],
            ..Default::default()
        };
        let options = ConvertOptions {
            title: Some("Etude".into()),
            ..Default::default()
        };

        let xml = performance_to_musicxml(&performance, &options).unwrap();
        let score = convert(&performance, &options).unwrap();
        assert_eq!(xml, to_musicxml(&score));
        assert!(xml.contains("<work-title>Etude</work-title>"));
    }

    #[test]
    fn one_call_propagates_conversion_errors() {
        let performance = Performance {
            tracks: vec![Track::new(vec![NoteEvent::new(60, 0.0, 1.0)])],
            ..Default::default()
        };
        let options = ConvertOptions {
            divisions: 0,
            ..Default::default()
        };

        assert_eq!(
            performance_to_musicxml(&performance, &options),
            Err(ScoreError::InvalidDivisions(0))
        );
    }
}
