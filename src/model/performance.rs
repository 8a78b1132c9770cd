use serde::{Deserialize, Serialize};

pub const DEFAULT_PPQ: u32 = 480;
pub const DEFAULT_BPM: f64 = 120.0;

/// A single sounding note, timed in seconds (or ticks, depending on the time base used to read it).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    #[serde(alias = "midi")]
    pub pitch: u8,
    #[serde(alias = "time")]
    pub start_time: f64,
    pub duration: f64,
}

impl NoteEvent {
    pub fn new(pitch: u8, start_time: f64, duration: f64) -> Self {
        Self {
            pitch,
            start_time,
            duration,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Track {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Vec<NoteEvent>,
}

impl Track {
    pub fn new(notes: Vec<NoteEvent>) -> Self {
        Self { name: None, notes }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TempoMark {
    pub bpm: f64,
    #[serde(default)]
    pub time: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Header {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_ppq")]
    pub ppq: u32,
    #[serde(default)]
    pub tempos: Vec<TempoMark>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            name: None,
            ppq: DEFAULT_PPQ,
            tempos: Vec::new(),
        }
    }
}

impl Header {
    /// Tempo in effect at the start of the performance.
    pub fn initial_bpm(&self) -> f64 {
        self.tempos
            .iter()
            .filter(|tempo| tempo.bpm.is_finite() && tempo.bpm > 0.0)
            .min_by(|a, b| a.time.total_cmp(&b.time))
            .map(|tempo| tempo.bpm)
            .unwrap_or(DEFAULT_BPM)
    }
}

fn default_ppq() -> u32 {
    DEFAULT_PPQ
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Performance {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Performance {
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|track| track.notes.len()).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decoded_json_layout() {
        let json = r#"{
            "header": { "name": "Scale", "ppq": 96, "tempos": [{ "bpm": 90.0, "ticks": 0, "time": 0 }] },
            "tracks": [
                { "name": "Piano", "notes": [
                    { "midi": 60, "time": 0.5, "duration": 0.25, "velocity": 0.8 },
                    { "pitch": 62, "startTime": 1.0, "duration": 0.5 }
                ]},
                { "notes": [] }
            ]
        }"#;

        let perf: Performance = serde_json::from_str(json).unwrap();
        assert_eq!(perf.header.ppq, 96);
        assert_eq!(perf.header.initial_bpm(), 90.0);
        assert_eq!(perf.tracks.len(), 2);
        assert_eq!(perf.tracks[0].name.as_deref(), Some("Piano"));
        assert_eq!(perf.tracks[0].notes[0], NoteEvent::new(60, 0.5, 0.25));
        assert_eq!(perf.tracks[0].notes[1], NoteEvent::new(62, 1.0, 0.5));
        assert_eq!(perf.note_count(), 2);
    }

    #[test]
    fn missing_header_defaults() {
        let perf: Performance = serde_json::from_str(r#"{ "tracks": [] }"#).unwrap();
        assert_eq!(perf.header.ppq, DEFAULT_PPQ);
        assert_eq!(perf.header.initial_bpm(), DEFAULT_BPM);
    }
}
