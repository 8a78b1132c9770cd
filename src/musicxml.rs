use crate::model::score::{Attributes, Fragment, Measure, NotatedDuration, NoteFragment, Pitch, Score};

/// Convert a Score to MusicXML (partwise, single part)
pub fn to_musicxml(score: &Score) -> String {
    let mut xml = String::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 4.0 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">"#);
    xml.push('\n');
    xml.push_str(r#"<score-partwise version="4.0">"#);
    xml.push('\n');

    if let Some(title) = &score.title {
        xml.push_str("  <work>\n");
        xml.push_str(&format!("    <work-title>{}</work-title>\n", escape_xml(title)));
        xml.push_str("  </work>\n");
    }

    xml.push_str("  <part-list>\n");
    xml.push_str("    <score-part id=\"P1\">\n");
    xml.push_str(&format!(
        "      <part-name>{}</part-name>\n",
        escape_xml(&score.part_name)
    ));
    xml.push_str("    </score-part>\n");
    xml.push_str("  </part-list>\n");

    xml.push_str("  <part id=\"P1\">\n");
    for measure in &score.measures {
        xml.push_str(&measure_to_xml(measure));
    }
    xml.push_str("  </part>\n");
    xml.push_str("</score-partwise>\n");

    xml
}

fn measure_to_xml(measure: &Measure) -> String {
    let mut xml = String::new();

    xml.push_str(&format!("    <measure number=\"{}\">\n", measure.number));

    if let Some(attributes) = &measure.attributes {
        xml.push_str(&attributes_to_xml(attributes));
    }

    for fragment in &measure.contents {
        match fragment {
            Fragment::Note(note) => xml.push_str(&note_to_xml(note)),
            Fragment::Rest(rest) => xml.push_str(&rest_to_xml(&rest.duration)),
        }
    }

    xml.push_str("    </measure>\n");
    xml
}

fn attributes_to_xml(attributes: &Attributes) -> String {
    let mut xml = String::new();

    xml.push_str("      <attributes>\n");
    xml.push_str(&format!(
        "        <divisions>{}</divisions>\n",
        attributes.divisions
    ));
    xml.push_str("        <key>\n");
    xml.push_str(&format!("          <fifths>{}</fifths>\n", attributes.fifths));
    xml.push_str("        </key>\n");
    xml.push_str("        <time>\n");
    xml.push_str(&format!("          <beats>{}</beats>\n", attributes.beats));
    xml.push_str(&format!(
        "          <beat-type>{}</beat-type>\n",
        attributes.beat_type
    ));
    xml.push_str("        </time>\n");
    xml.push_str("        <clef>\n");
    xml.push_str("          <sign>G</sign>\n");
    xml.push_str("          <line>2</line>\n");
    xml.push_str("        </clef>\n");
    xml.push_str("      </attributes>\n");

    xml
}

fn pitch_to_xml(pitch: &Pitch) -> String {
    let mut xml = String::new();

    xml.push_str("        <pitch>\n");
    xml.push_str(&format!("          <step>{}</step>\n", pitch.step.as_str()));
    if pitch.alter != 0 {
        xml.push_str(&format!("          <alter>{}</alter>\n", pitch.alter));
    }
    xml.push_str(&format!("          <octave>{}</octave>\n", pitch.octave));
    xml.push_str("        </pitch>\n");

    xml
}

/// `<duration>`, `<type>` and `<dot/>` are split by the tie elements, so they are written separately.
fn type_to_xml(duration: &NotatedDuration) -> String {
    let mut xml = format!("        <type>{}</type>\n", duration.kind.musicxml_type());
    if duration.dotted {
        xml.push_str("        <dot/>\n");
    }
    xml
}

fn note_to_xml(note: &NoteFragment) -> String {
    let mut xml = String::new();

    xml.push_str("      <note>\n");

    if note.chord {
        xml.push_str("        <chord/>\n");
    }

    xml.push_str(&pitch_to_xml(&note.pitch));
    xml.push_str(&format!("        <duration>{}</duration>\n", note.duration.units));

    // Playback ties
    if note.tie.stop {
        xml.push_str("        <tie type=\"stop\"/>\n");
    }
    if note.tie.start {
        xml.push_str("        <tie type=\"start\"/>\n");
    }

    xml.push_str(&type_to_xml(&note.duration));

    match note.pitch.alter {
        1 => xml.push_str("        <accidental>sharp</accidental>\n"),
        -1 => xml.push_str("        <accidental>flat</accidental>\n"),
        _ => {}
    }

    // Display ties
    if note.tie.start || note.tie.stop {
        xml.push_str("        <notations>\n");
        if note.tie.stop {
            xml.push_str("          <tied type=\"stop\"/>\n");
        }
        if note.tie.start {
            xml.push_str("          <tied type=\"start\"/>\n");
        }
        xml.push_str("        </notations>\n");
    }

    xml.push_str("      </note>\n");
    xml
}

fn rest_to_xml(duration: &NotatedDuration) -> String {
    let mut xml = String::new();

    xml.push_str("      <note>\n");
    xml.push_str("        <rest/>\n");
    xml.push_str(&format!("        <duration>{}</duration>\n", duration.units));
    xml.push_str(&type_to_xml(duration));
    xml.push_str("      </note>\n");

    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
