//! Voice-message references embedded in post text.
//!
//! A post has a single text column. Recorded voice messages ride along inside
//! it as `🔊 Voice message: <url>` spans appended after the author's prose.
//! This module writes those spans and reads them back out, either as two flat
//! views ([`clean_text`] and [`extract_references`]) or as an ordered list of
//! [`Segment`]s.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Token that introduces an embedded voice reference.
pub const VOICE_MARKER: &str = "🔊 Voice message:";

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"🔊 Voice message: (https?://\S+)").expect("voice reference pattern compiles")
});

/// Plain-text stand-ins appended when a recording could not be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceNotice {
    /// The recording was captured but the upload failed.
    UploadFailed,
    /// The recording finished but could not be turned into a payload.
    RecordingCompleted,
}

impl VoiceNotice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UploadFailed => "🔊 Voice message (audio upload failed)",
            Self::RecordingCompleted => "🔊 Voice message (recording completed)",
        }
    }
}

/// One piece of a decoded post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Voice(String),
}

/// The span appended to a draft for one uploaded recording.
pub fn encode_reference(url: &str) -> String {
    format!(" {} {}", VOICE_MARKER, url)
}

pub fn append_reference(text: &mut String, url: &str) {
    text.push_str(&encode_reference(url));
}

pub fn append_notice(text: &mut String, notice: VoiceNotice) {
    text.push(' ');
    text.push_str(notice.as_str());
}

/// Every referenced URL, left to right.
pub fn extract_references(text: &str) -> Vec<String> {
    REFERENCE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|url| url.as_str().to_string())
        .collect()
}

/// The prose with every marker and URL removed, trimmed at both ends.
pub fn clean_text(text: &str) -> String {
    REFERENCE_RE.replace_all(text, "").trim().to_string()
}

pub fn segments(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut last_match_end = 0;

    for caps in REFERENCE_RE.captures_iter(text) {
        let (Some(whole), Some(url)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_prose(&mut out, &text[last_match_end..whole.start()]);
        out.push(Segment::Voice(url.as_str().to_string()));
        last_match_end = whole.end();
    }
    push_prose(&mut out, &text[last_match_end..]);

    out
}

/// Rebuilds stored text from segments. Whitespace between segments is
/// normalised to a single space.
pub fn reassemble(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(prose) => prose.clone(),
            Segment::Voice(url) => format!("{} {}", VOICE_MARKER, url),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_prose(out: &mut Vec<Segment>, prose: &str) {
    let prose = prose.trim();
    if !prose.is_empty() {
        out.push(Segment::Text(prose.to_string()));
    }
}
