//! Chunked delivery protocol for generated replies.
//!
//! A complete reply string is segmented into paragraphs (blank-line
//! boundaries) and sentence-like units (trailing `.`/`!`/`?` followed by
//! whitespace), then serialized as newline-delimited JSON frames:
//! `{"type":"token","delta":...}` per unit and exactly one terminal
//! `{"type":"final","reply":...,"links":[...]}`.
//!
//! Concatenating all `token` deltas in emission order reconstructs the
//! reply byte-for-byte, provided the text is in canonical form: single
//! space between sentences, one blank line between paragraphs, which is
//! what [`crate::generator`] produces.  Frames are ephemeral; the
//! persisted assistant message is the source of truth and the stream is a
//! projection of it.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ── Wire frames ──────────────────────────────────────────────────────────────

/// A link to related course material, carried on the final frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelatedLink {
    pub title: String,
    pub url: String,
}

/// One unit of the wire protocol.  Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    Token { delta: String },
    Final { reply: String, links: Vec<RelatedLink> },
}

impl Frame {
    /// Serialize as one NDJSON line (terminating newline included).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

// ── Segmentation ─────────────────────────────────────────────────────────────

/// A delivery chunk produced by [`segment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Sentence unit, trailing space already attached where required.
    Sentence(String),
    /// Blank line between paragraphs; its delta is `"\n\n"`.
    ParagraphBreak,
}

impl Chunk {
    pub fn delta(&self) -> &str {
        match self {
            Chunk::Sentence(s) => s,
            Chunk::ParagraphBreak => "\n\n",
        }
    }
}

/// Split `text` into ordered delivery chunks.
///
/// All sentence units of paragraph *i* come first, each carrying a
/// trailing single space except the paragraph's last; a paragraph-break
/// chunk separates consecutive paragraphs.  Units are trimmed; empties
/// are skipped and emit nothing.
pub fn segment(text: &str) -> Vec<Chunk> {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut chunks = Vec::new();
    for (pi, paragraph) in paragraphs.iter().enumerate() {
        let units = split_sentences(paragraph);
        let last = units.len().saturating_sub(1);
        for (i, unit) in units.into_iter().enumerate() {
            let delta = if i < last { format!("{unit} ") } else { unit };
            chunks.push(Chunk::Sentence(delta));
        }
        if pi + 1 < paragraphs.len() {
            chunks.push(Chunk::ParagraphBreak);
        }
    }
    chunks
}

/// Sentence boundary: `.`, `!`, or `?` immediately followed by whitespace.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut start = 0usize;
    let mut chars = paragraph.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    let unit = paragraph[start..i + c.len_utf8()].trim();
                    if !unit.is_empty() {
                        units.push(unit.to_owned());
                    }
                    start = i + c.len_utf8();
                }
            }
        }
    }
    let tail = paragraph[start..].trim();
    if !tail.is_empty() {
        units.push(tail.to_owned());
    }
    units
}

// ── Pacing ───────────────────────────────────────────────────────────────────

/// Human-perceived typing cadence.  Not a correctness requirement, but the
/// delays suspend only the current request (plain tokio sleeps) and never
/// exceed `sentence_max_ms` per frame.
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    pub sentence_min_ms: u64,
    pub sentence_max_ms: u64,
    pub paragraph_ms: u64,
}

impl PacingPolicy {
    /// Production cadence: 80–200 ms jitter per sentence, 50 ms per
    /// paragraph break.
    pub fn human() -> Self {
        Self {
            sentence_min_ms: 80,
            sentence_max_ms: 200,
            paragraph_ms: 50,
        }
    }

    /// No delays; used by tests.
    pub fn none() -> Self {
        Self {
            sentence_min_ms: 0,
            sentence_max_ms: 0,
            paragraph_ms: 0,
        }
    }

    /// Delay to wait after emitting `chunk`.
    pub fn delay_after(&self, chunk: &Chunk) -> Duration {
        let ms = match chunk {
            Chunk::Sentence(_) if self.sentence_max_ms > self.sentence_min_ms => {
                rand::thread_rng().gen_range(self.sentence_min_ms..=self.sentence_max_ms)
            }
            Chunk::Sentence(_) => self.sentence_min_ms,
            Chunk::ParagraphBreak => self.paragraph_ms,
        };
        Duration::from_millis(ms)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    fn reconstruct(chunks: &[Chunk]) -> String {
        chunks.iter().map(Chunk::delta).collect()
    }

    #[test]
    fn single_sentence_is_one_chunk() {
        let chunks = segment("Hello there.");
        assert_eq!(chunks, vec![Chunk::Sentence("Hello there.".into())]);
    }

    #[test]
    fn sentences_keep_trailing_space_except_last() {
        let text = "First one. Second one! Third?";
        let chunks = segment(text);
        assert_eq!(
            chunks,
            vec![
                Chunk::Sentence("First one. ".into()),
                Chunk::Sentence("Second one! ".into()),
                Chunk::Sentence("Third?".into()),
            ]
        );
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn paragraph_break_between_paragraphs_only() {
        let text = "Intro here.\n\nBody one. Body two.\n\nOutro.";
        let chunks = segment(text);
        assert_eq!(
            chunks
                .iter()
                .filter(|c| matches!(c, Chunk::ParagraphBreak))
                .count(),
            2
        );
        assert!(!matches!(chunks.last(), Some(Chunk::ParagraphBreak)));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn abbreviation_without_following_space_does_not_split() {
        // "e.g.x" has no whitespace after the dots.
        let chunks = segment("See e.g.x for details.");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn empty_and_blank_input_emit_nothing() {
        assert!(segment("").is_empty());
        assert!(segment("  \n\n  \n\n").is_empty());
    }

    #[test]
    fn question_mark_inside_sentence_still_reconstructs() {
        let text = "You asked what is a monad? and that is fair.";
        assert_eq!(reconstruct(&segment(text)), text);
    }

    #[test]
    fn token_frame_serializes_with_type_tag() {
        let line = Frame::Token { delta: "hi ".into() }.to_line().unwrap();
        assert_eq!(line, "{\"type\":\"token\",\"delta\":\"hi \"}\n");
    }

    #[test]
    fn final_frame_carries_reply_and_links() {
        let frame = Frame::Final {
            reply: "done".into(),
            links: vec![RelatedLink {
                title: "Unit 3".into(),
                url: "/resources/3".into(),
            }],
        };
        let parsed: Frame = serde_json::from_str(frame.to_line().unwrap().trim()).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn pacing_stays_within_bounds() {
        let policy = PacingPolicy::human();
        for _ in 0..100 {
            let d = policy.delay_after(&Chunk::Sentence("x.".into()));
            assert!((80..=200).contains(&(d.as_millis() as u64)));
        }
        assert_eq!(
            policy.delay_after(&Chunk::ParagraphBreak),
            Duration::from_millis(50)
        );
    }
}
