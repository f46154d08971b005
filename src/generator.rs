//! Reply generation.
//!
//! The streaming pipeline is agnostic to how reply text is produced; it
//! only relies on getting a single complete, non-empty string back before
//! any byte is streamed.  [`TemplateReplyGenerator`] is the built-in
//! implementation; swap in anything else (an LLM client, a retrieval
//! pipeline) by implementing [`ReplyGenerator`].

use rand::Rng;

use crate::auth::Role;

/// Contextual profile handed to the generator alongside the user text.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub display_name: String,
    pub role: Role,
}

/// Bounded substitute used whenever generation cannot produce text.
/// Guarantees the orchestrator always has something to persist and stream.
pub const FALLBACK_REPLY: &str =
    "Sorry, I could not put together a full answer right now. Please try again in a moment.";

/// Maps a user message plus context to a complete reply string.
///
/// Implementations must never return empty text; on internal failure they
/// return [`FALLBACK_REPLY`] rather than raising.
pub trait ReplyGenerator: Send + Sync + 'static {
    fn generate(&self, input: &str, ctx: &ReplyContext) -> String;
}

/// Picks one of a fixed set of reply templates at random and fills in the
/// caller's display name and a condensed echo of their question.
///
/// Template text is kept in canonical form (single space between
/// sentences, exactly one blank line between paragraphs) so the stream
/// encoder can segment and reassemble it losslessly.
pub struct TemplateReplyGenerator;

const TOPIC_MAX_CHARS: usize = 60;

impl ReplyGenerator for TemplateReplyGenerator {
    fn generate(&self, input: &str, ctx: &ReplyContext) -> String {
        let topic = condense(input);
        let name = ctx.display_name.trim();
        let name = if name.is_empty() { "there" } else { name };

        let templates: [String; 3] = [
            format!(
                "Good question, {name}. Let me walk you through \"{topic}\".\n\n\
                 Start by breaking the problem into the smallest parts you can name. \
                 Once each part is clear on its own, the way they fit together usually \
                 becomes obvious.\n\n\
                 If you get stuck on a specific part, send it here and we can dig into it."
            ),
            format!(
                "Thanks for asking, {name}. Here is how I would approach \"{topic}\".\n\n\
                 First, check the course material for the definitions involved. \
                 Then try a small worked example by hand before generalizing. \
                 Writing the steps out tends to expose the gap.\n\n\
                 Want me to go deeper on any step?"
            ),
            format!(
                "Let's look at \"{topic}\" together, {name}.\n\n\
                 A good strategy is to restate the question in your own words. \
                 If the restatement feels vague, that vagueness is exactly where to focus. \
                 Compare your restatement against the original and note what dropped out."
            ),
        ];

        let pick = rand::thread_rng().gen_range(0..templates.len());
        let text = templates[pick].clone();
        if text.trim().is_empty() {
            FALLBACK_REPLY.to_owned()
        } else {
            text
        }
    }
}

/// Collapse whitespace runs and bound the length so the echoed topic stays
/// on one canonical line inside the template.
fn condense(input: &str) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= TOPIC_MAX_CHARS {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(TOPIC_MAX_CHARS).collect();
    out.push('…');
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    fn ctx() -> ReplyContext {
        ReplyContext {
            display_name: "sam".into(),
            role: Role::Student,
        }
    }

    #[test]
    fn never_empty() {
        let generator = TemplateReplyGenerator;
        for input in ["", "   ", "What is a B-tree?"] {
            assert!(!generator.generate(input, &ctx()).trim().is_empty());
        }
    }

    #[test]
    fn long_input_is_bounded() {
        let generator = TemplateReplyGenerator;
        let long = "word ".repeat(500);
        let reply = generator.generate(&long, &ctx());
        // The echoed topic must not smuggle the whole input into the reply.
        assert!(reply.len() < 1_000);
    }

    #[test]
    fn collapses_whitespace_in_topic() {
        assert_eq!(condense("a\n\nb   c"), "a b c");
    }
}
