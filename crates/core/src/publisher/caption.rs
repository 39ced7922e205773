//! Per-platform caption formatting.

use crate::formats::TextSpec;

const ELLIPSIS: &str = "...";

/// A caption ready for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedCaption {
    pub text: String,
    /// Hashtags that made it into the caption, without the leading `#`.
    pub hashtags: Vec<String>,
    pub truncated: bool,
}

/// Normalizes hashtags to `#tag` form.
///
/// Whitespace is removed, repeated leading `#` collapse to one, empty tags
/// are dropped and duplicates (case-insensitive) keep their first spelling.
pub fn normalize_hashtags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for tag in tags {
        let compact: String = tag.as_ref().chars().filter(|c| !c.is_whitespace()).collect();
        let bare = compact.trim_start_matches('#');
        if bare.is_empty() {
            continue;
        }
        if seen.insert(bare.to_lowercase()) {
            out.push(format!("#{}", bare));
        }
    }

    out
}

/// Cuts `text` to at most `max_chars` characters, ending with "..." when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    if text.chars().count() <= max_chars {
        return (text.to_string(), false);
    }
    if max_chars < ELLIPSIS.len() {
        return (text.chars().take(max_chars).collect(), true);
    }
    let mut cut: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    (cut, true)
}

/// Builds the caption for a format: text, a blank line, then hashtags.
///
/// Hashtags are capped to the format's `max_hashtags` before being
/// appended, and the whole caption is truncated to `max_length`. Formats
/// without text constraints get the composed caption as is.
pub fn format_caption<S: AsRef<str>>(
    text: &str,
    hashtags: &[S],
    spec: Option<&TextSpec>,
) -> FormattedCaption {
    let mut tags = normalize_hashtags(hashtags);
    if let Some(max) = spec.and_then(|s| s.max_hashtags) {
        tags.truncate(max);
    }

    let body = text.trim();
    let composed = match (body.is_empty(), tags.is_empty()) {
        (_, true) => body.to_string(),
        (true, false) => tags.join(" "),
        (false, false) => format!("{}\n\n{}", body, tags.join(" ")),
    };

    let (text, truncated) = match spec {
        Some(spec) => truncate_chars(&composed, spec.max_length),
        None => (composed, false),
    };

    FormattedCaption {
        text,
        hashtags: tags.iter().map(|t| t.trim_start_matches('#').to_string()).collect(),
        truncated,
    }
}
