//! Clean stage: drop noise, remove duplicates, and tag what survives.
//!
//! Pure and order-preserving. Rules apply in order:
//!
//! 1. empty or too-short text
//! 2. boilerplate markers (deletion placeholders, bot footers, moderator
//!    notices, welcome posts, self-promotion)
//! 3. duplicate `(author, text)` pairs, first occurrence kept
//! 4. truncate text (marked with [`TRUNCATION_MARKER`]) and attach
//!    brand/prospect identifiers

use std::collections::HashSet;

use brandscan_core::{CleanedItem, ScrapedItem};

/// Lowercase substrings that mark an item as noise.
const BOILERPLATE_MARKERS: &[&str] = &[
    // bots
    "i am a bot",
    "action was performed automatically",
    "contact the moderators",
    "automoderator",
    "bot, and this action",
    "performed automatically",
    "/message/compose/?to=",
    "if you have any questions or concerns",
    // deleted
    "[deleted]",
    "[removed]",
    "deleted by user",
    "removed by moderator",
    // moderator notices
    "#### about participation",
    "discussion in this subreddit",
    "please vote accordingly",
    "removal or ban territory",
    "good - it is grounded in science",
    "bad - it utilizes generalizations",
    "rooted in science rather than",
    "peer reviewed sources",
    "off topic discussion",
    "please [contact the moderators",
    // welcome posts
    "welcome to",
    "thanks for joining",
    "new to the sub",
    "first time posting",
    "glad you're here",
    // self-promotion
    "check out my",
    "follow me on",
    "link in bio",
    "dm me for",
    "click here",
    "subscribe to my",
];

/// Appended to text cut at `max_chars`.
pub const TRUNCATION_MARKER: &str = "...";

/// Knobs for [`clean_items`].
#[derive(Debug, Clone, Copy)]
pub struct CleanOptions {
    /// Trimmed text shorter than this is dropped.
    pub min_chars: usize,
    /// Surviving text longer than this is cut to this many characters and
    /// marked.
    pub max_chars: usize,
}

#[must_use]
pub fn is_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    BOILERPLATE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Filter scraped items down to the ones worth analyzing.
///
/// Items are never mutated in storage; this works on a derived view.
#[must_use]
pub fn clean_items(items: &[ScrapedItem], options: CleanOptions) -> Vec<CleanedItem> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut cleaned = Vec::new();
    let (mut short, mut boilerplate) = (0usize, 0usize);
    let (mut duplicate, mut truncated) = (0usize, 0usize);

    for item in items {
        let text = item.text.trim();
        if text.is_empty() || text.chars().count() < options.min_chars {
            short += 1;
            continue;
        }
        if is_boilerplate(text) {
            boilerplate += 1;
            continue;
        }

        let author_key = item
            .author
            .as_deref()
            .map(|a| a.trim().to_lowercase())
            .unwrap_or_default();
        if !seen.insert((author_key, text.to_string())) {
            duplicate += 1;
            continue;
        }

        let text = match truncate_chars(text, options.max_chars) {
            Some(cut) => {
                truncated += 1;
                format!("{cut}{TRUNCATION_MARKER}")
            }
            None => text.to_string(),
        };

        cleaned.push(CleanedItem {
            source_url: item.source_url.clone(),
            kind: item.kind,
            external_id: item.external_id.clone(),
            author: item.author.clone(),
            community: item.community.clone(),
            score: item.score,
            created_at: item.created_at,
            text,
            brand_name: item.brand_name.clone(),
            prospect_id: item.prospect_id,
        });
    }

    tracing::debug!(
        input = items.len(),
        kept = cleaned.len(),
        short,
        boilerplate,
        duplicate,
        truncated,
        "cleaned items"
    );
    cleaned
}

/// The first `max_chars` characters, or `None` if nothing needs cutting.
fn truncate_chars(text: &str, max_chars: usize) -> Option<&str> {
    text.char_indices().nth(max_chars).map(|(idx, _)| &text[..idx])
}
