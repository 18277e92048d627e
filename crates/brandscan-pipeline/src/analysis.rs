//! Analysis stage: pack cleaned items into bounded prompts, ask the model
//! for tagged insight sections, and merge batch outputs.
//!
//! Merge rule: the headline insight and report come from the first batch;
//! themes, recommendations and customer segments are concatenated in batch
//! order with exact duplicates removed (first kept). The sentiment
//! breakdown is the rounded mean over batches that reported one.

use std::collections::HashSet;
use std::sync::LazyLock;

use brandscan_core::{AnalysisResult, CleanedItem, SentimentBreakdown};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::providers::LanguageModel;
use crate::types::PipelineConfig;

/// System message sent with every analysis prompt.
pub const SYSTEM_PROMPT: &str = "You are a consumer insight strategist. You read raw \
community discussion about a brand and distill what customers actually think, feel and \
want. Ground every statement in the supplied posts and comments. Answer only in the \
requested tagged sections.";

const INSTRUCTIONS: &str = "Analyze the following community posts and comments about the \
brand \"{brand}\". Each entry is a JSON object with an id, kind, community, score, \
created_at and text.

Respond with exactly these sections:
<KEY_INSIGHT>one or two sentences: the single most important takeaway</KEY_INSIGHT>
<THEMES>one recurring theme per line</THEMES>
<RECOMMENDATIONS>one actionable recommendation per line</RECOMMENDATIONS>
<SENTIMENT>
positive: N%
negative: N%
neutral: N%
</SENTIMENT>
<SEGMENTS>one customer segment per line, with a short behavioral description</SEGMENTS>
<REPORT>optional longer narrative report</REPORT>

Items:
";

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s*").expect("valid bullet regex"));

// Label and the first number after it on the same line.
static SENTIMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(positive|negative|neutral)\b[^\d\n]*?(\d{1,3})")
        .expect("valid sentiment regex")
});

#[derive(Serialize)]
struct PromptItem<'a> {
    id: usize,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    community: Option<&'a str>,
    score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    text: &'a str,
}

/// One bounded slice of the item set, already serialized as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub payload: String,
    pub item_count: usize,
}

/// Sections parsed out of one model response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInsight {
    pub key_insight: String,
    pub themes: Vec<String>,
    pub recommendations: Vec<String>,
    pub sentiment: Option<SentimentBreakdown>,
    pub customer_segments: Vec<String>,
    pub report: Option<String>,
}

/// Pack items greedily, in order, into JSON-array payloads of at most
/// `budget` characters.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] for an empty slice, or
/// [`AnalysisError::ItemExceedsBudget`] if a single item cannot fit in a
/// batch on its own.
pub fn build_batches(items: &[CleanedItem], budget: usize) -> Result<Vec<Batch>, AnalysisError> {
    if items.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    // Length of "[" + entries joined by "," + "]".
    let mut current_len = 2usize;

    for (index, item) in items.iter().enumerate() {
        let entry = serde_json::to_string(&PromptItem {
            id: index + 1,
            kind: item.kind.as_str(),
            community: item.community.as_deref(),
            score: item.score,
            created_at: item.created_at.map(|t| t.to_rfc3339()),
            text: &item.text,
        })
        .map_err(|e| AnalysisError::UnusableResponse {
            batch: batches.len(),
            reason: format!("item {index} could not be serialized: {e}"),
        })?;

        let size = entry.chars().count();
        if size + 2 > budget {
            return Err(AnalysisError::ItemExceedsBudget {
                index,
                size: size + 2,
                budget,
            });
        }

        let separator = usize::from(!current.is_empty());
        if current_len + separator + size > budget {
            batches.push(finish_batch(&mut current));
            current_len = 2;
        }
        current_len += usize::from(!current.is_empty()) + size;
        current.push(entry);
    }
    if !current.is_empty() {
        batches.push(finish_batch(&mut current));
    }

    Ok(batches)
}

fn finish_batch(entries: &mut Vec<String>) -> Batch {
    let item_count = entries.len();
    let payload = format!("[{}]", entries.join(","));
    entries.clear();
    Batch {
        payload,
        item_count,
    }
}

#[must_use]
pub fn build_prompt(brand_name: &str, batch: &Batch) -> String {
    let mut prompt = INSTRUCTIONS.replace("{brand}", brand_name);
    prompt.push_str(&batch.payload);
    prompt
}

/// Text between `<TAG>` and `</TAG>`, trimmed. `None` if either tag is
/// missing or the section is blank.
#[must_use]
pub fn extract_section<'a>(response: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = response.find(&open)? + open.len();
    let end = response[start..].find(&close)? + start;
    let section = response[start..end].trim();
    (!section.is_empty()).then_some(section)
}

fn section_lines(section: Option<&str>) -> Vec<String> {
    section
        .map(|s| {
            s.lines()
                .map(|line| BULLET_RE.replace(line, "").trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Read `positive`/`negative`/`neutral` percentages from a sentiment
/// section. Labels the model left out count as zero; `None` if none of
/// them appear.
#[must_use]
pub fn parse_sentiment(section: Option<&str>) -> Option<SentimentBreakdown> {
    let mut breakdown = SentimentBreakdown::default();
    let mut found = false;
    for caps in SENTIMENT_RE.captures_iter(section?) {
        let Ok(value) = caps[2].parse::<i32>() else {
            continue;
        };
        let slot = match caps[1].to_ascii_lowercase().as_str() {
            "positive" => &mut breakdown.positive,
            "negative" => &mut breakdown.negative,
            _ => &mut breakdown.neutral,
        };
        *slot = value.min(100);
        found = true;
    }
    found.then_some(breakdown)
}

fn average_sentiment(breakdowns: &[SentimentBreakdown]) -> Option<SentimentBreakdown> {
    let n = i32::try_from(breakdowns.len()).ok().filter(|n| *n > 0)?;
    let mean = |field: fn(&SentimentBreakdown) -> i32| {
        (breakdowns.iter().map(field).sum::<i32>() + n / 2) / n
    };
    Some(SentimentBreakdown {
        positive: mean(|s| s.positive),
        negative: mean(|s| s.negative),
        neutral: mean(|s| s.neutral),
    })
}

/// Parse one model response.
///
/// # Errors
///
/// Returns [`AnalysisError::UnusableResponse`] when the response has no
/// key insight section.
pub fn parse_response(batch: usize, response: &str) -> Result<BatchInsight, AnalysisError> {
    let key_insight = extract_section(response, "KEY_INSIGHT").ok_or_else(|| {
        AnalysisError::UnusableResponse {
            batch,
            reason: "missing <KEY_INSIGHT> section".to_string(),
        }
    })?;

    Ok(BatchInsight {
        key_insight: key_insight.to_string(),
        themes: section_lines(extract_section(response, "THEMES")),
        recommendations: section_lines(extract_section(response, "RECOMMENDATIONS")),
        sentiment: parse_sentiment(extract_section(response, "SENTIMENT")),
        customer_segments: section_lines(extract_section(response, "SEGMENTS")),
        report: extract_section(response, "REPORT").map(str::to_string),
    })
}

/// Lines in first-seen order, exact duplicates dropped.
#[derive(Default)]
struct UniqueLines {
    seen: HashSet<String>,
    lines: Vec<String>,
}

impl UniqueLines {
    fn extend(&mut self, lines: &[String]) {
        for line in lines {
            if self.seen.insert(line.clone()) {
                self.lines.push(line.clone());
            }
        }
    }
}

/// Combine per-batch insights into one result.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `insights` is empty.
pub fn merge_insights(
    prospect_id: i64,
    insights: Vec<BatchInsight>,
    item_count: usize,
) -> Result<AnalysisResult, AnalysisError> {
    let batch_count = insights.len();
    let mut iter = insights.into_iter();
    let first = iter.next().ok_or(AnalysisError::EmptyInput)?;

    let mut themes = UniqueLines::default();
    let mut recommendations = UniqueLines::default();
    let mut segments = UniqueLines::default();
    let mut sentiments = Vec::new();
    for insight in std::iter::once(&first).chain(iter.as_slice()) {
        themes.extend(&insight.themes);
        recommendations.extend(&insight.recommendations);
        segments.extend(&insight.customer_segments);
        sentiments.extend(insight.sentiment);
    }

    Ok(AnalysisResult {
        prospect_id,
        key_insight: first.key_insight,
        themes: themes.lines,
        recommendations: recommendations.lines,
        sentiment: average_sentiment(&sentiments),
        customer_segments: segments.lines,
        report: first.report,
        batch_count: i32::try_from(batch_count).unwrap_or(i32::MAX),
        item_count: i32::try_from(item_count).unwrap_or(i32::MAX),
        generated_at: Utc::now(),
    })
}

/// Run the analysis stage for one prospect.
///
/// Invokes the model once per batch. Any batch failure aborts the whole
/// analysis; nothing partial is returned.
///
/// # Errors
///
/// Returns [`AnalysisError`] on empty input, an oversized item, a model
/// failure or timeout, or an unusable response.
pub async fn analyze(
    model: &dyn LanguageModel,
    config: &PipelineConfig,
    items: &[CleanedItem],
    brand_name: &str,
    prospect_id: i64,
) -> Result<AnalysisResult, AnalysisError> {
    let batches = build_batches(items, config.analysis_batch_chars)?;
    tracing::info!(
        brand = brand_name,
        prospect_id,
        count = items.len(),
        batches = batches.len(),
        "analyzing items"
    );

    let mut insights = Vec::with_capacity(batches.len());
    for (index, batch) in batches.iter().enumerate() {
        let prompt = build_prompt(brand_name, batch);
        let response = tokio::time::timeout(config.llm_timeout, model.complete(&prompt))
            .await
            .map_err(|_| AnalysisError::Timeout {
                batch: index,
                secs: config.llm_timeout.as_secs(),
            })?
            .map_err(|source| AnalysisError::Provider {
                batch: index,
                source,
            })?;
        insights.push(parse_response(index, &response)?);
        tracing::debug!(
            brand = brand_name,
            batch = index,
            items = batch.item_count,
            "batch analyzed"
        );
    }

    merge_insights(prospect_id, insights, items.len())
}
