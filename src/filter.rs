use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{AnnotatedRecord, Record};
use crate::rules::Ruleset;

/// Threshold used when the caller has no opinion.
pub const DEFAULT_MIN_HUMAN_SCORE: f64 = 0.3;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// The rule that decided whether a post is worth replying to, in the order
/// the rules are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Worthiness {
    Question,
    Indicator,
    Retweet,
    TooShort,
    NoSignal,
}

impl Worthiness {
    pub fn is_worthy(self) -> bool {
        matches!(self, Worthiness::Question | Worthiness::Indicator)
    }
}

/// Raw feature counts behind the verdicts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signals {
    pub promo_keywords: usize,
    pub human_indicators: usize,
    pub genuine_patterns: usize,
    pub contractions: usize,
    pub question_marks: usize,
    pub casual_markers: usize,
    pub pronouns: usize,
    pub hashtags: usize,
    pub emoji: usize,
    pub caps_runs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub promotional: bool,
    pub bot: bool,
    pub human_score: f64,
    pub worthiness: Worthiness,
    pub reply_worthy: bool,
    pub char_count: usize,
    pub signals: Signals,
}

/// Why records left the pipeline. Every dropped record is counted under the
/// first reason that applied, so the counters always sum to `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub total: usize,
    pub promotional: usize,
    pub bot: usize,
    pub below_threshold: usize,
    pub not_reply_worthy: usize,
    pub kept: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.total - self.kept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub records: Vec<AnnotatedRecord>,
    pub stats: FilterStats,
}

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").unwrap());

static CAPS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{4,}").unwrap());

static CONTRACTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+'[a-z]+\b").unwrap());

static PRONOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(i|my|me|myself|we|us|our)\b").unwrap());

static MENTIONS_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(@\w+\s*)+$").unwrap());

static URLS_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(https?://\S+\s*)+$").unwrap());

static BUILTIN: Lazy<ReplyFilter> =
    Lazy::new(|| ReplyFilter::new(Ruleset::default()).expect("built-in ruleset is valid"));

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| Error::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}

/// Number of phrases that occur anywhere in `text`. Each phrase counts once.
fn count_contained(text: &str, phrases: &[String]) -> usize {
    phrases
        .iter()
        .filter(|phrase| !phrase.is_empty() && text.contains(phrase.as_str()))
        .count()
}

fn count_matching(text: &str, patterns: &[Regex]) -> usize {
    patterns.iter().filter(|re| re.is_match(text)).count()
}

// Emoticons, misc symbols and pictographs, transport and map, regional flags.
fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F | 0x1F300..=0x1F5FF | 0x1F680..=0x1F6FF | 0x1F1E0..=0x1F1FF
    )
}

fn capped(count: usize, weight: f64, cap: f64) -> f64 {
    (count as f64 * weight).min(cap)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// A [`Ruleset`] compiled for matching.
///
/// All checks take `&self` and read nothing but the post in front of them, so
/// one filter can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct ReplyFilter {
    rules: Ruleset,
    promo_patterns: Vec<Regex>,
    bot_patterns: Vec<Regex>,
    genuine_patterns: Vec<Regex>,
}

impl Default for ReplyFilter {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl ReplyFilter {
    /// Validate and compile a ruleset. Patterns are always matched
    /// case-insensitively.
    pub fn new(rules: Ruleset) -> Result<Self> {
        rules.validate()?;
        Ok(Self {
            promo_patterns: compile_patterns(&rules.promotional.patterns)?,
            bot_patterns: compile_patterns(&rules.bot.patterns)?,
            genuine_patterns: compile_patterns(&rules.human.patterns)?,
            rules,
        })
    }

    /// The filter compiled from the built-in ruleset, shared process-wide.
    pub fn builtin() -> &'static ReplyFilter {
        &BUILTIN
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    pub fn is_promotional(&self, record: &Record) -> bool {
        self.promotional(&record.content)
    }

    pub fn is_bot_content(&self, record: &Record) -> bool {
        self.bot(&record.content)
    }

    pub fn calculate_human_score(&self, record: &Record) -> f64 {
        self.human_score(&record.content)
    }

    pub fn is_reply_worthy(&self, record: &Record) -> bool {
        self.worthiness(&record.content).is_worthy()
    }

    // -- Promotional --------------------------------------------------------

    fn promotional(&self, content: &str) -> bool {
        let rules = &self.rules.promotional;
        let text = content.to_lowercase();

        if count_contained(&text, &rules.keywords) >= rules.min_keyword_hits {
            return true;
        }
        if self.promo_patterns.iter().any(|re| re.is_match(&text)) {
            return true;
        }
        if HASHTAG_RE.find_iter(&text).count() > rules.max_hashtags {
            return true;
        }
        if text.chars().filter(|&c| is_emoji(c)).count() > rules.max_emoji {
            return true;
        }
        // Shouting is judged on the text as written.
        CAPS_RUN_RE.find_iter(content).count() > rules.max_caps_runs
    }

    // -- Bot ----------------------------------------------------------------

    fn bot(&self, content: &str) -> bool {
        let rules = &self.rules.bot;
        let lowered = content.to_lowercase();
        let text = lowered.trim();

        if self.bot_patterns.iter().any(|re| re.is_match(text)) {
            return true;
        }

        if text.chars().count() < rules.short_reply_max_chars
            && rules.generic_replies.iter().any(|reply| reply == text)
        {
            return true;
        }

        if MENTIONS_ONLY_RE.is_match(text) || URLS_ONLY_RE.is_match(text) {
            return true;
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() > rules.repetition_min_words {
            let unique: HashSet<&str> = words.iter().copied().collect();
            if (unique.len() as f64) < words.len() as f64 * rules.min_unique_word_ratio {
                return true;
            }
        }

        false
    }

    // -- Human score ----------------------------------------------------------

    /// Count every signal the detectors look at.
    pub fn signals(&self, content: &str) -> Signals {
        let text = content.to_lowercase();
        let human = &self.rules.human;
        Signals {
            promo_keywords: count_contained(&text, &self.rules.promotional.keywords),
            human_indicators: count_contained(&text, &human.indicators),
            genuine_patterns: count_matching(&text, &self.genuine_patterns),
            contractions: CONTRACTION_RE.find_iter(&text).count(),
            question_marks: text.matches('?').count(),
            casual_markers: count_contained(&text, &human.casual_markers),
            pronouns: PRONOUN_RE.find_iter(&text).count(),
            hashtags: HASHTAG_RE.find_iter(&text).count(),
            emoji: text.chars().filter(|&c| is_emoji(c)).count(),
            caps_runs: CAPS_RUN_RE.find_iter(content).count(),
        }
    }

    fn score_signals(&self, signals: &Signals, char_count: usize) -> f64 {
        let w = &self.rules.human.weights;

        let mut score = w.base;
        score += signals.human_indicators as f64 * w.indicator;
        score += signals.genuine_patterns as f64 * w.pattern;
        score += capped(signals.contractions, w.contraction, w.contraction_cap);
        score += capped(signals.question_marks, w.question, w.question_cap);
        score += capped(signals.casual_markers, w.casual, w.casual_cap);
        score += capped(signals.pronouns, w.pronoun, w.pronoun_cap);

        if (w.length_bonus_min_chars..=w.length_bonus_max_chars).contains(&char_count) {
            score += w.length_bonus;
        } else if char_count > w.length_bonus_max_chars && char_count <= w.long_length_max_chars {
            score += w.long_length_bonus;
        }

        score.clamp(0.0, 1.0)
    }

    /// Unrounded human score of a text, in [0, 1].
    pub fn human_score(&self, content: &str) -> f64 {
        let signals = self.signals(content);
        self.score_signals(&signals, content.chars().count())
    }

    // -- Reply-worthiness -----------------------------------------------------

    pub fn worthiness(&self, content: &str) -> Worthiness {
        let rules = &self.rules.worthiness;
        let text = content.to_lowercase();

        if text.contains('?') {
            Worthiness::Question
        } else if count_contained(&text, &rules.indicators) >= 1 {
            Worthiness::Indicator
        } else if content.starts_with(&rules.retweet_prefix) {
            Worthiness::Retweet
        } else if content.chars().count() < rules.min_chars {
            Worthiness::TooShort
        } else {
            Worthiness::NoSignal
        }
    }

    // -- Analysis -------------------------------------------------------------

    pub fn analyze(&self, content: &str) -> ContentAnalysis {
        let char_count = content.chars().count();
        let signals = self.signals(content);
        let worthiness = self.worthiness(content);
        ContentAnalysis {
            promotional: self.promotional(content),
            bot: self.bot(content),
            human_score: round2(self.score_signals(&signals, char_count)),
            worthiness,
            reply_worthy: worthiness.is_worthy(),
            char_count,
            signals,
        }
    }

    // -- Pipeline -------------------------------------------------------------

    /// Drop promotional and bot posts, annotate the rest, keep the human and
    /// reply-worthy ones and rank them by score. Equal scores keep input order.
    pub fn filter_for_replies<I>(&self, records: I, min_human_score: f64) -> Vec<AnnotatedRecord>
    where
        I: IntoIterator<Item = Record>,
    {
        self.filter_with_stats(records, min_human_score).records
    }

    pub fn filter_with_stats<I>(&self, records: I, min_human_score: f64) -> FilterOutcome
    where
        I: IntoIterator<Item = Record>,
    {
        let mut stats = FilterStats::default();
        let mut kept = Vec::new();

        for record in records {
            stats.total += 1;

            if self.is_promotional(&record) {
                debug!(id = %record.id, "dropping promotional record");
                stats.promotional += 1;
                continue;
            }
            if self.is_bot_content(&record) {
                debug!(id = %record.id, "dropping bot record");
                stats.bot += 1;
                continue;
            }

            let human_score = self.calculate_human_score(&record);
            let reply_worthy = self.is_reply_worthy(&record);

            // Written as a `>=` test so a NaN threshold keeps nothing.
            let clears_threshold = human_score >= min_human_score;
            if !clears_threshold {
                debug!(id = %record.id, human_score, min_human_score, "dropping record below threshold");
                stats.below_threshold += 1;
                continue;
            }
            if !reply_worthy {
                debug!(id = %record.id, "dropping record not worth a reply");
                stats.not_reply_worthy += 1;
                continue;
            }

            kept.push(AnnotatedRecord::new(record, round2(human_score), reply_worthy));
        }

        // `sort_by` is stable, so ties stay in input order.
        kept.sort_by(|a, b| b.human_score.total_cmp(&a.human_score));
        stats.kept = kept.len();

        info!(
            total = stats.total,
            kept = stats.kept,
            promotional = stats.promotional,
            bot = stats.bot,
            below_threshold = stats.below_threshold,
            not_reply_worthy = stats.not_reply_worthy,
            "filtered records for replies"
        );

        FilterOutcome {
            records: kept,
            stats,
        }
    }
}
