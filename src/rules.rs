//! Signal libraries and thresholds.
//!
//! Every phrase list, pattern and tunable number the detectors read lives in a
//! [`Ruleset`]. The default value is the built-in library; a TOML file can
//! override any part of it, and whatever it leaves out keeps the default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Promotional
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionalRules {
    /// Distinct keyword hits at which a post is rejected outright.
    pub min_keyword_hits: usize,
    pub max_hashtags: usize,
    pub max_emoji: usize,
    /// Runs of four or more capitals tolerated before the post reads as shouting.
    pub max_caps_runs: usize,
    pub keywords: Vec<String>,
    pub patterns: Vec<String>,
}

impl Default for PromotionalRules {
    fn default() -> Self {
        Self {
            min_keyword_hits: 2,
            max_hashtags: 4,
            max_emoji: 6,
            max_caps_runs: 2,
            keywords: strings(&[
                // Sales
                "buy now",
                "limited time",
                "sale",
                "discount",
                "promo code",
                "coupon",
                "free shipping",
                "order now",
                "click here",
                "sign up now",
                "register now",
                "get yours",
                "don't miss out",
                "exclusive offer",
                "special deal",
                "flash sale",
                "today only",
                "hurry up",
                "act fast",
                "while supplies last",
                // Sponsorship
                "affiliate",
                "sponsored",
                "ad",
                "#ad",
                "paid partnership",
                "gifted",
                "promo",
                "collaboration",
                "brand partner",
                "ambassador",
                // Giveaways
                "giveaway",
                "contest",
                "win",
                "winner",
                "prize",
                "raffle",
                "follow and retweet",
                "rt to win",
                "tag friends",
                "enter to win",
                // Calls to action
                "check out",
                "link in bio",
                "swipe up",
                "shop now",
                "learn more",
                "book now",
                "reserve now",
                "download now",
                "try now",
                "get started",
                "join now",
                "subscribe",
                "follow for more",
                "turn on notifications",
            ]),
            patterns: strings(&[
                r"\b\d+%\s*(off|discount|sale)\b",
                r"\$\d+.*\b(off|discount|sale)\b",
                r"\b(free|save)\s+\$\d+\b",
                r"\b(use code|promo code|coupon)\b",
                r"\b(limited time|ends soon|today only)\b",
                r"\b(link in bio|linktree|linktr\.ee)\b",
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotRules {
    /// Generic replies only count as bot output below this many chars.
    pub short_reply_max_chars: usize,
    /// Repetition is only judged on posts with more words than this.
    pub repetition_min_words: usize,
    pub min_unique_word_ratio: f64,
    pub generic_replies: Vec<String>,
    pub patterns: Vec<String>,
}

impl Default for BotRules {
    fn default() -> Self {
        Self {
            short_reply_max_chars: 10,
            repetition_min_words: 2,
            min_unique_word_ratio: 0.5,
            generic_replies: strings(&["ok", "yes", "no", "thanks", "nice", "cool", "great"]),
            patterns: strings(&[
                r"^(good morning|gm|good night|gn)\s*[!.]*\s*$",
                r"^(thanks?|thank you)\s+(for\s+the\s+)?(follow|rt|retweet)\s*[!.]*\s*$",
                r"^\d+/\d+$",
                r"^(breaking|update|alert):\s*$",
                r"^(this|that|it)\s+(is|was)\s+(amazing|great|awesome|incredible)\s*[!.]*\s*$",
                r"^(wow|omg|amazing|incredible)\s*[!.]*\s*$",
                r"^(yes|no|maybe|true|false)\s*[!.]*\s*$",
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Human score
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub base: f64,
    /// Per indicator phrase. Uncapped; only the final clamp applies.
    pub indicator: f64,
    pub pattern: f64,
    pub contraction: f64,
    pub contraction_cap: f64,
    pub question: f64,
    pub question_cap: f64,
    pub casual: f64,
    pub casual_cap: f64,
    pub pronoun: f64,
    pub pronoun_cap: f64,
    pub length_bonus: f64,
    pub length_bonus_min_chars: usize,
    pub length_bonus_max_chars: usize,
    pub long_length_bonus: f64,
    pub long_length_max_chars: usize,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 0.3,
            indicator: 0.1,
            pattern: 0.15,
            contraction: 0.1,
            contraction_cap: 0.2,
            question: 0.05,
            question_cap: 0.15,
            casual: 0.08,
            casual_cap: 0.2,
            pronoun: 0.05,
            pronoun_cap: 0.15,
            length_bonus: 0.1,
            length_bonus_min_chars: 20,
            length_bonus_max_chars: 200,
            long_length_bonus: 0.05,
            long_length_max_chars: 280,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanRules {
    pub indicators: Vec<String>,
    pub patterns: Vec<String>,
    pub casual_markers: Vec<String>,
    pub weights: ScoreWeights,
}

impl Default for HumanRules {
    fn default() -> Self {
        Self {
            indicators: strings(&[
                // Personal experience
                "i think",
                "i feel",
                "i believe",
                "in my opinion",
                "personally",
                "from my experience",
                "i noticed",
                "i remember",
                "i used to",
                "i've been",
                "i've seen",
                "i've tried",
                "i've found",
                "we tried",
                // Conversation
                "what do you think",
                "thoughts?",
                "anyone else",
                "has anyone",
                "does anyone know",
                "can someone",
                "help me understand",
                "am i the only one",
                "maybe i'm wrong",
                "correct me if",
                // Emotion
                "frustrated",
                "excited",
                "disappointed",
                "surprised",
                "confused",
                "worried",
                "happy",
                "annoyed",
                "curious",
                "concerned",
                // Hedging
                "not sure",
                "maybe",
                "probably",
                "i guess",
                "i suppose",
                "could be wrong",
                "might be",
                "seems like",
                "looks like",
                // Questions
                "why",
                "how",
                "what",
                "when",
                "where",
                "who",
                "explain",
                "understand",
                "clarify",
                "elaborate",
            ]),
            patterns: strings(&[
                r"\b(just|recently|yesterday|today|this morning)\s+(experienced|tried|noticed|saw|found)\b",
                r"\b(has anyone|does anyone|can someone|would anyone)\b",
                r"\b(i'm|i am)\s+(thinking|wondering|curious|confused|frustrated)\b",
                r"\?.*\?",
                r"\b(update|edit|correction):\s*",
                r"\b(tbh|honestly|ngl|imo|imho)\b",
            ]),
            casual_markers: strings(&["tbh", "ngl", "imo", "imho", "lol", "omg", "btw", "idk"]),
            weights: ScoreWeights::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reply-worthiness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorthinessRules {
    /// Case-sensitive prefix marking a retweet.
    pub retweet_prefix: String,
    pub min_chars: usize,
    pub indicators: Vec<String>,
}

impl Default for WorthinessRules {
    fn default() -> Self {
        Self {
            retweet_prefix: "RT @".to_string(),
            min_chars: 15,
            indicators: strings(&[
                // Problems
                "having trouble",
                "problem with",
                "issue with",
                "can't figure out",
                "not working",
                "broken",
                "failed",
                "error",
                "bug",
                // Advice
                "which should i",
                "what would you",
                "how do i",
                "where can i",
                "anyone recommend",
                "suggestions",
                "advice",
                "help",
                // Opinions
                "thoughts on",
                "opinion about",
                "what do you think about",
                "agree or disagree",
                "am i right",
                "change my mind",
                // Experiences
                "just tried",
                "been using",
                "switched to",
                "moved from",
                "experience with",
                "compared to",
                "better than",
                "worse than",
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Ruleset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub promotional: PromotionalRules,
    pub bot: BotRules,
    pub human: HumanRules,
    pub worthiness: WorthinessRules,
}

impl Ruleset {
    /// Load a ruleset from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let rules: Ruleset = toml::from_str(content)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject thresholds that would break the score's [0, 1] range or make
    /// the repetition check meaningless.
    pub fn validate(&self) -> Result<()> {
        let w = &self.human.weights;
        if !(0.0..=1.0).contains(&w.base) {
            return Err(Error::Config(format!(
                "human.weights.base must be within [0, 1], got {}",
                w.base
            )));
        }

        let named = [
            ("indicator", w.indicator),
            ("pattern", w.pattern),
            ("contraction", w.contraction),
            ("contraction_cap", w.contraction_cap),
            ("question", w.question),
            ("question_cap", w.question_cap),
            ("casual", w.casual),
            ("casual_cap", w.casual_cap),
            ("pronoun", w.pronoun),
            ("pronoun_cap", w.pronoun_cap),
            ("length_bonus", w.length_bonus),
            ("long_length_bonus", w.long_length_bonus),
        ];
        if let Some((name, value)) = named.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(Error::Config(format!(
                "human.weights.{name} must be finite and non-negative, got {value}"
            )));
        }

        if w.length_bonus_min_chars > w.length_bonus_max_chars
            || w.length_bonus_max_chars > w.long_length_max_chars
        {
            return Err(Error::Config(format!(
                "length bonus bounds must be ordered, got {} <= {} <= {}",
                w.length_bonus_min_chars, w.length_bonus_max_chars, w.long_length_max_chars
            )));
        }

        let ratio = self.bot.min_unique_word_ratio;
        if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
            return Err(Error::Config(format!(
                "bot.min_unique_word_ratio must be within (0, 1], got {ratio}"
            )));
        }

        Ok(())
    }
}
