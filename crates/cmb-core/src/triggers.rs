//! Keyword triage: spam phrases, ticker intent and topic trigger groups.
//!
//! Matching is plain substring search on the lowercased message. Spam is always
//! checked first, then ticker intent. Topic groups are tried last in their
//! configured order and the first group with a matching phrase wins.

use std::{fmt, str::FromStr};

use crate::{
    errors::Error,
    ticker::{TickerDetector, TickerQuery},
    Result,
};

/// Fixed set of topic groups the bot knows how to answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopicGroup {
    PurchaseInfo,
    ProjectStatus,
    Roadmap,
    Utility,
    Team,
    Tax,
    Website,
    MoonSpeculation,
    Growth,
    GeneralQuestion,
}

impl TopicGroup {
    /// Declaration order, used when no explicit order is configured.
    pub const ALL: [TopicGroup; 10] = [
        TopicGroup::PurchaseInfo,
        TopicGroup::ProjectStatus,
        TopicGroup::Roadmap,
        TopicGroup::Utility,
        TopicGroup::Team,
        TopicGroup::Tax,
        TopicGroup::Website,
        TopicGroup::MoonSpeculation,
        TopicGroup::Growth,
        TopicGroup::GeneralQuestion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TopicGroup::PurchaseInfo => "purchase-info",
            TopicGroup::ProjectStatus => "project-status",
            TopicGroup::Roadmap => "roadmap",
            TopicGroup::Utility => "utility",
            TopicGroup::Team => "team",
            TopicGroup::Tax => "tax",
            TopicGroup::Website => "website",
            TopicGroup::MoonSpeculation => "moon-speculation",
            TopicGroup::Growth => "growth",
            TopicGroup::GeneralQuestion => "general-question",
        }
    }

    pub fn default_phrases(self) -> &'static [&'static str] {
        match self {
            TopicGroup::PurchaseInfo => &[
                "how to buy",
                "where to buy",
                "how do i buy",
                "where can i buy",
                "contract address",
            ],
            TopicGroup::ProjectStatus => &[
                "is this dead",
                "still alive",
                "any update",
                "what's happening",
                "whats happening",
                "rugged",
            ],
            TopicGroup::Roadmap => &["roadmap", "what's next", "whats next", "future plans"],
            TopicGroup::Utility => &["utility", "use case", "what does it do"],
            TopicGroup::Team => &["who is the dev", "the team", "founder", "devs"],
            TopicGroup::Tax => &["tax", "buy fee", "sell fee"],
            TopicGroup::Website => &["website", "official link", "socials"],
            TopicGroup::MoonSpeculation => &["moon", "100x", "1000x", "lambo"],
            TopicGroup::Growth => &["marketing", "holders", "listing", "grow"],
            TopicGroup::GeneralQuestion => &["what is", "explain", "anyone know", "wen"],
        }
    }
}

impl fmt::Display for TopicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let norm = s.trim().to_lowercase().replace('_', "-");
        TopicGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == norm)
            .ok_or_else(|| Error::Config(format!("unknown trigger group: {s}")))
    }
}

/// Category assigned to a message by triage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerCategory {
    Spam,
    Ticker(TickerQuery),
    Topic(TopicGroup),
}

/// The category plus the phrase (or ticker keyword) that caused it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    pub category: TriggerCategory,
    pub phrase: String,
}

/// Phrases that mark a message as spam (checked before anything else).
pub const DEFAULT_SPAM_PHRASES: &[&str] = &[
    "dm me",
    "dm you",
    "pm me",
    "promo",
    "collab",
    "partnership",
    "pump group",
    "guaranteed profit",
    "free crypto",
    "investment opportunity",
    "airdrop claim",
    "send me your",
    "whatsapp",
];

/// Ordered trigger configuration.
#[derive(Clone, Debug)]
pub struct TriggerSet {
    spam: Vec<String>,
    groups: Vec<(TopicGroup, Vec<String>)>,
}

impl Default for TriggerSet {
    fn default() -> Self {
        Self::with_order(&TopicGroup::ALL)
    }
}

impl TriggerSet {
    /// Default phrases, topic groups tried in `order`. Groups missing from `order` are disabled.
    pub fn with_order(order: &[TopicGroup]) -> Self {
        let mut seen = Vec::new();
        let groups = order
            .iter()
            .copied()
            .filter(|g| {
                if seen.contains(g) {
                    return false;
                }
                seen.push(*g);
                true
            })
            .map(|g| (g, g.default_phrases().iter().map(|p| p.to_string()).collect()))
            .collect();

        Self {
            spam: DEFAULT_SPAM_PHRASES.iter().map(|p| p.to_string()).collect(),
            groups,
        }
    }

    /// Replace the spam phrase list (phrases are normalized to lowercase).
    pub fn with_spam_phrases(mut self, phrases: Vec<String>) -> Self {
        self.spam = normalize(phrases);
        self
    }

    /// First spam phrase found in `lowered`.
    pub fn spam_match(&self, lowered: &str) -> Option<TriggerMatch> {
        self.spam
            .iter()
            .find(|p| lowered.contains(p.as_str()))
            .map(|p| TriggerMatch {
                category: TriggerCategory::Spam,
                phrase: p.clone(),
            })
    }

    /// First topic phrase found in `lowered`, honoring group order.
    pub fn topic_match(&self, lowered: &str) -> Option<TriggerMatch> {
        for (group, phrases) in &self.groups {
            if let Some(p) = phrases.iter().find(|p| lowered.contains(p.as_str())) {
                return Some(TriggerMatch {
                    category: TriggerCategory::Topic(*group),
                    phrase: p.clone(),
                });
            }
        }
        None
    }
}

/// Full triage: spam, then ticker intent, then topics.
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    triggers: TriggerSet,
    detector: TickerDetector,
}

impl Classifier {
    pub fn new(triggers: TriggerSet, detector: TickerDetector) -> Self {
        Self { triggers, detector }
    }

    /// `None` means the message is not for us.
    pub fn classify(&self, text: &str) -> Option<TriggerMatch> {
        let lowered = text.to_lowercase();
        if let Some(hit) = self.triggers.spam_match(&lowered) {
            return Some(hit);
        }
        if let Some(query) = self.detector.detect(text) {
            return Some(TriggerMatch {
                phrase: query.keyword.clone(),
                category: TriggerCategory::Ticker(query),
            });
        }
        self.triggers.topic_match(&lowered)
    }
}

fn normalize(phrases: Vec<String>) -> Vec<String> {
    phrases
        .into_iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Parse a comma separated list of group names (`TRIGGER_ORDER`).
pub fn parse_order(csv: &str) -> Result<Vec<TopicGroup>> {
    let order = csv
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(TopicGroup::from_str)
        .collect::<Result<Vec<_>>>()?;
    if order.is_empty() {
        return Err(Error::Config("TRIGGER_ORDER is empty".to_string()));
    }
    Ok(order)
}
