//! Rule-based reply generation.
//!
//! A reply is chosen by scanning an ordered table of keyword groups against
//! the lowercased query. The first group with any keyword contained in the
//! query wins; when nothing matches, the fallback reply is returned. Group
//! order is significant: "fever and hospital" answers with fever guidance.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use arogya_core::config::AssistantConfig;

use crate::error::ChatError;

pub const FEVER_REPLY: &str = "I understand you're experiencing fever. Common causes include infections, flu, or COVID-19. Please monitor your temperature and if it persists above 102°F (38.9°C) or you have difficulty breathing, seek immediate medical attention. Would you like me to find nearby hospitals?";

pub const HEADACHE_REPLY: &str = "Headaches can be caused by stress, dehydration, or other conditions. Try resting in a quiet, dark room and staying hydrated. If the headache is severe or accompanied by vision problems, seek medical help. Would you like preventive health tips?";

pub const COUGH_COLD_REPLY: &str = "For cough and cold, stay hydrated, rest well, and consider warm liquids. If symptoms worsen or persist beyond a week, please consult a doctor. I can help you find nearby hospitals or check vaccination schedules.";

pub const EMERGENCY_REPLY: &str = "This seems urgent. I'm alerting your registered family members and finding the nearest hospitals. Please call emergency services (108 in India) if needed. Stay calm and describe your symptoms.";

pub const VACCINATION_REPLY: &str = "You can check your vaccination schedule in the Vaccination tab. Common vaccines include COVID-19, Flu, Hepatitis B, and others. Would you like to see your upcoming vaccinations?";

pub const HOSPITAL_REPLY: &str = "I can help you find nearby hospitals. Please check the Hospitals tab for a list of facilities with availability status and contact information.";

pub const GENERAL_REPLY: &str = "I'm here to help you with health information, symptom checking, vaccination schedules, and finding hospitals. How can I assist you today?";

/// Which keyword group answered a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReplyTopic {
    Fever,
    Headache,
    CoughCold,
    Emergency,
    Vaccination,
    Hospital,
    /// No group matched.
    General,
    /// A topic introduced by a loaded rule table.
    Other(String),
}

impl ReplyTopic {
    pub fn as_str(&self) -> &str {
        match self {
            ReplyTopic::Fever => "fever",
            ReplyTopic::Headache => "headache",
            ReplyTopic::CoughCold => "cough_cold",
            ReplyTopic::Emergency => "emergency",
            ReplyTopic::Vaccination => "vaccination",
            ReplyTopic::Hospital => "hospital",
            ReplyTopic::General => "general",
            ReplyTopic::Other(name) => name,
        }
    }
}

impl From<String> for ReplyTopic {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fever" => ReplyTopic::Fever,
            "headache" => ReplyTopic::Headache,
            "cough_cold" => ReplyTopic::CoughCold,
            "emergency" => ReplyTopic::Emergency,
            "vaccination" => ReplyTopic::Vaccination,
            "hospital" => ReplyTopic::Hospital,
            "general" => ReplyTopic::General,
            _ => ReplyTopic::Other(s),
        }
    }
}

impl From<ReplyTopic> for String {
    fn from(topic: ReplyTopic) -> Self {
        topic.as_str().to_string()
    }
}

impl fmt::Display for ReplyTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One keyword group: any keyword contained in the query selects `reply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub topic: ReplyTopic,
    pub keywords: Vec<String>,
    pub reply: String,
}

impl KeywordRule {
    fn new(topic: ReplyTopic, keywords: &[&str], reply: &str) -> Self {
        Self {
            topic,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            reply: reply.to_string(),
        }
    }

    /// `lowered` must already be lowercase.
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// On-disk form of a rule table.
#[derive(Debug, Deserialize)]
struct RuleTable {
    #[serde(default = "default_fallback")]
    fallback: String,
    #[serde(default)]
    rules: Vec<KeywordRule>,
}

fn default_fallback() -> String {
    GENERAL_REPLY.to_string()
}

static DEFAULT_RULES: LazyLock<Vec<KeywordRule>> = LazyLock::new(|| {
    vec![
        KeywordRule::new(ReplyTopic::Fever, &["fever", "temperature"], FEVER_REPLY),
        KeywordRule::new(ReplyTopic::Headache, &["headache", "head pain"], HEADACHE_REPLY),
        KeywordRule::new(ReplyTopic::CoughCold, &["cough", "cold"], COUGH_COLD_REPLY),
        KeywordRule::new(ReplyTopic::Emergency, &["emergency", "urgent"], EMERGENCY_REPLY),
        KeywordRule::new(ReplyTopic::Vaccination, &["vaccine", "vaccination"], VACCINATION_REPLY),
        KeywordRule::new(ReplyTopic::Hospital, &["hospital", "doctor"], HOSPITAL_REPLY),
    ]
});

/// Keyword-driven responder. Pure and deterministic; never fails at
/// reply time.
#[derive(Debug, Clone)]
pub struct RuleBasedResponder {
    rules: Vec<KeywordRule>,
    fallback: String,
}

impl Default for RuleBasedResponder {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
            fallback: GENERAL_REPLY.to_string(),
        }
    }
}

impl RuleBasedResponder {
    /// Build a responder from an explicit table.
    ///
    /// Keywords are lowercased and trimmed; a rule left with no keywords is
    /// rejected.
    pub fn with_rules(rules: Vec<KeywordRule>, fallback: String) -> Result<Self, ChatError> {
        let mut normalized = Vec::with_capacity(rules.len());
        for mut rule in rules {
            rule.keywords = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if rule.keywords.is_empty() {
                return Err(ChatError::RuleTable(format!(
                    "rule '{}' has no keywords",
                    rule.topic
                )));
            }
            normalized.push(rule);
        }
        Ok(Self {
            rules: normalized,
            fallback,
        })
    }

    /// Parse a TOML rule table.
    pub fn from_toml(content: &str) -> Result<Self, ChatError> {
        let table: RuleTable =
            toml::from_str(content).map_err(|e| ChatError::RuleTable(e.to_string()))?;
        Self::with_rules(table.rules, table.fallback)
    }

    /// Load a TOML rule table from disk.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::RuleTable(format!("failed to read {}: {}", path.display(), e))
        })?;
        let responder = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            rules = responder.rules.len(),
            "Loaded assistant rule table"
        );
        Ok(responder)
    }

    /// The table at `config.rules_path`, or the built-in one when unset.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, ChatError> {
        match config.rules_path.as_deref() {
            Some(path) => Self::load(Path::new(path)),
            None => Ok(Self::default()),
        }
    }

    /// The rule that answers `query`, if any.
    fn matching_rule(&self, query: &str) -> Option<&KeywordRule> {
        let lowered = query.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Reply text for `query`.
    pub fn respond(&self, query: &str) -> String {
        self.respond_with_topic(query).1
    }

    /// Topic and reply text for `query` from a single scan of the table.
    pub fn respond_with_topic(&self, query: &str) -> (ReplyTopic, String) {
        let (topic, reply) = match self.matching_rule(query) {
            Some(rule) => (rule.topic.clone(), rule.reply.clone()),
            None => (ReplyTopic::General, self.fallback.clone()),
        };
        debug!(topic = topic.as_str(), "Matched reply topic");
        (topic, reply)
    }

    /// Topic of the group that answers `query`, or [`ReplyTopic::General`].
    pub fn classify(&self, query: &str) -> ReplyTopic {
        self.matching_rule(query)
            .map(|rule| rule.topic.clone())
            .unwrap_or(ReplyTopic::General)
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}
