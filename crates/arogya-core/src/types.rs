use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ArogyaError;

// =============================================================================
// Enums
// =============================================================================

/// Languages the application ships content for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (default).
    #[default]
    En,
    /// Hindi.
    Hi,
    /// Marathi.
    Mr,
    /// Tamil.
    Ta,
    /// Bengali.
    Bn,
    /// Malayalam.
    Ml,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Hi,
        Language::Mr,
        Language::Ta,
        Language::Bn,
        Language::Ml,
    ];

    /// ISO 639-1 code stored in the database.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Mr => "mr",
            Language::Ta => "ta",
            Language::Bn => "bn",
            Language::Ml => "ml",
        }
    }

    /// Native display name.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "हिंदी",
            Language::Mr => "मराठी",
            Language::Ta => "தமிழ்",
            Language::Bn => "বাংলা",
            Language::Ml => "മലയാളം",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ArogyaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ArogyaError::Serialization(format!("unknown language code: {}", s)))
    }
}

/// Who authored a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = ArogyaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(ArogyaError::Serialization(format!(
                "unknown sender: {}",
                other
            ))),
        }
    }
}

/// Lifecycle status of a conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Active,
    Closed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Closed => "closed",
        }
    }
}

impl FromStr for ConversationStatus {
    type Err = ArogyaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConversationStatus::Active),
            "closed" => Ok(ConversationStatus::Closed),
            other => Err(ArogyaError::Serialization(format!(
                "unknown conversation status: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Assistant records
// =============================================================================

/// A logical session grouping one user's exchange with the assistant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub channel: String,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
}

/// An immutable, append-only conversation message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Audit record pairing a raw query with its eventual response.
///
/// `response` holds the pending placeholder until the turn completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub query: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Read-only feed records
// =============================================================================

/// A knowledge-base article shown on the health tips screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthTip {
    pub id: Uuid,
    pub topic: String,
    pub content: String,
    pub language: Language,
    pub last_updated: DateTime<Utc>,
}

/// One scheduled or administered vaccine dose for a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub vaccine_name: String,
    pub due_date: NaiveDate,
    /// `completed`, `pending` or `overdue`; other values render as unknown.
    pub status: String,
}

/// A public-health outbreak bulletin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutbreakAlert {
    pub id: Uuid,
    pub disease_name: String,
    /// `high`, `medium` or `low`.
    pub severity: String,
    pub location: String,
    pub issued_date: NaiveDate,
    pub recommended_measures: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub availability: String,
    /// Free-form location passed verbatim to the maps search URL.
    pub geo_location: String,
}

/// A reminder or bulletin delivered to a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: String,
    pub content: String,
    pub schedule_time: DateTime<Utc>,
    /// `sent`, `pending` or `failed`.
    pub status: String,
}
