//! Plain-text rendering of the list screens.
//!
//! Each view loads its rows through [`load_or_empty`], so a failed read is
//! logged and shown as an empty list instead of aborting the command.

use std::fmt::Write as _;

use arogya_chat::TranscriptEntry;
use arogya_core::display::{
    availability_color, directions_url, notification_status_color, severity_color,
    status_label, vaccination_status_color,
};
use arogya_core::error::ArogyaError;
use arogya_core::types::{
    HealthTip, Hospital, Message, Notification, OutbreakAlert, QueryLogEntry, Sender,
    VaccinationRecord,
};

/// Unwrap a list read, degrading to an empty list on error.
pub fn load_or_empty<T>(view: &str, result: Result<Vec<T>, ArogyaError>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(view, error = %e, "Failed to load list");
            Vec::new()
        }
    }
}

fn empty(what: &str) -> String {
    format!("No {} found.\n", what)
}

pub fn render_health_tips(tips: &[HealthTip]) -> String {
    if tips.is_empty() {
        return empty("health tips");
    }
    let mut out = String::new();
    for tip in tips {
        let _ = writeln!(
            out,
            "{} [{}] (updated {})",
            tip.topic,
            tip.language.native_name(),
            tip.last_updated.format("%Y-%m-%d")
        );
        let _ = writeln!(out, "  {}", tip.content);
    }
    out
}

pub fn render_vaccinations(records: &[VaccinationRecord]) -> String {
    if records.is_empty() {
        return empty("vaccination records");
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{:<24} due {}  [{}:{}]",
            record.vaccine_name,
            record.due_date,
            status_label(&record.status),
            vaccination_status_color(&record.status)
        );
    }
    out
}

pub fn render_alerts(alerts: &[OutbreakAlert]) -> String {
    if alerts.is_empty() {
        return empty("outbreak alerts");
    }
    let mut out = String::new();
    for alert in alerts {
        let _ = writeln!(
            out,
            "{} in {} ({})  [{}:{}]",
            alert.disease_name,
            alert.location,
            alert.issued_date,
            status_label(&alert.severity),
            severity_color(&alert.severity)
        );
        if !alert.recommended_measures.is_empty() {
            let _ = writeln!(out, "  Measures: {}", alert.recommended_measures);
        }
    }
    out
}

pub fn render_hospitals(hospitals: &[Hospital]) -> String {
    if hospitals.is_empty() {
        return empty("hospitals");
    }
    let mut out = String::new();
    for hospital in hospitals {
        let _ = writeln!(
            out,
            "{}  [{}:{}]",
            hospital.name,
            status_label(&hospital.availability),
            availability_color(&hospital.availability)
        );
        let _ = writeln!(out, "  {}  tel {}", hospital.address, hospital.phone);
        if let Some(url) = directions_url(&hospital.geo_location) {
            let _ = writeln!(out, "  Directions: {}", url);
        }
    }
    out
}

pub fn render_notifications(notifications: &[Notification]) -> String {
    if notifications.is_empty() {
        return empty("notifications");
    }
    let mut out = String::new();
    for n in notifications {
        let _ = writeln!(
            out,
            "{} {} via {}  [{}:{}]",
            n.schedule_time.format("%Y-%m-%d %H:%M"),
            n.kind,
            n.channel,
            status_label(&n.status),
            notification_status_color(&n.status)
        );
        let _ = writeln!(out, "  {}", n.content);
    }
    out
}

fn speaker(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "you",
        Sender::Bot => "assistant",
    }
}

pub fn render_history(messages: &[Message]) -> String {
    if messages.is_empty() {
        return empty("messages");
    }
    let mut out = String::new();
    for m in messages {
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            m.created_at.format("%H:%M"),
            speaker(m.sender),
            m.text
        );
    }
    out
}

pub fn render_audit(entries: &[QueryLogEntry]) -> String {
    if entries.is_empty() {
        return empty("audit entries");
    }
    let mut out = String::new();
    for e in entries {
        let _ = writeln!(
            out,
            "{} {:?} -> {}",
            e.created_at.format("%Y-%m-%d %H:%M:%S"),
            e.query,
            e.response
        );
    }
    out
}

/// One transcript line as shown during an interactive session.
pub fn render_entry(entry: &TranscriptEntry) -> String {
    if entry.is_error {
        format!("! {}", entry.text)
    } else {
        format!("{}: {}", speaker(entry.sender), entry.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_load_or_empty_degrades() {
        let rows: Vec<u32> = load_or_empty("hospitals", Err(ArogyaError::Storage("locked".into())));
        assert!(rows.is_empty());
        assert_eq!(load_or_empty("hospitals", Ok(vec![1, 2])), vec![1, 2]);
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(render_hospitals(&[]), "No hospitals found.\n");
        assert_eq!(render_alerts(&[]), "No outbreak alerts found.\n");
    }

    #[test]
    fn test_hospital_rendering() {
        let hospitals = vec![
            Hospital {
                id: Uuid::new_v4(),
                name: "KEM".to_string(),
                address: "Rasta Peth".to_string(),
                phone: "020-2612".to_string(),
                availability: "Available".to_string(),
                geo_location: "18.51,73.86".to_string(),
            },
            Hospital {
                id: Uuid::new_v4(),
                name: "Ruby Hall".to_string(),
                address: "Sassoon Road".to_string(),
                phone: "020-6645".to_string(),
                availability: "full".to_string(),
                geo_location: String::new(),
            },
        ];
        let out = render_hospitals(&hospitals);
        assert!(out.contains("KEM  [available:green]"));
        assert!(out.contains("query=18.51%2C73.86"));
        assert!(out.contains("Ruby Hall  [full:red]"));
        assert_eq!(out.matches("Directions:").count(), 1);
    }

    #[test]
    fn test_vaccination_and_alert_badges() {
        let record = VaccinationRecord {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            vaccine_name: "Hepatitis B".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            status: "OVERDUE".to_string(),
        };
        assert!(render_vaccinations(&[record]).contains("[overdue:red]"));

        let alert = OutbreakAlert {
            id: Uuid::new_v4(),
            disease_name: "Dengue".to_string(),
            severity: "Medium".to_string(),
            location: "Mumbai".to_string(),
            issued_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            recommended_measures: String::new(),
        };
        let out = render_alerts(&[alert]);
        assert!(out.contains("Dengue in Mumbai (2026-09-01)  [medium:yellow]"));
        assert!(!out.contains("Measures"));
    }

    #[test]
    fn test_notification_rendering() {
        let n = Notification {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            kind: "reminder".to_string(),
            channel: "sms".to_string(),
            content: "Flu shot tomorrow".to_string(),
            schedule_time: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            status: "queued".to_string(),
        };
        let out = render_notifications(&[n]);
        assert!(out.starts_with("2026-10-18 09:30 reminder via sms  [queued:gray]"));
    }

    #[test]
    fn test_render_entry() {
        let entry = TranscriptEntry {
            sender: Sender::Bot,
            text: "Failed to send message".to_string(),
            timestamp: Utc::now(),
            is_error: true,
        };
        assert_eq!(render_entry(&entry), "! Failed to send message");

        let entry = TranscriptEntry {
            is_error: false,
            sender: Sender::User,
            ..entry
        };
        assert_eq!(render_entry(&entry), "you: Failed to send message");
    }
}
