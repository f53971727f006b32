//! Read-only feeds behind the list screens.
//!
//! Each screen issues one filtered, sorted, limited read. Insert operations
//! exist for seeding and bulk import; nothing in the assistant flow writes
//! here.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use arogya_core::error::ArogyaError;
use arogya_core::types::{
    HealthTip, Hospital, Language, Notification, OutbreakAlert, VaccinationRecord,
};

use crate::db::Database;
use crate::repository::{from_millis, parse_uuid};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A batch of feed rows, as read from a JSON import file.
///
/// Every list is optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedImport {
    pub health_tips: Vec<HealthTip>,
    pub vaccination_records: Vec<VaccinationRecord>,
    pub outbreak_alerts: Vec<OutbreakAlert>,
    pub hospitals: Vec<Hospital>,
    pub notifications: Vec<Notification>,
}

impl FeedImport {
    pub fn total(&self) -> usize {
        self.health_tips.len()
            + self.vaccination_records.len()
            + self.outbreak_alerts.len()
            + self.hospitals.len()
            + self.notifications.len()
    }
}

/// Queries for health tips, vaccinations, alerts, hospitals, and notifications.
pub struct FeedRepository {
    db: Arc<Database>,
}

impl FeedRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Latest health tips in one language.
    pub fn health_tips(&self, language: Language, limit: u32) -> Result<Vec<HealthTip>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT kb_id, topic, content, language, last_updated
                     FROM knowledge_base_articles
                     WHERE language = ?1
                     ORDER BY last_updated DESC
                     LIMIT ?2",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![language.code(), limit], |row| {
                    Ok(row_to_health_tip(row))
                })
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut tips = Vec::new();
            for row in rows {
                tips.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(tips)
        })
    }

    /// A user's vaccination schedule, soonest due first.
    pub fn vaccination_records(&self, user_id: &str) -> Result<Vec<VaccinationRecord>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT record_id, user_id, vaccine_name, due_date, status
                     FROM vaccination_records
                     WHERE user_id = ?1
                     ORDER BY due_date ASC",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id], |row| {
                    Ok(row_to_vaccination_record(row))
                })
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(records)
        })
    }

    /// Most recently issued outbreak alerts.
    pub fn outbreak_alerts(&self, limit: u32) -> Result<Vec<OutbreakAlert>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT alert_id, disease_name, severity, location, issued_date, recommended_measures
                     FROM outbreak_alerts
                     ORDER BY issued_date DESC
                     LIMIT ?1",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![limit], |row| Ok(row_to_outbreak_alert(row)))
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut alerts = Vec::new();
            for row in rows {
                alerts.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(alerts)
        })
    }

    /// All hospitals, alphabetically.
    pub fn hospitals(&self) -> Result<Vec<Hospital>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT hospital_id, name, address, phone, availability, geo_location
                     FROM hospitals
                     ORDER BY name ASC",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| Ok(row_to_hospital(row)))
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut hospitals = Vec::new();
            for row in rows {
                hospitals.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(hospitals)
        })
    }

    /// A user's notifications, latest schedule time first.
    pub fn notifications(&self, user_id: &str, limit: u32) -> Result<Vec<Notification>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT notification_id, user_id, type, channel, content, schedule_time, status
                     FROM notifications
                     WHERE user_id = ?1
                     ORDER BY schedule_time DESC
                     LIMIT ?2",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(row_to_notification(row))
                })
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut notifications = Vec::new();
            for row in rows {
                notifications.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(notifications)
        })
    }

    // -----------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------

    /// Insert (or replace, by ID) every row of a batch in one transaction.
    ///
    /// Returns the number of rows written.
    pub fn import(&self, batch: &FeedImport) -> Result<usize, ArogyaError> {
        let written = self.db.with_conn_mut(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            for tip in &batch.health_tips {
                insert_health_tip(&tx, tip)?;
            }
            for record in &batch.vaccination_records {
                insert_vaccination_record(&tx, record)?;
            }
            for alert in &batch.outbreak_alerts {
                insert_outbreak_alert(&tx, alert)?;
            }
            for hospital in &batch.hospitals {
                insert_hospital(&tx, hospital)?;
            }
            for notification in &batch.notifications {
                insert_notification(&tx, notification)?;
            }

            tx.commit()
                .map_err(|e| ArogyaError::Storage(format!("Failed to commit import: {}", e)))?;
            Ok(batch.total())
        })?;

        info!(rows = written, "Feed import committed");
        Ok(written)
    }

    pub fn insert_health_tip(&self, tip: &HealthTip) -> Result<(), ArogyaError> {
        self.db.with_conn(|conn| insert_health_tip(conn, tip))
    }

    pub fn insert_vaccination_record(&self, record: &VaccinationRecord) -> Result<(), ArogyaError> {
        self.db.with_conn(|conn| insert_vaccination_record(conn, record))
    }

    pub fn insert_outbreak_alert(&self, alert: &OutbreakAlert) -> Result<(), ArogyaError> {
        self.db.with_conn(|conn| insert_outbreak_alert(conn, alert))
    }

    pub fn insert_hospital(&self, hospital: &Hospital) -> Result<(), ArogyaError> {
        self.db.with_conn(|conn| insert_hospital(conn, hospital))
    }

    pub fn insert_notification(&self, notification: &Notification) -> Result<(), ArogyaError> {
        self.db.with_conn(|conn| insert_notification(conn, notification))
    }
}

// ============================================================================
// Statement helpers shared by single inserts and the import transaction.
// ============================================================================

fn insert_health_tip(conn: &rusqlite::Connection, tip: &HealthTip) -> Result<(), ArogyaError> {
    conn.execute(
        "INSERT OR REPLACE INTO knowledge_base_articles (kb_id, topic, content, language, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            tip.id.to_string(),
            tip.topic,
            tip.content,
            tip.language.code(),
            tip.last_updated.timestamp_millis(),
        ],
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to save health tip: {}", e)))?;
    Ok(())
}

fn insert_vaccination_record(
    conn: &rusqlite::Connection,
    record: &VaccinationRecord,
) -> Result<(), ArogyaError> {
    conn.execute(
        "INSERT OR REPLACE INTO vaccination_records (record_id, user_id, vaccine_name, due_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            record.id.to_string(),
            record.user_id,
            record.vaccine_name,
            record.due_date.format(DATE_FORMAT).to_string(),
            record.status,
        ],
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to save vaccination record: {}", e)))?;
    Ok(())
}

fn insert_outbreak_alert(
    conn: &rusqlite::Connection,
    alert: &OutbreakAlert,
) -> Result<(), ArogyaError> {
    conn.execute(
        "INSERT OR REPLACE INTO outbreak_alerts
            (alert_id, disease_name, severity, location, issued_date, recommended_measures)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            alert.id.to_string(),
            alert.disease_name,
            alert.severity,
            alert.location,
            alert.issued_date.format(DATE_FORMAT).to_string(),
            alert.recommended_measures,
        ],
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to save outbreak alert: {}", e)))?;
    Ok(())
}

fn insert_hospital(conn: &rusqlite::Connection, hospital: &Hospital) -> Result<(), ArogyaError> {
    conn.execute(
        "INSERT OR REPLACE INTO hospitals (hospital_id, name, address, phone, availability, geo_location)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            hospital.id.to_string(),
            hospital.name,
            hospital.address,
            hospital.phone,
            hospital.availability,
            hospital.geo_location,
        ],
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to save hospital: {}", e)))?;
    Ok(())
}

fn insert_notification(
    conn: &rusqlite::Connection,
    notification: &Notification,
) -> Result<(), ArogyaError> {
    conn.execute(
        "INSERT OR REPLACE INTO notifications
            (notification_id, user_id, type, channel, content, schedule_time, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            notification.id.to_string(),
            notification.user_id,
            notification.kind,
            notification.channel,
            notification.content,
            notification.schedule_time.timestamp_millis(),
            notification.status,
        ],
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to save notification: {}", e)))?;
    Ok(())
}

// ============================================================================
// Row conversion
// ============================================================================

fn row_to_health_tip(row: &rusqlite::Row<'_>) -> Result<HealthTip, ArogyaError> {
    let id: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let topic: String = row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let content: String = row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let language: String = row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let last_updated: i64 = row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(HealthTip {
        id: parse_uuid(&id)?,
        topic,
        content,
        language: language.parse()?,
        last_updated: from_millis(last_updated),
    })
}

fn row_to_vaccination_record(row: &rusqlite::Row<'_>) -> Result<VaccinationRecord, ArogyaError> {
    let id: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let user_id: String = row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let vaccine_name: String = row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let due_date: String = row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let status: String = row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(VaccinationRecord {
        id: parse_uuid(&id)?,
        user_id,
        vaccine_name,
        due_date: parse_date(&due_date)?,
        status,
    })
}

fn row_to_outbreak_alert(row: &rusqlite::Row<'_>) -> Result<OutbreakAlert, ArogyaError> {
    let id: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let disease_name: String = row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let severity: String = row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let location: String = row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let issued_date: String = row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let recommended_measures: String =
        row.get(5).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(OutbreakAlert {
        id: parse_uuid(&id)?,
        disease_name,
        severity,
        location,
        issued_date: parse_date(&issued_date)?,
        recommended_measures,
    })
}

fn row_to_hospital(row: &rusqlite::Row<'_>) -> Result<Hospital, ArogyaError> {
    let id: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(Hospital {
        id: parse_uuid(&id)?,
        name: row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        address: row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        phone: row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        availability: row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        geo_location: row.get(5).map_err(|e| ArogyaError::Storage(e.to_string()))?,
    })
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> Result<Notification, ArogyaError> {
    let id: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let schedule_time: i64 = row.get(5).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(Notification {
        id: parse_uuid(&id)?,
        user_id: row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        kind: row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        channel: row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        content: row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?,
        schedule_time: from_millis(schedule_time),
        status: row.get(6).map_err(|e| ArogyaError::Storage(e.to_string()))?,
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, ArogyaError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| ArogyaError::Storage(format!("Invalid date '{}': {}", s, e)))
}
