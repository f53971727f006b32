//! Database schema migrations.
//!
//! Version 1 holds the assistant tables (conversations, messages,
//! chatbot_logs); version 2 adds the read-only feed tables.

use rusqlite::Connection;
use tracing::info;

use arogya_core::error::ArogyaError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), ArogyaError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ArogyaError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: assistant_schema");
    }
    if current_version < 2 {
        apply_v2(conn)?;
        info!("Applied migration v2: feed_schema");
    }

    Ok(())
}

/// Version 1: conversations, messages, and the query audit log.
///
/// Timestamps are epoch milliseconds; `rowid` breaks ties between rows
/// written in the same millisecond.
fn apply_v1(conn: &Connection) -> Result<(), ArogyaError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            id              TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            channel         TEXT NOT NULL DEFAULT 'web',
            status          TEXT NOT NULL DEFAULT 'active'
                            CHECK (status IN ('active', 'closed')),
            created_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user
            ON conversations (user_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY NOT NULL,
            conversation_id TEXT NOT NULL,
            sender          TEXT NOT NULL CHECK (sender IN ('user', 'bot')),
            message_text    TEXT NOT NULL,
            created_at      INTEGER NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages (conversation_id, created_at ASC);

        CREATE TABLE IF NOT EXISTS chatbot_logs (
            id              TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            query           TEXT NOT NULL,
            response        TEXT NOT NULL,
            created_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chatbot_logs_user_query
            ON chatbot_logs (user_id, query, created_at DESC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'assistant_schema');
        ",
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

/// Version 2: tables behind the read-only list screens.
///
/// Calendar dates are stored as `YYYY-MM-DD` text so they sort lexically.
fn apply_v2(conn: &Connection) -> Result<(), ArogyaError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS knowledge_base_articles (
            kb_id           TEXT PRIMARY KEY NOT NULL,
            topic           TEXT NOT NULL,
            content         TEXT NOT NULL,
            language        TEXT NOT NULL DEFAULT 'en',
            last_updated    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_kb_language_updated
            ON knowledge_base_articles (language, last_updated DESC);

        CREATE TABLE IF NOT EXISTS vaccination_records (
            record_id       TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            vaccine_name    TEXT NOT NULL,
            due_date        TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending'
        );

        CREATE INDEX IF NOT EXISTS idx_vaccination_user_due
            ON vaccination_records (user_id, due_date ASC);

        CREATE TABLE IF NOT EXISTS outbreak_alerts (
            alert_id             TEXT PRIMARY KEY NOT NULL,
            disease_name         TEXT NOT NULL,
            severity             TEXT NOT NULL,
            location             TEXT NOT NULL DEFAULT '',
            issued_date          TEXT NOT NULL,
            recommended_measures TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_outbreak_issued
            ON outbreak_alerts (issued_date DESC);

        CREATE TABLE IF NOT EXISTS hospitals (
            hospital_id     TEXT PRIMARY KEY NOT NULL,
            name            TEXT NOT NULL,
            address         TEXT NOT NULL DEFAULT '',
            phone           TEXT NOT NULL DEFAULT '',
            availability    TEXT NOT NULL DEFAULT 'available',
            geo_location    TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_hospitals_name
            ON hospitals (name ASC);

        CREATE TABLE IF NOT EXISTS notifications (
            notification_id TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            type            TEXT NOT NULL,
            channel         TEXT NOT NULL,
            content         TEXT NOT NULL,
            schedule_time   INTEGER NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending'
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user_schedule
            ON notifications (user_id, schedule_time DESC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (2, 'feed_schema');
        ",
    )
    .map_err(|e| ArogyaError::Storage(format!("Failed to apply migration v2: {}", e)))?;

    Ok(())
}
