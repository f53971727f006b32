//! Arogya application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Open the SQLite database (except for `ask`, which never persists)
//! 4. Dispatch to the interactive assistant or one of the list views

mod cli;
mod views;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use arogya_chat::{AssistantSession, ConversationRecorder, RuleBasedResponder};
use arogya_core::config::ArogyaConfig;
use arogya_storage::{
    ConversationRepository, Database, FeedImport, FeedRepository, MessageRepository,
    QueryLogRepository, SqliteStore,
};

use cli::{CliArgs, Command};

/// Expand ~ to home directory in a path string.
fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&path[2..])
    } else {
        PathBuf::from(path)
    }
}

fn open_database(config: &ArogyaConfig) -> Result<Arc<Database>, Box<dyn std::error::Error>> {
    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("arogya.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");
    Ok(Arc::new(db))
}

/// Interactive assistant session on stdin/stdout.
///
/// Each line is one turn; `/quit` or end of input closes the widget.
async fn run_chat(
    db: Arc<Database>,
    config: &ArogyaConfig,
    user: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::new(db));
    let recorder = ConversationRecorder::from_config(store, config.assistant.clone())?;
    let mut session = AssistantSession::new(recorder, user);

    let conversation_id = session.open().await.map_err(|e| {
        eprintln!("{}", config.assistant.failure_notice);
        e
    })?;
    tracing::info!(conversation_id = %conversation_id, user_id = session.user_id(), "Chat started");

    let mut shown = 0;
    let mut print_new = |session: &AssistantSession| {
        for entry in &session.transcript()[shown..] {
            println!("{}", views::render_entry(entry));
        }
        shown = session.transcript().len();
    };
    print_new(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }

        // Every non-blank line gets a reply or the failure notice; the
        // outcome detail only goes to the log.
        if let Err(e) = session.submit(&line).await {
            tracing::warn!(error = %e, "Message not sent");
        }
        print_new(&session);
    }

    session.close()?;
    println!("Conversation {} closed.", conversation_id);
    Ok(())
}

fn run_import(db: Arc<Database>, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let batch: FeedImport = serde_json::from_str(&content)?;
    let written = FeedRepository::new(db).import(&batch)?;
    println!("Imported {} rows from {}", written, path.display());
    Ok(())
}

fn run_history(db: Arc<Database>, conversation: Uuid) -> Result<(), Box<dyn std::error::Error>> {
    match ConversationRepository::new(Arc::clone(&db)).find_by_id(conversation)? {
        Some(c) => println!(
            "Conversation {} ({}, {}, started {})",
            c.id,
            c.user_id,
            c.status.as_str(),
            c.created_at.format("%Y-%m-%d %H:%M")
        ),
        None => {
            println!("Conversation {} not found.", conversation);
            return Ok(());
        }
    }
    let messages = views::load_or_empty(
        "history",
        MessageRepository::new(db).list_for_conversation(conversation),
    );
    print!("{}", views::render_history(&messages));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ArogyaConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(rules) = config.assistant.rules_path.take() {
        config.assistant.rules_path = Some(expand_home(&rules).to_string_lossy().to_string());
    }

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(path = %config_file.display(), "Configuration loaded");

    if let Command::Ask { ref query } = args.command {
        let responder = RuleBasedResponder::from_config(&config.assistant)?;
        println!("{}", responder.respond(&query.join(" ")));
        return Ok(());
    }

    // Storage.
    let db = open_database(&config)?;
    let feeds = FeedRepository::new(Arc::clone(&db));

    match args.command {
        Command::Chat { user } => run_chat(db, &config, user).await?,
        Command::Ask { .. } => {}
        Command::Tips { language } => {
            let language = cli::resolve_language(language.as_deref(), config.general.language)?;
            let tips = views::load_or_empty(
                "health_tips",
                feeds.health_tips(language, config.feeds.health_tips_limit),
            );
            print!("{}", views::render_health_tips(&tips));
        }
        Command::Vaccinations { user } => {
            let records =
                views::load_or_empty("vaccinations", feeds.vaccination_records(&user));
            print!("{}", views::render_vaccinations(&records));
        }
        Command::Alerts => {
            let alerts = views::load_or_empty(
                "outbreak_alerts",
                feeds.outbreak_alerts(config.feeds.outbreak_alerts_limit),
            );
            print!("{}", views::render_alerts(&alerts));
        }
        Command::Hospitals => {
            let hospitals = views::load_or_empty("hospitals", feeds.hospitals());
            print!("{}", views::render_hospitals(&hospitals));
        }
        Command::Notifications { user } => {
            let notifications = views::load_or_empty(
                "notifications",
                feeds.notifications(&user, config.feeds.notifications_limit),
            );
            print!("{}", views::render_notifications(&notifications));
        }
        Command::History { conversation } => run_history(db, conversation)?,
        Command::Audit { user, limit } => {
            let entries = views::load_or_empty(
                "audit",
                QueryLogRepository::new(db).list_for_user(&user, limit),
            );
            print!("{}", views::render_audit(&entries));
        }
        Command::Import { path } => run_import(db, &path)?,
    }

    Ok(())
}
