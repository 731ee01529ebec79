mod config;
mod db;
mod error;
mod extract;
mod server;
mod task;

use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::Parser;

use crate::task::{NewTask, TaskFilter};

#[derive(Parser)]
#[command(name = "voicetask", about = "Turn spoken sentences into tasks")]
enum Cli {
    /// Start the HTTP API
    Serve,
    /// Parse a sentence and print the result as JSON
    Parse {
        #[arg(required = true)]
        text: Vec<String>,
        /// Reference time (YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD), defaults to now
        #[arg(long)]
        now: Option<String>,
    },
    /// Parse a sentence and store it as a task
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print stored tasks
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::Config::load_or_default(Path::new("config.toml"))?;

    match cli {
        Cli::Serve => {
            let database = db::Database::init(&cfg.database.path)?;
            server::serve(&cfg, database).await
        }
        Cli::Parse { text, now } => {
            let now = match now {
                Some(raw) => parse_reference_time(&raw)?,
                None => Local::now().naive_local(),
            };
            let parsed = extract::parse(&text.join(" "), now);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }
        Cli::Add { text } => {
            let database = db::Database::init(&cfg.database.path)?;
            let parsed = extract::parse(&text.join(" "), Local::now().naive_local());
            let task = database.create_task(&NewTask {
                title: parsed.title,
                description: None,
                status: Some(parsed.status),
                priority: Some(parsed.priority),
                due_date: parsed
                    .due_date
                    .map(|d| d.format(task::DUE_DATE_FORMAT).to_string()),
            })?;
            tracing::info!(id = task.id, "Task stored");
            println!("{}", serde_json::to_string_pretty(&task)?);
            Ok(())
        }
        Cli::List {
            status,
            priority,
            search,
        } => {
            let database = db::Database::init(&cfg.database.path)?;
            let tasks = database.get_tasks(&TaskFilter {
                status,
                priority,
                due_date: None,
                search,
            })?;
            for t in &tasks {
                let due = t
                    .due_date
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<4} [{}] {:<8} {:<16} {}",
                    t.id,
                    t.status.label(),
                    t.priority,
                    due,
                    t.title
                );
            }
            Ok(())
        }
    }
}

fn parse_reference_time(raw: &str) -> anyhow::Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, task::DUE_DATE_FORMAT) {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("Invalid --now value: {}", raw))
}
