//! `scolarite`: command-line access to a Scolarite store, plus an HTTP server.
//!
//! # Usage
//!
//! ```text
//! scolarite years list
//! scolarite years open 2025-2026
//! scolarite pay 42 monthly 5000 --month 10
//! scolarite paid 42 monthly
//! scolarite serve --port 8080
//! ```
//!
//! Settings come from `scolarite.toml` (or `--config`), then `SCOLARITE_*`
//! environment variables, then flags.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use scolarite_core::{
  School,
  payment::{NewPayment, PaymentFilter, PaymentKind},
  year::YearDraft,
};
use scolarite_store_sqlite::SqliteStore;
use serde::Serialize;
use settings::Settings;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "School records by academic year")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "scolarite.toml")]
  config: PathBuf,

  /// SQLite database file; overrides `store_path` from the config.
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  /// Academic year to operate on instead of the active one.
  #[arg(long, global = true)]
  year: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage academic years.
  Years {
    #[command(subcommand)]
    action: YearsAction,
  },
  /// Copy every year-scoped key from one year to another without overwriting.
  Clone { from: String, to: String },
  /// Copy fees, extra fees and services from one year to another.
  CopyConfig { from: String, to: String },
  /// Record a payment in the ledger.
  Pay {
    student: String,
    #[arg(value_parser = parse_kind)]
    kind:    PaymentKind,
    amount:  f64,
    #[arg(long)]
    class:   Option<String>,
    #[arg(long)]
    month:   Option<String>,
    #[arg(long)]
    item:    Option<String>,
    #[arg(long)]
    method:  Option<String>,
  },
  /// Sum what a student has paid.
  Paid {
    student: String,
    #[arg(value_parser = parse_kind)]
    kind:    PaymentKind,
    #[arg(long)]
    class:   Option<String>,
    #[arg(long)]
    month:   Option<String>,
    #[arg(long)]
    item:    Option<String>,
  },
  /// List stored keys with their size and last write time.
  Keys,
  /// Serve the JSON API over HTTP.
  Serve {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
  },
}

#[derive(Subcommand, Debug)]
enum YearsAction {
  /// List registered years.
  List,
  /// Show the active year.
  Active,
  /// Register a year; missing fields follow today's date.
  Add {
    id:    Option<String>,
    #[arg(long)]
    name:  Option<String>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end:   Option<String>,
  },
  /// Make a registered year active.
  Activate { id: String },
  /// Mark a year closed.
  Close {
    id:     String,
    /// Reopen instead.
    #[arg(long)]
    reopen: bool,
  },
  /// Register a year, seed it from another and make it active.
  Open {
    id:   String,
    #[arg(long)]
    from: Option<String>,
  },
}

fn parse_kind(s: &str) -> Result<PaymentKind, String> {
  serde_json::from_value(serde_json::Value::String(s.to_owned()))
    .map_err(|_| format!("unknown payment type {s:?}"))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let store_path = cli.store.clone().unwrap_or(settings.store_path.clone());

  if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {}", dir.display()))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );
  let school = School::new(store.clone());
  let year = cli.year.as_deref();

  match cli.command {
    Command::Years { action } => years(&school, action)?,
    Command::Clone { from, to } => print(&school.clone_year_data(&from, &to))?,
    Command::CopyConfig { from, to } => print(&school.billing().copy_year_config(&from, &to))?,
    Command::Pay { student, kind, amount, class, month, item, method } => {
      let mut entry = NewPayment::new(student, kind, amount);
      entry.class_id = class;
      entry.month = month;
      entry.item_id = item;
      entry.method = method;
      print(&school.ledger().add_payment(entry, year))?;
    }
    Command::Paid { student, kind, class, month, item } => {
      let filter = PaymentFilter { student_id: student, kind, class_id: class, month, item_id: item };
      print(&school.ledger().sum_paid_for(&filter, year))?;
    }
    Command::Keys => {
      for info in store.keys()? {
        println!("{:<48} {:>8}  {}", info.key, info.size, info.updated_at.to_rfc3339());
      }
    }
    Command::Serve { host, port } => {
      let address = format!(
        "{}:{}",
        host.unwrap_or(settings.host),
        port.unwrap_or(settings.port)
      );
      serve(school, &address).await?;
    }
  }

  Ok(())
}

fn years(school: &School, action: YearsAction) -> anyhow::Result<()> {
  let registry = school.years();
  match action {
    YearsAction::List => print(&registry.list_years()),
    YearsAction::Active => print(&registry.active_year()),
    YearsAction::Add { id, name, start, end } => {
      let draft = YearDraft { id, name, start_date: start, end_date: end, closed: None };
      print(&registry.add_year(draft))
    }
    YearsAction::Activate { id } => {
      anyhow::ensure!(
        registry.list_years().iter().any(|y| y.id == id),
        "year {id} is not registered"
      );
      registry.set_active_year(&id);
      Ok(())
    }
    YearsAction::Close { id, reopen } => {
      anyhow::ensure!(registry.set_year_closed(&id, !reopen), "year {id} is not registered");
      Ok(())
    }
    YearsAction::Open { id, from } => {
      let (year, report) = school.open_new_year(YearDraft::with_id(id), from.as_deref());
      print(&serde_json::json!({ "year": year, "report": report }))
    }
  }
}

async fn serve(school: School, address: &str) -> anyhow::Result<()> {
  let app = axum::Router::new().nest("/api", scolarite_api::api_router(Arc::new(school)));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
