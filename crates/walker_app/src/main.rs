mod config;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use walker_core::{ControllerView, Tone};
use walker_engine::{Coordinator, Extractor, FileJobStore, JobStore, SnapshotHost};
use walker_logging::{walker_info, walker_warn};

use config::AppConfig;
use session::{Session, SessionConfig, Tab};

#[derive(Debug, Parser)]
#[command(name = "walker", version, about = "Walks a paginated Coretax table and exports it")]
struct Cli {
    /// RON configuration file; `walker.ron` is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the stored job state.
    Status,
    /// Walk a directory of saved table pages.
    Start {
        #[arg(long)]
        pages: PathBuf,
        /// Address the pages were saved from.
        #[arg(long)]
        url: Option<String>,
    },
    /// Export the stored records to a spreadsheet.
    Export,
    /// Forget the stored records.
    Clear,
    /// Clear the store and rewind the saved pages to the first one.
    Reset {
        #[arg(long)]
        pages: PathBuf,
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_source) = AppConfig::load(cli.config.as_deref())?;
    walker_logging::initialize(
        config.log.target.into(),
        config.log.level.into(),
        &config.log.file,
    );
    match &config_source {
        Some(path) => walker_info!("Loaded config from {:?}", path),
        None => walker_info!("No config file; using defaults"),
    }
    walker_info!("walker starting: {:?}", cli.command);

    let store: Arc<dyn JobStore> = Arc::new(FileJobStore::new(config.store_dir.clone()));
    let coordinator = Arc::new(Coordinator::new(store));

    match cli.command {
        Command::Status => {
            let session = open_session(&config, &coordinator, None);
            print_view(&session.view());
        }
        Command::Export => {
            let mut session = open_session(&config, &coordinator, None);
            print_view(&session.export());
        }
        Command::Clear => {
            let mut session = open_session(&config, &coordinator, None);
            print_view(&session.clear());
        }
        Command::Start { pages, url } => {
            let url = url.unwrap_or_else(|| config.default_tab_url());
            let (host, extractor) = attach(&config, &coordinator, &pages, &url)?;
            let mut session = open_session(
                &config,
                &coordinator,
                Some(Tab {
                    url,
                    extractor: extractor.clone(),
                }),
            );

            let cancel = session.cancel_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    walker_warn!("Interrupted; cancelling the walk");
                    cancel.cancel();
                }
            });

            print_view(&session.start());
            session.follow_walk(print_view).await;
            extractor.wait_idle().await;
            save_view_state(&host, &pages)?;
        }
        Command::Reset { pages, url } => {
            let url = url.unwrap_or_else(|| config.default_tab_url());
            let (host, extractor) = attach(&config, &coordinator, &pages, &url)?;
            let mut session = open_session(
                &config,
                &coordinator,
                Some(Tab {
                    url,
                    extractor: extractor.clone(),
                }),
            );
            print_view(&session.reset());
            extractor.wait_idle().await;
            save_view_state(&host, &pages)?;
        }
    }

    Ok(())
}

fn open_session(config: &AppConfig, coordinator: &Coordinator, tab: Option<Tab>) -> Session {
    let session_config = SessionConfig {
        controller: config.controller_settings(),
        output_dir: config.output_dir.clone(),
        export_prefix: config.export_prefix.clone(),
        clock: Arc::new(Utc::now),
    };
    Session::open(session_config, coordinator, tab)
}

fn attach(
    config: &AppConfig,
    coordinator: &Arc<Coordinator>,
    pages: &Path,
    url: &str,
) -> anyhow::Result<(Arc<SnapshotHost>, Arc<Extractor>)> {
    let host = SnapshotHost::from_dir(url, pages)
        .with_context(|| format!("cannot load pages from {}", pages.display()))?
        .with_selectors(&config.walk.next_selector, &config.walk.disabled_class)
        .with_cursor_field(&config.walk.cursor_field);
    let host = Arc::new(host);
    let extractor = Arc::new(Extractor::new(
        host.clone(),
        coordinator.clone(),
        config.walk.clone(),
    ));
    Ok((host, extractor))
}

fn save_view_state(host: &SnapshotHost, pages: &Path) -> anyhow::Result<()> {
    if host.reloads() > 0 {
        host.save_view_state(pages)
            .with_context(|| format!("cannot save view state in {}", pages.display()))?;
    }
    Ok(())
}

fn print_view(view: &ControllerView) {
    let marker = match view.status.tone {
        Tone::Info => "..",
        Tone::Success => "ok",
        Tone::Error => "!!",
    };
    println!("[{marker}] {}", view.status.text);
    println!(
        "     records: {}  running: {}  export: {}",
        view.record_count,
        if view.running { "yes" } else { "no" },
        if view.export_enabled { "ready" } else { "-" },
    );
}
