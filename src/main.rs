use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod assistant;
mod config;
mod handler;
mod reply;
mod tui;
mod ui;
mod widget;

use app::App;
use assistant::StudioAssistant;
use config::Config;
use reply::{HttpReplyClient, ReplyService};
use widget::{ChatWidget, WidgetEvent};

#[derive(Parser)]
#[command(name = "studio-chat")]
#[command(about = "Terminal chat widget for the studio assistant")]
struct Cli {
    /// Base URL of the reply backend; the built-in assistant answers when omitted
    #[arg(long)]
    backend_url: Option<String>,

    /// Use the built-in assistant even if the config names a backend
    #[arg(long)]
    local: bool,

    /// Write diagnostics to this file (the terminal stays clean)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Config file location override
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(path) = cli.log_file.as_ref().or(config.log_file.as_ref()) {
        init_tracing(path)?;
    }

    let backend_url = if cli.local {
        None
    } else {
        cli.backend_url.clone().or_else(|| config.backend_url.clone())
    };
    let service: Arc<dyn ReplyService> = match &backend_url {
        Some(url) => {
            info!(%url, "using HTTP reply backend");
            Arc::new(HttpReplyClient::new(url))
        }
        None => {
            info!("using built-in studio assistant");
            Arc::new(StudioAssistant::new())
        }
    };

    let pacing = config.pacing();
    let (widget_tx, mut widget_rx) = mpsc::unbounded_channel();
    let widget = ChatWidget::new(service, pacing, widget_tx);
    let mut app = App::new(widget);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(pacing.tick);

    let result = run(&mut terminal, &mut events, &mut widget_rx, &mut app).await;
    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    widget_rx: &mut mpsc::UnboundedReceiver<WidgetEvent>,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event),
            Some(event) = widget_rx.recv() => app.widget.apply(event),
        }
    }
    info!("shutting down");
    Ok(())
}

fn init_tracing(path: &std::path::Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,studio_chat=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}
