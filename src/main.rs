use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use travel_desk::api::{ApiClient, TravelApi};
use travel_desk::app::{Action, App};
use travel_desk::config::Config;
use travel_desk::logging;
use travel_desk::overlay::{self, OverlaySignal};
use travel_desk::session::{MemorySessionStore, Router, SessionStore, SqliteSessionStore};

#[derive(Parser, Debug)]
#[command(name = "travel-desk")]
#[command(about = "Terminal client for the travel agency backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/travel-desk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Keep the admin session in memory instead of on disk
  #[arg(long)]
  ephemeral: bool,

  #[command(subcommand)]
  action: Action,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init()?;

  let signal = OverlaySignal::new();
  let renderer = overlay::spawn_renderer(signal.subscribe());

  let session: Arc<dyn SessionStore> = if args.ephemeral {
    Arc::new(MemorySessionStore::new())
  } else {
    Arc::new(SqliteSessionStore::open()?)
  };
  let router = Arc::new(Router::default());

  let client = ApiClient::from_config(&config, signal, session.clone(), router.clone())?;
  let app = App::new(config, TravelApi::new(client), session, router);

  let result = match args.action {
    Action::Shell => app.run_shell().await,
    action => app.execute(action).await.map(|output| println!("{}", output)),
  };

  // The renderer ends once every overlay handle is gone, after drawing
  // the final state (a pending success flash included)
  drop(app);
  if let Err(e) = renderer.await {
    debug!(error = %e, "overlay renderer stopped abnormally");
  }

  result
}
