use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter, warn};

use crate::{
    app,
    cdp::{
        discovery::is_port_open,
        probe::{CdpTimerProbe, ProbeConfig},
    },
    daemon::start_daemon,
    status::{icon, sketchybar},
    utils::{dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "Brainbar", version, long_about = None)]
#[command(about = "Shows the Brain.fm session timer in sketchybar", long_about = None)]
struct Args {
    #[arg(long, default_value_t = 9222, help = "Remote debugging port")]
    port: u16,
    #[arg(long, help = "Override browser WebSocket URL (from /json/version)")]
    ws: Option<String>,
    #[arg(long, help = "CSS selector for the timer element (querySelector)")]
    selector: Option<String>,
    #[arg(long, help = "Prefer targets whose title/URL contains this")]
    target_contains: Option<String>,
    #[arg(long, default_value_t = 0.1, help = "Polling interval in seconds")]
    interval: f64,
    #[arg(long, default_value = "brain_timer", help = "sketchybar item name")]
    item: String,
    #[arg(long, default_value = "right", help = "sketchybar position: left|center|right")]
    position: String,
    #[arg(long, help = "Mirror logs to stdout")]
    log: bool,
    /// This option is for debugging purposes only.
    #[arg(long = "log-filter")]
    log_filter: Option<LevelFilter>,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;
    enable_logging(&app_dir, args.log_filter, args.log)?;

    // Without an explicit ws url a closed port means the app either isn't
    // running or runs without debugging. Try to (re)start it ourselves.
    if args.ws.is_none() && !is_port_open("127.0.0.1", args.port).await {
        info!("Port {} is closed, launching the app", args.port);
        if let Err(e) = app::launch(args.port).await {
            warn!("Couldn't launch the app: {e:?}");
        }
    }

    sketchybar::ensure_item(&args.item, &args.position).await?;
    icon::ensure_icon(&args.item, &app_dir).await;

    let probe = CdpTimerProbe::new(ProbeConfig {
        port: args.port,
        ws_url: args.ws,
        target_contains: args.target_contains,
        selector: args.selector,
    });

    start_daemon(
        Box::new(probe),
        args.item,
        Duration::from_secs_f64(args.interval),
    )
    .await
}
