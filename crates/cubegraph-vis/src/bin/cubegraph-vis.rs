//! Cubegraph Explorer
//!
//! Play a move path headlessly and print the resulting graph, or serve the
//! explorer API.
//!
//! ```text
//! cubegraph-vis <move-path> [velocity]
//! cubegraph-vis serve [port]
//! ```

use cubegraph_vis::{run_realtime, Explorer, ExplorerConfig, ExplorerServer, Velocity};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cubegraph_vis=info,cubegraph_state=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line args
    let args: Vec<String> = env::args().collect();
    let mut config = ExplorerConfig::from_env();

    if args.get(1).map(String::as_str) == Some("serve") {
        let port: u16 = args.get(2)
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let server = ExplorerServer::new(Explorer::new(config));
        server.serve(port).await?;
        return Ok(());
    }

    let Some(path) = args.get(1) else {
        eprintln!("usage: cubegraph-vis <move-path> [velocity]");
        eprintln!("       cubegraph-vis serve [port]");
        std::process::exit(2);
    };

    if let Some(velocity) = args.get(2).and_then(|s| s.parse::<i64>().ok()) {
        config.velocity = Velocity::new(velocity);
    }
    if config.velocity.is_paused() {
        tracing::warn!("velocity 0 would never finish, playing instantly");
        config.velocity = Velocity::INSTANT;
    }

    let tick_rate = config.tick_rate;
    let mut explorer = Explorer::new(config);
    let accepted = explorer.rotate_path(path)?;
    let ticks = run_realtime(&mut explorer, tick_rate).await;
    tracing::info!(moves = accepted, ticks, "playback finished");

    let output = serde_json::json!({
        "snapshot": explorer.snapshot(),
        "path_from_root": explorer.path_from_root()?,
        "path_to_root": explorer.path_to_root()?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
