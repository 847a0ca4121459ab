use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use geolive::config::Settings;
use geolive::logging;
use geolive::notification::{DiscordChannel, DiscordConfig, PngMapRenderer};
use geolive::scheduler::{Collaborators, FeedCycle, Scheduler};
use geolive::feed::HttpEventSource;
use geolive::tenant::{FileDirectory, FileTenantStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env().context("loading settings")?;
    let (logging_config, _log_guard) = logging::init_logging(&settings.log_dir)?;

    let shutdown = CancellationToken::new();
    let retention = logging_config.start_retention_cleanup(shutdown.child_token());

    info!(
        feed = %settings.feed_kind,
        feed_url = %settings.feed_url,
        interval_hours = settings.poll_interval_hours,
        "geolive starting"
    );

    let directory = FileDirectory::load(&settings.tenants_file)
        .await
        .with_context(|| format!("loading tenant directory {}", settings.tenants_file.display()))?;
    info!(tenants = directory.len(), "Tenant directory loaded");

    let source = HttpEventSource::new(settings.fetch_timeout)
        .with_feed(settings.feed_kind, settings.feed_url.clone());

    let discord = DiscordConfig {
        timeout_secs: settings.send_timeout.as_secs(),
        ..Default::default()
    };

    let collaborators = Collaborators {
        source: Arc::new(source),
        store: Arc::new(FileTenantStore::new(&settings.config_dir)),
        directory: Arc::new(directory),
        renderer: Arc::new(PngMapRenderer::new(settings.feed_kind)),
        channel: Arc::new(DiscordChannel::new(discord)),
    };
    let cycle = FeedCycle::new(settings.feed_kind, collaborators, settings.cycle_config());

    let scheduler = Arc::new(Scheduler::with_cancellation(
        Arc::new(cycle),
        settings.scheduler_config(),
        shutdown.clone(),
    ));

    let run = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.run(std::future::ready(())).await }
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested, waiting for the current cycle to finish");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }

    run.await.context("scheduler task panicked")??;
    let _ = retention.await;
    info!(cycles = scheduler.cycles_completed(), "geolive stopped");
    Ok(())
}
