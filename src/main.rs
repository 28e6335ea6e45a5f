//! Stepform response watcher
//!
//! Opens the builder session kept in the data directory, reports it, and logs
//! every submission other contexts write to its response collection.

use anyhow::{Context, Result};
use std::io;
use std::sync::Arc;
use stepform::config::AppConfig;
use stepform::storage::FileStore;
use stepform::sync::BuilderSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = AppConfig::load()?;
    if let Some(path) = AppConfig::config_path().filter(|p| !p.exists()) {
        config.save()?;
        tracing::info!("Wrote default config to {}", path.display());
    }
    let data_dir = config.data_dir()?;
    let mut store = FileStore::open(&data_dir)
        .await
        .with_context(|| format!("Failed to open store at {}", data_dir.display()))?;
    store.watch(config.poll_interval());

    let mut session = BuilderSession::open_with_key(Arc::new(store), config.session_key()).await;
    report(&session);

    loop {
        tokio::select! {
            changed = session.next_external_change() => {
                if changed? {
                    report_latest(&session);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping");
                return Ok(());
            }
        }
    }
}

fn report(session: &BuilderSession) {
    let store = session.store();
    tracing::info!(
        "Form \"{}\": {} step(s), {} field(s)",
        store.title(),
        store.steps().len(),
        store.definition().field_count()
    );
    match session.share_path() {
        Some(path) => tracing::info!("Published at {path}"),
        None => tracing::info!("Not published"),
    }
    tracing::info!(
        "{} response(s) under {}",
        session.responses().len(),
        session.response_key()
    );
}

fn report_latest(session: &BuilderSession) {
    let Some(latest) = session.responses().last() else {
        tracing::info!("Responses under {} were cleared", session.response_key());
        return;
    };
    tracing::info!("Response #{} received", session.responses().len());
    for (field_id, value) in latest {
        let label = session
            .store()
            .steps()
            .iter()
            .find_map(|s| s.field(field_id))
            .map_or(field_id.as_str(), |f| f.label.as_str());
        tracing::info!("  {label}: {}", value.display_value());
    }
}
