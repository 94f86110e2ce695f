// # zonesyncd - DNS reconciliation daemon
//
// A thin integration layer: all DNS logic lives in zonesync-core and the
// provider crates. The daemon
//
// 1. reads its settings from environment variables,
// 2. loads the desired-state document,
// 3. registers the provider factories compiled in,
// 4. builds one provider per configured id,
// 5. reconciles every record once, concurrently, and reports.
//
// Scheduling and retries are left to whatever runs the daemon (cron, a
// systemd timer, a controller loop). The exit code tells it whether a
// rerun is worthwhile.
//
// ## Configuration
//
// - `ZONESYNC_CONFIG`: path to the JSON desired-state document (required)
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `ZONESYNC_DRY_RUN`: `true` validates and resolves every record but
//   calls no provider
//
// ## Example
//
// ```bash
// export ZONESYNC_CONFIG=/etc/zonesync/records.json
// export ZONESYNC_LOG_LEVEL=debug
//
// zonesyncd
// ```

mod config;

use anyhow::Result;
use config::{Config, load_sync_config};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::ManagedRecord;
use zonesync_core::{FactoryRegistry, ProviderRegistry, ReconcileOutcome, Reconciler, SyncConfig};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Every record reconciled
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected), or interrupted
/// - 3: At least one record failed; a rerun may fix transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    ReconcileFailed = 3,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Tally of one reconcile pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PassSummary {
    applied: usize,
    removed: usize,
    retained: usize,
    skipped: usize,
    failed: usize,
    retriable: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: &zonesync_core::Result<ReconcileOutcome>) {
        match outcome {
            Ok(ReconcileOutcome::Applied { .. }) => self.applied += 1,
            Ok(ReconcileOutcome::Removed { .. }) => self.removed += 1,
            Ok(ReconcileOutcome::Retained) => self.retained += 1,
            Ok(ReconcileOutcome::Skipped { .. }) => self.skipped += 1,
            Err(e) => {
                self.failed += 1;
                if e.is_retriable() {
                    self.retriable += 1;
                }
            }
        }
    }

    fn exit_code(&self) -> ZonesyncExitCode {
        if self.failed == 0 {
            ZonesyncExitCode::Success
        } else {
            ZonesyncExitCode::ReconcileFailed
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd");

    let sync = match load_sync_config(&config.config_path) {
        Ok(sync) => sync,
        Err(e) => {
            error!("{:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };
    info!(
        "Configuration loaded: {} provider(s), {} record(s)",
        sync.providers.len(),
        sync.records.len()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        tokio::select! {
            summary = run_pass(sync, config.dry_run) => {
                info!(
                    "Pass complete: {} applied, {} removed, {} retained, {} skipped, {} failed ({} retriable)",
                    summary.applied,
                    summary.removed,
                    summary.retained,
                    summary.skipped,
                    summary.failed,
                    summary.retriable
                );
                summary.exit_code()
            }
            signal = wait_for_shutdown() => {
                match signal {
                    Ok(name) => warn!("Received {}, abandoning reconcile pass", name),
                    Err(e) => error!("Signal handling error: {}", e),
                }
                ZonesyncExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Register every factory compiled into this binary
fn factories() -> FactoryRegistry {
    let factories = FactoryRegistry::new();
    zonesync_core::providers::dummy::register(&factories);

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        zonesync_provider_cloudflare::register(&factories);
    }

    #[cfg(feature = "rfc2136")]
    {
        info!("Registering RFC2136 provider");
        zonesync_provider_rfc2136::register(&factories);
    }

    factories
}

/// Build providers, then reconcile every record concurrently
async fn run_pass(sync: SyncConfig, dry_run: bool) -> PassSummary {
    let factories = factories();
    let registry = Arc::new(ProviderRegistry::new());

    for (id, provider_config) in &sync.providers {
        // A provider that cannot be built fails only its own records
        if let Err(e) = registry.configure(id.as_str(), provider_config, &factories) {
            error!("Provider {} unavailable: {}", id, e);
        }
    }

    if dry_run {
        warn!("DRY-RUN mode - no changes will be made");
    }
    let reconciler = Arc::new(Reconciler::new(registry).with_dry_run(dry_run));

    let mut tasks = JoinSet::new();
    for record in sync.records {
        let reconciler = Arc::clone(&reconciler);
        tasks.spawn(async move {
            let outcome = reconciler.reconcile(&record).await;
            (record, outcome)
        });
    }

    let mut summary = PassSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((record, outcome)) => {
                report(&record, &outcome);
                summary.record(&outcome);
            }
            Err(e) => {
                error!("Reconcile task failed: {}", e);
                summary.failed += 1;
            }
        }
    }

    summary
}

fn report(record: &ManagedRecord, outcome: &zonesync_core::Result<ReconcileOutcome>) {
    match outcome {
        Ok(ReconcileOutcome::Applied { zone }) => {
            info!("{} applied in zone {} via {}", record.spec.name, zone, record.provider)
        }
        Ok(ReconcileOutcome::Removed { zone }) => {
            info!("{} removed from zone {} via {}", record.spec.name, zone, record.provider)
        }
        Ok(ReconcileOutcome::Retained) => info!("{} retained", record.spec.name),
        Ok(ReconcileOutcome::Skipped { zone }) => {
            info!("{} checked against zone {} (dry-run)", record.spec.name, zone)
        }
        Err(e) => error!(
            "{} via {} failed ({}): {}",
            record.spec.name,
            record.provider,
            if e.is_retriable() { "retriable" } else { "permanent" },
            e
        ),
    }
}

/// Wait for a shutdown signal (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for a shutdown signal (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
