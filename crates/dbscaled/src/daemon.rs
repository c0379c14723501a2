//! Daemon assembly: config → collaborators → reconciliation loop.

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use dbscale_autoscale::{CapacityTierSet, HysteresisController, Reconciler, UsageAggregator};
use dbscale_core::AutoscalerConfig;
use dbscale_kube::KubePodLister;
use dbscale_rds::{DryRunApplier, RdsApiApplier, validate_scale_labels};

use crate::ConfigArgs;
use crate::applier::Applier;

/// Parse and validate the configuration. Any error here is fatal.
pub(crate) fn load_config(args: &ConfigArgs) -> anyhow::Result<AutoscalerConfig> {
    let config = AutoscalerConfig::from_raw(
        args.connections_headroom,
        &args.scalings_set,
        &args.pods_label_selector,
        args.operation_timeout,
        &args.db_identifier,
        args.downscale_forbidden_window_seconds,
        args.sync_interval_seconds,
    )
    .context("invalid configuration")?;

    if !args.dry_run {
        validate_scale_labels(&config.tiers).context("invalid configuration")?;
    }

    Ok(config)
}

fn log_config(config: &AutoscalerConfig, tiers: &CapacityTierSet) {
    info!(
        headroom = config.headroom,
        scalings_set = %tiers.describe(),
        pods_selector = %config.pods_selector,
        operation_timeout_secs = config.operation_timeout.as_secs(),
        db_identifier = %config.db_identifier,
        downscale_forbidden_window_secs = config.downscale_forbidden_window.as_secs(),
        sync_interval_secs = config.sync_interval.as_secs(),
        "current config"
    );
}

/// `dbscaled check-config`.
pub fn check_config(args: &ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let tiers = CapacityTierSet::build(config.tiers.clone());

    println!("configuration OK");
    println!("  headroom                     {}", config.headroom);
    println!("  tiers                        {}", tiers.describe());
    println!("  pods selector                {:?}", config.pods_selector);
    println!("  operation timeout            {}s", config.operation_timeout.as_secs());
    println!("  db identifier                {}", config.db_identifier);
    println!(
        "  downscale forbidden window   {}s",
        config.downscale_forbidden_window.as_secs()
    );
    println!("  sync interval                {}s", config.sync_interval.as_secs());
    println!("  dry run                      {}", args.dry_run);
    Ok(())
}

/// `dbscaled run`.
pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    info!("dbscale autoscaler starting");

    let config = load_config(&args)?;
    let tiers = CapacityTierSet::build(config.tiers.clone());
    log_config(&config, &tiers);

    // ── Collaborators ──────────────────────────────────────────

    let client = dbscale_kube::connect(args.kube_api_url.as_deref())
        .await
        .context("failed to set up kubernetes client")?;

    let usage = UsageAggregator::new(
        KubePodLister::new(client),
        config.pods_selector.clone(),
        config.headroom,
    )
    .with_list_timeout(config.operation_timeout);

    let applier = if args.dry_run {
        Applier::DryRun(DryRunApplier::new(config.db_identifier.clone()))
    } else {
        Applier::Rds(RdsApiApplier::from_env(config.db_identifier.clone()).await)
    };
    info!(applier = applier.kind(), db = %config.db_identifier, "capacity applier initialized");

    let reconciler = Reconciler::new(
        usage,
        tiers,
        HysteresisController::new(config.downscale_forbidden_window),
        applier,
        config.operation_timeout,
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let state = reconciler.run(config.sync_interval, shutdown_rx).await;

    info!(tier = %state.current_tier().name(), "dbscale autoscaler stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
