//! Application wiring: build adapters and services from configuration and run
//! the selected orchestration pass.

use std::sync::Arc;

use tracing::info;

use crate::adapter::esi::MarketApiClient;
use crate::adapter::github::ContentsClient;
use crate::config::{Config, TargetConfig};
use crate::error::{ConfigError, Result};
use crate::port::PublishTarget;
use crate::service::{FreshnessGate, Orchestrator, Publisher, RegionScan, RequestGate};

/// Main application struct.
pub struct App;

impl App {
    /// Hub pass followed by the bulk pass.
    pub async fn run(config: Config) -> Result<()> {
        let orchestrator = build_orchestrator(&config)?;
        let report = orchestrator.run().await?;
        log_report(&report);
        Ok(())
    }

    /// Only the priority hub regions.
    pub async fn run_hubs(config: Config) -> Result<()> {
        let orchestrator = build_orchestrator(&config)?;
        let report = orchestrator.run_hubs().await;
        log_report(&report);
        Ok(())
    }

    /// Every region except the hubs.
    pub async fn run_bulk(config: Config) -> Result<()> {
        let orchestrator = build_orchestrator(&config)?;
        let report = orchestrator.run_bulk().await?;
        log_report(&report);
        Ok(())
    }

    /// One region, unconditionally regenerated.
    pub async fn run_region(config: Config, region_id: u32) -> Result<()> {
        let orchestrator = build_orchestrator(&config)?;
        let report = orchestrator.run_region(region_id).await;
        log_report(&report);
        Ok(())
    }
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let targets: Vec<PublishTarget> = config.publish.targets.iter().map(target_from).collect();
    if targets.is_empty() {
        return Err(ConfigError::MissingField {
            field: "publish.targets",
        }
        .into());
    }

    let upstream = Arc::new(MarketApiClient::from_config(&config.upstream));
    let store = Arc::new(ContentsClient::from_config(&config.store));
    let gate = Arc::new(RequestGate::from_config(&config.limiter));

    let scan = RegionScan::new(upstream.clone(), gate, config.scan.clone());
    // Freshness reads go against the first target's public path.
    let freshness = Arc::new(FreshnessGate::new(
        store.clone(),
        targets[0].clone(),
        config.freshness.max_age_minutes * 60_000,
    ));
    let publisher = Arc::new(Publisher::new(store, targets));

    Ok(Orchestrator::new(
        scan,
        freshness,
        publisher,
        upstream,
        config.orchestrator.clone(),
    ))
}

fn target_from(config: &TargetConfig) -> PublishTarget {
    PublishTarget {
        owner: config.owner.clone(),
        repo: config.repo.clone(),
        branch: config.branch.clone(),
        data_prefix: config.data_prefix.clone(),
    }
}

fn log_report(report: &crate::domain::RunReport) {
    info!(
        succeeded = report.succeeded,
        partial = report.partial,
        skipped_fresh = report.skipped_fresh,
        failed = report.failed,
        pages_retried = report.pages_retried,
        pages_dropped = report.pages_dropped,
        records_dropped = report.records_dropped,
        "Run complete"
    );
}
