use anyhow::{Context, Result};
use clap::Parser;
use fetch_inspector::config::{self, RequestSpec};
use fetch_inspector::{
    ApiLogEntry, FetchHandle, FetchRequest, Inspector, InspectorStats, InstallOutcome, LogEntry,
    ReqwestFetch, RestLogEntry,
};
use log::{error, info, warn, LevelFilter};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Serialize)]
struct Report {
    api: Vec<ApiLogEntry>,
    rest: Vec<RestLogEntry>,
    stats: InspectorStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = config::Cli::parse();

    // Load configuration
    let config = config::load_config(&cli)?;

    let level = LevelFilter::from_str(&config.log_level).unwrap_or(LevelFilter::Info);
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to initialise logger")?;

    info!("Starting fetch-inspector");
    info!("Configuration loaded successfully");

    // The fetch entry point application code goes through
    let handle = Arc::new(FetchHandle::new(Arc::new(ReqwestFetch::default())));

    let inspector = Inspector::new(&config);
    match inspector.init(&handle) {
        InstallOutcome::Installed => {}
        InstallOutcome::AlreadyInstalled => warn!("Fetch was already instrumented"),
        InstallOutcome::Disabled => info!("Running without instrumentation"),
    }

    inspector.set_subscriber(Some(Arc::new(|entry: &LogEntry| match entry {
        LogEntry::Api(api) => info!(
            "[api] {} {} -> {} ({} ms)",
            api.method,
            api.url,
            api.status.map_or_else(|| "error".to_string(), |s| s.to_string()),
            api.duration
        ),
        LogEntry::Rest(rest) => info!(
            "[rest] {} {} success={} ({} ms)",
            rest.operation, rest.table, rest.success, rest.duration
        ),
    })));

    // Spawn one task per configured request; they complete in any order
    let tasks: Vec<_> = config
        .requests
        .iter()
        .cloned()
        .map(|spec| {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move { run_request(&handle, spec).await })
        })
        .collect();

    info!("Issued {} requests", tasks.len());

    for task in tasks {
        if let Err(e) = task.await {
            error!("Request task terminated unexpectedly: {}", e);
        }
    }

    let report = Report {
        api: inspector.api_logs(),
        rest: inspector.rest_logs(),
        stats: inspector.stats(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render logs")?
    );

    inspector.dispose(&handle);

    Ok(())
}

async fn run_request(handle: &FetchHandle, spec: RequestSpec) {
    let mut request = FetchRequest::new(spec.method, spec.url);
    if let Some(body) = spec.body {
        request = request
            .with_header("Content-Type", "application/json")
            .with_body(body);
    }

    let url = request.url.clone();
    match handle.fetch(request).await {
        Ok(response) => info!("{} returned {}", url, response.status),
        Err(e) => error!("{} failed: {}", url, e),
    }
}
