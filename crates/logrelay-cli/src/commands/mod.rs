//! CLI command implementations.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use logrelay_config::load_relay_config;
use logrelay_consumer::{LogConsumer, RelayWorker};
use logrelay_core::{ActiveStoreRegistry, LogEvent, LogLine, LogStatusEvent};
use logrelay_mq::{EventDispatcher, EventKind, MemoryBus};
use tracing::info;

use crate::gateway::DevGateway;

/// Parse and validate a configuration file, printing a summary.
pub fn validate(path: &str) -> anyhow::Result<()> {
    let config = load_relay_config(path)?;

    println!("Configuration OK: {path}");
    for store in &config.stores {
        match &store.url {
            Some(url) => println!("  store {} ({url})", store.name),
            None => println!("  store {}", store.name),
        }
    }
    println!(
        "  retry: delay {}ms, initial budget {}",
        config.retry.delay_ms, config.retry.initial_budget
    );
    println!("  consumer: queue capacity {}", config.consumer.queue_capacity);

    Ok(())
}

/// Run the whole pipeline in one process: in-memory bus, consumers, and a
/// development gateway. Synthetic events are published with the configured
/// retry defaults; with `--fail-first` the retry and failover paths show up
/// in the logs.
pub async fn simulate(config_path: &str, events: usize, fail_first: usize) -> anyhow::Result<()> {
    let config = load_relay_config(config_path)?;

    let bus = Arc::new(MemoryBus::new(config.consumer.queue_capacity));
    let registry = Arc::new(ActiveStoreRegistry::new(config.store_names()));
    let gateway = Arc::new(DevGateway::new(fail_first));
    let dispatcher = EventDispatcher::new(bus.clone());
    let consumer = Arc::new(LogConsumer::new(
        gateway.clone(),
        dispatcher.clone(),
        registry,
    ));

    let mut workers = Vec::new();
    for (kind, name) in [
        (EventKind::Log, "sim-log"),
        (EventKind::LogBatch, "sim-batch"),
        (EventKind::LogStatus, "sim-status"),
    ] {
        if let Some(rx) = bus.subscribe(kind) {
            let worker = RelayWorker::new(name, consumer.clone());
            workers.push(tokio::spawn(async move { worker.run(rx).await }));
        }
    }

    info!(events, fail_first, "Publishing synthetic log events");
    for i in 0..events {
        let build_id = format!("demo-{i}");
        let event = LogEvent {
            build_id: build_id.clone(),
            logs: vec![LogLine {
                timestamp: Utc::now(),
                message: format!("synthetic log line {i}"),
                tag: "demo".to_string(),
                job_id: "job-0".to_string(),
            }],
            retry_budget: config.retry.initial_budget,
            delay_ms: config.retry.delay_ms,
            target_store: None,
        };
        dispatcher.dispatch_log_event(&event).await;

        let status = LogStatusEvent {
            build_id,
            finished: true,
            tag: "demo".to_string(),
            job_id: "job-0".to_string(),
            execute_count: 1,
            retry_budget: config.retry.initial_budget,
            delay_ms: config.retry.delay_ms,
        };
        dispatcher.dispatch_log_status_event(&status).await;
    }

    // Wait until the pipeline goes quiet; the poll window must outlast the
    // redelivery delay or pending retries look like quiescence.
    let window = Duration::from_millis(config.retry.delay_ms + 500);
    let mut last = gateway.attempts();
    loop {
        tokio::time::sleep(window).await;
        let now = gateway.attempts();
        if now == last {
            break;
        }
        last = now;
    }

    for worker in &workers {
        worker.abort();
    }

    info!(
        applied = gateway.applied(),
        attempts = gateway.attempts(),
        "Simulation finished"
    );
    Ok(())
}
