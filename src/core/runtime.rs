//! Apalis worker setup for the scheduled passes

use crate::engine::Engine;
use crate::jobs::handlers;
use crate::jobs::types::{GenerateSignalJob, MonitorSignalsJob, ScanMarketJob};
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use tracing::info;

/// Queues consumed by the workers.
#[derive(Clone)]
pub struct JobQueues {
    pub generate: Arc<RedisStorage<GenerateSignalJob>>,
    pub monitor: Arc<RedisStorage<MonitorSignalsJob>>,
    pub scan: Arc<RedisStorage<ScanMarketJob>>,
}

impl JobQueues {
    pub async fn connect(redis_url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let conn = apalis_redis::connect(redis_url.to_string()).await?;
        Ok(Self {
            generate: Arc::new(RedisStorage::new(conn.clone())),
            monitor: Arc::new(RedisStorage::new(conn.clone())),
            scan: Arc::new(RedisStorage::new(conn)),
        })
    }
}

/// One worker per pass. Each worker handles one job at a time, so a pass
/// never overlaps with itself inside a process.
pub struct SignalRuntime {
    engine: Arc<Engine>,
    queues: JobQueues,
}

impl SignalRuntime {
    pub fn new(engine: Arc<Engine>, queues: JobQueues) -> Self {
        Self { engine, queues }
    }

    /// Start all workers and return handles for graceful shutdown
    pub async fn start_workers(
        &self,
    ) -> Result<Vec<tokio::task::JoinHandle<()>>, Box<dyn std::error::Error + Send + Sync>> {
        let mut handles = Vec::new();
        info!("SignalRuntime: starting Apalis workers");

        let generate_storage = (*self.queues.generate).clone();
        let engine = self.engine.clone();
        handles.push(tokio::spawn(async move {
            let worker = WorkerBuilder::new("generate-signal-worker")
                .data(engine)
                .backend(generate_storage)
                .build_fn(handlers::handle_generate_signal);

            info!("SignalRuntime: GenerateSignalJob worker started");
            worker.run().await;
        }));

        let monitor_storage = (*self.queues.monitor).clone();
        let engine = self.engine.clone();
        handles.push(tokio::spawn(async move {
            let worker = WorkerBuilder::new("monitor-signals-worker")
                .data(engine)
                .backend(monitor_storage)
                .build_fn(handlers::handle_monitor_signals);

            info!("SignalRuntime: MonitorSignalsJob worker started");
            worker.run().await;
        }));

        let scan_storage = (*self.queues.scan).clone();
        let engine = self.engine.clone();
        handles.push(tokio::spawn(async move {
            let worker = WorkerBuilder::new("scan-market-worker")
                .data(engine)
                .backend(scan_storage)
                .build_fn(handlers::handle_scan_market);

            info!("SignalRuntime: ScanMarketJob worker started");
            worker.run().await;
        }));

        info!("SignalRuntime: all workers started");
        Ok(handles)
    }
}
