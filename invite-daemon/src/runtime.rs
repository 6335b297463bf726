use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use invite_bitable::{BitableClient, TableService};
use invite_core::Config;
use invite_sync::{SyncPipeline, WriteThrottle};

use crate::error::{io_err, DaemonError};
use crate::processor::SyncHandle;
use crate::routes::build_router;
use crate::schedule;
use crate::state::AppState;

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: Config) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon: HTTP server, sync processor, daily scheduler and signal
/// handler. Returns once all of them have stopped.
pub async fn run(config: Config) -> Result<(), DaemonError> {
    let service: Arc<dyn TableService> = Arc::new(BitableClient::from_config(&config)?);
    let throttle = Arc::new(WriteThrottle::new(config.write_interval));
    let pipeline = Arc::new(SyncPipeline::from_config(
        service.clone(),
        &config,
        throttle,
    ));

    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let (sync, processor_handle) = SyncHandle::spawn(pipeline, &shutdown_tx);

    let schedule_handle = match config.sync_at {
        Some(at) => schedule::spawn_daily(at, sync.clone(), &shutdown_tx),
        None => {
            tracing::info!("daily sync disabled; use /feishu/sync-invite-counts to trigger");
            tokio::spawn(async { Ok::<(), DaemonError>(()) })
        }
    };

    let server_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let router = build_router(AppState::new(service, &config, sync));
        tokio::spawn(async move {
            let result = http_server_task(addr, router, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = shutdown_signal() => {
                    match signal {
                        Ok(name) => {
                            tracing::info!(signal = name, "received signal, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(io_err("signal handler", err)),
                    }
                }
            }
        })
    };

    let (processor_result, schedule_result, server_result, signal_result) = tokio::join!(
        processor_handle,
        schedule_handle,
        server_handle,
        signal_handle
    );

    handle_join("sync_processor", processor_result)?;
    handle_join("daily_schedule", schedule_result)?;
    handle_join("http_server", server_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("daemon stopped");
    Ok(())
}

async fn http_server_task(
    addr: SocketAddr,
    router: Router,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| io_err(format!("bind {addr}"), e))?;
    tracing::info!(%addr, "invite daemon listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| io_err("http server", e))
}

async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "ctrl-c"),
            _ = terminate.recv() => Ok("terminate"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Task(format!("{task} task join failure: {err}"))),
    }
}

/// Install the global `tracing` subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
