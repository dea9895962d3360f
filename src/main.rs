use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use tokio::signal;

use tandem::telemetry::{setup_metrics_recorder, setup_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let mut state = tandem::initialize_state().await?;
    match setup_metrics_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(err) => {
            tracing::error!(error = %err, "prometheus recorder not installed")
        },
    }

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, state.config.port));
    let listener = TcpListener::bind(address).await?;
    tracing::info!(%address, "server started");

    axum::serve(listener, tandem::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
