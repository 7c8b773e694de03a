//! Serve command - runs the drawconnect HTTP server.

use std::future::Future;
use std::path::Path;

use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};

use drawconnect::UserStore;
use drawconnect::store::InMemory;

use crate::backend::create_user_store;
use crate::cli::ServeArgs;

/// Run the drawconnect server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let users = create_user_store(&args.backend_config).await?;

    // Refuse to serve without a usable store
    if let Err(e) = users.check_connectivity().await {
        tracing::error!("Document store is not reachable: {e}");
        return Err(e.into());
    }
    tracing::info!(backend = users.store().kind(), "Document store reachable");

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!("drawconnect listening on http://{local_addr}");
    println!("drawconnect server starting on http://localhost:{}", local_addr.port());
    println!();
    println!("Available endpoints:");
    println!("  GET  /                   - Document store connectivity check");
    println!("  GET  /health             - JSON health check");
    println!("  GET  /users              - List all users");
    println!("  GET  /user/id/{{id}}       - Find a user by identifier");
    println!("  GET  /user/email/{{email}} - Find a user by email");
    println!("  POST /user               - Create a user");
    println!();
    println!("Press Ctrl+C to shutdown");

    let data_file = args.backend_config.data_file();
    serve_until(listener, users, &data_file, shutdown_signal()).await?;

    println!("Server shut down");
    Ok(())
}

/// Serves `users` until `shutdown` resolves and every open connection has
/// drained, then saves the in-memory store to `data_file`.
///
/// The save runs only once no request can still write.
pub async fn serve_until(
    listener: TcpListener,
    users: UserStore,
    data_file: &Path,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, drawconnect::http::router(users.clone()))
        .with_graceful_shutdown(shutdown)
        .await?;

    // Only the InMemory backend needs saving
    if let Some(in_memory) = users.store().as_any().downcast_ref::<InMemory>() {
        match in_memory.save_to_file(data_file).await {
            Ok(()) => {
                tracing::info!("Users saved to {}", data_file.display());
                println!("\nUsers saved successfully");
            }
            Err(e) => {
                tracing::error!("Failed to save users: {e:?}");
                eprintln!("Failed to save users: {e:?}");
            }
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to set up SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to set up SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
        _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
    }
}
