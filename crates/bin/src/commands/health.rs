//! Health check command - probes a running drawconnect server.

use std::time::Duration;

use drawconnect::http::HealthResponse;

use crate::cli::HealthArgs;

/// Run the health check command
///
/// Exits with status 1 unless the server answers `/health` with a healthy
/// document store.
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("http://{}:{}/health", args.host, args.port);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("unhealthy: failed to reach {url}: {e}");
            std::process::exit(1);
        }
    };

    let status = response.status();
    match response.json::<HealthResponse>().await {
        Ok(health) if status.is_success() && health.status == "healthy" => {
            println!("healthy: backend {}", health.backend);
            Ok(())
        }
        Ok(health) => {
            eprintln!(
                "unhealthy: HTTP {status}, backend {} reports {}",
                health.backend, health.status
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("unhealthy: HTTP {status}, unreadable health document: {e}");
            std::process::exit(1);
        }
    }
}
