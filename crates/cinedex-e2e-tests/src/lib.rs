use std::{path::Path, time::Duration};

use anyhow::{Result, anyhow};
use cinedex_server::{
    config::{Parser, ServerConfig},
    run::run_graceful_with_state,
};
use rand::Rng as _;
use reqwest::Url;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::{debug, info};

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(4030..5030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

/// Keeps temporary data directory and running server alive, both are
/// cleaned up on drop.
pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub fn test_config(
    test_name: &str,
    base_dir: &Path,
    extra_args: &[&str],
) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let mut args = vec![
        "cinedex-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--env",
        "staging",
    ];
    args.extend_from_slice(extra_args);
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
            shutdown: None,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    prepare_env_with_args(test_name, &[]).await
}

pub async fn prepare_env_with_args(
    test_name: &str,
    extra_args: &[&str],
) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    let (config, guard) = test_config(test_name, &base_dir, extra_args)?;
    debug!("Test database is {}", config.database_url());
    Ok((config, guard))
}

pub fn base_url(config: &ServerConfig) -> Result<Url> {
    let url = Url::parse(&format!("http://127.0.0.1:{}/", config.port))?;
    Ok(url)
}

pub fn extend_url(base_url: &Url, path: impl AsRef<str>) -> Url {
    let path = path.as_ref().trim_start_matches('/');
    let mut url = base_url.clone();
    url.set_path(&format!("{}{}", url.path(), path));
    url
}

/// Starts server in background task and waits until it answers health check.
/// Server is stopped when the guard is dropped.
pub async fn spawn_server(config: ServerConfig, guard: &mut ConfigGuard) -> Result<Url> {
    let url = base_url(&config)?;
    let state = cinedex_server::run::build_state(&config).await?;
    let (sender, receiver) = oneshot::channel::<()>();
    guard.shutdown = Some(sender);
    tokio::spawn(async move {
        let shutdown = async {
            let _ = receiver.await;
        };
        if let Err(e) = run_graceful_with_state(config, state, shutdown).await {
            tracing::error!("Test server failed: {e}");
        }
    });

    let health_url = extend_url(&url, "v1/healthcheck");
    let client = reqwest::Client::new();
    for _ in 0..50 {
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Test server is up at {url}");
                return Ok(url);
            }
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    Err(anyhow!("Test server did not start at {url}"))
}

pub fn movie_payload(title: &str, year: i32, runtime: i32, genres: &[&str]) -> Value {
    json!({
        "title": title,
        "year": year,
        "runtime": format!("{runtime} mins"),
        "genres": genres,
    })
}

/// Creates movie through API, returns the `movie` object from response.
pub async fn create_movie(
    client: &reqwest::Client,
    base_url: &Url,
    payload: &Value,
) -> Result<Value> {
    let response = client
        .post(extend_url(base_url, "v1/movies"))
        .json(payload)
        .send()
        .await?;
    if response.status().as_u16() != 201 {
        return Err(anyhow!("Unexpected status {}", response.status()));
    }
    let mut body: Value = response.json().await?;
    body.get_mut("movie")
        .map(Value::take)
        .ok_or_else(|| anyhow!("Missing movie in response"))
}
