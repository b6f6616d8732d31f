#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use library_api::config::AppConfig;
use library_api::{router, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start the app in-process on a free port with a fresh in-memory store.
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::test();
        config.server.port = port;

        let state = AppState::build(config).await?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/sign-up"))
            .json(&json!({
                "credentials": {
                    "email": email,
                    "password": password,
                    "password_confirmation": password
                }
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "sign-up failed: {}", res.status());
        Ok(res.json::<Value>().await?["user"].clone())
    }

    /// Returns the bearer token
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/sign-in"))
            .json(&json!({ "credentials": { "email": email, "password": password } }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "sign-in failed: {}", res.status());
        let body = res.json::<Value>().await?;
        body["user"]["token"]
            .as_str()
            .map(str::to_string)
            .context("sign-in response has no token")
    }

    /// Sign up and sign in a fresh user; returns (user id, token)
    pub async fn user(&self, email: &str) -> Result<(String, String)> {
        let user = self.sign_up(email, "secret-password").await?;
        let token = self.sign_in(email, "secret-password").await?;
        let id = user["id"].as_str().context("user has no id")?.to_string();
        Ok((id, token))
    }
}
