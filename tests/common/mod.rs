#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};

use recipes_api::auth::{generate_jwt, Claims};

pub const JWT_SECRET: &str = "integration-test-secret";

/// A server process running with in-memory storage. Killed on drop.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_recipes-api"))
            .args(["serve", "--in-memory", "--port", &port.to_string()])
            .env("APP_ENV", "development")
            .env("JWT_SECRET", JWT_SECRET)
            .env("API_PER_PAGE_MIN", "2")
            .env("API_PER_PAGE_MAX", "3")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    /// Request builders already carrying a Bearer token for `user_id`
    pub fn as_user(&self, user_id: i64) -> UserClient<'_> {
        UserClient {
            server: self,
            token: token_for(user_id),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub struct UserClient<'a> {
    server: &'a TestServer,
    token: String,
}

impl UserClient<'_> {
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.server.client.get(self.server.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.server.client.post(self.server.url(path)).bearer_auth(&self.token)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.server.client.put(self.server.url(path)).bearer_auth(&self.token)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.server.client.delete(self.server.url(path)).bearer_auth(&self.token)
    }
}

pub fn token_for(user_id: i64) -> String {
    let claims = Claims::new(user_id, 1).expect("failed to build test claims");
    generate_jwt(&claims, JWT_SECRET).expect("failed to sign test token")
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
