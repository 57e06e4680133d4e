//! Test server management.
//!
//! Spawns and manages analyticsd instances for integration testing.

use serde_json::Value;
use std::process::{Child, Command};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// Shared secret configured on every test server.
pub const TEST_TOKEN: &str = "integration-test-token";

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    client: reqwest::Client,
    _data_dir: TempDir,
}

impl TestServer {
    /// Spawn a new test server with the built-in schema.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        Self::spawn_with_schema(port, None).await
    }

    /// Spawn a test server, optionally with a custom schema file body.
    pub async fn spawn_with_schema(port: u16, schema: Option<&str>) -> anyhow::Result<Self> {
        let data_dir = tempfile::Builder::new()
            .prefix(&format!("analyticsd-test-{}", port))
            .tempdir()?;

        let schema_section = match schema {
            Some(body) => {
                let schema_path = data_dir.path().join("commands.toml");
                std::fs::write(&schema_path, body)?;
                format!("[schema]\npath = \"{}\"\n", schema_path.display())
            }
            None => String::new(),
        };

        // Create minimal test configuration
        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test.analytics"

[listen]
address = "127.0.0.1:{}"

[auth]
token = "{}"

[events]
known = ["guildCreate", "messageCreate"]

{}"#,
            port, TEST_TOKEN, schema_section
        );
        std::fs::write(&config_path, config_content)?;

        // Spawn the server process
        let child = Command::new(env!("CARGO_BIN_EXE_analyticsd"))
            .arg(&config_path)
            .env_remove("ENDPOINT_AUTH")
            .spawn()?;

        let server = Self {
            child,
            port,
            client: reqwest::Client::new(),
            _data_dir: data_dir,
        };

        // Wait for server to start listening
        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Base URL of the server.
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    /// POST a JSON body with the given authorization header value.
    pub async fn post_as(
        &self,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> anyhow::Result<(u16, Value)> {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.header("Authorization", token);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await?;
        Ok((status, body))
    }

    /// POST a JSON body with the test token.
    pub async fn post(&self, path: &str, body: Value) -> anyhow::Result<(u16, Value)> {
        self.post_as(path, Some(TEST_TOKEN), body).await
    }

    /// GET a path with the test token.
    pub async fn get(&self, path: &str) -> anyhow::Result<(u16, Value)> {
        let response = self
            .client
            .get(self.url(path))
            .header("Authorization", TEST_TOKEN)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await?;
        Ok((status, body))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
