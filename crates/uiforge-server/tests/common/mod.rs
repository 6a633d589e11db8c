//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use uiforge_llm::Generator;
use uiforge_server::{AppState, Server, ServerConfig};
use uiforge_session::{
    CacheConfig, MemoryCache, MemoryStore, SessionManager, SessionPolicy,
};

pub const ALICE_TOKEN: &str = "token-alice";
pub const BOB_TOKEN: &str = "token-bob";

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client for this server.
    pub client: Client,
    /// Durable store behind the server, for assertions.
    pub store: MemoryStore,
    /// Cache behind the server, for assertions.
    pub cache: MemoryCache,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with two token users and no generator.
    pub async fn start() -> Result<Self> {
        Self::launch(None).await
    }

    /// Start a server that generates with `generator`.
    pub async fn start_with_generator(generator: Arc<dyn Generator>) -> Result<Self> {
        Self::launch(Some(generator)).await
    }

    async fn launch(generator: Option<Arc<dyn Generator>>) -> Result<Self> {
        let cache = MemoryCache::new(CacheConfig::new().with_cleanup_task(false));
        let store = MemoryStore::new();
        let sessions = SessionManager::new(
            Arc::new(cache.clone()),
            Arc::new(store.clone()),
            SessionPolicy::new(),
        );

        let config = ServerConfig::new()
            .with_token("alice", ALICE_TOKEN)
            .with_token("bob", BOB_TOKEN)
            .with_request_logging(false);

        let mut state = AppState::new(sessions, config);
        if let Some(generator) = generator {
            state = state.with_generator(generator);
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel();

        let server = Server::new(state);
        let handle = tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            store,
            cache,
            shutdown: Some(tx),
            handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url(), path)
    }

    pub fn get(&self, token: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, token: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn put(&self, token: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, token: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Create a draft and return its id.
    pub async fn create_draft(&self, token: &str) -> Result<String> {
        let body: serde_json::Value = self
            .post(token, "/sessions/new")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        body["session"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("create response has no id: {body}"))
    }

    /// Stop the server and wait for it to exit.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        timeout(Duration::from_secs(5), &mut self.handle).await??;
        Ok(())
    }
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
