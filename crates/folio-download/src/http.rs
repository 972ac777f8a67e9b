//! HTTP backend used for file fetches and health checks.
//!
//! The engine only needs "GET this URL and give me a status and a body
//! stream". Transport failures before a response arrives are connectivity
//! errors; any response, whatever its status, is not.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use folio_core::ConnectivityError;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;

/// Body of a response as a stream of chunks.
pub type BodyStream = BoxStream<'static, io::Result<Bytes>>;

/// A response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl HttpResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Port for outbound GET requests.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ConnectivityError>;
}

/// `reqwest` implementation.
#[derive(Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get(&self, url: &str) -> Result<HttpResponse, ConnectivityError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            body: response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)).boxed(),
        })
    }
}

/// Connect failures and timeouts mean the network is gone; anything else
/// (bad URL, TLS, redirect loops) will not heal by waiting.
fn classify_transport_error(err: reqwest::Error) -> ConnectivityError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        ConnectivityError::recoverable(err.to_string())
    } else {
        ConnectivityError::unrecoverable(err.to_string())
    }
}

/// Scripted in-memory backend for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex, PoisonError};

    use async_trait::async_trait;
    use bytes::Bytes;
    use folio_core::ConnectivityError;
    use futures_util::StreamExt;
    use futures_util::stream;
    use tokio::sync::Semaphore;

    use super::{HttpBackend, HttpResponse};

    /// What the fake answers for a URL.
    #[derive(Debug, Clone)]
    pub enum FakeReply {
        Respond { status: u16, chunks: Vec<Bytes> },
        /// Sends `chunks`, then fails the body stream.
        BrokenBody { chunks: Vec<Bytes>, error: String },
        /// Transport error that does not heal.
        Refused(String),
    }

    impl FakeReply {
        pub fn ok(body: impl Into<Bytes>) -> Self {
            Self::Respond {
                status: 200,
                chunks: vec![body.into()],
            }
        }

        pub const fn status(status: u16) -> Self {
            Self::Respond {
                status,
                chunks: Vec::new(),
            }
        }
    }

    struct Script {
        replies: HashMap<String, FakeReply>,
        requests: HashMap<String, usize>,
        online: bool,
    }

    /// Replies from a script. Unknown URLs answer 404.
    pub struct FakeBackend {
        script: Mutex<Script>,
        gate: Mutex<Option<Arc<Semaphore>>>,
    }

    impl Default for FakeBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self {
                script: Mutex::new(Script {
                    replies: HashMap::new(),
                    requests: HashMap::new(),
                    online: true,
                }),
                gate: Mutex::new(None),
            }
        }

        pub fn reply(&self, url: &str, reply: FakeReply) {
            self.script().replies.insert(url.to_string(), reply);
        }

        /// While offline every request fails with a recoverable error.
        pub fn set_online(&self, online: bool) {
            self.script().online = online;
        }

        /// Number of requests made for `url`, offline attempts included.
        pub fn requests(&self, url: &str) -> usize {
            self.script().requests.get(url).copied().unwrap_or(0)
        }

        /// Hold every request until a permit is added to the returned semaphore.
        pub fn gate(&self) -> Arc<Semaphore> {
            let gate = Arc::new(Semaphore::new(0));
            *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&gate));
            gate
        }

        fn script(&self) -> std::sync::MutexGuard<'_, Script> {
            self.script.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get(&self, url: &str) -> Result<HttpResponse, ConnectivityError> {
            let (online, reply) = {
                let mut script = self.script();
                *script.requests.entry(url.to_string()).or_default() += 1;
                (script.online, script.replies.get(url).cloned())
            };

            let gate = self
                .gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(gate) = gate {
                let _permit = gate.acquire().await;
            }

            if !online {
                return Err(ConnectivityError::recoverable("network unreachable"));
            }

            match reply.unwrap_or_else(|| FakeReply::status(404)) {
                FakeReply::Respond { status, chunks } => Ok(HttpResponse {
                    status,
                    body: stream::iter(chunks.into_iter().map(Ok)).boxed(),
                }),
                FakeReply::BrokenBody { chunks, error } => Ok(HttpResponse {
                    status: 200,
                    body: stream::iter(chunks.into_iter().map(Ok))
                        .chain(stream::once(async move { Err(io::Error::other(error)) }))
                        .boxed(),
                }),
                FakeReply::Refused(message) => Err(ConnectivityError::unrecoverable(message)),
            }
        }
    }
}
