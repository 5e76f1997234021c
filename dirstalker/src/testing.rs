//! Test fixtures: a minimal HTTP/1.1 responder and a scripted [`Probe`].
use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use crate::probe::{NetworkErrorKind, Probe, ProbeError, ProbeResult};

#[derive(Clone, Debug)]
pub(crate) struct Route {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Route {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub(crate) struct TestServer {
    pub addr: SocketAddr,
    /// Raw request heads, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

/// Serves `routes` (keyed by request path) on an ephemeral port. Unknown
/// paths answer 404 with an empty body.
pub(crate) async fn spawn(routes: Vec<(&str, Route)>) -> TestServer {
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, route)| (path.to_string(), route))
            .collect(),
    );
    let requests = Arc::new(Mutex::new(Vec::new()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let log = requests.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&head).into_owned();
                let path = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                log.lock().push(head);

                let route = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| Route::new(404, ""));
                if let Some(delay) = route.delay {
                    tokio::time::sleep(delay).await;
                }

                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    route.status,
                    route.body.len(),
                    route.body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    TestServer { addr, requests }
}

/// A [`Probe`] whose answers are scripted per candidate.
///
/// Candidates starting with `hit` return 200, everything else 404. Each
/// probe sleeps for the candidate's scripted delay (or `default_delay`).
/// Candidates listed as failing return a timeout error.
#[derive(Default)]
pub(crate) struct ScriptedProbe {
    pub default_delay: Duration,
    pub delays: HashMap<String, Duration>,
    pub failures: HashSet<String>,
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub seen: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn delay(mut self, candidate: &str, delay: Duration) -> Self {
        self.delays.insert(candidate.to_string(), delay);
        self
    }

    pub fn failing(mut self, candidate: &str) -> Self {
        self.failures.insert(candidate.to_string());
        self
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, candidate: &str) -> Result<ProbeResult, ProbeError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(candidate.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(candidate)
            .copied()
            .unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failures.contains(candidate) {
            return Err(ProbeError::network(
                candidate,
                NetworkErrorKind::Timeout,
                "scripted timeout",
            ));
        }
        if candidate.starts_with("hit") {
            Ok(ProbeResult::hit(candidate, 200, candidate.len(), candidate))
        } else {
            Ok(ProbeResult::miss(candidate, 404))
        }
    }
}
