use super::expectation::{Expectation, MockResponse, Times};
use super::matcher::{decode_query, RequestMatcher};
use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

type GenericError = Box<dyn std::error::Error + Send + Sync>;
type Result<T> = std::result::Result<T, GenericError>;

/// A mock lookup endpoint serving scripted JSON answers
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

struct ServerState {
    expectations: Vec<Expectation>,
    received: Vec<RecordedRequest>,
    unmatched: Vec<RecordedRequest>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: http::Method,
    pub path: String,
    /// Decoded query parameters, in request order
    pub query: Vec<(String, String)>,
    pub headers: http::HeaderMap,
}

impl RecordedRequest {
    /// First value of the query parameter `key`
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl MockServer {
    /// Start a new mock server on a random local port
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let state = Arc::new(Mutex::new(ServerState {
            expectations: Vec::new(),
            received: Vec::new(),
            unmatched: Vec::new(),
        }));

        let state_clone = state.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let state = state_clone.clone();

                                tokio::spawn(async move {
                                    if let Err(err) = hyper_util::server::conn::auto::Builder::new(hyper_util::rt::TokioExecutor::new())
                                        .serve_connection(io, service_fn(move |req| handle_request(req, state.clone())))
                                        .await
                                    {
                                        tracing::debug!(error = ?err, "Mock connection closed with error");
                                    }
                                });
                            }
                            Err(e) => tracing::warn!(error = %e, "Mock server accept failed"),
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL of `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Every request received so far, matched or not, in arrival order
    pub fn received_requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().received.clone()
    }

    /// Requests that didn't match any expectation
    pub fn unmatched_requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().unmatched.clone()
    }

    /// Add an expectation. It is registered when the returned builder drops.
    pub fn expect(&self, matcher: RequestMatcher) -> ExpectationBuilder {
        ExpectationBuilder {
            server: self.state.clone(),
            expectation: Some(Expectation::new(matcher)),
        }
    }

    /// Panic unless every expectation was matched the expected number of times
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        let failures: Vec<String> = state
            .expectations
            .iter()
            .filter_map(|exp| exp.check().err())
            .collect();
        assert!(failures.is_empty(), "{}", failures.join("\n"));
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub struct ExpectationBuilder {
    server: Arc<Mutex<ServerState>>,
    expectation: Option<Expectation>,
}

impl ExpectationBuilder {
    fn update(mut self, f: impl FnOnce(&mut Expectation)) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            f(exp);
        }
        self
    }

    pub fn respond_with(self, response: MockResponse) -> Self {
        self.update(|exp| exp.response = response)
    }

    pub fn times(self, n: usize) -> Self {
        self.update(|exp| exp.times = Times::Exactly(n))
    }

    pub fn once(self) -> Self {
        self.update(|exp| exp.times = Times::Once)
    }

    pub fn at_least_once(self) -> Self {
        self.update(|exp| exp.times = Times::AtLeast(1))
    }

    pub fn never(self) -> Self {
        self.update(|exp| exp.times = Times::Exactly(0))
    }
}

impl Drop for ExpectationBuilder {
    fn drop(&mut self) {
        if let Some(exp) = self.expectation.take() {
            let mut state = self.server.lock().unwrap();
            state.expectations.push(exp);
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<Mutex<ServerState>>,
) -> Result<Response<Full<Bytes>>> {
    let (parts, _body) = req.into_parts();
    let recorded = RecordedRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query: decode_query(parts.uri.query()),
        headers: parts.headers.clone(),
    };

    // Later expectations take priority. The lock is released before any
    // scripted delay so slow answers do not hold up other requests.
    let response = {
        let mut state_guard = state.lock().unwrap();
        state_guard.received.push(recorded.clone());

        let matching_idx = state_guard
            .expectations
            .iter()
            .enumerate()
            .rev()
            .find(|(_, exp)| {
                exp.matcher.matches(
                    &parts.method,
                    parts.uri.path(),
                    parts.uri.query(),
                    &parts.headers,
                )
            })
            .map(|(i, _)| i);

        match matching_idx {
            Some(idx) => {
                let exp = &mut state_guard.expectations[idx];
                exp.call_count += 1;
                Some(exp.response.clone())
            }
            None => {
                state_guard.unmatched.push(recorded);
                None
            }
        }
    };

    let Some(resp_def) = response else {
        return Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("No expectation matched")))?);
    };

    if let Some(delay) = resp_def.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = Response::builder().status(resp_def.status);
    for (k, v) in &resp_def.headers {
        response = response.header(k, v);
    }
    Ok(response.body(Full::new(resp_def.body))?)
}
