//! In-process HTTP stub for exercising the transport without a real
//! backend. Responses are enqueued per method-and-path and served FIFO;
//! every request is recorded for later assertions.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A canned response for one request.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    /// A JSON response with the given status.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One request as seen by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct StubState {
    routes: HashMap<String, VecDeque<StubResponse>>,
    requests: Vec<RecordedRequest>,
}

/// A minimal HTTP/1.1 server on a random loopback port.
pub struct StubServer {
    addr: SocketAddr,
    state: Arc<Mutex<StubState>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Bind a listener and start serving in the background.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener addr");
        let state = Arc::new(Mutex::new(StubState::default()));

        let accept_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let conn_state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let _ = handle_connection(stream, conn_state).await;
                });
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL for pointing a client at this stub.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a response for the next request matching `method` and `path`.
    pub fn enqueue(&self, method: &str, path: &str, response: StubResponse) {
        let mut state = self.state.lock().expect("stub state lock");
        state
            .routes
            .entry(route_key(method, path))
            .or_default()
            .push_back(response);
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().expect("stub state lock").requests.clone()
    }

    /// Number of requests received for `method` and `path`.
    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.state
            .lock()
            .expect("stub state lock")
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{method} {path}")
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<Mutex<StubState>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut chunked = false;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "transfer-encoding" => chunked = value.eq_ignore_ascii_case("chunked"),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let body = if chunked {
        read_chunked_body(&mut reader).await?
    } else {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).await?;
        buf
    };
    let body = String::from_utf8_lossy(&body).into_owned();

    let response = {
        let mut state = state.lock().expect("stub state lock");
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            authorization,
            body,
        });
        state
            .routes
            .get_mut(&route_key(&method, &path))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                StubResponse::json(404, r#"{"success":false,"error":"Not found"}"#)
            })
    };

    let reason = match response.status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let payload = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason,
        response.body.len(),
        response.body
    );
    let mut stream = reader.into_inner();
    stream.write_all(payload.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_chunked_body(reader: &mut BufReader<TcpStream>) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).await?;
        let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);
        if size == 0 {
            // Trailing CRLF after the last chunk.
            let mut end = String::new();
            reader.read_line(&mut end).await?;
            break;
        }
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).await?;
        chunk.truncate(size);
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
