//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ledger_submitter::config::LedgerConfig;

/// Test signing key (well-known development key, never funded).
#[allow(dead_code)]
pub const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// A request as seen by the mock gateway.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    pub body: String,
}

#[allow(dead_code)]
impl Request {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Requests received so far, in arrival order.
pub type RequestLog = Arc<Mutex<Vec<Request>>>;

/// Start a programmable mock gateway on an ephemeral port.
///
/// `handler` maps each request to a status code and a JSON body.
pub async fn start_gateway<F>(handler: F) -> (SocketAddr, RequestLog)
where
    F: Fn(&Request) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let requests = log.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let _ = serve(socket, handler.as_ref(), &requests).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, log)
}

async fn serve<F>(mut socket: TcpStream, handler: &F, log: &RequestLog) -> std::io::Result<()>
where
    F: Fn(&Request) -> (u16, String),
{
    let request = match read_request(&mut socket).await? {
        Some(request) => request,
        None => return Ok(()),
    };
    log.lock().unwrap().push(request.clone());

    let (status, body) = handler(&request);
    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        _ => "200 OK",
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<Option<Request>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Ok(Some(Request { method, path, body }))
}

/// Gateway config pointing at `addr`.
#[allow(dead_code)]
pub fn ledger_config(addr: SocketAddr) -> LedgerConfig {
    LedgerConfig {
        lcd_url: format!("http://{}", addr),
        failover_urls: Vec::new(),
        chain_id: "localterra".to_string(),
        request_timeout_secs: 5,
        broadcast_mode: "block".to_string(),
        verify_chain_id: true,
    }
}

/// Account route response.
#[allow(dead_code)]
pub fn account_body(account_number: u64, sequence: u64) -> String {
    serde_json::json!({
        "account": {
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "terra1dcegyrekltswvyy0xy69ydgxn9x8x32zdtapd8",
            "pub_key": null,
            "account_number": account_number.to_string(),
            "sequence": sequence.to_string(),
        }
    })
    .to_string()
}

/// Node info route response.
#[allow(dead_code)]
pub fn node_info_body(network: &str) -> String {
    serde_json::json!({
        "node_info": { "network": network, "version": "0.34.14" },
        "application_version": { "name": "terra" }
    })
    .to_string()
}
