use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::*;
use crate::error::{AppError, HttpError};
use crate::plan::{PlanRequest, PlanStage};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

struct CannedResponse {
    status: &'static str,
    content_type: &'static str,
    body: String,
}

impl CannedResponse {
    fn new(status: &'static str, content_type: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type,
            body: body.to_owned(),
        }
    }
}

/// Serves one canned response per connection and returns the raw requests.
async fn spawn_stub_backend(
    responses: Vec<CannedResponse>,
) -> Result<(SocketAddr, JoinHandle<Result<Vec<String>, String>>), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("Failed to bind stub backend: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("Failed to read stub addr: {}", err))?;

    let task = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = timeout(TEST_TIMEOUT, listener.accept())
                .await
                .map_err(|_err| "Stub accept timed out".to_owned())?
                .map_err(|err| format!("Stub accept failed: {}", err))?;
            let request = read_request(&mut stream).await?;
            requests.push(request);
            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                response.status,
                response.content_type,
                response.body.len(),
                response.body
            );
            stream
                .write_all(reply.as_bytes())
                .await
                .map_err(|err| format!("Stub write failed: {}", err))?;
            stream
                .shutdown()
                .await
                .map_err(|err| format!("Stub shutdown failed: {}", err))?;
        }
        Ok(requests)
    });
    Ok((addr, task))
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Result<String, String> {
    let mut raw = Vec::new();
    let mut buf = [0_u8; 1024];
    loop {
        let read = timeout(TEST_TIMEOUT, stream.read(&mut buf))
            .await
            .map_err(|_err| "Stub read timed out".to_owned())?
            .map_err(|err| format!("Stub read failed: {}", err))?;
        if read == 0 {
            break;
        }
        raw.extend_from_slice(buf.get(..read).unwrap_or_default());
        let text = String::from_utf8_lossy(&raw);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let expected = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if body.len() >= expected {
                break;
            }
        }
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

fn backend(addr: SocketAddr) -> Result<HttpBackend, String> {
    HttpBackend::new(&format!("http://{}", addr), TEST_TIMEOUT).map_err(|err| err.to_string())
}

#[test]
fn fetch_metrics_returns_body() -> Result<(), String> {
    run_async_test(async {
        let body = "# TYPE ultron_slaves gauge\nultron_slaves 2\n";
        let (addr, task) =
            spawn_stub_backend(vec![CannedResponse::new("200 OK", "text/plain", body)]).await?;
        let text = backend(addr)?
            .fetch_metrics()
            .await
            .map_err(|err| err.to_string())?;
        if text != body {
            return Err(format!("unexpected body: {:?}", text));
        }
        let requests = task.await.map_err(|err| err.to_string())??;
        let first = requests.first().map(String::as_str).unwrap_or_default();
        if !first.starts_with("GET /metrics HTTP/1.1") {
            return Err(format!("unexpected request: {}", first));
        }
        Ok(())
    })
}

#[test]
fn fetch_metrics_rejects_error_status() -> Result<(), String> {
    run_async_test(async {
        let (addr, _task) = spawn_stub_backend(vec![CannedResponse::new(
            "503 Service Unavailable",
            "text/plain",
            "down",
        )])
        .await?;
        match backend(addr)?.fetch_metrics().await {
            Err(AppError::Http(HttpError::UnexpectedStatus { status: 503, .. })) => Ok(()),
            other => Err(format!("expected 503 error, got {:?}", other)),
        }
    })
}

#[test]
fn submit_plan_posts_json_and_decodes_rejection() -> Result<(), String> {
    run_async_test(async {
        let (addr, task) = spawn_stub_backend(vec![CannedResponse::new(
            "400 Bad Request",
            "application/json",
            r#"{"error_message":"empty stage"}"#,
        )])
        .await?;
        let plan = PlanRequest {
            name: "smoke".to_owned(),
            stages: vec![PlanStage {
                requests: Some(10),
                concurrent_users: Some(2),
                ..PlanStage::default()
            }],
        };
        let response = backend(addr)?
            .submit_plan(&plan)
            .await
            .map_err(|err| err.to_string())?;
        if response.result || response.message() != "empty stage" {
            return Err(format!("unexpected response: {:?}", response));
        }
        let requests = task.await.map_err(|err| err.to_string())??;
        let raw = requests.first().map(String::as_str).unwrap_or_default();
        if !raw.starts_with("POST /api/v1/plan HTTP/1.1") {
            return Err(format!("unexpected request line: {}", raw));
        }
        if !raw.contains(r#""concurrent_users":2"#) || !raw.contains(r#""name":"smoke""#) {
            return Err(format!("unexpected request body: {}", raw));
        }
        Ok(())
    })
}

#[test]
fn stop_plan_sends_delete() -> Result<(), String> {
    run_async_test(async {
        let (addr, task) = spawn_stub_backend(vec![CannedResponse::new(
            "200 OK",
            "application/json",
            r#"{"result":true}"#,
        )])
        .await?;
        let response = backend(addr)?
            .stop_plan()
            .await
            .map_err(|err| err.to_string())?;
        if !response.result {
            return Err(format!("unexpected response: {:?}", response));
        }
        let requests = task.await.map_err(|err| err.to_string())??;
        let raw = requests.first().map(String::as_str).unwrap_or_default();
        if !raw.starts_with("DELETE /api/v1/plan HTTP/1.1") {
            return Err(format!("unexpected request line: {}", raw));
        }
        Ok(())
    })
}

#[test]
fn non_json_error_reply_is_status_error() -> Result<(), String> {
    run_async_test(async {
        let (addr, _task) = spawn_stub_backend(vec![CannedResponse::new(
            "502 Bad Gateway",
            "text/html",
            "<html>bad gateway</html>",
        )])
        .await?;
        match backend(addr)?.stop_plan().await {
            Err(AppError::Http(HttpError::UnexpectedStatus { status: 502, .. })) => Ok(()),
            other => Err(format!("expected 502 error, got {:?}", other)),
        }
    })
}

#[test]
fn invalid_base_url_is_rejected() -> Result<(), String> {
    match HttpBackend::new("not a url", TEST_TIMEOUT) {
        Err(AppError::Http(HttpError::InvalidUrl { .. })) => Ok(()),
        other => Err(format!("expected invalid URL error, got {:?}", other.map(|_| ()))),
    }
}

#[test]
fn unreachable_backend_is_transient() -> Result<(), String> {
    run_async_test(async {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| err.to_string())?;
        let addr = listener.local_addr().map_err(|err| err.to_string())?;
        drop(listener);
        match backend(addr)?.fetch_metrics().await {
            Err(err) if err.is_transient() => Ok(()),
            other => Err(format!("expected transient error, got {:?}", other)),
        }
    })
}
