use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const RUNNING_SCRAPE: &str = r#"# HELP ultron_attacker_response_time the response time for this attacker
# TYPE ultron_attacker_response_time summary
ultron_attacker_response_time{attacker="login",plan="smoke",quantile="0.5"} 12
ultron_attacker_response_time{attacker="login",plan="smoke",quantile="0.9"} 30
ultron_attacker_response_time{attacker="login",plan="smoke",quantile="0.99"} 48
# TYPE ultron_attacker_requests_total gauge
ultron_attacker_requests_total{attacker="login",plan="smoke"} 420
# TYPE ultron_attacker_failures_total gauge
ultron_attacker_failures_total{attacker="login",plan="smoke"} 4
# TYPE ultron_attacker_tps_current gauge
ultron_attacker_tps_current{attacker="login",plan="smoke"} 84
# TYPE ultron_current_users gauge
ultron_current_users{plan="smoke"} 20
"#;

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a stand-in ultron backend that serves `RUNNING_SCRAPE` on
/// `/metrics` and accepts every plan request.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_backend() -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
        },
    ))
}

fn handle_client(mut stream: TcpStream) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let Some(request_line) = read_request(&mut stream) else {
        return;
    };
    let (content_type, body) = if request_line.starts_with("GET /metrics") {
        ("text/plain; version=0.0.4", RUNNING_SCRAPE)
    } else if request_line.contains("/api/v1/plan") {
        ("application/json", r#"{"result":true}"#)
    } else {
        ("text/plain", "not found")
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// Reads headers plus any declared body; returns the request line.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 1024];
    loop {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(buffer.get(..read)?);
        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end.saturating_add(4).saturating_add(content_length) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data)
        .lines()
        .next()
        .map(str::to_owned)
}

/// Run the `ultron-dashboard` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_dashboard<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = dashboard_bin()?;
    Command::new(bin)
        .args(args)
        .env("ULTRON_DASHBOARD_LOG", "error")
        .env_remove("ULTRON_BACKEND")
        .output()
        .map_err(|err| format!("run ultron-dashboard failed: {}", err))
}

fn dashboard_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_ultron-dashboard").map_or_else(
        || Err("CARGO_BIN_EXE_ultron-dashboard missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

/// Formats a failed run for the test error message.
#[must_use]
pub fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
