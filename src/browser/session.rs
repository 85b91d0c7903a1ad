use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ax::ax_model::AxSnapshot;
use crate::browser::surface::{BrowserSurface, Key};
use crate::error::FillError;

/// Default per-operation timeout for option clicks.
pub const OPTION_CLICK_TIMEOUT_MS: u64 = 1000;

/// Default deadline for any other bridge operation.
pub const OPERATION_TIMEOUT_MS: u64 = 30_000;

/// How long to wait for the bridge to launch Chromium and report ready.
pub const LAUNCH_TIMEOUT_MS: u64 = 60_000;

/// Request sent to ax_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate {
        cmd: &'static str,
        url: String,
    },
    Snapshot {
        cmd: &'static str,
    },
    Press {
        cmd: &'static str,
        key: &'static str,
    },
    Type {
        cmd: &'static str,
        text: String,
        delay_ms: u64,
    },
    ClickOption {
        cmd: &'static str,
        name: String,
        timeout_ms: u64,
    },
    PageText {
        cmd: &'static str,
    },
    Screenshot {
        cmd: &'static str,
        full_page: bool,
    },
    Quit {
        cmd: &'static str,
    },
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
        }
    }

    pub fn snapshot() -> Self {
        BrowserRequest::Snapshot { cmd: "snapshot" }
    }

    pub fn press(key: Key) -> Self {
        BrowserRequest::Press {
            cmd: "press",
            key: key.as_str(),
        }
    }

    pub fn type_text(text: &str, delay_ms: u64) -> Self {
        BrowserRequest::Type {
            cmd: "type",
            text: text.to_string(),
            delay_ms,
        }
    }

    pub fn click_option(name: &str, timeout_ms: u64) -> Self {
        BrowserRequest::ClickOption {
            cmd: "click_option",
            name: name.to_string(),
            timeout_ms,
        }
    }

    pub fn page_text() -> Self {
        BrowserRequest::PageText { cmd: "page_text" }
    }

    pub fn screenshot(full_page: bool) -> Self {
        BrowserRequest::Screenshot {
            cmd: "screenshot",
            full_page,
        }
    }

    pub fn quit() -> Self {
        BrowserRequest::Quit { cmd: "quit" }
    }

    pub fn command(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { cmd, .. }
            | BrowserRequest::Snapshot { cmd }
            | BrowserRequest::Press { cmd, .. }
            | BrowserRequest::Type { cmd, .. }
            | BrowserRequest::ClickOption { cmd, .. }
            | BrowserRequest::PageText { cmd }
            | BrowserRequest::Screenshot { cmd, .. }
            | BrowserRequest::Quit { cmd } => *cmd,
        }
    }
}

/// A request tagged with its sequence number; the bridge echoes `id` back so
/// a response that arrives after its deadline is not taken for the next one.
#[derive(Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    request: &'a BrowserRequest,
}

/// Response received from ax_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
}

/// How to start the bridge.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Interpreter the bridge script runs under.
    pub node_binary: PathBuf,
    pub server_script: PathBuf,
    pub headless: bool,
    pub click_timeout_ms: u64,
    /// Deadline for every other operation. Expiry is a `SessionIO` error.
    pub op_timeout_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            node_binary: PathBuf::from("node"),
            server_script: PathBuf::from("node/ax_server.js"),
            headless: true,
            click_timeout_ms: OPTION_CLICK_TIMEOUT_MS,
            op_timeout_ms: OPERATION_TIMEOUT_MS,
        }
    }
}

/// Forward stdout lines to a channel so reads can carry a deadline.
fn spawn_reader(stdout: ChildStdout) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Next non-blank line, or an error once `deadline` passes or the bridge
/// closes its output.
fn recv_line(lines: &Receiver<String>, deadline: Instant, what: &str) -> Result<String, FillError> {
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match lines.recv_timeout(remaining) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => return Ok(line),
            Err(RecvTimeoutError::Timeout) => {
                return Err(FillError::SessionIO(format!("Timed out waiting for {} response", what)));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(FillError::SessionIO(format!(
                    "Bridge closed its output before the {} response (process may have died)",
                    what
                )));
            }
        }
    }
}

/// A persistent browser session backed by ax_server.js.
///
/// Launches a long-lived Node.js process that keeps one Chromium page open.
/// Commands are sent as NDJSON over stdin, responses read from stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    lines: Receiver<String>,
    click_timeout_ms: u64,
    op_timeout: Duration,
    next_id: u64,
    closed: bool,
}

impl BrowserSession {
    /// Spawn the bridge and wait for its ready line.
    pub fn launch(options: &SessionOptions) -> Result<Self, FillError> {
        let script = options.server_script.display().to_string();
        let mut command = Command::new(&options.node_binary);
        command
            .arg(&options.server_script)
            .arg(format!("--op-timeout-ms={}", options.op_timeout_ms));
        if !options.headless {
            command.arg("--headed");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FillError::SubprocessSpawn {
                script: script.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FillError::SessionIO(format!("Failed to capture stdin of {}", script)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FillError::SessionIO(format!("Failed to capture stdout of {}", script)))?;

        let lines = spawn_reader(stdout);

        // Wait for the ready signal
        let deadline = Instant::now() + Duration::from_millis(LAUNCH_TIMEOUT_MS);
        let line = match recv_line(&lines, deadline, "ready") {
            Ok(line) => line,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| FillError::JsonParse {
                context: format!("{} ready signal", script),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(FillError::SessionProtocol {
                command: "launch".into(),
                error: format!("Did not receive ready signal from {}", script),
            });
        }

        debug!(script = %script, headless = options.headless, "browser bridge ready");

        Ok(BrowserSession {
            child,
            stdin,
            lines,
            click_timeout_ms: options.click_timeout_ms,
            op_timeout: Duration::from_millis(options.op_timeout_ms),
            next_id: 0,
            closed: false,
        })
    }

    /// Typing gets its per-key delays on top of the base deadline.
    fn deadline_for(&self, request: &BrowserRequest) -> Duration {
        match request {
            BrowserRequest::Type { text, delay_ms, .. } => {
                self.op_timeout + Duration::from_millis(delay_ms * text.chars().count() as u64)
            }
            _ => self.op_timeout,
        }
    }

    /// Send a request and read its response, waiting at most the operation
    /// deadline. Responses to earlier, timed-out requests are skipped.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, FillError> {
        self.next_id += 1;
        let id = self.next_id;
        let json = serde_json::to_string(&Envelope { id, request }).map_err(|e| FillError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .map_err(|e| FillError::SessionIO(format!("Failed to write to bridge stdin: {}", e)))?;

        self.stdin
            .flush()
            .map_err(|e| FillError::SessionIO(format!("Failed to flush bridge stdin: {}", e)))?;

        let deadline = Instant::now() + self.deadline_for(request);
        loop {
            let line = recv_line(&self.lines, deadline, request.command())?;
            let response: BrowserResponse =
                serde_json::from_str(line.trim()).map_err(|e| FillError::JsonParse {
                    context: "bridge response".into(),
                    source: e,
                })?;
            match response.id {
                Some(got) if got != id => {
                    debug!(expected = id, got, "discarding late bridge response");
                }
                _ => return Ok(response),
            }
        }
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest, command_name: &str) -> Result<BrowserResponse, FillError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(FillError::SessionProtocol {
                command: command_name.into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), FillError> {
        self.send_ok(&BrowserRequest::navigate(url), "navigate")?;
        Ok(())
    }

    /// Quit the browser session. Safe to call twice.
    pub fn quit(&mut self) -> Result<(), FillError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The process may already be gone or be stuck
        if let Err(e) = self.send(&BrowserRequest::quit()) {
            warn!(error = %e, "bridge did not acknowledge quit, killing it");
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        Ok(())
    }
}

impl BrowserSurface for BrowserSession {
    fn snapshot(&mut self) -> Result<AxSnapshot, FillError> {
        let response = self.send_ok(&BrowserRequest::snapshot(), "snapshot")?;
        AxSnapshot::from_value(response.data.unwrap_or(Value::Null)).map_err(|e| FillError::JsonParse {
            context: "accessibility snapshot".into(),
            source: e,
        })
    }

    fn press_key(&mut self, key: Key) -> Result<(), FillError> {
        self.send_ok(&BrowserRequest::press(key), "press")?;
        Ok(())
    }

    fn type_text(&mut self, text: &str, delay_ms: u64) -> Result<(), FillError> {
        self.send_ok(&BrowserRequest::type_text(text, delay_ms), "type")?;
        Ok(())
    }

    fn click_option(&mut self, name: &str) -> Result<(), FillError> {
        let request = BrowserRequest::click_option(name, self.click_timeout_ms);
        self.send_ok(&request, "click_option")?;
        Ok(())
    }

    fn read_page_text(&mut self) -> Result<String, FillError> {
        let response = self.send_ok(&BrowserRequest::page_text(), "page_text")?;
        Ok(response.text.unwrap_or_default())
    }

    fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, FillError> {
        let response = self.send_ok(&BrowserRequest::screenshot(full_page), "screenshot")?;
        let encoded = response
            .data
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| FillError::SessionProtocol {
                command: "screenshot".into(),
                error: "No image data in screenshot response".into(),
            })?;
        STANDARD.decode(encoded).map_err(|e| FillError::SessionProtocol {
            command: "screenshot".into(),
            error: format!("Invalid base64 image data: {}", e),
        })
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
