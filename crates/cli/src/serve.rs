//! Daemon mode – line-delimited JSON over a Unix socket.
//!
//! One request per line, one response per line. Methods: `call`, `doctor`.
//! Every connected client is also pushed a
//! `{"event":"selection_changed","key":…}` line whenever the engine
//! selection changes, whichever client (or local caller) changed it.

use engine::types::*;
use engine::{AppContext, CommandRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;

/// Pending events per client before the slowest one starts missing them.
const EVENT_BACKLOG: usize = 64;

pub struct Daemon {
    ctx: Arc<AppContext>,
    registry: Arc<CommandRegistry>,
    events: broadcast::Sender<String>,
}

impl Daemon {
    /// Takes over the context's selection observer.
    pub fn new(ctx: AppContext, registry: CommandRegistry) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_BACKLOG);
        let tx = events.clone();
        ctx.on_selection_changed(move |key| {
            let line = serde_json::json!({ "event": "selection_changed", "key": key });
            // Err only means no client is connected.
            let _ = tx.send(line.to_string());
        });
        Arc::new(Self {
            ctx: Arc::new(ctx),
            registry: Arc::new(registry),
            events,
        })
    }

    pub async fn accept_loop(self: Arc<Self>, listener: UnixListener) {
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    tokio::spawn(self.clone().serve_connection(stream));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }

    async fn serve_connection(self: Arc<Self>, stream: UnixStream) {
        let mut events = self.events.subscribe();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        loop {
            let mut out = tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let response = self.clone().respond(line).await;
                        serde_json::to_string(&response).unwrap_or_else(|_| "{}".into())
                    }
                    Ok(None) | Err(_) => break,
                },
                event = events.recv() => match event {
                    Ok(line) => line,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "client fell behind on selection events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };
            out.push('\n');
            if writer.write_all(out.as_bytes()).await.is_err() {
                break;
            }
        }
    }

    /// Commands may block on a terminal confirmation, so they run off the
    /// async workers.
    async fn respond(self: Arc<Self>, line: String) -> DaemonResponse {
        let fallback_id = request_id(&line);
        let joined = tokio::task::spawn_blocking(move || {
            handle_request(&line, &self.ctx, &self.registry)
        })
        .await;
        match joined {
            Ok(response) => response,
            Err(e) => protocol_error(
                fallback_id,
                ErrorCode::InternalError,
                format!("request handler failed: {}", e),
            ),
        }
    }
}

/// Binds the socket, replacing a stale one left by an earlier run.
pub fn bind(socket_path: &Path) -> std::io::Result<UnixListener> {
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }
    UnixListener::bind(socket_path)
}

pub async fn run_daemon(socket_path: PathBuf, ctx: AppContext, registry: CommandRegistry) {
    let listener = match bind(&socket_path) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(socket = %socket_path.display(), error = %e, "cannot bind socket");
            eprintln!("error: cannot bind socket {}: {}", socket_path.display(), e);
            std::process::exit(2);
        }
    };

    tracing::info!(socket = %socket_path.display(), "webwrapctl daemon listening");
    Daemon::new(ctx, registry).accept_loop(listener).await;
}

fn request_id(line: &str) -> String {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(String::from))
        .unwrap_or_else(|| "unknown".into())
}

fn protocol_error(id: String, code: ErrorCode, message: String) -> DaemonResponse {
    DaemonResponse {
        id,
        result: None,
        error: Some(ErrorInfo {
            code,
            message,
            details: serde_json::Value::Null,
        }),
    }
}

fn handle_request(line: &str, ctx: &AppContext, registry: &CommandRegistry) -> DaemonResponse {
    let req: DaemonRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return protocol_error(
                "unknown".into(),
                ErrorCode::InvalidInput,
                format!("invalid JSON request: {}", e),
            );
        }
    };

    let result = match req.method.as_str() {
        "call" => {
            let cmd_name = req.params.get("cmd").and_then(|v| v.as_str()).unwrap_or("");
            let args = req
                .params
                .get("args")
                .cloned()
                .unwrap_or(serde_json::Value::Object(Default::default()));
            registry.execute(cmd_name, args, ctx)
        }
        "doctor" => engine::doctor::run_doctor(),
        other => {
            return protocol_error(
                req.id,
                ErrorCode::InvalidInput,
                format!("unknown method: {}", other),
            );
        }
    };

    DaemonResponse {
        id: req.id,
        result: Some(result),
        error: None,
    }
}
