use crate::catalog::Platform;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Command result envelope – the stable output contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub run_id: String,
    pub command: String,
    pub target: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub timing_ms: TimingInfo,
    pub env_summary: EnvSummary,
    /// Command-specific payload returned on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Skip,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    /// Refused by the engine rules (e.g. a non-selectable engine).
    Rejected,
    NotFound,
    Unsupported,
    DependencyMissing,
    PermissionDenied,
    IoError,
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        f.write_str(&s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimingInfo {
    pub total: u64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub steps: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvSummary {
    /// Host platform id (`darwin`, `win32`, `linux`, `unknown`).
    pub platform: String,
    pub arch: String,
    pub headless: bool,
}

impl Default for EnvSummary {
    fn default() -> Self {
        Self {
            platform: Platform::current().as_str().to_string(),
            arch: std::env::consts::ARCH.to_string(),
            headless: detect_headless(),
        }
    }
}

// ---------------------------------------------------------------------------
// Doctor report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub os_name: String,
    pub os_version: String,
    pub kernel: String,
    pub arch: String,
    /// Host platform id as the engine catalog sees it.
    pub platform: String,
    pub headless: bool,
    pub session_type: Option<String>,
    pub display_server: Option<String>,
    /// Engine ids visible on this host, in display order.
    pub visible_engines: Vec<String>,
    /// Selectable engine keys per app flavour (`plain`, `multisite`,
    /// `widevine`).
    pub selectable: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub call: String,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default = "default_expect_status")]
    pub expect_status: Status,
    /// Error code the step must fail with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_code: Option<ErrorCode>,
}

fn default_expect_status() -> Status {
    Status::Pass
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: Option<String>,
    pub overall_status: Status,
    pub step_results: Vec<CommandResult>,
}

// ---------------------------------------------------------------------------
// Serve / daemon protocol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn detect_headless() -> bool {
    match std::env::consts::OS {
        "linux" => std::env::var("DISPLAY").is_err() && std::env::var("WAYLAND_DISPLAY").is_err(),
        "macos" => std::env::var("SSH_TTY").is_ok() && std::env::var("DISPLAY").is_err(),
        _ => false,
    }
}

/// Generate a new run ID (UUIDv4).
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn envelope(
    command: &str,
    target: &str,
    run_id: &str,
    total_ms: u64,
    status: Status,
    error: Option<ErrorInfo>,
) -> CommandResult {
    CommandResult {
        run_id: run_id.to_string(),
        command: command.to_string(),
        target: target.to_string(),
        status,
        error,
        timing_ms: TimingInfo {
            total: total_ms,
            steps: HashMap::new(),
        },
        env_summary: EnvSummary::default(),
        data: None,
    }
}

/// Build a successful CommandResult shell (caller fills in data).
pub fn result_ok(command: &str, target: &str, run_id: &str, total_ms: u64) -> CommandResult {
    envelope(command, target, run_id, total_ms, Status::Pass, None)
}

/// Build an error CommandResult.
pub fn result_err(
    command: &str,
    target: &str,
    run_id: &str,
    total_ms: u64,
    code: ErrorCode,
    message: impl Into<String>,
) -> CommandResult {
    let error = ErrorInfo {
        code,
        message: message.into(),
        details: serde_json::Value::Null,
    };
    envelope(command, target, run_id, total_ms, Status::Error, Some(error))
}

/// Build a skip CommandResult for capabilities the host does not have.
pub fn result_skip(
    command: &str,
    target: &str,
    run_id: &str,
    total_ms: u64,
    reason: impl Into<String>,
) -> CommandResult {
    let error = ErrorInfo {
        code: ErrorCode::Unsupported,
        message: reason.into(),
        details: serde_json::Value::Null,
    };
    envelope(command, target, run_id, total_ms, Status::Skip, Some(error))
}
