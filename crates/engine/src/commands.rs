//! Command registry and the built-in engine commands.
//!
//! Commands are registered by name and invoked with JSON input/output.

use crate::availability::{resolve, Availability, AvailabilityContext};
use crate::catalog::Platform;
use crate::context::AppContext;
use crate::dialog::ReferralDialogAction;
use crate::menu::{build_menu, MenuError};
use crate::presentation::describe;
use crate::selection::SelectionRejected;
use crate::traits::CapError;
use crate::types::*;
use crate::user::{StoreError, User};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;

/// Signature for all engine commands.
pub type CommandHandler = fn(Value, &AppContext) -> Result<Value, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Rejected(#[from] SelectionRejected),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CommandError::InvalidInput(_) => ErrorCode::InvalidInput,
            CommandError::Rejected(_) => ErrorCode::Rejected,
            CommandError::NotFound(_) => ErrorCode::NotFound,
            CommandError::Unsupported(_) => ErrorCode::Unsupported,
            CommandError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            CommandError::Io(_) => ErrorCode::IoError,
            CommandError::Other(_) => ErrorCode::InternalError,
        }
    }
}

impl From<CapError> for CommandError {
    fn from(e: CapError) -> Self {
        match e {
            CapError::Unsupported(m) => CommandError::Unsupported(m),
            CapError::DependencyMissing(m) => CommandError::Unsupported(m),
            CapError::PermissionDenied(m) => CommandError::PermissionDenied(m),
            CapError::Io(io) => CommandError::Io(io),
            CapError::Other(m) => CommandError::Other(m),
        }
    }
}

impl From<MenuError> for CommandError {
    fn from(e: MenuError) -> Self {
        match e {
            MenuError::UnknownEntry(id) => CommandError::NotFound(format!("menu entry '{}'", id)),
            e @ MenuError::NotActionable(_) => CommandError::InvalidInput(e.to_string()),
            MenuError::Host(cap) => cap.into(),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => CommandError::NotFound(format!("user {}", id)),
            e @ StoreError::Duplicate(_) => CommandError::InvalidInput(e.to_string()),
            StoreError::Cap(cap) => cap.into(),
            e @ StoreError::Corrupt(_) => CommandError::Other(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            handlers: HashMap::new(),
        };
        reg.register("ping", cmd_ping);
        reg.register("list_engines", cmd_list_engines);
        reg.register("resolve_engines", cmd_resolve_engines);
        reg.register("select_engine", cmd_select_engine);
        reg.register("current_engine", cmd_current_engine);
        reg.register("set_context", cmd_set_context);
        reg.register("describe_engine", cmd_describe_engine);
        reg.register("menu_template", cmd_menu_template);
        reg.register("menu_click", cmd_menu_click);
        reg.register("referral_dialog", cmd_referral_dialog);
        reg.register("create_user", cmd_create_user);
        reg.register("get_user", cmd_get_user);
        reg.register("list_users", cmd_list_users);
        reg
    }

    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Execute a command by name and return a full CommandResult.
    pub fn execute(&self, name: &str, args: Value, ctx: &AppContext) -> CommandResult {
        let run_id = new_run_id();
        let start = Instant::now();
        let elapsed = || start.elapsed().as_millis() as u64;

        let Some(handler) = self.handlers.get(name) else {
            return result_err(
                "call",
                name,
                &run_id,
                elapsed(),
                ErrorCode::InvalidInput,
                format!("unknown command: {}", name),
            );
        };

        match handler(args, ctx) {
            Ok(data) => {
                let mut r = result_ok("call", name, &run_id, elapsed());
                r.data = Some(data);
                r
            }
            Err(CommandError::Unsupported(reason)) => {
                result_skip("call", name, &run_id, elapsed(), reason)
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "command failed");
                result_err("call", name, &run_id, elapsed(), e.error_code(), e.to_string())
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, CommandError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| CommandError::InvalidInput(format!("missing '{}' string field", key)))
}

fn opt_bool(args: &Value, key: &str) -> Result<Option<bool>, CommandError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(CommandError::InvalidInput(format!(
            "'{}' must be a boolean",
            key
        ))),
    }
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, CommandError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(CommandError::InvalidInput(format!(
            "'{}' must be a string",
            key
        ))),
    }
}

/// Apply `platform` / `multisite` / `widevine` overrides from `args` to `base`.
fn context_from_args(
    args: &Value,
    base: AvailabilityContext,
) -> Result<AvailabilityContext, CommandError> {
    let mut ctx = base;
    if let Some(p) = opt_str(args, "platform")? {
        ctx.platform = Platform::from_id(p);
    }
    if let Some(m) = opt_bool(args, "multisite")? {
        ctx.multisite = m;
    }
    if let Some(w) = opt_bool(args, "widevine")? {
        ctx.widevine = w;
    }
    Ok(ctx)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CommandError> {
    serde_json::to_value(value).map_err(|e| CommandError::Other(e.to_string()))
}

// ===========================================================================
// Built-in commands
// ===========================================================================

/// `ping` – returns { "pong": true }. Proves wiring works.
fn cmd_ping(_args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    Ok(json!({ "pong": true }))
}

/// `list_engines` – the catalog in display order.
fn cmd_list_engines(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let selection = ctx.selection();
    to_json(&selection.catalog().list())
}

/// `resolve_engines` – availability rows for the engine picker.
///
/// Args (all optional): `{ "platform": "linux", "multisite": true, "widevine": false }`.
/// Without args the live context is used.
fn cmd_resolve_engines(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let selection = ctx.selection();
    let catalog = *selection.catalog();
    let resolve_ctx = context_from_args(&args, *selection.context())?;
    let owned;
    let availability: &Availability = if resolve_ctx == *selection.context() {
        selection.availability()
    } else {
        owned = resolve(&catalog, &resolve_ctx);
        &owned
    };
    let current = selection.current().map(|k| k.engine_id.clone());

    let rows: Vec<Value> = availability
        .in_display_order(&catalog)
        .map(|(d, r)| {
            json!({
                "id": d.id,
                "display_name": d.display_name,
                "icon_ref": d.icon_ref,
                "experimental": d.experimental,
                "variants": d.variants,
                "visible": r.visible,
                "selectable": r.selectable,
                "disabled_reason": r.disabled_reason,
                "offered_variants": r.offered_variants,
                "show_variant_toggle": r.show_variant_toggle,
                "selected": current.as_deref() == Some(d.id),
            })
        })
        .collect();
    Ok(json!({ "context": resolve_ctx, "engines": rows }))
}

/// `select_engine` – Args: `{ "engine": "chrome/tabs" }`.
fn cmd_select_engine(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let candidate = str_arg(&args, "engine")?;
    let outcome = ctx.select(candidate)?;
    let current = ctx.selection().current().cloned();
    Ok(json!({
        "selection": current,
        "outcome": outcome,
    }))
}

/// `current_engine` – `{ "selection": "opera/tabs" }` or `null` when unselected.
fn cmd_current_engine(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let selection = ctx.selection();
    Ok(json!({ "selection": selection.current() }))
}

/// `set_context` – change the live availability flags.
fn cmd_set_context(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let mut selection = ctx.selection();
    let next = context_from_args(&args, *selection.context())?;
    selection.set_context(next);
    to_json(selection.context())
}

/// `describe_engine` – Args: `{ "engine": "firefox" }`.
fn cmd_describe_engine(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let id = str_arg(&args, "engine")?;
    let selection = ctx.selection();
    let descriptor = selection
        .catalog()
        .get(id)
        .ok_or_else(|| CommandError::NotFound(format!("engine '{}'", id)))?;
    to_json(&describe(descriptor))
}

/// `menu_template` – the rendered application menu.
///
/// Optional args `{ "platform", "webview", "development" }` preview another
/// environment without touching the live dispatcher.
fn cmd_menu_template(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let menu = ctx.menu();
    let mut env = menu.env().clone();
    if let Some(p) = opt_str(&args, "platform")? {
        env.platform = Platform::from_id(p);
    }
    if let Some(w) = opt_bool(&args, "webview")? {
        env.webview = w;
    }
    if let Some(d) = opt_bool(&args, "development")? {
        env.development = d;
    }
    if env == *menu.env() {
        to_json(&menu.entries())
    } else {
        to_json(&build_menu(&env))
    }
}

/// `menu_click` – Args: `{ "id": "view.zoom-in" }`.
fn cmd_menu_click(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let id = str_arg(&args, "id")?;
    let mut menu = ctx.menu();
    let outcome = menu.dispatch(id)?;
    let mut out = to_json(&outcome)?;
    out["zoom"] = json!(menu.zoom());
    Ok(out)
}

/// `referral_dialog` – Args: `{ "type": "DIALOG_REFERRAL_OPEN" }`, or nothing
/// to read the current state.
fn cmd_referral_dialog(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let mut state = ctx.referral();
    if args.get("type").is_some() {
        let action: ReferralDialogAction = serde_json::from_value(args)
            .map_err(|e| CommandError::InvalidInput(format!("bad action: {}", e)))?;
        *state = state.reduce(action);
    }
    to_json(&*state)
}

/// `create_user` – Args: any subset of the user fields.
fn cmd_create_user(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let args = if args.is_null() { json!({}) } else { args };
    let user: User = serde_json::from_value(args)
        .map_err(|e| CommandError::InvalidInput(format!("bad user: {}", e)))?;
    to_json(&ctx.users().insert(user)?)
}

/// `get_user` – Args: `{ "id": "<uuid>" }`.
fn cmd_get_user(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let raw = str_arg(&args, "id")?;
    let id = uuid::Uuid::parse_str(raw)
        .map_err(|e| CommandError::InvalidInput(format!("bad user id: {}", e)))?;
    match ctx.users().get(id)? {
        Some(user) => to_json(&user),
        None => Err(CommandError::NotFound(format!("user {}", id))),
    }
}

fn cmd_list_users(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    to_json(&ctx.users().list()?)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::platform::{HeadlessMenuHost, StdFilesystem};
    use std::sync::Arc;

    fn ctx_on(platform: Platform) -> AppContext {
        let dir = std::env::temp_dir().join(format!("webwrap_cmd_{}", uuid::Uuid::new_v4()));
        let options = ContextOptions {
            availability: AvailabilityContext::new(platform),
            ..ContextOptions::new(dir)
        };
        AppContext::new(Arc::new(StdFilesystem), Box::new(HeadlessMenuHost), options)
    }

    fn engine_row<'a>(data: &'a Value, id: &str) -> &'a Value {
        data["engines"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["id"] == id)
            .unwrap()
    }

    #[test]
    fn test_ping_command() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let result = reg.execute("ping", json!({}), &ctx);
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.data.unwrap()["pong"], true);
    }

    #[test]
    fn test_unknown_command() {
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let result = reg.execute("nonexistent", json!({}), &ctx);
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_list_commands() {
        let registry = CommandRegistry::new();
        let names = registry.list();
        for expected in ["ping", "list_engines", "resolve_engines", "select_engine", "menu_click"] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_resolve_with_overrides() {
        let ctx = ctx_on(Platform::Darwin);
        let reg = CommandRegistry::new();
        let r = reg.execute("resolve_engines", json!({ "platform": "linux" }), &ctx);
        let data = r.data.unwrap();
        assert_eq!(data["context"]["platform"], "linux");
        assert_eq!(engine_row(&data, "webkit")["visible"], false);
        assert_eq!(engine_row(&data, "brave")["selectable"], true);

        let r = reg.execute("resolve_engines", json!({ "widevine": true }), &ctx);
        let data = r.data.unwrap();
        let electron = engine_row(&data, "electron");
        assert_eq!(electron["selectable"], false);
        assert_eq!(
            electron["disabled_reason"],
            "This app is incompatible with WebCatalog Engine."
        );
        // Live context untouched.
        assert!(!ctx.selection().context().widevine);
    }

    #[test]
    fn test_mistyped_overrides_are_invalid_input() {
        let ctx = ctx_on(Platform::Darwin);
        let reg = CommandRegistry::new();
        for (cmd, args) in [
            ("resolve_engines", json!({ "platform": 5 })),
            ("set_context", json!({ "platform": ["linux"] })),
            ("menu_template", json!({ "platform": true })),
            ("resolve_engines", json!({ "multisite": "yes" })),
        ] {
            let r = reg.execute(cmd, args, &ctx);
            assert_eq!(r.status, Status::Error, "{}", cmd);
            assert_eq!(r.error.map(|e| e.code), Some(ErrorCode::InvalidInput), "{}", cmd);
        }
        assert_eq!(ctx.selection().context().platform, Platform::Darwin);

        // Null still means "leave as is".
        let r = reg.execute("resolve_engines", json!({ "platform": null }), &ctx);
        assert_eq!(r.data.unwrap()["context"]["platform"], "darwin");
    }

    #[test]
    fn test_select_flow() {
        let ctx = ctx_on(Platform::Darwin);
        let reg = CommandRegistry::new();

        let r = reg.execute("select_engine", json!({ "engine": "opera" }), &ctx);
        assert_eq!(r.status, Status::Pass);
        let data = r.data.unwrap();
        assert_eq!(data["selection"], "opera/tabs");
        assert_eq!(data["outcome"], "changed");

        let r = reg.execute("select_engine", json!({ "engine": "bogus" }), &ctx);
        assert_eq!(r.status, Status::Error);
        assert_eq!(r.error.unwrap().code, ErrorCode::Rejected);

        let r = reg.execute("current_engine", json!({}), &ctx);
        assert_eq!(r.data.unwrap()["selection"], "opera/tabs");

        let r = reg.execute("resolve_engines", json!({}), &ctx);
        assert_eq!(engine_row(&r.data.unwrap(), "opera")["selected"], true);
    }

    #[test]
    fn test_set_context_then_select() {
        let ctx = ctx_on(Platform::Darwin);
        let reg = CommandRegistry::new();
        let r = reg.execute("set_context", json!({ "multisite": true }), &ctx);
        assert_eq!(r.data.unwrap()["multisite"], true);

        let r = reg.execute("select_engine", json!({ "engine": "chrome/tabs" }), &ctx);
        assert_eq!(r.error.unwrap().code, ErrorCode::Rejected);
        let r = reg.execute("select_engine", json!({ "engine": "chrome" }), &ctx);
        assert_eq!(r.status, Status::Pass);

        let r = reg.execute("set_context", json!({ "multisite": "yes" }), &ctx);
        assert_eq!(r.error.unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_describe_engine() {
        let ctx = ctx_on(Platform::Darwin);
        let reg = CommandRegistry::new();
        let r = reg.execute("describe_engine", json!({ "engine": "opera" }), &ctx);
        let data = r.data.unwrap();
        assert!(data.get("standard").is_none());
        assert!(data["tabbed"].as_str().unwrap().contains("Opera"));

        let r = reg.execute("describe_engine", json!({ "engine": "netscape" }), &ctx);
        assert_eq!(r.error.unwrap().code, ErrorCode::NotFound);
    }

    #[test]
    fn test_menu_commands() {
        let ctx = ctx_on(Platform::Linux);
        let reg = CommandRegistry::new();

        let r = reg.execute("menu_template", json!({}), &ctx);
        let menu = r.data.unwrap();
        assert_eq!(menu[0]["label"], "Navigate");

        let r = reg.execute("menu_template", json!({ "webview": false }), &ctx);
        assert_eq!(r.data.unwrap()[0]["label"], "Edit");

        // Headless host has no window to message or toggle.
        for id in ["view.zoom-in", "navigate.back", "edit.find", "view.full-screen"] {
            let r = reg.execute("menu_click", json!({ "id": id }), &ctx);
            assert_eq!(r.status, Status::Skip, "{}", id);
            assert_eq!(r.error.unwrap().code, ErrorCode::Unsupported);
        }
        assert_eq!(ctx.menu().zoom(), 1.0);

        let r = reg.execute("menu_click", json!({ "id": "edit.copy" }), &ctx);
        assert_eq!(r.data.unwrap()["outcome"], "native_role");

        let r = reg.execute("menu_click", json!({ "id": "nope" }), &ctx);
        assert_eq!(r.error.unwrap().code, ErrorCode::NotFound);
    }

    #[test]
    fn test_referral_dialog_command() {
        let ctx = ctx_on(Platform::Linux);
        let reg = CommandRegistry::new();
        let r = reg.execute("referral_dialog", json!({ "type": "DIALOG_REFERRAL_OPEN" }), &ctx);
        assert_eq!(r.data.unwrap()["open"], true);
        let r = reg.execute("referral_dialog", json!({}), &ctx);
        assert_eq!(r.data.unwrap()["open"], true);
        let r = reg.execute("referral_dialog", json!({ "type": "DIALOG_REFERRAL_CLOSE" }), &ctx);
        assert_eq!(r.data.unwrap()["open"], false);
        let r = reg.execute("referral_dialog", json!({ "type": "SHRUG" }), &ctx);
        assert_eq!(r.error.unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_user_commands() {
        let ctx = ctx_on(Platform::Linux);
        let reg = CommandRegistry::new();

        let r = reg.execute(
            "create_user",
            json!({ "email": "a@example.com", "displayName": "Ada" }),
            &ctx,
        );
        assert_eq!(r.status, Status::Pass);
        let id = r.data.unwrap()["id"].as_str().unwrap().to_string();

        let r = reg.execute("get_user", json!({ "id": id }), &ctx);
        assert_eq!(r.data.unwrap()["displayName"], "Ada");

        let r = reg.execute("list_users", json!({}), &ctx);
        assert_eq!(r.data.unwrap().as_array().unwrap().len(), 1);

        let r = reg.execute("get_user", json!({ "id": uuid::Uuid::new_v4().to_string() }), &ctx);
        assert_eq!(r.error.unwrap().code, ErrorCode::NotFound);
        let r = reg.execute("get_user", json!({ "id": "not-a-uuid" }), &ctx);
        assert_eq!(r.error.unwrap().code, ErrorCode::InvalidInput);
    }
}
