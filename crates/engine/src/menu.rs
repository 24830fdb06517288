//! Application menu – a static schema filtered per platform and mode, plus a
//! dispatcher that turns a clicked entry id into host calls.
//!
//! Two modes exist. *Webview* apps host a site and get navigation, zoom and
//! storage tools; the *container* (the launcher itself) gets a minimal menu.

use crate::catalog::Platform;
use crate::traits::{CapError, MenuHost};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Native roles implemented by the host's menu system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    Minimize,
    Close,
    About,
    Services,
    Hide,
    HideOthers,
    Unhide,
    Front,
    Window,
    Tools,
    Help,
}

/// Commands the engine handles itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuCommand {
    GoHome,
    GoBack,
    GoForward,
    Reload,
    CopyUrl,
    FindInPage,
    ToggleFullScreen,
    ZoomIn,
    ZoomOut,
    ToggleDevTools,
    ReloadContainer,
    ToggleContainerDevTools,
    OpenSettings,
    ClearBrowsingData,
    OpenWebsite,
    ReportIssue,
    OpenSupport,
    Quit,
}

/// Message forwarded to the focused app window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "channel", content = "value", rename_all = "kebab-case")]
pub enum WindowMessage {
    GoHome,
    GoBack,
    GoForward,
    Reload,
    CopyUrl,
    ToggleFindInPageDialog,
    ToggleDevTools,
    ToggleSettingDialog,
    ChangeZoom(f64),
}

impl WindowMessage {
    pub fn channel(&self) -> &'static str {
        match self {
            WindowMessage::GoHome => "go-home",
            WindowMessage::GoBack => "go-back",
            WindowMessage::GoForward => "go-forward",
            WindowMessage::Reload => "reload",
            WindowMessage::CopyUrl => "copy-url",
            WindowMessage::ToggleFindInPageDialog => "toggle-find-in-page-dialog",
            WindowMessage::ToggleDevTools => "toggle-dev-tools",
            WindowMessage::ToggleSettingDialog => "toggle-setting-dialog",
            WindowMessage::ChangeZoom(_) => "change-zoom",
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerator {
    Any(&'static str),
    PerPlatform {
        darwin: &'static str,
        other: &'static str,
    },
}

impl Accelerator {
    pub fn for_platform(&self, platform: Platform) -> &'static str {
        match *self {
            Accelerator::Any(a) => a,
            Accelerator::PerPlatform { darwin, .. } if platform == Platform::Darwin => darwin,
            Accelerator::PerPlatform { other, .. } => other,
        }
    }
}

/// Filter on the menu environment. `None` fields match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub webview: Option<bool>,
    pub development: Option<bool>,
    pub darwin: Option<bool>,
}

impl Condition {
    pub const ALWAYS: Self = Self {
        webview: None,
        development: None,
        darwin: None,
    };
    pub const WEBVIEW: Self = Self {
        webview: Some(true),
        ..Self::ALWAYS
    };
    pub const CONTAINER: Self = Self {
        webview: Some(false),
        ..Self::ALWAYS
    };
    pub const DARWIN: Self = Self {
        darwin: Some(true),
        ..Self::ALWAYS
    };
    pub const WEBVIEW_DARWIN: Self = Self {
        webview: Some(true),
        darwin: Some(true),
        ..Self::ALWAYS
    };
    pub const CONTAINER_DARWIN: Self = Self {
        webview: Some(false),
        darwin: Some(true),
        ..Self::ALWAYS
    };
    pub const WEBVIEW_DEVELOPMENT: Self = Self {
        webview: Some(true),
        development: Some(true),
        ..Self::ALWAYS
    };

    pub fn matches(&self, env: &MenuEnv) -> bool {
        fn ok(want: Option<bool>, have: bool) -> bool {
            want.map_or(true, |w| w == have)
        }
        ok(self.webview, env.webview)
            && ok(self.development, env.development)
            && ok(self.darwin, env.platform == Platform::Darwin)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MenuNode {
    pub id: &'static str,
    /// `{app}` is replaced with the app name.
    pub label: &'static str,
    pub accelerator: Option<Accelerator>,
    pub role: Option<Role>,
    pub command: Option<MenuCommand>,
    pub submenu: Option<&'static [MenuNode]>,
    pub separator: bool,
    pub when: Condition,
}

impl MenuNode {
    const fn item(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            accelerator: None,
            role: None,
            command: None,
            submenu: None,
            separator: false,
            when: Condition::ALWAYS,
        }
    }

    const fn separator(id: &'static str) -> Self {
        Self {
            separator: true,
            ..Self::item(id, "")
        }
    }

    const fn submenu(id: &'static str, label: &'static str, items: &'static [MenuNode]) -> Self {
        Self {
            submenu: Some(items),
            ..Self::item(id, label)
        }
    }

    const fn accel(self, a: &'static str) -> Self {
        Self {
            accelerator: Some(Accelerator::Any(a)),
            ..self
        }
    }

    const fn accel_per(self, darwin: &'static str, other: &'static str) -> Self {
        Self {
            accelerator: Some(Accelerator::PerPlatform { darwin, other }),
            ..self
        }
    }

    const fn role(self, role: Role) -> Self {
        Self {
            role: Some(role),
            ..self
        }
    }

    const fn command(self, command: MenuCommand) -> Self {
        Self {
            command: Some(command),
            ..self
        }
    }

    const fn when(self, when: Condition) -> Self {
        Self { when, ..self }
    }
}

const APP_MENU_ITEMS: &[MenuNode] = &[
    MenuNode::item("app.about", "About {app}").role(Role::About),
    MenuNode::submenu("app.services", "Services", &[]).role(Role::Services),
    MenuNode::separator("app.sep1"),
    MenuNode::item("app.hide", "Hide App").accel("Command+H").role(Role::Hide),
    MenuNode::item("app.hide-others", "Hide Others")
        .accel("Command+Shift+H")
        .role(Role::HideOthers),
    MenuNode::item("app.show-all", "Show All").role(Role::Unhide),
    MenuNode::separator("app.sep2"),
    MenuNode::item("app.quit", "Quit")
        .accel("Command+Q")
        .command(MenuCommand::Quit),
];

const NAVIGATE_ITEMS: &[MenuNode] = &[
    MenuNode::item("navigate.home", "Home")
        .accel("Alt+H")
        .command(MenuCommand::GoHome),
    MenuNode::item("navigate.back", "Back")
        .accel("CmdOrCtrl+[")
        .command(MenuCommand::GoBack),
    MenuNode::item("navigate.forward", "Forward")
        .accel("CmdOrCtrl+]")
        .command(MenuCommand::GoForward),
    MenuNode::item("navigate.reload", "Reload")
        .accel("CmdOrCtrl+R")
        .command(MenuCommand::Reload),
];

const EDIT_ITEMS: &[MenuNode] = &[
    MenuNode::item("edit.undo", "Undo").accel("CmdOrCtrl+Z").role(Role::Undo),
    MenuNode::item("edit.redo", "Redo")
        .accel("Shift+CmdOrCtrl+Z")
        .role(Role::Redo),
    MenuNode::separator("edit.sep1"),
    MenuNode::item("edit.cut", "Cut").accel("CmdOrCtrl+X").role(Role::Cut),
    MenuNode::item("edit.copy", "Copy").accel("CmdOrCtrl+C").role(Role::Copy),
    MenuNode::item("edit.copy-url", "Copy Current URL")
        .accel("CmdOrCtrl+L")
        .command(MenuCommand::CopyUrl)
        .when(Condition::WEBVIEW),
    MenuNode::item("edit.paste", "Paste")
        .accel("CmdOrCtrl+V")
        .role(Role::Paste),
    MenuNode::item("edit.select-all", "Select All")
        .accel("CmdOrCtrl+A")
        .role(Role::SelectAll),
    MenuNode::separator("edit.sep2").when(Condition::WEBVIEW),
    MenuNode::item("edit.find", "Find in page...")
        .accel("CmdOrCtrl+F")
        .command(MenuCommand::FindInPage)
        .when(Condition::WEBVIEW),
];

const VIEW_ITEMS: &[MenuNode] = &[
    MenuNode::item("view.back", "Back")
        .accel("CmdOrCtrl+[")
        .command(MenuCommand::GoBack)
        .when(Condition::WEBVIEW),
    MenuNode::item("view.forward", "Forward")
        .accel("CmdOrCtrl+]")
        .command(MenuCommand::GoForward)
        .when(Condition::WEBVIEW),
    MenuNode::item("view.reload", "Reload")
        .accel("CmdOrCtrl+R")
        .command(MenuCommand::Reload)
        .when(Condition::WEBVIEW),
    MenuNode::separator("view.sep1").when(Condition::WEBVIEW),
    MenuNode::item("view.full-screen", "Toggle Full Screen")
        .accel_per("Ctrl+Command+F", "F11")
        .command(MenuCommand::ToggleFullScreen),
    MenuNode::item("view.zoom-in", "Zoom In")
        .accel_per("Command+=", "Ctrl+=")
        .command(MenuCommand::ZoomIn)
        .when(Condition::WEBVIEW),
    MenuNode::item("view.zoom-out", "Zoom Out")
        .accel_per("Command+-", "Ctrl+-")
        .command(MenuCommand::ZoomOut)
        .when(Condition::WEBVIEW),
    MenuNode::item("view.dev-tools", "Toggle Developer Tools")
        .accel_per("Alt+Command+I", "Ctrl+Shift+I")
        .command(MenuCommand::ToggleDevTools)
        .when(Condition::WEBVIEW),
    MenuNode::item("view.dev-tools", "Toggle Developer Tools")
        .accel_per("Alt+Command+I", "Ctrl+Shift+I")
        .command(MenuCommand::ToggleContainerDevTools)
        .when(Condition::CONTAINER),
    MenuNode::separator("view.sep2").when(Condition::WEBVIEW_DEVELOPMENT),
    MenuNode::item("view.reload-container", "Reload (Container)")
        .command(MenuCommand::ReloadContainer)
        .when(Condition::WEBVIEW_DEVELOPMENT),
    MenuNode::item("view.container-dev-tools", "Toggle Developer Tools (Container)")
        .command(MenuCommand::ToggleContainerDevTools)
        .when(Condition::WEBVIEW_DEVELOPMENT),
];

const WINDOW_ITEMS: &[MenuNode] = &[
    MenuNode::item("window.minimize", "Minimize")
        .accel("CmdOrCtrl+M")
        .role(Role::Minimize),
    MenuNode::item("window.close", "Close")
        .accel("CmdOrCtrl+W")
        .role(Role::Close),
    MenuNode::separator("window.sep1").when(Condition::DARWIN),
    MenuNode::item("window.front", "Bring All to Front")
        .role(Role::Front)
        .when(Condition::DARWIN),
];

const TOOLS_ITEMS: &[MenuNode] = &[
    MenuNode::item("tools.settings", "Settings...")
        .accel_per("Cmd+,", "Ctrl+P")
        .command(MenuCommand::OpenSettings),
    MenuNode::separator("tools.sep1"),
    MenuNode::item("tools.clear-browsing-data", "Clear browsing data...")
        .command(MenuCommand::ClearBrowsingData),
];

const HELP_ITEMS: &[MenuNode] = &[
    MenuNode::item("help.website", "Website").command(MenuCommand::OpenWebsite),
    MenuNode::item("help.report-issue", "Report an Issue")
        .command(MenuCommand::ReportIssue)
        .when(Condition::WEBVIEW),
    MenuNode::item("help.support", "Support")
        .command(MenuCommand::OpenSupport)
        .when(Condition::CONTAINER),
];

/// The whole menu, top level in display order.
pub static MENU_SCHEMA: &[MenuNode] = &[
    MenuNode::submenu("app", "{app}", APP_MENU_ITEMS).when(Condition::WEBVIEW_DARWIN),
    MenuNode::submenu("app", "WebCatalog", APP_MENU_ITEMS).when(Condition::CONTAINER_DARWIN),
    MenuNode::submenu("navigate", "Navigate", NAVIGATE_ITEMS).when(Condition::WEBVIEW),
    MenuNode::submenu("edit", "Edit", EDIT_ITEMS),
    MenuNode::submenu("view", "View", VIEW_ITEMS),
    MenuNode::submenu("window", "Window", WINDOW_ITEMS).role(Role::Window),
    MenuNode::submenu("tools", "Tools", TOOLS_ITEMS)
        .role(Role::Tools)
        .when(Condition::WEBVIEW),
    MenuNode::submenu("help", "Help", HELP_ITEMS).role(Role::Help),
];

// ---------------------------------------------------------------------------
// Environment and rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLinks {
    pub website: String,
    pub issues: String,
    pub support: String,
}

impl Default for MenuLinks {
    fn default() -> Self {
        Self {
            website: "https://getwebcatalog.com".into(),
            issues: "https://github.com/webCatalog/desktop/issues".into(),
            support: "https://getwebcatalog.com/support".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEnv {
    pub platform: Platform,
    /// `true` for a hosted site, `false` for the container.
    pub webview: bool,
    pub development: bool,
    pub app_name: String,
    pub app_id: String,
    pub links: MenuLinks,
}

impl MenuEnv {
    pub fn new(app_name: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            platform: Platform::current(),
            webview: true,
            development: false,
            app_name: app_name.into(),
            app_id: app_id.into(),
            links: MenuLinks::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Normal,
    Separator,
    Submenu,
}

/// One rendered menu entry, ready for the host's native menu builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerator: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<MenuCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submenu: Option<Vec<MenuEntry>>,
}

/// Filter [`MENU_SCHEMA`] for `env` and render labels and accelerators.
pub fn build_menu(env: &MenuEnv) -> Vec<MenuEntry> {
    render(MENU_SCHEMA, env)
}

fn render(nodes: &'static [MenuNode], env: &MenuEnv) -> Vec<MenuEntry> {
    nodes
        .iter()
        .filter(|n| n.when.matches(env))
        .map(|n| {
            let kind = if n.separator {
                EntryKind::Separator
            } else if n.submenu.is_some() {
                EntryKind::Submenu
            } else {
                EntryKind::Normal
            };
            MenuEntry {
                id: n.id,
                kind,
                label: n.label.replace("{app}", &env.app_name),
                accelerator: n.accelerator.map(|a| a.for_platform(env.platform)),
                role: n.role,
                command: n.command,
                submenu: n.submenu.map(|items| render(items, env)),
            }
        })
        .collect()
}

/// Depth-first lookup by id.
pub fn find_entry<'a>(entries: &'a [MenuEntry], id: &str) -> Option<&'a MenuEntry> {
    for e in entries {
        if e.id == id {
            return Some(e);
        }
        if let Some(found) = e.submenu.as_deref().and_then(|s| find_entry(s, id)) {
            return Some(found);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub const ZOOM_STEP: f64 = 0.1;
const MIN_ZOOM: f64 = 0.1;

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("unknown menu entry '{0}'")]
    UnknownEntry(String),
    #[error("menu entry '{0}' has no action")]
    NotActionable(String),
    #[error("host: {0}")]
    Host(#[from] CapError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Handled { command: MenuCommand },
    /// The host's menu system performs the role itself.
    NativeRole { role: Role },
    /// The user declined a confirmation.
    Cancelled { command: MenuCommand },
}

pub struct MenuDispatcher {
    env: MenuEnv,
    entries: Vec<MenuEntry>,
    zoom: f64,
    host: Box<dyn MenuHost>,
}

impl MenuDispatcher {
    pub fn new(env: MenuEnv, host: Box<dyn MenuHost>) -> Self {
        let entries = build_menu(&env);
        Self {
            env,
            entries,
            zoom: 1.0,
            host,
        }
    }

    pub fn env(&self) -> &MenuEnv {
        &self.env
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Run the action behind a clicked entry.
    pub fn dispatch(&mut self, id: &str) -> Result<DispatchOutcome, MenuError> {
        let entry = find_entry(&self.entries, id)
            .ok_or_else(|| MenuError::UnknownEntry(id.to_string()))?;
        let (command, role, kind) = (entry.command, entry.role, entry.kind);

        match (command, role) {
            (Some(command), _) => {
                tracing::debug!(entry = id, ?command, "menu dispatch");
                self.run(command)
            }
            (None, Some(role)) if kind == EntryKind::Normal => {
                Ok(DispatchOutcome::NativeRole { role })
            }
            _ => Err(MenuError::NotActionable(id.to_string())),
        }
    }

    fn run(&mut self, command: MenuCommand) -> Result<DispatchOutcome, MenuError> {
        let host = self.host.as_ref();
        match command {
            MenuCommand::GoHome => host.send_to_window(&WindowMessage::GoHome)?,
            MenuCommand::GoBack => host.send_to_window(&WindowMessage::GoBack)?,
            MenuCommand::GoForward => host.send_to_window(&WindowMessage::GoForward)?,
            MenuCommand::Reload => host.send_to_window(&WindowMessage::Reload)?,
            MenuCommand::CopyUrl => host.send_to_window(&WindowMessage::CopyUrl)?,
            MenuCommand::FindInPage => {
                host.send_to_window(&WindowMessage::ToggleFindInPageDialog)?
            }
            MenuCommand::ToggleDevTools => host.send_to_window(&WindowMessage::ToggleDevTools)?,
            MenuCommand::OpenSettings => {
                host.send_to_window(&WindowMessage::ToggleSettingDialog)?
            }
            MenuCommand::ZoomIn | MenuCommand::ZoomOut => {
                let delta = if command == MenuCommand::ZoomIn {
                    ZOOM_STEP
                } else {
                    -ZOOM_STEP
                };
                let next = ((self.zoom + delta) * 100.0).round() / 100.0;
                let next = next.max(MIN_ZOOM);
                host.send_to_window(&WindowMessage::ChangeZoom(next))?;
                self.zoom = next;
            }
            MenuCommand::ToggleFullScreen => host.toggle_full_screen()?,
            MenuCommand::ReloadContainer => host.reload_container()?,
            MenuCommand::ToggleContainerDevTools => host.toggle_container_dev_tools()?,
            MenuCommand::OpenWebsite => host.open_external(&self.env.links.website)?,
            MenuCommand::ReportIssue => host.open_external(&self.env.links.issues)?,
            MenuCommand::OpenSupport => host.open_external(&self.env.links.support)?,
            MenuCommand::Quit => host.quit()?,
            MenuCommand::ClearBrowsingData => {
                let message = format!(
                    "This will clear all data (cookies, local storage etc) from {}. \
                     Are you sure you wish to proceed?",
                    self.env.app_name
                );
                if !host.confirm("Clear cache confirmation", &message) {
                    return Ok(DispatchOutcome::Cancelled { command });
                }
                let partition = format!("persist:{}", self.env.app_id);
                if let Err(e) = host.clear_storage_data(&partition) {
                    tracing::warn!(app_id = %self.env.app_id, error = %e, "clearing browsing data failed");
                    return Err(e.into());
                }
                tracing::info!(app_id = %self.env.app_id, "browsing data cleared");
                // The data is gone either way; a missing window only skips the reload.
                if let Err(e) = host.send_to_window(&WindowMessage::Reload) {
                    tracing::debug!(error = %e, "reload after clearing skipped");
                }
            }
        }
        Ok(DispatchOutcome::Handled { command })
    }
}
