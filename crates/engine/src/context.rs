//! Application context – capability trait objects plus the live app state.

use crate::availability::AvailabilityContext;
use crate::catalog::EngineCatalog;
use crate::dialog::ReferralDialogState;
use crate::menu::{MenuDispatcher, MenuEnv};
use crate::platform::{HeadlessMenuHost, StdFilesystem};
use crate::selection::{
    SelectOutcome, SelectionKey, SelectionObserver, SelectionRejected, SelectionState,
};
use crate::traits::*;
use crate::user::{JsonUserStore, UserStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// What the host knows about the app before the context exists.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub availability: AvailabilityContext,
    pub menu: MenuEnv,
    /// Engine key to select at startup, if any.
    pub default_engine: Option<String>,
    /// Directory for the user table and session partitions.
    pub data_dir: PathBuf,
}

impl ContextOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            availability: AvailabilityContext::current(),
            menu: MenuEnv::new("WebCatalog", "webcatalog"),
            default_engine: None,
            data_dir: data_dir.into(),
        }
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn partitions_dir(&self) -> PathBuf {
        self.data_dir.join("Partitions")
    }
}

/// Central context passed to all engine commands.
///
/// State lives behind mutexes so the daemon can share one context between
/// connections; every command is still a short synchronous critical section.
pub struct AppContext {
    fs: Arc<dyn FilesystemOps>,
    selection: Mutex<SelectionState>,
    /// Called after the selection lock is released, so it may read the
    /// context. It must not select again.
    observer: Mutex<Option<SelectionObserver>>,
    menu: Mutex<MenuDispatcher>,
    referral: Mutex<ReferralDialogState>,
    users: Box<dyn UserStore>,
}

impl AppContext {
    pub fn new(
        fs: Arc<dyn FilesystemOps>,
        menu_host: Box<dyn MenuHost>,
        options: ContextOptions,
    ) -> Self {
        let selection = SelectionState::new(EngineCatalog::builtin(), options.availability);

        let users = JsonUserStore::new(fs.clone(), options.users_path());
        if let Err(e) = users.sync() {
            tracing::warn!(error = %e, "user table unavailable");
        }

        let ctx = Self {
            fs,
            selection: Mutex::new(selection),
            observer: Mutex::new(None),
            menu: Mutex::new(MenuDispatcher::new(options.menu, menu_host)),
            referral: Mutex::new(ReferralDialogState::default()),
            users: Box::new(users),
        };
        if let Some(key) = options.default_engine.as_deref() {
            if let Err(e) = ctx.select(key) {
                tracing::warn!(engine = key, error = %e, "configured default engine ignored");
            }
        }
        ctx
    }

    /// Context for headless / CI runs: temp data dir, no windows.
    pub fn default_headless() -> Self {
        let data_dir = std::env::temp_dir().join(format!("webwrap_{}", uuid::Uuid::new_v4()));
        Self::new(
            Arc::new(StdFilesystem),
            Box::new(HeadlessMenuHost),
            ContextOptions::new(data_dir),
        )
    }

    pub fn fs(&self) -> &dyn FilesystemOps {
        self.fs.as_ref()
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn selection(&self) -> MutexGuard<'_, SelectionState> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn menu(&self) -> MutexGuard<'_, MenuDispatcher> {
        self.menu.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn referral(&self) -> MutexGuard<'_, ReferralDialogState> {
        self.referral.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Select an engine and notify the observer once the selection lock is
    /// released.
    pub fn select(&self, candidate: &str) -> Result<SelectOutcome, SelectionRejected> {
        let changed = {
            let mut selection = self.selection();
            match selection.select(candidate)? {
                SelectOutcome::Changed => selection.current().cloned(),
                SelectOutcome::Unchanged => None,
            }
        };
        let Some(key) = changed else {
            return Ok(SelectOutcome::Unchanged);
        };
        if let Some(observer) = self
            .observer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_mut()
        {
            observer(&key);
        }
        Ok(SelectOutcome::Changed)
    }

    /// Register the presentation binding's selection callback, replacing any
    /// previous one.
    pub fn on_selection_changed(&self, callback: impl FnMut(&SelectionKey) + Send + 'static) {
        *self.observer.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(callback));
    }
}
