pub mod config;
pub mod logging;

use anyhow::Context;
use config::AppConfig;
use engine::platform::{HeadlessMenuHost, StdFilesystem, SystemMenuHost};
use engine::traits::MenuHost;
use engine::types::detect_headless;
use engine::AppContext;
use std::sync::Arc;

/// Menu host matching the current session: headless hosts never prompt.
pub fn default_menu_host(config: &AppConfig) -> Box<dyn MenuHost> {
    if detect_headless() {
        Box::new(HeadlessMenuHost)
    } else {
        Box::new(SystemMenuHost::new(
            Arc::new(StdFilesystem),
            config.context_options().partitions_dir(),
        ))
    }
}

/// Build the engine context from configuration with the given menu host.
pub fn build_context(config: &AppConfig, host: Box<dyn MenuHost>) -> anyhow::Result<AppContext> {
    let options = config.context_options();
    std::fs::create_dir_all(&options.data_dir)
        .with_context(|| format!("creating data dir {}", options.data_dir.display()))?;

    let ctx = AppContext::new(Arc::new(StdFilesystem), host, options);
    ctx.on_selection_changed(|key| {
        tracing::info!(engine = %key, "engine picker updated");
    });
    Ok(ctx)
}

/// Load config, install logging and build the context.
pub fn bootstrap() -> anyhow::Result<AppContext> {
    let config = config::try_get_config().context("loading configuration")?;
    logging::init_logging(&config.logging);
    tracing::debug!(app = %config.app.id, env = %config.dev_env, "starting");
    build_context(config, default_menu_host(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::platform::HeadlessMenuHost;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_build_context_applies_default_engine() {
        config::reset_config();
        let mut cfg = config::get_config().clone();
        cfg.data_dir = Some(
            std::env::temp_dir().join(format!("webwrap_desktop_{}", std::process::id())),
        );
        cfg.engine.default = Some("chrome/tabs".into());

        let ctx = build_context(&cfg, Box::new(HeadlessMenuHost)).expect("context");
        let current = ctx.selection().current().cloned();
        assert_eq!(current.map(|k| k.to_string()).as_deref(), Some("chrome/tabs"));

        let _ = std::fs::remove_dir_all(cfg.data_dir());
        config::reset_config();
    }

    #[test]
    #[serial]
    fn test_build_context_ignores_blocked_default() {
        config::reset_config();
        let mut cfg = config::get_config().clone();
        cfg.data_dir = Some(
            std::env::temp_dir().join(format!("webwrap_desktop_wv_{}", std::process::id())),
        );
        cfg.engine.default = Some("electron".into());
        cfg.engine.widevine = true;

        let ctx = build_context(&cfg, Box::new(HeadlessMenuHost)).expect("context");
        assert!(ctx.selection().current().is_none());

        let _ = std::fs::remove_dir_all(cfg.data_dir());
        config::reset_config();
    }
}
