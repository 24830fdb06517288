//! Terminal bindings: a menu host that asks on the TTY, and an interactive
//! engine picker rendered from the availability resolver.

use dialoguer::{Confirm, Select};
use engine::menu::WindowMessage;
use engine::platform::SystemMenuHost;
use engine::traits::{CapResult, FilesystemOps, MenuHost};
use engine::{AppContext, SelectOutcome, SelectionKey};
use std::path::PathBuf;
use std::sync::Arc;

/// [`SystemMenuHost`] with confirmations answered on the terminal.
pub struct TerminalMenuHost {
    inner: SystemMenuHost,
}

impl TerminalMenuHost {
    pub fn new(fs: Arc<dyn FilesystemOps>, partitions_root: impl Into<PathBuf>) -> Self {
        Self {
            inner: SystemMenuHost::new(fs, partitions_root),
        }
    }
}

impl MenuHost for TerminalMenuHost {
    fn send_to_window(&self, message: &WindowMessage) -> CapResult<()> {
        self.inner.send_to_window(message)
    }

    fn toggle_full_screen(&self) -> CapResult<()> {
        self.inner.toggle_full_screen()
    }

    fn reload_container(&self) -> CapResult<()> {
        self.inner.reload_container()
    }

    fn toggle_container_dev_tools(&self) -> CapResult<()> {
        self.inner.toggle_container_dev_tools()
    }

    fn open_external(&self, url: &str) -> CapResult<()> {
        self.inner.open_external(url)
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        Confirm::new()
            .with_prompt(format!("{}: {}", title, message))
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    fn clear_storage_data(&self, partition: &str) -> CapResult<()> {
        self.inner.clear_storage_data(partition)
    }

    fn quit(&self) -> CapResult<()> {
        self.inner.quit()
    }
}

/// One row of the picker: what is shown and the key it selects.
struct Choice {
    label: String,
    key: SelectionKey,
}

fn choices(ctx: &AppContext) -> Vec<Choice> {
    let selection = ctx.selection();
    let mut rows = Vec::new();
    for (descriptor, result) in selection.availability().in_display_order(selection.catalog()) {
        if !result.visible {
            continue;
        }
        for variant in &result.offered_variants {
            let mut label = descriptor.display_name.to_string();
            if result.show_variant_toggle {
                label.push_str(&format!(" ({})", variant.label()));
            }
            if let Some(reason) = result.disabled_reason {
                label.push_str(&format!(" – {}", reason));
            }
            rows.push(Choice {
                label,
                key: SelectionKey::new(descriptor.id, Some(*variant)),
            });
        }
    }
    rows
}

pub fn pick_engine(ctx: &AppContext) {
    let rows = choices(ctx);
    let current = ctx.selection().current().cloned();
    let default = current
        .as_ref()
        .and_then(|k| rows.iter().position(|r| &r.key == k))
        .unwrap_or(0);

    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    let picked = match Select::new()
        .with_prompt("Engine")
        .items(&labels)
        .default(default)
        .interact_opt()
    {
        Ok(Some(i)) => i,
        Ok(None) => return,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let key = rows[picked].key.to_string();
    match ctx.select(&key) {
        Ok(SelectOutcome::Changed) => println!("selected {}", key),
        Ok(SelectOutcome::Unchanged) => println!("{} already selected", key),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
