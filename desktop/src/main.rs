// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() -> anyhow::Result<()> {
    let ctx = webwrap_desktop::bootstrap()?;
    let selection = ctx.selection();
    let availability = selection.availability();

    for (descriptor, result) in availability.in_display_order(selection.catalog()) {
        if !result.visible {
            continue;
        }
        tracing::info!(
            engine = descriptor.id,
            selectable = result.selectable,
            reason = result.disabled_reason.unwrap_or(""),
            "engine available"
        );
    }
    if let Some(key) = selection.current() {
        tracing::info!(engine = %key, "current engine");
    }
    Ok(())
}
