//! Doctor – gather environment facts that decide which engines are offered.

use crate::availability::{resolve, AvailabilityContext};
use crate::catalog::{EngineCatalog, Platform};
use crate::selection::SelectionKey;
use crate::types::*;
use std::collections::BTreeMap;
use std::time::Instant;

/// Run the doctor check and return a full report as a CommandResult.
pub fn run_doctor() -> CommandResult {
    let run_id = new_run_id();
    let start = Instant::now();

    let report = gather_report(Platform::current());

    let mut r = result_ok("doctor", "env", &run_id, start.elapsed().as_millis() as u64);
    r.data = serde_json::to_value(&report).ok();
    r
}

fn gather_report(platform: Platform) -> DoctorReport {
    DoctorReport {
        os_name: std::env::consts::OS.to_string(),
        os_version: os_version(),
        kernel: run_cmd("uname", &["-r"]).unwrap_or_else(|| "unknown".into()),
        arch: std::env::consts::ARCH.to_string(),
        platform: platform.as_str().to_string(),
        headless: detect_headless(),
        session_type: std::env::var("XDG_SESSION_TYPE").ok(),
        display_server: display_server(),
        visible_engines: visible_engines(platform),
        selectable: selectable_matrix(platform),
    }
}

fn visible_engines(platform: Platform) -> Vec<String> {
    let catalog = EngineCatalog::builtin();
    let availability = resolve(&catalog, &AvailabilityContext::new(platform));
    availability
        .in_display_order(&catalog)
        .filter(|(_, r)| r.visible)
        .map(|(d, _)| d.id.to_string())
        .collect()
}

/// What the picker would let a user choose for each kind of app.
fn selectable_matrix(platform: Platform) -> BTreeMap<String, Vec<String>> {
    let catalog = EngineCatalog::builtin();
    let flavours = [
        ("plain", AvailabilityContext::new(platform)),
        ("multisite", AvailabilityContext::new(platform).with_multisite(true)),
        ("widevine", AvailabilityContext::new(platform).with_widevine(true)),
    ];
    flavours
        .into_iter()
        .map(|(name, ctx)| {
            let availability = resolve(&catalog, &ctx);
            let keys = availability
                .in_display_order(&catalog)
                .filter(|(_, r)| r.selectable)
                .flat_map(|(d, r)| {
                    r.offered_variants
                        .iter()
                        .map(move |v| SelectionKey::new(d.id, Some(*v)).to_string())
                })
                .collect();
            (name.to_string(), keys)
        })
        .collect()
}

fn os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        run_cmd("sw_vers", &["-productVersion"]).unwrap_or_else(|| "unknown".into())
    }
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/etc/os-release") {
            for line in content.lines() {
                if let Some(ver) = line.strip_prefix("PRETTY_NAME=") {
                    return ver.trim_matches('"').to_string();
                }
            }
        }
        "unknown".to_string()
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        "unknown".to_string()
    }
}

fn display_server() -> Option<String> {
    if let Ok(d) = std::env::var("WAYLAND_DISPLAY") {
        return Some(format!("wayland ({})", d));
    }
    if let Ok(d) = std::env::var("DISPLAY") {
        return Some(format!("x11 ({})", d));
    }
    if cfg!(target_os = "macos") {
        Some("quartz".to_string())
    } else {
        None
    }
}

fn run_cmd(cmd: &str, args: &[&str]) -> Option<String> {
    std::process::Command::new(cmd)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}
