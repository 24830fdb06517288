//! Rendering of command and scenario results: stdout text or JSON, exit
//! codes and on-disk artifacts.

use engine::types::{CommandResult, ScenarioResult, Status};
use std::path::Path;

pub enum Output {
    Single(CommandResult),
    Scenario(ScenarioResult),
}

impl Output {
    pub fn status(&self) -> Status {
        match self {
            Output::Single(r) => r.status,
            Output::Scenario(s) => s.overall_status,
        }
    }

    /// 0 for pass/skip, 1 for fail, 2 for error.
    pub fn exit_code(&self) -> i32 {
        match self.status() {
            Status::Pass | Status::Skip => 0,
            Status::Fail => 1,
            Status::Error => 2,
        }
    }

    pub fn to_json(&self) -> String {
        let json = match self {
            Output::Single(r) => serde_json::to_string_pretty(r),
            Output::Scenario(s) => serde_json::to_string_pretty(s),
        };
        json.unwrap_or_default()
    }

    pub fn print(&self, json: bool) {
        if json {
            println!("{}", self.to_json());
            return;
        }
        match self {
            Output::Single(r) => print_result(r, ""),
            Output::Scenario(s) => {
                println!(
                    "Scenario: {} [{}]",
                    s.name.as_deref().unwrap_or("<unnamed>"),
                    status_label(s.overall_status)
                );
                for (i, step) in s.step_results.iter().enumerate() {
                    println!("  step {}:", i);
                    print_result(step, "    ");
                }
            }
        }
    }

    /// `<dir>/<run id>/result.json` plus one `events.jsonl` line per step.
    pub fn write_artifacts(&self, dir: &Path) {
        let (run_id, steps): (String, Vec<&CommandResult>) = match self {
            Output::Single(r) => (r.run_id.clone(), vec![r]),
            Output::Scenario(s) => (
                engine::types::new_run_id(),
                s.step_results.iter().collect(),
            ),
        };

        let art_dir = dir.join(run_id);
        if let Err(e) = std::fs::create_dir_all(&art_dir) {
            tracing::warn!(dir = %art_dir.display(), error = %e, "cannot create artifacts dir");
            return;
        }
        if let Err(e) = std::fs::write(art_dir.join("result.json"), self.to_json()) {
            tracing::warn!(error = %e, "cannot write result.json");
        }

        let events: String = steps
            .iter()
            .filter_map(|r| serde_json::to_string(r).ok())
            .map(|line| line + "\n")
            .collect();
        if let Err(e) = std::fs::write(art_dir.join("events.jsonl"), events) {
            tracing::warn!(error = %e, "cannot write events.jsonl");
        }
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
        Status::Skip => "SKIP",
        Status::Error => "ERROR",
    }
}

fn print_result(r: &CommandResult, indent: &str) {
    println!(
        "{}[{}] {} {} ({}ms)",
        indent,
        status_label(r.status),
        r.command,
        r.target,
        r.timing_ms.total
    );
    if let Some(ref err) = r.error {
        println!("{}  {}: {}", indent, err.code, err.message);
    }
    if let Some(ref data) = r.data {
        if let Ok(s) = serde_json::to_string_pretty(data) {
            for line in s.lines() {
                println!("{}  {}", indent, line);
            }
        }
    }
}
