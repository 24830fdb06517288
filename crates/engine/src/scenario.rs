//! Scenario runner – execute scripted command flows from YAML files.

use crate::commands::CommandRegistry;
use crate::context::AppContext;
use crate::types::*;

/// Load a scenario from a YAML string.
pub fn load_scenario(yaml: &str) -> Result<Scenario, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("failed to parse scenario YAML: {}", e))
}

/// Execute a scenario and return the overall result.
///
/// Every step runs even after a mismatch so the report shows the whole flow.
pub fn run_scenario(
    scenario: &Scenario,
    ctx: &AppContext,
    registry: &CommandRegistry,
) -> ScenarioResult {
    let mut step_results = Vec::new();
    let mut overall = Status::Pass;

    for (i, step) in scenario.steps.iter().enumerate() {
        let r = registry.execute(&step.call, step.args.clone(), ctx);
        let actual_code = r.error.as_ref().map(|e| e.code);

        let status_ok = r.status == step.expect_status;
        let code_ok = step.expect_code.is_none() || step.expect_code == actual_code;
        if !status_ok || !code_ok {
            tracing::warn!(
                step = i,
                call = %step.call,
                expected = ?step.expect_status,
                actual = ?r.status,
                expected_code = ?step.expect_code,
                actual_code = ?actual_code,
                "scenario step mismatch"
            );
            overall = Status::Fail;
        }
        step_results.push(r);
    }

    ScenarioResult {
        name: scenario.name.clone(),
        overall_status: overall,
        step_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
name: pick an engine
steps:
  - call: "ping"
    args: {}
    expect_status: "pass"
  - call: "select_engine"
    args: { engine: "bogus" }
    expect_status: "error"
    expect_code: "REJECTED"
"#;
        let s = load_scenario(yaml).expect("should parse");
        assert_eq!(s.name, Some("pick an engine".into()));
        assert_eq!(s.steps.len(), 2);
        assert_eq!(s.steps[1].expect_code, Some(ErrorCode::Rejected));
    }

    #[test]
    fn test_run_scenario_selection_flow() {
        let yaml = r#"
steps:
  - call: "select_engine"
    args: { engine: "chrome/tabs" }
  - call: "select_engine"
    args: { engine: "chrome/windowed" }
    expect_status: "error"
    expect_code: "REJECTED"
  - call: "current_engine"
"#;
        let scenario = load_scenario(yaml).unwrap();
        let ctx = AppContext::default_headless();
        let reg = CommandRegistry::new();
        let result = run_scenario(&scenario, &ctx, &reg);
        assert_eq!(result.overall_status, Status::Pass);
        assert_eq!(result.step_results.len(), 3);
        assert_eq!(
            result.step_results[2].data.as_ref().unwrap()["selection"],
            "chrome/tabs"
        );
    }

    #[test]
    fn test_mismatch_fails_scenario() {
        let yaml = r#"
steps:
  - call: "select_engine"
    args: { engine: "bogus" }
"#;
        let scenario = load_scenario(yaml).unwrap();
        let ctx = AppContext::default_headless();
        let result = run_scenario(&scenario, &ctx, &CommandRegistry::new());
        assert_eq!(result.overall_status, Status::Fail);
    }
}
