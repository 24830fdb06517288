//! `webwrapctl` – headless CLI harness for the web app wrapper engine.
//!
//! Drives the same engine the desktop host uses, without a window server.
//! Useful for checking engine availability rules and menu behaviour on
//! CI machines and VMs.

mod host;
mod output;
mod serve;

use clap::{Parser, Subcommand};
use engine::platform::{HeadlessMenuHost, StdFilesystem};
use engine::traits::{FilesystemOps, MenuHost};
use engine::types::{detect_headless, new_run_id, result_err, ErrorCode};
use engine::{AppContext, CommandRegistry, ContextOptions};
use output::Output;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "webwrapctl",
    version,
    about = "CLI harness for the web app wrapper engine"
)]
struct Cli {
    /// Never prompt and never touch real windows.
    #[arg(long, global = true)]
    headless: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect environment facts and emit an env summary.
    Doctor {
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
        /// Write result JSON to this path.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Invoke an engine command by name with JSON args.
    Call {
        /// Command name (e.g. "ping", "resolve_engines", "select_engine").
        cmd: String,
        /// JSON args to pass to the command.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Directory for artifacts output.
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// Pick an engine interactively from the ones offered on this host.
    Pick,

    /// Run a scripted scenario from a YAML file.
    RunScenario {
        /// Path to the scenario YAML file.
        file: PathBuf,
        /// Directory for artifacts output.
        #[arg(long)]
        artifacts: Option<PathBuf>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start daemon mode over a Unix socket.
    Serve {
        /// Path for the Unix domain socket.
        #[arg(long)]
        socket: PathBuf,
    },
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() {
    // Plain env-filtered tracing; stdout stays reserved for results.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = build_context(cli.headless);
    let registry = CommandRegistry::new();

    let (output, json, artifacts) = match cli.command {
        Commands::Doctor { json, out } => {
            let output = Output::Single(engine::doctor::run_doctor());
            if let Some(path) = out {
                if let Err(e) = std::fs::write(&path, output.to_json()) {
                    tracing::warn!(path = %path.display(), error = %e, "cannot write doctor result");
                }
            }
            (output, json, None)
        }
        Commands::Call {
            cmd,
            args,
            json,
            artifacts,
        } => (call(&cmd, &args, &ctx, &registry), json, artifacts),
        Commands::RunScenario {
            file,
            artifacts,
            json,
        } => (run_scenario_file(&file, &ctx, &registry), json, artifacts),
        Commands::Pick => return host::pick_engine(&ctx),
        Commands::Serve { socket } => return serve::run_daemon(socket, ctx, registry).await,
    };

    output.print(json);
    if let Some(dir) = artifacts {
        output.write_artifacts(&dir);
    }
    std::process::exit(output.exit_code());
}

/// Context from the desktop configuration, or a throwaway headless one when
/// no configuration can be found.
fn build_context(headless: bool) -> AppContext {
    let config = match webwrap_desktop::config::try_get_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "no app configuration, using headless defaults");
            return AppContext::default_headless();
        }
    };

    let options: ContextOptions = config.context_options();
    if let Err(e) = std::fs::create_dir_all(&options.data_dir) {
        tracing::warn!(dir = %options.data_dir.display(), error = %e, "cannot create data dir");
    }
    let fs: Arc<dyn FilesystemOps> = Arc::new(StdFilesystem);
    let host: Box<dyn MenuHost> = if headless || detect_headless() {
        Box::new(HeadlessMenuHost)
    } else {
        Box::new(host::TerminalMenuHost::new(fs.clone(), options.partitions_dir()))
    };
    AppContext::new(fs, host, options)
}

fn call(cmd: &str, args: &str, ctx: &AppContext, registry: &CommandRegistry) -> Output {
    match serde_json::from_str(args) {
        Ok(args) => Output::Single(registry.execute(cmd, args, ctx)),
        Err(e) => Output::Single(result_err(
            "call",
            cmd,
            &new_run_id(),
            0,
            ErrorCode::InvalidInput,
            format!("invalid JSON args: {}", e),
        )),
    }
}

fn run_scenario_file(file: &Path, ctx: &AppContext, registry: &CommandRegistry) -> Output {
    let target = file.display().to_string();
    let fail = |code, message: String| {
        Output::Single(result_err("run-scenario", &target, &new_run_id(), 0, code, message))
    };

    let yaml = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => return fail(ErrorCode::IoError, format!("cannot read scenario file: {}", e)),
    };
    match engine::scenario::load_scenario(&yaml) {
        Ok(scenario) => Output::Scenario(engine::scenario::run_scenario(&scenario, ctx, registry)),
        Err(e) => fail(ErrorCode::InvalidInput, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_with_bad_json_is_invalid_input() {
        let ctx = AppContext::default_headless();
        let out = call("ping", "{not json", &ctx, &CommandRegistry::new());
        match out {
            Output::Single(r) => {
                assert_eq!(r.error.map(|e| e.code), Some(ErrorCode::InvalidInput))
            }
            Output::Scenario(_) => panic!("expected a single result"),
        }
    }

    #[test]
    fn test_bundled_scenario_passes() {
        let ctx = AppContext::default_headless();
        let file = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/engine_picker.yaml");
        let out = run_scenario_file(&file, &ctx, &CommandRegistry::new());
        assert_eq!(out.status(), engine::Status::Pass, "{}", out.to_json());
    }

    #[test]
    fn test_missing_scenario_file() {
        let ctx = AppContext::default_headless();
        let out = run_scenario_file(Path::new("/nonexistent/x.yaml"), &ctx, &CommandRegistry::new());
        assert_eq!(out.exit_code(), 2);
    }
}
