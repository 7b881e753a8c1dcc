//! Integration tests for the modsync CLI binary.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const REGISTRY: &str = r#"[modules]
base = "installed"
product = "uninstalled"
sale = "uninstalled"
legacy = "uninstallable"
"#;

const CONFIG: &str = r#"[registry]
state_file = "registry.toml"

[catalog]
sale = ["base", "product"]
product = ["base"]
base = []
"#;

/// A temporary directory holding a config file and a registry state file.
struct TestContext {
    temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        Self::with_files(CONFIG, REGISTRY)
    }

    fn with_files(config: &str, registry: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("modsync.toml");
        std::fs::write(&config_path, config).expect("failed to write config");
        std::fs::write(temp_dir.path().join("registry.toml"), registry)
            .expect("failed to write registry");

        Self {
            temp_dir,
            config_path,
        }
    }

    fn modsync_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_modsync");
        let mut cmd = Command::new(bin_path);
        cmd.env_remove("MODSYNC_CONFIG");
        cmd.env_remove("RUST_LOG");
        cmd.arg("--config").arg(&self.config_path);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.modsync_cmd()
            .args(args)
            .output()
            .expect("failed to run modsync")
    }

    fn run_json(&self, args: &[&str]) -> (Output, Value) {
        let output = self.run(&[&["--json"][..], args].concat());
        let json = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
            panic!(
                "stdout is not JSON ({e}): {}",
                String::from_utf8_lossy(&output.stdout)
            )
        });
        (output, json)
    }

    fn registry_state(&self) -> String {
        std::fs::read_to_string(self.temp_dir.path().join("registry.toml"))
            .expect("failed to read registry")
    }
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_reconcile_installs_in_dependency_order() {
    let ctx = TestContext::new();

    let (output, json) = ctx.run_json(&["reconcile", "sale"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(json["outcome"]["status"], "success");
    assert_eq!(json["order"], serde_json::json!(["product", "sale"]));
    assert_eq!(json["pulled_in"], serde_json::json!(["product"]));
    assert_eq!(json["validation"]["all_satisfied"], true);

    let state = ctx.registry_state();
    assert!(state.contains("product = \"installed\""));
    assert!(state.contains("sale = \"installed\""));
}

#[test]
fn test_reconcile_unknown_module_exits_partial() {
    let ctx = TestContext::new();

    let (output, json) = ctx.run_json(&["reconcile", "ghost_module"]);

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json["outcome"]["status"], "partial");
    assert_eq!(json["outcome"]["unavailable"], serde_json::json!(["ghost_module"]));
    assert_eq!(json["results"], serde_json::json!([]));
    assert_eq!(ctx.registry_state(), REGISTRY);
}

#[test]
fn test_reconcile_refused_install_exits_partial() {
    let ctx = TestContext::new();

    let (output, json) = ctx.run_json(&["reconcile", "legacy"]);

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json["outcome"]["failed"], serde_json::json!(["legacy"]));
    assert_eq!(
        json["results"][0]["error"],
        "module 'legacy' is not installable"
    );
}

#[test]
fn test_plan_does_not_modify_registry() {
    let ctx = TestContext::new();

    let (output, json) = ctx.run_json(&["plan", "sale", "base"]);

    assert!(output.status.success());
    assert_eq!(json["order"], serde_json::json!(["product", "sale"]));
    assert_eq!(json["delta"]["already_installed"], serde_json::json!(["base"]));
    assert_eq!(ctx.registry_state(), REGISTRY);
}

#[test]
fn test_status_lists_modules() {
    let ctx = TestContext::new();

    let (output, json) = ctx.run_json(&["status"]);

    assert!(output.status.success());
    assert_eq!(json["installed"], serde_json::json!(["base"]));
    assert_eq!(json["available"].as_array().map(Vec::len), Some(4));
}

#[test]
fn test_text_output() {
    let ctx = TestContext::new();

    let output = ctx.run(&["reconcile", "sale"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("product"));
    assert!(stdout.contains("All requested modules are installed"));
}

#[test]
fn test_cycle_is_fatal() {
    let ctx = TestContext::with_files(
        "[registry]\nstate_file = \"registry.toml\"\n\n[catalog]\na = [\"b\"]\nb = [\"a\"]\n",
        "[modules]\na = \"uninstalled\"\nb = \"uninstalled\"\n",
    );

    let output = ctx.run(&["reconcile", "a", "b"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Circular dependency"));
    assert!(ctx.registry_state().contains("a = \"uninstalled\""));
}

#[test]
fn test_missing_config_is_fatal() {
    let ctx = TestContext::new();

    let output = Command::new(env!("CARGO_BIN_EXE_modsync"))
        .env_remove("MODSYNC_CONFIG")
        .arg("--config")
        .arg(ctx.temp_dir.path().join("missing.toml"))
        .arg("status")
        .output()
        .expect("failed to run modsync");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load configuration"));
}
