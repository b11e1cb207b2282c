//! Runs the `jobpilot` binary against throwaway data directories.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn jobpilot_binary() -> PathBuf {
	let mut path = std::env::current_exe().unwrap();
	path.pop();
	path.pop();
	path.push("jobpilot");
	path
}

fn run(data_dir: &Path, args: &[&str]) -> (bool, String, String) {
	let output = Command::new(jobpilot_binary())
		.arg("--data-dir")
		.arg(data_dir)
		.args(args)
		.env_remove("RUST_LOG")
		.output()
		.expect("failed to execute jobpilot");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.success(), stdout, stderr)
}

#[test]
fn enqueue_then_list() {
	let tmp = TempDir::new().unwrap();

	let (success, stdout, stderr) = run(tmp.path(), &["-f", "text", "enqueue", "在北京投递3个产品经理岗位"]);
	assert!(success, "enqueue failed: {stderr}");
	let id = stdout.trim().to_string();
	assert_eq!(id.len(), 8);
	assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

	let (success, stdout, stderr) = run(tmp.path(), &["list"]);
	assert!(success, "list failed: {stderr}");
	let tasks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(tasks.as_array().unwrap().len(), 1);
	assert_eq!(tasks[0]["id"], id.as_str());
	assert_eq!(tasks[0]["type"], "apply");
	assert_eq!(tasks[0]["status"], "pending");
	assert_eq!(tasks[0]["title"], "投递");
	assert_eq!(tasks[0]["progress"], 0);

	let (success, stdout, _) = run(tmp.path(), &["-f", "text", "list", "--status", "completed"]);
	assert!(success);
	assert_eq!(stdout.trim(), "no tasks");
}

#[test]
fn newest_task_goes_first_in_file() {
	let tmp = TempDir::new().unwrap();
	let (_, first, _) = run(tmp.path(), &["enqueue", "--title", "一", "在上海投递1个运营岗位"]);
	let (_, second, _) = run(tmp.path(), &["enqueue", "--title", "二", "在杭州投递2个前端岗位"]);
	let first: serde_json::Value = serde_json::from_str(&first).unwrap();
	let second: serde_json::Value = serde_json::from_str(&second).unwrap();
	assert_eq!(first["log"], "waiting to run");

	let raw = std::fs::read_to_string(tmp.path().join("tasks.json")).unwrap();
	let tasks: serde_json::Value = serde_json::from_str(&raw).unwrap();
	assert_eq!(tasks[0]["id"], second["id"]);
	assert_eq!(tasks[1]["id"], first["id"]);
}

#[test]
fn malformed_queue_is_left_alone() {
	let tmp = TempDir::new().unwrap();
	let tasks = tmp.path().join("tasks.json");
	std::fs::write(&tasks, "[{\"id\":").unwrap();

	let (success, _, stderr) = run(tmp.path(), &["enqueue", "在北京投递3个产品经理岗位"]);
	assert!(!success);
	assert!(stderr.contains("invalid JSON"), "unexpected stderr: {stderr}");
	assert_eq!(std::fs::read_to_string(&tasks).unwrap(), "[{\"id\":");
}

#[test]
fn malformed_settings_are_rejected() {
	let tmp = TempDir::new().unwrap();
	std::fs::write(tmp.path().join("settings.json"), "{\"pollIntervalMs\": \"soon\"}").unwrap();

	let (success, _, stderr) = run(tmp.path(), &["list"]);
	assert!(!success);
	assert!(stderr.contains("invalid settings"), "unexpected stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn run_refuses_when_another_worker_holds_the_lease() {
	let tmp = TempDir::new().unwrap();
	std::fs::write(tmp.path().join("worker.lock"), std::process::id().to_string()).unwrap();

	let (success, _, stderr) = run(tmp.path(), &["run", "--headless"]);
	assert!(!success);
	assert!(stderr.contains("another worker"), "unexpected stderr: {stderr}");
}
