#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::styles::cli_styles;

/// Job-application worker for BOSS Zhipin.
#[derive(Parser, Debug)]
#[command(name = "jobpilot")]
#[command(about = "Queue-driven job application worker")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format for list and enqueue
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Data directory holding tasks.json, cookies.json and settings.json
	/// (defaults to $JOBPILOT_HOME, then the platform data directory)
	#[arg(long, global = true, value_name = "DIR")]
	pub data_dir: Option<PathBuf>,

	#[command(flatten)]
	pub browser: BrowserArgs,

	/// Defaults to `run`
	#[command(subcommand)]
	pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	#[default]
	Json,
	Text,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run the worker loop until interrupted.
	Run,
	/// Add an apply task to the queue.
	Enqueue(EnqueueArgs),
	/// Show the queue.
	List(ListArgs),
	/// Log in interactively and save the session.
	Login,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
	/// Run the browser without a window (SMS verification then needs saved cookies)
	#[arg(long, global = true)]
	pub headless: bool,

	/// Chrome/Chromium executable to launch
	#[arg(long, global = true, value_name = "PATH")]
	pub browser: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EnqueueArgs {
	/// Free-text request, e.g. "在北京投递3个产品经理岗位"
	#[arg(value_name = "DESCRIPTION")]
	pub description: String,

	#[arg(long, default_value = "投递")]
	pub title: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
	/// Only show tasks with this status
	#[arg(long, value_enum)]
	pub status: Option<StatusFilter>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
	Pending,
	Running,
	Completed,
	Failed,
}

impl StatusFilter {
	pub fn matches(self, status: jobpilot_protocol::TaskStatus) -> bool {
		use jobpilot_protocol::TaskStatus;
		matches!(
			(self, status),
			(StatusFilter::Pending, TaskStatus::Pending)
				| (StatusFilter::Running, TaskStatus::Running)
				| (StatusFilter::Completed, TaskStatus::Completed)
				| (StatusFilter::Failed, TaskStatus::Failed)
		)
	}
}
