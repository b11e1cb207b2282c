use anyhow::{Context, Result, bail};
use jobpilot::{
	BrowserApplyRunner, SessionManager, SessionStore, Settings, StatePaths, TaskQueue, UserConfigStore, Worker, WorkerLease, resolver_from_settings,
};
use jobpilot_protocol::{NewTask, Task};
use jobpilot_runtime::ChromiumLauncher;
use tracing::{info, warn};

use crate::banner;
use crate::cli::{BrowserArgs, Cli, Commands, EnqueueArgs, ListArgs, OutputFormat};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let paths = StatePaths::resolve(cli.data_dir.as_deref());
	let mut settings = Settings::load(&paths.settings)?;
	apply_browser_args(&mut settings, &cli.browser);

	match cli.command.unwrap_or(Commands::Run) {
		Commands::Run => run(paths, settings).await,
		Commands::Login => login(&paths, &settings).await,
		Commands::Enqueue(args) => enqueue(&paths, &settings, args, cli.format).await,
		Commands::List(args) => list(&paths, &settings, args, cli.format),
	}
}

fn apply_browser_args(settings: &mut Settings, args: &BrowserArgs) {
	if args.headless {
		settings.browser.headless = true;
	}
	if let Some(executable) = &args.browser {
		settings.browser.executable = Some(executable.clone());
	}
}

fn session(paths: &StatePaths, settings: &Settings) -> SessionManager<ChromiumLauncher> {
	SessionManager::new(ChromiumLauncher, settings, SessionStore::new(paths), UserConfigStore::new(paths))
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!(target = "jobpilot", error = %err, "ctrl-c handler unavailable, run until killed");
		std::future::pending::<()>().await;
	}
	info!(target = "jobpilot", "interrupt received");
}

async fn run(paths: StatePaths, settings: Settings) -> Result<()> {
	let _lease = WorkerLease::acquire(&paths.worker_lock)?;
	let resolver = resolver_from_settings(&settings.intent)?;

	let runner = BrowserApplyRunner::new(session(&paths, &settings));
	let watcher = banner::watch_session(runner.subscribe(), settings.login.timeout_secs);
	banner::print_banner(&paths, &settings);

	let queue = TaskQueue::new(&paths, settings.queue_lock.clone());
	let mut worker = Worker::new(queue, UserConfigStore::new(&paths), resolver, runner, settings);
	worker.run(shutdown_signal()).await;

	watcher.abort();
	Ok(())
}

async fn login(paths: &StatePaths, settings: &Settings) -> Result<()> {
	let mut session = session(paths, settings);
	let watcher = banner::watch_session(session.subscribe(), settings.login.timeout_secs);

	let outcome = tokio::select! {
		outcome = session.ensure_logged_in() => outcome,
		_ = shutdown_signal() => Ok(false),
	};
	let state = session.state();
	session.stop().await;
	watcher.abort();

	if !outcome? {
		bail!("login failed: {}", state.label());
	}
	eprintln!("Logged in; session saved to {}", paths.cookies.display());
	Ok(())
}

async fn enqueue(paths: &StatePaths, settings: &Settings, args: EnqueueArgs, format: OutputFormat) -> Result<()> {
	if args.description.trim().is_empty() {
		bail!("description must not be empty");
	}
	let queue = TaskQueue::new(paths, settings.queue_lock.clone());
	let task = queue
		.enqueue(NewTask::apply(args.title, args.description))
		.await
		.with_context(|| format!("failed to enqueue into {}", paths.tasks.display()))?;

	match format {
		OutputFormat::Text => println!("{}", task.id),
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&task)?),
	}
	Ok(())
}

fn list(paths: &StatePaths, settings: &Settings, args: ListArgs, format: OutputFormat) -> Result<()> {
	let queue = TaskQueue::new(paths, settings.queue_lock.clone());
	let tasks: Vec<Task> = queue
		.list()?
		.into_iter()
		.filter(|task| args.status.is_none_or(|filter| filter.matches(task.status)))
		.collect();

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
		OutputFormat::Text => {
			if tasks.is_empty() {
				println!("no tasks");
			}
			for task in &tasks {
				println!(
					"{:<8}  {:<9}  {:>3}%  {:<16}  {}  {}",
					task.id, task.status, task.progress, task.created_at, task.title, task.log
				);
			}
		}
	}
	Ok(())
}
