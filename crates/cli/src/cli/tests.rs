use std::path::PathBuf;

use clap::Parser;
use jobpilot_protocol::TaskStatus;

use super::*;

#[test]
fn parse_run_with_global_flags() {
	let cli = Cli::try_parse_from(["jobpilot", "-vv", "run", "--headless", "--data-dir", "/tmp/jp"]).unwrap();
	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/jp")));
	assert!(cli.browser.headless);
	assert_eq!(cli.browser.browser, None);
	assert!(matches!(cli.command, Some(Commands::Run)));
}

#[test]
fn no_subcommand_means_run() {
	let cli = Cli::try_parse_from(["jobpilot", "--headless"]).unwrap();
	assert!(cli.command.is_none());
	assert!(cli.browser.headless);
	assert_eq!(cli.format, OutputFormat::Json);
}

#[test]
fn parse_enqueue_default_title() {
	let cli = Cli::try_parse_from(["jobpilot", "enqueue", "在北京投递3个产品经理岗位"]).unwrap();
	match cli.command {
		Some(Commands::Enqueue(args)) => {
			assert_eq!(args.title, "投递");
			assert_eq!(args.description, "在北京投递3个产品经理岗位");
		}
		_ => panic!("Expected Enqueue command"),
	}
}

#[test]
fn parse_list_json_filtered() {
	let cli = Cli::try_parse_from(["jobpilot", "list", "-f", "text", "--status", "failed"]).unwrap();
	assert_eq!(cli.format, OutputFormat::Text);
	match cli.command {
		Some(Commands::List(args)) => {
			let filter = args.status.unwrap();
			assert!(filter.matches(TaskStatus::Failed));
			assert!(!filter.matches(TaskStatus::Pending));
		}
		_ => panic!("Expected List command"),
	}
}

#[test]
fn enqueue_requires_description() {
	assert!(Cli::try_parse_from(["jobpilot", "enqueue"]).is_err());
}
