use jobpilot_protocol::ProgressEvent;
use tempfile::TempDir;

use super::*;
use crate::paths::StatePaths;
use crate::settings::Settings;
use crate::store::{SessionStore, UserConfigStore};
use crate::testing::{FakeLauncher, FakeSite, Listing};

fn session(site: &FakeSite, tmp: &TempDir) -> SessionManager<FakeLauncher> {
	let paths = StatePaths::new(tmp.path());
	SessionManager::new(site.launcher(), &Settings::default(), SessionStore::new(&paths), UserConfigStore::new(&paths))
}

async fn run(site: &FakeSite, count: u32) -> (Result<ApplyReport>, Vec<ProgressEvent>) {
	let tmp = TempDir::new().unwrap();
	let mut session = session(site, &tmp);
	let mut events = Vec::new();
	let result = ApplyWorkflow::new(&mut session).apply("产品经理", "北京", count, &mut |event| events.push(event)).await;
	(result, events)
}

#[tokio::test(start_paused = true)]
async fn applies_to_requested_count_in_order() {
	let site = FakeSite::default()
		.logged_in()
		.listings((1..=5).map(|n| Listing::new(&format!("产品经理{n}"))).collect());

	let (result, events) = run(&site, 3).await;
	let report = result.unwrap();

	assert_eq!(report, ApplyReport { discovered: 5, processed: 3, applied: 3, skipped: 0, failed: 0 });
	assert_eq!(site.state().applied, vec![0, 1, 2]);
	assert_eq!(events.iter().map(|e| e.percent).collect::<Vec<_>>(), vec![33, 66, 100]);
	assert!(site.state().open_extra.is_empty());

	let search = site.state().gotos.iter().find(|url| url.contains("query=")).cloned().unwrap();
	assert!(search.ends_with("city=101010100"));
}

#[tokio::test(start_paused = true)]
async fn fewer_listings_than_requested() {
	let site = FakeSite::default().logged_in().listings(vec![Listing::new("a"), Listing::new("b")]);
	let (result, events) = run(&site, 5).await;
	let report = result.unwrap();
	assert_eq!(report.processed, 2);
	assert_eq!(report.applied, 2);
	assert_eq!(events.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn no_listings_is_a_workflow_error() {
	let site = FakeSite::default().logged_in();
	let (result, events) = run(&site, 3).await;
	let err = result.unwrap_err();
	assert!(matches!(err, EngineError::NoListings { .. }));
	assert!(err.to_string().contains("no listings"));
	assert!(events.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_click_fails_one_listing_only() {
	let site = FakeSite::default().logged_in().listings(vec![Listing::new("first").stale(), Listing::new("second")]);
	let (result, events) = run(&site, 2).await;
	let report = result.unwrap();

	assert_eq!(report.applied, 1);
	assert_eq!(report.failed, 1);
	assert_eq!(events.len(), 2);
	assert!(events[0].message.contains("failed"));
	assert_eq!(site.state().applied, vec![1]);
	assert!(site.state().open_extra.is_empty());
}

#[tokio::test(start_paused = true)]
async fn existing_conversation_and_missing_control_are_skipped() {
	let site = FakeSite::default().logged_in().listings(vec![
		Listing::new("contacted").contacted(),
		Listing::new("no button").without_control(),
		Listing::new("popup").unlinked(),
		Listing::new("bare").anonymous(),
	]);
	let (result, events) = run(&site, 4).await;
	let report = result.unwrap();

	assert_eq!(report.applied, 2);
	assert_eq!(report.skipped, 2);
	assert!(report.applied + report.skipped <= report.processed);
	assert_eq!(site.state().applied, vec![2, 3]);
	assert!(events[0].message.contains("already contacted"));
	assert!(events[3].message.contains("unknown position @ unknown company"));
}

#[tokio::test(start_paused = true)]
async fn login_timeout_aborts_apply() {
	let site = FakeSite::default().listings(vec![Listing::new("a")]);
	let (result, _) = run(&site, 1).await;
	assert!(matches!(result, Err(EngineError::LoginTimeout { .. })));
	assert!(site.state().applied.is_empty());
}

#[tokio::test(start_paused = true)]
async fn search_logs_in_when_results_are_hidden() {
	let tmp = TempDir::new().unwrap();
	let site = FakeSite::default().verify_after(1).listings(vec![Listing::new("a"), Listing::new("b")]);
	let mut session = session(&site, &tmp);
	session.start().await.unwrap();

	let listings = ApplyWorkflow::new(&mut session).search("数据分析", "上海").await.unwrap();
	assert_eq!(listings.len(), 2);
	assert_eq!(listings[1].position, 1);

	let gotos = site.state().gotos.clone();
	let searches = gotos.iter().filter(|url| url.contains("city=101020100")).count();
	assert_eq!(searches, 2);
}

#[tokio::test(start_paused = true)]
async fn dead_browser_aborts_the_run() {
	let site = FakeSite::default().logged_in().listings(vec![Listing::new("a")]);
	let tmp = TempDir::new().unwrap();
	let mut session = session(&site, &tmp);
	session.start().await.unwrap();
	site.state().disconnected = true;

	let err = ApplyWorkflow::new(&mut session).apply("a", "北京", 1, &mut |_| {}).await.unwrap_err();
	assert!(err.needs_browser_restart());
}
