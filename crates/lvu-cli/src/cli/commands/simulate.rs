//! `lvu simulate` – rewrite a page, then replay scripted load outcomes.

use anyhow::Result;
use lvu_core::engine::{Engine, EngineSettings};
use lvu_core::sim::{run_scripted, ScriptedLoads, SimReport};
use std::path::Path;

use super::input::read_page;

pub async fn run_simulate(
    settings: EngineSettings,
    input: &Path,
    failures: u32,
    json: bool,
) -> Result<()> {
    let tree = read_page(input)?;
    let max_attempts = settings.policy.max_attempts();
    let mut engine = Engine::new(tree, settings);
    engine.notify_ready();
    let report = run_scripted(&mut engine, &ScriptedLoads::new(failures)).await;
    engine.teardown();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, max_attempts);
    }
    Ok(())
}

fn print_report(report: &SimReport, max_attempts: u32) {
    if report.outcomes.is_empty() {
        println!("No posters replaced.");
        return;
    }
    println!("{:<10} {:<9} {}", "STATE", "ATTEMPTS", "TARGET");
    for o in &report.outcomes {
        println!(
            "{:<10} {:<9} {}",
            format!("{:?}", o.phase).to_lowercase(),
            format!("{}/{}", o.attempts, max_attempts),
            o.target
        );
    }
    println!(
        "{} succeeded, {} exhausted, {} blocker(s) removed, {}ms of retry delay",
        report.stats.succeeded,
        report.stats.exhausted,
        report.stats.blockers_removed,
        report.elapsed_ms
    );
}
