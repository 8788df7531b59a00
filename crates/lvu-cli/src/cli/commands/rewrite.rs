//! `lvu rewrite` – one-shot rewrite of a saved page.

use anyhow::Result;
use lvu_core::dom::Tree;
use lvu_core::engine::{Engine, EngineSettings};
use std::path::Path;

use super::input::{read_page, write_page};

/// Fire the ready notification, run to idle and tear down. No load events
/// are delivered, so every replacement is still on its first attempt.
pub fn rewrite(tree: Tree, settings: EngineSettings) -> (Tree, serde_json::Value) {
    let mut engine = Engine::new(tree, settings);
    engine.notify_ready();
    engine.run_until_idle();
    let report = serde_json::json!({
        "scan": engine.report(),
        "stats": engine.stats(),
    });
    (engine.teardown(), report)
}

pub fn run_rewrite(
    settings: EngineSettings,
    input: &Path,
    output: Option<&Path>,
    report: bool,
) -> Result<()> {
    let tree = read_page(input)?;
    let (tree, scan) = rewrite(tree, settings);
    if report {
        eprintln!("{}", serde_json::to_string_pretty(&scan)?);
    }
    write_page(output, &tree.to_html()?)?;
    if let Some(out) = output {
        tracing::info!("wrote rewritten page to {}", out.display());
    }
    Ok(())
}
