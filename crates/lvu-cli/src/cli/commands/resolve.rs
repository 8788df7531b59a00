//! `lvu resolve` – map poster locators to video locators.

use anyhow::Result;
use lvu_core::resolver::{PatternFamily, Resolution, UrlResolver};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Resolved,
    Unresolved,
    Excluded,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    locator: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    family: Option<PatternFamily>,
}

fn row<'a>(resolver: &UrlResolver, locator: &'a str) -> Row<'a> {
    let resolution = resolver.resolve(locator);
    let status = match &resolution {
        Resolution::Resolved(_) => Status::Resolved,
        Resolution::Unresolved => Status::Unresolved,
        Resolution::Excluded(_) => Status::Excluded,
    };
    let (target, family) = match resolution {
        Resolution::Resolved(t) | Resolution::Excluded(t) => (Some(t.url), Some(t.family)),
        Resolution::Unresolved => (None, None),
    };
    Row {
        locator,
        status,
        target,
        family,
    }
}

pub fn run_resolve(resolver: &UrlResolver, locators: &[String], json: bool) -> Result<()> {
    let rows: Vec<Row<'_>> = locators.iter().map(|l| row(resolver, l)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for r in &rows {
        match (&r.status, &r.target) {
            (Status::Resolved, Some(target)) => println!("{}\t{}", r.locator, target),
            (Status::Excluded, _) => println!("{}\t- (excluded)", r.locator),
            _ => println!("{}\t-", r.locator),
        }
    }
    Ok(())
}
