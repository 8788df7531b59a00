//! `lvu config` – show where the config lives and what is in effect.

use anyhow::Result;
use lvu_core::config::{self, LvuConfig};
use std::path::Path;

pub fn run_config(explicit: Option<&Path>, cfg: &LvuConfig) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());

    // Show defaults for the optional sections so the output is the full
    // effective configuration.
    let effective = LvuConfig {
        media_host: cfg.validated_media_host()?,
        retry: Some(cfg.retry.clone().unwrap_or_default()),
        selectors: Some(cfg.selectors.clone().unwrap_or_default()),
    };
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
