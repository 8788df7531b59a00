//! Reading and writing pages for `rewrite` and `simulate`.

use anyhow::{Context, Result};
use lvu_core::dom::Tree;
use std::io::Read;
use std::path::Path;

/// Parse the page at `path`; "-" reads stdin.
pub fn read_page(path: &Path) -> Result<Tree> {
    let html = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read page from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("read page: {}", path.display()))?
    };
    Tree::parse_html(&html).with_context(|| format!("parse page: {}", path.display()))
}

/// Write `html` to `path`, or stdout when no path is given.
pub fn write_page(path: Option<&Path>, html: &str) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, html).with_context(|| format!("write page: {}", p.display())),
        None => {
            println!("{html}");
            Ok(())
        }
    }
}
