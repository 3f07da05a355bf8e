//! History Command
//!
//! Lists or clears the stored run history.

use std::path::Path;

use crate::cli::{CommandContext, Output};
use crate::types::Result;

pub fn run(limit: usize, clear: bool, format: &str, config_path: Option<&Path>) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load(config_path)?;
    let store = ctx.history_store()?;

    if clear {
        store.clear()?;
        out.success("History cleared.");
        return Ok(());
    }

    let entries = store.recent(limit)?;

    if format == "json" {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id,
                    "prompt": e.prompt,
                    "output": e.output,
                    "mode": e.mode.to_string(),
                    "created_at": e.created_at.to_rfc3339(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if entries.is_empty() {
        out.info("No history yet.");
        return Ok(());
    }

    for entry in entries {
        out.section(&format!(
            "{} [{}] {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.mode,
            truncate(&entry.prompt, 60)
        ));
        println!("{}", truncate(&entry.output, 400));
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ααββγγ", 4), "ααββ…");
    }
}
