//! Default configuration generation.
//!
//! Writes the commented starter file used on first run. Settings are laid
//! out with [`ConfigBuilder`], which aligns trailing comments.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::*;

/// Write a default configuration file to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", path.display()))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", path.display());
    Ok(())
}

/// Content of the default configuration file.
pub fn default_config_content() -> String {
    let weekdays = WEEKDAY_NAMES[..5]
        .iter()
        .map(|d| format!("\"{d}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let weekend = WEEKDAY_NAMES[5..]
        .iter()
        .map(|d| format!("\"{d}\""))
        .collect::<Vec<_>>()
        .join(", ");

    ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "timezone",
            &format!("\"{DEFAULT_TIMEZONE}\""),
            "IANA timezone (or utc_offset = <hours> instead)",
        )
        .add_setting(
            "latitude",
            &format!("{DEFAULT_LATITUDE:.6}"),
            &format!("Geographic latitude ({MINIMUM_LATITUDE} to {MAXIMUM_LATITUDE})"),
        )
        .add_setting(
            "longitude",
            &format!("{DEFAULT_LONGITUDE:.6}"),
            &format!("Geographic longitude ({MINIMUM_LONGITUDE} to {MAXIMUM_LONGITUDE})"),
        )
        .add_setting(
            "recompute_at",
            &format!("\"{DEFAULT_RECOMPUTE_AT}\""),
            "Daily schedule recompute time (HH:MM)",
        )
        .add_table("bus")
        .add_commented_setting(
            "command",
            "\"/usr/local/bin/shutter-command\"",
            "Run as: <command> <address> <up|down> (log only when unset)",
        )
        .add_table("devices")
        .add_setting(
            "living",
            "\"00000000-0000-0000-0000-000000000001\"",
            "Logical shutter name = bus address",
        )
        .add_setting("bedroom", "\"00000000-0000-0000-0000-000000000002\"", "")
        .add_table("events")
        .add_setting(
            "vacation",
            "false",
            "Set to true to switch to the vacation schedule",
        )
        .add_comment("Times: \"HH:MM\", \"sunrise\", \"sunset\", \"sunrise+15\", \"sunset-30\".")
        .add_comment("min/max keep sun-relative times inside a clock window.")
        .add_array_table("schedules")
        .add_line(&format!("days = [{weekdays}]"))
        .add_line(
            "open = [{ shutters = [\"living\", \"bedroom\"], time = \"sunrise\", min = \"07:00\" }]",
        )
        .add_line(
            "close = [{ shutters = [\"living\", \"bedroom\"], time = \"sunset+15\", max = \"22:00\" }]",
        )
        .add_array_table("schedules")
        .add_line(&format!("days = [{weekend}]"))
        .add_line(
            "open = [{ shutters = [\"living\", \"bedroom\"], time = \"sunrise\", min = \"09:00\" }]",
        )
        .add_line("close = [{ shutters = [\"living\", \"bedroom\"], time = \"sunset+15\" }]")
        .add_array_table("schedules")
        .add_line("event = \"vacation\"")
        .add_line("close = [{ shutters = [\"living\", \"bedroom\"], time = \"sunset\" }]")
        .build()
}

/// Builds a TOML file whose `key = value` lines share one comment column.
pub struct ConfigBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    /// `#[Title]` heading for top-level keys.
    Section(String),
    /// `[name]` or `[[name]]` table header.
    Table(String),
    Setting {
        line: String,
        comment: String,
    },
    /// Verbatim line, not aligned.
    Line(String),
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add_section(mut self, title: &str) -> Self {
        self.entries.push(Entry::Section(format!("#[{title}]")));
        self
    }

    pub fn add_table(mut self, name: &str) -> Self {
        self.entries.push(Entry::Table(format!("[{name}]")));
        self
    }

    pub fn add_array_table(mut self, name: &str) -> Self {
        self.entries.push(Entry::Table(format!("[[{name}]]")));
        self
    }

    pub fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: comment.to_string(),
        });
        self
    }

    /// A setting written commented out, as a documented optional key.
    pub fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("# {key} = {value}"),
            comment: comment.to_string(),
        });
        self
    }

    pub fn add_comment(mut self, text: &str) -> Self {
        self.entries.push(Entry::Line(format!("# {text}")));
        self
    }

    pub fn add_line(mut self, line: &str) -> Self {
        self.entries.push(Entry::Line(line.to_string()));
        self
    }

    pub fn build(self) -> String {
        let column = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Section(heading) | Entry::Table(heading) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(heading);
                }
                Entry::Setting { line, comment } if comment.is_empty() => lines.push(line),
                Entry::Setting { line, comment } => {
                    let padding = " ".repeat(column - line.len());
                    lines.push(format!("{line}{padding}# {comment}"));
                }
                Entry::Line(line) => lines.push(line),
            }
        }

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}
