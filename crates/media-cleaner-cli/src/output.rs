use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

/// Console messages in the selected format
///
/// Human mode prints decorated lines; the JSON modes print one
/// `{"type": ..., "message": ...}` object per message so the output can be
/// piped into other tools.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn message(&self, kind: &str, prefix: Option<String>, msg: &str, to_stderr: bool) {
        if self.is_human() {
            let line = match prefix {
                Some(prefix) => format!("{} {}", prefix, msg),
                None => msg.to_string(),
            };
            if to_stderr {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        } else {
            self.print_json(&json!({ "type": kind, "message": msg }));
        }
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("success", Some("✓".green().to_string()), msg.as_ref(), false);
        }
    }

    /// Shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        self.message("error", Some("✗".red().to_string()), msg.as_ref(), true);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("info", None, msg.as_ref(), false);
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("warning", Some("⚠".yellow().to_string()), msg.as_ref(), false);
        }
    }

    pub fn println(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("info", None, msg.as_ref(), false);
        }
    }

    /// Structured payload; printed in JSON modes even when quiet
    pub fn json<T: Serialize>(&self, data: &T) {
        if self.quiet && self.is_human() {
            return;
        }
        match serde_json::to_value(data) {
            Ok(value) => self.print_json(&value),
            Err(e) => self.error(format!("Failed to serialize output: {}", e)),
        }
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Human => {
                println!("{}", data);
            }
        }
    }
}
