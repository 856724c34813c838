//! Output formatting and writing utilities
//!
//! Reports are rendered either for people (colored, one line per finding)
//! or as JSON/YAML for other tools. Status messages only appear in the
//! human format so machine output stays parseable.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use confgate_core::{BatchReport, DocumentReport};
use serde::Serialize;
use std::io::{self, Write};
use tracing::trace;

/// Machine-readable shape of a batch report
#[derive(Debug, Serialize)]
pub struct BatchSummary<'a> {
    pub valid: bool,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub cancelled: bool,
    pub documents: &'a [DocumentReport],
}

impl<'a> From<&'a BatchReport> for BatchSummary<'a> {
    fn from(report: &'a BatchReport) -> Self {
        Self {
            valid: report.is_valid(),
            total_errors: report.total_errors(),
            total_warnings: report.total_warnings(),
            cancelled: report.cancelled(),
            documents: &report.documents,
        }
    }
}

/// Trait for formatting output in the selected format
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the findings of a validation run
    fn format_batch_report(&self, report: &BatchReport, use_color: bool) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_batch_report(&self, report: &BatchReport, use_color: bool) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_batch_report_human(report, use_color)),
            _ => self.format(&BatchSummary::from(report)),
        }
    }
}

fn paint(text: String, use_color: bool, style: fn(String) -> colored::ColoredString) -> String {
    if use_color {
        style(text).to_string()
    } else {
        text
    }
}

fn format_document_human(document: &DocumentReport, use_color: bool) -> Vec<String> {
    let report = &document.report;
    let mut lines = Vec::new();

    if report.is_valid() {
        let mut line = format!("✓ {}: valid", document.name);
        if report.async_checks_run > 0 {
            line.push_str(&format!(" ({} remote check(s))", report.async_checks_run));
        }
        lines.push(paint(line, use_color, |s| s.green()));
    } else {
        let line = format!("✗ {}: {} error(s)", document.name, report.errors.len());
        lines.push(paint(line, use_color, |s| s.red().bold()));
        for error in report.errors.iter() {
            lines.push(format!("    {}", error));
        }
    }

    for warning in &report.warnings {
        lines.push(paint(format!("    warning: {}", warning), use_color, |s| s.yellow()));
    }
    if report.cancelled {
        lines.push(paint(
            "    remote checks were cancelled".to_string(),
            use_color,
            |s| s.yellow(),
        ));
    }
    lines
}

/// Render a batch report for a terminal
pub fn format_batch_report_human(report: &BatchReport, use_color: bool) -> String {
    let mut lines: Vec<String> = report
        .documents
        .iter()
        .flat_map(|document| format_document_human(document, use_color))
        .collect();

    let total = report.documents.len();
    let valid = total - report.invalid_documents().count();
    let summary = format!(
        "{}/{} document(s) valid, {} error(s), {} warning(s)",
        valid,
        total,
        report.total_errors(),
        report.total_warnings()
    );
    lines.push(String::new());
    lines.push(if report.is_valid() {
        paint(summary, use_color, |s| s.green().bold())
    } else {
        paint(summary, use_color, |s| s.red().bold())
    });
    lines.join("\n")
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "writing data");
        self.writeln(formatted.trim_end())
    }

    /// Write the report of a validation run
    ///
    /// Quiet mode keeps the report; only the per-document lines of valid
    /// documents are dropped.
    pub fn batch_report(&mut self, report: &BatchReport) -> Result<()> {
        if self.quiet && self.is_human() {
            let failing = BatchReport {
                documents: report.invalid_documents().cloned().collect(),
            };
            if failing.documents.is_empty() {
                return Ok(());
            }
            let formatted = format_batch_report_human(&failing, self.use_color);
            return self.writeln(&formatted);
        }
        let formatted = self.format.format_batch_report(report, self.use_color)?;
        self.writeln(formatted.trim_end())
    }
}
