//! Case reporting
//!
//! The driver never prints. It calls a [`CaseReporter`] at each step, and
//! [`ConsoleReporter`] turns those calls into the terminal report: one status
//! line per case on stdout, progress and the closing summary on stderr.

use std::io::{self, IsTerminal, Stderr, Stdout, Write};
use std::path::Path;

use super::discovery::CaseName;
use super::driver::{CaseFailure, CaseOutcome, CaseReport, RunSummary};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Trait for reporting harness progress and results.
pub trait CaseReporter {
    /// Called once discovery (and filtering) is done
    fn on_collection_complete(&mut self, _case_count: usize) {}

    /// Called right before a compile stage is invoked
    fn on_stage_start(&mut self, _case: &CaseName, _stage: &str, _input: &Path) {}

    /// Called when a case reaches `Done`
    fn on_case_complete(&mut self, report: &CaseReport);

    /// Called after the last case
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Default terminal reporter
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
    verbose: bool,
    color: bool,
}

impl ConsoleReporter<Stdout, Stderr> {
    /// Report to the process's stdout/stderr. Color is used only when stdout
    /// is a terminal and `color` is requested.
    pub fn stdio(verbose: bool, color: bool) -> Self {
        let out = io::stdout();
        let color = color && out.is_terminal();
        Self::new(out, io::stderr(), verbose, color)
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E, verbose: bool, color: bool) -> Self {
        Self {
            out,
            err,
            verbose,
            color,
        }
    }

    /// Give back the writers (used to inspect captured output).
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

impl<O: Write, E: Write> CaseReporter for ConsoleReporter<O, E> {
    fn on_collection_complete(&mut self, case_count: usize) {
        if case_count == 0 {
            let _ = writeln!(self.err, "No cases collected");
        } else if self.verbose {
            let _ = writeln!(self.err, "collected {} case(s)", case_count);
        }
    }

    fn on_stage_start(&mut self, _case: &CaseName, stage: &str, input: &Path) {
        if self.verbose {
            let file = input.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            let _ = writeln!(self.err, "{} compiling {} ...", stage, file);
        }
    }

    fn on_case_complete(&mut self, report: &CaseReport) {
        let color = match report.outcome {
            CaseOutcome::Success => GREEN,
            CaseOutcome::Failed(CaseFailure::ComparisonMismatch) => RED,
            CaseOutcome::Failed(_) => YELLOW,
        };
        let status = self.paint(color, &report.status);
        if self.verbose {
            let _ = writeln!(
                self.out,
                "{}: {} ({}ms)",
                report.case,
                status,
                report.duration.as_millis()
            );
        } else {
            let _ = writeln!(self.out, "{}: {}", report.case, status);
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        if summary.total == 0 {
            return;
        }

        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed));
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed));
        }
        let line = format!(
            "====== {} in {:.2}s ======",
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
        let color = if summary.all_passed() { BOLD_GREEN } else { BOLD_RED };
        let line = self.paint(color, &line);
        let _ = writeln!(self.err, "{}", line);
    }
}
