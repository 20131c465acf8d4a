use crate::container::ExecutionContext;
use crate::probe::{ProbeCategory, ProbeOutcome, ProbeResult};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

const RESET: &str = "\x1b[0m";
const GREY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";

/// Check if color output is enabled
pub fn use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

impl ProbeOutcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            ProbeOutcome::Pass | ProbeOutcome::Blocked => "✓",
            ProbeOutcome::Fail => "✗",
            ProbeOutcome::SecurityRegression => "⚠",
            ProbeOutcome::Skipped => "○",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ProbeOutcome::Pass | ProbeOutcome::Blocked => "\x1b[32m",
            ProbeOutcome::Fail => "\x1b[31m",
            ProbeOutcome::SecurityRegression => "\x1b[33m",
            ProbeOutcome::Skipped => GREY,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Pass => "PASS",
            ProbeOutcome::Blocked => "BLOCKED",
            ProbeOutcome::Fail => "FAIL",
            ProbeOutcome::SecurityRegression => "SECURITY REGRESSION",
            ProbeOutcome::Skipped => "SKIPPED",
        }
    }
}

/// Tally of one run. Informational only; it never drives the exit code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub regressions: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            regressions: 0,
            skipped: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.regressions + self.skipped
    }

    fn record(&mut self, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::Pass | ProbeOutcome::Blocked => self.passed += 1,
            ProbeOutcome::Fail => self.failed += 1,
            ProbeOutcome::SecurityRegression => self.regressions += 1,
            ProbeOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Streams probe results to a terminal, one line each.
pub struct Presenter<W: Write> {
    out: W,
    color: bool,
    category: Option<ProbeCategory>,
    summary: RunSummary,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            color: use_color(),
            category: None,
            summary: RunSummary::new(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn header(&mut self, context: Option<&ExecutionContext>, service: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "LDAP verification")?;
        writeln!(self.out, "{}", "═".repeat(55))?;
        match context {
            Some(ctx) => writeln!(
                self.out,
                "  Service '{}' via {} ({})",
                ctx.service_name(),
                ctx.backend(),
                self.summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => {
                let line = format!(
                    "No container runtime is running '{}'; every check will be skipped",
                    service
                );
                self.styled(ProbeOutcome::SecurityRegression.color(), "⚠", &line)
            }
        }
    }

    /// Writes one result line as soon as it is produced.
    pub fn record(&mut self, result: &ProbeResult) -> io::Result<()> {
        if self.category != Some(result.probe.category) {
            self.category = Some(result.probe.category);
            writeln!(self.out)?;
            if self.color {
                writeln!(self.out, "{BOLD}{}{RESET}", result.probe.category.title())?;
            } else {
                writeln!(self.out, "{}", result.probe.category.title())?;
            }
        }

        let outcome = result.outcome;
        let mut line = match outcome {
            ProbeOutcome::SecurityRegression => {
                format!("{}: {}", outcome.label(), result.probe.name)
            }
            ProbeOutcome::Pass | ProbeOutcome::Fail => result.probe.name.clone(),
            ProbeOutcome::Blocked | ProbeOutcome::Skipped => {
                format!("{} ({})", result.probe.name, outcome.label().to_lowercase())
            }
        };
        if let (ProbeOutcome::Pass, Some(count)) = (outcome, result.match_count) {
            if count > 1 {
                line.push_str(&format!(" [{} matches]", count));
            }
        }
        self.styled(outcome.color(), outcome.symbol(), &line)?;

        if outcome != ProbeOutcome::Pass {
            if let Some(detail) = &result.detail {
                if self.color {
                    writeln!(self.out, "      └─ {GREY}{detail}{RESET}")?;
                } else {
                    writeln!(self.out, "      └─ {detail}")?;
                }
            }
        }

        self.summary.record(outcome);
        Ok(())
    }

    /// Consumes `results` in order, printing each as it arrives.
    pub async fn present<S>(&mut self, results: S) -> io::Result<RunSummary>
    where
        S: Stream<Item = ProbeResult>,
    {
        let mut results = std::pin::pin!(results);
        while let Some(result) = results.next().await {
            self.record(&result)?;
            self.out.flush()?;
        }
        self.finish()
    }

    pub fn finish(&mut self) -> io::Result<RunSummary> {
        self.summary.finished_at = Some(Utc::now());
        let s = &self.summary;

        writeln!(self.out)?;
        writeln!(self.out, "{}", "═".repeat(55))?;
        writeln!(
            self.out,
            "  {} passed, {} failed, {} security regression(s), {} skipped",
            s.passed, s.failed, s.regressions, s.skipped
        )?;
        writeln!(self.out, "Test run completed")?;
        self.out.flush()?;

        Ok(self.summary.clone())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&mut self, color: &str, symbol: &str, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "  {color}{symbol}{RESET} {text}")
        } else {
            writeln!(self.out, "  {symbol} {text}")
        }
    }
}
