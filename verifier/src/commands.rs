//! Bodies of the `test` and `search` subcommands, returning process exit codes.

use crate::config::VerifierConfig;
use crate::container::ExecutionContext;
use crate::fixtures::Fixtures;
use crate::interactive;
use crate::probe::{standard_plan, ProbeRunner};
use crate::report::{Presenter, RunSummary};
use directory::DirectoryClient;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};

/// Runs every check in order and prints results as they complete. The exit
/// code is 0 whatever the individual outcomes were.
pub async fn test<W: Write>(
    runner: &ProbeRunner,
    config: &VerifierConfig,
    fixtures: &Fixtures,
    out: W,
) -> io::Result<RunSummary> {
    if runner.context().is_none() {
        warn!(
            "'{}' not found under any container runtime, checks will be skipped",
            config.service_name
        );
    }

    let mut presenter = Presenter::new(out);
    presenter.header(runner.context(), &config.service_name)?;

    let plan = standard_plan(config, fixtures);
    let summary = presenter.present(runner.stream(plan)).await?;
    info!(
        "Run finished: {} passed, {} failed, {} regressions, {} skipped",
        summary.passed, summary.failed, summary.regressions, summary.skipped
    );
    Ok(summary)
}

/// Interactive Query Mode. Non-zero only when the client itself fails.
pub async fn search<R, W, E>(
    context: Option<&ExecutionContext>,
    client: &dyn DirectoryClient,
    config: &VerifierConfig,
    input: &mut R,
    output: &mut W,
    errors: &mut E,
) -> u8
where
    R: BufRead,
    W: Write,
    E: Write,
{
    if context.is_none() {
        let _ = writeln!(
            errors,
            "No container runtime is running '{}'; start the directory container first.",
            config.service_name
        );
        return 1;
    }

    match interactive::run(client, &config.directory, input, output, errors).await {
        Ok(0) => 0,
        Ok(code) => u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1),
        Err(e) => {
            error!("Search failed: {}", e);
            let _ = writeln!(errors, "{}", e);
            1
        }
    }
}
