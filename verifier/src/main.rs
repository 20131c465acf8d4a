use directory::LdapSearchClient;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn};
use verifier::cli::{self, Commands, Invocation};
use verifier::container::{resolve, SystemProcessLister};
use verifier::{commands, Fixtures, ProbeRunner, VerifierConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let command = match cli::parse(std::env::args_os()) {
        Invocation::Run(command) => command,
        Invocation::Display(info) => info.exit(),
        Invocation::Usage => {
            eprintln!("{}", cli::usage());
            return ExitCode::from(1);
        }
    };

    let config = VerifierConfig::default();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::from(1);
    }

    let context = match resolve(&SystemProcessLister, &config.service_name) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    let mut client = match LdapSearchClient::try_new(&config.directory) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };
    if let Some(ctx) = &context {
        client = client.with_launcher(ctx.exec_launcher());
    }

    match command {
        Commands::Test => {
            let runner = ProbeRunner::new(context, Arc::new(client), config.clone());
            match commands::test(&runner, &config, &Fixtures::default(), io::stdout()).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Could not write report: {}", e);
                    ExitCode::from(1)
                }
            }
        }
        Commands::Search => {
            let code = commands::search(
                context.as_ref(),
                &client,
                &config,
                &mut io::stdin().lock(),
                &mut io::stdout(),
                &mut io::stderr(),
            )
            .await;
            ExitCode::from(code)
        }
    }
}
