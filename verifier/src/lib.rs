pub mod cli;
pub mod commands;
pub mod config;
pub mod container;
pub mod fixtures;
pub mod interactive;
pub mod probe;
pub mod report;

pub use config::VerifierConfig;
pub use container::{
    resolve, ContainerError, ContainerRuntime, ExecutionContext, ProcessLister, RuntimeCandidate,
    SystemProcessLister,
};
pub use fixtures::{Credential, DirectoryEntryExpectation, Fixtures, GroupExpectation};
pub use interactive::{QueryError, QueryParameters};
pub use probe::{
    standard_plan, Check, CountKind, ProbeCategory, ProbeOutcome, ProbeResult, ProbeRunner,
    ProbeSpec,
};
pub use report::{Presenter, RunSummary};
