//! Individual conformance checks against the running directory.
//!
//! Every probe is one bind+search through a [`DirectoryClient`], classified
//! from the client's exit status and its `attribute: value` output lines.
//! A probe never fails the run: problems become a [`ProbeOutcome`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use directory::LdapSearchClient;
//! use std::sync::Arc;
//! use verifier::container::{resolve, SystemProcessLister};
//! use verifier::probe::ProbeRunner;
//! use verifier::VerifierConfig;
//!
//! # async fn example() {
//! let config = VerifierConfig::default();
//! let context = resolve(&SystemProcessLister, &config.service_name).ok();
//! let mut client = LdapSearchClient::new(&config.directory);
//! if let Some(ctx) = &context {
//!     client = client.with_launcher(ctx.exec_launcher());
//! }
//!
//! let runner = ProbeRunner::new(context, Arc::new(client), config);
//! let (secure, plaintext) = runner.tls_enforcement().await;
//! println!("{:?} / {:?}", secure.outcome, plaintext.outcome);
//! # }
//! ```

use crate::config::VerifierConfig;
use crate::container::ExecutionContext;
use crate::fixtures::{Credential, DirectoryEntryExpectation, Fixtures, GroupExpectation};
use directory::{DirectoryClient, SearchOutput, SearchRequest, SearchScope};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeCategory {
    Connectivity,
    Tls,
    Data,
    Authentication,
}

impl ProbeCategory {
    pub fn title(&self) -> &'static str {
        match self {
            ProbeCategory::Connectivity => "Connectivity",
            ProbeCategory::Tls => "TLS enforcement",
            ProbeCategory::Data => "Data import",
            ProbeCategory::Authentication => "Authentication",
        }
    }
}

/// A fixed, named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub name: String,
    pub category: ProbeCategory,
    pub search_base_dn: String,
    pub scope: SearchScope,
    pub filter_expression: String,
    /// Empty means every attribute; matches are then counted on `dn:` lines.
    pub requested_attributes: Vec<String>,
    pub expected_minimum_matches: usize,
}

impl ProbeSpec {
    pub fn new(
        name: impl Into<String>,
        category: ProbeCategory,
        search_base_dn: impl Into<String>,
        filter_expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            search_base_dn: search_base_dn.into(),
            scope: SearchScope::Sub,
            filter_expression: filter_expression.into(),
            requested_attributes: Vec::new(),
            expected_minimum_matches: 1,
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_minimum_matches(mut self, minimum: usize) -> Self {
        self.expected_minimum_matches = minimum;
        self
    }

    /// Lines in `output` carrying one of the requested attributes.
    pub fn count_matches(&self, output: &SearchOutput) -> usize {
        if self.requested_attributes.is_empty() {
            return output.count_attribute_lines("dn");
        }
        self.requested_attributes
            .iter()
            .map(|attribute| output.count_attribute_lines(attribute))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    Pass,
    /// The plaintext endpoint refused the bind, as it should
    Blocked,
    Fail,
    /// The plaintext endpoint accepted credentials
    SecurityRegression,
    /// No runtime was found hosting the service
    Skipped,
}

impl ProbeOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, ProbeOutcome::Pass | ProbeOutcome::Blocked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: ProbeSpec,
    pub outcome: ProbeOutcome,
    pub match_count: Option<usize>,
    pub raw_output: Option<String>,
    pub detail: Option<String>,
}

impl ProbeResult {
    fn skipped(probe: ProbeSpec) -> Self {
        Self {
            probe,
            outcome: ProbeOutcome::Skipped,
            match_count: None,
            raw_output: None,
            detail: Some("directory service is not running".to_string()),
        }
    }

    fn from_output(
        probe: ProbeSpec,
        output: &SearchOutput,
        outcome: ProbeOutcome,
        detail: Option<String>,
    ) -> Self {
        let match_count = Some(probe.count_matches(output));
        Self {
            probe,
            outcome,
            match_count,
            raw_output: Some(output.stdout.clone()),
            detail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountKind {
    OrganizationalUnits,
    Users,
    Groups,
}

/// One step of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Connectivity,
    SecureEndpoint,
    PlaintextEndpoint,
    Count(CountKind),
    Entry(DirectoryEntryExpectation),
    Group(GroupExpectation),
    Authentication(Credential),
}

/// The fixed order of the `test` command.
pub fn standard_plan(config: &VerifierConfig, fixtures: &Fixtures) -> Vec<Check> {
    let mut plan = vec![
        Check::Connectivity,
        Check::SecureEndpoint,
        Check::PlaintextEndpoint,
        Check::Count(CountKind::OrganizationalUnits),
        Check::Count(CountKind::Users),
        Check::Count(CountKind::Groups),
    ];
    plan.extend(fixtures.people.iter().cloned().map(Check::Entry));
    plan.extend(fixtures.groups.iter().cloned().map(Check::Group));
    plan.extend(
        fixtures
            .credentials(config)
            .into_iter()
            .map(Check::Authentication),
    );
    plan
}

pub struct ProbeRunner {
    context: Option<ExecutionContext>,
    client: Arc<dyn DirectoryClient>,
    config: VerifierConfig,
}

impl ProbeRunner {
    pub fn new(
        context: Option<ExecutionContext>,
        client: Arc<dyn DirectoryClient>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            context,
            client,
            config,
        }
    }

    pub fn context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }

    /// Admin bind over the secure endpoint; Pass when the client exits 0
    /// and at least `expected_minimum_matches` attribute lines come back.
    pub async fn run_probe(&self, spec: &ProbeSpec) -> ProbeResult {
        let request = self.admin_request(spec);
        self.execute(spec.clone(), request, |spec, output| {
            let count = spec.count_matches(output);
            if !output.success() {
                (ProbeOutcome::Fail, Some(output.failure_summary()))
            } else if count < spec.expected_minimum_matches {
                (
                    ProbeOutcome::Fail,
                    Some(format!(
                        "expected at least {} matching line(s), found {}",
                        spec.expected_minimum_matches, count
                    )),
                )
            } else {
                (ProbeOutcome::Pass, None)
            }
        })
        .await
    }

    pub async fn connectivity(&self) -> ProbeResult {
        let spec = ProbeSpec::new(
            "Base entry reachable over LDAPS",
            ProbeCategory::Connectivity,
            self.config.directory.base_dn.clone(),
            "(objectClass=*)",
        )
        .with_scope(SearchScope::Base)
        .with_attributes(["dn"]);
        self.run_probe(&spec).await
    }

    pub async fn secure_endpoint(&self) -> ProbeResult {
        let spec = ProbeSpec::new(
            format!("Admin bind on {}", self.config.directory.secure_uri),
            ProbeCategory::Tls,
            self.config.directory.base_dn.clone(),
            "(objectClass=*)",
        )
        .with_scope(SearchScope::Base)
        .with_attributes(["dn"]);
        self.run_probe(&spec).await
    }

    /// Same bind as [`Self::secure_endpoint`] over the plaintext URI. A refusal is
    /// `Blocked`; acceptance is a `SecurityRegression`.
    pub async fn plaintext_endpoint(&self) -> ProbeResult {
        let directory = &self.config.directory;
        let spec = ProbeSpec::new(
            format!("Plaintext bind on {} refused", directory.plaintext_uri),
            ProbeCategory::Tls,
            directory.base_dn.clone(),
            "(objectClass=*)",
        )
        .with_scope(SearchScope::Base)
        .with_attributes(["dn"]);
        let request = self
            .admin_request(&spec)
            .with_uri(directory.plaintext_uri.clone());
        let uri = directory.plaintext_uri.clone();

        self.execute(spec, request, move |_, output| {
            if output.success() {
                (
                    ProbeOutcome::SecurityRegression,
                    Some(format!("{} accepted the admin credentials", uri)),
                )
            } else {
                (ProbeOutcome::Blocked, Some(output.failure_summary()))
            }
        })
        .await
    }

    pub async fn tls_enforcement(&self) -> (ProbeResult, ProbeResult) {
        let secure = self.secure_endpoint().await;
        let plaintext = self.plaintext_endpoint().await;
        (secure, plaintext)
    }

    /// Exact `cn: <expected>` line for the entry's uid.
    pub async fn entry_exists(&self, expectation: &DirectoryEntryExpectation) -> ProbeResult {
        let spec = ProbeSpec::new(
            format!("Entry {}", expectation.username),
            ProbeCategory::Data,
            self.config.people_dn(),
            format!("(uid={})", expectation.username),
        )
        .with_attributes(["cn"]);
        self.expect_common_name(spec, expectation.expected_common_name.clone())
            .await
    }

    pub async fn group_exists(&self, group: &GroupExpectation) -> ProbeResult {
        let spec = ProbeSpec::new(
            format!("Group {}", group.name),
            ProbeCategory::Data,
            self.config.groups_dn(),
            format!("(cn={})", group.name),
        )
        .with_attributes(["cn"]);
        self.expect_common_name(spec, group.name.clone()).await
    }

    /// Binds as the credential itself; the search content is irrelevant.
    pub async fn authenticate(&self, credential: &Credential) -> ProbeResult {
        let spec = ProbeSpec::new(
            format!("Bind as {}", credential.label),
            ProbeCategory::Authentication,
            credential.bind_dn.clone(),
            "(objectClass=*)",
        )
        .with_scope(SearchScope::Base)
        .with_attributes(["dn"])
        .with_minimum_matches(0);
        let request = self
            .admin_request(&spec)
            .with_bind(credential.bind_dn.clone(), credential.password.clone());

        self.execute(spec, request, |_, output| {
            if output.success() {
                (ProbeOutcome::Pass, None)
            } else {
                (ProbeOutcome::Fail, Some(output.failure_summary()))
            }
        })
        .await
    }

    /// Non-empty population only; exact counts vary between runs.
    pub async fn count(&self, kind: CountKind) -> ProbeResult {
        let (name, base, filter) = match kind {
            CountKind::OrganizationalUnits => (
                "Organizational units present",
                self.config.directory.base_dn.clone(),
                "(objectClass=organizationalUnit)",
            ),
            CountKind::Users => (
                "Users present",
                self.config.people_dn(),
                "(objectClass=inetOrgPerson)",
            ),
            CountKind::Groups => (
                "Groups present",
                self.config.groups_dn(),
                "(objectClass=groupOfNames)",
            ),
        };
        let spec = ProbeSpec::new(name, ProbeCategory::Data, base, filter)
            .with_attributes(["dn"])
            .with_minimum_matches(1);
        self.run_probe(&spec).await
    }

    pub async fn run_check(&self, check: &Check) -> ProbeResult {
        match check {
            Check::Connectivity => self.connectivity().await,
            Check::SecureEndpoint => self.secure_endpoint().await,
            Check::PlaintextEndpoint => self.plaintext_endpoint().await,
            Check::Count(kind) => self.count(*kind).await,
            Check::Entry(expectation) => self.entry_exists(expectation).await,
            Check::Group(group) => self.group_exists(group).await,
            Check::Authentication(credential) => self.authenticate(credential).await,
        }
    }

    /// Runs `plan` lazily, one check per item pulled from the stream.
    pub fn stream(&self, plan: Vec<Check>) -> impl Stream<Item = ProbeResult> + '_ {
        stream::iter(plan).then(move |check| async move { self.run_check(&check).await })
    }

    async fn expect_common_name(&self, spec: ProbeSpec, expected: String) -> ProbeResult {
        let request = self.admin_request(&spec);
        self.execute(spec, request, move |_, output| {
            if !output.success() {
                (ProbeOutcome::Fail, Some(output.failure_summary()))
            } else if output.contains_value("cn", &expected) {
                (ProbeOutcome::Pass, None)
            } else {
                let others = output.count_attribute_lines("cn");
                (
                    ProbeOutcome::Fail,
                    Some(format!(
                        "no 'cn: {}' line ({} other cn value(s))",
                        expected, others
                    )),
                )
            }
        })
        .await
    }

    fn admin_request(&self, spec: &ProbeSpec) -> SearchRequest {
        SearchRequest::admin(&self.config.directory, spec.search_base_dn.clone())
            .with_scope(spec.scope)
            .with_filter(spec.filter_expression.clone())
            .with_attributes(spec.requested_attributes.iter().cloned())
    }

    async fn execute<F>(
        &self,
        spec: ProbeSpec,
        request: SearchRequest,
        classify: F,
    ) -> ProbeResult
    where
        F: FnOnce(&ProbeSpec, &SearchOutput) -> (ProbeOutcome, Option<String>),
    {
        if self.context.is_none() {
            debug!("Skipping '{}': no execution context", spec.name);
            return ProbeResult::skipped(spec);
        }

        match self.client.search(&request).await {
            Ok(output) => {
                let (outcome, detail) = classify(&spec, &output);
                debug!("'{}' -> {:?}", spec.name, outcome);
                ProbeResult::from_output(spec, &output, outcome, detail)
            }
            Err(e) => {
                warn!(
                    "'{}' could not run {}: {}",
                    spec.name,
                    self.client.client_name(),
                    e
                );
                ProbeResult {
                    probe: spec,
                    outcome: ProbeOutcome::Fail,
                    match_count: None,
                    raw_output: None,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}
