//! `ldapsearch`-backed [`DirectoryClient`].
//!
//! The OpenLDAP command-line client is run either on the host or inside the
//! server container through the container runtime's `exec` subcommand. Its
//! `-LLL` output is plain `attribute: value` lines separated by blank lines,
//! which is all the classification in [`SearchOutput`] needs.

use crate::config::DirectoryConfig;
use crate::provider::{DirectoryClient, DirectoryError, DirectoryResult};
use crate::types::{SearchOutput, SearchRequest};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const TLS_REQCERT_VAR: &str = "LDAPTLS_REQCERT";
const TLS_CACERT_VAR: &str = "LDAPTLS_CACERT";

/// Where the client process is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
    /// Run the client binary directly on this machine.
    Host,
    /// `<runtime> exec <container> ldapsearch ...`
    ContainerExec { runtime: String, container: String },
}

#[derive(Debug, Clone)]
pub struct LdapSearchClient {
    program: String,
    launcher: Launcher,
    relax_tls_verification: bool,
    ca_cert_path: String,
}

impl LdapSearchClient {
    pub fn new(config: &DirectoryConfig) -> Self {
        Self {
            program: "ldapsearch".to_string(),
            launcher: Launcher::Host,
            relax_tls_verification: config.relax_tls_verification,
            ca_cert_path: config.ca_cert_path.clone(),
        }
    }

    /// Like [`LdapSearchClient::new`], but rejects an unusable configuration.
    pub fn try_new(config: &DirectoryConfig) -> DirectoryResult<Self> {
        config
            .validate()
            .map_err(|message| DirectoryError::InvalidConfig { message })?;
        Ok(Self::new(config))
    }

    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// TLS environment handed to the client process.
    fn tls_env(&self) -> (&'static str, String) {
        if self.relax_tls_verification {
            (TLS_REQCERT_VAR, "never".to_string())
        } else {
            (TLS_CACERT_VAR, self.ca_cert_path.clone())
        }
    }

    /// Executable and argument vector for one request.
    pub fn command_line(&self, request: &SearchRequest) -> (String, Vec<String>) {
        let mut args = Vec::new();

        let executable = match &self.launcher {
            Launcher::Host => self.program.clone(),
            Launcher::ContainerExec { runtime, container } => {
                let (name, value) = self.tls_env();
                args.push("exec".to_string());
                args.push("-e".to_string());
                args.push(format!("{}={}", name, value));
                args.push(container.clone());
                args.push(self.program.clone());
                runtime.clone()
            }
        };

        args.extend(
            [
                "-x",
                "-LLL",
                "-o",
                "ldif-wrap=no",
                "-H",
                request.uri.as_str(),
                "-D",
                request.bind_dn.as_str(),
                "-w",
                request.bind_password.as_str(),
                "-b",
                request.base_dn.as_str(),
                "-s",
                request.scope.as_arg(),
                request.filter.as_str(),
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.extend(request.attributes.iter().cloned());

        (executable, args)
    }

    /// The command line with the bind password masked.
    pub fn display_command(&self, request: &SearchRequest) -> String {
        let (executable, args) = self.command_line(request);
        let mut masked = Vec::with_capacity(args.len() + 1);
        masked.push(executable);
        let mut hide_next = false;
        for arg in args {
            if hide_next {
                masked.push("****".to_string());
                hide_next = false;
            } else {
                hide_next = arg == "-w";
                masked.push(arg);
            }
        }
        masked.join(" ")
    }
}

#[async_trait]
impl DirectoryClient for LdapSearchClient {
    async fn search(&self, request: &SearchRequest) -> DirectoryResult<SearchOutput> {
        let (executable, args) = self.command_line(request);
        debug!("Running {}", self.display_command(request));

        let mut cmd = Command::new(&executable);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if self.launcher == Launcher::Host {
            let (name, value) = self.tls_env();
            cmd.env(name, value);
        }

        let output = cmd.output().await.map_err(|e| DirectoryError::Launch {
            program: executable.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            "{} exited with {:?} ({} bytes of output)",
            executable,
            output.status.code(),
            output.stdout.len()
        );

        Ok(SearchOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn client_name(&self) -> &'static str {
        "ldapsearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchScope;

    fn people_request(config: &DirectoryConfig) -> SearchRequest {
        SearchRequest::admin(config, "ou=people,dc=example,dc=org")
            .with_filter("(uid=john.doe)")
            .with_attributes(["cn"])
    }

    #[test]
    fn test_host_command_line() {
        let config = DirectoryConfig::default();
        let client = LdapSearchClient::new(&config);
        let (exe, args) = client.command_line(&people_request(&config));

        assert_eq!(exe, "ldapsearch");
        assert_eq!(
            args,
            vec![
                "-x",
                "-LLL",
                "-o",
                "ldif-wrap=no",
                "-H",
                "ldaps://localhost:636",
                "-D",
                "cn=admin,dc=example,dc=org",
                "-w",
                "admin",
                "-b",
                "ou=people,dc=example,dc=org",
                "-s",
                "sub",
                "(uid=john.doe)",
                "cn",
            ]
        );
    }

    #[test]
    fn test_container_exec_command_line() {
        let config = DirectoryConfig::default();
        let client = LdapSearchClient::new(&config).with_launcher(Launcher::ContainerExec {
            runtime: "podman".to_string(),
            container: "openldap".to_string(),
        });
        let request =
            SearchRequest::admin(&config, "dc=example,dc=org").with_scope(SearchScope::Base);
        let (exe, args) = client.command_line(&request);

        assert_eq!(exe, "podman");
        assert_eq!(
            &args[..5],
            &["exec", "-e", "LDAPTLS_REQCERT=never", "openldap", "ldapsearch"]
        );
        assert!(args.contains(&"base".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("(objectClass=*)"));
    }

    #[test]
    fn test_container_exec_without_tls_relaxation() {
        let config = DirectoryConfig::default().with_tls_verification(true);
        let client = LdapSearchClient::new(&config).with_launcher(Launcher::ContainerExec {
            runtime: "docker".to_string(),
            container: "openldap".to_string(),
        });
        let (_, args) = client.command_line(&people_request(&config));
        assert_eq!(
            &args[..5],
            &[
                "exec",
                "-e",
                "LDAPTLS_CACERT=/container/service/slapd/assets/certs/ca.crt",
                "openldap",
                "ldapsearch"
            ]
        );
        assert!(!args.iter().any(|arg| arg.contains("LDAPTLS_REQCERT")));
    }

    #[test]
    fn test_tls_env_follows_verification_setting() {
        let relaxed = LdapSearchClient::new(&DirectoryConfig::default());
        assert_eq!(relaxed.tls_env(), ("LDAPTLS_REQCERT", "never".to_string()));

        let config = DirectoryConfig::default().with_tls_verification(true);
        let verifying = LdapSearchClient::new(&config);
        assert_eq!(
            verifying.tls_env(),
            (
                "LDAPTLS_CACERT",
                "/container/service/slapd/assets/certs/ca.crt".to_string()
            )
        );
    }

    #[test]
    fn test_long_values_are_not_folded() {
        let config = DirectoryConfig::default();
        let client = LdapSearchClient::new(&config);
        let (_, args) = client.command_line(&people_request(&config));
        let wrap = args.iter().position(|arg| arg == "-o").unwrap();
        assert_eq!(args[wrap + 1], "ldif-wrap=no");
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let config = DirectoryConfig::default().with_base_dn("");
        let err = LdapSearchClient::try_new(&config).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidConfig { .. }));
        assert!(err.to_string().contains("Base DN cannot be empty"));

        assert!(LdapSearchClient::try_new(&DirectoryConfig::default()).is_ok());
    }

    #[test]
    fn test_display_command_masks_password() {
        let config = DirectoryConfig::default();
        let client = LdapSearchClient::new(&config);
        let shown = client.display_command(&people_request(&config));
        assert!(shown.contains("-w ****"));
        assert!(!shown.contains(" admin "));
        assert!(shown.starts_with("ldapsearch -x -LLL"));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let config = DirectoryConfig::default();
        let client = LdapSearchClient::new(&config).with_program("/nonexistent/ldapsearch");
        let result = client.search(&people_request(&config)).await;
        assert!(matches!(result, Err(DirectoryError::Launch { .. })));
    }
}
