use directory::Launcher;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Container runtimes whose CLI can host the directory service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    /// Podman container runtime
    Podman,
    /// Docker container runtime
    Docker,
}

impl ContainerRuntime {
    /// Get the command name for this runtime
    pub fn command(&self) -> &'static str {
        match self {
            ContainerRuntime::Podman => "podman",
            ContainerRuntime::Docker => "docker",
        }
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Detection candidates, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeCandidate {
    /// Podman first (rootless containers)
    Podman,
    /// Docker engine
    Docker,
    /// Colima VM, which exposes the Docker CLI interface
    Colima,
}

impl RuntimeCandidate {
    pub const PREFERENCE: [RuntimeCandidate; 3] = [
        RuntimeCandidate::Podman,
        RuntimeCandidate::Docker,
        RuntimeCandidate::Colima,
    ];

    /// Binary whose presence marks the candidate as installed
    pub fn binary(&self) -> &'static str {
        match self {
            RuntimeCandidate::Podman => "podman",
            RuntimeCandidate::Docker => "docker",
            RuntimeCandidate::Colima => "colima",
        }
    }

    /// Runtime whose CLI lists and execs into the containers
    pub fn runtime(&self) -> ContainerRuntime {
        match self {
            RuntimeCandidate::Podman => ContainerRuntime::Podman,
            RuntimeCandidate::Docker | RuntimeCandidate::Colima => ContainerRuntime::Docker,
        }
    }
}

#[derive(Error, Debug)]
pub enum ContainerError {
    /// None of the candidate runtimes is running the service
    #[error("No container runtime is running '{service}'. Start the directory container with podman or docker first.")]
    NoRuntimeFound { service: String },

    /// Command execution failed
    #[error("Command execution failed: {command}: {reason}")]
    CommandFailed { command: String, reason: String },
}

/// Answers the two questions the locator asks of each candidate.
pub trait ProcessLister {
    /// Whether `binary --version` runs successfully
    fn is_installed(&self, binary: &str) -> bool;

    /// Names of the containers currently running under `runtime`
    fn running_containers(
        &self,
        runtime: ContainerRuntime,
    ) -> Result<Vec<String>, ContainerError>;
}

/// [`ProcessLister`] backed by the real runtime CLIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessLister;

impl ProcessLister for SystemProcessLister {
    fn is_installed(&self, binary: &str) -> bool {
        Command::new(binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    fn running_containers(
        &self,
        runtime: ContainerRuntime,
    ) -> Result<Vec<String>, ContainerError> {
        let output = Command::new(runtime.command())
            .args(["ps", "--format", "{{.Names}}"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ContainerError::CommandFailed {
                command: format!("{} ps", runtime.command()),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ContainerError::CommandFailed {
                command: format!("{} ps", runtime.command()),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }
}

/// The runtime hosting the directory service, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    backend: ContainerRuntime,
    candidate: RuntimeCandidate,
    service_name: String,
}

impl ExecutionContext {
    pub fn backend(&self) -> ContainerRuntime {
        self.backend
    }

    pub fn candidate(&self) -> RuntimeCandidate {
        self.candidate
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Runs client commands inside the service container
    pub fn exec_launcher(&self) -> Launcher {
        Launcher::ContainerExec {
            runtime: self.backend.command().to_string(),
            container: self.service_name.clone(),
        }
    }
}

/// Find the first candidate that is installed and lists `service_name` as
/// running. Later candidates are not consulted once one matches.
pub fn resolve(
    lister: &dyn ProcessLister,
    service_name: &str,
) -> Result<ExecutionContext, ContainerError> {
    for candidate in RuntimeCandidate::PREFERENCE {
        if !lister.is_installed(candidate.binary()) {
            debug!("{} not installed", candidate.binary());
            continue;
        }

        let runtime = candidate.runtime();
        match lister.running_containers(runtime) {
            Ok(names) if names.iter().any(|name| name == service_name) => {
                info!(
                    "Found '{}' running under {} (via {})",
                    service_name,
                    runtime,
                    candidate.binary()
                );
                return Ok(ExecutionContext {
                    backend: runtime,
                    candidate,
                    service_name: service_name.to_string(),
                });
            }
            Ok(_) => debug!("'{}' not running under {}", service_name, candidate.binary()),
            Err(e) => debug!("Could not list containers for {}: {}", candidate.binary(), e),
        }
    }

    Err(ContainerError::NoRuntimeFound {
        service: service_name.to_string(),
    })
}
