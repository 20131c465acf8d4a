#![allow(dead_code)]

use async_trait::async_trait;
use directory::{DirectoryClient, DirectoryError, DirectoryResult, SearchOutput, SearchRequest};
use std::sync::{Arc, Mutex};
use verifier::{resolve, ContainerError, ContainerRuntime, ExecutionContext, ProcessLister};

type Handler = dyn Fn(&SearchRequest) -> DirectoryResult<SearchOutput> + Send + Sync;

/// Answers each search with whatever the handler returns and records the
/// requests it saw.
pub struct ScriptedClient {
    handler: Box<Handler>,
    calls: Mutex<Vec<SearchRequest>>,
}

impl ScriptedClient {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&SearchRequest) -> DirectoryResult<SearchOutput> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every search exits with `code` and prints `stdout`.
    pub fn fixed(code: i32, stdout: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(SearchOutput::new(code, stdout)))
    }

    pub fn unlaunchable() -> Arc<Self> {
        Self::new(|_| {
            Err(DirectoryError::Launch {
                program: "podman".to_string(),
                reason: "No such file or directory (os error 2)".to_string(),
            })
        })
    }

    pub fn calls(&self) -> Vec<SearchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryClient for ScriptedClient {
    async fn search(&self, request: &SearchRequest) -> DirectoryResult<SearchOutput> {
        self.calls.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}

pub struct StaticLister {
    pub installed: Vec<&'static str>,
    pub podman: Option<Vec<&'static str>>,
    pub docker: Option<Vec<&'static str>>,
    pub listed: Mutex<Vec<ContainerRuntime>>,
}

impl StaticLister {
    pub fn new(installed: Vec<&'static str>) -> Self {
        Self {
            installed,
            podman: None,
            docker: None,
            listed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_podman(mut self, names: Vec<&'static str>) -> Self {
        self.podman = Some(names);
        self
    }

    pub fn with_docker(mut self, names: Vec<&'static str>) -> Self {
        self.docker = Some(names);
        self
    }

    pub fn listed(&self) -> Vec<ContainerRuntime> {
        self.listed.lock().unwrap().clone()
    }
}

impl ProcessLister for StaticLister {
    fn is_installed(&self, binary: &str) -> bool {
        self.installed.iter().any(|b| *b == binary)
    }

    fn running_containers(
        &self,
        runtime: ContainerRuntime,
    ) -> Result<Vec<String>, ContainerError> {
        self.listed.lock().unwrap().push(runtime);
        let names = match runtime {
            ContainerRuntime::Podman => &self.podman,
            ContainerRuntime::Docker => &self.docker,
        };
        names
            .as_ref()
            .map(|n| n.iter().map(|s| s.to_string()).collect())
            .ok_or_else(|| ContainerError::CommandFailed {
                command: format!("{} ps", runtime.command()),
                reason: "cannot connect".to_string(),
            })
    }
}

/// A context as if podman were running `openldap`.
pub fn podman_context() -> ExecutionContext {
    let lister = StaticLister::new(vec!["podman"]).with_podman(vec!["openldap"]);
    resolve(&lister, "openldap").expect("podman context")
}
