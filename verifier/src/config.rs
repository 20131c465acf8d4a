use directory::DirectoryConfig;
use serde::{Deserialize, Serialize};

/// Everything the verifier needs to locate and query the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Container name the runtime lists for the directory server
    pub service_name: String,
    pub people_rdn: String,
    pub groups_rdn: String,
    pub directory: DirectoryConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            service_name: "openldap".to_string(),
            people_rdn: "ou=people".to_string(),
            groups_rdn: "ou=groups".to_string(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl VerifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn with_directory(mut self, directory: DirectoryConfig) -> Self {
        self.directory = directory;
        self
    }

    pub fn people_dn(&self) -> String {
        self.directory.branch_dn(&self.people_rdn)
    }

    pub fn groups_dn(&self) -> String {
        self.directory.branch_dn(&self.groups_rdn)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.service_name.trim().is_empty() {
            return Err("Service name cannot be empty".to_string());
        }

        for rdn in [&self.people_rdn, &self.groups_rdn] {
            if !rdn.contains('=') {
                return Err(format!("'{}' is not a relative distinguished name", rdn));
            }
        }

        self.directory.validate()
    }
}
