//! What the directory is expected to contain once the bootstrap LDIF has
//! been imported.

use crate::config::VerifierConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntryExpectation {
    pub username: String,
    pub expected_common_name: String,
    pub expected_password_for_auth_test: Option<String>,
}

impl DirectoryEntryExpectation {
    pub fn new(username: impl Into<String>, common_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            expected_common_name: common_name.into(),
            expected_password_for_auth_test: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.expected_password_for_auth_test = Some(password.into());
        self
    }

    pub fn dn(&self, config: &VerifierConfig) -> String {
        format!("uid={},{}", self.username, config.people_dn())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupExpectation {
    pub name: String,
}

impl GroupExpectation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A bind identity exercised by an authentication probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub label: String,
    pub bind_dn: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixtures {
    pub people: Vec<DirectoryEntryExpectation>,
    pub groups: Vec<GroupExpectation>,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            people: vec![
                DirectoryEntryExpectation::new("john.doe", "John Doe").with_password("password123"),
                DirectoryEntryExpectation::new("jane.smith", "Jane Smith")
                    .with_password("password123"),
                DirectoryEntryExpectation::new("bob.wilson", "Bob Wilson"),
            ],
            groups: vec![
                GroupExpectation::new("developers"),
                GroupExpectation::new("administrators"),
            ],
        }
    }
}

impl Fixtures {
    /// The admin bind first, then every person that carries a password.
    pub fn credentials(&self, config: &VerifierConfig) -> Vec<Credential> {
        let admin = Credential {
            label: "admin".to_string(),
            bind_dn: config.directory.admin_dn.clone(),
            password: config.directory.admin_password.clone(),
        };

        std::iter::once(admin)
            .chain(self.people.iter().filter_map(|person| {
                person
                    .expected_password_for_auth_test
                    .as_ref()
                    .map(|password| Credential {
                        label: person.username.clone(),
                        bind_dn: person.dn(config),
                        password: password.clone(),
                    })
            }))
            .collect()
    }
}
