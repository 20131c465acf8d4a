use serde::{Deserialize, Serialize};

/// Connection literals for the development directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub secure_uri: String,
    pub plaintext_uri: String,
    pub admin_dn: String,
    pub admin_password: String,
    pub base_dn: String,
    /// CA bundle mounted into the server container, trusted via
    /// `LDAPTLS_CACERT` when verification is on.
    pub ca_cert_path: String,
    /// Skip peer certificate verification (`LDAPTLS_REQCERT=never`).
    pub relax_tls_verification: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            secure_uri: "ldaps://localhost:636".to_string(),
            plaintext_uri: "ldap://localhost:389".to_string(),
            admin_dn: "cn=admin,dc=example,dc=org".to_string(),
            admin_password: "admin".to_string(),
            base_dn: "dc=example,dc=org".to_string(),
            ca_cert_path: "/container/service/slapd/assets/certs/ca.crt".to_string(),
            relax_tls_verification: true,
        }
    }
}

impl DirectoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secure_uri(mut self, uri: impl Into<String>) -> Self {
        self.secure_uri = uri.into();
        self
    }

    pub fn with_plaintext_uri(mut self, uri: impl Into<String>) -> Self {
        self.plaintext_uri = uri.into();
        self
    }

    pub fn with_admin(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin_dn = dn.into();
        self.admin_password = password.into();
        self
    }

    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = base_dn.into();
        self
    }

    pub fn with_tls_verification(mut self, verify: bool) -> Self {
        self.relax_tls_verification = !verify;
        self
    }

    /// Relative branch such as `ou=people` joined onto the base DN.
    pub fn branch_dn(&self, rdn: &str) -> String {
        format!("{},{}", rdn, self.base_dn)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.secure_uri.starts_with("ldaps://") {
            return Err("Secure URI must start with ldaps://".to_string());
        }

        if !self.plaintext_uri.starts_with("ldap://") {
            return Err("Plaintext URI must start with ldap://".to_string());
        }

        if self.admin_dn.is_empty() {
            return Err("Admin DN cannot be empty".to_string());
        }

        if self.base_dn.is_empty() {
            return Err("Base DN cannot be empty".to_string());
        }

        if !self.admin_dn.ends_with(&self.base_dn) {
            return Err(format!(
                "Admin DN '{}' is not under base DN '{}'",
                self.admin_dn, self.base_dn
            ));
        }

        Ok(())
    }
}
