use crate::config::DirectoryConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Base,
    One,
    Sub,
}

impl SearchScope {
    /// Value accepted by `ldapsearch -s`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            SearchScope::Base => "base",
            SearchScope::One => "one",
            SearchScope::Sub => "sub",
        }
    }
}

/// One bind followed by one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub uri: String,
    pub bind_dn: String,
    pub bind_password: String,
    pub base_dn: String,
    pub scope: SearchScope,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Admin bind over the secure endpoint, subtree scope, every attribute.
    pub fn admin(config: &DirectoryConfig, base_dn: impl Into<String>) -> Self {
        Self {
            uri: config.secure_uri.clone(),
            bind_dn: config.admin_dn.clone(),
            bind_password: config.admin_password.clone(),
            base_dn: base_dn.into(),
            scope: SearchScope::Sub,
            filter: "(objectClass=*)".to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_bind(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = dn.into();
        self.bind_password = password.into();
        self
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// Text and exit status returned by the search client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl SearchOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Lines of the form `attribute: value` (or `attribute:: base64`) for the
    /// given attribute. Attribute names compare case-insensitively.
    pub fn count_attribute_lines(&self, attribute: &str) -> usize {
        self.stdout
            .lines()
            .filter(|line| line_has_attribute(line, attribute))
            .count()
    }

    /// Whether some line equals `attribute: value` exactly, ignoring trailing
    /// whitespace. `cn: John Doe Jr.` does not contain `cn: John Doe`.
    pub fn contains_value(&self, attribute: &str, value: &str) -> bool {
        self.stdout.lines().any(|line| {
            line_has_attribute(line, attribute)
                && line
                    .split_once(':')
                    .map(|(_, rest)| rest.trim_start_matches(' ').trim_end() == value)
                    .unwrap_or(false)
        })
    }

    /// Exit status plus the first stderr line, for reporting.
    pub fn failure_summary(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        match self.stderr.lines().map(str::trim).find(|l| !l.is_empty()) {
            Some(line) => format!("{}: {}", status, line),
            None => status,
        }
    }
}

fn line_has_attribute(line: &str, attribute: &str) -> bool {
    match line.split_once(':') {
        Some((key, _)) => !key.is_empty() && key.eq_ignore_ascii_case(attribute),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEOPLE: &str = "dn: uid=john.doe,ou=people,dc=example,dc=org\n\
                          cn: John Doe\n\
                          \n\
                          dn: uid=jane.smith,ou=people,dc=example,dc=org\n\
                          cn: Jane Smith\n";

    #[test]
    fn test_admin_request_defaults() {
        let config = DirectoryConfig::default();
        let request = SearchRequest::admin(&config, "ou=people,dc=example,dc=org");
        assert_eq!(request.uri, "ldaps://localhost:636");
        assert_eq!(request.bind_dn, "cn=admin,dc=example,dc=org");
        assert_eq!(request.scope, SearchScope::Sub);
        assert_eq!(request.filter, "(objectClass=*)");
        assert!(request.attributes.is_empty());
    }

    #[test]
    fn test_request_builder() {
        let config = DirectoryConfig::default();
        let request = SearchRequest::admin(&config, "dc=example,dc=org")
            .with_scope(SearchScope::Base)
            .with_filter("(uid=john.doe)")
            .with_attributes(["cn", "mail"]);
        assert_eq!(request.scope.as_arg(), "base");
        assert_eq!(request.filter, "(uid=john.doe)");
        assert_eq!(request.attributes, vec!["cn".to_string(), "mail".to_string()]);
    }

    #[test]
    fn test_count_attribute_lines() {
        let output = SearchOutput::new(0, PEOPLE);
        assert_eq!(output.count_attribute_lines("dn"), 2);
        assert_eq!(output.count_attribute_lines("cn"), 2);
        assert_eq!(output.count_attribute_lines("CN"), 2);
        assert_eq!(output.count_attribute_lines("mail"), 0);
    }

    #[test]
    fn test_count_ignores_attribute_name_prefixes() {
        let output = SearchOutput::new(0, "cnx: nope\ncn: yes\n");
        assert_eq!(output.count_attribute_lines("cn"), 1);
    }

    #[test]
    fn test_contains_value_is_exact() {
        let output = SearchOutput::new(0, PEOPLE);
        assert!(output.contains_value("cn", "John Doe"));
        assert!(!output.contains_value("cn", "John"));

        let junior = SearchOutput::new(0, "cn: John Doe Jr.\n");
        assert!(!junior.contains_value("cn", "John Doe"));
    }

    #[test]
    fn test_failure_summary() {
        let output = SearchOutput::new(255, "")
            .with_stderr("ldap_sasl_bind(SIMPLE): Can't contact LDAP server (-1)\n");
        assert_eq!(
            output.failure_summary(),
            "exit status 255: ldap_sasl_bind(SIMPLE): Can't contact LDAP server (-1)"
        );
        assert!(!output.success());

        let signalled = SearchOutput::default();
        assert_eq!(signalled.failure_summary(), "terminated by signal");
    }
}
