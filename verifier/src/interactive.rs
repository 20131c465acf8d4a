//! Operator-driven single query against the directory.

use directory::{DirectoryClient, DirectoryConfig, DirectoryError, SearchRequest, SearchScope};
use std::io::{self, BufRead, Write};
use thiserror::Error;

pub const DEFAULT_FILTER: &str = "(objectClass=*)";

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Directory client error: {0}")]
    Client(#[from] DirectoryError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    pub base_dn: String,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl QueryParameters {
    /// Blank answers fall back to the base DN, `(objectClass=*)` and all
    /// attributes. Attributes may be separated by spaces or commas.
    pub fn from_answers(
        config: &DirectoryConfig,
        base_dn: &str,
        filter: &str,
        attributes: &str,
    ) -> Self {
        let base_dn = match base_dn.trim() {
            "" => config.base_dn.clone(),
            dn => dn.to_string(),
        };
        let filter = match filter.trim() {
            "" => DEFAULT_FILTER.to_string(),
            f => f.to_string(),
        };
        let attributes = attributes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            base_dn,
            filter,
            attributes,
        }
    }

    /// Admin bind over the secure endpoint, subtree scope.
    pub fn to_request(&self, config: &DirectoryConfig) -> SearchRequest {
        SearchRequest::admin(config, self.base_dn.clone())
            .with_scope(SearchScope::Sub)
            .with_filter(self.filter.clone())
            .with_attributes(self.attributes.iter().cloned())
    }
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: &str,
) -> io::Result<String> {
    write!(output, "{} [{}]: ", prompt, default)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Prompts on `output`, reads answers from `input`, then prints the client's
/// stdout to `output` and its stderr to `errors` without modification.
/// Returns the client's exit code (`1` if it was killed by a signal).
pub async fn run<R, W, E>(
    client: &dyn DirectoryClient,
    config: &DirectoryConfig,
    input: &mut R,
    output: &mut W,
    errors: &mut E,
) -> Result<i32, QueryError>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    writeln!(output, "Interactive LDAP search (bound as {})", config.admin_dn)?;
    let base_dn = ask(input, output, "Base DN", &config.base_dn)?;
    let filter = ask(input, output, "Filter", DEFAULT_FILTER)?;
    let attributes = ask(input, output, "Attributes", "all")?;

    let params = QueryParameters::from_answers(config, &base_dn, &filter, &attributes);
    let result = client.search(&params.to_request(config)).await?;

    output.write_all(result.stdout.as_bytes())?;
    output.flush()?;
    errors.write_all(result.stderr.as_bytes())?;
    errors.flush()?;

    Ok(result.exit_code.unwrap_or(1))
}
