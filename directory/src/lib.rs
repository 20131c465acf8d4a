pub mod config;
pub mod ldapsearch;
pub mod provider;
pub mod types;

pub use config::DirectoryConfig;
pub use ldapsearch::{LdapSearchClient, Launcher};
pub use provider::{DirectoryClient, DirectoryError, DirectoryResult};
pub use types::{SearchOutput, SearchRequest, SearchScope};

pub mod prelude {
    pub use crate::config::*;
    pub use crate::ldapsearch::*;
    pub use crate::provider::*;
    pub use crate::types::*;
}
