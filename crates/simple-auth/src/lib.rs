//! Authentication for Simple Service
//!
//! Basic credential extraction, user DN resolution, LDAP bind delegation and
//! the gate that combines them into a verdict.

pub mod basic;
pub mod gate;
pub mod ldap;

pub use basic::{challenge, extract_credentials, parse_basic_authorization};
pub use gate::AuthGate;
pub use ldap::{DirectoryClient, DnResolver, LdapClient, LdapConfig};
