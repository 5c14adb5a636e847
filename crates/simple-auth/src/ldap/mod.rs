//! LDAP directory access
//!
//! Provides:
//! - User DN resolution from a configured pattern
//! - Simple bind against OpenLDAP, 389 Directory Server or Active Directory
//! - TLS/STARTTLS support

mod client;
mod types;

pub use client::{DirectoryClient, LdapClient, BIND_DURATION_SECONDS};
pub use types::*;
