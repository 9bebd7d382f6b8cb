#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

pub mod commands;
pub mod config;
pub mod connection;
pub mod glob;
pub mod reply;
pub mod security;

pub use commands::{Category, CommandDescriptor, CommandTable};
pub use config::AclServerConfig;
pub use connection::Connection;
pub use glob::{GlobMatcher, Matcher};
pub use reply::Reply;
pub use security::{AclContext, AclError, AclUser};
