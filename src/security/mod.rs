//! Security: the ACL (Access Control List) authorization system.

pub mod acl;

pub use acl::{AclContext, AclError, AclUser};
