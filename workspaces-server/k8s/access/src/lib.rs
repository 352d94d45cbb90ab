//! Workspaces Access Layer
//!
//! Serves the per-user view of workspaces on top of the
//! [`ResourceCache`](workspaces_server_k8s_index::ResourceCache).
//!
//! Reads and writes take different paths through this crate:
//!
//! - Reads are answered entirely from the cache. Because the cache holds raw
//!   cluster state, [`AuthorizedQuery`] re-derives the caller's access on
//!   every request: a workspace is readable when it has community visibility
//!   or when the caller holds a `SpaceBinding` on it.
//! - Writes are sent to the API server under the caller's impersonated
//!   identity, so that the cluster's RBAC decides whether they are permitted.
//!   Updates are additionally checked against the generation the caller last
//!   read.
//!
//! The [`mapper`] converts between the `InternalWorkspace` resources stored in
//! the cluster and the `Workspace` resources exposed to users.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod identity;
mod impersonate;
pub mod mapper;
mod query;
mod read;
mod write;

#[cfg(test)]
mod tests;

pub use self::{
    identity::IdentityResolver,
    impersonate::Impersonator,
    query::AuthorizedQuery,
    read::ReadModel,
    write::{WorkspaceWriter, WriteModel},
};
