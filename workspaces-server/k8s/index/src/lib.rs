//! Workspaces Resource Cache
//!
//! Mirrors the cluster resources that the workspaces server authorizes reads
//! against. Each kind is watched within a single namespace:
//!
//! - `UserSignup` and `SpaceBinding` live in the identity (toolchain host)
//!   namespace. Signups resolve users to compliant usernames; bindings grant a
//!   user (or every authenticated user) access to a space.
//! - `InternalWorkspace` lives in the workspaces namespace. Every workspace is
//!   given a derived visibility label as it is ingested so that community
//!   workspaces can be selected by label.
//!
//! ```text
//! [ UserSignup ] -> compliant username -> [ SpaceBinding ] -> [ InternalWorkspace ]
//! ```
//!
//! The cache performs no per-user filtering: it holds raw cluster state, and
//! all authorization decisions are made by its callers on every request.
//! Reads may lag the API server by one watch round-trip.
//!
//! Each kind is maintained by its own watch task, all of which update a single
//! shared [`Index`]. Lookups never scan when a secondary index is available.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod metrics;
pub mod store;
mod sync;
mod toolchain;
mod workspace;


pub use self::{
    store::{Field, ListQuery, Store},
    sync::SyncTracker,
    workspace::with_visibility_label,
};
use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};
use workspaces_server_k8s_api::{InternalWorkspace, SpaceBinding, UserSignup};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{kind} resources are not cached in namespace {namespace}")]
    NamespaceNotCached {
        kind: &'static str,
        namespace: String,
    },

    #[error("{kind} resources are not indexed by {field:?}")]
    NotIndexed { kind: &'static str, field: Field },

    #[error("{kind} watch did not complete its initial sync within {timeout:?}")]
    SyncTimeout {
        kind: &'static str,
        timeout: Duration,
    },

    #[error("{kind} watch terminated before completing its initial sync")]
    WatchClosed { kind: &'static str },
}

/// Configures the namespaces each kind is cached from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Holds `UserSignup` and `SpaceBinding` resources.
    pub identity_namespace: String,

    /// Holds `InternalWorkspace` resources.
    pub workspaces_namespace: String,
}

pub type SharedIndex = Arc<RwLock<Index>>;

/// Holds all cached state. Updated by the watch tasks through
/// `kubert::index::IndexNamespacedResource` and read through [`ResourceCache`].
#[derive(Debug)]
pub struct Index {
    workspaces: Store<InternalWorkspace>,
    signups: Store<UserSignup>,
    bindings: Store<SpaceBinding>,
}

/// A resource kind held by the cache.
pub trait Cached: kube::Resource + Sized {
    const KIND: &'static str;

    fn store(index: &Index) -> &Store<Self>;
}

/// Read handle over a [`SharedIndex`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ResourceCache {
    index: SharedIndex,
}

// === impl Index ===

impl Index {
    pub fn shared(config: &CacheConfig) -> SharedIndex {
        Arc::new(RwLock::new(Self::new(config)))
    }

    fn new(config: &CacheConfig) -> Self {
        Self {
            workspaces: workspace::store(&config.workspaces_namespace),
            signups: toolchain::signup_store(&config.identity_namespace),
            bindings: toolchain::binding_store(&config.identity_namespace),
        }
    }

    pub fn workspaces(&self) -> &Store<InternalWorkspace> {
        &self.workspaces
    }

    pub fn signups(&self) -> &Store<UserSignup> {
        &self.signups
    }

    pub fn bindings(&self) -> &Store<SpaceBinding> {
        &self.bindings
    }
}

impl Cached for InternalWorkspace {
    const KIND: &'static str = "InternalWorkspace";

    fn store(index: &Index) -> &Store<Self> {
        &index.workspaces
    }
}

impl Cached for UserSignup {
    const KIND: &'static str = "UserSignup";

    fn store(index: &Index) -> &Store<Self> {
        &index.signups
    }
}

impl Cached for SpaceBinding {
    const KIND: &'static str = "SpaceBinding";

    fn store(index: &Index) -> &Store<Self> {
        &index.bindings
    }
}

// === impl ResourceCache ===

impl ResourceCache {
    pub fn new(index: SharedIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    pub fn get<T: Cached>(&self, namespace: &str, name: &str) -> Result<Arc<T>, Error> {
        let index = self.index.read();
        let store = Self::store::<T>(&index, namespace)?;
        store.get(name).ok_or_else(|| Error::NotFound {
            kind: T::KIND,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    pub fn list<T: Cached>(&self, namespace: &str, query: &ListQuery) -> Result<Vec<Arc<T>>, Error> {
        let index = self.index.read();
        let store = Self::store::<T>(&index, namespace)?;
        if let ListQuery::Field(field, _) = query {
            if !store.is_indexed(*field) {
                return Err(Error::NotIndexed {
                    kind: T::KIND,
                    field: *field,
                });
            }
        }
        Ok(store.list(query).unwrap_or_default())
    }

    fn store<'i, T: Cached>(index: &'i Index, namespace: &str) -> Result<&'i Store<T>, Error> {
        let store = T::store(index);
        if store.namespace() != namespace {
            return Err(Error::NamespaceNotCached {
                kind: T::KIND,
                namespace: namespace.to_string(),
            });
        }
        Ok(store)
    }
}
