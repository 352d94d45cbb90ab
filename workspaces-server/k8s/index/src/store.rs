use ahash::AHashMap as HashMap;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};
use workspaces_server_k8s_api::{labels::Selector, ResourceExt};

/// Fields that a [`Store`] may maintain a secondary index over.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    // InternalWorkspace
    OwnerUsername,
    OwnerEmail,
    OwnerSubject,
    Visibility,
    DisplayName,
    SpaceName,

    // UserSignup
    CompliantUsername,
    Subject,

    // SpaceBinding
    Grantee,
    GrantSpace,
}

/// Selects objects from a single store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListQuery {
    All,
    Labels(Selector),
    Field(Field, String),
}

type Extract<T> = fn(&T) -> Option<&str>;

/// Holds all objects of a single kind from a single namespace, keyed by name.
pub struct Store<T> {
    namespace: String,
    by_name: BTreeMap<String, Arc<T>>,
    indexes: Vec<SecondaryIndex<T>>,
}

struct SecondaryIndex<T> {
    field: Field,
    extract: Extract<T>,
    by_value: HashMap<String, BTreeSet<String>>,
}

// === impl Store ===

impl<T: ResourceExt> Store<T> {
    pub(crate) fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            by_name: BTreeMap::new(),
            indexes: Vec::new(),
        }
    }

    pub(crate) fn with_index(mut self, field: Field, extract: Extract<T>) -> Self {
        self.indexes.push(SecondaryIndex {
            field,
            extract,
            by_value: HashMap::default(),
        });
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn is_indexed(&self, field: Field) -> bool {
        self.indexes.iter().any(|idx| idx.field == field)
    }

    /// Inserts or replaces an object, recomputing its secondary index entries.
    ///
    /// Objects from other namespaces are ignored and `false` is returned.
    pub(crate) fn apply(&mut self, obj: T) -> bool {
        if obj.namespace().as_deref() != Some(self.namespace.as_str()) {
            return false;
        }

        let name = obj.name_unchecked();
        let obj = Arc::new(obj);
        if let Some(prior) = self.by_name.insert(name.clone(), obj.clone()) {
            for idx in &mut self.indexes {
                idx.remove(&name, &prior);
            }
        }
        for idx in &mut self.indexes {
            idx.insert(&name, &obj);
        }
        true
    }

    pub(crate) fn delete(&mut self, name: &str) -> Option<Arc<T>> {
        let prior = self.by_name.remove(name)?;
        for idx in &mut self.indexes {
            idx.remove(name, &prior);
        }
        Some(prior)
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.by_name.get(name).cloned()
    }

    /// Returns matching objects ordered by name.
    ///
    /// Returns `None` if the query names a field this store does not index.
    pub fn list(&self, query: &ListQuery) -> Option<Vec<Arc<T>>> {
        let objs = match query {
            ListQuery::All => self.by_name.values().cloned().collect(),
            ListQuery::Labels(selector) => self
                .by_name
                .values()
                .filter(|obj| selector.matches(obj.labels()))
                .cloned()
                .collect(),
            ListQuery::Field(field, value) => {
                let idx = self.indexes.iter().find(|idx| idx.field == *field)?;
                idx.by_value
                    .get(value)
                    .into_iter()
                    .flatten()
                    .filter_map(|name| self.by_name.get(name).cloned())
                    .collect()
            }
        };
        Some(objs)
    }
}

impl<T> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("namespace", &self.namespace)
            .field("objects", &self.by_name.len())
            .field(
                "indexes",
                &self.indexes.iter().map(|idx| idx.field).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// === impl SecondaryIndex ===

impl<T> SecondaryIndex<T> {
    fn insert(&mut self, name: &str, obj: &T) {
        if let Some(value) = (self.extract)(obj).filter(|v| !v.is_empty()) {
            self.by_value
                .entry(value.to_string())
                .or_default()
                .insert(name.to_string());
        }
    }

    fn remove(&mut self, name: &str, obj: &T) {
        let Some(value) = (self.extract)(obj).filter(|v| !v.is_empty()) else {
            return;
        };
        if let Some(names) = self.by_value.get_mut(value) {
            names.remove(name);
            if names.is_empty() {
                self.by_value.remove(value);
            }
        }
    }
}
