//! The document store: the user's list of timezones.

use crate::store::StoreState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A timezone the user added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timezone {
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// System timezone identifier, e.g. `America/New_York`.
    pub identifier: String,
}

impl Timezone {
    /// Create a timezone named after the last component of its identifier.
    pub fn new(uuid: Uuid, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            uuid,
            name: default_name(&identifier).to_string(),
            identifier,
        }
    }
}

/// `America/New_York` -> `New_York`.
fn default_name(identifier: &str) -> &str {
    identifier.rsplit('/').next().unwrap_or(identifier)
}

/// All timezones, keyed by uuid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub timezones: BTreeMap<Uuid, Timezone>,
}

impl Document {
    /// Look up a timezone.
    pub fn get(&self, uuid: &Uuid) -> Option<&Timezone> {
        self.timezones.get(uuid)
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.timezones.contains_key(uuid)
    }

    pub fn len(&self) -> usize {
        self.timezones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timezones.is_empty()
    }

    /// Timezones in display order: by name, then uuid.
    pub fn sorted(&self) -> Vec<&Timezone> {
        let mut list: Vec<_> = self.timezones.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.uuid.cmp(&b.uuid)));
        list
    }
}

/// A requested change to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentMutation {
    /// Add a timezone. Use [`DocumentMutation::add`] to get a fresh uuid.
    Add { uuid: Uuid, identifier: String },
    /// Rename a timezone.
    Update { uuid: Uuid, name: String },
    Remove { uuid: Uuid },
}

impl DocumentMutation {
    /// Add `identifier` under a newly generated uuid.
    pub fn add(identifier: impl Into<String>) -> Self {
        DocumentMutation::Add {
            uuid: Uuid::new_v4(),
            identifier: identifier.into(),
        }
    }

    pub fn rename(uuid: Uuid, name: impl Into<String>) -> Self {
        DocumentMutation::Update {
            uuid,
            name: name.into(),
        }
    }

    pub fn remove(uuid: Uuid) -> Self {
        DocumentMutation::Remove { uuid }
    }
}

/// Kind of document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "Insert"),
            ChangeKind::Update => write!(f, "Update"),
            ChangeKind::Delete => write!(f, "Delete"),
        }
    }
}

/// What a document mutation changed, with the affected values as they are
/// after the change (or as they were, for deletes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub values: Vec<Timezone>,
}

impl fmt::Display for DocumentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (i, value) in self.values.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{}", value.name)?;
        }
        Ok(())
    }
}

impl StoreState for Document {
    const NAME: &'static str = "document";
    type Mutation = DocumentMutation;
    type Change = DocumentChange;

    fn apply(&mut self, mutation: DocumentMutation) -> Option<DocumentChange> {
        match mutation {
            DocumentMutation::Add { uuid, identifier } => {
                if self.timezones.contains_key(&uuid) {
                    return None;
                }
                let timezone = Timezone::new(uuid, identifier);
                self.timezones.insert(uuid, timezone.clone());
                Some(DocumentChange {
                    kind: ChangeKind::Insert,
                    values: vec![timezone],
                })
            }
            DocumentMutation::Update { uuid, name } => {
                let timezone = self.timezones.get_mut(&uuid)?;
                if timezone.name == name {
                    return None;
                }
                timezone.name = name;
                Some(DocumentChange {
                    kind: ChangeKind::Update,
                    values: vec![timezone.clone()],
                })
            }
            DocumentMutation::Remove { uuid } => {
                let removed = self.timezones.remove(&uuid)?;
                Some(DocumentChange {
                    kind: ChangeKind::Delete,
                    values: vec![removed],
                })
            }
        }
    }
}
