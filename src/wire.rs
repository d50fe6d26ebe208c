use serde::{Deserialize, Serialize};

use crate::types::{Relationship, Relationships, VariableCategory, VcsRepo};

/// Single-resource envelope: `{"data": {...}}`.
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

/// List envelope: `{"data": [...], "meta": {"pagination": {...}}}`.
#[derive(Debug, Deserialize)]
pub struct ListDocument<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl<T> ListDocument<T> {
    pub fn pagination(&self) -> Option<&Pagination> {
        self.meta.as_ref().and_then(|meta| meta.pagination.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Pagination {
    pub current_page: u32,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub prev_page: Option<u32>,
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl Pagination {
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Outgoing envelope for write requests: `{"data": {...}}`.
#[derive(Debug, Serialize)]
pub struct Payload<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct NewResource<A> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: A,
    #[serde(skip_serializing_if = "Relationships::is_empty")]
    pub relationships: Relationships,
}

impl<A> NewResource<A> {
    pub fn new(kind: &'static str, attributes: A) -> Self {
        Self {
            kind,
            attributes,
            relationships: Relationships::new(),
        }
    }

    pub fn related_to(mut self, name: &str, kind: &str, id: &str) -> Self {
        self.relationships
            .insert(name.to_owned(), Relationship::to_one(kind, id));
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewWorkspace {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_repo: Option<VcsRepo>,
}

#[derive(Debug, Serialize)]
pub struct NewVariable {
    pub key: String,
    pub value: String,
    pub category: VariableCategory,
    pub hcl: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewRun {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub is_destroy: bool,
}

/// Attributes of the workspace ssh-key relationship PATCH.
#[derive(Debug, Serialize)]
pub struct SshKeyReference {
    pub id: String,
}
