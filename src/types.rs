use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `links` object of a resource or relationship.
pub type Links = BTreeMap<String, serde_json::Value>;

/// Named edges from a resource to other resources.
pub type Relationships = BTreeMap<String, Relationship>;

/// `{type, id}` pair naming another resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Relationship linkage. The API returns a single identifier for to-one
/// edges and an array for to-many edges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<RelationshipData>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl Relationship {
    pub fn to_one(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            data: Some(RelationshipData::One(ResourceIdentifier {
                id: id.into(),
                kind: kind.into(),
            })),
            links: Links::new(),
        }
    }

    /// All identifiers carried by this relationship, in order.
    pub fn identifiers(&self) -> &[ResourceIdentifier] {
        match &self.data {
            Some(RelationshipData::One(identifier)) => std::slice::from_ref(identifier),
            Some(RelationshipData::Many(identifiers)) => identifiers,
            None => &[],
        }
    }

    /// ID of a to-one relationship.
    pub fn id(&self) -> Option<&str> {
        match &self.data {
            Some(RelationshipData::One(identifier)) => Some(&identifier.id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: OrganizationAttributes,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub links: Links,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OrganizationAttributes {
    pub name: String,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: WorkspaceAttributes,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub links: Links,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WorkspaceAttributes {
    pub name: String,
    pub environment: Option<String>,
    pub auto_apply: bool,
    pub locked: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub working_directory: Option<String>,
    pub terraform_version: Option<String>,
    pub vcs_repo: Option<VcsRepo>,
    pub permissions: BTreeMap<String, bool>,
    pub actions: BTreeMap<String, bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VcsRepo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub ingress_submodules: bool,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableCategory {
    #[default]
    Terraform,
    Env,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Variable {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: VariableAttributes,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub links: Links,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VariableAttributes {
    pub key: String,
    /// `None` when the variable is sensitive.
    pub value: Option<String>,
    pub category: VariableCategory,
    pub hcl: bool,
    pub sensitive: bool,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Run {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: RunAttributes,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub links: Links,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunAttributes {
    pub auto_apply: bool,
    pub error_text: Option<String>,
    pub is_destroy: bool,
    pub message: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub status_timestamps: BTreeMap<String, DateTime<Utc>>,
    pub terraform_version: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub has_changes: bool,
    pub actions: BTreeMap<String, bool>,
    pub permissions: BTreeMap<String, bool>,
}

/// Immutable snapshot of a workspace's state.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StateVersion {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: StateVersionAttributes,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub links: Links,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StateVersionAttributes {
    pub created_at: Option<DateTime<Utc>>,
    /// Time-limited URL that serves the raw state without authentication.
    pub hosted_state_download_url: Option<String>,
    pub serial: i64,
    pub lineage: Option<String>,
    pub size: Option<u64>,
}

/// Input for [`TfeClient::create_workspace`](crate::TfeClient::create_workspace).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateWorkspaceOptions {
    pub name: String,
    pub terraform_version: Option<String>,
    pub working_directory: Option<String>,
    pub auto_apply: Option<bool>,
    /// VCS repository identifier, e.g. `org/repo`.
    pub vcs_identifier: Option<String>,
    /// OAuth token used to reach the VCS provider.
    pub vcs_oauth_token_id: Option<String>,
    pub vcs_branch: Option<String>,
}

impl CreateWorkspaceOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Input for [`TfeClient::create_variable`](crate::TfeClient::create_variable).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateVariableOptions {
    pub key: String,
    pub value: String,
    pub category: VariableCategory,
    pub hcl: bool,
    pub sensitive: bool,
    pub description: Option<String>,
}

impl CreateVariableOptions {
    pub fn terraform(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            category: VariableCategory::Terraform,
            ..Self::default()
        }
    }

    pub fn env(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            category: VariableCategory::Env,
            ..Self::default()
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Input for [`TfeClient::create_run`](crate::TfeClient::create_run).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateRunOptions {
    pub message: Option<String>,
    pub is_destroy: bool,
}
