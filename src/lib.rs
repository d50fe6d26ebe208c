//! `tfe-http` is an async HTTP client for the Terraform Enterprise /
//! HCP Terraform JSON:API.
//!
//! Every call goes through one request path:
//! - [`TfeClient::request`] builds an authenticated JSON:API request, runs it
//!   through [`RetryPolicy::execute`], classifies the status and decodes the
//!   body.
//! - [`TfeClient::list`] walks `meta.pagination` and concatenates every page.
//!
//! Resource endpoints (organizations, workspaces, variables, runs, state
//! versions) are thin wrappers over those two, e.g.
//! [`TfeClient::get_workspace`] or [`TfeClient::download_latest_state`].
//!
//! The network is reached through the [`HttpTransport`] trait;
//! [`ReqwestTransport`] is the default implementation.

mod client;
mod decode;
mod error;
mod options;
mod query;
mod retry;
mod transport;
mod types;
mod wire;

#[cfg(feature = "raw-mode")]
pub mod raw;

pub use client::{TfeClient, DEFAULT_BASE_URL, JSON_API_MEDIA_TYPE};
pub use error::{BoxError, TfeError, TransportError};
pub use options::ClientOptions;
pub use query::Query;
pub use retry::{should_retry_download, should_retry_response, RetryPolicy};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    CreateRunOptions, CreateVariableOptions, CreateWorkspaceOptions, Links, Organization,
    OrganizationAttributes, Relationship, RelationshipData, Relationships, ResourceIdentifier,
    Run, RunAttributes, StateVersion, StateVersionAttributes, Variable, VariableAttributes,
    VariableCategory, VcsRepo, Workspace, WorkspaceAttributes,
};

pub use reqwest::{Method, StatusCode};

pub type Result<T> = std::result::Result<T, TfeError>;
