use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    decode::{classify_status, decode_body, encode_body},
    query::{PAGE_NUMBER, PAGE_SIZE},
    retry::{should_retry_download, should_retry_response, RetryPolicy},
    wire::{
        Document, ListDocument, NewResource, NewRun, NewVariable, NewWorkspace, Pagination,
        Payload, SshKeyReference,
    },
    ClientOptions, CreateRunOptions, CreateVariableOptions, CreateWorkspaceOptions, HttpRequest,
    HttpResponse, HttpTransport, Organization, Query, ReqwestTransport, Result, Run,
    StateVersion, TfeError, TransportError, Variable, VcsRepo, Workspace,
};

/// Base URL of HCP Terraform (the SaaS deployment).
pub const DEFAULT_BASE_URL: &str = "https://app.terraform.io";

/// Media type of every JSON:API request and response.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

const ORGANIZATIONS_PATH: [&str; 3] = ["api", "v2", "organizations"];
const STATE_VERSIONS_PATH: [&str; 3] = ["api", "v2", "state-versions"];
const RUNS_PATH: [&str; 3] = ["api", "v2", "runs"];
const VARS_PATH: [&str; 3] = ["api", "v2", "vars"];

type RetryPredicate = fn(&std::result::Result<HttpResponse, TransportError>) -> bool;

/// Client for the Terraform Enterprise / HCP Terraform API.
///
/// Holds only immutable configuration and a shared transport, so a single
/// client can be cloned and used from many tasks at once.
#[derive(Clone)]
pub struct TfeClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    authorization: String,
    options: ClientOptions,
}

impl fmt::Debug for TfeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfeClient")
            .field("base_url", &self.base_url)
            .field("authorization", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl TfeClient {
    /// Creates a client from a base URL and an API token.
    ///
    /// The `Bearer ` prefix is added to the token when missing.
    pub fn new(base_url: impl Into<String>, token: impl AsRef<str>) -> Self {
        Self::with_transport(base_url, token, Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client for HCP Terraform at [`DEFAULT_BASE_URL`].
    pub fn saas(token: impl AsRef<str>) -> Self {
        Self::new(DEFAULT_BASE_URL, token)
    }

    /// Creates a client that sends every request through `transport`.
    pub fn with_transport(
        base_url: impl Into<String>,
        token: impl AsRef<str>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            authorization: normalize_bearer_authorization(token.as_ref()),
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `TFE_TOKEN`: API token (Bearer prefix optional)
    /// - `TFE_ADDRESS`: base URL, optional, defaults to [`DEFAULT_BASE_URL`]
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tfe_http::TfeClient;
    ///
    /// let tfe = TfeClient::from_env().expect("missing TFE_TOKEN");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let token = std::env::var("TFE_TOKEN")
            .map_err(|_| "missing TFE_TOKEN environment variable".to_owned())?;
        if token.trim().is_empty() {
            return Err("TFE_TOKEN is set but empty".to_owned());
        }
        let base_url = std::env::var("TFE_ADDRESS")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Ok(Self::new(base_url, token))
    }

    /// Applies client options such as timeout, retry and page size.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Lists every organization the token can access.
    ///
    /// Issues one request per page.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.list_at(&ORGANIZATIONS_PATH, Query::new()).await
    }

    pub async fn get_organization(&self, organization: &str) -> Result<Organization> {
        let path = ["api", "v2", "organizations", organization];
        let document: Document<Organization> = self.get(&path, &Query::new()).await?;
        Ok(document.data)
    }

    /// Lists every workspace of `organization`.
    ///
    /// Issues one request per page. A 404 is reported as
    /// [`TfeError::WorkspaceNotFound`].
    pub async fn list_workspaces(&self, organization: &str) -> Result<Vec<Workspace>> {
        let path = ["api", "v2", "organizations", organization, "workspaces"];
        self.list_at(&path, Query::new())
            .await
            .map_err(|err| err.remap_not_found(TfeError::WorkspaceNotFound))
    }

    pub async fn get_workspace(&self, organization: &str, workspace: &str) -> Result<Workspace> {
        let path = ["api", "v2", "organizations", organization, "workspaces", workspace];
        let document: Document<Workspace> = self
            .get(&path, &Query::new())
            .await
            .map_err(|err| err.remap_not_found(TfeError::WorkspaceNotFound))?;
        Ok(document.data)
    }

    /// Creates a workspace. Single attempt, never retried.
    pub async fn create_workspace(
        &self,
        organization: &str,
        options: CreateWorkspaceOptions,
    ) -> Result<Workspace> {
        let path = ["api", "v2", "organizations", organization, "workspaces"];
        let vcs_repo = options.vcs_identifier.map(|identifier| VcsRepo {
            branch: options.vcs_branch,
            ingress_submodules: false,
            identifier,
            oauth_token_id: options.vcs_oauth_token_id,
        });
        let payload = Payload {
            data: NewResource::new(
                "workspaces",
                NewWorkspace {
                    name: options.name,
                    terraform_version: options.terraform_version,
                    working_directory: options.working_directory,
                    auto_apply: options.auto_apply,
                    vcs_repo,
                },
            ),
        };

        let document: Document<Workspace> = self
            .request_at(Method::POST, &path, &Query::new(), Some(encode_body(&payload)?))
            .await?;
        Ok(document.data)
    }

    /// Points the workspace's `ssh-key` relationship at `ssh_key_id`.
    pub async fn assign_workspace_ssh_key(
        &self,
        workspace_id: &str,
        ssh_key_id: &str,
    ) -> Result<Workspace> {
        let path = ["api", "v2", "workspaces", workspace_id, "relationships", "ssh-key"];
        let payload = Payload {
            data: NewResource::new(
                "workspaces",
                SshKeyReference {
                    id: ssh_key_id.to_owned(),
                },
            ),
        };

        let document: Document<Workspace> = self
            .request_at(Method::PATCH, &path, &Query::new(), Some(encode_body(&payload)?))
            .await
            .map_err(|err| err.remap_not_found(TfeError::WorkspaceNotFound))?;
        Ok(document.data)
    }

    /// Creates a variable on the workspace with ID `workspace_id`.
    pub async fn create_variable(
        &self,
        workspace_id: &str,
        options: CreateVariableOptions,
    ) -> Result<Variable> {
        let payload = Payload {
            data: NewResource::new(
                "vars",
                NewVariable {
                    key: options.key,
                    value: options.value,
                    category: options.category,
                    hcl: options.hcl,
                    sensitive: options.sensitive,
                    description: options.description,
                },
            )
            .related_to("workspace", "workspaces", workspace_id),
        };

        let document: Document<Variable> = self
            .request_at(Method::POST, &VARS_PATH, &Query::new(), Some(encode_body(&payload)?))
            .await?;
        Ok(document.data)
    }

    /// Queues a run on the workspace with ID `workspace_id`.
    pub async fn create_run(&self, workspace_id: &str, options: CreateRunOptions) -> Result<Run> {
        let payload = Payload {
            data: NewResource::new(
                "runs",
                NewRun {
                    message: options.message,
                    is_destroy: options.is_destroy,
                },
            )
            .related_to("workspace", "workspaces", workspace_id),
        };

        let document: Document<Run> = self
            .request_at(Method::POST, &RUNS_PATH, &Query::new(), Some(encode_body(&payload)?))
            .await?;
        Ok(document.data)
    }

    /// Lists every state version of a workspace, newest first.
    ///
    /// Issues one request per page. A 404 is reported as
    /// [`TfeError::StateVersionNotFound`].
    pub async fn list_state_versions(
        &self,
        organization: &str,
        workspace: &str,
    ) -> Result<Vec<StateVersion>> {
        self.list_at(
            &STATE_VERSIONS_PATH,
            state_version_filter(organization, workspace),
        )
        .await
        .map_err(|err| err.remap_not_found(TfeError::StateVersionNotFound))
    }

    /// Fetches the newest state version of a workspace with one request of
    /// page size 1.
    pub async fn get_latest_state_version(
        &self,
        organization: &str,
        workspace: &str,
    ) -> Result<StateVersion> {
        let query = state_version_filter(organization, workspace).page_size(1);
        let page: ListDocument<StateVersion> = self
            .get(&STATE_VERSIONS_PATH, &query)
            .await
            .map_err(|err| err.remap_not_found(TfeError::StateVersionNotFound))?;

        page.data
            .into_iter()
            .next()
            .ok_or(TfeError::StateVersionNotFound)
    }

    /// Fetches the state version the workspace currently points at.
    pub async fn get_current_state_version(&self, workspace_id: &str) -> Result<StateVersion> {
        let path = ["api", "v2", "workspaces", workspace_id, "current-state-version"];
        let document: Document<StateVersion> = self
            .get(&path, &Query::new())
            .await
            .map_err(|err| err.remap_not_found(TfeError::StateVersionNotFound))?;
        Ok(document.data)
    }

    pub async fn get_state_version(&self, state_version_id: &str) -> Result<StateVersion> {
        let path = ["api", "v2", "state-versions", state_version_id];
        let document: Document<StateVersion> = self
            .get(&path, &Query::new())
            .await
            .map_err(|err| err.remap_not_found(TfeError::StateVersionNotFound))?;
        Ok(document.data)
    }

    /// Downloads the raw state of `state_version_id`.
    ///
    /// Two requests: the state version lookup and the download itself.
    pub async fn download_state(&self, state_version_id: &str) -> Result<Vec<u8>> {
        let state_version = self.get_state_version(state_version_id).await?;
        self.download_state_version(&state_version).await
    }

    /// Downloads the raw state of the newest state version of a workspace.
    pub async fn download_latest_state(
        &self,
        organization: &str,
        workspace: &str,
    ) -> Result<Vec<u8>> {
        let state_version = self
            .get_latest_state_version(organization, workspace)
            .await?;
        self.download_state_version(&state_version).await
    }

    /// Fetches the bytes behind a state version's hosted download URL.
    ///
    /// The URL is pre-signed: the request carries no `Authorization` header
    /// and the body is returned as-is.
    pub async fn download_state_version(&self, state_version: &StateVersion) -> Result<Vec<u8>> {
        let raw_url = state_version
            .attributes
            .hosted_state_download_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| TfeError::MissingDownloadUrl(state_version.id.clone()))?;
        let url = Url::parse(raw_url)
            .map_err(|err| TfeError::InvalidUrl(format!("{raw_url}: {err}")))?;

        let request = HttpRequest::new(Method::GET, url).with_timeout(self.timeout());
        let response = self.send(request, should_retry_download).await?;

        if !response.status.is_success() {
            return Err(TfeError::BadStatus {
                status: response.status.as_u16(),
                body: response.body_text(),
            });
        }
        Ok(response.body)
    }

    /// Sends an authenticated JSON:API request and decodes the response into `T`.
    ///
    /// `path` is absolute (`/api/v2/...`) and replaces any path on the base
    /// URL. Each `/`-separated segment is sent percent-encoded, so `?`, `#`
    /// and `%` stay part of the segment. Requests without a body are retried
    /// per [`ClientOptions`]; requests with a body make a single attempt.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        self.request_at(method, &split_path(path), query, body).await
    }

    /// Fetches every page of a list endpoint and concatenates `data` in page
    /// order.
    ///
    /// Any failing page fails the whole call.
    pub async fn list<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<Vec<T>> {
        self.list_at(&split_path(path), query).await
    }

    /// Sends an authenticated request and returns the undecoded document.
    #[cfg(feature = "raw-mode")]
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        query: &Query,
    ) -> Result<crate::raw::RawDocument> {
        self.request(method, path, query, None).await
    }

    async fn request_at<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &[&str],
        query: &Query,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        let request = self.api_request(method, path, query, body)?;
        let response = self.send(request, should_retry_response).await?;
        classify_status(&response)?;
        decode_body(&response.body)
    }

    async fn list_at<T: DeserializeOwned>(
        &self,
        path: &[&str],
        mut query: Query,
    ) -> Result<Vec<T>> {
        if let Some(size) = self.options.page_size {
            if !query.contains(PAGE_SIZE) {
                query.set(PAGE_SIZE, size);
            }
        }

        let mut page: ListDocument<T> = self.get(path, &query).await?;
        let mut items = std::mem::take(&mut page.data);
        let mut pagination = page.pagination().copied();

        while let Some(current) = pagination.filter(Pagination::has_more) {
            let next_page = current.current_page + 1;
            query.set(PAGE_NUMBER, next_page);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                path = %path.join("/"),
                page = next_page,
                total_pages = current.total_pages,
                "fetching next page"
            );

            let mut page: ListDocument<T> = self.get(path, &query).await?;
            let following = page.pagination().copied();
            if let Some(following) = following {
                if following.current_page <= current.current_page {
                    return Err(TfeError::Decode(format!(
                        "pagination did not advance: requested page {next_page}, got page {}",
                        following.current_page
                    )));
                }
            }
            items.append(&mut page.data);
            pagination = following;
        }

        Ok(items)
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str], query: &Query) -> Result<T> {
        self.request_at(Method::GET, path, query, None).await
    }

    fn api_request(
        &self,
        method: Method,
        path: &[&str],
        query: &Query,
        body: Option<Vec<u8>>,
    ) -> Result<HttpRequest> {
        let url = self.resolve_url(path, query)?;
        let request = HttpRequest::new(method, url)
            .with_header(AUTHORIZATION.as_str(), self.authorization.as_str())
            .with_header(CONTENT_TYPE.as_str(), JSON_API_MEDIA_TYPE)
            .with_timeout(self.timeout());

        Ok(match body {
            Some(body) => request.with_body(body),
            None => request,
        })
    }

    fn resolve_url(&self, path: &[&str], query: &Query) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| TfeError::InvalidUrl(format!("{}: {err}", self.base_url)))?;

        // `extend` drops `.` and `..` instead of encoding them.
        if let Some(segment) = path
            .iter()
            .find(|segment| segment.is_empty() || **segment == "." || **segment == "..")
        {
            return Err(TfeError::InvalidUrl(format!(
                "invalid path segment {segment:?} in /{}",
                path.join("/")
            )));
        }

        url.path_segments_mut()
            .map_err(|()| TfeError::InvalidUrl(format!("{}: not a base URL", self.base_url)))?
            .clear()
            .extend(path);
        url.set_query(None);
        url.set_fragment(None);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    async fn send(
        &self,
        request: HttpRequest,
        should_retry: RetryPredicate,
    ) -> Result<HttpResponse> {
        let policy = RetryPolicy::from_options(&self.options).for_request(&request);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            max_attempts = policy.max_attempts(),
            "sending request"
        );

        let transport = self.transport.as_ref();
        let request = &request;
        let response = policy
            .execute(move || transport.send(request.clone()), should_retry)
            .await?;
        Ok(response)
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.options.timeout_ms)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

fn state_version_filter(organization: &str, workspace: &str) -> Query {
    Query::new()
        .filter(["organization", "name"], organization)
        .filter(["workspace", "name"], workspace)
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use reqwest::{Method, StatusCode};
    use serde_json::{json, Value as JsonValue};

    use super::{normalize_bearer_authorization, TfeClient};
    use crate::{
        ClientOptions, CreateRunOptions, HttpRequest, HttpResponse, HttpTransport, Organization,
        Query, TfeError, TransportError,
    };

    type Scripted = std::result::Result<HttpResponse, TransportError>;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request log mutex must not be poisoned")
                .clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Scripted {
            self.requests
                .lock()
                .expect("request log mutex must not be poisoned")
                .push(request);
            self.responses
                .lock()
                .expect("response queue mutex must not be poisoned")
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(HttpResponse::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "no scripted response",
                    ))
                })
        }
    }

    fn json_response(status: StatusCode, body: JsonValue) -> Scripted {
        Ok(HttpResponse::new(status, body.to_string()))
    }

    fn client(transport: Arc<ScriptedTransport>) -> TfeClient {
        TfeClient::with_transport("https://tfe.example.com", "secret", transport).with_options(
            ClientOptions {
                timeout_ms: 1_000,
                max_attempts: 3,
                retry_backoff_ms: 1,
                page_size: None,
            },
        )
    }

    fn query_value(request: &HttpRequest, key: &str) -> Option<String> {
        request
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn org_page(ids: &[&str], current: u32, total: u32) -> JsonValue {
        let data: Vec<JsonValue> = ids
            .iter()
            .map(|id| json!({"id": id, "type": "organizations", "attributes": {"name": id}}))
            .collect();
        let next_page = (current < total).then_some(current + 1);
        json!({
            "data": data,
            "meta": {
                "pagination": {
                    "current-page": current,
                    "next-page": next_page,
                    "total-pages": total
                }
            }
        })
    }

    fn state_version(id: &str, download_url: &str) -> JsonValue {
        json!({
            "id": id,
            "type": "state-versions",
            "attributes": {
                "serial": 3,
                "created-at": "2024-05-01T08:00:00Z",
                "hosted-state-download-url": download_url
            }
        })
    }

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization("abc123"),
            "Bearer abc123".to_owned()
        );
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123".to_owned()
        );
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let client = TfeClient::new("https://tfe.example.com", "secret-token");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[tokio::test]
    async fn sends_bearer_and_json_api_content_type() {
        let transport = ScriptedTransport::new(vec![json_response(
            StatusCode::OK,
            json!({"data": {"id": "acme", "type": "organizations"}}),
        )]);
        let tfe = client(transport.clone());

        let org = tfe.get_organization("acme").await.expect("must succeed");
        assert_eq!(org.id, "acme");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("authorization"), Some("Bearer secret"));
        assert_eq!(
            requests[0].header("content-type"),
            Some("application/vnd.api+json")
        );
        assert_eq!(
            requests[0].url.as_str(),
            "https://tfe.example.com/api/v2/organizations/acme"
        );
    }

    #[tokio::test]
    async fn reserved_characters_stay_inside_their_segment() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::NOT_FOUND, json!({})),
            json_response(StatusCode::NOT_FOUND, json!({})),
        ]);
        let tfe = client(transport.clone());

        let err = tfe.get_workspace("acme", "prod?x=1").await.expect_err("404");
        assert!(matches!(err, TfeError::WorkspaceNotFound));
        let err = tfe.get_state_version("sv#frag").await.expect_err("404");
        assert!(matches!(err, TfeError::StateVersionNotFound));

        let requests = transport.requests();
        assert_eq!(
            requests[0].url.path(),
            "/api/v2/organizations/acme/workspaces/prod%3Fx=1"
        );
        assert_eq!(requests[0].url.query(), None);
        assert_eq!(requests[1].url.path(), "/api/v2/state-versions/sv%23frag");
        assert_eq!(requests[1].url.fragment(), None);
    }

    #[tokio::test]
    async fn traversal_stays_inside_the_intended_path() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::NOT_FOUND, json!({})),
            json_response(StatusCode::NOT_FOUND, json!({})),
        ]);
        let tfe = client(transport.clone());

        let err = tfe
            .get_workspace("acme", "../../../state-versions/sv-1")
            .await
            .expect_err("404");
        assert!(matches!(err, TfeError::WorkspaceNotFound));
        let err = tfe
            .assign_workspace_ssh_key("../ws-2", "sshkey-1")
            .await
            .expect_err("404");
        assert!(matches!(err, TfeError::WorkspaceNotFound));

        let requests = transport.requests();
        assert_eq!(
            requests[0].url.path(),
            "/api/v2/organizations/acme/workspaces/..%2F..%2F..%2Fstate-versions%2Fsv-1"
        );
        assert_eq!(
            requests[1].url.path(),
            "/api/v2/workspaces/..%2Fws-2/relationships/ssh-key"
        );
    }

    #[tokio::test]
    async fn dot_and_empty_segments_fail_before_any_request() {
        let transport = ScriptedTransport::new(vec![]);
        let tfe = client(transport.clone());

        let err = tfe.get_workspace("acme", "..").await.expect_err("must fail");
        assert!(matches!(err, TfeError::InvalidUrl(_)));
        let err = tfe.get_state_version(".").await.expect_err("must fail");
        assert!(matches!(err, TfeError::InvalidUrl(_)));
        let err = tfe.get_organization("").await.expect_err("must fail");
        assert!(matches!(err, TfeError::InvalidUrl(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn request_path_replaces_base_path() {
        let transport = ScriptedTransport::new(vec![json_response(
            StatusCode::OK,
            json!({"data": {"id": "acme", "type": "organizations"}}),
        )]);
        let tfe =
            TfeClient::with_transport("https://tfe.example.com/ignored/?x=1", "t", transport.clone());

        let raw: JsonValue = tfe
            .request(Method::GET, "/api/v2/organizations/acme", &Query::new(), None)
            .await
            .expect("must succeed");
        assert_eq!(raw["data"]["id"], "acme");
        assert_eq!(
            transport.requests()[0].url.as_str(),
            "https://tfe.example.com/api/v2/organizations/acme"
        );
    }

    #[tokio::test]
    async fn list_follows_pagination_in_page_order() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::OK, org_page(&["a", "b"], 1, 3)),
            json_response(StatusCode::OK, org_page(&["c"], 2, 3)),
            json_response(StatusCode::OK, org_page(&["d", "e"], 3, 3)),
        ]);
        let tfe = client(transport.clone());

        let orgs = tfe.list_organizations().await.expect("must list");
        let ids: Vec<&str> = orgs.iter().map(|org| org.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);

        let pages: Vec<Option<String>> = transport
            .requests()
            .iter()
            .map(|request| query_value(request, "page[number]"))
            .collect();
        assert_eq!(pages, [None, Some("2".to_owned()), Some("3".to_owned())]);
    }

    #[tokio::test]
    async fn list_without_pagination_meta_is_single_page() {
        let transport = ScriptedTransport::new(vec![json_response(
            StatusCode::OK,
            json!({"data": [{"id": "a", "type": "organizations"}]}),
        )]);
        let tfe = client(transport.clone());

        let orgs = tfe.list_organizations().await.expect("must list");
        assert_eq!(orgs.len(), 1);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn list_fails_atomically_when_a_later_page_fails() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::OK, org_page(&["a"], 1, 2)),
            json_response(StatusCode::UNAUTHORIZED, json!({"errors": []})),
        ]);
        let tfe = client(transport.clone());

        let err = tfe.list_organizations().await.expect_err("must fail");
        assert!(matches!(err, TfeError::Unauthorized));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn list_rejects_pagination_that_does_not_advance() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::OK, org_page(&["a"], 1, 3)),
            json_response(StatusCode::OK, org_page(&["a"], 1, 3)),
        ]);
        let tfe = client(transport);

        let err = tfe.list_organizations().await.expect_err("must fail");
        assert!(matches!(err, TfeError::Decode(_)));
    }

    #[tokio::test]
    async fn configured_page_size_is_sent_on_every_page() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::OK, org_page(&["a"], 1, 2)),
            json_response(StatusCode::OK, org_page(&["b"], 2, 2)),
        ]);
        let tfe = client(transport.clone()).with_options(ClientOptions {
            page_size: Some(100),
            max_attempts: 1,
            ..ClientOptions::default()
        });

        let orgs: Vec<Organization> = tfe.list_organizations().await.expect("must list");
        assert_eq!(orgs.len(), 2);
        for request in transport.requests() {
            assert_eq!(query_value(&request, "page[size]").as_deref(), Some("100"));
        }
    }

    #[tokio::test]
    async fn unauthorized_is_never_retried() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::UNAUTHORIZED, json!({})),
            json_response(StatusCode::OK, org_page(&["a"], 1, 1)),
        ]);
        let tfe = client(transport.clone());

        let err = tfe.list_organizations().await.expect_err("must fail");
        assert!(matches!(err, TfeError::Unauthorized));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn bad_status_is_retried_up_to_the_cap() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::BAD_GATEWAY, json!({})),
            json_response(StatusCode::BAD_GATEWAY, json!({})),
            json_response(StatusCode::SERVICE_UNAVAILABLE, json!({"errors": ["down"]})),
        ]);
        let tfe = client(transport.clone());

        let err = tfe.list_organizations().await.expect_err("must fail");
        assert!(matches!(err, TfeError::BadStatus { status: 503, .. }));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn timeout_is_retried_and_can_recover() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout("slow".into())),
            json_response(StatusCode::OK, org_page(&["a"], 1, 1)),
        ]);
        let tfe = client(transport.clone());

        let orgs = tfe.list_organizations().await.expect("must recover");
        assert_eq!(orgs.len(), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn connect_failure_is_surfaced_without_retry() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportError::Connect("refused".into()))]);
        let tfe = client(transport.clone());

        let err = tfe.list_organizations().await.expect_err("must fail");
        assert!(matches!(err, TfeError::Network(TransportError::Connect(_))));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn not_found_is_remapped_per_endpoint() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::NOT_FOUND, json!({})),
            json_response(StatusCode::NOT_FOUND, json!({})),
            json_response(StatusCode::NOT_FOUND, json!({})),
        ]);
        let tfe = client(transport.clone());

        let err = tfe.get_workspace("acme", "prod").await.expect_err("404");
        assert!(matches!(err, TfeError::WorkspaceNotFound));

        let err = tfe.get_state_version("sv-1").await.expect_err("404");
        assert!(matches!(err, TfeError::StateVersionNotFound));

        let err = tfe.get_organization("acme").await.expect_err("404");
        assert!(matches!(err, TfeError::NotFound));

        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn latest_state_version_filters_and_truncates() {
        let transport = ScriptedTransport::new(vec![json_response(
            StatusCode::OK,
            json!({
                "data": [state_version("sv-new", "https://archivist.example/new")],
                "meta": {"pagination": {"current-page": 1, "total-pages": 40}}
            }),
        )]);
        let tfe = client(transport.clone());

        let latest = tfe
            .get_latest_state_version("acme", "prod")
            .await
            .expect("must succeed");
        assert_eq!(latest.id, "sv-new");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/api/v2/state-versions");
        assert_eq!(
            query_value(&requests[0], "filter[organization][name]").as_deref(),
            Some("acme")
        );
        assert_eq!(
            query_value(&requests[0], "filter[workspace][name]").as_deref(),
            Some("prod")
        );
        assert_eq!(query_value(&requests[0], "page[size]").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn latest_state_version_of_empty_workspace_is_not_found() {
        let transport = ScriptedTransport::new(vec![json_response(
            StatusCode::OK,
            json!({"data": [], "meta": {"pagination": {"current-page": 1, "total-pages": 0}}}),
        )]);
        let tfe = client(transport);

        let err = tfe
            .get_latest_state_version("acme", "prod")
            .await
            .expect_err("must fail");
        assert!(matches!(err, TfeError::StateVersionNotFound));
    }

    #[tokio::test]
    async fn download_hop_is_unauthenticated_and_retried() {
        let raw_state = br#"{"version":4,"serial":3}"#.to_vec();
        let transport = ScriptedTransport::new(vec![
            json_response(
                StatusCode::OK,
                json!({"data": state_version("sv-1", "https://archivist.example/v1/object/xyz")}),
            ),
            Ok(HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE, "busy")),
            Ok(HttpResponse::new(StatusCode::OK, raw_state.clone())),
        ]);
        let tfe = client(transport.clone());

        let bytes = tfe.download_state("sv-1").await.expect("must download");
        assert_eq!(bytes, raw_state);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].header("authorization").is_some());
        for download in &requests[1..] {
            assert_eq!(
                download.url.as_str(),
                "https://archivist.example/v1/object/xyz"
            );
            assert!(download.header("authorization").is_none());
        }
    }

    #[tokio::test]
    async fn download_without_url_fails_before_any_request() {
        let transport = ScriptedTransport::new(vec![json_response(
            StatusCode::OK,
            json!({"data": {"id": "sv-1", "type": "state-versions", "attributes": {"serial": 1}}}),
        )]);
        let tfe = client(transport.clone());

        let err = tfe.download_state("sv-1").await.expect_err("must fail");
        assert!(matches!(err, TfeError::MissingDownloadUrl(id) if id == "sv-1"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn writes_are_single_attempt() {
        let transport = ScriptedTransport::new(vec![
            json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({})),
            json_response(StatusCode::CREATED, json!({"data": {"id": "run-1"}})),
        ]);
        let tfe = client(transport.clone());

        let err = tfe
            .create_run("ws-1", CreateRunOptions::default())
            .await
            .expect_err("must fail");
        assert!(matches!(err, TfeError::BadStatus { status: 500, .. }));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let body: JsonValue =
            serde_json::from_slice(requests[0].body.as_deref().expect("body")).expect("json");
        assert_eq!(body["data"]["type"], "runs");
        assert_eq!(
            body["data"]["relationships"]["workspace"]["data"],
            json!({"type": "workspaces", "id": "ws-1"})
        );
    }

    #[tokio::test]
    async fn invalid_base_url_fails_before_any_request() {
        let transport = ScriptedTransport::new(vec![]);
        let tfe = TfeClient::with_transport("not a url", "secret", transport.clone());

        let err = tfe.list_organizations().await.expect_err("must fail");
        assert!(matches!(err, TfeError::InvalidUrl(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpResponse::new(StatusCode::OK, "<html>")),
            json_response(StatusCode::OK, org_page(&["a"], 1, 1)),
        ]);
        let tfe = client(transport.clone());

        let err = tfe.list_organizations().await.expect_err("must fail");
        assert!(matches!(err, TfeError::Decode(_)));
        assert_eq!(transport.requests().len(), 1);
    }
}
