use crate::client::SessionClient;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use pure_ide_protocol::{
    ConceptEntry, DirectoryEntry, ExecutionActivity, InitializationActivity, OpenFileRequest,
    PureFile, SearchResultEntry, TestRunStatus, Usage, UsageConcept,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const CONCEPT_CHILDREN_FUNCTION: &str = "meta::pure::ide::display_ide(String[1]):String[1]";

/// [`SessionClient`] over the IDE server's HTTP API.
pub struct HttpSessionClient {
    http: Client,
    base_url: String,
    session_id: String,
    mode: Option<String>,
}

impl HttpSessionClient {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| SessionError::Other(format!("Failed to build HTTP client: {err}")))?;
        let mut base_url = config.server_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let session_id = new_session_id();
        log::debug!("Session {session_id} against {base_url}");
        Ok(Self {
            http,
            base_url,
            session_id,
            mode: config.mode.clone(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        let mut query = vec![("sessionId", self.session_id.as_str())];
        if let Some(mode) = &self.mode {
            query.push(("mode", mode.as_str()));
        }
        self.http.get(self.url(endpoint)).query(&query)
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T> {
        log::debug!("-> {endpoint}");
        let response = request
            .send()
            .await
            .map_err(|err| SessionError::transport(endpoint, err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|err| SessionError::transport(endpoint, err))
    }
}

fn new_session_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    format!("{nanos:x}-{:x}", std::process::id())
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn initialize(
        &self,
        request_refresh: bool,
        mode: Option<&str>,
        fast_compile: Option<&str>,
    ) -> Result<Value> {
        let mut request = self
            .get("initialize")
            .query(&[("requestRefresh", request_refresh)]);
        if let Some(mode) = mode.filter(|_| self.mode.is_none()) {
            request = request.query(&[("mode", mode)]);
        }
        if let Some(fast_compile) = fast_compile {
            request = request.query(&[("fastCompile", fast_compile)]);
        }
        self.send("initialize", request).await
    }

    async fn initialization_activity(&self) -> Result<InitializationActivity> {
        self.send("initializationActivity", self.get("initializationActivity"))
            .await
    }

    async fn get_file(&self, path: &str) -> Result<PureFile> {
        let endpoint = format!("fileAsJson/{}", path.trim_start_matches('/'));
        self.send(&endpoint, self.get(&endpoint)).await
    }

    async fn get_directory_children(&self, path: Option<&str>) -> Result<Vec<DirectoryEntry>> {
        let request = self
            .get("dir")
            .query(&[("parameters", path.unwrap_or("/"))]);
        self.send("dir", request).await
    }

    async fn get_concept_children(&self, path: Option<&str>) -> Result<Vec<ConceptEntry>> {
        let param = path.map_or_else(|| "::".to_string(), |path| format!("'{path}'"));
        let request = self.get("execute").query(&[
            ("func", CONCEPT_CHILDREN_FUNCTION),
            ("param", param.as_str()),
            ("format", "raw"),
        ]);
        self.send("execute", request).await
    }

    async fn execute(
        &self,
        open_files: &[OpenFileRequest],
        endpoint: &str,
        extra_params: &Value,
    ) -> Result<Value> {
        let body = json!({
            "extraParams": extra_params,
            "openFiles": open_files,
            "mode": self.mode,
            "sessionId": self.session_id,
        });
        let request = self.http.post(self.url(endpoint)).json(&body);
        self.send(endpoint, request).await
    }

    async fn execution_activity(&self) -> Result<ExecutionActivity> {
        self.send("executionActivity", self.get("executionActivity"))
            .await
    }

    async fn check_test_run(&self, runner_id: u64) -> Result<TestRunStatus> {
        let request = self.get("testResult").query(&[("testRunnerId", runner_id)]);
        self.send("testResult", request).await
    }

    async fn cancel_test_run(&self, runner_id: u64) -> Result<()> {
        let request = self.get("testCancel").query(&[("testRunnerId", runner_id)]);
        let _: Value = self.send("testCancel", request).await?;
        Ok(())
    }

    async fn find_files(&self, query: &str, regex: bool) -> Result<Vec<String>> {
        let request = self
            .get("findPureFiles")
            .query(&[("file", query)])
            .query(&[("regex", regex)]);
        self.send("findPureFiles", request).await
    }

    async fn find_in_sources(
        &self,
        query: &str,
        case_sensitive: bool,
        regex: bool,
    ) -> Result<Vec<SearchResultEntry>> {
        let request = self
            .get("findInSources")
            .query(&[("string", query)])
            .query(&[("caseSensitive", case_sensitive), ("regex", regex)]);
        self.send("findInSources", request).await
    }

    async fn get_concept_path(&self, file: &str, line: u32, column: u32) -> Result<UsageConcept> {
        let request = self
            .get("getConceptPath")
            .query(&[("file", file)])
            .query(&[("line", line), ("column", column)]);
        self.send("getConceptPath", request).await
    }

    async fn get_usages(&self, function: &str, args: &[String]) -> Result<Vec<Usage>> {
        let mut query: Vec<(&str, &str)> = vec![("func", function), ("format", "raw")];
        query.extend(args.iter().map(|arg| ("param", arg.as_str())));
        let request = self.get("execute").query(&query);
        self.send("execute", request).await
    }

    async fn create_file(&self, path: &str) -> Result<Value> {
        let endpoint = format!("newFile/{path}");
        self.send(&endpoint, self.get(&endpoint)).await
    }

    async fn create_folder(&self, path: &str) -> Result<Value> {
        let endpoint = format!("newFolder/{path}");
        self.send(&endpoint, self.get(&endpoint)).await
    }

    async fn delete_directory_or_file(&self, path: &str) -> Result<Value> {
        let endpoint = format!("deleteFile/{path}");
        self.send(&endpoint, self.get(&endpoint)).await
    }
}
