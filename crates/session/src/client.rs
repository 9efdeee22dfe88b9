use crate::error::Result;
use async_trait::async_trait;
use pure_ide_protocol::{
    ConceptEntry, DirectoryEntry, ExecutionActivity, InitializationActivity, OpenFileRequest,
    PureFile, SearchResultEntry, TestRunStatus, Usage, UsageConcept,
};
use serde_json::Value;

/// Remote operations of the IDE server.
///
/// Pure request/response: polling, retries and result interpretation belong to
/// the caller. Responses whose shape depends on a discriminator are returned as
/// raw JSON and decoded by the protocol crate.
#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn initialize(
        &self,
        request_refresh: bool,
        mode: Option<&str>,
        fast_compile: Option<&str>,
    ) -> Result<Value>;

    async fn initialization_activity(&self) -> Result<InitializationActivity>;

    async fn get_file(&self, path: &str) -> Result<PureFile>;

    /// Children of `path`, or the workspace roots when `None`.
    async fn get_directory_children(&self, path: Option<&str>) -> Result<Vec<DirectoryEntry>>;

    /// Children of the element at `path`, or the root packages when `None`.
    async fn get_concept_children(&self, path: Option<&str>) -> Result<Vec<ConceptEntry>>;

    async fn execute(
        &self,
        open_files: &[OpenFileRequest],
        endpoint: &str,
        extra_params: &Value,
    ) -> Result<Value>;

    async fn execution_activity(&self) -> Result<ExecutionActivity>;

    async fn check_test_run(&self, runner_id: u64) -> Result<TestRunStatus>;

    /// Returns once the server has acknowledged the cancellation.
    async fn cancel_test_run(&self, runner_id: u64) -> Result<()>;

    async fn find_files(&self, query: &str, regex: bool) -> Result<Vec<String>>;

    async fn find_in_sources(
        &self,
        query: &str,
        case_sensitive: bool,
        regex: bool,
    ) -> Result<Vec<SearchResultEntry>>;

    async fn get_concept_path(&self, file: &str, line: u32, column: u32) -> Result<UsageConcept>;

    async fn get_usages(&self, function: &str, args: &[String]) -> Result<Vec<Usage>>;

    async fn create_file(&self, path: &str) -> Result<Value>;

    async fn create_folder(&self, path: &str) -> Result<Value>;

    async fn delete_directory_or_file(&self, path: &str) -> Result<Value>;
}
