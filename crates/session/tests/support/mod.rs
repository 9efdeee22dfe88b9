#![allow(dead_code)]

use async_trait::async_trait;
use pure_ide_protocol::{
    ConceptEntry, DirectoryEntry, ExecutionActivity, InitializationActivity, OpenFileRequest,
    PureFile, SearchResultEntry, TestRunStatus, Usage, UsageConcept,
};
use pure_ide_session::{IdeSession, Result, SessionClient, SessionConfig, SessionError};
use pure_ide_tree::{BlockingAlert, Notifier};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const WELCOME: &str = "/welcome.pure";

/// Responses a [`ScriptedClient`] hands out, plus what it was asked.
#[derive(Default)]
pub struct Script {
    pub init_responses: VecDeque<Value>,
    pub init_activities: VecDeque<InitializationActivity>,
    pub execute_responses: VecDeque<Value>,
    pub execution_activities: VecDeque<ExecutionActivity>,
    pub test_statuses: VecDeque<TestRunStatus>,
    pub files: HashMap<String, String>,
    /// Keyed by parent path; "" lists the roots.
    pub directories: HashMap<String, Vec<DirectoryEntry>>,
    pub concepts: HashMap<String, Vec<ConceptEntry>>,
    pub command_response: Option<Value>,
    pub concept_path: Option<UsageConcept>,
    pub usages: Vec<Usage>,

    pub initialize_calls: usize,
    pub executed: Vec<(String, Value, Vec<OpenFileRequest>)>,
    pub file_fetches: Vec<String>,
    pub usage_queries: Vec<(String, Vec<String>)>,
    pub commands: Vec<String>,
    pub cancelled: Vec<u64>,
}

/// In-memory [`SessionClient`] driven by a [`Script`].
#[derive(Default)]
pub struct ScriptedClient {
    pub script: Mutex<Script>,
    /// When set, `execute` waits for a permit before answering.
    pub execute_gate: Option<Arc<Notify>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        let client = Self::default();
        client.with(|script| {
            script.files.insert(WELCOME.to_string(), "// welcome\n".to_string());
        });
        client
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            execute_gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        f(&mut self.script.lock().expect("script lock"))
    }

    pub fn executed_endpoints(&self) -> Vec<String> {
        self.with(|script| script.executed.iter().map(|(e, _, _)| e.clone()).collect())
    }

    fn missing(what: &str) -> SessionError {
        SessionError::Other(format!("scripted client has no {what}"))
    }
}

#[async_trait]
impl SessionClient for ScriptedClient {
    async fn initialize(
        &self,
        _request_refresh: bool,
        _mode: Option<&str>,
        _fast_compile: Option<&str>,
    ) -> Result<Value> {
        self.with(|script| {
            script.initialize_calls += 1;
            Ok(script
                .init_responses
                .pop_front()
                .unwrap_or_else(|| json!({ "text": "" })))
        })
    }

    async fn initialization_activity(&self) -> Result<InitializationActivity> {
        self.with(|script| Ok(script.init_activities.pop_front().unwrap_or_default()))
    }

    async fn get_file(&self, path: &str) -> Result<PureFile> {
        self.with(|script| {
            script.file_fetches.push(path.to_string());
            script
                .files
                .get(path)
                .map(|content| PureFile {
                    content: content.clone(),
                })
                .ok_or_else(|| Self::missing(path))
        })
    }

    async fn get_directory_children(&self, path: Option<&str>) -> Result<Vec<DirectoryEntry>> {
        self.with(|script| {
            Ok(script
                .directories
                .get(path.unwrap_or(""))
                .cloned()
                .unwrap_or_default())
        })
    }

    async fn get_concept_children(&self, path: Option<&str>) -> Result<Vec<ConceptEntry>> {
        self.with(|script| {
            Ok(script
                .concepts
                .get(path.unwrap_or(""))
                .cloned()
                .unwrap_or_default())
        })
    }

    async fn execute(
        &self,
        open_files: &[OpenFileRequest],
        endpoint: &str,
        extra_params: &Value,
    ) -> Result<Value> {
        self.with(|script| {
            script.executed.push((
                endpoint.to_string(),
                extra_params.clone(),
                open_files.to_vec(),
            ))
        });
        if let Some(gate) = &self.execute_gate {
            gate.notified().await;
        }
        self.with(|script| {
            script
                .execute_responses
                .pop_front()
                .ok_or_else(|| Self::missing("execute response"))
        })
    }

    async fn execution_activity(&self) -> Result<ExecutionActivity> {
        self.with(|script| Ok(script.execution_activities.pop_front().unwrap_or_default()))
    }

    async fn check_test_run(&self, _runner_id: u64) -> Result<TestRunStatus> {
        self.with(|script| {
            Ok(script.test_statuses.pop_front().unwrap_or(TestRunStatus {
                finished: true,
                tests: Vec::new(),
            }))
        })
    }

    async fn cancel_test_run(&self, runner_id: u64) -> Result<()> {
        self.with(|script| script.cancelled.push(runner_id));
        Ok(())
    }

    async fn find_files(&self, query: &str, _regex: bool) -> Result<Vec<String>> {
        self.with(|script| {
            Ok(script
                .files
                .keys()
                .filter(|path| path.contains(query))
                .cloned()
                .collect())
        })
    }

    async fn find_in_sources(
        &self,
        _query: &str,
        _case_sensitive: bool,
        _regex: bool,
    ) -> Result<Vec<SearchResultEntry>> {
        Ok(Vec::new())
    }

    async fn get_concept_path(&self, _file: &str, _line: u32, _column: u32) -> Result<UsageConcept> {
        self.with(|script| {
            script
                .concept_path
                .clone()
                .ok_or_else(|| Self::missing("concept"))
        })
    }

    async fn get_usages(&self, function: &str, args: &[String]) -> Result<Vec<Usage>> {
        self.with(|script| {
            script
                .usage_queries
                .push((function.to_string(), args.to_vec()));
            Ok(script.usages.clone())
        })
    }

    async fn create_file(&self, path: &str) -> Result<Value> {
        self.command("createFile", path)
    }

    async fn create_folder(&self, path: &str) -> Result<Value> {
        self.command("createFolder", path)
    }

    async fn delete_directory_or_file(&self, path: &str) -> Result<Value> {
        self.command("delete", path)
    }
}

impl ScriptedClient {
    fn command(&self, kind: &str, path: &str) -> Result<Value> {
        self.with(|script| {
            script.commands.push(format!("{kind} {path}"));
            Ok(script
                .command_response
                .clone()
                .unwrap_or_else(|| json!({ "text": "" })))
        })
    }
}

/// Notifier that keeps every message for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    pub successes: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub illegal_states: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<Option<BlockingAlert>>>,
}

impl RecordingNotifier {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().expect("lock").clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("lock").clone()
    }

    pub fn illegal_states(&self) -> Vec<String> {
        self.illegal_states.lock().expect("lock").clone()
    }

    pub fn last_alert(&self) -> Option<BlockingAlert> {
        self.alerts.lock().expect("lock").last().cloned().flatten()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.successes.lock().expect("lock").push(message.to_string());
    }

    fn notify_warning(&self, message: &str) {
        self.warnings.lock().expect("lock").push(message.to_string());
    }

    fn notify_error(&self, message: &str) {
        self.errors.lock().expect("lock").push(message.to_string());
    }

    fn notify_illegal_state(&self, message: &str) {
        self.illegal_states
            .lock()
            .expect("lock")
            .push(message.to_string());
    }

    fn set_blocking_alert(&self, alert: Option<BlockingAlert>) {
        self.alerts.lock().expect("lock").push(alert);
    }
}

pub struct Harness {
    pub client: Arc<ScriptedClient>,
    pub notifier: Arc<RecordingNotifier>,
    pub session: Arc<IdeSession>,
}

pub fn harness(client: ScriptedClient) -> Harness {
    let client = Arc::new(client);
    let notifier = Arc::new(RecordingNotifier::default());
    let session = Arc::new(IdeSession::new(
        Arc::clone(&client) as Arc<dyn SessionClient>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        SessionConfig::default(),
    ));
    Harness {
        client,
        notifier,
        session,
    }
}

/// A harness whose session has already initialized successfully.
pub async fn initialized(client: ScriptedClient) -> Harness {
    let harness = harness(client);
    harness
        .session
        .initialize(false)
        .await
        .expect("initialize");
    harness
}

pub fn directory(path: &str, is_file: bool) -> DirectoryEntry {
    serde_json::from_value(json!({
        "id": path,
        "path": path,
        "text": path.rsplit('/').next().unwrap_or(path),
        "file": is_file,
    }))
    .expect("directory entry")
}
