use crate::error::{Result, SessionError};
use crate::session::{IdeSession, SearchState};
use crate::test_runner::TestRunner;
use async_trait::async_trait;
use pure_ide_protocol::{Candidate, ExecutionResult, FileCoordinate};
use pure_ide_tree::BlockingAlert;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Consecutive reinitializations tolerated for one execution.
pub const MAX_REINIT_ROUNDS: usize = 3;

const EXECUTING: &str = "Executing...";
const DO_NOT_REFRESH: &str = "Please do not refresh the application";

/// Follow-up behavior for a decoded execution result.
#[async_trait]
pub trait ResultHandler: Send + Sync {
    async fn handle(&self, session: &IdeSession, result: &ExecutionResult) -> Result<()>;
}

/// Terminal outcome of one `execute` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// A precondition failed; nothing was sent.
    Rejected,
    /// The server declared the session unusable.
    SessionCorrupted(String),
    Completed(ExecutionResult),
}

impl IdeSession {
    /// Runs one compile/execute round-trip through the shared execution slot.
    ///
    /// Open buffers are sent with the request. When `check_status` is set the
    /// server's execution activity is polled while the request is pending.
    /// A `reinit` success reinitializes the session and repeats the request, so
    /// `handler` sees exactly one result.
    pub async fn execute(
        &self,
        endpoint: &str,
        extra_params: Value,
        check_status: bool,
        handler: &dyn ResultHandler,
    ) -> Result<ExecutionOutcome> {
        if !self.init_state.has_succeeded() {
            self.notifier
                .notify_warning("Can't execute while initializing application");
            return Ok(ExecutionOutcome::Rejected);
        }
        if let Some(session_error) = self.session_error().await {
            self.notifier.notify_warning(&format!(
                "Can't execute until the session is re-initialized: {session_error}"
            ));
            return Ok(ExecutionOutcome::Rejected);
        }
        let Some(_slot) = self.execution_state.begin_slot() else {
            self.notifier
                .notify_warning("Another execution is already in progress!");
            return Ok(ExecutionOutcome::Rejected);
        };

        {
            let mut search = self.search_state.lock().await;
            if !matches!(*search, Some(SearchState::Text(_))) {
                *search = None;
            }
        }

        let mut reinit_rounds = 0;
        loop {
            let result = match self.execute_once(endpoint, &extra_params, check_status).await {
                Ok(result) => result,
                Err(err) => {
                    self.notifier.set_blocking_alert(None);
                    self.notifier.notify_error(&err.to_string());
                    return Err(err);
                }
            };
            self.notifier.set_blocking_alert(None);
            self.set_console_text(result.text()).await;

            if let Some(failure) = result.failure() {
                self.notifier.notify_warning("Execution failed!");
                if let Some(session_error) = &failure.session_error {
                    log::error!("Session corrupted during '{endpoint}': {session_error}");
                    *self.session_error.lock().await = Some(session_error.clone());
                    self.notifier.set_blocking_alert(Some(
                        BlockingAlert::new("Session corrupted").with_prompt(session_error),
                    ));
                    return Ok(ExecutionOutcome::SessionCorrupted(session_error.clone()));
                }
                handler.handle(self, &result).await?;
                return Ok(ExecutionOutcome::Completed(result));
            }

            if let ExecutionResult::Success(success) = &result {
                self.notifier.notify_success("Execution succeeded!");
                if success.reinit {
                    reinit_rounds += 1;
                    if reinit_rounds > MAX_REINIT_ROUNDS {
                        return Err(self.illegal_state(&format!(
                            "Server kept requesting reinitialization for '{endpoint}'"
                        )));
                    }
                    log::info!("Reinitializing before repeating '{endpoint}' (round {reinit_rounds})");
                    self.notifier.set_blocking_alert(Some(
                        BlockingAlert::new("Reinitializing...")
                            .with_prompt(DO_NOT_REFRESH)
                            .loading(),
                    ));
                    self.init_state.reset();
                    self.initialize(false).await?;
                    if let Some(session_error) = self.session_error().await {
                        return Ok(ExecutionOutcome::SessionCorrupted(session_error));
                    }
                    continue;
                }

                handler.handle(self, &result).await?;
                for path in &success.modified_files {
                    self.reload_file(path).await?;
                }
                return Ok(ExecutionOutcome::Completed(result));
            }

            handler.handle(self, &result).await?;
            return Ok(ExecutionOutcome::Completed(result));
        }
    }

    async fn execute_once(
        &self,
        endpoint: &str,
        extra_params: &Value,
        check_status: bool,
    ) -> Result<ExecutionResult> {
        self.notifier.set_blocking_alert(Some(executing_alert(None)));
        let open_files = self.workspace.lock().await.open_files_request();
        log::debug!("Executing '{endpoint}' with {} open file(s)", open_files.len());

        let request = self.client.execute(&open_files, endpoint, extra_params);
        let response = if check_status {
            let (response, ()) = tokio::join!(request, self.poll_execution_status());
            response?
        } else {
            request.await?
        };
        Ok(ExecutionResult::from_value(response)?)
    }

    /// Polls execution activity every status-poll interval until the server is idle.
    ///
    /// Status errors end the loop; the execution response itself still decides the outcome.
    async fn poll_execution_status(&self) {
        loop {
            match self.client.execution_activity().await {
                Ok(activity) => {
                    self.notifier
                        .set_blocking_alert(Some(executing_alert(activity.text.as_deref())));
                    if !activity.executing {
                        return;
                    }
                }
                Err(err) => {
                    log::warn!("Execution status unavailable: {err}");
                    return;
                }
            }
            tokio::time::sleep(self.config.status_poll).await;
        }
    }

    /// Compiles and runs the `go()` entry point.
    pub async fn execute_go(&self) -> Result<ExecutionOutcome> {
        self.execute("executeGo", json!({}), true, &GoHandler).await
    }

    /// Runs the tests under `path` and polls their results until the run finishes.
    pub async fn execute_tests(&self, path: &str, relevant_tests_only: bool) -> Result<ExecutionOutcome> {
        let Some(guard) = self.test_run_state.begin() else {
            self.notifier
                .notify_warning("Test runner is working. Please try again later");
            return Ok(ExecutionOutcome::Rejected);
        };
        let handler = TestsHandler::default();
        let outcome = self
            .execute(
                "executeTests",
                json!({ "path": path, "relevantTestsOnly": relevant_tests_only }),
                false,
                &handler,
            )
            .await;
        if handler.completed.load(Ordering::SeqCst) {
            guard.succeed();
        } else {
            guard.fail();
        }
        outcome
    }

    pub async fn execute_full_test_suite(&self, relevant_tests_only: bool) -> Result<ExecutionOutcome> {
        self.execute_tests("::", relevant_tests_only).await
    }

    /// Jumps to the definition under `coordinate`, bookmarking it for `navigate_back`.
    pub async fn execute_navigation(&self, coordinate: FileCoordinate) -> Result<ExecutionOutcome> {
        let params = json!({
            "file": coordinate.file(),
            "line": coordinate.line(),
            "column": coordinate.column(),
        });
        let outcome = self
            .execute("getConcept", params, false, &NavigationHandler)
            .await?;
        // Only a jump the server answered leaves a bookmark.
        if matches!(outcome, ExecutionOutcome::Completed(_)) {
            self.navigation.lock().await.push(coordinate);
        }
        Ok(outcome)
    }

    /// Saves server state and reinitializes whatever the server answers.
    pub async fn execute_save_and_reset(&self, full_init: bool) -> Result<ExecutionOutcome> {
        self.execute(
            "executeSaveAndReset",
            json!({}),
            true,
            &SaveAndResetHandler { full_init },
        )
        .await
    }

    /// Applies a fix suggestion (usually a missing import) and recompiles.
    pub async fn update_file_using_candidate(&self, candidate: &Candidate) -> Result<ExecutionOutcome> {
        let (Some(path), Some(line), Some(column)) = (
            candidate.file_to_be_modified.as_deref(),
            candidate.line_to_be_modified,
            candidate.column_to_be_modified,
        ) else {
            return Err(self.illegal_state(&format!(
                "Candidate '{}' does not describe a source update",
                candidate.found_name
            )));
        };
        self.set_search_state(None).await;
        let params = json!({
            "updatePath": path,
            "updateSources": [{
                "path": path,
                "line": line,
                "column": column,
                "add": candidate.add,
                "message": candidate.message_to_be_modified.as_deref().unwrap_or_default(),
            }],
        });
        self.execute("updateSource", params, false, &GoHandler).await
    }

    /// Cancels the active test run. Returns false when none is running.
    pub async fn cancel_test_run(&self) -> Result<bool> {
        let Some(runner) = self.test_runner().await else {
            self.notifier.notify_warning("No test run to cancel");
            return Ok(false);
        };
        runner.cancel().await?;
        Ok(true)
    }

    /// Opens the file a failure points at.
    async fn reveal_failure(&self, result: &ExecutionResult) -> Result<()> {
        let Some(coordinate) = result.failure().and_then(|failure| failure.coordinate()) else {
            return Ok(());
        };
        self.load_file(coordinate.file(), Some(coordinate.clone()))
            .await
    }
}

fn log_refresh_failure(refreshed: Result<()>) {
    if let Err(err) = refreshed {
        log::warn!("Tree refresh after execution failed: {err}");
    }
}

fn executing_alert(prompt: Option<&str>) -> BlockingAlert {
    BlockingAlert::new(EXECUTING)
        .with_prompt(prompt.unwrap_or(DO_NOT_REFRESH))
        .loading()
}

/// Reveals failures, offers fix suggestions and refreshes the trees.
pub struct GoHandler;

#[async_trait]
impl ResultHandler for GoHandler {
    async fn handle(&self, session: &IdeSession, result: &ExecutionResult) -> Result<()> {
        let handled = async {
            session.reveal_failure(result).await?;
            match result {
                ExecutionResult::UnmatchedFunction(unmatched) => {
                    session
                        .set_search_state(Some(SearchState::UnmatchedFunction(unmatched.clone())))
                        .await;
                }
                ExecutionResult::UnmatchedSymbol(unmatched) => {
                    session
                        .set_search_state(Some(SearchState::UnmatchedSymbol(unmatched.clone())))
                        .await;
                }
                _ => {}
            }
            Ok::<_, SessionError>(())
        };
        let (refreshed, handled) = tokio::join!(session.refresh_trees(), handled);
        log_refresh_failure(refreshed);
        handled
    }
}

/// Builds the test runner for a started run and polls it to completion.
#[derive(Default)]
struct TestsHandler {
    completed: AtomicBool,
}

#[async_trait]
impl ResultHandler for TestsHandler {
    async fn handle(&self, session: &IdeSession, result: &ExecutionResult) -> Result<()> {
        let handled = async {
            match result {
                ExecutionResult::TestExecution(execution) => {
                    let runner = Arc::new(TestRunner::new(
                        Arc::clone(&session.client),
                        Arc::clone(&session.notifier),
                        execution.clone(),
                        session.config.test_poll,
                    ));
                    *session.test_runner.lock().await = Some(Arc::clone(&runner));
                    runner.build_tree().await?;
                    runner.poll_results().await?;
                    self.completed.store(true, Ordering::SeqCst);
                }
                other => session.reveal_failure(other).await?,
            }
            Ok::<_, SessionError>(())
        };
        let (refreshed, handled) = tokio::join!(session.refresh_trees(), handled);
        log_refresh_failure(refreshed);
        handled
    }
}

struct NavigationHandler;

#[async_trait]
impl ResultHandler for NavigationHandler {
    async fn handle(&self, session: &IdeSession, result: &ExecutionResult) -> Result<()> {
        let ExecutionResult::Concept(concept) = result else {
            return Ok(());
        };
        match concept.jump_to.coordinate() {
            Some(coordinate) => {
                session
                    .load_file(coordinate.file(), Some(coordinate.clone()))
                    .await
            }
            None => {
                log::warn!("Ignoring jump to invalid location in {}", concept.jump_to.source);
                Ok(())
            }
        }
    }
}

struct SaveAndResetHandler {
    full_init: bool,
}

#[async_trait]
impl ResultHandler for SaveAndResetHandler {
    async fn handle(&self, session: &IdeSession, _result: &ExecutionResult) -> Result<()> {
        session.init_state.reset();
        session.initialize(self.full_init).await
    }
}
