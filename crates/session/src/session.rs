use crate::client::SessionClient;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::navigation::NavigationStack;
use crate::test_runner::TestRunner;
use crate::trees::{ConceptTreeSource, DirectoryTreeSource};
use crate::workspace::Workspace;
use pure_ide_protocol::{
    trim_path_leading_slash, CommandResult, FileCoordinate, InitializationResult,
    SearchResultEntry, UnmatchedFunctionFailure, UnmatchedSymbolFailure, Usage, UsageConcept,
};
use pure_ide_tree::{ActionState, ActionStatus, BlockingAlert, Notifier, TreeEngine};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

const FIND_USAGES_ERROR: &str = "Error finding references. Please make sure that the code compiles and that you are looking for references of non primitive types!";

/// Result list shown in the search panel.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Text(Vec<SearchResultEntry>),
    Usages {
        concept: UsageConcept,
        usages: Vec<Usage>,
    },
    UnmatchedSymbol(UnmatchedSymbolFailure),
    UnmatchedFunction(UnmatchedFunctionFailure),
}

/// One client session against the IDE server.
///
/// Owns the open buffers, the navigation history and the directory/concept
/// trees, and serializes executions through a single slot (see
/// [`IdeSession::execute`]).
pub struct IdeSession {
    pub(crate) client: Arc<dyn SessionClient>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) config: SessionConfig,
    pub(crate) workspace: Mutex<Workspace>,
    pub(crate) navigation: Mutex<NavigationStack>,
    directory_tree: TreeEngine<DirectoryTreeSource>,
    concept_tree: TreeEngine<ConceptTreeSource>,
    pub(crate) init_state: ActionState,
    pub(crate) execution_state: ActionState,
    pub(crate) test_run_state: ActionState,
    text_search_state: ActionState,
    file_search_state: ActionState,
    pub(crate) search_state: Mutex<Option<SearchState>>,
    console: Mutex<String>,
    pub(crate) session_error: Mutex<Option<String>>,
    pub(crate) test_runner: Mutex<Option<Arc<TestRunner>>>,
}

impl IdeSession {
    pub fn new(
        client: Arc<dyn SessionClient>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Self {
        let directory_tree = TreeEngine::new(
            DirectoryTreeSource::new(Arc::clone(&client)),
            Arc::clone(&notifier),
        );
        let concept_tree = TreeEngine::new(
            ConceptTreeSource::new(Arc::clone(&client)),
            Arc::clone(&notifier),
        );
        let navigation = NavigationStack::with_limit(config.navigation_limit);
        Self {
            client,
            notifier,
            config,
            workspace: Mutex::new(Workspace::default()),
            navigation: Mutex::new(navigation),
            directory_tree,
            concept_tree,
            init_state: ActionState::new(),
            execution_state: ActionState::new(),
            test_run_state: ActionState::new(),
            text_search_state: ActionState::new(),
            file_search_state: ActionState::new(),
            search_state: Mutex::new(None),
            console: Mutex::new(String::new()),
            session_error: Mutex::new(None),
            test_runner: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn SessionClient> {
        &self.client
    }

    pub fn directory_tree(&self) -> &TreeEngine<DirectoryTreeSource> {
        &self.directory_tree
    }

    pub fn concept_tree(&self) -> &TreeEngine<ConceptTreeSource> {
        &self.concept_tree
    }

    pub fn init_state(&self) -> &ActionState {
        &self.init_state
    }

    pub fn execution_state(&self) -> &ActionState {
        &self.execution_state
    }

    pub fn test_run_state(&self) -> &ActionState {
        &self.test_run_state
    }

    /// Open buffers. Editors hold the lock only while applying an edit.
    pub async fn workspace(&self) -> MutexGuard<'_, Workspace> {
        self.workspace.lock().await
    }

    pub async fn navigation_depth(&self) -> usize {
        self.navigation.lock().await.len()
    }

    pub async fn console_text(&self) -> String {
        self.console.lock().await.clone()
    }

    pub(crate) async fn set_console_text(&self, text: &str) {
        let mut console = self.console.lock().await;
        console.clear();
        console.push_str(text);
    }

    pub async fn search_state(&self) -> Option<SearchState> {
        self.search_state.lock().await.clone()
    }

    pub(crate) async fn set_search_state(&self, state: Option<SearchState>) {
        *self.search_state.lock().await = state;
    }

    /// Set once the server reports the session unrecoverable; cleared by `initialize`.
    pub async fn session_error(&self) -> Option<String> {
        self.session_error.lock().await.clone()
    }

    pub async fn test_runner(&self) -> Option<Arc<TestRunner>> {
        self.test_runner.lock().await.clone()
    }

    /// Starts (or resumes) the server session and loads the workspace.
    ///
    /// Only valid from the initial state; reinitialization resets the state first.
    pub async fn initialize(&self, full_init: bool) -> Result<()> {
        if self.init_state.status() != ActionStatus::Initial {
            return Err(self.illegal_state("Session is re-initialized"));
        }
        let Some(guard) = self.init_state.begin() else {
            return Err(self.illegal_state("Session is re-initialized"));
        };
        *self.session_error.lock().await = None;

        match self.run_initialization(full_init).await {
            Ok(()) => {
                guard.succeed();
                Ok(())
            }
            Err(err) => {
                self.notifier.notify_error(&err.to_string());
                guard.fail();
                self.notifier.set_blocking_alert(Some(
                    BlockingAlert::new("Failed to initialize IDE").with_prompt(
                        "Make sure the IDE server is working, otherwise try to restart it",
                    ),
                ));
                Err(err)
            }
        }
    }

    async fn run_initialization(&self, full_init: bool) -> Result<()> {
        log::info!("Initializing session against {}", self.config.server_url);
        let request = self.client.initialize(
            !full_init,
            self.config.mode.as_deref(),
            self.config.fast_compile.as_deref(),
        );
        self.notifier.set_blocking_alert(Some(
            BlockingAlert::new("Loading Pure IDE...")
                .with_prompt("Please be patient as we are building the initial application state")
                .loading(),
        ));
        let load_workspace = async {
            self.poll_initialization_activity(None).await?;
            self.notifier.set_blocking_alert(None);
            let (welcome, directories, concepts) = tokio::join!(
                self.load_file(&self.config.welcome_file, None),
                self.directory_tree.initialize(),
                self.concept_tree.initialize(),
            );
            welcome?;
            directories?;
            concepts?;
            Ok::<_, SessionError>(())
        };
        let (response, loaded) = tokio::join!(request, load_workspace);

        let result = InitializationResult::from_value(response?)?;
        if let Some(text) = result.text() {
            self.set_console_text(text).await;
        }
        match &result {
            InitializationResult::Success(_) => loaded,
            InitializationResult::Failure(_) | InitializationResult::FailureWithSource(_) => {
                if let Err(err) = loaded {
                    log::debug!("Workspace load after failed initialization: {err}");
                }
                if let Some(session_error) = result.session_error() {
                    *self.session_error.lock().await = Some(session_error.to_string());
                    self.notifier.set_blocking_alert(Some(
                        BlockingAlert::new("Session corrupted").with_prompt(session_error),
                    ));
                } else if let InitializationResult::FailureWithSource(failure) = &result {
                    self.load_file(&failure.source, failure.coordinate()).await?;
                }
                Ok(())
            }
        }
    }

    /// Polls initialization activity until the server is idle.
    ///
    /// With a `message`, progress text from the server is shown as its prompt.
    pub async fn poll_initialization_activity(&self, message: Option<&str>) -> Result<()> {
        loop {
            let activity = self.client.initialization_activity().await?;
            if let (Some(message), Some(text)) = (message, activity.text.as_deref()) {
                self.notifier.set_blocking_alert(Some(
                    BlockingAlert::new(message).with_prompt(text).loading(),
                ));
            }
            if !activity.initializing {
                return Ok(());
            }
            tokio::time::sleep(self.config.activity_poll).await;
        }
    }

    /// Blocks until a server that went idle has finished waking up.
    pub async fn check_session_waking_up(&self) -> Result<()> {
        let message = "Checking IDE session...";
        self.notifier
            .set_blocking_alert(Some(BlockingAlert::new(message).loading()));
        let polled = self.poll_initialization_activity(Some(message)).await;
        self.notifier.set_blocking_alert(None);
        polled
    }

    /// Focuses `path`, fetching it first if no buffer holds it yet.
    pub async fn load_file(&self, path: &str, coordinate: Option<FileCoordinate>) -> Result<()> {
        if self.workspace.lock().await.focus(path, coordinate.clone()) {
            return Ok(());
        }
        let file = self.client.get_file(path).await?;
        self.check_session_waking_up().await?;
        self.workspace.lock().await.open(path, file.content, coordinate);
        Ok(())
    }

    /// Replaces an open buffer with the server copy. Unopened paths are ignored.
    pub async fn reload_file(&self, path: &str) -> Result<()> {
        if !self.workspace.lock().await.is_open(path) {
            return Ok(());
        }
        let file = self.client.get_file(path).await?;
        self.workspace.lock().await.reload(path, file.content);
        Ok(())
    }

    pub async fn close_file(&self, path: &str) -> Result<()> {
        let closed = self.workspace.lock().await.close(path);
        closed.map_err(|err| self.report(err))
    }

    pub async fn close_all_other_files(&self, path: &str) -> Result<()> {
        let closed = self.workspace.lock().await.close_all_others(path);
        closed.map_err(|err| self.report(err))
    }

    pub async fn close_all_files(&self) {
        self.workspace.lock().await.close_all();
    }

    /// Interprets a workspace mutation response. Returns whether it succeeded.
    async fn command(&self, response: Result<Value>) -> bool {
        let result = response.and_then(|value| Ok(CommandResult::from_value(value)?));
        match result {
            Ok(CommandResult::Success { .. }) => true,
            Ok(CommandResult::Failure(failure)) => {
                if failure.error_dialog {
                    self.notifier
                        .notify_warning(&format!("Error: {}", failure.text));
                } else {
                    self.set_console_text(&failure.text).await;
                }
                false
            }
            Err(err) => {
                self.notifier.notify_error(&err.to_string());
                false
            }
        }
    }

    /// Creates a file and opens it once the directory tree shows it.
    pub async fn create_new_file(&self, path: &str) -> Result<bool> {
        let created = self
            .command(self.client.create_file(trim_path_leading_slash(path)).await)
            .await;
        self.directory_tree.refresh_tree_data().await?;
        if created {
            self.load_file(path, None).await?;
        }
        Ok(created)
    }

    pub async fn create_new_directory(&self, path: &str) -> Result<bool> {
        let created = self
            .command(self.client.create_folder(trim_path_leading_slash(path)).await)
            .await;
        self.directory_tree.refresh_tree_data().await?;
        Ok(created)
    }

    /// Deletes a path and closes every buffer under it.
    pub async fn delete_directory_or_file(&self, path: &str) -> Result<bool> {
        let deleted = self
            .command(
                self.client
                    .delete_directory_or_file(trim_path_leading_slash(path))
                    .await,
            )
            .await;
        {
            let mut workspace = self.workspace.lock().await;
            for open in workspace.paths_under(path) {
                workspace.close(&open)?;
            }
        }
        self.directory_tree.refresh_tree_data().await?;
        Ok(deleted)
    }

    /// File paths matching `query`. `None` while another file search runs.
    pub async fn search_files(&self, query: &str, regex: bool) -> Result<Option<Vec<String>>> {
        let Some(guard) = self.file_search_state.begin() else {
            return Ok(None);
        };
        let files = self.client.find_files(query, regex).await?;
        guard.succeed();
        Ok(Some(files))
    }

    /// Full-text search; results replace the search panel.
    pub async fn search_text(&self, query: &str, case_sensitive: bool, regex: bool) -> Result<()> {
        let Some(guard) = self.text_search_state.begin() else {
            return Ok(());
        };
        match self.client.find_in_sources(query, case_sensitive, regex).await {
            Ok(entries) => {
                self.set_search_state(Some(SearchState::Text(entries))).await;
                guard.succeed();
                Ok(())
            }
            Err(err) => {
                self.notifier.notify_error(&err.to_string());
                guard.fail();
                Err(err)
            }
        }
    }

    /// Lists usages of the concept under `coordinate`. Returns whether any lookup succeeded.
    pub async fn find_usages(&self, coordinate: &FileCoordinate) -> bool {
        let concept = match self
            .client
            .get_concept_path(coordinate.file(), coordinate.line(), coordinate.column())
            .await
        {
            Ok(concept) => concept,
            Err(err) => {
                log::debug!("Concept lookup at {coordinate} failed: {err}");
                self.notifier.notify_warning(FIND_USAGES_ERROR);
                return false;
            }
        };

        self.notifier.set_blocking_alert(Some(
            BlockingAlert::new("Finding concept usages...")
                .with_prompt(format!("Finding references of {}", concept.label()))
                .loading(),
        ));
        let (function, args) = concept.usage_function();
        let usages = self.client.get_usages(function, &args).await;
        self.notifier.set_blocking_alert(None);

        match usages {
            Ok(usages) => {
                self.set_search_state(Some(SearchState::Usages { concept, usages }))
                    .await;
                true
            }
            Err(err) => {
                log::debug!("Usage search for {} failed: {err}", concept.path);
                self.notifier.notify_warning(FIND_USAGES_ERROR);
                false
            }
        }
    }

    /// Jumps back to the last bookmark. Returns false when there is none.
    pub async fn navigate_back(&self) -> Result<bool> {
        let Some(coordinate) = self.navigation.lock().await.pop() else {
            self.notifier.notify_warning(
                "Can't navigate back any further - navigation stack is empty",
            );
            return Ok(false);
        };
        self.load_file(coordinate.file(), Some(coordinate.clone())).await?;
        Ok(true)
    }

    pub async fn refresh_trees(&self) -> Result<()> {
        let (directories, concepts) = tokio::join!(
            self.directory_tree.refresh_tree_data(),
            self.concept_tree.refresh_tree_data(),
        );
        directories?;
        concepts?;
        Ok(())
    }

    pub(crate) fn illegal_state(&self, message: &str) -> SessionError {
        self.notifier.notify_illegal_state(message);
        SessionError::IllegalState(message.to_string())
    }

    fn report(&self, err: SessionError) -> SessionError {
        if let SessionError::IllegalState(message) = &err {
            self.notifier.notify_illegal_state(message);
        }
        err
    }
}
