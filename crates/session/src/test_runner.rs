use crate::client::SessionClient;
use crate::error::Result;
use async_trait::async_trait;
use pure_ide_protocol::{TestExecution, TestInfo, TestResult, TestResultStatus};
use pure_ide_tree::{Notifier, TreeEngine, TreeNode, TreeSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Serves the hierarchy returned by a test run; nothing is fetched remotely.
pub struct TestTreeSource {
    roots: Vec<TestInfo>,
}

impl TestTreeSource {
    pub fn new(roots: Vec<TestInfo>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[TestInfo] {
        &self.roots
    }

    pub fn find(&self, id: &str) -> Option<&TestInfo> {
        fn search<'a>(nodes: &'a [TestInfo], id: &str) -> Option<&'a TestInfo> {
            nodes.iter().find_map(|node| {
                if node.id == id {
                    Some(node)
                } else {
                    search(&node.children, id)
                }
            })
        }
        search(&self.roots, id)
    }
}

#[async_trait]
impl TreeSource for TestTreeSource {
    type Record = TestInfo;
    type Value = TestInfo;

    async fn get_root_nodes(&self) -> anyhow::Result<Vec<TestInfo>> {
        Ok(self.roots.clone())
    }

    async fn get_child_nodes(&self, node: &TreeNode<TestInfo>) -> anyhow::Result<Vec<TestInfo>> {
        Ok(node.data.children.clone())
    }

    fn to_node(&self, info: TestInfo) -> TreeNode<TestInfo> {
        let id = info.id.clone();
        let label = info.text.clone();
        if info.is_test() || info.children.is_empty() {
            TreeNode::leaf(id, label, info)
        } else {
            TreeNode::new(id, label, info)
        }
    }
}

/// Aggregate state of a test or of everything below a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestStatus {
    Passed,
    Running,
    Failed,
    Error,
}

impl From<TestResultStatus> for TestStatus {
    fn from(status: TestResultStatus) -> Self {
        match status {
            TestResultStatus::Success => Self::Passed,
            TestResultStatus::Failure => Self::Failed,
            TestResultStatus::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub running: usize,
}

/// One server-side test run: its tree, collected results and poll loop.
pub struct TestRunner {
    client: Arc<dyn SessionClient>,
    notifier: Arc<dyn Notifier>,
    execution: TestExecution,
    tree: TreeEngine<TestTreeSource>,
    results: Mutex<HashMap<String, TestResult>>,
    cancelled: AtomicBool,
    finished: AtomicBool,
    poll_interval: Duration,
}

impl TestRunner {
    pub fn new(
        client: Arc<dyn SessionClient>,
        notifier: Arc<dyn Notifier>,
        execution: TestExecution,
        poll_interval: Duration,
    ) -> Self {
        let tree = TreeEngine::new(
            TestTreeSource::new(execution.tests.clone()),
            Arc::clone(&notifier),
        );
        Self {
            client,
            notifier,
            execution,
            tree,
            results: Mutex::new(HashMap::new()),
            cancelled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            poll_interval,
        }
    }

    pub fn runner_id(&self) -> u64 {
        self.execution.runner_id
    }

    pub fn execution(&self) -> &TestExecution {
        &self.execution
    }

    pub fn tree(&self) -> &TreeEngine<TestTreeSource> {
        &self.tree
    }

    pub async fn build_tree(&self) -> Result<()> {
        self.tree.initialize().await?;
        Ok(())
    }

    /// Polls the runner until the server reports it finished or a cancel lands.
    pub async fn poll_results(&self) -> Result<()> {
        loop {
            if self.is_cancelled() {
                log::info!("Test run {} cancelled", self.runner_id());
                return Ok(());
            }

            let status = self.client.check_test_run(self.runner_id()).await?;
            {
                let mut results = self.results.lock().await;
                for result in status.tests {
                    results.insert(result.test_id(), result);
                }
            }

            if status.finished {
                self.finished.store(true, Ordering::SeqCst);
                let summary = self.summary().await;
                log::info!(
                    "Test run {} finished: {} passed, {} failed, {} errors",
                    self.runner_id(),
                    summary.passed,
                    summary.failed,
                    summary.errors
                );
                return Ok(());
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Asks the server to stop the run; the poll loop exits on its next pass.
    pub async fn cancel(&self) -> Result<()> {
        if self.is_finished() {
            self.notifier.notify_warning("Test run has already finished");
            return Ok(());
        }
        self.client.cancel_test_run(self.runner_id()).await?;
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn result(&self, id: &str) -> Option<TestResult> {
        self.results.lock().await.get(id).cloned()
    }

    /// Status of a test, or the worst status among the tests under a package.
    pub async fn status_of(&self, id: &str) -> Option<TestStatus> {
        let info = self.tree.source().find(id)?;
        let results = self.results.lock().await;
        Some(aggregate(info, &results))
    }

    pub async fn summary(&self) -> TestSummary {
        let results = self.results.lock().await;
        let mut summary = TestSummary::default();
        let mut pending: Vec<&TestInfo> = self.tree.source().roots().iter().collect();
        while let Some(info) = pending.pop() {
            if info.is_test() {
                summary.total += 1;
                match test_status(info, &results) {
                    TestStatus::Passed => summary.passed += 1,
                    TestStatus::Failed => summary.failed += 1,
                    TestStatus::Error => summary.errors += 1,
                    TestStatus::Running => summary.running += 1,
                }
            }
            pending.extend(info.children.iter());
        }
        summary
    }
}

fn test_status(info: &TestInfo, results: &HashMap<String, TestResult>) -> TestStatus {
    results
        .get(&info.id)
        .map_or(TestStatus::Running, |result| result.status.into())
}

fn aggregate(info: &TestInfo, results: &HashMap<String, TestResult>) -> TestStatus {
    if info.is_test() {
        return test_status(info, results);
    }
    info.children
        .iter()
        .map(|child| aggregate(child, results))
        .max()
        .unwrap_or(TestStatus::Passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test(id: &str) -> TestInfo {
        TestInfo {
            id: id.to_string(),
            text: id.to_string(),
            kind: Some("test".to_string()),
            file: None,
            line: None,
            column: None,
            children: Vec::new(),
        }
    }

    fn package(id: &str, children: Vec<TestInfo>) -> TestInfo {
        TestInfo {
            kind: None,
            children,
            ..test(id)
        }
    }

    fn result(id: &str, status: TestResultStatus) -> (String, TestResult) {
        let result = TestResult {
            test: id.split("::").map(str::to_string).collect(),
            status,
            error: None,
        };
        (result.test_id(), result)
    }

    #[test]
    fn package_status_is_worst_child() {
        let tree = package(
            "pkg",
            vec![test("pkg::a"), test("pkg::b"), package("pkg::sub", vec![test("pkg::sub::c")])],
        );
        let mut results: HashMap<_, _> = [result("pkg::a", TestResultStatus::Success)].into();
        assert_eq!(aggregate(&tree, &results), TestStatus::Running);

        results.extend([
            result("pkg::b", TestResultStatus::Failure),
            result("pkg::sub::c", TestResultStatus::Success),
        ]);
        assert_eq!(aggregate(&tree, &results), TestStatus::Failed);

        results.extend([result("pkg::sub::c", TestResultStatus::Error)]);
        assert_eq!(aggregate(&tree, &results), TestStatus::Error);
        assert_eq!(aggregate(&tree.children[0], &results), TestStatus::Passed);
    }

    #[test]
    fn finds_nested_nodes() {
        let source = TestTreeSource::new(vec![package("pkg", vec![test("pkg::a")])]);
        assert!(source.find("pkg::a").is_some());
        assert!(source.find("pkg::missing").is_none());
    }
}
