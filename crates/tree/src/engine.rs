use crate::action_state::{ActionState, ActionStatus};
use crate::error::{Result, TreeError};
use crate::node::{TreeData, TreeNode};
use crate::notify::Notifier;
use crate::source::TreeSource;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

type Snapshot<S> = Arc<TreeData<<S as TreeSource>::Value>>;

/// Generic lazy tree: loads roots, expands on demand and refreshes while
/// keeping open and selected nodes.
///
/// State is published as immutable [`TreeData`] snapshots through a `watch`
/// channel. Every mutation copies on write, so a snapshot held by an observer
/// never changes underneath it.
pub struct TreeEngine<S: TreeSource> {
    source: S,
    notifier: Arc<dyn Notifier>,
    state: ActionState,
    data: watch::Sender<Snapshot<S>>,
}

enum ExpandStep<V> {
    Missing,
    Busy,
    Loaded,
    Fetch(TreeNode<V>),
}

impl<S: TreeSource> TreeEngine<S> {
    pub fn new(source: S, notifier: Arc<dyn Notifier>) -> Self {
        let (data, _) = watch::channel(Arc::new(TreeData::default()));
        Self {
            source,
            notifier,
            state: ActionState::new(),
            data,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load state shared by `initialize` and `refresh_tree_data`.
    pub fn state(&self) -> &ActionState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        Arc::clone(&self.data.borrow())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<S>> {
        self.data.subscribe()
    }

    pub fn node(&self, id: &str) -> Option<TreeNode<S::Value>> {
        self.data.borrow().node(id).cloned()
    }

    /// Loads the root level. On failure the state is `Failed` and nothing is published.
    pub async fn initialize(&self) -> Result<()> {
        let Some(guard) = self.state.begin() else {
            self.notifier
                .notify_warning("Tree is already being initialized");
            return Ok(());
        };

        let roots = match self.source.get_root_nodes().await {
            Ok(roots) => roots,
            Err(err) => {
                self.notifier
                    .notify_error(&format!("Can't load tree: {err:#}"));
                guard.fail();
                return Err(TreeError::Source(err));
            }
        };

        let data = self.source.build_tree_data(roots);
        log::debug!("Tree initialized with {} root node(s)", data.root_ids.len());
        self.data.send_replace(Arc::new(data));
        guard.succeed();
        Ok(())
    }

    /// Opens `id`, fetching its children only the first time.
    ///
    /// Expanding a node that is already loading is a no-op. The loading flag is
    /// cleared on every path, including fetch errors.
    pub async fn expand_node(&self, id: &str) -> Result<()> {
        let mut step = ExpandStep::Missing;
        self.update(|data| {
            step = match data.node(id) {
                None => ExpandStep::Missing,
                Some(node) if node.is_loading => ExpandStep::Busy,
                Some(node) if node.is_loaded() => ExpandStep::Loaded,
                Some(node) => ExpandStep::Fetch(node.clone()),
            };
            if let Some(node) = data.node_mut(id) {
                match step {
                    ExpandStep::Loaded => node.is_open = true,
                    ExpandStep::Fetch(_) => node.is_loading = true,
                    ExpandStep::Missing | ExpandStep::Busy => {}
                }
            }
        });

        let node = match step {
            ExpandStep::Missing => return Err(TreeError::NodeNotFound(id.to_string())),
            ExpandStep::Busy | ExpandStep::Loaded => return Ok(()),
            ExpandStep::Fetch(node) => node,
        };

        match self.source.get_child_nodes(&node).await {
            Ok(children) => {
                self.update(|data| {
                    // A refresh may have replaced the tree while we were fetching.
                    let still_loading = data.node(id).is_some_and(|node| node.is_loading);
                    if !still_loading {
                        log::debug!("Dropping stale children of {id}");
                        return;
                    }
                    let child_ids = self.source.process_child_nodes(id, children, data);
                    if let Some(node) = data.node_mut(id) {
                        node.child_ids = Some(child_ids);
                        node.is_open = true;
                        node.is_loading = false;
                    }
                });
                Ok(())
            }
            Err(err) => {
                self.update(|data| {
                    if let Some(node) = data.node_mut(id) {
                        node.is_loading = false;
                    }
                });
                self.notifier
                    .notify_error(&format!("Can't expand '{}': {err:#}", node.label));
                Err(TreeError::Source(err))
            }
        }
    }

    /// Closes `id` and keeps its loaded children for the next expand.
    pub fn collapse_node(&self, id: &str) -> Result<()> {
        let mut found = false;
        self.update(|data| {
            if let Some(node) = data.node_mut(id) {
                node.is_open = false;
                found = true;
            }
        });
        if found {
            Ok(())
        } else {
            Err(TreeError::NodeNotFound(id.to_string()))
        }
    }

    /// Selects `id` (or clears the selection) and republishes the tree.
    pub fn set_selected_node(&self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            if !self.data.borrow().contains(id) {
                return Err(TreeError::NodeNotFound(id.to_string()));
            }
        }
        self.update(|data| {
            let already_selected = id
                .and_then(|id| data.node(id))
                .is_some_and(|node| node.is_selected);
            if already_selected {
                return;
            }
            data.clear_selection();
            if let Some(node) = id.and_then(|id| data.node_mut(id)) {
                node.is_selected = true;
            }
        });
        Ok(())
    }

    /// Reloads the roots and re-opens, breadth first, every node that was open
    /// before and still exists. The selection survives only if its id does.
    ///
    /// The new tree is assembled off to the side and published at once; any
    /// fetch error leaves the previous tree in place.
    pub async fn refresh_tree_data(&self) -> Result<()> {
        let Some(guard) = self.state.begin() else {
            self.notifier
                .notify_warning("Tree is already being refreshed");
            return Ok(());
        };

        let open_ids = self.data.borrow().open_ids();

        match self.rebuild(&open_ids).await {
            Ok(mut data) => {
                // Expand, collapse and select may have run during the fetches.
                let current = self.snapshot();
                merge_open_state(&current, &open_ids, &mut data);
                data.clear_selection();
                if let Some(node) = current.selected_id().and_then(|id| data.node_mut(id)) {
                    node.is_selected = true;
                }
                self.data.send_replace(Arc::new(data));
                guard.succeed();
                Ok(())
            }
            Err(err) => {
                self.notifier
                    .notify_error(&format!("Can't refresh tree: {err:#}"));
                guard.fail();
                Err(TreeError::Source(err))
            }
        }
    }

    async fn rebuild(&self, open_ids: &HashSet<String>) -> anyhow::Result<TreeData<S::Value>> {
        let roots = self.source.get_root_nodes().await?;
        let mut data = self.source.build_tree_data(roots);

        let mut queue: VecDeque<String> = data.root_ids.iter().cloned().collect();
        while let Some(id) = queue.pop_front() {
            if !open_ids.contains(&id) {
                continue;
            }
            let Some(node) = data.node(&id).cloned() else {
                continue;
            };
            let child_ids = match node.child_ids {
                Some(child_ids) => child_ids,
                None => {
                    let children = self.source.get_child_nodes(&node).await?;
                    self.source.process_child_nodes(&id, children, &mut data)
                }
            };
            if let Some(node) = data.node_mut(&id) {
                node.child_ids = Some(child_ids.clone());
                node.is_open = true;
            }
            queue.extend(child_ids);
        }
        Ok(data)
    }

    fn update(&self, apply: impl FnOnce(&mut TreeData<S::Value>)) {
        self.data.send_modify(|data| apply(Arc::make_mut(data)));
    }

    /// True once the root level has been loaded at least once.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state.status(), ActionStatus::Succeeded)
            || !self.data.borrow().is_empty()
    }
}

/// Applies to `data` the open state `current` gained or lost since `before`
/// was taken. Nodes opened meanwhile keep the children they loaded.
fn merge_open_state<V: Clone>(
    current: &TreeData<V>,
    before: &HashSet<String>,
    data: &mut TreeData<V>,
) {
    for id in before {
        if current.node(id).is_some_and(|node| !node.is_open) {
            if let Some(node) = data.node_mut(id) {
                node.is_open = false;
            }
        }
    }

    let mut pending: Vec<&TreeNode<V>> = current
        .nodes
        .values()
        .filter(|node| node.is_open && !data.node(&node.id).is_some_and(|n| n.is_open))
        .collect();
    // Parents must land before their children; nodes the server dropped never do.
    loop {
        let waiting = pending.len();
        pending.retain(|opened| {
            let Some(node) = data.node_mut(&opened.id) else {
                return true;
            };
            node.is_open = true;
            if node.child_ids.is_some() {
                return false;
            }
            node.child_ids = opened.child_ids.clone();
            for child_id in opened.child_ids.iter().flatten() {
                if data.contains(child_id) {
                    continue;
                }
                if let Some(child) = current.node(child_id) {
                    let mut child = child.clone();
                    child.child_ids = None;
                    child.is_open = false;
                    child.is_loading = false;
                    data.insert(child);
                }
            }
            false
        });
        if pending.is_empty() || pending.len() == waiting {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::BlockingAlert;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        warnings: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify_success(&self, _message: &str) {}
        fn notify_warning(&self, message: &str) {
            self.warnings.lock().expect("lock").push(message.to_string());
        }
        fn notify_error(&self, message: &str) {
            self.errors.lock().expect("lock").push(message.to_string());
        }
        fn notify_illegal_state(&self, message: &str) {
            self.errors.lock().expect("lock").push(message.to_string());
        }
        fn set_blocking_alert(&self, _alert: Option<BlockingAlert>) {}
    }

    /// In-memory hierarchy keyed by parent id ("" is the root level).
    #[derive(Default)]
    struct FakeSource {
        levels: Mutex<HashMap<String, Vec<String>>>,
        child_fetches: AtomicUsize,
        fail: AtomicBool,
        gate: Option<Arc<tokio::sync::Notify>>,
    }

    impl FakeSource {
        fn with_levels(levels: &[(&str, &[&str])]) -> Self {
            let source = Self::default();
            source.set_levels(levels);
            source
        }

        fn set_levels(&self, levels: &[(&str, &[&str])]) {
            let mut map = self.levels.lock().expect("lock");
            map.clear();
            for (parent, children) in levels {
                map.insert(
                    parent.to_string(),
                    children.iter().map(|c| c.to_string()).collect(),
                );
            }
        }

        fn level(&self, parent: &str) -> anyhow::Result<Vec<String>> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("server unavailable");
            }
            Ok(self
                .levels
                .lock()
                .expect("lock")
                .get(parent)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[async_trait]
    impl TreeSource for FakeSource {
        type Record = String;
        type Value = ();

        async fn get_root_nodes(&self) -> anyhow::Result<Vec<String>> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.level("")
        }

        async fn get_child_nodes(&self, node: &TreeNode<()>) -> anyhow::Result<Vec<String>> {
            self.child_fetches.fetch_add(1, Ordering::SeqCst);
            self.level(&node.id)
        }

        fn to_node(&self, record: String) -> TreeNode<()> {
            let label = record.rsplit('/').next().unwrap_or_default().to_string();
            TreeNode::new(record, label, ())
        }
    }

    fn engine(source: FakeSource) -> (TreeEngine<FakeSource>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (TreeEngine::new(source, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn initialize_publishes_roots() {
        let (engine, _) = engine(FakeSource::with_levels(&[("", &["a", "b"])]));
        let mut rx = engine.subscribe();

        engine.initialize().await.expect("initialize");

        assert!(rx.has_changed().expect("sender alive"));
        let data = rx.borrow_and_update().clone();
        assert_eq!(data.root_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(engine.state().status(), ActionStatus::Succeeded);
    }

    #[tokio::test]
    async fn failed_initialize_exposes_no_tree() {
        let source = FakeSource::with_levels(&[("", &["a"])]);
        source.fail.store(true, Ordering::SeqCst);
        let (engine, notifier) = engine(source);

        assert!(engine.initialize().await.is_err());

        assert_eq!(engine.state().status(), ActionStatus::Failed);
        assert!(engine.snapshot().is_empty());
        assert_eq!(notifier.errors.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn concurrent_initialize_is_rejected_with_warning() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let source = FakeSource {
            gate: Some(gate.clone()),
            ..FakeSource::with_levels(&[("", &["a"])])
        };
        let (engine, notifier) = engine(source);

        let (first, second, ()) = tokio::join!(engine.initialize(), engine.initialize(), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        first.expect("first initialize");
        second.expect("second initialize returns quietly");
        assert_eq!(notifier.warnings.lock().expect("lock").len(), 1);
        assert_eq!(engine.snapshot().root_ids, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn expanding_twice_fetches_once() {
        let (engine, _) = engine(FakeSource::with_levels(&[("", &["a"]), ("a", &["a/x", "a/y"])]));
        engine.initialize().await.expect("initialize");

        engine.expand_node("a").await.expect("expand");
        engine.collapse_node("a").expect("collapse");
        engine.expand_node("a").await.expect("expand again");

        assert_eq!(engine.source().child_fetches.load(Ordering::SeqCst), 1);
        let data = engine.snapshot();
        let labels: Vec<_> = data.children("a").iter().map(|n| n.label.clone()).collect();
        assert_eq!(labels, vec!["x".to_string(), "y".to_string()]);
        assert!(data.node("a").is_some_and(|n| n.is_open && !n.is_loading));
    }

    #[tokio::test]
    async fn failed_expand_clears_loading_flag() {
        let (engine, notifier) = engine(FakeSource::with_levels(&[("", &["a"])]));
        engine.initialize().await.expect("initialize");
        engine.source().fail.store(true, Ordering::SeqCst);

        assert!(engine.expand_node("a").await.is_err());

        let node = engine.node("a").expect("node");
        assert!(!node.is_loading);
        assert!(!node.is_open);
        assert!(node.child_ids.is_none());
        assert_eq!(notifier.errors.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn selection_is_exclusive() {
        let (engine, _) = engine(FakeSource::with_levels(&[("", &["a", "b"])]));
        engine.initialize().await.expect("initialize");

        engine.set_selected_node(Some("a")).expect("select a");
        engine.set_selected_node(Some("b")).expect("select b");

        let data = engine.snapshot();
        assert_eq!(data.selected_id(), Some("b"));
        assert_eq!(data.nodes.values().filter(|n| n.is_selected).count(), 1);

        engine.set_selected_node(None).expect("clear");
        assert_eq!(engine.snapshot().selected_id(), None);
        assert!(engine.set_selected_node(Some("missing")).is_err());
    }

    #[tokio::test]
    async fn refresh_keeps_open_nodes_and_selection() {
        let source = FakeSource::with_levels(&[
            ("", &["a", "b"]),
            ("a", &["a/x", "a/y"]),
            ("a/x", &["a/x/1"]),
            ("b", &["b/z"]),
        ]);
        let (engine, _) = engine(source);
        engine.initialize().await.expect("initialize");
        engine.expand_node("a").await.expect("expand a");
        engine.expand_node("a/x").await.expect("expand a/x");
        engine.expand_node("b").await.expect("expand b");
        engine.collapse_node("b").expect("collapse b");
        engine.set_selected_node(Some("a/x/1")).expect("select");

        engine.source().set_levels(&[
            ("", &["a", "b", "c"]),
            ("a", &["a/x"]),
            ("a/x", &["a/x/1", "a/x/2"]),
            ("b", &["b/z"]),
        ]);
        engine.refresh_tree_data().await.expect("refresh");

        let data = engine.snapshot();
        let mut open: Vec<_> = data.open_ids().into_iter().collect();
        open.sort();
        assert_eq!(open, vec!["a".to_string(), "a/x".to_string()]);
        assert_eq!(data.selected_id(), Some("a/x/1"));
        assert!(data.node("b").is_some_and(|n| n.child_ids.is_none()));
        assert_eq!(data.children("a/x").len(), 2);
        assert_eq!(engine.state().status(), ActionStatus::Succeeded);
    }

    #[tokio::test]
    async fn refresh_keeps_changes_made_while_it_runs() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let source = FakeSource {
            gate: Some(gate.clone()),
            ..FakeSource::with_levels(&[
                ("", &["a", "b"]),
                ("a", &["a/x"]),
                ("a/x", &["a/x/1"]),
                ("b", &["b/z"]),
            ])
        };
        let (engine, _) = engine(source);
        gate.notify_one();
        engine.initialize().await.expect("initialize");
        engine.expand_node("b").await.expect("expand b");

        let (refreshed, ()) = tokio::join!(engine.refresh_tree_data(), async {
            engine.expand_node("a").await.expect("expand a");
            engine.expand_node("a/x").await.expect("expand a/x");
            engine.collapse_node("b").expect("collapse b");
            engine.set_selected_node(Some("a/x/1")).expect("select");
            gate.notify_one();
        });
        refreshed.expect("refresh");

        let data = engine.snapshot();
        let mut open: Vec<_> = data.open_ids().into_iter().collect();
        open.sort();
        assert_eq!(open, vec!["a".to_string(), "a/x".to_string()]);
        assert_eq!(data.children("a/x").len(), 1);
        assert_eq!(data.selected_id(), Some("a/x/1"));
        assert_eq!(data.nodes.values().filter(|n| n.is_selected).count(), 1);
    }

    #[tokio::test]
    async fn refresh_drops_selection_of_removed_node() {
        let (engine, _) = engine(FakeSource::with_levels(&[("", &["a", "b"])]));
        engine.initialize().await.expect("initialize");
        engine.set_selected_node(Some("b")).expect("select");

        engine.source().set_levels(&[("", &["a"])]);
        engine.refresh_tree_data().await.expect("refresh");

        let data = engine.snapshot();
        assert_eq!(data.selected_id(), None);
        assert!(!data.contains("b"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_tree() {
        let (engine, notifier) = engine(FakeSource::with_levels(&[("", &["a"]), ("a", &["a/x"])]));
        engine.initialize().await.expect("initialize");
        engine.expand_node("a").await.expect("expand");
        let before = engine.snapshot();

        engine.source().fail.store(true, Ordering::SeqCst);
        assert!(engine.refresh_tree_data().await.is_err());

        assert_eq!(*engine.snapshot(), *before);
        assert_eq!(engine.state().status(), ActionStatus::Failed);
        assert_eq!(notifier.errors.lock().expect("lock").len(), 1);
    }
}
