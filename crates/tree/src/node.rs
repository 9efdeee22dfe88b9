use std::collections::{HashMap, HashSet};

/// One node of a lazily loaded tree.
///
/// `child_ids` is `None` until the node has been expanded once; `Some(vec![])`
/// means it was expanded and has no children.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<V> {
    pub id: String,
    pub label: String,
    pub data: V,
    pub child_ids: Option<Vec<String>>,
    pub is_open: bool,
    pub is_loading: bool,
    pub is_selected: bool,
}

impl<V> TreeNode<V> {
    pub fn new(id: impl Into<String>, label: impl Into<String>, data: V) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data,
            child_ids: None,
            is_open: false,
            is_loading: false,
            is_selected: false,
        }
    }

    /// A node whose children are known up front and must never be fetched.
    pub fn leaf(id: impl Into<String>, label: impl Into<String>, data: V) -> Self {
        let mut node = Self::new(id, label, data);
        node.child_ids = Some(Vec::new());
        node
    }

    pub fn is_loaded(&self) -> bool {
        self.child_ids.is_some()
    }
}

/// Root ids plus every loaded node, keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeData<V> {
    pub root_ids: Vec<String>,
    pub nodes: HashMap<String, TreeNode<V>>,
}

impl<V> Default for TreeData<V> {
    fn default() -> Self {
        Self {
            root_ids: Vec::new(),
            nodes: HashMap::new(),
        }
    }
}

impl<V> TreeData<V> {
    pub fn is_empty(&self) -> bool {
        self.root_ids.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&TreeNode<V>> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut TreeNode<V>> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn insert(&mut self, node: TreeNode<V>) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_root(&mut self, node: TreeNode<V>) {
        self.root_ids.push(node.id.clone());
        self.insert(node);
    }

    pub fn roots(&self) -> Vec<&TreeNode<V>> {
        self.resolve(&self.root_ids)
    }

    /// Loaded children of `id`, in server order. Empty when not yet expanded.
    pub fn children(&self, id: &str) -> Vec<&TreeNode<V>> {
        self.node(id)
            .and_then(|node| node.child_ids.as_deref())
            .map(|ids| self.resolve(ids))
            .unwrap_or_default()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.nodes
            .values()
            .find(|node| node.is_selected)
            .map(|node| node.id.as_str())
    }

    pub fn open_ids(&self) -> HashSet<String> {
        self.nodes
            .values()
            .filter(|node| node.is_open)
            .map(|node| node.id.clone())
            .collect()
    }

    /// Depth-first walk over loaded nodes, with their depth.
    pub fn walk(&self) -> Vec<(usize, &TreeNode<V>)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, &str)> =
            self.root_ids.iter().rev().map(|id| (0, id.as_str())).collect();
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            out.push((depth, node));
            if node.is_open {
                if let Some(children) = &node.child_ids {
                    stack.extend(children.iter().rev().map(|child| (depth + 1, child.as_str())));
                }
            }
        }
        out
    }

    pub(crate) fn clear_selection(&mut self) {
        for node in self.nodes.values_mut() {
            node.is_selected = false;
        }
    }

    fn resolve(&self, ids: &[String]) -> Vec<&TreeNode<V>> {
        ids.iter().filter_map(|id| self.nodes.get(id)).collect()
    }
}
