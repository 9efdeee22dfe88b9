use crate::node::{TreeData, TreeNode};
use async_trait::async_trait;

/// Strategy that plugs one kind of hierarchy into [`crate::TreeEngine`].
///
/// Implementations only fetch and convert records; opening, loading flags,
/// selection and refresh reconciliation are owned by the engine.
#[async_trait]
pub trait TreeSource: Send + Sync {
    /// Record shape returned by the backing service.
    type Record: Send;
    /// Payload stored on every node.
    type Value: Clone + Send + Sync + 'static;

    async fn get_root_nodes(&self) -> anyhow::Result<Vec<Self::Record>>;

    async fn get_child_nodes(
        &self,
        node: &TreeNode<Self::Value>,
    ) -> anyhow::Result<Vec<Self::Record>>;

    fn to_node(&self, record: Self::Record) -> TreeNode<Self::Value>;

    fn build_tree_data(&self, roots: Vec<Self::Record>) -> TreeData<Self::Value> {
        let mut data = TreeData::default();
        for record in roots {
            data.add_root(self.to_node(record));
        }
        data
    }

    /// Merges freshly fetched children into `data` and returns their ids in order.
    fn process_child_nodes(
        &self,
        _parent_id: &str,
        children: Vec<Self::Record>,
        data: &mut TreeData<Self::Value>,
    ) -> Vec<String> {
        children
            .into_iter()
            .map(|record| {
                let node = self.to_node(record);
                let id = node.id.clone();
                data.insert(node);
                id
            })
            .collect()
    }
}
