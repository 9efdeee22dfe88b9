use crate::client::SessionClient;
use async_trait::async_trait;
use pure_ide_protocol::{ConceptEntry, DirectoryEntry};
use pure_ide_tree::{TreeNode, TreeSource};
use std::sync::Arc;

/// Workspace files and folders, keyed by path.
pub struct DirectoryTreeSource {
    client: Arc<dyn SessionClient>,
}

impl DirectoryTreeSource {
    pub fn new(client: Arc<dyn SessionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TreeSource for DirectoryTreeSource {
    type Record = DirectoryEntry;
    type Value = DirectoryEntry;

    async fn get_root_nodes(&self) -> anyhow::Result<Vec<DirectoryEntry>> {
        Ok(self.client.get_directory_children(None).await?)
    }

    async fn get_child_nodes(
        &self,
        node: &TreeNode<DirectoryEntry>,
    ) -> anyhow::Result<Vec<DirectoryEntry>> {
        Ok(self
            .client
            .get_directory_children(Some(&node.data.path))
            .await?)
    }

    fn to_node(&self, entry: DirectoryEntry) -> TreeNode<DirectoryEntry> {
        let id = entry.path.clone();
        let label = entry.text.clone();
        if entry.is_file {
            TreeNode::leaf(id, label, entry)
        } else {
            TreeNode::new(id, label, entry)
        }
    }
}

/// Packages and their elements, keyed by element path.
pub struct ConceptTreeSource {
    client: Arc<dyn SessionClient>,
}

impl ConceptTreeSource {
    pub fn new(client: Arc<dyn SessionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TreeSource for ConceptTreeSource {
    type Record = ConceptEntry;
    type Value = ConceptEntry;

    async fn get_root_nodes(&self) -> anyhow::Result<Vec<ConceptEntry>> {
        Ok(self.client.get_concept_children(None).await?)
    }

    async fn get_child_nodes(
        &self,
        node: &TreeNode<ConceptEntry>,
    ) -> anyhow::Result<Vec<ConceptEntry>> {
        Ok(self.client.get_concept_children(Some(&node.data.path)).await?)
    }

    fn to_node(&self, entry: ConceptEntry) -> TreeNode<ConceptEntry> {
        let id = entry.path.clone();
        let label = entry.name.clone();
        if entry.has_children {
            TreeNode::new(id, label, entry)
        } else {
            TreeNode::leaf(id, label, entry)
        }
    }
}
