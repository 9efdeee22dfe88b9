//! # Pure IDE Tree
//!
//! A lazily loaded, refresh-preserving tree engine shared by every hierarchy
//! the IDE shows (workspace directories, compiled concepts, test results).
//!
//! ## Architecture
//!
//! ```text
//! TreeSource (strategy)
//!     │  get_root_nodes / get_child_nodes / to_node
//!     │  build_tree_data / process_child_nodes
//!     ▼
//! TreeEngine
//!     ├─ initialize         (guarded by ActionState)
//!     ├─ expand / collapse  (guarded per node by is_loading)
//!     ├─ set_selected_node  (at most one selection)
//!     └─ refresh_tree_data  (re-open by id, breadth first)
//!     │
//!     ▼
//! watch::Receiver<Arc<TreeData>>  ──> renderer
//! ```
//!
//! [`ActionState`] and the [`Notifier`] collaborator live here as well since
//! every asynchronous operation in the IDE uses them.

mod action_state;
mod engine;
mod error;
mod node;
mod notify;
mod source;

pub use action_state::{ActionGuard, ActionState, ActionStatus};
pub use engine::TreeEngine;
pub use error::{Result, TreeError};
pub use node::{TreeData, TreeNode};
pub use notify::{BlockingAlert, LogNotifier, Notifier};
pub use source::TreeSource;
