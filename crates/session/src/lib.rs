//! # Pure IDE Session
//!
//! Client side of an IDE session: the remote operations of the IDE server,
//! the open workspace, and the coordinator that turns a slow, possibly
//! reinitializing compile/execute/test cycle into one asynchronous call.
//!
//! ## Architecture
//!
//! ```text
//! SessionConfig (toml + PURE_IDE_* env)
//!     │
//!     ▼
//! HttpSessionClient ── impl SessionClient ──┐
//!                                           ▼
//! IdeSession ─────────────────────────────────────────────┐
//!     ├─ Workspace (open buffers, tabs)                   │
//!     ├─ NavigationStack (go to definition / back)        │
//!     ├─ TreeEngine<DirectoryTreeSource>                  │
//!     ├─ TreeEngine<ConceptTreeSource>                    │
//!     └─ execute ── single ActionState slot               │
//!          ├─ status poll (every status_poll)             │
//!          ├─ decode ExecutionResult                      │
//!          ├─ reinit ──> initialize ──> repeat            │
//!          └─ ResultHandler (go / tests / navigation)     │
//!                  └─ TestRunner ── TreeEngine<TestTreeSource>
//! ```
//!
//! User-facing feedback goes through the [`Notifier`](pure_ide_tree::Notifier)
//! collaborator; nothing here renders.

mod client;
mod config;
mod error;
mod execution;
mod http;
mod navigation;
mod session;
mod test_runner;
mod trees;
mod workspace;

pub use client::SessionClient;
pub use config::{SessionConfig, DEFAULT_SERVER_URL, DEFAULT_WELCOME_FILE};
pub use error::{Result, SessionError};
pub use execution::{ExecutionOutcome, GoHandler, ResultHandler, MAX_REINIT_ROUNDS};
pub use http::HttpSessionClient;
pub use navigation::NavigationStack;
pub use session::{IdeSession, SearchState};
pub use test_runner::{TestRunner, TestStatus, TestSummary, TestTreeSource};
pub use trees::{ConceptTreeSource, DirectoryTreeSource};
pub use workspace::{FileBuffer, Workspace};
