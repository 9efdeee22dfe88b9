//! # Pure IDE Protocol
//!
//! Tagged wire records exchanged with the IDE server.
//!
//! Every response family is decoded by inspecting explicit discriminator
//! fields, never by position, so each consumer can switch exhaustively over a
//! closed set of variants.
//!
//! ## Architecture
//!
//! ```text
//! serde_json::Value (server response)
//!     │
//!     ├──> InitializationResult   (error / source)
//!     ├──> ExecutionResult        (error / source / candidates / jumpTo / tests / reinit)
//!     ├──> CommandResult          (error / errorDialog)
//!     │
//!     ├──> Activities             (initializing / executing)
//!     ├──> Trees & files          (DirectoryEntry, ConceptEntry, PureFile)
//!     ├──> Test runs              (TestInfo, TestRunStatus)
//!     ├──> Search & usages        (SearchResultEntry, UsageConcept, Usage)
//!     └──> Diagram payloads       (DiagramInfo, DiagramClassInfo)
//! ```

mod command;
mod coordinate;
mod decode;
mod diagram;
mod error;
mod execution;
mod files;
mod initialization;
mod paths;
mod search;
mod test_run;

pub use command::{CommandFailure, CommandResult};
pub use coordinate::{FileCoordinate, SourceInformation};
pub use diagram::{
    ClassRecord, DiagramClassInfo, DiagramDomainInfo, DiagramInfo, DiagramRecord, ElementPointer,
    EnumerationRecord, GeneralizationViewRecord, GenericTypeRecord, GeometryRecord, PointRecord,
    ProfileRecord, PropertyPointerRecord, PropertyRecord, PropertyViewRecord, RectangleRecord,
    StereotypeRecord, TagRecord, TaggedValueRecord, TypeViewRecord,
};
pub use error::{ProtocolError, Result};
pub use execution::{
    Candidate, ConceptJump, ExecutionActivity, ExecutionFailure, ExecutionResult,
    ExecutionSuccess, JumpTarget, TestExecution, UnmatchedFunctionFailure, UnmatchedSymbolFailure,
};
pub use files::{ConceptEntry, DirectoryEntry, OpenFileRequest, PureFile};
pub use initialization::{
    InitializationActivity, InitializationFailure, InitializationFailureWithSource,
    InitializationResult, InitializationSuccess,
};
pub use paths::{
    is_under_path, join_element_path, normalize_line_endings, split_element_path,
    trim_path_leading_slash, ELEMENT_PATH_DELIMITER,
};
pub use search::{SearchResultCoordinate, SearchResultEntry, Usage, UsageConcept};
pub use test_run::{TestFailureInfo, TestInfo, TestResult, TestResultStatus, TestRunStatus};
