//! Virtual file map shared by the protocol and bundler sides.

mod apply;
pub mod paths;
mod policy;
mod store;
pub mod template;

pub use apply::{apply_operations, AppliedKind, AppliedOperation, ApplyReport, SkippedOperation};
pub use policy::OperationPolicy;
pub use store::{FileEntry, VirtualFileStore};
