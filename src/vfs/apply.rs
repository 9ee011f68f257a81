//! Applying parsed file operations to the virtual file store.
//!
//! Operations are applied strictly in the order given. Updates search an
//! ordered candidate list and fall back to a create when nothing matches,
//! which lets the assistant recover from slightly wrong paths.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::FileOperation;
use crate::error::StoreError;

use super::paths::{delete_candidates, update_candidates};
use super::policy::OperationPolicy;
use super::store::VirtualFileStore;

/// What happened to the store for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliedKind {
    Created,
    Updated,
    Deleted,
}

/// An operation that changed the store, with the canonical path it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedOperation {
    pub kind: AppliedKind,
    pub path: String,
}

/// An operation that was not applied, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedOperation {
    pub operation: FileOperation,
    pub reason: String,
}

/// Outcome of applying one batch of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub applied: Vec<AppliedOperation>,
    pub skipped: Vec<SkippedOperation>,
}

impl ApplyReport {
    /// Whether any operation changed the store.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }

    fn skip(&mut self, operation: &FileOperation, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(
            "Skipping {} of {}: {}",
            operation.kind(),
            operation.path(),
            reason
        );
        self.skipped.push(SkippedOperation {
            operation: operation.clone(),
            reason,
        });
    }
}

/// Apply a batch of operations in order.
///
/// `active_file` is the file currently open in the editor; it is moved to
/// the created file when the batch starts with a Create, and to the first
/// remaining file when the active file is deleted.
pub fn apply_operations(
    store: &mut VirtualFileStore,
    operations: &[FileOperation],
    policy: &OperationPolicy,
    active_file: &mut Option<String>,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for (index, op) in operations.iter().enumerate() {
        if let Some(reason) = policy.check(index, op) {
            report.skip(op, reason);
            continue;
        }

        match op {
            FileOperation::Create { path, content } => {
                if content.is_empty() {
                    report.skip(op, "empty content");
                    continue;
                }
                match store.put(path, content.as_str()) {
                    Ok(stored) => {
                        info!("Created {}", stored);
                        if index == 0 {
                            *active_file = Some(stored.clone());
                        }
                        report.applied.push(AppliedOperation {
                            kind: AppliedKind::Created,
                            path: stored,
                        });
                    }
                    Err(e) => report.skip(op, e.to_string()),
                }
            }
            FileOperation::Update { path, content } => {
                if content.is_empty() {
                    report.skip(op, "empty content");
                    continue;
                }
                let existing = update_candidates(path)
                    .into_iter()
                    .find(|candidate| store.contains(candidate));

                match existing {
                    Some(existing) => match store.set_content(&existing, content.as_str()) {
                        Ok(()) => {
                            info!("Updated {}", existing);
                            report.applied.push(AppliedOperation {
                                kind: AppliedKind::Updated,
                                path: existing,
                            });
                        }
                        Err(e) => report.skip(op, e.to_string()),
                    },
                    None => {
                        debug!("No file matches update target {}, creating it", path);
                        match store.put(path, content.as_str()) {
                            Ok(stored) => {
                                info!("Created {} (update target not found)", stored);
                                report.applied.push(AppliedOperation {
                                    kind: AppliedKind::Created,
                                    path: stored,
                                });
                            }
                            Err(e) => report.skip(op, e.to_string()),
                        }
                    }
                }
            }
            FileOperation::Delete { path } => {
                let existing = delete_candidates(path)
                    .into_iter()
                    .find(|candidate| store.contains(candidate));

                let Some(existing) = existing else {
                    report.skip(op, StoreError::NotFound(path.clone()).to_string());
                    continue;
                };

                match store.remove(&existing) {
                    Ok(_) => {
                        info!("Deleted {}", existing);
                        if active_file.as_deref() == Some(existing.as_str()) {
                            *active_file = store.first_path().map(str::to_string);
                        }
                        report.applied.push(AppliedOperation {
                            kind: AppliedKind::Deleted,
                            path: existing,
                        });
                    }
                    Err(e) => report.skip(op, e.to_string()),
                }
            }
        }
    }

    report
}
