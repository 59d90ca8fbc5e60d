//! Partial-update merger
//!
//! Turns a sparse patch plus the current stored record into a verdict: did
//! anything observable change, why or why not, and what the record looks
//! like afterwards. Domain rejections are verdicts, never errors.

use std::fmt;

use crate::errors::{CoreErrorKind, Result};
use crate::model::{Responder, ResponderPatch, StoredResponder};
use crate::ops::ResponderStore;

/// Why a merge did or did not change state
///
/// The display form is the status message shown to event subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictReason {
    Updated,
    NotFound,
    StateNotChanged,
    /// The store refused the write
    UpdateFailed(CoreErrorKind),
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictReason::Updated => write!(f, "updated"),
            VerdictReason::NotFound => write!(f, "not found"),
            VerdictReason::StateNotChanged => write!(f, "state not changed"),
            VerdictReason::UpdateFailed(kind) => {
                write!(f, "exception '{}' when updating", kind.class_name())
            }
        }
    }
}

/// Outcome of merging one patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub changed: bool,
    pub reason: VerdictReason,
    /// The merged record on success, the unchanged record on rejection,
    /// `None` when nothing was found
    pub record: Option<Responder>,
}

impl Verdict {
    fn rejected(reason: VerdictReason, record: Option<Responder>) -> Self {
        Self {
            changed: false,
            reason,
            record,
        }
    }

    pub fn status_message(&self) -> String {
        self.reason.to_string()
    }
}

/// Merge `patch` into `current`, writing through `store` only when a
/// supplied field actually differs
///
/// The write carries `current`'s version, so a concurrent writer turns into
/// an `UpdateFailed(VersionConflict)` verdict rather than a lost update.
pub fn merge_update(
    store: &dyn ResponderStore,
    current: Option<&StoredResponder>,
    patch: &ResponderPatch,
) -> Verdict {
    let Some(current) = current else {
        tracing::warn!(responder_id = %patch.id, "responder not found, record not updated");
        return Verdict::rejected(VerdictReason::NotFound, None);
    };

    let changes = patch.changes(&current.responder);
    if changes.is_empty() {
        tracing::info!(
            responder_id = %patch.id,
            "responder state unchanged, record not updated"
        );
        return Verdict::rejected(
            VerdictReason::StateNotChanged,
            Some(current.responder.clone()),
        );
    }

    let candidate = patch.apply_to(&current.responder);
    match store.merge(&candidate, current.version) {
        Ok(merged) => {
            tracing::debug!(
                responder_id = %patch.id,
                version = merged.version,
                changed = ?changes,
                "responder updated"
            );
            Verdict {
                changed: true,
                reason: VerdictReason::Updated,
                record: Some(merged.responder),
            }
        }
        Err(err) => {
            tracing::warn!(
                responder_id = %patch.id,
                err.code = err.code(),
                error = %err,
                "store rejected update, record not updated"
            );
            Verdict::rejected(
                VerdictReason::UpdateFailed(err.kind()),
                Some(current.responder.clone()),
            )
        }
    }
}

/// Load the record addressed by `patch` and merge into it
///
/// # Errors
///
/// Returns `ResponderError::Store` when the lookup itself fails. A failed
/// write is reported through the verdict instead.
pub fn reconcile(store: &dyn ResponderStore, patch: &ResponderPatch) -> Result<Verdict> {
    let current = store
        .find_by_id(patch.id)
        .map_err(|err| err.with_op("reconcile").with_entity_id(patch.id.to_string()))?;
    Ok(merge_update(store, current.as_ref(), patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_messages() {
        assert_eq!(VerdictReason::Updated.to_string(), "updated");
        assert_eq!(VerdictReason::NotFound.to_string(), "not found");
        assert_eq!(
            VerdictReason::StateNotChanged.to_string(),
            "state not changed"
        );
        assert_eq!(
            VerdictReason::UpdateFailed(CoreErrorKind::VersionConflict).to_string(),
            "exception 'VersionConflict' when updating"
        );
    }
}
