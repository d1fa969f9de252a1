//! Document status machine.
//!
//! One transition table shared by every document kind, replacing the
//! per-resource checks that used to drift apart:
//!
//! | From     | To       | Allowed                    |
//! |----------|----------|----------------------------|
//! | DRAFT    | PENDING  | owner, SUPERVISOR, ADMIN   |
//! | PENDING  | APPROVED | SUPERVISOR, ADMIN          |
//! | APPROVED | PENDING  | SUPERVISOR, ADMIN          |
//! | DRAFT    | APPROVED | SUPERVISOR, ADMIN (direct) |
//! | any      | DRAFT    | never                      |
//!
//! Requesting the current status is an idempotent no-op: no write happens
//! and `updated_at` is untouched.

use crate::error::ApiError;
use crate::models::{Document, DocumentStatus, Principal};

/// Outcome of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one; nothing to persist.
    Unchanged,
    /// Transition permitted; caller persists the new status.
    Changed(DocumentStatus),
}

/// Check whether `principal` may move `doc` to `requested`. The persisted
/// write (content + status, a single atomic update) is the caller's job and
/// must only happen after this returns `Ok`.
pub fn apply_transition(
    doc: &Document,
    requested: DocumentStatus,
    principal: &Principal,
) -> Result<Transition, ApiError> {
    if requested == doc.status {
        return Ok(Transition::Unchanged);
    }

    // No handler exposes a path back to DRAFT.
    if requested == DocumentStatus::Draft {
        return Err(ApiError::conflict("Cannot return a document to draft"));
    }

    if principal.role.is_elevated() {
        return Ok(Transition::Changed(requested));
    }

    // A non-elevated principal must own the document, and may only submit
    // it for review.
    let owner_submitting = principal.id == doc.owner_id
        && doc.status == DocumentStatus::Draft
        && requested == DocumentStatus::Pending;

    if owner_submitting {
        Ok(Transition::Changed(requested))
    } else {
        Err(ApiError::forbidden("Unauthorized to change document status"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentKind, Role};
    use uuid::Uuid;

    fn doc(owner: Uuid, status: DocumentStatus) -> Document {
        let mut d = Document::new(DocumentKind::FplMission, owner, serde_json::json!({}));
        d.status = status;
        d
    }

    fn principal(id: Uuid, role: Role) -> Principal {
        Principal { id, role }
    }

    #[test]
    fn same_status_is_noop_for_anyone() {
        let owner = Uuid::new_v4();
        let stranger = principal(Uuid::new_v4(), Role::User);
        for status in [
            DocumentStatus::Draft,
            DocumentStatus::Pending,
            DocumentStatus::Approved,
        ] {
            let d = doc(owner, status);
            assert_eq!(
                apply_transition(&d, status, &stranger).unwrap(),
                Transition::Unchanged
            );
        }
    }

    #[test]
    fn owner_may_submit_draft_for_review() {
        let owner = Uuid::new_v4();
        let d = doc(owner, DocumentStatus::Draft);
        let result = apply_transition(&d, DocumentStatus::Pending, &principal(owner, Role::User));
        assert_eq!(result.unwrap(), Transition::Changed(DocumentStatus::Pending));
    }

    #[test]
    fn owner_may_not_approve() {
        let owner = Uuid::new_v4();
        let d = doc(owner, DocumentStatus::Draft);
        let err = apply_transition(&d, DocumentStatus::Approved, &principal(owner, Role::User))
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let pending = doc(owner, DocumentStatus::Pending);
        let err =
            apply_transition(&pending, DocumentStatus::Approved, &principal(owner, Role::User))
                .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn non_owner_user_may_never_transition() {
        let d = doc(Uuid::new_v4(), DocumentStatus::Draft);
        let stranger = principal(Uuid::new_v4(), Role::User);
        let err = apply_transition(&d, DocumentStatus::Pending, &stranger).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn elevated_roles_drive_every_exposed_transition() {
        let owner = Uuid::new_v4();
        for role in [Role::Supervisor, Role::Admin] {
            let reviewer = principal(Uuid::new_v4(), role);

            let d = doc(owner, DocumentStatus::Draft);
            assert!(apply_transition(&d, DocumentStatus::Pending, &reviewer).is_ok());
            assert!(apply_transition(&d, DocumentStatus::Approved, &reviewer).is_ok());

            let pending = doc(owner, DocumentStatus::Pending);
            assert!(apply_transition(&pending, DocumentStatus::Approved, &reviewer).is_ok());

            let approved = doc(owner, DocumentStatus::Approved);
            assert!(apply_transition(&approved, DocumentStatus::Pending, &reviewer).is_ok());
        }
    }

    #[test]
    fn nothing_goes_back_to_draft() {
        let owner = Uuid::new_v4();
        let admin = principal(Uuid::new_v4(), Role::Admin);
        for status in [DocumentStatus::Pending, DocumentStatus::Approved] {
            let d = doc(owner, status);
            let err = apply_transition(&d, DocumentStatus::Draft, &admin).unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
        }
    }
}
