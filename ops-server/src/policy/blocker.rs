//! Blocker lifecycle transitions

use shared::models::{Blocker, BlockerStatus};

use super::PolicyError;
use crate::auth::CurrentUser;

/// Requested blocker transition
#[derive(Debug, Clone)]
pub enum BlockerAction {
    /// Mark resolved, optionally with notes. Legal only while active.
    Resolve { resolution_notes: Option<String> },
    /// Back to active. Legal only while resolved and not archived.
    Reopen,
    /// Edit descriptive fields
    Edit {
        description: Option<String>,
        impact: Option<String>,
        related_status_id: Option<i64>,
        related_incident_id: Option<i64>,
    },
    Archive,
    Unarchive,
    /// Permanent removal - admin only, archived only
    Delete,
}

/// Field changes produced by a legal transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockerPatch {
    pub description: Option<String>,
    pub impact: Option<String>,
    pub status: Option<BlockerStatus>,
    pub resolution_notes: Option<String>,
    pub related_status_id: Option<i64>,
    pub related_incident_id: Option<i64>,
    pub archived: Option<bool>,
    pub resolved_at: Option<Option<i64>>,
    pub hard_delete: bool,
}

impl BlockerPatch {
    /// Merge this patch into a blocker row. `now` becomes `updated_at`.
    pub fn apply(self, blocker: &mut Blocker, now: i64) {
        if let Some(description) = self.description {
            blocker.description = description;
        }
        if let Some(impact) = self.impact {
            blocker.impact = impact;
        }
        if let Some(status) = self.status {
            blocker.status = status;
        }
        if let Some(notes) = self.resolution_notes {
            blocker.resolution_notes = Some(notes);
        }
        if let Some(id) = self.related_status_id {
            blocker.related_status_id = Some(id);
        }
        if let Some(id) = self.related_incident_id {
            blocker.related_incident_id = Some(id);
        }
        if let Some(archived) = self.archived {
            blocker.archived = archived;
        }
        if let Some(resolved_at) = self.resolved_at {
            blocker.resolved_at = resolved_at;
        }
        blocker.updated_at = now;
    }
}

fn ensure_not_archived(blocker: &Blocker) -> Result<(), PolicyError> {
    if blocker.archived {
        return Err(PolicyError::Archived(
            "blocker is archived; unarchive it first".to_string(),
        ));
    }
    Ok(())
}

/// Decide whether `action` is legal for `blocker` when requested by `actor`.
pub fn transition(
    blocker: &Blocker,
    action: BlockerAction,
    actor: &CurrentUser,
    now: i64,
) -> Result<BlockerPatch, PolicyError> {
    match action {
        BlockerAction::Resolve { resolution_notes } => {
            ensure_not_archived(blocker)?;
            if blocker.status != BlockerStatus::Active {
                return Err(PolicyError::InvalidState(
                    "only active blockers can be resolved".to_string(),
                ));
            }

            let mut patch = BlockerPatch {
                status: Some(BlockerStatus::Resolved),
                ..Default::default()
            };
            if let Some(notes) = resolution_notes {
                patch.resolution_notes = Some(notes);
            }
            if blocker.resolved_at.is_none() {
                patch.resolved_at = Some(Some(now));
            }
            Ok(patch)
        }

        BlockerAction::Reopen => {
            ensure_not_archived(blocker)?;
            if blocker.status != BlockerStatus::Resolved {
                return Err(PolicyError::InvalidState(
                    "only resolved blockers can be reopened".to_string(),
                ));
            }
            // Notes are retained across a reopen; only the timestamp resets
            Ok(BlockerPatch {
                status: Some(BlockerStatus::Active),
                resolved_at: Some(None),
                ..Default::default()
            })
        }

        BlockerAction::Edit {
            description,
            impact,
            related_status_id,
            related_incident_id,
        } => {
            ensure_not_archived(blocker)?;
            Ok(BlockerPatch {
                description,
                impact,
                related_status_id,
                related_incident_id,
                ..Default::default()
            })
        }

        BlockerAction::Archive => {
            if blocker.archived {
                return Err(PolicyError::Archived(
                    "blocker is already archived".to_string(),
                ));
            }
            Ok(BlockerPatch {
                archived: Some(true),
                ..Default::default()
            })
        }

        BlockerAction::Unarchive => {
            if !blocker.archived {
                return Err(PolicyError::NotArchived(
                    "blocker is not archived".to_string(),
                ));
            }
            Ok(BlockerPatch {
                archived: Some(false),
                ..Default::default()
            })
        }

        BlockerAction::Delete => {
            if !actor.is_admin() {
                return Err(PolicyError::Forbidden(
                    "only an admin can permanently delete blockers".to_string(),
                ));
            }
            if !blocker.archived {
                return Err(PolicyError::NotArchived(
                    "only archived blockers can be deleted".to_string(),
                ));
            }
            Ok(BlockerPatch {
                hard_delete: true,
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::UserRole;

    fn member() -> CurrentUser {
        CurrentUser {
            id: 1,
            email: "m@example.com".to_string(),
            full_name: "Member".to_string(),
            role: UserRole::Member,
        }
    }

    fn admin() -> CurrentUser {
        CurrentUser {
            id: 2,
            email: "a@example.com".to_string(),
            full_name: "Admin".to_string(),
            role: UserRole::Admin,
        }
    }

    fn blocker(status: BlockerStatus, archived: bool) -> Blocker {
        Blocker {
            id: 20,
            reported_by_id: 1,
            reported_by_name: None,
            description: "waiting on vendor API keys".to_string(),
            impact: "integration work stalled".to_string(),
            status,
            resolution_notes: None,
            related_status_id: None,
            related_incident_id: None,
            archived,
            created_at: 1_000,
            updated_at: 1_000,
            resolved_at: None,
        }
    }

    #[test]
    fn resolve_only_from_active() {
        let active = blocker(BlockerStatus::Active, false);
        let patch = transition(
            &active,
            BlockerAction::Resolve {
                resolution_notes: Some("keys arrived".to_string()),
            },
            &member(),
            3_000,
        )
        .unwrap();
        assert_eq!(patch.status, Some(BlockerStatus::Resolved));
        assert_eq!(patch.resolved_at, Some(Some(3_000)));
        assert_eq!(patch.resolution_notes.as_deref(), Some("keys arrived"));

        let resolved = blocker(BlockerStatus::Resolved, false);
        assert!(matches!(
            transition(
                &resolved,
                BlockerAction::Resolve {
                    resolution_notes: None
                },
                &member(),
                3_000,
            ),
            Err(PolicyError::InvalidState(_))
        ));

        let archived = blocker(BlockerStatus::Active, true);
        assert!(matches!(
            transition(
                &archived,
                BlockerAction::Resolve {
                    resolution_notes: None
                },
                &member(),
                3_000,
            ),
            Err(PolicyError::Archived(_))
        ));
    }

    #[test]
    fn reopen_only_from_resolved() {
        let mut resolved = blocker(BlockerStatus::Resolved, false);
        resolved.resolved_at = Some(3_000);
        resolved.resolution_notes = Some("keys arrived".to_string());

        let patch = transition(&resolved, BlockerAction::Reopen, &member(), 4_000).unwrap();
        assert_eq!(patch.status, Some(BlockerStatus::Active));
        assert_eq!(patch.resolved_at, Some(None));

        patch.apply(&mut resolved, 4_000);
        assert_eq!(resolved.status, BlockerStatus::Active);
        assert_eq!(resolved.resolved_at, None);
        // Notes survive the reopen
        assert_eq!(resolved.resolution_notes.as_deref(), Some("keys arrived"));

        let active = blocker(BlockerStatus::Active, false);
        assert!(matches!(
            transition(&active, BlockerAction::Reopen, &member(), 4_000),
            Err(PolicyError::InvalidState(_))
        ));
    }

    #[test]
    fn resolve_then_archive_then_reopen_fails() {
        let mut b = blocker(BlockerStatus::Active, false);

        let patch = transition(
            &b,
            BlockerAction::Resolve {
                resolution_notes: Some("fixed".to_string()),
            },
            &member(),
            5_000,
        )
        .unwrap();
        patch.apply(&mut b, 5_000);
        assert_eq!(b.status, BlockerStatus::Resolved);
        assert_eq!(b.resolved_at, Some(5_000));
        assert_eq!(b.resolution_notes.as_deref(), Some("fixed"));

        let patch = transition(&b, BlockerAction::Archive, &member(), 6_000).unwrap();
        patch.apply(&mut b, 6_000);
        assert!(b.archived);

        let err = transition(&b, BlockerAction::Reopen, &member(), 7_000).unwrap_err();
        assert!(matches!(err, PolicyError::Archived(_)));
    }

    #[test]
    fn edit_blocked_while_archived() {
        let archived = blocker(BlockerStatus::Active, true);
        assert!(matches!(
            transition(
                &archived,
                BlockerAction::Edit {
                    description: Some("new".to_string()),
                    impact: None,
                    related_status_id: None,
                    related_incident_id: None,
                },
                &member(),
                2_000,
            ),
            Err(PolicyError::Archived(_))
        ));
    }

    #[test]
    fn delete_requires_admin_and_archived() {
        let archived = blocker(BlockerStatus::Resolved, true);
        let live = blocker(BlockerStatus::Resolved, false);

        assert!(matches!(
            transition(&archived, BlockerAction::Delete, &member(), 2_000),
            Err(PolicyError::Forbidden(_))
        ));
        assert!(matches!(
            transition(&live, BlockerAction::Delete, &admin(), 2_000),
            Err(PolicyError::NotArchived(_))
        ));
        let patch = transition(&archived, BlockerAction::Delete, &admin(), 2_000).unwrap();
        assert!(patch.hard_delete);
    }

    #[test]
    fn archive_has_no_status_precondition() {
        let active = blocker(BlockerStatus::Active, false);
        let patch = transition(&active, BlockerAction::Archive, &member(), 2_000).unwrap();
        assert_eq!(patch.archived, Some(true));
    }
}
