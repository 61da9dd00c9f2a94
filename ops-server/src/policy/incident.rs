//! Incident lifecycle transitions

use shared::models::{Incident, IncidentSeverity, IncidentStatus};

use super::PolicyError;
use crate::auth::CurrentUser;

/// Requested incident transition
#[derive(Debug, Clone)]
pub enum IncidentAction {
    /// Change lifecycle status, optionally attaching resolution notes.
    /// Writing the current status again is allowed (idempotent write).
    SetStatus {
        status: IncidentStatus,
        resolution_notes: Option<String>,
    },
    /// Assign to a user, or unassign with `None`. Target existence is
    /// validated by the caller against the user directory.
    Assign { assigned_to_id: Option<i64> },
    /// Edit descriptive fields
    Edit {
        title: Option<String>,
        description: Option<String>,
        severity: Option<IncidentSeverity>,
    },
    Archive,
    Unarchive,
    /// Permanent removal - admin only, archived only
    Delete,
}

/// Field changes produced by a legal transition.
///
/// `None` means "leave unchanged"; the double options carry explicit
/// NULL writes (unassign, clear resolved_at).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<IncidentSeverity>,
    pub status: Option<IncidentStatus>,
    pub resolution_notes: Option<String>,
    pub assigned_to_id: Option<Option<i64>>,
    pub archived: Option<bool>,
    pub resolved_at: Option<Option<i64>>,
    pub hard_delete: bool,
}

impl IncidentPatch {
    /// Merge this patch into an incident row. `now` becomes `updated_at`.
    pub fn apply(self, incident: &mut Incident, now: i64) {
        if let Some(title) = self.title {
            incident.title = title;
        }
        if let Some(description) = self.description {
            incident.description = description;
        }
        if let Some(severity) = self.severity {
            incident.severity = severity;
        }
        if let Some(status) = self.status {
            incident.status = status;
        }
        if let Some(notes) = self.resolution_notes {
            incident.resolution_notes = Some(notes);
        }
        if let Some(assignee) = self.assigned_to_id {
            incident.assigned_to_id = assignee;
            incident.assigned_to_name = None;
        }
        if let Some(archived) = self.archived {
            incident.archived = archived;
        }
        if let Some(resolved_at) = self.resolved_at {
            incident.resolved_at = resolved_at;
        }
        incident.updated_at = now;
    }
}

fn ensure_not_archived(incident: &Incident) -> Result<(), PolicyError> {
    if incident.archived {
        return Err(PolicyError::Archived(
            "incident is archived; unarchive it first".to_string(),
        ));
    }
    Ok(())
}

/// Decide whether `action` is legal for `incident` when requested by `actor`.
pub fn transition(
    incident: &Incident,
    action: IncidentAction,
    actor: &CurrentUser,
    now: i64,
) -> Result<IncidentPatch, PolicyError> {
    match action {
        IncidentAction::SetStatus {
            status,
            resolution_notes,
        } => {
            ensure_not_archived(incident)?;

            let mut patch = IncidentPatch {
                status: Some(status),
                ..Default::default()
            };
            // Notes are stored only when provided; moving away from a
            // settled status keeps previously stored notes.
            if let Some(notes) = resolution_notes {
                patch.resolution_notes = Some(notes);
            }
            if status.is_active() {
                if incident.resolved_at.is_some() {
                    patch.resolved_at = Some(None);
                }
            } else if incident.resolved_at.is_none() {
                patch.resolved_at = Some(Some(now));
            }
            Ok(patch)
        }

        IncidentAction::Assign { assigned_to_id } => {
            ensure_not_archived(incident)?;
            Ok(IncidentPatch {
                assigned_to_id: Some(assigned_to_id),
                ..Default::default()
            })
        }

        IncidentAction::Edit {
            title,
            description,
            severity,
        } => {
            ensure_not_archived(incident)?;
            Ok(IncidentPatch {
                title,
                description,
                severity,
                ..Default::default()
            })
        }

        IncidentAction::Archive => {
            if incident.archived {
                return Err(PolicyError::Archived(
                    "incident is already archived".to_string(),
                ));
            }
            Ok(IncidentPatch {
                archived: Some(true),
                ..Default::default()
            })
        }

        IncidentAction::Unarchive => {
            if !incident.archived {
                return Err(PolicyError::NotArchived(
                    "incident is not archived".to_string(),
                ));
            }
            Ok(IncidentPatch {
                archived: Some(false),
                ..Default::default()
            })
        }

        IncidentAction::Delete => {
            if !actor.is_admin() {
                return Err(PolicyError::Forbidden(
                    "only an admin can permanently delete incidents".to_string(),
                ));
            }
            if !incident.archived {
                return Err(PolicyError::NotArchived(
                    "only archived incidents can be deleted".to_string(),
                ));
            }
            Ok(IncidentPatch {
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

    fn incident(status: IncidentStatus, archived: bool) -> Incident {
        Incident {
            id: 10,
            reported_by_id: 1,
            reported_by_name: None,
            assigned_to_id: None,
            assigned_to_name: None,
            title: "DB outage".to_string(),
            description: "primary down".to_string(),
            severity: IncidentSeverity::High,
            status,
            resolution_notes: None,
            archived,
            created_at: 1_000,
            updated_at: 1_000,
            resolved_at: None,
        }
    }

    #[test]
    fn set_status_on_archived_fails() {
        let inc = incident(IncidentStatus::Open, true);
        let err = transition(
            &inc,
            IncidentAction::SetStatus {
                status: IncidentStatus::Resolved,
                resolution_notes: None,
            },
            &member(),
            2_000,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::Archived(_)));
    }

    #[test]
    fn assign_on_archived_fails() {
        let inc = incident(IncidentStatus::Open, true);
        let err = transition(
            &inc,
            IncidentAction::Assign {
                assigned_to_id: Some(5),
            },
            &member(),
            2_000,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::Archived(_)));
    }

    #[test]
    fn edit_on_archived_fails() {
        let inc = incident(IncidentStatus::Open, true);
        let err = transition(
            &inc,
            IncidentAction::Edit {
                title: Some("new".to_string()),
                description: None,
                severity: None,
            },
            &member(),
            2_000,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::Archived(_)));
    }

    #[test]
    fn resolve_sets_resolved_at_once() {
        let inc = incident(IncidentStatus::Open, false);
        let patch = transition(
            &inc,
            IncidentAction::SetStatus {
                status: IncidentStatus::Resolved,
                resolution_notes: Some("restored".to_string()),
            },
            &member(),
            5_000,
        )
        .unwrap();
        assert_eq!(patch.status, Some(IncidentStatus::Resolved));
        assert_eq!(patch.resolved_at, Some(Some(5_000)));
        assert_eq!(patch.resolution_notes.as_deref(), Some("restored"));

        // Already settled: resolved_at untouched on a second settled write
        let mut settled = incident(IncidentStatus::Resolved, false);
        settled.resolved_at = Some(5_000);
        let patch = transition(
            &settled,
            IncidentAction::SetStatus {
                status: IncidentStatus::Closed,
                resolution_notes: None,
            },
            &member(),
            9_000,
        )
        .unwrap();
        assert_eq!(patch.resolved_at, None);
    }

    #[test]
    fn reopening_clears_resolved_at_but_keeps_notes() {
        let mut inc = incident(IncidentStatus::Resolved, false);
        inc.resolved_at = Some(5_000);
        inc.resolution_notes = Some("restored".to_string());

        let patch = transition(
            &inc,
            IncidentAction::SetStatus {
                status: IncidentStatus::Open,
                resolution_notes: None,
            },
            &member(),
            9_000,
        )
        .unwrap();
        assert_eq!(patch.resolved_at, Some(None));
        // No notes write requested: stored notes survive the merge
        assert_eq!(patch.resolution_notes, None);

        patch.apply(&mut inc, 9_000);
        assert_eq!(inc.status, IncidentStatus::Open);
        assert_eq!(inc.resolved_at, None);
        assert_eq!(inc.resolution_notes.as_deref(), Some("restored"));
    }

    #[test]
    fn idempotent_status_write_allowed() {
        let inc = incident(IncidentStatus::Open, false);
        let patch = transition(
            &inc,
            IncidentAction::SetStatus {
                status: IncidentStatus::Open,
                resolution_notes: None,
            },
            &member(),
            2_000,
        )
        .unwrap();
        assert_eq!(patch.status, Some(IncidentStatus::Open));
        assert_eq!(patch.resolved_at, None);
    }

    #[test]
    fn archive_unarchive_roundtrip() {
        let open = incident(IncidentStatus::Open, false);
        // No status precondition: an open incident may be archived
        let patch = transition(&open, IncidentAction::Archive, &member(), 2_000).unwrap();
        assert_eq!(patch.archived, Some(true));

        let archived = incident(IncidentStatus::Open, true);
        assert!(matches!(
            transition(&archived, IncidentAction::Archive, &member(), 2_000),
            Err(PolicyError::Archived(_))
        ));

        let patch = transition(&archived, IncidentAction::Unarchive, &member(), 2_000).unwrap();
        assert_eq!(patch.archived, Some(false));

        assert!(matches!(
            transition(&open, IncidentAction::Unarchive, &member(), 2_000),
            Err(PolicyError::NotArchived(_))
        ));
    }

    #[test]
    fn delete_requires_admin_and_archived() {
        let archived = incident(IncidentStatus::Closed, true);
        let live = incident(IncidentStatus::Closed, false);

        assert!(matches!(
            transition(&archived, IncidentAction::Delete, &member(), 2_000),
            Err(PolicyError::Forbidden(_))
        ));
        assert!(matches!(
            transition(&live, IncidentAction::Delete, &admin(), 2_000),
            Err(PolicyError::NotArchived(_))
        ));

        let patch = transition(&archived, IncidentAction::Delete, &admin(), 2_000).unwrap();
        assert!(patch.hard_delete);
    }

    #[test]
    fn unassign_writes_explicit_null() {
        let mut inc = incident(IncidentStatus::Open, false);
        inc.assigned_to_id = Some(5);

        let patch = transition(
            &inc,
            IncidentAction::Assign {
                assigned_to_id: None,
            },
            &member(),
            2_000,
        )
        .unwrap();
        assert_eq!(patch.assigned_to_id, Some(None));

        patch.apply(&mut inc, 2_000);
        assert_eq!(inc.assigned_to_id, None);
    }
}
