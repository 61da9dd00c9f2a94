//! Decision authorization
//!
//! Decisions have no archival state machine; the rule set is ownership:
//! only the creator or an admin may edit or delete one.

use shared::models::Decision;

use super::PolicyError;
use crate::auth::CurrentUser;

pub fn can_edit(decision: &Decision, actor: &CurrentUser) -> bool {
    decision.created_by_id == actor.id || actor.is_admin()
}

pub fn can_delete(decision: &Decision, actor: &CurrentUser) -> bool {
    can_edit(decision, actor)
}

pub fn authorize_edit(decision: &Decision, actor: &CurrentUser) -> Result<(), PolicyError> {
    if !can_edit(decision, actor) {
        return Err(PolicyError::Forbidden(
            "only the decision creator or an admin can update decisions".to_string(),
        ));
    }
    Ok(())
}

pub fn authorize_delete(decision: &Decision, actor: &CurrentUser) -> Result<(), PolicyError> {
    if !can_delete(decision, actor) {
        return Err(PolicyError::Forbidden(
            "only the decision creator or an admin can delete decisions".to_string(),
        ));
    }
    Ok(())
}
