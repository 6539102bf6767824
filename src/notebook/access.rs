//! Ownership and sharing rules for notebooks.
//!
//! These are pure predicates over the caller id and the stored document so the
//! handlers can fetch by id and decide afterwards. A notebook that fails a
//! check is reported exactly like a missing one.

use crate::types::Notebook;

#[must_use]
pub fn is_owner(caller_id: &str, notebook: &Notebook) -> bool {
    notebook.user_id == caller_id
}

#[must_use]
pub fn is_shared_with(caller_id: &str, notebook: &Notebook) -> bool {
    notebook
        .sharing
        .shared_with
        .iter()
        .any(|id| id == caller_id)
}

/// Owner, public notebook, or explicitly shared.
#[must_use]
pub fn can_view(caller_id: &str, notebook: &Notebook) -> bool {
    is_owner(caller_id, notebook)
        || notebook.sharing.is_public
        || is_shared_with(caller_id, notebook)
}

/// Owner, or shared with the caller while `canEdit` is set. Public visibility
/// never grants edit rights.
#[must_use]
pub fn can_edit(caller_id: &str, notebook: &Notebook) -> bool {
    is_owner(caller_id, notebook)
        || (is_shared_with(caller_id, notebook) && notebook.sharing.permissions.can_edit)
}
