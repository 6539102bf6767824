mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Outcome of a guarded user deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDeletion {
    Deleted,
    NotFound,
    /// The target is the only remaining admin; nothing was deleted.
    LastAdmin,
}

/// Store defines the document database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Applies only the fields set in `update`. Returns the stored user afterwards,
    /// or `None` if no user has that id.
    fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>>;
    fn count_admins(&self) -> Result<i64>;
    /// Deletes a user unless that would leave no admin. The check and the
    /// delete run in one transaction.
    fn delete_user_guarded(&self, id: &str) -> Result<UserDeletion>;

    // Notebook operations
    fn create_notebook(&self, notebook: &Notebook) -> Result<()>;
    fn get_notebook(&self, id: &str) -> Result<Option<Notebook>>;
    /// Adds one view and returns the updated notebook.
    fn increment_notebook_views(&self, id: &str) -> Result<Option<Notebook>>;
    /// Overwrites the stored document, last write wins, except `stats`, which
    /// keeps its stored value. Returns the saved notebook, or `None` if it is gone.
    fn update_notebook(&self, notebook: &Notebook) -> Result<Option<Notebook>>;
    /// Deletes the notebook only if `owner_id` owns it.
    fn delete_notebook_owned(&self, id: &str, owner_id: &str) -> Result<bool>;
}

/// Sink for user activity records. Writes are best-effort from the caller's view.
pub trait ActivityLog: Send + Sync {
    fn record_activity(&self, activity: &Activity) -> Result<()>;
    fn list_notebook_activities(&self, notebook_id: &str) -> Result<Vec<Activity>>;
}
