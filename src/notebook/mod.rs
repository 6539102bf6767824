mod access;
mod update;

pub use access::{can_edit, can_view, is_owner, is_shared_with};
pub use update::{UPDATABLE_FIELDS, apply_update, generate_cell_id, word_count};
