//! Role use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, table loads and atomic commits into the
//!   operations of each portal role.
//! - Keep callers decoupled from storage keys and event plumbing.
//!
//! Every mutation follows the same path: validate the request, check
//! references and uniqueness against freshly loaded tables, mutate, then
//! commit a [`ChangeSet`](crate::store::ChangeSet) which announces the typed
//! events once the write succeeded.

pub mod academic_tutor_service;
pub mod auth_service;
pub mod company_tutor_service;
pub mod coordinator_service;
pub mod error;
pub mod stats;
pub mod student_service;
mod task_ops;
pub mod view;

pub use error::{Notice, NoticeKind, ServiceError, ServiceResult};
pub(crate) use error::require_role;

use crate::store::{Record, StoreError, Table};

/// Inserts a freshly built row and returns a copy of it.
pub(crate) fn insert_row<T: Record>(table: &mut Table<T>, row: T) -> ServiceResult<T> {
    match table.insert(row) {
        Ok(inserted) => Ok(inserted.clone()),
        Err(rejected) => Err(StoreError::DuplicateId {
            table: T::TABLE,
            id: rejected.id().to_string(),
        }
        .into()),
    }
}
