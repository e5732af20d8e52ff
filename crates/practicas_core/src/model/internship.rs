//! Internships ("practicas") created when an application is accepted.

use crate::model::RecordId;
use crate::store::{Record, TableName};
use serde::{Deserialize, Serialize};

/// Internship lifecycle.
///
/// `Completed` and `Cancelled` are part of the persisted vocabulary, but no
/// operation in this crate moves an internship out of `InProgress`: a
/// completion/cancellation workflow does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternshipStatus {
    #[serde(rename = "en_curso")]
    InProgress,
    #[serde(rename = "completada")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: RecordId,
    pub estudiante_id: RecordId,
    pub oferta_id: RecordId,
    /// Copied from the posting at acceptance.
    #[serde(rename = "fechaInicio")]
    pub start_date: String,
    #[serde(rename = "fechaFin")]
    pub end_date: String,
    #[serde(rename = "estado")]
    pub status: InternshipStatus,
    pub tutor_empresarial_id: RecordId,
    /// Authoritative academic tutor for this internship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_academico_id: Option<RecordId>,
}

impl Internship {
    pub fn is_in_progress(&self) -> bool {
        self.status == InternshipStatus::InProgress
    }
}

impl Record for Internship {
    const TABLE: TableName = TableName::Internships;

    fn id(&self) -> &str {
        &self.id
    }
}
