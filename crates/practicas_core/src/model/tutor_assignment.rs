//! Academic tutor assignment history ("asignacionesTutores").
//!
//! Written by the coordinator whenever a student's default academic tutor
//! changes; at most one record per student is `Active`.

use crate::model::RecordId;
use crate::store::{Record, TableName};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    #[serde(rename = "activa")]
    Active,
    #[serde(rename = "completada")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorAssignment {
    pub id: RecordId,
    pub tutor_academico_id: RecordId,
    pub estudiante_id: RecordId,
    #[serde(rename = "fechaAsignacion")]
    pub assigned_at: String,
    #[serde(rename = "estado")]
    pub status: AssignmentStatus,
}

impl Record for TutorAssignment {
    const TABLE: TableName = TableName::TutorAssignments;

    fn id(&self) -> &str {
        &self.id
    }
}
