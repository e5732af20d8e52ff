//! Tasks ("tareas") assigned by tutors to students.
//!
//! # Invariants
//! - Writers only persist `Pending` and `Completed`; `Overdue` is derived at
//!   read time by [`Task::display_status`] and never stored.
//! - Grading sets `grade`/`tutor_comments` without changing `status`.

use crate::clock::parse_instant;
use crate::model::validation::{require, require_range, ValidationError};
use crate::model::RecordId;
use crate::store::{Record, TableName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_TASK_GRADE: u8 = 1;
pub const MAX_TASK_GRADE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "en_progreso")]
    InProgress,
    #[serde(rename = "completada")]
    Completed,
    /// Display-only.
    #[serde(rename = "vencida")]
    Overdue,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::InProgress => "en_progreso",
            Self::Completed => "completada",
            Self::Overdue => "vencida",
        }
    }
}

/// Which kind of tutor created the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignerKind {
    #[serde(rename = "tutor_empresarial")]
    CompanyTutor,
    #[serde(rename = "tutor_academico")]
    AcademicTutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "fechaCreacion")]
    pub created_at: String,
    /// `YYYY-MM-DD` or a full timestamp; may be blank.
    #[serde(rename = "fechaVencimiento", default)]
    pub due_date: String,
    #[serde(rename = "estado")]
    pub status: TaskStatus,
    /// Id of the tutor who created the task.
    #[serde(rename = "asignadaPor")]
    pub assigned_by: RecordId,
    pub estudiante_id: RecordId,
    pub practica_id: RecordId,
    #[serde(rename = "tipoAsignador")]
    pub assigner_kind: AssignerKind,
    #[serde(rename = "entregaEstudiante", default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
    #[serde(rename = "fechaEntrega", default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
    #[serde(rename = "calificacion", default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    #[serde(rename = "comentariosTutor", default, skip_serializing_if = "Option::is_none")]
    pub tutor_comments: Option<String>,
}

impl Task {
    /// Status to show at `now`: unfinished tasks past their due date read as
    /// `Overdue`.
    pub fn display_status(&self, now: DateTime<Utc>) -> TaskStatus {
        match self.status {
            TaskStatus::Pending | TaskStatus::InProgress if self.is_past_due(now) => {
                TaskStatus::Overdue
            }
            status => status,
        }
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        parse_instant(&self.due_date).is_some_and(|due| due < now)
    }

    pub fn is_delivered(&self) -> bool {
        self.status == TaskStatus::Completed && self.delivery.is_some()
    }
}

impl Record for Task {
    const TABLE: TableName = TableName::Tasks;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Task creation request shared by both tutor kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub student_id: RecordId,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("titulo", &self.title)?;
        require("descripcion", &self.description)?;
        require("estudianteId", &self.student_id)?;
        let due = self.due_date.trim();
        if !due.is_empty() && parse_instant(due).is_none() {
            return Err(ValidationError::InvalidFormat {
                field: "fechaVencimiento",
                value: self.due_date.clone(),
            });
        }
        Ok(())
    }
}

pub fn validate_grade(grade: u8) -> Result<(), ValidationError> {
    require_range(
        "calificacion",
        f64::from(grade),
        f64::from(MIN_TASK_GRADE),
        f64::from(MAX_TASK_GRADE),
    )
}
