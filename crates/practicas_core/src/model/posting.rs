//! Internship postings ("ofertas").
//!
//! # Invariants
//! - `company_name` is a snapshot of `Company.name` taken when the posting is
//!   created; later company renames do not propagate.
//! - New postings start as `Active`.

use crate::model::validation::{require, ValidationError};
use crate::model::RecordId;
use crate::store::{Record, TableName};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODALITY: &str = "presencial";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingStatus {
    #[serde(rename = "activa")]
    Active,
    #[serde(rename = "cerrada")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub id: RecordId,
    #[serde(rename = "titulo")]
    pub title: String,
    /// Company name frozen at creation time.
    #[serde(rename = "empresa")]
    pub company_name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "requisitos", default)]
    pub requirements: String,
    #[serde(rename = "duracion", default)]
    pub duration: String,
    #[serde(rename = "modalidad", default)]
    pub modality: String,
    #[serde(rename = "fechaInicio", default)]
    pub start_date: String,
    #[serde(rename = "fechaFin", default)]
    pub end_date: String,
    #[serde(rename = "estado")]
    pub status: PostingStatus,
    pub tutor_empresarial_id: RecordId,
}

impl Posting {
    pub fn is_active(&self) -> bool {
        self.status == PostingStatus::Active
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("titulo", &self.title)?;
        require("descripcion", &self.description)?;
        require("empresa", &self.company_name)?;
        Ok(())
    }
}

impl Record for Posting {
    const TABLE: TableName = TableName::Postings;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Posting creation request; `company_id` picks the company whose name is
/// copied into the posting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPosting {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub duration: String,
    pub modality: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub company_id: RecordId,
}
