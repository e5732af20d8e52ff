//! Student activity reports ("reportes").

use crate::model::validation::{require, require_range, ValidationError};
use crate::model::RecordId;
use crate::store::{Record, TableName};
use serde::{Deserialize, Serialize};

pub const MAX_REPORT_HOURS: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: RecordId,
    pub practica_id: RecordId,
    pub estudiante_id: RecordId,
    #[serde(rename = "fecha")]
    pub created_at: String,
    #[serde(rename = "actividades")]
    pub activities: String,
    #[serde(rename = "observaciones", default)]
    pub observations: String,
    #[serde(rename = "horasTrabajadas")]
    pub hours_worked: u8,
}

impl Record for Report {
    const TABLE: TableName = TableName::Reports;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewReport {
    pub activities: String,
    pub observations: String,
    pub hours_worked: u8,
}

impl NewReport {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("actividades", &self.activities)?;
        require_range(
            "horasTrabajadas",
            f64::from(self.hours_worked),
            0.0,
            f64::from(MAX_REPORT_HOURS),
        )
    }
}
