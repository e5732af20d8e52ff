//! Companies registered by company tutors.

use crate::model::validation::{require, ValidationError};
use crate::model::RecordId;
use crate::store::{Record, TableName};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Peruvian taxpayer number.
    pub ruc: String,
    #[serde(rename = "direccion", default)]
    pub address: String,
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub sector: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "fechaRegistro")]
    pub registered_at: String,
}

impl Company {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("nombre", &self.name)?;
        require("ruc", &self.ruc)?;
        if !self.ruc.trim().chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidFormat {
                field: "ruc",
                value: self.ruc.clone(),
            });
        }
        Ok(())
    }
}

impl Record for Company {
    const TABLE: TableName = TableName::Companies;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub ruc: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub sector: String,
    pub description: String,
}

impl NewCompany {
    pub fn into_company(self, id: RecordId, registered_at: String) -> Company {
        Company {
            id,
            name: self.name,
            ruc: self.ruc.trim().to_string(),
            address: self.address,
            phone: self.phone,
            email: self.email,
            sector: self.sector,
            description: self.description,
            registered_at,
        }
    }
}
