//! Student applications ("postulaciones") to postings.

use crate::model::RecordId;
use crate::store::{Record, TableName};
use serde::{Deserialize, Serialize};

/// `Pending -> Accepted | Rejected`; both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "aceptada")]
    Accepted,
    #[serde(rename = "rechazada")]
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Accepted => "aceptada",
            Self::Rejected => "rechazada",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: RecordId,
    pub estudiante_id: RecordId,
    pub oferta_id: RecordId,
    #[serde(rename = "fechaPostulacion")]
    pub applied_at: String,
    #[serde(rename = "estado")]
    pub status: ApplicationStatus,
    #[serde(rename = "cartaPresentacion")]
    pub cover_letter: String,
}

impl Record for Application {
    const TABLE: TableName = TableName::Applications;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Company tutor verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(self) -> ApplicationStatus {
        match self {
            Self::Accept => ApplicationStatus::Accepted,
            Self::Reject => ApplicationStatus::Rejected,
        }
    }
}
