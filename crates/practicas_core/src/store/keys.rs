//! Persisted key names.

use crate::bus::Signal;
use std::fmt::{Display, Formatter};

/// Key holding the active session's full user record.
pub const SESSION_KEY: &str = "currentUser";

/// Logical tables, each stored as one serialized array under a fixed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableName {
    Users,
    Postings,
    Applications,
    Internships,
    Reports,
    Tasks,
    Companies,
    Evaluations,
    TutorAssignments,
}

impl TableName {
    pub const ALL: [TableName; 9] = [
        TableName::Users,
        TableName::Postings,
        TableName::Applications,
        TableName::Internships,
        TableName::Reports,
        TableName::Tasks,
        TableName::Companies,
        TableName::Evaluations,
        TableName::TutorAssignments,
    ];

    /// Storage key of the table blob.
    pub fn key(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Postings => "ofertas",
            Self::Applications => "postulaciones",
            Self::Internships => "practicas",
            Self::Reports => "reportes",
            Self::Tasks => "tareas",
            Self::Companies => "empresas",
            Self::Evaluations => "evaluaciones",
            Self::TutorAssignments => "asignacionesTutores",
        }
    }

    /// Bus signal raised by any write to this table.
    pub fn signal(self) -> Signal {
        match self {
            Self::Users => Signal::UserDataChanged,
            Self::Tasks => Signal::TaskDataChanged,
            Self::TutorAssignments => Signal::AsignacionesChanged,
            Self::Postings
            | Self::Applications
            | Self::Internships
            | Self::Reports
            | Self::Companies
            | Self::Evaluations => Signal::PracticeDataChanged,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.key() == key)
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
