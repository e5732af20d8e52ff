//! Service error taxonomy and the user-facing notice boundary.
//!
//! # Responsibility
//! - Classify every business failure of the role services.
//! - Turn any service outcome into a transient [`Notice`].
//!
//! # Invariants
//! - Business failures never write partial state: they are raised before the
//!   commit, or by the commit itself (which is atomic).
//! - Read-side deserialization failures never surface here; the store logs
//!   them and yields empty tables.

use crate::model::user::{Role, User};
use crate::model::validation::ValidationError;
use crate::model::RecordId;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Required field missing or out of range.
    Validation(ValidationError),
    /// Unique value already taken (`entity.field == value`).
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    NotFound {
        entity: &'static str,
        id: RecordId,
    },
    /// Student has no internship in progress.
    MissingActiveInternship { student_id: RecordId },
    /// Status change not allowed by the entity state machine.
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
    /// Acting user does not have the role the operation requires.
    RoleMismatch { expected: Role, actual: Role },
    /// Record exists but belongs to someone else.
    NotOwner {
        entity: &'static str,
        id: RecordId,
    },
    /// Request contradicts existing data (second active internship, ...).
    Conflict(String),
    InvalidCredentials,
    /// `users` was never initialized.
    Uninitialized,
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate {
                entity,
                field,
                value,
            } => write!(f, "{entity} with {field} `{value}` already exists"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MissingActiveInternship { student_id } => {
                write!(f, "student {student_id} has no internship in progress")
            }
            Self::InvalidTransition { entity, from, to } => {
                write!(f, "{entity} cannot move from `{from}` to `{to}`")
            }
            Self::RoleMismatch { expected, actual } => write!(
                f,
                "operation requires role `{}`, acting user is `{}`",
                expected.as_str(),
                actual.as_str()
            ),
            Self::NotOwner { entity, id } => {
                write!(f, "{entity} {id} does not belong to the acting user")
            }
            Self::Conflict(details) => write!(f, "conflict: {details}"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Uninitialized => write!(f, "user table is not initialized"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl ServiceError {
    /// Stable machine-readable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Duplicate { .. } => "duplicate",
            Self::NotFound { .. } => "not_found",
            Self::MissingActiveInternship { .. } => "missing_active_internship",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::RoleMismatch { .. } => "role_mismatch",
            Self::NotOwner { .. } => "not_owner",
            Self::Conflict(_) => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Uninitialized => "uninitialized",
            Self::Store(StoreError::Conflict { .. }) => "stale_write",
            Self::Store(_) => "store",
        }
    }
}

pub(crate) fn require_role(user: &User, expected: Role) -> ServiceResult<()> {
    if user.role == expected {
        return Ok(());
    }
    Err(ServiceError::RoleMismatch {
        expected,
        actual: user.role,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient notification shown after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn from_error(err: &ServiceError) -> Self {
        let message = match err {
            ServiceError::Validation(ValidationError::MissingField("carrera")) => {
                "Los estudiantes deben especificar su carrera".to_string()
            }
            ServiceError::Validation(ValidationError::MissingField("empresa")) => {
                "Los tutores empresariales deben especificar su empresa".to_string()
            }
            ServiceError::Validation(ValidationError::MissingField(_)) => {
                "Por favor completa todos los campos obligatorios".to_string()
            }
            ServiceError::Validation(other) => format!("Dato inválido: {other}"),
            ServiceError::Duplicate {
                entity: "usuario", ..
            } => "El email ya está registrado".to_string(),
            ServiceError::Duplicate {
                entity: "postulación",
                ..
            } => "Ya te has postulado a esta oferta".to_string(),
            ServiceError::Duplicate { entity, .. } => format!("Ya existe un registro de {entity}"),
            ServiceError::NotFound { entity, .. } => format!("No se encontró {entity}"),
            ServiceError::MissingActiveInternship { .. } => {
                "El estudiante no tiene una práctica activa".to_string()
            }
            ServiceError::InvalidTransition { entity, from, .. } => {
                format!("La {entity} ya está en estado {from}")
            }
            ServiceError::RoleMismatch { expected, .. } => {
                format!("Esta acción requiere el rol {}", expected.display_name())
            }
            ServiceError::NotOwner { entity, .. } => {
                format!("No tienes permiso sobre esta {entity}")
            }
            ServiceError::Conflict(details) => details.clone(),
            ServiceError::InvalidCredentials => "Credenciales incorrectas".to_string(),
            ServiceError::Uninitialized => {
                "Error del sistema: no hay usuarios registrados".to_string()
            }
            ServiceError::Store(StoreError::Conflict { .. }) => {
                "Los datos cambiaron mientras se guardaban, inténtalo de nuevo".to_string()
            }
            ServiceError::Store(_) => "Error al guardar los datos".to_string(),
        };
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_string(),
            message,
        }
    }

    /// Success notice with the given texts, or the error notice for `result`.
    pub fn from_result<T>(
        result: &ServiceResult<T>,
        success_title: &str,
        success_message: &str,
    ) -> Self {
        match result {
            Ok(_) => Self::success(success_title, success_message),
            Err(err) => Self::from_error(err),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}
