//! Portal accounts.
//!
//! # Invariants
//! - `email` is unique across the `users` table (enforced by services).
//! - `career` is set iff `role == Student`; `company` iff `role == CompanyTutor`.
//! - Passwords are stored and compared in plaintext.

use crate::model::validation::{require, require_opt, ValidationError};
use crate::model::RecordId;
use crate::store::{Record, TableName};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Portal role; decides which dashboard a session lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "estudiante")]
    Student,
    #[serde(rename = "tutor_empresarial")]
    CompanyTutor,
    #[serde(rename = "coordinador_academico")]
    Coordinator,
    #[serde(rename = "tutor_academico")]
    AcademicTutor,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Student,
        Role::CompanyTutor,
        Role::Coordinator,
        Role::AcademicTutor,
    ];

    /// Persisted identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "estudiante",
            Self::CompanyTutor => "tutor_empresarial",
            Self::Coordinator => "coordinador_academico",
            Self::AcademicTutor => "tutor_academico",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Student => "Estudiante",
            Self::CompanyTutor => "Tutor Empresarial",
            Self::Coordinator => "Coordinador Académico",
            Self::AcademicTutor => "Tutor Académico",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub email: String,
    pub password: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "carrera", default, skip_serializing_if = "Option::is_none")]
    pub career: Option<String>,
    #[serde(rename = "empresa", default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Default academic tutor for internships created after assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_academico_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_empresarial_id: Option<RecordId>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Checks required fields, e-mail shape and role-specific fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_credentials()?;
        require("apellido", &self.last_name)?;
        match self.role {
            Role::Student => require_opt("carrera", self.career.as_deref()),
            Role::CompanyTutor => require_opt("empresa", self.company.as_deref()),
            Role::Coordinator | Role::AcademicTutor => Ok(()),
        }
    }

    /// Minimum an account needs to log in: e-mail, password and a name.
    pub fn validate_credentials(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        require("password", &self.password)?;
        require("nombre", &self.first_name)?;
        validate_email(&self.email)
    }

    /// Drops role-specific fields that do not belong to the current role.
    pub fn normalize_role_fields(&mut self) {
        if self.role != Role::Student {
            self.career = None;
        }
        if self.role != Role::CompanyTutor {
            self.company = None;
        }
    }
}

impl Record for User {
    const TABLE: TableName = TableName::Users;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Registration/creation request for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub career: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

impl NewUser {
    /// Builds the stored record; the e-mail is trimmed, other text kept as typed.
    pub fn into_user(self, id: RecordId) -> User {
        let mut user = User {
            id,
            email: self.email.trim().to_string(),
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            career: self.career,
            company: self.company,
            phone: self.phone.filter(|phone| !phone.trim().is_empty()),
            tutor_academico_id: None,
            tutor_empresarial_id: None,
        };
        user.normalize_role_fields();
        user
    }
}

/// Partial edit applied by the coordinator; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub career: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

impl UserPatch {
    pub fn apply_to(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email.trim().to_string();
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(career) = self.career {
            user.career = Some(career);
        }
        if let Some(company) = self.company {
            user.company = Some(company);
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        user.normalize_role_fields();
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email.trim()) {
        return Ok(());
    }
    Err(ValidationError::InvalidFormat {
        field: "email",
        value: email.to_string(),
    })
}
