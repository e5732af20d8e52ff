//! First-run demonstration accounts, one per role.

use crate::model::user::{Role, User};

pub const DEMO_PASSWORD: &str = "123456";

pub fn demo_users() -> Vec<User> {
    vec![
        demo_user(
            "1",
            "estudiante@test.com",
            ("Juan", "Pérez"),
            Role::Student,
            Some("Ingeniería de Sistemas"),
            None,
            "987654321",
        ),
        demo_user(
            "2",
            "tutor.empresarial@test.com",
            ("María", "García"),
            Role::CompanyTutor,
            None,
            Some("TechCorp S.A."),
            "987654322",
        ),
        demo_user(
            "3",
            "coordinador@test.com",
            ("Carlos", "López"),
            Role::Coordinator,
            None,
            None,
            "987654323",
        ),
        demo_user(
            "4",
            "tutor.academico@test.com",
            ("Ana", "Martínez"),
            Role::AcademicTutor,
            None,
            None,
            "987654324",
        ),
    ]
}

fn demo_user(
    id: &str,
    email: &str,
    (first_name, last_name): (&str, &str),
    role: Role,
    career: Option<&str>,
    company: Option<&str>,
    phone: &str,
) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role,
        career: career.map(str::to_string),
        company: company.map(str::to_string),
        phone: Some(phone.to_string()),
        tutor_academico_id: None,
        tutor_empresarial_id: None,
    }
}
