mod common;

use common::Portal;
use practicas_core::model::validation::ValidationError;
use practicas_core::{AuthService, NewUser, Notice, RecordStore, Role, ServiceError};
use std::sync::Arc;

fn company_tutor_request(company: Option<&str>) -> NewUser {
    NewUser {
        email: "nuevo@corp.com".to_string(),
        password: "clave".to_string(),
        first_name: "Nora".to_string(),
        last_name: "Salas".to_string(),
        role: Role::CompanyTutor,
        career: Some("ignorada".to_string()),
        company: company.map(str::to_string),
        phone: Some("999888777".to_string()),
    }
}

#[test]
fn demo_accounts_can_log_in() {
    let portal = Portal::seeded();
    let auth = AuthService::new(portal.store.clone());

    let user = auth.login("tutor.academico@test.com", "123456").unwrap();
    assert_eq!(user.role, Role::AcademicTutor);
    assert_eq!(user.full_name(), "Ana Martínez");
    assert_eq!(auth.current_user(), Some(user));
}

#[test]
fn wrong_credentials_leave_no_session() {
    let portal = Portal::seeded();
    let auth = AuthService::new(portal.store.clone());

    let err = auth.login("estudiante@test.com", "incorrecta").unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));
    assert!(auth.current_user().is_none());
    assert_eq!(Notice::from_error(&err).message, "Credenciales incorrectas");
}

#[test]
fn login_before_bootstrap_reports_uninitialized_store() {
    let auth = AuthService::new(Arc::new(RecordStore::in_memory()));
    assert!(matches!(
        auth.login("estudiante@test.com", "123456"),
        Err(ServiceError::Uninitialized)
    ));

    auth.bootstrap(true).unwrap();
    assert!(auth.login("estudiante@test.com", "123456").is_ok());
}

#[test]
fn registration_enforces_role_fields_and_unique_email() {
    let portal = Portal::seeded();
    let auth = AuthService::new(portal.store.clone());

    let missing = auth.register(company_tutor_request(None)).unwrap_err();
    assert!(matches!(
        missing,
        ServiceError::Validation(ValidationError::MissingField("empresa"))
    ));
    assert_eq!(
        Notice::from_error(&missing).message,
        "Los tutores empresariales deben especificar su empresa"
    );

    let user = auth
        .register(company_tutor_request(Some("Nova S.A.")))
        .unwrap();
    assert!(user.career.is_none());
    assert!(auth.current_user().is_none());

    let duplicate = auth
        .register(company_tutor_request(Some("Nova S.A.")))
        .unwrap_err();
    assert!(matches!(duplicate, ServiceError::Duplicate { .. }));
    assert_eq!(
        Notice::from_error(&duplicate).message,
        "El email ya está registrado"
    );

    let logged_in = auth.login("NUEVO@corp.com", "clave").unwrap();
    assert_eq!(logged_in.id, user.id);
}

#[test]
fn password_recovery_returns_stored_password() {
    let portal = Portal::seeded();
    let auth = AuthService::new(portal.store.clone());

    assert_eq!(auth.recover_password("coordinador@test.com").unwrap(), "123456");
    assert!(matches!(
        auth.recover_password("nadie@test.com"),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        auth.recover_password(""),
        Err(ServiceError::Validation(_))
    ));
}
