mod common;

use common::{Portal, ACADEMIC_TUTOR_ID, COMPANY_TUTOR_ID, COORDINATOR_ID, STUDENT_ID};
use practicas_core::model::evaluation::{EvaluationAspects, NewEvaluation};
use practicas_core::model::report::{NewReport, Report};
use practicas_core::model::tutor_assignment::{AssignmentStatus, TutorAssignment};
use practicas_core::store::{KvEntry, KvWrite, SESSION_KEY};
use practicas_core::{
    AcademicTutorService, AuthService, CoordinatorService, KvStore, MemoryKvStore, NewUser,
    RecordStore, Role, ServiceError, StoreError, StoreResult, TutorKind, User, UserPatch,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn coordinator(portal: &Portal) -> CoordinatorService {
    CoordinatorService::new(portal.store.clone(), portal.user(COORDINATOR_ID)).unwrap()
}

/// Backend whose session key can be made read-only.
#[derive(Default)]
struct SessionLockKv {
    inner: MemoryKvStore,
    session_locked: AtomicBool,
}

impl KvStore for SessionLockKv {
    fn get(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        self.inner.get(key)
    }

    fn apply(&self, writes: &[KvWrite]) -> StoreResult<()> {
        let touches_session = writes.iter().any(|write| write.key == SESSION_KEY);
        if touches_session && self.session_locked.load(Ordering::SeqCst) {
            return Err(StoreError::Poisoned);
        }
        self.inner.apply(writes)
    }
}

fn academic_tutor_request(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password: "clave".to_string(),
        first_name: "Luis".to_string(),
        last_name: "Rojas".to_string(),
        role: Role::AcademicTutor,
        career: None,
        company: None,
        phone: None,
    }
}

#[test]
fn services_refuse_users_with_the_wrong_role() {
    let portal = Portal::seeded();
    let err = CoordinatorService::new(portal.store.clone(), portal.user(STUDENT_ID))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        ServiceError::RoleMismatch {
            expected: Role::Coordinator,
            actual: Role::Student
        }
    ));
}

#[test]
fn created_users_keep_emails_unique_ignoring_case() {
    let portal = Portal::seeded();
    let coordinator = coordinator(&portal);

    let created = coordinator
        .create_user(academic_tutor_request("luis@uni.edu"))
        .unwrap();
    assert_eq!(portal.store.load::<User>().get(&created.id), Some(&created));

    let err = coordinator
        .create_user(academic_tutor_request("LUIS@uni.edu "))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Duplicate { field: "email", .. }));
    assert_eq!(portal.store.load::<User>().len(), 5);
}

#[test]
fn failed_session_refresh_keeps_the_stored_edit() {
    let kv = Arc::new(SessionLockKv::default());
    let store = Arc::new(RecordStore::new(kv.clone()));
    store.bootstrap(true).unwrap();
    let auth = AuthService::new(store.clone());
    auth.login("estudiante@test.com", "123456").unwrap();
    kv.session_locked.store(true, Ordering::SeqCst);

    let acting = store.load::<User>().get(COORDINATOR_ID).cloned().unwrap();
    let updated = CoordinatorService::new(store.clone(), acting)
        .unwrap()
        .update_user(
            STUDENT_ID,
            UserPatch {
                first_name: Some("Juan Carlos".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap();

    assert_eq!(store.load::<User>().get(STUDENT_ID), Some(&updated));
    let session = auth.current_user().unwrap();
    assert_eq!(session.id, STUDENT_ID);
    assert_ne!(session.first_name, "Juan Carlos");
}

#[test]
fn coordinator_needs_only_credentials_and_a_name() {
    let portal = Portal::seeded();
    let request = NewUser {
        last_name: String::new(),
        ..academic_tutor_request("sin.apellido@uni.edu")
    };

    let err = AuthService::new(portal.store.clone())
        .register(request.clone())
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let created = coordinator(&portal).create_user(request).unwrap();
    assert_eq!(created.last_name, "");

    let nameless = coordinator(&portal)
        .create_user(NewUser {
            first_name: " ".to_string(),
            ..academic_tutor_request("anonimo@uni.edu")
        })
        .unwrap_err();
    assert!(matches!(nameless, ServiceError::Validation(_)));
}

#[test]
fn updating_the_logged_in_user_refreshes_the_session() {
    let portal = Portal::seeded();
    let auth = AuthService::new(portal.store.clone());
    auth.login("estudiante@test.com", "123456").unwrap();

    let updated = coordinator(&portal)
        .update_user(
            STUDENT_ID,
            UserPatch {
                first_name: Some("Juan Carlos".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.first_name, "Juan Carlos");
    assert_eq!(auth.current_user(), Some(updated));
}

#[test]
fn update_rejects_blank_names_and_taken_emails() {
    let portal = Portal::seeded();
    let coordinator = coordinator(&portal);

    let blank = coordinator
        .update_user(
            STUDENT_ID,
            UserPatch {
                last_name: Some(" ".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(blank, ServiceError::Validation(_)));

    let taken = coordinator
        .update_user(
            STUDENT_ID,
            UserPatch {
                email: Some("coordinador@test.com".to_string()),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(taken, ServiceError::Duplicate { .. }));
    assert_eq!(portal.user(STUDENT_ID).last_name, "Pérez");
}

#[test]
fn delete_removes_only_the_target_user() {
    let portal = Portal::seeded();
    let (_, internship) = portal.open_internship();
    let coordinator = coordinator(&portal);

    let removed = coordinator.delete_user(STUDENT_ID).unwrap();
    assert_eq!(removed.role, Role::Student);

    let users = portal.store.load::<User>();
    assert_eq!(users.len(), 3);
    assert!(users.get(STUDENT_ID).is_none());
    assert!(portal
        .store
        .load::<practicas_core::model::internship::Internship>()
        .contains(&internship.id));

    assert!(matches!(
        coordinator.delete_user(STUDENT_ID),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        coordinator.delete_user(COORDINATOR_ID),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn academic_assignments_keep_one_active_record_per_student() {
    let portal = Portal::seeded();
    let coordinator = coordinator(&portal);
    let second = coordinator
        .create_user(academic_tutor_request("luis@uni.edu"))
        .unwrap();

    coordinator
        .assign_student_tutor(STUDENT_ID, TutorKind::Academic, Some(ACADEMIC_TUTOR_ID))
        .unwrap();
    let student = coordinator
        .assign_student_tutor(STUDENT_ID, TutorKind::Academic, Some(&second.id))
        .unwrap();
    assert_eq!(student.tutor_academico_id.as_deref(), Some(second.id.as_str()));

    let assignments = portal.store.load::<TutorAssignment>();
    let statuses: Vec<_> = assignments
        .iter()
        .map(|assignment| (assignment.tutor_academico_id.as_str(), assignment.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (ACADEMIC_TUTOR_ID, AssignmentStatus::Cancelled),
            (second.id.as_str(), AssignmentStatus::Active),
        ]
    );

    let cleared = coordinator
        .assign_student_tutor(STUDENT_ID, TutorKind::Academic, None)
        .unwrap();
    assert!(cleared.tutor_academico_id.is_none());
    assert!(portal
        .store
        .load::<TutorAssignment>()
        .iter()
        .all(|assignment| assignment.status == AssignmentStatus::Cancelled));
}

#[test]
fn tutor_assignment_checks_roles() {
    let portal = Portal::seeded();
    let coordinator = coordinator(&portal);

    let wrong_tutor = coordinator
        .assign_student_tutor(STUDENT_ID, TutorKind::Academic, Some(COMPANY_TUTOR_ID))
        .unwrap_err();
    assert!(matches!(wrong_tutor, ServiceError::RoleMismatch { .. }));

    let company = coordinator
        .assign_student_tutor(STUDENT_ID, TutorKind::Company, Some(COMPANY_TUTOR_ID))
        .unwrap();
    assert_eq!(company.tutor_empresarial_id.as_deref(), Some(COMPANY_TUTOR_ID));
    assert!(portal.store.load::<TutorAssignment>().is_empty());

    let (_, internship) = portal.open_internship();
    assert!(matches!(
        coordinator.assign_internship_tutor(&internship.id, COMPANY_TUTOR_ID),
        Err(ServiceError::RoleMismatch { .. })
    ));
}

#[test]
fn stats_and_workloads_reflect_current_tables() {
    let portal = Portal::seeded();
    let (_, internship) = portal.open_internship();
    let coordinator = coordinator(&portal);
    coordinator
        .assign_internship_tutor(&internship.id, ACADEMIC_TUTOR_ID)
        .unwrap();
    portal
        .student()
        .submit_report(NewReport {
            activities: "Revisión de código".to_string(),
            observations: String::new(),
            hours_worked: 6,
        })
        .unwrap();

    let stats = coordinator.stats();
    assert_eq!(stats.total_students, 1);
    assert_eq!(stats.students_with_internship, 1);
    assert_eq!(stats.active_postings, 1);
    assert_eq!(stats.total_reports, 1);
    assert_eq!(stats.total_companies, 1);
    assert_eq!(stats.participating_companies, 1);

    let workloads = coordinator.tutor_workloads();
    let academic = workloads
        .iter()
        .find(|load| load.tutor_id == ACADEMIC_TUTOR_ID)
        .unwrap();
    assert_eq!(academic.kind, TutorKind::Academic);
    assert_eq!(academic.active_internships, 1);
    let company = workloads
        .iter()
        .find(|load| load.tutor_id == COMPANY_TUTOR_ID)
        .unwrap();
    assert_eq!(company.active_postings, 1);

    assert_eq!(coordinator.dashboard().stats, stats);
}

#[test]
fn reports_need_an_internship_and_valid_hours() {
    let portal = Portal::seeded();
    let student = portal.student();
    let report = NewReport {
        activities: "Capacitación".to_string(),
        observations: String::new(),
        hours_worked: 4,
    };
    assert!(matches!(
        student.submit_report(report.clone()),
        Err(ServiceError::MissingActiveInternship { .. })
    ));

    let (_, internship) = portal.open_internship();
    let too_long = student
        .submit_report(NewReport {
            hours_worked: 13,
            ..report.clone()
        })
        .unwrap_err();
    assert!(matches!(too_long, ServiceError::Validation(_)));

    let stored = student.submit_report(report).unwrap();
    assert_eq!(stored.practica_id, internship.id);
    assert_eq!(portal.store.load::<Report>().len(), 1);
}

#[test]
fn one_evaluation_per_internship() {
    let portal = Portal::seeded();
    let (_, internship) = portal.open_internship();
    coordinator(&portal)
        .assign_internship_tutor(&internship.id, ACADEMIC_TUTOR_ID)
        .unwrap();
    let academic =
        AcademicTutorService::new(portal.store.clone(), portal.user(ACADEMIC_TUTOR_ID)).unwrap();
    let request = NewEvaluation {
        internship_id: internship.id.clone(),
        score: 4.5,
        comments: "Muy comprometido".to_string(),
        aspects: EvaluationAspects {
            punctuality: 5,
            responsibility: 5,
            initiative: 4,
            knowledge: 4,
            communication: 4,
        },
    };

    assert!(!academic.has_evaluation(&internship.id));
    let evaluation = academic.evaluate(request.clone()).unwrap();
    assert_eq!(evaluation.estudiante_id, STUDENT_ID);
    assert!(academic.has_evaluation(&internship.id));
    assert!(academic.dashboard().evaluation_for(&internship.id).is_some());

    let err = academic.evaluate(request).unwrap_err();
    assert!(matches!(err, ServiceError::Duplicate { entity: "evaluación", .. }));
}
