//! Student use-cases.
//!
//! # Responsibility
//! - Apply to postings, file activity reports and deliver tasks.
//! - Project the student dashboard.
//!
//! # Invariants
//! - A student applies at most once to the same posting.
//! - Reports require an internship in progress; `practicaId` points to it.
//! - Delivering a task is the only student-side task transition
//!   (`pendiente | en_progreso -> completada`).

use crate::bus::ChangeKind;
use crate::model::application::{Application, ApplicationStatus};
use crate::model::internship::Internship;
use crate::model::posting::Posting;
use crate::model::report::{NewReport, Report};
use crate::model::task::{Task, TaskStatus};
use crate::model::user::{Role, User};
use crate::model::validation::require;
use crate::service::view::{task_views, MountedView, TaskView};
use crate::service::{insert_row, require_role, ServiceError, ServiceResult};
use crate::store::{ChangeSet, RecordStore, TableName};
use log::info;
use std::sync::Arc;

pub const STUDENT_DASHBOARD_TABLES: [TableName; 5] = [
    TableName::Postings,
    TableName::Applications,
    TableName::Internships,
    TableName::Reports,
    TableName::Tasks,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDashboard {
    pub active_postings: Vec<Posting>,
    pub applications: Vec<Application>,
    /// In-progress internship, if any.
    pub internship: Option<Internship>,
    pub reports: Vec<Report>,
    pub tasks: Vec<TaskView>,
}

impl StudentDashboard {
    pub fn load(store: &RecordStore, student_id: &str) -> Self {
        let postings = store.load::<Posting>();
        let applications = store.load::<Application>();
        let internships = store.load::<Internship>();
        let reports = store.load::<Report>();
        let tasks = store.load::<Task>();

        Self {
            active_postings: postings.filter(Posting::is_active),
            applications: applications.filter(|app| app.estudiante_id == student_id),
            internship: internships
                .find(|internship| {
                    internship.estudiante_id == student_id && internship.is_in_progress()
                })
                .cloned(),
            reports: reports.filter(|report| report.estudiante_id == student_id),
            tasks: task_views(
                tasks.filter(|task| task.estudiante_id == student_id),
                store.now(),
            ),
        }
    }

    pub fn pending_task_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|view| view.task.status == TaskStatus::Pending)
            .count()
    }

    /// Whether the student already applied to `posting_id`.
    pub fn has_applied(&self, posting_id: &str) -> bool {
        self.applications
            .iter()
            .any(|application| application.oferta_id == posting_id)
    }
}

pub struct StudentService {
    store: Arc<RecordStore>,
    student: User,
}

impl StudentService {
    pub fn new(store: Arc<RecordStore>, student: User) -> ServiceResult<Self> {
        require_role(&student, Role::Student)?;
        Ok(Self { store, student })
    }

    pub fn user(&self) -> &User {
        &self.student
    }

    pub fn dashboard(&self) -> StudentDashboard {
        StudentDashboard::load(&self.store, &self.student.id)
    }

    pub fn mount_dashboard(&self) -> MountedView<StudentDashboard> {
        let student_id = self.student.id.clone();
        MountedView::mount(&self.store, &STUDENT_DASHBOARD_TABLES, move |store| {
            StudentDashboard::load(store, &student_id)
        })
    }

    /// Creates a pending application to an active posting.
    pub fn apply(&self, posting_id: &str, cover_letter: &str) -> ServiceResult<Application> {
        require("cartaPresentacion", cover_letter)?;

        let postings = self.store.load::<Posting>();
        let posting = postings.get(posting_id).ok_or_else(|| ServiceError::NotFound {
            entity: "oferta",
            id: posting_id.to_string(),
        })?;
        if !posting.is_active() {
            return Err(ServiceError::Conflict(
                "La oferta ya no acepta postulaciones".to_string(),
            ));
        }

        let mut applications = self.store.load::<Application>();
        let already_applied = applications.iter().any(|application| {
            application.estudiante_id == self.student.id && application.oferta_id == posting_id
        });
        if already_applied {
            return Err(ServiceError::Duplicate {
                entity: "postulación",
                field: "ofertaId",
                value: posting_id.to_string(),
            });
        }

        let application = Application {
            id: self.store.next_id(),
            estudiante_id: self.student.id.clone(),
            oferta_id: posting.id.clone(),
            applied_at: self.store.timestamp(),
            status: ApplicationStatus::Pending,
            cover_letter: cover_letter.trim().to_string(),
        };
        let application = insert_row(&mut applications, application)?;

        let mut changes = ChangeSet::new();
        changes.stage(&applications, ChangeKind::Created, &application.id)?;
        self.store.commit(changes)?;

        info!(
            "event=application_create module=service status=ok application_id={} oferta_id={}",
            application.id, application.oferta_id
        );
        Ok(application)
    }

    /// Files an activity report against the in-progress internship.
    pub fn submit_report(&self, request: NewReport) -> ServiceResult<Report> {
        request.validate()?;

        let internships = self.store.load::<Internship>();
        let internship = internships
            .find(|internship| {
                internship.estudiante_id == self.student.id && internship.is_in_progress()
            })
            .ok_or_else(|| ServiceError::MissingActiveInternship {
                student_id: self.student.id.clone(),
            })?;

        let report = Report {
            id: self.store.next_id(),
            practica_id: internship.id.clone(),
            estudiante_id: self.student.id.clone(),
            created_at: self.store.timestamp(),
            activities: request.activities.trim().to_string(),
            observations: request.observations.trim().to_string(),
            hours_worked: request.hours_worked,
        };

        let mut reports = self.store.load::<Report>();
        let report = insert_row(&mut reports, report)?;
        let mut changes = ChangeSet::new();
        changes.stage(&reports, ChangeKind::Created, &report.id)?;
        self.store.commit(changes)?;

        info!(
            "event=report_create module=service status=ok report_id={} practica_id={} hours={}",
            report.id, report.practica_id, report.hours_worked
        );
        Ok(report)
    }

    /// Marks one of the student's tasks as delivered.
    pub fn deliver_task(&self, task_id: &str, delivery: &str) -> ServiceResult<Task> {
        require("entregaEstudiante", delivery)?;

        let mut tasks = self.store.load::<Task>();
        let task = tasks.get_mut(task_id).ok_or_else(|| ServiceError::NotFound {
            entity: "tarea",
            id: task_id.to_string(),
        })?;
        if task.estudiante_id != self.student.id {
            return Err(ServiceError::NotOwner {
                entity: "tarea",
                id: task_id.to_string(),
            });
        }
        if !matches!(task.status, TaskStatus::Pending | TaskStatus::InProgress) {
            return Err(ServiceError::InvalidTransition {
                entity: "tarea",
                from: task.status.as_str(),
                to: TaskStatus::Completed.as_str(),
            });
        }

        task.status = TaskStatus::Completed;
        task.delivery = Some(delivery.to_string());
        task.delivered_at = Some(self.store.timestamp());
        let delivered = task.clone();

        let mut changes = ChangeSet::new();
        changes.stage(&tasks, ChangeKind::Updated, task_id)?;
        self.store.commit(changes)?;

        info!(
            "event=task_deliver module=service status=ok task_id={}",
            delivered.id
        );
        Ok(delivered)
    }
}
