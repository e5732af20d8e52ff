//! Company tutor use-cases.
//!
//! # Responsibility
//! - Register companies and publish/close postings.
//! - Decide applications to own postings; accepting one opens the internship.
//! - Assign and grade tasks for supervised internships.
//!
//! # Invariants
//! - Only the tutor who published a posting decides its applications.
//! - Accepting writes the application and its new internship in one commit.
//! - A student has at most one internship in progress.

use crate::bus::ChangeKind;
use crate::model::application::{Application, Decision};
use crate::model::company::{Company, NewCompany};
use crate::model::internship::{Internship, InternshipStatus};
use crate::model::posting::{NewPosting, Posting, PostingStatus, DEFAULT_MODALITY};
use crate::model::task::{AssignerKind, NewTask, Task};
use crate::model::user::{Role, User};
use crate::model::validation::require;
use crate::service::view::{task_views, MountedView, TaskView};
use crate::service::{insert_row, require_role, task_ops, ServiceError, ServiceResult};
use crate::store::{ChangeSet, RecordStore, TableName};
use log::info;
use std::sync::Arc;

pub const COMPANY_TUTOR_DASHBOARD_TABLES: [TableName; 6] = [
    TableName::Users,
    TableName::Companies,
    TableName::Postings,
    TableName::Applications,
    TableName::Internships,
    TableName::Tasks,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyTutorDashboard {
    pub companies: Vec<Company>,
    /// Postings published by this tutor.
    pub postings: Vec<Posting>,
    /// Applications to this tutor's postings.
    pub applications: Vec<Application>,
    pub internships: Vec<Internship>,
    pub tasks: Vec<TaskView>,
    /// Every student account, for name lookups.
    pub students: Vec<User>,
}

impl CompanyTutorDashboard {
    pub fn load(store: &RecordStore, tutor_id: &str) -> Self {
        let users = store.load::<User>();
        let postings = store
            .load::<Posting>()
            .filter(|posting| posting.tutor_empresarial_id == tutor_id);
        let applications = store.load::<Application>().filter(|application| {
            postings
                .iter()
                .any(|posting| posting.id == application.oferta_id)
        });
        let tasks = store.load::<Task>().filter(|task| {
            task.assigned_by == tutor_id && task.assigner_kind == AssignerKind::CompanyTutor
        });

        Self {
            companies: store.load::<Company>().into_rows(),
            postings,
            applications,
            internships: store
                .load::<Internship>()
                .filter(|internship| internship.tutor_empresarial_id == tutor_id),
            tasks: task_views(tasks, store.now()),
            students: users.filter(|user| user.role == Role::Student),
        }
    }

    pub fn student(&self, student_id: &str) -> Option<&User> {
        self.students.iter().find(|student| student.id == student_id)
    }

    pub fn in_progress_count(&self) -> usize {
        self.internships
            .iter()
            .filter(|internship| internship.is_in_progress())
            .count()
    }
}

/// Result of deciding an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub application: Application,
    /// Internship opened by an acceptance.
    pub internship: Option<Internship>,
}

pub struct CompanyTutorService {
    store: Arc<RecordStore>,
    tutor: User,
}

impl CompanyTutorService {
    pub fn new(store: Arc<RecordStore>, tutor: User) -> ServiceResult<Self> {
        require_role(&tutor, Role::CompanyTutor)?;
        Ok(Self { store, tutor })
    }

    pub fn user(&self) -> &User {
        &self.tutor
    }

    pub fn dashboard(&self) -> CompanyTutorDashboard {
        CompanyTutorDashboard::load(&self.store, &self.tutor.id)
    }

    pub fn mount_dashboard(&self) -> MountedView<CompanyTutorDashboard> {
        let tutor_id = self.tutor.id.clone();
        MountedView::mount(&self.store, &COMPANY_TUTOR_DASHBOARD_TABLES, move |store| {
            CompanyTutorDashboard::load(store, &tutor_id)
        })
    }

    /// Registers a company; RUC values are unique.
    pub fn create_company(&self, request: NewCompany) -> ServiceResult<Company> {
        let company = request.into_company(self.store.next_id(), self.store.timestamp());
        company.validate()?;

        let mut companies = self.store.load::<Company>();
        if companies.iter().any(|existing| existing.ruc == company.ruc) {
            return Err(ServiceError::Duplicate {
                entity: "empresa",
                field: "ruc",
                value: company.ruc,
            });
        }
        let company = insert_row(&mut companies, company)?;

        let mut changes = ChangeSet::new();
        changes.stage(&companies, ChangeKind::Created, &company.id)?;
        self.store.commit(changes)?;

        info!(
            "event=company_create module=service status=ok company_id={}",
            company.id
        );
        Ok(company)
    }

    /// Publishes an active posting, freezing the company name into it.
    pub fn create_posting(&self, request: NewPosting) -> ServiceResult<Posting> {
        require("titulo", &request.title)?;
        require("descripcion", &request.description)?;
        require("empresaId", &request.company_id)?;

        let companies = self.store.load::<Company>();
        let company = companies
            .get(&request.company_id)
            .ok_or_else(|| ServiceError::NotFound {
                entity: "empresa",
                id: request.company_id.clone(),
            })?;

        let modality = request
            .modality
            .map(|modality| modality.trim().to_string())
            .filter(|modality| !modality.is_empty())
            .unwrap_or_else(|| DEFAULT_MODALITY.to_string());
        let posting = Posting {
            id: self.store.next_id(),
            title: request.title.trim().to_string(),
            company_name: company.name.clone(),
            description: request.description.trim().to_string(),
            requirements: request.requirements,
            duration: request.duration,
            modality,
            start_date: request.start_date,
            end_date: request.end_date,
            status: PostingStatus::Active,
            tutor_empresarial_id: self.tutor.id.clone(),
        };
        posting.validate()?;

        let mut postings = self.store.load::<Posting>();
        let posting = insert_row(&mut postings, posting)?;
        let mut changes = ChangeSet::new();
        changes.stage(&postings, ChangeKind::Created, &posting.id)?;
        self.store.commit(changes)?;

        info!(
            "event=posting_create module=service status=ok posting_id={} company_id={}",
            posting.id, company.id
        );
        Ok(posting)
    }

    /// Stops accepting applications for one of this tutor's postings.
    pub fn close_posting(&self, posting_id: &str) -> ServiceResult<Posting> {
        let mut postings = self.store.load::<Posting>();
        let posting = postings
            .get_mut(posting_id)
            .ok_or_else(|| ServiceError::NotFound {
                entity: "oferta",
                id: posting_id.to_string(),
            })?;
        if posting.tutor_empresarial_id != self.tutor.id {
            return Err(ServiceError::NotOwner {
                entity: "oferta",
                id: posting_id.to_string(),
            });
        }
        if !posting.is_active() {
            return Err(ServiceError::InvalidTransition {
                entity: "oferta",
                from: "cerrada",
                to: "cerrada",
            });
        }
        posting.status = PostingStatus::Closed;
        let closed = posting.clone();

        let mut changes = ChangeSet::new();
        changes.stage(&postings, ChangeKind::Updated, posting_id)?;
        self.store.commit(changes)?;

        info!(
            "event=posting_close module=service status=ok posting_id={}",
            posting_id
        );
        Ok(closed)
    }

    /// Accepts or rejects a pending application to one of this tutor's
    /// postings. Accepting opens an in-progress internship with the posting
    /// dates and the student's default academic tutor.
    pub fn decide_application(
        &self,
        application_id: &str,
        decision: Decision,
    ) -> ServiceResult<DecisionOutcome> {
        let mut applications = self.store.load::<Application>();
        let application = applications
            .get(application_id)
            .ok_or_else(|| ServiceError::NotFound {
                entity: "postulación",
                id: application_id.to_string(),
            })?
            .clone();

        let postings = self.store.load::<Posting>();
        let posting = postings
            .get(&application.oferta_id)
            .ok_or_else(|| ServiceError::NotFound {
                entity: "oferta",
                id: application.oferta_id.clone(),
            })?;
        if posting.tutor_empresarial_id != self.tutor.id {
            return Err(ServiceError::NotOwner {
                entity: "postulación",
                id: application_id.to_string(),
            });
        }
        let target = decision.target_status();
        if application.status.is_terminal() {
            return Err(ServiceError::InvalidTransition {
                entity: "postulación",
                from: application.status.as_str(),
                to: target.as_str(),
            });
        }

        let mut opened_table = None;
        if decision == Decision::Accept {
            let mut internships = self.store.load::<Internship>();
            let busy = internships.iter().any(|existing| {
                existing.estudiante_id == application.estudiante_id && existing.is_in_progress()
            });
            if busy {
                return Err(ServiceError::Conflict(
                    "El estudiante ya tiene una práctica en curso".to_string(),
                ));
            }

            let default_academic_tutor = self
                .store
                .load::<User>()
                .get(&application.estudiante_id)
                .and_then(|student| student.tutor_academico_id.clone());
            let opened = Internship {
                id: self.store.next_id(),
                estudiante_id: application.estudiante_id.clone(),
                oferta_id: posting.id.clone(),
                start_date: posting.start_date.clone(),
                end_date: posting.end_date.clone(),
                status: InternshipStatus::InProgress,
                tutor_empresarial_id: self.tutor.id.clone(),
                tutor_academico_id: default_academic_tutor,
            };
            let opened = insert_row(&mut internships, opened)?;
            opened_table = Some((internships, opened));
        }

        let decided = match applications.get_mut(application_id) {
            Some(stored) => {
                stored.status = target;
                stored.clone()
            }
            None => {
                return Err(ServiceError::NotFound {
                    entity: "postulación",
                    id: application_id.to_string(),
                })
            }
        };

        let mut changes = ChangeSet::new();
        changes.stage(&applications, ChangeKind::Updated, application_id)?;
        let internship = match opened_table {
            Some((internships, opened)) => {
                changes.stage(&internships, ChangeKind::Created, &opened.id)?;
                Some(opened)
            }
            None => None,
        };
        self.store.commit(changes)?;

        info!(
            "event=application_decide module=service status=ok application_id={} decision={} internship_id={}",
            application_id,
            target.as_str(),
            internship.as_ref().map_or("-", |opened: &Internship| opened.id.as_str())
        );
        Ok(DecisionOutcome {
            application: decided,
            internship,
        })
    }

    pub fn assign_task(&self, request: NewTask) -> ServiceResult<Task> {
        task_ops::assign_task(&self.store, &self.tutor, AssignerKind::CompanyTutor, request)
    }

    pub fn grade_task(
        &self,
        task_id: &str,
        grade: u8,
        comments: Option<&str>,
    ) -> ServiceResult<Task> {
        task_ops::grade_task(&self.store, &self.tutor, task_id, grade, comments)
    }
}
