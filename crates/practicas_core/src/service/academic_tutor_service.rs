//! Academic tutor use-cases.
//!
//! # Invariants
//! - Ownership is decided by the internship-level `tutorAcademicoId`.
//! - An internship has at most one evaluation.

use crate::bus::ChangeKind;
use crate::clock::parse_instant;
use crate::model::evaluation::{Evaluation, NewEvaluation};
use crate::model::internship::Internship;
use crate::model::report::Report;
use crate::model::task::{AssignerKind, NewTask, Task};
use crate::model::user::{Role, User};
use crate::service::view::{task_views, MountedView, TaskView};
use crate::service::{insert_row, require_role, task_ops, ServiceError, ServiceResult};
use crate::store::{ChangeSet, RecordStore, TableName};
use log::info;
use std::cmp::Reverse;
use std::sync::Arc;

pub const ACADEMIC_TUTOR_DASHBOARD_TABLES: [TableName; 5] = [
    TableName::Users,
    TableName::Internships,
    TableName::Reports,
    TableName::Evaluations,
    TableName::Tasks,
];

#[derive(Debug, Clone, PartialEq)]
pub struct AcademicTutorDashboard {
    pub internships: Vec<Internship>,
    /// Reports of supervised students, newest first.
    pub reports: Vec<Report>,
    pub evaluations: Vec<Evaluation>,
    pub tasks: Vec<TaskView>,
    pub students: Vec<User>,
}

impl AcademicTutorDashboard {
    pub fn load(store: &RecordStore, tutor_id: &str) -> Self {
        let internships = store.load::<Internship>().filter(|internship| {
            internship.tutor_academico_id.as_deref() == Some(tutor_id)
        });
        let supervises =
            |student_id: &str| internships.iter().any(|i| i.estudiante_id == student_id);

        let mut reports = store
            .load::<Report>()
            .filter(|report| supervises(&report.estudiante_id));
        reports.sort_by_key(|report| Reverse(parse_instant(&report.created_at)));

        let tasks = store.load::<Task>().filter(|task| {
            task.assigned_by == tutor_id && task.assigner_kind == AssignerKind::AcademicTutor
        });

        Self {
            reports,
            evaluations: store
                .load::<Evaluation>()
                .filter(|evaluation| evaluation.tutor_academico_id == tutor_id),
            tasks: task_views(tasks, store.now()),
            students: store
                .load::<User>()
                .filter(|user| user.role == Role::Student && supervises(&user.id)),
            internships,
        }
    }

    pub fn evaluation_for(&self, internship_id: &str) -> Option<&Evaluation> {
        self.evaluations
            .iter()
            .find(|evaluation| evaluation.practica_id == internship_id)
    }

    pub fn reports_of(&self, student_id: &str) -> Vec<&Report> {
        self.reports
            .iter()
            .filter(|report| report.estudiante_id == student_id)
            .collect()
    }
}

pub struct AcademicTutorService {
    store: Arc<RecordStore>,
    tutor: User,
}

impl AcademicTutorService {
    pub fn new(store: Arc<RecordStore>, tutor: User) -> ServiceResult<Self> {
        require_role(&tutor, Role::AcademicTutor)?;
        Ok(Self { store, tutor })
    }

    pub fn user(&self) -> &User {
        &self.tutor
    }

    pub fn dashboard(&self) -> AcademicTutorDashboard {
        AcademicTutorDashboard::load(&self.store, &self.tutor.id)
    }

    pub fn mount_dashboard(&self) -> MountedView<AcademicTutorDashboard> {
        let tutor_id = self.tutor.id.clone();
        MountedView::mount(&self.store, &ACADEMIC_TUTOR_DASHBOARD_TABLES, move |store| {
            AcademicTutorDashboard::load(store, &tutor_id)
        })
    }

    pub fn assign_task(&self, request: NewTask) -> ServiceResult<Task> {
        task_ops::assign_task(&self.store, &self.tutor, AssignerKind::AcademicTutor, request)
    }

    pub fn grade_task(
        &self,
        task_id: &str,
        grade: u8,
        comments: Option<&str>,
    ) -> ServiceResult<Task> {
        task_ops::grade_task(&self.store, &self.tutor, task_id, grade, comments)
    }

    pub fn has_evaluation(&self, internship_id: &str) -> bool {
        self.store
            .load::<Evaluation>()
            .iter()
            .any(|evaluation| evaluation.practica_id == internship_id)
    }

    /// Records the single evaluation of a supervised internship.
    pub fn evaluate(&self, request: NewEvaluation) -> ServiceResult<Evaluation> {
        request.validate()?;

        let internships = self.store.load::<Internship>();
        let internship =
            internships
                .get(&request.internship_id)
                .ok_or_else(|| ServiceError::NotFound {
                    entity: "práctica",
                    id: request.internship_id.clone(),
                })?;
        if internship.tutor_academico_id.as_deref() != Some(self.tutor.id.as_str()) {
            return Err(ServiceError::NotOwner {
                entity: "práctica",
                id: internship.id.clone(),
            });
        }

        let mut evaluations = self.store.load::<Evaluation>();
        if evaluations
            .iter()
            .any(|evaluation| evaluation.practica_id == internship.id)
        {
            return Err(ServiceError::Duplicate {
                entity: "evaluación",
                field: "practicaId",
                value: internship.id.clone(),
            });
        }

        let evaluation = Evaluation {
            id: self.store.next_id(),
            practica_id: internship.id.clone(),
            estudiante_id: internship.estudiante_id.clone(),
            tutor_academico_id: self.tutor.id.clone(),
            created_at: self.store.timestamp(),
            score: request.score,
            comments: request.comments.trim().to_string(),
            aspects: request.aspects,
        };
        let evaluation = insert_row(&mut evaluations, evaluation)?;

        let mut changes = ChangeSet::new();
        changes.stage(&evaluations, ChangeKind::Created, &evaluation.id)?;
        self.store.commit(changes)?;

        info!(
            "event=evaluation_create module=service status=ok evaluation_id={} practica_id={} score={}",
            evaluation.id, evaluation.practica_id, evaluation.score
        );
        Ok(evaluation)
    }
}
