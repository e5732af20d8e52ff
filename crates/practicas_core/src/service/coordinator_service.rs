//! Academic coordinator use-cases.
//!
//! # Responsibility
//! - Manage accounts (create, edit, delete).
//! - Assign tutors to internships and default tutors to students.
//! - Report portal-wide statistics and tutor workloads.
//!
//! # Invariants
//! - Deleting a user removes that user only; records that reference it stay.
//! - A student has at most one `activa` record in `asignacionesTutores`.

use crate::bus::ChangeKind;
use crate::model::company::Company;
use crate::model::internship::Internship;
use crate::model::posting::Posting;
use crate::model::report::Report;
use crate::model::task::Task;
use crate::model::tutor_assignment::{AssignmentStatus, TutorAssignment};
use crate::model::user::{NewUser, Role, User, UserPatch};
use crate::service::auth_service::{create_user, ensure_email_available};
use crate::service::stats::{collect_stats, workloads, PortalStats, StatsInput, TutorKind, TutorWorkload};
use crate::service::view::{task_views, MountedView, TaskView};
use crate::service::{insert_row, require_role, ServiceError, ServiceResult};
use crate::store::{ChangeSet, RecordStore, Table, TableName};
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorDashboard {
    pub users: Vec<User>,
    pub internships: Vec<Internship>,
    pub postings: Vec<Posting>,
    pub reports: Vec<Report>,
    pub tasks: Vec<TaskView>,
    pub companies: Vec<Company>,
    pub assignments: Vec<TutorAssignment>,
    pub stats: PortalStats,
    pub workloads: Vec<TutorWorkload>,
}

impl CoordinatorDashboard {
    pub fn load(store: &RecordStore) -> Self {
        let users = store.load::<User>();
        let internships = store.load::<Internship>();
        let postings = store.load::<Posting>();
        let reports = store.load::<Report>();
        let tasks = store.load::<Task>();
        let companies = store.load::<Company>();
        let now = store.now();

        let stats = PortalStats::compute(
            StatsInput {
                users: users.rows(),
                internships: internships.rows(),
                postings: postings.rows(),
                reports: reports.rows(),
                tasks: tasks.rows(),
                companies: companies.rows(),
            },
            now,
        );
        let workloads = workloads(users.rows(), internships.rows(), postings.rows());

        Self {
            users: users.into_rows(),
            internships: internships.into_rows(),
            postings: postings.into_rows(),
            reports: reports.into_rows(),
            tasks: task_views(tasks.into_rows(), now),
            companies: companies.into_rows(),
            assignments: store.load::<TutorAssignment>().into_rows(),
            stats,
            workloads,
        }
    }

    pub fn users_with_role(&self, role: Role) -> Vec<&User> {
        self.users.iter().filter(|user| user.role == role).collect()
    }
}

pub struct CoordinatorService {
    store: Arc<RecordStore>,
    coordinator: User,
}

impl CoordinatorService {
    pub fn new(store: Arc<RecordStore>, coordinator: User) -> ServiceResult<Self> {
        require_role(&coordinator, Role::Coordinator)?;
        Ok(Self { store, coordinator })
    }

    pub fn user(&self) -> &User {
        &self.coordinator
    }

    pub fn dashboard(&self) -> CoordinatorDashboard {
        CoordinatorDashboard::load(&self.store)
    }

    pub fn mount_dashboard(&self) -> MountedView<CoordinatorDashboard> {
        MountedView::mount(&self.store, &TableName::ALL, CoordinatorDashboard::load)
    }

    /// Creates an account on someone's behalf. Only e-mail, password and
    /// nombre are required here; self-registration asks for more.
    pub fn create_user(&self, request: NewUser) -> ServiceResult<User> {
        create_user(&self.store, request, User::validate_credentials)
    }

    /// Applies `patch` to an account. Editing the logged-in account also
    /// refreshes the stored session.
    pub fn update_user(&self, user_id: &str, patch: UserPatch) -> ServiceResult<User> {
        let mut users = self.store.load::<User>();
        let mut updated = users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                entity: "usuario",
                id: user_id.to_string(),
            })?;
        patch.apply_to(&mut updated);
        updated.validate()?;
        ensure_email_available(&users, &updated.email, Some(user_id))?;

        if let Some(stored) = users.get_mut(user_id) {
            *stored = updated.clone();
        }
        let mut changes = ChangeSet::new();
        changes.stage(&users, ChangeKind::Updated, user_id)?;
        self.store.commit(changes)?;

        if self
            .store
            .session_user()
            .is_some_and(|session| session.id == user_id)
        {
            // The edit is already stored; a stale session only shows old data.
            if let Err(err) = self.store.set_session_user(&updated) {
                warn!(
                    "event=session_refresh module=service status=error user_id={user_id} error={err}"
                );
            }
        }

        info!(
            "event=user_update module=service status=ok user_id={} role={}",
            user_id,
            updated.role.as_str()
        );
        Ok(updated)
    }

    /// Hard-deletes one account. The acting coordinator cannot delete itself.
    pub fn delete_user(&self, user_id: &str) -> ServiceResult<User> {
        if user_id == self.coordinator.id {
            return Err(ServiceError::Conflict(
                "No puedes eliminar tu propia cuenta".to_string(),
            ));
        }

        let mut users = self.store.load::<User>();
        let removed = users.remove(user_id).ok_or_else(|| ServiceError::NotFound {
            entity: "usuario",
            id: user_id.to_string(),
        })?;
        let mut changes = ChangeSet::new();
        changes.stage(&users, ChangeKind::Deleted, user_id)?;
        self.store.commit(changes)?;

        info!(
            "event=user_delete module=service status=ok user_id={} role={}",
            user_id,
            removed.role.as_str()
        );
        Ok(removed)
    }

    /// Sets the academic tutor of one internship.
    pub fn assign_internship_tutor(
        &self,
        internship_id: &str,
        tutor_id: &str,
    ) -> ServiceResult<Internship> {
        let users = self.store.load::<User>();
        require_user_with_role(&users, tutor_id, Role::AcademicTutor)?;

        let mut internships = self.store.load::<Internship>();
        let internship = internships
            .get_mut(internship_id)
            .ok_or_else(|| ServiceError::NotFound {
                entity: "práctica",
                id: internship_id.to_string(),
            })?;
        internship.tutor_academico_id = Some(tutor_id.to_string());
        let assigned = internship.clone();

        let mut changes = ChangeSet::new();
        changes.stage(&internships, ChangeKind::Updated, internship_id)?;
        self.store.commit(changes)?;

        info!(
            "event=internship_tutor_assign module=service status=ok practica_id={} tutor_id={}",
            internship_id, tutor_id
        );
        Ok(assigned)
    }

    /// Sets or clears (`None`) a student's default tutor of `kind`.
    ///
    /// Academic changes are also recorded in `asignacionesTutores`: the
    /// previous active record is cancelled and a new one opened.
    pub fn assign_student_tutor(
        &self,
        student_id: &str,
        kind: TutorKind,
        tutor_id: Option<&str>,
    ) -> ServiceResult<User> {
        let mut users = self.store.load::<User>();
        require_user_with_role(&users, student_id, Role::Student)?;
        if let Some(tutor_id) = tutor_id {
            require_user_with_role(&users, tutor_id, kind.role())?;
        }

        let Some(student) = users.get_mut(student_id) else {
            return Err(ServiceError::NotFound {
                entity: "usuario",
                id: student_id.to_string(),
            });
        };
        let previous = match kind {
            TutorKind::Academic => student.tutor_academico_id.clone(),
            TutorKind::Company => student.tutor_empresarial_id.clone(),
        };
        let next = tutor_id.map(str::to_string);
        match kind {
            TutorKind::Academic => student.tutor_academico_id = next.clone(),
            TutorKind::Company => student.tutor_empresarial_id = next.clone(),
        }
        let updated = student.clone();

        let mut changes = ChangeSet::new();
        changes.stage(&users, ChangeKind::Updated, student_id)?;
        if kind == TutorKind::Academic && previous != next {
            self.record_academic_assignment(&mut changes, student_id, next)?;
        }
        self.store.commit(changes)?;

        info!(
            "event=student_tutor_assign module=service status=ok student_id={} kind={:?} assigned={}",
            student_id,
            kind,
            tutor_id.is_some()
        );
        Ok(updated)
    }

    fn record_academic_assignment(
        &self,
        changes: &mut ChangeSet,
        student_id: &str,
        tutor_id: Option<String>,
    ) -> ServiceResult<()> {
        let mut assignments = self.store.load::<TutorAssignment>();
        let mut cancelled = Vec::new();
        for assignment in assignments.iter_mut() {
            if assignment.estudiante_id == student_id
                && assignment.status == AssignmentStatus::Active
            {
                assignment.status = AssignmentStatus::Cancelled;
                cancelled.push(assignment.id.clone());
            }
        }
        for id in &cancelled {
            changes.stage(&assignments, ChangeKind::Updated, id)?;
        }

        if let Some(tutor_id) = tutor_id {
            let assignment = TutorAssignment {
                id: self.store.next_id(),
                tutor_academico_id: tutor_id,
                estudiante_id: student_id.to_string(),
                assigned_at: self.store.timestamp(),
                status: AssignmentStatus::Active,
            };
            let assignment = insert_row(&mut assignments, assignment)?;
            changes.stage(&assignments, ChangeKind::Created, &assignment.id)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> PortalStats {
        collect_stats(&self.store)
    }

    pub fn tutor_workloads(&self) -> Vec<TutorWorkload> {
        let users = self.store.load::<User>();
        let internships = self.store.load::<Internship>();
        let postings = self.store.load::<Posting>();
        workloads(users.rows(), internships.rows(), postings.rows())
    }
}

fn require_user_with_role(users: &Table<User>, user_id: &str, role: Role) -> ServiceResult<()> {
    let user = users.get(user_id).ok_or_else(|| ServiceError::NotFound {
        entity: "usuario",
        id: user_id.to_string(),
    })?;
    if user.role != role {
        return Err(ServiceError::RoleMismatch {
            expected: role,
            actual: user.role,
        });
    }
    Ok(())
}
