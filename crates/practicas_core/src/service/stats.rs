//! Coordinator statistics, recomputed from the tables on every call.

use crate::model::company::Company;
use crate::model::internship::{Internship, InternshipStatus};
use crate::model::posting::Posting;
use crate::model::report::Report;
use crate::model::task::{Task, TaskStatus};
use crate::model::user::{Role, User};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortalStats {
    pub total_students: usize,
    /// Students with an internship in progress.
    pub students_with_internship: usize,
    pub completed_internships: usize,
    pub active_postings: usize,
    pub total_reports: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Unfinished tasks past their due date.
    pub overdue_tasks: usize,
    pub total_companies: usize,
    /// Distinct company names among active postings.
    pub participating_companies: usize,
}

/// Borrowed view over the tables the statistics read.
pub(crate) struct StatsInput<'a> {
    pub users: &'a [User],
    pub internships: &'a [Internship],
    pub postings: &'a [Posting],
    pub reports: &'a [Report],
    pub tasks: &'a [Task],
    pub companies: &'a [Company],
}

impl PortalStats {
    pub(crate) fn compute(input: StatsInput<'_>, now: DateTime<Utc>) -> Self {
        let students_with_internship: HashSet<&str> = input
            .internships
            .iter()
            .filter(|internship| internship.is_in_progress())
            .map(|internship| internship.estudiante_id.as_str())
            .collect();
        let participating: HashSet<&str> = input
            .postings
            .iter()
            .filter(|posting| posting.is_active())
            .map(|posting| posting.company_name.as_str())
            .collect();

        Self {
            total_students: input
                .users
                .iter()
                .filter(|user| user.role == Role::Student)
                .count(),
            students_with_internship: students_with_internship.len(),
            completed_internships: input
                .internships
                .iter()
                .filter(|internship| internship.status == InternshipStatus::Completed)
                .count(),
            active_postings: input
                .postings
                .iter()
                .filter(|posting| posting.is_active())
                .count(),
            total_reports: input.reports.len(),
            total_tasks: input.tasks.len(),
            completed_tasks: input
                .tasks
                .iter()
                .filter(|task| task.status == TaskStatus::Completed)
                .count(),
            overdue_tasks: input
                .tasks
                .iter()
                .filter(|task| task.display_status(now) == TaskStatus::Overdue)
                .count(),
            total_companies: input.companies.len(),
            participating_companies: participating.len(),
        }
    }
}

pub fn collect_stats(store: &RecordStore) -> PortalStats {
    let users = store.load::<User>();
    let internships = store.load::<Internship>();
    let postings = store.load::<Posting>();
    let reports = store.load::<Report>();
    let tasks = store.load::<Task>();
    let companies = store.load::<Company>();
    PortalStats::compute(
        StatsInput {
            users: users.rows(),
            internships: internships.rows(),
            postings: postings.rows(),
            reports: reports.rows(),
            tasks: tasks.rows(),
            companies: companies.rows(),
        },
        store.now(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TutorKind {
    Academic,
    Company,
}

impl TutorKind {
    pub fn role(self) -> Role {
        match self {
            Self::Academic => Role::AcademicTutor,
            Self::Company => Role::CompanyTutor,
        }
    }
}

/// Load carried by one tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorWorkload {
    pub tutor_id: String,
    pub name: String,
    pub kind: TutorKind,
    pub active_internships: usize,
    /// Active postings published; always `0` for academic tutors.
    pub active_postings: usize,
}

pub(crate) fn workloads(
    users: &[User],
    internships: &[Internship],
    postings: &[Posting],
) -> Vec<TutorWorkload> {
    users
        .iter()
        .filter_map(|user| {
            let kind = match user.role {
                Role::CompanyTutor => TutorKind::Company,
                Role::AcademicTutor => TutorKind::Academic,
                Role::Student | Role::Coordinator => return None,
            };
            let supervises = |internship: &Internship| match kind {
                TutorKind::Company => internship.tutor_empresarial_id == user.id,
                TutorKind::Academic => {
                    internship.tutor_academico_id.as_deref() == Some(user.id.as_str())
                }
            };
            Some(TutorWorkload {
                tutor_id: user.id.clone(),
                name: user.full_name(),
                kind,
                active_internships: internships
                    .iter()
                    .filter(|internship| internship.is_in_progress() && supervises(internship))
                    .count(),
                active_postings: postings
                    .iter()
                    .filter(|posting| {
                        kind == TutorKind::Company
                            && posting.is_active()
                            && posting.tutor_empresarial_id == user.id
                    })
                    .count(),
            })
        })
        .collect()
}
