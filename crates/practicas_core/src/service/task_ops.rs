//! Task assignment and grading shared by both tutor services.

use crate::bus::ChangeKind;
use crate::model::internship::Internship;
use crate::model::task::{validate_grade, AssignerKind, NewTask, Task, TaskStatus};
use crate::model::user::User;
use crate::service::{insert_row, ServiceError, ServiceResult};
use crate::store::{ChangeSet, RecordStore};
use log::info;

/// Creates a pending task for a student whose in-progress internship is
/// supervised by `tutor` in the capacity given by `kind`.
pub(crate) fn assign_task(
    store: &RecordStore,
    tutor: &User,
    kind: AssignerKind,
    request: NewTask,
) -> ServiceResult<Task> {
    request.validate()?;

    let internships = store.load::<Internship>();
    let internship = internships
        .find(|internship| {
            internship.estudiante_id == request.student_id && internship.is_in_progress()
        })
        .ok_or_else(|| ServiceError::MissingActiveInternship {
            student_id: request.student_id.clone(),
        })?;
    let supervises = match kind {
        AssignerKind::CompanyTutor => internship.tutor_empresarial_id == tutor.id,
        AssignerKind::AcademicTutor => {
            internship.tutor_academico_id.as_deref() == Some(tutor.id.as_str())
        }
    };
    if !supervises {
        return Err(ServiceError::NotOwner {
            entity: "práctica",
            id: internship.id.clone(),
        });
    }

    let task = Task {
        id: store.next_id(),
        title: request.title.trim().to_string(),
        description: request.description.trim().to_string(),
        created_at: store.timestamp(),
        due_date: request.due_date.trim().to_string(),
        status: TaskStatus::Pending,
        assigned_by: tutor.id.clone(),
        estudiante_id: request.student_id,
        practica_id: internship.id.clone(),
        assigner_kind: kind,
        delivery: None,
        delivered_at: None,
        grade: None,
        tutor_comments: None,
    };

    let mut tasks = store.load::<Task>();
    let task = insert_row(&mut tasks, task)?;
    let mut changes = ChangeSet::new();
    changes.stage(&tasks, ChangeKind::Created, &task.id)?;
    store.commit(changes)?;

    info!(
        "event=task_assign module=service status=ok task_id={} practica_id={} assigner={}",
        task.id, task.practica_id, tutor.id
    );
    Ok(task)
}

/// Attaches a grade and optional comments to a delivered task created by
/// `tutor`. The stored status does not change; grading again overwrites.
pub(crate) fn grade_task(
    store: &RecordStore,
    tutor: &User,
    task_id: &str,
    grade: u8,
    comments: Option<&str>,
) -> ServiceResult<Task> {
    validate_grade(grade)?;

    let mut tasks = store.load::<Task>();
    let task = tasks.get_mut(task_id).ok_or_else(|| ServiceError::NotFound {
        entity: "tarea",
        id: task_id.to_string(),
    })?;
    if task.assigned_by != tutor.id {
        return Err(ServiceError::NotOwner {
            entity: "tarea",
            id: task_id.to_string(),
        });
    }
    if !task.is_delivered() {
        return Err(ServiceError::InvalidTransition {
            entity: "tarea",
            from: task.status.as_str(),
            to: "calificada",
        });
    }

    task.grade = Some(grade);
    task.tutor_comments = comments
        .map(str::trim)
        .filter(|comments| !comments.is_empty())
        .map(str::to_string);
    let graded = task.clone();

    let mut changes = ChangeSet::new();
    changes.stage(&tasks, ChangeKind::Updated, task_id)?;
    store.commit(changes)?;

    info!(
        "event=task_grade module=service status=ok task_id={} grade={}",
        graded.id, grade
    );
    Ok(graded)
}
