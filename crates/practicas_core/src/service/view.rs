//! Reloadable dashboard projections.
//!
//! # Responsibility
//! - Keep a role dashboard in sync with the store while it is mounted.
//!
//! # Invariants
//! - A view reloads the whole projection when an event touches one of the
//!   tables it reads; events for other tables are ignored.
//! - Dropping the view unsubscribes it from the bus.

use crate::bus::{ChangeEvent, Signal, Subscription};
use crate::model::task::{Task, TaskStatus};
use crate::store::{RecordStore, TableName};
use chrono::{DateTime, Utc};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Task with its status as shown at projection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task: Task,
    pub display_status: TaskStatus,
}

impl TaskView {
    pub fn new(task: Task, now: DateTime<Utc>) -> Self {
        let display_status = task.display_status(now);
        Self {
            task,
            display_status,
        }
    }
}

pub(crate) fn task_views(tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<TaskView> {
    tasks
        .into_iter()
        .map(|task| TaskView::new(task, now))
        .collect()
}

struct ViewState<P> {
    projection: P,
    reloads: usize,
}

/// Dashboard projection kept fresh by bus events.
pub struct MountedView<P> {
    state: Arc<Mutex<ViewState<P>>>,
    tables: Vec<TableName>,
    _subscription: Subscription,
}

impl<P> MountedView<P>
where
    P: Clone + Send + 'static,
{
    /// Builds the projection once and subscribes to the signals of `tables`.
    pub fn mount<F>(store: &Arc<RecordStore>, tables: &[TableName], loader: F) -> Self
    where
        F: Fn(&RecordStore) -> P + Send + Sync + 'static,
    {
        let state = Arc::new(Mutex::new(ViewState {
            projection: loader(store.as_ref()),
            reloads: 0,
        }));

        let mut signals: Vec<Signal> = Vec::new();
        for table in tables {
            if !signals.contains(&table.signal()) {
                signals.push(table.signal());
            }
        }

        let watched = tables.to_vec();
        let weak_store: Weak<RecordStore> = Arc::downgrade(store);
        let weak_state = Arc::downgrade(&state);
        let subscription = store.bus().subscribe(&signals, move |event: &ChangeEvent| {
            if !watched.contains(&event.table) {
                return;
            }
            let (Some(store), Some(state)) = (weak_store.upgrade(), weak_state.upgrade()) else {
                return;
            };
            let projection = loader(store.as_ref());
            let mut guard = lock(&state);
            guard.projection = projection;
            guard.reloads += 1;
            debug!(
                "event=view_reload module=service status=ok table={} reloads={}",
                event.table, guard.reloads
            );
        });

        Self {
            state,
            tables: tables.to_vec(),
            _subscription: subscription,
        }
    }

    /// Latest projection.
    pub fn snapshot(&self) -> P {
        lock(&self.state).projection.clone()
    }

    /// Number of reloads triggered by bus events since mounting.
    pub fn reload_count(&self) -> usize {
        lock(&self.state).reloads
    }

    pub fn tables(&self) -> &[TableName] {
        &self.tables
    }
}

fn lock<P>(state: &Mutex<ViewState<P>>) -> MutexGuard<'_, ViewState<P>> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
