//! In-process change notification bus.
//!
//! # Responsibility
//! - Let any writer announce that a table changed, with a typed payload
//!   (table, record id, change kind).
//! - Deliver each event to every subscriber of its signal.
//!
//! # Invariants
//! - Events are delivered in publish order.
//! - Delivery is never recursive: an event published from inside a listener
//!   is queued and delivered after the current one finished.
//! - Listeners run without any bus lock held, so they may publish, subscribe
//!   or drop subscriptions.
//! - Dropping a [`Subscription`] stops delivery to its listener.

use crate::model::RecordId;
use crate::store::TableName;
use log::debug;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use uuid::Uuid;

/// Coarse invalidation channel a table write is announced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    UserDataChanged,
    TaskDataChanged,
    PracticeDataChanged,
    AsignacionesChanged,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::UserDataChanged,
        Signal::TaskDataChanged,
        Signal::PracticeDataChanged,
        Signal::AsignacionesChanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserDataChanged => "userDataChanged",
            Self::TaskDataChanged => "taskDataChanged",
            Self::PracticeDataChanged => "practiceDataChanged",
            Self::AsignacionesChanged => "asignacionesChanged",
        }
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// Whole table replaced (bootstrap or raw write).
    Reset,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub signal: Signal,
    pub table: TableName,
    /// `None` for table-wide changes.
    pub record_id: Option<RecordId>,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(table: TableName, kind: ChangeKind, record_id: Option<RecordId>) -> Self {
        Self {
            signal: table.signal(),
            table,
            record_id,
            kind,
        }
    }
}

pub trait ChangeListener: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

impl<F> ChangeListener for F
where
    F: Fn(&ChangeEvent) + Send + Sync,
{
    fn on_change(&self, event: &ChangeEvent) {
        self(event)
    }
}

pub type SubscriptionId = Uuid;

struct Registration {
    id: SubscriptionId,
    signals: Vec<Signal>,
    listener: Arc<dyn ChangeListener>,
}

#[derive(Default)]
struct BusState {
    registrations: Vec<Registration>,
    queue: VecDeque<ChangeEvent>,
    dispatching: bool,
}

/// Publish/subscribe hub shared by the store and every mounted view.
#[derive(Default)]
pub struct ChangeBus {
    state: Arc<Mutex<BusState>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `signals`; delivery lasts as long as the
    /// returned guard lives.
    pub fn subscribe(
        &self,
        signals: &[Signal],
        listener: impl ChangeListener + 'static,
    ) -> Subscription {
        let id = Uuid::new_v4();
        lock(&self.state).registrations.push(Registration {
            id,
            signals: signals.to_vec(),
            listener: Arc::new(listener),
        });
        debug!(
            "event=bus_subscribe module=bus status=ok subscription={} signals={}",
            id,
            signals.len()
        );
        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).registrations.len()
    }

    /// Queues `event` and, unless a delivery loop is already running, drains
    /// the queue on the calling thread.
    pub fn publish(&self, event: ChangeEvent) {
        debug!(
            "event=bus_publish module=bus signal={} table={} kind={} record_id={}",
            event.signal,
            event.table,
            event.kind.as_str(),
            event.record_id.as_deref().unwrap_or("-")
        );

        {
            let mut state = lock(&self.state);
            state.queue.push_back(event);
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }

        let _reset = DispatchReset {
            state: &self.state,
        };
        while let Some((event, listeners)) = self.next_delivery() {
            for listener in listeners {
                listener.on_change(&event);
            }
        }
    }

    fn next_delivery(&self) -> Option<(ChangeEvent, Vec<Arc<dyn ChangeListener>>)> {
        let mut state = lock(&self.state);
        let event = state.queue.pop_front()?;
        let listeners = state
            .registrations
            .iter()
            .filter(|registration| registration.signals.contains(&event.signal))
            .map(|registration| Arc::clone(&registration.listener))
            .collect();
        Some((event, listeners))
    }
}

/// Clears the dispatching flag even when a listener panics.
struct DispatchReset<'a> {
    state: &'a Arc<Mutex<BusState>>,
}

impl Drop for DispatchReset<'_> {
    fn drop(&mut self) {
        lock(self.state).dispatching = false;
    }
}

/// Live registration; dropping it unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    state: Weak<Mutex<BusState>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state)
                .registrations
                .retain(|registration| registration.id != self.id);
            debug!(
                "event=bus_unsubscribe module=bus status=ok subscription={}",
                self.id
            );
        }
    }
}

fn lock(state: &Mutex<BusState>) -> MutexGuard<'_, BusState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeBus, ChangeEvent, ChangeKind, Signal};
    use crate::store::TableName;
    use std::sync::{Arc, Mutex};

    fn event(table: TableName, id: &str) -> ChangeEvent {
        ChangeEvent::new(table, ChangeKind::Updated, Some(id.to_string()))
    }

    #[test]
    fn listeners_only_receive_their_signals() {
        let bus = ChangeBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = bus.subscribe(&[Signal::TaskDataChanged], move |event: &ChangeEvent| {
            sink.lock().unwrap().push(event.table);
        });

        bus.publish(event(TableName::Users, "1"));
        bus.publish(event(TableName::Tasks, "t1"));

        assert_eq!(*seen.lock().unwrap(), vec![TableName::Tasks]);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let bus = ChangeBus::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let subscription = bus.subscribe(&Signal::ALL, move |_: &ChangeEvent| {
            *counter.lock().unwrap() += 1;
        });

        bus.publish(event(TableName::Users, "1"));
        drop(subscription);
        bus.publish(event(TableName::Users, "1"));

        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn events_published_by_listeners_are_queued_not_nested() {
        let bus = Arc::new(ChangeBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let republisher = Arc::downgrade(&bus);
        let first_log = Arc::clone(&log);
        let _first = bus.subscribe(&Signal::ALL, move |event: &ChangeEvent| {
            first_log.lock().unwrap().push(format!("start {}", event.table));
            if event.table == TableName::Applications {
                if let Some(bus) = republisher.upgrade() {
                    bus.publish(ChangeEvent::new(
                        TableName::Internships,
                        ChangeKind::Created,
                        None,
                    ));
                }
            }
            first_log.lock().unwrap().push(format!("end {}", event.table));
        });

        bus.publish(event(TableName::Applications, "a1"));

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "start postulaciones",
                "end postulaciones",
                "start practicas",
                "end practicas",
            ]
        );
    }
}
