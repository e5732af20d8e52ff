mod common;

use common::Portal;
use practicas_core::bus::{ChangeEvent, ChangeKind, Signal};
use practicas_core::model::application::Application;
use practicas_core::model::company::Company;
use practicas_core::{RecordStore, TableName, User};
use std::sync::{Arc, Mutex, Weak};

#[test]
fn listeners_observe_the_completed_write() {
    let portal = Portal::seeded();
    let posting = portal.publish_posting();

    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    let store: Weak<RecordStore> = Arc::downgrade(&portal.store);
    let _subscription = portal.store.bus().subscribe(
        &[Signal::PracticeDataChanged],
        move |event: &ChangeEvent| {
            if event.table != TableName::Applications {
                return;
            }
            if let Some(store) = store.upgrade() {
                let visible = event
                    .record_id
                    .as_deref()
                    .is_some_and(|id| store.load::<Application>().contains(id));
                sink.lock().unwrap().push(visible);
            }
        },
    );

    portal.student().apply(&posting.id, "Carta").unwrap();
    assert_eq!(*observed.lock().unwrap(), vec![true]);
}

#[test]
fn listener_writes_are_delivered_after_the_current_event() {
    let portal = Portal::seeded();
    let order = Arc::new(Mutex::new(Vec::new()));

    let store: Weak<RecordStore> = Arc::downgrade(&portal.store);
    let writer_log = order.clone();
    let _writer = portal
        .store
        .bus()
        .subscribe(&[Signal::UserDataChanged], move |event: &ChangeEvent| {
            writer_log.lock().unwrap().push(format!("writer saw {}", event.table));
            if let Some(store) = store.upgrade() {
                store.write::<Company>(&[]).unwrap();
            }
            writer_log.lock().unwrap().push("writer done".to_string());
        });

    let reader_log = order.clone();
    let _reader = portal
        .store
        .bus()
        .subscribe(&Signal::ALL, move |event: &ChangeEvent| {
            reader_log
                .lock()
                .unwrap()
                .push(format!("reader saw {} {}", event.table, event.kind.as_str()));
        });

    let users = portal.store.load::<User>().into_rows();
    portal.store.write(&users).unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec![
            "writer saw users",
            "writer done",
            "reader saw users reset",
            "reader saw empresas reset",
        ]
    );
}

#[test]
fn events_carry_table_signal_and_kind() {
    let event = ChangeEvent::new(TableName::TutorAssignments, ChangeKind::Created, None);
    assert_eq!(event.signal, Signal::AsignacionesChanged);
    assert_eq!(event.signal.as_str(), "asignacionesChanged");
    assert_eq!(
        ChangeEvent::new(TableName::Companies, ChangeKind::Updated, None).signal,
        Signal::PracticeDataChanged
    );
}
