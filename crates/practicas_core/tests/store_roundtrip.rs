mod common;

use common::Portal;
use practicas_core::bus::{ChangeEvent, ChangeKind, Signal};
use practicas_core::model::company::Company;
use practicas_core::model::report::{NewReport, Report};
use practicas_core::store::SESSION_KEY;
use practicas_core::{AuthService, ChangeSet, RecordStore, StoreError, Table, TableName, User};
use std::sync::{Arc, Mutex};

fn report(id: &str, hours: u8) -> Report {
    Report {
        id: id.to_string(),
        practica_id: "p1".to_string(),
        estudiante_id: "1".to_string(),
        created_at: "2024-03-01T09:00:00.000Z".to_string(),
        activities: format!("Actividad {id}"),
        observations: String::new(),
        hours_worked: hours,
    }
}

#[test]
fn writing_and_reading_preserves_fields_and_bytes() {
    let store = RecordStore::in_memory();
    let rows: Vec<Report> = (0..5).map(|i| report(&i.to_string(), i)).collect();

    store.write(&rows).unwrap();
    let first_blob = store.raw("reportes").unwrap().unwrap().value;
    let read_back = store.read::<Report>().unwrap().unwrap();
    assert_eq!(read_back, rows);

    store.write(&read_back).unwrap();
    let second_blob = store.raw("reportes").unwrap().unwrap().value;
    assert_eq!(first_blob, second_blob);
}

#[test]
fn persisted_json_uses_stored_field_names() {
    let store = RecordStore::in_memory();
    store.write(&[report("7", 8)]).unwrap();

    let blob = store.raw("reportes").unwrap().unwrap().value;
    let json: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(json[0]["practicaId"], "p1");
    assert_eq!(json[0]["horasTrabajadas"], 8);
    assert_eq!(json[0]["actividades"], "Actividad 7");
}

#[test]
fn absent_tables_read_as_none_and_load_as_empty() {
    let store = RecordStore::in_memory();
    assert!(store.read::<Company>().unwrap().is_none());
    let table = store.load::<Company>();
    assert!(table.is_empty());
    assert_eq!(table.revision(), 0);
}

#[test]
fn stale_revision_aborts_commit() {
    let store = RecordStore::in_memory();
    store.write(&[report("1", 4)]).unwrap();

    let loaded = store.load::<Report>();
    store.write::<Report>(&[]).unwrap();

    assert!(matches!(
        store.read::<Report>(),
        Ok(Some(rows)) if rows.is_empty()
    ));

    let mut changes = ChangeSet::new();
    changes.stage(&loaded, ChangeKind::Updated, "1").unwrap();
    let err = store.commit(changes).unwrap_err();
    assert!(matches!(err, StoreError::Conflict { ref key, .. } if key == "reportes"));
}

#[test]
fn unparseable_blob_falls_back_to_empty_table() {
    let portal = Portal::seeded();
    let store = &portal.store;
    portal.overwrite_raw("users", "{\"not\": \"an array\"}");

    assert!(matches!(
        store.read::<User>(),
        Err(StoreError::Serialization { ref key, .. }) if key == "users"
    ));
    assert!(store.load::<User>().is_empty());
}

#[test]
fn undecodable_row_blocks_writes_instead_of_dropping_the_table() {
    let portal = Portal::seeded();
    portal.open_internship();
    let student = portal.student();
    let request = NewReport {
        activities: "Configuración del entorno".to_string(),
        observations: String::new(),
        hours_worked: 5,
    };
    student.submit_report(request.clone()).unwrap();

    let blob = portal.store.raw("reportes").unwrap().unwrap().value;
    let mut rows: Vec<serde_json::Value> = serde_json::from_str(&blob).unwrap();
    rows.push(serde_json::json!({
        "id": "legacy",
        "practicaId": "p0",
        "estudianteId": "1",
        "fecha": "2024-02-01T09:00:00.000Z",
        "actividades": "Horas fraccionadas",
        "observaciones": "",
        "horasTrabajadas": 4.5
    }));
    let legacy_blob = serde_json::to_string(&rows).unwrap();
    portal.overwrite_raw("reportes", &legacy_blob);

    let err = student.submit_report(request).unwrap_err();
    assert_eq!(err.code(), "stale_write");
    assert_eq!(
        portal.store.raw("reportes").unwrap().unwrap().value,
        legacy_blob
    );
}

#[test]
fn failed_commit_publishes_nothing() {
    let store = RecordStore::in_memory();
    let events = Arc::new(Mutex::new(Vec::<ChangeEvent>::new()));
    let sink = events.clone();
    let _subscription = store.bus().subscribe(&Signal::ALL, move |event: &ChangeEvent| {
        sink.lock().unwrap().push(event.clone());
    });

    let stale: Table<Company> = store.load();
    store.write::<Company>(&[]).unwrap();
    events.lock().unwrap().clear();

    let mut changes = ChangeSet::new();
    changes.stage(&stale, ChangeKind::Created, "x").unwrap();
    assert!(store.commit(changes).is_err());
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn bootstrap_seeds_once_and_initializes_every_table() {
    let store = RecordStore::in_memory();
    let first = store.bootstrap(true).unwrap();
    assert!(first.seeded_demo_accounts);
    assert_eq!(first.initialized.len(), TableName::ALL.len());

    let users = store.load::<User>();
    assert_eq!(users.len(), 4);
    assert_eq!(users.get("1").unwrap().email, "estudiante@test.com");
    for table in TableName::ALL {
        assert!(store.raw(table.key()).unwrap().is_some(), "{table} missing");
    }

    let second = store.bootstrap(true).unwrap();
    assert_eq!(second.initialized, Vec::<TableName>::new());
    assert_eq!(store.load::<User>().len(), 4);
}

#[test]
fn bootstrap_without_demo_accounts_leaves_users_empty() {
    let store = RecordStore::in_memory();
    let report = store.bootstrap(false).unwrap();
    assert!(!report.seeded_demo_accounts);
    assert_eq!(store.read::<User>().unwrap(), Some(Vec::new()));
}

#[test]
fn logout_removes_only_the_session_key() {
    let portal = Portal::seeded();
    let auth = AuthService::new(portal.store.clone());
    auth.login("coordinador@test.com", "123456").unwrap();
    assert!(portal.store.raw(SESSION_KEY).unwrap().is_some());

    let before: Vec<_> = TableName::ALL
        .iter()
        .map(|table| portal.store.raw(table.key()).unwrap())
        .collect();
    auth.logout().unwrap();
    let after: Vec<_> = TableName::ALL
        .iter()
        .map(|table| portal.store.raw(table.key()).unwrap())
        .collect();

    assert!(portal.store.raw(SESSION_KEY).unwrap().is_none());
    assert_eq!(before, after);
    assert!(auth.current_user().is_none());
}

#[test]
fn corrupt_session_reads_as_logged_out() {
    let portal = Portal::seeded();
    portal.overwrite_raw(SESSION_KEY, "not json");
    assert!(portal.store.session_user().is_none());
}
