#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use practicas_core::model::application::Decision;
use practicas_core::model::company::NewCompany;
use practicas_core::model::internship::Internship;
use practicas_core::model::posting::{NewPosting, Posting};
use practicas_core::store::KvWrite;
use practicas_core::{
    CompanyTutorService, FixedClock, KvStore, MemoryKvStore, RecordStore, StudentService, User,
};
use std::sync::Arc;

pub const STUDENT_ID: &str = "1";
pub const COMPANY_TUTOR_ID: &str = "2";
pub const COORDINATOR_ID: &str = "3";
pub const ACADEMIC_TUTOR_ID: &str = "4";

pub struct Portal {
    pub store: Arc<RecordStore>,
    pub clock: Arc<FixedClock>,
    /// Backend handle for writes that bypass the typed API.
    pub kv: Arc<MemoryKvStore>,
}

impl Portal {
    /// In-memory store with the demonstration accounts, frozen at
    /// 2024-03-01T09:00:00Z.
    pub fn seeded() -> Self {
        Self::bootstrapped(true)
    }

    /// Same as [`Portal::seeded`] but with no user accounts at all.
    pub fn empty() -> Self {
        Self::bootstrapped(false)
    }

    fn bootstrapped(seed_demo_accounts: bool) -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let kv = Arc::new(MemoryKvStore::new());
        let store = Arc::new(RecordStore::with_clock(kv.clone(), clock.clone()));
        store.bootstrap(seed_demo_accounts).unwrap();
        Self { store, clock, kv }
    }

    pub fn overwrite_raw(&self, key: &str, value: &str) {
        self.kv.apply(&[KvWrite::put(key, value)]).unwrap();
    }

    pub fn user(&self, id: &str) -> User {
        self.store
            .load::<User>()
            .get(id)
            .cloned()
            .unwrap_or_else(|| panic!("user {id} should exist"))
    }

    pub fn student(&self) -> StudentService {
        StudentService::new(self.store.clone(), self.user(STUDENT_ID)).unwrap()
    }

    pub fn company_tutor(&self) -> CompanyTutorService {
        CompanyTutorService::new(self.store.clone(), self.user(COMPANY_TUTOR_ID)).unwrap()
    }

    pub fn publish_posting(&self) -> Posting {
        self.publish_posting_with_ruc("20123456789")
    }

    /// Registers a company under `ruc` and publishes a posting for it.
    pub fn publish_posting_with_ruc(&self, ruc: &str) -> Posting {
        let tutor = self.company_tutor();
        let company = tutor
            .create_company(NewCompany {
                name: "TechCorp S.A.".to_string(),
                ruc: ruc.to_string(),
                sector: "Tecnología".to_string(),
                ..NewCompany::default()
            })
            .unwrap();
        tutor
            .create_posting(NewPosting {
                title: "Practicante Backend".to_string(),
                description: "Servicios internos".to_string(),
                requirements: "Rust".to_string(),
                duration: "6 meses".to_string(),
                modality: None,
                start_date: "2024-04-01".to_string(),
                end_date: "2024-09-30".to_string(),
                company_id: company.id,
            })
            .unwrap()
    }

    /// Publishes a posting, applies as the demo student and accepts.
    pub fn open_internship(&self) -> (Posting, Internship) {
        let posting = self.publish_posting();
        let application = self
            .student()
            .apply(&posting.id, "Me interesa el puesto")
            .unwrap();
        let outcome = self
            .company_tutor()
            .decide_application(&application.id, Decision::Accept)
            .unwrap();
        let internship = outcome.internship.expect("acceptance opens an internship");
        (posting, internship)
    }
}
