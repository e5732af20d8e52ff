//! Client-local record core of the internship portal.
//! This crate is the single source of truth for business invariants.

pub mod bus;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use bus::{ChangeBus, ChangeEvent, ChangeKind, Signal, Subscription};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, PortalConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::user::{NewUser, Role, User, UserPatch};
pub use model::RecordId;
pub use service::academic_tutor_service::{AcademicTutorDashboard, AcademicTutorService};
pub use service::auth_service::AuthService;
pub use service::company_tutor_service::{
    CompanyTutorDashboard, CompanyTutorService, DecisionOutcome,
};
pub use service::coordinator_service::{CoordinatorDashboard, CoordinatorService};
pub use service::stats::{PortalStats, TutorKind, TutorWorkload};
pub use service::student_service::{StudentDashboard, StudentService};
pub use service::view::{MountedView, TaskView};
pub use service::{Notice, NoticeKind, ServiceError, ServiceResult};
pub use store::{
    BootstrapReport, ChangeSet, KvStore, MemoryKvStore, RecordStore, SqliteKvStore, StoreError,
    StoreResult, Table, TableName,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
