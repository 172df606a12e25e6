pub mod shared_link_repo;
pub use shared_link_repo::{SharedLinkRepository, SharedLinkStore};
pub mod automation_repo;
pub use automation_repo::{AutomationRepository, AutomationStore};
pub mod report_repo;
pub use report_repo::{ReportRepository, ReportStore};
