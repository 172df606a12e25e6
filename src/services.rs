pub mod automation_service;
pub mod document_service;
pub mod report_service;
pub mod rule_filter;
pub mod shared_link_service;
