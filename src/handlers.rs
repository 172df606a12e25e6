pub mod automations;
pub mod documents;
pub mod reports;
pub mod shared_links;
