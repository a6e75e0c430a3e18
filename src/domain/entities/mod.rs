pub mod edit;
pub mod report;
pub mod session;
