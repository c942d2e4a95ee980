pub mod snapshot;
pub mod curator;
pub mod statistics;
pub mod dashboard_service;
pub mod report;
