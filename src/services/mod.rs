//! Business logic services. Each service owns a database handle and an
//! event sender; handlers stay thin and all invariants live here.

pub mod clients;
pub mod inventory;
pub mod products;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod users;

/// Page of results plus the total row count for the filter.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Outcome of a delete request for records that may be referenced by
/// history: hard delete when unreferenced, deactivation otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    Deactivated,
}
