//! Dashboard widget data.

use crate::listing::{filter_and_sort, format_currency, SortDirection};
use crate::models::{Mentor, Student, Team};
use crate::reconcile::ReconciledCustomer;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of customers shown in the "top balances" widget.
pub const TOP_BALANCES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceEntry {
    pub customer_id: String,
    pub contact_name: String,
    pub balance: f64,
    pub balance_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub teams_active: usize,
    pub teams_archived: usize,
    pub hall_of_fame: usize,
    pub students: usize,
    pub mentors: usize,
    pub students_without_parent: usize,
    pub customers_total: usize,
    pub customers_with_balance: usize,
    pub outstanding_balance: f64,
    pub outstanding_balance_display: String,
    pub top_balances: Vec<BalanceEntry>,
    /// When the customer snapshot was taken. `None` if no snapshot exists.
    pub cache_updated_at: Option<DateTime<Utc>>,
    pub cache_age_secs: Option<i64>,
}

pub fn summarize(
    teams: &[Team],
    students: &[Student],
    mentors: &[Mentor],
    customers: Vec<ReconciledCustomer>,
    cache_updated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DashboardSummary {
    let teams_archived = teams.iter().filter(|t| t.archived).count();
    let students_without_parent = students
        .iter()
        .filter(|s| s.customer_id.as_deref().map_or(true, |id| id.trim().is_empty()))
        .count();

    let customers_total = customers.len();
    let owing: Vec<ReconciledCustomer> = customers
        .into_iter()
        .filter(|c| c.customer.balance > 0.0)
        .collect();
    let outstanding_balance: f64 = owing.iter().map(|c| c.customer.balance).sum();
    let customers_with_balance = owing.len();

    let top_balances = filter_and_sort(owing, "", "balance", SortDirection::Desc)
        .into_iter()
        .take(TOP_BALANCES)
        .map(|c| BalanceEntry {
            customer_id: c.customer.id.clone(),
            contact_name: c.contact_name.clone(),
            balance: c.customer.balance,
            balance_display: format_currency(c.customer.balance),
        })
        .collect();

    DashboardSummary {
        teams_active: teams.len() - teams_archived,
        teams_archived,
        hall_of_fame: teams.iter().filter(|t| t.hall_of_fame).count(),
        students: students.len(),
        mentors: mentors.len(),
        students_without_parent,
        customers_total,
        customers_with_balance,
        outstanding_balance,
        outstanding_balance_display: format_currency(outstanding_balance),
        top_balances,
        cache_updated_at,
        cache_age_secs: cache_updated_at.map(|at| (now - at).num_seconds().max(0)),
    }
}
