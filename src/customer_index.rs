//! Id lookup over a customer snapshot.

use crate::models::Customer;
use crate::reconcile::ReconciledCustomer;
use std::collections::HashMap;

/// Placeholder for rows that have no customer at all.
pub const NO_CUSTOMER: &str = "No Customer";
/// Placeholder for students without a linked parent customer.
pub const NO_PARENT_LINKED: &str = "No Parent Linked";

/// Result of an index lookup. A miss is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a, T> {
    Found(&'a T),
    NotFound,
}

impl<'a, T> Lookup<'a, T> {
    pub fn found(self) -> Option<&'a T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Map from QBO customer Id to a record, built once per request.
#[derive(Debug, Clone)]
pub struct CustomerIndex<T = Customer> {
    by_id: HashMap<String, T>,
}

/// Records that can be indexed by QBO customer Id.
pub trait CustomerKeyed {
    fn customer_id(&self) -> &str;
}

impl CustomerKeyed for Customer {
    fn customer_id(&self) -> &str {
        &self.id
    }
}

impl CustomerKeyed for ReconciledCustomer {
    fn customer_id(&self) -> &str {
        self.id()
    }
}

impl<T: CustomerKeyed> CustomerIndex<T> {
    /// Builds the index. On duplicate Ids the last record wins.
    pub fn build(records: impl IntoIterator<Item = T>) -> Self {
        let by_id = records
            .into_iter()
            .map(|r| (r.customer_id().to_string(), r))
            .collect();
        Self { by_id }
    }
}

impl<T> CustomerIndex<T> {
    pub fn lookup(&self, id: &str) -> Lookup<'_, T> {
        match self.by_id.get(id.trim()) {
            Some(record) => Lookup::Found(record),
            None => Lookup::NotFound,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl CustomerIndex<ReconciledCustomer> {
    /// Display label for an optional customer reference.
    ///
    /// No reference gives `missing`; a dangling reference gives
    /// `"Customer ID: X"`; a hit gives the contact name.
    pub fn label(&self, id: Option<&str>, missing: &str) -> String {
        let Some(id) = id.map(str::trim).filter(|s| !s.is_empty()) else {
            return missing.to_string();
        };

        match self.lookup(id) {
            Lookup::Found(customer) => customer.contact_name.clone(),
            Lookup::NotFound => format!("Customer ID: {}", id),
        }
    }

    /// Label for a student's parent link.
    pub fn parent_label(&self, customer_id: Option<&str>) -> String {
        self.label(customer_id, NO_PARENT_LINKED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;

    fn customer(id: &str, company: &str, name: &str) -> Customer {
        Customer {
            id: id.to_string(),
            company_name: company.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn index() -> CustomerIndex<ReconciledCustomer> {
        CustomerIndex::build(
            [
                customer("1", "FLL - Thunder - Jane Doe", "Doe, John"),
                customer("2", "Acme Corp", "Acme"),
            ]
            .iter()
            .map(reconcile),
        )
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let index = index();
        assert_eq!(index.len(), 2);
        assert!(index.lookup("1").is_found());
        assert_eq!(index.lookup("99"), Lookup::NotFound);
    }

    #[test]
    fn test_labels() {
        let index = index();
        assert_eq!(index.parent_label(Some("1")), "Doe, John");
        assert_eq!(index.parent_label(Some("2")), "Acme Corp");
        assert_eq!(index.parent_label(Some("77")), "Customer ID: 77");
        assert_eq!(index.parent_label(None), NO_PARENT_LINKED);
        assert_eq!(index.parent_label(Some("  ")), NO_PARENT_LINKED);
        assert_eq!(index.label(None, NO_CUSTOMER), NO_CUSTOMER);
    }

    #[test]
    fn test_empty_index() {
        let index: CustomerIndex = CustomerIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.lookup("1").found().is_none());
    }
}
