//! Merging a cached QBO customer with the fields parsed out of its company
//! name into one display-ready record.

use crate::models::Customer;
use crate::name_parser::{CompanyNameGrammar, ParsedName};
use serde::Serialize;

/// A customer plus its parsed and derived name fields.
///
/// Recomputed on every request from the cache snapshot, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledCustomer {
    #[serde(flatten)]
    pub parsed: ParsedName,
    pub first_name: String,
    pub last_name: String,
    /// Display name for the row. `CompanyName` for unassociated customers,
    /// `Name` otherwise.
    pub contact_name: String,
    pub customer: Customer,
}

impl ReconciledCustomer {
    pub fn id(&self) -> &str {
        &self.customer.id
    }

    /// True when the company name carried a program or team.
    pub fn is_associated(&self) -> bool {
        !self.parsed.is_malformed()
    }
}

/// Reconciles `customer` using the default company name grammar.
pub fn reconcile(customer: &Customer) -> ReconciledCustomer {
    reconcile_with(&CompanyNameGrammar::default(), customer)
}

/// Reconciles `customer` under `grammar`. Total and deterministic.
pub fn reconcile_with(grammar: &CompanyNameGrammar, customer: &Customer) -> ReconciledCustomer {
    let parsed = grammar.parse(&customer.company_name);

    let given = customer.given_name.trim();
    let family = customer.family_name.trim();
    let (first_name, last_name) = if given.is_empty() && family.is_empty() {
        split_student_name(&parsed.student)
    } else {
        (given.to_string(), family.to_string())
    };

    let contact_name = if parsed.is_malformed() {
        customer.company_name.clone()
    } else {
        customer.name.clone()
    };

    ReconciledCustomer {
        parsed,
        first_name,
        last_name,
        contact_name,
        customer: customer.clone(),
    }
}

/// Reconciles a whole snapshot, preserving order.
pub fn reconcile_all(
    grammar: &CompanyNameGrammar,
    customers: &[Customer],
) -> Vec<ReconciledCustomer> {
    customers
        .iter()
        .map(|c| reconcile_with(grammar, c))
        .collect()
}

/// Splits a student name: the last token is the last name, everything before
/// it is the first name.
pub fn split_student_name(student: &str) -> (String, String) {
    let tokens: Vec<&str> = student.split_whitespace().collect();
    match tokens.split_last() {
        Some((last, rest)) => (rest.join(" "), (*last).to_string()),
        None => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(company: &str, name: &str) -> Customer {
        Customer {
            id: "1".to_string(),
            company_name: company.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_associated_customer_uses_name() {
        let r = reconcile(&customer("FLL - Thunder - Jane Doe", "Doe, John"));
        assert_eq!(r.parsed.program, "FLL");
        assert_eq!(r.parsed.team, "Thunder");
        assert_eq!(r.contact_name, "Doe, John");
        assert_eq!(r.first_name, "Jane");
        assert_eq!(r.last_name, "Doe");
        assert!(r.is_associated());
    }

    #[test]
    fn test_unassociated_customer_uses_company() {
        let r = reconcile(&customer("Acme Corp", "Acme Corporation Inc"));
        assert_eq!(r.contact_name, "Acme Corp");
        assert_eq!(r.parsed, ParsedName::default());
        assert_eq!(r.first_name, "");
        assert_eq!(r.last_name, "");
    }

    #[test]
    fn test_native_names_win() {
        let mut c = customer("FLL - Thunder - Jane Doe", "Doe");
        c.given_name = "Johnny".to_string();
        let r = reconcile(&c);
        assert_eq!(r.first_name, "Johnny");
        assert_eq!(r.last_name, "");
    }

    #[test]
    fn test_split_student_name() {
        assert_eq!(
            split_student_name("Mary Ann van Buren"),
            ("Mary Ann van".to_string(), "Buren".to_string())
        );
        assert_eq!(split_student_name("Cher"), (String::new(), "Cher".to_string()));
        assert_eq!(split_student_name("  "), (String::new(), String::new()));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let c = customer("FTC - Sparks - Sam Lee", "Lee Family");
        let once = reconcile(&c);
        let twice = reconcile(&once.customer);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_team_only_still_associated() {
        let r = reconcile(&customer("FTC - Sparks", "Sparks Parent"));
        assert_eq!(r.contact_name, "Sparks Parent");
        assert_eq!(r.parsed.student, "");
    }
}
