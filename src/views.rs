//! Row types for the admin list views and the joins that build them.

use crate::customer_index::{CustomerIndex, NO_CUSTOMER};
use crate::listing::{format_currency, Column, ListSpec, Listable, SortValue};
use crate::models::{Invoice, Mentor, Student, Team};
use crate::reconcile::ReconciledCustomer;
use serde::Serialize;
use std::collections::HashMap;

/// Placeholder for records without a team.
pub const NO_TEAM: &str = "No Team";

impl Listable for ReconciledCustomer {
    const SPEC: ListSpec = ListSpec {
        columns: &[
            Column::text("contact_name", "Contact"),
            Column::text("email", "Email"),
            Column::text("phone", "Phone"),
            Column::text("company_name", "Company"),
            Column::text("program", "Program"),
            Column::text("team", "Team"),
            Column::text("student", "Student"),
            Column::text("first_name", "First Name"),
            Column::text("last_name", "Last Name"),
            Column::numeric("balance", "Balance"),
            Column::numeric("id", "QBO Id"),
        ],
        default_sort: "contact_name",
    };

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.contact_name.as_str(),
            self.customer.email(),
            self.customer.phone(),
            self.customer.company_name.as_str(),
            self.parsed.program.as_str(),
            self.parsed.team.as_str(),
            self.parsed.student.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
        ]
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        let text = |s: &str| Some(SortValue::Text(s.to_string()));
        match key {
            "contact_name" => text(&self.contact_name),
            "email" => text(self.customer.email()),
            "phone" => text(self.customer.phone()),
            "company_name" => text(&self.customer.company_name),
            "program" => text(&self.parsed.program),
            "team" => text(&self.parsed.team),
            "student" => text(&self.parsed.student),
            "first_name" => text(&self.first_name),
            "last_name" => text(&self.last_name),
            "balance" => Some(SortValue::Number(self.customer.balance)),
            "id" => text(&self.customer.id),
            _ => None,
        }
    }
}

/// Invoice with its customer resolved against the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRow {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub customer_label: String,
    pub balance_display: String,
}

impl Listable for InvoiceRow {
    const SPEC: ListSpec = ListSpec {
        columns: &[
            Column::text("doc_number", "Invoice #"),
            Column::text("customer", "Customer"),
            Column::text("txn_date", "Date"),
            Column::text("due_date", "Due"),
            Column::numeric("total", "Total"),
            Column::numeric("balance", "Balance"),
        ],
        default_sort: "txn_date",
    };

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.invoice.doc_number.as_str(), self.customer_label.as_str()];
        if let Some(customer_ref) = &self.invoice.customer_ref {
            fields.push(customer_ref.name.as_str());
        }
        fields
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "doc_number" => Some(SortValue::Text(self.invoice.doc_number.clone())),
            "customer" => Some(SortValue::Text(self.customer_label.clone())),
            "txn_date" => self.invoice.txn_date.map(|d| SortValue::Text(d.to_string())),
            "due_date" => self.invoice.due_date.map(|d| SortValue::Text(d.to_string())),
            "total" => Some(SortValue::Number(self.invoice.total_amt)),
            "balance" => Some(SortValue::Number(self.invoice.balance)),
            _ => None,
        }
    }
}

/// Mentor with the team name joined in.
#[derive(Debug, Clone, Serialize)]
pub struct MentorRow {
    #[serde(flatten)]
    pub mentor: Mentor,
    pub team_name: String,
}

impl Listable for MentorRow {
    const SPEC: ListSpec = ListSpec {
        columns: &[
            Column::text("last_name", "Last Name"),
            Column::text("first_name", "First Name"),
            Column::text("email", "Email"),
            Column::text("phone", "Phone"),
            Column::text("team", "Team"),
        ],
        default_sort: "last_name",
    };

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.mentor.first_name.as_str(),
            self.mentor.last_name.as_str(),
            self.mentor.email.as_str(),
            self.mentor.phone.as_str(),
            self.mentor.address.as_str(),
            self.team_name.as_str(),
        ]
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        let value = match key {
            "last_name" => &self.mentor.last_name,
            "first_name" => &self.mentor.first_name,
            "email" => &self.mentor.email,
            "phone" => &self.mentor.phone,
            "team" => &self.team_name,
            _ => return None,
        };
        Some(SortValue::Text(value.clone()))
    }
}

/// Student with team name and parent customer label joined in.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    #[serde(flatten)]
    pub student: Student,
    pub team_name: String,
    pub parent: String,
}

impl Listable for StudentRow {
    const SPEC: ListSpec = ListSpec {
        columns: &[
            Column::text("last_name", "Last Name"),
            Column::text("first_name", "First Name"),
            Column::numeric("grade", "Grade"),
            Column::text("team", "Team"),
            Column::text("parent", "Parent"),
        ],
        default_sort: "last_name",
    };

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.student.first_name.as_str(),
            self.student.last_name.as_str(),
            self.team_name.as_str(),
            self.parent.as_str(),
        ]
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "last_name" => Some(SortValue::Text(self.student.last_name.clone())),
            "first_name" => Some(SortValue::Text(self.student.first_name.clone())),
            "grade" => self.student.grade.map(|g| SortValue::Number(f64::from(g))),
            "team" => Some(SortValue::Text(self.team_name.clone())),
            "parent" => Some(SortValue::Text(self.parent.clone())),
            _ => None,
        }
    }
}

/// Team with roster counts.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRow {
    #[serde(flatten)]
    pub team: Team,
    pub mentor_count: usize,
    pub student_count: usize,
    #[serde(skip)]
    number_label: String,
}

impl Listable for TeamRow {
    const SPEC: ListSpec = ListSpec {
        columns: &[
            Column::text("name", "Team"),
            Column::numeric("team_number", "Number"),
            Column::text("program", "Program"),
            Column::numeric("mentors", "Mentors"),
            Column::numeric("students", "Students"),
        ],
        default_sort: "name",
    };

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.team.name.as_str(),
            self.team.program.as_str(),
            self.number_label.as_str(),
        ]
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "name" => Some(SortValue::Text(self.team.name.clone())),
            "team_number" => self.team.team_number.map(|n| SortValue::Number(f64::from(n))),
            "program" => Some(SortValue::Text(self.team.program.clone())),
            "mentors" => Some(SortValue::Number(self.mentor_count as f64)),
            "students" => Some(SortValue::Number(self.student_count as f64)),
            _ => None,
        }
    }
}

fn team_names(teams: &[Team]) -> HashMap<i64, &str> {
    teams.iter().map(|t| (t.id, t.name.as_str())).collect()
}

fn team_label(names: &HashMap<i64, &str>, team_id: Option<i64>) -> String {
    team_id
        .and_then(|id| names.get(&id))
        .map(|name| name.to_string())
        .unwrap_or_else(|| NO_TEAM.to_string())
}

pub fn mentor_rows(mentors: Vec<Mentor>, teams: &[Team]) -> Vec<MentorRow> {
    let names = team_names(teams);
    mentors
        .into_iter()
        .map(|mentor| MentorRow {
            team_name: team_label(&names, mentor.team_id),
            mentor,
        })
        .collect()
}

pub fn student_rows(
    students: Vec<Student>,
    teams: &[Team],
    customers: &CustomerIndex<ReconciledCustomer>,
) -> Vec<StudentRow> {
    let names = team_names(teams);
    students
        .into_iter()
        .map(|student| StudentRow {
            team_name: team_label(&names, student.team_id),
            parent: customers.parent_label(student.customer_id.as_deref()),
            student,
        })
        .collect()
}

pub fn team_rows(teams: Vec<Team>, mentors: &[Mentor], students: &[Student]) -> Vec<TeamRow> {
    let mut mentor_counts: HashMap<i64, usize> = HashMap::new();
    for team_id in mentors.iter().filter_map(|m| m.team_id) {
        *mentor_counts.entry(team_id).or_default() += 1;
    }
    let mut student_counts: HashMap<i64, usize> = HashMap::new();
    for team_id in students.iter().filter_map(|s| s.team_id) {
        *student_counts.entry(team_id).or_default() += 1;
    }

    teams
        .into_iter()
        .map(|team| TeamRow {
            mentor_count: mentor_counts.get(&team.id).copied().unwrap_or(0),
            student_count: student_counts.get(&team.id).copied().unwrap_or(0),
            number_label: team.team_number.map(|n| n.to_string()).unwrap_or_default(),
            team,
        })
        .collect()
}

pub fn invoice_rows(
    invoices: Vec<Invoice>,
    customers: &CustomerIndex<ReconciledCustomer>,
) -> Vec<InvoiceRow> {
    invoices
        .into_iter()
        .map(|invoice| {
            let customer_id = invoice.customer_ref.as_ref().map(|r| r.value.as_str());
            InvoiceRow {
                customer_label: customers.label(customer_id, NO_CUSTOMER),
                balance_display: format_currency(invoice.balance),
                invoice,
            }
        })
        .collect()
}
