use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============ QBO Models ============

/// Email wrapper as QBO returns it (`PrimaryEmailAddr.Address`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    #[serde(rename = "Address", default)]
    pub address: String,
}

/// Phone wrapper as QBO returns it (`PrimaryPhone.FreeFormNumber`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    #[serde(rename = "FreeFormNumber", default)]
    pub free_form_number: String,
}

/// A QBO customer as held in the cache snapshot.
///
/// Every field is defaulted so sparse API records deserialize into a full
/// struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "CompanyName", default)]
    pub company_name: String,
    #[serde(rename = "GivenName", default)]
    pub given_name: String,
    #[serde(rename = "FamilyName", default)]
    pub family_name: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "DisplayName", default)]
    pub display_name: String,
    #[serde(rename = "FullyQualifiedName", default)]
    pub fully_qualified_name: String,
    #[serde(rename = "PrimaryEmailAddr", default)]
    pub primary_email_addr: EmailAddress,
    #[serde(rename = "PrimaryPhone", default)]
    pub primary_phone: PhoneNumber,
    #[serde(rename = "Balance", default)]
    pub balance: f64,
    #[serde(rename = "Active", default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Customer {
    pub fn email(&self) -> &str {
        &self.primary_email_addr.address
    }

    pub fn phone(&self) -> &str {
        &self.primary_phone.free_form_number
    }

    /// Fills `Name` when QBO left it out, so it can serve as the canonical
    /// display name.
    pub fn with_canonical_name(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = if !self.fully_qualified_name.trim().is_empty() {
                self.fully_qualified_name.clone()
            } else {
                self.display_name.clone()
            };
        }
        self
    }
}

/// Reference from an invoice to its customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRef {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub name: String,
}

/// A QBO invoice. Fetched live, never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "DocNumber", default)]
    pub doc_number: String,
    #[serde(rename = "TxnDate", default)]
    pub txn_date: Option<NaiveDate>,
    #[serde(rename = "DueDate", default)]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "TotalAmt", default)]
    pub total_amt: f64,
    #[serde(rename = "Balance", default)]
    pub balance: f64,
    #[serde(rename = "CustomerRef", default)]
    pub customer_ref: Option<CustomerRef>,
}

// ============ Database Models ============

/// A program team.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    /// Official team number, when the program assigns one.
    pub team_number: Option<i32>,
    /// Program the team competes in (e.g. "FLL", "FTC").
    pub program: String,
    pub archived: bool,
    pub hall_of_fame: bool,
    pub created_at: DateTime<Utc>,
}

/// A volunteer mentor.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Mentor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub notes: String,
    pub team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A student. `customer_id` links to the paying parent's QBO customer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub grade: Option<i32>,
    pub team_id: Option<i64>,
    pub customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============ API Request/Response Models ============

/// Create/update payload for a team.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamInput {
    pub name: String,
    #[serde(default)]
    pub team_number: Option<i32>,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub hall_of_fame: bool,
}

/// Create/update payload for a mentor.
#[derive(Debug, Clone, Deserialize)]
pub struct MentorInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub team_id: Option<i64>,
}

/// Create/update payload for a student.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub grade: Option<i32>,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Common list query parameters (`search`, `orderby`, `order`, `paged`,
/// `per_page`) plus the per-table filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub orderby: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub paged: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
    /// Teams only.
    #[serde(default)]
    pub archived: Option<bool>,
    /// Teams only.
    #[serde(default)]
    pub hall_of_fame: Option<bool>,
    /// Mentors and students.
    #[serde(default)]
    pub team_id: Option<i64>,
    /// Invoices only.
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Request body for emailing mentors.
#[derive(Debug, Clone, Deserialize)]
pub struct MentorEmailRequest {
    pub mentor_ids: Vec<i64>,
    pub subject: String,
    /// HTML body. Inline `data:image` sources become attachments.
    pub body: String,
    #[serde(default)]
    pub cc: Option<String>,
}

/// Outcome of a mentor email batch.
#[derive(Debug, Serialize)]
pub struct MentorEmailResponse {
    pub sent: usize,
    pub failed: Vec<MentorEmailFailure>,
}

#[derive(Debug, Serialize)]
pub struct MentorEmailFailure {
    pub mentor_id: i64,
    pub reason: String,
}

/// Response after a forced customer cache refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub customers: usize,
    pub refreshed_at: DateTime<Utc>,
}
