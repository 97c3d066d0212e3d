//! Input validation for admin-entered records.

use crate::errors::AppError;
use crate::models::{MentorInput, StudentInput, TeamInput};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use std::sync::OnceLock;

/// Highest grade a student can be in (0 is kindergarten).
const MAX_GRADE: i32 = 12;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified: local@domain.tld
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .expect("email regex is valid")
    })
}

/// Validate email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }
    email_regex().is_match(email)
}

/// Normalizes a US phone number to E.164 (`+12015550123`).
///
/// Returns `None` for anything libphonenumber does not accept as valid.
pub fn normalize_us_phone(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() < 7 {
        return None;
    }

    match phonenumber::parse(Some(CountryId::US), raw) {
        Ok(number) if phonenumber::is_valid(&number) => {
            let formatted = number.format().mode(Mode::E164).to_string();
            tracing::debug!("Valid phone: {} → {}", raw, formatted);
            Some(formatted)
        }
        Ok(_) => {
            tracing::warn!("Invalid phone number: {}", raw);
            None
        }
        Err(e) => {
            tracing::warn!("Unparseable phone number {}: {}", raw, e);
            None
        }
    }
}

fn require_name(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// Validates and normalizes a mentor payload (trimmed names, lowercased
/// email, E.164 phone).
pub fn validate_mentor(mut input: MentorInput) -> Result<MentorInput, AppError> {
    require_name("first_name", &input.first_name)?;
    require_name("last_name", &input.last_name)?;
    input.first_name = input.first_name.trim().to_string();
    input.last_name = input.last_name.trim().to_string();

    input.email = input.email.trim().to_lowercase();
    if !input.email.is_empty() && !is_valid_email(&input.email) {
        return Err(AppError::BadRequest(format!(
            "Invalid email address: {}",
            input.email
        )));
    }

    if !input.phone.trim().is_empty() {
        input.phone = normalize_us_phone(&input.phone).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid phone number: {}", input.phone))
        })?;
    } else {
        input.phone.clear();
    }

    Ok(input)
}

pub fn validate_student(mut input: StudentInput) -> Result<StudentInput, AppError> {
    require_name("first_name", &input.first_name)?;
    require_name("last_name", &input.last_name)?;
    input.first_name = input.first_name.trim().to_string();
    input.last_name = input.last_name.trim().to_string();

    if let Some(grade) = input.grade {
        if !(0..=MAX_GRADE).contains(&grade) {
            return Err(AppError::BadRequest(format!(
                "grade must be between 0 and {}",
                MAX_GRADE
            )));
        }
    }

    input.customer_id = input
        .customer_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    Ok(input)
}

pub fn validate_team(mut input: TeamInput) -> Result<TeamInput, AppError> {
    require_name("name", &input.name)?;
    input.name = input.name.trim().to_string();
    input.program = input.program.trim().to_string();

    if matches!(input.team_number, Some(n) if n <= 0) {
        return Err(AppError::BadRequest(
            "team_number must be positive".to_string(),
        ));
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentor(email: &str, phone: &str) -> MentorInput {
        MentorInput {
            first_name: " Pat ".to_string(),
            last_name: "Ng".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: String::new(),
            notes: String::new(),
            team_id: None,
        }
    }

    #[test]
    fn test_emails() {
        assert!(is_valid_email("coach@example.org"));
        assert!(is_valid_email("first.last+robots@school.k12.us"));
        assert!(!is_valid_email("coach@example"));
        assert!(!is_valid_email("coach example.org"));
        assert!(!is_valid_email("@example.org"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_us_phone("(201) 555-0123"), Some("+12015550123".to_string()));
        assert_eq!(normalize_us_phone("201-555-0123"), Some("+12015550123".to_string()));
        assert_eq!(normalize_us_phone("12"), None);
        assert_eq!(normalize_us_phone("not a phone"), None);
    }

    #[test]
    fn test_validate_mentor_normalizes() {
        let input = validate_mentor(mentor(" Coach@Example.org ", "(201) 555-0123")).unwrap();
        assert_eq!(input.first_name, "Pat");
        assert_eq!(input.email, "coach@example.org");
        assert_eq!(input.phone, "+12015550123");
    }

    #[test]
    fn test_validate_mentor_allows_blank_contact() {
        let input = validate_mentor(mentor("", "  ")).unwrap();
        assert_eq!(input.email, "");
        assert_eq!(input.phone, "");
    }

    #[test]
    fn test_validate_mentor_rejects_bad_input() {
        assert!(validate_mentor(mentor("nope", "")).is_err());
        assert!(validate_mentor(mentor("", "123")).is_err());

        let mut missing = mentor("", "");
        missing.last_name = " ".to_string();
        assert!(validate_mentor(missing).is_err());
    }

    #[test]
    fn test_validate_student() {
        let ok = validate_student(StudentInput {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            grade: Some(5),
            team_id: None,
            customer_id: Some("  ".to_string()),
        })
        .unwrap();
        assert_eq!(ok.customer_id, None);

        let bad = validate_student(StudentInput {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            grade: Some(13),
            team_id: None,
            customer_id: None,
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_team() {
        let team = TeamInput {
            name: " Thunder ".to_string(),
            team_number: Some(0),
            program: "FLL".to_string(),
            archived: false,
            hall_of_fame: false,
        };
        assert!(validate_team(team.clone()).is_err());

        let ok = validate_team(TeamInput {
            team_number: Some(4567),
            ..team
        })
        .unwrap();
        assert_eq!(ok.name, "Thunder");
    }
}
