//! Parsing of QBO company names into program / team / student segments.
//!
//! Customers created for the program are named `"Program - Team - Student"`.
//! Anything that does not follow that shape (a sponsor, a plain household
//! name) parses to all-empty fields and carries no team association.

use serde::{Deserialize, Serialize};

/// Separator used when no `COMPANY_NAME_DELIMITER` is configured.
pub const DEFAULT_DELIMITER: &str = " - ";

/// Most segments a company name is split into. Extra delimiters stay in the
/// student segment.
const MAX_SEGMENTS: usize = 3;

/// Components parsed out of a `CompanyName`. Missing segments are `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    pub program: String,
    pub team: String,
    pub student: String,
}

impl ParsedName {
    /// True when neither a program nor a team was found.
    pub fn is_malformed(&self) -> bool {
        self.program.is_empty() && self.team.is_empty()
    }
}

/// Delimiter grammar for company names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyNameGrammar {
    delimiter: String,
}

impl Default for CompanyNameGrammar {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl CompanyNameGrammar {
    /// Builds a grammar around `delimiter`, falling back to the default
    /// separator when it is empty.
    pub fn new(delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Self::default();
        }
        Self { delimiter }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Splits `company_name` into program, team and student.
    ///
    /// A name without the delimiter yields an empty `ParsedName`. Two
    /// segments give program and team, three give all fields.
    pub fn parse(&self, company_name: &str) -> ParsedName {
        let trimmed = company_name.trim();
        if !trimmed.contains(self.delimiter.as_str()) {
            return ParsedName::default();
        }

        let mut segments = trimmed
            .splitn(MAX_SEGMENTS, self.delimiter.as_str())
            .map(|s| s.trim().to_string());

        ParsedName {
            program: segments.next().unwrap_or_default(),
            team: segments.next().unwrap_or_default(),
            student: segments.next().unwrap_or_default(),
        }
    }
}

/// Parses with the default `" - "` grammar.
pub fn parse(company_name: &str) -> ParsedName {
    CompanyNameGrammar::default().parse(company_name)
}
