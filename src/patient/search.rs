//! Patient search parameters

use crate::query::{Query, ToQuery};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a search parameter from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}'")]
pub struct ParseParamError {
    kind: &'static str,
    value: String,
}

impl ParseParamError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Administrative gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "unknown" => Ok(Gender::Unknown),
            _ => Err(ParseParamError::new("gender", s)),
        }
    }
}

/// FHIR comparison prefix for ordered parameters (dates, numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prefix {
    /// equal
    #[default]
    Eq,
    /// not equal
    Ne,
    /// greater than
    Gt,
    /// less than
    Lt,
    /// greater or equal
    Ge,
    /// less or equal
    Le,
    /// starts after
    Sa,
    /// ends before
    Eb,
    /// approximately
    Ap,
}

impl Prefix {
    const ALL: [Prefix; 9] = [
        Prefix::Eq,
        Prefix::Ne,
        Prefix::Gt,
        Prefix::Lt,
        Prefix::Ge,
        Prefix::Le,
        Prefix::Sa,
        Prefix::Eb,
        Prefix::Ap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Eq => "eq",
            Prefix::Ne => "ne",
            Prefix::Gt => "gt",
            Prefix::Lt => "lt",
            Prefix::Ge => "ge",
            Prefix::Le => "le",
            Prefix::Sa => "sa",
            Prefix::Eb => "eb",
            Prefix::Ap => "ap",
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prefix {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseParamError::new("prefix", s))
    }
}

/// A prefixed date such as `eq2010-10-22`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParam {
    pub prefix: Prefix,
    pub date: NaiveDate,
}

impl DateParam {
    pub fn new(prefix: Prefix, date: NaiveDate) -> Self {
        Self { prefix, date }
    }
}

impl fmt::Display for DateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.date.format("%Y-%m-%d"))
    }
}

/// Accepts `2010-10-22` (prefix `eq`) or `ge2010-10-22`
impl FromStr for DateParam {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, date) = match s.get(..2).map(Prefix::from_str) {
            Some(Ok(prefix)) => (prefix, &s[2..]),
            _ => (Prefix::Eq, s),
        };
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ParseParamError::new("date", s))?;
        Ok(Self { prefix, date })
    }
}

/// Options for `GET Patient?...`
///
/// `max_results` is always sent; application-restricted access requires 1.
/// `given`, `birthdate` and `death_date` may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSearchOptions {
    /// Fuzzy search: homophones, transposed names, historic data. No wildcards.
    pub fuzzy_match: Option<bool>,
    /// Only results with a score of 1.0
    pub exact_match: Option<bool>,
    /// Include historic names and addresses (non-fuzzy only)
    pub history: Option<bool>,
    pub max_results: u32,
    /// Family name; wildcards allowed when not fuzzy
    pub family: Option<String>,
    pub given: Vec<String>,
    pub gender: Option<Gender>,
    pub birthdate: Vec<DateParam>,
    pub death_date: Vec<DateParam>,
    /// Postcode; spaces and case are ignored by the server
    pub postcode: Option<String>,
    /// ODS code of the registered GP practice, e.g. `Y12345`
    pub general_practitioner: Option<String>,
}

impl Default for PatientSearchOptions {
    fn default() -> Self {
        Self {
            fuzzy_match: None,
            exact_match: None,
            history: None,
            max_results: 1,
            family: None,
            given: Vec::new(),
            gender: None,
            birthdate: Vec::new(),
            death_date: Vec::new(),
            postcode: None,
            general_practitioner: None,
        }
    }
}

impl PatientSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fuzzy_match(mut self, enabled: bool) -> Self {
        self.fuzzy_match = Some(enabled);
        self
    }

    #[must_use]
    pub fn exact_match(mut self, enabled: bool) -> Self {
        self.exact_match = Some(enabled);
        self
    }

    #[must_use]
    pub fn history(mut self, enabled: bool) -> Self {
        self.history = Some(enabled);
        self
    }

    #[must_use]
    pub fn max_results(mut self, max: u32) -> Self {
        self.max_results = max;
        self
    }

    #[must_use]
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Add a given name
    #[must_use]
    pub fn given(mut self, given: impl Into<String>) -> Self {
        self.given.push(given.into());
        self
    }

    #[must_use]
    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Add a birth date constraint
    #[must_use]
    pub fn birthdate(mut self, date: DateParam) -> Self {
        self.birthdate.push(date);
        self
    }

    /// Add a death date constraint
    #[must_use]
    pub fn death_date(mut self, date: DateParam) -> Self {
        self.death_date.push(date);
        self
    }

    #[must_use]
    pub fn postcode(mut self, postcode: impl Into<String>) -> Self {
        self.postcode = Some(postcode.into());
        self
    }

    #[must_use]
    pub fn general_practitioner(mut self, ods_code: impl Into<String>) -> Self {
        self.general_practitioner = Some(ods_code.into());
        self
    }
}

impl ToQuery for PatientSearchOptions {
    fn to_query(&self) -> Query {
        Query::new()
            .push_opt("_fuzzy-match", self.fuzzy_match)
            .push_opt("_exact-match", self.exact_match)
            .push_opt("_history", self.history)
            .push("_max-results", self.max_results)
            .push_opt("family", self.family.as_deref())
            .push_all("given", &self.given)
            .push_opt("gender", self.gender)
            .push_all("birthdate", &self.birthdate)
            .push_all("death-date", &self.death_date)
            .push_opt("address-postcode", self.postcode.as_deref())
            .push_opt("general-practitioner", self.general_practitioner.as_deref())
    }
}
