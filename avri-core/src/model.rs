//! Domain data structures for addresses and pickup schedules.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Opaque identifier the waste service assigns to a resolved address.
pub struct AddressId(pub String);

impl fmt::Display for AddressId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Scheduled pickup of one waste type on one day.
pub struct PickupRecord {
    /// Waste type label exactly as the service reports it, e.g. `PAPER`.
    pub name: String,
    /// Local date and time of the pickup.
    pub day: NaiveDateTime,
}

impl PickupRecord {
    /// Create a record for the given waste type and day.
    #[must_use]
    pub fn new<N: Into<String>>(name: N, day: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            day,
        }
    }
}

impl fmt::Display for PickupRecord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} on {}", self.name, self.day.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Household address and tenant the client requests schedules for.
pub struct ClientIdentity {
    postal_code: String,
    house_number: String,
    company_code: String,
}

impl ClientIdentity {
    /// Build an identity, removing all whitespace from the postal code.
    #[must_use]
    pub fn new(postal_code: &str, house_number: &str, company_code: &str) -> Self {
        Self {
            postal_code: clean_postal_code(postal_code),
            house_number: house_number.trim().to_owned(),
            company_code: company_code.to_owned(),
        }
    }

    /// Postal code without whitespace, e.g. `1234AB`.
    #[must_use]
    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    /// House number as entered.
    #[must_use]
    pub fn house_number(&self) -> &str {
        &self.house_number
    }

    /// Tenant code sent with every request.
    #[must_use]
    pub fn company_code(&self) -> &str {
        &self.company_code
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}", self.postal_code, self.house_number)
    }
}

fn clean_postal_code(raw: &str) -> String {
    raw.chars().filter(|ch| !ch.is_whitespace()).collect()
}
