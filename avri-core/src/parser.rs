//! Decoding of Ximmio waste API responses.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::model::{AddressId, PickupRecord};
use crate::ports::AvriError;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "dataList")]
    data_list: Option<Vec<T>>,
}

/// Single match from `/FetchAdress`.
#[derive(Debug, Deserialize)]
pub(crate) struct AddressEntry {
    #[serde(rename = "UniqueId")]
    unique_id: String,
}

impl From<AddressEntry> for AddressId {
    fn from(entry: AddressEntry) -> Self {
        AddressId(entry.unique_id)
    }
}

/// Single pickup type with its dates from `/GetCalendar`.
#[derive(Debug, Deserialize)]
pub(crate) struct PickupTypeEntry {
    #[serde(rename = "_pickupTypeText")]
    pickup_type_text: String,
    #[serde(rename = "pickupDates", default)]
    pickup_dates: Vec<String>,
}

/// Decode a response body and return its `dataList`, empty when missing or null.
pub(crate) fn decode_data_list<T: DeserializeOwned>(payload: &[u8]) -> Result<Vec<T>, AvriError> {
    let envelope: Envelope<T> = serde_json::from_slice(payload)?;
    Ok(envelope.data_list.unwrap_or_default())
}

/// Flatten pickup types into one record per date, keeping input order.
pub(crate) fn records_from_entries(
    entries: Vec<PickupTypeEntry>,
) -> Result<Vec<PickupRecord>, AvriError> {
    let mut records = Vec::new();

    for entry in entries {
        for raw in entry.pickup_dates {
            let day = parse_pickup_date(&raw)?;
            records.push(PickupRecord::new(entry.pickup_type_text.clone(), day));
        }
    }

    Ok(records)
}

/// Parse a full `/GetCalendar` response body into pickup records.
///
/// An empty or missing `dataList` yields no records.
///
/// # Errors
///
/// Returns [`AvriError::Json`] for malformed bodies and [`AvriError::InvalidDate`]
/// when a pickup date does not match `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_calendar(payload: &[u8]) -> Result<Vec<PickupRecord>, AvriError> {
    records_from_entries(decode_data_list(payload)?)
}

fn parse_pickup_date(raw: &str) -> Result<NaiveDateTime, AvriError> {
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT).map_err(|source| AvriError::InvalidDate {
        value: raw.to_owned(),
        source,
    })
}
