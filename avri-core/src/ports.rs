//! Traits describing the transport and clock seams, plus the shared error types.

use std::error::Error as StdError;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, ParseError as ChronoParseError};
use serde_json::Error as JsonError;

/// Boxed cause carried by a [`TransportFailure`].
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(thiserror::Error, Debug)]
/// Failure reported by a [`Transport`] implementation.
pub enum TransportFailure {
    /// The server certificate could not be verified.
    #[error("TLS verification failed: {0}")]
    Tls(#[source] BoxError),
    /// Any other failure to obtain a response.
    #[error("Request failed: {0}")]
    Other(#[source] BoxError),
}

#[derive(thiserror::Error, Debug)]
/// Errors surfaced by the Avri client.
pub enum AvriError {
    /// The service returned no data for the address.
    #[error("No data found for {postal_code} {house_number}")]
    NotFound {
        /// Postal code that was looked up.
        postal_code: String,
        /// House number that was looked up.
        house_number: String,
    },
    /// No response could be obtained from the service.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportFailure),
    /// The response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Json(#[from] JsonError),
    /// A pickup date did not match the expected format.
    #[error("Parse error: invalid pickup date {value:?}: {source}")]
    InvalidDate {
        /// Raw date string from the response.
        value: String,
        /// Underlying chrono error.
        source: ChronoParseError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Whether a request must verify the server certificate.
pub enum TlsVerification {
    /// Verify the certificate chain.
    Strict,
    /// Accept any certificate.
    Relaxed,
}

#[async_trait]
/// Performs form-encoded POST requests against the waste service.
pub trait Transport: Send + Sync {
    /// Post `form` to `url` and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFailure::Tls`] when certificate verification fails and
    /// [`TransportFailure::Other`] for every other failure.
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
        tls: TlsVerification,
    ) -> Result<Vec<u8>, TransportFailure>;
}

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
/// [`Clock`] backed by the system time in the local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
