//! Service endpoints, tenant constants, and cache settings.

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

/// Base URL of the Ximmio waste API.
pub const DEFAULT_BASE_URL: &str = "https://wasteapi.ximmio.com/api";
/// Company code identifying Avri on the Ximmio API.
pub const AVRI_COMPANY_CODE: &str = "f7a74ad1-fdbf-4a43-9f91-44644f4d4222";
/// Community sent with calendar requests.
pub const DEFAULT_COMMUNITY: &str = "Avri";
/// Days a fetched schedule stays valid.
pub const DEFAULT_CACHE_TTL_DAYS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Settings for an [`AvriClient`](crate::client::AvriClient).
///
/// Every field is optional when deserialized; missing fields take the
/// defaults for the Avri tenant.
pub struct AvriConfig {
    /// Base URL the endpoint names are appended to.
    pub base_url: String,
    /// Tenant code sent as `companyCode`.
    pub company_code: String,
    /// Value sent as `community` with calendar requests.
    pub community: String,
    /// Last day requested from the calendar endpoint.
    pub end_date: NaiveDate,
    /// Maximum age of cached pickups before they are fetched again.
    pub cache_ttl_days: u32,
    /// Retry once without certificate verification when TLS verification fails.
    pub insecure_tls_fallback: bool,
}

impl AvriConfig {
    /// Cache lifetime as a duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::days(i64::from(self.cache_ttl_days))
    }

    /// Full URL for an endpoint below [`AvriConfig::base_url`].
    #[must_use]
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for AvriConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            company_code: AVRI_COMPANY_CODE.to_owned(),
            community: DEFAULT_COMMUNITY.to_owned(),
            end_date: NaiveDate::from_ymd_opt(2100, 1, 1).unwrap_or(NaiveDate::MAX),
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
            insecure_tls_fallback: false,
        }
    }
}
