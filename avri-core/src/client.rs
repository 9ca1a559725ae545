//! Stateful client fetching, caching, and querying the pickup schedule of one address.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::{ScheduleCache, is_stale};
use crate::config::AvriConfig;
use crate::model::{AddressId, ClientIdentity, PickupRecord};
use crate::parser::{self, AddressEntry, PickupTypeEntry};
use crate::ports::{AvriError, Clock, SystemClock, TlsVerification, Transport, TransportFailure};
use crate::query;

const FETCH_ADDRESS_ENDPOINT: &str = "FetchAdress";
const CALENDAR_ENDPOINT: &str = "GetCalendar";
const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

/// Client for the pickup schedule of a single household.
///
/// The schedule is fetched lazily on the first query and kept in memory until it
/// is older than [`AvriConfig::cache_ttl`]. Methods that may refresh take
/// `&mut self`; callers sharing a client between tasks must wrap it in their own
/// lock.
pub struct AvriClient {
    identity: ClientIdentity,
    config: AvriConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    cache: Option<ScheduleCache>,
}

impl AvriClient {
    /// Create a client for the given address with the default Avri settings.
    #[must_use]
    pub fn new(postal_code: &str, house_number: &str, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(postal_code, house_number, transport, AvriConfig::default())
    }

    /// Create a client for the given address with custom settings.
    #[must_use]
    pub fn with_config(
        postal_code: &str,
        house_number: &str,
        transport: Arc<dyn Transport>,
        config: AvriConfig,
    ) -> Self {
        Self {
            identity: ClientIdentity::new(postal_code, house_number, &config.company_code),
            config,
            transport,
            clock: Arc::new(SystemClock),
            cache: None,
        }
    }

    /// Replace the clock used for cache expiry and default thresholds.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Address and tenant this client requests schedules for.
    #[must_use]
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// When the cached schedule was fetched, if it has been fetched at all.
    #[must_use]
    pub fn last_refreshed(&self) -> Option<NaiveDateTime> {
        self.cache.as_ref().map(ScheduleCache::fetched_at)
    }

    /// All known pickups in schedule order, fetching them when the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns [`AvriError::NotFound`] when the address or its calendar is unknown,
    /// [`AvriError::Transport`] when the service cannot be reached, and a parse error
    /// when the response cannot be understood. The previous cache is kept on error.
    pub async fn pickup_dates(&mut self) -> Result<&[PickupRecord], AvriError> {
        let now = self.clock.now();
        if is_stale(self.cache.as_ref(), now, self.config.cache_ttl()) {
            self.refresh().await?;
        } else {
            debug!(identity = %self.identity, "using cached pickup schedule");
        }

        Ok(self
            .cache
            .as_ref()
            .map(ScheduleCache::records)
            .unwrap_or_default())
    }

    /// Fetch the schedule now, regardless of the cache age.
    ///
    /// # Errors
    ///
    /// See [`AvriClient::pickup_dates`].
    pub async fn refresh(&mut self) -> Result<(), AvriError> {
        let address_id = self.resolve_address_id().await?;
        let records = self.fetch_calendar(&address_id).await?;
        let fetched_at = self.clock.now();

        info!(
            identity = %self.identity,
            address_id = %address_id,
            pickups = records.len(),
            "refreshed pickup schedule"
        );

        self.cache = Some(ScheduleCache::new(records, fetched_at));
        Ok(())
    }

    /// Earliest pickup on or after `threshold`, defaulting to the start of today.
    ///
    /// # Errors
    ///
    /// See [`AvriClient::pickup_dates`].
    pub async fn upcoming(
        &mut self,
        threshold: Option<NaiveDateTime>,
    ) -> Result<Option<PickupRecord>, AvriError> {
        let threshold = self.threshold_or_today(threshold);
        let records = self.pickup_dates().await?;
        Ok(query::upcoming(records, threshold))
    }

    /// Earliest pickup of every waste type on or after `threshold`, ordered by day.
    ///
    /// The threshold defaults to the start of today.
    ///
    /// # Errors
    ///
    /// See [`AvriClient::pickup_dates`].
    pub async fn upcoming_of_each(
        &mut self,
        threshold: Option<NaiveDateTime>,
    ) -> Result<Vec<PickupRecord>, AvriError> {
        let threshold = self.threshold_or_today(threshold);
        let records = self.pickup_dates().await?;
        Ok(query::upcoming_of_each(records, threshold))
    }

    /// Every pickup from this moment on, ordered by day.
    ///
    /// # Errors
    ///
    /// See [`AvriClient::pickup_dates`].
    pub async fn all_upcoming(&mut self) -> Result<Vec<PickupRecord>, AvriError> {
        let now = self.clock.now();
        let records = self.pickup_dates().await?;
        Ok(query::all_upcoming(records, now))
    }

    fn threshold_or_today(&self, threshold: Option<NaiveDateTime>) -> NaiveDateTime {
        threshold.unwrap_or_else(|| query::start_of_day(self.clock.now()))
    }

    async fn resolve_address_id(&self) -> Result<AddressId, AvriError> {
        let form = [
            ("postCode", self.identity.postal_code().to_owned()),
            ("houseNumber", self.identity.house_number().to_owned()),
            ("companyCode", self.identity.company_code().to_owned()),
        ];

        let matches = self.post::<AddressEntry>(FETCH_ADDRESS_ENDPOINT, &form).await?;
        if matches.len() > 1 {
            debug!(
                identity = %self.identity,
                matches = matches.len(),
                "address lookup returned several matches, using the first"
            );
        }

        matches
            .into_iter()
            .next()
            .map(AddressId::from)
            .ok_or_else(|| self.not_found())
    }

    async fn fetch_calendar(&self, address_id: &AddressId) -> Result<Vec<PickupRecord>, AvriError> {
        let today = self.clock.now().date();
        let form = [
            ("companyCode", self.identity.company_code().to_owned()),
            ("startDate", today.format(REQUEST_DATE_FORMAT).to_string()),
            (
                "endDate",
                self.config.end_date.format(REQUEST_DATE_FORMAT).to_string(),
            ),
            ("community", self.config.community.clone()),
            ("uniqueAddressID", address_id.0.clone()),
        ];

        let entries = self.post::<PickupTypeEntry>(CALENDAR_ENDPOINT, &form).await?;
        if entries.is_empty() {
            return Err(self.not_found());
        }

        parser::records_from_entries(entries)
    }

    /// POST with certificate verification, retrying once without it when enabled.
    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, String)],
    ) -> Result<Vec<T>, AvriError> {
        let url = self.config.endpoint(endpoint);

        let payload = match self
            .transport
            .post_form(&url, form, TlsVerification::Strict)
            .await
        {
            Ok(payload) => payload,
            Err(TransportFailure::Tls(source)) if self.config.insecure_tls_fallback => {
                warn!(
                    url = %url,
                    error = %source,
                    "certificate verification failed, retrying once without verification"
                );
                self.transport
                    .post_form(&url, form, TlsVerification::Relaxed)
                    .await?
            }
            Err(failure) => return Err(failure.into()),
        };

        parser::decode_data_list(&payload)
    }

    fn not_found(&self) -> AvriError {
        warn!(identity = %self.identity, "no data found for address");
        AvriError::NotFound {
            postal_code: self.identity.postal_code().to_owned(),
            house_number: self.identity.house_number().to_owned(),
        }
    }
}
