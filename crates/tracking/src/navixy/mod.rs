//! Navixy API integration
//!
//! This module provides:
//! - Credential resolution and auth strategies
//! - An HTTP transport seam with a `ureq` implementation
//! - The authenticated request client (params auth with header fallback)
//! - Roster, state and zone fetching
//! - Response normalization to domain models

mod auth;
mod client;
mod fetch;
mod normalize;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthStrategy, Credentials, resolve};
pub use client::RequestClient;
pub use fetch::TrackerFetcher;
pub use normalize::{normalize_state, normalize_tracker, normalize_zone};
pub use transport::{HttpRequest, Method, Transport, UreqTransport};

/// Navixy API response types
pub mod api {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::models::{TrackerId, ZoneId};

    /// Response from `POST /tracker/list`
    #[derive(Debug, Deserialize)]
    pub struct ListTrackersResponse {
        pub list: Option<Vec<ApiTracker>>,
    }

    /// Tracker entry in the roster
    #[derive(Debug, Deserialize)]
    pub struct ApiTracker {
        pub id: TrackerId,
        #[serde(default, deserialize_with = "lenient")]
        pub label: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        pub name: Option<String>,
    }

    /// Single tracker state from `POST /tracker/get_states`
    ///
    /// Every field is decoded leniently: a value of the wrong JSON type reads
    /// as absent instead of failing the whole entry.
    #[derive(Debug, Default, Deserialize)]
    pub struct ApiState {
        #[serde(default, deserialize_with = "lenient")]
        pub gps: Option<ApiGps>,
        #[serde(default, deserialize_with = "lenient")]
        pub updated: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        pub zone_ids: Option<Vec<ZoneId>>,
    }

    /// GPS block of a tracker state
    #[derive(Debug, Default, Deserialize)]
    pub struct ApiGps {
        #[serde(default, deserialize_with = "lenient")]
        pub location: Option<ApiLocation>,
        #[serde(default, deserialize_with = "lenient")]
        pub speed: Option<f64>,
        #[serde(default, deserialize_with = "lenient")]
        pub updated: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        pub zone_ids: Option<Vec<ZoneId>>,
    }

    /// Coordinates; either may be missing on a partial fix
    #[derive(Debug, Default, Deserialize)]
    pub struct ApiLocation {
        #[serde(default, deserialize_with = "lenient")]
        pub lat: Option<f64>,
        #[serde(default, deserialize_with = "lenient")]
        pub lng: Option<f64>,
    }

    /// Decode `T` if the value has the right shape, otherwise `None`
    fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).ok())
    }

    /// Response from `GET /zone/list`
    #[derive(Debug, Deserialize)]
    pub struct ListZonesResponse {
        pub list: Option<Vec<ApiZone>>,
    }

    /// Geofence zone entry
    #[derive(Debug, Deserialize)]
    pub struct ApiZone {
        pub id: ZoneId,
        #[serde(default, deserialize_with = "lenient")]
        pub label: Option<String>,
    }
}
