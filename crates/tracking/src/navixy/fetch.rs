//! Roster, state and zone fetching
//!
//! Failures surface to the caller as-is; there is no retry here beyond the
//! client's header-auth fallback.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

use super::api::{ApiState, ListTrackersResponse, ListZonesResponse};
use super::client::RequestClient;
use super::normalize::{normalize_state, normalize_tracker, normalize_zone};
use super::transport::Transport;
use crate::error::RequestError;
use crate::models::{Tracker, TrackerId, TrackerState, Zone};

const TRACKER_LIST_PATH: &str = "/tracker/list";
const TRACKER_STATES_PATH: &str = "/tracker/get_states";
const ZONE_LIST_PATH: &str = "/zone/list";

/// Maximum zones requested per call
const ZONE_LIMIT: u32 = 1000;

/// Fetches tracker data through an authenticated client
pub struct TrackerFetcher<T: Transport> {
    client: RequestClient<T>,
}

impl<T: Transport> TrackerFetcher<T> {
    pub fn new(client: RequestClient<T>) -> Self {
        Self { client }
    }

    /// Fetch the tracker roster
    pub async fn fetch_roster(&self) -> Result<Vec<Tracker>, RequestError> {
        let body = self.client.post(TRACKER_LIST_PATH, Map::new()).await?;
        let response: ListTrackersResponse = decode(TRACKER_LIST_PATH, body)?;

        let trackers: Vec<Tracker> = response
            .list
            .unwrap_or_default()
            .into_iter()
            .map(normalize_tracker)
            .collect();

        debug!("Fetched roster of {} trackers", trackers.len());
        Ok(trackers)
    }

    /// Fetch the latest state for each of `ids`
    ///
    /// An empty id list returns an empty map without issuing a request.
    /// Fields of the wrong type read as absent. Entries that are not objects
    /// are skipped with a warning; the scheduler reports those trackers as
    /// missing data.
    pub async fn fetch_states(
        &self,
        ids: &[TrackerId],
    ) -> Result<HashMap<TrackerId, TrackerState>, RequestError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut payload = Map::new();
        payload.insert(
            "trackers".to_string(),
            Value::Array(ids.iter().map(TrackerId::to_json).collect()),
        );

        let body = self.client.post(TRACKER_STATES_PATH, payload).await?;
        let raw_states = match body.get("states") {
            None | Some(Value::Null) => return Ok(HashMap::new()),
            Some(Value::Object(states)) => states.clone(),
            Some(other) => {
                return Err(RequestError::Decode {
                    path: TRACKER_STATES_PATH.to_string(),
                    message: format!("expected 'states' to be an object, got {}", json_type(other)),
                });
            }
        };

        let mut states = HashMap::with_capacity(raw_states.len());
        for (key, value) in raw_states {
            match serde_json::from_value::<ApiState>(value) {
                Ok(api) => {
                    let id = TrackerId::new(key);
                    states.insert(id.clone(), normalize_state(id, api));
                }
                Err(e) => warn!("Skipping malformed state for tracker {}: {}", key, e),
            }
        }

        debug!("Fetched {} states for {} trackers", states.len(), ids.len());
        Ok(states)
    }

    /// Fetch the account's geofence zones
    pub async fn fetch_zones(&self) -> Result<Vec<Zone>, RequestError> {
        let query = json!({"with_points": false, "limit": ZONE_LIMIT});
        let query = query.as_object().cloned().unwrap_or_default();

        let body = self.client.get(ZONE_LIST_PATH, query).await?;
        let response: ListZonesResponse = decode(ZONE_LIST_PATH, body)?;

        Ok(response
            .list
            .unwrap_or_default()
            .into_iter()
            .map(normalize_zone)
            .collect())
    }
}

fn decode<R: DeserializeOwned>(path: &str, body: Value) -> Result<R, RequestError> {
    serde_json::from_value(body).map_err(|e| RequestError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
