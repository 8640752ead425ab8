//! One awaitable method per Maps web-service operation.
//!
//! Every method takes the operation's query parameters as a [`Params`] bag,
//! builds a [`RequestDescriptor`] for the right host and path, and forwards it
//! to [`Client::request`]. Parameter names and values are those documented
//! for each web service; they are sent verbatim and the decoded body is
//! returned untouched.

use crate::{
    extract::{BinaryBody, GeolocationBody, JsonObject, RoadsBody, StatusBody},
    ApiHost, Client, Params, RequestDescriptor, Response, Result,
};
use bytes::Bytes;

/// Path of the Directions API.
pub const DIRECTIONS_PATH: &str = "/maps/api/directions/json";
/// Path of the Distance Matrix API.
pub const DISTANCE_MATRIX_PATH: &str = "/maps/api/distancematrix/json";
/// Path of the Elevation API.
pub const ELEVATION_PATH: &str = "/maps/api/elevation/json";
/// Path of the Geocoding API.
pub const GEOCODE_PATH: &str = "/maps/api/geocode/json";
/// Path of the Geolocation API, on the Geolocation host.
pub const GEOLOCATE_PATH: &str = "/geolocation/v1/geolocate";
/// Path of the Time Zone API.
pub const TIMEZONE_PATH: &str = "/maps/api/timezone/json";
/// Path of Roads snap-to-roads, on the Roads host.
pub const SNAP_TO_ROADS_PATH: &str = "/v1/snapToRoads";
/// Path of Roads nearest-roads, on the Roads host.
pub const NEAREST_ROADS_PATH: &str = "/v1/nearestRoads";
/// Path of Roads speed limits, on the Roads host.
pub const SPEED_LIMITS_PATH: &str = "/v1/speedLimits";
/// Path of Places find-place-from-text.
pub const FIND_PLACE_PATH: &str = "/maps/api/place/findplacefromtext/json";
/// Path of Places text search.
pub const PLACES_TEXT_SEARCH_PATH: &str = "/maps/api/place/textsearch/json";
/// Path of Places nearby search.
pub const PLACES_NEARBY_PATH: &str = "/maps/api/place/nearbysearch/json";
/// Path of Place details.
pub const PLACE_DETAILS_PATH: &str = "/maps/api/place/details/json";
/// Path of Place photos.
pub const PLACES_PHOTO_PATH: &str = "/maps/api/place/photo";
/// Path of Places autocomplete.
pub const PLACES_AUTOCOMPLETE_PATH: &str = "/maps/api/place/autocomplete/json";
/// Path of Places query autocomplete.
pub const PLACES_QUERY_AUTOCOMPLETE_PATH: &str = "/maps/api/place/queryautocomplete/json";
/// Path of the Maps Static API.
pub const STATIC_MAP_PATH: &str = "/maps/api/staticmap";

impl Client {
    async fn maps_json(&self, path: &str, params: Params) -> Result<Response<JsonObject>> {
        let descriptor = RequestDescriptor::get(path).params(params);
        self.request(&descriptor, &StatusBody).await
    }

    async fn roads_json(&self, path: &str, params: Params) -> Result<Response<JsonObject>> {
        let descriptor = RequestDescriptor::get(path)
            .host(ApiHost::Roads)
            .key_only()
            .params(params);
        self.request(&descriptor, &RoadsBody).await
    }

    async fn maps_binary(&self, path: &str, params: Params) -> Result<Response<Bytes>> {
        let descriptor = RequestDescriptor::get(path).params(params);
        self.request(&descriptor, &BinaryBody).await
    }

    /// Directions between locations (`origin`, `destination`, `mode`,
    /// `waypoints`, ...).
    pub async fn directions(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(DIRECTIONS_PATH, params).await
    }

    /// Travel distance and time for a matrix of `origins` and `destinations`.
    pub async fn distance_matrix(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(DISTANCE_MATRIX_PATH, params).await
    }

    /// Elevation at the given `locations`.
    pub async fn elevation(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(ELEVATION_PATH, params).await
    }

    /// Elevation sampled along a `path` (`path`, `samples`).
    pub async fn elevation_along_path(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(ELEVATION_PATH, params).await
    }

    /// Forward geocoding (`address`, `components`, `bounds`, ...).
    pub async fn geocode(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(GEOCODE_PATH, params).await
    }

    /// Reverse geocoding (`latlng` or `place_id`, `result_type`, ...).
    pub async fn reverse_geocode(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(GEOCODE_PATH, params).await
    }

    /// Geolocation from cell towers and WiFi access points.
    ///
    /// `body` is the JSON request document (`considerIp`, `cellTowers`,
    /// `wifiAccessPoints`, ...). Accepts API keys only.
    pub async fn geolocate(&self, body: serde_json::Value) -> Result<Response<JsonObject>> {
        let descriptor = RequestDescriptor::post_json(GEOLOCATE_PATH, body)
            .host(ApiHost::Geolocation)
            .key_only();
        self.request(&descriptor, &GeolocationBody).await
    }

    /// Time zone at a `location` and `timestamp`.
    pub async fn timezone(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(TIMEZONE_PATH, params).await
    }

    /// Snaps a `path` of points to roads. Accepts API keys only.
    pub async fn snap_to_roads(&self, params: Params) -> Result<Response<JsonObject>> {
        self.roads_json(SNAP_TO_ROADS_PATH, params).await
    }

    /// Nearest road segments to `points`. Accepts API keys only.
    pub async fn nearest_roads(&self, params: Params) -> Result<Response<JsonObject>> {
        self.roads_json(NEAREST_ROADS_PATH, params).await
    }

    /// Speed limits for `placeId` values. Accepts API keys only.
    pub async fn speed_limits(&self, params: Params) -> Result<Response<JsonObject>> {
        self.roads_json(SPEED_LIMITS_PATH, params).await
    }

    /// Speed limits along a snapped `path`. Accepts API keys only.
    pub async fn snapped_speed_limits(&self, params: Params) -> Result<Response<JsonObject>> {
        self.roads_json(SPEED_LIMITS_PATH, params).await
    }

    /// Finds a place from text `input` and `inputtype`.
    pub async fn find_place(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(FIND_PLACE_PATH, params).await
    }

    /// Places text search (`query`, `location`, `radius`, `pagetoken`, ...).
    pub async fn places(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(PLACES_TEXT_SEARCH_PATH, params).await
    }

    /// Places nearby search (`location`, `radius` or `rankby`, ...).
    pub async fn places_nearby(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(PLACES_NEARBY_PATH, params).await
    }

    /// Place details for a `place_id`.
    pub async fn place(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(PLACE_DETAILS_PATH, params).await
    }

    /// Raw image bytes of a place photo (`photoreference`, `maxwidth`,
    /// `maxheight`).
    pub async fn places_photo(&self, params: Params) -> Result<Response<Bytes>> {
        self.maps_binary(PLACES_PHOTO_PATH, params).await
    }

    /// Place predictions for partial `input`.
    pub async fn places_autocomplete(&self, params: Params) -> Result<Response<JsonObject>> {
        self.maps_json(PLACES_AUTOCOMPLETE_PATH, params).await
    }

    /// Query predictions for partial `input`.
    pub async fn places_autocomplete_query(
        &self,
        params: Params,
    ) -> Result<Response<JsonObject>> {
        self.maps_json(PLACES_QUERY_AUTOCOMPLETE_PATH, params).await
    }

    /// Raw image bytes of a static map (`size`, `center`, `zoom`, `markers`,
    /// ...).
    pub async fn static_map(&self, params: Params) -> Result<Response<Bytes>> {
        self.maps_binary(STATIC_MAP_PATH, params).await
    }
}
