//! Credentials, hosts and other client-wide settings.

use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Header carrying the Maps experience ID.
pub const EXPERIENCE_ID_HEADER: &str = "X-Goog-Maps-Experience-ID";

/// Value of the `User-Agent` header sent with every request.
pub const USER_AGENT: &str = concat!("GoogleGeoApiClientRust/", env!("CARGO_PKG_VERSION"));

/// Default host of the Maps web services.
pub const DEFAULT_MAPS_URL: &str = "https://maps.googleapis.com";
/// Default host of the Roads API.
pub const DEFAULT_ROADS_URL: &str = "https://roads.googleapis.com";
/// Default host of the Geolocation API.
pub const DEFAULT_GEOLOCATION_URL: &str = "https://www.googleapis.com";

/// Environment variable read by [`Credentials::from_env`] for an API key.
pub const ENV_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
/// Environment variable read by [`Credentials::from_env`] for a client ID.
pub const ENV_CLIENT_ID: &str = "GOOGLE_MAPS_CLIENT_ID";
/// Environment variable read by [`Credentials::from_env`] for a channel.
pub const ENV_CHANNEL: &str = "GOOGLE_MAPS_CHANNEL";

/// Computes URL signatures for client-ID (Maps for Work) authentication.
///
/// The client assembles the path and query to be signed, e.g.
/// `/maps/api/geocode/json?address=Sydney&client=gme-acme`, and appends
/// `&signature=<returned value>`. Implementations typically compute a
/// URL-safe base64 HMAC-SHA1 of the input with the decoded client secret.
pub trait RequestSigner: Send + Sync {
    /// Returns the signature for `path_and_query`.
    fn sign(&self, path_and_query: &str) -> Result<String>;
}

impl<F> RequestSigner for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn sign(&self, path_and_query: &str) -> Result<String> {
        self(path_and_query)
    }
}

/// How requests are authenticated.
#[derive(Clone)]
pub enum Credentials {
    /// A Maps API key. Accepted by every API.
    ApiKey(String),
    /// A Maps for Work client ID with a signer holding its secret.
    ClientId {
        /// The client ID, sent as the `client` parameter.
        client_id: String,
        /// Computes the `signature` parameter.
        signer: Arc<dyn RequestSigner>,
        /// Optional tracking channel, sent as the `channel` parameter.
        channel: Option<String>,
        /// Key used for APIs that do not accept client IDs (Roads,
        /// Geolocation).
        api_key: Option<String>,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
            Credentials::ClientId {
                client_id,
                channel,
                api_key,
                ..
            } => f
                .debug_struct("ClientId")
                .field("client_id", client_id)
                .field("signer", &"<signer>")
                .field("channel", channel)
                .field("api_key", &api_key.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

impl Credentials {
    /// Credentials from an API key.
    pub fn api_key(key: impl Into<String>) -> Self {
        Credentials::ApiKey(key.into())
    }

    /// Credentials from a client ID and a signer.
    pub fn client_id(client_id: impl Into<String>, signer: impl RequestSigner + 'static) -> Self {
        Credentials::ClientId {
            client_id: client_id.into(),
            signer: Arc::new(signer),
            channel: None,
            api_key: None,
        }
    }

    /// Sets the tracking channel. Only meaningful for client-ID credentials;
    /// ignored for API keys.
    pub fn with_channel(mut self, value: impl Into<String>) -> Self {
        if let Credentials::ClientId { channel, .. } = &mut self {
            *channel = Some(value.into());
        }
        self
    }

    /// Sets the fallback API key used by APIs that reject client IDs. Only
    /// meaningful for client-ID credentials.
    pub fn with_fallback_key(mut self, key: impl Into<String>) -> Self {
        if let Credentials::ClientId { api_key, .. } = &mut self {
            *api_key = Some(key.into());
        }
        self
    }

    /// Reads an API key from `GOOGLE_MAPS_API_KEY`.
    ///
    /// Client-ID credentials cannot be built from the environment alone since
    /// the signer is supplied by the caller; use
    /// [`Credentials::client_id_from_env`] for those.
    pub fn from_env() -> Result<Self> {
        let key = read_env(ENV_API_KEY)?;
        let credentials = Credentials::api_key(key);
        credentials.validate()?;
        Ok(credentials)
    }

    /// Reads a client ID from `GOOGLE_MAPS_CLIENT_ID` (and an optional
    /// channel from `GOOGLE_MAPS_CHANNEL`) and pairs it with `signer`.
    pub fn client_id_from_env(signer: impl RequestSigner + 'static) -> Result<Self> {
        let client_id = read_env(ENV_CLIENT_ID)?;
        let mut credentials = Credentials::client_id(client_id, signer);
        if let Ok(channel) = read_env(ENV_CHANNEL) {
            credentials = credentials.with_channel(channel);
        }
        credentials.validate()?;
        Ok(credentials)
    }

    /// Checks the credentials without contacting the service.
    ///
    /// API keys must start with `AIza`; channels may only contain ASCII
    /// letters, digits, `.`, `_` and `-`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Credentials::ApiKey(key) => validate_key(key),
            Credentials::ClientId {
                client_id,
                channel,
                api_key,
                ..
            } => {
                if client_id.trim().is_empty() {
                    return Err(Error::ConfigurationError(
                        "Client ID must not be empty".to_string(),
                    ));
                }
                if let Some(channel) = channel {
                    validate_channel(channel)?;
                }
                if let Some(key) = api_key {
                    validate_key(key)?;
                }
                Ok(())
            }
        }
    }
}

fn read_env(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .map_err(|_| Error::ConfigurationError(format!("Missing {name} environment variable")))?;
    if value.trim().is_empty() {
        return Err(Error::ConfigurationError(format!(
            "{name} is set but empty"
        )));
    }
    Ok(value)
}

fn validate_key(key: &str) -> Result<()> {
    if key.starts_with("AIza") {
        Ok(())
    } else {
        Err(Error::ConfigurationError(
            "Invalid API key provided".to_string(),
        ))
    }
}

fn validate_channel(channel: &str) -> Result<()> {
    let valid = channel
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(Error::ConfigurationError(
            "The channel argument must be an ASCII alphanumeric string. \
             The period (.), underscore (_) and hyphen (-) characters are allowed."
                .to_string(),
        ))
    }
}

/// The service host a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiHost {
    /// `maps.googleapis.com`: Directions, Distance Matrix, Elevation,
    /// Geocoding, Time Zone, Places, Maps Static.
    Maps,
    /// `roads.googleapis.com`.
    Roads,
    /// `www.googleapis.com`, for the Geolocation API.
    Geolocation,
}

/// Base URLs for each [`ApiHost`].
#[derive(Debug, Clone)]
pub struct BaseUrls {
    maps: Url,
    roads: Url,
    geolocation: Url,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            maps: Url::parse(DEFAULT_MAPS_URL).expect("default Maps URL is valid"),
            roads: Url::parse(DEFAULT_ROADS_URL).expect("default Roads URL is valid"),
            geolocation: Url::parse(DEFAULT_GEOLOCATION_URL)
                .expect("default Geolocation URL is valid"),
        }
    }
}

impl BaseUrls {
    /// Returns the base URL for `host`.
    pub fn get(&self, host: ApiHost) -> &Url {
        match host {
            ApiHost::Maps => &self.maps,
            ApiHost::Roads => &self.roads,
            ApiHost::Geolocation => &self.geolocation,
        }
    }

    /// Replaces the base URL for `host`.
    pub fn set(&mut self, host: ApiHost, url: Url) {
        match host {
            ApiHost::Maps => self.maps = url,
            ApiHost::Roads => self.roads = url,
            ApiHost::Geolocation => self.geolocation = url,
        }
    }

    /// Points every host at the same URL. Handy for mock servers.
    pub fn all(url: Url) -> Self {
        Self {
            maps: url.clone(),
            roads: url.clone(),
            geolocation: url,
        }
    }
}
