//! Request descriptors: everything needed to issue one logical call.

use crate::config::ApiHost;
use http::Method;
use std::fmt;

/// Ordered query parameters.
///
/// Order is preserved as inserted, which keeps signatures and test
/// expectations deterministic. Values are sent verbatim; the client does no
/// per-API conversion.
///
/// # Examples
///
/// ```
/// use async_googlemaps::Params;
///
/// let params = Params::new()
///     .param("origin", "Sydney")
///     .param("destination", "Melbourne")
///     .param_list("waypoints", ["Canberra", "Albury"]);
///
/// assert_eq!(
///     params.encode(),
///     "origin=Sydney&destination=Melbourne&waypoints=Canberra&waypoints=Albury"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// An empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.push(key, value);
        self
    }

    /// Appends the parameter only when `value` is `Some`.
    pub fn param_opt<V: fmt::Display>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Appends one parameter per value, repeating the key.
    pub fn param_list<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        let key = key.into();
        for value in values {
            self.push(key.clone(), value);
        }
        self
    }

    /// Appends one parameter whose values are joined with `|`, the list
    /// separator used by `waypoints`, `origins`, `result_type` and most other
    /// multi-valued parameters.
    pub fn param_piped<I, V>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        let joined = values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("|");
        self.param(key, joined)
    }

    /// Appends one parameter in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Appends all of `other`.
    pub fn extend(&mut self, other: Params) {
        self.pairs.extend(other.pairs);
    }

    /// Returns the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Form-encodes the parameters.
    ///
    /// Spaces become `+`; the unreserved characters `A-Z a-z 0-9 - . _ ~` are
    /// left as they are so that signed URLs match what the service verifies.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(&encode_component(key));
            out.push('=');
            out.push_str(&encode_component(value));
        }
        out
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: fmt::Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace("%7E", "~")
}

/// A fully described, not yet authenticated request.
///
/// Built fresh for every logical call and never modified by the client.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// The HTTP method.
    pub method: Method,
    /// The host the path is resolved against.
    pub host: ApiHost,
    /// The request path, starting with `/`.
    pub path: String,
    /// Query parameters, excluding credentials.
    pub params: Params,
    /// JSON body for POST requests.
    pub body: Option<serde_json::Value>,
    /// Whether the API accepts client-ID authentication.
    pub accepts_client_id: bool,
}

impl RequestDescriptor {
    /// A GET request against the Maps host.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            host: ApiHost::Maps,
            path: path.into(),
            params: Params::new(),
            body: None,
            accepts_client_id: true,
        }
    }

    /// A POST request with a JSON body against the Maps host.
    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(path)
        }
    }

    /// Sets the host.
    pub fn host(mut self, host: ApiHost) -> Self {
        self.host = host;
        self
    }

    /// Replaces the query parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Appends one extra query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.push(key, value);
        self
    }

    /// Marks the API as accepting API keys only.
    pub fn key_only(mut self) -> Self {
        self.accepts_client_id = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_keeps_unreserved_characters() {
        let params = Params::new()
            .param("address", "1600 Amphitheatre Pkwy, Mountain View")
            .param("components", "country:US|postal_code:94043")
            .param("tilde", "a~b-c.d_e");

        assert_eq!(
            params.encode(),
            "address=1600+Amphitheatre+Pkwy%2C+Mountain+View\
             &components=country%3AUS%7Cpostal_code%3A94043\
             &tilde=a~b-c.d_e"
        );
    }

    #[test]
    fn test_encoding_utf8() {
        let params = Params::new().param("address", "Zürich");
        assert_eq!(params.encode(), "address=Z%C3%BCrich");
    }

    #[test]
    fn test_param_opt_and_get() {
        let params = Params::new()
            .param_opt("language", Some("en"))
            .param_opt("region", None::<&str>)
            .param("mode", "walking");

        assert_eq!(params.get("language"), Some("en"));
        assert_eq!(params.get("region"), None);
        assert_eq!(params.iter().count(), 2);
    }

    #[test]
    fn test_piped_and_repeated_lists() {
        let params = Params::new()
            .param_piped("origins", ["Vancouver BC", "Seattle"])
            .param_list("markers", ["color:blue|Sydney", "Parramatta"]);

        assert_eq!(params.get("origins"), Some("Vancouver BC|Seattle"));
        assert_eq!(params.iter().filter(|(k, _)| *k == "markers").count(), 2);
    }

    #[test]
    fn test_collect_preserves_order() {
        let params: Params = vec![("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(params.encode(), "b=2&a=1");
    }

    #[test]
    fn test_descriptor_builders() {
        let descriptor = RequestDescriptor::post_json(
            "/geolocation/v1/geolocate",
            serde_json::json!({"considerIp": true}),
        )
        .host(ApiHost::Geolocation)
        .key_only()
        .param("extra", "1");

        assert_eq!(descriptor.method, Method::POST);
        assert_eq!(descriptor.host, ApiHost::Geolocation);
        assert!(!descriptor.accepts_client_id);
        assert_eq!(descriptor.params.get("extra"), Some("1"));
        assert!(descriptor.body.is_some());
    }
}
