//! Decoding response bodies into results or errors.
//!
//! Each family of Maps APIs reports failure differently: most embed a
//! `status` field in a 200 response, Roads and Geolocation use HTTP statuses
//! with a nested `error` object, and the image APIs return raw bytes. An
//! [`ExtractBody`] implementation turns one response into either the decoded
//! payload or a classified [`Error`], which the retry loop then inspects.

use crate::transport::HttpResponse;
use crate::{Error, Result};
use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;

/// A decoded JSON object, as returned by the Maps web services.
pub type JsonObject = serde_json::Map<String, Value>;

/// Turns a response into a result.
pub trait ExtractBody: Send + Sync {
    /// The decoded payload type.
    type Output;

    /// Decodes `response`, or classifies it as an error.
    fn extract(&self, response: &HttpResponse) -> Result<Self::Output>;
}

/// Extractor for APIs that report a `status` field in the body.
///
/// `OK` and `ZERO_RESULTS` succeed, `OVER_QUERY_LIMIT` becomes
/// [`Error::OverQueryLimit`], anything else becomes [`Error::Api`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusBody;

impl ExtractBody for StatusBody {
    type Output = JsonObject;

    fn extract(&self, response: &HttpResponse) -> Result<JsonObject> {
        if response.status != StatusCode::OK {
            return Err(http_error(response));
        }

        let body = parse_object(response)?;
        match body.get("status").and_then(Value::as_str) {
            Some("OK") | Some("ZERO_RESULTS") => Ok(body),
            Some("OVER_QUERY_LIMIT") => Err(Error::OverQueryLimit {
                status: "OVER_QUERY_LIMIT".to_string(),
                message: error_message(&body),
            }),
            Some(status) => Err(Error::Api {
                status: status.to_string(),
                message: error_message(&body),
            }),
            None => Err(Error::DeserializationFailed {
                raw_response: response.text(),
                serde_error: "missing field `status`".to_string(),
                status: response.status,
            }),
        }
    }
}

/// Extractor for the Roads API.
///
/// Errors arrive as `{"error": {"status": ..., "message": ...}}`;
/// `RESOURCE_EXHAUSTED` becomes [`Error::OverQueryLimit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RoadsBody;

impl ExtractBody for RoadsBody {
    type Output = JsonObject;

    fn extract(&self, response: &HttpResponse) -> Result<JsonObject> {
        let body = match parse_object(response) {
            Ok(body) => body,
            Err(_) if response.status != StatusCode::OK => return Err(http_error(response)),
            Err(e) => return Err(e),
        };

        if let Some(error) = body.get("error") {
            let status = error
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN_ERROR")
                .to_string();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);

            return Err(if status == "RESOURCE_EXHAUSTED" {
                Error::OverQueryLimit { status, message }
            } else {
                Error::Api { status, message }
            });
        }

        if response.status != StatusCode::OK {
            return Err(http_error(response));
        }
        Ok(body)
    }
}

/// Extractor for the Geolocation API.
///
/// 200 and 404 (no location found) return the body; 403 becomes
/// [`Error::OverQueryLimit`]; other statuses become [`Error::Api`] with the
/// HTTP status as the status and the first error reason as the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeolocationBody;

impl ExtractBody for GeolocationBody {
    type Output = JsonObject;

    fn extract(&self, response: &HttpResponse) -> Result<JsonObject> {
        let body = parse_object(response)?;
        match response.status.as_u16() {
            200 | 404 => Ok(body),
            code => {
                let reason = body
                    .get("error")
                    .and_then(|e| e.get("errors"))
                    .and_then(|e| e.get(0))
                    .and_then(|e| e.get("reason"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let status = code.to_string();
                if code == 403 {
                    Err(Error::OverQueryLimit {
                        status,
                        message: reason,
                    })
                } else {
                    Err(Error::Api {
                        status,
                        message: reason,
                    })
                }
            }
        }
    }
}

/// Extractor for image APIs (Maps Static, Place Photo).
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryBody;

impl ExtractBody for BinaryBody {
    type Output = Bytes;

    fn extract(&self, response: &HttpResponse) -> Result<Bytes> {
        if response.status != StatusCode::OK {
            return Err(http_error(response));
        }
        Ok(response.body.clone())
    }
}

/// Extractor that deserializes any 2xx JSON body into `T`.
///
/// Useful for calling endpoints this crate has no dedicated method for.
pub struct JsonBody<T>(std::marker::PhantomData<fn() -> T>);

impl<T> JsonBody<T> {
    /// Creates the extractor.
    pub fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<T> Default for JsonBody<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ExtractBody for JsonBody<T>
where
    T: serde::de::DeserializeOwned,
{
    type Output = T;

    fn extract(&self, response: &HttpResponse) -> Result<T> {
        if !response.status.is_success() {
            return Err(http_error(response));
        }
        serde_json::from_slice(&response.body).map_err(|e| deserialization_error(response, e))
    }
}

pub(crate) fn http_error(response: &HttpResponse) -> Error {
    Error::HttpError {
        status: response.status,
        raw_response: response.text(),
        headers: response.headers.clone(),
    }
}

fn deserialization_error(response: &HttpResponse, error: serde_json::Error) -> Error {
    tracing::error!(
        error = %error,
        status = response.status.as_u16(),
        "Failed to deserialize response"
    );
    Error::DeserializationFailed {
        raw_response: response.text(),
        serde_error: error.to_string(),
        status: response.status,
    }
}

fn parse_object(response: &HttpResponse) -> Result<JsonObject> {
    serde_json::from_slice::<JsonObject>(&response.body)
        .map_err(|e| deserialization_error(response, e))
}

fn error_message(body: &JsonObject) -> Option<String> {
    body.get("error_message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn test_status_body_ok_and_zero_results() {
        let body = StatusBody
            .extract(&response(200, r#"{"status":"OK","results":[]}"#))
            .unwrap();
        assert_eq!(body["status"], "OK");

        assert!(StatusBody
            .extract(&response(200, r#"{"status":"ZERO_RESULTS","results":[]}"#))
            .is_ok());
    }

    #[test]
    fn test_status_body_over_query_limit() {
        let err = StatusBody
            .extract(&response(
                200,
                r#"{"status":"OVER_QUERY_LIMIT","error_message":"slow down"}"#,
            ))
            .unwrap_err();
        match err {
            Error::OverQueryLimit { status, message } => {
                assert_eq!(status, "OVER_QUERY_LIMIT");
                assert_eq!(message.as_deref(), Some("slow down"));
            }
            other => panic!("Expected OverQueryLimit, got {other:?}"),
        }
    }

    #[test]
    fn test_status_body_api_error() {
        let err = StatusBody
            .extract(&response(200, r#"{"status":"REQUEST_DENIED"}"#))
            .unwrap_err();
        assert!(matches!(err, Error::Api { ref status, message: None } if status == "REQUEST_DENIED"));
    }

    #[test]
    fn test_status_body_http_and_malformed() {
        let err = StatusBody.extract(&response(400, "bad")).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.raw_response(), Some("bad"));

        let err = StatusBody.extract(&response(200, "<html>")).unwrap_err();
        assert!(matches!(err, Error::DeserializationFailed { .. }));

        let err = StatusBody.extract(&response(200, r#"{"results":[]}"#)).unwrap_err();
        assert!(matches!(err, Error::DeserializationFailed { .. }));
    }

    #[test]
    fn test_roads_body() {
        assert!(RoadsBody
            .extract(&response(200, r#"{"snappedPoints":[]}"#))
            .is_ok());

        let err = RoadsBody
            .extract(&response(
                429,
                r#"{"error":{"status":"RESOURCE_EXHAUSTED","message":"quota"}}"#,
            ))
            .unwrap_err();
        assert!(matches!(err, Error::OverQueryLimit { .. }));

        let err = RoadsBody
            .extract(&response(
                400,
                r#"{"error":{"status":"INVALID_ARGUMENT","message":"bad path"}}"#,
            ))
            .unwrap_err();
        assert!(matches!(err, Error::Api { ref status, .. } if status == "INVALID_ARGUMENT"));

        let err = RoadsBody.extract(&response(502, "gateway")).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));

        let err = RoadsBody.extract(&response(200, "garbage")).unwrap_err();
        assert!(matches!(err, Error::DeserializationFailed { .. }));
    }

    #[test]
    fn test_geolocation_body() {
        assert!(GeolocationBody
            .extract(&response(200, r#"{"location":{"lat":1.0,"lng":2.0}}"#))
            .is_ok());
        assert!(GeolocationBody
            .extract(&response(404, r#"{"error":{"errors":[{"reason":"notFound"}]}}"#))
            .is_ok());

        let err = GeolocationBody
            .extract(&response(
                403,
                r#"{"error":{"errors":[{"reason":"dailyLimitExceeded"}]}}"#,
            ))
            .unwrap_err();
        match err {
            Error::OverQueryLimit { status, message } => {
                assert_eq!(status, "403");
                assert_eq!(message.as_deref(), Some("dailyLimitExceeded"));
            }
            other => panic!("Expected OverQueryLimit, got {other:?}"),
        }

        let err = GeolocationBody
            .extract(&response(400, r#"{"error":{}}"#))
            .unwrap_err();
        assert!(matches!(err, Error::Api { ref status, message: None } if status == "400"));
    }

    #[test]
    fn test_binary_body() {
        let bytes = BinaryBody.extract(&response(200, "\u{89}PNG")).unwrap();
        assert!(bytes.ends_with(b"PNG"));
        assert!(BinaryBody.extract(&response(403, "denied")).is_err());
    }

    #[test]
    fn test_json_body() {
        #[derive(serde::Deserialize)]
        struct Zone {
            #[serde(rename = "timeZoneId")]
            time_zone_id: String,
        }

        let zone: Zone = JsonBody::new()
            .extract(&response(200, r#"{"timeZoneId":"Australia/Sydney"}"#))
            .unwrap();
        assert_eq!(zone.time_zone_id, "Australia/Sydney");
    }
}
