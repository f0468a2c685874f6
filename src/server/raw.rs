use bytes::Bytes;
use dropshot::{Body, HttpCodedResponse, HttpError};
use http::{Response, StatusCode};

/// Content type of the prometheus-client text encoding.
const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Return an HTTP Response OK, with an OpenMetrics text body.
pub struct MetricsResponseOk(pub String);

impl HttpCodedResponse for MetricsResponseOk {
    type Body = String;

    const STATUS_CODE: StatusCode = StatusCode::OK;
    const DESCRIPTION: &'static str = "successful operation";
}

impl From<MetricsResponseOk> for Result<Response<Body>, HttpError> {
    fn from(metrics: MetricsResponseOk) -> Result<Response<Body>, HttpError> {
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)
            .body(Body::from(metrics.0))?)
    }
}

/// Return an HTTP Response OK, with image bytes.
pub struct ImageResponseOk {
    /// Image data.
    pub bytes: Bytes,

    /// Content type; `application/octet-stream` when unknown.
    pub content_type: Option<String>,
}

impl HttpCodedResponse for ImageResponseOk {
    type Body = Vec<u8>;

    const STATUS_CODE: StatusCode = StatusCode::OK;
    const DESCRIPTION: &'static str = "successful operation";
}

impl From<ImageResponseOk> for Result<Response<Body>, HttpError> {
    fn from(image: ImageResponseOk) -> Result<Response<Body>, HttpError> {
        let content_type = image
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_owned());

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(Body::with_content(image.bytes))?)
    }
}
