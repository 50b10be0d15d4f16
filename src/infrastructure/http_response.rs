// HTTP response utilities for JSON downloads
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
};
use bytes::Bytes;
use serde::Serialize;

/// Serialize `data` as a JSON attachment the browser saves as `file_name`.
pub fn json_download_response<T: Serialize>(
    data: &T,
    file_name: &str,
) -> Result<Response<Body>, StatusCode> {
    let body = serde_json::to_vec(data).map(Bytes::from).map_err(|e| {
        tracing::error!("JSON serialization error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        .map_err(|e| {
            tracing::error!("Invalid download file name {:?}: {}", file_name, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, HeaderValue::from(body.len()))
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(body))
        .map_err(|e| {
            tracing::error!("Response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::history_file::{SavedHistory, SavedReading};

    #[test]
    fn test_download_headers() {
        let saved = SavedHistory {
            probe_readings: vec![SavedReading {
                ts: 1,
                probes: vec![Some(20.0), None],
            }],
        };
        let response = json_download_response(&saved, "ibbq_2024-05-01T18:30:05.json").unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ibbq_2024-05-01T18:30:05.json\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let expected = r#"{"probe_readings":[{"ts":1,"probes":[20.0,null]}]}"#;
        assert_eq!(response.headers()[header::CONTENT_LENGTH], expected.len().to_string().as_str());
    }
}
