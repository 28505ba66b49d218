use poll_promise::Promise;
use serde::de::DeserializeOwned;

/// Errors from talking to the export service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never completed (DNS, connection refused, ...).
    #[error("{0}")]
    Transport(String),
    /// Non-success status; the message is the response body when the service
    /// sent one, otherwise `HTTP <status>`.
    #[error("{0}")]
    Status(String),
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Issues a GET and resolves to the JSON-decoded body.
///
/// The promise asks for a repaint when it settles so the UI picks the result
/// up on the next frame even if nothing else is animating.
pub fn fetch_json<T>(ctx: &egui::Context, url: String) -> Promise<Result<T, ClientError>>
where
    T: DeserializeOwned + Send + 'static,
{
    let request = ehttp::Request::get(url);

    #[cfg(not(target_arch = "wasm32"))]
    {
        let ctx = ctx.clone();
        Promise::spawn_thread("ehttp_fetch", move || {
            let result =
                futures::executor::block_on(async { decode(ehttp::fetch_async(request).await) });
            ctx.request_repaint();
            result
        })
    }

    #[cfg(target_arch = "wasm32")]
    {
        let ctx = ctx.clone();
        Promise::spawn_async(async move {
            let result = decode(ehttp::fetch_async(request).await);
            ctx.request_repaint();
            result
        })
    }
}

fn decode<T: DeserializeOwned>(
    response: ehttp::Result<ehttp::Response>,
) -> Result<T, ClientError> {
    let response = response.map_err(ClientError::Transport)?;
    if !response.ok {
        let body = response.text().map(str::trim).unwrap_or("");
        let message = if body.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            body.to_owned()
        };
        return Err(ClientError::Status(message));
    }
    Ok(serde_json::from_slice(&response.bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::DownloadResponse;

    fn response(status: u16, ok: bool, body: &str) -> ehttp::Response {
        ehttp::Response {
            url: "http://localhost/api/download".to_owned(),
            ok,
            status,
            status_text: String::new(),
            headers: ehttp::Headers::new(&[]),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn error_status_surfaces_body_text() {
        let err = decode::<DownloadResponse>(Ok(response(400, false, "quota exceeded")))
            .unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn error_status_with_empty_body_falls_back_to_http_code() {
        let err = decode::<DownloadResponse>(Ok(response(500, false, ""))).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn success_decodes_payload() {
        let body = r#"{"cached":true,"download_url":"/f/x.csv","rows":42}"#;
        let decoded = decode::<DownloadResponse>(Ok(response(200, true, body))).unwrap();
        assert!(decoded.cached);
        assert_eq!(decoded.download_url, "/f/x.csv");
        assert_eq!(decoded.rows, Some(42));
    }

    #[test]
    fn transport_failure_is_reported_verbatim() {
        let err =
            decode::<DownloadResponse>(Err("connection refused".to_owned())).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.to_string(), "connection refused");
    }
}
