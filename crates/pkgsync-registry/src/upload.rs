//! Legacy `multipart/form-data` registration and upload.
//!
//! The body is assembled by hand: fields are separated by `\n--<boundary>`, headers and
//! values by a bare `\n\n`. Servers speaking this protocol expect exactly these bytes.

use pkgsync_dl::{auth::Credentials, transport::Transport};
use pkgsync_package::{FieldValue, Payload};
use tracing::debug;

use crate::error::{RegistryError, Result};

pub const BOUNDARY: &str = "--------------GHSKFJDLGDS7543FJKLFHRE75642756743254";

/// Which of the two form posts is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    Upload,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Register => "register",
            Action::Upload => "upload",
        }
    }

    pub fn content_type(&self) -> String {
        match self {
            Action::Register => {
                format!("multipart/form-data; boundary={BOUNDARY}; charset=utf-8")
            }
            Action::Upload => format!("multipart/form-data; boundary={BOUNDARY}"),
        }
    }

    /// `410 Gone` on register means the index no longer wants pre-registration.
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            Action::Register => (200..300).contains(&status) || status == 410,
            Action::Upload => (200..300).contains(&status),
        }
    }
}

fn write_part(body: &mut Vec<u8>, key: &str, filename: Option<&str>, value: &[u8]) {
    body.extend_from_slice(b"\n--");
    body.extend_from_slice(BOUNDARY.as_bytes());
    body.extend_from_slice(b"\nContent-Disposition: form-data; name=\"");
    body.extend_from_slice(key.as_bytes());
    body.push(b'"');
    if let Some(filename) = filename {
        body.extend_from_slice(b";filename=\"");
        body.extend_from_slice(filename.as_bytes());
        body.push(b'"');
    }
    body.extend_from_slice(b"\n\n");
    body.extend_from_slice(value);
    if value.last() == Some(&b'\r') {
        body.push(b'\n');
    }
}

/// Encodes `payload` as a multipart body, in field order.
pub fn encode(payload: &Payload) -> Vec<u8> {
    let mut body = Vec::new();
    for (key, value) in payload.fields() {
        match value {
            FieldValue::Text(text) => write_part(&mut body, key, None, text.as_bytes()),
            FieldValue::Multi(values) => {
                for text in values {
                    write_part(&mut body, key, None, text.as_bytes());
                }
            }
            FieldValue::File { filename, content } => {
                write_part(&mut body, key, Some(filename.as_str()), content)
            }
        }
    }
    body.extend_from_slice(b"\n--");
    body.extend_from_slice(BOUNDARY.as_bytes());
    body.extend_from_slice(b"--\n");
    body
}

/// Posts `payload` to `url` with Basic authentication on the first request.
///
/// # Errors
///
/// * [`RegistryError::Unauthorized`] on 401/403, carrying the response body.
/// * [`RegistryError::UploadRejected`] on any other status the action does not accept.
/// * [`RegistryError::Download`] when the request itself fails.
pub fn send(
    transport: &dyn Transport,
    url: &str,
    credentials: Option<&Credentials>,
    action: Action,
    payload: &Payload,
) -> Result<u16> {
    let body = encode(payload);

    let mut headers = vec![
        ("Content-Type".to_string(), action.content_type()),
        ("Content-Length".to_string(), body.len().to_string()),
    ];
    if let Some(credentials) = credentials {
        headers.push(("Authorization".to_string(), credentials.header_value()));
    }

    debug!("{} {} to {url}", action.as_str(), payload.action().unwrap_or_default());
    let response = transport.post(url, &headers, &body)?;
    let status = response.status;

    if action.accepts(status) {
        debug!("{} accepted by {url} (HTTP {status})", action.as_str());
        return Ok(status);
    }

    let unauthorized = response.is_unauthorized();
    let body = response.into_text().unwrap_or_default();
    if unauthorized {
        return Err(RegistryError::Unauthorized {
            url: url.to_string(),
            status,
            body,
        });
    }

    Err(RegistryError::UploadRejected {
        action: action.as_str().to_string(),
        url: url.to_string(),
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::remote::tests::MapTransport;

    #[test]
    fn test_encode_text_and_multi() {
        let payload = Payload::new()
            .text(":action", "submit")
            .multi("classifiers", vec!["A".into(), "B".into()])
            .multi("provides", vec![]);

        let expected = format!(
            "\n--{b}\nContent-Disposition: form-data; name=\":action\"\n\nsubmit\
             \n--{b}\nContent-Disposition: form-data; name=\"classifiers\"\n\nA\
             \n--{b}\nContent-Disposition: form-data; name=\"classifiers\"\n\nB\
             \n--{b}--\n",
            b = BOUNDARY
        );
        assert_eq!(String::from_utf8(encode(&payload)).unwrap(), expected);
    }

    #[test]
    fn test_encode_file_and_carriage_return() {
        let payload = Payload::new()
            .text("description", "ends with cr\r")
            .file("content", "pkg-1.0.tar.gz", b"\x1f\x8bbinary".to_vec());

        let mut expected = format!(
            "\n--{b}\nContent-Disposition: form-data; name=\"description\"\n\nends with cr\r\n\
             \n--{b}\nContent-Disposition: form-data; name=\"content\";filename=\"pkg-1.0.tar.gz\"\n\n",
            b = BOUNDARY
        )
        .into_bytes();
        expected.extend_from_slice(b"\x1f\x8bbinary");
        expected.extend_from_slice(format!("\n--{BOUNDARY}--\n").as_bytes());

        assert_eq!(encode(&payload), expected);
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode(&Payload::new()), format!("\n--{BOUNDARY}--\n").into_bytes());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            Action::Register.content_type(),
            format!("multipart/form-data; boundary={BOUNDARY}; charset=utf-8")
        );
        assert!(!Action::Upload.content_type().contains("charset"));
    }

    #[test]
    fn test_send_headers() {
        let transport = Arc::new(MapTransport::default());
        let payload = Payload::new().text(":action", "file_upload");
        let credentials = Credentials::new("a", "b");

        let status = send(
            transport.as_ref(),
            "http://pypi.example.com/",
            Some(&credentials),
            Action::Upload,
            &payload,
        )
        .unwrap();
        assert_eq!(status, 200);

        let posts = transport.posts.lock().unwrap();
        let (url, headers, body) = &posts[0];
        assert_eq!(url, "http://pypi.example.com/");
        assert_eq!(body, &encode(&payload));
        assert!(headers.contains(&("Authorization".to_string(), "Basic YTpi".to_string())));
        assert!(headers.contains(&("Content-Length".to_string(), body.len().to_string())));
    }

    #[test]
    fn test_register_accepts_gone() {
        let transport = Arc::new(MapTransport::default());
        transport.post_status.lock().unwrap().extend([410, 410]);
        let payload = Payload::new().text(":action", "submit");

        assert_eq!(
            send(transport.as_ref(), "http://x/", None, Action::Register, &payload).unwrap(),
            410
        );
        assert!(matches!(
            send(transport.as_ref(), "http://x/", None, Action::Upload, &payload),
            Err(RegistryError::UploadRejected { status: 410, .. })
        ));
    }

    #[test]
    fn test_send_unauthorized() {
        let transport = Arc::new(MapTransport::default());
        transport.post_status.lock().unwrap().push(403);
        let payload = Payload::new().text(":action", "file_upload");

        match send(transport.as_ref(), "http://x/", None, Action::Upload, &payload) {
            Err(RegistryError::Unauthorized { status, body, .. }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "response body");
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn test_send_transport_failure() {
        let transport = Arc::new(MapTransport::default());
        transport.post_status.lock().unwrap().push(599);
        let payload = Payload::new();

        assert!(matches!(
            send(transport.as_ref(), "http://x/", None, Action::Upload, &payload),
            Err(RegistryError::Download(_))
        ));
    }
}
