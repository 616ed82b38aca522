use std::{
    fs::File,
    io::{BufWriter, Read as _, Write as _},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    auth::Credentials,
    error::Result,
    transport::{ensure_success, Transport},
};

pub const BUFFER_SIZE: usize = 8192;

/// A single file download through a [`Transport`].
pub struct Download {
    pub url: String,
    pub output: PathBuf,
    pub credentials: Option<Credentials>,
}

impl Download {
    /// Creates a download of `url` into the file at `output`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkgsync_dl::download::Download;
    ///
    /// let dl = Download::new(
    ///     "https://files.example.com/pkg-1.0.tar.gz",
    ///     "/tmp/pkg-1.0.tar.gz",
    /// );
    /// ```
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            credentials: None,
        }
    }

    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Streams the response body to the output path and returns that path.
    ///
    /// # Errors
    ///
    /// * [`crate::error::DownloadError::Unauthorized`] on 401/403.
    /// * [`crate::error::DownloadError::HttpError`] on any other non-2xx status.
    /// * [`crate::error::DownloadError::Io`] if the file cannot be written.
    pub fn execute(self, transport: &dyn Transport) -> Result<PathBuf> {
        let output_path = self.output;
        let resp = transport.get(&self.url, self.credentials.as_ref())?;
        let resp = ensure_success(&self.url, resp)?;

        let written = write_body(resp.body, &output_path)?;
        debug!("downloaded {} bytes to {}", written, output_path.display());

        Ok(output_path)
    }
}

fn write_body(mut reader: Box<dyn std::io::Read + Send>, path: &Path) -> Result<u64> {
    let mut file = BufWriter::new(File::create(path)?);
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut written = 0u64;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        written += n as u64;
    }

    file.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{error::DownloadError, transport::TransportResponse};

    struct StaticTransport {
        status: u16,
        body: &'static [u8],
        seen_auth: Mutex<Option<String>>,
    }

    impl Transport for StaticTransport {
        fn get(&self, _url: &str, credentials: Option<&Credentials>) -> Result<TransportResponse> {
            *self.seen_auth.lock().unwrap() = credentials.map(Credentials::header_value);
            Ok(TransportResponse::from_bytes(self.status, self.body))
        }

        fn post(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            _body: &[u8],
        ) -> Result<TransportResponse> {
            unreachable!()
        }
    }

    #[test]
    fn test_download_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let transport = StaticTransport {
            status: 200,
            body: b"loldongs\n",
            seen_auth: Mutex::new(None),
        };

        let path = Download::new(
            "https://files.example.com/pkg-1.0.tar.gz",
            dir.path().join("pkg-1.0.tar.gz"),
        )
        .credentials(Some(Credentials::new("a", "b")))
        .execute(&transport)
        .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"loldongs\n");
        assert_eq!(
            transport.seen_auth.lock().unwrap().as_deref(),
            Some("Basic YTpi")
        );
    }

    #[test]
    fn test_download_http_error_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let transport = StaticTransport {
            status: 404,
            body: b"",
            seen_auth: Mutex::new(None),
        };
        let output = dir.path().join("pkg-1.0.tar.gz");

        let result =
            Download::new("https://files.example.com/pkg-1.0.tar.gz", &output).execute(&transport);

        assert!(matches!(
            result,
            Err(DownloadError::HttpError { status: 404, .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_download_unauthorized() {
        let transport = StaticTransport {
            status: 401,
            body: b"who are you",
            seen_auth: Mutex::new(None),
        };

        let result = Download::new(
            "https://files.example.com/pkg-1.0.tar.gz",
            "/nonexistent/never-written",
        )
        .execute(&transport);

        assert!(matches!(result, Err(DownloadError::Unauthorized { .. })));
    }
}
