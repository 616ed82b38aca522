use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error("Invalid URL: {url}")]
    #[diagnostic(code(pkgsync_dl::invalid_url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme `{scheme}` in {url}")]
    #[diagnostic(
        code(pkgsync_dl::unsupported_scheme),
        help("Only http:// and https:// repositories are supported")
    )]
    UnsupportedScheme { scheme: String, url: String },

    #[error(transparent)]
    #[diagnostic(
        code(pkgsync_dl::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(pkgsync_dl::http_error))]
    HttpError { status: u16, url: String },

    #[error("Authentication failed for {url} (HTTP {status})")]
    #[diagnostic(
        code(pkgsync_dl::unauthorized),
        help("Check the username and password for this repository\n{body}")
    )]
    Unauthorized {
        url: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    #[diagnostic(code(pkgsync_dl::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid response from server: {0}")]
    #[diagnostic(code(pkgsync_dl::invalid_response))]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl From<ureq::Error> for DownloadError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}
