use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures of a single API round-trip, or of an action blocked before one.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("network error: {0}")]
    Network(String),

    #[error("server responded with status {status} for {url}")]
    Http { status: u16, url: String },

    #[error("invalid json for {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures while wiring the client into the page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("missing page element: {0}")]
    MissingElement(&'static str),

    #[error("invalid api url {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("javascript error: {0}")]
    Js(String),
}

impl PageError {
    pub fn js(value: JsValue) -> Self {
        PageError::Js(format!("{:?}", value))
    }
}

impl From<PageError> for JsValue {
    fn from(err: PageError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
