use url::Url;
use web_sys::Element;

use crate::error::PageError;

pub const DEFAULT_API_URL: &'static str = "http://localhost:5000";
pub const SEARCH_DEBOUNCE_MS: u32 = 500;

pub const API_URL_ATTRIBUTE: &'static str = "data-api-url";
pub const SEARCH_DEBOUNCE_ATTRIBUTE: &'static str = "data-search-debounce-ms";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_url: Url,
    pub search_debounce_ms: u32,
}

impl Config {
    pub fn new(api_url: &str) -> Result<Self, PageError> {
        let invalid = |reason: String| PageError::InvalidApiUrl {
            url: api_url.to_owned(),
            reason,
        };

        let parsed = Url::parse(api_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(invalid("expected an http(s) base url".into()));
        }

        Ok(Config {
            api_url: parsed,
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
        })
    }

    /// Reads overrides from data attributes on the given element, usually `<body>`.
    pub fn from_element(element: &Element) -> Result<Self, PageError> {
        let api_url = element
            .get_attribute(API_URL_ATTRIBUTE)
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let debounce = element.get_attribute(SEARCH_DEBOUNCE_ATTRIBUTE);

        Ok(Config::new(&api_url)?.with_debounce_override(debounce.as_deref()))
    }

    fn with_debounce_override(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            match raw.trim().parse::<u32>() {
                Ok(ms) => self.search_debounce_ms = ms,
                Err(err) => log::warn!("ignoring {}={:?}: {}", SEARCH_DEBOUNCE_ATTRIBUTE, raw, err),
            }
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
        }
    }
}
