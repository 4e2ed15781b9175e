//! Request and response values seen by the fetch policy.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use nai_core::{CachedResponse, Error};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use url::Url;

/// What kind of resource the page asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// `fetch()` calls and other requests with no declared destination.
    #[default]
    Empty,
    Audio,
    Document,
    Font,
    Frame,
    Iframe,
    Image,
    Manifest,
    Object,
    Script,
    Style,
    Track,
    Video,
    Worker,
}

impl Destination {
    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Empty => "",
            Destination::Audio => "audio",
            Destination::Document => "document",
            Destination::Font => "font",
            Destination::Frame => "frame",
            Destination::Iframe => "iframe",
            Destination::Image => "image",
            Destination::Manifest => "manifest",
            Destination::Object => "object",
            Destination::Script => "script",
            Destination::Style => "style",
            Destination::Track => "track",
            Destination::Video => "video",
            Destination::Worker => "worker",
        }
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Destination::Empty,
            "audio" => Destination::Audio,
            "document" => Destination::Document,
            "font" => Destination::Font,
            "frame" => Destination::Frame,
            "iframe" => Destination::Iframe,
            "image" => Destination::Image,
            "manifest" => Destination::Manifest,
            "object" => Destination::Object,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "track" => Destination::Track,
            "video" => Destination::Video,
            "worker" => Destination::Worker,
            other => return Err(Error::InvalidInput(format!("unknown request destination: {other}"))),
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request mode as set by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl RequestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestMode::Navigate => "navigate",
            RequestMode::SameOrigin => "same-origin",
            RequestMode::NoCors => "no-cors",
            RequestMode::Cors => "cors",
        }
    }
}

impl FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of a response the page may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    Cors,
    Opaque,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
        }
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            other => Err(Error::InvalidInput(format!("unknown response type: {other}"))),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub mode: RequestMode,
    pub destination: Destination,
    pub headers: HeaderMap,
}

impl Request {
    /// Plain `GET` with no destination, as issued by `fetch(url)`.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            mode: RequestMode::default(),
            destination: Destination::default(),
            headers: HeaderMap::new(),
        }
    }

    /// Top-level navigation to a page.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document)
            .with_header(header::ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"))
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the `Accept` header from text.
    pub fn with_accept(self, accept: &str) -> Result<Self, Error> {
        let value = HeaderValue::from_str(accept).map_err(|e| Error::InvalidInput(format!("accept header: {e}")))?;
        Ok(self.with_header(header::ACCEPT, value))
    }

    /// The `Accept` header, or an empty string.
    pub fn accept(&self) -> &str {
        self.headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// A response handed back to the page.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub response_type: ResponseType,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Inline page served when a shell request cannot reach the network.
    pub fn offline_page(url: Url, body: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        Self {
            url,
            status: StatusCode::OK,
            response_type: ResponseType::Basic,
            headers,
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    /// Only complete same-origin responses are worth keeping for offline use.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && self.response_type == ResponseType::Basic
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Storage form, keyed by the URL the request was made for.
    ///
    /// Header values that are not valid UTF-8 are not stored.
    pub fn to_cached(&self, request_url: &Url) -> CachedResponse {
        CachedResponse {
            url: request_url.to_string(),
            status_code: self.status.as_u16(),
            response_type: self.response_type.as_str().to_string(),
            headers: self
                .headers
                .iter()
                .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
                .collect(),
            body: self.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn from_cached(cached: CachedResponse) -> Result<Self, Error> {
        let corrupt = |what: String| Error::CorruptEntry(format!("{}: {what}", cached.url));

        let url = Url::parse(&cached.url).map_err(|e| corrupt(format!("url: {e}")))?;
        let status = StatusCode::from_u16(cached.status_code).map_err(|e| corrupt(format!("status: {e}")))?;
        let response_type = cached.response_type.parse::<ResponseType>().map_err(|e| corrupt(e.to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &cached.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| corrupt(format!("header: {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| corrupt(format!("header: {e}")))?;
            headers.append(name, value);
        }

        Ok(Self { url, status, response_type, headers, body: Bytes::from(cached.body) })
    }
}
