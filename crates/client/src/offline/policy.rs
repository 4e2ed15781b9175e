//! Request routing.

use url::Origin;

use super::request::{Destination, Request, RequestMode};

/// How an intercepted request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Another origin: left to the browser.
    CrossOrigin,
    /// Shell and bundles: network only, offline page on failure. Never cached.
    NetworkOnly,
    /// Static media: network first, cached copy on failure.
    NetworkFirst,
    /// Everything else goes straight to the network.
    Passthrough,
}

/// Pick the route for a request made from a page on `origin`.
pub fn classify(request: &Request, origin: &Origin) -> Route {
    if request.url.origin() != *origin {
        return Route::CrossOrigin;
    }

    if request.mode == RequestMode::Navigate
        || request.accept().contains("text/html")
        || matches!(request.destination, Destination::Script | Destination::Style)
    {
        return Route::NetworkOnly;
    }

    match request.destination {
        Destination::Image | Destination::Font | Destination::Audio | Destination::Video => Route::NetworkFirst,
        _ => Route::Passthrough,
    }
}
