//! Offline fetch policy.
//!
//! Serves the static shell from a cache generation when the network is
//! gone, while never serving the app shell or its bundles from cache.
//!
//! | Request                              | Route                                 |
//! |--------------------------------------|---------------------------------------|
//! | other origin                         | not intercepted                       |
//! | navigation, `text/html`, script, css | network, offline page on failure      |
//! | image, font, audio, video            | network, cached copy on failure       |
//! | anything else                        | network                               |

pub mod network;
pub mod policy;
pub mod request;
pub mod worker;

pub use network::{HttpConfig, HttpNetwork, Network};
pub use policy::{Route, classify};
pub use request::{Destination, Request, RequestMode, Response, ResponseType};
pub use worker::{ActivateOutcome, FetchOutcome, InstallOutcome, OfflineWorker, WorkerState};
