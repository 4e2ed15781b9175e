//! Client code for nai-site.
//!
//! This crate provides the post-build metadata injector, the HTML document
//! editor it is built on, and the offline fetch policy.

pub mod html;
pub mod offline;
pub mod prerender;

pub use html::{BaseDocument, EditableDocument, NewElement, escape_html};
pub use offline::{
    Destination, FetchOutcome, HttpConfig, HttpNetwork, Network, OfflineWorker, Request, RequestMode, Response,
    ResponseType, WorkerState,
};
pub use prerender::{ContentEntry, EntryFailure, PageMeta, PrerenderReport, Prerenderer};
