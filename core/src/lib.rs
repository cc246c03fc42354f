//! Request lifecycle state for UI components.
//!
//! # Overview
//! A `RequestAdapter` wraps a request client's GET/POST/PUT/DELETE calls and
//! mirrors each call's lifecycle into an observable `RequestState`:
//! `{loading, error, result}`. A view layer reads snapshots, subscribes to
//! changes, and clears errors; it never catches errors from the calls
//! themselves.
//!
//! # Design
//! - `RequestClient` is the seam to the HTTP client. `HttpClient` is the
//!   bundled ureq implementation; tests supply their own.
//! - `StateStore` replaces the whole snapshot on every transition and
//!   notifies observers in order.
//! - Failures are normalized into one `RequestError` shape and returned as
//!   `Err` as well as stored.
//! - `ClientCache` rebuilds the client only when its `ClientConfig` changes.

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod state;
pub mod store;

pub use adapter::{use_req, RequestAdapter, RequestMethods, StateHandle};
pub use client::{HttpClient, RequestClient};
pub use config::{ClientCache, ClientConfig};
pub use error::{ClientError, ConfigError, RequestError, UNKNOWN_CODE, UNSUPPORTED_CODE};
pub use http::{HttpRequest, HttpResponse, Method};
pub use state::RequestState;
pub use store::{tracing_observer, ObserverFn, ObserverId, StateStore};
