//! The request lifecycle snapshot.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// `{loading, error, result}` at one point in time.
///
/// The constructors are the only transitions the adapter performs, and each
/// one keeps `error` and `result` mutually exclusive, with both empty while
/// `loading` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestState<T> {
    pub loading: bool,
    pub error: Option<RequestError>,
    pub result: Option<T>,
}

impl<T> RequestState<T> {
    pub fn idle() -> Self {
        Self {
            loading: false,
            error: None,
            result: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            loading: true,
            error: None,
            result: None,
        }
    }

    pub fn success(result: T) -> Self {
        Self {
            loading: false,
            error: None,
            result: Some(result),
        }
    }

    pub fn failure(error: RequestError) -> Self {
        Self {
            loading: false,
            error: Some(error),
            result: None,
        }
    }

    /// True when the snapshot satisfies the state invariants.
    ///
    /// Every snapshot written by a call is consistent. An unsupported verb
    /// only sets `error`, so it can leave an inconsistent snapshot: an error
    /// beside the previous `result`, or beside `loading` while another call
    /// is in flight. That lasts until `clear_error` or the next settlement.
    pub fn is_consistent(&self) -> bool {
        let exclusive = self.error.is_none() || self.result.is_none();
        let clean_while_loading = !self.loading || (self.error.is_none() && self.result.is_none());
        exclusive && clean_while_loading
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::idle()
    }
}
