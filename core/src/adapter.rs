//! Binds a `RequestClient` to an observable `RequestState`.
//!
//! # Design
//! Each verb call writes three snapshots at most: `loading` when the call
//! starts, then `success` or `failure` when it settles. Calls are not
//! sequenced against each other; when two overlap, whichever settles last
//! leaves its snapshot in the store.
//!
//! A verb the client cannot perform never reaches the client. It only sets
//! the `error` field, so `loading` and `result` keep whatever they held, even
//! a previous result.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::client::{HttpClient, RequestClient};
use crate::config::{ClientCache, ClientConfig};
use crate::error::{ConfigError, RequestError};
use crate::http::{Method, UnknownMethod};
use crate::state::RequestState;
use crate::store::{ObserverFn, ObserverId, StateStore};

/// A client plus the state of the calls made through it.
pub struct RequestAdapter<C, T = Value> {
    client: Arc<C>,
    store: Arc<StateStore<T>>,
}

impl<T> RequestAdapter<HttpClient, T>
where
    T: DeserializeOwned + Clone,
{
    /// Build the adapter over the client cached for `config`, building one
    /// if the config changed since the last call.
    pub fn from_config(cache: &mut ClientCache, config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(cache.client_for(config)?))
    }
}

impl<C, T> RequestAdapter<C, T>
where
    C: RequestClient,
    T: DeserializeOwned + Clone,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            store: Arc::new(StateStore::new()),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn store(&self) -> &StateStore<T> {
        &self.store
    }

    pub fn snapshot(&self) -> RequestState<T> {
        self.store.snapshot()
    }

    pub fn clear_error(&self) {
        self.store.clear_error();
    }

    pub async fn get(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.dispatch(Method::Get, url, params).await
    }

    pub async fn post(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.dispatch(Method::Post, url, params).await
    }

    pub async fn put(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.dispatch(Method::Put, url, params).await
    }

    pub async fn delete(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.dispatch(Method::Delete, url, params).await
    }

    /// Dispatch by verb name, e.g. from a view layer that only has a string.
    pub async fn call(&self, verb: &str, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        match verb.parse::<Method>() {
            Ok(method) => self.dispatch(method, url, params).await,
            Err(UnknownMethod(name)) => Err(self.reject(&name)),
        }
    }

    pub async fn dispatch(
        &self,
        method: Method,
        url: &str,
        params: Option<Value>,
    ) -> Result<T, RequestError> {
        if !self.client.supports(method) {
            return Err(self.reject(method.as_str()));
        }

        self.store.replace(RequestState::loading());
        tracing::debug!(%method, url, "request started");

        let settled = match self.client.request(method, url, params.as_ref()).await {
            Ok(payload) => {
                serde_json::from_value::<T>(payload).map_err(|e| RequestError::invalid_response(&e))
            }
            Err(err) => Err(RequestError::from(err)),
        };

        match &settled {
            Ok(result) => {
                tracing::debug!(%method, url, "request succeeded");
                self.store.replace(RequestState::success(result.clone()));
            }
            Err(error) => {
                tracing::debug!(%method, url, code = %error.code, "request failed: {}", error.message);
                self.store.replace(RequestState::failure(error.clone()));
            }
        }
        settled
    }

    fn reject(&self, verb: &str) -> RequestError {
        tracing::debug!(verb, "unsupported request method");
        let error = RequestError::unsupported(verb);
        self.store.set_error(error.clone());
        error
    }
}

/// Create an adapter and split it into its verb functions and its state.
///
/// Both halves share the same adapter, so state written by a call through
/// the first is visible through the second.
pub fn use_req<C, T>(client: Arc<C>) -> (RequestMethods<C, T>, StateHandle<T>)
where
    C: RequestClient,
    T: DeserializeOwned + Clone,
{
    let adapter = Arc::new(RequestAdapter::new(client));
    let state = StateHandle {
        store: Arc::clone(&adapter.store),
    };
    (RequestMethods { adapter }, state)
}

/// The four verb functions returned by [`use_req`].
pub struct RequestMethods<C, T = Value> {
    adapter: Arc<RequestAdapter<C, T>>,
}

impl<C, T> Clone for RequestMethods<C, T> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
        }
    }
}

impl<C, T> RequestMethods<C, T>
where
    C: RequestClient,
    T: DeserializeOwned + Clone,
{
    pub async fn get(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.adapter.get(url, params).await
    }

    pub async fn post(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.adapter.post(url, params).await
    }

    pub async fn put(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.adapter.put(url, params).await
    }

    pub async fn delete(&self, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.adapter.delete(url, params).await
    }

    pub async fn call(&self, verb: &str, url: &str, params: Option<Value>) -> Result<T, RequestError> {
        self.adapter.call(verb, url, params).await
    }
}

/// Read side of [`use_req`]: the state plus `clear_error`.
pub struct StateHandle<T> {
    store: Arc<StateStore<T>>,
}

impl<T> Clone for StateHandle<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Clone> StateHandle<T> {
    pub fn snapshot(&self) -> RequestState<T> {
        self.store.snapshot()
    }

    pub fn loading(&self) -> bool {
        self.store.snapshot().loading
    }

    pub fn error(&self) -> Option<RequestError> {
        self.store.snapshot().error
    }

    pub fn result(&self) -> Option<T> {
        self.store.snapshot().result
    }

    pub fn clear_error(&self) {
        self.store.clear_error();
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.store.subscribe()
    }

    pub fn observe(&self, observer: ObserverFn<T>) -> ObserverId {
        self.store.observe(observer)
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.store.unobserve(id)
    }
}
