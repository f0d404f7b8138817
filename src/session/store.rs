//! Access-token storage.
//!
//! The HTTP layer only reads and writes the token through [`TokenStore`];
//! the session owner decides where the value actually lives.

use std::sync::{Arc, PoisonError, RwLock};

use arc_swap::ArcSwap;

/// Getter/setter contract for the in-memory access token.
///
/// An empty string means "no token".
pub trait TokenStore: Send + Sync {
    fn get(&self) -> String;
    fn set(&self, token: String);

    fn has_token(&self) -> bool {
        !self.get().is_empty()
    }

    fn clear(&self) {
        self.set(String::new());
    }
}

/// Default store: a lock-free cell, never persisted.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: ArcSwap<String>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self) -> String {
        self.token.load().as_ref().clone()
    }

    fn set(&self, token: String) {
        self.token.store(Arc::new(token));
    }
}

/// Store backed by a getter/setter pair supplied by the session owner.
pub struct FnTokenStore<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> FnTokenStore<G, S>
where
    G: Fn() -> String + Send + Sync,
    S: Fn(String) + Send + Sync,
{
    pub fn new(getter: G, setter: S) -> Self {
        Self { getter, setter }
    }
}

impl<G, S> TokenStore for FnTokenStore<G, S>
where
    G: Fn() -> String + Send + Sync,
    S: Fn(String) + Send + Sync,
{
    fn get(&self) -> String {
        (self.getter)()
    }

    fn set(&self, token: String) {
        (self.setter)(token)
    }
}

/// Replaceable handle to the registered store.
///
/// Starts with an [`InMemoryTokenStore`]; `register` swaps in the owner's store.
pub struct TokenSlot {
    store: RwLock<Arc<dyn TokenStore>>,
}

impl TokenSlot {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }

    pub fn register(&self, store: Arc<dyn TokenStore>) {
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = store;
    }

    fn current(&self) -> Arc<dyn TokenStore> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self) -> String {
        self.current().get()
    }

    pub fn set(&self, token: String) {
        self.current().set(token)
    }

    pub fn clear(&self) {
        self.current().clear()
    }

    pub fn has_token(&self) -> bool {
        self.current().has_token()
    }
}

impl Default for TokenSlot {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTokenStore::new()))
    }
}

impl std::fmt::Debug for TokenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSlot")
            .field("has_token", &self.has_token())
            .finish()
    }
}
