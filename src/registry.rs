use crate::extract::normalize_kind;
use std::collections::HashMap;

/// Reserved kind whose renderer answers every unregistered lookup.
pub const DEFAULT_KIND: &str = "default";

/// Kind-to-renderer lookup.
///
/// Built once at startup and passed to whatever renders tool calls. The
/// default entry exists from construction, so `get` is total. Setup needs
/// `&mut self`; steady-state lookups only need `&self` and can be shared
/// behind an `Arc` without a lock.
#[derive(Debug, Clone)]
pub struct ToolViewRegistry<R> {
    default: R,
    entries: HashMap<String, R>,
}

impl<R> ToolViewRegistry<R> {
    pub fn new(default: R) -> Self {
        Self {
            default,
            entries: HashMap::new(),
        }
    }

    pub fn from_table<K>(default: R, table: impl IntoIterator<Item = (K, R)>) -> Self
    where
        K: AsRef<str>,
    {
        let mut registry = Self::new(default);
        for (kind, renderer) in table {
            registry.register(kind.as_ref(), renderer);
        }
        registry
    }

    /// Last write wins. Returns the renderer that was replaced, if any.
    pub fn register(&mut self, kind: &str, renderer: R) -> Option<R> {
        let kind = normalize_kind(kind);
        if kind == DEFAULT_KIND {
            return Some(std::mem::replace(&mut self.default, renderer));
        }
        let previous = self.entries.insert(kind, renderer);
        if previous.is_some() {
            tracing::debug!("tool view registration replaced an existing entry");
        }
        previous
    }

    pub fn get(&self, kind: &str) -> &R {
        let kind = normalize_kind(kind);
        self.entries.get(&kind).unwrap_or(&self.default)
    }

    pub fn has(&self, kind: &str) -> bool {
        let kind = normalize_kind(kind);
        kind == DEFAULT_KIND || self.entries.contains_key(&kind)
    }

    /// Registered kinds, `default` excluded, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}
