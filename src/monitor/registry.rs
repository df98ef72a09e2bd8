//! Endpoint registry

use std::sync::Arc;

/// Immutable list of monitored URLs
///
/// Built once at startup and shared by reference afterwards, so readers
/// never need synchronization. Clone is cheap (Arc internally).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRegistry {
    urls: Arc<[String]>,
}

impl EndpointRegistry {
    /// Create a registry, dropping duplicate URLs but keeping first-seen order
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for url in urls.into_iter().map(Into::into) {
            if !unique.contains(&url) {
                unique.push(url);
            }
        }
        Self {
            urls: unique.into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }
}
