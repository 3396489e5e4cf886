use kestrel_primitives::{SealedHeader, B256};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// The set of headers downloaded but not yet body-confirmed, shared with the
/// consensus validation path.
///
/// The handle is cheap to clone; all clones observe the same map. Discipline:
/// a single writer (the header downloading state that owns the session) and
/// any number of concurrent readers. Headers in the view have passed parent
/// linkage and header validity checks and may be treated as provisionally
/// canonical for parent validation; they are never written to durable
/// storage.
#[derive(Clone, Debug, Default)]
pub struct PendingHeaders {
    inner: Arc<RwLock<HashMap<B256, SealedHeader>>>,
}

impl PendingHeaders {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a validated header.
    pub fn insert(&self, header: SealedHeader) {
        self.inner.write().insert(header.hash(), header);
    }

    /// Looks up a pending header by hash.
    pub fn get(&self, hash: &B256) -> Option<SealedHeader> {
        self.inner.read().get(hash).cloned()
    }

    /// Whether a header with the given hash is pending.
    pub fn contains(&self, hash: &B256) -> bool {
        self.inner.read().contains_key(hash)
    }

    /// Number of pending headers.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Drops all pending headers. Called on session hand-off or abort.
    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_interfaces::test_utils::header_chain;

    #[test]
    fn insert_get_clear() {
        let view = PendingHeaders::new();
        let headers = header_chain(&SealedHeader::default(), 3);

        for header in &headers {
            view.insert(header.clone());
        }
        assert_eq!(view.len(), 3);
        assert_eq!(view.get(&headers[1].hash()), Some(headers[1].clone()));

        view.clear();
        assert!(view.is_empty());
        assert!(!view.contains(&headers[1].hash()));
    }

    #[test]
    fn readers_share_the_writers_map() {
        let view = PendingHeaders::new();
        let reader = view.clone();
        let headers = header_chain(&SealedHeader::default(), 64);

        let hashes: Vec<_> = headers.iter().map(|h| h.hash()).collect();
        let handle = std::thread::spawn(move || {
            // spin until the writer has published everything
            loop {
                if hashes.iter().all(|hash| reader.contains(hash)) {
                    return reader.len()
                }
                std::thread::yield_now();
            }
        });

        for header in headers {
            view.insert(header);
        }
        assert_eq!(handle.join().unwrap(), 64);
    }
}
