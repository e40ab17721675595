/*!
    Process-wide source registry behind the transport scheme.
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::source::StreamSource;

/**
    The URL scheme sources are registered under.

    The association between this scheme and the registry is established once
    per process (on first use of the registry) and is never revoked.
*/
pub const SCHEME: &str = "vproto";

struct Registry {
    next_id: u64,
    sources: HashMap<u64, Arc<dyn StreamSource>>,
}

static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| {
    Mutex::new(Registry {
        next_id: 1,
        sources: HashMap::new(),
    })
});

/**
    Registration receipt for a source.

    Holds the source's slot in the registry; dropping the handle unregisters
    it. Keep the handle alive for as long as the URL may be resolved.
*/
pub struct SourceHandle {
    id: u64,
}

impl SourceHandle {
    /**
        The registry id of this source.
    */
    pub fn id(&self) -> u64 {
        self.id
    }

    /**
        The URL under which the source can be opened.
    */
    pub fn url(&self) -> String {
        format!("{}://{}", SCHEME, self.id)
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        let mut reg = REGISTRY.lock().unwrap();
        reg.sources.remove(&self.id);
    }
}

/**
    Register a source and get its URL handle.

    Ids are never reused within a process, so a stale URL can only miss, not
    alias a different source.
*/
pub fn register_source(source: Arc<dyn StreamSource>) -> SourceHandle {
    let mut reg = REGISTRY.lock().unwrap();
    let id = reg.next_id;
    reg.next_id += 1;
    reg.sources.insert(id, source);
    SourceHandle { id }
}

/**
    Returns true if the URI uses the transport scheme.
*/
pub fn is_transport_url(uri: &str) -> bool {
    uri.strip_prefix(SCHEME)
        .is_some_and(|rest| rest.starts_with("://"))
}

fn parse_id(uri: &str) -> Option<u64> {
    let rest = uri.strip_prefix(SCHEME)?.strip_prefix("://")?;
    let id = rest.split('/').next().unwrap_or(rest);
    id.parse::<u64>().ok()
}

/**
    Resolve a transport URI to its registered source.
*/
pub(crate) fn resolve(uri: &str) -> Option<Arc<dyn StreamSource>> {
    let id = parse_id(uri)?;
    REGISTRY.lock().unwrap().sources.get(&id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn register_resolve_roundtrip() {
        let handle = register_source(Arc::new(MemorySource::new(vec![0; 8])));
        let url = handle.url();
        assert!(is_transport_url(&url));

        let source = resolve(&url).expect("registered source resolves");
        assert_eq!(source.size().expect("size"), 8);
    }

    #[test]
    fn drop_unregisters() {
        let handle = register_source(Arc::new(MemorySource::new(vec![0; 4])));
        let url = handle.url();
        drop(handle);
        assert!(resolve(&url).is_none());
    }

    #[test]
    fn parse_id_tolerates_trailing_path() {
        let handle = register_source(Arc::new(MemorySource::new(vec![0; 4])));
        let url = format!("{}/extra/path", handle.url());
        assert!(resolve(&url).is_some());
    }

    #[test]
    fn foreign_schemes_do_not_resolve() {
        assert!(!is_transport_url("file:///tmp/x.mp4"));
        assert!(!is_transport_url("vprotocol://1"));
        assert!(resolve("http://example/1").is_none());
        assert!(resolve("vproto://not-a-number").is_none());
    }
}
