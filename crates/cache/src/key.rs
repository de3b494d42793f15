//! Cache key interning.
//!
//! A `KeyTrie` turns a (document identity, canonical variables) pair into a
//! small `CacheKey` handle. The same pair always interns to the same handle,
//! so handles can be compared and hashed directly.

use hashbrown::HashMap;
use skein_core::{Document, DocumentId};
use std::fmt;

/// Interned identity of one (document, variables) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(u64);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Two-level trie: document identity first, then canonical variables.
#[derive(Debug)]
pub struct KeyTrie {
    roots: HashMap<DocumentId, HashMap<String, CacheKey>>,
    next_key: u64,
}

impl Default for KeyTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyTrie {
    pub fn new() -> Self {
        Self {
            roots: HashMap::new(),
            next_key: 1,
        }
    }

    /// Returns the key for `(document, canonical_variables)`, interning it on
    /// first use.
    pub fn lookup(&mut self, document: &Document, canonical_variables: &str) -> CacheKey {
        let branch = self.roots.entry(document.id()).or_default();
        if let Some(key) = branch.get(canonical_variables) {
            return *key;
        }

        let key = CacheKey(self.next_key);
        self.next_key += 1;
        branch.insert(canonical_variables.to_owned(), key);
        key
    }

    /// Returns the key for the pair without interning it.
    pub fn peek(&self, document: &Document, canonical_variables: &str) -> Option<CacheKey> {
        self.roots
            .get(&document.id())
            .and_then(|branch| branch.get(canonical_variables))
            .copied()
    }

    /// Forgets the pair if it is still interned as `key`, pruning the
    /// document's branch once it is empty. The pair interns to a fresh key on
    /// its next lookup.
    pub fn remove(
        &mut self,
        document: DocumentId,
        canonical_variables: &str,
        key: CacheKey,
    ) -> bool {
        let Some(branch) = self.roots.get_mut(&document) else {
            return false;
        };
        if branch.get(canonical_variables) != Some(&key) {
            return false;
        }

        branch.remove(canonical_variables);
        if branch.is_empty() {
            self.roots.remove(&document);
        }
        true
    }

    /// Number of interned keys.
    pub fn len(&self) -> usize {
        self.roots.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_stable() {
        let doc = Document::parse("query { a }").unwrap();
        let mut trie = KeyTrie::new();

        let first = trie.lookup(&doc, "{}");
        let second = trie.lookup(&doc.clone(), "{}");
        assert_eq!(first, second);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_lookup_distinguishes_variables_and_documents() {
        let doc = Document::parse("query { a }").unwrap();
        let same_text = Document::parse("query { a }").unwrap();
        let mut trie = KeyTrie::new();

        let base = trie.lookup(&doc, r#"{"id":1}"#);
        assert_ne!(base, trie.lookup(&doc, r#"{"id":2}"#));
        assert_ne!(base, trie.lookup(&same_text, r#"{"id":1}"#));
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn test_peek() {
        let doc = Document::parse("query { a }").unwrap();
        let mut trie = KeyTrie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.peek(&doc, "{}"), None);

        let key = trie.lookup(&doc, "{}");
        assert_eq!(trie.peek(&doc, "{}"), Some(key));
        assert_eq!(trie.peek(&doc, r#"{"x":1}"#), None);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_remove_prunes_branches() {
        let doc = Document::parse("query { a }").unwrap();
        let mut trie = KeyTrie::new();

        let first = trie.lookup(&doc, r#"{"page":1}"#);
        let second = trie.lookup(&doc, r#"{"page":2}"#);

        assert!(trie.remove(doc.id(), r#"{"page":1}"#, first));
        assert!(!trie.remove(doc.id(), r#"{"page":1}"#, first));
        assert_eq!(trie.len(), 1);

        assert!(trie.remove(doc.id(), r#"{"page":2}"#, second));
        assert!(trie.is_empty());
        assert!(trie.roots.is_empty());

        let again = trie.lookup(&doc, r#"{"page":1}"#);
        assert_ne!(again, first);
    }

    #[test]
    fn test_remove_ignores_stale_key() {
        let doc = Document::parse("query { a }").unwrap();
        let mut trie = KeyTrie::new();

        let stale = trie.lookup(&doc, "{}");
        trie.remove(doc.id(), "{}", stale);
        let fresh = trie.lookup(&doc, "{}");

        assert!(!trie.remove(doc.id(), "{}", stale));
        assert_eq!(trie.peek(&doc, "{}"), Some(fresh));
    }

    #[test]
    fn test_display() {
        let doc = Document::parse("query { a }").unwrap();
        let mut trie = KeyTrie::new();
        assert_eq!(trie.lookup(&doc, "{}").to_string(), "#1");
    }
}
