//! File references and their public URLs.
//!
//! Files are stored elsewhere; the service only keeps opaque keys and turns them into URLs.

#[derive(Debug, Clone)]
pub struct MediaStorage {
    base_url: String,
}

impl MediaStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// URL for a stored key, or `None` when nothing is stored.
    pub fn resolve(&self, key: &str) -> Option<String> {
        let key = key.trim().trim_start_matches('/');
        if key.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_joins_with_single_slash() {
        let media = MediaStorage::new("/media/");
        assert_eq!(
            media.resolve("requirements/brief.pdf").as_deref(),
            Some("/media/requirements/brief.pdf")
        );
        assert_eq!(
            MediaStorage::new("https://cdn.example.com")
                .resolve("/avatars/a.png")
                .as_deref(),
            Some("https://cdn.example.com/avatars/a.png")
        );
    }

    #[test]
    fn test_empty_key_has_no_url() {
        assert_eq!(MediaStorage::new("/media/").resolve("  "), None);
    }
}
