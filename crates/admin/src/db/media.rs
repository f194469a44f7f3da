//! Media library repository.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use meridian_core::MediaId;
use meridian_core::media::{MediaAsset, MediaKind, MediaQuery};

use super::{AdminStore, Result, remove};

/// Metadata for an uploaded file. The bytes themselves are not stored.
#[derive(Debug, Clone)]
pub struct NewMediaAsset {
    pub file_name: String,
    pub folder: String,
    pub url: String,
    pub size_bytes: u64,
    pub alt_text: String,
}

impl AdminStore {
    /// Assets matching `query`, newest first.
    #[must_use]
    pub fn media(&self, query: &MediaQuery) -> Vec<&MediaAsset> {
        let mut assets: Vec<&MediaAsset> =
            self.media.iter().filter(|a| query.matches(a)).collect();
        assets.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        assets
    }

    /// Distinct folder names, sorted.
    #[must_use]
    pub fn media_folders(&self) -> Vec<&str> {
        self.media
            .iter()
            .map(|a| a.folder.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Total bytes across the library.
    #[must_use]
    pub fn storage_used(&self) -> u64 {
        self.media.iter().map(|a| a.size_bytes).sum()
    }

    /// Record an uploaded asset. The kind is derived from the file extension.
    pub fn create_media(&mut self, new: NewMediaAsset, now: DateTime<Utc>) -> MediaId {
        let id = MediaId::new(self.sequences.media.issue());
        let folder = new.folder.trim();
        self.media.push(MediaAsset {
            id,
            kind: MediaKind::from_file_name(&new.file_name),
            file_name: new.file_name,
            folder: if folder.is_empty() { "uploads" } else { folder }.to_string(),
            url: new.url,
            size_bytes: new.size_bytes,
            width: None,
            height: None,
            alt_text: new.alt_text,
            uploaded_at: now,
        });
        id
    }

    /// Delete an asset.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no asset has this id.
    pub fn delete_media(&mut self, id: MediaId) -> Result<MediaAsset> {
        remove(&mut self.media, id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::store;
    use super::*;

    #[test]
    fn test_folders_are_distinct_and_sorted() {
        let store = store();
        let folders = store.media_folders();
        assert_eq!(folders, vec!["banners", "brand", "products", "support"]);
    }

    #[test]
    fn test_create_and_delete() {
        let mut store = store();
        let used = store.storage_used();
        let id = store.create_media(
            NewMediaAsset {
                file_name: "lookbook.pdf".to_string(),
                folder: "  ".to_string(),
                url: "/static/img/media/document.svg".to_string(),
                size_bytes: 2048,
                alt_text: String::new(),
            },
            Utc::now(),
        );
        assert_eq!(id, MediaId::new(7));
        assert_eq!(store.storage_used(), used + 2048);

        let newest = store.media(&MediaQuery::default());
        let first = newest.first().unwrap();
        assert_eq!(first.id, id);
        assert_eq!(first.kind, MediaKind::Document);
        assert_eq!(first.folder, "uploads");

        store.delete_media(id).unwrap();
        assert_eq!(store.storage_used(), used);
        assert!(store.delete_media(id).is_err());

        let again = store.create_media(
            NewMediaAsset {
                file_name: "lookbook-v2.pdf".to_string(),
                folder: "brand".to_string(),
                url: "/static/img/media/document.svg".to_string(),
                size_bytes: 1024,
                alt_text: String::new(),
            },
            Utc::now(),
        );
        assert_eq!(again, MediaId::new(8));
    }
}
