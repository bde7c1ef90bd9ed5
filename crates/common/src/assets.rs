//! CMS asset references to CDN URLs.
//!
//! Image refs look like `image-<id>-<width>x<height>-<ext>`, file refs like
//! `file-<id>-<ext>`.

use serde::{Deserialize, Serialize};

use crate::vehicle::{FileRef, ImageRef};

pub const CDN_HOST: &str = "https://cdn.sanity.io";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUrls {
    pub project_id: String,
    pub dataset: String,
}

impl AssetUrls {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn image_url(&self, image: &ImageRef) -> Option<String> {
        self.image_ref_url(&image.asset.reference)
    }

    pub fn image_ref_url(&self, reference: &str) -> Option<String> {
        let parts: Vec<&str> = reference.split('-').collect();
        match parts.as_slice() {
            ["image", id, dims, ext] if !id.is_empty() && !ext.is_empty() => Some(format!(
                "{CDN_HOST}/images/{}/{}/{id}-{dims}.{ext}",
                self.project_id, self.dataset
            )),
            _ => None,
        }
    }

    /// URL of a downloadable file. `None` for a malformed ref; the product page
    /// then falls back to the contact form.
    pub fn file_url(&self, file: &FileRef) -> Option<String> {
        let parts: Vec<&str> = file.asset.reference.split('-').collect();
        if parts.len() < 3 || parts[0] != "file" {
            return None;
        }
        let id = parts[1];
        let ext = parts[parts.len() - 1];
        if id.is_empty() || ext.is_empty() {
            return None;
        }
        Some(format!(
            "{CDN_HOST}/files/{}/{}/{id}.{ext}",
            self.project_id, self.dataset
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> AssetUrls {
        AssetUrls::new("abc123", "production")
    }

    #[test]
    fn test_image_url() {
        let image = ImageRef::new("image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg");
        assert_eq!(
            urls().image_url(&image).as_deref(),
            Some("https://cdn.sanity.io/images/abc123/production/Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000.jpg")
        );
    }

    #[test]
    fn test_file_url() {
        let file = FileRef::new("file-9f8e7d-pdf");
        assert_eq!(
            urls().file_url(&file).as_deref(),
            Some("https://cdn.sanity.io/files/abc123/production/9f8e7d.pdf")
        );
    }

    #[test]
    fn test_malformed_refs() {
        assert_eq!(urls().image_url(&ImageRef::new("image-only")), None);
        assert_eq!(urls().file_url(&FileRef::new("file-pdf")), None);
        assert_eq!(urls().file_url(&FileRef::new("image-a-1x1-png")), None);
    }
}
