//! # Image CDN URLs
//!
//! QR images are served by an external image CDN. Nothing is uploaded from
//! the app: URLs are built by templating.
//!
//! ```text
//! https://<host>/<cloud>/image/upload/w_<W>,h_<H>,c_fill,q_auto,f_auto/<publicId>
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Terminal;

/// Default QR image edge, in pixels.
pub const DEFAULT_IMAGE_SIZE: u32 = 300;

/// Thumbnail edge, in pixels.
pub const THUMBNAIL_SIZE: u32 = 150;

/// CDN location of the fleet's media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnConfig {
    pub host: String,
    pub cloud_name: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        CdnConfig {
            host: "res.cloudinary.com".to_string(),
            cloud_name: "fleet".to_string(),
        }
    }
}

impl CdnConfig {
    /// Resized, auto-format image URL for `public_id`.
    pub fn image_url(&self, public_id: &str, width: u32, height: u32) -> String {
        format!(
            "https://{}/{}/image/upload/w_{},h_{},c_fill,q_auto,f_auto/{}",
            self.host,
            self.cloud_name,
            width,
            height,
            public_id.trim_start_matches('/')
        )
    }

    pub fn thumbnail_url(&self, public_id: &str) -> String {
        self.image_url(public_id, THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    }

    /// Checks if `url` points at this CDN.
    pub fn is_cdn_url(&self, url: &str) -> bool {
        url.contains(&self.host) && url.contains("/upload/")
    }
}

/// Extracts the public id from a CDN delivery URL.
///
/// ```text
/// https://res.cloudinary.com/c/image/upload/v1755531771/qr_codes/terminal_3k.png
///                                          └─ dropped ─┘└──── public id ───┘ └ dropped
/// ```
pub fn extract_public_id(url: &str) -> Option<String> {
    let (_, rest) = url.rsplit_once("/upload/")?;

    let rest = match rest.split_once('/') {
        Some((version, tail))
            if version.len() > 1
                && version.starts_with('v')
                && version[1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            tail
        }
        _ => rest,
    };

    // Extension of the last path segment only
    let (dir, file) = match rest.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, rest),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };

    let id = match dir {
        Some(dir) => format!("{}/{}", dir, stem),
        None => stem.to_string(),
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

impl Terminal {
    /// URL of this terminal's QR image at `size`×`size`.
    ///
    /// CDN URLs are re-templated to the requested size; any other URL is
    /// returned as stored. `None` when the terminal has no image.
    pub fn qr_image_url(&self, cdn: &CdnConfig, size: u32) -> Option<String> {
        let url = self.qr_code_url.trim();
        if url.is_empty() {
            return None;
        }
        if cdn.is_cdn_url(url) {
            if let Some(public_id) = extract_public_id(url) {
                return Some(cdn.image_url(&public_id, size, size));
            }
        }
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdn() -> CdnConfig {
        CdnConfig {
            host: "res.cloudinary.com".to_string(),
            cloud_name: "demo".to_string(),
        }
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            cdn().image_url("qr_codes/t1", 300, 200),
            "https://res.cloudinary.com/demo/image/upload/w_300,h_200,c_fill,q_auto,f_auto/qr_codes/t1"
        );
        assert_eq!(
            cdn().thumbnail_url("qr_codes/t1"),
            "https://res.cloudinary.com/demo/image/upload/w_150,h_150,c_fill,q_auto,f_auto/qr_codes/t1"
        );
    }

    #[test]
    fn test_extract_public_id() {
        assert_eq!(
            extract_public_id(
                "https://res.cloudinary.com/demo/image/upload/v1755531771/qr_codes/terminal_3k.png"
            )
            .as_deref(),
            Some("qr_codes/terminal_3k")
        );
        assert_eq!(
            extract_public_id("https://res.cloudinary.com/demo/image/upload/sample.jpg").as_deref(),
            Some("sample")
        );
        assert_eq!(
            extract_public_id("https://res.cloudinary.com/demo/image/upload/v12/plain").as_deref(),
            Some("plain")
        );
        assert_eq!(extract_public_id("https://example.com/a.png"), None);
        assert_eq!(extract_public_id("https://x/upload/"), None);
    }

    #[test]
    fn test_terminal_qr_image_url() {
        let mut terminal = Terminal {
            id: "t1".to_string(),
            terminal_id: "T1".to_string(),
            name: "Central".to_string(),
            qr_code: "ABC".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            qr_code_url: "https://res.cloudinary.com/demo/image/upload/v1/qr/t1.png".to_string(),
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(
            terminal.qr_image_url(&cdn(), 150).as_deref(),
            Some("https://res.cloudinary.com/demo/image/upload/w_150,h_150,c_fill,q_auto,f_auto/qr/t1")
        );

        terminal.qr_code_url = "https://other.host/t1.png".to_string();
        assert_eq!(
            terminal.qr_image_url(&cdn(), 150).as_deref(),
            Some("https://other.host/t1.png")
        );

        terminal.qr_code_url.clear();
        assert_eq!(terminal.qr_image_url(&cdn(), 150), None);
    }
}
