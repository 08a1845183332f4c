//! Centralized filename handling for the `{slug}-{hash}.{ext}` convention.
//!
//! Every image in a folder is identified by a canonical filename built from
//! two parts: a slug derived from the name the user uploaded it under, and an
//! 8-character content fingerprint. The same stem is shared by all physical
//! facets of an image:
//!
//! - `originals/my-photo-1a2b3c4d.png` (uploaded bytes, original extension)
//! - `webp/my-photo-1a2b3c4d.webp` (primary rendition, the image's identity)
//! - `400x300/my-photo-1a2b3c4d.webp` (one derivative per configured size)
//!
//! Renaming changes the slug and keeps the hash, since content is unchanged.

use md5::{Digest, Md5};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Length of the hex content fingerprint embedded in canonical names.
pub const HASH_LEN: usize = 8;

/// Extension given to originals uploaded without one.
pub const DEFAULT_ORIGINAL_EXT: &str = ".jpg";

/// Extension of primary renditions and derivatives.
pub const RENDITION_EXT: &str = "webp";

/// Slug used when normalization strips a name down to nothing.
const FALLBACK_SLUG: &str = "image";

/// Result of parsing a canonical filename like `my-photo-1a2b3c4d.webp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalName {
    /// Everything before the extension: `my-photo-1a2b3c4d`.
    pub stem: String,
    /// Stem minus the trailing hash segment: `my-photo`.
    /// Equal to `stem` when no hash segment is present.
    pub slug: String,
    /// Trailing 8-hex-digit segment, if the stem carries one.
    pub hash: Option<String>,
    /// Extension without the dot, empty if none.
    pub extension: String,
}

/// Parse a filename following the `{slug}-{hash}.{ext}` convention.
///
/// - `"my-photo-1a2b3c4d.webp"` → slug="my-photo", hash=Some("1a2b3c4d")
/// - `"cat-a1b2c3d4.webp"` → slug="cat", hash=Some("a1b2c3d4")
/// - `"holiday.webp"` → slug="holiday", hash=None
/// - `"my-photo.webp"` → slug="my-photo", hash=None (`photo` is not a hash)
pub fn parse_canonical_name(filename: &str) -> CanonicalName {
    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (filename, ""),
    };

    let (slug, hash) = match stem.rsplit_once('-') {
        Some((slug, tail)) if is_hash(tail) => (slug, Some(tail.to_string())),
        _ => (stem, None),
    };

    CanonicalName {
        stem: stem.to_string(),
        slug: slug.to_string(),
        hash,
        extension: extension.to_string(),
    }
}

fn is_hash(s: &str) -> bool {
    s.len() == HASH_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalize a display name into a URL-safe slug.
///
/// Lower-cases, decomposes accented characters (so `é` keeps its `e`),
/// turns whitespace runs into a single dash, drops everything outside
/// `[a-z0-9_-]` and collapses repeated dashes.
pub fn slugify(text: &str) -> String {
    let lowered: String = text.to_lowercase().nfd().collect();

    let mut slug = String::with_capacity(lowered.len());
    let mut in_space = false;
    for c in lowered.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        }
    }

    let mut collapsed = String::with_capacity(slug.len());
    let mut prev_dash = false;
    for c in slug.chars() {
        if c == '-' {
            if !prev_dash {
                collapsed.push('-');
            }
            prev_dash = true;
        } else {
            collapsed.push(c);
            prev_dash = false;
        }
    }

    if collapsed.is_empty() || collapsed == "-" {
        FALLBACK_SLUG.to_string()
    } else {
        collapsed
    }
}

/// First 8 hex characters of the MD5 digest of `bytes`.
///
/// An identity, not an integrity check. Existing stores are named with it.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Md5::digest(bytes);
    let mut hex = format!("{:x}", digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Join a slug and optional hash into a canonical stem.
pub fn canonical_stem(slug: &str, hash: Option<&str>) -> String {
    match hash {
        Some(h) => format!("{}-{}", slug, h),
        None => slug.to_string(),
    }
}

/// Filename of the primary rendition (and every derivative) for a stem.
pub fn rendition_filename(stem: &str) -> String {
    format!("{}.{}", stem, RENDITION_EXT)
}

/// An uploaded filename split into the part that gets slugified and the
/// extension kept for the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    pub base: String,
    /// Extension including the leading dot, e.g. `.png`.
    pub extension: String,
}

/// Split a client-supplied upload name.
///
/// Directory components are ignored, and a missing extension falls back to
/// [`DEFAULT_ORIGINAL_EXT`].
pub fn split_upload_name(name: &str) -> UploadName {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let path = Path::new(file_name);

    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| DEFAULT_ORIGINAL_EXT.to_string());

    UploadName { base, extension }
}

/// Canonical identity of an upload: `({stem}, {primary filename}, {original filename})`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestNames {
    pub stem: String,
    pub primary: String,
    pub original: String,
}

/// Derive every filename an upload will be stored under.
pub fn ingest_names(upload_name: &str, bytes: &[u8]) -> IngestNames {
    let upload = split_upload_name(upload_name);
    let stem = canonical_stem(&slugify(&upload.base), Some(&content_hash(bytes)));
    IngestNames {
        primary: rendition_filename(&stem),
        original: format!("{}{}", stem, upload.extension),
        stem,
    }
}

/// Slug that a candidate upload name would be stored under.
///
/// Used for duplicate detection: an upload is a duplicate of every image
/// whose [`CanonicalName::slug`] equals this value.
pub fn upload_slug(upload_name: &str) -> String {
    slugify(&split_upload_name(upload_name).base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slug_and_hash() {
        let p = parse_canonical_name("my-photo-1a2b3c4d.webp");
        assert_eq!(p.stem, "my-photo-1a2b3c4d");
        assert_eq!(p.slug, "my-photo");
        assert_eq!(p.hash.as_deref(), Some("1a2b3c4d"));
        assert_eq!(p.extension, "webp");
    }

    #[test]
    fn non_hex_tail_is_part_of_slug() {
        let p = parse_canonical_name("my-photo.webp");
        assert_eq!(p.slug, "my-photo");
        assert_eq!(p.hash, None);
    }

    #[test]
    fn short_tail_is_not_a_hash() {
        let p = parse_canonical_name("cat-abc.webp");
        assert_eq!(p.slug, "cat-abc");
        assert_eq!(p.hash, None);
    }

    #[test]
    fn no_extension() {
        let p = parse_canonical_name("dog-deadbeef");
        assert_eq!(p.stem, "dog-deadbeef");
        assert_eq!(p.hash.as_deref(), Some("deadbeef"));
        assert_eq!(p.extension, "");
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("My Photo"), "my-photo");
        assert_eq!(slugify("  Sunset   at  Sea "), "sunset-at-sea");
    }

    #[test]
    fn slugify_strips_punctuation_and_accents() {
        assert_eq!(slugify("Café (2024)!"), "cafe-2024");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("snake_case"), "snake_case");
    }

    #[test]
    fn slugify_empty_falls_back() {
        assert_eq!(slugify("???"), "image");
        assert_eq!(slugify(""), "image");
    }

    #[test]
    fn content_hash_is_stable_and_short() {
        let a = content_hash(b"0123456789");
        assert_eq!(a.len(), HASH_LEN);
        assert_eq!(a, content_hash(b"0123456789"));
        assert_ne!(a, content_hash(b"9876543210"));
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn content_hash_is_md5_prefix() {
        // md5("0123456789") = 781e5e245d69b566979b86e28d23f2c7
        assert_eq!(content_hash(b"0123456789"), "781e5e24");
        assert_eq!(content_hash(b""), "d41d8cd9");
    }

    #[test]
    fn upload_name_keeps_extension() {
        let u = split_upload_name("My Photo.PNG");
        assert_eq!(u.base, "My Photo");
        assert_eq!(u.extension, ".PNG");
    }

    #[test]
    fn upload_name_without_extension_defaults_to_jpg() {
        let u = split_upload_name("scan");
        assert_eq!(u.base, "scan");
        assert_eq!(u.extension, ".jpg");
    }

    #[test]
    fn upload_name_drops_client_directories() {
        let u = split_upload_name("C:\\Users\\me\\beach.jpeg");
        assert_eq!(u.base, "beach");
        assert_eq!(u.extension, ".jpeg");
    }

    #[test]
    fn ingest_names_share_a_stem() {
        let names = ingest_names("My Photo.png", b"0123456789");
        let hash = content_hash(b"0123456789");
        assert_eq!(names.stem, format!("my-photo-{hash}"));
        assert_eq!(names.primary, format!("my-photo-{hash}.webp"));
        assert_eq!(names.original, format!("my-photo-{hash}.png"));
    }

    #[test]
    fn identical_bytes_give_identical_names() {
        assert_eq!(
            ingest_names("a.jpg", b"same bytes"),
            ingest_names("a.jpg", b"same bytes")
        );
    }

    #[test]
    fn upload_slug_matches_stored_slug() {
        let stored = ingest_names("Beach Day.jpg", b"x");
        assert_eq!(
            parse_canonical_name(&stored.primary).slug,
            upload_slug("Beach Day.jpg")
        );
    }
}
