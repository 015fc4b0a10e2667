//! Extension based MIME type lookup for preview blobs
//!
//! Preview content is tagged by the file's extension only. The table is fixed;
//! anything it does not know is served as generic binary content.

/// MIME type used when the extension is missing or unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const MIME_TABLE: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("txt", "text/plain"),
    ("log", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("xml", "application/xml"),
    ("json", "application/json"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("parquet", "application/vnd.apache.parquet"),
    ("avro", "application/avro"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("mp4", "video/mp4"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
];

/// Extract the lowercase extension of a file name, if it has one.
///
/// Leading dots (hidden files such as `.env`) do not count as an extension.
#[must_use]
pub fn extension_of(name: &str) -> Option<String> {
    let leaf = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = leaf.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Look up the MIME type for an extension (without the dot, any case).
#[must_use]
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    let extension = extension.to_ascii_lowercase();
    MIME_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or(DEFAULT_MIME_TYPE, |(_, mime)| *mime)
}

/// Look up the MIME type for a file name or path.
#[must_use]
pub fn mime_type_for_name(name: &str) -> &'static str {
    extension_of(name).map_or(DEFAULT_MIME_TYPE, |ext| mime_type_for_extension(&ext))
}
