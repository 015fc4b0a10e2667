/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Catalog defaults
pub const DEFAULT_CONTAINER_TYPE: &str = "Lakehouse";
pub const DEFAULT_FILES_ROOT: &str = "Files";
pub const DEFAULT_LISTING_CONCURRENCY: usize = 1;

// Preview defaults
pub const DEFAULT_PREVIEW_TEMP_PATH: &str = "./data/previews";
pub const DEFAULT_DOWNLOAD_PATH: &str = "./data/downloads";

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Config file lookup
pub const CONFIG_FILE_ENV: &str = "LAKEHOUSE_CATALOG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";
