//! Global constants for the map editor

/// Prefix of the published static data location.
pub const DEFAULT_DATA_BASE_URL: &str = "/mapa-agrupacio-tiana/data/";

/// Name of the catalog index document listing per-association files.
pub const CATALOG_INDEX_FILE: &str = "index.json";

/// Name of the legacy combined document (also the full-collection export name).
pub const LEGACY_COMBINED_FILE: &str = "associacions.json";

/// Durable slot holding the unsaved working copy.
pub const DEFAULT_STORAGE_KEY: &str = "mapa-tiana-dirty-data";

/// Prefix of generated association ids.
pub const ASSOCIATION_ID_PREFIX: &str = "assoc-";

/// Length of the random base-36 suffix of generated ids.
pub const ASSOCIATION_ID_SUFFIX_LEN: usize = 9;

/// Placeholder name of a freshly created association.
pub const NEW_ASSOCIATION_NAME: &str = "Nova Associació";

/// Placeholder map label of a freshly created association.
pub const NEW_ASSOCIATION_LABEL: &str = "NOVA";

/// Saturation range (percent) of generated colors.
pub const COLOR_SATURATION_RANGE: std::ops::Range<u32> = 60..90;

/// Lightness range (percent) of generated colors.
pub const COLOR_LIGHTNESS_RANGE: std::ops::Range<u32> = 40..60;
