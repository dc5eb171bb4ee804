// Constants module - centralized default values for configuration
//
// The generation name and manifest are compiled in; a config file may
// override them at start-up.

// =============================================================================
// Generation defaults
// =============================================================================

/// Name of the current cache generation.
/// Bump the version suffix whenever the cached assets change.
pub const DEFAULT_CACHE_NAME: &str = "franchiseku-cache-v2";

/// Origin that local manifest paths and relative requests are resolved against
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080/";

// =============================================================================
// Manifest defaults
// =============================================================================

/// Resources fetched and stored when a new generation is installed.
///
/// Any entry failing to load aborts the install.
pub const DEFAULT_MANIFEST: &[&str] = &[
    // App shell
    "/",
    "/index.html",
    "/manifest.json",
    "/icon-192x192.png",
    "/icon-512x512.png",
    "/icon-maskable-512x512.png",
    // Third-party assets needed offline
    "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700;800;900&display=swap",
    "https://unpkg.com/@phosphor-icons/web",
    "https://cdn.jsdelivr.net/npm/chart.js",
    "https://www.gstatic.com/firebasejs/9.6.10/firebase-app-compat.js",
    "https://www.gstatic.com/firebasejs/9.6.10/firebase-firestore-compat.js",
];

// =============================================================================
// Runtime caching defaults
// =============================================================================

/// Hosts whose successful GET responses are stored on first fetch.
/// The stylesheet on fonts.googleapis.com points here for the font files.
pub const DEFAULT_RUNTIME_CACHE_HOSTS: &[&str] = &["fonts.gstatic.com"];

// =============================================================================
// Disk store defaults
// =============================================================================

/// Default root directory of the disk-backed cache store
pub const DEFAULT_CACHE_DIR: &str = ".offline-cache";

/// Extension of entry metadata files in the disk store
pub const DISK_METADATA_EXTENSION: &str = "json";

/// Extension of entry body files in the disk store
pub const DISK_BODY_EXTENSION: &str = "body";
