//! Build metadata shared by the library and the binary.
//! Includes the generated version.rs from the build script, providing a single source of truth.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Schema version stamped into every consolidated snapshot
pub fn snapshot_schema_version() -> u32 {
    SNAPSHOT_SCHEMA_VERSION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Long version string used by `--version`
pub fn long_version() -> String {
    format!(
        "{} (snapshot schema {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        SNAPSHOT_SCHEMA_VERSION,
        BUILD_TIME,
        GIT_HASH
    )
}
