use serde::Serialize;

/// Compile-time build metadata produced by `build.rs`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildMetadata {
    /// One-line banner, e.g. `koperasi_core 0.0.1 (abc1234, release)`.
    pub fn banner(&self) -> String {
        format!(
            "koperasi_core {} ({}, {})",
            self.version, self.git_hash, self.profile
        )
    }
}

/// Returns the statically-embedded build metadata.
pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("KOPERASI_CORE_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("KOPERASI_CORE_BUILD_STATUS").unwrap_or("unknown"),
        timestamp: option_env!("KOPERASI_CORE_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("KOPERASI_CORE_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("KOPERASI_CORE_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("KOPERASI_CORE_BUILD_RUSTC").unwrap_or("unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_names_crate_version() {
        let banner = current().banner();
        assert!(banner.starts_with(&format!("koperasi_core {}", env!("CARGO_PKG_VERSION"))));
    }
}
