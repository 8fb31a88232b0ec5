//! Parsing configuration.
//!
//! The engine's per-record recovery discipline is mandatory, not
//! configurable — a malformed dylib command always becomes a warning rather
//! than aborting the slice. The one behavioral knob the format genuinely
//! leaves ambiguous is how permissively the entitlements blob is scanned for
//! boolean capability keys (see the doc comment on [`EntitlementsScan`]), so
//! that is what `ParseOptions` exposes.

/// How [`crate::mach::codesign`] decides whether a capability key's value is
/// `<true/>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementsScan {
    /// Match `<true/>` anywhere after the key, even past later, unrelated
    /// keys. This is the default, for compatibility with callers that
    /// already depend on that looser behavior.
    Permissive,
    /// Require the `<true/>` to be the value immediately following the
    /// key's closing tag, ignoring unrelated keys that happen to appear
    /// later in the plist.
    Strict,
}

impl Default for EntitlementsScan {
    fn default() -> Self {
        EntitlementsScan::Permissive
    }
}

/// Options accepted by [`crate::parse_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub entitlements_scan: EntitlementsScan,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the source-preserving, anywhere-after-the-key entitlements scan.
    pub fn permissive() -> Self {
        ParseOptions {
            entitlements_scan: EntitlementsScan::Permissive,
        }
    }

    /// Use the positionally-strict entitlements scan.
    pub fn strict_entitlements() -> Self {
        ParseOptions {
            entitlements_scan: EntitlementsScan::Strict,
        }
    }

    pub fn with_entitlements_scan(mut self, scan: EntitlementsScan) -> Self {
        self.entitlements_scan = scan;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_permissive() {
        assert_eq!(ParseOptions::default().entitlements_scan, EntitlementsScan::Permissive);
    }

    #[test]
    fn builder_overrides_default() {
        let opts = ParseOptions::new().with_entitlements_scan(EntitlementsScan::Strict);
        assert_eq!(opts.entitlements_scan, EntitlementsScan::Strict);
        assert_eq!(opts, ParseOptions::strict_entitlements());
    }
}
