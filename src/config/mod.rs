use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::namespace::{NamespaceCatalog, DEFAULT_RESERVED_NAMESPACES};
use crate::analysis::Policy;
use crate::capability::{CapabilityHierarchy, Tier};
use crate::error::{Result, ScanError};

/// Top-level configuration from `.permscan.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub namespaces: NamespaceConfig,
    #[serde(default)]
    pub policy: Policy,
}

/// Extensions to the built-in capability hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Capability names that always imply administrator access.
    #[serde(default)]
    pub extra_admin_capabilities: Vec<String>,
    /// Extra capability names per tier (`subscriber` ... `editor`, `admin`).
    #[serde(default)]
    pub tiers: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Namespaces owned by the host framework, never reported.
    #[serde(default = "default_reserved")]
    pub reserved: Vec<String>,
    /// Display names for namespaces, taking precedence over the built-in
    /// table.
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
}

fn default_reserved() -> Vec<String> {
    DEFAULT_RESERVED_NAMESPACES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            reserved: default_reserved(),
            display_names: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Default hierarchy with the configured extensions applied.
    pub fn capability_hierarchy(&self) -> Result<CapabilityHierarchy> {
        let mut hierarchy = CapabilityHierarchy::default();
        hierarchy.extend_admin(self.hierarchy.extra_admin_capabilities.iter().cloned());

        for (name, capabilities) in &self.hierarchy.tiers {
            let tier = Tier::from_str_lenient(name)
                .ok_or_else(|| ScanError::Config(format!("unknown tier '{name}'")))?;
            hierarchy.extend_tier(tier, capabilities.iter().cloned());
        }

        Ok(hierarchy)
    }

    pub fn namespace_catalog(&self) -> NamespaceCatalog {
        NamespaceCatalog::default()
            .with_reserved(self.namespaces.reserved.iter().cloned())
            .with_display_names(self.namespaces.display_names.clone())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# permscan configuration

[hierarchy]
# Capabilities that always mean administrator-only access.
# extra_admin_capabilities = ["manage_woocommerce"]

# Extra capabilities per tier (subscriber, contributor, author, editor, admin).
# [hierarchy.tiers]
# editor = ["edit_products"]

[namespaces]
# Framework-owned namespaces that are never reported.
reserved = ["wp", "oembed"]

# Display names for plugin namespaces.
# [namespaces.display_names]
# acme = "Acme Toolkit"

[policy]
# Minimum risk to fail the inspection (low, medium, high).
fail_on = "high"

# Routes to leave out of the results (path or "METHOD /path").
# ignore_routes = ["/acme/v1/ping"]

# Per-route risk overrides. Keys are a path or "METHOD /path".
# [policy.overrides]
# "/acme/v1/webhook" = "low"
# "POST /acme/v1/posts" = "medium"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RiskTier;

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/permscan.toml")).unwrap();
        assert_eq!(config.namespaces.reserved, vec!["wp", "oembed"]);
        assert_eq!(config.policy.fail_on, RiskTier::High);
    }

    #[test]
    fn starter_toml_parses() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config.policy.fail_on, RiskTier::High);
        assert!(config.hierarchy.extra_admin_capabilities.is_empty());
    }

    #[test]
    fn hierarchy_extensions_apply() {
        let config: Config = toml::from_str(
            r#"
            [hierarchy]
            extra_admin_capabilities = ["manage_woocommerce"]
            [hierarchy.tiers]
            editor = ["edit_products"]
            "#,
        )
        .unwrap();
        let hierarchy = config.capability_hierarchy().unwrap();
        assert!(hierarchy.is_admin_capability("manage_woocommerce"));
        assert_eq!(hierarchy.tier_of("edit_products"), Some(Tier::Editor));
    }

    #[test]
    fn unknown_tier_is_config_error() {
        let config: Config = toml::from_str(
            r#"
            [hierarchy.tiers]
            overlord = ["everything"]
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.capability_hierarchy(),
            Err(ScanError::Config(_))
        ));
    }

    #[test]
    fn namespace_settings_feed_catalog() {
        let config: Config = toml::from_str(
            r#"
            [namespaces]
            reserved = ["wp", "internal"]
            [namespaces.display_names]
            acme = "Acme Toolkit"
            "#,
        )
        .unwrap();
        let catalog = config.namespace_catalog();
        assert!(catalog.is_reserved("internal"));
        assert!(!catalog.is_reserved("oembed"));
        assert_eq!(catalog.display_name("acme", None), "Acme Toolkit");
    }

    #[test]
    fn policy_section_parses() {
        let config: Config = toml::from_str(
            r#"
            [policy]
            fail_on = "medium"
            ignore_routes = ["/acme/v1/ping"]
            [policy.overrides]
            "/acme/v1/hook" = "low"
            "#,
        )
        .unwrap();
        assert_eq!(config.policy.fail_on, RiskTier::Medium);
        assert!(config.policy.ignore_routes.contains("/acme/v1/ping"));
        assert_eq!(config.policy.overrides["/acme/v1/hook"], RiskTier::Low);
    }
}
