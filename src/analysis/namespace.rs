//! Namespace grouping and plugin display names.
//!
//! A route's namespace is its first path segment and stands in for the
//! plugin that registered it.

use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::registry::{CallableTarget, RegisteredRoute};

/// Namespaces owned by the host framework itself.
pub const DEFAULT_RESERVED_NAMESPACES: &[&str] = &["wp", "oembed"];

/// Well-known third-party namespaces.
const KNOWN_NAMESPACES: &[(&str, &str)] = &[
    ("wc", "WooCommerce"),
    ("wc-admin", "WooCommerce Admin"),
    ("yoast", "Yoast SEO"),
    ("elementor", "Elementor"),
    ("buddypress", "BuddyPress"),
    ("bbpress", "bbPress"),
    ("learndash", "LearnDash"),
    ("tribe", "The Events Calendar"),
    ("gravityforms", "Gravity Forms"),
    ("contact-form-7", "Contact Form 7"),
    ("jetpack", "Jetpack"),
    ("woocommerce", "WooCommerce"),
];

static FIRST_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/([^/]+)").unwrap());

/// Vendor prefix of a class name: everything before the first `_` or `\`.
static CLASS_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)(_|\\)").unwrap());

/// A namespace and the number of routes registered under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceGroup {
    pub namespace: String,
    pub display_name: String,
    pub route_count: usize,
}

/// First path segment of `path`, if any.
pub fn namespace_of(path: &str) -> Option<&str> {
    FIRST_SEGMENT_RE
        .captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Replace `-`/`_` with spaces and upper-case the first letter of each word.
pub fn format_display_name(raw: &str) -> String {
    raw.replace(['-', '_'], " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Resolves namespaces to display names and decides which are reserved.
#[derive(Debug, Clone)]
pub struct NamespaceCatalog {
    reserved: Vec<String>,
    known: HashMap<String, String>,
}

impl Default for NamespaceCatalog {
    fn default() -> Self {
        Self {
            reserved: DEFAULT_RESERVED_NAMESPACES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            known: KNOWN_NAMESPACES
                .iter()
                .map(|(ns, name)| (ns.to_string(), name.to_string()))
                .collect(),
        }
    }
}

impl NamespaceCatalog {
    /// Replace the reserved namespace list.
    pub fn with_reserved<I, S>(mut self, reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved = reserved.into_iter().map(Into::into).collect();
        self
    }

    /// Add or replace known display names.
    pub fn with_display_names<I, K, V>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.known
            .extend(names.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Whole first-segment comparison; `oembed-proxy` is not `oembed`.
    pub fn is_reserved(&self, namespace: &str) -> bool {
        self.reserved.iter().any(|r| r == namespace)
    }

    /// Namespace of `path` unless it is missing or reserved.
    pub fn plugin_namespace<'p>(&self, path: &'p str) -> Option<&'p str> {
        namespace_of(path).filter(|ns| !self.is_reserved(ns))
    }

    /// Display name from the handler's class prefix, else the known table,
    /// else the formatted namespace.
    pub fn display_name(&self, namespace: &str, callback: Option<&CallableTarget>) -> String {
        let class_prefix = callback
            .and_then(CallableTarget::class_name)
            .and_then(|class| CLASS_PREFIX_RE.captures(class))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());

        if let Some(prefix) = class_prefix {
            return format_display_name(prefix);
        }

        self.known
            .get(namespace)
            .cloned()
            .unwrap_or_else(|| format_display_name(namespace))
    }

    /// Group routes by namespace, skipping reserved ones. The display name
    /// comes from the first handler of the first route seen in each
    /// namespace. Sorted by display name.
    pub fn group(&self, routes: &[RegisteredRoute]) -> Vec<NamespaceGroup> {
        let mut groups: IndexMap<&str, NamespaceGroup> = IndexMap::new();

        for route in routes {
            let Some(namespace) = self.plugin_namespace(&route.path) else {
                continue;
            };
            groups
                .entry(namespace)
                .or_insert_with(|| NamespaceGroup {
                    namespace: namespace.to_string(),
                    display_name: self.display_name(
                        namespace,
                        route.handlers.first().and_then(|h| h.callback.as_ref()),
                    ),
                    route_count: 0,
                })
                .route_count += 1;
        }

        let mut groups: Vec<NamespaceGroup> = groups.into_values().collect();
        groups.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Handler;
    use proptest::prelude::*;

    fn route(path: &str) -> RegisteredRoute {
        RegisteredRoute::new(path, vec![Handler::with_methods(["GET"])])
    }

    #[test]
    fn namespace_is_first_segment() {
        assert_eq!(namespace_of("/acme/v1/items"), Some("acme"));
        assert_eq!(namespace_of("/acme"), Some("acme"));
        assert_eq!(namespace_of("/"), None);
        assert_eq!(namespace_of("acme/v1"), None);
    }

    #[test]
    fn formats_raw_names() {
        assert_eq!(format_display_name("my-cool_plugin"), "My Cool Plugin");
        assert_eq!(format_display_name("acme"), "Acme");
        assert_eq!(format_display_name("wpForms"), "WpForms");
    }

    #[test]
    fn display_name_prefers_class_prefix() {
        let catalog = NamespaceCatalog::default();
        let target = CallableTarget::Method {
            class: "Yoast_Indexing_Route".into(),
            method: "run".into(),
        };
        assert_eq!(catalog.display_name("yoast", Some(&target)), "Yoast");

        let namespaced = CallableTarget::Method {
            class: "Acme\\Rest\\Items".into(),
            method: "get".into(),
        };
        assert_eq!(catalog.display_name("acme", Some(&namespaced)), "Acme");
    }

    #[test]
    fn display_name_falls_back_to_known_then_format() {
        let catalog = NamespaceCatalog::default();
        let plain = CallableTarget::Method {
            class: "Controller".into(),
            method: "get".into(),
        };
        assert_eq!(catalog.display_name("wc", Some(&plain)), "WooCommerce");
        assert_eq!(catalog.display_name("tribe", None), "The Events Calendar");
        assert_eq!(catalog.display_name("my-plugin", None), "My Plugin");
    }

    #[test]
    fn configured_names_override_known_table() {
        let catalog = NamespaceCatalog::default().with_display_names([("wc", "Shop")]);
        assert_eq!(catalog.display_name("wc", None), "Shop");
    }

    #[test]
    fn group_counts_and_sorts() {
        let catalog = NamespaceCatalog::default();
        let routes = vec![
            route("/zeta/v1/a"),
            route("/wp/v2/posts"),
            route("/zeta/v1/b"),
            route("/oembed/1.0/embed"),
            route("/alpha/v1/a"),
            route("/"),
        ];
        let groups = catalog.group(&routes);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].namespace, "alpha");
        assert_eq!(groups[0].route_count, 1);
        assert_eq!(groups[1].display_name, "Zeta");
        assert_eq!(groups[1].route_count, 2);
    }

    #[test]
    fn reserved_match_is_whole_segment() {
        let catalog = NamespaceCatalog::default();
        assert_eq!(catalog.plugin_namespace("/wp/v3/menus"), None);
        assert_eq!(catalog.plugin_namespace("/oembed-proxy/v1/fetch"), Some("oembed-proxy"));
        assert_eq!(catalog.plugin_namespace("/wpforms/v1/entries"), Some("wpforms"));
    }

    #[test]
    fn custom_reserved_list_replaces_default() {
        let catalog = NamespaceCatalog::default().with_reserved(["internal"]);
        assert!(catalog.is_reserved("internal"));
        assert!(!catalog.is_reserved("wp"));
    }

    proptest! {
        #[test]
        fn groups_partition_plugin_routes(
            namespaces in prop::collection::vec(
                prop::sample::select(vec!["wp", "oembed", "acme", "shop", "forms", "wc"]),
                0..40,
            )
        ) {
            let catalog = NamespaceCatalog::default();
            let routes: Vec<RegisteredRoute> = namespaces
                .iter()
                .enumerate()
                .map(|(i, ns)| route(&format!("/{ns}/v1/r{i}")))
                .collect();
            let expected = namespaces.iter().filter(|ns| !catalog.is_reserved(ns)).count();
            let total: usize = catalog.group(&routes).iter().map(|g| g.route_count).sum();
            prop_assert_eq!(total, expected);
        }
    }
}
