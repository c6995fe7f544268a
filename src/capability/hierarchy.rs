use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Privilege tiers, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Subscriber,
    Contributor,
    Author,
    Editor,
    Admin,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Subscriber,
        Tier::Contributor,
        Tier::Author,
        Tier::Editor,
        Tier::Admin,
    ];

    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "subscriber" => Some(Self::Subscriber),
            "contributor" => Some(Self::Contributor),
            "author" => Some(Self::Author),
            "editor" => Some(Self::Editor),
            "admin" | "administrator" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscriber => write!(f, "subscriber"),
            Self::Contributor => write!(f, "contributor"),
            Self::Author => write!(f, "author"),
            Self::Editor => write!(f, "editor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The classifier's verdict on the minimum privilege a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Subscriber,
    Contributor,
    Author,
    Editor,
    Admin,
    Custom,
    Unknown,
}

impl AccessLevel {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Self::Public),
            "custom" => Some(Self::Custom),
            "unknown" => Some(Self::Unknown),
            other => Tier::from_str_lenient(other).map(Self::from),
        }
    }

    /// Label used in human-facing reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin Only",
            Self::Editor => "Editor+",
            Self::Author => "Author+",
            Self::Contributor => "Contributor+",
            Self::Subscriber => "Subscriber+",
            Self::Public => "Public",
            Self::Custom => "Custom",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<Tier> for AccessLevel {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Subscriber => Self::Subscriber,
            Tier::Contributor => Self::Contributor,
            Tier::Author => Self::Author,
            Tier::Editor => Self::Editor,
            Tier::Admin => Self::Admin,
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Subscriber => write!(f, "subscriber"),
            Self::Contributor => write!(f, "contributor"),
            Self::Author => write!(f, "author"),
            Self::Editor => write!(f, "editor"),
            Self::Admin => write!(f, "admin"),
            Self::Custom => write!(f, "custom"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Capabilities that always imply administrator access.
const ADMIN_CAPABILITIES: &[&str] = &[
    "manage_options",
    "install_plugins",
    "activate_plugins",
    "edit_plugins",
    "delete_plugins",
    "update_plugins",
    "manage_categories",
    "manage_links",
    "upload_files",
    "import",
    "unfiltered_html",
    "edit_themes",
    "install_themes",
    "update_themes",
    "delete_themes",
    "edit_users",
    "list_users",
    "remove_users",
    "add_users",
    "create_users",
    "delete_users",
    "promote_users",
];

const SUBSCRIBER_CAPABILITIES: &[&str] = &["read"];

const CONTRIBUTOR_CAPABILITIES: &[&str] = &["edit_posts", "delete_posts"];

const AUTHOR_CAPABILITIES: &[&str] = &["publish_posts", "upload_files"];

const EDITOR_CAPABILITIES: &[&str] = &[
    "edit_others_posts",
    "delete_others_posts",
    "edit_published_posts",
    "delete_published_posts",
    "edit_pages",
    "delete_pages",
    "publish_pages",
    "edit_others_pages",
    "delete_others_pages",
    "edit_published_pages",
    "delete_published_pages",
    "moderate_comments",
];

/// Ordered capability tiers plus the explicit admin capability set.
///
/// Each non-admin tier lists the capabilities it introduces; a tier also
/// holds everything below it, so the lowest tier containing a capability is
/// the least privileged role that passes a check for it.
#[derive(Debug, Clone)]
pub struct CapabilityHierarchy {
    tiers: Vec<(Tier, Vec<String>)>,
    admin: HashSet<String>,
}

impl Default for CapabilityHierarchy {
    fn default() -> Self {
        let owned = |caps: &[&str]| caps.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        Self {
            tiers: vec![
                (Tier::Subscriber, owned(SUBSCRIBER_CAPABILITIES)),
                (Tier::Contributor, owned(CONTRIBUTOR_CAPABILITIES)),
                (Tier::Author, owned(AUTHOR_CAPABILITIES)),
                (Tier::Editor, owned(EDITOR_CAPABILITIES)),
            ],
            admin: ADMIN_CAPABILITIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CapabilityHierarchy {
    /// Add capability names to the admin set.
    pub fn extend_admin<I, S>(&mut self, capabilities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin.extend(capabilities.into_iter().map(Into::into));
    }

    /// Add capability names to a tier. Capabilities added to `Admin` join
    /// the admin set.
    pub fn extend_tier<I, S>(&mut self, tier: Tier, capabilities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if tier == Tier::Admin {
            self.extend_admin(capabilities);
            return;
        }
        if let Some((_, caps)) = self.tiers.iter_mut().find(|(t, _)| *t == tier) {
            for cap in capabilities.into_iter().map(Into::into) {
                if !caps.contains(&cap) {
                    caps.push(cap);
                }
            }
        }
    }

    pub fn is_admin_capability(&self, capability: &str) -> bool {
        self.admin.contains(capability)
    }

    /// Lowest tier introducing `capability` at or below it.
    pub fn tier_of(&self, capability: &str) -> Option<Tier> {
        self.tiers
            .iter()
            .find(|(_, caps)| caps.iter().any(|c| c == capability))
            .map(|(tier, _)| *tier)
    }

    /// Lowest tier reached by any of `capabilities`.
    pub fn lowest_tier<S: AsRef<str>>(&self, capabilities: &[S]) -> Option<Tier> {
        capabilities
            .iter()
            .filter_map(|cap| self.tier_of(cap.as_ref()))
            .min()
    }

    /// Capabilities introduced by `tier`. For `Admin` this is the admin set,
    /// sorted.
    pub fn capabilities(&self, tier: Tier) -> Vec<String> {
        if tier == Tier::Admin {
            let mut caps: Vec<String> = self.admin.iter().cloned().collect();
            caps.sort();
            return caps;
        }
        self.tiers
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, caps)| caps.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(Tier::Subscriber < Tier::Contributor);
        assert!(Tier::Editor < Tier::Admin);
    }

    #[test]
    fn edit_posts_is_contributor() {
        let h = CapabilityHierarchy::default();
        assert_eq!(h.tier_of("edit_posts"), Some(Tier::Contributor));
        assert_eq!(h.tier_of("read"), Some(Tier::Subscriber));
        assert_eq!(h.tier_of("moderate_comments"), Some(Tier::Editor));
        assert_eq!(h.tier_of("manage_options"), None);
    }

    #[test]
    fn lowest_tier_picks_weakest_capability() {
        let h = CapabilityHierarchy::default();
        let caps = ["edit_pages", "publish_posts", "edit_posts"];
        assert_eq!(h.lowest_tier(&caps), Some(Tier::Contributor));
        let none: [&str; 1] = ["acme_custom_cap"];
        assert_eq!(h.lowest_tier(&none), None);
    }

    #[test]
    fn extend_admin_adds_capabilities() {
        let mut h = CapabilityHierarchy::default();
        assert!(!h.is_admin_capability("manage_woocommerce"));
        h.extend_admin(["manage_woocommerce"]);
        assert!(h.is_admin_capability("manage_woocommerce"));
    }

    #[test]
    fn extend_tier_appends_without_duplicates() {
        let mut h = CapabilityHierarchy::default();
        h.extend_tier(Tier::Editor, ["edit_products", "moderate_comments"]);
        let editor = h.capabilities(Tier::Editor);
        assert_eq!(editor.iter().filter(|c| *c == "moderate_comments").count(), 1);
        assert_eq!(h.tier_of("edit_products"), Some(Tier::Editor));

        h.extend_tier(Tier::Admin, ["manage_shop"]);
        assert!(h.is_admin_capability("manage_shop"));
    }

    #[test]
    fn access_level_parses_tiers_and_labels() {
        assert_eq!(AccessLevel::from_str_lenient("Editor"), Some(AccessLevel::Editor));
        assert_eq!(
            AccessLevel::from_str_lenient("administrator"),
            Some(AccessLevel::Admin)
        );
        assert_eq!(AccessLevel::from_str_lenient("nope"), None);
        assert_eq!(AccessLevel::Admin.label(), "Admin Only");
    }
}
