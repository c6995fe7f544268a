use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::extractor::ExtractedEvidence;
use crate::capability::{AccessLevel, CapabilityHierarchy};
use crate::registry::RoleTable;

/// Built-in roles; only roles outside this list are reported as custom.
pub const STANDARD_ROLES: &[&str] = &[
    "administrator",
    "editor",
    "author",
    "contributor",
    "subscriber",
];

/// Classified permission evidence for one route handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEvidence {
    pub access_level: AccessLevel,
    pub capabilities: Vec<String>,
    pub custom_roles: Vec<String>,
    pub description: String,
}

/// Access verdict plus the custom roles that satisfy the evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub access_level: AccessLevel,
    pub custom_roles: Vec<String>,
}

/// Assigns access levels using a capability hierarchy and the host's roles.
pub struct AccessClassifier<'a> {
    hierarchy: &'a CapabilityHierarchy,
    roles: &'a RoleTable,
}

impl<'a> AccessClassifier<'a> {
    pub fn new(hierarchy: &'a CapabilityHierarchy, roles: &'a RoleTable) -> Self {
        Self { hierarchy, roles }
    }

    pub fn classify(&self, evidence: &ExtractedEvidence) -> Classification {
        if evidence.capabilities.is_empty() {
            // Nothing extracted reads as `unknown`, while unrecognized names
            // below fall back to `admin`.
            return Classification {
                access_level: evidence.hint.unwrap_or(AccessLevel::Unknown),
                custom_roles: Vec::new(),
            };
        }

        Classification {
            access_level: self.access_level(&evidence.capabilities),
            custom_roles: self.custom_roles(&evidence.capabilities),
        }
    }

    /// Classify and fold the result into the evidence.
    pub fn evaluate(&self, evidence: ExtractedEvidence) -> PermissionEvidence {
        let classification = self.classify(&evidence);
        PermissionEvidence {
            access_level: classification.access_level,
            capabilities: evidence.capabilities,
            custom_roles: classification.custom_roles,
            description: evidence.description,
        }
    }

    fn access_level(&self, capabilities: &[String]) -> AccessLevel {
        if capabilities
            .iter()
            .any(|cap| self.hierarchy.is_admin_capability(cap))
        {
            return AccessLevel::Admin;
        }

        self.hierarchy
            .lowest_tier(capabilities)
            .map(AccessLevel::from)
            .unwrap_or(AccessLevel::Admin)
    }

    /// Non-standard roles granting any of `capabilities`, sorted.
    pub fn custom_roles(&self, capabilities: &[String]) -> Vec<String> {
        let mut roles = BTreeSet::new();
        for cap in capabilities {
            for (name, role) in self.roles {
                if STANDARD_ROLES.contains(&name.as_str()) {
                    continue;
                }
                if role.grants(cap) {
                    roles.insert(name.clone());
                }
            }
        }
        roles.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoleDefinition;

    fn evidence(caps: &[&str], hint: Option<AccessLevel>) -> ExtractedEvidence {
        ExtractedEvidence {
            description: "test".into(),
            hint,
            capabilities: caps.iter().map(|c| c.to_string()).collect(),
            issues: vec![],
        }
    }

    fn role(caps: &[(&str, bool)]) -> RoleDefinition {
        RoleDefinition {
            name: None,
            capabilities: caps.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn hint_used_when_no_capabilities() {
        let h = CapabilityHierarchy::default();
        let roles = RoleTable::new();
        let c = AccessClassifier::new(&h, &roles);
        assert_eq!(
            c.classify(&evidence(&[], Some(AccessLevel::Public))).access_level,
            AccessLevel::Public
        );
        assert_eq!(
            c.classify(&evidence(&[], Some(AccessLevel::Admin))).access_level,
            AccessLevel::Admin
        );
        assert_eq!(
            c.classify(&evidence(&[], Some(AccessLevel::Custom))).access_level,
            AccessLevel::Custom
        );
        assert_eq!(
            c.classify(&evidence(&[], None)).access_level,
            AccessLevel::Unknown
        );
    }

    #[test]
    fn admin_capability_wins_over_lower_tiers() {
        let h = CapabilityHierarchy::default();
        let roles = RoleTable::new();
        let c = AccessClassifier::new(&h, &roles);
        let ev = evidence(&["read", "edit_posts", "manage_options"], None);
        assert_eq!(c.classify(&ev).access_level, AccessLevel::Admin);
    }

    #[test]
    fn lowest_tier_is_verdict() {
        let h = CapabilityHierarchy::default();
        let roles = RoleTable::new();
        let c = AccessClassifier::new(&h, &roles);
        assert_eq!(
            c.classify(&evidence(&["edit_posts"], None)).access_level,
            AccessLevel::Contributor
        );
        assert_eq!(
            c.classify(&evidence(&["moderate_comments", "publish_posts"], None))
                .access_level,
            AccessLevel::Author
        );
        assert_eq!(
            c.classify(&evidence(&["read"], None)).access_level,
            AccessLevel::Subscriber
        );
    }

    #[test]
    fn unrecognized_capability_falls_back_to_admin() {
        let h = CapabilityHierarchy::default();
        let roles = RoleTable::new();
        let c = AccessClassifier::new(&h, &roles);
        assert_eq!(
            c.classify(&evidence(&["acme_manage_widgets"], None)).access_level,
            AccessLevel::Admin
        );
    }

    #[test]
    fn extended_admin_set_applies() {
        let mut h = CapabilityHierarchy::default();
        h.extend_admin(["manage_woocommerce"]);
        let roles = RoleTable::new();
        let c = AccessClassifier::new(&h, &roles);
        assert_eq!(
            c.classify(&evidence(&["read", "manage_woocommerce"], None))
                .access_level,
            AccessLevel::Admin
        );
    }

    #[test]
    fn custom_roles_skip_standard_roles() {
        let h = CapabilityHierarchy::default();
        let mut roles = RoleTable::new();
        roles.insert("editor".into(), role(&[("edit_posts", true)]));
        roles.insert("shop_manager".into(), role(&[("edit_posts", true)]));
        roles.insert("seo_editor".into(), role(&[("edit_posts", false), ("read", true)]));
        roles.insert("auditor".into(), role(&[("read", true)]));

        let c = AccessClassifier::new(&h, &roles);
        let result = c.classify(&evidence(&["edit_posts", "read"], None));
        assert_eq!(result.custom_roles, vec!["auditor", "seo_editor", "shop_manager"]);
    }

    #[test]
    fn evaluate_keeps_capability_order() {
        let h = CapabilityHierarchy::default();
        let roles = RoleTable::new();
        let c = AccessClassifier::new(&h, &roles);
        let ev = c.evaluate(evidence(&["publish_posts", "edit_posts"], None));
        assert_eq!(ev.capabilities, vec!["publish_posts", "edit_posts"]);
        assert_eq!(ev.access_level, AccessLevel::Contributor);
        assert_eq!(ev.description, "test");
    }
}
