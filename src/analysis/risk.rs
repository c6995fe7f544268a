use serde::{Deserialize, Serialize};

use crate::capability::AccessLevel;

/// HTTP methods that change server state.
pub const MUTATING_METHODS: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];

/// Coarse severity of exposing a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// The scoring rule that decided a route's tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// Anyone can change state.
    PublicWrite,
    /// Anyone can read.
    PublicRead,
    /// A non-admin user can change state.
    ProtectedWrite,
    /// Admin-gated, or a gated read.
    Restricted,
}

impl RiskFactor {
    /// Decide which rule applies. Rules are tried from most to least severe.
    pub fn assess<S: AsRef<str>>(access_level: AccessLevel, methods: &[S]) -> Self {
        let writes = has_mutating_method(methods);

        if access_level == AccessLevel::Public && writes {
            Self::PublicWrite
        } else if access_level == AccessLevel::Public {
            Self::PublicRead
        } else if access_level != AccessLevel::Admin && writes {
            Self::ProtectedWrite
        } else {
            Self::Restricted
        }
    }

    pub fn tier(&self) -> RiskTier {
        match self {
            Self::PublicWrite => RiskTier::High,
            Self::PublicRead | Self::ProtectedWrite => RiskTier::Medium,
            Self::Restricted => RiskTier::Low,
        }
    }

    pub fn rule_id(&self) -> &'static str {
        match self {
            Self::PublicWrite => "ROUTE-001",
            Self::PublicRead => "ROUTE-002",
            Self::ProtectedWrite => "ROUTE-003",
            Self::Restricted => "ROUTE-004",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::PublicWrite => "Unauthenticated write access",
            Self::PublicRead => "Unauthenticated read access",
            Self::ProtectedWrite => "Write access below administrator",
            Self::Restricted => "Administrator-only or gated read access",
        }
    }
}

/// Risk tier for a route with the given access level and methods.
pub fn score<S: AsRef<str>>(access_level: AccessLevel, methods: &[S]) -> RiskTier {
    RiskFactor::assess(access_level, methods).tier()
}

pub fn is_mutating(method: &str) -> bool {
    MUTATING_METHODS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

pub fn has_mutating_method<S: AsRef<str>>(methods: &[S]) -> bool {
    methods.iter().any(|m| is_mutating(m.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LEVELS: [AccessLevel; 8] = [
        AccessLevel::Public,
        AccessLevel::Subscriber,
        AccessLevel::Contributor,
        AccessLevel::Author,
        AccessLevel::Editor,
        AccessLevel::Admin,
        AccessLevel::Custom,
        AccessLevel::Unknown,
    ];

    #[test]
    fn public_write_is_high() {
        assert_eq!(score(AccessLevel::Public, &["POST"]), RiskTier::High);
        assert_eq!(score(AccessLevel::Public, &["GET", "delete"]), RiskTier::High);
    }

    #[test]
    fn public_read_is_medium() {
        assert_eq!(score(AccessLevel::Public, &["GET"]), RiskTier::Medium);
        let none: [&str; 0] = [];
        assert_eq!(score(AccessLevel::Public, &none), RiskTier::Medium);
    }

    #[test]
    fn protected_write_is_medium() {
        assert_eq!(score(AccessLevel::Contributor, &["PUT"]), RiskTier::Medium);
        assert_eq!(score(AccessLevel::Unknown, &["PATCH"]), RiskTier::Medium);
        assert_eq!(score(AccessLevel::Custom, &["DELETE"]), RiskTier::Medium);
    }

    #[test]
    fn admin_and_gated_reads_are_low() {
        assert_eq!(score(AccessLevel::Admin, &["POST", "DELETE"]), RiskTier::Low);
        assert_eq!(score(AccessLevel::Editor, &["GET"]), RiskTier::Low);
        assert_eq!(score(AccessLevel::Unknown, &["GET", "HEAD"]), RiskTier::Low);
    }

    #[test]
    fn factor_names_the_rule() {
        assert_eq!(
            RiskFactor::assess(AccessLevel::Public, &["POST"]),
            RiskFactor::PublicWrite
        );
        assert_eq!(
            RiskFactor::assess(AccessLevel::Author, &["POST"]),
            RiskFactor::ProtectedWrite
        );
        assert_eq!(RiskFactor::PublicRead.rule_id(), "ROUTE-002");
    }

    fn method_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["GET", "HEAD", "OPTIONS", "POST", "PUT", "PATCH", "DELETE"])
            .prop_map(String::from)
    }

    proptest! {
        #[test]
        fn adding_a_mutating_method_never_lowers_risk(
            level in prop::sample::select(LEVELS.to_vec()),
            methods in prop::collection::vec(method_strategy(), 0..5),
            extra in prop::sample::select(MUTATING_METHODS.to_vec()),
        ) {
            let before = score(level, &methods);
            let mut with_write = methods.clone();
            with_write.push(extra.to_string());
            prop_assert!(score(level, &with_write) >= before);
        }
    }
}
