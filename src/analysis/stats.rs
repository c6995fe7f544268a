use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::risk::{has_mutating_method, RiskTier};
use super::RouteAnalysis;
use crate::capability::AccessLevel;

/// Aggregate counters over analyzed routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total: usize,
    pub by_access_level: BTreeMap<AccessLevel, usize>,
    pub by_risk_level: BTreeMap<RiskTier, usize>,
    pub by_namespace: BTreeMap<String, usize>,
    pub public_write_routes: usize,
    pub admin_only_routes: usize,
}

impl AnalysisStats {
    pub fn from_routes(routes: &[RouteAnalysis]) -> Self {
        let mut stats = Self {
            total: routes.len(),
            ..Default::default()
        };

        for route in routes {
            *stats.by_access_level.entry(route.access_level).or_default() += 1;
            *stats.by_risk_level.entry(route.risk_level).or_default() += 1;
            *stats
                .by_namespace
                .entry(route.namespace.clone())
                .or_default() += 1;

            if route.access_level == AccessLevel::Public && has_mutating_method(&route.methods) {
                stats.public_write_routes += 1;
            }
            if route.access_level == AccessLevel::Admin {
                stats.admin_only_routes += 1;
            }
        }

        stats
    }

    pub fn count_risk(&self, tier: RiskTier) -> usize {
        self.by_risk_level.get(&tier).copied().unwrap_or(0)
    }
}
