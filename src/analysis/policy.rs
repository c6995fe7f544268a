use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::risk::RiskTier;
use super::RouteAnalysis;

/// Pass/fail decision over the routes left after the policy ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub total_routes: usize,
    pub effective_routes: usize,
    pub highest_risk: Option<RiskTier>,
    pub fail_threshold: RiskTier,
}

/// Routes as the policy sees them, and the verdict they produce.
#[derive(Debug, Clone)]
pub struct Enforced {
    pub routes: Vec<RouteAnalysis>,
    pub verdict: PolicyVerdict,
}

/// Policy configuration loaded from `.permscan.toml`.
///
/// Keys in `ignore_routes` and `overrides` are either a route path
/// (`/acme/v1/posts`), which covers every handler of the route, or a
/// method and path (`POST /acme/v1/posts`), which covers the handlers
/// accepting that method. A method key wins over a path key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Minimum risk tier that fails the inspection.
    #[serde(default = "default_fail_on")]
    pub fail_on: RiskTier,
    #[serde(default)]
    pub ignore_routes: HashSet<String>,
    #[serde(default)]
    pub overrides: HashMap<String, RiskTier>,
}

fn default_fail_on() -> RiskTier {
    RiskTier::High
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fail_on: RiskTier::High,
            ignore_routes: HashSet::new(),
            overrides: HashMap::new(),
        }
    }
}

impl Policy {
    /// Drop ignored handlers, rewrite overridden risks, then judge what is left.
    pub fn enforce(&self, routes: Vec<RouteAnalysis>) -> Enforced {
        let total_routes = routes.len();
        let routes: Vec<RouteAnalysis> = routes
            .into_iter()
            .filter(|r| !self.is_ignored(r))
            .map(|mut r| {
                if let Some(risk) = self.override_for(&r) {
                    r.risk_level = risk;
                }
                r
            })
            .collect();

        let highest_risk = routes.iter().map(|r| r.risk_level).max();
        let verdict = PolicyVerdict {
            pass: highest_risk.map_or(true, |risk| risk < self.fail_on),
            total_routes,
            effective_routes: routes.len(),
            highest_risk,
            fail_threshold: self.fail_on,
        };

        Enforced { routes, verdict }
    }

    /// Verdict only, for callers that keep their own copy of the routes.
    pub fn evaluate(&self, routes: &[RouteAnalysis]) -> PolicyVerdict {
        self.enforce(routes.to_vec()).verdict
    }

    fn is_ignored(&self, route: &RouteAnalysis) -> bool {
        keys_for(route).any(|key| self.ignore_routes.contains(&key))
    }

    fn override_for(&self, route: &RouteAnalysis) -> Option<RiskTier> {
        keys_for(route).find_map(|key| self.overrides.get(&key).copied())
    }
}

/// Method keys first, then the bare path.
fn keys_for(route: &RouteAnalysis) -> impl Iterator<Item = String> + '_ {
    route
        .methods
        .iter()
        .map(move |m| format!("{} {}", m.to_ascii_uppercase(), route.route))
        .chain(std::iter::once(route.route.clone()))
}
