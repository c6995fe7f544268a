use super::risk::RiskTier;
use super::RouteAnalysis;
use crate::capability::AccessLevel;

/// Narrows an analysis result the way an operator slices the results table.
/// Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct RouteFilter {
    pub risk: Option<RiskTier>,
    pub access: Option<AccessLevel>,
    pub method: Option<String>,
    pub search: Option<String>,
}

impl RouteFilter {
    pub fn is_empty(&self) -> bool {
        self.risk.is_none() && self.access.is_none() && self.method.is_none() && self.search.is_none()
    }

    pub fn matches(&self, route: &RouteAnalysis) -> bool {
        if self.risk.is_some_and(|risk| risk != route.risk_level) {
            return false;
        }
        if self.access.is_some_and(|access| access != route.access_level) {
            return false;
        }
        if let Some(method) = &self.method {
            if !route.methods.iter().any(|m| m.eq_ignore_ascii_case(method)) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let haystacks = [
                &route.route,
                &route.display_name,
                &route.namespace,
                &route.callback_description,
            ];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&term)) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, routes: Vec<RouteAnalysis>) -> Vec<RouteAnalysis> {
        if self.is_empty() {
            return routes;
        }
        routes.into_iter().filter(|r| self.matches(r)).collect()
    }
}
