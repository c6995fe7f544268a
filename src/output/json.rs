use crate::analysis::{AnalysisStats, Diagnostic, NamespaceGroup, PolicyVerdict, RouteAnalysis};
use crate::error::Result;
use crate::InspectReport;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    generated_at: String,
    total: usize,
    routes: &'a [RouteAnalysis],
    stats: &'a AnalysisStats,
    verdict: &'a PolicyVerdict,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct JsonGroups<'a> {
    plugins: &'a [NamespaceGroup],
    total: usize,
}

/// Render an inspection as a JSON report.
pub fn render(report: &InspectReport) -> Result<String> {
    let json = JsonReport {
        target: &report.target_name,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        total: report.routes.len(),
        routes: &report.routes,
        stats: &report.stats,
        verdict: &report.verdict,
        diagnostics: &report.diagnostics,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Render namespace groups as JSON.
pub fn render_groups(groups: &[NamespaceGroup]) -> Result<String> {
    let json = JsonGroups {
        plugins: groups,
        total: groups.len(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::analysis;
    use crate::analysis::Policy;
    use crate::capability::AccessLevel;

    #[test]
    fn report_has_routes_stats_and_verdict() {
        let routes = vec![analysis("/acme/v1/items", &["GET"], AccessLevel::Public)];
        let report = InspectReport {
            target_name: "site".into(),
            stats: AnalysisStats::from_routes(&routes),
            verdict: Policy::default().evaluate(&routes),
            routes,
            diagnostics: vec![],
        };
        let value: serde_json::Value = serde_json::from_str(&render(&report).unwrap()).unwrap();

        assert_eq!(value["total"], 1);
        assert_eq!(value["routes"][0]["access_level"], "public");
        assert_eq!(value["routes"][0]["risk_level"], "medium");
        assert_eq!(value["stats"]["by_risk_level"]["medium"], 1);
        assert_eq!(value["verdict"]["pass"], true);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn groups_have_total() {
        let groups = vec![NamespaceGroup {
            namespace: "acme".into(),
            display_name: "Acme".into(),
            route_count: 3,
        }];
        let value: serde_json::Value =
            serde_json::from_str(&render_groups(&groups).unwrap()).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["plugins"][0]["route_count"], 3);
    }
}
