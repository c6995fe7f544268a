use crate::analysis::{RiskFactor, RiskTier, RouteAnalysis};
use crate::error::Result;

use serde_json::{json, Value};

/// Render risky routes as SARIF 2.1.0.
///
/// Only medium and high routes become results. Routes have no file
/// location, so each result carries a logical location naming the route.
pub fn render(routes: &[RouteAnalysis], target_name: &str) -> Result<String> {
    let flagged: Vec<(&RouteAnalysis, RiskFactor)> = routes
        .iter()
        .filter(|r| r.risk_level >= RiskTier::Medium)
        .map(|r| (r, r.risk_factor()))
        .collect();

    let mut factors: Vec<RiskFactor> = Vec::new();
    for (_, factor) in &flagged {
        if !factors.contains(factor) {
            factors.push(*factor);
        }
    }
    factors.sort_by_key(|f| f.rule_id());

    let rules: Vec<Value> = factors
        .iter()
        .map(|factor| {
            json!({
                "id": factor.rule_id(),
                "name": factor.description(),
                "shortDescription": { "text": factor.description() },
                "defaultConfiguration": {
                    "level": risk_to_sarif_level(factor.tier()),
                },
            })
        })
        .collect();

    let results: Vec<Value> = flagged
        .iter()
        .map(|(route, factor)| {
            let mut message = format!(
                "{} {} is reachable with {} access ({})",
                route.methods.join(","),
                route.route,
                route.access_level,
                route.callback_description,
            );
            if !route.capabilities.is_empty() {
                message.push_str(&format!("; checks {}", route.capabilities.join(", ")));
            }

            json!({
                "ruleId": factor.rule_id(),
                "level": risk_to_sarif_level(route.risk_level),
                "message": { "text": message },
                "locations": [{
                    "logicalLocations": [{
                        "name": route.route,
                        "fullyQualifiedName": format!("{}:{}", route.namespace, route.route),
                        "kind": "resource",
                    }],
                }],
                "properties": {
                    "plugin": route.display_name,
                    "accessLevel": route.access_level,
                    "customRoles": route.custom_roles,
                },
            })
        })
        .collect();

    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "permscan",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
            "automationDetails": {
                "id": format!("permscan/{}", target_name),
                "guid": uuid::Uuid::new_v4().to_string(),
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn risk_to_sarif_level(risk: RiskTier) -> &'static str {
    match risk {
        RiskTier::High => "error",
        RiskTier::Medium => "warning",
        RiskTier::Low => "note",
    }
}
