use crate::analysis::{NamespaceGroup, RiskTier};
use crate::InspectReport;

/// Capabilities shown inline before the list is abbreviated.
const INLINE_CAPABILITIES: usize = 2;

/// Render analyzed routes as console output, in analysis order.
pub fn render(report: &InspectReport) -> String {
    let mut output = String::new();

    if report.routes.is_empty() {
        output.push_str("\n  No routes matched.\n\n");
    } else {
        output.push_str(&format!("\n  {} route(s) analyzed:\n\n", report.routes.len()));
    }

    for route in &report.routes {
        let risk_tag = match route.risk_level {
            RiskTier::High => "[HIGH]  ",
            RiskTier::Medium => "[MEDIUM]",
            RiskTier::Low => "[LOW]   ",
        };
        let methods = if route.methods.is_empty() {
            "-".to_string()
        } else {
            route.methods.join(",")
        };

        output.push_str(&format!("  {} {:<14} {}\n", risk_tag, methods, route.route));
        output.push_str(&format!(
            "           plugin: {} ({})\n",
            route.display_name, route.namespace
        ));
        output.push_str(&format!("           access: {}\n", route.access_level.label()));

        if !route.capabilities.is_empty() {
            let shown: Vec<&str> = route
                .capabilities
                .iter()
                .take(INLINE_CAPABILITIES)
                .map(String::as_str)
                .collect();
            let remaining = route.capabilities.len().saturating_sub(shown.len());
            let more = if remaining > 0 {
                format!(" (+{remaining} more)")
            } else {
                String::new()
            };
            output.push_str(&format!("           caps: {}{}\n", shown.join(", "), more));
        }
        if !route.custom_roles.is_empty() {
            output.push_str(&format!(
                "           custom roles: {}\n",
                route.custom_roles.join(", ")
            ));
        }
        if !route.callback_description.is_empty() {
            output.push_str(&format!(
                "           callback: {}\n",
                route.callback_description
            ));
        }
        output.push('\n');
    }

    let stats = &report.stats;
    output.push_str(&format!(
        "  Totals: {} high, {} medium, {} low | {} public write, {} admin-only\n",
        stats.count_risk(RiskTier::High),
        stats.count_risk(RiskTier::Medium),
        stats.count_risk(RiskTier::Low),
        stats.public_write_routes,
        stats.admin_only_routes,
    ));

    if !report.diagnostics.is_empty() {
        output.push_str(&format!(
            "  {} diagnostic(s); use --format json for details\n",
            report.diagnostics.len()
        ));
    }

    let verdict = &report.verdict;
    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "  Result: {} (threshold: {}, highest: {})\n\n",
        status,
        verdict.fail_threshold,
        verdict
            .highest_risk
            .map(|r| r.to_string())
            .unwrap_or_else(|| "none".into()),
    ));

    output
}

/// Render namespace groups as a table.
pub fn render_groups(groups: &[NamespaceGroup]) -> String {
    let mut output = String::new();

    if groups.is_empty() {
        output.push_str("\n  No plugin routes registered.\n\n");
        return output;
    }

    output.push_str(&format!("\n  {:<32} {:<24} ROUTES\n", "PLUGIN", "NAMESPACE"));
    output.push_str(&format!("  {}\n", "-".repeat(66)));
    for group in groups {
        output.push_str(&format!(
            "  {:<32} {:<24} {}\n",
            group.display_name, group.namespace, group.route_count
        ));
    }
    output.push('\n');

    output
}
