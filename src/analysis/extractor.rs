use crate::capability::{AccessLevel, CapabilitySource, SourceFileScanner};
use crate::error::ScanError;
use crate::registry::{PermissionRef, ALWAYS_ALLOW_SENTINEL};

/// Generic capability-check helper; a callback named after it is gated by
/// some capability we cannot name.
const CAPABILITY_CHECK_HELPER: &str = "current_user_can";

/// What could be learned from a permission reference before
/// classification.
#[derive(Debug, Default)]
pub struct ExtractedEvidence {
    /// Human-readable description of the callback.
    pub description: String,
    /// Access level implied by the reference itself, if any.
    pub hint: Option<AccessLevel>,
    /// Capability names the check appears to test, in discovery order.
    pub capabilities: Vec<String>,
    /// Recovered failures, for the caller to log.
    pub issues: Vec<ScanError>,
}

/// Reduces permission references to evidence.
pub struct EvidenceExtractor {
    source: Box<dyn CapabilitySource>,
}

impl EvidenceExtractor {
    pub fn new(source: Box<dyn CapabilitySource>) -> Self {
        Self { source }
    }

    /// Never fails; source lookup problems land in `issues` and leave the
    /// capability list empty.
    pub fn extract(&self, permission: &PermissionRef) -> ExtractedEvidence {
        match permission {
            PermissionRef::None => ExtractedEvidence {
                description: "No permission callback".into(),
                hint: Some(AccessLevel::Public),
                ..Default::default()
            },
            PermissionRef::AlwaysAllow => always_allow(),
            PermissionRef::Named { name } if name == ALWAYS_ALLOW_SENTINEL => always_allow(),
            PermissionRef::Named { name } => ExtractedEvidence {
                description: format!("Function: {name}"),
                hint: name
                    .contains(CAPABILITY_CHECK_HELPER)
                    .then_some(AccessLevel::Custom),
                ..Default::default()
            },
            PermissionRef::Bound { target, source } => {
                let mut evidence = ExtractedEvidence {
                    description: target.to_string(),
                    ..Default::default()
                };
                match self.source.scan(target, source.as_ref()) {
                    Ok(capabilities) => evidence.capabilities = capabilities,
                    Err(e) => evidence.issues.push(e),
                }
                if evidence.capabilities.is_empty() {
                    evidence.hint = Some(AccessLevel::Custom);
                }
                evidence
            }
            PermissionRef::Opaque => ExtractedEvidence {
                description: "Complex callback (Closure)".into(),
                hint: Some(AccessLevel::Custom),
                ..Default::default()
            },
        }
    }
}

impl Default for EvidenceExtractor {
    fn default() -> Self {
        Self::new(Box::new(SourceFileScanner::new()))
    }
}

fn always_allow() -> ExtractedEvidence {
    ExtractedEvidence {
        description: format!("Public access ({ALWAYS_ALLOW_SENTINEL})"),
        hint: Some(AccessLevel::Public),
        ..Default::default()
    }
}
