use crate::content::ContentEntity;
use crate::types::{ActionKind, ContentKind};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Promotion never raises priority past this cap.
pub const MAX_PRIORITY: u32 = 10;

/// Priority increment a single PROMOTE applies.
pub const PRIORITY_STEP: u32 = 1;

/// Heuristic uplift applied to historical counters. These are projections of
/// hypothetical effect, not measurements.
pub const ENGAGEMENT_MULTIPLIER: f64 = 0.15;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Hypothetical effect of executing the action. Every number here is an
/// estimate derived from current state; nothing was written to produce it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatedImpact {
    pub priority_before: u32,
    pub priority_after: u32,
    pub featured_before: bool,
    pub featured_after: bool,
    pub estimated_view_delta: u64,
    pub estimated_click_delta: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub category: ContentKind,
    pub action: ActionKind,
    pub target_id: Uuid,
    /// False for action/category pairs the simulator does not model; the
    /// impact is then empty and `gap` names what is missing.
    pub supported: bool,
    pub impact: SimulatedImpact,
    pub risks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

fn simulate_promote_product(target: &ContentEntity) -> SimulationReport {
    let priority_after = (target.priority + PRIORITY_STEP).min(MAX_PRIORITY);

    let mut risks = Vec::new();
    if target.featured {
        risks.push("target is already featured".to_string());
    }
    if target.priority >= MAX_PRIORITY {
        risks.push(format!("priority is already at the cap ({MAX_PRIORITY})"));
    }
    if !target.active {
        risks.push("target is inactive".to_string());
    }
    if target.stock <= 0 {
        risks.push("target is out of stock".to_string());
    }

    SimulationReport {
        category: ContentKind::Product,
        action: ActionKind::Promote,
        target_id: target.id,
        supported: true,
        impact: SimulatedImpact {
            priority_before: target.priority,
            priority_after,
            featured_before: target.featured,
            featured_after: !target.featured,
            estimated_view_delta: (target.view_count as f64 * ENGAGEMENT_MULTIPLIER) as u64,
            estimated_click_delta: (target.click_count as f64 * ENGAGEMENT_MULTIPLIER) as u64,
        },
        risks,
        gap: None,
    }
}

/// Strictly read-only projection of an action's effect. Unknown combinations
/// produce an empty-impact report naming the gap rather than an error, so a
/// simulate call never aborts its caller.
pub fn simulate(
    category: ContentKind,
    action: ActionKind,
    target: &ContentEntity,
) -> SimulationReport {
    match (category, action) {
        (ContentKind::Product, ActionKind::Promote) => simulate_promote_product(target),
        (category, action) => SimulationReport {
            category,
            action,
            target_id: target.id,
            supported: false,
            impact: SimulatedImpact::default(),
            risks: Vec::new(),
            gap: Some(format!(
                "no simulation model for {action} on {category} targets"
            )),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ContentEntity {
        let mut p = ContentEntity::new(ContentKind::Product, "acme", "Walnut Desk");
        p.priority = 3;
        p.stock = 12;
        p.view_count = 1000;
        p.click_count = 200;
        p
    }

    #[test]
    fn promote_product_projects_increment_and_flip() {
        let p = product();
        let report = simulate(ContentKind::Product, ActionKind::Promote, &p);
        assert!(report.supported);
        assert_eq!(report.impact.priority_before, 3);
        assert_eq!(report.impact.priority_after, 4);
        assert!(!report.impact.featured_before);
        assert!(report.impact.featured_after);
        assert_eq!(report.impact.estimated_view_delta, 150);
        assert_eq!(report.impact.estimated_click_delta, 30);
        assert!(report.risks.is_empty());
    }

    #[test]
    fn priority_increment_is_capped() {
        let mut p = product();
        p.priority = MAX_PRIORITY;
        let report = simulate(ContentKind::Product, ActionKind::Promote, &p);
        assert_eq!(report.impact.priority_after, MAX_PRIORITY);
        assert!(report
            .risks
            .iter()
            .any(|r| r.contains("cap")), "risks: {:?}", report.risks);
    }

    #[test]
    fn risks_cover_all_four_predicates() {
        let mut p = product();
        p.featured = true;
        p.priority = MAX_PRIORITY;
        p.active = false;
        p.stock = 0;
        let report = simulate(ContentKind::Product, ActionKind::Promote, &p);
        assert_eq!(report.risks.len(), 4, "risks: {:?}", report.risks);
    }

    #[test]
    fn featured_flip_goes_both_ways() {
        let mut p = product();
        p.featured = true;
        let report = simulate(ContentKind::Product, ActionKind::Promote, &p);
        assert!(!report.impact.featured_after);
    }

    #[test]
    fn unknown_combination_names_the_gap() {
        let p = product();
        let report = simulate(ContentKind::Post, ActionKind::Promote, &p);
        assert!(!report.supported);
        assert_eq!(report.impact.priority_after, 0);
        let gap = report.gap.unwrap();
        assert!(gap.contains("PROMOTE"), "gap: {gap}");
        assert!(gap.contains("POST"), "gap: {gap}");

        let report = simulate(ContentKind::Product, ActionKind::Optimize, &p);
        assert!(!report.supported);
        assert!(report.risks.is_empty());
    }

    #[test]
    fn simulation_leaves_the_target_untouched() {
        let p = product();
        let before = serde_json::to_value(&p).unwrap();
        let _ = simulate(ContentKind::Product, ActionKind::Promote, &p);
        assert_eq!(serde_json::to_value(&p).unwrap(), before);
    }
}
