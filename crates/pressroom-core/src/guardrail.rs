use crate::access::Actor;
use crate::error::{PressError, Result};
use crate::types::Role;
use regex::Regex;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// 1. Tenant / brand scope
// ---------------------------------------------------------------------------

/// No surface hands out another brand's data unless the actor is elevated.
/// An actor with no recorded brand is scoped to nothing.
pub fn check_brand_scope(actor: &Actor, brand: &str) -> Result<()> {
    if actor.role == Role::Super {
        return Ok(());
    }
    if actor.brand.as_deref() == Some(brand) {
        return Ok(());
    }
    Err(PressError::Forbidden {
        role: actor.role.to_string(),
        capability: format!("access to brand '{brand}'"),
    })
}

// ---------------------------------------------------------------------------
// 2. Raw content screening
// ---------------------------------------------------------------------------

const RAW_CONTENT_KEYS: &[&str] = &["body", "text", "html", "raw_content"];

/// Insight payloads carry derived metrics only; any raw content field at any
/// depth rejects the whole response before it leaves the pipeline.
pub fn screen_raw_fields(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, nested) in map {
                if RAW_CONTENT_KEYS.contains(&key.as_str()) {
                    return Err(PressError::Validation(format!(
                        "response contains raw content field '{key}'"
                    )));
                }
                screen_raw_fields(nested)?;
            }
            Ok(())
        }
        serde_json::Value::Array(items) => {
            for item in items {
                screen_raw_fields(item)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// 3. Auto-apply intent
// ---------------------------------------------------------------------------

static INTENT_RE: OnceLock<Regex> = OnceLock::new();

fn intent_re() -> &'static Regex {
    INTENT_RE.get_or_init(|| {
        Regex::new(r"(?i)\bauto[\s-]?(publish|rewrite|apply)\b|\bautomatically\s+(publish|rewrite|apply|update)\b")
            .unwrap()
    })
}

/// Every action stays human-gated: a description implying automatic rewrite
/// or automatic publish is rejected at request time.
pub fn check_action_intent(text: &str) -> Result<()> {
    if intent_re().is_match(text) {
        return Err(PressError::Validation(
            "action text implies automatic rewrite or publish; actions must stay human-gated"
                .to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Metric normalization
// ---------------------------------------------------------------------------

/// All ratio and score metrics leave the pipeline normalized into [0.0, 1.0].
pub fn check_normalized(metrics: &[(&str, f64)]) -> Result<()> {
    for (name, value) in metrics {
        if !value.is_finite() || *value < 0.0 || *value > 1.0 {
            return Err(PressError::Validation(format!(
                "metric '{name}'={value} is outside the documented [0.0, 1.0] range"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn super_crosses_brands_others_do_not() {
        let root = Actor::new("root", Role::Super);
        check_brand_scope(&root, "other-brand").unwrap();

        let admin = Actor::with_brand("ana", Role::Admin, "acme");
        check_brand_scope(&admin, "acme").unwrap();
        assert!(check_brand_scope(&admin, "other-brand").is_err());

        let unscoped = Actor::new("nobody", Role::Admin);
        assert!(check_brand_scope(&unscoped, "acme").is_err());
    }

    #[test]
    fn raw_fields_rejected_at_any_depth() {
        screen_raw_fields(&json!({"views": 12, "ctr": 0.4})).unwrap();

        let nested = json!({"items": [{"metrics": {"html": "<p>hi</p>"}}]});
        let err = screen_raw_fields(&nested).unwrap_err();
        assert!(err.to_string().contains("html"), "err: {err}");

        assert!(screen_raw_fields(&json!({"body": "raw"})).is_err());
        assert!(screen_raw_fields(&json!({"text": "raw"})).is_err());
    }

    #[test]
    fn auto_apply_intent_is_rejected() {
        for text in [
            "auto-publish the winning variant",
            "Auto publish when approved",
            "automatically rewrite the description",
            "will autorewrite nothing but auto apply the fix",
        ] {
            assert!(check_action_intent(text).is_err(), "expected reject: {text}");
        }
    }

    #[test]
    fn human_gated_intent_passes() {
        for text in [
            "promote this product on the landing page",
            "review copy before the sale",
            "queue for manual publish after QC",
        ] {
            check_action_intent(text).unwrap_or_else(|_| panic!("expected pass: {text}"));
        }
    }

    #[test]
    fn out_of_range_metrics_rejected() {
        check_normalized(&[("ctr", 0.0), ("score", 1.0), ("ratio", 0.37)]).unwrap();
        assert!(check_normalized(&[("ctr", 1.2)]).is_err());
        assert!(check_normalized(&[("ctr", -0.1)]).is_err());
        assert!(check_normalized(&[("ctr", f64::NAN)]).is_err());
    }
}
