//! Integration tests for layered configuration resolution.

use serde_json::{json, Value};

use kiln_config::{
    merge_layers, BuildContext, ComplianceFramework, ConfigBuilder, ConfigError, ConfigLayer,
    ConfigProfile, LayerPriority, PlatformSettings,
};

struct QueueProfile;

impl ConfigProfile for QueueProfile {
    fn fallback(&self) -> Value {
        json!({
            "visibilityTimeoutSeconds": 30,
            "tags": ["base"],
            "monitoring": {"enabled": false, "alarms": {"ageOfOldestMessage": 300}}
        })
    }

    fn compliance_defaults(&self, framework: ComplianceFramework) -> Value {
        let posture = framework.posture();
        json!({
            "retentionDays": posture.log_retention_days,
            "monitoring": {"enabled": posture.monitoring_required}
        })
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "visibilityTimeoutSeconds": {"type": "integer"},
                "retentionDays": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "monitoring": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "enabled": {"type": "boolean"},
                        "alarms": {"type": "object"}
                    }
                }
            }
        })
    }
}

/// Layers given in shuffled order merge exactly like the sorted order.
#[test]
fn test_merge_order_ignores_registration_order() {
    let low = ConfigLayer::new("low", LayerPriority::FALLBACK, json!({"a": 1, "b": {"c": 1}}));
    let mid = ConfigLayer::new("mid", LayerPriority::ENVIRONMENT, json!({"a": 2, "b": {"d": 2}}));
    let high = ConfigLayer::new("high", LayerPriority::GOVERNANCE, json!({"a": 3}));

    let sorted = merge_layers(&[low.clone(), mid.clone(), high.clone()]).unwrap();
    let shuffled = merge_layers(&[high, low, mid]).unwrap();

    assert_eq!(sorted, shuffled);
    assert_eq!(sorted, json!({"a": 3, "b": {"c": 1, "d": 2}}));
}

#[test]
fn test_sibling_maps_combine() {
    let merged = merge_layers(&[
        ConfigLayer::new("first", 0, json!({"a": {"x": 1}})),
        ConfigLayer::new("second", 1, json!({"a": {"y": 2}})),
    ])
    .unwrap();

    assert_eq!(merged, json!({"a": {"x": 1, "y": 2}}));
}

#[test]
fn test_manifest_keeps_lower_map_fields() {
    let settings = PlatformSettings::default();
    let context = BuildContext::new("dev", ComplianceFramework::Baseline);

    let resolved = ConfigBuilder::new("jobs", &QueueProfile, &context, &settings)
        .with_manifest(json!({
            "tags": ["jobs"],
            "monitoring": {"enabled": true}
        }))
        .build()
        .unwrap();

    assert_eq!(resolved.get("/tags"), Some(&json!(["jobs"])));
    assert_eq!(resolved.get_bool("/monitoring/enabled"), Some(true));
    assert_eq!(
        resolved.get_u64("/monitoring/alarms/ageOfOldestMessage"),
        Some(300)
    );
}

#[test]
fn test_strict_tier_never_weaker() {
    let settings = PlatformSettings::default();
    let baseline = BuildContext::new("dev", ComplianceFramework::Baseline);
    let high = BuildContext::new("dev", ComplianceFramework::High);

    let base = ConfigBuilder::new("jobs", &QueueProfile, &baseline, &settings)
        .build()
        .unwrap();
    let strict = ConfigBuilder::new("jobs", &QueueProfile, &high, &settings)
        .build()
        .unwrap();

    assert!(strict.get_u64("/retentionDays") >= base.get_u64("/retentionDays"));
    assert!(strict.get_bool("/monitoring/enabled") >= base.get_bool("/monitoring/enabled"));
}

#[test]
fn test_identical_inputs_resolve_identically() {
    let settings = PlatformSettings::default();
    let context = BuildContext::new("prod", ComplianceFramework::High);
    let manifest = json!({"visibilityTimeoutSeconds": 60});

    let first = ConfigBuilder::new("jobs", &QueueProfile, &context, &settings)
        .with_manifest(manifest.clone())
        .build()
        .unwrap();
    let second = ConfigBuilder::new("jobs", &QueueProfile, &context, &settings)
        .with_manifest(manifest)
        .build()
        .unwrap();

    assert_eq!(
        serde_json::to_vec(first.value()).unwrap(),
        serde_json::to_vec(second.value()).unwrap()
    );
}

#[test]
fn test_schema_error_reports_path() {
    let settings = PlatformSettings::default();
    let context = BuildContext::new("dev", ComplianceFramework::Baseline);

    let err = ConfigBuilder::new("jobs", &QueueProfile, &context, &settings)
        .with_manifest(json!({"visibilityTimeoutSeconds": "soon"}))
        .build()
        .unwrap_err();

    match err {
        ConfigError::Schema { component, path, .. } => {
            assert_eq!(component, "jobs");
            assert_eq!(path, "/visibilityTimeoutSeconds");
        }
        other => panic!("unexpected error: {other}"),
    }
}
