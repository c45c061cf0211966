use jsonschema::Validator;
use serde_json::{json, Value};
use std::sync::LazyLock;
use tracing::error;

/// Canonical shape of a single `lorawan_connections` entry
///
/// Every record position forbids keys it does not list; scalar positions
/// accept any value.
pub fn connection_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "connection_name": {},
            "created_at": {},
            "last_seen_at": {},
            "margin": {},
            "expected_uplink_interval_sec": {},
            "connection_type": {},
            "lorawan_device": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "deveui": {},
                    "name": {},
                    "battery_level": {},
                    "labels": {},
                    "serial_no": {},
                    "uri": {},
                    "hardware": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "hardware": {},
                            "hw_model": {},
                            "hw_version": {},
                            "sw_version": {},
                            "manufacturer": {},
                            "datasheet": {},
                            "capabilities": {},
                            "description": {}
                        }
                    }
                }
            }
        }
    })
}

/// Keys a record must carry before it may be appended as a new connection
pub fn required_keys_schema() -> Value {
    json!({
        "type": "object",
        "required": ["connection_type", "lorawan_device"],
        "properties": {
            "lorawan_device": {
                "type": "object",
                "required": ["deveui", "name", "hardware"],
                "properties": {
                    "hardware": {
                        "type": "object",
                        "required": ["hw_model"]
                    }
                }
            }
        }
    })
}

static CONNECTION_VALIDATOR: LazyLock<Result<Validator, String>> =
    LazyLock::new(|| compile(&connection_schema()));

static REQUIRED_KEYS_VALIDATOR: LazyLock<Result<Validator, String>> =
    LazyLock::new(|| compile(&required_keys_schema()));

fn compile(schema: &Value) -> Result<Validator, String> {
    Validator::new(schema).map_err(|e| format!("Invalid JSON Schema: {}", e))
}

/// Validation errors of `candidate`, one entry per failure
fn violations(validator: &Result<Validator, String>, candidate: &Value) -> Vec<String> {
    match validator {
        Ok(validator) => validator
            .iter_errors(candidate)
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect(),
        Err(message) => {
            error!(error = %message, "manifest schema failed to compile");
            vec![message.clone()]
        }
    }
}

/// Keys of `candidate` that are not in the schema at their position.
/// Schema keys missing from the candidate are fine.
pub fn schema_violations(candidate: &Value) -> Vec<String> {
    violations(&CONNECTION_VALIDATOR, candidate)
}

pub fn validate_schema(candidate: &Value) -> bool {
    schema_violations(candidate).is_empty()
}

/// Presence check only; a parent of the wrong shape counts as missing.
pub fn has_required_keys(candidate: &Value) -> bool {
    violations(&REQUIRED_KEYS_VALIDATOR, candidate).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sfm_record() -> Value {
        json!({
            "connection_name": "SFM",
            "created_at": "2023-12-13T19:47:43.558000Z",
            "last_seen_at": "2023-12-13T19:47:43.558000Z",
            "margin": 5,
            "expected_uplink_interval_sec": 30,
            "connection_type": "OTAA",
            "lorawan_device": {
                "deveui": "7d1f5420e81235c1",
                "name": "SFM1x Sap Flow",
                "battery_level": 10,
                "hardware": {
                    "hardware": "SFM1x",
                    "hw_model": "SFM1x",
                    "hw_version": "",
                    "sw_version": "",
                    "manufacturer": "ICT International",
                    "datasheet": "https://ictinternational.com/manuals-and-brochures/sfm1x-sap-flow-meter/",
                    "capabilities": ["lorawan"],
                    "description": "The SFM1x Sap Flow Meter enables individual tree water use and health to be monitored."
                }
            }
        })
    }

    #[test]
    fn test_full_record_validates() {
        assert!(validate_schema(&sfm_record()));
        assert!(has_required_keys(&sfm_record()));
    }

    #[test]
    fn test_partial_record_validates() {
        let candidate = json!({
            "margin": 0,
            "lorawan_device": { "deveui": "7d1f5420e81235c1" }
        });
        assert!(validate_schema(&candidate));
    }

    #[test]
    fn test_empty_record_validates() {
        assert!(validate_schema(&json!({})));
    }

    #[test]
    fn test_unknown_key_fails() {
        let mut candidate = sfm_record();
        candidate["rssi"] = json!(-80);
        assert!(!validate_schema(&candidate));
    }

    #[test]
    fn test_misplaced_hw_model_fails() {
        let candidate = json!({
            "connection_type": "OTAA",
            "lorawan_device": {
                "deveui": "7d1f5420e81235c1",
                "name": "SFM1x Sap Flow",
                "hw_model": "SFM1x"
            }
        });
        assert!(!validate_schema(&candidate));
    }

    #[test]
    fn test_scalar_where_record_expected_fails() {
        let candidate = json!({ "lorawan_device": "7d1f5420e81235c1" });
        assert!(!validate_schema(&candidate));
    }

    #[test]
    fn test_scalar_positions_accept_any_type() {
        let candidate = json!({
            "margin": "five",
            "lorawan_device": { "labels": { "site": "north" } }
        });
        assert!(validate_schema(&candidate));
    }

    #[test]
    fn test_violations_name_the_offending_key() {
        let candidate = json!({ "lorawan_device": { "hw_model": "SFM1x" } });
        let violations = schema_violations(&candidate);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("hw_model"));
        assert!(violations[0].contains("/lorawan_device"));
    }

    #[test]
    fn test_schemas_compile() {
        assert!(CONNECTION_VALIDATOR.is_ok());
        assert!(REQUIRED_KEYS_VALIDATOR.is_ok());
    }

    #[test]
    fn test_non_object_candidate_fails() {
        assert!(!validate_schema(&json!([])));
        assert!(!validate_schema(&json!("SFM")));
    }

    #[test]
    fn test_missing_hw_model_is_not_complete() {
        let mut candidate = sfm_record();
        candidate["lorawan_device"]["hardware"]
            .as_object_mut()
            .unwrap()
            .remove("hw_model");
        assert!(validate_schema(&candidate));
        assert!(!has_required_keys(&candidate));
    }

    #[test]
    fn test_required_keys_wrong_parent_shape() {
        let candidate = json!({
            "connection_type": "OTAA",
            "lorawan_device": {
                "deveui": "7d1f5420e81235c1",
                "name": "SFM1x Sap Flow",
                "hardware": "SFM1x"
            }
        });
        assert!(!has_required_keys(&candidate));
    }

    #[test]
    fn test_required_keys_check_presence_not_type() {
        let candidate = json!({
            "connection_type": null,
            "lorawan_device": {
                "deveui": "7d1f5420e81235c1",
                "name": 12,
                "hardware": { "hw_model": null }
            }
        });
        assert!(has_required_keys(&candidate));
    }
}
