use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, warn};
use ureq::Agent;

use crate::auth::ClientAuth;
use crate::errors::ApiError;
use crate::model::{Axis, DeviceDetails, Preset};

const APP_SERVER_BASE: &str = "https://aps1-app-server.iot.i.tplinkcloud.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking client for the vendor cloud.
///
/// One instance per account; cheap to share behind an `Arc`. All methods
/// block on network I/O and are expected to run on background workers.
pub struct CloudClient {
    agent: Agent,
    auth: ClientAuth,
    base_url: String,
}

impl CloudClient {
    pub fn new(auth: ClientAuth) -> Self {
        Self::with_base_url(auth, APP_SERVER_BASE)
    }

    /// Point the client at a different app-server host (tests, other regions).
    pub fn with_base_url(auth: ClientAuth, base_url: impl Into<String>) -> Self {
        // 4xx/5xx must not surface as transport errors: the cloud wraps
        // device failures in perfectly readable bodies we want to keep.
        let config = Agent::config_builder()
            .timeout_global(Some(HTTP_TIMEOUT))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            auth,
            base_url: base_url.into(),
        }
    }

    /// Ordered list of device ids registered on the account.
    pub fn list_devices(&self) -> Result<Vec<String>, ApiError> {
        self.ensure_configured()?;

        let url = format!("{}/v1/families/default/thing-order", self.base_url);
        let mut request = self
            .agent
            .get(&url)
            .query("page", "0")
            .query("pageSize", "20");
        for (name, value) in self.auth.headers() {
            request = request.header(name, value.as_str());
        }

        let body = read_checked(request.call())?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::UnexpectedPayload(format!("thing-order is not JSON: {e}")))?;

        let ids = parse_device_order(&parsed)?;
        debug!(count = ids.len(), "device ids retrieved");
        Ok(ids)
    }

    /// Name, model, coordinates and addresses for one device.
    pub fn device_details(&self, device_id: &str) -> Result<DeviceDetails, ApiError> {
        let requests = vec![
            json!({
                "method": "getDeviceInfo",
                "params": { "device_info": { "name": ["basic_info"] } }
            }),
            json!({
                "method": "getUpnpStatus",
                "params": { "upnpc": { "table": ["upnp_status"] } }
            }),
            json!({
                "method": "getPubIP",
                "params": { "upnpc": { "name": ["pub_ip"] } }
            }),
        ];

        let response = self.services_sync(device_id, requests)?;
        parse_device_details(&response)
    }

    /// Stored pan/tilt presets, in the order the camera reports them.
    pub fn presets(&self, device_id: &str) -> Result<Vec<Preset>, ApiError> {
        let requests = vec![json!({
            "method": "getPresetConfig",
            "params": { "preset": { "name": ["preset"] } }
        })];

        let response = self.services_sync(device_id, requests)?;
        parse_presets(&response)
    }

    /// Drive the camera to a stored preset position.
    pub fn move_to_preset(&self, device_id: &str, preset_id: &str) -> Result<(), ApiError> {
        let requests = vec![json!({
            "method": "motorMoveToPreset",
            "params": { "preset": { "goto_preset": { "id": preset_id } } }
        })];

        let response = self.services_sync(device_id, requests)?;
        ApiError::from_error_code(first_response_error_code(&response)?)
    }

    /// Nudge the camera by `step` degrees on one axis.
    pub fn move_axis(&self, device_id: &str, axis: Axis, step: i32) -> Result<(), ApiError> {
        let mut coords = serde_json::Map::new();
        coords.insert("x_coord".to_string(), Value::String("0".to_string()));
        coords.insert("y_coord".to_string(), Value::String("0".to_string()));
        coords.insert(
            axis.coord_key().to_string(),
            Value::String(step.to_string()),
        );

        let requests = vec![json!({
            "method": "motorMove",
            "params": { "motor": { "move": Value::Object(coords) } }
        })];

        let response = self.services_sync(device_id, requests)?;
        ApiError::from_error_code(first_response_error_code(&response)?)
    }

    /// Cover or uncover the lens (the vendor calls this the lens mask).
    pub fn set_privacy_mode(&self, device_id: &str, enabled: bool) -> Result<(), ApiError> {
        let requests = vec![json!({
            "method": "setLensMaskConfig",
            "params": {
                "lens_mask": {
                    "lens_mask_info": { "enabled": if enabled { "on" } else { "off" } }
                }
            }
        })];

        let response = self.services_sync(device_id, requests)?;
        ApiError::from_error_code(first_response_error_code(&response)?)
    }

    /// POST a passthrough `multipleRequest` envelope to one device and
    /// return the parsed response body.
    fn services_sync(&self, device_id: &str, requests: Vec<Value>) -> Result<Value, ApiError> {
        self.ensure_configured()?;

        let url = format!("{}/v1/things/{}/services-sync", self.base_url, device_id);
        let payload = passthrough_envelope(requests);

        let mut request = self.agent.post(&url);
        for (name, value) in self.auth.headers() {
            request = request.header(name, value.as_str());
        }

        let body = read_checked(request.send(payload.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(device = device_id, error = %e, "services-sync body is not JSON");
            ApiError::UnexpectedPayload(format!("services-sync body is not JSON: {e}"))
        })
    }

    fn ensure_configured(&self) -> Result<(), ApiError> {
        if self.auth.is_configured() {
            Ok(())
        } else {
            Err(ApiError::MissingCredentials)
        }
    }
}

/// Read a response body, turning non-2xx statuses into [`ApiError::Http`]
/// with the body preserved for diagnostics.
fn read_checked(
    result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> Result<String, ApiError> {
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Wrap per-method requests in the app's `services-sync` passthrough envelope.
fn passthrough_envelope(requests: Vec<Value>) -> Value {
    json!({
        "inputParams": {
            "requestData": {
                "method": "multipleRequest",
                "params": { "requests": requests }
            }
        },
        "serviceId": "passthrough"
    })
}

/// Flatten the `thing-order` payload into an ordered, de-duplicated id list.
///
/// Entries look like `"Device-<id>"`; anything without the prefix is kept
/// as-is, matching what the mobile app does.
fn parse_device_order(payload: &Value) -> Result<Vec<String>, ApiError> {
    let entries = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::unexpected("thing-order has no data array"))?;

    let mut ids = Vec::new();
    for entry in entries {
        let Some(orders) = entry.get("thingOrders").and_then(Value::as_array) else {
            continue;
        };
        for item in orders.iter().filter_map(Value::as_str) {
            let id = item.strip_prefix("Device-").unwrap_or(item).to_string();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

/// Responses array of a passthrough reply.
fn passthrough_responses(payload: &Value) -> Result<&Vec<Value>, ApiError> {
    payload
        .pointer("/outputParams/responseData/result/responses")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::unexpected("passthrough reply has no responses array"))
}

fn parse_device_details(payload: &Value) -> Result<DeviceDetails, ApiError> {
    let mut details = DeviceDetails::default();

    for response in passthrough_responses(payload)? {
        let Some(method) = response.get("method").and_then(Value::as_str) else {
            continue;
        };

        match method {
            "getDeviceInfo" => {
                if let Some(info) = response.pointer("/result/device_info/basic_info") {
                    details.alias = info
                        .get("device_alias")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    details.model = info
                        .get("device_name")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    details.longitude = info.get("longitude").and_then(Value::as_f64);
                    details.latitude = info.get("latitude").and_then(Value::as_f64);
                }
            }
            "getUpnpStatus" => {
                details.private_ip = response
                    .pointer("/result/upnpc/upnp_status/0/vhttpd/ipaddr")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            "getPubIP" => {
                details.public_ip = response
                    .pointer("/result/upnpc/pub_ip/ip")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            other => debug!(method = other, "ignoring unknown passthrough response"),
        }
    }

    Ok(details)
}

/// Zip the camera's parallel `id`/`name` arrays into an ordered preset list.
fn parse_presets(payload: &Value) -> Result<Vec<Preset>, ApiError> {
    for response in passthrough_responses(payload)? {
        if response.get("method").and_then(Value::as_str) != Some("getPresetConfig") {
            continue;
        }

        let Some(preset_data) = response.pointer("/result/preset/preset") else {
            continue;
        };
        let ids = preset_data
            .get("id")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let names = preset_data
            .get("name")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        return Ok(ids
            .iter()
            .zip(names.iter())
            .filter_map(|(id, name)| {
                Some(Preset {
                    id: json_scalar_to_string(id)?,
                    name: name.as_str()?.to_string(),
                })
            })
            .collect());
    }

    Ok(Vec::new())
}

/// Presets report ids as numbers on some firmwares and strings on others.
fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `error_code` of the first passthrough response; missing means failure.
fn first_response_error_code(payload: &Value) -> Result<i64, ApiError> {
    passthrough_responses(payload)?
        .first()
        .and_then(|r| r.get("error_code"))
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::unexpected("passthrough response carries no error_code"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_order_strips_prefix_and_dedupes() {
        let payload = json!({
            "data": [
                { "thingOrders": ["Device-AAA", "Device-BBB"] },
                { "thingOrders": ["Device-AAA", "CCC"] },
                { "somethingElse": 1 }
            ]
        });

        let ids = parse_device_order(&payload).unwrap();
        assert_eq!(ids, vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn test_parse_device_order_rejects_missing_data() {
        let payload = json!({ "error": "nope" });
        assert!(matches!(
            parse_device_order(&payload),
            Err(ApiError::UnexpectedPayload(_))
        ));
    }

    fn passthrough_reply(responses: Value) -> Value {
        json!({
            "outputParams": {
                "responseData": { "result": { "responses": responses } }
            }
        })
    }

    #[test]
    fn test_parse_device_details() {
        let payload = passthrough_reply(json!([
            {
                "method": "getDeviceInfo",
                "result": { "device_info": { "basic_info": {
                    "device_alias": "Front door",
                    "device_name": "C210",
                    "longitude": 23000000.0,
                    "latitude": 42000000.0
                } } }
            },
            {
                "method": "getUpnpStatus",
                "result": { "upnpc": { "upnp_status": [
                    { "vhttpd": { "ipaddr": "10.0.0.5" } }
                ] } }
            },
            {
                "method": "getPubIP",
                "result": { "upnpc": { "pub_ip": { "ip": "203.0.113.7" } } }
            }
        ]));

        let details = parse_device_details(&payload).unwrap();
        assert_eq!(details.alias.as_deref(), Some("Front door"));
        assert_eq!(details.model.as_deref(), Some("C210"));
        assert_eq!(details.private_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(details.public_ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_parse_device_details_tolerates_partial_bundle() {
        let payload = passthrough_reply(json!([
            { "method": "getPubIP", "result": { "upnpc": { "pub_ip": {} } } }
        ]));

        let details = parse_device_details(&payload).unwrap();
        assert_eq!(details.alias, None);
        assert_eq!(details.public_ip, None);
    }

    #[test]
    fn test_parse_presets_zips_ids_and_names() {
        let payload = passthrough_reply(json!([
            {
                "method": "getPresetConfig",
                "result": { "preset": { "preset": {
                    "id": [1, 2, "3"],
                    "name": ["Door", "Window", "Garden"]
                } } }
            }
        ]));

        let presets = parse_presets(&payload).unwrap();
        assert_eq!(presets.len(), 3);
        assert_eq!(presets[0], Preset { id: "1".into(), name: "Door".into() });
        assert_eq!(presets[2], Preset { id: "3".into(), name: "Garden".into() });
    }

    #[test]
    fn test_error_code_mapping() {
        let ok = passthrough_reply(json!([{ "error_code": 0 }]));
        assert_eq!(first_response_error_code(&ok).unwrap(), 0);

        let travel = passthrough_reply(json!([{ "error_code": -64304 }]));
        let code = first_response_error_code(&travel).unwrap();
        assert!(matches!(
            ApiError::from_error_code(code),
            Err(ApiError::EndOfTravel)
        ));

        let rejected = passthrough_reply(json!([{ "error_code": -40401 }]));
        let code = first_response_error_code(&rejected).unwrap();
        assert!(matches!(
            ApiError::from_error_code(code),
            Err(ApiError::DeviceRejected(-40401))
        ));
    }

    #[test]
    fn test_passthrough_envelope_shape() {
        let envelope = passthrough_envelope(vec![json!({ "method": "getDeviceInfo" })]);
        assert_eq!(
            envelope.pointer("/inputParams/requestData/method"),
            Some(&json!("multipleRequest"))
        );
        assert_eq!(envelope.get("serviceId"), Some(&json!("passthrough")));
    }
}
