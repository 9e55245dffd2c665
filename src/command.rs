//! Command entry points.
//!
//! Each entry point takes loosely typed JSON parameters, coerces them the
//! way the tool layer sends them, and always returns a [`CommandResponse`]:
//! errors and panics become failure responses.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use serde_json::{Map, Value};

use scenewire_scene::{InstanceId, Scene};

use crate::config::ProjectionConfig;
use crate::error::{ProjectionError, ProjectionResult};
use crate::paginate::{HierarchyPaginator, PageRequest, ParentSelector};
use crate::projector::{ProjectOptions, Projector};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("success".into(), Value::Bool(self.success));
        out.insert("message".into(), Value::String(self.message.clone()));
        if let Some(data) = &self.data {
            out.insert("data".into(), data.clone());
        }
        Value::Object(out)
    }
}

/// Coerce an integer parameter. Accepts numbers (fractions truncate) and
/// numeric strings; `null` and blank strings mean absent.
pub fn coerce_int(value: &Value, param: &str) -> ProjectionResult<Option<i64>> {
    let invalid = || ProjectionError::validation(param, format!("expected an integer, got {value}"));
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => truncate(n.as_f64()).map(Some).ok_or_else(invalid),
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Some(i));
            }
            truncate(s.parse::<f64>().ok()).map(Some).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn truncate(value: Option<f64>) -> Option<i64> {
    value
        .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
        .map(|f| f.trunc() as i64)
}

/// Coerce a boolean parameter. Accepts booleans, `0`/`1`, and the strings
/// `true/false/1/0/yes/no/y/n/on/off` in any case; `null` and blank strings
/// mean absent.
pub fn coerce_bool(value: &Value, param: &str) -> ProjectionResult<Option<bool>> {
    let invalid = || ProjectionError::validation(param, format!("expected a boolean, got {value}"));
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(invalid()),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" | "y" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "n" | "off" => Ok(Some(false)),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// Parse the `parent` parameter: absent, a numeric identity or text.
pub fn parent_selector(value: &Value) -> ProjectionResult<Option<ParentSelector>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(id) => Ok(Some(ParentSelector::Id(id))),
            None => Ok(ParentSelector::parse(&n.to_string())),
        },
        Value::String(s) => Ok(ParentSelector::parse(s)),
        other => Err(ProjectionError::validation(
            "parent",
            format!("expected an id, path or name, got {other}"),
        )),
    }
}

/// The engine's command surface.
pub struct Commands {
    projector: Projector,
    paginator: HierarchyPaginator,
}

impl Commands {
    pub fn new(config: ProjectionConfig) -> Self {
        let paginator = HierarchyPaginator::new(&config);
        Self {
            projector: Projector::new(config),
            paginator,
        }
    }

    pub fn with_projector(projector: Projector) -> Self {
        let paginator = HierarchyPaginator::new(projector.config());
        Self {
            projector,
            paginator,
        }
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// One page of the hierarchy below `root`.
    ///
    /// Parameters: `parent`, `pageSize`, `cursor`, `includeTransform`.
    pub fn get_hierarchy(&self, scene: &Scene, root: InstanceId, params: &Value) -> CommandResponse {
        guarded("get_hierarchy", || {
            let params = object(params)?;
            let request = PageRequest {
                parent: parent_selector(param(params, "parent"))?,
                page_size: coerce_int(param(params, "pageSize"), "pageSize")?,
                cursor: coerce_int(param(params, "cursor"), "cursor")?,
                include_transform: coerce_bool(
                    param(params, "includeTransform"),
                    "includeTransform",
                )?
                .unwrap_or(false),
            };
            let page = self.paginator.page(scene, root, &request)?;
            let message = format!(
                "Retrieved {} of {} item(s) under '{}'",
                page.items.len(),
                page.total,
                page.root_path
            );
            Ok(CommandResponse::ok(message, to_value(&page)?))
        })
    }

    /// Projection of one component.
    ///
    /// Parameters: `componentId` (required), `includeNonPublic`.
    pub fn get_component(&self, scene: &Scene, params: &Value) -> CommandResponse {
        guarded("get_component", || {
            let params = object(params)?;
            let id = required_id(params, "componentId")?;
            let options = self.options(params)?;
            let projection = self.projector.project_component(scene, id, &options)?;
            let message = format!(
                "Projected {} on '{}'",
                projection.type_name, projection.hierarchy_path
            );
            Ok(CommandResponse::ok(message, projection.to_json()))
        })
    }

    /// Projection of a node with all of its components.
    ///
    /// Parameters: `nodeId` (required), `includeNonPublic`.
    pub fn get_node(&self, scene: &Scene, params: &Value) -> CommandResponse {
        guarded("get_node", || {
            let params = object(params)?;
            let id = required_id(params, "nodeId")?;
            let options = self.options(params)?;
            let projection = self.projector.project_node(scene, id, &options)?;
            let message = format!(
                "Projected '{}' with {} component(s)",
                projection.hierarchy_path,
                projection.components.len()
            );
            Ok(CommandResponse::ok(message, projection.to_json()))
        })
    }

    fn options(&self, params: &Map<String, Value>) -> ProjectionResult<ProjectOptions<'static>> {
        let include = coerce_bool(param(params, "includeNonPublic"), "includeNonPublic")?;
        Ok(ProjectOptions {
            include_non_public: include,
            ..ProjectOptions::default()
        })
    }
}

impl Default for Commands {
    fn default() -> Self {
        Self::new(ProjectionConfig::default())
    }
}

fn object(params: &Value) -> ProjectionResult<&Map<String, Value>> {
    static EMPTY: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);
    match params {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(&EMPTY),
        other => Err(ProjectionError::validation(
            "params",
            format!("expected an object, got {other}"),
        )),
    }
}

fn param<'a>(params: &'a Map<String, Value>, key: &str) -> &'a Value {
    params.get(key).unwrap_or(&Value::Null)
}

fn required_id(params: &Map<String, Value>, key: &str) -> ProjectionResult<InstanceId> {
    coerce_int(param(params, key), key)?
        .map(InstanceId::from_raw)
        .ok_or_else(|| ProjectionError::validation(key, "required"))
}

fn to_value<T: Serialize>(value: &T) -> ProjectionResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ProjectionError::validation("response", e.to_string()))
}

/// Run `f`, turning errors and panics into failure responses.
fn guarded(
    command: &str,
    f: impl FnOnce() -> ProjectionResult<CommandResponse>,
) -> CommandResponse {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            log::warn!("{command} failed: {e}");
            CommandResponse::failure(e.to_string())
        }
        Err(payload) => {
            let reason = panic_payload_to_string(&*payload);
            log::error!("{command} panicked: {reason}");
            CommandResponse::failure(format!("Internal error in {command}: {reason}"))
        }
    }
}

fn panic_payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::number(json!(5), Some(5))]
    #[case::float(json!(5.9), Some(5))]
    #[case::string(json!("12"), Some(12))]
    #[case::float_string(json!(" 3.0 "), Some(3))]
    #[case::null(Value::Null, None)]
    #[case::blank(json!(""), None)]
    fn ints(#[case] value: Value, #[case] expected: Option<i64>) {
        assert_eq!(coerce_int(&value, "n").unwrap(), expected);
    }

    #[rstest]
    #[case::word(json!("abc"))]
    #[case::bool(json!(true))]
    #[case::array(json!([1]))]
    fn bad_ints(#[case] value: Value) {
        assert!(matches!(
            coerce_int(&value, "pageSize"),
            Err(ProjectionError::Validation { param, .. }) if param == "pageSize"
        ));
    }

    #[rstest]
    #[case::yes(json!("yes"), Some(true))]
    #[case::off(json!("OFF"), Some(false))]
    #[case::one(json!(1), Some(true))]
    #[case::literal(json!(false), Some(false))]
    #[case::null(Value::Null, None)]
    fn bools(#[case] value: Value, #[case] expected: Option<bool>) {
        assert_eq!(coerce_bool(&value, "b").unwrap(), expected);
    }

    #[test]
    fn bad_bool_is_validation() {
        assert!(coerce_bool(&json!("maybe"), "includeTransform").is_err());
        assert!(coerce_bool(&json!(2), "includeTransform").is_err());
    }

    #[test]
    fn parent_accepts_ids_and_text() {
        assert_eq!(parent_selector(&json!(7)).unwrap(), Some(ParentSelector::Id(7)));
        assert_eq!(
            parent_selector(&json!("Root/Child")).unwrap(),
            Some(ParentSelector::Text("Root/Child".into()))
        );
        assert_eq!(parent_selector(&json!("")).unwrap(), None);
        assert!(parent_selector(&json!({"id": 1})).is_err());
    }

    #[test]
    fn panics_become_failures() {
        let response = guarded("boom", || panic!("exploded"));
        assert!(!response.success);
        assert!(response.message.contains("exploded"));
    }

    #[test]
    fn response_json_omits_missing_data() {
        let response = CommandResponse::failure("nope");
        assert_eq!(response.to_json(), json!({"success": false, "message": "nope"}));
    }
}
