//! Blueprint templates: reusable switch layouts.
//!
//! A blueprint describes a physical switch: which platform event it emits,
//! which field of that event identifies the individual device, the service
//! its actions call, and the geometry of each button for the UI.
//!
//! # Example YAML
//!
//! ```yaml
//! name: Hue Dimmer Switch
//! service: zha
//! event_type: zha_event
//! identifier_key: device_ieee
//! buttons:
//!   - shape: rect
//!     x: 10
//!     y: 10
//!     width: 60
//!     height: 40
//!     actions:
//!       - title: press
//!         conditions:
//!           - key: command
//!             value: on_short_release
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use super::validate::{Validator, coerce_string, join};
use crate::error::Result;

/// Equality predicate over a platform event's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub value: String,
}

impl Condition {
    /// True when `data` carries `key` and its stringified value equals `value`.
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        data.get(&self.key)
            .and_then(coerce_string)
            .is_some_and(|actual| actual == self.value)
    }

    fn parse(value: &Value, path: &str, v: &mut Validator) -> Option<Self> {
        let map = v.object(value, path)?;
        v.reject_extra(map, &["key", "value"], path);
        let key = v.required_string(map, "key", path);
        let value = v.required_string(map, "value", path);
        Some(Self { key: key?, value: value? })
    }
}

/// Logical AND over a condition list; an empty list always matches.
pub fn conditions_match(conditions: &[Condition], data: &Map<String, Value>) -> bool {
    conditions.iter().all(|c| c.matches(data))
}

fn parse_conditions(map: &Map<String, Value>, path: &str, v: &mut Validator) -> Vec<Condition> {
    v.optional_list(map, "conditions")
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| Condition::parse(item, &join(&join(path, "conditions"), i), v))
        .collect()
}

/// Button outline drawn by the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonShape {
    #[default]
    Rect,
    Circle,
    Path,
}

impl ButtonShape {
    const CHOICES: [&'static str; 3] = ["rect", "circle", "path"];

    fn from_name(name: &str) -> Self {
        match name {
            "circle" => Self::Circle,
            "path" => Self::Path,
            _ => Self::Rect,
        }
    }
}

/// One selectable action on a blueprint button (e.g. "press", "hold").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintAction {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A button in the blueprint layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintButton {
    pub actions: Vec<BlueprintAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub shape: ButtonShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// SVG path data, used with `shape: path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

/// Validated blueprint. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    pub name: String,
    pub service: String,
    pub event_type: String,
    pub identifier_key: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub has_image: bool,
    pub buttons: Vec<BlueprintButton>,
}

const BLUEPRINT_KEYS: [&str; 6] = [
    "name",
    "service",
    "event_type",
    "identifier_key",
    "conditions",
    "buttons",
];

const BUTTON_KEYS: [&str; 8] = [
    "actions",
    "conditions",
    "shape",
    "x",
    "y",
    "width",
    "height",
    "d",
];

impl Blueprint {
    /// Validates a raw blueprint document and builds the blueprint.
    ///
    /// Every field error in the document is reported, not just the first.
    pub fn from_document(id: &str, doc: &Value, has_image: bool) -> Result<Self> {
        trace!(id, "Validating blueprint document");
        let mut v = Validator::new();
        let blueprint = Self::parse(id, doc, has_image, &mut v);
        v.finish(format!("blueprint ({id})"), blueprint)
    }

    fn parse(id: &str, doc: &Value, has_image: bool, v: &mut Validator) -> Option<Self> {
        let map = v.object(doc, "")?;
        v.reject_extra(map, &BLUEPRINT_KEYS, "");

        let name = v.required_string(map, "name", "");
        let service = v.required_string(map, "service", "");
        let event_type = v.required_string(map, "event_type", "");
        let identifier_key = v.required_string(map, "identifier_key", "");
        let conditions = parse_conditions(map, "", v);
        let buttons = v.required_list(map, "buttons", "").map(|items| {
            items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| parse_button(item, &join("buttons", i), v))
                .collect()
        });

        Some(Self {
            id: id.to_string(),
            name: name?,
            service: service?,
            event_type: event_type?,
            identifier_key: identifier_key?,
            conditions,
            has_image,
            buttons: buttons?,
        })
    }

    /// The blueprint action at `(button, action)`, if the layout has one.
    pub fn action(&self, button: usize, action: usize) -> Option<(&BlueprintButton, &BlueprintAction)> {
        let b = self.buttons.get(button)?;
        b.actions.get(action).map(|a| (b, a))
    }
}

fn parse_button(value: &Value, path: &str, v: &mut Validator) -> Option<BlueprintButton> {
    let map = v.object(value, path)?;
    v.reject_extra(map, &BUTTON_KEYS, path);

    let actions = v.required_list(map, "actions", path).map(|items| {
        items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| parse_action(item, &join(&join(path, "actions"), i), v))
            .collect()
    });
    let conditions = parse_conditions(map, path, v);
    let shape = v.one_of(map, "shape", path, &ButtonShape::CHOICES, "rect");

    Some(BlueprintButton {
        actions: actions?,
        conditions,
        shape: ButtonShape::from_name(&shape?),
        x: v.optional_uint(map, "x", path),
        y: v.optional_uint(map, "y", path),
        width: v.optional_uint(map, "width", path),
        height: v.optional_uint(map, "height", path),
        d: v.optional_string(map, "d", path),
    })
}

fn parse_action(value: &Value, path: &str, v: &mut Validator) -> Option<BlueprintAction> {
    let map = v.object(value, path)?;
    v.reject_extra(map, &["title", "conditions"], path);
    let title = v.required_string(map, "title", path);
    let conditions = parse_conditions(map, path, v);
    Some(BlueprintAction {
        title: title?,
        conditions,
    })
}
