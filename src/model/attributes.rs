//! Attribute bags and the per-kind attribute model
//!
//! Every node in the tree carries an [`Attributes`] bag of primitive values.
//! The bag is free-form while a document is being edited; the closed set of
//! keys each block kind accepts is enforced when attributes are resolved
//! (see [`accepts`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::BlockKind;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    /// Structured values such as table rows or social links
    Json(serde_json::Value),
}

impl AttrValue {
    pub fn text(s: impl Into<String>) -> Self {
        AttrValue::Text(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the value; text such as `"12px"` yields `12.0`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().trim_end_matches("px").trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            AttrValue::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Render the value as it appears in a CSS declaration or HTML attribute
    pub fn to_css(&self) -> String {
        match self {
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Number(n) => format_number(*n),
            AttrValue::Text(s) => s.clone(),
            AttrValue::Json(v) => v.to_string(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_css())
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(v: serde_json::Value) -> Self {
        AttrValue::Json(v)
    }
}

/// Format a number without a trailing `.0` for whole values
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Ordered attribute bag
///
/// Backed by a `BTreeMap` so iteration (and therefore every serialized
/// form) is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(AttrValue::as_str)
    }

    /// CSS rendering of a value, if present
    pub fn css(&self, key: &str) -> Option<String> {
        self.0.get(key).map(AttrValue::to_css)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    /// Overlay `other` on top of this bag; keys in `other` win
    pub fn merge(&mut self, other: &Attributes) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|k, _| keep(k));
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a AttrValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Key holding per-node mobile overrides (a JSON object)
pub const MOBILE_KEY: &str = "mobile";

/// Attributes every block kind accepts
pub const COMMON_ATTRIBUTES: &[&str] = &[
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "color",
    "backgroundColor",
    "fontFamily",
    "fontSize",
    "fontWeight",
    "fontStyle",
    "lineHeight",
    "letterSpacing",
    "textAlign",
    "textDecoration",
    "width",
    "height",
    "maxWidth",
];

pub const ROW_ATTRIBUTES: &[&str] = &[
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "backgroundColor",
    "backgroundImage",
    "borderColor",
    "borderWidth",
    "borderStyle",
    "borderRadius",
    "align",
    "verticalAlign",
    "columnSpacing",
    "color",
    "minHeight",
];

pub const CONTAINER_ATTRIBUTES: &[&str] = &[
    "align",
    "backgroundColor",
    "backgroundImage",
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "borderRadius",
];

pub const COLUMN_ATTRIBUTES: &[&str] = &[
    "align",
    "verticalAlign",
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "backgroundColor",
    "borderColor",
    "borderWidth",
    "borderStyle",
    "borderRadius",
];

/// Keys whose bare numeric values are pixel lengths
const LENGTH_KEYS: &[&str] = &[
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "marginTop",
    "marginRight",
    "marginBottom",
    "marginLeft",
    "fontSize",
    "letterSpacing",
    "borderRadius",
    "borderWidth",
    "width",
    "height",
    "maxWidth",
    "minHeight",
    "iconSize",
    "spacing",
    "cellPadding",
    "itemSpacing",
    "columnSpacing",
];

/// Keys that take CSS box shorthand (`8,16,8,16`)
pub const BOX_KEYS: &[&str] = &["padding", "margin"];

/// Attributes specific to one block kind, on top of [`COMMON_ATTRIBUTES`]
pub fn kind_attributes(kind: BlockKind) -> &'static [&'static str] {
    match kind {
        BlockKind::Text => &["textTransform"],
        BlockKind::Heading => &["level", "textTransform"],
        BlockKind::Image => &["src", "alt", "href", "target", "borderRadius", "align"],
        BlockKind::Button => &[
            "href",
            "target",
            "align",
            "borderRadius",
            "borderColor",
            "borderWidth",
            "borderStyle",
        ],
        BlockKind::Link => &["href", "target", "align"],
        BlockKind::Divider => &["borderColor", "borderWidth", "borderStyle"],
        BlockKind::Socials => &["socialLinks", "iconSize", "iconStyle", "align", "spacing"],
        BlockKind::Survey => &["question", "links", "surveyType", "align", "buttonColor"],
        BlockKind::Table => &[
            "rows",
            "headerRow",
            "borderColor",
            "borderWidth",
            "cellPadding",
            "headerBackgroundColor",
            "stripeColor",
        ],
        BlockKind::List => &["items", "ordered", "itemSpacing", "bulletColor"],
        BlockKind::Spacer => &[],
        BlockKind::Icon => &["src", "alt", "href", "align"],
    }
}

/// Whether a block kind accepts an attribute key
pub fn accepts(kind: BlockKind, key: &str) -> bool {
    COMMON_ATTRIBUTES.contains(&key) || kind_attributes(kind).contains(&key)
}

pub fn is_length_key(key: &str) -> bool {
    LENGTH_KEYS.contains(&key)
}

/// Convert bare numeric lengths into `px` strings
pub fn normalize_lengths(attrs: &mut Attributes) {
    for (key, value) in attrs.0.iter_mut() {
        if !is_length_key(key) {
            continue;
        }
        if let AttrValue::Number(n) = value {
            *value = AttrValue::Text(format!("{}px", format_number(*n)));
        }
    }
}

/// Expand a CSS box shorthand list into its four sides
///
/// Follows the CSS one-to-four value rules; returns `None` for an empty
/// list or one longer than four values.
pub fn expand_box(key: &str, values: &[f64]) -> Option<[(String, f64); 4]> {
    let (top, right, bottom, left) = match *values {
        [all] => (all, all, all, all),
        [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
        [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
        [top, right, bottom, left] => (top, right, bottom, left),
        _ => return None,
    };
    Some([
        (format!("{key}Top"), top),
        (format!("{key}Right"), right),
        (format!("{key}Bottom"), bottom),
        (format!("{key}Left"), left),
    ])
}
