//! Default layers of the style cascade
//!
//! Each function returns one layer as an attribute bag. The resolver merges
//! them in order of increasing precedence: kind defaults, row-type defaults,
//! style-variant defaults, theme values, then the node's own attributes.

use tracing::debug;

use crate::model::attributes::{expand_box, BOX_KEYS, MOBILE_KEY};
use crate::model::{AttrValue, Attributes, Block, BlockKind, Email, Row, RowType, StyleVariant};
use crate::theme::{text_color_for, Rgb, ThemePalette};

/// Where a node sits while it is being resolved
pub(crate) struct Scope<'a> {
    pub email: &'a Email,
    pub row: &'a Row,
    /// Index of the column holding the node, when known
    pub column_index: Option<usize>,
    pub palette: Option<&'a ThemePalette>,
    pub mobile: bool,
}

impl Scope<'_> {
    /// Second column of a two-column header
    fn is_header_aside(&self) -> bool {
        self.row.row_type == Some(RowType::Header)
            && self.row.columns.len() == 2
            && self.column_index == Some(1)
    }

    fn is_frame_row(&self) -> bool {
        self.row.row_type.as_ref().is_some_and(RowType::is_frame)
    }
}

const BORDER_COLOR: &str = "#E4E4E7";
const MUTED_TEXT: &str = "#71717A";
const OUTLINE_TEXT: &str = "#1F2937";
const OUTLINE_HEADING: &str = "#111827";

/// Font size in px for a heading level
pub(crate) fn heading_size(level: &str, mobile: bool) -> f64 {
    match (level, mobile) {
        ("h1", false) => 32.0,
        ("h1", true) => 26.0,
        ("h3", false) => 20.0,
        ("h3", true) => 18.0,
        ("h4", false) => 18.0,
        ("h4", true) => 16.0,
        ("h5", false) => 16.0,
        ("h5", true) => 14.0,
        (_, false) => 24.0,
        (_, true) => 20.0,
    }
}

pub(crate) fn heading_level(block: &Block) -> &str {
    match block.attributes.get_str("level") {
        Some(level @ ("h1" | "h2" | "h3" | "h4" | "h5")) => level,
        _ => "h2",
    }
}

/// Hard defaults for a block kind
pub(crate) fn kind_defaults(block: &Block, scope: &Scope) -> Attributes {
    let email = scope.email;
    match block.kind {
        BlockKind::Text => text_defaults(email),
        BlockKind::Heading => heading_defaults(email, heading_level(block)),
        BlockKind::Image => image_defaults(),
        BlockKind::Button => button_defaults(email),
        BlockKind::Link => link_defaults(email),
        BlockKind::Divider => divider_defaults(),
        BlockKind::Socials => socials_defaults(),
        BlockKind::Survey => survey_defaults(email),
        BlockKind::Table => table_defaults(email),
        BlockKind::List => list_defaults(email),
        BlockKind::Spacer => Attributes::new().with("height", 24.0),
        BlockKind::Icon => Attributes::new().with("width", 32.0).with("align", "center"),
    }
}

fn typography(email: &Email) -> Attributes {
    Attributes::new()
        .with("fontFamily", email.font_family.as_str())
        .with("color", email.color.as_str())
        .with("fontSize", 14.0)
        .with("lineHeight", 1.5)
}

fn text_defaults(email: &Email) -> Attributes {
    let mut attrs = typography(email);
    attrs.merge(
        &Attributes::new()
            .with("paddingTop", 8.0)
            .with("paddingBottom", 8.0)
            .with("paddingLeft", 8.0)
            .with("paddingRight", 8.0)
            .with("textAlign", "left"),
    );
    attrs
}

fn heading_defaults(email: &Email, level: &str) -> Attributes {
    let mut attrs = typography(email);
    attrs.merge(
        &Attributes::new()
            .with("level", level)
            .with("fontSize", heading_size(level, false))
            .with("fontWeight", "bold")
            .with("lineHeight", 1.2)
            .with("paddingTop", 8.0)
            .with("paddingBottom", 8.0)
            .with("textAlign", "left"),
    );
    attrs
}

fn image_defaults() -> Attributes {
    Attributes::new()
        .with("width", "100%")
        .with("align", "center")
        .with("alt", "")
        .with("borderRadius", 0.0)
}

fn button_defaults(email: &Email) -> Attributes {
    let mut attrs = typography(email);
    attrs.merge(
        &Attributes::new()
            .with("backgroundColor", email.link_color.as_str())
            .with("color", "#FFFFFF")
            .with("borderRadius", 24.0)
            .with("paddingTop", 12.0)
            .with("paddingBottom", 12.0)
            .with("paddingLeft", 24.0)
            .with("paddingRight", 24.0)
            .with("fontWeight", "bold")
            .with("textAlign", "center")
            .with("align", "center")
            .with("href", "#"),
    );
    attrs
}

fn link_defaults(email: &Email) -> Attributes {
    let mut attrs = typography(email);
    attrs.merge(
        &Attributes::new()
            .with("color", email.link_color.as_str())
            .with("textDecoration", "underline")
            .with("align", "left")
            .with("href", "#"),
    );
    attrs
}

fn divider_defaults() -> Attributes {
    Attributes::new()
        .with("borderColor", BORDER_COLOR)
        .with("borderWidth", 1.0)
        .with("borderStyle", "solid")
        .with("paddingTop", 8.0)
        .with("paddingBottom", 8.0)
}

fn socials_defaults() -> Attributes {
    Attributes::new()
        .with("iconSize", 24.0)
        .with("iconStyle", "color")
        .with("spacing", 8.0)
        .with("align", "center")
}

fn survey_defaults(email: &Email) -> Attributes {
    let mut attrs = typography(email);
    attrs.merge(
        &Attributes::new()
            .with("surveyType", "rating")
            .with("align", "center")
            .with("buttonColor", email.link_color.as_str()),
    );
    attrs
}

fn table_defaults(email: &Email) -> Attributes {
    let mut attrs = typography(email);
    attrs.merge(
        &Attributes::new()
            .with("borderColor", BORDER_COLOR)
            .with("borderWidth", 1.0)
            .with("cellPadding", 8.0)
            .with("headerRow", true)
            .with("headerBackgroundColor", "#F4F4F5"),
    );
    attrs
}

fn list_defaults(email: &Email) -> Attributes {
    let mut attrs = typography(email);
    attrs.merge(
        &Attributes::new()
            .with("ordered", false)
            .with("itemSpacing", 4.0)
            .with("bulletColor", email.color.as_str()),
    );
    attrs
}

/// Narrow-screen adjustments applied right above the kind defaults
pub(crate) fn kind_mobile_defaults(block: &Block) -> Attributes {
    match block.kind {
        BlockKind::Heading => {
            Attributes::new().with("fontSize", heading_size(heading_level(block), true))
        }
        BlockKind::Image => Attributes::new().with("width", "100%"),
        BlockKind::Button => Attributes::new().with("paddingLeft", 16.0).with("paddingRight", 16.0),
        _ => Attributes::new(),
    }
}

/// Block defaults selected by the parent row's type
pub(crate) fn row_type_block_defaults(kind: BlockKind, scope: &Scope) -> Attributes {
    let mut attrs = match (&scope.row.row_type, kind) {
        (None, _) => Attributes::new(),
        (Some(RowType::Header), BlockKind::Image) => {
            Attributes::new().with("width", 120.0).with("align", "left")
        }
        (Some(RowType::Header), BlockKind::Text | BlockKind::Link) => Attributes::new()
            .with("fontSize", 12.0)
            .with("textDecoration", "none"),
        (Some(RowType::Footer), BlockKind::Text) => Attributes::new()
            .with("fontSize", 12.0)
            .with("color", MUTED_TEXT)
            .with("textAlign", "center"),
        (Some(RowType::Footer), BlockKind::Link) => Attributes::new()
            .with("fontSize", 12.0)
            .with("color", MUTED_TEXT)
            .with("align", "center"),
        (Some(RowType::Footer), BlockKind::Socials) => Attributes::new().with("iconSize", 20.0),
        (Some(RowType::Hero), BlockKind::Heading | BlockKind::Text) => {
            Attributes::new().with("textAlign", "center")
        }
        (Some(RowType::Hero | RowType::Cta | RowType::Discount), BlockKind::Button) => {
            Attributes::new().with("align", "center")
        }
        (Some(RowType::Gallery), BlockKind::Heading) => Attributes::new().with("fontSize", 16.0),
        (Some(RowType::Gallery), BlockKind::Text) => Attributes::new().with("fontSize", 13.0),
        (Some(RowType::Gallery), BlockKind::Image) => Attributes::new().with("borderRadius", 8.0),
        (Some(RowType::Cart), BlockKind::Image) => {
            Attributes::new().with("width", 80.0).with("borderRadius", 4.0)
        }
        (Some(RowType::Cart), BlockKind::Text) => Attributes::new().with("fontSize", 13.0),
        (Some(RowType::Cart), BlockKind::Table) => Attributes::new().with("cellPadding", 12.0),
        (Some(RowType::Discount), BlockKind::Heading) => Attributes::new()
            .with("fontSize", 28.0)
            .with("textAlign", "center"),
        (Some(RowType::Discount | RowType::Cta), BlockKind::Heading | BlockKind::Text) => {
            Attributes::new().with("textAlign", "center")
        }
        (Some(RowType::Other(name)), _) => {
            debug!(row_type = %name, "no defaults for row type, using generic layer");
            Attributes::new()
        }
        _ => Attributes::new(),
    };

    if scope.is_header_aside() {
        attrs.set("textAlign", "right");
        attrs.set("align", "right");
    }
    attrs
}

pub(crate) fn variant_block_defaults(kind: BlockKind, scope: &Scope) -> Attributes {
    match (scope.email.variant(), kind) {
        (StyleVariant::Outline, BlockKind::Text | BlockKind::List | BlockKind::Table)
            if !scope.is_frame_row() =>
        {
            Attributes::new().with("color", OUTLINE_TEXT)
        }
        (StyleVariant::Outline, BlockKind::Heading) if !scope.is_frame_row() => {
            Attributes::new().with("color", OUTLINE_HEADING)
        }
        (StyleVariant::Outline, BlockKind::Button) => Attributes::new().with("borderRadius", 8.0),
        (StyleVariant::Clear, BlockKind::Divider) => Attributes::new().with("borderWidth", 0.0),
        _ => Attributes::new(),
    }
}

pub(crate) fn theme_block_defaults(kind: BlockKind, scope: &Scope) -> Attributes {
    let Some(palette) = scope.palette else {
        return Attributes::new();
    };
    let on_action = Rgb::parse(&palette.action)
        .map(text_color_for)
        .unwrap_or("#FFFFFF");

    let mut attrs = match kind {
        BlockKind::Button => Attributes::new()
            .with("backgroundColor", palette.action.as_str())
            .with("color", on_action),
        BlockKind::Link => Attributes::new().with("color", palette.action.as_str()),
        BlockKind::Survey => Attributes::new().with("buttonColor", palette.action.as_str()),
        BlockKind::List => Attributes::new().with("bulletColor", palette.action.as_str()),
        BlockKind::Divider => Attributes::new().with("borderColor", palette.levels[2].as_str()),
        BlockKind::Table => {
            Attributes::new().with("headerBackgroundColor", palette.light.as_str())
        }
        _ => Attributes::new(),
    };

    // Text on the seed-colored header must contrast with it
    if scope.row.row_type == Some(RowType::Header)
        && matches!(
            kind,
            BlockKind::Text | BlockKind::Heading | BlockKind::Link
        )
    {
        attrs.set("color", palette.text_color.as_str());
    }
    attrs
}

/// Base row layer; supplies the document's row background
pub(crate) fn row_base(email: &Email) -> Attributes {
    Attributes::new()
        .with("backgroundColor", email.row_background_color.as_str())
        .with("paddingTop", 16.0)
        .with("paddingBottom", 16.0)
        .with("paddingLeft", 24.0)
        .with("paddingRight", 24.0)
        .with("align", "center")
        .with("verticalAlign", "top")
        .with("columnSpacing", 0.0)
}

pub(crate) fn row_type_row_defaults(row: &Row) -> Attributes {
    match &row.row_type {
        None => Attributes::new(),
        Some(RowType::Header) => Attributes::new()
            .with("paddingTop", 16.0)
            .with("paddingBottom", 16.0)
            .with("verticalAlign", "middle"),
        Some(RowType::Footer) => Attributes::new()
            .with("paddingTop", 24.0)
            .with("paddingBottom", 24.0)
            .with("color", MUTED_TEXT),
        Some(RowType::Hero) => Attributes::new()
            .with("paddingTop", 40.0)
            .with("paddingBottom", 40.0),
        Some(RowType::Gallery) => Attributes::new().with("columnSpacing", 8.0),
        Some(RowType::Cart) => Attributes::new().with("verticalAlign", "middle"),
        Some(RowType::Discount) => Attributes::new()
            .with("paddingTop", 32.0)
            .with("paddingBottom", 32.0)
            .with("borderStyle", "dashed")
            .with("borderWidth", 2.0)
            .with("borderColor", BORDER_COLOR),
        Some(RowType::Cta) => Attributes::new()
            .with("paddingTop", 32.0)
            .with("paddingBottom", 32.0),
        Some(RowType::Other(name)) => {
            debug!(row_type = %name, "no defaults for row type, using generic layer");
            Attributes::new()
        }
    }
}

pub(crate) fn variant_row_defaults(row: &Row, email: &Email) -> Attributes {
    let frame = row.row_type.as_ref().is_some_and(RowType::is_frame);
    match email.variant() {
        StyleVariant::Default if row.row_type == Some(RowType::Footer) => {
            Attributes::new().with("backgroundColor", email.background_color.as_str())
        }
        StyleVariant::Default => Attributes::new(),
        StyleVariant::Outline if !frame => Attributes::new()
            .with("borderColor", BORDER_COLOR)
            .with("borderWidth", 1.0)
            .with("borderStyle", "solid")
            .with("borderRadius", 12.0)
            .with("paddingTop", 24.0)
            .with("paddingBottom", 24.0)
            .with("paddingLeft", 24.0)
            .with("paddingRight", 24.0),
        StyleVariant::Outline => Attributes::new(),
        StyleVariant::Floating => Attributes::new()
            .with("backgroundColor", "#FFFFFF")
            .with("borderRadius", 16.0)
            .with("paddingLeft", 32.0)
            .with("paddingRight", 32.0),
        StyleVariant::Clear => Attributes::new()
            .with("backgroundColor", "transparent")
            .with("borderWidth", 0.0),
    }
}

pub(crate) fn theme_row_defaults(row: &Row, palette: Option<&ThemePalette>) -> Attributes {
    let Some(palette) = palette else {
        return Attributes::new();
    };
    match &row.row_type {
        Some(RowType::Header) => Attributes::new()
            .with("backgroundColor", palette.base.as_str())
            .with("color", palette.text_color.as_str()),
        Some(RowType::Footer) | Some(RowType::Discount) => {
            Attributes::new().with("backgroundColor", palette.light.as_str())
        }
        Some(RowType::Hero) => Attributes::new()
            .with("backgroundColor", palette.gradient_light.start.as_str())
            .with("backgroundImage", palette.gradient_light.css()),
        _ => Attributes::new(),
    }
}

pub(crate) fn container_base(email: &Email) -> Attributes {
    match email.variant() {
        StyleVariant::Floating => Attributes::new()
            .with("align", "center")
            .with("paddingTop", 8.0)
            .with("paddingBottom", 8.0),
        _ => Attributes::new().with("align", "center"),
    }
}

pub(crate) fn column_base(scope: &Scope) -> Attributes {
    let mut attrs = Attributes::new()
        .with("align", "left")
        .with("verticalAlign", scope.row.attributes.get_str("verticalAlign").unwrap_or("top"));
    if scope.is_header_aside() {
        attrs.set("align", "right");
    }
    attrs
}

/// A node's own attributes with box shorthands expanded and the mobile
/// override bag removed
pub(crate) fn explicit_layer(attrs: &Attributes) -> Attributes {
    let mut layer = Attributes::new();
    for (key, value) in attrs {
        if key == MOBILE_KEY {
            continue;
        }
        if BOX_KEYS.contains(&key.as_str()) {
            if let Some(sides) = box_values(value).and_then(|v| expand_box(key, &v)) {
                for (side, n) in sides {
                    layer.set(side, n);
                }
                continue;
            }
        }
        layer.set(key.clone(), value.clone());
    }
    layer
}

/// The `mobile` override bag, applied last in mobile view
pub(crate) fn mobile_layer(attrs: &Attributes) -> Attributes {
    let Some(serde_json::Value::Object(map)) = attrs.get(MOBILE_KEY).and_then(AttrValue::as_json)
    else {
        return Attributes::new();
    };
    let overrides: Attributes = map
        .iter()
        .map(|(key, value)| (key.clone(), json_value(value)))
        .collect();
    explicit_layer(&overrides)
}

fn json_value(value: &serde_json::Value) -> AttrValue {
    match value {
        serde_json::Value::Bool(b) => AttrValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) => AttrValue::Number(f),
            None => AttrValue::Json(value.clone()),
        },
        serde_json::Value::String(s) => AttrValue::text(s.as_str()),
        other => AttrValue::Json(other.clone()),
    }
}

fn box_values(value: &AttrValue) -> Option<Vec<f64>> {
    match value {
        AttrValue::Number(n) => Some(vec![*n]),
        AttrValue::Text(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.trim_end_matches("px").parse().ok())
            .collect(),
        _ => None,
    }
}
