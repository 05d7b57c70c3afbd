//! Lowering from the script AST to the document tree

use tracing::debug;

use crate::edit::grid::assign_units;
use crate::error::{fragment_at, ParseError, Span};
use crate::model::attributes::{expand_box, BOX_KEYS};
use crate::model::{
    percent_to_units, AttrValue, Block, BlockKind, Column, Email, IdGenerator, Row, RowType,
    StyleVariant, GRID_UNITS,
};

use super::ast::{NodeBody, Script, ScriptNode, Spanned};
use super::lexer::{Element, RawAttribute, RawValue, Syntax};

/// Document id used when neither the script nor the caller supplies one
pub const DEFAULT_DOCUMENT_ID: &str = "email";

/// Heading level stored when the script names none or an unknown one
const DEFAULT_HEADING_LEVEL: &str = "h2";

/// Caller-supplied defaults for fields a script leaves out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    pub document_id: Option<String>,
    pub background_color: Option<String>,
    pub link_color: Option<String>,
    pub font_family: Option<String>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn with_link_color(mut self, color: impl Into<String>) -> Self {
        self.link_color = Some(color.into());
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    fn seed(&self) -> Email {
        let id = self
            .document_id
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCUMENT_ID.to_string());
        let mut email = Email::new(id);
        if let Some(color) = &self.background_color {
            email.background_color = color.clone();
        }
        if let Some(color) = &self.link_color {
            email.link_color = color.clone();
        }
        if let Some(family) = &self.font_family {
            email.font_family = family.clone();
        }
        email
    }
}

pub fn lower(script: &Script, source: &str, options: &CompileOptions) -> Result<Email, ParseError> {
    let mut lowerer = Lowerer {
        source,
        ids: IdGenerator::new(),
    };
    lowerer.reserve_ids(&script.nodes)?;

    let mut email = options.seed();

    if script.syntax == Syntax::Tag {
        match script.nodes.as_slice() {
            [root] if root.node.element == Element::Email => {}
            [] => {
                return Err(ParseError::structure(
                    source,
                    0..source.len(),
                    "tag-form script needs an <EMAIL> root",
                ))
            }
            [first, ..] => {
                return Err(lowerer.error(
                    first.span.clone(),
                    "tag-form script must have a single <EMAIL> root",
                ))
            }
        }
    }

    for (index, node) in script.nodes.iter().enumerate() {
        match node.node.element {
            Element::Email => {
                if index > 0 {
                    return Err(lowerer.error(node.span.clone(), "EMAIL must come first"));
                }
                lowerer.apply_email_attributes(&mut email, &node.node)?;
                for child in lowerer.children(node)? {
                    email.rows.push(lowerer.lower_row(child)?);
                }
            }
            Element::Row => email.rows.push(lowerer.lower_row(node)?),
            other => {
                return Err(lowerer.error(
                    node.span.clone(),
                    format!("{} must be inside a ROW", other),
                ))
            }
        }
    }

    Ok(email)
}

struct Lowerer<'s> {
    source: &'s str,
    ids: IdGenerator,
}

impl<'s> Lowerer<'s> {
    fn error(&self, span: Span, message: impl Into<String>) -> ParseError {
        ParseError::structure(self.source, span, message)
    }

    /// Reserve every explicit id up front so generated ids never collide
    fn reserve_ids(&mut self, nodes: &[Spanned<ScriptNode>]) -> Result<(), ParseError> {
        for node in nodes {
            if node.node.element != Element::Email {
                if let Some(attr) = node.node.attribute("id") {
                    let id = attr.node.value.as_str();
                    if !self.ids.reserve(id) {
                        return Err(self.error(attr.span.clone(), format!("duplicate id `{}`", id)));
                    }
                }
            }
            if let NodeBody::Children(children) = &node.node.body {
                self.reserve_ids(children)?;
            }
        }
        Ok(())
    }

    fn node_id(&mut self, node: &ScriptNode, prefix: &str) -> String {
        match node.attribute("id") {
            Some(attr) => attr.node.value.as_str().to_string(),
            None => self.ids.next_id(prefix),
        }
    }

    /// Child nodes of a container element; content text is not allowed
    fn children<'n>(
        &self,
        node: &'n Spanned<ScriptNode>,
    ) -> Result<&'n [Spanned<ScriptNode>], ParseError> {
        match &node.node.body {
            NodeBody::Empty => Ok(&[]),
            NodeBody::Children(children) => Ok(children),
            NodeBody::Content(_) => Err(self.error(
                node.span.clone(),
                format!("{} cannot contain text content", node.node.element),
            )),
        }
    }

    fn apply_email_attributes(
        &self,
        email: &mut Email,
        node: &ScriptNode,
    ) -> Result<(), ParseError> {
        for attr in &node.attributes {
            let text = attr.node.value.as_str().to_string();
            match attr.node.key.as_str() {
                "id" => email.id = text,
                "name" => email.name = text,
                "previewText" | "preview" => email.preview_text = text,
                "fontFamily" => email.font_family = text,
                "width" => {
                    email.width = text
                        .trim()
                        .trim_end_matches("px")
                        .parse::<u32>()
                        .ok()
                        .filter(|w| *w > 0)
                        .ok_or_else(|| {
                            self.error(attr.span.clone(), format!("invalid email width `{}`", text))
                        })?
                }
                "color" => email.color = text,
                "backgroundColor" => email.background_color = text,
                "rowBackgroundColor" => email.row_background_color = text,
                "linkColor" => email.link_color = text,
                "styleVariant" | "variant" => {
                    email.style_variant = StyleVariant::from_name(&text);
                    if email.style_variant.is_none() {
                        debug!(variant = %text, "unknown style variant, using default");
                    }
                }
                "theme" => email.theme = Some(text),
                other => debug!(key = other, "ignoring unknown email attribute"),
            }
        }
        Ok(())
    }

    fn lower_row(&mut self, node: &Spanned<ScriptNode>) -> Result<Row, ParseError> {
        if node.node.element != Element::Row {
            return Err(self.error(
                node.span.clone(),
                format!("expected ROW, found {}", node.node.element),
            ));
        }

        let mut row = Row::new(self.node_id(&node.node, "row"), vec![]);
        for attr in &node.node.attributes {
            let key = attr.node.key.as_str();
            match key {
                "id" => {}
                "type" => row.row_type = Some(RowType::from(attr.node.value.as_str())),
                _ if key.len() > "container".len() && key.starts_with("container") => {
                    let inner = lower_first(&key["container".len()..]);
                    for (k, v) in self.convert(&inner, attr)? {
                        row.container.set(k, v);
                    }
                }
                _ => {
                    for (k, v) in self.convert(key, attr)? {
                        row.attributes.set(k, v);
                    }
                }
            }
        }

        let children = self.children(node)?;
        if children.len() > usize::from(GRID_UNITS) {
            return Err(self.error(
                node.span.clone(),
                format!(
                    "ROW has {} columns, at most {} fit the grid",
                    children.len(),
                    GRID_UNITS
                ),
            ));
        }

        let mut declared = Vec::with_capacity(children.len());
        for child in children {
            let (column, width) = self.lower_column(child)?;
            row.columns.push(column);
            declared.push(width);
        }

        if row.columns.is_empty() {
            row.columns
                .push(Column::new(self.ids.next_id("column"), GRID_UNITS));
        } else {
            for (column, units) in row.columns.iter_mut().zip(assign_units(&declared)) {
                column.units = units;
            }
        }
        Ok(row)
    }

    fn lower_column(
        &mut self,
        node: &Spanned<ScriptNode>,
    ) -> Result<(Column, Option<u8>), ParseError> {
        if node.node.element != Element::Column {
            return Err(self.error(
                node.span.clone(),
                format!("ROW may only contain COLUMN, found {}", node.node.element),
            ));
        }

        let mut column = Column::new(self.node_id(&node.node, "column"), GRID_UNITS);
        let mut width = None;
        for attr in &node.node.attributes {
            match attr.node.key.as_str() {
                "id" => {}
                "width" => {
                    let raw = attr.node.value.as_str();
                    width = Some(parse_width(raw).ok_or_else(|| {
                        self.error(
                            attr.span.clone(),
                            format!(
                                "invalid column width `{}` (use a percentage or 1-12 grid units)",
                                raw
                            ),
                        )
                    })?);
                }
                key => {
                    for (k, v) in self.convert(key, attr)? {
                        column.attributes.set(k, v);
                    }
                }
            }
        }

        for child in self.children(node)? {
            column.blocks.push(self.lower_block(child)?);
        }
        Ok((column, width))
    }

    fn lower_block(&mut self, node: &Spanned<ScriptNode>) -> Result<Block, ParseError> {
        let Element::Block(kind) = node.node.element else {
            return Err(self.error(
                node.span.clone(),
                format!("COLUMN may only contain blocks, found {}", node.node.element),
            ));
        };

        let mut block = Block::new(self.node_id(&node.node, "block"), kind);
        for attr in &node.node.attributes {
            let key = attr.node.key.as_str();
            match key {
                "id" => {}
                "content" => block.content = Some(attr.node.value.as_str().to_string()),
                "level" if kind == BlockKind::Heading => {
                    block.attributes.set("level", heading_level(attr.node.value.as_str()));
                }
                _ => {
                    for (k, v) in self.convert(key, attr)? {
                        block.attributes.set(k, v);
                    }
                }
            }
        }

        match &node.node.body {
            NodeBody::Empty => {}
            NodeBody::Content(text) => {
                if !text.is_empty() {
                    block.content = Some(text.clone());
                }
            }
            NodeBody::Children(_) => {
                return Err(self.error(
                    node.span.clone(),
                    format!("{} cannot contain other elements", kind),
                ))
            }
        }
        Ok(block)
    }

    /// Typed attribute values for one script attribute
    fn convert(
        &self,
        key: &str,
        attr: &Spanned<RawAttribute>,
    ) -> Result<Vec<(String, AttrValue)>, ParseError> {
        match &attr.node.value {
            RawValue::Structured(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(value) => Ok(vec![(key.to_string(), AttrValue::Json(value))]),
                Err(err) => Err(ParseError::InvalidJson {
                    fragment: fragment_at(self.source, &attr.span),
                    span: attr.span.clone(),
                    key: key.to_string(),
                    message: err.to_string(),
                }),
            },
            RawValue::Html(raw) => Ok(vec![(key.to_string(), AttrValue::text(raw.as_str()))]),
            RawValue::Bare(raw) | RawValue::Quoted(raw) => {
                if BOX_KEYS.contains(&key) {
                    if let Some(sides) = parse_number_list(raw).and_then(|n| expand_box(key, &n)) {
                        return Ok(sides
                            .into_iter()
                            .map(|(k, n)| (k, AttrValue::Number(n)))
                            .collect());
                    }
                }
                let value = match &attr.node.value {
                    RawValue::Bare(_) => bare_value(raw),
                    _ => AttrValue::text(raw.as_str()),
                };
                Ok(vec![(key.to_string(), value)])
            }
        }
    }
}

/// Unquoted scalars: booleans, numbers, otherwise literal text
fn bare_value(raw: &str) -> AttrValue {
    match raw {
        "true" => AttrValue::Bool(true),
        "false" => AttrValue::Bool(false),
        _ => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => AttrValue::Number(n),
            _ => AttrValue::text(raw),
        },
    }
}

/// `8,16,8,16`, `8px 16px` and similar box shorthand lists
fn parse_number_list(raw: &str) -> Option<Vec<f64>> {
    let values = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.trim_end_matches("px").parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    (!values.is_empty()).then_some(values)
}

fn heading_level(raw: &str) -> AttrValue {
    let lower = raw.to_ascii_lowercase();
    let digits = lower.strip_prefix('h').unwrap_or(&lower);
    match digits.parse::<u8>() {
        Ok(n @ 1..=5) => AttrValue::text(format!("h{}", n)),
        _ => {
            debug!(level = raw, fallback = DEFAULT_HEADING_LEVEL, "unknown heading level");
            AttrValue::text(DEFAULT_HEADING_LEVEL)
        }
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `50%` or whole grid units `1..=12`
fn parse_width(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    if let Some(percent) = raw.strip_suffix('%') {
        let percent: f64 = percent.trim().parse().ok()?;
        return (percent > 0.0 && percent <= 100.0).then(|| percent_to_units(percent));
    }
    raw.parse::<u8>()
        .ok()
        .filter(|units| (1..=GRID_UNITS).contains(units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_width() {
        assert_eq!(parse_width("50%"), Some(6));
        assert_eq!(parse_width("33.33%"), Some(4));
        assert_eq!(parse_width("4"), Some(4));
        assert_eq!(parse_width("13"), None);
        assert_eq!(parse_width("wide"), None);
    }

    #[test]
    fn test_bare_value_types() {
        assert_eq!(bare_value("true"), AttrValue::Bool(true));
        assert_eq!(bare_value("16"), AttrValue::Number(16.0));
        assert_eq!(bare_value("#fff"), AttrValue::text("#fff"));
        assert_eq!(bare_value("NaN"), AttrValue::text("NaN"));
    }

    #[test]
    fn test_parse_number_list() {
        assert_eq!(parse_number_list("8,16"), Some(vec![8.0, 16.0]));
        assert_eq!(parse_number_list("8px 16px"), Some(vec![8.0, 16.0]));
        assert_eq!(parse_number_list("auto"), None);
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("1"), AttrValue::text("h1"));
        assert_eq!(heading_level("H3"), AttrValue::text("h3"));
        assert_eq!(heading_level("h5"), AttrValue::text("h5"));
    }

    #[test]
    fn test_heading_level_out_of_range_falls_back() {
        assert_eq!(heading_level("7"), AttrValue::text("h2"));
        assert_eq!(heading_level("h9"), AttrValue::text("h2"));
        assert_eq!(heading_level("h0"), AttrValue::text("h2"));
        assert_eq!(heading_level("title"), AttrValue::text("h2"));
    }
}
