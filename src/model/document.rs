//! Document tree: email → rows → columns → blocks

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attributes::{AttrValue, Attributes};

/// Number of grid units a row's columns share
pub const GRID_UNITS: u8 = 12;

/// Content block kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Heading,
    Image,
    Button,
    Link,
    Divider,
    Socials,
    Survey,
    Table,
    List,
    Spacer,
    Icon,
}

impl BlockKind {
    pub const ALL: [BlockKind; 12] = [
        BlockKind::Text,
        BlockKind::Heading,
        BlockKind::Image,
        BlockKind::Button,
        BlockKind::Link,
        BlockKind::Divider,
        BlockKind::Socials,
        BlockKind::Survey,
        BlockKind::Table,
        BlockKind::List,
        BlockKind::Spacer,
        BlockKind::Icon,
    ];

    /// Script keyword, e.g. `TEXT`
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::Text => "TEXT",
            BlockKind::Heading => "HEADING",
            BlockKind::Image => "IMAGE",
            BlockKind::Button => "BUTTON",
            BlockKind::Link => "LINK",
            BlockKind::Divider => "DIVIDER",
            BlockKind::Socials => "SOCIALS",
            BlockKind::Survey => "SURVEY",
            BlockKind::Table => "TABLE",
            BlockKind::List => "LIST",
            BlockKind::Spacer => "SPACER",
            BlockKind::Icon => "ICON",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }

    /// Kinds whose `content` is a rich-text fragment
    pub fn is_text_bearing(self) -> bool {
        matches!(
            self,
            BlockKind::Text | BlockKind::Heading | BlockKind::Button | BlockKind::Link
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Document-wide visual preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleVariant {
    #[default]
    Default,
    Outline,
    Floating,
    Clear,
}

impl StyleVariant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(StyleVariant::Default),
            "outline" => Some(StyleVariant::Outline),
            "floating" => Some(StyleVariant::Floating),
            "clear" => Some(StyleVariant::Clear),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StyleVariant::Default => "default",
            StyleVariant::Outline => "outline",
            StyleVariant::Floating => "floating",
            StyleVariant::Clear => "clear",
        }
    }
}

/// Semantic row tag selecting specialised default styling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RowType {
    Header,
    Footer,
    Hero,
    Gallery,
    Cart,
    Discount,
    Cta,
    /// A tag with no dedicated defaults
    Other(String),
}

impl RowType {
    pub fn name(&self) -> &str {
        match self {
            RowType::Header => "header",
            RowType::Footer => "footer",
            RowType::Hero => "hero",
            RowType::Gallery => "gallery",
            RowType::Cart => "cart",
            RowType::Discount => "discount",
            RowType::Cta => "cta",
            RowType::Other(name) => name,
        }
    }

    /// Header and footer rows frame the email and skip variant envelopes
    pub fn is_frame(&self) -> bool {
        matches!(self, RowType::Header | RowType::Footer)
    }
}

impl From<String> for RowType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "header" => RowType::Header,
            "footer" => RowType::Footer,
            "hero" => RowType::Hero,
            "gallery" => RowType::Gallery,
            "cart" => RowType::Cart,
            "discount" => RowType::Discount,
            "cta" => RowType::Cta,
            _ => RowType::Other(name),
        }
    }
}

impl From<&str> for RowType {
    fn from(name: &str) -> Self {
        RowType::from(name.to_string())
    }
}

impl From<RowType> for String {
    fn from(row_type: RowType) -> Self {
        row_type.name().to_string()
    }
}

/// Root template record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: String,
    pub name: String,
    pub preview_text: String,
    pub font_family: String,
    /// Nominal render width in px
    pub width: u32,
    pub color: String,
    pub background_color: String,
    pub row_background_color: String,
    pub link_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_variant: Option<StyleVariant>,
    /// Theme seed color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub rows: Vec<Row>,
}

impl Email {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "Untitled email".to_string(),
            preview_text: String::new(),
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            width: 600,
            color: "#000000".to_string(),
            background_color: "#F4F4F5".to_string(),
            row_background_color: "#FFFFFF".to_string(),
            link_color: "#8E6FF7".to_string(),
            style_variant: None,
            theme: None,
            rows: vec![],
        }
    }

    pub fn variant(&self) -> StyleVariant {
        self.style_variant.unwrap_or_default()
    }

    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn row_index(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Locate a column as `(row index, column index)`
    pub fn column_position(&self, id: &str) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(ri, row)| {
            row.columns
                .iter()
                .position(|c| c.id == id)
                .map(|ci| (ri, ci))
        })
    }

    /// Locate a block as `(row index, column index, block index)`
    pub fn block_position(&self, id: &str) -> Option<(usize, usize, usize)> {
        self.rows.iter().enumerate().find_map(|(ri, row)| {
            row.columns.iter().enumerate().find_map(|(ci, column)| {
                column
                    .blocks
                    .iter()
                    .position(|b| b.id == id)
                    .map(|bi| (ri, ci, bi))
            })
        })
    }

    /// A block together with the row that owns it
    pub fn block(&self, id: &str) -> Option<(&Row, &Block)> {
        let (ri, ci, bi) = self.block_position(id)?;
        let row = &self.rows[ri];
        Some((row, &row.columns[ci].blocks[bi]))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .flat_map(|c| c.blocks.iter())
    }

    /// Every node id in document order, duplicates included
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = vec![];
        for row in &self.rows {
            ids.push(row.id.as_str());
            for column in &row.columns {
                ids.push(column.id.as_str());
                ids.extend(column.blocks.iter().map(|b| b.id.as_str()));
            }
        }
        ids
    }
}

/// A horizontal band of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub row_type: Option<RowType>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub container: Attributes,
    pub columns: Vec<Column>,
}

impl Row {
    pub fn new(id: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id: id.into(),
            row_type: None,
            attributes: Attributes::new(),
            container: Attributes::new(),
            columns,
        }
    }

    pub fn grid_total(&self) -> u32 {
        self.columns.iter().map(|c| u32::from(c.units)).sum()
    }
}

/// A vertical slot inside a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    /// Width in grid units (1..=12)
    pub units: u8,
    #[serde(default)]
    pub attributes: Attributes,
    pub blocks: Vec<Block>,
}

impl Column {
    pub fn new(id: impl Into<String>, units: u8) -> Self {
        Self {
            id: id.into(),
            units,
            attributes: Attributes::new(),
            blocks: vec![],
        }
    }

    pub fn percent(&self) -> f64 {
        units_to_percent(self.units)
    }

    /// Width as a CSS percentage string, e.g. `"33.33%"`
    pub fn width_percent(&self) -> String {
        format_percent(self.percent())
    }
}

/// A content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            content: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.set(key, value);
        self
    }
}

pub fn units_to_percent(units: u8) -> f64 {
    f64::from(units) / f64::from(GRID_UNITS) * 100.0
}

/// Nearest whole grid units for a percentage, at least one
pub fn percent_to_units(percent: f64) -> u8 {
    let units = (percent / 100.0 * f64::from(GRID_UNITS)).round();
    units.clamp(1.0, f64::from(GRID_UNITS)) as u8
}

pub fn format_percent(percent: f64) -> String {
    let rounded = (percent * 100.0).round() / 100.0;
    format!("{}%", super::attributes::format_number(rounded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_conversions() {
        assert_eq!(percent_to_units(50.0), 6);
        assert_eq!(percent_to_units(33.33), 4);
        assert_eq!(percent_to_units(0.0), 1);
        assert_eq!(Column::new("c", 4).width_percent(), "33.33%");
        assert_eq!(Column::new("c", 6).width_percent(), "50%");
        assert_eq!(Column::new("c", 12).width_percent(), "100%");
    }

    #[test]
    fn test_row_type_round_trip_names() {
        assert_eq!(RowType::from("hero"), RowType::Hero);
        assert_eq!(
            RowType::from("testimonial"),
            RowType::Other("testimonial".to_string())
        );
        assert_eq!(String::from(RowType::Cta), "cta");
    }

    #[test]
    fn test_block_kind_keywords() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(BlockKind::from_keyword("ROW"), None);
    }

    #[test]
    fn test_block_position() {
        let mut email = Email::new("e");
        let mut column = Column::new("c1", 12);
        column.blocks.push(Block::new("b1", BlockKind::Text));
        column.blocks.push(Block::new("b2", BlockKind::Image));
        email.rows.push(Row::new("r1", vec![column]));

        assert_eq!(email.block_position("b2"), Some((0, 0, 1)));
        assert_eq!(email.column_position("c1"), Some((0, 0)));
        assert_eq!(email.ids(), vec!["r1", "c1", "b1", "b2"]);
        assert!(email.block("missing").is_none());
    }
}
