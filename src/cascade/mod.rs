//! Style cascade resolution
//!
//! Effective attributes are computed on demand and never stored on the
//! tree. Resolution is a pure function of the node, its row, the document
//! and the [`ResolveContext`].

mod layers;

use serde::Serialize;

use crate::config::RenderConfig;
use crate::model::attributes::{
    accepts, normalize_lengths, COLUMN_ATTRIBUTES, CONTAINER_ATTRIBUTES, ROW_ATTRIBUTES,
};
use crate::model::{Attributes, Block, BlockKind, Column, Email, Row};
use crate::theme::{derive_theme, ThemePalette};

use layers::Scope;

/// Image `src` value replaced by the company logo
pub const LOGO_SENTINEL: &str = "logo";

/// Company branding supplied by the surrounding application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Company {
    /// Asset key or URL of the company logo
    pub logo_image_key: Option<String>,
}

impl Company {
    pub fn with_logo(key: impl Into<String>) -> Self {
        Self {
            logo_image_key: Some(key.into()),
        }
    }
}

/// View options for a resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveContext {
    pub mobile_view: bool,
    pub company: Option<Company>,
    pub config: RenderConfig,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mobile_view(mut self, mobile: bool) -> Self {
        self.mobile_view = mobile;
        self
    }

    pub fn with_company(mut self, company: Company) -> Self {
        self.company = Some(company);
        self
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// URL substituted for the logo sentinel, if a logo is known
    pub fn logo_url(&self) -> Option<String> {
        let key = self.company.as_ref()?.logo_image_key.as_deref()?;
        let absolute = key.starts_with("http://")
            || key.starts_with("https://")
            || key.starts_with("data:")
            || key.starts_with("//");
        match &self.config.asset_base_url {
            Some(base) if !absolute => Some(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                key.trim_start_matches('/')
            )),
            _ => Some(key.to_string()),
        }
    }
}

/// Palette for the document's theme seed, if it declares one
pub fn email_palette(email: &Email) -> Option<ThemePalette> {
    email.theme.as_deref().map(derive_theme)
}

/// Effective attributes of a block in its row
pub fn resolve(block: &Block, row: &Row, email: &Email) -> Attributes {
    resolve_with(block, row, email, &ResolveContext::default())
}

pub fn resolve_with(block: &Block, row: &Row, email: &Email, ctx: &ResolveContext) -> Attributes {
    let palette = email_palette(email);
    let column_index = row
        .columns
        .iter()
        .position(|c| c.blocks.iter().any(|b| b.id == block.id));
    let scope = Scope {
        email,
        row,
        column_index,
        palette: palette.as_ref(),
        mobile: ctx.mobile_view,
    };
    resolve_block_in(block, &scope, ctx)
}

fn resolve_block_in(block: &Block, scope: &Scope, ctx: &ResolveContext) -> Attributes {
    let kind = block.kind;
    let mut attrs = layers::kind_defaults(block, scope);
    if scope.mobile {
        attrs.merge(&layers::kind_mobile_defaults(block));
    }
    attrs.merge(&layers::row_type_block_defaults(kind, scope));
    attrs.merge(&layers::variant_block_defaults(kind, scope));
    attrs.merge(&layers::theme_block_defaults(kind, scope));
    attrs.merge(&layers::explicit_layer(&block.attributes));
    if scope.mobile {
        attrs.merge(&layers::mobile_layer(&block.attributes));
    }

    if matches!(kind, BlockKind::Image | BlockKind::Icon)
        && attrs.get_str("src") == Some(LOGO_SENTINEL)
    {
        if let Some(url) = ctx.logo_url() {
            attrs.set("src", url);
        }
    }

    attrs.retain(|key| accepts(kind, key));
    normalize_lengths(&mut attrs);
    attrs
}

/// Effective row attributes
pub fn resolve_row(row: &Row, email: &Email, ctx: &ResolveContext) -> Attributes {
    let palette = email_palette(email);
    resolve_row_in(row, email, palette.as_ref(), ctx)
}

fn resolve_row_in(
    row: &Row,
    email: &Email,
    palette: Option<&ThemePalette>,
    ctx: &ResolveContext,
) -> Attributes {
    let mut attrs = layers::row_base(email);
    if ctx.mobile_view {
        attrs.merge(
            &Attributes::new()
                .with("paddingLeft", 16.0)
                .with("paddingRight", 16.0),
        );
    }
    attrs.merge(&layers::row_type_row_defaults(row));
    attrs.merge(&layers::variant_row_defaults(row, email));
    attrs.merge(&layers::theme_row_defaults(row, palette));
    attrs.merge(&layers::explicit_layer(&row.attributes));
    if ctx.mobile_view {
        attrs.merge(&layers::mobile_layer(&row.attributes));
    }
    finish(attrs, ROW_ATTRIBUTES)
}

/// Effective attributes of the record wrapping a row
pub fn resolve_container(row: &Row, email: &Email, ctx: &ResolveContext) -> Attributes {
    let mut attrs = layers::container_base(email);
    attrs.merge(&layers::explicit_layer(&row.container));
    if ctx.mobile_view {
        attrs.merge(&layers::mobile_layer(&row.container));
    }
    finish(attrs, CONTAINER_ATTRIBUTES)
}

/// Effective column attributes
pub fn resolve_column(
    column: &Column,
    row: &Row,
    email: &Email,
    ctx: &ResolveContext,
) -> Attributes {
    let scope = Scope {
        email,
        row,
        column_index: row.columns.iter().position(|c| c.id == column.id),
        palette: None,
        mobile: ctx.mobile_view,
    };
    let mut attrs = layers::column_base(&scope);
    attrs.merge(&layers::explicit_layer(&column.attributes));
    if ctx.mobile_view {
        attrs.merge(&layers::mobile_layer(&column.attributes));
    }
    finish(attrs, COLUMN_ATTRIBUTES)
}

fn finish(mut attrs: Attributes, accepted: &[&str]) -> Attributes {
    attrs.retain(|key| accepted.contains(&key));
    normalize_lengths(&mut attrs);
    attrs
}

/// A document with every node's effective attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEmail {
    pub id: String,
    pub name: String,
    pub preview_text: String,
    pub font_family: String,
    /// Render width in px for the selected view
    pub width: u32,
    pub color: String,
    pub background_color: String,
    pub link_color: String,
    pub mobile_view: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<ThemePalette>,
    pub rows: Vec<ResolvedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRow {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub row_type: Option<String>,
    pub attributes: Attributes,
    pub container: Attributes,
    pub columns: Vec<ResolvedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedColumn {
    pub id: String,
    pub units: u8,
    /// Percentage width, e.g. `"50%"`
    pub width: String,
    pub attributes: Attributes,
    pub blocks: Vec<ResolvedBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub attributes: Attributes,
}

/// Resolve every node of a document
pub fn resolve_email(email: &Email, ctx: &ResolveContext) -> ResolvedEmail {
    let palette = email_palette(email);

    let rows = email
        .rows
        .iter()
        .map(|row| ResolvedRow {
            id: row.id.clone(),
            row_type: row.row_type.as_ref().map(|t| t.name().to_string()),
            attributes: resolve_row_in(row, email, palette.as_ref(), ctx),
            container: resolve_container(row, email, ctx),
            columns: row
                .columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    let scope = Scope {
                        email,
                        row,
                        column_index: Some(index),
                        palette: palette.as_ref(),
                        mobile: ctx.mobile_view,
                    };
                    ResolvedColumn {
                        id: column.id.clone(),
                        units: column.units,
                        width: column.width_percent(),
                        attributes: resolve_column(column, row, email, ctx),
                        blocks: column
                            .blocks
                            .iter()
                            .map(|block| ResolvedBlock {
                                id: block.id.clone(),
                                kind: block.kind,
                                content: block.content.clone(),
                                attributes: resolve_block_in(block, &scope, ctx),
                            })
                            .collect(),
                    }
                })
                .collect(),
        })
        .collect();

    ResolvedEmail {
        id: email.id.clone(),
        name: email.name.clone(),
        preview_text: email.preview_text.clone(),
        font_family: email.font_family.clone(),
        width: if ctx.mobile_view {
            ctx.config.mobile_width
        } else {
            email.width
        },
        color: email.color.clone(),
        background_color: email.background_color.clone(),
        link_color: email.link_color.clone(),
        mobile_view: ctx.mobile_view,
        palette,
        rows,
    }
}
