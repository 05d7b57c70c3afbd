//! Programmatic document builders and starter templates
//!
//! ```
//! use email_builder::starter::{ColumnBuilder, EmailBuilder, RowBuilder};
//!
//! let email = EmailBuilder::new("hello")
//!     .name("Hello")
//!     .row(RowBuilder::new().column(ColumnBuilder::new().text("<p>Hi</p>")))
//!     .build();
//! assert_eq!(email.rows[0].columns[0].units, 12);
//! ```

use crate::edit::grid::assign_units;
use crate::model::{
    AttrValue, Attributes, Block, BlockKind, Column, Email, IdGenerator, Row, RowType,
    StyleVariant,
};

/// Fluent builder for a whole document
#[derive(Debug, Clone)]
pub struct EmailBuilder {
    email: Email,
    ids: IdGenerator,
}

impl EmailBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let email = Email::new(id);
        let mut ids = IdGenerator::new();
        ids.reserve(&email.id);
        Self { email, ids }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.email.name = name.into();
        self
    }

    pub fn preview_text(mut self, text: impl Into<String>) -> Self {
        self.email.preview_text = text.into();
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.email.font_family = family.into();
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.email.background_color = color.into();
        self
    }

    pub fn style_variant(mut self, variant: StyleVariant) -> Self {
        self.email.style_variant = Some(variant);
        self
    }

    pub fn theme(mut self, seed: impl Into<String>) -> Self {
        self.email.theme = Some(seed.into());
        self
    }

    /// Append a row, giving it and its contents fresh ids
    pub fn row(mut self, row: RowBuilder) -> Self {
        let built = row.finish(&mut self.ids);
        self.email.rows.push(built);
        self
    }

    pub fn build(self) -> Email {
        self.email
    }
}

/// A row under construction; ids are assigned when it joins a document
#[derive(Debug, Clone, Default)]
pub struct RowBuilder {
    row_type: Option<RowType>,
    attributes: Attributes,
    container: Attributes,
    columns: Vec<ColumnBuilder>,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(row_type: RowType) -> Self {
        Self {
            row_type: Some(row_type),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.set(key, value);
        self
    }

    pub fn container(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.container.set(key, value);
        self
    }

    pub fn column(mut self, column: ColumnBuilder) -> Self {
        self.columns.push(column);
        self
    }

    fn finish(self, ids: &mut IdGenerator) -> Row {
        let mut columns = self.columns;
        if columns.is_empty() {
            columns.push(ColumnBuilder::new());
        }
        let declared: Vec<Option<u8>> = columns.iter().map(|c| c.units).collect();
        let units = assign_units(&declared);

        let mut row = Row::new(ids.next_id("row"), vec![]);
        row.row_type = self.row_type;
        row.attributes = self.attributes;
        row.container = self.container;
        row.columns = columns
            .into_iter()
            .zip(units)
            .map(|(column, units)| column.finish(units, ids))
            .collect();
        row
    }
}

#[derive(Debug, Clone)]
struct PendingBlock {
    kind: BlockKind,
    content: Option<String>,
    attributes: Attributes,
}

/// A column under construction
#[derive(Debug, Clone, Default)]
pub struct ColumnBuilder {
    units: Option<u8>,
    attributes: Attributes,
    blocks: Vec<PendingBlock>,
}

impl ColumnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column spanning `units` of the 12-unit grid
    pub fn units(units: u8) -> Self {
        Self {
            units: Some(units),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.set(key, value);
        self
    }

    /// Append a block of any kind
    pub fn block(
        mut self,
        kind: BlockKind,
        content: Option<&str>,
        attributes: Attributes,
    ) -> Self {
        self.blocks.push(PendingBlock {
            kind,
            content: content.map(String::from),
            attributes,
        });
        self
    }

    pub fn text(self, html: &str) -> Self {
        self.block(BlockKind::Text, Some(html), Attributes::new())
    }

    pub fn heading(self, level: &str, text: &str) -> Self {
        self.block(
            BlockKind::Heading,
            Some(text),
            Attributes::new().with("level", level),
        )
    }

    pub fn image(self, src: &str, alt: &str) -> Self {
        self.block(
            BlockKind::Image,
            None,
            Attributes::new().with("src", src).with("alt", alt),
        )
    }

    pub fn button(self, label: &str, href: &str) -> Self {
        self.block(
            BlockKind::Button,
            Some(label),
            Attributes::new().with("href", href),
        )
    }

    pub fn link(self, label: &str, href: &str) -> Self {
        self.block(
            BlockKind::Link,
            Some(label),
            Attributes::new().with("href", href),
        )
    }

    pub fn divider(self) -> Self {
        self.block(BlockKind::Divider, None, Attributes::new())
    }

    pub fn spacer(self, height: f64) -> Self {
        self.block(
            BlockKind::Spacer,
            None,
            Attributes::new().with("height", height),
        )
    }

    pub fn socials(self, links: serde_json::Value) -> Self {
        self.block(
            BlockKind::Socials,
            None,
            Attributes::new().with("socialLinks", links),
        )
    }

    pub fn table(self, rows: serde_json::Value) -> Self {
        self.block(BlockKind::Table, None, Attributes::new().with("rows", rows))
    }

    pub fn list(self, items: serde_json::Value, ordered: bool) -> Self {
        self.block(
            BlockKind::List,
            None,
            Attributes::new().with("items", items).with("ordered", ordered),
        )
    }

    fn finish(self, units: u8, ids: &mut IdGenerator) -> Column {
        let mut column = Column::new(ids.next_id("column"), units);
        column.attributes = self.attributes;
        column.blocks = self
            .blocks
            .into_iter()
            .map(|pending| Block {
                id: ids.next_id("block"),
                kind: pending.kind,
                content: pending.content,
                attributes: pending.attributes,
            })
            .collect();
        column
    }
}

fn header() -> RowBuilder {
    RowBuilder::typed(RowType::Header)
        .column(ColumnBuilder::units(6).image("logo", "Logo"))
        .column(ColumnBuilder::units(6).link("View in browser", "{{view_url}}"))
}

fn footer() -> RowBuilder {
    RowBuilder::typed(RowType::Footer).column(
        ColumnBuilder::new()
            .socials(serde_json::json!([
                {"platform": "x", "url": "https://x.com"},
                {"platform": "instagram", "url": "https://instagram.com"}
            ]))
            .text("<p>You are receiving this email because you signed up.</p>")
            .link("Unsubscribe", "{{unsubscribe_url}}"),
    )
}

/// Single-column onboarding email
pub fn welcome() -> Email {
    EmailBuilder::new("welcome")
        .name("Welcome")
        .preview_text("Thanks for joining us")
        .row(header())
        .row(
            RowBuilder::typed(RowType::Hero).column(
                ColumnBuilder::new()
                    .heading("h1", "Welcome aboard")
                    .text("<p>We are glad to have you. Here is how to get started.</p>")
                    .button("Get started", "https://example.com/start"),
            ),
        )
        .row(
            RowBuilder::new().column(
                ColumnBuilder::new()
                    .list(
                        serde_json::json!([
                            "Complete your profile",
                            "Invite your team",
                            "Send your first campaign"
                        ]),
                        true,
                    )
                    .divider(),
            ),
        )
        .row(footer())
        .build()
}

/// Two-column article digest
pub fn newsletter() -> Email {
    let article = |title: &str| {
        ColumnBuilder::new()
            .image("https://placehold.co/280x160", title)
            .heading("h3", title)
            .text("<p>A short summary of the story.</p>")
            .link("Read more", "https://example.com/blog")
    };

    EmailBuilder::new("newsletter")
        .name("Monthly newsletter")
        .preview_text("What happened this month")
        .style_variant(StyleVariant::Outline)
        .row(header())
        .row(
            RowBuilder::new().column(
                ColumnBuilder::new()
                    .heading("h1", "This month")
                    .text("<p>Our favourite stories, all in one place.</p>"),
            ),
        )
        .row(
            RowBuilder::typed(RowType::Gallery)
                .column(article("Product update"))
                .column(article("Customer story")),
        )
        .row(footer())
        .build()
}

/// Sale announcement with a discount block
pub fn promotion() -> Email {
    EmailBuilder::new("promotion")
        .name("Spring sale")
        .preview_text("20% off everything this week")
        .theme("#F97316")
        .row(header())
        .row(
            RowBuilder::typed(RowType::Hero).column(
                ColumnBuilder::new()
                    .image("https://placehold.co/600x240", "Spring sale")
                    .heading("h1", "Spring sale"),
            ),
        )
        .row(
            RowBuilder::typed(RowType::Discount).column(
                ColumnBuilder::new()
                    .heading("h2", "SPRING20")
                    .text("<p>Use this code at checkout.</p>"),
            ),
        )
        .row(
            RowBuilder::typed(RowType::Cart)
                .column(ColumnBuilder::units(4).image("https://placehold.co/80", "Jacket"))
                .column(
                    ColumnBuilder::units(8).table(serde_json::json!([
                        ["Item", "Price"],
                        ["Rain jacket", "$96"]
                    ])),
                ),
        )
        .row(
            RowBuilder::typed(RowType::Cta)
                .column(ColumnBuilder::new().button("Shop the sale", "https://example.com/sale")),
        )
        .row(footer())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unique_ids(email: &Email) {
        let mut ids = email.ids();
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count, "duplicate ids in {}", email.id);
    }

    #[test]
    fn test_builder_assigns_ids_and_units() {
        let email = EmailBuilder::new("e")
            .row(
                RowBuilder::new()
                    .column(ColumnBuilder::units(8).text("a"))
                    .column(ColumnBuilder::new()),
            )
            .row(RowBuilder::new())
            .build();
        assert_eq!(email.rows[0].id, "row-1");
        assert_eq!(email.rows[0].columns[0].id, "column-2");
        assert_eq!(email.rows[0].columns[0].blocks[0].id, "block-3");
        let units: Vec<u8> = email.rows[0].columns.iter().map(|c| c.units).collect();
        assert_eq!(units, vec![8, 4]);
        assert_eq!(email.rows[1].columns.len(), 1);
        assert_eq!(email.rows[1].columns[0].units, 12);
    }

    #[test]
    fn test_starters_are_well_formed() {
        for email in [welcome(), newsletter(), promotion()] {
            assert_unique_ids(&email);
            for row in &email.rows {
                assert_eq!(row.grid_total(), 12, "row {} in {}", row.id, email.id);
            }
        }
    }

    #[test]
    fn test_header_uses_logo_sentinel() {
        let email = welcome();
        let logo = &email.rows[0].columns[0].blocks[0];
        assert_eq!(logo.kind, BlockKind::Image);
        assert_eq!(logo.attributes.get_str("src"), Some("logo"));
    }
}
