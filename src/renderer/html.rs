//! Email-safe HTML export of a resolved document
//!
//! Layout is built from nested presentation tables only. Rich-text
//! `content` is parsed and re-serialised, never escaped as text.

use serde_json::Value;
use tracing::debug;

use crate::cascade::{ResolvedBlock, ResolvedColumn, ResolvedEmail, ResolvedRow};
use crate::config::RenderConfig;
use crate::model::{AttrValue, Attributes, BlockKind};

use super::content::{escape_attr, escape_html, normalize_html};

/// Attribute keys emitted as inline CSS
const CSS_KEYS: &[&str] = &[
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "color",
    "backgroundColor",
    "backgroundImage",
    "fontFamily",
    "fontSize",
    "fontWeight",
    "fontStyle",
    "lineHeight",
    "letterSpacing",
    "textAlign",
    "textDecoration",
    "textTransform",
    "width",
    "height",
    "maxWidth",
    "minHeight",
    "borderColor",
    "borderWidth",
    "borderStyle",
    "borderRadius",
];

const TABLE_OPEN: &str = r#"role="presentation" cellpadding="0" cellspacing="0" border="0""#;

/// Build HTML output line by line
struct HtmlBuilder<'c> {
    config: &'c RenderConfig,
    lines: Vec<String>,
    depth: usize,
}

impl<'c> HtmlBuilder<'c> {
    fn new(config: &'c RenderConfig) -> Self {
        Self {
            config,
            lines: vec![],
            depth: 0,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        if self.config.pretty_print {
            let indent = self.config.indent.repeat(self.depth);
            self.lines.push(format!("{}{}", indent, text.as_ref()));
        } else {
            self.lines.push(text.as_ref().to_string());
        }
    }

    fn open(&mut self, tag: impl AsRef<str>) {
        self.line(tag);
        self.depth += 1;
    }

    fn close(&mut self, tag: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(tag);
    }

    fn build(self) -> String {
        let separator = if self.config.pretty_print { "\n" } else { "" };
        self.lines.join(separator)
    }
}

/// Render a complete HTML document
pub fn to_html(email: &ResolvedEmail, config: &RenderConfig) -> String {
    let mut html = HtmlBuilder::new(config);
    let background = escape_attr(&email.background_color);

    html.line("<!DOCTYPE html>");
    html.open(r#"<html lang="en">"#);
    html.open("<head>");
    html.line(r#"<meta charset="UTF-8">"#);
    html.line(r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#);
    html.line(format!("<title>{}</title>", escape_html(&email.name)));
    html.line(format!(
        "<style>a {{ color: {}; }} p {{ margin: 0; }}</style>",
        escape_html(&email.link_color)
    ));
    html.close("</head>");

    html.open(format!(
        r#"<body style="margin:0;padding:0;background-color:{};">"#,
        background
    ));
    if !email.preview_text.is_empty() {
        html.line(format!(
            r#"<div style="display:none;max-height:0;overflow:hidden;mso-hide:all;">{}</div>"#,
            escape_html(&email.preview_text)
        ));
    }
    html.open(format!(
        r#"<table {} width="100%" style="background-color:{};">"#,
        TABLE_OPEN, background
    ));
    html.open("<tr>");
    html.open(r#"<td align="center">"#);
    html.open(format!(
        r#"<table {} width="{w}" style="width:{w}px;max-width:{w}px;font-family:{};color:{};">"#,
        TABLE_OPEN,
        escape_attr(&email.font_family),
        escape_attr(&email.color),
        w = email.width,
    ));
    for row in &email.rows {
        render_row(&mut html, row, email.mobile_view);
    }
    html.close("</table>");
    html.close("</td>");
    html.close("</tr>");
    html.close("</table>");
    html.close("</body>");
    html.close("</html>");

    html.build()
}

fn render_row(html: &mut HtmlBuilder, row: &ResolvedRow, mobile: bool) {
    let container = &row.container;
    html.open("<tr>");
    html.open(format!(
        r#"<td align="{}"{}>"#,
        escape_attr(container.get_str("align").unwrap_or("center")),
        style_attr(&css(container))
    ));
    html.open(format!(
        r#"<table {} id="{}" width="100%"{}>"#,
        TABLE_OPEN,
        escape_attr(&row.id),
        style_attr(&css(&row.attributes))
    ));

    let valign = row.attributes.get_str("verticalAlign").unwrap_or("top");
    let spacing = row
        .attributes
        .get("columnSpacing")
        .and_then(AttrValue::as_f64)
        .unwrap_or(0.0);

    if mobile {
        // Stack columns vertically
        for (index, column) in row.columns.iter().enumerate() {
            let gap = if index > 0 && spacing > 0.0 {
                format!("padding-top:{}px;", spacing)
            } else {
                String::new()
            };
            html.open("<tr>");
            render_column(html, column, "100%", valign, &gap);
            html.close("</tr>");
        }
    } else {
        html.open("<tr>");
        for (index, column) in row.columns.iter().enumerate() {
            let gap = if index > 0 && spacing > 0.0 {
                format!("padding-left:{}px;", spacing)
            } else {
                String::new()
            };
            render_column(html, column, &column.width, valign, &gap);
        }
        html.close("</tr>");
    }

    html.close("</table>");
    html.close("</td>");
    html.close("</tr>");
}

fn render_column(
    html: &mut HtmlBuilder,
    column: &ResolvedColumn,
    width: &str,
    row_valign: &str,
    gap: &str,
) {
    let attrs = &column.attributes;
    html.open(format!(
        r#"<td id="{}" width="{}" align="{}" valign="{}"{}>"#,
        escape_attr(&column.id),
        escape_attr(width),
        escape_attr(attrs.get_str("align").unwrap_or("left")),
        escape_attr(attrs.get_str("verticalAlign").unwrap_or(row_valign)),
        style_attr(&format!("{}{}", gap, css(attrs)))
    ));
    if column.blocks.is_empty() {
        html.line("&nbsp;");
    }
    for block in &column.blocks {
        render_block(html, block);
    }
    html.close("</td>");
}

fn render_block(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let mut wrapper = css_where(attrs, is_padding);
    if let Some(align) = attrs.get_str("align") {
        wrapper.push_str(&format!("text-align:{};", align));
    }
    html.open(format!(
        r#"<div id="{}"{}>"#,
        escape_attr(&block.id),
        style_attr(&wrapper)
    ));

    match block.kind {
        BlockKind::Text => render_text(html, block),
        BlockKind::Heading => render_heading(html, block),
        BlockKind::Image | BlockKind::Icon => render_image(html, block),
        BlockKind::Button => render_button(html, block),
        BlockKind::Link => render_link(html, block),
        BlockKind::Divider => render_divider(html, block),
        BlockKind::Socials => render_socials(html, block),
        BlockKind::Survey => render_survey(html, block),
        BlockKind::Table => render_table(html, block),
        BlockKind::List => render_list(html, block),
        BlockKind::Spacer => render_spacer(html, block),
    }

    html.close("</div>");
}

fn render_text(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    html.line(format!(
        "<div{}>{}</div>",
        style_attr(&inner_css(&block.attributes)),
        content(block)
    ));
}

fn render_heading(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let level = match block.attributes.get_str("level") {
        Some(level @ ("h1" | "h2" | "h3" | "h4" | "h5")) => level,
        _ => "h2",
    };
    html.line(format!(
        "<{level}{}>{}</{level}>",
        style_attr(&format!("margin:0;{}", inner_css(&block.attributes))),
        content(block)
    ));
}

fn render_image(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let Some(src) = attrs.get_str("src") else {
        debug!(block = %block.id, "image without src skipped");
        return;
    };
    let width = attrs
        .css("width")
        .map(|w| format!(r#" width="{}""#, escape_attr(w.trim_end_matches("px"))))
        .unwrap_or_default();
    let img = format!(
        r#"<img src="{}" alt="{}"{}{} />"#,
        escape_attr(src),
        escape_attr(attrs.get_str("alt").unwrap_or("")),
        width,
        style_attr(&format!(
            "display:inline-block;border:0;outline:none;{}",
            inner_css(attrs)
        ))
    );
    match attrs.get_str("href") {
        Some(href) => html.line(format!(
            r#"<a href="{}"{}>{}</a>"#,
            escape_attr(href),
            target_attr(attrs),
            img
        )),
        None => html.line(img),
    }
}

fn render_button(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let background = attrs.get_str("backgroundColor").unwrap_or("transparent");
    let radius = attrs.css("borderRadius").unwrap_or_else(|| "0".to_string());

    html.open(format!(
        r#"<table {} align="{}">"#,
        TABLE_OPEN,
        escape_attr(attrs.get_str("align").unwrap_or("center"))
    ));
    html.open("<tr>");
    html.open(format!(
        r#"<td align="center" bgcolor="{}" style="border-radius:{};background-color:{};">"#,
        escape_attr(background),
        escape_attr(&radius),
        escape_attr(background)
    ));
    html.line(format!(
        r#"<a href="{}"{}{}>{}</a>"#,
        escape_attr(attrs.get_str("href").unwrap_or("#")),
        target_attr(attrs),
        style_attr(&format!(
            "display:inline-block;text-decoration:none;{}",
            css(attrs)
        )),
        content(block)
    ));
    html.close("</td>");
    html.close("</tr>");
    html.close("</table>");
}

fn render_link(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let href = attrs.get_str("href").unwrap_or("#");
    let label = match &block.content {
        Some(content) => normalize_html(content),
        None => escape_html(href).into_owned(),
    };
    html.line(format!(
        r#"<a href="{}"{}{}>{}</a>"#,
        escape_attr(href),
        target_attr(attrs),
        style_attr(&inner_css(attrs)),
        label
    ));
}

fn render_divider(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let rule = format!(
        "{} {} {}",
        attrs.css("borderWidth").unwrap_or_else(|| "1px".to_string()),
        attrs.get_str("borderStyle").unwrap_or("solid"),
        attrs.get_str("borderColor").unwrap_or("#E4E4E7"),
    );
    html.line(format!(
        r#"<div style="border-top:{};font-size:1px;line-height:1px;">&nbsp;</div>"#,
        escape_attr(&rule)
    ));
}

fn render_spacer(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let height = block
        .attributes
        .css("height")
        .unwrap_or_else(|| "24px".to_string());
    html.line(format!(
        r#"<div style="height:{h};line-height:{h};font-size:1px;">&nbsp;</div>"#,
        h = escape_attr(&height)
    ));
}

fn render_socials(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let links = json_items(attrs, "socialLinks");
    if links.is_empty() {
        debug!(block = %block.id, "socials block without links");
        return;
    }
    let size = attrs
        .get("iconSize")
        .and_then(AttrValue::as_f64)
        .unwrap_or(24.0);
    let half_gap = attrs.get("spacing").and_then(AttrValue::as_f64).unwrap_or(8.0) / 2.0;

    html.open(format!(
        r#"<table {} align="{}">"#,
        TABLE_OPEN,
        escape_attr(attrs.get_str("align").unwrap_or("center"))
    ));
    html.open("<tr>");
    for link in links {
        let name = json_field(link, &["platform", "name", "label"]).unwrap_or("link");
        let href = json_field(link, &["url", "href"]).unwrap_or("#");
        let body = match json_field(link, &["icon", "src", "image"]) {
            Some(icon) => format!(
                r#"<img src="{}" alt="{}" width="{s}" height="{s}" style="display:block;border:0;" />"#,
                escape_attr(icon),
                escape_attr(name),
                s = size
            ),
            None => escape_html(name).into_owned(),
        };
        html.line(format!(
            r#"<td style="padding:0 {g}px;"><a href="{}" target="_blank">{}</a></td>"#,
            escape_attr(href),
            body,
            g = half_gap
        ));
    }
    html.close("</tr>");
    html.close("</table>");
}

fn render_survey(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let text = inner_css(attrs);
    if let Some(question) = attrs.get_str("question") {
        html.line(format!(
            r#"<p{}>{}</p>"#,
            style_attr(&format!("margin:0 0 12px 0;{}", text)),
            escape_html(question)
        ));
    }
    let links = json_items(attrs, "links");
    if links.is_empty() {
        return;
    }
    let color = attrs.get_str("buttonColor").unwrap_or("#8E6FF7");

    html.open(format!(
        r#"<table {} align="{}">"#,
        TABLE_OPEN,
        escape_attr(attrs.get_str("align").unwrap_or("center"))
    ));
    html.open("<tr>");
    for link in links {
        let label = json_field(link, &["label", "text", "value"])
            .map(str::to_string)
            .unwrap_or_else(|| json_text(link));
        let href = json_field(link, &["url", "href"]).unwrap_or("#");
        html.line(format!(
            r#"<td style="padding:0 4px;"><a href="{}" target="_blank" style="display:inline-block;padding:8px 14px;border-radius:6px;background-color:{};color:#FFFFFF;text-decoration:none;">{}</a></td>"#,
            escape_attr(href),
            escape_attr(color),
            escape_html(&label)
        ));
    }
    html.close("</tr>");
    html.close("</table>");
}

fn render_table(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let rows = json_items(attrs, "rows");
    if rows.is_empty() {
        debug!(block = %block.id, "table block without rows");
        return;
    }
    let header = attrs
        .get("headerRow")
        .and_then(AttrValue::as_bool)
        .unwrap_or(true);
    let cell_padding = attrs.css("cellPadding").unwrap_or_else(|| "8px".to_string());
    let border = format!(
        "{} solid {}",
        attrs.css("borderWidth").unwrap_or_else(|| "1px".to_string()),
        attrs.get_str("borderColor").unwrap_or("#E4E4E7")
    );
    let header_background = attrs.get_str("headerBackgroundColor");
    let stripe = attrs.get_str("stripeColor");

    html.open(format!(
        r#"<table {} width="100%"{}>"#,
        TABLE_OPEN,
        style_attr(&format!("border-collapse:collapse;{}", inner_css(attrs)))
    ));
    for (index, row) in rows.iter().enumerate() {
        let is_header = header && index == 0;
        let cell = if is_header { "th" } else { "td" };
        let mut cell_style = format!("padding:{};border:{};text-align:left;", cell_padding, border);
        match (is_header, header_background, stripe) {
            (true, Some(color), _) => cell_style.push_str(&format!("background-color:{};", color)),
            (false, _, Some(color)) if index % 2 == 0 => {
                cell_style.push_str(&format!("background-color:{};", color))
            }
            _ => {}
        }

        html.open("<tr>");
        let cells = row.as_array().map(Vec::as_slice).unwrap_or(std::slice::from_ref(row));
        for value in cells {
            html.line(format!(
                r#"<{cell} style="{}">{}</{cell}>"#,
                escape_attr(&cell_style),
                escape_html(&json_text(value))
            ));
        }
        html.close("</tr>");
    }
    html.close("</table>");
}

fn render_list(html: &mut HtmlBuilder, block: &ResolvedBlock) {
    let attrs = &block.attributes;
    let items = json_items(attrs, "items");
    if items.is_empty() {
        debug!(block = %block.id, "list block without items");
        return;
    }
    let ordered = attrs
        .get("ordered")
        .and_then(AttrValue::as_bool)
        .unwrap_or(false);
    let spacing = attrs.css("itemSpacing").unwrap_or_else(|| "4px".to_string());
    let bullet_color = attrs.get_str("bulletColor").unwrap_or("#000000");

    html.open(format!(
        r#"<table {}{}>"#,
        TABLE_OPEN,
        style_attr(&inner_css(attrs))
    ));
    for (index, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}.", index + 1)
        } else {
            "&bull;".to_string()
        };
        html.open("<tr>");
        html.line(format!(
            r#"<td valign="top" style="padding:0 8px {s} 0;color:{};">{}</td>"#,
            escape_attr(bullet_color),
            marker,
            s = escape_attr(&spacing)
        ));
        html.line(format!(
            r#"<td style="padding:0 0 {} 0;">{}</td>"#,
            escape_attr(&spacing),
            normalize_html(&json_text(item))
        ));
        html.close("</tr>");
    }
    html.close("</table>");
}

fn content(block: &ResolvedBlock) -> String {
    block
        .content
        .as_deref()
        .map(normalize_html)
        .unwrap_or_default()
}

fn target_attr(attrs: &Attributes) -> String {
    attrs
        .get_str("target")
        .map(|t| format!(r#" target="{}""#, escape_attr(t)))
        .unwrap_or_default()
}

fn is_padding(key: &str) -> bool {
    key.starts_with("padding")
}

/// Inline CSS for every styling key in the bag
fn css(attrs: &Attributes) -> String {
    css_where(attrs, |_| true)
}

/// Inline CSS minus the padding carried by the block wrapper
fn inner_css(attrs: &Attributes) -> String {
    css_where(attrs, |key| !is_padding(key))
}

fn css_where(attrs: &Attributes, keep: impl Fn(&str) -> bool) -> String {
    attrs
        .iter()
        .filter(|(key, _)| CSS_KEYS.contains(&key.as_str()) && keep(key))
        .map(|(key, value)| format!("{}:{};", kebab_case(key), value.to_css()))
        .collect()
}

fn style_attr(declarations: &str) -> String {
    if declarations.is_empty() {
        String::new()
    } else {
        format!(r#" style="{}""#, escape_attr(declarations))
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn json_items<'a>(attrs: &'a Attributes, key: &str) -> &'a [Value] {
    attrs
        .get(key)
        .and_then(AttrValue::as_json)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn json_field<'v>(value: &'v Value, keys: &[&str]) -> Option<&'v str> {
    keys.iter().find_map(|key| value.get(*key).and_then(Value::as_str))
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{resolve_email, ResolveContext};
    use crate::parser::compile;

    fn render(source: &str) -> String {
        let email = compile(source).expect("Should compile");
        to_html(
            &resolve_email(&email, &ResolveContext::default()),
            &RenderConfig::default(),
        )
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("paddingTop"), "padding-top");
        assert_eq!(kebab_case("color"), "color");
        assert_eq!(kebab_case("backgroundImage"), "background-image");
    }

    #[test]
    fn test_document_shell() {
        let html = render(r#"EMAIL name="A & B" previewText="Sneak peek" { ROW { } }"#);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains(">Sneak peek</div>"));
        assert!(html.contains(r#"width="600""#));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_text_content_is_markup() {
        let html = render("ROW padding=8,8,8,8 { COLUMN { TEXT content=<p>Hi</p> } }");
        assert!(html.contains("<p>Hi</p>"));
        assert!(!html.contains("&lt;p&gt;"));
        assert!(html.contains("padding-top:8px;"));
    }

    #[test]
    fn test_columns_side_by_side_and_stacked() {
        let source = "ROW { COLUMN { TEXT content=a } COLUMN { TEXT content=b } }";
        assert!(render(source).contains(r#"width="50%""#));

        let email = compile(source).expect("Should compile");
        let ctx = ResolveContext::default().with_mobile_view(true);
        let html = to_html(&resolve_email(&email, &ctx), &RenderConfig::default());
        assert!(!html.contains(r#"width="50%""#));
        assert!(html.contains(r#"width="375""#));
    }

    #[test]
    fn test_button_is_bulletproof() {
        let html = render(
            r#"ROW { COLUMN { BUTTON href="https://example.com" content="Shop now" } }"#,
        );
        assert!(html.contains(r##"bgcolor="#8E6FF7""##));
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains(">Shop now</a>"));
    }

    #[test]
    fn test_table_and_list_are_tables() {
        let html = render(
            r#"ROW { COLUMN {
                TABLE rows=[["Item","Price"],["Tea","$3"]]
                LIST ordered=true items=["One","Two"]
            } }"#,
        );
        assert!(html.contains(">Item</th>"));
        assert!(html.contains(">Tea</td>"));
        assert!(html.contains(">2.</td>"));
        assert!(!html.contains("<ul"));
    }

    #[test]
    fn test_socials_render_links() {
        let html = render(
            r#"ROW { COLUMN { SOCIALS socialLinks=[{"platform":"x","url":"https://x.com/acme"}] } }"#,
        );
        assert!(html.contains(r#"href="https://x.com/acme""#));
        assert!(html.contains(">x</a>"));
    }

    #[test]
    fn test_compact_output() {
        let email = compile("ROW { COLUMN { DIVIDER } }").expect("Should compile");
        let html = to_html(
            &resolve_email(&email, &ResolveContext::default()),
            &RenderConfig::default().with_pretty_print(false),
        );
        assert!(!html.contains('\n'));
        assert!(html.contains("border-top:1px solid #E4E4E7"));
    }
}
