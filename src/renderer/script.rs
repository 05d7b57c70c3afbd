//! Serialise a document back into template script
//!
//! Both surface syntaxes are supported. The output always carries explicit
//! ids and grid widths, so compiling it again yields the same tree.

use tracing::debug;

use crate::model::{AttrValue, Attributes, Block, Column, Email, Row};
use crate::parser::lexer::is_inline_html;
use crate::parser::Syntax;

/// Brace-form script for a document
pub fn to_script(email: &Email) -> String {
    let mut writer = ScriptWriter::new(Syntax::Brace);
    writer.email(email);
    writer.finish()
}

/// Tag-form script for a document
pub fn to_tag_script(email: &Email) -> String {
    let mut writer = ScriptWriter::new(Syntax::Tag);
    writer.email(email);
    writer.finish()
}

struct ScriptWriter {
    syntax: Syntax,
    lines: Vec<String>,
    depth: usize,
}

impl ScriptWriter {
    fn new(syntax: Syntax) -> Self {
        Self {
            syntax,
            lines: vec![],
            depth: 0,
        }
    }

    fn line(&mut self, text: String) {
        self.lines.push(format!("{}{}", "  ".repeat(self.depth), text));
    }

    /// Open a container element
    fn open(&mut self, keyword: &str, attrs: &[String]) {
        let head = head(keyword, attrs);
        match self.syntax {
            Syntax::Brace => self.line(format!("{} {{", head)),
            Syntax::Tag => self.line(format!("<{}>", head)),
        }
        self.depth += 1;
    }

    fn close(&mut self, keyword: &str) {
        self.depth = self.depth.saturating_sub(1);
        match self.syntax {
            Syntax::Brace => self.line("}".to_string()),
            Syntax::Tag => self.line(format!("</{}>", keyword)),
        }
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn email(&mut self, email: &Email) {
        let mut attrs = vec![
            pair("id", &quote(&email.id)),
            pair("name", &quote(&email.name)),
        ];
        if !email.preview_text.is_empty() {
            attrs.push(pair("previewText", &quote(&email.preview_text)));
        }
        attrs.extend([
            pair("fontFamily", &quote(&email.font_family)),
            pair("width", &email.width.to_string()),
            pair("color", &quote(&email.color)),
            pair("backgroundColor", &quote(&email.background_color)),
            pair("rowBackgroundColor", &quote(&email.row_background_color)),
            pair("linkColor", &quote(&email.link_color)),
        ]);
        if let Some(variant) = email.style_variant {
            attrs.push(pair("styleVariant", variant.name()));
        }
        if let Some(theme) = &email.theme {
            attrs.push(pair("theme", &quote(theme)));
        }

        self.open("EMAIL", &attrs);
        for row in &email.rows {
            self.row(row);
        }
        self.close("EMAIL");
    }

    fn row(&mut self, row: &Row) {
        let mut attrs = vec![pair("id", &quote(&row.id))];
        if let Some(row_type) = &row.row_type {
            attrs.push(pair("type", &quote(row_type.name())));
        }
        attrs.extend(self.attributes(&row.attributes, &["id", "type"], &row.id));
        for (key, value) in &row.container {
            if let Some(value) = self.value(key, value, &row.id) {
                attrs.push(pair(&format!("container{}", upper_first(key)), &value));
            }
        }

        self.open("ROW", &attrs);
        for column in &row.columns {
            self.column(column);
        }
        self.close("ROW");
    }

    fn column(&mut self, column: &Column) {
        let mut attrs = vec![
            pair("id", &quote(&column.id)),
            pair("width", &column.units.to_string()),
        ];
        attrs.extend(self.attributes(&column.attributes, &["id", "width"], &column.id));

        self.open("COLUMN", &attrs);
        for block in &column.blocks {
            self.block(block);
        }
        self.close("COLUMN");
    }

    fn block(&mut self, block: &Block) {
        let keyword = block.kind.keyword();
        let mut attrs = vec![pair("id", &quote(&block.id))];
        attrs.extend(self.attributes(&block.attributes, &["id", "content"], &block.id));

        match (self.syntax, &block.content) {
            (Syntax::Brace, Some(content)) => {
                attrs.push(pair("content", &content_value(content)));
                self.line(head(keyword, &attrs));
            }
            (Syntax::Brace, None) => self.line(head(keyword, &attrs)),
            (Syntax::Tag, Some(content)) => self.line(format!(
                "<{}>{}</{}>",
                head(keyword, &attrs),
                content,
                keyword
            )),
            (Syntax::Tag, None) => self.line(format!("<{} />", head(keyword, &attrs))),
        }
    }

    fn attributes(&self, attrs: &Attributes, reserved: &[&str], node: &str) -> Vec<String> {
        attrs
            .iter()
            .filter(|(key, _)| {
                let keep = !reserved.contains(&key.as_str()) && !key.starts_with("container");
                if !keep {
                    debug!(node, key = %key, "attribute shadows a script keyword, skipped");
                }
                keep
            })
            .filter_map(|(key, value)| self.value(key, value, node).map(|v| pair(key, &v)))
            .collect()
    }

    fn value(&self, key: &str, value: &AttrValue, node: &str) -> Option<String> {
        if !is_script_key(key) {
            debug!(node, key, "attribute key cannot be written as script, skipped");
            return None;
        }
        Some(match value {
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Number(n) => crate::model::attributes::format_number(*n),
            AttrValue::Text(s) if is_bare_safe(s) => s.clone(),
            AttrValue::Text(s) => quote(s),
            AttrValue::Json(json) if json.is_array() || json.is_object() => json.to_string(),
            AttrValue::Json(json) => quote(&json.to_string()),
        })
    }
}

fn head(keyword: &str, attrs: &[String]) -> String {
    if attrs.is_empty() {
        keyword.to_string()
    } else {
        format!("{} {}", keyword, attrs.join(" "))
    }
}

fn pair(key: &str, value: &str) -> String {
    format!("{}={}", key, value)
}

/// Inline HTML stays raw; anything else is quoted
fn content_value(content: &str) -> String {
    if is_inline_html(content) {
        content.to_string()
    } else {
        quote(content)
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Text that re-lexes as the same bare text value
fn is_bare_safe(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('[')
        && !s.contains(|c: char| c.is_whitespace() || "{}<>\"\\/,".contains(c))
        && s != "true"
        && s != "false"
        && s.parse::<f64>().is_err()
}

fn is_script_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, RowType};
    use crate::parser::compile;

    fn sample() -> Email {
        let mut email = Email::new("welcome");
        email.name = "Say \"hi\"".to_string();
        let mut column = Column::new("col-a", 12);
        column.blocks.push(
            Block::new("intro", BlockKind::Text)
                .with_content("<p>Hi</p>")
                .with_attribute("paddingTop", 8.0),
        );
        column.blocks.push(Block::new("cta", BlockKind::Button).with_content("Shop now"));
        column.blocks.push(Block::new("line", BlockKind::Divider));
        let mut row = Row::new("top", vec![column]);
        row.row_type = Some(RowType::Hero);
        row.container.set("align", "center");
        email.rows.push(row);
        email
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }

    #[test]
    fn test_bare_safe() {
        assert!(is_bare_safe("#FF0000"));
        assert!(is_bare_safe("center"));
        assert!(!is_bare_safe("12"));
        assert!(!is_bare_safe("true"));
        assert!(!is_bare_safe("two words"));
        assert!(!is_bare_safe("https://example.com"));
        assert!(!is_bare_safe(""));
    }

    #[test]
    fn test_brace_script_round_trip() {
        let email = sample();
        let script = to_script(&email);
        assert!(script.contains("TEXT id=\"intro\" paddingTop=8 content=<p>Hi</p>"));
        assert!(script.contains("containerAlign=center"));
        let compiled = compile(&script).expect("Should re-parse");
        assert_eq!(compiled, email);
    }

    #[test]
    fn test_tag_script_round_trip() {
        let email = sample();
        let script = to_tag_script(&email);
        assert!(script.contains("<TEXT id=\"intro\" paddingTop=8><p>Hi</p></TEXT>"));
        assert!(script.contains("<DIVIDER id=\"line\" />"));
        let compiled = compile(&script).expect("Should re-parse");
        assert_eq!(compiled, email);
    }

    #[test]
    fn test_unwritable_keys_are_skipped() {
        let mut email = sample();
        email.rows[0].columns[0].blocks[2]
            .attributes
            .set("bad key", "x");
        let script = to_script(&email);
        assert!(!script.contains("bad key"));
    }
}
