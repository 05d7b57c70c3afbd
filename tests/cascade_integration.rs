//! Effective styling of compiled documents

use email_builder::cascade::{resolve_row, resolve_with};
use email_builder::edit::set_block_attribute;
use email_builder::{
    compile, derive_theme, render_with, resolve, resolve_email, Company, Email, RenderConfig,
    ResolveContext,
};
use pretty_assertions::assert_eq;

const SCRIPT: &str = r#"EMAIL id=doc {
  ROW id=top type=header {
    COLUMN { IMAGE id=logo src=logo alt="Logo" }
  }
  ROW id=body {
    COLUMN {
      TEXT id=intro content=<p>Hello</p>
      TEXT id=outro content=<p>Bye</p>
    }
  }
  ROW id=bottom type=footer {
    COLUMN { TEXT id=legal content=<p>Legal</p> }
  }
}"#;

fn document() -> Email {
    compile(SCRIPT).expect("Should compile")
}

fn block_attr(email: &Email, row: usize, block: usize, key: &str) -> Option<String> {
    let row = &email.rows[row];
    let attrs = resolve(&row.columns[0].blocks[block], row, email);
    attrs.get_str(key).map(String::from)
}

#[test]
fn test_variant_then_explicit_precedence() {
    let email = compile(&SCRIPT.replace("EMAIL id=doc", "EMAIL id=doc styleVariant=outline"))
        .expect("Should compile");
    assert_eq!(block_attr(&email, 1, 0, "color").as_deref(), Some("#1F2937"));

    let email = set_block_attribute(&email, "intro", "color", "#FF0000");
    assert_eq!(block_attr(&email, 1, 0, "color").as_deref(), Some("#FF0000"));
}

#[test]
fn test_resolution_is_deterministic_and_local() {
    let email = document();
    let ctx = ResolveContext::default();
    assert_eq!(resolve_email(&email, &ctx), resolve_email(&email, &ctx));

    let before = block_attr(&email, 1, 1, "fontSize");
    let edited = set_block_attribute(&email, "intro", "fontSize", 24.0);
    assert_eq!(block_attr(&edited, 1, 0, "fontSize").as_deref(), Some("24px"));
    assert_eq!(block_attr(&edited, 1, 1, "fontSize"), before);
}

#[test]
fn test_theme_colors_frame_rows() {
    let email = compile(&SCRIPT.replace("EMAIL id=doc", "EMAIL id=doc theme=#22C55E"))
        .expect("Should compile");
    let palette = derive_theme("#22C55E");
    let ctx = ResolveContext::default();

    let header = resolve_row(&email.rows[0], &email, &ctx);
    assert_eq!(header.get_str("backgroundColor"), Some(palette.base.as_str()));

    let resolved = resolve_email(&email, &ctx);
    assert_eq!(resolved.palette, Some(palette));
}

#[test]
fn test_hero_gets_gradient() {
    let email = compile("EMAIL theme=#3B82F6 { ROW type=hero { COLUMN { HEADING content=Hi } } }")
        .expect("Should compile");
    let palette = derive_theme("#3B82F6");
    let row = resolve_row(&email.rows[0], &email, &ResolveContext::default());
    assert_eq!(
        row.get_str("backgroundImage"),
        Some(palette.gradient_light.css().as_str())
    );
}

#[test]
fn test_row_backgrounds_without_theme() {
    let email = compile(
        &SCRIPT.replace("EMAIL id=doc", "EMAIL id=doc rowBackgroundColor=#FAFAFA"),
    )
    .expect("Should compile");
    let ctx = ResolveContext::default();

    let body = resolve_row(&email.rows[1], &email, &ctx);
    assert_eq!(body.get_str("backgroundColor"), Some("#FAFAFA"));

    let footer = resolve_row(&email.rows[2], &email, &ctx);
    assert_eq!(footer.get_str("backgroundColor"), Some("#F4F4F5"));
}

#[test]
fn test_unknown_row_type_resolves_like_plain_row() {
    let typed = document();
    let plain = compile(&SCRIPT.replace("ROW id=body {", "ROW id=body type=testimonial {"))
        .expect("Should compile");
    assert_eq!(block_attr(&typed, 1, 0, "fontSize"), block_attr(&plain, 1, 0, "fontSize"));
    assert_eq!(block_attr(&typed, 1, 0, "color"), block_attr(&plain, 1, 0, "color"));
}

#[test]
fn test_logo_substitution_in_html() {
    let ctx = ResolveContext::new()
        .with_company(Company::with_logo("acme/logo.png"))
        .with_config(RenderConfig::new().with_asset_base_url("https://cdn.example.com"));
    let html = render_with(SCRIPT, &ctx).expect("Should render");
    assert!(html.contains("https://cdn.example.com/acme/logo.png"));

    let email = document();
    let row = &email.rows[0];
    let attrs = resolve_with(&row.columns[0].blocks[0], row, &email, &ResolveContext::default());
    assert_eq!(attrs.get_str("src"), Some("logo"));
}

#[test]
fn test_mobile_overrides() {
    let email = set_block_attribute(
        &document(),
        "intro",
        "mobile",
        serde_json::json!({ "fontSize": 12, "textAlign": "center" }),
    );
    let row = &email.rows[1];
    let block = &row.columns[0].blocks[0];

    let desktop = resolve(block, row, &email);
    assert!(!desktop.contains("mobile"));
    assert_ne!(desktop.get_str("fontSize"), Some("12px"));

    let ctx = ResolveContext::new().with_mobile_view(true);
    let mobile = resolve_with(block, row, &email, &ctx);
    assert_eq!(mobile.get_str("fontSize"), Some("12px"));
    assert_eq!(mobile.get_str("textAlign"), Some("center"));

    let resolved = resolve_email(&email, &ctx);
    assert_eq!(resolved.width, 375);
}
