//! Palette derivation as seen by callers

use email_builder::theme::{ColorFamily, DEFAULT_SEED};
use email_builder::{derive_theme, render};
use pretty_assertions::assert_eq;

#[test]
fn test_grayscale_seeds() {
    let black = derive_theme("#000000");
    assert_eq!(black.family, ColorFamily::Gray);
    assert_eq!(black.base, "#000000");
    assert_eq!(black.levels[0], "#F4F4F5");

    let white = derive_theme("#ffffff");
    assert_eq!(white.base, "#FFFFFF");
    assert_eq!(white.text_color, "#000000");
}

#[test]
fn test_default_seed_and_fallback() {
    let purple = derive_theme("#8e6ff7");
    assert_eq!(purple.family, ColorFamily::Purple);
    assert_eq!(derive_theme("#zzz"), derive_theme(DEFAULT_SEED));
}

#[test]
fn test_palette_json_shape() {
    let json = serde_json::to_value(derive_theme("#3B82F6")).expect("Should serialize");
    assert_eq!(json["base"], "#3B82F6");
    assert!(json["family"].is_string());
    assert!(json["textColor"].is_string());
    assert!(json["gradientLight"]["start"].is_string());
    assert_eq!(json["levels"].as_array().map(Vec::len), Some(8));
}

#[test]
fn test_theme_reaches_html() {
    let html = render("EMAIL theme=#3B82F6 { ROW type=header { COLUMN { TEXT content=<p>Hi</p> } } }")
        .expect("Should render");
    assert!(html.contains("#3B82F6"));
}
