//! Compiling scripts end to end: both syntaxes and the error reports

use email_builder::cascade::resolve_row;
use email_builder::renderer::plain_text;
use email_builder::{compile, resolve, BlockKind, ParseError, ResolveContext, RowType};
use pretty_assertions::assert_eq;

#[test]
fn test_padding_scenario() {
    let email = compile("ROW padding=8,8,8,8 { COLUMN { TEXT content=<p>Hi</p> } }")
        .expect("Should compile");
    assert_eq!(email.rows.len(), 1);
    assert_eq!(email.rows[0].columns.len(), 1);

    let row = &email.rows[0];
    let block = &row.columns[0].blocks[0];
    assert_eq!(block.kind, BlockKind::Text);

    let attrs = resolve(block, row, &email);
    for side in ["paddingTop", "paddingRight", "paddingBottom", "paddingLeft"] {
        assert_eq!(attrs.get_str(side), Some("8px"), "{}", side);
    }

    let row_attrs = resolve_row(row, &email, &ResolveContext::default());
    assert_eq!(row_attrs.get_str("paddingLeft"), Some("8px"));

    assert_eq!(plain_text(block.content.as_deref().unwrap_or_default()), "Hi");
}

#[test]
fn test_brace_and_tag_forms_agree() {
    let brace = compile(
        r#"EMAIL name="Launch" theme=#3B82F6 {
             ROW type=hero padding=32,24 {
               COLUMN width=50% {
                 HEADING level=h1 content="Big news"
                 TEXT content=<p>Rich <b>text</b></p>
               }
               COLUMN { IMAGE src=logo alt="Logo" }
             }
           }"#,
    )
    .expect("Brace form should compile");

    let tag = compile(
        r#"<EMAIL name="Launch" theme=#3B82F6>
             <ROW type=hero padding=32,24>
               <COLUMN width=50%>
                 <HEADING level=h1>Big news</HEADING>
                 <TEXT><p>Rich <b>text</b></p></TEXT>
               </COLUMN>
               <COLUMN><IMAGE src=logo alt="Logo" /></COLUMN>
             </ROW>
           </EMAIL>"#,
    )
    .expect("Tag form should compile");

    assert_eq!(brace, tag);
    assert_eq!(brace.rows[0].row_type, Some(RowType::Hero));
    let units: Vec<u8> = brace.rows[0].columns.iter().map(|c| c.units).collect();
    assert_eq!(units, vec![6, 6]);
}

#[test]
fn test_bare_rows_get_default_document() {
    let email = compile("ROW { } ROW { }").expect("Should compile");
    assert_eq!(email.rows.len(), 2);
    assert_eq!(email.name, "Untitled email");
    assert_eq!(email.width, 600);
    for row in &email.rows {
        assert_eq!(row.grid_total(), 12);
    }
}

#[test]
fn test_errors_carry_fragments() {
    let cases = [
        "ROW { COLUMN { TEXT content=Hi }",
        "<EMAIL><TEXT>Hello</EMAIL>",
        "ROW { <COLUMN> }",
        "ROW { COLUMN { LIST items=[1,,2] } }",
    ];
    for source in cases {
        let err = compile(source).unwrap_err();
        assert!(!err.fragment().is_empty(), "no fragment for {:?}", source);
        assert!(source.contains(err.fragment().trim()), "{:?} not in {:?}", err.fragment(), source);
    }
}

#[test]
fn test_error_variants() {
    assert!(matches!(
        compile("ROW { COLUMN { TEXT content=Hi }").unwrap_err(),
        ParseError::Unbalanced { .. }
    ));
    assert!(matches!(
        compile("<EMAIL><TEXT>Hello</EMAIL>").unwrap_err(),
        ParseError::Unterminated { .. }
    ));
    assert!(matches!(
        compile("<EMAIL> ROW { } </EMAIL>").unwrap_err(),
        ParseError::MixedSyntax { .. }
    ));
    assert!(matches!(
        compile("ROW { COLUMN { LIST items=[1,,2] } }").unwrap_err(),
        ParseError::InvalidJson { .. }
    ));
}

#[test]
fn test_error_report_names_file() {
    let source = "ROW { COLUMN { TEXT content=Hi }";
    let err = compile(source).unwrap_err();
    let report = err.format(source, "broken.email");
    assert!(report.contains("broken.email"));
}
