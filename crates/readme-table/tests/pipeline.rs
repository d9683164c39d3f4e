use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use readme_table::{
    build, find_first_table, BuildOutcome, Config, Document, ExitCode, HtmlFragment,
    LoadOptions, PipelineError, TableLookup, TableShape, TemplateVariant,
};
use tempfile::TempDir;

fn workspace(readme: &str) -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    fs::write(temp.path().join("README.md"), readme).expect("write readme");
    temp
}

fn load(dir: &Path) -> Config {
    Config::load(LoadOptions::default().with_working_dir(dir)).expect("load config")
}

fn rendered_table(markdown: &str) -> TableLookup {
    let document = Document::new("README.md", markdown);
    find_first_table(&readme_table::render_markdown(&document)).expect("well-formed")
}

#[test]
fn writes_minimal_page_for_single_table() {
    let temp = workspace("# Title\n\n| X | Y |\n|---|---|\n| a | b |\n");

    let outcome = build(&load(temp.path())).expect("build");

    assert_eq!(outcome.exit_code(), ExitCode::Success);
    let page = fs::read_to_string(temp.path().join("index.html")).expect("read output");
    assert_eq!(
        page,
        "<html><table><thead><tr><th>X</th><th>Y</th></tr></thead><tbody>\n\
         <tr><td>a</td><td>b</td></tr>\n\
         </tbody></table></html>"
    );
    assert_eq!(page.matches("<table>").count(), 1);
}

#[test]
fn no_table_leaves_output_absent() {
    let temp = workspace("# Title\n\nNo tables here.\n");

    let outcome = build(&load(temp.path())).expect("build");

    assert!(matches!(outcome, BuildOutcome::NoTable { .. }));
    assert_eq!(outcome.exit_code(), ExitCode::NoTable);
    assert!(!temp.path().join("index.html").exists());
}

#[test]
fn no_table_does_not_touch_previous_output() {
    let temp = workspace("Just prose.\n");
    fs::write(temp.path().join("index.html"), "previous").expect("seed output");

    build(&load(temp.path())).expect("build");

    let page = fs::read_to_string(temp.path().join("index.html")).expect("read output");
    assert_eq!(page, "previous");
}

#[test]
fn only_first_of_several_tables_is_kept() {
    let temp = workspace(
        "| First |\n|---|\n| one |\n\n\
         Between.\n\n\
         | Second |\n|---|\n| two |\n",
    );

    build(&load(temp.path())).expect("build");

    let page = fs::read_to_string(temp.path().join("index.html")).expect("read output");
    assert!(page.contains("First"));
    assert!(!page.contains("Second"));
    assert_eq!(page.matches("<table>").count(), 1);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let temp = workspace("| A | B |\n|---|---|\n| 1 | 2 |\n");
    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(temp.path())
            .with_template(TemplateVariant::Full),
    )
    .expect("load config");

    build(&config).expect("first build");
    let first = fs::read(temp.path().join("index.html")).expect("read first");
    build(&config).expect("second build");
    let second = fs::read(temp.path().join("index.html")).expect("read second");

    assert_eq!(first, second);
}

#[test]
fn extracted_table_parses_back_to_same_shape() {
    let table = rendered_table("| A | B |\n|---|---|\n| 1 | 2 |")
        .into_found()
        .expect("table present");
    assert_eq!(
        table.shape(),
        TableShape {
            columns: 2,
            header_rows: 1,
            body_rows: 1,
        }
    );

    let reparsed = find_first_table(&HtmlFragment::wrap(table.markup()))
        .expect("serialization is well-formed")
        .into_found()
        .expect("table survives");
    assert_eq!(reparsed.shape(), table.shape());
    assert_eq!(reparsed.markup(), table.markup());
}

#[test]
fn aligned_columns_keep_style_attributes() {
    let table = rendered_table("| L | R |\n|:--|--:|\n| a | b |\n")
        .into_found()
        .expect("table present");

    assert!(table.markup().contains("<th style=\"text-align: left\">L</th>"));
    assert!(table.markup().contains("<td style=\"text-align: right\">b</td>"));
}

#[test]
fn full_template_wraps_table_in_navigation_page() {
    let temp = workspace("| X |\n|---|\n| a |\n");
    fs::write(
        temp.path().join(".readme-table.toml"),
        r#"
        [page]
        template = "full"
        title = "Grammar"

        [page.versions]
        labels = ["master", "3.6", "3.5"]
        docs_url = "https://docs.example.org/{version}/"
        "#,
    )
    .expect("write config");

    let outcome = build(&load(temp.path())).expect("build");

    let BuildOutcome::Written { path, shape, bytes } = outcome else {
        panic!("expected a written page");
    };
    let page = fs::read_to_string(&path).expect("read output");
    assert_eq!(bytes, page.len());
    assert_eq!(shape.body_rows, 1);
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<title>Grammar</title>"));
    assert!(page.contains("href=\"https://docs.example.org/3.6/\""));
    assert!(page.contains("<main class=\"container\">\n<table>"));
    assert!(page.trim_end().ends_with("</html>"));
}

#[test]
fn raw_html_that_is_not_xml_fails_to_parse() {
    let temp = workspace("Line one<br>\n\n| A |\n|---|\n| 1 |\n");

    let err = build(&load(temp.path())).expect_err("parse failure");

    assert!(matches!(err, PipelineError::Parse { .. }));
    assert_eq!(err.exit_code(), ExitCode::Parse);
    assert!(!temp.path().join("index.html").exists());
}

#[test]
fn missing_readme_is_an_io_failure() {
    let temp = TempDir::new().expect("tempdir");

    let err = build(&load(temp.path())).expect_err("missing input");

    assert!(matches!(err, PipelineError::Read { .. }));
    assert_eq!(err.exit_code(), ExitCode::Io);
}
