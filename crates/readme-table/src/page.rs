use pulldown_cmark::escape::escape_html;
use readme_table_config::{PageSettings, SearchSettings, TemplateVariant, VersionSettings};
use serde_json::json;

use crate::extract::TableFragment;

const MINIMAL_HEAD: &str = "<html>";
const MINIMAL_TAIL: &str = "</html>";

const FULL_HEAD: &str = include_str!("../templates/full_head.html");
const FULL_TAIL: &str = include_str!("../templates/full_tail.html");

const SEARCH_STYLESHEET: &str =
    "<link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/@docsearch/css@3\">\n";
const SEARCH_SCRIPT: &str =
    "<script src=\"https://cdn.jsdelivr.net/npm/@docsearch/js@3\"></script>\n";
const SEARCH_CONTAINER: &str = "<div id=\"docsearch\" class=\"ms-3\"></div>";

/// Fixed text placed before and after the extracted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    head: String,
    tail: String,
}

impl PageTemplate {
    pub fn minimal() -> Self {
        PageTemplate {
            head: MINIMAL_HEAD.to_owned(),
            tail: MINIMAL_TAIL.to_owned(),
        }
    }

    /// Navigation page with version selector and, when configured, the
    /// hosted search widget.
    pub fn full(
        title: &str,
        versions: &VersionSettings,
        search: Option<&SearchSettings>,
    ) -> Self {
        let title = escape_text(title);
        let docs_href = versions
            .default_label()
            .map(|label| escape_text(&versions.docs_url_for(label)))
            .unwrap_or_else(|| "#".to_owned());
        let search_json = script_literal(&match search {
            Some(search) => json!({
                "appId": search.app_id,
                "apiKey": search.api_key,
                "indexName": search.index_name,
            }),
            None => serde_json::Value::Null,
        });
        let labels = script_literal(&json!(versions.labels));
        let docs_url = script_literal(&json!(versions.docs_url));
        let default_index = versions.default_index.to_string();
        let enabled = |markup: &'static str| if search.is_some() { markup } else { "" };

        let head = fill(
            FULL_HEAD,
            &[
                ("title", title.as_str()),
                ("docs_href", docs_href.as_str()),
                ("search_stylesheet", enabled(SEARCH_STYLESHEET)),
                ("search_container", enabled(SEARCH_CONTAINER)),
            ],
        );
        let tail = fill(
            FULL_TAIL,
            &[
                ("title", title.as_str()),
                ("search_script", enabled(SEARCH_SCRIPT)),
                ("versions", labels.as_str()),
                ("default_index", default_index.as_str()),
                ("docs_url", docs_url.as_str()),
                ("search", search_json.as_str()),
            ],
        );

        PageTemplate { head, tail }
    }

    pub fn from_settings(settings: &PageSettings) -> Self {
        match settings.template {
            TemplateVariant::Minimal => Self::minimal(),
            TemplateVariant::Full => Self::full(
                &settings.title,
                &settings.versions,
                settings.search.as_ref(),
            ),
        }
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Concatenates head, table markup and tail.
    pub fn assemble(&self, table: &TableFragment) -> String {
        let markup = table.markup();
        let mut page = String::with_capacity(self.head.len() + markup.len() + self.tail.len());
        page.push_str(&self.head);
        page.push_str(markup);
        page.push_str(&self.tail);
        page
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut escaped, text);
    escaped
}

/// JSON literal that cannot close or comment out the surrounding `<script>`
/// element.
fn script_literal(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace("</", "<\\/")
        .replace("<!--", "<\\!--")
}

/// Replaces `{{name}}` markers in a single pass; unknown markers are kept.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after[..end];
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{find_first_table, TableLookup};
    use crate::render::HtmlFragment;
    use pretty_assertions::assert_eq;

    fn table() -> TableFragment {
        let fragment = HtmlFragment::wrap("<table><tbody><tr><td>1</td></tr></tbody></table>");
        match find_first_table(&fragment).unwrap() {
            TableLookup::Found(table) => table,
            TableLookup::NotFound => panic!("fixture has a table"),
        }
    }

    fn versions() -> VersionSettings {
        VersionSettings {
            labels: vec!["main".into(), "3.6".into(), "3.5".into()],
            default_index: 1,
            docs_url: "https://docs.example.org/{version}/".into(),
        }
    }

    #[test]
    fn minimal_page_wraps_table_in_html_tags() {
        assert_eq!(
            PageTemplate::minimal().assemble(&table()),
            "<html><table><tbody><tr><td>1</td></tr></tbody></table></html>"
        );
    }

    #[test]
    fn full_page_links_default_version() {
        let template = PageTemplate::full("Spec", &versions(), None);

        assert!(template.head().starts_with("<!DOCTYPE html>"));
        assert!(template.head().contains("<title>Spec</title>"));
        assert!(template
            .head()
            .contains("href=\"https://docs.example.org/3.6/\">Documentation</a>"));
        assert!(template.tail().contains("var versions = [\"main\",\"3.6\",\"3.5\"];"));
        assert!(template.tail().contains("var defaultIndex = 1;"));
        assert!(template.tail().contains("var search = null;"));
        assert!(!template.head().contains("docsearch"));
        assert!(!template.tail().contains("{{"));
    }

    #[test]
    fn full_page_wires_search_when_configured() {
        let search = SearchSettings {
            app_id: "APP".into(),
            api_key: "KEY".into(),
            index_name: "spec".into(),
        };
        let template = PageTemplate::full("Spec", &versions(), Some(&search));

        assert!(template.head().contains("@docsearch/css@3"));
        assert!(template.head().contains("<div id=\"docsearch\""));
        assert!(template.tail().contains("@docsearch/js@3"));
        assert!(template
            .tail()
            .contains(r#"var search = {"apiKey":"KEY","appId":"APP","indexName":"spec"};"#));
    }

    #[test]
    fn full_page_escapes_configured_text() {
        let mut versions = versions();
        versions.labels[1] = "</script><b>".into();
        let template = PageTemplate::full("A & B <i>", &versions, None);

        assert!(template.head().contains("<title>A &amp; B &lt;i&gt;</title>"));
        assert!(template.tail().contains(r#""<\/script><b>""#));
    }

    #[test]
    fn comment_openers_in_labels_are_escaped() {
        let mut versions = versions();
        versions.labels[0] = "<!--<script>".into();
        let template = PageTemplate::full("Spec", &versions, None);

        assert!(template.tail().contains(r#""<\!--<script>""#));
        assert!(!template.tail().contains("<!--<script>"));
    }

    #[test]
    fn assembled_page_contains_table_between_head_and_tail() {
        let template = PageTemplate::full("Spec", &versions(), None);
        let page = template.assemble(&table());

        let start = page.find("<table>").unwrap();
        assert_eq!(&page[..start], template.head());
        assert!(page.ends_with(template.tail()));
    }

    #[test]
    fn fill_keeps_unknown_markers() {
        assert_eq!(fill("a {{x}} {{y}} {{", &[("x", "1")]), "a 1 {{y}} {{");
    }
}
