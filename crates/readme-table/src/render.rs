use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

use crate::document::Document;

/// Synthetic root element so a fragment with several top-level blocks parses
/// as a single XML document.
pub const FRAGMENT_ROOT: &str = "body";

/// Rendered HTML wrapped in [`FRAGMENT_ROOT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragment {
    markup: String,
}

impl HtmlFragment {
    pub fn wrap(body: &str) -> Self {
        let mut markup = String::with_capacity(body.len() + 2 * FRAGMENT_ROOT.len() + 5);
        markup.push('<');
        markup.push_str(FRAGMENT_ROOT);
        markup.push('>');
        markup.push_str(body);
        markup.push_str("</");
        markup.push_str(FRAGMENT_ROOT);
        markup.push('>');
        HtmlFragment { markup }
    }

    pub fn as_str(&self) -> &str {
        &self.markup
    }
}

/// Renders Markdown to HTML with pipe tables enabled.
///
/// Rendering never fails: malformed Markdown degrades to literal text.
pub fn render_markdown(document: &Document) -> HtmlFragment {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(document.source(), options);
    let mut body = String::with_capacity(document.source().len() * 3 / 2);
    html::push_html(&mut body, parser);

    debug!(bytes = body.len(), "rendered markdown to html");
    HtmlFragment::wrap(&body)
}
