//! Turns the first Markdown table of a README into a static HTML page.
//!
//! The pipeline is linear: [`read_document`] → [`render_markdown`] →
//! [`find_first_table`] → [`PageTemplate::assemble`] → [`write_page`].
//! [`build`] runs all of it against a resolved [`Config`].

pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod render;

pub use document::{read_document, Document};
pub use error::{ExitCode, PipelineError, PipelineResult};
pub use extract::{find_first_table, TableFragment, TableLookup, TableShape};
pub use output::write_page;
pub use page::PageTemplate;
pub use pipeline::{build, BuildOutcome};
pub use readme_table_config::{Config, ConfigError, LoadOptions, PageSettings, TemplateVariant};
pub use render::{render_markdown, HtmlFragment};
