use std::path::PathBuf;

use readme_table_config::Config;
use tracing::{info, warn};

use crate::document::read_document;
use crate::error::{ExitCode, PipelineResult};
use crate::extract::{find_first_table, TableLookup, TableShape};
use crate::output::write_page;
use crate::page::PageTemplate;
use crate::render::render_markdown;

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Written {
        path: PathBuf,
        shape: TableShape,
        bytes: usize,
    },
    /// The document rendered cleanly but holds no table; nothing was written.
    NoTable { input: PathBuf },
}

impl BuildOutcome {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            BuildOutcome::Written { .. } => ExitCode::Success,
            BuildOutcome::NoTable { .. } => ExitCode::NoTable,
        }
    }
}

/// Runs read → render → extract → assemble → write once.
pub fn build(config: &Config) -> PipelineResult<BuildOutcome> {
    let input = &config.paths.input;
    let output = &config.paths.output;

    let document = read_document(input)?;
    let fragment = render_markdown(&document);

    let table = match find_first_table(&fragment)? {
        TableLookup::Found(table) => table,
        TableLookup::NotFound => {
            warn!(input = %input.display(), "no table found; output left untouched");
            return Ok(BuildOutcome::NoTable {
                input: input.clone(),
            });
        }
    };

    let template = PageTemplate::from_settings(&config.page);
    let page = template.assemble(&table);
    write_page(output, &page)?;

    info!(
        output = %output.display(),
        template = %config.page.template,
        bytes = page.len(),
        "page written"
    );

    Ok(BuildOutcome::Written {
        path: output.clone(),
        shape: table.shape(),
        bytes: page.len(),
    })
}
