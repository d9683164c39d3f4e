use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::render::HtmlFragment;

const TABLE_TAG: &str = "table";

/// Outcome of searching a fragment for its first table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLookup {
    Found(TableFragment),
    NotFound,
}

impl TableLookup {
    pub fn into_found(self) -> Option<TableFragment> {
        match self {
            TableLookup::Found(table) => Some(table),
            TableLookup::NotFound => None,
        }
    }
}

/// Serialized `<table>` element, including its own tags and full subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFragment {
    markup: String,
    shape: TableShape,
}

impl TableFragment {
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn shape(&self) -> TableShape {
        self.shape
    }
}

/// Row and column counts read from the parsed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableShape {
    pub columns: usize,
    pub header_rows: usize,
    pub body_rows: usize,
}

impl TableShape {
    fn of(table: Node<'_, '_>) -> Self {
        let mut shape = TableShape::default();
        for row in table.descendants().filter(|node| node.has_tag_name("tr")) {
            let cells = row
                .children()
                .filter(|node| node.has_tag_name("th") || node.has_tag_name("td"))
                .count();
            shape.columns = shape.columns.max(cells);

            let in_head = row
                .ancestors()
                .take_while(|node| *node != table)
                .any(|node| node.has_tag_name("thead"));
            if in_head {
                shape.header_rows += 1;
            } else {
                shape.body_rows += 1;
            }
        }
        shape
    }
}

/// Parses `fragment` as XML and returns the first `<table>` in document order.
///
/// Later tables are ignored. A fragment that is not well-formed XML, such as
/// one carrying raw `<br>` tags or bare entities from inline HTML, is an
/// error; a well-formed fragment without tables is [`TableLookup::NotFound`].
pub fn find_first_table(fragment: &HtmlFragment) -> PipelineResult<TableLookup> {
    let markup = fragment.as_str();
    let tree = Document::parse(markup).map_err(|source| PipelineError::Parse { source })?;

    let Some(table) = tree
        .root_element()
        .descendants()
        .find(|node| node.has_tag_name(TABLE_TAG))
    else {
        debug!("no table element in rendered fragment");
        return Ok(TableLookup::NotFound);
    };

    let shape = TableShape::of(table);
    debug!(
        offset = table.range().start,
        columns = shape.columns,
        rows = shape.body_rows,
        "located first table"
    );

    Ok(TableLookup::Found(TableFragment {
        markup: markup[table.range()].to_owned(),
        shape,
    }))
}
