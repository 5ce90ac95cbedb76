//! HTML tables as rectangular grids.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Node, Selector};

/// Spans beyond these limits are treated as malformed and clamped.
const MAX_COLSPAN: usize = 64;
const MAX_ROWSPAN: usize = 256;

/// Text blocks longer than this are split into their children when looking
/// for headings.
const MAX_BLOCK_LEN: usize = 240;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("valid selector"));
static CAPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("caption").expect("valid selector"));
static STRONG: Lazy<Selector> = Lazy::new(|| Selector::parse("strong, b").expect("valid selector"));
static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));

/// One position of a [`TableGrid`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridCell {
    /// Whitespace-normalized text.
    pub text: String,
    /// The source cell was a `<th>`.
    pub is_header: bool,
    /// False for positions filled by another cell's `colspan`/`rowspan`.
    pub is_origin: bool,
}

/// One row of a [`TableGrid`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridRow {
    /// One cell per grid column.
    pub cells: Vec<GridCell>,
    /// The row holds bold text (section headings in rendered statements).
    pub has_strong: bool,
}

impl GridRow {
    /// Returns true if every origin cell is a `<th>`.
    #[must_use]
    pub fn is_header(&self) -> bool {
        let mut origins = self.cells.iter().filter(|c| c.is_origin).peekable();
        origins.peek().is_some() && origins.all(|c| c.is_header)
    }

    /// Text of the first cell.
    #[must_use]
    pub fn label(&self) -> &str {
        self.cells.first().map_or("", |c| c.text.as_str())
    }
}

/// A table with `colspan` and `rowspan` expanded, so that every row has one
/// cell per column and values line up with the header above them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    /// `<caption>` text, if any.
    pub caption: Option<String>,
    /// Rows in document order.
    pub rows: Vec<GridRow>,
    /// Number of columns.
    pub width: usize,
}

impl TableGrid {
    /// Builds a grid from a `<table>` element.
    #[must_use]
    pub fn from_element(table: ElementRef<'_>) -> Self {
        let caption = table
            .select(&CAPTION)
            .next()
            .map(|c| normalize_text(&c.text().collect::<Vec<_>>().join(" ")))
            .filter(|c| !c.is_empty());

        // (column, rows remaining, cell) carried down by rowspan
        let mut carried: Vec<(usize, usize, GridCell)> = Vec::new();
        let mut rows = Vec::new();

        for tr in table.select(&ROW) {
            if !belongs_to(tr, table) {
                continue;
            }
            let mut cells: Vec<Option<GridCell>> = Vec::new();

            for (col, remaining, cell) in &mut carried {
                place(&mut cells, *col, cell.clone());
                *remaining -= 1;
            }
            carried.retain(|(_, remaining, _)| *remaining > 0);

            let mut col = 0;
            for td in tr.select(&CELL) {
                if !belongs_to(td, table) {
                    continue;
                }
                while cells.get(col).is_some_and(Option::is_some) {
                    col += 1;
                }

                let colspan = span(td, "colspan", MAX_COLSPAN);
                let rowspan = span(td, "rowspan", MAX_ROWSPAN);
                let origin = GridCell {
                    text: normalize_text(&td.text().collect::<Vec<_>>().join(" ")),
                    is_header: td.value().name() == "th",
                    is_origin: true,
                };
                let copy = GridCell {
                    is_origin: false,
                    ..origin.clone()
                };

                for k in 0..colspan {
                    let cell = if k == 0 { origin.clone() } else { copy.clone() };
                    place(&mut cells, col + k, cell);
                    if rowspan > 1 {
                        carried.push((col + k, rowspan - 1, copy.clone()));
                    }
                }
                col += colspan;
            }

            if cells.is_empty() {
                continue;
            }
            rows.push(GridRow {
                cells: cells.into_iter().map(Option::unwrap_or_default).collect(),
                has_strong: tr.select(&STRONG).next().is_some(),
            });
        }

        let width = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.cells.resize_with(width, GridCell::default);
        }

        Self {
            caption,
            rows,
            width,
        }
    }

    /// Returns true if the grid has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Text of the first cell of the first row, which is where rendered EDGAR
    /// statements put their title.
    #[must_use]
    pub fn first_header_text(&self) -> Option<&str> {
        let row = self.rows.first()?;
        let text = row.label();
        (!text.is_empty()).then_some(text)
    }
}

fn place(cells: &mut Vec<Option<GridCell>>, col: usize, cell: GridCell) {
    if cells.len() <= col {
        cells.resize(col + 1, None);
    }
    if cells[col].is_none() {
        cells[col] = Some(cell);
    }
}

fn span(cell: ElementRef<'_>, attr: &str, max: usize) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, max)
}

/// True if the nearest enclosing `<table>` of `element` is `table`, so rows of
/// nested tables are not attributed to their parent.
fn belongs_to(element: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
        .is_some_and(|a| a.id() == table.id())
}

/// Collapses whitespace (including non-breaking spaces) to single spaces.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text blocks preceding `table` in the document, nearest first.
///
/// Walks backwards through the previous siblings of the table and of its
/// ancestors, stopping at the previous table or after `max_blocks` blocks.
#[must_use]
pub fn preceding_text(table: ElementRef<'_>, max_blocks: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut node = *table;

    loop {
        for sibling in node.prev_siblings() {
            let stop = match sibling.value() {
                Node::Text(text) => push_block(&mut blocks, text, max_blocks),
                Node::Element(_) => ElementRef::wrap(sibling)
                    .is_some_and(|e| collect_reverse(e, &mut blocks, max_blocks)),
                _ => false,
            };
            if stop {
                return blocks;
            }
        }
        match node.parent() {
            Some(parent)
                if ElementRef::wrap(parent)
                    .is_some_and(|e| !matches!(e.value().name(), "body" | "html")) =>
            {
                node = parent;
            }
            _ => return blocks,
        }
    }
}

/// Pushes a non-empty block. Returns true once the limit is reached.
fn push_block(blocks: &mut Vec<String>, text: &str, max_blocks: usize) -> bool {
    let text = normalize_text(text);
    if !text.is_empty() && blocks.len() < max_blocks {
        blocks.push(text);
    }
    blocks.len() >= max_blocks
}

/// Pushes text blocks of `element` last-first. Returns true when collection
/// must stop (limit reached or a table was met).
fn collect_reverse(element: ElementRef<'_>, blocks: &mut Vec<String>, max_blocks: usize) -> bool {
    if blocks.len() >= max_blocks || element.value().name() == "table" {
        return true;
    }

    let contains_table = element.select(&TABLE).next().is_some();
    let text = element.text().collect::<Vec<_>>().join(" ");
    if !contains_table && text.len() <= MAX_BLOCK_LEN {
        return push_block(blocks, &text, max_blocks);
    }

    for child in element.children().rev() {
        let stop = match child.value() {
            Node::Text(text) => push_block(blocks, text, max_blocks),
            Node::Element(_) => {
                ElementRef::wrap(child).is_some_and(|e| collect_reverse(e, blocks, max_blocks))
            }
            _ => false,
        };
        if stop {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first_table(html: &Html) -> ElementRef<'_> {
        html.select(&TABLE).next().unwrap()
    }

    #[test]
    fn test_colspan_expansion() {
        let html = Html::parse_document(
            r#"<table>
                <tr><th>Item</th><th colspan="3">December 31, 2023</th></tr>
                <tr><td>Revenue</td><td>$</td><td>1,234</td><td></td></tr>
            </table>"#,
        );
        let grid = TableGrid::from_element(first_table(&html));

        assert_eq!(grid.width, 4);
        assert_eq!(grid.rows[0].cells[3].text, "December 31, 2023");
        assert!(!grid.rows[0].cells[3].is_origin);
        assert_eq!(grid.rows[1].cells[2].text, "1,234");
        assert!(grid.rows[0].is_header());
        assert!(!grid.rows[1].is_header());
    }

    #[test]
    fn test_rowspan_expansion() {
        let html = Html::parse_document(
            r#"<table>
                <tr><th rowspan="2">Title - USD ($) $ in Millions</th><th colspan="2">12 Months Ended</th></tr>
                <tr><th>Sep. 30, 2023</th><th>Sep. 24, 2022</th></tr>
                <tr><td>Net sales</td><td>383,285</td><td>394,328</td></tr>
            </table>"#,
        );
        let grid = TableGrid::from_element(first_table(&html));

        assert_eq!(grid.rows[1].cells[0].text, "Title - USD ($) $ in Millions");
        assert_eq!(grid.rows[1].cells[1].text, "Sep. 30, 2023");
        assert_eq!(grid.rows[2].cells[2].text, "394,328");
        assert_eq!(grid.first_header_text(), Some("Title - USD ($) $ in Millions"));
    }

    #[test]
    fn test_nested_tables_are_separate() {
        let html = Html::parse_document(
            r#"<table>
                <tr><td>Outer</td><td><table><tr><td>Inner</td><td>1</td></tr></table></td></tr>
            </table>"#,
        );
        let grid = TableGrid::from_element(first_table(&html));
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0].label(), "Outer");
    }

    #[test]
    fn test_preceding_text_nearest_first() {
        let html = Html::parse_document(
            r#"<body>
                <table><tr><td>earlier</td></tr></table>
                <p>Apple Inc.</p>
                <div><p><b>CONSOLIDATED BALANCE SHEETS</b></p><p>(In millions)</p></div>
                <div><table><tr><td>Total assets</td><td>1</td></tr></table></div>
            </body>"#,
        );
        let table = html.select(&TABLE).nth(1).unwrap();
        let blocks = preceding_text(table, 8);

        assert_eq!(blocks[0], "CONSOLIDATED BALANCE SHEETS (In millions)");
        assert_eq!(blocks[1], "Apple Inc.");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Net\u{a0}sales \n  and   services "), "Net sales and services");
    }
}
