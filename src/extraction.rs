use log::{debug, info};
use scraper::{ElementRef, Html, Selector};
use crate::config::SourceParameters;
use crate::errors::ExtractError;
use crate::models::forecast::{RawRow, RawTable};
use crate::normalization::HeaderMap;

/// Largest colspan browsers honour
const MAX_COLSPAN: usize = 1000;

/// What identifies the forecast table and its header within a page
pub struct ExtractOptions {
    pub table_selector: String,
    pub header_row: usize,
    pub default_location: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            table_selector: r#"table[border="2"]"#.to_string(),
            header_row: 1,
            default_location: "Your Location".to_string(),
        }
    }
}

impl From<&SourceParameters> for ExtractOptions {
    fn from(source: &SourceParameters) -> Self {
        Self {
            table_selector: source.table_selector.clone(),
            header_row: source.header_row,
            default_location: source.default_location.clone(),
        }
    }
}

/// Locates the forecast table in the given markup and returns its data rows together
/// with the location label found in the table heading.
///
/// Rows above the header row are caption rows and are skipped. Rows below it that lack
/// any required cell (date, uv index and, if the table has one, ozone column) are
/// metadata or footer rows and are discarded as well.
///
/// # Arguments
///
/// * 'markup' - the fetched html page
/// * 'options' - table selector, header row index and default location
pub fn extract(markup: &str, options: &ExtractOptions) -> Result<RawTable, ExtractError> {
    let document = Html::parse_document(markup);
    let table_selector = selector(&options.table_selector)?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| ExtractError::TableNotFound(options.table_selector.clone()))?;

    let location = table_location(&table)?.unwrap_or_else(|| {
        info!("no location heading in forecast table, using '{}'", options.default_location);
        options.default_location.clone()
    });

    let rows = table_rows(&table)?;
    let headers = rows
        .get(options.header_row)
        .ok_or(ExtractError::HeaderMissing(options.header_row))?
        .iter()
        .map(|c| c.clone().unwrap_or_default())
        .collect::<Vec<String>>();
    let header_map = HeaderMap::resolve(&headers)?;

    let mut raw_rows: Vec<RawRow> = Vec::new();
    for (i, cells) in rows.iter().enumerate().skip(options.header_row + 1) {
        match raw_row(cells, &header_map) {
            Some(r) => raw_rows.push(r),
            None => debug!("skipping table row {} with missing required cells: {:?}", i, cells),
        }
    }
    info!("extracted {} rows for '{}'", raw_rows.len(), location);

    Ok(RawTable { location, rows: raw_rows })
}

fn selector(s: &str) -> Result<Selector, ExtractError> {
    Selector::parse(s).map_err(|e| ExtractError::Selector(format!("'{}': {}", s, e)))
}

/// Returns the trimmed text of the first h2 inside the table, if any
///
/// # Arguments
///
/// * 'table' - the forecast table element
fn table_location(table: &ElementRef) -> Result<Option<String>, ExtractError> {
    let h2 = selector("h2")?;

    Ok(table
        .select(&h2)
        .next()
        .map(|h| cell_text(&h))
        .filter(|t| !t.is_empty()))
}

/// Returns the cell texts of every row in the table.
/// A cell spanning several columns fills its first column, the columns it covers
/// beyond that are left empty.
///
/// # Arguments
///
/// * 'table' - the forecast table element
fn table_rows(table: &ElementRef) -> Result<Vec<Vec<Option<String>>>, ExtractError> {
    let tr = selector("tr")?;
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();

    for row in table.select(&tr) {
        let mut cells: Vec<Option<String>> = Vec::new();
        for cell in row.children().filter_map(ElementRef::wrap) {
            let name = cell.value().name();
            if name != "td" && name != "th" {
                continue;
            }
            let text = cell_text(&cell);
            cells.push(if text.is_empty() { None } else { Some(text) });

            let span = cell.value()
                .attr("colspan")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .map(|s| s.min(MAX_COLSPAN))
                .unwrap_or(1);
            for _ in 1..span {
                cells.push(None);
            }
        }
        rows.push(cells);
    }

    Ok(rows)
}

fn cell_text(element: &ElementRef) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Picks the mapped cells out of a row, None if a required cell is missing
///
/// # Arguments
///
/// * 'cells' - cell texts of the row
/// * 'map' - column positions of the fields
fn raw_row(cells: &[Option<String>], map: &HeaderMap) -> Option<RawRow> {
    let cell = |i: usize| cells.get(i).cloned().flatten();

    let date = cell(map.date)?;
    let uv_index = cell(map.uv_index)?;
    let ozone_column = match map.ozone_column {
        Some(i) => Some(cell(i)?),
        None => None,
    };

    Some(RawRow { date, uv_index, ozone_column })
}
