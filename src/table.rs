//! Product table parsing
//!
//! The fetch input is a CSV with a header row naming at least `sku` and
//! `images`. Other columns are ignored, and column order does not matter.

use crate::error::{Error, Result};
use crate::types::Row;

/// Header of the product identifier column
pub const SKU_COLUMN: &str = "sku";
/// Header of the `;`-separated image URL column
pub const IMAGES_COLUMN: &str = "images";

/// Parse an uploaded table into rows, in file order
///
/// # Errors
///
/// - [`Error::InvalidTable`] if the bytes are not valid CSV
/// - [`Error::MissingColumns`] if `sku` or `images` is absent from the header
pub fn parse_rows(data: &[u8]) -> Result<Vec<Row>> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| Error::InvalidTable(e.to_string()))?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let (sku_idx, images_idx) = match (position(SKU_COLUMN), position(IMAGES_COLUMN)) {
        (Some(sku), Some(images)) => (sku, images),
        (sku, images) => {
            let missing = [(SKU_COLUMN, sku), (IMAGES_COLUMN, images)]
                .into_iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(Error::MissingColumns { missing });
        }
    };

    reader
        .records()
        .map(|record| -> Result<Row> {
            let record = record.map_err(|e| Error::InvalidTable(e.to_string()))?;
            Ok(Row::from_cells(
                record.get(sku_idx).unwrap_or_default(),
                record.get(images_idx),
            ))
        })
        .collect()
}
