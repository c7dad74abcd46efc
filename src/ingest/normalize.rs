use crate::models::IngestRecord;
use crate::sheet::Table;
use std::collections::HashSet;

pub const COL_SKU: &str = "SKU";
pub const COL_BRAND: &str = "BRAND";
pub const COL_PART_NAME: &str = "PART_NAME";
pub const COL_PARTSLINK: &str = "PARTSLINK";
pub const COL_OEM_NUMBER: &str = "OEM_NUMBER";
pub const COL_PRICE: &str = "B2B_PRICE15";
pub const COL_SHIPPING_REVENUE: &str = "SHIPPINGREVENUE18";
pub const COL_HANDLING_REVENUE: &str = "HANDLINGREVENUE18";
pub const COL_STOCK_VA: &str = "STOCK_VA";
pub const COL_STOCK_IL: &str = "STOCK_IL";
pub const COL_STOCK_LAS1: &str = "STOCK_LAS1";
pub const COL_STOCK_PERU: &str = "STOCK_PERU";
pub const COL_STOCK_GPT: &str = "STOCK_GPT";
pub const COL_STOCK_JAX: &str = "STOCK_JAX";
pub const COL_STOCK_TOTAL: &str = "STOCK_TOTAL";
pub const COL_DESCRIPTION: &str = "PDESCRIPTION";

/// Columns that must be coerced to integers; exports frequently carry a
/// `.0` suffix on these.
const INTEGER_COLUMNS: [&str; 2] = [COL_SKU, COL_STOCK_TOTAL];

/// Cleans a raw table into candidate rows. Pure and deterministic: the same
/// input table always yields the same output table.
///
/// In order: trim header whitespace, drop rows missing SKU or part name,
/// drop exact-duplicate rows, coerce integer columns (unparseable values
/// become zero), trim every cell, and finally drop rows whose essential
/// fields landed on sentinel values (zero SKU, blank name).
pub fn normalize(table: &Table) -> Table {
    let headers: Vec<String> = table
        .headers
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let cleaned = Table {
        headers,
        rows: Vec::new(),
    };

    let (Some(sku_idx), Some(part_idx)) =
        (cleaned.column(COL_SKU), cleaned.column(COL_PART_NAME))
    else {
        // Without both essential columns no row can qualify.
        return cleaned;
    };
    let integer_idx: Vec<usize> = INTEGER_COLUMNS
        .iter()
        .filter_map(|name| cleaned.column(name))
        .collect();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut rows = Vec::new();
    for raw in &table.rows {
        if is_blank(raw.get(sku_idx)) || is_blank(raw.get(part_idx)) {
            continue;
        }
        if !seen.insert(raw.clone()) {
            continue;
        }

        let mut row = raw.clone();
        for &idx in &integer_idx {
            row[idx] = coerce_int(&row[idx]).to_string();
        }
        for cell in &mut row {
            *cell = cell.trim().to_string();
        }

        if row[sku_idx] == "0" || row[part_idx].is_empty() {
            continue;
        }
        rows.push(row);
    }

    Table {
        headers: cleaned.headers,
        rows,
    }
}

/// Converts a normalized table into ingest records, one per row.
pub fn to_records(table: &Table) -> Vec<IngestRecord> {
    table
        .rows
        .iter()
        .map(|row| IngestRecord {
            sku: text(table, row, COL_SKU),
            brand: text(table, row, COL_BRAND),
            part_name: text(table, row, COL_PART_NAME),
            partslink: text(table, row, COL_PARTSLINK),
            oem_number: text(table, row, COL_OEM_NUMBER),
            price: float(table, row, COL_PRICE),
            shipping_revenue18: float(table, row, COL_SHIPPING_REVENUE),
            handling_revenue18: float(table, row, COL_HANDLING_REVENUE),
            stock_va: int(table, row, COL_STOCK_VA),
            stock_il: int(table, row, COL_STOCK_IL),
            stock_las1: int(table, row, COL_STOCK_LAS1),
            stock_peru: int(table, row, COL_STOCK_PERU),
            stock_gpt: int(table, row, COL_STOCK_GPT),
            stock_jax: int(table, row, COL_STOCK_JAX),
            stock: int(table, row, COL_STOCK_TOTAL),
            pdescription: text(table, row, COL_DESCRIPTION),
        })
        .collect()
}

fn is_blank(cell: Option<&String>) -> bool {
    cell.map(|c| c.trim().is_empty()).unwrap_or(true)
}

/// `"123"` and `"123.0"` both become 123; anything unparseable becomes 0.
fn coerce_int(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value as i64,
        _ => 0,
    }
}

fn text(table: &Table, row: &[String], name: &str) -> String {
    table
        .cell(row, name)
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

fn int(table: &Table, row: &[String], name: &str) -> i64 {
    table.cell(row, name).map(coerce_int).unwrap_or(0)
}

fn float(table: &Table, row: &[String], name: &str) -> f64 {
    table
        .cell(row, name)
        .and_then(|c| c.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}
