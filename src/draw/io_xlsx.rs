use std::path::Path;

use calamine::DataType;
use rsvp_selection::builder::Builder;
use rsvp_selection::{Cell, Table};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::draw::*;

pub const PRIMARY_SHEET: &str = "Primary Rows";
pub const ALTERNATE_SHEET: &str = "Alternate Rows";
pub const PREVIOUS_ATTENDEES_SHEET: &str = "Randomized Previous Attendees";

/// Reads the first worksheet of an Excel file. The first row is the header.
pub fn read_excel_table(path: &Path) -> BDrawResult<Table> {
    let path_s = path.display().to_string();
    info!("Attempting to read workbook {:?}", path_s);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_s.clone(),
    })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyTableSnafu {
            path: path_s.clone(),
        })?
        .context(OpeningExcelSnafu {
            path: path_s.clone(),
        })?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyTableSnafu {
        path: path_s.clone(),
    })?;
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, dt)| match dt {
            DataType::String(s) => s.clone(),
            DataType::Empty => format!("Unnamed: {}", idx),
            other => other.to_string(),
        })
        .collect();
    debug!("read_excel_table: header: {:?}", columns);

    let mut builder = Builder::new(&columns).context(SelectionSnafu {})?;
    for row in iter {
        let cells: Vec<Cell> = row.iter().map(read_cell_calamine).collect();
        builder.add_row(cells).context(SelectionSnafu {})?;
    }
    Ok(builder.build())
}

fn read_cell_calamine(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => Cell::Empty,
        DataType::String(s) if s.is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Int(i) => Cell::Int(*i),
        // Whole numbers are stored as floats in xlsx files.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Cell::Int(*f as i64),
        DataType::Float(f) => Cell::Float(*f),
        other => Cell::Text(other.to_string()),
    }
}

/// Writes each table to its own worksheet, in order, with a header row.
pub fn write_workbook(path: &Path, sheets: &[(&str, &Table)]) -> BDrawResult<()> {
    let path_s = path.display().to_string();
    let mut workbook = Workbook::new();
    for (name, table) in sheets.iter() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).context(WritingExcelSnafu {
            path: path_s.clone(),
        })?;
        write_table(worksheet, table, &path_s)?;
        debug!("write_workbook: sheet {:?}: {} rows", name, table.len());
    }
    workbook.save(path).context(WritingExcelSnafu { path: path_s })?;
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &Table, path: &str) -> BDrawResult<()> {
    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .context(WritingExcelSnafu { path })?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        let xl_row = (idx + 1) as u32;
        for (col, cell) in row.cells.iter().enumerate() {
            let xl_col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Int(i) => {
                    worksheet
                        .write_number(xl_row, xl_col, *i as f64)
                        .context(WritingExcelSnafu { path })?;
                }
                Cell::Float(f) => {
                    worksheet
                        .write_number(xl_row, xl_col, *f)
                        .context(WritingExcelSnafu { path })?;
                }
                Cell::Text(s) => {
                    worksheet
                        .write_string(xl_row, xl_col, s)
                        .context(WritingExcelSnafu { path })?;
                }
            }
        }
    }
    Ok(())
}
