// Primitives for reading delimited text files.

use std::path::Path;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use rsvp_selection::builder::Builder;
use rsvp_selection::{Cell, Table};

use crate::draw::{io_common::infer_column_types, *};

pub const DEFAULT_RSVP_ENCODINGS: [&str; 2] = ["utf-16", "utf-8"];
pub const EXCLUSION_LIST_ENCODINGS: [&str; 1] = ["utf-8"];

/// Reads a delimited file, trying each of the encodings in order.
pub fn read_delimited_table(
    path: &Path,
    delimiter: u8,
    encodings: &[String],
) -> BDrawResult<Table> {
    let path_s = path.display().to_string();
    info!("Attempting to read table {:?}", path_s);
    let bytes = std::fs::read(path).context(OpeningFileSnafu {
        path: path_s.clone(),
    })?;
    let text = decode_text(&bytes, encodings, delimiter, &path_s)?;
    parse_delimited_table(&text, delimiter, &path_s)
}

/// Drops the rows with a missing value. Used for the previous attendees.
pub fn drop_incomplete_rows(table: Table) -> Table {
    let num_rows = table.len();
    let rows: Vec<_> = table
        .rows
        .into_iter()
        .filter(|r| !r.cells.iter().any(Cell::is_empty))
        .collect();
    if rows.len() < num_rows {
        warn!(
            "drop_incomplete_rows: dropped {} rows with missing values",
            num_rows - rows.len()
        );
    }
    Table {
        columns: table.columns,
        rows,
    }
}

/// Decodes the content of a file with the first encoding that fits.
///
/// An encoding fits when it decodes the bytes without any malformed sequence and the
/// first line contains the delimiter. The second condition rejects UTF-8 text read as
/// UTF-16, which decodes cleanly to meaningless characters.
pub fn decode_text(
    bytes: &[u8],
    encodings: &[String],
    delimiter: u8,
    path: &str,
) -> BDrawResult<String> {
    let delimiter = delimiter as char;
    for label in encodings {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .context(UnknownEncodingSnafu { label: label.clone() })?;
        match decode_with(encoding, bytes) {
            Some(text) if first_line(&text).contains(delimiter) => {
                debug!("decode_text: {:?} decoded as {}", path, encoding.name());
                return Ok(text);
            }
            Some(_) => {
                debug!(
                    "decode_text: {:?} decoded as {} but no delimiter found in the header",
                    path,
                    encoding.name()
                );
            }
            None => {
                debug!("decode_text: {:?} is not valid {}", path, encoding.name());
            }
        }
    }
    DecodingTextSnafu {
        path,
        encodings: encodings.join(", "),
    }
    .fail()
    .map_err(Box::new)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    // A byte order mark from the same family picks the variant and is not part of the text.
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if same_family(bom_encoding, encoding) => {
            (bom_encoding, &bytes[bom_len..])
        }
        _ => (encoding, bytes),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|cow| cow.into_owned())
}

fn same_family(a: &'static Encoding, b: &'static Encoding) -> bool {
    let is_utf16 = |e: &'static Encoding| e == UTF_16LE || e == UTF_16BE;
    a == b || (is_utf16(a) && is_utf16(b))
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

pub fn parse_delimited_table(text: &str, delimiter: u8, path: &str) -> BDrawResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = rdr.headers().context(CsvLineParseSnafu { path })?.clone();
    if header.is_empty() {
        return EmptyTableSnafu { path }.fail().map_err(Box::new);
    }
    let columns: Vec<String> = header.iter().map(|s| s.to_string()).collect();
    debug!("parse_delimited_table: header: {:?}", columns);

    let mut builder = Builder::new(&columns).context(SelectionSnafu {})?;
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path })?;
        if line.len() > columns.len() {
            return CsvLineTooLongSnafu { path, lineno }.fail().map_err(Box::new);
        }
        let values: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        builder.add_row_simple(&values).context(SelectionSnafu {})?;
    }
    debug!(
        "parse_delimited_table: {:?}: {} rows",
        path,
        builder.num_rows()
    );
    Ok(infer_column_types(builder.build()))
}
