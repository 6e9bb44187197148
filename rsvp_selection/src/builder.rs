pub use crate::config::*;

/// A builder for assembling tables row by row.
///
/// Rows shorter than the header are padded with empty cells, which matches how
/// spreadsheet exports leave out trailing blanks.
///
/// ```
/// pub use rsvp_selection::builder::Builder;
/// # use rsvp_selection::SelectionErrors;
///
/// let mut builder = Builder::new(&["First name".to_string(), "Last name".to_string()])?;
///
/// builder.add_row_simple(&["Anna".to_string(), "Smith".to_string()])?;
/// let table = builder.build();
/// assert_eq!(table.len(), 1);
///
/// # Ok::<(), SelectionErrors>(())
/// ```
pub struct Builder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _rows: Vec<Row>,
}

impl Builder {
    pub fn new(columns: &[String]) -> Result<Builder, SelectionErrors> {
        if columns.is_empty() {
            return Err(SelectionErrors::InvalidRules(
                "a table needs at least one column".to_string(),
            ));
        }
        Ok(Builder {
            _columns: columns.to_vec(),
            _rows: Vec::new(),
        })
    }

    /// Adds a row of text values. Empty strings become empty cells.
    pub fn add_row_simple(&mut self, values: &[String]) -> Result<(), SelectionErrors> {
        let cells: Vec<Cell> = values
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.clone())
                }
            })
            .collect();
        self.add_row(cells)
    }

    pub fn add_row(&mut self, mut cells: Vec<Cell>) -> Result<(), SelectionErrors> {
        if cells.len() > self._columns.len() {
            return Err(SelectionErrors::InvalidRules(format!(
                "row {} has {} values but the table only has {} columns",
                self._rows.len() + 1,
                cells.len(),
                self._columns.len()
            )));
        }
        cells.resize(self._columns.len(), Cell::Empty);
        self._rows.push(Row { cells });
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(self) -> Table {
        Table {
            columns: self._columns,
            rows: self._rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols() -> Vec<String> {
        vec!["First name".to_string(), "Last name".to_string(), "Email".to_string()]
    }

    #[test]
    fn pads_short_rows() {
        let mut b = Builder::new(&cols()).unwrap();
        b.add_row(vec![Cell::Text("Anna".to_string())]).unwrap();
        let t = b.build();
        assert_eq!(
            t.rows[0].cells,
            vec![Cell::Text("Anna".to_string()), Cell::Empty, Cell::Empty]
        );
    }

    #[test]
    fn rejects_long_rows() {
        let mut b = Builder::new(&cols()).unwrap();
        let res = b.add_row(vec![Cell::Int(1), Cell::Int(2), Cell::Int(3), Cell::Int(4)]);
        assert!(matches!(res, Err(SelectionErrors::InvalidRules(_))));
        assert_eq!(b.num_rows(), 0);
    }

    #[test]
    fn rejects_no_columns() {
        assert!(Builder::new(&[]).is_err());
    }

    #[test]
    fn empty_strings_are_empty_cells() {
        let mut b = Builder::new(&cols()).unwrap();
        b.add_row_simple(&["Bob".to_string(), "".to_string(), "b@x.org".to_string()])
            .unwrap();
        let t = b.build();
        assert!(t.rows[0].cells[1].is_empty());
    }
}
