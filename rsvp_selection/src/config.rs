// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// The content of one cell of a table.
///
/// Loaders infer integers and decimals, everything else is text.
/// Only the `Text` variant is affected by normalization.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    /// A missing value.
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// The representation used when this cell is part of a join key.
    ///
    /// Empty cells have no representation and only match other empty cells.
    pub fn key_part(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
}

/// An ordered sequence of rows sharing the same columns.
///
/// Every row has exactly as many cells as there are columns. Rows may repeat.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn empty(columns: &[String]) -> Table {
        Table {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// The (first name, last name) pair used to match rows across tables.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ExclusionKey {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// ******** Output data structures *********

/// The outcome of the policy that decides how many rows each stage draws.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct DrawPlan {
    pub attendees: usize,
    pub alternates: usize,
    /// Requested slots minus the pool size. Zero or negative when the pool
    /// covers the request.
    pub shortfall: i64,
}

/// Counters describing what the filter removed.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct FilterStats {
    pub rsvps: usize,
    pub removed_banned: usize,
    pub removed_previous: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FilterResult {
    /// The RSVPs left after removing banned people and previous attendees.
    pub eligible: Table,
    /// The RSVPs of people found in the previous-attendee list.
    pub previous_attendee_rsvps: Table,
    pub stats: FilterStats,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SelectionResult {
    pub attendees: Table,
    pub alternates: Table,
    /// Unshuffled. See `shuffle_rows` for the fallback ordering.
    pub previous_attendee_rsvps: Table,
    pub plan: DrawPlan,
    pub stats: FilterStats,
}

impl SelectionResult {
    pub fn has_shortfall(&self) -> bool {
        self.plan.shortfall > 0
    }
}

/// Errors that prevent the selection from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SelectionErrors {
    /// A join key column is absent from one of the tables.
    MissingColumn { table: String, column: String },
    InvalidRules(String),
}

impl Error for SelectionErrors {}

impl Display for SelectionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionErrors::MissingColumn { table, column } => {
                write!(f, "column {:?} is missing from the {} table", column, table)
            }
            SelectionErrors::InvalidRules(msg) => write!(f, "invalid selection rules: {}", msg),
        }
    }
}

// ********* Configuration **********

pub const FIRST_NAME_COLUMN: &str = "First name";
pub const LAST_NAME_COLUMN: &str = "Last name";

/// The columns that identify a person across tables.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct KeyColumns {
    pub first_name: String,
    pub last_name: String,
}

impl Default for KeyColumns {
    fn default() -> Self {
        KeyColumns {
            first_name: FIRST_NAME_COLUMN.to_string(),
            last_name: LAST_NAME_COLUMN.to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SelectionRules {
    pub number_of_attendees: usize,
    pub number_of_alternates: usize,
    /// If not provided, every run draws from a fresh seed.
    pub random_seed: Option<u64>,
    pub key_columns: KeyColumns,
}

impl SelectionRules {
    pub fn new(number_of_attendees: usize, number_of_alternates: usize) -> SelectionRules {
        SelectionRules {
            number_of_attendees,
            number_of_alternates,
            random_seed: None,
            key_columns: KeyColumns::default(),
        }
    }

    pub fn with_seed(self, seed: u64) -> SelectionRules {
        SelectionRules {
            random_seed: Some(seed),
            ..self
        }
    }

    /// The random generator shared by the draws and the fallback shuffle.
    pub fn rng(&self) -> StdRng {
        match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn validate(&self) -> Result<(), SelectionErrors> {
        if self.key_columns.first_name == self.key_columns.last_name {
            return Err(SelectionErrors::InvalidRules(format!(
                "the first and last name columns must differ, both are {:?}",
                self.key_columns.first_name
            )));
        }
        Ok(())
    }
}
