mod config;
use log::{debug, info, warn};

use rand::seq::{index, SliceRandom};
use rand::Rng;

use std::collections::{HashMap, HashSet};

pub mod builder;
pub mod manual;

pub use crate::config::*;

/// Runs the whole selection with the given rules.
///
/// Arguments:
/// * `rsvps` the people who responded to the event
/// * `banned` the people who can never be selected
/// * `previous` the people who attended a previous event. They are not selected but
/// their RSVPs are returned as a fallback pool.
/// * `rules` the requested counts and the key columns
/// * `rng` the random source shared by both draws. Pass the same generator to
/// `shuffle_rows` afterwards to keep a seeded run reproducible.
///
/// All three tables are normalized before being joined.
pub fn run_selection<R: Rng + ?Sized>(
    rsvps: &Table,
    banned: &Table,
    previous: &Table,
    rules: &SelectionRules,
    rng: &mut R,
) -> Result<SelectionResult, SelectionErrors> {
    rules.validate()?;
    info!(
        "run_selection: {} rsvps, {} banned, {} previous attendees, rules: {:?}",
        rsvps.len(),
        banned.len(),
        previous.len(),
        rules
    );

    let rsvps = normalize_table(rsvps);
    let banned = normalize_table(banned);
    let previous = normalize_table(previous);

    let filtered = filter_rsvps(&rsvps, &banned, &previous, &rules.key_columns)?;
    let plan = plan_draw(
        filtered.eligible.len(),
        rules.number_of_attendees,
        rules.number_of_alternates,
    );
    info!("run_selection: plan: {:?}", plan);
    if plan.shortfall > 0 {
        warn!(
            "Requested {} attendees and {} alternates but only {} eligible rsvps: shortfall of {}",
            rules.number_of_attendees,
            rules.number_of_alternates,
            filtered.eligible.len(),
            plan.shortfall
        );
    }

    let (attendees, alternates) = draw(&filtered.eligible, &plan, rng);
    Ok(SelectionResult {
        attendees,
        alternates,
        previous_attendee_rsvps: filtered.previous_attendee_rsvps,
        plan,
        stats: filtered.stats,
    })
}

// ********* Normalization *********

/// Trims and upper-cases every text cell. Other cells are unchanged.
///
/// The input is left untouched, so normalizing twice is the same as normalizing once.
pub fn normalize_table(table: &Table) -> Table {
    Table {
        columns: table.columns.clone(),
        rows: table
            .rows
            .iter()
            .map(|r| Row {
                cells: r.cells.iter().map(normalize_cell).collect(),
            })
            .collect(),
    }
}

fn normalize_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Text(s) => Cell::Text(s.trim().to_uppercase()),
        c => c.clone(),
    }
}

// ********* Filtering *********

/// Removes the banned people, then the previous attendees, from the rsvps.
/// The rsvps of previous attendees are computed on the unfiltered rsvps.
///
/// The tables are expected to be normalized already.
pub fn filter_rsvps(
    rsvps: &Table,
    banned: &Table,
    previous: &Table,
    keys: &KeyColumns,
) -> Result<FilterResult, SelectionErrors> {
    // Check all the tables first so the error names the faulty one.
    key_indexes(rsvps, keys, "rsvp")?;
    key_indexes(banned, keys, "banned")?;
    key_indexes(previous, keys, "previous attendee")?;

    let not_banned = anti_join(rsvps, banned, keys)?;
    let eligible = anti_join(&not_banned, previous, keys)?;
    let previous_attendee_rsvps = inner_join(rsvps, previous, keys)?;

    let stats = FilterStats {
        rsvps: rsvps.len(),
        removed_banned: rsvps.len() - not_banned.len(),
        removed_previous: not_banned.len() - eligible.len(),
    };
    info!(
        "filter_rsvps: {} rsvps, {} banned removed, {} previous attendees removed, {} eligible, {} previous attendee rsvps",
        stats.rsvps,
        stats.removed_banned,
        stats.removed_previous,
        eligible.len(),
        previous_attendee_rsvps.len()
    );
    Ok(FilterResult {
        eligible,
        previous_attendee_rsvps,
        stats,
    })
}

/// The rows of `left` whose key does not appear in `right`. Keeps the columns and the
/// order of `left`.
pub fn anti_join(
    left: &Table,
    right: &Table,
    keys: &KeyColumns,
) -> Result<Table, SelectionErrors> {
    let (lf, ll) = key_indexes(left, keys, "left")?;
    let (rf, rl) = key_indexes(right, keys, "right")?;
    let excluded: HashSet<ExclusionKey> = right.rows.iter().map(|r| row_key(r, rf, rl)).collect();

    let mut rows: Vec<Row> = Vec::new();
    for row in left.rows.iter() {
        let key = row_key(row, lf, ll);
        if excluded.contains(&key) {
            debug!("anti_join: removing {:?}", key);
        } else {
            rows.push(row.clone());
        }
    }
    Ok(Table {
        columns: left.columns.clone(),
        rows,
    })
}

/// The relational inner join of both tables on the key.
///
/// A row of `left` matching k rows of `right` appears k times. The output holds the
/// columns of `left`, then the non-key columns of `right`. Column names present on both
/// sides get the suffixes `_x` (left) and `_y` (right).
pub fn inner_join(
    left: &Table,
    right: &Table,
    keys: &KeyColumns,
) -> Result<Table, SelectionErrors> {
    let (lf, ll) = key_indexes(left, keys, "left")?;
    let (rf, rl) = key_indexes(right, keys, "right")?;

    let right_extra: Vec<usize> = (0..right.columns.len())
        .filter(|idx| *idx != rf && *idx != rl)
        .collect();
    let overlap: HashSet<&String> = right_extra
        .iter()
        .map(|idx| &right.columns[*idx])
        .filter(|c| left.columns.contains(c))
        .collect();

    let mut columns: Vec<String> = left
        .columns
        .iter()
        .map(|c| {
            if overlap.contains(c) {
                format!("{}_x", c)
            } else {
                c.clone()
            }
        })
        .collect();
    for idx in right_extra.iter() {
        let c = &right.columns[*idx];
        if overlap.contains(c) {
            columns.push(format!("{}_y", c));
        } else {
            columns.push(c.clone());
        }
    }

    let mut matches: HashMap<ExclusionKey, Vec<&Row>> = HashMap::new();
    for row in right.rows.iter() {
        matches.entry(row_key(row, rf, rl)).or_default().push(row);
    }

    let mut rows: Vec<Row> = Vec::new();
    for row in left.rows.iter() {
        if let Some(right_rows) = matches.get(&row_key(row, lf, ll)) {
            for right_row in right_rows {
                let mut cells = row.cells.clone();
                cells.extend(right_extra.iter().map(|idx| right_row.cells[*idx].clone()));
                rows.push(Row { cells });
            }
        }
    }
    Ok(Table { columns, rows })
}

fn key_indexes(
    table: &Table,
    keys: &KeyColumns,
    table_name: &str,
) -> Result<(usize, usize), SelectionErrors> {
    let find = |column: &String| {
        table
            .column_index(column)
            .ok_or_else(|| SelectionErrors::MissingColumn {
                table: table_name.to_string(),
                column: column.clone(),
            })
    };
    Ok((find(&keys.first_name)?, find(&keys.last_name)?))
}

fn row_key(row: &Row, first_idx: usize, last_idx: usize) -> ExclusionKey {
    ExclusionKey {
        first_name: row.cells.get(first_idx).and_then(|c| c.key_part()),
        last_name: row.cells.get(last_idx).and_then(|c| c.key_part()),
    }
}

// ********* Sampling *********

/// Decides how many attendees and alternates can be drawn from a pool.
///
/// If the pool cannot hold all the attendees, everyone becomes an attendee and there
/// are no alternates. If it holds the attendees but not all the alternates, whatever
/// is left becomes an alternate.
pub fn plan_draw(pool_size: usize, attendees: usize, alternates: usize) -> DrawPlan {
    let requested = attendees.saturating_add(alternates);
    let shortfall = (attendees as i128 + alternates as i128 - pool_size as i128)
        .clamp(i64::MIN as i128, i64::MAX as i128) as i64;
    if attendees > pool_size {
        DrawPlan {
            attendees: pool_size,
            alternates: 0,
            shortfall,
        }
    } else if requested > pool_size {
        DrawPlan {
            attendees,
            alternates: pool_size - attendees,
            shortfall,
        }
    } else {
        DrawPlan {
            attendees,
            alternates,
            shortfall,
        }
    }
}

/// Draws the attendees from the pool, then the alternates from what remains.
pub fn draw<R: Rng + ?Sized>(pool: &Table, plan: &DrawPlan, rng: &mut R) -> (Table, Table) {
    let (attendees, remaining) = sample_rows(pool, plan.attendees, rng);
    let (alternates, _) = sample_rows(&remaining, plan.alternates, rng);
    debug!(
        "draw: {} attendees, {} alternates out of {} rows",
        attendees.len(),
        alternates.len(),
        pool.len()
    );
    (attendees, alternates)
}

/// Uniform sampling without replacement.
///
/// Returns the selected rows in draw order and the remaining rows in their original
/// order. Amounts larger than the table are capped to its size.
pub fn sample_rows<R: Rng + ?Sized>(table: &Table, amount: usize, rng: &mut R) -> (Table, Table) {
    let amount = amount.min(table.len());
    if amount == 0 {
        return (Table::empty(&table.columns), table.clone());
    }
    let picked: Vec<usize> = index::sample(rng, table.len(), amount).into_vec();
    let picked_set: HashSet<usize> = picked.iter().cloned().collect();

    let selected: Vec<Row> = picked.iter().map(|idx| table.rows[*idx].clone()).collect();
    let remaining: Vec<Row> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(idx, _)| !picked_set.contains(idx))
        .map(|(_, r)| r.clone())
        .collect();
    (
        Table {
            columns: table.columns.clone(),
            rows: selected,
        },
        Table {
            columns: table.columns.clone(),
            rows: remaining,
        },
    )
}

/// A uniformly random permutation of the rows. Used to rank the previous attendees
/// when the eligible pool falls short.
pub fn shuffle_rows<R: Rng + ?Sized>(table: &Table, rng: &mut R) -> Table {
    let mut rows = table.rows.clone();
    rows.shuffle(rng);
    Table {
        columns: table.columns.clone(),
        rows,
    }
}
