use log::{debug, info, warn};

use rsvp_selection::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use crate::args::Args;
use crate::draw::config_reader::*;
use crate::draw::io_common::*;
use crate::draw::io_csv::*;
use crate::draw::io_xlsx::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;
mod prompt;

#[derive(Debug, Snafu)]
pub enum DrawError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not decode {path} with any of the encodings: {encodings}"))]
    DecodingText { path: String, encodings: String },
    #[snafu(display("Unknown text encoding {label:?}"))]
    UnknownEncoding { label: String },
    #[snafu(display("The delimiter must be a single character, got {delimiter:?}"))]
    InvalidDelimiter { delimiter: String },
    #[snafu(display("Error parsing {path}: {source}"))]
    CsvLineParse { source: csv::Error, path: String },
    #[snafu(display("Line {lineno} of {path} has more fields than the header"))]
    CsvLineTooLong { path: String, lineno: usize },
    #[snafu(display("No header found in {path}"))]
    EmptyTable { path: String },
    #[snafu(display("Error opening workbook {path}: {source}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Error writing workbook {path}: {source}"))]
    WritingExcel {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error creating the output directory {path}: {source}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening configuration {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Selection failed: {source}"))]
    Selection { source: SelectionErrors },
    #[snafu(display("Error while asking for input: {source}"))]
    Prompt { source: std::io::Error },
    #[snafu(display("No answer given to {question:?}"))]
    MissingAnswer { question: String },
    #[snafu(display("Expected a positive whole number, got {input:?}"))]
    InvalidCount { input: String },
}

type DrawResult<T> = Result<T, DrawError>;
type BDrawResult<T> = Result<T, Box<DrawError>>;

/// All the settings of one draw, once the configuration file and the command line
/// have been merged. Command line values win.
#[derive(Eq, PartialEq, Debug, Clone)]
struct DrawSettings {
    rsvp_path: Option<PathBuf>,
    banned_path: Option<PathBuf>,
    previous_path: Option<PathBuf>,
    output_directory: PathBuf,
    number_of_attendees: Option<usize>,
    number_of_alternates: Option<usize>,
    random_seed: Option<u64>,
    label_prefix: String,
    rsvp_encodings: Vec<String>,
    rsvp_delimiter: u8,
    key_columns: KeyColumns,
    always_shuffle_previous: bool,
}

fn build_settings(args: &Args) -> BDrawResult<DrawSettings> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config_p = Path::new(config_path.as_str());
            let config = read_config(config_p)?;
            info!("config: {:?}", config);
            let root = config_p
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (DrawConfig::default(), PathBuf::new()),
    };

    let from_config = |p: &Option<String>| p.as_deref().map(|s| resolve_path(&root, s));
    let from_args = |p: &Option<String>| p.as_deref().map(PathBuf::from);

    let defaults = KeyColumns::default();
    Ok(DrawSettings {
        rsvp_path: from_args(&args.input).or_else(|| from_config(&config.rsvp_file_path)),
        banned_path: from_args(&args.banned).or_else(|| from_config(&config.banned_file_path)),
        previous_path: from_args(&args.previous)
            .or_else(|| from_config(&config.previous_attendees_file_path)),
        output_directory: from_args(&args.out)
            .or_else(|| from_config(&config.output_directory))
            .unwrap_or_else(|| root.clone()),
        number_of_attendees: args.attendees.or(config.number_of_attendees),
        number_of_alternates: args.alternates.or(config.number_of_alternates),
        random_seed: args.seed.or(config.random_seed),
        label_prefix: args
            .label_prefix
            .clone()
            .or_else(|| config.label_prefix.clone())
            .unwrap_or_else(|| DEFAULT_LABEL_PREFIX.to_string()),
        rsvp_encodings: config.rsvp_encodings.clone().unwrap_or_else(|| {
            DEFAULT_RSVP_ENCODINGS
                .iter()
                .map(|s| s.to_string())
                .collect()
        }),
        rsvp_delimiter: config.rsvp_delimiter_byte()?.unwrap_or(b'\t'),
        key_columns: KeyColumns {
            first_name: config
                .first_name_column
                .clone()
                .unwrap_or(defaults.first_name),
            last_name: config
                .last_name_column
                .clone()
                .unwrap_or(defaults.last_name),
        },
        always_shuffle_previous: args.always_shuffle_previous
            || config.always_shuffle_previous.unwrap_or(false),
    })
}

fn read_rsvps(path: &Path, settings: &DrawSettings) -> BDrawResult<Table> {
    if is_excel_file(path) {
        read_excel_table(path)
    } else {
        read_delimited_table(path, settings.rsvp_delimiter, &settings.rsvp_encodings)
    }
}

fn read_exclusion_list(
    path: &Option<PathBuf>,
    kind: &str,
    settings: &DrawSettings,
    drop_incomplete: bool,
) -> BDrawResult<Table> {
    let path = match path {
        Some(p) => p,
        None => {
            warn!("No {} list provided, nobody is excluded on that ground", kind);
            return Ok(Table::empty(&[
                settings.key_columns.first_name.clone(),
                settings.key_columns.last_name.clone(),
            ]));
        }
    };
    let encodings: Vec<String> = EXCLUSION_LIST_ENCODINGS
        .iter()
        .map(|s| s.to_string())
        .collect();
    let table = if is_excel_file(path) {
        read_excel_table(path)?
    } else {
        read_delimited_table(path, b',', &encodings)?
    };
    if drop_incomplete {
        Ok(drop_incomplete_rows(table))
    } else {
        Ok(table)
    }
}

/// Runs a draw end to end and returns the path of the spreadsheet written.
///
/// Missing values are asked for on the standard input.
pub fn run_draw(args: &Args) -> BDrawResult<PathBuf> {
    let stdin = std::io::stdin();
    let mut reader = stdin.lock();
    let mut writer = std::io::stdout();
    run_draw_with(args, &mut reader, &mut writer)
}

pub fn run_draw_with<R: BufRead, W: Write>(
    args: &Args,
    reader: &mut R,
    writer: &mut W,
) -> BDrawResult<PathBuf> {
    let settings = build_settings(args)?;
    debug!("run_draw: settings: {:?}", settings);

    let rsvp_path = match settings.rsvp_path.clone() {
        Some(p) => p,
        None => PathBuf::from(prompt::ask_line(
            reader,
            writer,
            "Path of the RSVP file (csv, tsv or xlsx): ",
        )?),
    };
    let number_of_attendees = match settings.number_of_attendees {
        Some(x) => x,
        None => prompt::ask_count(reader, writer, "Input number of attendees: ")?,
    };
    let number_of_alternates = match settings.number_of_alternates {
        Some(x) => x,
        None => prompt::ask_count(reader, writer, "Input number of alternates needed: ")?,
    };

    let rsvps = read_rsvps(&rsvp_path, &settings)?;
    let banned = read_exclusion_list(&settings.banned_path, "banned", &settings, false)?;
    let previous =
        read_exclusion_list(&settings.previous_path, "previous attendee", &settings, true)?;

    let rules = SelectionRules {
        number_of_attendees,
        number_of_alternates,
        random_seed: settings.random_seed,
        key_columns: settings.key_columns.clone(),
    };
    let mut rng = rules.rng();
    let result = run_selection(&rsvps, &banned, &previous, &rules, &mut rng)
        .context(SelectionSnafu {})?;

    let fallback = if result.has_shortfall() || settings.always_shuffle_previous {
        info!(
            "Shuffling {} previous attendee rsvps (shortfall: {})",
            result.previous_attendee_rsvps.len(),
            result.plan.shortfall
        );
        shuffle_rows(&result.previous_attendee_rsvps, &mut rng)
    } else {
        Table::empty(&result.previous_attendee_rsvps.columns)
    };

    let label = output_label(&rsvp_path, &settings.label_prefix);
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    if !settings.output_directory.as_os_str().is_empty() {
        fs::create_dir_all(&settings.output_directory).context(CreatingOutputDirSnafu {
            path: settings.output_directory.display().to_string(),
        })?;
    }
    let out_path = settings
        .output_directory
        .join(output_file_name(&label, &timestamp));

    write_workbook(
        &out_path,
        &[
            (PRIMARY_SHEET, &result.attendees),
            (ALTERNATE_SHEET, &result.alternates),
            (PREVIOUS_ATTENDEES_SHEET, &fallback),
        ],
    )?;
    info!(
        "run_draw: {} attendees, {} alternates, {} ranked previous attendees written to {:?}",
        result.attendees.len(),
        result.alternates.len(),
        fallback.len(),
        out_path
    );
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Fixture {
            let _ = env_logger::builder().is_test(true).try_init();
            Fixture {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn write_utf16(&self, name: &str, content: &str) -> PathBuf {
            let mut bytes = vec![0xFF, 0xFE];
            for unit in content.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
            let p = self.path(name);
            fs::write(&p, bytes).unwrap();
            p
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let p = self.path(name);
            fs::write(&p, content).unwrap();
            p
        }

        fn standard_inputs(&self) -> Args {
            let rsvp = self.write_utf16(
                "Guest list Spring Gala.tsv",
                "First name\tLast name\tEmail\n\
                 Anna\tSmith\ta@example.org\n\
                 Bob\tJones\tb@example.org\n\
                 Carl\tLee\tc@example.org\n\
                 Dana\tWu\td@example.org\n\
                 Eve\tPark\te@example.org\n",
            );
            let banned = self.write("banned.csv", "First name,Last name,Reason\n eve ,PARK,\n");
            let previous = self.write(
                "previous.csv",
                "First name,Last name,Year\nbob,jones,2023\nZoe,Kim,2022\n",
            );
            Args {
                input: Some(rsvp.display().to_string()),
                banned: Some(banned.display().to_string()),
                previous: Some(previous.display().to_string()),
                out: Some(self.path("out").display().to_string()),
                seed: Some(3),
                ..Args::default()
            }
        }
    }

    fn sheet_heights(path: &Path) -> Vec<usize> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        [PRIMARY_SHEET, ALTERNATE_SHEET, PREVIOUS_ATTENDEES_SHEET]
            .iter()
            .map(|name| workbook.worksheet_range(name).unwrap().unwrap().height())
            .collect()
    }

    #[test]
    fn draw_with_shortfall_writes_fallback() {
        let fx = Fixture::new();
        let args = Args {
            attendees: Some(2),
            alternates: Some(2),
            ..fx.standard_inputs()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let p = run_draw_with(&args, &mut input, &mut out).unwrap();

        let name = simplify_file_name(&p);
        assert!(name.starts_with("Spring Gala_selected_"));
        assert!(name.ends_with(".xlsx"));
        assert!(p.starts_with(fx.path("out")));
        // 3 eligible people: 2 attendees, 1 alternate, shortfall 1.
        // Headers are counted in the heights.
        assert_eq!(sheet_heights(&p), vec![3, 2, 2]);

        let mut workbook: Xlsx<_> = open_workbook(&p).unwrap();
        let fallback = workbook
            .worksheet_range(PREVIOUS_ATTENDEES_SHEET)
            .unwrap()
            .unwrap();
        let header: Vec<String> = fallback
            .rows()
            .next()
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(header, vec!["First name", "Last name", "Email", "Year"]);
        let bob: Vec<String> = fallback
            .rows()
            .nth(1)
            .unwrap()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(bob[0], "BOB");
        assert_eq!(bob[2], "B@EXAMPLE.ORG");
    }

    #[test]
    fn banned_rows_with_blank_fields_still_exclude() {
        let fx = Fixture::new();
        let args = Args {
            attendees: Some(3),
            alternates: Some(0),
            ..fx.standard_inputs()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let p = run_draw_with(&args, &mut input, &mut out).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&p).unwrap();
        let primary = workbook.worksheet_range(PRIMARY_SHEET).unwrap().unwrap();
        let first_names: Vec<String> = primary
            .rows()
            .skip(1)
            .map(|r| r[0].to_string())
            .collect();
        assert_eq!(first_names.len(), 3);
        assert!(!first_names.contains(&"EVE".to_string()));
    }

    #[test]
    fn draw_without_shortfall_leaves_fallback_empty() {
        let fx = Fixture::new();
        let args = Args {
            attendees: Some(1),
            alternates: Some(1),
            ..fx.standard_inputs()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let p = run_draw_with(&args, &mut input, &mut out).unwrap();
        assert_eq!(sheet_heights(&p), vec![2, 2, 1]);
    }

    #[test]
    fn always_shuffle_previous() {
        let fx = Fixture::new();
        let args = Args {
            attendees: Some(1),
            alternates: Some(1),
            always_shuffle_previous: true,
            ..fx.standard_inputs()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let p = run_draw_with(&args, &mut input, &mut out).unwrap();
        assert_eq!(sheet_heights(&p), vec![2, 2, 2]);
    }

    #[test]
    fn counts_are_prompted_for() {
        let fx = Fixture::new();
        let args = fx.standard_inputs();
        let mut input: &[u8] = b"5\n0\n";
        let mut out: Vec<u8> = Vec::new();
        let p = run_draw_with(&args, &mut input, &mut out).unwrap();
        assert_eq!(sheet_heights(&p), vec![4, 1, 2]);
        let prompts = String::from_utf8(out).unwrap();
        assert!(prompts.contains("Input number of attendees: "));
        assert!(prompts.contains("Input number of alternates needed: "));
    }

    #[test]
    fn config_file_with_relative_paths() {
        let fx = Fixture::new();
        fx.write(
            "Guest list Gala.csv",
            "First name;Last name\nAnna;Smith\nBob;Jones\nCarl;Lee\n",
        );
        fx.write("banned.csv", "First name,Last name\nCarl,Lee\n");
        let config = fx.write(
            "draw.json",
            r#"{
                "rsvpFilePath": "Guest list Gala.csv",
                "bannedFilePath": "banned.csv",
                "outputDirectory": "results",
                "numberOfAttendees": 1,
                "numberOfAlternates": 1,
                "randomSeed": 99,
                "rsvpEncodings": ["utf-8"],
                "rsvpDelimiter": ";"
            }"#,
        );
        let args = Args {
            config: Some(config.display().to_string()),
            ..Args::default()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let p = run_draw_with(&args, &mut input, &mut out).unwrap();
        assert!(p.starts_with(fx.path("results")));
        assert!(simplify_file_name(&p).starts_with("Gala_selected_"));
        assert_eq!(sheet_heights(&p), vec![2, 2, 1]);
    }

    #[test]
    fn command_line_overrides_config() {
        let fx = Fixture::new();
        let config = fx.write(
            "draw.json",
            r#"{ "numberOfAttendees": 1, "randomSeed": 1, "labelPrefix": "RSVP " }"#,
        );
        let args = Args {
            config: Some(config.display().to_string()),
            attendees: Some(4),
            seed: Some(2),
            ..Args::default()
        };
        let settings = build_settings(&args).unwrap();
        assert_eq!(settings.number_of_attendees, Some(4));
        assert_eq!(settings.number_of_alternates, None);
        assert_eq!(settings.random_seed, Some(2));
        assert_eq!(settings.label_prefix, "RSVP ");
        assert_eq!(settings.rsvp_delimiter, b'\t');
        assert_eq!(settings.output_directory, fx.dir.path().to_path_buf());
    }

    #[test]
    fn seeded_draws_are_identical() {
        let fx = Fixture::new();
        let args = Args {
            attendees: Some(2),
            alternates: Some(1),
            out: Some(fx.path("a").display().to_string()),
            ..fx.standard_inputs()
        };
        let args_b = Args {
            out: Some(fx.path("b").display().to_string()),
            ..args.clone()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let pa = run_draw_with(&args, &mut input, &mut out).unwrap();
        let pb = run_draw_with(&args_b, &mut input, &mut out).unwrap();

        let read_all = |p: &Path| -> Vec<Vec<String>> {
            let mut workbook: Xlsx<_> = open_workbook(p).unwrap();
            let mut res = Vec::new();
            for name in [PRIMARY_SHEET, ALTERNATE_SHEET, PREVIOUS_ATTENDEES_SHEET] {
                let range = workbook.worksheet_range(name).unwrap().unwrap();
                for row in range.rows() {
                    res.push(row.iter().map(|c| c.to_string()).collect());
                }
            }
            res
        };
        assert_eq!(read_all(&pa), read_all(&pb));
    }

    #[test]
    fn missing_key_column_is_fatal() {
        let fx = Fixture::new();
        let banned = fx.write("banned_bad.csv", "Name,Surname\nEve,Park\n");
        let args = Args {
            banned: Some(banned.display().to_string()),
            attendees: Some(1),
            alternates: Some(0),
            ..fx.standard_inputs()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let err = run_draw_with(&args, &mut input, &mut out).unwrap_err();
        assert!(matches!(
            *err,
            DrawError::Selection {
                source: SelectionErrors::MissingColumn { .. }
            }
        ));
        assert!(!fx.path("out").exists());
    }

    #[test]
    fn undecodable_rsvps_are_fatal() {
        let fx = Fixture::new();
        let rsvp = fx.path("rsvp.tsv");
        fs::write(&rsvp, [0xC3u8, 0x28, 0x41]).unwrap();
        let args = Args {
            input: Some(rsvp.display().to_string()),
            attendees: Some(1),
            alternates: Some(0),
            ..Args::default()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let err = run_draw_with(&args, &mut input, &mut out).unwrap_err();
        assert!(matches!(*err, DrawError::DecodingText { .. }));
    }

    #[test]
    fn missing_exclusion_lists_exclude_nobody() {
        let fx = Fixture::new();
        let args = Args {
            banned: None,
            previous: None,
            attendees: Some(5),
            alternates: Some(0),
            ..fx.standard_inputs()
        };
        let mut input: &[u8] = b"";
        let mut out: Vec<u8> = Vec::new();
        let p = run_draw_with(&args, &mut input, &mut out).unwrap();
        assert_eq!(sheet_heights(&p), vec![6, 1, 1]);
    }
}
