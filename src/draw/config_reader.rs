use std::path::{Path, PathBuf};

use crate::draw::*;

use serde::{Deserialize, Serialize};

/// The description of a draw, as stored in a JSON file.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawConfig {
    #[serde(rename = "rsvpFilePath")]
    pub rsvp_file_path: Option<String>,
    #[serde(rename = "bannedFilePath")]
    pub banned_file_path: Option<String>,
    #[serde(rename = "previousAttendeesFilePath")]
    pub previous_attendees_file_path: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "numberOfAttendees")]
    pub number_of_attendees: Option<usize>,
    #[serde(rename = "numberOfAlternates")]
    pub number_of_alternates: Option<usize>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<u64>,
    #[serde(rename = "labelPrefix")]
    pub label_prefix: Option<String>,
    #[serde(rename = "rsvpEncodings")]
    pub rsvp_encodings: Option<Vec<String>>,
    #[serde(rename = "rsvpDelimiter")]
    pub rsvp_delimiter: Option<String>,
    #[serde(rename = "firstNameColumn")]
    pub first_name_column: Option<String>,
    #[serde(rename = "lastNameColumn")]
    pub last_name_column: Option<String>,
    #[serde(rename = "alwaysShufflePrevious")]
    pub always_shuffle_previous: Option<bool>,
}

impl DrawConfig {
    /// The single byte separating the fields of the RSVP file.
    pub fn rsvp_delimiter_byte(&self) -> DrawResult<Option<u8>> {
        match self.rsvp_delimiter.as_deref() {
            None => Ok(None),
            Some(s) => match s.as_bytes() {
                [b] => Ok(Some(*b)),
                _ => InvalidDelimiterSnafu { delimiter: s }.fail(),
            },
        }
    }
}

pub fn read_config(path: &Path) -> BDrawResult<DrawConfig> {
    let path_s = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path_s.clone(),
    })?;
    let config: DrawConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path: path_s })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Resolves a path of the configuration against the directory of the configuration file.
pub fn resolve_path(root: &Path, p: &str) -> PathBuf {
    let p = Path::new(p);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
