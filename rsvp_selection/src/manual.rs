/*!

This is the long-form manual for `rsvp_selection` and `rsvpdraw`.

## Inputs

Three tables are needed for a draw:
* the RSVP table: everyone who responded to the event. Exports from ticketing tools are
  usually tab-separated and encoded in UTF-16, which is what `rsvpdraw` expects by default.
* the banned list: people who must never be selected. Comma-separated.
* the previous attendee list: people who came to an earlier edition. Comma-separated.
  Rows with a missing value in any column are ignored.

All three tables must have a `First name` and a `Last name` column. Other columns are carried
through to the output as they are. Files ending in `.xlsx` are read from their first worksheet.

### Matching

People are matched on their first and last names only, after removing the surrounding spaces
and converting to upper case: `" anna "` and `"ANNA"` are the same person. Duplicates are not
merged: if the same name appears twice in the RSVP table and once in the banned list, both RSVPs
are removed.

## The draw

1. banned people are removed from the RSVPs
2. previous attendees are removed from what is left: this is the eligible pool
3. the attendees are drawn at random from the eligible pool
4. the alternates are drawn at random from the eligible people who were not drawn as attendees

When the eligible pool is too small:
* if it cannot even hold all the attendees, everyone in the pool is an attendee and there are
  no alternates.
* if it holds the attendees but not all the alternates, everyone left becomes an alternate.

The number of missing slots is the shortfall. When it is positive, the RSVPs of previous
attendees are shuffled and written out as a ranked list to fill the remaining slots.

## Randomness

A draw is random unless a seed is given with `--seed` or `randomSeed`. The same seed with the same
inputs always gives the same attendees, alternates and fallback ranking.

## Configuration

A JSON file can hold all the settings of a draw, so that the same draw can be run again:

```json
{
  "rsvpFilePath": "Guest list Spring Gala.tsv",
  "bannedFilePath": "banned.csv",
  "previousAttendeesFilePath": "previous.csv",
  "outputDirectory": "out",
  "numberOfAttendees": 120,
  "numberOfAlternates": 20,
  "randomSeed": 2024,
  "labelPrefix": "Guest list ",
  "rsvpEncodings": ["utf-16", "utf-8"],
  "rsvpDelimiter": "\t"
}
```

Relative paths are resolved against the directory of the configuration file. Command line
flags override the values of the configuration file. Counts that are given neither way are
asked for interactively.

## Output

The output is an Excel file named after the RSVP file, for example
`Spring Gala_selected_20240301_181500.xlsx`, with three worksheets:
* `Primary Rows`: the attendees
* `Alternate Rows`: the alternates, in the order they should be called
* `Randomized Previous Attendees`: the ranked fallback list, empty when there is no shortfall

*/
