// Interactive questions for the values missing from the command line and the configuration.

use std::io::{BufRead, Write};

use crate::draw::*;

pub fn ask_line<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    question: &str,
) -> BDrawResult<String> {
    write!(writer, "{}", question).context(PromptSnafu {})?;
    writer.flush().context(PromptSnafu {})?;
    let mut line = String::new();
    let num_read = reader.read_line(&mut line).context(PromptSnafu {})?;
    if num_read == 0 {
        return MissingAnswerSnafu { question }.fail().map_err(Box::new);
    }
    Ok(line.trim().to_string())
}

pub fn ask_count<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    question: &str,
) -> BDrawResult<usize> {
    let answer = ask_line(reader, writer, question)?;
    let count = answer
        .parse::<usize>()
        .ok()
        .context(InvalidCountSnafu { input: answer })?;
    Ok(count)
}
