//! Interactive choice among several matching documents.

use std::io::{BufRead, Write};

use crate::error::{GdocError, Result};
use crate::models::Document;

/// What to do with the matched documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Nothing matched.
    Empty,
    /// Export the document at this zero-based index.
    One(usize),
    /// Export every match.
    All,
    /// Export nothing.
    Quit,
}

/// Parse the user's answer for `count` matches.
///
/// Accepts a 1-based number, `all`, or `q` (case-insensitive, surrounding
/// whitespace ignored). Anything else is an error.
pub fn parse_selection(input: &str, count: usize) -> Result<Selection> {
    let input = input.trim().to_lowercase();

    match input.as_str() {
        "q" => Ok(Selection::Quit),
        "all" => Ok(Selection::All),
        other => match other.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => Ok(Selection::One(n - 1)),
            _ => Err(GdocError::InvalidSelection(input.clone())),
        },
    }
}

/// Decide which matches to export, prompting only when there is more than one.
pub fn select<R: BufRead, W: Write>(
    matches: &[Document],
    reader: &mut R,
    writer: &mut W,
) -> Result<Selection> {
    match matches.len() {
        0 => return Ok(Selection::Empty),
        1 => return Ok(Selection::One(0)),
        _ => {}
    }

    writeln!(writer, "\nMultiple documents match. Options:")?;
    writeln!(writer, "  - Enter a number to export that document")?;
    writeln!(writer, "  - Enter 'all' to export all matching documents")?;
    writeln!(writer, "  - Enter 'q' to quit")?;
    write!(writer, "\nYour choice: ")?;
    writer.flush()?;

    let mut input = String::new();
    reader.read_line(&mut input)?;

    parse_selection(&input, matches.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn docs(n: usize) -> Vec<Document> {
        (1..=n)
            .map(|i| Document {
                id: format!("id{}", i),
                name: format!("Doc {}", i),
                description: None,
                modified_time: None,
                created_time: None,
            })
            .collect()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_selection("2\n", 3).unwrap(), Selection::One(1));
        assert_eq!(parse_selection(" 1 ", 3).unwrap(), Selection::One(0));
    }

    #[test]
    fn test_parse_all_and_quit() {
        assert_eq!(parse_selection("ALL", 2).unwrap(), Selection::All);
        assert_eq!(parse_selection("Q\n", 2).unwrap(), Selection::Quit);
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(parse_selection("0", 3).is_err());
        assert!(parse_selection("4", 3).is_err());
        assert!(parse_selection("-1", 3).is_err());
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_selection("maybe", 3).unwrap_err();
        assert!(matches!(err, GdocError::InvalidSelection(ref s) if s == "maybe"));
        assert!(parse_selection("", 3).is_err());
    }

    #[test]
    fn test_select_without_prompt() {
        let mut output = Vec::new();
        let mut input = Cursor::new(Vec::new());

        assert_eq!(select(&[], &mut input, &mut output).unwrap(), Selection::Empty);
        assert_eq!(select(&docs(1), &mut input, &mut output).unwrap(), Selection::One(0));
        assert!(output.is_empty());
    }

    #[test]
    fn test_select_prompts_for_multiple() {
        let mut output = Vec::new();
        let mut input = Cursor::new(b"all\n".to_vec());

        let selection = select(&docs(3), &mut input, &mut output).unwrap();

        assert_eq!(selection, Selection::All);
        let prompt = String::from_utf8(output).unwrap();
        assert!(prompt.contains("Multiple documents match"));
        assert!(prompt.ends_with("Your choice: "));
    }

    #[test]
    fn test_select_eof_is_invalid() {
        let mut output = Vec::new();
        let mut input = Cursor::new(Vec::new());
        assert!(select(&docs(2), &mut input, &mut output).is_err());
    }
}
