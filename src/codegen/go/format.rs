//! Go source normalization
//!
//! A small subset of what `gofmt` does to the files this crate emits:
//! tab indentation by nesting depth, at most one blank line in a row and
//! column alignment of struct fields. Input that it cannot make sense of is
//! reported as a [`FormatError`] so callers can fall back to the raw text.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected '{delimiter}' on line {line}")]
    UnexpectedClose { delimiter: char, line: usize },

    #[error("unterminated literal on line {line}")]
    UnterminatedLiteral { line: usize },

    #[error("unclosed '{delimiter}' at end of input")]
    Unclosed { delimiter: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Struct,
    Other,
}

#[derive(Debug)]
struct Line {
    depth: usize,
    text: String,
    /// Direct child of a `struct { ... }` block
    in_struct: bool,
}

impl Line {
    fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    fn opens_block(&self) -> bool {
        self.text.ends_with('{') || self.text.ends_with('(')
    }

    fn closes_block(&self) -> bool {
        self.text.starts_with('}') || self.text.starts_with(')')
    }
}

/// Normalize Go source text
pub fn format_source(src: &str) -> Result<String, FormatError> {
    let lines = parse_lines(src)?;
    let lines = collapse_blank_lines(lines);

    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < lines.len() {
        if field_cells(&lines[i]).is_some() {
            let start = i;
            while i < lines.len()
                && lines[i].depth == lines[start].depth
                && field_cells(&lines[i]).is_some()
            {
                i += 1;
            }
            write_aligned(&mut out, &lines[start..i]);
        } else {
            write_line(&mut out, lines[i].depth, &lines[i].text);
            i += 1;
        }
    }

    Ok(out)
}

fn parse_lines(src: &str) -> Result<Vec<Line>, FormatError> {
    let mut stack: Vec<(char, Block)> = Vec::new();
    let mut lines = Vec::new();

    for (idx, raw) in src.lines().enumerate() {
        let line_no = idx + 1;
        let text = raw.trim();

        let leading_closers = text
            .chars()
            .take_while(|c| matches!(c, ')' | '}' | ']'))
            .count();
        let depth = stack.len().saturating_sub(leading_closers);
        let in_struct = depth > 0 && stack[depth - 1].1 == Block::Struct;

        for (pos, delimiter) in scan_delimiters(text, line_no)? {
            match delimiter {
                '(' | '[' => stack.push((delimiter, Block::Other)),
                '{' => {
                    let block = if text[..pos].trim_end().ends_with("struct") {
                        Block::Struct
                    } else {
                        Block::Other
                    };
                    stack.push((delimiter, block));
                }
                _ => match stack.pop() {
                    Some((open, _)) if matching_close(open) == delimiter => {}
                    _ => {
                        return Err(FormatError::UnexpectedClose {
                            delimiter,
                            line: line_no,
                        })
                    }
                },
            }
        }

        lines.push(Line {
            depth,
            text: text.to_string(),
            in_struct,
        });
    }

    if let Some((delimiter, _)) = stack.last() {
        return Err(FormatError::Unclosed {
            delimiter: *delimiter,
        });
    }

    Ok(lines)
}

fn matching_close(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Positions of brackets outside of string/rune literals and comments
fn scan_delimiters(text: &str, line: usize) -> Result<Vec<(usize, char)>, FormatError> {
    let mut found = Vec::new();
    let mut chars = text.char_indices();

    while let Some((pos, c)) = chars.next() {
        match c {
            '"' | '\'' | '`' => {
                let mut closed = false;
                while let Some((_, d)) = chars.next() {
                    if d == '\\' && c != '`' {
                        chars.next();
                    } else if d == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(FormatError::UnterminatedLiteral { line });
                }
            }
            '/' if text[pos..].starts_with("//") => break,
            '(' | ')' | '{' | '}' | '[' | ']' => found.push((pos, c)),
            _ => {}
        }
    }

    Ok(found)
}

/// Drop leading and trailing blank lines, blank lines right inside a block
/// and repeated blank lines
fn collapse_blank_lines(lines: Vec<Line>) -> Vec<Line> {
    let mut kept: Vec<Line> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.is_blank() {
            match kept.last() {
                None => continue,
                Some(prev) if prev.is_blank() || prev.opens_block() => continue,
                _ => {}
            }
        } else if line.closes_block() && kept.last().is_some_and(Line::is_blank) {
            kept.pop();
        }
        kept.push(line);
    }

    while kept.last().is_some_and(Line::is_blank) {
        kept.pop();
    }
    kept
}

/// Split a struct field line into name, type and optional tag
fn field_cells(line: &Line) -> Option<(&str, &str, Option<&str>)> {
    if !line.in_struct || line.text.starts_with("//") {
        return None;
    }

    let (name, rest) = line.text.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();

    match rest.find('`') {
        Some(tag_start) => {
            let ty = rest[..tag_start].trim_end();
            if ty.is_empty() {
                return None;
            }
            Some((name, ty, Some(&rest[tag_start..])))
        }
        None if rest.is_empty() => None,
        None => Some((name, rest, None)),
    }
}

/// Write a run of consecutive fields with name and type columns padded to
/// a common width
fn write_aligned(out: &mut String, run: &[Line]) {
    let cells: Vec<_> = run.iter().filter_map(field_cells).collect();
    let name_width = cells.iter().map(|(name, _, _)| width(name)).max().unwrap_or(0);

    // The type column only spans consecutive fields that carry a tag
    let mut type_widths = vec![0; cells.len()];
    let mut i = 0;
    while i < cells.len() {
        if cells[i].2.is_none() {
            i += 1;
            continue;
        }
        let start = i;
        while i < cells.len() && cells[i].2.is_some() {
            i += 1;
        }
        let max = cells[start..i].iter().map(|(_, ty, _)| width(ty)).max().unwrap_or(0);
        type_widths[start..i].fill(max);
    }

    for ((line, (name, ty, tag)), type_width) in run.iter().zip(&cells).zip(type_widths) {
        let mut text = pad(name, name_width);
        text.push_str(ty);
        if let Some(tag) = tag {
            text.push_str(&" ".repeat(type_width - width(ty) + 1));
            text.push_str(tag);
        }
        write_line(out, line.depth, &text);
    }
}

fn pad(cell: &str, column_width: usize) -> String {
    format!("{}{}", cell, " ".repeat(column_width - width(cell) + 1))
}

fn width(cell: &str) -> usize {
    cell.chars().count()
}

fn write_line(out: &mut String, depth: usize, text: &str) {
    if !text.is_empty() {
        for _ in 0..depth {
            out.push('\t');
        }
        out.push_str(text);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligns_struct_fields() {
        let src = "package dto\n\nimport (\n\"database/sql\"\n)\n\ntype A struct {\nId int `db:\"id\"`\nOrderId int `db:\"order_id\"`\nNote sql.NullString `db:\"note\"`\n}";
        let expected = "package dto\n\nimport (\n\t\"database/sql\"\n)\n\ntype A struct {\n\tId      int            `db:\"id\"`\n\tOrderId int            `db:\"order_id\"`\n\tNote    sql.NullString `db:\"note\"`\n}\n";

        assert_eq!(format_source(src).unwrap(), expected);
    }

    #[test]
    fn test_blank_line_starts_new_alignment_block() {
        let src = "type A struct {\n  Id int `db:\"id\"`\n\n\n  structable.Recorder\n}\n";
        let expected = "type A struct {\n\tId int `db:\"id\"`\n\n\tstructable.Recorder\n}\n";

        assert_eq!(format_source(src).unwrap(), expected);
    }

    #[test]
    fn test_trims_blank_lines_inside_blocks_and_file() {
        let src = "\n\npackage dto   \n\n\n\ntype A struct {\n\nId int\n\n}\n\n\n";
        let expected = "package dto\n\ntype A struct {\n\tId int\n}\n";

        assert_eq!(format_source(src).unwrap(), expected);
    }

    #[test]
    fn test_braces_inside_tags_are_ignored() {
        let src = "type A struct {\nX string `json:\"{\"`\n}";
        assert_eq!(
            format_source(src).unwrap(),
            "type A struct {\n\tX string `json:\"{\"`\n}\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let src = "package dto\nimport (\n\"time\"\n)\ntype A struct {\nCreatedAt time.Time `db:\"created_at\"`\nId int `db:\"id\"`\n}\n";
        let once = format_source(src).unwrap();
        assert_eq!(format_source(&once).unwrap(), once);
    }

    #[test]
    fn test_unexpected_close() {
        assert_eq!(
            format_source("type A struct {\n}\n}"),
            Err(FormatError::UnexpectedClose {
                delimiter: '}',
                line: 3
            })
        );
    }

    #[test]
    fn test_unclosed_block() {
        assert_eq!(
            format_source("type A struct {\nId int\n"),
            Err(FormatError::Unclosed { delimiter: '{' })
        );
    }

    #[test]
    fn test_unterminated_literal() {
        assert_eq!(
            format_source("type A struct {\nId int `db:\"id\"\n}"),
            Err(FormatError::UnterminatedLiteral { line: 2 })
        );
    }
}
