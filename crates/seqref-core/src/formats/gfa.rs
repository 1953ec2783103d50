//! GFA 1 reader: `S` lines become segments, `L` lines become links.
//! Header and comment lines are skipped; other line types pass through as
//! unknown records.

use super::LineSource;
use crate::stream::RecordStream;
use crate::{Orientation, Record, SeqRefError};
use std::io::BufRead;

/// `None` for an absent overlap: `*`, empty, or a CIGAR whose operations all
/// have length zero (`0M`).
fn parse_overlap(field: Option<&str>) -> Option<String> {
    let field = field?.trim();
    if field.is_empty() || field == "*" {
        return None;
    }
    let zero_length = field
        .split(|c: char| c.is_ascii_alphabetic() || c == '=')
        .filter(|len| !len.is_empty())
        .all(|len| len.parse::<u64>().is_ok_and(|n| n == 0));
    if zero_length {
        None
    } else {
        Some(field.to_owned())
    }
}

/// Streaming GFA reader.
#[derive(Debug)]
pub struct GfaReader<R> {
    lines: LineSource<R>,
    buf: String,
}

impl<R: BufRead> GfaReader<R> {
    /// Read GFA from `reader`; `path` names the source in errors.
    pub fn new(reader: R, path: impl Into<String>) -> Self {
        Self {
            lines: LineSource::new(reader, path),
            buf: String::new(),
        }
    }

    fn orientation(&self, field: Option<&str>) -> Result<Orientation, SeqRefError> {
        field
            .and_then(Orientation::from_symbol)
            .ok_or_else(|| self.lines.error("link orientation must be '+' or '-'"))
    }

    fn parse_line(&self) -> Result<Option<Record>, SeqRefError> {
        let mut fields = self.buf.split('\t');
        let tag = fields.next().unwrap_or("");

        match tag {
            "" | "H" => Ok(None),
            t if t.starts_with('#') => Ok(None),
            "S" => {
                let name = fields.next().unwrap_or("");
                self.lines.check_name(name)?;
                let bases = match fields.next() {
                    Some("*") | None => Vec::new(),
                    Some(seq) => seq.as_bytes().to_vec(),
                };
                Ok(Some(Record::segment(name, bases)))
            }
            "L" => {
                let from = fields.next().unwrap_or("");
                self.lines.check_name(from)?;
                let from_orientation = self.orientation(fields.next())?;
                let to = fields.next().unwrap_or("");
                self.lines.check_name(to)?;
                let to_orientation = self.orientation(fields.next())?;
                Ok(Some(Record::Link {
                    from: from.to_owned(),
                    from_orientation,
                    to: to.to_owned(),
                    to_orientation,
                    overlap: parse_overlap(fields.next()),
                }))
            }
            other => Ok(Some(Record::Unknown {
                tag: other.to_owned(),
            })),
        }
    }
}

impl<R: BufRead + Send> RecordStream for GfaReader<R> {
    fn source(&self) -> &str {
        self.lines.path()
    }

    fn read_next(&mut self) -> Result<Option<Record>, SeqRefError> {
        while self.lines.next_line(&mut self.buf)? {
            if let Some(record) = self.parse_line()? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}
