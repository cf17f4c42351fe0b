//! Typed views over comma-separated employee and department lines.
//!
//! Parsing is total: a line either produces a well-typed record or [`Parsed::Invalid`]. Pipelines
//! skip invalid lines rather than failing, since batch inputs are expected to contain the
//! occasional dirty line. Each call to [`parse`] is a pure function of its input; there is no
//! parser state to share or reset between records.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

/// A record with a fixed number of comma-separated fields.
pub trait Record: Sized {
    /// Number of fields a well-formed line splits into.
    const FIELDS: usize;
    /// Name used in diagnostics.
    const NAME: &'static str;
    /// Builds the record from exactly `FIELDS` fields, or `None` if a numeric field is malformed.
    fn from_fields(fields: &[&str]) -> Option<Self>;
}

/// The outcome of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parsed<R> {
    /// A well-formed record.
    Valid(R),
    /// The line had the wrong arity or a non-integer numeric field.
    Invalid,
}

impl<R> Parsed<R> {
    /// True for well-formed records.
    pub fn is_valid(&self) -> bool {
        matches!(self, Parsed::Valid(_))
    }
    /// The record, if the line was well formed.
    pub fn valid(self) -> Option<R> {
        match self {
            Parsed::Valid(record) => Some(record),
            Parsed::Invalid => None,
        }
    }
}

/// Parses `line` as a record of type `R`.
///
/// Trailing empty fields are discarded before the arity check, so `"10,"` is a one-field line.
pub fn parse<R: Record>(line: &str) -> Parsed<R> {
    let mut fields: Vec<&str> = line.split(',').collect();
    while fields.len() > 1 && fields.last() == Some(&"") {
        fields.pop();
    }
    if fields.len() != R::FIELDS {
        debug!("{}: expected {} fields, found {}: {:?}", R::NAME, R::FIELDS, fields.len(), line);
        return Parsed::Invalid;
    }
    match R::from_fields(&fields) {
        Some(record) => Parsed::Valid(record),
        None => {
            debug!("{}: malformed numeric field: {:?}", R::NAME, line);
            Parsed::Invalid
        }
    }
}

/// Parses each line, silently dropping the invalid ones.
pub fn parse_valid<R, I>(lines: I) -> impl Iterator<Item = R>
where
    R: Record,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    lines.into_iter().filter_map(|line| parse::<R>(line.as_ref()).valid())
}

/// A primary (fact) record: `id,name,age,salary,department_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Employee {
    /// Employee identifier.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: i32,
    /// Salary.
    pub salary: i32,
    /// Foreign key into the department table; the grouping field.
    pub department_id: i32,
}

impl Employee {
    /// Parses an employee line.
    pub fn parse(line: &str) -> Parsed<Self> {
        parse(line)
    }
}

impl Record for Employee {
    const FIELDS: usize = 5;
    const NAME: &'static str = "employee";
    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Employee {
            id: fields[0].parse().ok()?,
            name: fields[1].to_string(),
            age: fields[2].parse().ok()?,
            salary: fields[3].parse().ok()?,
            department_id: fields[4].parse().ok()?,
        })
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{},{}", self.id, self.name, self.age, self.salary, self.department_id)
    }
}

/// A dimension record: `department_id,name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Department {
    /// Department identifier; the grouping field.
    pub id: i32,
    /// Department name.
    pub name: String,
}

impl Department {
    /// Parses a department line.
    pub fn parse(line: &str) -> Parsed<Self> {
        parse(line)
    }
}

impl Record for Department {
    const FIELDS: usize = 2;
    const NAME: &'static str = "department";
    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Department {
            id: fields[0].parse().ok()?,
            name: fields[1].to_string(),
        })
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_fields() {
        let expected = Employee { id: 1, name: "Alice".to_string(), age: 30, salary: 50000, department_id: 2 };
        assert_eq!(Employee::parse("1,Alice,30,50000,2"), Parsed::Valid(expected));
    }

    #[test]
    fn malformed_lines_are_invalid() {
        assert_eq!(Employee::parse("1,Alice,bad,50000,2"), Parsed::Invalid);
        assert_eq!(Employee::parse("1,Alice,30,50000"), Parsed::Invalid);
        assert_eq!(Employee::parse("1,Alice,30,50000,2,9"), Parsed::Invalid);
        assert_eq!(Employee::parse(""), Parsed::Invalid);
        assert_eq!(Department::parse("x,Sales"), Parsed::Invalid);
        assert_eq!(Department::parse("10,"), Parsed::Invalid);
        assert_eq!(Department::parse("10"), Parsed::Invalid);
    }

    #[test]
    fn empty_inner_field_is_kept() {
        let parsed = Department::parse("10,,").valid();
        assert_eq!(parsed, None);
        let parsed = Employee::parse("3,,41,1000,10").valid().unwrap();
        assert_eq!(parsed.name, "");
    }

    #[test]
    fn rendering_reparses() {
        for line in ["1,Alice,30,50000,2", "-4,Bob,0,+7,10", "10,Sales", "20,Research and Development"] {
            match (Employee::parse(line), Department::parse(line)) {
                (Parsed::Valid(e), _) => assert_eq!(Employee::parse(&e.to_string()), Parsed::Valid(e)),
                (_, Parsed::Valid(d)) => assert_eq!(Department::parse(&d.to_string()), Parsed::Valid(d)),
                _ => panic!("expected {:?} to parse", line),
            }
        }
    }

    #[test]
    fn parse_valid_skips() {
        let lines = ["1,Alice,30,50000,2", "garbage", "2,Bob,40,60000,2"];
        let ids: Vec<i32> = parse_valid::<Employee, _>(lines).map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
