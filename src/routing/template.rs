//! Route template parsing.
//!
//! # Responsibilities
//! - Split a template such as `/api/users/{id:int}` into segments
//! - Parse `{name}` / `{name:constraint}` placeholders into typed constraints
//! - Reject malformed templates when the endpoint is registered
//!
//! # Constraint Grammar
//! ```text
//! bare:    int | bool | string | double | float | any | required | alpha
//! unary:   min(n) | max(n) | minlength(n) | maxlength(n)
//! binary:  range(a,b) | length(a,b)
//! pattern: regex(<pattern>)
//! ```
//! An unrecognized bare word (or no constraint at all) means `Any`. An unknown
//! `name(...)` function is an error.

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::routing::error::RouteError;

/// Regex constraint pattern, anchored so it matches whole segments only.
///
/// Equality and hashing use the source text, so two `regex(\d+)` segments
/// land in the same routing node.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

/// Constraint attached to a route parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Int,
    Bool,
    Float,
    Double,
    Any,
    Required,
    Alpha,
    MinLength(usize),
    MaxLength(usize),
    Min(i64),
    Max(i64),
    Range(i64, i64),
    Length(usize, usize),
    Regex(Pattern),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Int => write!(f, "int"),
            Constraint::Bool => write!(f, "bool"),
            Constraint::Float => write!(f, "float"),
            Constraint::Double => write!(f, "double"),
            Constraint::Any => write!(f, "any"),
            Constraint::Required => write!(f, "required"),
            Constraint::Alpha => write!(f, "alpha"),
            Constraint::MinLength(n) => write!(f, "minlength({})", n),
            Constraint::MaxLength(n) => write!(f, "maxlength({})", n),
            Constraint::Min(n) => write!(f, "min({})", n),
            Constraint::Max(n) => write!(f, "max({})", n),
            Constraint::Range(lo, hi) => write!(f, "range({},{})", lo, hi),
            Constraint::Length(lo, hi) => write!(f, "length({},{})", lo, hi),
            Constraint::Regex(pattern) => write!(f, "regex({})", pattern.as_str()),
        }
    }
}

/// One segment of a parsed route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param { name: String, constraint: Constraint },
}

/// Structural identity of a segment: parameter names are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentShape {
    Literal(String),
    Param(Constraint),
}

impl Segment {
    pub fn shape(&self) -> SegmentShape {
        match self {
            Segment::Literal(value) => SegmentShape::Literal(value.clone()),
            Segment::Param { constraint, .. } => SegmentShape::Param(constraint.clone()),
        }
    }

    /// Parameter name, if this is a parameter segment.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Param { name, .. } => Some(name),
            Segment::Literal(_) => None,
        }
    }

    fn parse(raw: &str) -> Result<Self, RouteError> {
        let Some(inner) = raw
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        else {
            return Ok(Segment::Literal(raw.to_string()));
        };

        let name_len = inner
            .find(|c: char| !is_word_char(c))
            .unwrap_or(inner.len());
        if name_len == 0 {
            return Ok(Segment::Literal(raw.to_string()));
        }

        let (name, rest) = inner.split_at(name_len);
        let constraint = match rest.strip_prefix(':') {
            Some(text) => parse_constraint(raw, text)?,
            None => Constraint::Any,
        };

        Ok(Segment::Param {
            name: name.to_string(),
            constraint,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(value) => write!(f, "{}", value),
            Segment::Param { name, constraint } => write!(f, "{{{}:{}}}", name, constraint),
        }
    }
}

/// A parsed route template, e.g. `/api/users/{id:int}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parse a template string.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let Some(path) = template.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash {
                template: template.to_string(),
            });
        };

        let segments = path
            .split('/')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_constraint(segment: &str, text: &str) -> Result<Constraint, RouteError> {
    match text {
        "int" => return Ok(Constraint::Int),
        "bool" => return Ok(Constraint::Bool),
        "float" => return Ok(Constraint::Float),
        "double" => return Ok(Constraint::Double),
        "string" | "any" => return Ok(Constraint::Any),
        "required" => return Ok(Constraint::Required),
        "alpha" => return Ok(Constraint::Alpha),
        _ => {}
    }

    let Some(open) = text.find('(') else {
        return Ok(Constraint::Any);
    };
    let function = &text[..open];
    if function.is_empty() || !function.chars().all(is_word_char) {
        return Ok(Constraint::Any);
    }

    let invalid = |reason: &str| RouteError::InvalidArgument {
        segment: segment.to_string(),
        function: function.to_string(),
        reason: reason.to_string(),
    };

    let Some(args) = text[open + 1..].strip_suffix(')') else {
        return Err(invalid("missing closing parenthesis"));
    };

    match function {
        "regex" => Pattern::new(args)
            .map(Constraint::Regex)
            .map_err(|e| RouteError::InvalidRegex {
                segment: segment.to_string(),
                reason: e.to_string(),
            }),
        "min" => Ok(Constraint::Min(parse_number(args).ok_or_else(|| invalid("expected a non-negative integer"))?)),
        "max" => Ok(Constraint::Max(parse_number(args).ok_or_else(|| invalid("expected a non-negative integer"))?)),
        "minlength" | "maxlength" => {
            let n: usize = parse_number(args).ok_or_else(|| invalid("expected a non-negative integer"))?;
            if n < 1 {
                return Err(invalid("length must be at least 1"));
            }
            Ok(if function == "minlength" {
                Constraint::MinLength(n)
            } else {
                Constraint::MaxLength(n)
            })
        }
        "range" | "length" => {
            let (lo, hi) = args
                .split_once(',')
                .ok_or_else(|| invalid("expected two arguments"))?;
            let lo: usize = parse_number(lo).ok_or_else(|| invalid("expected a non-negative integer"))?;
            let hi: usize = parse_number(hi).ok_or_else(|| invalid("expected a non-negative integer"))?;
            if lo < 1 || hi < lo {
                return Err(invalid("bounds must satisfy 1 <= a <= b"));
            }
            if function == "length" {
                Ok(Constraint::Length(lo, hi))
            } else {
                let lo = i64::try_from(lo).map_err(|_| invalid("argument out of range"))?;
                let hi = i64::try_from(hi).map_err(|_| invalid("argument out of range"))?;
                Ok(Constraint::Range(lo, hi))
            }
        }
        _ => Err(RouteError::UnknownConstraint {
            segment: segment.to_string(),
            function: function.to_string(),
        }),
    }
}

/// Digits only: no sign, no whitespace.
fn parse_number<N: std::str::FromStr>(text: &str) -> Option<N> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
