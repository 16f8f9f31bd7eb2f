//! Segment matching logic.
//!
//! # Responsibilities
//! - Test a single path segment against a compiled constraint
//! - Report a fixed precedence used to order sibling nodes
//!
//! # Design Decisions
//! - Matchers are stateless and shared across concurrent lookups
//! - Numeric parsing is locale independent (`str::parse`)
//! - Precedence only orders siblings; it never changes what a matcher accepts

use std::fmt::Debug;

use crate::routing::template::{Constraint, Pattern, Segment};

/// Sibling ordering weights, higher is tried first.
pub mod precedence {
    pub const LITERAL: u8 = 140;
    pub const BOOL: u8 = 130;
    pub const FLOAT: u8 = 120;
    pub const DOUBLE: u8 = 110;
    pub const INT: u8 = 100;
    pub const REQUIRED: u8 = 90;
    pub const ALPHA: u8 = 80;
    pub const MIN: u8 = 70;
    pub const MAX: u8 = 60;
    pub const RANGE: u8 = 50;
    pub const MIN_LENGTH: u8 = 40;
    pub const MAX_LENGTH: u8 = 30;
    pub const LENGTH: u8 = 20;
    pub const REGEX: u8 = 10;
    pub const ANY: u8 = 0;
}

/// Trait for matching one path segment.
pub trait SegmentMatcher: Send + Sync + Debug {
    /// Returns true if the segment satisfies this matcher.
    fn matches(&self, segment: &str) -> bool;

    fn precedence(&self) -> u8;
}

/// Build the matcher for a template segment.
pub fn compile(segment: &Segment) -> Box<dyn SegmentMatcher> {
    match segment {
        Segment::Literal(value) => Box::new(LiteralMatcher::new(value.clone())),
        Segment::Param { constraint, .. } => match constraint {
            Constraint::Int => Box::new(TypeMatcher::Int),
            Constraint::Bool => Box::new(TypeMatcher::Bool),
            Constraint::Float => Box::new(TypeMatcher::Float),
            Constraint::Double => Box::new(TypeMatcher::Double),
            Constraint::Any => Box::new(AnyMatcher),
            Constraint::Required => Box::new(RequiredMatcher),
            Constraint::Alpha => Box::new(AlphaMatcher),
            Constraint::Min(n) => Box::new(BoundMatcher::min(*n)),
            Constraint::Max(n) => Box::new(BoundMatcher::max(*n)),
            Constraint::Range(lo, hi) => Box::new(BoundMatcher::range(*lo, *hi)),
            Constraint::MinLength(n) => Box::new(LengthMatcher::min(*n)),
            Constraint::MaxLength(n) => Box::new(LengthMatcher::max(*n)),
            Constraint::Length(lo, hi) => Box::new(LengthMatcher::between(*lo, *hi)),
            Constraint::Regex(pattern) => Box::new(RegexMatcher::new(pattern.clone())),
        },
    }
}

/// Exact string equality.
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    value: String,
}

impl LiteralMatcher {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl SegmentMatcher for LiteralMatcher {
    fn matches(&self, segment: &str) -> bool {
        segment == self.value
    }

    fn precedence(&self) -> u8 {
        precedence::LITERAL
    }
}

/// Segment must parse as the given value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMatcher {
    Int,
    Bool,
    Float,
    Double,
}

impl SegmentMatcher for TypeMatcher {
    fn matches(&self, segment: &str) -> bool {
        match self {
            TypeMatcher::Int => segment.parse::<i64>().is_ok(),
            TypeMatcher::Bool => {
                segment.eq_ignore_ascii_case("true")
                    || segment.eq_ignore_ascii_case("false")
                    || segment.parse::<i64>().is_ok()
            }
            TypeMatcher::Float => segment.parse::<f32>().is_ok_and(f32::is_finite),
            TypeMatcher::Double => segment.parse::<f64>().is_ok_and(f64::is_finite),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            TypeMatcher::Int => precedence::INT,
            TypeMatcher::Bool => precedence::BOOL,
            TypeMatcher::Float => precedence::FLOAT,
            TypeMatcher::Double => precedence::DOUBLE,
        }
    }
}

/// Non-empty segment.
#[derive(Debug, Clone, Copy)]
pub struct RequiredMatcher;

impl SegmentMatcher for RequiredMatcher {
    fn matches(&self, segment: &str) -> bool {
        !segment.is_empty()
    }

    fn precedence(&self) -> u8 {
        precedence::REQUIRED
    }
}

/// ASCII letters only.
#[derive(Debug, Clone, Copy)]
pub struct AlphaMatcher;

impl SegmentMatcher for AlphaMatcher {
    fn matches(&self, segment: &str) -> bool {
        !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphabetic())
    }

    fn precedence(&self) -> u8 {
        precedence::ALPHA
    }
}

/// Integer segment within inclusive bounds.
#[derive(Debug, Clone, Copy)]
pub struct BoundMatcher {
    min: Option<i64>,
    max: Option<i64>,
    precedence: u8,
}

impl BoundMatcher {
    pub fn min(min: i64) -> Self {
        Self {
            min: Some(min),
            max: None,
            precedence: precedence::MIN,
        }
    }

    pub fn max(max: i64) -> Self {
        Self {
            min: None,
            max: Some(max),
            precedence: precedence::MAX,
        }
    }

    pub fn range(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            precedence: precedence::RANGE,
        }
    }
}

impl SegmentMatcher for BoundMatcher {
    fn matches(&self, segment: &str) -> bool {
        let Ok(value) = segment.parse::<i64>() else {
            return false;
        };
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn precedence(&self) -> u8 {
        self.precedence
    }
}

/// Raw character count within inclusive bounds.
#[derive(Debug, Clone, Copy)]
pub struct LengthMatcher {
    min: Option<usize>,
    max: Option<usize>,
    precedence: u8,
}

impl LengthMatcher {
    pub fn min(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
            precedence: precedence::MIN_LENGTH,
        }
    }

    pub fn max(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
            precedence: precedence::MAX_LENGTH,
        }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            precedence: precedence::LENGTH,
        }
    }
}

impl SegmentMatcher for LengthMatcher {
    fn matches(&self, segment: &str) -> bool {
        let len = segment.chars().count();
        self.min.map_or(true, |min| len >= min) && self.max.map_or(true, |max| len <= max)
    }

    fn precedence(&self) -> u8 {
        self.precedence
    }
}

/// Full-string regex match.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: Pattern,
}

impl RegexMatcher {
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern }
    }
}

impl SegmentMatcher for RegexMatcher {
    fn matches(&self, segment: &str) -> bool {
        self.pattern.is_match(segment)
    }

    fn precedence(&self) -> u8 {
        precedence::REGEX
    }
}

/// Wildcard.
#[derive(Debug, Clone, Copy)]
pub struct AnyMatcher;

impl SegmentMatcher for AnyMatcher {
    fn matches(&self, _segment: &str) -> bool {
        true
    }

    fn precedence(&self) -> u8 {
        precedence::ANY
    }
}
