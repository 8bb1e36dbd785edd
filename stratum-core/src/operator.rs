//! Comparison operators for WHERE conditions

use crate::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Type-safe comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operator(&'static str);

impl Operator {
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("!=");
    pub const GT: Self = Operator(">");
    pub const LT: Self = Operator("<");
    pub const GTE: Self = Operator(">=");
    pub const LTE: Self = Operator("<=");
    pub const LIKE: Self = Operator("LIKE");
    pub const NOT_LIKE: Self = Operator("NOT LIKE");
    pub const IN: Self = Operator("IN");
    pub const NOT_IN: Self = Operator("NOT IN");
    pub const IS_NULL: Self = Operator("IS NULL");
    pub const IS_NOT_NULL: Self = Operator("IS NOT NULL");

    const KNOWN: [Operator; 12] = [
        Operator::EQ,
        Operator::NEQ,
        Operator::GT,
        Operator::LT,
        Operator::GTE,
        Operator::LTE,
        Operator::LIKE,
        Operator::NOT_LIKE,
        Operator::IN,
        Operator::NOT_IN,
        Operator::IS_NULL,
        Operator::IS_NOT_NULL,
    ];

    /// Create a custom operator for dialect-specific comparisons
    ///
    /// # Examples
    /// ```
    /// use stratum_core::Operator;
    ///
    /// let regexp = Operator::custom("REGEXP");
    /// assert_eq!(regexp.as_str(), "REGEXP");
    /// ```
    pub const fn custom(op: &'static str) -> Self {
        Operator(op)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// `IS NULL` and `IS NOT NULL` compare against nothing
    pub fn takes_value(&self) -> bool {
        !matches!(*self, Operator::IS_NULL | Operator::IS_NOT_NULL)
    }

    /// `IN` and `NOT IN` compare against a parenthesized list
    pub fn is_list(&self) -> bool {
        matches!(*self, Operator::IN | Operator::NOT_IN)
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::EQ
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized == "<>" {
            return Ok(Operator::NEQ);
        }
        Operator::KNOWN
            .into_iter()
            .find(|op| op.0.eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| Error::invalid_argument(format!("Unknown operator '{}'", s)))
    }
}

/// Trait for types that can be converted to comparison operators
pub trait IntoOperator {
    fn into_operator(self) -> Operator;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Operator {
        self
    }
}

/// String literals for the common operators; unknown strings panic
///
/// Use [`str::parse`] when the operator comes from untrusted input.
impl IntoOperator for &str {
    fn into_operator(self) -> Operator {
        match self.parse() {
            Ok(op) => op,
            Err(_) => panic!(
                "Unknown operator '{}'. Use Operator::{} constants or Operator::custom(\"{}\") for custom operators.",
                self,
                self.to_uppercase().replace(' ', "_").replace('!', "N"),
                self
            ),
        }
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const GT: Operator = Operator::GT;
    pub const LT: Operator = Operator::LT;
    pub const GTE: Operator = Operator::GTE;
    pub const LTE: Operator = Operator::LTE;
    pub const LIKE: Operator = Operator::LIKE;
    pub const NOT_LIKE: Operator = Operator::NOT_LIKE;
    pub const IN: Operator = Operator::IN;
    pub const NOT_IN: Operator = Operator::NOT_IN;
    pub const IS_NULL: Operator = Operator::IS_NULL;
    pub const IS_NOT_NULL: Operator = Operator::IS_NOT_NULL;
}
