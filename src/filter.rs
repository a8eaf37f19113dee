use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api;
use crate::error::Error;

/// Grammar of a filter expression: a property name, then optionally
/// whitespace and an operator. A missing operator means equality.
static FILTER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\S+)(\s+(<=|>=|==|<|>|=)\s*)?$").unwrap());

/// A filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `=` (also written `==`)
    Equal,
}

impl Operator {
    /// Is this one of the four inequality operators ?
    pub fn is_inequality(self) -> bool {
        !matches!(self, Operator::Equal)
    }

    pub(crate) fn to_wire(self) -> api::query::Operator {
        match self {
            Operator::LessThan => api::query::Operator::LessThan,
            Operator::LessThanOrEqual => api::query::Operator::LessThanOrEqual,
            Operator::GreaterThan => api::query::Operator::GreaterThan,
            Operator::GreaterThanOrEqual => api::query::Operator::GreaterThanOrEqual,
            Operator::Equal => api::query::Operator::Equal,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::Equal => "=",
        };
        f.write_str(text)
    }
}

/// A parsed filter expression: the property name and the comparison
/// operator.
///
/// ```
/// # use datastore3::{FilterExpr, Operator};
/// let expr: FilterExpr = "age >=".parse().unwrap();
/// assert_eq!(expr.property(), "age");
/// assert_eq!(expr.operator(), Operator::GreaterThanOrEqual);
///
/// let implied: FilterExpr = "name".parse().unwrap();
/// assert_eq!(implied.operator(), Operator::Equal);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterExpr {
    property: String,
    operator: Operator,
}

impl FilterExpr {
    /// Builds an expression from its parts.
    pub fn new(property: impl Into<String>, operator: Operator) -> FilterExpr {
        FilterExpr {
            property: property.into(),
            operator,
        }
    }

    /// The filtered property's name.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }
}

impl FromStr for FilterExpr {
    type Err = Error;

    fn from_str(text: &str) -> Result<FilterExpr, Error> {
        let captures = FILTER_REGEX
            .captures(text)
            .ok_or_else(|| Error::BadFilter(format!("could not parse filter string: {text:?}")))?;
        let property = captures.get(1).unwrap().as_str().to_string();
        let operator = match captures.get(3).map(|m| m.as_str()) {
            None | Some("=") | Some("==") => Operator::Equal,
            Some("<") => Operator::LessThan,
            Some("<=") => Operator::LessThanOrEqual,
            Some(">") => Operator::GreaterThan,
            Some(">=") => Operator::GreaterThanOrEqual,
            Some(other) => {
                return Err(Error::BadFilter(format!(
                    "could not parse filter operator: {other:?}"
                )));
            }
        };
        Ok(FilterExpr { property, operator })
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_operator() {
        for (text, op) in [
            ("age <", Operator::LessThan),
            ("age <=", Operator::LessThanOrEqual),
            ("age >", Operator::GreaterThan),
            ("age >=", Operator::GreaterThanOrEqual),
            ("age =", Operator::Equal),
            ("age ==", Operator::Equal),
        ] {
            let expr: FilterExpr = text.parse().unwrap();
            assert_eq!(expr.property(), "age");
            assert_eq!(expr.operator(), op);
        }
    }

    #[test]
    fn missing_operator_defaults_to_equality() {
        let expr: FilterExpr = "  name  ".parse().unwrap();
        assert_eq!(expr.property(), "name");
        assert_eq!(expr.operator(), Operator::Equal);
    }

    #[test]
    fn rejects_unparseable_expressions() {
        for text in ["", "  ", "age ~", "age > 21", "a b <"] {
            assert!(
                matches!(text.parse::<FilterExpr>(), Err(Error::BadFilter(_))),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn display_is_canonical() {
        let expr = FilterExpr::new("age", Operator::GreaterThan);
        assert_eq!(expr.to_string(), "age >");
        assert_eq!("age >".parse::<FilterExpr>().unwrap(), expr);
    }
}
