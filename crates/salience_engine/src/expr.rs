//! Predicate expressions for slot tests.
//!
//! A slot test captures a slot value into a variable and then evaluates a
//! boolean expression over the bindings, e.g. `?sbp&:(< ?sbp 90)`.

use std::collections::BTreeSet;
use std::fmt;

use salience_foundation::{Error, Result, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pattern::Bindings;

/// Comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Eq,
    /// `!=`
    Ne,
}

impl CmpOp {
    /// Returns true for operators that require ordered (numeric) operands.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }
}

/// A predicate expression over variable bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// Reference to a bound variable.
    Var(String),
    /// Constant value.
    Const(Value),
    /// Binary comparison.
    Compare {
        /// The operator.
        op: CmpOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Conjunction (short-circuits).
    And(Vec<Expr>),
    /// Disjunction (short-circuits).
    Or(Vec<Expr>),
    /// Negation.
    Not(Box<Expr>),
}

impl Expr {
    /// Variable reference.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Constant.
    #[must_use]
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Const(value.into())
    }

    fn compare(self, op: CmpOp, rhs: impl Into<Expr>) -> Self {
        Self::Compare {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    /// `(< self rhs)`
    #[must_use]
    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Lt, rhs)
    }

    /// `(<= self rhs)`
    #[must_use]
    pub fn le(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Le, rhs)
    }

    /// `(> self rhs)`
    #[must_use]
    pub fn gt(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Gt, rhs)
    }

    /// `(>= self rhs)`
    #[must_use]
    pub fn ge(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Ge, rhs)
    }

    /// `(= self rhs)`
    #[must_use]
    pub fn eq(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Eq, rhs)
    }

    /// `(!= self rhs)`
    #[must_use]
    pub fn ne(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CmpOp::Ne, rhs)
    }

    /// `(and self other)`
    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        match self {
            Self::And(mut terms) => {
                terms.push(other);
                Self::And(terms)
            }
            lhs => Self::And(vec![lhs, other]),
        }
    }

    /// `(or self other)`
    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        match self {
            Self::Or(mut terms) => {
                terms.push(other);
                Self::Or(terms)
            }
            lhs => Self::Or(vec![lhs, other]),
        }
    }

    /// `(not self)`
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Returns every variable the expression references.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables<'a>(&'a self, vars: &mut BTreeSet<&'a str>) {
        match self {
            Self::Var(name) => {
                vars.insert(name.as_str());
            }
            Self::Const(_) => {}
            Self::Compare { lhs, rhs, .. } => {
                lhs.collect_variables(vars);
                rhs.collect_variables(vars);
            }
            Self::And(terms) | Self::Or(terms) => {
                for term in terms {
                    term.collect_variables(vars);
                }
            }
            Self::Not(inner) => inner.collect_variables(vars),
        }
    }

    /// Evaluates the expression.
    ///
    /// # Errors
    /// Returns `UnboundVariable` for a missing binding, or
    /// `PredicateEvaluation` when an operator receives operands of the
    /// wrong type (ordering on non-integers, logic on non-booleans).
    pub fn evaluate(&self, bindings: &Bindings) -> Result<Value> {
        match self {
            Self::Var(name) => bindings
                .get(name)
                .cloned()
                .ok_or_else(|| Error::unbound_variable(name)),
            Self::Const(value) => Ok(value.clone()),
            Self::Compare { op, lhs, rhs } => {
                let l = lhs.evaluate(bindings)?;
                let r = rhs.evaluate(bindings)?;
                compare(*op, &l, &r).map(Value::Bool)
            }
            Self::And(terms) => {
                for term in terms {
                    if !term.test(bindings)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Self::Or(terms) => {
                for term in terms {
                    if term.test(bindings)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Self::Not(inner) => Ok(Value::Bool(!inner.test(bindings)?)),
        }
    }

    /// Evaluates the expression as a boolean test.
    ///
    /// # Errors
    /// As [`Expr::evaluate`], plus `PredicateEvaluation` if the result is
    /// not a yes/no value.
    pub fn test(&self, bindings: &Bindings) -> Result<bool> {
        match self.evaluate(bindings)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::predicate(format!(
                "{self} evaluated to {other} ({}), expected yes/no",
                other.value_type()
            ))),
        }
    }
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> Result<bool> {
    if op.is_ordering() {
        let (Some(a), Some(b)) = (l.as_int(), r.as_int()) else {
            return Err(Error::predicate(format!(
                "cannot apply {} to {l} ({}) and {r} ({})",
                op.symbol(),
                l.value_type(),
                r.value_type()
            )));
        };
        return Ok(match op {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            _ => a >= b,
        });
    }
    Ok((l == r) == (op == CmpOp::Eq))
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Const(value)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Self::Const(Value::Int(n))
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Self::Const(Value::from(n))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Self::Const(Value::Bool(b))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "?{name}"),
            Self::Const(value) => write!(f, "{value}"),
            Self::Compare { op, lhs, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
            Self::And(terms) | Self::Or(terms) => {
                let head = if matches!(self, Self::And(_)) { "and" } else { "or" };
                write!(f, "({head}")?;
                for term in terms {
                    write!(f, " {term}")?;
                }
                write!(f, ")")
            }
            Self::Not(inner) => write!(f, "(not {inner})"),
        }
    }
}
