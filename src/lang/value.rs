use crate::runtime::fault::FaultKind;
use serde::{Deserialize, Serialize};

/// Runtime value in the Pulsar language.
///
/// Values are the only data that can live on the VM stack, in the constant
/// pool, or in a global slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),

    /// IEEE-754 double.
    Double(f64),

    Boolean(bool),

    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Double(_) => "double",
            Value::Boolean(_) => "bool",
            Value::Null => "null",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Double(_))
    }

    fn is_zero(&self) -> bool {
        match self {
            Value::Integer(n) => *n == 0,
            Value::Double(n) => *n == 0.0,
            _ => false,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Shared shape of the numeric binary operators: Integer with Integer
    /// stays Integer, anything involving a Double promotes to Double.
    fn arithmetic(
        &self,
        rhs: &Value,
        op: &'static str,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, FaultKind> {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(int_op(*a, *b))),
            (Value::Integer(a), Value::Double(b)) => Ok(Value::Double(float_op(*a as f64, *b))),
            (Value::Double(a), Value::Integer(b)) => Ok(Value::Double(float_op(*a, *b as f64))),
            (Value::Double(a), Value::Double(b)) => Ok(Value::Double(float_op(*a, *b))),
            _ => Err(FaultKind::invalid_operands(op, self, rhs)),
        }
    }

    pub fn plus(&self, rhs: &Value) -> Result<Value, FaultKind> {
        self.arithmetic(rhs, "+", i64::wrapping_add, |a, b| a + b)
    }

    pub fn minus(&self, rhs: &Value) -> Result<Value, FaultKind> {
        self.arithmetic(rhs, "-", i64::wrapping_sub, |a, b| a - b)
    }

    pub fn times(&self, rhs: &Value) -> Result<Value, FaultKind> {
        self.arithmetic(rhs, "*", i64::wrapping_mul, |a, b| a * b)
    }

    /// Division. Two Integers divide with truncation toward zero.
    pub fn div(&self, rhs: &Value) -> Result<Value, FaultKind> {
        if self.is_numeric() && rhs.is_zero() {
            return Err(FaultKind::DivisionByZero);
        }
        self.arithmetic(rhs, "/", i64::wrapping_div, |a, b| a / b)
    }

    pub fn rem(&self, rhs: &Value) -> Result<Value, FaultKind> {
        if self.is_numeric() && rhs.is_zero() {
            return Err(FaultKind::ModuloByZero);
        }
        self.arithmetic(rhs, "%", i64::wrapping_rem, |a, b| a % b)
    }

    pub fn negate(&self) -> Result<Value, FaultKind> {
        match self {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            Value::Double(n) => Ok(Value::Double(-n)),
            other => Err(FaultKind::invalid_operand("-", other)),
        }
    }

    pub fn not(&self) -> Result<Value, FaultKind> {
        match self {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(FaultKind::invalid_operand("!", other)),
        }
    }

    /// Language-level `==`.
    ///
    /// Numbers compare by value across Integer and Double; Boolean and Null
    /// only equal themselves.
    pub fn equals(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    pub fn compare_greater(&self, rhs: &Value) -> Result<Value, FaultKind> {
        self.compare(rhs, ">", |o| o.is_gt())
    }

    pub fn compare_lesser(&self, rhs: &Value) -> Result<Value, FaultKind> {
        self.compare(rhs, "<", |o| o.is_lt())
    }

    fn compare(
        &self,
        rhs: &Value,
        op: &'static str,
        test: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value, FaultKind> {
        let ordering = match (self, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => return Err(FaultKind::invalid_operands(op, self, rhs)),
            },
        };
        // NaN compares false both ways
        Ok(Value::Boolean(ordering.is_some_and(test)))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Double(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{:.1}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}
