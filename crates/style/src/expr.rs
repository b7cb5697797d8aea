use serde::{Serialize, Serializer};
use serde_json::{Value, json};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn operator(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// One typed node of a data-driven style expression.
///
/// This is the only representation of style values in the workspace: layer
/// declarations, paint updates and filters all carry `Expr`, and the engine
/// receives the JSON produced by [`Expr::to_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Scalar literal (number, string, bool or null).
    Literal(Value),
    Get(String),
    Has(String),
    FeatureState(String),
    Coalesce(Vec<Expr>),
    /// `["to-number", value, fallback]`
    ToNumber(Box<Expr>, Box<Expr>),
    /// `["boolean", value, fallback]`
    ToBoolean(Box<Expr>, Box<Expr>),
    ToText(Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    All(Vec<Expr>),
    Max(Box<Expr>, Box<Expr>),
    Case {
        branches: Vec<(Expr, Expr)>,
        fallback: Box<Expr>,
    },
    Match {
        input: Box<Expr>,
        arms: Vec<(String, Expr)>,
        fallback: Box<Expr>,
    },
    /// Linear interpolation; `stops` are sorted by input value.
    Interpolate {
        input: Box<Expr>,
        stops: Vec<(f64, Expr)>,
    },
}

impl Expr {
    pub fn num(v: f64) -> Self {
        Expr::Literal(json!(v))
    }

    pub fn text(v: impl Into<String>) -> Self {
        Expr::Literal(Value::String(v.into()))
    }

    pub fn boolean(v: bool) -> Self {
        Expr::Literal(Value::Bool(v))
    }

    pub fn get(field: impl Into<String>) -> Self {
        Expr::Get(field.into())
    }

    pub fn has(field: impl Into<String>) -> Self {
        Expr::Has(field.into())
    }

    pub fn cmp(op: CmpOp, a: Expr, b: Expr) -> Self {
        Expr::Compare(op, Box::new(a), Box::new(b))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expr::Literal(v) => v.clone(),
            Expr::Get(field) => json!(["get", field]),
            Expr::Has(field) => json!(["has", field]),
            Expr::FeatureState(key) => json!(["feature-state", key]),
            Expr::Coalesce(items) => tagged("coalesce", items.iter().map(Expr::to_json)),
            Expr::ToNumber(v, fallback) => json!(["to-number", v.to_json(), fallback.to_json()]),
            Expr::ToBoolean(v, fallback) => json!(["boolean", v.to_json(), fallback.to_json()]),
            Expr::ToText(v) => json!(["to-string", v.to_json()]),
            Expr::Compare(op, a, b) => json!([op.operator(), a.to_json(), b.to_json()]),
            Expr::All(items) => tagged("all", items.iter().map(Expr::to_json)),
            Expr::Max(a, b) => json!(["max", a.to_json(), b.to_json()]),
            Expr::Case { branches, fallback } => {
                let mut out = vec![json!("case")];
                for (cond, value) in branches {
                    out.push(cond.to_json());
                    out.push(value.to_json());
                }
                out.push(fallback.to_json());
                Value::Array(out)
            }
            Expr::Match {
                input,
                arms,
                fallback,
            } => {
                let mut out = vec![json!("match"), input.to_json()];
                for (label, value) in arms {
                    out.push(json!(label));
                    out.push(value.to_json());
                }
                out.push(fallback.to_json());
                Value::Array(out)
            }
            Expr::Interpolate { input, stops } => {
                let mut out = vec![json!("interpolate"), json!(["linear"]), input.to_json()];
                push_stops(&mut out, stops);
                Value::Array(out)
            }
        }
    }
}

fn tagged(op: &str, items: impl Iterator<Item = Value>) -> Value {
    let mut out = vec![json!(op)];
    out.extend(items);
    Value::Array(out)
}

fn push_stops(out: &mut Vec<Value>, stops: &[(f64, Expr)]) {
    for (at, value) in stops {
        out.push(json!(at));
        out.push(value.to_json());
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::num(v)
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Expr::text(v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Expr::boolean(v)
    }
}
