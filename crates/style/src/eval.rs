use std::cmp::Ordering;

use serde_json::{Map, Value, json};

use crate::color::Rgba;
use crate::expr::{CmpOp, Expr};

/// Per-feature inputs an expression may read.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub properties: &'a Map<String, Value>,
    pub feature_state: Option<&'a Map<String, Value>>,
}

impl<'a> EvalContext<'a> {
    pub fn new(properties: &'a Map<String, Value>) -> Self {
        Self {
            properties,
            feature_state: None,
        }
    }

    pub fn with_feature_state(mut self, state: &'a Map<String, Value>) -> Self {
        self.feature_state = Some(state);
        self
    }
}

impl Expr {
    /// Evaluates the expression the way the renderer would for one feature.
    ///
    /// Type errors the renderer would raise (a non-numeric interpolation input,
    /// for example) evaluate to `null`, which is what a blank feature looks like.
    pub fn eval(&self, ctx: &EvalContext<'_>) -> Value {
        match self {
            Expr::Literal(v) => v.clone(),
            Expr::Get(field) => ctx.properties.get(field).cloned().unwrap_or(Value::Null),
            Expr::Has(field) => Value::Bool(ctx.properties.contains_key(field)),
            Expr::FeatureState(key) => ctx
                .feature_state
                .and_then(|s| s.get(key))
                .cloned()
                .unwrap_or(Value::Null),
            Expr::Coalesce(items) => items
                .iter()
                .map(|e| e.eval(ctx))
                .find(|v| !v.is_null())
                .unwrap_or(Value::Null),
            Expr::ToNumber(v, fallback) => match to_number(&v.eval(ctx)) {
                Some(n) => json!(n),
                None => fallback.eval(ctx),
            },
            Expr::ToBoolean(v, fallback) => match v.eval(ctx) {
                Value::Bool(b) => Value::Bool(b),
                _ => fallback.eval(ctx),
            },
            Expr::ToText(v) => Value::String(to_text(&v.eval(ctx))),
            Expr::Compare(op, a, b) => Value::Bool(compare(*op, &a.eval(ctx), &b.eval(ctx))),
            Expr::All(items) => Value::Bool(items.iter().all(|e| truthy(&e.eval(ctx)))),
            Expr::Max(a, b) => match (a.eval(ctx).as_f64(), b.eval(ctx).as_f64()) {
                (Some(x), Some(y)) => json!(x.max(y)),
                _ => Value::Null,
            },
            Expr::Case { branches, fallback } => branches
                .iter()
                .find(|(cond, _)| truthy(&cond.eval(ctx)))
                .map(|(_, value)| value.eval(ctx))
                .unwrap_or_else(|| fallback.eval(ctx)),
            Expr::Match {
                input,
                arms,
                fallback,
            } => {
                let key = input.eval(ctx);
                let key = key.as_str();
                arms.iter()
                    .find(|(label, _)| Some(label.as_str()) == key)
                    .map(|(_, value)| value.eval(ctx))
                    .unwrap_or_else(|| fallback.eval(ctx))
            }
            Expr::Interpolate { input, stops } => match input.eval(ctx).as_f64() {
                Some(x) => interpolate(x, stops, ctx),
                None => Value::Null,
            },
        }
    }
}

fn interpolate(x: f64, stops: &[(f64, Expr)], ctx: &EvalContext<'_>) -> Value {
    let Some((first_at, first)) = stops.first() else {
        return Value::Null;
    };
    if x <= *first_at {
        return first.eval(ctx);
    }
    for pair in stops.windows(2) {
        let (lo_at, lo) = &pair[0];
        let (hi_at, hi) = &pair[1];
        if x > *hi_at {
            continue;
        }
        let t = if hi_at > lo_at {
            (x - lo_at) / (hi_at - lo_at)
        } else {
            1.0
        };
        return blend(&lo.eval(ctx), &hi.eval(ctx), t);
    }
    stops
        .last()
        .map(|(_, last)| last.eval(ctx))
        .unwrap_or(Value::Null)
}

fn blend(lo: &Value, hi: &Value, t: f64) -> Value {
    if let (Some(a), Some(b)) = (lo.as_f64(), hi.as_f64()) {
        return json!(a + (b - a) * t);
    }
    if let (Some(a), Some(b)) = (lo.as_str(), hi.as_str())
        && let (Ok(ca), Ok(cb)) = (Rgba::parse(a), Rgba::parse(b))
    {
        return Value::String(ca.lerp(cb, t).to_css());
    }
    Value::Null
}

fn to_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn to_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn truthy(v: &Value) -> bool {
    matches!(v, Value::Bool(true))
}

fn compare(op: CmpOp, a: &Value, b: &Value) -> bool {
    let ord = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    };
    match op {
        CmpOp::Eq => ord == Some(Ordering::Equal) || (ord.is_none() && a == b),
        CmpOp::Ne => !(ord == Some(Ordering::Equal) || (ord.is_none() && a == b)),
        CmpOp::Lt => ord == Some(Ordering::Less),
        CmpOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        CmpOp::Gt => ord == Some(Ordering::Greater),
        CmpOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
    }
}

#[cfg(test)]
mod tests {
    use super::EvalContext;
    use crate::expr::{CmpOp, Expr};
    use serde_json::{Map, Value, json};

    fn props(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn coalesce_skips_missing_fields() {
        let p = props(json!({"b": 2}));
        let e = Expr::Coalesce(vec![Expr::get("a"), Expr::get("b"), Expr::num(9.0)]);
        assert_eq!(e.eval(&EvalContext::new(&p)), json!(2));
    }

    #[test]
    fn interpolate_clamps_and_blends() {
        let e = Expr::Interpolate {
            input: Box::new(Expr::get("v")),
            stops: vec![(0.0, Expr::num(10.0)), (10.0, Expr::num(20.0))],
        };
        let at = |v: f64| {
            let p = props(json!({ "v": v }));
            e.eval(&EvalContext::new(&p)).as_f64()
        };
        assert_eq!(at(-5.0), Some(10.0));
        assert_eq!(at(5.0), Some(15.0));
        assert_eq!(at(50.0), Some(20.0));
    }

    #[test]
    fn interpolate_blends_colors() {
        let e = Expr::Interpolate {
            input: Box::new(Expr::get("v")),
            stops: vec![(0.0, Expr::text("#000000")), (10.0, Expr::text("#ffffff"))],
        };
        let p = props(json!({ "v": 5.0 }));
        let v = e.eval(&EvalContext::new(&p));
        assert_eq!(v, json!("rgba(128, 128, 128, 1)"));
    }

    #[test]
    fn interpolate_on_missing_input_is_null() {
        let e = Expr::Interpolate {
            input: Box::new(Expr::get("v")),
            stops: vec![(0.0, Expr::num(1.0))],
        };
        let p = Map::new();
        assert_eq!(e.eval(&EvalContext::new(&p)), Value::Null);
    }

    #[test]
    fn match_uses_fallback_for_unknown_labels() {
        let e = Expr::Match {
            input: Box::new(Expr::get("k")),
            arms: vec![("a".into(), Expr::text("#111111"))],
            fallback: Box::new(Expr::text("#999999")),
        };
        let hit = props(json!({"k": "a"}));
        let miss = props(json!({"k": "z"}));
        assert_eq!(e.eval(&EvalContext::new(&hit)), json!("#111111"));
        assert_eq!(e.eval(&EvalContext::new(&miss)), json!("#999999"));
    }

    #[test]
    fn feature_state_reads_hover() {
        let e = Expr::ToBoolean(
            Box::new(Expr::FeatureState("hover".into())),
            Box::new(Expr::boolean(false)),
        );
        let p = Map::new();
        let state = props(json!({"hover": true}));
        assert_eq!(e.eval(&EvalContext::new(&p)), json!(false));
        assert_eq!(
            e.eval(&EvalContext::new(&p).with_feature_state(&state)),
            json!(true)
        );
    }

    #[test]
    fn compare_is_numeric_and_never_coerces() {
        let p = props(json!({"n": 10}));
        let c = Expr::cmp(CmpOp::Ge, Expr::get("n"), Expr::num(10.0));
        assert_eq!(c.eval(&EvalContext::new(&p)), json!(true));
        let mixed = Expr::cmp(CmpOp::Lt, Expr::get("n"), Expr::text("10"));
        assert_eq!(mixed.eval(&EvalContext::new(&p)), json!(false));
    }

    #[test]
    fn to_text_formats_integers_plainly() {
        let e = Expr::ToText(Box::new(Expr::get("n")));
        let p = props(json!({"n": 42.0}));
        assert_eq!(e.eval(&EvalContext::new(&p)), json!("42"));
    }
}
