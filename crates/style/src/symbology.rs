use serde_json::Value;

use crate::StyleError;
use crate::color::Rgba;
use crate::expr::{CmpOp, Expr};

/// Match key substituted for a missing categorical field.
pub const MISSING_KEY: &str = "__missing__";

/// Property the engine's clustering stamps on synthetic cluster features.
pub const POINT_COUNT: &str = "point_count";

/// Point-count breakpoints for cluster radii, as offsets from the base radii.
///
/// `(point_count, base, offset)`: the radius at `point_count` is the chosen
/// base radius (`Mid` or `Max`) plus `offset` pixels.
const CLUSTER_RADIUS_STOPS: &[(f64, RadiusBase, f64)] = &[
    (2.0, RadiusBase::Mid, 2.0),
    (10.0, RadiusBase::Max, 4.0),
    (50.0, RadiusBase::Max, 8.0),
    (200.0, RadiusBase::Max, 12.0),
];

#[derive(Debug, Copy, Clone)]
enum RadiusBase {
    Mid,
    Max,
}

/// `coalesce(get(field), default)`: the safe read every attribute access goes through.
pub fn get_or(field: &str, default: impl Into<Value>) -> Expr {
    Expr::Coalesce(vec![Expr::get(field), Expr::Literal(default.into())])
}

/// Numeric read that survives missing and non-numeric values.
pub fn number_or(field: &str, default: f64) -> Expr {
    Expr::ToNumber(Box::new(get_or(field, default)), Box::new(Expr::num(default)))
}

/// Exact-match color lookup keyed on `field`.
///
/// A missing field is coalesced to [`MISSING_KEY`] before matching, so it
/// resolves to `default_color` instead of an undefined (transparent) result.
pub fn categorical_color(
    field: &str,
    mapping: &[(&str, &str)],
    default_color: &str,
) -> Result<Expr, StyleError> {
    Rgba::parse(default_color)?;
    let mut arms = Vec::with_capacity(mapping.len());
    for (label, color) in mapping {
        Rgba::parse(color)?;
        arms.push(((*label).to_string(), Expr::text(*color)));
    }
    Ok(Expr::Match {
        input: Box::new(Expr::ToText(Box::new(get_or(field, MISSING_KEY)))),
        arms,
        fallback: Box::new(Expr::text(default_color)),
    })
}

/// Piecewise-linear color ramp over a numeric field.
///
/// Breakpoints must be strictly ascending. Out-of-range values clamp to the
/// nearest endpoint; a missing field reads as `default_value`.
pub fn interpolated_color(
    field: &str,
    breakpoints: &[(f64, &str)],
    default_value: f64,
) -> Result<Expr, StyleError> {
    check_ascending(field, breakpoints.iter().map(|(at, _)| *at))?;
    let mut stops = Vec::with_capacity(breakpoints.len());
    for (at, color) in breakpoints {
        Rgba::parse(color)?;
        stops.push((*at, Expr::text(*color)));
    }
    Ok(Expr::Interpolate {
        input: Box::new(number_or(field, default_value)),
        stops,
    })
}

/// Piecewise-linear stroke width over a numeric field.
///
/// A missing field reads as the first breakpoint, i.e. the thinnest stroke.
pub fn interpolated_width(field: &str, breakpoints: &[(f64, f64)]) -> Result<Expr, StyleError> {
    check_ascending(field, breakpoints.iter().map(|(at, _)| *at))?;
    let default_value = breakpoints.first().map(|(at, _)| *at).unwrap_or(0.0);
    Ok(Expr::Interpolate {
        input: Box::new(number_or(field, default_value)),
        stops: breakpoints
            .iter()
            .map(|(at, width)| (*at, Expr::num(*width)))
            .collect(),
    })
}

/// Circle radius that grows with cluster size.
///
/// Features carrying `point_count > 1` get a radius interpolated over the
/// cluster breakpoints; individual features get `mid_r`. The whole expression
/// is floored at `min_r`.
pub fn cluster_aware_radius(min_r: f64, mid_r: f64, max_r: f64) -> Result<Expr, StyleError> {
    if !(0.0 <= min_r && min_r <= mid_r && mid_r <= max_r) {
        return Err(StyleError::InvalidRadii {
            min: min_r,
            mid: mid_r,
            max: max_r,
        });
    }
    let stops = CLUSTER_RADIUS_STOPS
        .iter()
        .map(|(count, base, offset)| {
            let base = match base {
                RadiusBase::Mid => mid_r,
                RadiusBase::Max => max_r,
            };
            (*count, Expr::num(base + offset))
        })
        .collect();
    let radius = Expr::Case {
        branches: vec![(
            is_cluster(),
            Expr::Interpolate {
                input: Box::new(number_or(POINT_COUNT, 0.0)),
                stops,
            },
        )],
        fallback: Box::new(Expr::num(mid_r)),
    };
    Ok(Expr::Max(Box::new(Expr::num(min_r)), Box::new(radius)))
}

/// True for synthetic cluster features (`point_count` present and above one).
pub fn is_cluster() -> Expr {
    Expr::All(vec![
        Expr::has(POINT_COUNT),
        Expr::cmp(CmpOp::Gt, number_or(POINT_COUNT, 0.0), Expr::num(1.0)),
    ])
}

/// Text for cluster count badges.
pub fn cluster_count_label() -> Expr {
    Expr::ToText(Box::new(Expr::Coalesce(vec![
        Expr::get("point_count_abbreviated"),
        Expr::get(POINT_COUNT),
        Expr::text(""),
    ])))
}

/// Picks `hovered` while the feature's `hover` feature-state is set.
pub fn hover_switch(base: Expr, hovered: Expr) -> Expr {
    Expr::Case {
        branches: vec![(
            Expr::ToBoolean(
                Box::new(Expr::FeatureState("hover".into())),
                Box::new(Expr::boolean(false)),
            ),
            hovered,
        )],
        fallback: Box::new(base),
    }
}

fn check_ascending(field: &str, values: impl Iterator<Item = f64>) -> Result<(), StyleError> {
    let mut prev: Option<f64> = None;
    let mut any = false;
    for v in values {
        any = true;
        if !v.is_finite() || prev.is_some_and(|p| v <= p) {
            return Err(StyleError::UnsortedBreakpoints {
                field: field.to_string(),
            });
        }
        prev = Some(v);
    }
    if !any {
        return Err(StyleError::UnsortedBreakpoints {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalContext;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    fn props(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    fn eval_with(e: &Expr, v: Value) -> Value {
        let p = props(v);
        e.eval(&EvalContext::new(&p))
    }

    #[test]
    fn categorical_color_shape() {
        let e = categorical_color("classification", &[("green", "#1a9850")], "#cccccc")
            .expect("valid");
        assert_eq!(
            e.to_json(),
            json!([
                "match",
                ["to-string", ["coalesce", ["get", "classification"], "__missing__"]],
                "green",
                "#1a9850",
                "#cccccc"
            ])
        );
    }

    #[test]
    fn categorical_color_missing_field_gets_default() {
        let e = categorical_color("classification", &[("green", "#1a9850")], "#cccccc")
            .expect("valid");
        assert_eq!(eval_with(&e, json!({})), json!("#cccccc"));
        assert_eq!(eval_with(&e, json!({"classification": null})), json!("#cccccc"));
        assert_eq!(eval_with(&e, json!({"classification": "green"})), json!("#1a9850"));
    }

    #[test]
    fn categorical_color_rejects_bad_colors() {
        assert!(categorical_color("c", &[("a", "nope")], "#000").is_err());
        assert!(categorical_color("c", &[], "nope").is_err());
    }

    #[test]
    fn interpolated_color_clamps_and_coalesces() {
        let e = interpolated_color("score", &[(0.0, "#00ff00"), (1.0, "#ff0000")], 0.0)
            .expect("valid");
        assert_eq!(eval_with(&e, json!({})), json!("#00ff00"));
        assert_eq!(eval_with(&e, json!({"score": 5.0})), json!("#ff0000"));
        assert_eq!(eval_with(&e, json!({"score": -1.0})), json!("#00ff00"));
        assert_eq!(
            eval_with(&e, json!({"score": 0.5})),
            json!("rgba(128, 128, 0, 1)")
        );
    }

    #[test]
    fn interpolated_color_requires_ascending_breakpoints() {
        assert!(interpolated_color("s", &[(1.0, "#000"), (0.0, "#fff")], 0.0).is_err());
        assert!(interpolated_color("s", &[(1.0, "#000"), (1.0, "#fff")], 0.0).is_err());
        assert!(interpolated_color("s", &[], 0.0).is_err());
    }

    #[test]
    fn interpolated_width_defaults_to_thinnest() {
        let e = interpolated_width("voltage_kv", &[(69.0, 1.0), (500.0, 4.0)]).expect("valid");
        assert_eq!(eval_with(&e, json!({})).as_f64(), Some(1.0));
        assert_eq!(eval_with(&e, json!({"voltage_kv": "bogus"})).as_f64(), Some(1.0));
        assert_eq!(eval_with(&e, json!({"voltage_kv": 765})).as_f64(), Some(4.0));
    }

    #[test]
    fn cluster_radius_individual_features_use_mid() {
        let e = cluster_aware_radius(4.0, 6.0, 10.0).expect("valid");
        assert_eq!(eval_with(&e, json!({})).as_f64(), Some(6.0));
        assert_eq!(eval_with(&e, json!({"point_count": 1})).as_f64(), Some(6.0));
        assert_eq!(eval_with(&e, json!({"point_count": 0})).as_f64(), Some(6.0));
    }

    #[test]
    fn cluster_radius_hits_documented_breakpoints() {
        let e = cluster_aware_radius(4.0, 6.0, 10.0).expect("valid");
        let at = |n: u64| eval_with(&e, json!({ "point_count": n })).as_f64();
        assert_eq!(at(2), Some(8.0));
        assert_eq!(at(10), Some(14.0));
        assert_eq!(at(50), Some(18.0));
        assert_eq!(at(200), Some(22.0));
        assert_eq!(at(5_000), Some(22.0));
    }

    #[test]
    fn cluster_radius_is_monotonic_in_point_count() {
        let e = cluster_aware_radius(3.0, 5.0, 8.0).expect("valid");
        let individual = eval_with(&e, json!({})).as_f64().unwrap_or(f64::NAN);
        let mut prev = individual;
        for n in 2..=400u64 {
            let r = eval_with(&e, json!({ "point_count": n }))
                .as_f64()
                .unwrap_or(f64::NAN);
            assert!(r >= prev, "radius dropped at point_count={n}: {r} < {prev}");
            prev = r;
        }
    }

    #[test]
    fn cluster_radius_rejects_inverted_bounds() {
        assert!(cluster_aware_radius(6.0, 4.0, 10.0).is_err());
        assert!(cluster_aware_radius(-1.0, 4.0, 10.0).is_err());
    }

    #[test]
    fn cluster_count_label_prefers_abbreviation() {
        let e = cluster_count_label();
        assert_eq!(
            eval_with(&e, json!({"point_count": 1200, "point_count_abbreviated": "1.2k"})),
            json!("1.2k")
        );
        assert_eq!(eval_with(&e, json!({"point_count": 12})), json!("12"));
        assert_eq!(eval_with(&e, json!({})), json!(""));
    }

    #[test]
    fn hover_switch_follows_feature_state() {
        let e = hover_switch(Expr::num(1.0), Expr::num(3.0));
        let p = Map::new();
        let on = props(json!({"hover": true}));
        let off = props(json!({"hover": false}));
        assert_eq!(e.eval(&EvalContext::new(&p)).as_f64(), Some(1.0));
        assert_eq!(
            e.eval(&EvalContext::new(&p).with_feature_state(&on)).as_f64(),
            Some(3.0)
        );
        assert_eq!(
            e.eval(&EvalContext::new(&p).with_feature_state(&off)).as_f64(),
            Some(1.0)
        );
    }
}
