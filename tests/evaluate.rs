use plotcore::{evaluate, RawInput, Response};
use serde_json::{json, Value};
use std::f64::consts::PI;

fn request(expression: &str, xmin: f64, xmax: f64, points: usize) -> RawInput {
    RawInput { xmin, xmax, points, ..RawInput::new(expression) }
}

fn run(input: &RawInput) -> Value {
    serde_json::to_value(evaluate(input)).unwrap()
}

fn floats(value: &Value) -> Vec<f64> {
    value.as_array().unwrap().iter().map(|v| v.as_f64().unwrap()).collect()
}

#[test]
fn parabola_samples_and_double_root() {
    let out = run(&request("x^2", -2.0, 2.0, 5));
    assert_eq!(
        out,
        json!({
            "x": [-2.0, -1.0, 0.0, 1.0, 2.0],
            "y": [4.0, 1.0, 0.0, 1.0, 4.0],
            "expr": "x**2",
            "mode": "cartesian",
            "roots": [0.0],
        })
    );
}

#[test]
fn complex_roots_are_reported_as_null() {
    let out = run(&RawInput::new("x^2+1=0"));
    assert_eq!(out["mode"], "equation");
    assert_eq!(out["roots"], json!([null, null]));
    assert_eq!(out["x"].as_array().unwrap().len(), 500);
}

#[test]
fn equations_report_real_roots_in_order() {
    let out = run(&RawInput::new("x^2=4"));
    assert_eq!(out["roots"], json!([-2.0, 2.0]));
}

#[test]
fn inequality_mask() {
    let out = run(&request("x+y>0", -10.0, 10.0, 100));
    assert_eq!(out["mode"], "inequality");
    assert_eq!(out["op"], ">");
    let z = out["Z"].as_array().unwrap();
    assert_eq!(z.len(), 10);
    for row in z {
        let row = row.as_array().unwrap();
        assert_eq!(row.len(), 10);
        assert!(row.iter().all(|v| v == 0 || v == 1));
    }
    // bottom-left corner is x=y=-10, top-right is x=y=10
    assert_eq!(z[0][0], 0);
    assert_eq!(z[9][9], 1);
    assert_eq!(out["X"][0][9], 10.0);
    assert_eq!(out["Y"][9][0], 10.0);
}

#[test]
fn polar_unit_circle() {
    let out = run(&request("r=1", 0.0, 2.0 * PI, 4));
    assert_eq!(out["mode"], "polar");
    let (x, y) = (floats(&out["x"]), floats(&out["y"]));
    assert_eq!(x.len(), 4);
    for (x, y) in x.iter().zip(&y) {
        assert!((x * x + y * y - 1.0).abs() < 1e-12);
    }
}

#[test]
fn complex_polar_radius_fails_the_request() {
    let response = evaluate(&request("r=sqrt(theta)", -1.0, 1.0, 5));
    assert!(response.is_error());
    assert_eq!(response.expr(), "r=sqrt(theta)");
}

#[test]
fn constants_sample_to_constants() {
    let out = run(&RawInput::new("5"));
    let y = floats(&out["y"]);
    assert_eq!(y.len(), 500);
    assert!(y.iter().all(|v| *v == 5.0));
    assert!(out.get("roots").is_none());
}

#[test]
fn leading_y_equals_is_dropped() {
    let out = run(&request("y=2x", 0.0, 1.0, 2));
    assert_eq!(out["expr"], "2x");
    assert_eq!(out["mode"], "cartesian");
    assert_eq!(out["y"], json!([0.0, 2.0]));
}

#[test]
fn non_real_samples_are_null() {
    let out = run(&request("sqrt(x)", -1.0, 1.0, 3));
    assert_eq!(out["y"], json!([null, 0.0, 1.0]));
}

#[test]
fn surface_grid() {
    let out = run(&request("z=x^2+y^2", -1.0, 1.0, 9));
    assert_eq!(out["mode"], "surface");
    assert_eq!(out["X"], json!([[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]]));
    assert_eq!(out["Z"], json!([[2.0, 1.0, 2.0], [1.0, 0.0, 1.0], [2.0, 1.0, 2.0]]));
    assert!(out.get("op").is_none());
}

#[test]
fn implicit_relation_grid() {
    let out = run(&request("x^2+y^2=1", -1.0, 1.0, 9));
    assert_eq!(out["mode"], "implicit");
    assert_eq!(out["Z"][1][1], -1.0);
    assert_eq!(out["Z"][0][0], 1.0);
}

#[test]
fn grid_domain_errors_are_null() {
    let out = run(&request("z=log(x)", -1.0, 1.0, 4));
    assert_eq!(out["Z"][0][0], Value::Null);
    assert_eq!(out["Z"][0][1], 0.0);
}

#[test]
fn parametric_tuple() {
    let out = run(&request("(cos(t), sin(t))", 0.0, PI, 3));
    assert_eq!(out["mode"], "parametric");
    assert_eq!(out["x"][0], 1.0);
    assert_eq!(out["x"][2], -1.0);
}

#[test]
fn parametric_hint_forces_the_mode() {
    let mut input = RawInput::new("t");
    input.mode = Some(plotcore::Mode::Parametric);
    let out = run(&input);
    assert_eq!(
        out["error"],
        "Parse error in parametric parts: expected 2 comma-separated components, found 1"
    );
    assert_eq!(out["expr"], "t");
}

#[test]
fn parse_errors_echo_the_expression() {
    let out = run(&RawInput::new("foo(x)"));
    assert_eq!(
        out,
        json!({"error": "Parse error: name 'foo' is not defined", "expr": "foo(x)"})
    );
    let out = run(&RawInput::new("z=__import__(x)"));
    assert!(out["error"].as_str().unwrap().starts_with("Parse error in surface expression"));
}

#[test]
fn deeply_nested_input_is_a_parse_error() {
    let nested = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
    let out = run(&RawInput::new(&nested));
    assert_eq!(out["error"], "Parse error: expression is nested more than 256 levels deep");
    assert_eq!(out["expr"], nested.as_str());

    let out = run(&RawInput::new(&format!("z={}x", "-".repeat(10_000))));
    assert!(out["error"].as_str().unwrap().starts_with("Parse error in surface expression"));
}

#[test]
fn repeated_roots_are_reported_once() {
    assert_eq!(run(&RawInput::new("(x-1)^4"))["roots"], json!([1.0]));
    assert_eq!(run(&RawInput::new("(x-2)^6"))["roots"], json!([2.0]));
    assert_eq!(run(&RawInput::new("x^3 - 3x^2 + 3x - 1"))["roots"], json!([1.0]));
    assert_eq!(run(&RawInput::new("(x-1)^5=0"))["roots"], json!([1.0]));
}

#[test]
fn close_roots_are_not_merged() {
    let out = run(&RawInput::new("(x-1000)(x-1000.005)"));
    let roots = floats(&out["roots"]);
    assert_eq!(roots.len(), 2);
    assert!((roots[0] - 1000.0).abs() < 1e-6);
    assert!((roots[1] - 1000.005).abs() < 1e-6);
}

#[test]
fn unsolvable_equations_are_errors() {
    let response = evaluate(&RawInput::new("sin(x)+x=1"));
    assert!(response.is_error());
}

#[test]
fn unsolvable_cartesian_roots_are_omitted() {
    let out = run(&request("sin(x)+x", -1.0, 1.0, 3));
    assert_eq!(out["mode"], "cartesian");
    assert!(out.get("roots").is_none());
    assert_eq!(out["y"][1], 0.0);
}

#[test]
fn zero_points_give_empty_arrays() {
    let out = run(&request("x", -1.0, 1.0, 0));
    assert_eq!(out["x"], json!([]));
    assert_eq!(out["y"], json!([]));
    let out = run(&request("z=x+y", -1.0, 1.0, 0));
    assert_eq!(out["Z"], json!([]));
}

#[test]
fn reversed_domains_are_sampled_as_given() {
    let out = run(&request("x", 1.0, -1.0, 3));
    assert_eq!(out["x"], json!([1.0, 0.0, -1.0]));
}

#[test]
fn same_input_same_bytes() {
    for expr in ["x^2", "x+y>0", "r=1+cos(theta)", "z=sin(x)*y", "x^3=x"] {
        let input = RawInput::new(expr);
        let a = evaluate(&input).to_json(false).unwrap();
        let b = evaluate(&input).to_json(false).unwrap();
        assert_eq!(a, b, "{expr}");
    }
}

#[test]
fn requests_deserialize_with_defaults() {
    let input: RawInput = serde_json::from_str(r#"{"expression": "x", "points": 2}"#).unwrap();
    let Response::Plot(_) = evaluate(&input) else {
        panic!("x should plot");
    };
    assert_eq!(run(&input)["x"], json!([-10.0, 10.0]));
}
