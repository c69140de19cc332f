use bridgegraph_core::config::FilterConfig;
use bridgegraph_core::filter::{has_prefix, Decision, Rejection, RelationFilter};
use bridgegraph_core::model::{CallRelation, FunctionRef, PackageRef};

fn func(path: &str, name: &str) -> FunctionRef {
    let short = path.rsplit('/').next().unwrap_or(path);
    FunctionRef::new(PackageRef::new(path, short), name)
}

fn std_func(path: &str, name: &str) -> FunctionRef {
    FunctionRef::new(PackageRef::std(path, path), name)
}

fn call(caller: FunctionRef, callee: FunctionRef) -> CallRelation {
    CallRelation::new(caller, callee)
}

#[test]
fn synthetic_relations_are_rejected_first() {
    let mut wrapper = func("example.com/app", "init");
    wrapper.package = None;
    let rel = call(wrapper, func("example.com/app", "Setup"));
    let mut generated = func("example.com/app", "Thunk");
    generated.synthetic = true;
    let rel2 = call(func("example.com/app", "main"), generated);

    let cfg = FilterConfig::default();
    let relations = vec![rel.clone(), rel2.clone()];
    let filter = RelationFilter::new(&cfg, &relations);
    assert_eq!(filter.decide(&rel), Decision::Reject(Rejection::Synthetic));
    assert_eq!(filter.decide(&rel2), Decision::Reject(Rejection::Synthetic));
}

#[test]
fn focus_accepts_relations_touching_the_focus_package() {
    let cfg = FilterConfig { focus: Some("example.com/p".into()), ..Default::default() };
    let into = call(func("example.com/q", "a"), func("example.com/p", "y"));
    let out = call(func("example.com/p", "x"), func("example.com/q", "a"));
    let unrelated = call(func("example.com/q", "a"), func("example.com/s", "c"));
    let relations = vec![into.clone(), out.clone(), unrelated.clone()];
    let filter = RelationFilter::new(&cfg, &relations);

    assert!(filter.accepts(&into));
    assert!(filter.accepts(&out));
    assert_eq!(filter.decide(&unrelated), Decision::Reject(Rejection::OutOfFocus));
}

#[test]
fn semi_focus_bridge_accepts_regardless_of_order() {
    let cfg = FilterConfig { focus: Some("example.com/p".into()), ..Default::default() };
    let bridge = call(func("example.com/q", "a"), func("example.com/r", "b"));
    let px_qa = call(func("example.com/p", "x"), func("example.com/q", "a"));
    let rb_py = call(func("example.com/r", "b"), func("example.com/p", "y"));

    // The bridge comes first in the stream; the decision must not depend on it.
    let relations = vec![bridge.clone(), px_qa, rb_py];
    let filter = RelationFilter::new(&cfg, &relations);
    assert_eq!(filter.decide(&bridge), Decision::Accept { included: false, semi_focus: true });
}

#[test]
fn semi_focus_needs_both_halves_of_the_bridge() {
    let cfg = FilterConfig { focus: Some("example.com/p".into()), ..Default::default() };
    let bridge = call(func("example.com/q", "a"), func("example.com/r", "b"));
    let px_qa = call(func("example.com/p", "x"), func("example.com/q", "a"));
    let relations = vec![bridge.clone(), px_qa];
    let filter = RelationFilter::new(&cfg, &relations);
    assert_eq!(filter.decide(&bridge), Decision::Reject(Rejection::OutOfFocus));
}

#[test]
fn nostd_and_nointer_reject() {
    let cfg = FilterConfig { nostd: true, nointer: true, ..Default::default() };
    let to_std = call(func("example.com/app", "main"), std_func("fmt", "Println"));
    let from_std = call(std_func("net/http", "Serve"), func("example.com/app", "Handle"));
    let internal = call(func("example.com/app", "main"), func("example.com/app", "helper"));
    let exported = call(func("example.com/app", "main"), func("example.com/app", "Run"));
    let closure = call(
        func("example.com/app", "Run"),
        func("example.com/app", "run$1").with_enclosing("Run"),
    );
    let relations =
        vec![to_std.clone(), from_std.clone(), internal.clone(), exported.clone(), closure.clone()];
    let filter = RelationFilter::new(&cfg, &relations);

    assert_eq!(filter.decide(&to_std), Decision::Reject(Rejection::StandardLibrary));
    assert_eq!(filter.decide(&from_std), Decision::Reject(Rejection::StandardLibrary));
    assert_eq!(filter.decide(&internal), Decision::Reject(Rejection::Unexported));
    assert!(filter.accepts(&exported));
    assert!(!closure.callee.exported);
    assert!(filter.accepts(&closure));
}

#[test]
fn nostd_runs_before_include() {
    let cfg = FilterConfig { nostd: true, include: vec!["fmt".into()], ..Default::default() };
    let rel = call(func("example.com/app", "main"), std_func("fmt", "Println"));
    let relations = vec![rel.clone()];
    let filter = RelationFilter::new(&cfg, &relations);
    assert_eq!(filter.decide(&rel), Decision::Reject(Rejection::StandardLibrary));
}

#[test]
fn limit_requires_both_endpoints() {
    let cfg = FilterConfig { limit: vec!["pkgA".into()], ..Default::default() };
    let across = call(func("pkgA", "f"), func("pkgB", "g"));
    let inside = call(func("pkgA", "f"), func("pkgA", "h"));
    let relations = vec![across.clone(), inside.clone()];
    let filter = RelationFilter::new(&cfg, &relations);

    assert_eq!(filter.decide(&across), Decision::Reject(Rejection::NotInLimit));
    assert_eq!(filter.decide(&inside), Decision::Accept { included: false, semi_focus: false });
}

#[test]
fn ignore_rejects_when_either_endpoint_matches() {
    let cfg = FilterConfig { ignore: vec!["example.com/vendor".into()], ..Default::default() };
    let caller_side = call(func("example.com/vendor/log", "F"), func("example.com/app", "G"));
    let callee_side = call(func("example.com/app", "G"), func("example.com/vendor/log", "F"));
    let clean = call(func("example.com/app", "G"), func("example.com/app", "H"));
    let relations = vec![caller_side.clone(), callee_side.clone(), clean.clone()];
    let filter = RelationFilter::new(&cfg, &relations);

    assert_eq!(filter.decide(&caller_side), Decision::Reject(Rejection::Ignored));
    assert_eq!(filter.decide(&callee_side), Decision::Reject(Rejection::Ignored));
    assert!(filter.accepts(&clean));
}

#[test]
fn include_bypasses_limit_and_ignore() {
    let cfg = FilterConfig {
        include: vec!["example.com/app".into()],
        limit: vec!["example.com/other".into()],
        ignore: vec!["example.com".into()],
        ..Default::default()
    };
    let rel = call(func("example.com/app", "F"), func("example.com/lib", "G"));
    let rejected = call(func("example.com/lib", "G"), func("example.com/lib", "H"));
    let relations = vec![rel.clone(), rejected.clone()];
    let filter = RelationFilter::new(&cfg, &relations);

    assert_eq!(filter.decide(&rel), Decision::Accept { included: true, semi_focus: false });
    assert_eq!(filter.decide(&rejected), Decision::Reject(Rejection::NotInLimit));
}

#[test]
fn prefixes_are_plain_string_prefixes() {
    let prefixes = vec!["pkgA".to_string()];
    assert!(has_prefix(&prefixes, "pkgA"));
    assert!(has_prefix(&prefixes, "pkgAB/sub"));
    assert!(!has_prefix(&prefixes, "x/pkgA"));
    assert!(!has_prefix(&[], "pkgA"));
}
