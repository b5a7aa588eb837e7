//! Pattern-router behavior against the shipped template set.

use dugout::query::ParamValue;
use dugout::router::route;
use dugout::season::SeasonContext;
use dugout::templates::TemplateSet;

fn setup() -> (TemplateSet, SeasonContext) {
    (
        TemplateSet::from_path("assets/sql_templates.yaml").unwrap(),
        SeasonContext::new(2025),
    )
}

#[test]
fn test_batting_counting_question_routes() {
    let (templates, seasons) = setup();
    let routed = route("who hit the most home runs in 2019", &templates, &seasons).unwrap();
    assert_eq!(routed.name, "leaders_batting_counting");
    assert_eq!(routed.bound["season"], ParamValue::Int(2019));
    assert_eq!(routed.bound["top_n"], ParamValue::Int(10));
    assert_eq!(routed.idents["stat_col"], "hr");
    assert_eq!(routed.idents["stat_label"], "home runs");
}

#[test]
fn test_explicit_top_n_captured() {
    let (templates, seasons) = setup();
    let routed = route("top 5 rbi leaders in 2015", &templates, &seasons).unwrap();
    assert_eq!(routed.name, "leaders_batting_counting");
    assert_eq!(routed.bound["top_n"], ParamValue::Int(5));
    assert_eq!(routed.idents["stat_col"], "rbi");
}

#[test]
fn test_pitching_question_routes_to_pitching_template() {
    let (templates, seasons) = setup();
    let routed = route("most strikeouts by pitchers in 2019", &templates, &seasons).unwrap();
    assert_eq!(routed.name, "leaders_pitching_counting");
    assert_eq!(routed.idents["stat_col"], "so");
    assert_eq!(routed.bound["season"], ParamValue::Int(2019));
}

#[test]
fn test_current_year_magic_default() {
    let (templates, seasons) = setup();
    let routed = route("who leads in home runs this year", &templates, &seasons).unwrap();
    assert_eq!(routed.name, "current_year_leaders");
    assert_eq!(routed.bound["season"], ParamValue::Int(2025));
    assert_eq!(routed.bound["top_n"], ParamValue::Int(1));
}

#[test]
fn test_qualified_rate_question_routes_to_rate_variant() {
    let (templates, seasons) = setup();
    let routed = route(
        "qualified batting average leaders in 2021",
        &templates,
        &seasons,
    )
    .unwrap();
    assert_eq!(routed.name, "leaders_batting_qualified_rate");
    assert_eq!(routed.idents["stat_col"], "avg");
    assert_eq!(routed.bound["season"], ParamValue::Int(2021));
    // The PA floor is not a template default; the pipeline binds the
    // configured value.
    assert!(!routed.bound.contains_key("min_pa"));
}

#[test]
fn test_qualified_counting_question_routes_to_counting_variant() {
    let (templates, seasons) = setup();
    let routed = route("qualified home run leaders in 2021", &templates, &seasons).unwrap();
    assert_eq!(routed.name, "leaders_batting_qualified_counting");
    assert_eq!(routed.idents["stat_col"], "hr");
    assert_eq!(routed.bound["season"], ParamValue::Int(2021));
}

#[test]
fn test_rate_label_routes_to_rate_template() {
    let (templates, seasons) = setup();

    let routed = route("who leads in slugging this year", &templates, &seasons).unwrap();
    assert_eq!(routed.name, "current_year_rate_leaders");
    assert_eq!(routed.idents["stat_col"], "slg");

    let routed = route("best obp in 2015", &templates, &seasons).unwrap();
    assert_eq!(routed.name, "leaders_batting_rate");
    assert_eq!(routed.idents["stat_col"], "obp");
}

#[test]
fn test_unlisted_stat_label_does_not_route() {
    let (templates, seasons) = setup();
    // Matches the batting pattern textually but the label is not a known stat.
    assert!(route("most wizardry in 2019", &templates, &seasons).is_none());
}

#[test]
fn test_unrelated_question_does_not_route() {
    let (templates, seasons) = setup();
    assert!(route("tell me about the 1994 strike", &templates, &seasons).is_none());
}
