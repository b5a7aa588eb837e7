//! Deterministic fast-path behavior against the shipped template set.

use dugout::catalog::{build_catalog, StatCatalog, StaticSchema};
use dugout::config::Settings;
use dugout::query::QuerySource;
use dugout::router::try_fastpath;
use dugout::templates::TemplateSet;

fn setup() -> (StatCatalog, TemplateSet, Settings) {
    let catalog = build_catalog(&StaticSchema::bundled()).unwrap();
    let templates = TemplateSet::from_path("assets/sql_templates.yaml").unwrap();
    (catalog, templates, Settings::default())
}

#[test]
fn test_same_question_yields_identical_sql() {
    let (catalog, templates, settings) = setup();
    let question = "top 10 home run hitters in 2022";

    let first = try_fastpath(question, 2022, 10, &catalog, &templates, &settings)
        .unwrap()
        .unwrap();
    let second = try_fastpath(question, 2022, 10, &catalog, &templates, &settings)
        .unwrap()
        .unwrap();

    assert_eq!(first.sql_text, second.sql_text);
    assert_eq!(first.bound_params, second.bound_params);
    assert_eq!(first.source, QuerySource::FastPath);
}

#[test]
fn test_counting_leaderboard_shape() {
    let (catalog, templates, settings) = setup();
    let resolved = try_fastpath(
        "top 10 home run hitters in 2022",
        2022,
        10,
        &catalog,
        &templates,
        &settings,
    )
    .unwrap()
    .unwrap();

    let sql = &resolved.sql_text;
    assert!(sql.contains("DISTINCT ON (b.idfg, b.season, TRIM(b.team))"));
    assert!(sql.contains("FILTER (WHERE team = 'TOT')"));
    assert!(sql.contains("FILTER (WHERE team NOT IN ('TOT', '---'))"));
    assert!(sql.contains("SUM(val)"));
    assert!(sql.contains("fangraphs_batting_lahman_like"));
    assert!(!sql.contains("fangraphs_pitching_lahman_like"));
    assert!(sql.contains("LIMIT :top_n"));
    assert!(!sql.contains("{{"), "unrendered markers: {}", sql);

    assert_eq!(resolved.bound_params["season"].to_string(), "2022");
    assert_eq!(resolved.bound_params["top_n"].to_string(), "10");
}

#[test]
fn test_shared_stat_names_follow_the_question_domain() {
    let (catalog, templates, settings) = setup();

    // hr and so exist in both counting tables; the question's own wording
    // decides which table answers it.
    let batting = try_fastpath("top 10 home run hitters in 2022", 2022, 10, &catalog, &templates, &settings)
        .unwrap()
        .unwrap();
    assert!(batting.sql_text.contains("fangraphs_batting_lahman_like"));

    let pitching = try_fastpath(
        "most strikeouts by pitchers in 2019",
        2019,
        10,
        &catalog,
        &templates,
        &settings,
    )
    .unwrap()
    .unwrap();
    assert!(pitching.sql_text.contains("fangraphs_pitching_lahman_like"));
    assert!(pitching.sql_text.contains("SUM(val)"));
}

#[test]
fn test_low_is_better_stat_sorts_ascending() {
    let (catalog, templates, settings) = setup();
    let resolved = try_fastpath("best era in 2005", 2005, 10, &catalog, &templates, &settings)
        .unwrap()
        .unwrap();

    let sql = &resolved.sql_text;
    assert!(sql.contains("ORDER BY \"era\" ASC NULLS LAST, name"));
    // The row cap must survive the ORDER BY rewrite.
    assert!(sql.contains("LIMIT :top_n"));
    assert!(sql.contains("fangraphs_pitching_lahman_like"));
    assert!(sql.contains("AVG(val)"));
}

#[test]
fn test_qualified_batting_leaderboard() {
    let (catalog, templates, settings) = setup();
    let resolved = try_fastpath(
        "qualified batting average leaders in 2021",
        2021,
        10,
        &catalog,
        &templates,
        &settings,
    )
    .unwrap()
    .unwrap();

    let sql = &resolved.sql_text;
    assert!(sql.contains("WHERE pa >= :min_pa"));
    assert!(sql.contains("AS \"avg\""));
    // A rate stat averages its stints.
    assert!(sql.contains("AVG(val)"));
    assert_eq!(resolved.bound_params["min_pa"].to_string(), "300");
}

#[test]
fn test_qualified_counting_stat_sums_stints() {
    let (catalog, templates, settings) = setup();
    let resolved = try_fastpath(
        "qualified home run leaders in 2021",
        2021,
        10,
        &catalog,
        &templates,
        &settings,
    )
    .unwrap()
    .unwrap();

    // A traded player's qualified HR total is the sum across stints, never
    // an average of them.
    let sql = &resolved.sql_text;
    assert!(sql.contains("WHERE pa >= :min_pa"));
    assert!(sql.contains("AS \"hr\""));
    assert!(sql.contains("SUM(val)"));
    assert!(!sql.contains("AVG(val)"));
    assert_eq!(resolved.bound_params["min_pa"].to_string(), "300");
}

#[test]
fn test_unresolvable_stat_is_a_miss_not_an_error() {
    let (catalog, templates, settings) = setup();
    let result = try_fastpath(
        "xylophone quarterly report",
        2022,
        10,
        &catalog,
        &templates,
        &settings,
    )
    .unwrap();
    assert!(result.is_none());
}
