//! The traded-player enforcer against real rendered template SQL.

use std::collections::BTreeMap;

use dugout::lint::leaders::{enforce_leaders_invariants, LeadersViolation};
use dugout::templates::render::render_identifiers;
use dugout::templates::TemplateSet;

fn render(template: &str, stat: &str) -> String {
    let templates = TemplateSet::from_path("assets/sql_templates.yaml").unwrap();
    let def = &templates.get(template).unwrap().def;
    let mut idents = BTreeMap::new();
    idents.insert("stat_col".to_string(), stat.to_string());
    idents.insert("stat_label".to_string(), stat.to_string());
    render_identifiers(&def.sql, &idents).unwrap()
}

#[test]
fn test_every_shipped_counting_template_is_compliant() {
    for name in [
        "leaders_batting_counting",
        "leaders_batting_rate",
        "leaders_batting_qualified_counting",
        "leaders_batting_qualified_rate",
        "leaders_pitching_counting",
        "leaders_pitching_rate",
        "current_year_leaders",
        "current_year_rate_leaders",
    ] {
        let sql = render(name, "hr");
        assert_eq!(
            enforce_leaders_invariants(&sql),
            Ok(()),
            "template {} violates the traded-player invariants",
            name
        );
    }
}

#[test]
fn test_naive_leaderboard_rejected() {
    let sql = "SELECT name, hr FROM fangraphs_batting_lahman_like \
               WHERE season = :season ORDER BY hr DESC LIMIT 10";
    assert_eq!(
        enforce_leaders_invariants(sql),
        Err(LeadersViolation::MissingTradeSafeguards)
    );
}

#[test]
fn test_tot_where_filter_rejected_even_with_safeguards() {
    // Take compliant SQL and add the illegal WHERE-clause sentinel filter.
    let sql = render("leaders_batting_counting", "hr").replace(
        "WHERE b.season = :season",
        "WHERE b.season = :season AND b.team = 'TOT'",
    );
    assert_eq!(
        enforce_leaders_invariants(&sql),
        Err(LeadersViolation::IllegalTotFilter)
    );
}

#[test]
fn test_non_counting_tables_not_gated() {
    let sql = "SELECT name, war FROM fangraphs_batting_advanced \
               WHERE season = 2015 ORDER BY war DESC LIMIT 10";
    assert_eq!(enforce_leaders_invariants(sql), Ok(()));
}

#[test]
fn test_multi_season_counting_query_not_gated() {
    // No per-season filter means no single-season leaderboard invariants.
    let sql = "SELECT name, SUM(hr) AS hr FROM fangraphs_batting_lahman_like \
               GROUP BY name ORDER BY hr DESC LIMIT 10";
    assert_eq!(enforce_leaders_invariants(sql), Ok(()));
}
