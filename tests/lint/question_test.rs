//! Question-aware lint scenarios: season availability and leaderboard rules.

use dugout::lint::question::lint_question_sql;

const CURRENT_YEAR: i32 = 2025;

#[test]
fn test_counting_leaderboard_with_qualifier_rejected() {
    let question = "most home runs in 2019";
    let sql = "SELECT name, hr FROM fangraphs_batting_lahman_like \
               WHERE season = 2019 AND pa >= 300 ORDER BY hr DESC LIMIT 10";
    let report = lint_question_sql(question, sql, CURRENT_YEAR);
    assert!(!report.ok);
    assert!(report.reasons.iter().any(|r| r.contains("PA/IP")));
}

#[test]
fn test_rate_leaderboard_with_qualifier_allowed() {
    // PA thresholds are the norm for rate stats; only counting stats ban them.
    let question = "best batting average in 2019";
    let sql = "SELECT name, avg FROM fangraphs_batting_lahman_like \
               WHERE season = 2019 AND pa >= 300 ORDER BY avg DESC LIMIT 10";
    let report = lint_question_sql(question, sql, CURRENT_YEAR);
    assert!(report.ok, "reasons: {:?}", report.reasons);
}

#[test]
fn test_current_season_must_not_use_lahman() {
    let question = "most hits this season";
    let report = lint_question_sql(
        question,
        "SELECT * FROM batting WHERE yearid = 2025",
        CURRENT_YEAR,
    );
    assert!(!report.ok);
    assert!(report.reasons.iter().any(|r| r.contains("FanGraphs")));
    assert!(report.meta.uses_lahman);

    let report = lint_question_sql(
        question,
        "SELECT * FROM fangraphs_batting_lahman_like WHERE season = 2025",
        CURRENT_YEAR,
    );
    assert!(report.ok, "reasons: {:?}", report.reasons);
    assert!(report.meta.uses_fangraphs);
}

#[test]
fn test_historical_season_may_use_lahman() {
    let question = "most home runs in 1998";
    let sql = "SELECT playerid, hr FROM batting WHERE yearid = 1998 ORDER BY hr DESC LIMIT 10";
    let report = lint_question_sql(question, sql, CURRENT_YEAR);
    assert!(report.ok, "reasons: {:?}", report.reasons);
}

#[test]
fn test_advanced_tables_gated_before_2002() {
    let question = "best wrc+ hitters in 1995";
    let sql = "SELECT name, wrc_plus FROM fangraphs_batting_advanced \
               WHERE season = 1995 ORDER BY wrc_plus DESC LIMIT 10";
    let report = lint_question_sql(question, sql, CURRENT_YEAR);
    assert!(!report.ok);
    assert!(report.reasons.iter().any(|r| r.contains("before 2002")));

    let question = "best wrc+ hitters in 2015";
    let sql = "SELECT name, wrc_plus FROM fangraphs_batting_advanced \
               WHERE season = 2015 ORDER BY wrc_plus DESC LIMIT 10";
    let report = lint_question_sql(question, sql, CURRENT_YEAR);
    assert!(report.ok, "reasons: {:?}", report.reasons);
}

#[test]
fn test_tot_and_non_tot_in_one_step_rejected() {
    let question = "most home runs in 2019";
    let sql = "SELECT name, \
               CASE WHEN team = 'TOT' THEN hr ELSE 0 END AS hr \
               FROM fangraphs_batting_lahman_like \
               WHERE season = 2019 AND team NOT IN ('TOT','---')";
    let report = lint_question_sql(question, sql, CURRENT_YEAR);
    assert!(!report.ok);
    assert!(report.reasons.iter().any(|r| r.contains("TOT and non-TOT")));
}

#[test]
fn test_prose_response_is_not_sql() {
    let report = lint_question_sql(
        "most home runs in 2019",
        "I'm sorry, I can't answer that with this schema.",
        CURRENT_YEAR,
    );
    assert!(!report.ok);
    assert_eq!(report.reasons, vec!["Output is not SQL.".to_string()]);
}

#[test]
fn test_unavailable_topics_rejected_regardless_of_sql() {
    let report = lint_question_sql(
        "highest exit velocity hitters in 2023",
        "SELECT name FROM fangraphs_batting_lahman_like WHERE season = 2023",
        CURRENT_YEAR,
    );
    assert!(!report.ok);
    assert!(report.reasons.iter().any(|r| r.contains("unavailable data")));
}
