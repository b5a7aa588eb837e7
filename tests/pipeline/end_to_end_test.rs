//! Full pipeline scenarios: fast path, template route, model fallback,
//! and refusals, with the calendar pinned for reproducibility.

use std::fs;
use std::time::Duration;

use dugout::catalog::{build_catalog, StaticSchema};
use dugout::config::Settings;
use dugout::llm::{ModelAdapter, ScriptedModel};
use dugout::query::QuerySource;
use dugout::router::{Pipeline, Resolution};
use dugout::season::SeasonContext;
use dugout::templates::TemplateSet;

const CURRENT_YEAR: i32 = 2025;

fn deterministic_pipeline() -> Pipeline {
    let templates = TemplateSet::from_path("assets/sql_templates.yaml").unwrap();
    let catalog = build_catalog(&StaticSchema::bundled()).unwrap();
    Pipeline::new(Settings::default(), templates)
        .with_catalog(catalog)
        .with_seasons(SeasonContext::new(CURRENT_YEAR))
}

fn model_pipeline(replies: &[&str]) -> Pipeline {
    let templates = TemplateSet::from_path("assets/sql_templates.yaml").unwrap();
    let schema = fs::read_to_string("assets/schema_description.txt").unwrap();
    let prompt = fs::read_to_string("assets/base_prompt.txt").unwrap();
    let adapter = ModelAdapter::new(
        Box::new(ScriptedModel::new(replies.iter().copied())),
        Duration::from_secs(1),
    );
    Pipeline::new(Settings::default(), templates)
        .with_seasons(SeasonContext::new(CURRENT_YEAR))
        .with_model(adapter)
        .with_prompt(schema, prompt)
}

fn expect_query(resolution: Resolution) -> dugout::query::ResolvedQuery {
    match resolution {
        Resolution::Query(q) => q,
        Resolution::Refusal { reasons } => panic!("unexpected refusal: {:?}", reasons),
    }
}

fn expect_refusal(resolution: Resolution) -> Vec<String> {
    match resolution {
        Resolution::Refusal { reasons } => reasons,
        Resolution::Query(q) => panic!("unexpected query: {}", q.sql_text),
    }
}

#[tokio::test]
async fn test_leaderboard_question_resolves_deterministically() {
    let pipeline = deterministic_pipeline();
    let resolved = expect_query(pipeline.resolve("top 10 home run hitters in 2022").await);

    assert_eq!(resolved.source, QuerySource::FastPath);
    assert_eq!(resolved.bound_params["season"].to_string(), "2022");
    assert_eq!(resolved.bound_params["top_n"].to_string(), "10");
    assert!(resolved.sql_text.contains("DISTINCT ON"));
    assert!(resolved.sql_text.contains("COALESCE"));
    assert!(!resolved.sql_text.contains("{{"));

    // Byte-identical on repeat.
    let again = expect_query(pipeline.resolve("top 10 home run hitters in 2022").await);
    assert_eq!(again.sql_text, resolved.sql_text);
}

#[tokio::test]
async fn test_template_route_without_catalog() {
    let templates = TemplateSet::from_path("assets/sql_templates.yaml").unwrap();
    let pipeline = Pipeline::new(Settings::default(), templates)
        .with_seasons(SeasonContext::new(CURRENT_YEAR));

    let resolved = expect_query(pipeline.resolve("who hit the most home runs in 2019").await);
    assert_eq!(
        resolved.source,
        QuerySource::Template("leaders_batting_counting".to_string())
    );
    assert_eq!(resolved.bound_params["season"].to_string(), "2019");
    assert!(resolved.sql_text.contains("AS \"home runs\""));
}

#[tokio::test]
async fn test_rate_stat_question_aggregates_with_avg() {
    let pipeline = deterministic_pipeline();
    // "slugging" scores below the fuzzy cutoff, so this reaches the
    // pattern router, which must pick an averaging template.
    let resolved = expect_query(pipeline.resolve("who leads in slugging this year").await);
    assert_eq!(
        resolved.source,
        QuerySource::Template("current_year_rate_leaders".to_string())
    );
    assert!(resolved.sql_text.contains("AVG(val)"));
    assert!(!resolved.sql_text.contains("SUM(val)"));
    assert_eq!(resolved.bound_params["season"].to_string(), "2025");
}

#[tokio::test]
async fn test_qualified_template_route_binds_settings_pa_floor() {
    let templates = TemplateSet::from_path("assets/sql_templates.yaml").unwrap();
    let mut settings = Settings::default();
    settings.leaderboard.qualified_min_pa = 502;
    // No catalog, so the question reaches the pattern router.
    let pipeline =
        Pipeline::new(settings, templates).with_seasons(SeasonContext::new(CURRENT_YEAR));

    let resolved = expect_query(pipeline.resolve("qualified home run leaders in 2021").await);
    assert_eq!(
        resolved.source,
        QuerySource::Template("leaders_batting_qualified_counting".to_string())
    );
    assert!(resolved.sql_text.contains("WHERE pa >= :min_pa"));
    assert_eq!(resolved.bound_params["min_pa"].to_string(), "502");
    assert_eq!(resolved.bound_params["season"].to_string(), "2021");
}

#[tokio::test]
async fn test_unavailable_data_refused_without_any_sql() {
    let pipeline = deterministic_pipeline();
    let reasons = expect_refusal(
        pipeline
            .resolve("which left-handed hitters perform best against lefties")
            .await,
    );
    assert!(reasons[0].contains("not in the database"));
}

#[tokio::test]
async fn test_model_fallback_produces_vetted_sql() {
    let pipeline = model_pipeline(&[
        "```sql\nSELECT name, w FROM teams WHERE yearid = 1998 ORDER BY w DESC LIMIT 1\n```",
    ]);
    let resolved = expect_query(
        pipeline
            .resolve("which team won the most games in 1998")
            .await,
    );
    assert_eq!(resolved.source, QuerySource::Model);
    // Code fences stripped before linting.
    assert!(resolved.sql_text.starts_with("SELECT"));
    assert!(!resolved.sql_text.contains("```"));
}

#[tokio::test]
async fn test_model_refusal_text_becomes_refusal() {
    let pipeline = model_pipeline(&["I cannot answer that with the available tables."]);
    let reasons = expect_refusal(
        pipeline
            .resolve("what color are the dugout benches")
            .await,
    );
    assert!(!reasons.is_empty());
}

#[tokio::test]
async fn test_model_sql_violating_season_rules_is_rejected() {
    // Current-season question answered from the Lahman tables.
    let pipeline = model_pipeline(&["SELECT * FROM batting WHERE yearid = 2025"]);
    let reasons = expect_refusal(
        pipeline
            .resolve("most triple plays turned in 2025")
            .await,
    );
    assert!(reasons.iter().any(|r| r.contains("FanGraphs")));
}

#[tokio::test]
async fn test_model_sql_missing_trade_safeguards_is_rejected() {
    let pipeline = model_pipeline(&[
        "SELECT name, hr FROM fangraphs_batting_lahman_like \
         WHERE season = 2019 ORDER BY hr DESC LIMIT 10",
    ]);
    let reasons = expect_refusal(
        pipeline
            .resolve("most longballs smashed during 2019")
            .await,
    );
    assert!(reasons
        .iter()
        .any(|r| r.contains("traded-player safeguards")));
}

#[tokio::test]
async fn test_no_model_backend_means_refusal_not_error() {
    let pipeline = deterministic_pipeline();
    let reasons = expect_refusal(pipeline.resolve("tell me about the 1994 strike").await);
    assert!(reasons[0].contains("no model backend"));
}
