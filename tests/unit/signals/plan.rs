//! Unit tests for prompt building, narrative parsing and the fallback plan

use candlescope::models::PlanSource;
use candlescope::signals::{
    build_prompt, fallback_plan, parse_trade_plan, strip_code_fences, PlanParseError, PromptFacts,
};

#[test]
fn test_fallback_plan_levels() {
    let plan = fallback_plan(100.0, 2.4);
    assert_eq!(plan.entry, 100.0);
    assert_eq!(plan.target, 105.0);
    assert_eq!(plan.stop_loss, 95.0);
    assert_eq!(plan.confidence, 60.0);
    assert_eq!(plan.source, PlanSource::Fallback);
    assert!(plan.reason.contains("2.4x"));
}

#[test]
fn test_fallback_plan_rounds_to_cents() {
    let plan = fallback_plan(123.456, 1.0);
    assert_eq!(plan.target, 129.63);
    assert_eq!(plan.stop_loss, 117.28);
}

#[test]
fn test_strip_json_fence() {
    let raw = "```json\n{\"target\": 110}\n```";
    assert_eq!(strip_code_fences(raw), "{\"target\": 110}");
}

#[test]
fn test_strip_bare_fence_and_whitespace() {
    assert_eq!(strip_code_fences("  ```\n{}\n```  "), "{}");
    assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
}

#[test]
fn test_strip_fence_after_prose() {
    let raw = "Here is the plan:\n```json\n{\"target\": 110, \"stopLoss\": 95}\n```\nGood luck!";
    assert_eq!(strip_code_fences(raw), "{\"target\": 110, \"stopLoss\": 95}");
}

#[test]
fn test_strip_single_line_fence() {
    assert_eq!(strip_code_fences("```json{\"target\": 110}```"), "{\"target\": 110}");
    assert_eq!(strip_code_fences("```{\"target\": 110}```"), "{\"target\": 110}");
}

#[test]
fn test_parse_plan_wrapped_in_prose_and_fence() {
    let raw = "Here is the plan:\n```json{\"entry\": 1000, \"target\": 1100, \"stopLoss\": 950, \"reason\": \"Breakout\"}```";
    let plan = parse_trade_plan(raw, 990.0).unwrap();
    assert_eq!(plan.entry, 1000.0);
    assert_eq!(plan.target, 1100.0);
    assert_eq!(plan.source, PlanSource::Narrative);
}

#[test]
fn test_parse_fenced_plan() {
    let raw = "```json\n{\"entry\": 1000, \"target\": 1100, \"stopLoss\": 950, \"confidence\": 72, \"reason\": \"Volume breakout\"}\n```";
    let plan = parse_trade_plan(raw, 990.0).unwrap();
    assert_eq!(plan.entry, 1000.0);
    assert_eq!(plan.target, 1100.0);
    assert_eq!(plan.stop_loss, 950.0);
    assert_eq!(plan.confidence, 72.0);
    assert_eq!(plan.reason, "Volume breakout");
    assert_eq!(plan.source, PlanSource::Narrative);
}

#[test]
fn test_parse_uses_default_entry_and_scales_fractional_confidence() {
    let raw = r#"{"target": 1100, "stopLoss": 950, "confidence": 0.8, "reason": "ok"}"#;
    let plan = parse_trade_plan(raw, 1000.0).unwrap();
    assert_eq!(plan.entry, 1000.0);
    assert!((plan.confidence - 80.0).abs() < 1e-9);
}

#[test]
fn test_parse_confidence_of_one_stays_one_percent() {
    let raw = r#"{"target": 1100, "stopLoss": 950, "confidence": 1}"#;
    assert_eq!(parse_trade_plan(raw, 1000.0).unwrap().confidence, 1.0);

    let raw = r#"{"target": 1100, "stopLoss": 950, "confidence": 0.65}"#;
    assert!((parse_trade_plan(raw, 1000.0).unwrap().confidence - 65.0).abs() < 1e-9);
}

#[test]
fn test_parse_rejects_non_json() {
    let err = parse_trade_plan("Sure! Buy around 100 and sell at 110.", 100.0).unwrap_err();
    assert!(matches!(err, PlanParseError::InvalidJson(_)));
}

#[test]
fn test_parse_rejects_empty() {
    assert!(matches!(parse_trade_plan("   ", 100.0), Err(PlanParseError::Empty)));
}

#[test]
fn test_parse_rejects_inverted_levels() {
    let raw = r#"{"entry": 100, "target": 95, "stopLoss": 105}"#;
    let err = parse_trade_plan(raw, 100.0).unwrap_err();
    assert!(matches!(err, PlanParseError::InvalidOrdering { .. }));
}

#[test]
fn test_parse_rejects_missing_stop() {
    let raw = r#"{"entry": 100, "target": 110}"#;
    let err = parse_trade_plan(raw, 100.0).unwrap_err();
    assert!(matches!(err, PlanParseError::InvalidNumber("stopLoss")));
}

#[test]
fn test_prompt_mentions_every_fact() {
    let prompt = build_prompt(&PromptFacts {
        symbol: "BBCA.JK".to_string(),
        sector: Some("Financial Services".to_string()),
        price: 9875.0,
        change_percent: 2.5,
        volume_ratio: 1.8,
        rsi: 58.3,
        ema20: 9700.0,
    });
    for fragment in ["BBCA.JK", "Financial Services", "9875.00", "2.50%", "1.80x", "58.3", "9700.00", "stopLoss"] {
        assert!(prompt.contains(fragment), "missing {}", fragment);
    }
}

#[test]
fn test_prompt_without_sector() {
    let prompt = build_prompt(&PromptFacts {
        symbol: "TLKM.JK".to_string(),
        sector: None,
        price: 3000.0,
        change_percent: 1.0,
        volume_ratio: 1.0,
        rsi: 50.0,
        ema20: 2950.0,
    });
    assert!(prompt.contains("Unknown"));
}
