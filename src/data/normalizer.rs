//! Coerces raw JSON bet/opportunity payloads into canonical records.
//!
//! The upstream service serializes numbers inconsistently (odds as `"1.85"`
//! or `1.85`, profit as `null` until settlement), so every numeric field goes
//! through one set of coercion rules:
//!
//! - Numbers pass through; strings are parsed with `parseFloat` semantics
//!   (longest numeric prefix, so `"2.10 "` and `"12%"` both parse).
//! - Rate/percentage/size fields that fail to parse become `0`.
//! - Profit and CLV fields that fail to parse become `None`, keeping
//!   "no data" distinct from "zero".
//!
//! `normalize*` never fail. Dropping records with a missing identity or an
//! unusable stake/odds value is the job of the `*_batch` helpers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

use super::models::{Batch, BetRecord, BetResult, BookmakerQuote, NormalizedRecord, OpportunityRecord};

// =============================================================================
// Field aliases
// =============================================================================

const ID_KEYS: &[&str] = &["id", "bet_id", "betId"];
const MATCH_KEYS: &[&str] = &["match", "match_name", "matchName", "event", "event_name", "game"];
const SPORT_KEYS: &[&str] = &["sport", "league", "sport_key", "sportKey"];
const BOOKMAKER_KEYS: &[&str] = &["bookmaker", "sportsbook", "book"];
const BEST_BOOKMAKER_KEYS: &[&str] = &["best_bookmaker", "bestBookmaker", "bookmaker"];
const OUTCOME_KEYS: &[&str] = &["outcome", "selection", "pick", "bet_on"];
const CATEGORY_KEYS: &[&str] = &["bet_type", "betType", "category", "market_type"];
const ODDS_KEYS: &[&str] = &["odds", "decimal_odds", "decimalOdds", "price"];
const BEST_ODDS_KEYS: &[&str] = &["best_odds", "bestOdds", "odds"];
const STAKE_KEYS: &[&str] = &["stake", "amount", "stake_amount"];
const RESULT_KEYS: &[&str] = &["result", "status"];
const PROFIT_KEYS: &[&str] = &["actual_profit", "actualProfit", "profit"];
const CLV_KEYS: &[&str] = &["clv", "clv_pct", "clvPct", "closing_line_value"];
const EDGE_KEYS: &[&str] = &["edge_pct", "edgePct", "edge", "edge_percent"];
const BOOKMAKER_COUNT_KEYS: &[&str] = &["bookmaker_count", "bookmakerCount", "num_bookmakers", "books_count"];
const QUOTE_LIST_KEYS: &[&str] = &["quotes", "bookmaker_quotes"];
const QUOTE_MAP_KEYS: &[&str] = &["bookmaker_odds", "bookmakerOdds", "all_odds"];
const CREATED_AT_KEYS: &[&str] = &["created_at", "createdAt", "placed_at", "timestamp", "date"];

// =============================================================================
// Record normalization
// =============================================================================

/// Normalize a raw payload, deciding from its fields whether it is a bet or
/// an opportunity. Payloads with a stake or result are bets.
pub fn normalize(raw: &Value) -> NormalizedRecord {
    let looks_like_bet = field(raw, STAKE_KEYS).is_some() || field(raw, RESULT_KEYS).is_some();
    let looks_like_opportunity =
        field(raw, EDGE_KEYS).is_some() || field(raw, &["best_odds", "bestOdds"]).is_some();

    if looks_like_opportunity && !looks_like_bet {
        NormalizedRecord::Opportunity(normalize_opportunity(raw))
    } else {
        NormalizedRecord::Bet(normalize_bet(raw))
    }
}

pub fn normalize_bet(raw: &Value) -> BetRecord {
    BetRecord {
        id: text(raw, ID_KEYS).unwrap_or_default(),
        match_name: match_identity(raw).unwrap_or_default(),
        sport: text(raw, SPORT_KEYS),
        bookmaker: text(raw, BOOKMAKER_KEYS),
        outcome: text(raw, OUTCOME_KEYS),
        odds: rate(raw, ODDS_KEYS),
        stake: rate(raw, STAKE_KEYS),
        category: text(raw, CATEGORY_KEYS),
        result: text(raw, RESULT_KEYS).and_then(|s| BetResult::parse(&s)),
        actual_profit: field(raw, PROFIT_KEYS).and_then(parse_float),
        clv_pct: field(raw, CLV_KEYS).and_then(parse_float),
        created_at: field(raw, CREATED_AT_KEYS).and_then(parse_timestamp),
    }
}

pub fn normalize_opportunity(raw: &Value) -> OpportunityRecord {
    let quotes = quotes(raw);
    let bookmaker_count = field(raw, BOOKMAKER_COUNT_KEYS)
        .and_then(parse_float)
        .map(|n| n.trunc().to_u32().unwrap_or(0))
        .unwrap_or(quotes.len() as u32);

    OpportunityRecord {
        match_name: match_identity(raw).unwrap_or_default(),
        sport: text(raw, SPORT_KEYS),
        outcome: text(raw, OUTCOME_KEYS),
        best_odds: rate(raw, BEST_ODDS_KEYS),
        bookmaker: text(raw, BEST_BOOKMAKER_KEYS),
        edge_pct: rate(raw, EDGE_KEYS),
        bookmaker_count,
        quotes,
        created_at: field(raw, CREATED_AT_KEYS).and_then(parse_timestamp),
    }
}

// =============================================================================
// Batch normalization
// =============================================================================

/// Normalize a snapshot of raw bets, dropping malformed entries.
pub fn normalize_bets(raws: &[Value]) -> Batch<BetRecord> {
    let mut batch = Batch::default();
    for (index, raw) in raws.iter().enumerate() {
        let bet = normalize_bet(raw);
        match bet.validate() {
            Ok(()) => batch.records.push(bet),
            Err(reason) => {
                debug!(index, reason = %reason, "Dropping malformed bet record");
                batch.skipped += 1;
            }
        }
    }
    if batch.skipped > 0 {
        warn!(
            skipped = batch.skipped,
            kept = batch.records.len(),
            "Malformed bet records skipped"
        );
    }
    batch
}

/// Normalize a snapshot of raw opportunities, dropping malformed entries.
pub fn normalize_opportunities(raws: &[Value]) -> Batch<OpportunityRecord> {
    let mut batch = Batch::default();
    for (index, raw) in raws.iter().enumerate() {
        let opp = normalize_opportunity(raw);
        match opp.validate() {
            Ok(()) => batch.records.push(opp),
            Err(reason) => {
                debug!(index, reason = %reason, "Dropping malformed opportunity record");
                batch.skipped += 1;
            }
        }
    }
    if batch.skipped > 0 {
        warn!(
            skipped = batch.skipped,
            kept = batch.records.len(),
            "Malformed opportunity records skipped"
        );
    }
    batch
}

// =============================================================================
// Coercion helpers
// =============================================================================

/// `parseFloat` for JSON values. `None` plays the role of `NaN`.
pub fn parse_float(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => parse_numeric_str(&n.to_string()),
        },
        Value::String(s) => numeric_prefix(s.trim_start()).and_then(parse_numeric_str),
        _ => None,
    }
}

/// Parse a timestamp in RFC 3339, `YYYY-MM-DD HH:MM:SS`, naive ISO, or
/// plain date form. Integers are epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// First present, non-null value among the aliases.
fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

fn text(raw: &Value, keys: &[&str]) -> Option<String> {
    match field(raw, keys)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn rate(raw: &Value, keys: &[&str]) -> Decimal {
    field(raw, keys)
        .and_then(parse_float)
        .unwrap_or(Decimal::ZERO)
}

fn match_identity(raw: &Value) -> Option<String> {
    if let Some(name) = text(raw, MATCH_KEYS) {
        return Some(name);
    }
    let home = text(raw, &["home_team", "homeTeam"])?;
    let away = text(raw, &["away_team", "awayTeam"])?;
    Some(format!("{home} vs {away}"))
}

fn quotes(raw: &Value) -> Vec<BookmakerQuote> {
    if let Some(Value::Array(items)) = field(raw, QUOTE_LIST_KEYS) {
        return items
            .iter()
            .filter_map(|item| {
                let bookmaker = text(item, &["bookmaker", "name", "book"])?;
                let odds = field(item, &["odds", "price"]).and_then(parse_float)?;
                Some(BookmakerQuote { bookmaker, odds })
            })
            .collect();
    }
    if let Some(Value::Object(map)) = field(raw, QUOTE_MAP_KEYS) {
        return map
            .iter()
            .filter_map(|(bookmaker, odds)| {
                Some(BookmakerQuote {
                    bookmaker: bookmaker.clone(),
                    odds: parse_float(odds)?,
                })
            })
            .collect();
    }
    Vec::new()
}

/// Longest prefix of `s` that `parseFloat` would consume.
fn numeric_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - (i + 1);
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    Some(&s[..i])
}

fn parse_numeric_str(s: &str) -> Option<Decimal> {
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let lower = body.to_lowercase();
    let (mantissa, exponent) = match lower.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (lower.as_str(), None),
    };

    let mut mantissa = mantissa.trim_end_matches('.').to_string();
    if mantissa.starts_with('.') {
        mantissa.insert(0, '0');
    }

    let value = match exponent {
        Some(exp) => Decimal::from_scientific(&format!("{mantissa}e{exp}")).ok()?,
        None => Decimal::from_str(&mantissa).ok()?,
    };
    Some(if negative { -value } else { value })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MalformedRecord;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_float_matches_js_semantics() {
        assert_eq!(parse_float(&json!(1.85)), Some(dec!(1.85)));
        assert_eq!(parse_float(&json!(42)), Some(dec!(42)));
        assert_eq!(parse_float(&json!("2.10")), Some(dec!(2.10)));
        assert_eq!(parse_float(&json!("  -3.5xyz")), Some(dec!(-3.5)));
        assert_eq!(parse_float(&json!("12%")), Some(dec!(12)));
        assert_eq!(parse_float(&json!(".5")), Some(dec!(0.5)));
        assert_eq!(parse_float(&json!("5.")), Some(dec!(5)));
        assert_eq!(parse_float(&json!("1.5e2")), Some(dec!(150)));
        assert_eq!(parse_float(&json!("3e")), Some(dec!(3)));
        assert_eq!(parse_float(&json!("abc")), None);
        assert_eq!(parse_float(&json!("")), None);
        assert_eq!(parse_float(&json!(".")), None);
        assert_eq!(parse_float(&json!(null)), None);
        assert_eq!(parse_float(&json!(true)), None);
    }

    #[test]
    fn test_unparseable_profit_is_none_but_rate_is_zero() {
        let bet = normalize_bet(&json!({
            "id": 7,
            "match": "A vs B",
            "odds": "n/a",
            "stake": "10",
            "actual_profit": "n/a",
            "clv": null,
        }));
        assert_eq!(bet.id, "7");
        assert_eq!(bet.odds, Decimal::ZERO);
        assert_eq!(bet.stake, dec!(10));
        assert_eq!(bet.actual_profit, None);
        assert_eq!(bet.clv_pct, None);
    }

    #[test]
    fn test_zero_profit_is_kept_distinct_from_missing() {
        let bet = normalize_bet(&json!({"id": "b1", "actual_profit": "0"}));
        assert_eq!(bet.actual_profit, Some(Decimal::ZERO));
    }

    #[test]
    fn test_normalize_is_total_on_non_objects() {
        for raw in [json!(null), json!(3), json!("text"), json!([1, 2])] {
            match normalize(&raw) {
                NormalizedRecord::Bet(bet) => {
                    assert!(bet.id.is_empty());
                    assert!(bet.validate().is_err());
                }
                NormalizedRecord::Opportunity(_) => panic!("expected bet fallback"),
            }
        }
    }

    #[test]
    fn test_normalize_detects_opportunity() {
        let raw = json!({
            "home_team": "Lakers",
            "away_team": "Celtics",
            "sport": "nba",
            "best_odds": "2.25",
            "best_bookmaker": "Pinnacle",
            "edge_pct": "11.5",
            "bookmaker_odds": {"Pinnacle": 2.25, "Bet365": "2.05", "Broken": "x"},
        });
        match normalize(&raw) {
            NormalizedRecord::Opportunity(opp) => {
                assert_eq!(opp.match_name, "Lakers vs Celtics");
                assert_eq!(opp.best_odds, dec!(2.25));
                assert_eq!(opp.edge_pct, dec!(11.5));
                assert_eq!(opp.bookmaker.as_deref(), Some("Pinnacle"));
                assert_eq!(opp.quotes.len(), 2);
                assert_eq!(opp.bookmaker_count, 2);
            }
            NormalizedRecord::Bet(_) => panic!("expected opportunity"),
        }
    }

    #[test]
    fn test_result_parsing() {
        let won = normalize_bet(&json!({"result": "WON"}));
        let lost = normalize_bet(&json!({"result": "loss"}));
        let open = normalize_bet(&json!({"result": "pending"}));
        let unknown = normalize_bet(&json!({"result": "void"}));
        assert_eq!(won.result, Some(BetResult::Won));
        assert_eq!(lost.result, Some(BetResult::Lost));
        assert_eq!(open.result, Some(BetResult::Pending));
        assert_eq!(unknown.result, None);
    }

    #[test]
    fn test_timestamp_formats() {
        let rfc = parse_timestamp(&json!("2025-03-01T12:30:00Z")).unwrap();
        let naive = parse_timestamp(&json!("2025-03-01 12:30:00")).unwrap();
        let iso = parse_timestamp(&json!("2025-03-01T12:30:00.250")).unwrap();
        let date = parse_timestamp(&json!("2025-03-01")).unwrap();
        assert_eq!(rfc, naive);
        assert!(iso > rfc);
        assert!(date < rfc);
        assert!(parse_timestamp(&json!("yesterday")).is_none());
        assert_eq!(
            parse_timestamp(&json!(0)),
            DateTime::from_timestamp_millis(0)
        );
    }

    #[test]
    fn test_batch_drops_and_counts_malformed() {
        let raws = vec![
            json!({"id": "1", "match": "A vs B", "odds": 2.0, "stake": 10}),
            json!({"match": "A vs B", "odds": 2.0, "stake": 10}),
            json!({"id": "3", "match": "A vs B", "odds": "1.0", "stake": 10}),
            json!({"id": "4", "match": "A vs B", "odds": 2.0, "stake": "0"}),
            json!({"id": "5", "match": "C vs D", "odds": "1.91", "stake": "25"}),
        ];
        let batch = normalize_bets(&raws);
        assert_eq!(batch.skipped, 3);
        let ids: Vec<&str> = batch.records.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
    }

    #[test]
    fn test_out_of_range_records_are_malformed() {
        let bet = normalize_bet(&json!({
            "id": "1", "match": "A vs B", "odds": 2.0, "stake": "2000000000000000",
        }));
        assert_eq!(
            bet.validate(),
            Err(MalformedRecord::OutOfRange {
                field: "stake",
                value: dec!(2000000000000000),
            })
        );

        let opps = normalize_opportunities(&[
            json!({"match": "A vs B", "best_odds": 2.0, "edge_pct": "1e20"}),
            json!({"match": "C vs D", "best_odds": 2.0, "edge_pct": 4}),
        ]);
        assert_eq!(opps.skipped, 1);
        assert_eq!(opps.records[0].match_name, "C vs D");
    }
}
