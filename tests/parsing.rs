use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use cat5::league::{Side, Stat};
use cat5::provider::parse_league_snapshot_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_league_snapshot_fixture() {
    let league = parse_league_snapshot_json(&read_fixture("league_snapshot.json"))
        .expect("fixture should parse");
    assert_eq!(league.league_id, "98765");
    assert_eq!(league.year, 2025);
    assert_eq!(league.current_matchup_period, 12);
    assert_eq!(league.teams.len(), 5);
    assert_eq!(league.box_scores.len(), 3);

    let hoop = league.team(1).unwrap();
    assert_eq!(hoop.abbrev, "HOOP");
    assert_eq!(hoop.roster.len(), 6);
    assert_eq!(hoop.record(), "7-3-0");
}

#[test]
fn player_schedule_and_stat_windows() {
    let league = parse_league_snapshot_json(&read_fixture("league_snapshot.json"))
        .expect("fixture should parse");
    let marcus = league.players().find(|p| p.player_id == 101).unwrap();

    let jan_6 = &marcus.schedule[&77];
    assert_eq!(jan_6.date.date(), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());

    let stats = &marcus.stats;
    let projected = stats.projected.as_ref().unwrap();
    assert!(projected.avg.value(Stat::FgPct) > 0.0);
    let gps: Vec<f64> = stats
        .windows()
        .iter()
        .map(|w| w.unwrap().games_played())
        .collect();
    assert_eq!(gps, vec![7.0, 15.0, 28.0, 38.0]);
}

#[test]
fn injury_flags_and_box_score_sides() {
    let league = parse_league_snapshot_json(&read_fixture("league_snapshot.json"))
        .expect("fixture should parse");
    let injured = league.players().find(|p| p.player_id == 105).unwrap();
    assert!(injured.injured);
    assert!(!injured.is_available());
    let suspended = league.players().find(|p| p.player_id == 204).unwrap();
    assert!(suspended.is_suspended());

    let box_score = &league.box_scores[0];
    assert_eq!(box_score.side_of(2), Some(Side::Away));
    assert_eq!(box_score.stats(Side::Home).value(Stat::Gp), 13.0);
    assert!(league.box_scores[2].is_bye());
}

#[test]
fn missing_optional_fields_default() {
    let raw = r#"{
        "league_id": "1",
        "year": 2026,
        "current_matchup_period": 3,
        "teams": [{"team_id": 9, "abbrev": "NEW", "roster": [{"player_id": 1, "name": "Rookie"}]}],
        "box_scores": [{"home_team": 9}]
    }"#;
    let league = parse_league_snapshot_json(raw).expect("minimal snapshot should parse");
    let rookie = &league.teams[0].roster[0];
    assert_eq!(rookie.injury_status, "ACTIVE");
    assert_eq!(rookie.percent_owned, 0.0);
    assert!(rookie.schedule.is_empty());
    assert!(rookie.stats.projected.is_none());
    assert!(league.box_scores[0].is_bye());
}

#[test]
fn malformed_snapshot_is_an_error() {
    assert!(parse_league_snapshot_json("{\"league_id\": 1}").is_err());
    assert!(parse_league_snapshot_json("null").is_err());
}
