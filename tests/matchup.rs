use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand::rngs::StdRng;

use cat5::config::PeriodCalendar;
use cat5::error::Cat5Error;
use cat5::league::{LeagueSnapshot, Side};
use cat5::lineup::Lineup;
use cat5::matchup::{Matchup, SearchOptions};
use cat5::period::MatchupPeriod;
use cat5::provider::parse_league_snapshot_json;

const STARTS_PER_GAMEDAY: u32 = 3;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn league() -> LeagueSnapshot {
    parse_league_snapshot_json(&read_fixture("league_snapshot.json")).expect("fixture should parse")
}

fn period(league: &LeagueSnapshot) -> MatchupPeriod {
    let calendar = PeriodCalendar::builtin().expect("built-in calendar");
    MatchupPeriod::new(league, &calendar, STARTS_PER_GAMEDAY).expect("period 12 is known")
}

fn from_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 9)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn period_collects_league_game_days() {
    let league = league();
    let period = period(&league);
    assert_eq!(
        period.game_day_ids.iter().copied().collect::<Vec<_>>(),
        (77..=83).collect::<Vec<_>>()
    );
    assert_eq!(period.max_gp, 21);
}

#[test]
fn eligible_starts_respect_period_cutoff_and_availability() {
    let league = league();
    let period = period(&league);
    let matchup = Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();

    let home = matchup.home_lineup();
    let away = matchup.away_lineup();
    assert_eq!(home.eligible_starts().len(), 11);
    assert_eq!(away.eligible_starts().len(), 12);

    for lineup in [home, away] {
        for e in lineup.eligible_starts() {
            assert!(period.contains_game_day(e.start.game_day_id()));
            assert!(e.start.game_time() >= from_date());
            assert!(!e.start.injured());
        }
    }
    let ids = |lineup: &Lineup<'_>| -> HashSet<u32> {
        lineup
            .eligible_starts()
            .iter()
            .map(|e| e.start.player_id())
            .collect()
    };
    // 105 is injured, 204 suspended.
    assert!(!ids(home).contains(&105));
    assert!(!ids(away).contains(&204));
    assert!(ids(away).contains(&206));
}

#[test]
fn remaining_games_come_from_box_score() {
    let league = league();
    let period = period(&league);
    let matchup = Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();
    assert_eq!(matchup.home_lineup().remaining_gp(), 8);
    assert_eq!(matchup.away_lineup().remaining_gp(), 9);
}

#[test]
fn selections_fill_min_of_eligible_and_remaining() {
    let league = league();
    let period = period(&league);
    let mut rng = StdRng::seed_from_u64(99);
    for box_score in league.box_scores.iter().filter(|b| !b.is_bye()) {
        let mut matchup = Matchup::new(&league, box_score, &period, from_date()).unwrap();
        for side in [Side::Home, Side::Away] {
            let lineup = matchup.lineup_mut(side);
            let expected = lineup.eligible_starts().len().min(lineup.remaining_gp());

            assert_eq!(lineup.len(), expected);
            lineup.set_probable();
            assert_eq!(lineup.len(), expected);
            lineup.set_default();
            assert_eq!(lineup.len(), expected);
            for _ in 0..50 {
                lineup.set_randomly(false, 20.0, 80.0, &mut rng).unwrap();
                assert_eq!(lineup.len(), expected);
                let uniq: HashSet<_> = lineup.selected().iter().collect();
                assert_eq!(uniq.len(), expected);
            }
        }
    }
}

#[test]
fn probable_lineup_prefers_regular_starters() {
    let league = league();
    let period = period(&league);
    let mut matchup = Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();
    matchup.set_probable();
    let picked: HashSet<u32> = matchup
        .home_lineup()
        .selected_starts()
        .map(|s| s.player_id())
        .collect();
    // Omar Kent (106) has no games this season and the lowest ownership.
    assert!(!picked.contains(&106));
    assert!(picked.contains(&101));
    assert!(picked.contains(&103));
}

#[test]
fn random_selection_on_probable_weight_favours_regular_starters() {
    let league = league();
    let period = period(&league);
    let mut matchup = Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();
    let home = matchup.lineup_mut(Side::Home);
    let starts_of_104 = |lineup: &Lineup<'_>| {
        lineup
            .selected_starts()
            .filter(|s| s.player_id() == 104)
            .count()
    };
    let regular = home
        .eligible_starts()
        .iter()
        .find(|e| e.start.player_id() == 104)
        .unwrap();
    assert!(regular.probable_weight > regular.std_weight);

    let mut rng = StdRng::seed_from_u64(3);
    let (mut by_ownership, mut by_probable) = (0, 0);
    for _ in 0..1000 {
        home.set_randomly(false, 20.0, 80.0, &mut rng).unwrap();
        by_ownership += starts_of_104(home);
        home.set_randomly(true, 20.0, 80.0, &mut rng).unwrap();
        assert_eq!(home.len(), home.remaining_gp());
        by_probable += starts_of_104(home);
    }
    assert!(
        by_probable > by_ownership + 150,
        "{by_probable} vs {by_ownership}"
    );
}

#[test]
fn lineup_for_team_outside_the_box_score_fails() {
    let league = league();
    let period = period(&league);
    let outsider = league.team(3).unwrap();
    let err = Lineup::new(outsider, &league.box_scores[0], &period, from_date()).unwrap_err();
    assert_eq!(err, Cat5Error::TeamNotInMatchup { team_id: 3 });
}

#[test]
fn bye_week_has_no_matchup() {
    let league = league();
    let period = period(&league);
    let bye = league.box_scores.iter().find(|b| b.is_bye()).unwrap();
    let err = Matchup::new(&league, bye, &period, from_date()).unwrap_err();
    assert_eq!(err, Cat5Error::MissingOpponent { team_id: 5 });
}

#[test]
fn optimizer_is_reproducible_for_a_seed() {
    let league = league();
    let period = period(&league);
    let run = || {
        let mut matchup =
            Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();
        matchup.set_probable();
        let ranking = matchup.optimize_home_lineup(300, 42).unwrap();
        let ranking: Vec<(u32, f64)> = ranking
            .iter()
            .map(|pv| (pv.player.player_id, pv.value))
            .collect();
        (ranking, matchup.home_lineup().selected().to_vec())
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert!(!first.0.is_empty());
}

#[test]
fn optimizer_result_does_not_depend_on_thread_count() {
    let league = league();
    let period = period(&league);
    let run = |threads: usize| {
        let mut matchup =
            Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();
        matchup.set_probable();
        let opts = SearchOptions {
            parallelism: threads,
            ..SearchOptions::new(200, 7)
        };
        let ranking = matchup.optimize_lineup(Side::Away, &opts).unwrap();
        let ranking: Vec<(u32, f64)> = ranking
            .iter()
            .map(|pv| (pv.player.player_id, pv.value))
            .collect();
        (ranking, matchup.away_lineup().selected().to_vec())
    };
    assert_eq!(run(1), run(4));
}

#[test]
fn ranking_is_sorted_and_bounded() {
    let league = league();
    let period = period(&league);
    let mut matchup = Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();
    matchup.set_probable();
    let ranking = matchup.optimize_home_lineup(400, 3).unwrap();

    let eligible: HashSet<u32> = matchup
        .home_lineup()
        .eligible_starts()
        .iter()
        .map(|e| e.start.player_id())
        .collect();
    let mut seen = HashSet::new();
    for pair in ranking.windows(2) {
        assert!(pair[0].value >= pair[1].value);
    }
    for pv in &ranking {
        assert!((0.0..=1.0).contains(&pv.value));
        assert!(eligible.contains(&pv.player.player_id));
        assert!(seen.insert(pv.player.player_id));
    }
    assert_eq!(matchup.home_lineup().len(), 8);
}

#[test]
fn optimized_lineups_do_not_lose_to_probable() {
    let league = league();
    let period = period(&league);
    let mut matchup = Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();

    matchup.set_probable();
    let probable_home = matchup.get_model().predict_win().unwrap();
    matchup.optimize_home_lineup(2000, 11).unwrap();
    let optimized_home = matchup.get_model().predict_win().unwrap();
    assert!(
        optimized_home + 1e-9 >= probable_home,
        "{optimized_home} < {probable_home}"
    );

    matchup.set_probable();
    let probable_away = 1.0 - matchup.get_model().predict_win().unwrap();
    matchup.optimize_away_lineup(2000, 12).unwrap();
    let optimized_away = 1.0 - matchup.get_model().predict_win().unwrap();
    assert!(
        optimized_away + 1e-9 >= probable_away,
        "{optimized_away} < {probable_away}"
    );
}

#[test]
fn everything_fits_when_eligible_starts_are_scarce() {
    let league = league();
    let period = period(&league);
    let mut matchup = Matchup::new(&league, &league.box_scores[1], &period, from_date()).unwrap();
    let home = matchup.home_lineup();
    assert!(home.eligible_starts().len() <= home.remaining_gp());
    let before = home.selected().to_vec();
    let ranking = matchup.optimize_home_lineup(50, 1).unwrap();
    let mut after = matchup.home_lineup().selected().to_vec();
    after.sort_unstable();
    let mut before = before;
    before.sort_unstable();
    assert_eq!(before, after);
    assert!(!ranking.is_empty());
}
