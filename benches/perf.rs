use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::{NaiveDate, NaiveDateTime};

use cat5::config::PeriodCalendar;
use cat5::league::LeagueSnapshot;
use cat5::matchup::Matchup;
use cat5::model::win_probability;
use cat5::period::MatchupPeriod;
use cat5::provider::parse_league_snapshot_json;

const SNAPSHOT_JSON: &str = include_str!("../tests/fixtures/league_snapshot.json");

fn league() -> LeagueSnapshot {
    parse_league_snapshot_json(SNAPSHOT_JSON).expect("valid fixture json")
}

fn from_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 9)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

fn bench_snapshot_parse(c: &mut Criterion) {
    c.bench_function("snapshot_parse", |b| {
        b.iter(|| {
            let league = parse_league_snapshot_json(black_box(SNAPSHOT_JSON)).unwrap();
            black_box(league.teams.len());
        })
    });
}

fn bench_predict_win(c: &mut Criterion) {
    let league = league();
    let calendar = PeriodCalendar::builtin().expect("built-in calendar");
    let period = MatchupPeriod::new(&league, &calendar, 3).expect("known period");
    let mut matchup =
        Matchup::new(&league, &league.box_scores[0], &period, from_date()).expect("matchup");
    matchup.set_probable();

    c.bench_function("model_predict_win", |b| {
        b.iter(|| {
            let model = matchup.get_model();
            black_box(model.predict_win().unwrap());
        })
    });
}

fn bench_poisson_binomial(c: &mut Criterion) {
    let probs = [0.31, 0.72, 0.55, 0.48, 0.9, 0.12, 0.66, 0.4, 0.58];
    c.bench_function("poisson_binomial_win", |b| {
        b.iter(|| black_box(win_probability(black_box(&probs))))
    });
}

fn bench_optimize(c: &mut Criterion) {
    let league = league();
    let calendar = PeriodCalendar::builtin().expect("built-in calendar");
    let period = MatchupPeriod::new(&league, &calendar, 3).expect("known period");

    let mut group = c.benchmark_group("optimizer");
    group.sample_size(10);
    group.bench_function("optimize_home_500", |b| {
        b.iter(|| {
            let mut matchup =
                Matchup::new(&league, &league.box_scores[0], &period, from_date()).unwrap();
            matchup.set_probable();
            let ranking = matchup.optimize_home_lineup(500, 17).unwrap();
            black_box(ranking.len());
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_snapshot_parse,
    bench_predict_win,
    bench_poisson_binomial,
    bench_optimize
);
criterion_main!(benches);
