use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use statrs::distribution::{ContinuousCDF, Discrete, DiscreteCDF, Normal, Poisson};

use crate::error::{Cat5Error, Result};
use crate::league::{BoxScore, Stat, StatLine};
use crate::start::Projector;

pub const CATEGORIES_TO_WIN: usize = 5;

/// Both expected totals must exceed this before the Skellam distribution is
/// replaced by its normal approximation.
const NORMAL_APPROX_MIN_MEAN: f64 = 10.0;

const EPS: f64 = 1e-9;

pub type CategoryProbs = BTreeMap<Stat, f64>;

/// Win probabilities for one fixed pair of lineups. Built from the current
/// category totals and the projected starts of each side; results are cached
/// per category for the life of the instance.
#[derive(Debug)]
pub struct Model<'a, S> {
    home_totals: &'a StatLine,
    away_totals: &'a StatLine,
    home_starts: Vec<&'a S>,
    away_starts: Vec<&'a S>,
    cache: RefCell<HashMap<Stat, f64>>,
}

impl<'a, S: Projector> Model<'a, S> {
    pub fn new<H, A>(
        home_totals: &'a StatLine,
        away_totals: &'a StatLine,
        home_starts: H,
        away_starts: A,
    ) -> Self
    where
        H: IntoIterator<Item = &'a S>,
        A: IntoIterator<Item = &'a S>,
    {
        Self {
            home_totals,
            away_totals,
            home_starts: home_starts.into_iter().collect(),
            away_starts: away_starts.into_iter().collect(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_box_score<H, A>(box_score: &'a BoxScore, home_starts: H, away_starts: A) -> Self
    where
        H: IntoIterator<Item = &'a S>,
        A: IntoIterator<Item = &'a S>,
    {
        Self::new(
            &box_score.home_stats,
            &box_score.away_stats,
            home_starts,
            away_starts,
        )
    }

    pub fn predict_cat(&self, stat: Stat) -> Result<f64> {
        if let Some(p) = self.cache.borrow().get(&stat) {
            return Ok(*p);
        }

        let p = if stat.is_count() {
            self.predict_count_cat(stat)?
        } else if stat.is_ratio() {
            self.predict_ratio_cat(stat)?
        } else {
            return Err(Cat5Error::InvalidCategory(stat.as_str().to_string()));
        };
        let p = clamp_prob(if stat.is_negative() { 1.0 - p } else { p });

        self.cache.borrow_mut().insert(stat, p);
        Ok(p)
    }

    pub fn predict_cat_named(&self, name: &str) -> Result<f64> {
        self.predict_cat(name.parse()?)
    }

    pub fn predict_cats(&self) -> Result<CategoryProbs> {
        let mut probs = CategoryProbs::new();
        for stat in Stat::SCORED {
            probs.insert(stat, self.predict_cat(stat)?);
        }
        Ok(probs)
    }

    pub fn predict_win(&self) -> Result<f64> {
        let probs = Stat::SCORED
            .iter()
            .map(|stat| self.predict_cat(*stat))
            .collect::<Result<Vec<_>>>()?;
        Ok(win_probability(&probs))
    }

    fn predict_count_cat(&self, stat: Stat) -> Result<f64> {
        let diff = self.home_totals.value(stat) - self.away_totals.value(stat);
        let mu_home = sum_projection(&self.home_starts, stat);
        let mu_away = sum_projection(&self.away_starts, stat);

        let below = if mu_home > NORMAL_APPROX_MIN_MEAN && mu_away > NORMAL_APPROX_MIN_MEAN {
            skellam_cdf_approx(-diff, mu_home, mu_away)?
        } else {
            skellam_cdf_continuous(-diff, mu_home, mu_away)?
        };
        Ok(1.0 - below)
    }

    /// Ratio categories: each start adds a binomial share of its projected
    /// attempts, approximated as normal and weighted by attempt share.
    fn predict_ratio_cat(&self, stat: Stat) -> Result<f64> {
        let Some((att_stat, make_stat)) = stat.ratio_parts() else {
            return Err(Cat5Error::InvalidCategory(stat.as_str().to_string()));
        };

        let home = RatioOutlook::new(
            self.home_totals.value(make_stat),
            self.home_totals.value(att_stat),
            &self.home_starts,
            att_stat,
            stat,
        );
        let away = RatioOutlook::new(
            self.away_totals.value(make_stat),
            self.away_totals.value(att_stat),
            &self.away_starts,
            att_stat,
            stat,
        );

        let diff = home.current - away.current;
        let sd = (home.var + away.var).sqrt().max(EPS);
        let dist = normal(home.mean - away.mean, sd)?;
        Ok(1.0 - dist.cdf(-diff))
    }
}

struct RatioOutlook {
    current: f64,
    mean: f64,
    var: f64,
}

impl RatioOutlook {
    fn new<S: Projector>(
        curr_make: f64,
        curr_att: f64,
        starts: &[&S],
        att_stat: Stat,
        ratio_stat: Stat,
    ) -> Self {
        let parts: Vec<(f64, f64)> = starts
            .iter()
            .map(|s| (s.projection(att_stat), s.projection(ratio_stat)))
            .collect();
        let att_total = (curr_att + parts.iter().map(|(att, _)| att).sum::<f64>()).max(EPS);

        let mean = parts
            .iter()
            .map(|(att, ratio)| (att / att_total) * ratio)
            .sum();
        let var = parts
            .iter()
            .map(|(att, ratio)| att * ratio * (1.0 - ratio))
            .sum::<f64>()
            / att_total.powi(2);

        Self {
            current: curr_make / att_total,
            mean,
            var,
        }
    }
}

fn sum_projection<S: Projector>(starts: &[&S], stat: Stat) -> f64 {
    starts.iter().map(|s| s.projection(stat)).sum()
}

pub fn win_probability(cat_probs: &[f64]) -> f64 {
    let lose_or_short = poisson_binomial_cdf(cat_probs, CATEGORIES_TO_WIN - 1);
    clamp_prob((1.0 - lose_or_short).max(0.0))
}

pub fn poisson_binomial_pmf(probs: &[f64]) -> Vec<f64> {
    let mut pmf = vec![0.0; probs.len() + 1];
    pmf[0] = 1.0;
    for (n, p) in probs.iter().enumerate() {
        let p = clamp_prob(*p);
        for k in (0..=n + 1).rev() {
            let stay = pmf[k] * (1.0 - p);
            let step = if k > 0 { pmf[k - 1] * p } else { 0.0 };
            pmf[k] = stay + step;
        }
    }
    pmf
}

pub fn poisson_binomial_cdf(probs: &[f64], k: usize) -> f64 {
    poisson_binomial_pmf(probs).iter().take(k + 1).sum()
}

/// Skellam CDF with ties at `k` split evenly: `CDF(k) - PMF(k) / 2`.
pub fn skellam_cdf_continuous(k: f64, mu1: f64, mu2: f64) -> Result<f64> {
    let mu1 = mu1.max(EPS);
    let mu2 = mu2.max(EPS);
    let cdf = skellam_cdf(k, mu1, mu2)?;
    let pmf = skellam_pmf(k, mu1, mu2)?;
    Ok(clamp_prob(cdf - 0.5 * pmf))
}

pub fn skellam_cdf_approx(k: f64, mu1: f64, mu2: f64) -> Result<f64> {
    let sd = (mu1 + mu2).max(0.0).sqrt().max(EPS);
    Ok(normal(mu1 - mu2, sd)?.cdf(k))
}

/// `P(X - Y <= k)` for `X ~ Poisson(mu1)`, `Y ~ Poisson(mu2)`.
pub fn skellam_cdf(k: f64, mu1: f64, mu2: f64) -> Result<f64> {
    let k = k.floor() as i64;
    // Sum over whichever variable has the narrower support.
    if mu2 <= mu1 {
        lower_tail(k, mu1, mu2)
    } else {
        // P(X - Y <= k) = 1 - P(Y - X <= -k - 1)
        Ok(1.0 - lower_tail(-k - 1, mu2, mu1)?)
    }
}

pub fn skellam_pmf(k: f64, mu1: f64, mu2: f64) -> Result<f64> {
    if k.fract() != 0.0 {
        return Ok(0.0);
    }
    let k = k as i64;
    let (k, mu_x, mu_y) = if mu2 <= mu1 {
        (k, mu1, mu2)
    } else {
        (-k, mu2, mu1)
    };
    let x = poisson(mu_x)?;
    let y = poisson(mu_y)?;
    let mut total = 0.0;
    for j in support(k, mu_y) {
        total += y.pmf(j) * x.pmf((k + j as i64) as u64);
    }
    Ok(total)
}

fn lower_tail(k: i64, mu_x: f64, mu_y: f64) -> Result<f64> {
    let x = poisson(mu_x)?;
    let y = poisson(mu_y)?;
    let mut total = 0.0;
    for j in support(k, mu_y) {
        total += y.pmf(j) * x.cdf((k + j as i64) as u64);
    }
    Ok(clamp_prob(total))
}

/// Values `j` of `Y` with non-negligible mass for which `k + j >= 0`.
fn support(k: i64, mu_y: f64) -> std::ops::RangeInclusive<u64> {
    let hi = (mu_y + 12.0 * mu_y.sqrt() + 25.0).ceil() as i64;
    let lo = (-k).max(0);
    if lo > hi {
        // Empty range.
        return 1..=0;
    }
    (lo as u64)..=(hi as u64)
}

fn poisson(mu: f64) -> Result<Poisson> {
    Poisson::new(mu.max(EPS)).map_err(|e| Cat5Error::Distribution(e.to_string()))
}

fn normal(mean: f64, sd: f64) -> Result<Normal> {
    Normal::new(mean, sd).map_err(|e| Cat5Error::Distribution(e.to_string()))
}

fn clamp_prob(p: f64) -> f64 {
    if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) }
}
