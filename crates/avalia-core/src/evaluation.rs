//! Rating trends and evaluation summaries.
//!
//! Trends are never stored: they are recomputed from the prior and current
//! snapshots every time they are read.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::model::{
    Criterion, EvaluationSnapshot, PriorEvaluationSnapshot, Rating, StudentEvaluation, Trend,
};

/// Classify the change from `prior` to `current`.
///
/// A missing prior rating means the criterion has never been evaluated.
pub fn classify_trend(current: Rating, prior: Option<Rating>) -> Trend {
    let Some(prior) = prior else {
        return Trend::New;
    };
    match current.rank().cmp(&prior.rank()) {
        std::cmp::Ordering::Greater => Trend::Improved,
        std::cmp::Ordering::Less => Trend::Declined,
        std::cmp::Ordering::Equal => Trend::Maintained,
    }
}

/// Trend of a single criterion between two snapshots.
///
/// Criteria are classified independently, so a partial prior only makes the
/// missing criteria `New`. Returns `None` when the current snapshot has no
/// rating for `criterion`.
pub fn criterion_trend(
    criterion: Criterion,
    current: &EvaluationSnapshot,
    prior: &PriorEvaluationSnapshot,
) -> Option<Trend> {
    current
        .rating(criterion)
        .map(|rating| classify_trend(rating, prior.rating(criterion)))
}

/// Trends of every rated criterion, in criterion order.
pub fn trends(
    current: &EvaluationSnapshot,
    prior: &PriorEvaluationSnapshot,
) -> Vec<(Criterion, Trend)> {
    Criterion::ALL
        .into_iter()
        .filter_map(|c| criterion_trend(c, current, prior).map(|t| (c, t)))
        .collect()
}

/// A non-negative decimal with exactly one fractional digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct OneDecimal {
    tenths: u32,
}

impl OneDecimal {
    pub fn from_tenths(tenths: u32) -> Self {
        Self { tenths }
    }

    /// `numerator / denominator`, rounded half away from zero to one digit.
    ///
    /// Returns `None` for a zero denominator.
    pub fn from_ratio(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let scaled = numerator * 10;
        let tenths = (scaled * 2 + denominator) / (denominator * 2);
        u32::try_from(tenths).ok().map(Self::from_tenths)
    }

    /// Round a non-negative float half away from zero to one digit.
    pub fn round(value: f64) -> Self {
        let tenths = (value.max(0.0) * 10.0).round();
        Self {
            tenths: tenths.min(u32::MAX as f64) as u32,
        }
    }

    pub fn tenths(self) -> u32 {
        self.tenths
    }

    pub fn value(self) -> f64 {
        self.tenths as f64 / 10.0
    }
}

impl Default for OneDecimal {
    fn default() -> Self {
        Self::from_tenths(0)
    }
}

impl fmt::Display for OneDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

impl From<OneDecimal> for f64 {
    fn from(value: OneDecimal) -> Self {
        value.value()
    }
}

impl TryFrom<f64> for OneDecimal {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() && value >= 0.0 {
            Ok(OneDecimal::round(value))
        } else {
            Err(format!("not a non-negative decimal: {value}"))
        }
    }
}

/// Mean rank of a total snapshot, in `[1.0, 4.0]`.
///
/// Fails with `InvariantViolation` if any criterion is missing. The result
/// does not depend on the order in which entries were recorded.
pub fn average_rating(snapshot: &EvaluationSnapshot) -> CoreResult<OneDecimal> {
    snapshot.validate()?;
    let sum: u64 = Criterion::ALL
        .into_iter()
        .filter_map(|c| snapshot.rating(c))
        .map(|r| r.rank() as u64)
        .sum();
    let count = Criterion::ALL.len() as u64;
    // validate() guarantees a non-zero count of ratings
    Ok(OneDecimal::from_ratio(sum, count).unwrap_or_default())
}

/// Per-criterion line of a performance summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSummary {
    pub criterion: Criterion,
    pub rating: Rating,
    pub prior: Option<Rating>,
    pub trend: Trend,
    pub comment: String,
    /// `rank / 4 × 100`.
    pub percentage: f64,
}

/// Overall performance of one student's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub average: OneDecimal,
    pub improved: usize,
    pub declined: usize,
    pub criteria: Vec<CriterionSummary>,
}

impl EvaluationSummary {
    pub fn compute(
        current: &EvaluationSnapshot,
        prior: &PriorEvaluationSnapshot,
    ) -> CoreResult<Self> {
        let average = average_rating(current)?;

        let criteria: Vec<CriterionSummary> = current
            .iter()
            .map(|entry| {
                let prior_rating = prior.rating(entry.criterion);
                CriterionSummary {
                    criterion: entry.criterion,
                    rating: entry.rating,
                    prior: prior_rating,
                    trend: classify_trend(entry.rating, prior_rating),
                    comment: entry.comment.clone(),
                    percentage: entry.rating.rank() as f64 / Rating::MAX_RANK as f64 * 100.0,
                }
            })
            .collect();

        let count = |trend: Trend| criteria.iter().filter(|c| c.trend == trend).count();

        Ok(Self {
            average,
            improved: count(Trend::Improved),
            declined: count(Trend::Declined),
            criteria,
        })
    }

    pub fn of(evaluation: &StudentEvaluation) -> CoreResult<Self> {
        Self::compute(&evaluation.current, &evaluation.prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::model::CriterionEvaluation;

    fn snapshot(ratings: [Rating; 4]) -> EvaluationSnapshot {
        EvaluationSnapshot::from_evaluations(
            Criterion::ALL
                .into_iter()
                .zip(ratings)
                .map(|(c, r)| CriterionEvaluation::new(c, r)),
        )
        .unwrap()
    }

    #[test]
    fn higher_current_is_improved_lower_is_declined() {
        for hi in Rating::ALL {
            for lo in Rating::ALL.into_iter().filter(|r| r.rank() < hi.rank()) {
                assert_eq!(classify_trend(hi, Some(lo)), Trend::Improved);
                assert_eq!(classify_trend(lo, Some(hi)), Trend::Declined);
            }
        }
    }

    #[test]
    fn equal_is_maintained_and_absent_is_new() {
        for r in Rating::ALL {
            assert_eq!(classify_trend(r, Some(r)), Trend::Maintained);
            assert_eq!(classify_trend(r, None), Trend::New);
        }
    }

    #[test]
    fn needs_improvement_to_good_is_improved() {
        let prior = PriorEvaluationSnapshot::from_ratings([(
            Criterion::Accessibility,
            Rating::NeedsImprovement,
        )]);
        let current = EvaluationSnapshot::new(Rating::Good);
        assert_eq!(
            criterion_trend(Criterion::Accessibility, &current, &prior),
            Some(Trend::Improved)
        );
    }

    #[test]
    fn partial_prior_is_classified_per_criterion() {
        let prior = PriorEvaluationSnapshot::from_ratings([
            (Criterion::Accessibility, Rating::Good),
            (Criterion::Participation, Rating::Excellent),
            (Criterion::Responsibility, Rating::VeryLow),
        ]);
        let current = EvaluationSnapshot::new(Rating::Good);
        assert_eq!(
            trends(&current, &prior),
            vec![
                (Criterion::Accessibility, Trend::Maintained),
                (Criterion::Participation, Trend::Declined),
                (Criterion::Responsibility, Trend::Improved),
                (Criterion::Sociability, Trend::New),
            ]
        );
    }

    #[test]
    fn average_of_mixed_snapshot() {
        let s = snapshot([
            Rating::Good,
            Rating::Excellent,
            Rating::Good,
            Rating::Excellent,
        ]);
        let avg = average_rating(&s).unwrap();
        assert_eq!(avg.value(), 3.5);
        assert_eq!(avg.to_string(), "3.5");
    }

    #[test]
    fn average_rounds_half_away_from_zero() {
        // 2 + 2 + 2 + 3 = 9 -> 2.25
        let s = snapshot([
            Rating::NeedsImprovement,
            Rating::NeedsImprovement,
            Rating::NeedsImprovement,
            Rating::Good,
        ]);
        assert_eq!(average_rating(&s).unwrap().to_string(), "2.3");

        // 3 + 3 + 3 + 2 = 11 -> 2.75
        let s = snapshot([
            Rating::Good,
            Rating::Good,
            Rating::Good,
            Rating::NeedsImprovement,
        ]);
        assert_eq!(average_rating(&s).unwrap().to_string(), "2.8");
    }

    #[test]
    fn average_bounds() {
        assert_eq!(
            average_rating(&EvaluationSnapshot::new(Rating::VeryLow))
                .unwrap()
                .to_string(),
            "1.0"
        );
        assert_eq!(
            average_rating(&EvaluationSnapshot::new(Rating::Excellent))
                .unwrap()
                .value(),
            4.0
        );
    }

    #[test]
    fn average_ignores_entry_order() {
        let forward: Vec<CriterionEvaluation> = vec![
            CriterionEvaluation::new(Criterion::Accessibility, Rating::VeryLow),
            CriterionEvaluation::new(Criterion::Participation, Rating::Good),
            CriterionEvaluation::new(Criterion::Responsibility, Rating::Excellent),
            CriterionEvaluation::new(Criterion::Sociability, Rating::Good),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = average_rating(&EvaluationSnapshot::from_evaluations(forward).unwrap()).unwrap();
        let b = average_rating(&EvaluationSnapshot::from_evaluations(reversed).unwrap()).unwrap();
        assert_eq!(a, b);

        let shuffled = EvaluationSnapshot::from(vec![
            CriterionEvaluation::new(Criterion::Sociability, Rating::Good),
            CriterionEvaluation::new(Criterion::Accessibility, Rating::VeryLow),
            CriterionEvaluation::new(Criterion::Responsibility, Rating::Excellent),
            CriterionEvaluation::new(Criterion::Participation, Rating::Good),
        ]);
        assert_eq!(a, average_rating(&shuffled).unwrap());
    }

    #[test]
    fn average_of_partial_snapshot_is_invariant_violation() {
        let partial = EvaluationSnapshot::from(vec![CriterionEvaluation::new(
            Criterion::Accessibility,
            Rating::Good,
        )]);
        assert!(matches!(
            average_rating(&partial),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn summary_counts_trends() {
        let current = snapshot([
            Rating::Good,
            Rating::Excellent,
            Rating::Good,
            Rating::Excellent,
        ])
        .set_comment(Criterion::Participation, "Very engaged in all activities!");
        let prior = PriorEvaluationSnapshot::from_ratings([
            (Criterion::Accessibility, Rating::NeedsImprovement),
            (Criterion::Participation, Rating::Good),
            (Criterion::Responsibility, Rating::Excellent),
            (Criterion::Sociability, Rating::Excellent),
        ]);

        let summary = EvaluationSummary::compute(&current, &prior).unwrap();
        assert_eq!(summary.average.to_string(), "3.5");
        assert_eq!(summary.improved, 2);
        assert_eq!(summary.declined, 1);
        assert_eq!(summary.criteria.len(), 4);
        assert_eq!(summary.criteria[1].percentage, 100.0);
        assert_eq!(summary.criteria[0].percentage, 75.0);
        assert_eq!(
            summary.criteria[1].comment,
            "Very engaged in all activities!"
        );
    }

    #[test]
    fn one_decimal_from_ratio() {
        assert_eq!(OneDecimal::from_ratio(3, 5).unwrap().to_string(), "0.6");
        assert_eq!(OneDecimal::from_ratio(1, 3).unwrap().to_string(), "0.3");
        assert_eq!(OneDecimal::from_ratio(85, 10).unwrap().to_string(), "8.5");
        assert!(OneDecimal::from_ratio(1, 0).is_none());
    }
}
