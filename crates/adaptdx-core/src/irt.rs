//! Item-response-theory core: the two-parameter logistic expected-score
//! model, Fisher information, and the running ability estimate.

use serde::{Deserialize, Serialize};

use crate::model::IrtParameters;

/// Lower clamp for the ability estimate.
pub const THETA_MIN: f64 = -3.0;
/// Upper clamp for the ability estimate.
pub const THETA_MAX: f64 = 3.0;

/// Expected score for ability `theta` on a case with the given parameters:
/// `1 / (1 + exp(-a * (theta - b)))`.
///
/// The standard 2PL response function, applied here to a continuous score
/// target rather than a binary outcome.
pub fn expected_score(theta: f64, params: &IrtParameters) -> f64 {
    1.0 / (1.0 + (-params.discrimination * (theta - params.difficulty)).exp())
}

/// Fisher information of a case at ability `theta`: `a^2 * p * (1 - p)`.
///
/// Maximized when the case's difficulty matches the examinee's ability
/// (p = 0.5), which is what drives adaptive selection.
pub fn item_information(theta: f64, params: &IrtParameters) -> f64 {
    let p = expected_score(theta, params);
    params.discrimination * params.discrimination * p * (1.0 - p)
}

/// Running ability estimate for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityState {
    /// Current ability estimate, clamped to [`THETA_MIN`, `THETA_MAX`].
    pub theta: f64,
    /// Standard error of the estimate. `f64::INFINITY` when total Fisher
    /// information is zero (the session cannot yet terminate on precision).
    pub standard_error: f64,
    /// Theta after each update, starting with the initial value.
    pub history: Vec<f64>,
}

impl Default for AbilityState {
    fn default() -> Self {
        Self {
            theta: 0.0,
            standard_error: 1.0,
            history: vec![0.0],
        }
    }
}

impl AbilityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-estimate ability from the full response history.
    ///
    /// Starting from the current theta, walks every `(parameters, score)`
    /// pair in chronological order and applies one gradient step per pair:
    /// `theta += learning_rate * a * (score - expected)`. This repeated
    /// full-history sweep on every new response reproduces the original
    /// estimator exactly; it is a gradient approximation, not a joint MLE
    /// solve. The result is clamped and appended to `history`, and the
    /// standard error is recomputed from total information at the new theta.
    pub fn update(&mut self, responses: &[(&IrtParameters, f64)], learning_rate: f64) {
        if responses.is_empty() {
            return;
        }

        let mut theta = self.theta;
        for (params, score) in responses {
            let expected = expected_score(theta, params);
            let gradient = params.discrimination * (score - expected);
            theta += learning_rate * gradient;
        }

        self.theta = theta.clamp(THETA_MIN, THETA_MAX);
        self.history.push(self.theta);

        let total_information: f64 = responses
            .iter()
            .map(|(params, _)| item_information(self.theta, params))
            .sum();
        self.standard_error = if total_information > 0.0 {
            1.0 / total_information.sqrt()
        } else {
            f64::INFINITY
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(difficulty: f64, discrimination: f64) -> IrtParameters {
        IrtParameters {
            difficulty,
            discrimination,
            skill_vector: vec![],
        }
    }

    #[test]
    fn expected_score_is_half_at_difficulty() {
        let p = params(0.7, 1.5);
        assert!((expected_score(0.7, &p) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn information_peaks_at_difficulty() {
        let p = params(0.4, 1.3);
        let at_peak = item_information(0.4, &p);
        for offset in [0.1, 0.5, 1.0, 2.0] {
            assert!(item_information(0.4 + offset, &p) < at_peak);
            assert!(item_information(0.4 - offset, &p) < at_peak);
        }
    }

    #[test]
    fn information_is_symmetric_around_difficulty() {
        let p = params(-0.3, 1.8);
        for offset in [0.25, 0.75, 1.5] {
            let above = item_information(-0.3 + offset, &p);
            let below = item_information(-0.3 - offset, &p);
            assert!((above - below).abs() < 1e-12);
        }
    }

    #[test]
    fn update_direction_matches_score_residual() {
        // difficulty -0.5, discrimination 1.2, starting theta 0: expected
        // score is above 0.5, so a perfect score still pulls theta up and a
        // zero score pulls it down.
        let p = params(-0.5, 1.2);

        let mut state = AbilityState::new();
        state.update(&[(&p, 1.0)], 0.3);
        assert!(state.theta > 0.0);

        let mut state = AbilityState::new();
        state.update(&[(&p, 0.0)], 0.3);
        assert!(state.theta < 0.0);
    }

    #[test]
    fn theta_stays_clamped() {
        let p = params(0.0, 2.0);
        let mut state = AbilityState::new();
        let history: Vec<(&IrtParameters, f64)> = std::iter::repeat((&p, 1.0)).take(200).collect();
        for n in 1..=history.len() {
            state.update(&history[..n], 0.3);
            assert!((THETA_MIN..=THETA_MAX).contains(&state.theta));
        }
        assert!(state.theta <= THETA_MAX);
    }

    #[test]
    fn history_gains_one_entry_per_update() {
        let p = params(0.0, 1.0);
        let mut state = AbilityState::new();
        assert_eq!(state.history, vec![0.0]);
        state.update(&[(&p, 0.8)], 0.3);
        state.update(&[(&p, 0.8), (&p, 0.4)], 0.3);
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.history[0], 0.0);
    }

    #[test]
    fn zero_information_yields_infinite_standard_error() {
        // Degenerate discrimination produces zero information; the standard
        // error must become infinite rather than dividing by zero.
        let p = params(0.0, 0.0);
        let mut state = AbilityState::new();
        state.update(&[(&p, 1.0)], 0.3);
        assert!(state.standard_error.is_infinite());
    }

    #[test]
    fn more_responses_shrink_standard_error() {
        let p = params(0.0, 1.5);
        let mut one = AbilityState::new();
        one.update(&[(&p, 0.6)], 0.3);

        let mut many = AbilityState::new();
        many.update(&[(&p, 0.6), (&p, 0.5), (&p, 0.7), (&p, 0.4)], 0.3);

        assert!(many.standard_error < one.standard_error);
    }
}
