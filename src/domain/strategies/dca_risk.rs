//! Risk-scaled dollar-cost averaging: the periodic injection grows when risk
//! is low and dries up when risk is high.

use crate::domain::config::DcaConfig;
use crate::domain::error::CoinsimError;
use crate::domain::riskmetric::RiskMetricSeries;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::Strategy;

use super::risk_threshold::RiskBucket;

/// Multiplier ladder applied to the base injection, keyed by risk bucket
/// (lowest risk first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DcaLadder {
    /// Linear 7-to-0 taper.
    Linear,
    /// Fibonacci weights, still buying a trickle near the top.
    Fibonacci,
    /// Fibonacci weights shifted down one tier, with a hard stop above 0.7.
    FibonacciAdjusted,
}

impl DcaLadder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Some(DcaLadder::Linear),
            "fibonacci" => Some(DcaLadder::Fibonacci),
            "fibonacci-adjusted" => Some(DcaLadder::FibonacciAdjusted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DcaLadder::Linear => "linear",
            DcaLadder::Fibonacci => "fibonacci",
            DcaLadder::FibonacciAdjusted => "fibonacci-adjusted",
        }
    }

    /// One multiplier per [`RiskBucket`], indexed by `RiskBucket::index`.
    pub fn multipliers(&self) -> [f64; 10] {
        match self {
            DcaLadder::Linear => [7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0],
            DcaLadder::Fibonacci => [34.0, 21.0, 13.0, 8.0, 5.0, 3.0, 2.0, 1.0, 1.0, 0.0],
            DcaLadder::FibonacciAdjusted => [21.0, 13.0, 8.0, 5.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// DCA with the injection scaled by the current risk bucket's ladder
/// multiplier. A zero multiplier skips that firing entirely; no zero-sized
/// buy events.
pub struct DcaRiskStrategy {
    config: DcaConfig,
    ladder: DcaLadder,
    riskmetric: RiskMetricSeries,
    countdown: usize,
}

impl DcaRiskStrategy {
    pub fn new(config: DcaConfig, ladder: DcaLadder, riskmetric: RiskMetricSeries) -> Self {
        debug_assert!(config.interval >= 1, "interval must be at least 1");
        let countdown = config.interval;
        DcaRiskStrategy {
            config,
            ladder,
            riskmetric,
            countdown,
        }
    }
}

impl Strategy for DcaRiskStrategy {
    fn name(&self) -> String {
        format!(
            "dca-{}{{interval: {}}}",
            self.ladder.as_str(),
            self.config.interval
        )
    }

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError> {
        self.countdown -= 1;
        if self.countdown == 0 {
            let score = self.riskmetric.score_at(sim.current_time())?;
            let multiplier = self.ladder.multipliers()[RiskBucket::from_score(score).index()];
            sim.buy_additional(self.config.base_amount * multiplier)?;
            self.countdown = self.config.interval;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::{OhlcvBar, SampleInterval};
    use crate::domain::panel::PricePanel;
    use crate::domain::portfolio::Portfolio;
    use crate::domain::riskmetric::RiskPoint;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn dt(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn btc_panel(closes: &[f64]) -> PricePanel {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                pair: "BTCUSDT".to_string(),
                open_time: dt(1) + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect();
        PricePanel::from_bars(vec![("BTCUSDT".into(), bars)], SampleInterval::OneDay).unwrap()
    }

    fn scripted_scores(scores: &[f64]) -> RiskMetricSeries {
        let points = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| RiskPoint {
                timestamp: dt(1) + Duration::days(i as i64),
                score,
                price: 1.0,
                local_min: false,
                local_max: false,
                confirmed_min: false,
                confirmed_max: false,
            })
            .collect();
        RiskMetricSeries::from_points(points)
    }

    #[test]
    fn ladder_presets_match_the_tables() {
        assert_eq!(
            DcaLadder::Linear.multipliers(),
            [7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            DcaLadder::Fibonacci.multipliers(),
            [34.0, 21.0, 13.0, 8.0, 5.0, 3.0, 2.0, 1.0, 1.0, 0.0]
        );
        assert_eq!(
            DcaLadder::FibonacciAdjusted.multipliers(),
            [21.0, 13.0, 8.0, 5.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn ladder_names_round_trip() {
        for ladder in [
            DcaLadder::Linear,
            DcaLadder::Fibonacci,
            DcaLadder::FibonacciAdjusted,
        ] {
            assert_eq!(DcaLadder::parse(ladder.as_str()), Some(ladder));
        }
        assert_eq!(DcaLadder::parse("none"), None);
        assert_eq!(DcaLadder::parse("martingale"), None);
    }

    #[test]
    fn injection_scales_with_the_risk_bucket() {
        // Scores 0.05 / 0.45 / 0.65 hit linear multipliers 7 / 3 / 1.
        let panel = btc_panel(&[10.0, 10.0, 10.0]);
        let riskmetric = scripted_scores(&[0.05, 0.45, 0.65]);
        let mut sim = Simulation::new(&panel, Portfolio::new(0.0, &["BTCUSDT".to_string()]));
        let mut strategy = DcaRiskStrategy::new(
            DcaConfig {
                interval: 1,
                base_amount: 5.0,
            },
            DcaLadder::Linear,
            riskmetric,
        );

        sim.run(&mut strategy).unwrap();

        let expected_usd = 5.0 * (7.0 + 3.0 + 1.0);
        assert!((sim.total_contributed() - expected_usd).abs() < 1e-9);
        assert!((sim.portfolio().quantity("BTCUSDT") - expected_usd / 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_multiplier_skips_the_injection() {
        let panel = btc_panel(&[10.0, 10.0]);
        let riskmetric = scripted_scores(&[0.95, 0.05]);
        let mut sim = Simulation::new(&panel, Portfolio::new(0.0, &["BTCUSDT".to_string()]));
        let mut strategy = DcaRiskStrategy::new(
            DcaConfig {
                interval: 1,
                base_amount: 5.0,
            },
            DcaLadder::Linear,
            riskmetric,
        );

        sim.run(&mut strategy).unwrap();

        // Only the second step buys; no zero-sized event from the first.
        assert_eq!(sim.bought().len(), 1);
        assert!((sim.total_contributed() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn respects_the_dca_interval() {
        let panel = btc_panel(&[10.0, 10.0, 10.0, 10.0]);
        let riskmetric = scripted_scores(&[0.05, 0.05, 0.05, 0.05]);
        let mut sim = Simulation::new(&panel, Portfolio::new(0.0, &["BTCUSDT".to_string()]));
        let mut strategy = DcaRiskStrategy::new(
            DcaConfig {
                interval: 2,
                base_amount: 5.0,
            },
            DcaLadder::Fibonacci,
            riskmetric,
        );

        sim.run(&mut strategy).unwrap();

        assert_eq!(sim.bought().len(), 2);
        assert!((sim.total_contributed() - 2.0 * 5.0 * 34.0).abs() < 1e-9);
    }
}
