// ============================================================================
// Flow Factor
// ============================================================================
// Estime le flux net d'un fonds en retirant la part de variation de l'AUM
// expliquée par le mouvement de la NAV :
//
//     flow_factor = aum_t - prev_aum * (nav_t / prev_nav)
//
// CONCEPTS RUST :
// 1. State machine minimale : Option<DataPoint> sert de "baseline"
// 2. &mut self : le tracker avance à chaque point reçu
// 3. Option<f64> : pas de valeur pour le premier point (ni si prev_nav == 0)
// ============================================================================

use tracing::warn;

use crate::models::{DataPoint, OutputRow};

/// Calcule le flow factor entre deux points consécutifs
///
/// Retourne None si la NAV précédente vaut zéro (division indéfinie).
pub fn flow_factor(previous: &DataPoint, current: &DataPoint) -> Option<f64> {
    if previous.nav == 0.0 {
        return None;
    }
    Some(current.aum - previous.aum * (current.nav / previous.nav))
}

/// Suit la baseline d'une série et produit une OutputRow par point
///
/// Un tracker par requête : il n'est jamais partagé entre tickers.
#[derive(Debug, Clone)]
pub struct FlowTracker {
    ticker: String,
    baseline: Option<DataPoint>,
}

impl FlowTracker {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            baseline: None,
        }
    }

    /// Intègre un nouveau point et retourne la ligne à écrire
    ///
    /// - Premier point : devient la baseline, flow_factor = None
    /// - Points suivants : flow_factor calculé sur la baseline, puis la baseline avance
    pub fn push(&mut self, point: DataPoint) -> OutputRow {
        let flow = match &self.baseline {
            None => None,
            Some(previous) => {
                let value = flow_factor(previous, &point);
                if value.is_none() {
                    warn!(
                        ticker = %self.ticker,
                        date = %point.timestamp,
                        "Previous NAV is zero, flow factor left empty"
                    );
                }
                value
            }
        };

        self.baseline = Some(point);

        OutputRow {
            ticker: self.ticker.clone(),
            timestamp: point.timestamp,
            nav: point.nav,
            aum: point.aum,
            flow_factor: flow,
        }
    }

    /// Vrai tant qu'aucun point n'a été reçu
    pub fn is_empty(&self) -> bool {
        self.baseline.is_none()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn test_first_point_has_no_flow_factor() {
        let mut tracker = FlowTracker::new("AAPL US Equity");
        assert!(tracker.is_empty());

        let row = tracker.push(DataPoint::new(day(3), 10.0, 1000.0));
        assert_eq!(row.flow_factor, None);
        assert_eq!(row.ticker, "AAPL US Equity");
        assert!(!tracker.is_empty());
    }

    #[test]
    fn test_flow_factor_formula() {
        let previous = DataPoint::new(day(3), 10.0, 1000.0);
        let current = DataPoint::new(day(4), 11.0, 1200.0);

        // 1200 - 1000 * (11 / 10) = 100
        let value = flow_factor(&previous, &current).unwrap();
        assert!((value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_moves_to_previous_point() {
        let mut tracker = FlowTracker::new("FUND");
        let points = [
            DataPoint::new(day(3), 10.0, 1000.0),
            DataPoint::new(day(4), 11.0, 1200.0),
            DataPoint::new(day(5), 10.0, 1050.0),
        ];

        let rows: Vec<OutputRow> = points.iter().map(|p| tracker.push(*p)).collect();

        assert_eq!(rows[0].flow_factor, None);
        assert!((rows[1].flow_factor.unwrap() - 100.0).abs() < 1e-9);
        // 1050 - 1200 * (10 / 11) = -40.909...
        let expected = 1050.0 - 1200.0 * (10.0 / 11.0);
        assert!((rows[2].flow_factor.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_pure_market_move_has_zero_flow() {
        // AUM suit exactement la NAV : aucun flux net
        let previous = DataPoint::new(day(3), 20.0, 2000.0);
        let current = DataPoint::new(day(4), 25.0, 2500.0);
        assert_eq!(flow_factor(&previous, &current), Some(0.0));
    }

    #[test]
    fn test_zero_previous_nav() {
        let mut tracker = FlowTracker::new("FUND");
        tracker.push(DataPoint::new(day(3), 0.0, 1000.0));

        let row = tracker.push(DataPoint::new(day(4), 10.0, 1000.0));
        assert_eq!(row.flow_factor, None);

        // La baseline a quand même avancé
        let row = tracker.push(DataPoint::new(day(5), 10.0, 1100.0));
        assert!((row.flow_factor.unwrap() - 100.0).abs() < 1e-9);
    }
}
