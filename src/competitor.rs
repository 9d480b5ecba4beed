/*!
 * Competitor analysis around a candidate location.
 */

use crate::{
    business::BusinessRecord,
    geo::{count_within_radius, nearest, GeoPoint},
};
use strum::{EnumIter, IntoStaticStr};

/// Radius in kilometers of the innermost competition band.
pub const INNER_RADIUS_KM: f64 = 0.5;
/// Radius in kilometers of the middle competition band, also used for market saturation.
pub const MIDDLE_RADIUS_KM: f64 = 1.0;
/// Radius in kilometers of the outer competition band.
pub const OUTER_RADIUS_KM: f64 = 2.0;

/// The number of competitors within 1 km that counts as a fully saturated market.
const SATURATION_COUNT: f64 = 10.0;

/// Suggested market entry strategy, chosen from the number of competitors within 500 m.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum MarketStrategy {
    /// No competitors in the category anywhere in the data.
    #[strum(serialize = "first-mover — no competitors detected")]
    FirstMover,
    /// No competitors within 500 m.
    #[strum(serialize = "low competition")]
    LowCompetition,
    /// 1 or 2 competitors within 500 m.
    #[strum(serialize = "moderate competition")]
    ModerateCompetition,
    /// 3 to 5 competitors within 500 m.
    #[strum(serialize = "high competition")]
    HighCompetition,
    /// More than 5 competitors within 500 m.
    #[strum(serialize = "saturated market")]
    Saturated,
}

impl MarketStrategy {
    fn from_inner_count(within_500m: usize) -> Self {
        match within_500m {
            0 => MarketStrategy::LowCompetition,
            1..=2 => MarketStrategy::ModerateCompetition,
            3..=5 => MarketStrategy::HighCompetition,
            _ => MarketStrategy::Saturated,
        }
    }

    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// How crowded the market for a category is around a location.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorSummary {
    /// The closest business in the category, if there are any.
    pub nearest: Option<BusinessRecord>,
    pub distance_to_nearest_km: Option<f64>,
    pub within_500m: usize,
    pub within_1km: usize,
    pub within_2km: usize,
    /// Competitors within 1 km scaled so that 10 or more is 1.0.
    pub market_saturation: f64,
    pub strategy: MarketStrategy,
}

impl CompetitorSummary {
    fn no_competitors() -> Self {
        CompetitorSummary {
            nearest: None,
            distance_to_nearest_km: None,
            within_500m: 0,
            within_1km: 0,
            within_2km: 0,
            market_saturation: 0.0,
            strategy: MarketStrategy::FirstMover,
        }
    }
}

/// Scale a count of competitors within 1 km into the range 0 to 1.
pub fn market_saturation(within_1km: usize) -> f64 {
    (within_1km as f64 / SATURATION_COUNT).min(1.0)
}

/**
 * Summarize the competition for category around candidate.
 *
 * Competitors are the businesses whose category matches, ignoring case.
 */
pub fn analyze_competitors(
    candidate: GeoPoint,
    all_businesses: &[BusinessRecord],
    category: &str,
) -> CompetitorSummary {
    let competitors: Vec<&BusinessRecord> = all_businesses
        .iter()
        .filter(|b| b.is_category(category))
        .collect();

    let (nearest_competitor, distance) = match nearest(candidate, &competitors) {
        Some((&found, dist)) => (found.clone(), dist),
        None => return CompetitorSummary::no_competitors(),
    };

    let within_500m = count_within_radius(candidate, &competitors, INNER_RADIUS_KM);
    let within_1km = count_within_radius(candidate, &competitors, MIDDLE_RADIUS_KM);
    let within_2km = count_within_radius(candidate, &competitors, OUTER_RADIUS_KM);

    CompetitorSummary {
        nearest: Some(nearest_competitor),
        distance_to_nearest_km: Some(distance),
        within_500m,
        within_1km,
        within_2km,
        market_saturation: market_saturation(within_1km),
        strategy: MarketStrategy::from_inner_count(within_500m),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::business::ZoneType;

    fn business(id: i64, category: &str, lat: f64, lon: f64) -> BusinessRecord {
        BusinessRecord {
            id,
            name: format!("Business {}", id),
            category: category.to_owned(),
            street: "Rizal St".to_owned(),
            zone: ZoneType::Commercial,
            location: GeoPoint { lat, lon },
        }
    }

    #[test]
    fn test_saturation_bounds() {
        assert_eq!(market_saturation(0), 0.0);
        assert!((market_saturation(3) - 0.3).abs() < 1.0e-12);
        assert_eq!(market_saturation(10), 1.0);
        assert_eq!(market_saturation(11), 1.0);
        assert_eq!(market_saturation(1000), 1.0);

        for n in 0..50 {
            let sat = market_saturation(n);
            assert!((0.0..=1.0).contains(&sat));
        }
    }

    #[test]
    fn test_strategy_bands() {
        assert_eq!(MarketStrategy::from_inner_count(0), MarketStrategy::LowCompetition);
        assert_eq!(MarketStrategy::from_inner_count(1), MarketStrategy::ModerateCompetition);
        assert_eq!(MarketStrategy::from_inner_count(2), MarketStrategy::ModerateCompetition);
        assert_eq!(MarketStrategy::from_inner_count(3), MarketStrategy::HighCompetition);
        assert_eq!(MarketStrategy::from_inner_count(5), MarketStrategy::HighCompetition);
        assert_eq!(MarketStrategy::from_inner_count(6), MarketStrategy::Saturated);

        assert_eq!(MarketStrategy::LowCompetition.label(), "low competition");
        assert_eq!(MarketStrategy::Saturated.label(), "saturated market");
    }

    #[test]
    fn test_single_competitor_at_candidate() {
        let all = vec![business(1, "Cafe", 0.0, 0.0)];

        let summary = analyze_competitors(GeoPoint { lat: 0.0, lon: 0.0 }, &all, "Cafe");

        assert_eq!(summary.nearest.as_ref().map(|b| b.id), Some(1));
        assert!(summary.distance_to_nearest_km.unwrap().abs() < 1.0e-9);
        assert_eq!(summary.within_500m, 1);
        assert_eq!(summary.within_1km, 1);
        assert_eq!(summary.within_2km, 1);
        assert!((summary.market_saturation - 0.1).abs() < 1.0e-12);
        assert_eq!(summary.strategy, MarketStrategy::ModerateCompetition);
    }

    #[test]
    fn test_no_competitors() {
        let all = vec![
            business(1, "Bakery", 0.0, 0.0),
            business(2, "Pharmacy", 0.0, 0.001),
        ];

        let summary = analyze_competitors(GeoPoint { lat: 0.0, lon: 0.0 }, &all, "Cafe");

        assert!(summary.nearest.is_none());
        assert!(summary.distance_to_nearest_km.is_none());
        assert_eq!(summary.within_500m, 0);
        assert_eq!(summary.within_1km, 0);
        assert_eq!(summary.within_2km, 0);
        assert_eq!(summary.market_saturation, 0.0);
        assert_eq!(summary.strategy, MarketStrategy::FirstMover);
        assert_eq!(
            summary.strategy.label(),
            "first-mover — no competitors detected"
        );
    }

    #[test]
    fn test_competition_bands() {
        // 0.0045 degrees of longitude at the equator is almost exactly 500 m.
        let mut all = vec![business(100, "Bakery", 0.0, 0.0)];
        for i in 0..4 {
            all.push(business(i, "cafe", 0.0, 0.001 * i as f64));
        }
        all.push(business(10, "CAFE", 0.0, 0.007));
        all.push(business(11, "Cafe", 0.0, 0.013));
        all.push(business(12, "Cafe", 0.0, 0.05));

        let summary = analyze_competitors(GeoPoint { lat: 0.0, lon: 0.0 }, &all, "Cafe");

        assert_eq!(summary.nearest.as_ref().map(|b| b.id), Some(0));
        assert_eq!(summary.within_500m, 4);
        assert_eq!(summary.within_1km, 5);
        assert_eq!(summary.within_2km, 6);
        assert!((summary.market_saturation - 0.5).abs() < 1.0e-12);
        assert_eq!(summary.strategy, MarketStrategy::HighCompetition);
    }
}
