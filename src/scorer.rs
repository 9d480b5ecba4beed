/*!
 * Score clusters of businesses and pick a recommended location for a new one.
 *
 * The score is a fixed heuristic:
 *
 * ```text
 * score = 0.5 * (1 - competitor density) + 0.3 * spatial density + 0.2 * commercial fraction
 * ```
 *
 * where the competitor density is the fraction of the cluster in the target category, the spatial
 * density is members per square kilometer of a circle with the mean member distance as its radius
 * (never less than 100 m), and the commercial fraction is the share of members on commercially
 * zoned lots (zone name exactly "Commercial"). The centroid of the best scoring cluster is the
 * recommended location.
 */

use crate::{
    business::{BusinessRecord, ZoneType},
    cluster::{Cluster, Clustering},
    competitor::{analyze_competitors, CompetitorSummary, OUTER_RADIUS_KM},
    geo::{spherical_centroid, within_radius_sorted, GeoPoint},
    SiteError,
};
use std::f64::consts::PI;
use strum::{EnumIter, IntoStaticStr};

const COMPETITION_WEIGHT: f64 = 0.5;
const SPATIAL_WEIGHT: f64 = 0.3;
const COMMERCIAL_WEIGHT: f64 = 0.2;

/// Floor on the cluster spread so a cluster of coincident points doesn't have infinite density.
const MIN_SPREAD_KM: f64 = 0.1;

/// The most nearby businesses reported with a recommendation.
const NEARBY_LIMIT: usize = 10;
/// How many of the nearest businesses vote on the zone type.
const ZONE_VOTERS: usize = 5;
/// How many of the voters must be commercial for a commercial recommendation.
const ZONE_COMMERCIAL_VOTES: usize = 3;

/// The signals and final score computed for one non-empty cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterScore {
    pub cluster_id: usize,
    pub members: usize,
    /// Members in the target category.
    pub competitor_count: usize,
    pub competitor_density: f64,
    /// Members per square kilometer.
    pub spatial_density: f64,
    pub commercial_fraction: f64,
    pub score: f64,
}

impl ClusterScore {
    /// Score a cluster for category. Empty clusters can't be scored and return `None`.
    pub fn for_cluster(cluster: &Cluster<BusinessRecord>, category: &str) -> Option<Self> {
        let spread = cluster.mean_distance_to_centroid()?;
        let members = cluster.len();
        let n = members as f64;

        let competitor_count = cluster
            .members
            .iter()
            .filter(|b| b.is_category(category))
            .count();
        let commercial_count = cluster.members.iter().filter(|b| b.is_commercial()).count();

        let competitor_density = competitor_count as f64 / n;
        let spatial_density = n / (PI * spread.max(MIN_SPREAD_KM).powi(2));
        let commercial_fraction = commercial_count as f64 / n;

        let score = COMPETITION_WEIGHT * (1.0 - competitor_density)
            + SPATIAL_WEIGHT * spatial_density
            + COMMERCIAL_WEIGHT * commercial_fraction;

        Some(ClusterScore {
            cluster_id: cluster.id,
            members,
            competitor_count,
            competitor_density,
            spatial_density,
            commercial_fraction,
            score,
        })
    }
}

/// Score every non-empty cluster and order them best first. Equal scores keep cluster order.
pub fn rank_clusters(clusters: &[Cluster<BusinessRecord>], category: &str) -> Vec<ClusterScore> {
    let mut scores: Vec<ClusterScore> = clusters
        .iter()
        .filter_map(|c| ClusterScore::for_cluster(c, category))
        .collect();

    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    scores
}

/// How promising the recommended location is, with a fixed confidence for each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum Opportunity {
    /// No competitors within 500 m.
    #[strum(serialize = "high opportunity")]
    High,
    /// At most 2 competitors within 1 km.
    #[strum(serialize = "moderate-high")]
    ModerateHigh,
    /// At most 5 competitors within 1 km.
    #[strum(serialize = "moderate")]
    Moderate,
    #[strum(serialize = "challenging")]
    Challenging,
}

impl Opportunity {
    pub fn from_competition(competitors: &CompetitorSummary) -> Self {
        if competitors.within_500m == 0 {
            Opportunity::High
        } else if competitors.within_1km <= 2 {
            Opportunity::ModerateHigh
        } else if competitors.within_1km <= 5 {
            Opportunity::Moderate
        } else {
            Opportunity::Challenging
        }
    }

    pub fn label(self) -> &'static str {
        self.into()
    }

    pub fn confidence(self) -> f64 {
        match self {
            Opportunity::High => 0.92,
            Opportunity::ModerateHigh => 0.78,
            Opportunity::Moderate => 0.62,
            Opportunity::Challenging => 0.45,
        }
    }
}

/**
 * Guess the zoning at a location from the businesses closest to it.
 *
 * The first five entries of nearby (closest first) vote, and three commercial votes make it
 * commercial. With fewer than five nearby businesses the same three votes are still required.
 */
pub fn infer_zone_type(nearby: &[(BusinessRecord, f64)]) -> ZoneType {
    let commercial_votes = nearby
        .iter()
        .take(ZONE_VOTERS)
        .filter(|(b, _)| b.is_commercial())
        .count();

    if commercial_votes >= ZONE_COMMERCIAL_VOTES {
        ZoneType::Commercial
    } else {
        ZoneType::Residential
    }
}

/// The final answer of an analysis. Built once and never modified.
#[derive(Debug, Clone)]
pub struct Recommendation {
    /// The category the analysis was run for.
    pub category: String,
    pub location: GeoPoint,
    pub zone_type: ZoneType,
    pub opportunity: Opportunity,
    pub confidence: f64,
    pub competitors: CompetitorSummary,
    /// Up to 10 businesses within 2 km of the location, closest first, with distances in km.
    pub nearby: Vec<(BusinessRecord, f64)>,
    pub clusters: Vec<Cluster<BusinessRecord>>,
    /// Scores of the non-empty clusters, best first.
    pub ranking: Vec<ClusterScore>,
    pub iterations: usize,
    pub converged: bool,
    pub total_businesses: usize,
    /// Businesses in the category anywhere in the data.
    pub competitor_count: usize,
}

impl Recommendation {
    pub fn opportunity_label(&self) -> &'static str {
        self.opportunity.label()
    }
}

/**
 * Pick a location for a new business in category from a clustering of all_businesses.
 *
 * If no cluster has any members, the recommendation falls back to the centroid of every
 * business. This only fails if all_businesses is empty.
 */
pub fn recommend(
    all_businesses: &[BusinessRecord],
    clustering: Clustering<BusinessRecord>,
    category: &str,
) -> Result<Recommendation, SiteError> {
    let Clustering {
        clusters,
        iterations,
        converged,
    } = clustering;

    let ranking = rank_clusters(&clusters, category);

    let location = match ranking.first() {
        Some(best) => clusters
            .iter()
            .find(|c| c.id == best.cluster_id)
            .map(|c| c.centroid)
            .ok_or_else(|| {
                SiteError::InvalidInput(format!("no cluster with id {}", best.cluster_id))
            })?,
        None => {
            log::warn!("every cluster is empty, falling back to the center of all businesses");
            spherical_centroid(all_businesses)?
        }
    };

    let competitors = analyze_competitors(location, all_businesses, category);

    let nearby: Vec<(BusinessRecord, f64)> =
        within_radius_sorted(location, all_businesses, OUTER_RADIUS_KM)
            .into_iter()
            .take(NEARBY_LIMIT)
            .map(|(b, dist)| (b.clone(), dist))
            .collect();

    let zone_type = infer_zone_type(&nearby);
    let opportunity = Opportunity::from_competition(&competitors);

    let competitor_count = all_businesses
        .iter()
        .filter(|b| b.is_category(category))
        .count();

    Ok(Recommendation {
        category: category.to_owned(),
        location,
        zone_type,
        opportunity,
        confidence: opportunity.confidence(),
        competitors,
        nearby,
        clusters,
        ranking,
        iterations,
        converged,
        total_businesses: all_businesses.len(),
        competitor_count,
    })
}
