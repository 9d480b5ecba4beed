pub use analysis::{AnalysisRequest, SiteAnalyzer};
pub use business::{BusinessRecord, ZoneType};
pub use business_database::{AddBusinessTransaction, BusinessDatabase};
pub use cluster::{Cluster, Clustering, KMeans, Palette, MAX_CLUSTERS, MIN_CLUSTERS};
pub use competitor::{analyze_competitors, market_saturation, CompetitorSummary, MarketStrategy};
pub use error::{SiteError, SiteResult};
pub use geo::{
    count_within_radius, distance_km, nearest, spherical_centroid, within_radius_sorted, Geo,
    GeoPoint,
};
pub use overview::MarketOverview;
pub use scorer::{infer_zone_type, rank_clusters, recommend, ClusterScore, Opportunity, Recommendation};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod analysis;
mod business;
mod business_database;
mod cluster;
mod competitor;
mod error;
mod geo;
mod overview;
mod scorer;
