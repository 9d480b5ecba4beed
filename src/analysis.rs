/*!
 * The single entry point for running a site analysis.
 */

use crate::{
    business::BusinessRecord,
    cluster::KMeans,
    scorer::{recommend, Recommendation},
    SiteError,
};
use rand::Rng;

/// A request for an analysis as it arrives from a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// One of the known categories.
    pub category: String,
    /// A free form category that overrides category when it isn't blank.
    pub custom_category: Option<String>,
    pub num_clusters: usize,
}

impl AnalysisRequest {
    /// The category the analysis is actually run for.
    pub fn effective_category(&self) -> &str {
        match self.custom_category.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => custom,
            _ => self.category.trim(),
        }
    }
}

/**
 * Clusters businesses and recommends a location for a new one.
 *
 * Holds only configuration, so it can be reused and shared between threads.
 */
#[derive(Debug, Clone, Default)]
pub struct SiteAnalyzer {
    kmeans: KMeans,
}

impl SiteAnalyzer {
    pub fn new(kmeans: KMeans) -> Self {
        SiteAnalyzer { kmeans }
    }

    pub fn kmeans(&self) -> &KMeans {
        &self.kmeans
    }

    /**
     * Recommend a location for a new business in category.
     *
     * #Arguments
     * * businesses - every known business, competitors included.
     * * category - the category of the new business.
     * * num_clusters - how many clusters to split the businesses into, 2 to 10.
     * * rng - source of randomness for choosing the initial cluster centers.
     */
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        businesses: &[BusinessRecord],
        category: &str,
        num_clusters: usize,
        rng: &mut R,
    ) -> Result<Recommendation, SiteError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(SiteError::InvalidParameter(
                "the business category must not be empty".to_owned(),
            ));
        }

        KMeans::validate(num_clusters, businesses.len())?;

        let clustering = self.kmeans.run(businesses, num_clusters, rng)?;
        let rec = recommend(businesses, clustering, category)?;

        log::info!(
            "{}: {} businesses in {} clusters after {} passes, recommend {} ({}, {})",
            rec.category,
            rec.total_businesses,
            num_clusters,
            rec.iterations,
            rec.location,
            rec.zone_type,
            rec.opportunity_label()
        );

        Ok(rec)
    }

    /// Run an analysis for a request from a front end.
    pub fn analyze_request<R: Rng + ?Sized>(
        &self,
        businesses: &[BusinessRecord],
        request: &AnalysisRequest,
        rng: &mut R,
    ) -> Result<Recommendation, SiteError> {
        self.analyze(
            businesses,
            request.effective_category(),
            request.num_clusters,
            rng,
        )
    }
}
