use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{info, LevelFilter};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use simple_logger::SimpleLogger;
use sitefinder::{
    BusinessDatabase, BusinessRecord, KMeans, MarketOverview, Recommendation, SiteAnalyzer,
    SiteError, SiteResult, MAX_CLUSTERS, MIN_CLUSTERS,
};
use std::{
    fmt::{self, Display},
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
};

const CHANNEL_SIZE: usize = 16;

/*-------------------------------------------------------------------------------------------------
 *                               Parse Command Line Arguments
 *-----------------------------------------------------------------------------------------------*/
///
/// Recommend a location for a new business.
///
/// This program clusters all the businesses in the database and recommends a location for a new
/// business in each requested category, along with an analysis of the competition around it.
///
#[derive(Debug, Parser)]
#[clap(name = "sitefinder")]
#[clap(author, version, about)]
struct SiteFinderOptionsInit {
    /// The path to the database file.
    ///
    /// If this is not specified, then the program will check for it in the "SITEFINDER_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "SITEFINDER_DB")]
    store_file: PathBuf,

    /// The categories of business to find a location for, e.g. "Cafe".
    #[clap(required = true)]
    categories: Vec<String>,

    /// The number of clusters to divide the businesses into, 2 to 10.
    #[clap(short = 'k', long)]
    #[clap(default_value_t = 5)]
    clusters: usize,

    /// The maximum number of K-Means passes.
    #[clap(long)]
    #[clap(default_value_t = 100)]
    max_iterations: usize,

    /// K-Means stops once no cluster center moves this far (km) in a pass.
    #[clap(long)]
    #[clap(default_value_t = 0.01)]
    threshold_km: f64,

    /// Seed for choosing the initial cluster centers. Runs with the same seed and data give the
    /// same answer. If this is not specified, the seed is random.
    #[clap(long)]
    seed: Option<u64>,

    /// Also print counts of businesses by category, zone, and street.
    #[clap(long)]
    overview: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct SiteFinderOptionsChecked {
    /// The path to the database file.
    store_file: PathBuf,

    /// The categories to analyze, in the order they were requested.
    categories: Vec<String>,

    /// The number of clusters.
    clusters: usize,

    /// Configured K-Means engine.
    kmeans: KMeans,

    /// Seed for the random number generators.
    seed: Option<u64>,

    /// Print the market overview.
    overview: bool,

    /// Verbose output
    verbose: bool,
}

impl Display for SiteFinderOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "      Database: {}", self.store_file.display())?;
        writeln!(f, "    Categories: {}", self.categories.join(", "))?;
        writeln!(f, "      Clusters: {}", self.clusters)?;
        writeln!(f, "Max Iterations: {}", self.kmeans.max_iterations())?;
        writeln!(
            f,
            "  Threshold km: {}",
            self.kmeans.convergence_threshold_km()
        )?;
        match self.seed {
            Some(seed) => writeln!(f, "          Seed: {}", seed)?,
            None => writeln!(f, "          Seed: random")?,
        }
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> SiteResult<SiteFinderOptionsChecked> {
    let SiteFinderOptionsInit {
        store_file,
        categories,
        clusters,
        max_iterations,
        threshold_km,
        seed,
        overview,
        verbose,
    } = SiteFinderOptionsInit::parse();

    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&clusters) {
        return Err(format!(
            "Number of clusters must be between {} and {}: {}",
            MIN_CLUSTERS, MAX_CLUSTERS, clusters
        )
        .into());
    }

    if max_iterations == 0 {
        return Err("Maximum iterations must be at least 1".into());
    }

    if !threshold_km.is_finite() || threshold_km < 0.0 {
        return Err(format!("Invalid convergence threshold: {}", threshold_km).into());
    }

    let categories: Vec<String> = categories
        .into_iter()
        .map(|cat| cat.trim().to_owned())
        .collect();

    if categories.iter().any(|cat| cat.is_empty()) {
        return Err("Categories must not be blank".into());
    }

    let kmeans = KMeans::default()
        .with_max_iterations(max_iterations)
        .with_convergence_threshold_km(threshold_km);

    Ok(SiteFinderOptionsChecked {
        store_file,
        categories,
        clusters,
        kmeans,
        seed,
        overview,
        verbose,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> SiteResult<()> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    if opts.verbose {
        info!("{}", opts);
    }

    //
    // Load the snapshot of businesses.
    //
    let db = BusinessDatabase::connect(&opts.store_file)?;
    let businesses = db.all_businesses()?;
    drop(db);

    if businesses.is_empty() {
        return Err(format!("No businesses found in {}", opts.store_file.display()).into());
    }
    info!("Retrieved {} businesses.", businesses.len());

    if opts.overview {
        log_overview(&MarketOverview::from_businesses(&businesses));
    }

    //
    // Analyze each category on a pool of worker threads.
    //
    let businesses = Arc::new(businesses);
    let analyzer = SiteAnalyzer::new(opts.kmeans.clone());
    let num_workers = num_cpus::get().min(opts.categories.len()).max(1);

    let (to_analysis, from_category_gen) = bounded(CHANNEL_SIZE);
    let (to_report, from_analysis) = bounded(CHANNEL_SIZE);

    let category_gen = start_category_thread(opts.categories.clone(), to_analysis)?;

    let mut workers = Vec::with_capacity(num_workers);
    for i in 0..num_workers {
        workers.push(start_analysis_thread(
            i,
            from_category_gen.clone(),
            to_report.clone(),
            analyzer.clone(),
            Arc::clone(&businesses),
            opts.clusters,
            opts.seed,
        )?);
    }
    drop(from_category_gen);
    drop(to_report);

    let mut results: Vec<AnalysisOutcome> = from_analysis.iter().collect();

    category_gen
        .join()
        .map_err(|_| "category thread panicked")?;
    for worker in workers {
        worker.join().map_err(|_| "analysis thread panicked")?;
    }

    //
    // Report in the order the categories were requested.
    //
    results.sort_by_key(|outcome| outcome.index);

    let mut failures = 0;
    for AnalysisOutcome {
        category, result, ..
    } in results
    {
        match result {
            Ok(rec) => log_recommendation(&rec),
            Err(err) => {
                failures += 1;
                log::error!("Analysis for {} failed: {}", category, err);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} analyses failed", failures, opts.categories.len()).into());
    }

    Ok(())
}

/*-------------------------------------------------------------------------------------------------
 *                                     Worker Threads
 *-----------------------------------------------------------------------------------------------*/
struct AnalysisOutcome {
    index: usize,
    category: String,
    result: Result<Recommendation, SiteError>,
}

fn start_category_thread(
    categories: Vec<String>,
    to_analysis: Sender<(usize, String)>,
) -> SiteResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name("sitefinder-categories".to_owned())
        .spawn(move || {
            for job in categories.into_iter().enumerate() {
                if to_analysis.send(job).is_err() {
                    log::error!("All analysis threads have quit.");
                    break;
                }
            }
        })?;

    Ok(jh)
}

fn start_analysis_thread(
    thread_num: usize,
    from_category_gen: Receiver<(usize, String)>,
    to_report: Sender<AnalysisOutcome>,
    analyzer: SiteAnalyzer,
    businesses: Arc<Vec<BusinessRecord>>,
    clusters: usize,
    seed: Option<u64>,
) -> SiteResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name(format!("sitefinder-analysis-{}", thread_num))
        .spawn(move || {
            for (index, category) in from_category_gen {
                // Seed per category, not per thread, so results don't depend on scheduling.
                let mut rng = match seed {
                    Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(index as u64)),
                    None => Xoshiro256PlusPlus::from_entropy(),
                };

                log::debug!("Analyzing {} on thread {}", category, thread_num);
                let result = analyzer.analyze(&businesses, &category, clusters, &mut rng);

                let outcome = AnalysisOutcome {
                    index,
                    category,
                    result,
                };

                if to_report.send(outcome).is_err() {
                    log::error!("Main thread has quit, analysis thread {} exiting.", thread_num);
                    break;
                }
            }
        })?;

    Ok(jh)
}

/*-------------------------------------------------------------------------------------------------
 *                                         Output
 *-----------------------------------------------------------------------------------------------*/
fn log_overview(overview: &MarketOverview) {
    info!("");
    info!("Market overview:");
    info!("    businesses - {:>19}", overview.total_businesses);
    info!("    categories - {:>19}", overview.total_categories);
    if let Some((cat, count)) = overview.top_category() {
        info!("  top category - {:>19} ({})", cat, count);
    }
    for (zone, count) in &overview.zone_counts {
        info!("{:>14} - {:>19}", zone.to_string(), count);
    }
    info!("   top streets:");
    for (street, count) in &overview.top_streets {
        info!("      {:>30} {:>5}", street, count);
    }
    info!("");
}

fn log_recommendation(rec: &Recommendation) {
    let comp = &rec.competitors;

    info!("");
    info!("Recommended location for {}:", rec.category);
    info!("      latitude - {:>19.6}", rec.location.lat);
    info!("     longitude - {:>19.6}", rec.location.lon);
    info!("     zone type - {:>19}", rec.zone_type.to_string());
    info!("   opportunity - {:>19}", rec.opportunity_label());
    info!("    confidence - {:>19.2}", rec.confidence);
    info!("   competitors - {:>19}", rec.competitor_count);
    info!("   within 500m - {:>19}", comp.within_500m);
    info!("    within 1km - {:>19}", comp.within_1km);
    info!("    within 2km - {:>19}", comp.within_2km);
    info!("    saturation - {:>19.2}", comp.market_saturation);
    info!("      strategy - {}", comp.strategy.label());
    match (&comp.nearest, comp.distance_to_nearest_km) {
        (Some(nearest), Some(dist)) => {
            info!("       nearest - {} ({:.3} km)", nearest.name, dist)
        }
        _ => info!("       nearest - none"),
    }
    info!("    iterations - {:>19}", rec.iterations);
    if !rec.converged {
        log::warn!("K-Means hit the iteration limit before converging.");
    }

    info!("      clusters:");
    for score in &rec.ranking {
        info!(
            "        #{:<2} {:>4} businesses {:>4} competitors score {:>10.3}",
            score.cluster_id, score.members, score.competitor_count, score.score
        );
    }

    info!("        nearby:");
    for (business, dist) in &rec.nearby {
        info!(
            "        {:>30} {:>20} {:>6.3} km",
            business.name, business.category, dist
        );
    }
    info!("");
}
