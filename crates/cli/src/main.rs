use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::UserId;
use model::DEFAULT_MODEL_FILE;
use pipeline::{build_user_context, CandidateUniverse};
use rand::seq::IndexedRandom;
use server::{
    DEFAULT_RECOMMENDATION_COUNT, MovieRecommendation, RecommendationService, ServiceConfig,
    StartupError, UnknownUserPolicy, create_router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Movie recommendations from a pre-trained rating model", long_about = None)]
struct Cli {
    /// Directory holding ratings.csv and movies.csv
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Path to the model artifact
    #[arg(short, long, default_value = DEFAULT_MODEL_FILE)]
    model: PathBuf,

    /// Answer users without ratings with an error instead of a cold-start list
    #[arg(long)]
    reject_unknown_users: bool,

    /// Which movies are scored for every request
    #[arg(long, value_enum, default_value_t = Candidates::RatedAndCatalog)]
    candidates: Candidates,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Candidates {
    /// Movies that appear in the ratings table
    Rated,
    /// Rated movies plus every movie of the movies table
    RatedAndCatalog,
}

impl From<Candidates> for CandidateUniverse {
    fn from(candidates: Candidates) -> Self {
        match candidates {
            Candidates::Rated => CandidateUniverse::RatedMovies,
            Candidates::RatedAndCatalog => CandidateUniverse::RatedAndCatalog,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON endpoint and the form page
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Get movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value_t = DEFAULT_RECOMMENDATION_COUNT)]
        limit: usize,
    },

    /// Show a user's rating history
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = ServiceConfig {
        universe: cli.candidates.into(),
        unknown_user_policy: if cli.reject_unknown_users {
            UnknownUserPolicy::Reject
        } else {
            UnknownUserPolicy::ColdStart
        },
    };

    // Model and tables are loaded once, before anything is served
    println!(
        "Loading model {} and tables from {}...",
        cli.model.display(),
        cli.data_dir.display()
    );
    let start = Instant::now();
    let service = RecommendationService::load(&cli.data_dir, &cli.model, config)
        .context("Failed to start recommendation service")?;
    println!("{} Loaded in {:?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Serve { host, port } => handle_serve(service, &host, port).await?,
        Commands::Recommend { user_id, limit } => {
            handle_recommend(&service, user_id, limit).await?
        }
        Commands::User { user_id } => handle_user(&service, user_id)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(service, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'serve' command
async fn handle_serve(service: RecommendationService, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(%addr, "Listening");
    println!("{} Serving on http://{}", "✓".green(), addr);

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Handle the 'recommend' command
async fn handle_recommend(
    service: &RecommendationService,
    user_id: UserId,
    limit: usize,
) -> Result<()> {
    let recommendations = service.recommend_blocking(user_id, limit).await?;

    if recommendations.is_empty() {
        println!("{}", format!("No unrated movies left for user {user_id}").yellow());
        return Ok(());
    }
    print_recommendations(user_id, &recommendations);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(service: &RecommendationService, user_id: UserId) -> Result<()> {
    let data_index = service.data_index();
    let context = build_user_context(data_index, user_id);
    if !context.is_known() {
        bail!("User {} has no ratings", user_id);
    }

    println!("{}", format!("User ID: {user_id}").bold().blue());
    println!("{}Number of ratings: {}", "• ".cyan(), context.rated_movies.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), context.avg_rating);

    let ratings = data_index.get_user_ratings(user_id);

    let mut top_rated: Vec<_> = ratings.iter().collect();
    top_rated.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });

    println!("Top rated movies:");
    for rating in top_rated.iter().take(5) {
        let title = data_index.get_title(rating.movie_id).unwrap_or("<unknown title>");
        println!("  - {} (Rating: {})", title, rating.rating);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: RecommendationService,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("--requests and --concurrent must both be at least 1");
    }

    let known_users = service.data_index().user_ids();
    if known_users.is_empty() {
        bail!("Ratings table has no users to benchmark with");
    }

    let mut rng = rand::rng();
    let user_ids: Vec<UserId> = (0..requests)
        .filter_map(|_| known_users.choose(&mut rng).copied())
        .collect();

    println!(
        "Running {} requests with concurrency {}...",
        requests, concurrent
    );

    let semaphore = Arc::new(Semaphore::new(concurrent));
    let wall_clock = Instant::now();

    let mut handles = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let service = service.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let start = Instant::now();
            service
                .recommend_blocking(user_id, DEFAULT_RECOMMENDATION_COUNT)
                .await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(handles.len());
    for handle in handles {
        timings.push(handle.await.context("Benchmark task panicked")??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let avg_latency = mean(&timings);
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Mean of non-empty timings
fn mean(timings: &[Duration]) -> Duration {
    let sum: Duration = timings.iter().sum();
    sum.div_f64(timings.len() as f64)
}

/// Nearest-rank percentile of sorted, non-empty timings
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Helper function to format and print recommendations
fn print_recommendations(user_id: UserId, recommendations: &[MovieRecommendation]) {
    println!(
        "{}",
        format!("Top Movie Recommendations for user {user_id}:").bold().blue()
    );
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} - Estimated rating: {:.2}",
            (i + 1).to_string().green(),
            rec.title,
            rec.estimated_rating
        );
    }
}
