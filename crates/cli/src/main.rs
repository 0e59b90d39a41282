use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use graph_loader::{SocialGraph, UserId};
use pipeline::PublicCandidate;
use server::{SearchConfig, SearchError, SearchOptions, SearchOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// people-search - User discovery over a social graph
#[derive(Parser)]
#[command(name = "people-search")]
#[command(about = "Search for people by name, ranked by relationship", long_about = None)]
struct Cli {
    /// Path to the social graph directory
    #[arg(short, long, default_value = "data/social")]
    data_dir: PathBuf,

    /// Path to a TOML search config (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for people as a given user
    Search {
        /// User ID performing the search
        #[arg(long)]
        user_id: UserId,

        /// Search term
        #[arg(long)]
        term: String,

        /// Print the per-stage metrics report
        #[arg(long)]
        metrics: bool,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,

        /// Include score and branch for each result
        #[arg(long)]
        diagnostics: bool,
    },

    /// Show a user's profile and connections
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Validate a search term without searching
    CheckTerm {
        #[arg(long)]
        term: String,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of searches to run
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of searches in flight at once
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

    let config = match &cli.config {
        Some(path) => SearchConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SearchConfig::default(),
    };

    println!("Loading social graph from {}...", cli.data_dir.display());
    let start = Instant::now();
    let graph = Arc::new(
        SocialGraph::load_from_dir(&cli.data_dir).context("Failed to load social graph")?,
    );
    println!("{} Loaded graph in {:?}", "✓".green(), start.elapsed());

    let orchestrator = SearchOrchestrator::from_graph(graph.clone(), config)?;

    match cli.command {
        Commands::Search {
            user_id,
            term,
            metrics,
            json,
            diagnostics,
        } => {
            let options = SearchOptions {
                metrics_enabled: metrics,
                diagnostics,
            };
            handle_search(&orchestrator, user_id, &term, options, json).await?
        }
        Commands::User { user_id } => handle_user(&graph, user_id)?,
        Commands::CheckTerm { term } => handle_check_term(&orchestrator, &term),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(orchestrator, &graph, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'search' command
async fn handle_search(
    orchestrator: &SearchOrchestrator,
    user_id: UserId,
    term: &str,
    options: SearchOptions,
    json: bool,
) -> Result<()> {
    match orchestrator.search(term, user_id, options).await {
        Ok(response) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }
            print_results(term, &response.results);
            if let Some(report) = &response.metrics {
                println!("\n{}", "Metrics:".bold().blue());
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            Ok(())
        }
        Err(SearchError::Validation(e)) => {
            println!("{} {} ({})", "✗".red(), e.message, e.code.yellow());
            Ok(())
        }
        Err(e) => {
            if let Some(report) = e.metrics() {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            Err(anyhow!(e))
        }
    }
}

/// Handle the 'user' command
fn handle_user(graph: &SocialGraph, user_id: UserId) -> Result<()> {
    let user = graph
        .get_user(user_id)
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;

    let badge = if user.verified { " ✓".cyan().to_string() } else { String::new() };
    println!("{}{}", format!("@{} ({})", user.username, user.display_name).bold().blue(), badge);
    println!("{}Followers: {}", "• ".green(), user.follower_count);
    println!("{}Following: {}", "• ".green(), user.following_count);
    println!("{}Moments: {}", "• ".green(), user.moment_count);
    if let Some(location) = &user.location {
        println!("{}Location: {:.3}, {:.3}", "• ".green(), location.lat, location.lon);
    }

    let mut following: Vec<UserId> = graph.following_of(user_id).collect();
    following.sort_unstable();
    println!("Follows ({}):", following.len());
    for id in following.iter().take(10) {
        if let Some(other) = graph.get_user(*id) {
            let mutual = if graph.follows(*id, user_id) { " (mutual)" } else { "" };
            println!("  - @{}{}", other.username, mutual.dimmed());
        }
    }

    println!(
        "{}Blocks issued: {}, mutes issued: {}",
        "• ".cyan(),
        graph.block_count(user_id),
        graph.mute_count(user_id)
    );
    Ok(())
}

/// Handle the 'check-term' command
fn handle_check_term(orchestrator: &SearchOrchestrator, term: &str) {
    match orchestrator.validator().validate(term) {
        Ok(validated) => println!(
            "{} '{}' ({} chars, {} bytes)",
            "✓".green(),
            validated.term,
            validated.char_length,
            validated.byte_length
        ),
        Err(e) => {
            println!("{} {} ({})", "✗".red(), e.message, e.code.yellow());
            if let Some(details) = &e.details {
                if let Some(current) = details.current_length {
                    println!("   length: {}", current);
                }
                if let Some(invalid) = &details.invalid_characters {
                    println!("   invalid characters: {:?}", invalid);
                }
            }
        }
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    orchestrator: SearchOrchestrator,
    graph: &SocialGraph,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_ids = graph.user_ids();
    if user_ids.is_empty() || requests == 0 {
        return Err(anyhow!("Benchmark needs at least one user and one request"));
    }

    // Search terms are username prefixes so most searches hit something
    let terms: Vec<String> = user_ids
        .iter()
        .filter_map(|id| graph.get_user(*id))
        .map(|u| u.username.chars().take(3).collect::<String>())
        .filter(|t| t.chars().count() >= 2)
        .collect();
    if terms.is_empty() {
        return Err(anyhow!("No usernames long enough to build search terms"));
    }

    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();

    let mut handles = vec![];
    for _ in 0..requests {
        let user = user_ids[rand::random::<u32>() as usize % user_ids.len()];
        let term = terms[rand::random::<u32>() as usize % terms.len()].clone();
        let orchestrator = orchestrator.clone();
        let semaphore = semaphore.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let start = Instant::now();
            orchestrator.search(&term, user, SearchOptions::default()).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    let wall = wall_clock.elapsed();

    let total: Duration = timings.iter().sum();
    let avg_latency = total / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent);
    println!("Wall time: {:?}", wall);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} searches/second",
        requests as f32 / wall.as_secs_f32()
    );

    Ok(())
}

/// Print results as a numbered list
fn print_results(term: &str, results: &[PublicCandidate]) {
    println!("{}", format!("Results for '{}':", term).bold().blue());
    if results.is_empty() {
        println!("  (no matches)");
        return;
    }
    for (i, person) in results.iter().enumerate() {
        let mut line = format!(
            "{}. @{} ({})",
            (i + 1).to_string().green(),
            person.username,
            person.display_name
        );
        if person.verified {
            line.push_str(&" ✓".cyan().to_string());
        }
        if person.mutual_follow {
            line.push_str(&" [mutual]".yellow().to_string());
        }
        println!(
            "{} - {} followers",
            line, person.stats.follower_count
        );
        if let Some(d) = &person.diagnostics {
            println!("   score {:.2}, branch {}", d.score, d.branch);
        }
    }
}
