//! Example: Generate search candidates for a requester
//!
//! Run with: cargo run --package sources --example generate_candidates
//!
//! This example shows how to:
//! 1. Load the sample social graph
//! 2. Generate related (connected) candidates
//! 3. Generate unknown (unconnected) candidates
//! 4. Display the rows and the branch overlap

use graph_loader::SocialGraph;
use sources::{CandidateQuery, RelatedCandidates, UnknownCandidates};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== People Search Candidate Generation Example ===\n");

    let start = Instant::now();
    let graph = Arc::new(SocialGraph::load_from_dir(Path::new("data/social"))?);
    println!("Loaded graph in {:?}\n", start.elapsed());

    let query = CandidateQuery::new("sam", 1, 100);
    println!("Requester: {}  Term: '{}'\n", query.requester_id, query.term);

    let related = RelatedCandidates::new(graph.clone());
    let start = Instant::now();
    let related_rows = related.get_candidates(&query)?;
    let related_time = start.elapsed();
    println!("Generated {} related candidates in {:?}", related_rows.len(), related_time);
    for (i, row) in related_rows.iter().take(5).enumerate() {
        println!(
            "  {}. @{} ({}) weight {:.2}{}",
            i + 1,
            row.username,
            row.display_name,
            row.relationship_weight.unwrap_or(0.0),
            if row.mutual_follow { " [mutual]" } else { "" }
        );
    }

    let unknown = UnknownCandidates::new(graph.clone());
    let start = Instant::now();
    let unknown_rows = unknown.get_candidates(&query)?;
    let unknown_time = start.elapsed();
    println!("\nGenerated {} unknown candidates in {:?}", unknown_rows.len(), unknown_time);
    for (i, row) in unknown_rows.iter().take(5).enumerate() {
        println!(
            "  {}. @{} ({}) weight {:.2}",
            i + 1,
            row.username,
            row.display_name,
            row.relationship_weight.unwrap_or(0.0)
        );
    }

    // The branches partition the matches, so the overlap should be zero
    let related_ids: HashSet<_> = related_rows.iter().map(|r| r.id).collect();
    let overlap = unknown_rows.iter().filter(|r| related_ids.contains(&r.id)).count();
    println!("\nOverlap between branches: {}", overlap);

    Ok(())
}
