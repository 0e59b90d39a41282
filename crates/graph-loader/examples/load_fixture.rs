use graph_loader::SocialGraph;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/social");

    println!("Loading social graph fixture...\n");

    let start = Instant::now();
    let graph = SocialGraph::load_from_dir(data_dir)
        .expect("Failed to load social graph");
    let elapsed = start.elapsed();

    let (users, follows, blocks, mutes) = graph.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Follows: {}", follows);
    println!("Blocks: {}", blocks);
    println!("Mutes: {}", mutes);
    println!("\nPerformance: {:.0} edges/second",
             (follows + blocks + mutes) as f64 / elapsed.as_secs_f64());
}
