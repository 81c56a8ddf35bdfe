use blossom_matching::MaximumWeightMatching;

// Run with RUST_LOG=debug to see every step of the algorithm.
fn main() {
    env_logger::init();

    let weighted_edges = vec![(1, 2, 2i64), (1, 3, -2), (2, 3, 1), (2, 4, -1), (3, 4, -6)];
    let engine = MaximumWeightMatching::new()
        .max_cardinality(true)
        .trace(true)
        .verify_optimum(true);

    match engine.solve(&weighted_edges) {
        Ok(matching) => {
            for (u, v) in matching.pairs() {
                println!("{} {}", u, v);
            }
            println!(
                "cardinality {} weight {}",
                matching.cardinality(),
                matching.weight()
            );
        }
        Err(e) => {
            log::error!("matching failed: {}", e);
            std::process::exit(1);
        }
    }
}
