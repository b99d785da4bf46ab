use principal_ratings::Result;
use principal_ratings::power::{Alternative, PowerParams, bonferroni_alpha, required_sample_size};

/// Groups compared: every principal category plus the all-principals baseline.
const INPUTS: [&str; 10] = [
    "all",
    "actor",
    "actress",
    "director",
    "writer",
    "producer",
    "cinematographer",
    "composer",
    "editor",
    "production designer",
];
const OUTPUTS: [&str; 1] = ["average rating"];

fn main() -> Result<()> {
    principal_ratings::init_tracing();

    let alpha = bonferroni_alpha(0.05, INPUTS.len(), OUTPUTS.len());
    tracing::info!(alpha, hypotheses = INPUTS.len() * OUTPUTS.len(), "bonferroni correction");

    let n = required_sample_size(&PowerParams {
        effect_size: 0.2,
        alpha,
        power: 0.8,
        ratio: 1.0,
        alternative: Alternative::TwoSided,
    })?;
    println!("Sample size needed: {n}");
    Ok(())
}
