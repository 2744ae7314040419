use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "RS-LD",
    about = "A lap-discrete race simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing (per-lap tables after the race)
    #[clap(short, long)]
    pub debug: bool,

    /// Run without the interactive menu - every car is AI-controlled
    #[clap(short, long)]
    pub auto: bool,

    /// Export a lap-time chart to output/ after the race
    #[clap(long)]
    pub plot: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of simulation runs (only for auto mode, ignored otherwise)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation constants file (OPTIONAL: built-in defaults otherwise)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set the race distance in laps (the interactive menu prompts when omitted)
    #[clap(short = 'l', long)]
    pub tot_no_laps: Option<u32>,

    /// Seed the simulation RNG for a reproducible race
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Set the number of AI cars on the grid (overrides the constants file)
    #[clap(long)]
    pub no_ai_cars: Option<u32>,
}
