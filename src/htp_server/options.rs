use clap::Parser;

#[derive(Clone, Debug, Parser)]
pub struct HtpServerOptions {
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Board width (and height unless --height is given).
    #[arg(short, long, default_value_t = 11)]
    pub boardsize: usize,

    #[arg(long)]
    pub height: Option<usize>,

    /// Extra inferior-cell patterns in the standard encoding.
    #[arg(short, long)]
    pub pattern_file: Option<std::path::PathBuf>,

    /// Swap-move list ("WxH cell" per line).
    #[arg(short, long)]
    pub swap_file: Option<std::path::PathBuf>,

    /// Database of solved positions.
    #[arg(short, long)]
    pub db_file: Option<std::path::PathBuf>,

    /// Store db records while at most this many stones are on board.
    #[arg(long, default_value_t = 10)]
    pub db_max_stones: usize,

    /// Transposition table size as log2 of the entry count.
    #[arg(long, default_value_t = 18)]
    pub tt_bits: usize,

    /// Solver wall-clock limit in seconds; unlimited when absent.
    #[arg(long)]
    pub time_limit: Option<u64>,

    /// Largest or-combination the connection builder explores.
    #[arg(long, default_value_t = 4)]
    pub max_ors: usize,

    /// Seed connection builds with edge templates.
    #[arg(long, default_value_t = true)]
    pub vc_patterns: bool,
}
