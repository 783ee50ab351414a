//! `ArgMatches` -> [Config] translation, plus the CLI-only fields that never
//! belong in the library's own config (file paths, verbosity, output
//! suppression).

use std::path::PathBuf;

use clap::ArgMatches;

use sharesat_core::config::{Config, GlobalStrategyKind, Portfolio};

pub const VERBOSITY: u8 = 0;

#[derive(Clone, Debug)]
pub struct CliOptions {
    pub paths: Vec<PathBuf>,
    pub no_model: bool,
    pub verbosity: u8,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            paths: Vec::default(),
            no_model: false,
            verbosity: VERBOSITY,
        }
    }
}

pub fn cli_options_from_args(args: &ArgMatches) -> CliOptions {
    let mut options = CliOptions::default();

    if let Ok(Some(paths)) = args.try_get_many::<PathBuf>("paths") {
        options.paths = paths.cloned().collect();
    };

    if let Ok(Some(true)) = args.try_get_one::<bool>("no_model") {
        options.no_model = true;
    };

    if let Ok(Some(level)) = args.try_get_one::<u8>("verbosity") {
        options.verbosity = *level;
    };

    options
}

pub fn config_from_args(args: &ArgMatches) -> Config {
    let mut the_config = Config::default();

    if let Ok(Some(solver)) = args.try_get_one::<String>("solver") {
        the_config.portfolio = match solver.as_str() {
            "prs" => Portfolio::Prs,
            _ => Portfolio::Simple,
        };
    };

    if let Ok(Some(cpus)) = args.try_get_one::<usize>("cpus") {
        the_config.cpus = *cpus;
    };

    if let Ok(Some(secs)) = args.try_get_one::<u64>("timeout") {
        the_config.timeout = Some(*secs);
    };

    if let Ok(Some(true)) = args.try_get_one::<bool>("enable_distributed") {
        the_config.enable_distributed = true;
    };

    if let Ok(Some(strategy)) = args.try_get_one::<String>("global_strategy") {
        the_config.global_strategy = match strategy.as_str() {
            "all-gather" => GlobalStrategyKind::AllGather,
            "mallob" => GlobalStrategyKind::Mallob,
            _ => GlobalStrategyKind::Ring,
        };
    };

    if let Ok(Some(true)) = args.try_get_one::<bool>("simple") {
        the_config.simple = true;
    };

    if let Ok(Some(size)) = args.try_get_one::<usize>("max_clause_size") {
        the_config.max_clause_size = *size;
    };

    if let Ok(Some(literals)) = args.try_get_one::<usize>("shared_literals_per_producer") {
        the_config.shared_literals_per_producer = *literals;
    };

    if let Ok(Some(lbd)) = args.try_get_one::<f64>("horde_initial_lbd_limit") {
        the_config.horde_initial_lbd_limit = *lbd;
    };

    if let Ok(Some(ticks)) = args.try_get_one::<u32>("horde_init_round") {
        the_config.horde_init_round = *ticks;
    };

    if let Ok(Some(limit)) = args.try_get_one::<usize>("simple_share_limit") {
        the_config.simple_share_limit = *limit;
    };

    if let Ok(Some(literals)) = args.try_get_one::<usize>("global_shared_literals") {
        the_config.global_shared_literals = *literals;
    };

    if let Ok(Some(clauses)) = args.try_get_one::<usize>("mallob_max_buffer_size") {
        the_config.mallob_max_buffer_size = *clauses;
    };

    if let Ok(Some(lbd)) = args.try_get_one::<u32>("mallob_lbd_limit") {
        the_config.mallob_lbd_limit = *lbd;
    };

    if let Ok(Some(size)) = args.try_get_one::<usize>("mallob_size_limit") {
        the_config.mallob_size_limit = *size;
    };

    if let Ok(Some(rate)) = args.try_get_one::<f64>("mallob_sharings_per_second") {
        the_config.mallob_sharings_per_second = *rate;
    };

    if let Ok(Some(multiplier)) = args.try_get_one::<f64>("mallob_max_compensation") {
        the_config.mallob_max_compensation = *multiplier;
    };

    if let Ok(Some(period)) = args.try_get_one::<f64>("mallob_reshare_period") {
        the_config.mallob_reshare_period = *period;
    };

    if let Ok(Some(true)) = args.try_get_one::<bool>("one_sharer") {
        the_config.one_sharer = true;
    };

    if let Ok(Some(true)) = args.try_get_one::<bool>("no_model") {
        the_config.no_model = true;
    };

    if let Ok(Some(level)) = args.try_get_one::<u8>("verbosity") {
        the_config.verbosity = *level;
    };

    the_config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::cli;

    #[test]
    fn defaults_survive_an_empty_argv() {
        let matches = cli().get_matches_from(["sharesat"]);
        let config = config_from_args(&matches);
        assert_eq!(config.portfolio, Portfolio::Simple);
        assert_eq!(config.cpus, sharesat_core::config::defaults::CPUS);
    }

    #[test]
    fn flags_override_defaults() {
        let matches = cli().get_matches_from([
            "sharesat",
            "--solver",
            "prs",
            "--cpus",
            "4",
            "--enable-distributed",
            "--global-strategy",
            "mallob",
            "input.cnf",
        ]);
        let config = config_from_args(&matches);
        let options = cli_options_from_args(&matches);
        assert_eq!(config.portfolio, Portfolio::Prs);
        assert_eq!(config.cpus, 4);
        assert!(config.enable_distributed);
        assert_eq!(config.global_strategy, GlobalStrategyKind::Mallob);
        assert_eq!(options.paths, vec![PathBuf::from("input.cnf")]);
    }
}
