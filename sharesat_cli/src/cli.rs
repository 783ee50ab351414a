//! Clap argument definitions. Flag names follow the stable surface named in
//! spec.md §6 (`solver`, `cpus`, `timeout`, `enableDistributed`, ...),
//! rendered as kebab-case long flags in the usual clap style.

use std::path::PathBuf;

use clap::{value_parser, Arg, Command};

use sharesat_core::config::defaults;

pub fn cli() -> Command {
    Command::new("sharesat")
        .about("Portfolio/distributed clause-sharing driver for SAT solving engines")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("paths")
                .required(false)
                .trailing_var_arg(true)
                .num_args(0..)
                .value_parser(value_parser!(PathBuf))
                .help("The DIMACS CNF file(s) to parse (as a single formula)."),
        )
        .arg(
            Arg::new("solver")
                .long("solver")
                .value_name("PORTFOLIO")
                .value_parser(["simple", "prs"])
                .required(false)
                .num_args(1)
                .help("Which portfolio working strategy to run: 'simple' or 'prs'. Default: simple"),
        )
        .arg(
            Arg::new("cpus")
                .long("cpus")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .required(false)
                .num_args(1)
                .help(format!("Number of solver engines to run on this rank. Default: {}", defaults::CPUS)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .short('t')
                .value_name("SECONDS")
                .value_parser(value_parser!(u64))
                .required(false)
                .num_args(1)
                .help("Overall run timeout in seconds. Default: no limit"),
        )
        .arg(
            Arg::new("enable_distributed")
                .long("enable-distributed")
                .value_parser(value_parser!(bool))
                .required(false)
                .num_args(0)
                .help("Attempt to use a distributed (cross-rank) transport."),
        )
        .arg(
            Arg::new("global_strategy")
                .long("global-strategy")
                .value_name("STRATEGY")
                .value_parser(["all-gather", "ring", "mallob"])
                .required(false)
                .num_args(1)
                .help("Which cross-rank strategy to wire up when distributed. Default: ring"),
        )
        .arg(
            Arg::new("simple")
                .long("simple")
                .value_parser(value_parser!(bool))
                .required(false)
                .num_args(0)
                .help("Use the Simple local sharing strategy instead of HordeSat."),
        )
        .arg(
            Arg::new("max_clause_size")
                .long("max-clause-size")
                .value_name("LITERALS")
                .value_parser(value_parser!(usize))
                .required(false)
                .num_args(1)
                .help(format!("Maximum literal count for any admitted clause. Default: {}", defaults::MAX_CLAUSE_SIZE)),
        )
        .arg(
            Arg::new("shared_literals_per_producer")
                .long("shared-literals-per-producer")
                .value_name("LITERALS")
                .value_parser(value_parser!(usize))
                .required(false)
                .num_args(1)
                .help(format!(
                    "HordeSat target literals/tick/producer. Default: {}",
                    defaults::SHARED_LITERALS_PER_PRODUCER
                )),
        )
        .arg(
            Arg::new("horde_initial_lbd_limit")
                .long("horde-initial-lbd-limit")
                .value_name("LBD")
                .value_parser(value_parser!(f64))
                .required(false)
                .num_args(1)
                .help(format!("HordeSat initial LBD admission threshold. Default: {}", defaults::HORDE_INITIAL_LBD_LIMIT)),
        )
        .arg(
            Arg::new("horde_init_round")
                .long("horde-init-round")
                .value_name("TICKS")
                .value_parser(value_parser!(u32))
                .required(false)
                .num_args(1)
                .help(format!("Ticks during which HordeSat admits everything, unadapted. Default: {}", defaults::HORDE_INIT_ROUND)),
        )
        .arg(
            Arg::new("simple_share_limit")
                .long("simple-share-limit")
                .value_name("LITERALS")
                .value_parser(value_parser!(usize))
                .required(false)
                .num_args(1)
                .help(format!("Simple-variant fixed share limit, literals/tick. Default: {}", defaults::SIMPLE_SHARE_LIMIT)),
        )
        .arg(
            Arg::new("global_shared_literals")
                .long("global-shared-literals")
                .value_name("LITERALS")
                .value_parser(value_parser!(usize))
                .required(false)
                .num_args(1)
                .help(format!("Literal budget for one AllGather/Ring payload. Default: {}", defaults::GLOBAL_SHARED_LITERALS)),
        )
        .arg(
            Arg::new("mallob_max_buffer_size")
                .long("mallob-max-buffer-size")
                .value_name("CLAUSES")
                .value_parser(value_parser!(usize))
                .required(false)
                .num_args(1)
                .help(format!("Mallob aggregation buffer size, in clauses. Default: {}", defaults::MALLOB_MAX_BUFFER_SIZE)),
        )
        .arg(
            Arg::new("mallob_lbd_limit")
                .long("mallob-lbd-limit")
                .value_name("LBD")
                .value_parser(value_parser!(u32))
                .required(false)
                .num_args(1)
                .help(format!("Mallob ingress LBD filter. Default: {}", defaults::MALLOB_LBD_LIMIT)),
        )
        .arg(
            Arg::new("mallob_size_limit")
                .long("mallob-size-limit")
                .value_name("LITERALS")
                .value_parser(value_parser!(usize))
                .required(false)
                .num_args(1)
                .help(format!("Mallob ingress size filter. Default: {}", defaults::MALLOB_SIZE_LIMIT)),
        )
        .arg(
            Arg::new("mallob_sharings_per_second")
                .long("mallob-sharings-per-second")
                .value_name("RATE")
                .value_parser(value_parser!(f64))
                .required(false)
                .num_args(1)
                .help(format!("Mallob target global sharing rate. Default: {}", defaults::MALLOB_SHARINGS_PER_SECOND)),
        )
        .arg(
            Arg::new("mallob_max_compensation")
                .long("mallob-max-compensation")
                .value_name("MULTIPLIER")
                .value_parser(value_parser!(f64))
                .required(false)
                .num_args(1)
                .help(format!("Mallob per-rank maximum compensation multiplier. Default: {}", defaults::MALLOB_MAX_COMPENSATION)),
        )
        .arg(
            Arg::new("mallob_reshare_period")
                .long("mallob-reshare-period")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .required(false)
                .num_args(1)
                .help(format!("Mallob compensation accounting window, in seconds. Default: {}", defaults::MALLOB_RESHARE_PERIOD)),
        )
        .arg(
            Arg::new("one_sharer")
                .long("one-sharer")
                .value_parser(value_parser!(bool))
                .required(false)
                .num_args(0)
                .help("Drive every strategy from a single round-robin sharer thread."),
        )
        .arg(
            Arg::new("no_model")
                .long("no-model")
                .value_parser(value_parser!(bool))
                .required(false)
                .num_args(0)
                .help("Suppress model output on SAT."),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .value_name("LEVEL")
                .value_parser(value_parser!(u8))
                .required(false)
                .num_args(1)
                .help("Verbosity level for progress messages. Default: 0"),
        )
}
