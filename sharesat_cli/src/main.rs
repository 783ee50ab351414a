//! Command-line driver: parses flags into a [Config], loads the DIMACS
//! input, wires one [StubSolver] per engine into the chosen portfolio
//! working strategy, and reports the result in the usual `s SATISFIABLE`
//! form.

use std::sync::Arc;

use sharesat_cli::solver::StubSolver;
use sharesat_cli::{cli, config_io, dimacs};
use sharesat_core::config::Portfolio;
use sharesat_core::dispatch::report::Solve;
use sharesat_core::global::transport::LoopbackTransport;
use sharesat_core::solver::SolverInterface;
use sharesat_core::working::portfolio_prs::PortfolioPrs;
use sharesat_core::working::portfolio_simple::PortfolioSimple;
use sharesat_core::working::termination::Termination;
use sharesat_core::working::WorkingStrategy;

fn main() {
    #[cfg(feature = "log")]
    env_logger::init();

    let matches = cli::cli().get_matches();
    let config = config_io::config_from_args(&matches);
    let options = config_io::cli_options_from_args(&matches);

    if options.paths.is_empty() {
        eprintln!("c no input file given");
        std::process::exit(1);
    }

    if config.enable_distributed && config.cpus == 0 {
        eprintln!("c --enable-distributed requires at least one solver engine per rank");
        std::process::exit(2);
    }

    let mut var_count = 0usize;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    for path in &options.paths {
        match dimacs::load(path) {
            Ok(formula) => {
                var_count = var_count.max(formula.var_count);
                clauses.extend(formula.clauses);
            }
            Err(e) => {
                eprintln!("c error loading {}: {e}", path.display());
                std::process::exit(3);
            }
        }
    }

    let termination = Termination::new();

    let result = match config.portfolio {
        Portfolio::Simple => {
            let factory: Arc<sharesat_core::working::portfolio_simple::SolverFactory> =
                Arc::new(|id, diversification| -> Box<dyn SolverInterface> {
                    Box::new(StubSolver::new(id, diversification))
                });
            let portfolio = PortfolioSimple::new(config.clone(), factory, None);
            portfolio.run(&clauses, var_count, Arc::clone(&termination))
        }
        Portfolio::Prs => {
            let factory: Arc<sharesat_core::working::portfolio_prs::GroupedSolverFactory> =
                Arc::new(|id, _group, diversification| -> Box<dyn SolverInterface> {
                    Box::new(StubSolver::new(id, diversification))
                });
            let transport = Arc::new(LoopbackTransport::default());
            let portfolio = PortfolioPrs::new(config.clone(), factory, transport, None);
            portfolio.run(&clauses, var_count, Arc::clone(&termination))
        }
    };

    let model = termination.result().and_then(|(_, model, _)| model);

    match result {
        Solve::Satisfiable => {
            println!("s SATISFIABLE");
            if !config.no_model {
                if let Some(model) = model {
                    let valuation: Vec<String> = model.iter().map(|lit| lit.to_string()).collect();
                    println!("v {} 0", valuation.join(" "));
                }
            }
            std::process::exit(10);
        }
        Solve::Unsatisfiable => {
            println!("s UNSATISFIABLE");
            std::process::exit(20);
        }
        Solve::Unknown | Solve::TimedOut => {
            println!("s UNKNOWN");
            std::process::exit(0);
        }
    }
}
