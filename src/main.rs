// src/main.rs

use colored::Colorize;
use solver_runtime::driver::LlmSolver;
use solver_runtime::{SolverConfig, SolverEvent};
use tracing_subscriber::EnvFilter;

const DEMO_QUERY: &str = "Sarah has 5 apples. She gives 2 to John. Then, she doubles her \
     remaining apples. If she buys 3 more, how many apples does she have \
     now? If apples cost $0.50 each, what is the total value of her apples?";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match SolverConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        DEMO_QUERY.to_string()
    } else {
        args.join(" ")
    };

    println!("\n=== Solving Query ===\n{}\n====================", query.bold());

    let solver = LlmSolver::from_config(config);
    let result = solver.solve_with(&query, render_event);

    if let Err(err) = result {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn render_event(event: SolverEvent) {
    match event {
        SolverEvent::Plan(steps) => {
            println!("\n{}", "[Plan]".cyan().bold());
            for step in &steps {
                println!("  {}. ({}) {}", step.step_num, step.kind, step.description);
            }
        }
        SolverEvent::Attempt(attempt) => {
            let record = &attempt.record;
            if record.attempt == 1 {
                println!(
                    "\n--- Step {}: {} ({}) ---",
                    attempt.step.step_num,
                    attempt.step.description,
                    attempt.step.kind
                );
            }
            println!("{}\n{}", "[Generated Code]".cyan(), record.code);
            println!("{} {}", "[Execution Output]".cyan(), record.output);
            if record.accepted {
                println!("{} {}", "[Self-Critic]".green(), record.feedback);
            } else {
                println!("{} {}", "[Self-Critic]".yellow(), record.feedback);
                if record.attempt == solver_runtime::runner::MAX_CRITIQUE_ATTEMPTS {
                    println!("{}", "⚠️  Failed to refine after max attempts.".yellow());
                } else {
                    println!("↺ Refining…");
                }
            }
        }
        SolverEvent::FinalAnswer(answer) => {
            println!(
                "\n{}\n{}\n====================\n",
                "=== Final Answer ===".green().bold(),
                answer
            );
        }
        SolverEvent::Error(message) => {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
        SolverEvent::Done => {}
    }
}
