//! Tour Roster - Command Line Interface
//!
//! Builds and solves guide/tour assignment models from scenario files.

use clap::{Parser, Subcommand, ValueEnum};
use tour_roster::benchmark::{Benchmark, BenchmarkConfig};
use tour_roster::model::{
    ConstraintFamily, FamilySet, FinalWeekPolicy, ScheduleModel, SchedulerConfig, SlotLoadMode,
};
use tour_roster::scenario::{slot_label, Scenario, ScenarioGenerator};
use tour_roster::solver::{Backend, SolverConfig};

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "tour-roster")]
#[command(version = "1.0")]
#[command(about = "Assign guides to tours with a mixed-integer model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a scenario file
    Solve {
        #[arg(short, long)]
        scenario: PathBuf,

        /// Solver backend
        #[arg(short, long, value_enum, default_value = "milp")]
        backend: BackendArg,

        /// Time limit in seconds (gurobi only)
        #[arg(short, long)]
        time_limit: Option<f64>,

        /// Relative MIP gap (gurobi only)
        #[arg(long, default_value = "1e-6")]
        mip_gap: f64,

        /// Solver threads (0 = automatic)
        #[arg(long, default_value = "0")]
        threads: i32,

        /// What the slot load cap counts
        #[arg(long, value_enum, default_value = "tour-starts")]
        slot_load: SlotLoadArg,

        /// Workload cap for the final partial week
        #[arg(long, value_enum, default_value = "full-cap")]
        final_week: FinalWeekArg,

        /// Constraint families to leave out (repeatable)
        #[arg(long, value_enum)]
        disable: Vec<FamilyArg>,

        /// Write the schedule as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the assignments as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a random scenario file
    Generate {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, default_value = "42")]
        seed: u64,

        #[arg(long, default_value = "14")]
        days: usize,

        #[arg(long, default_value = "10")]
        tours: usize,

        #[arg(long, default_value = "6")]
        guides: usize,

        #[arg(long, default_value = "2")]
        weekly_workload: u32,

        #[arg(long, default_value = "2")]
        max_slot_load: u32,
    },

    /// Print scenario and model statistics without solving
    Inspect {
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Solve a batch of generated scenarios
    Benchmark {
        /// Number of scenarios
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Seed of the first scenario
        #[arg(short, long, default_value = "0")]
        seed: u64,

        #[arg(long, default_value = "14")]
        days: usize,

        #[arg(long, default_value = "10")]
        tours: usize,

        #[arg(long, default_value = "6")]
        guides: usize,

        #[arg(long, default_value = "2")]
        weekly_workload: u32,

        #[arg(long, default_value = "2")]
        max_slot_load: u32,

        #[arg(short, long, value_enum, default_value = "milp")]
        backend: BackendArg,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Solve one scenario at a time
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum BackendArg {
    /// Pure-Rust MILP (microlp)
    Milp,
    /// Gurobi (requires the `gurobi` feature)
    Gurobi,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum SlotLoadArg {
    /// Count tours starting in a slot
    TourStarts,
    /// Count guide assignments in a slot
    GuideAssignments,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum FinalWeekArg {
    /// Same cap as a full week
    FullCap,
    /// Cap scaled by the remaining slots
    Prorated,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum FamilyArg {
    Linkage,
    FixedTour,
    FixedGuide,
    TourStaffing,
    Availability,
    SlotLoad,
    WeeklyWorkload,
    AssignOnce,
    ValidRange,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Milp => Backend::Milp,
            BackendArg::Gurobi => Backend::Gurobi,
        }
    }
}

impl From<FamilyArg> for ConstraintFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Linkage => ConstraintFamily::Linkage,
            FamilyArg::FixedTour => ConstraintFamily::FixedTour,
            FamilyArg::FixedGuide => ConstraintFamily::FixedGuide,
            FamilyArg::TourStaffing => ConstraintFamily::TourStaffing,
            FamilyArg::Availability => ConstraintFamily::Availability,
            FamilyArg::SlotLoad => ConstraintFamily::SlotLoad,
            FamilyArg::WeeklyWorkload => ConstraintFamily::WeeklyWorkload,
            FamilyArg::AssignOnce => ConstraintFamily::AssignOnce,
            FamilyArg::ValidRange => ConstraintFamily::ValidRange,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            scenario,
            backend,
            time_limit,
            mip_gap,
            threads,
            slot_load,
            final_week,
            disable,
            output,
            csv,
            verbose,
        } => {
            let families = disable
                .into_iter()
                .fold(FamilySet::all(), |set, f| set.without(f.into()));
            let slot_load_mode = match slot_load {
                SlotLoadArg::TourStarts => SlotLoadMode::TourStarts,
                SlotLoadArg::GuideAssignments => SlotLoadMode::GuideAssignments,
            };
            let final_week_policy = match final_week {
                FinalWeekArg::FullCap => FinalWeekPolicy::FullCap,
                FinalWeekArg::Prorated => FinalWeekPolicy::Prorated,
            };
            let solver = SolverConfig {
                time_limit,
                mip_gap,
                threads,
                verbose,
            };
            solve_scenario(
                &scenario,
                backend.into(),
                solver,
                families,
                slot_load_mode,
                final_week_policy,
                output,
                csv,
                verbose,
            );
        }

        Commands::Generate {
            output,
            seed,
            days,
            tours,
            guides,
            weekly_workload,
            max_slot_load,
        } => {
            let generator = ScenarioGenerator {
                seed,
                day_count: days,
                tour_count: tours,
                guide_count: guides,
                weekly_workload,
                max_slot_load,
                ..Default::default()
            };
            generate_scenario(&generator, &output);
        }

        Commands::Inspect { scenario } => {
            inspect_scenario(&scenario);
        }

        Commands::Benchmark {
            runs,
            seed,
            days,
            tours,
            guides,
            weekly_workload,
            max_slot_load,
            backend,
            output,
            sequential,
        } => {
            let config = BenchmarkConfig {
                runs,
                first_seed: seed,
                generator: ScenarioGenerator {
                    day_count: days,
                    tour_count: tours,
                    guide_count: guides,
                    weekly_workload,
                    max_slot_load,
                    ..Default::default()
                },
                backend: backend.into(),
                parallel: !sequential,
                ..Default::default()
            };
            run_benchmark(config, &output);
        }
    }
}

fn load_scenario(path: &PathBuf) -> Scenario {
    match Scenario::from_file(path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Error loading scenario: {}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_scenario(
    path: &PathBuf,
    backend: Backend,
    solver: SolverConfig,
    families: FamilySet,
    slot_load_mode: SlotLoadMode,
    final_week_policy: FinalWeekPolicy,
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading scenario from {:?}...", path);
    let scenario = load_scenario(path);

    let registry = match scenario.registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Invalid scenario: {}", e);
            std::process::exit(1);
        }
    };
    let config = SchedulerConfig {
        families,
        slot_load_mode,
        final_week_policy,
        ..scenario.config()
    };

    if verbose {
        println!("{}", registry);
    }

    let start = Instant::now();
    let model = ScheduleModel::build(&registry, &config);
    if verbose {
        println!("{}", model.statistics());
    }

    println!("Solving with {:?} backend...", backend);
    let schedule = match model.solve(backend.create(solver).as_ref()) {
        Ok(schedule) => schedule,
        Err(e) => {
            eprintln!("Solver error: {}", e);
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Status: {}", schedule.status);
    println!("Objective: {}", schedule.objective);
    println!("Tours staffed: {}/{}", schedule.tour_slots.len(), registry.tours().len());
    println!("Guides working: {}/{}", schedule.guide_assignments.len(), registry.guides().len());
    println!("Time: {:.4}s", elapsed.as_secs_f64());

    if !schedule.is_usable() {
        println!("No assignment available; relax the caps or disable constraint families.");
    }

    let violations = schedule.violations(&registry, &config);
    if !violations.is_empty() {
        println!("\n{} rule violations:", violations.len());
        for v in &violations {
            println!("  {}", v);
        }
    }

    if verbose && schedule.is_usable() {
        println!("\nTours:");
        for (tour, slot) in &schedule.tour_slots {
            println!("  tour {:>4} -> slot {:>4} ({})", tour, slot, slot_label(*slot));
        }
        println!("\nGuides:");
        for (guide, tours) in &schedule.guide_assignments {
            let ids: Vec<String> = tours.iter().map(|t| t.to_string()).collect();
            println!("  guide {:>4}: {}", guide, ids.join(", "));
        }
    }

    if let Some(out_path) = output {
        match schedule.save_json(&out_path) {
            Ok(()) => println!("\nSchedule saved to {:?}", out_path),
            Err(e) => {
                eprintln!("Failed to write schedule: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Some(csv_path) = csv {
        match schedule.export_csv(&csv_path) {
            Ok(()) => println!("Assignments exported to {:?}", csv_path),
            Err(e) => {
                eprintln!("Failed to export assignments: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn generate_scenario(generator: &ScenarioGenerator, output: &PathBuf) {
    let scenario = match generator.generate() {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Cannot generate scenario: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = scenario.registry() {
        eprintln!("Generated scenario is invalid: {}", e);
        std::process::exit(1);
    }
    match scenario.save(output) {
        Ok(()) => println!(
            "Scenario with {} tours and {} guides over {} days saved to {:?}",
            scenario.tours.len(),
            scenario.guides.len(),
            scenario.day_count,
            output
        ),
        Err(e) => {
            eprintln!("Failed to write scenario: {}", e);
            std::process::exit(1);
        }
    }
}

fn inspect_scenario(path: &PathBuf) {
    let scenario = load_scenario(path);
    let registry = match scenario.registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Invalid scenario: {}", e);
            std::process::exit(1);
        }
    };

    println!("========== Scenario Analysis ==========\n");
    if !scenario.name.is_empty() {
        println!("Name: {}", scenario.name);
    }
    println!("{}", registry);
    println!(
        "Caps: weekly workload {}, max slot load {}",
        scenario.weekly_workload, scenario.max_slot_load
    );

    let available: Vec<usize> = registry
        .guides()
        .iter()
        .map(|g| g.available_slot_count())
        .collect();
    if !available.is_empty() {
        let avg = available.iter().sum::<usize>() as f64 / available.len() as f64;
        println!("\nAvailability (slots per guide over the horizon):");
        println!("  Average: {:.1}", avg);
        println!("  Min: {}", available.iter().min().copied().unwrap_or(0));
        println!("  Max: {}", available.iter().max().copied().unwrap_or(0));
        let idle = available.iter().filter(|&&n| n == 0).count();
        if idle > 0 {
            println!("  Guides never available: {}", idle);
        }
    }

    let capacity = registry.guides().len() * registry.week_windows().len() * scenario.weekly_workload as usize;
    let demand: usize = registry.tours().iter().map(|t| t.guide_count as usize).sum();
    println!("\nWorkload: {} guide-slots demanded, at most {} available under the weekly cap", demand, capacity);

    let model = ScheduleModel::build(&registry, &scenario.config());
    println!("\n{}", model.statistics());
}

fn run_benchmark(config: BenchmarkConfig, output: &PathBuf) {
    println!(
        "Benchmarking {} scenarios ({} days, {} tours, {} guides)...",
        config.runs, config.generator.day_count, config.generator.tour_count, config.generator.guide_count
    );

    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    let mut benchmark = Benchmark::new(config);
    benchmark.run();

    let results_path = output.join("results.csv");
    match benchmark.export_to_csv(&results_path) {
        Ok(()) => println!("\nResults exported to {:?}", results_path),
        Err(e) => eprintln!("Failed to export results: {}", e),
    }

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    match std::fs::write(&report_path, &report) {
        Ok(()) => println!("Report saved to {:?}", report_path),
        Err(e) => eprintln!("Failed to save report: {}", e),
    }
}
