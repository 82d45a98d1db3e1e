//! Benchmarking module.
//!
//! Generates a batch of seeded scenarios, builds and solves each one
//! independently (in parallel, each run owns its registry and model), and
//! collects per-run records for CSV export and a text report.

use crate::model::ScheduleModel;
use crate::scenario::ScenarioGenerator;
use crate::solver::{Backend, SolveStatus, SolverConfig};

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Result of solving one generated scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub seed: u64,
    pub tours: usize,
    pub guides: usize,
    pub slots: usize,
    pub variables: usize,
    pub constraints: usize,
    pub status: SolveStatus,
    pub objective: i64,
    pub build_time: f64,
    pub solve_time: f64,
    /// Hard-rule violations found when re-checking the decoded schedule
    pub violations: usize,
    /// Set when the backend itself failed
    pub error: Option<String>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of scenarios
    pub runs: usize,
    /// Seed of the first scenario; run i uses `first_seed + i`
    pub first_seed: u64,
    /// Shape of the generated scenarios (its seed is overridden)
    pub generator: ScenarioGenerator,
    pub backend: Backend,
    pub solver: SolverConfig,
    /// Solve scenarios in parallel
    pub parallel: bool,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            runs: 5,
            first_seed: 0,
            generator: ScenarioGenerator::default(),
            backend: Backend::default(),
            solver: SolverConfig::default(),
            parallel: true,
            progress: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    records: Vec<RunRecord>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            records: Vec::new(),
        }
    }

    /// Run every scenario, replacing previous records.
    pub fn run(&mut self) -> &[RunRecord] {
        let seeds: Vec<u64> = (0..self.config.runs as u64)
            .map(|i| self.config.first_seed + i)
            .collect();

        let bar = if self.config.progress {
            let bar = ProgressBar::new(seeds.len() as u64);
            if let Ok(style) =
                ProgressStyle::with_template("{bar:40} {pos}/{len} scenarios [{elapsed_precise}]")
            {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let run_one = |&seed: &u64| {
            let record = self.run_scenario(seed);
            bar.inc(1);
            record
        };
        let mut records: Vec<RunRecord> = if self.config.parallel {
            seeds.par_iter().map(run_one).collect()
        } else {
            seeds.iter().map(run_one).collect()
        };
        bar.finish_and_clear();

        records.sort_by_key(|r| r.seed);
        self.records = records;
        &self.records
    }

    fn run_scenario(&self, seed: u64) -> RunRecord {
        let generator = ScenarioGenerator {
            seed,
            ..self.config.generator.clone()
        };
        let mut record = RunRecord {
            seed,
            tours: generator.tour_count,
            guides: generator.guide_count,
            slots: 0,
            variables: 0,
            constraints: 0,
            status: SolveStatus::Unknown,
            objective: 0,
            build_time: 0.0,
            solve_time: 0.0,
            violations: 0,
            error: None,
        };

        let scenario = match generator.generate() {
            Ok(scenario) => scenario,
            Err(e) => {
                log::error!("Scenario {} could not be generated: {}", seed, e);
                record.error = Some(e.to_string());
                return record;
            }
        };
        let registry = match scenario.registry() {
            Ok(registry) => registry,
            Err(e) => {
                log::error!("Scenario {} could not be registered: {}", seed, e);
                record.error = Some(e.to_string());
                return record;
            }
        };
        let config = scenario.config();

        let start = Instant::now();
        let model = ScheduleModel::build(&registry, &config);
        record.build_time = start.elapsed().as_secs_f64();
        let stats = model.statistics();
        record.slots = stats.slots;
        record.variables = stats.variables;
        record.constraints = stats.constraints;

        let backend = self.config.backend.create(self.config.solver.clone());
        match model.solve(backend.as_ref()) {
            Ok(schedule) => {
                record.status = schedule.status;
                record.objective = schedule.objective;
                record.solve_time = schedule.solve_time;
                record.violations = schedule.violations(&registry, &config).len();
            }
            Err(e) => {
                log::error!("Solver failed on scenario {}: {}", seed, e);
                record.error = Some(e.to_string());
            }
        }
        record
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Export records to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       Tour Roster Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        report.push_str(&format!(
            "Backend: {:?}, runs: {}, {} days, {} tours, {} guides\n\n",
            self.config.backend,
            self.records.len(),
            self.config.generator.day_count,
            self.config.generator.tour_count,
            self.config.generator.guide_count
        ));

        let count = |status: SolveStatus| self.records.iter().filter(|r| r.status == status).count();
        report.push_str(&format!(
            "Optimal: {}  Feasible: {}  Infeasible: {}  Unknown: {}  Errors: {}\n",
            count(SolveStatus::Optimal),
            count(SolveStatus::Feasible),
            count(SolveStatus::Infeasible),
            count(SolveStatus::Unknown),
            self.records.iter().filter(|r| r.error.is_some()).count()
        ));

        let solved: Vec<&RunRecord> = self
            .records
            .iter()
            .filter(|r| r.error.is_none())
            .collect();
        if !solved.is_empty() {
            let solve_times: Vec<f64> = solved.iter().map(|r| r.solve_time).collect();
            let build_times: Vec<f64> = solved.iter().map(|r| r.build_time).collect();
            report.push_str(&format!(
                "Solve time: mean {:.4}s, std {:.4}s, max {:.4}s\n",
                solve_times.iter().mean(),
                if solve_times.len() > 1 { solve_times.iter().std_dev() } else { 0.0 },
                Statistics::max(solve_times.iter())
            ));
            report.push_str(&format!("Build time: mean {:.4}s\n", build_times.iter().mean()));

            if let Some(slowest) = solved.iter().max_by_key(|r| OrderedFloat(r.solve_time)) {
                report.push_str(&format!(
                    "Slowest: seed {} ({} variables, {} constraints, {:.4}s)\n",
                    slowest.seed, slowest.variables, slowest.constraints, slowest.solve_time
                ));
            }
        }

        let broken: Vec<&RunRecord> = self.records.iter().filter(|r| r.violations > 0).collect();
        if !broken.is_empty() {
            report.push_str(&format!("\n{} runs produced rule violations:\n", broken.len()));
            for r in broken {
                report.push_str(&format!("  seed {}: {} violations\n", r.seed, r.violations));
            }
        }

        report.push_str("\nRuns:\n");
        report.push_str(&format!(
            "{:>6} {:>11} {:>10} {:>10} {:>10}\n",
            "Seed", "Status", "Objective", "Vars", "Time"
        ));
        report.push_str("-".repeat(51).as_str());
        report.push('\n');
        for r in &self.records {
            report.push_str(&format!(
                "{:>6} {:>11} {:>10} {:>10} {:>10.4}\n",
                r.seed,
                r.status.to_string(),
                r.objective,
                r.variables,
                r.solve_time
            ));
        }

        report
    }
}
