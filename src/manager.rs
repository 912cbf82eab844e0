use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result, bail};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn run_simulation(&self, seed: Option<u64>) -> Result<()> {
        // Kept within the TOML integer range so the summary can record it.
        let seed = seed
            .or(self.cfg.init.seed)
            .unwrap_or_else(|| rand::random_range(0..=i64::MAX as u64));
        log::info!("seed: {seed}");

        let run_idx = self.next_run_idx().context("failed to find next run index")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let mut engine = Engine::generate_initial_condition(self.cfg.clone(), seed)
            .context("failed to generate initial condition")?;

        engine
            .perform_simulation()
            .context("failed to perform simulation")?;

        let results_file = run_dir.join("result.csv");
        engine
            .write_results(&results_file)
            .with_context(|| format!("failed to write {results_file:?}"))?;
        log::info!("wrote {} days to {results_file:?}", engine.records().len());

        let summary = engine.summary();
        log::info!(
            "done! time: {:.3} s, peak infectious: {} on day {}, attack rate: {:.4}",
            summary.elapsed_secs,
            summary.peak_infectious,
            summary.peak_day,
            summary.attack_rate
        );

        let summary_file = run_dir.join("summary.toml");
        let summary_str = toml::to_string(&summary).context("failed to serialize summary")?;
        fs::write(&summary_file, summary_str)
            .with_context(|| format!("failed to write {summary_file:?}"))?;

        Ok(())
    }

    pub fn run_analysis(&self) -> Result<()> {
        let run_dirs = self.run_dirs().context("failed to list run dirs")?;
        if run_dirs.is_empty() {
            bail!("no runs to analyze in {:?}", self.sim_dir);
        }

        let mut analyzer = Analyzer::new();
        for run_dir in run_dirs {
            let results_file = run_dir.join("result.csv");
            analyzer
                .add_file(&results_file)
                .with_context(|| format!("failed to add {results_file:?}"))?;
        }

        let analysis_file = self.analysis_file();
        analyzer
            .save_results(&analysis_file)
            .context("failed to save results")?;
        log::info!("analyzed {} runs into {analysis_file:?}", analyzer.n_runs());

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        let analysis_file = self.analysis_file();
        if analysis_file.exists() {
            fs::remove_file(&analysis_file)
                .with_context(|| format!("failed to remove {analysis_file:?}"))?;
            log::info!("removed {analysis_file:?}");
        }

        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    /// One past the highest existing run index, so gaps are never refilled.
    fn next_run_idx(&self) -> Result<usize> {
        let max_idx = self
            .run_dirs()?
            .iter()
            .filter_map(|p| p.file_name()?.to_str()?.strip_prefix("run-")?.parse::<usize>().ok())
            .max();
        Ok(max_idx.map_or(0, |idx| idx + 1))
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn analysis_file(&self) -> PathBuf {
        self.sim_dir.join("analysis.csv")
    }
}
