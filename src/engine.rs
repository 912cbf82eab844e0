use crate::config::{Config, Regrouping};
use crate::environment::Environment;
use crate::intervention::Schedule;
use crate::model::{Agent, Health};
use crate::stats::{DayRecord, Summary};
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Normal;
use std::{
    path::Path,
    time::{Duration, Instant},
};

/// Simulation engine.
///
/// Owns the population, the environments that reference it, the intervention
/// schedule, the per-day records and the single random number generator that
/// every stochastic step draws from.
pub struct Engine {
    cfg: Config,
    seed: u64,
    agt_vec: Vec<Agent>,
    env_vec: Vec<Environment>,
    schedule: Schedule,
    record_vec: Vec<DayRecord>,
    elapsed: Duration,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with a freshly generated population.
    ///
    /// The first `n_infectious` agents start infectious, the rest susceptible;
    /// every agent's age is drawn from the configured normal distribution.
    /// Agents are then enrolled into each environment whose age range admits them.
    pub fn generate_initial_condition(cfg: Config, seed: u64) -> Result<Self> {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);

        let population = cfg.init.population;
        let n_infectious = cfg.init.n_infectious;
        if n_infectious > population {
            bail!("cannot seed {n_infectious} infectious agents in a population of {population}");
        }

        let age_dist = Normal::new(cfg.init.age_mean, cfg.init.age_std_dev)
            .context("failed to construct age distribution")?;

        let mut agt_vec = Vec::with_capacity(population);
        for i_agt in 0..population {
            let health = if i_agt < n_infectious {
                Health::Infectious
            } else {
                Health::Susceptible
            };
            agt_vec.push(Agent::new(age_dist.sample(&mut rng), health));
        }

        let mut env_vec: Vec<_> = cfg.env.iter().cloned().map(Environment::new).collect();
        for env in &mut env_vec {
            env.enroll(&agt_vec);
            log::info!(
                "enrolled {} agents in {:?} (beta = {})",
                env.roster().len(),
                env.name(),
                env.beta()
            );
        }

        let schedule = Schedule::new(cfg.intervention.clone());
        if schedule.is_empty() {
            log::info!("no interventions scheduled");
        }

        let mut record_vec = Vec::with_capacity(cfg.model.duration + 1);
        record_vec.push(DayRecord::initial(population, n_infectious));

        Ok(Self {
            cfg,
            seed,
            agt_vec,
            env_vec,
            schedule,
            record_vec,
            elapsed: Duration::ZERO,
            rng,
        })
    }

    /// Perform the whole simulation, from day 1 to the configured duration.
    pub fn perform_simulation(&mut self) -> Result<()> {
        if self.record_vec.len() > 1 {
            bail!("simulation was already performed");
        }

        let start = Instant::now();

        self.distribute_agents();

        let duration = self.cfg.model.duration;
        let log_every = (duration / 10).max(1);
        let mut multiplier = 1.0;
        for day in 1..=duration {
            let day_multiplier = self.schedule.multiplier(day);
            if day_multiplier != multiplier {
                log::info!("day {day}: beta multiplier set to {day_multiplier}");
                multiplier = day_multiplier;
            }

            self.perform_day(day, multiplier);

            if day % log_every == 0 {
                let progress = 100.0 * day as f64 / duration as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        self.elapsed = start.elapsed();

        Ok(())
    }

    /// Write the per-day records as a CSV table.
    pub fn write_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let mut writer =
            csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;
        for record in &self.record_vec {
            writer.serialize(record).context("failed to serialize record")?;
        }
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.record_vec
    }

    pub fn summary(&self) -> Summary {
        Summary::new(
            &self.record_vec,
            self.cfg.init.population,
            self.seed,
            self.elapsed.as_secs_f64(),
        )
    }

    fn distribute_agents(&mut self) {
        for env in &mut self.env_vec {
            env.distribute_agents(&mut self.rng);
            log::debug!(
                "partitioned {} agents of {:?} into {} groups",
                env.roster().len(),
                env.name(),
                env.groups().len()
            );
        }
    }

    fn perform_day(&mut self, day: usize, multiplier: f64) {
        if self.cfg.model.regrouping == Regrouping::Daily && day > 1 {
            self.distribute_agents();
        }

        for env in &self.env_vec {
            env.run_contacts(&mut self.agt_vec, multiplier, &mut self.rng);
        }

        self.update(day);
    }

    /// Progress every agent by one day and record the day's counters.
    ///
    /// Each agent consumes exactly one draw, in population order.
    fn update(&mut self, day: usize) {
        let sigma = self.cfg.model.sigma;
        let gamma = self.cfg.model.gamma;

        let prev = self.record_vec[day - 1];
        let mut record = DayRecord {
            day,
            cum_infections: prev.cum_infections,
            ..DayRecord::default()
        };

        for agt in &mut self.agt_vec {
            let draw: f64 = self.rng.random();
            let health = agt.health.progress(draw, sigma, gamma);
            if agt.health == Health::Exposed && health == Health::Infectious {
                record.cum_infections += 1;
            }
            agt.health = health;

            match health {
                Health::Susceptible => {}
                Health::Exposed => record.n_e += 1,
                Health::Infectious => record.n_i += 1,
                Health::Recovered => record.n_r += 1,
            }
        }

        record.n_infectious = record.n_i;
        record.n_s = self.cfg.init.population - record.n_e - record.n_i - record.n_r;
        debug_assert_eq!(record.total(), self.agt_vec.len());

        self.record_vec.push(record);
    }
}
