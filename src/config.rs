use crate::utils::{check_num, check_prob};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub model: ModelConfig,
    pub init: InitConfig,
    pub env: Vec<EnvConfig>,
    #[serde(default)]
    pub intervention: Vec<InterventionConfig>,
}

/// Disease progression and run length.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Daily probability that an exposed agent becomes infectious.
    pub sigma: f64,
    /// Daily probability that an infectious agent recovers.
    pub gamma: f64,
    /// Number of simulated days.
    pub duration: usize,
    /// When environments rebuild their contact groups.
    #[serde(default)]
    pub regrouping: Regrouping,
}

/// Initial population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitConfig {
    /// Total number of agents.
    pub population: usize,
    /// Number of agents seeded as infectious.
    pub n_infectious: usize,
    /// Mean of the normal age distribution.
    #[serde(default = "default_age_mean")]
    pub age_mean: f64,
    /// Standard deviation of the normal age distribution.
    #[serde(default = "default_age_std_dev")]
    pub age_std_dev: f64,
    /// Random seed, drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// One interaction context.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    pub name: String,
    /// Per-contact transmission probability.
    pub beta: f64,
    /// Maximum number of agents per contact group.
    pub group_size: usize,
    /// Inclusive lower age bound for membership.
    #[serde(default)]
    pub min_age: Option<f64>,
    /// Exclusive upper age bound for membership.
    #[serde(default)]
    pub max_age: Option<f64>,
}

/// Scaling of every environment's beta from `start_day` onward.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterventionConfig {
    pub start_day: usize,
    pub multiplier: f64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regrouping {
    /// Partition once before the first day and keep the groups.
    #[default]
    Once,
    /// Partition again at the start of every day.
    Daily,
}

fn default_age_mean() -> f64 {
    30.0
}

fn default_age_std_dev() -> f64 {
    10.0
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_prob(self.model.sigma).context("invalid sigma")?;
        check_prob(self.model.gamma).context("invalid gamma")?;
        check_num(self.model.duration, 0..=100_000).context("invalid duration")?;

        check_num(self.init.population, 1..=100_000_000).context("invalid population")?;
        check_num(self.init.n_infectious, 0..=self.init.population)
            .context("invalid initial number of infectious agents")?;
        if !self.init.age_mean.is_finite() {
            bail!("age mean must be finite, but is {}", self.init.age_mean);
        }
        check_num(self.init.age_std_dev, 0.0..1e6).context("invalid age standard deviation")?;

        check_num(self.env.len(), 1..100).context("invalid number of environments")?;
        let mut names = HashSet::new();
        for env in &self.env {
            env.validate()
                .with_context(|| format!("invalid environment {:?}", env.name))?;
            if !names.insert(env.name.as_str()) {
                bail!("environment name {:?} is not unique", env.name);
            }
        }

        for (i_itv, itv) in self.intervention.iter().enumerate() {
            if !itv.multiplier.is_finite() {
                bail!(
                    "multiplier of intervention {i_itv} must be finite, but is {}",
                    itv.multiplier
                );
            }
            check_num(itv.multiplier, 0.0..)
                .with_context(|| format!("invalid multiplier of intervention {i_itv}"))?;
            for env in &self.env {
                let eff_beta = itv.multiplier * env.beta;
                if eff_beta > 1.0 {
                    log::warn!(
                        "intervention {i_itv} scales beta of {:?} to {eff_beta}, \
                         which acts as certain transmission",
                        env.name
                    );
                }
            }
        }

        Ok(())
    }
}

impl EnvConfig {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("environment name must not be empty");
        }
        check_prob(self.beta).context("invalid beta")?;
        check_num(self.group_size, 1..).context("invalid group size")?;
        if let (Some(min_age), Some(max_age)) = (self.min_age, self.max_age) {
            if min_age >= max_age {
                bail!("min age must be less than max age, but {min_age} >= {max_age}");
            }
        }
        Ok(())
    }

    /// Whether an agent of the given age belongs to this environment.
    pub fn admits(&self, age: f64) -> bool {
        self.min_age.is_none_or(|min_age| age >= min_age)
            && self.max_age.is_none_or(|max_age| age < max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
[model]
sigma = 0.22
gamma = 0.08
duration = 90

[init]
population = 1000
n_infectious = 10
seed = 7

[[env]]
name = "home"
beta = 0.03
group_size = 5

[[env]]
name = "school"
beta = 0.015
group_size = 60
max_age = 20.0

[[env]]
name = "work"
beta = 0.015
group_size = 40
min_age = 20.0

[[intervention]]
start_day = 35
multiplier = 0.1
"#;

    #[test]
    fn parses_valid_config_with_defaults() {
        let cfg = Config::from_toml(BASE).unwrap();
        assert_eq!(cfg.model.regrouping, Regrouping::Once);
        assert_eq!(cfg.init.age_mean, 30.0);
        assert_eq!(cfg.init.age_std_dev, 10.0);
        assert_eq!(cfg.init.seed, Some(7));
        assert_eq!(cfg.env.len(), 3);
        assert_eq!(cfg.env[1].max_age, Some(20.0));
        assert_eq!(cfg.intervention[0].start_day, 35);
    }

    #[test]
    fn parses_daily_regrouping() {
        let contents = BASE.replace("duration = 90", "duration = 90\nregrouping = \"daily\"");
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.model.regrouping, Regrouping::Daily);
    }

    #[test]
    fn rejects_probability_outside_unit_interval() {
        let contents = BASE.replace("sigma = 0.22", "sigma = 1.5");
        assert!(Config::from_toml(&contents).is_err());
        let contents = BASE.replace("beta = 0.03", "beta = -0.1");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn rejects_zero_group_size_and_population() {
        let contents = BASE.replace("group_size = 5", "group_size = 0");
        assert!(Config::from_toml(&contents).is_err());
        let contents = BASE.replace("population = 1000", "population = 0");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn rejects_more_infectious_than_population() {
        let contents = BASE.replace("n_infectious = 10", "n_infectious = 1001");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn rejects_duplicate_environment_names() {
        let contents = BASE.replace("name = \"work\"", "name = \"home\"");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn rejects_empty_age_range() {
        let contents = BASE.replace("max_age = 20.0", "max_age = 20.0\nmin_age = 20.0");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn rejects_negative_multiplier() {
        let contents = BASE.replace("multiplier = 0.1", "multiplier = -0.5");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn rejects_infinite_multiplier() {
        let contents = BASE.replace("multiplier = 0.1", "multiplier = inf");
        assert!(Config::from_toml(&contents).is_err());
        let contents = BASE.replace("multiplier = 0.1", "multiplier = nan");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn city_demo_sends_whole_years_up_to_twenty_to_school() {
        let file = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/city/config.toml");
        let cfg = Config::from_file(file).unwrap();
        let school = cfg.env.iter().find(|env| env.name == "school").unwrap();
        let work = cfg.env.iter().find(|env| env.name == "work").unwrap();
        assert!(school.admits(20.9) && !work.admits(20.9));
        assert!(work.admits(21.0) && !school.admits(21.0));
    }

    #[test]
    fn rejects_unknown_fields() {
        let contents = BASE.replace("gamma = 0.08", "gamma = 0.08\nrho = 0.1");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn age_bounds_select_members() {
        let cfg = Config::from_toml(BASE).unwrap();
        let (home, school, work) = (&cfg.env[0], &cfg.env[1], &cfg.env[2]);
        assert!(home.admits(-3.0) && home.admits(90.0));
        assert!(school.admits(19.9) && !school.admits(20.0));
        assert!(work.admits(20.0) && !work.admits(19.9));
    }
}
