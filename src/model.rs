//! Simulation data types.

/// Epidemic compartment of an agent.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Health {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
}

impl Health {
    /// Apply one day of disease progression given a single uniform draw.
    ///
    /// The draw is tested only against the condition of the current state,
    /// so at most one transition happens per call. Exposure of susceptible
    /// agents is driven by contact rounds, not by this function.
    pub fn progress(self, draw: f64, sigma: f64, gamma: f64) -> Self {
        match self {
            Health::Exposed if draw < sigma => Health::Infectious,
            Health::Infectious if draw < gamma => Health::Recovered,
            other => other,
        }
    }
}

/// Agent of the simulation.
///
/// Agents live in the engine's population vector and are referenced
/// everywhere else by their index in it.
#[derive(Debug, Clone)]
pub struct Agent {
    age: f64,
    pub health: Health,
}

impl Agent {
    /// Create a new agent with a given age and initial health.
    pub fn new(age: f64, health: Health) -> Self {
        Self { age, health }
    }

    pub fn age(&self) -> f64 {
        self.age
    }
}
