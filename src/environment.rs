use crate::config::EnvConfig;
use crate::model::Agent;
use crate::network::ContactGroup;
use rand::Rng;

/// Named interaction context (home, work, school, public, ...).
///
/// Holds indices into the engine's population, never the agents themselves,
/// so the same agent can take part in several environments.
#[derive(Debug)]
pub struct Environment {
    cfg: EnvConfig,
    roster: Vec<usize>,
    groups: Vec<ContactGroup>,
}

impl Environment {
    pub fn new(cfg: EnvConfig) -> Self {
        Self {
            cfg,
            roster: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub fn beta(&self) -> f64 {
        self.cfg.beta
    }

    pub fn roster(&self) -> &[usize] {
        &self.roster
    }

    pub fn groups(&self) -> &[ContactGroup] {
        &self.groups
    }

    /// Add every agent whose age falls in this environment's age range.
    pub fn enroll(&mut self, agt_vec: &[Agent]) {
        self.roster.extend(
            agt_vec
                .iter()
                .enumerate()
                .filter(|(_, agt)| self.cfg.admits(agt.age()))
                .map(|(i_agt, _)| i_agt),
        );
    }

    /// Replace the contact groups with a fresh random partition of the roster.
    pub fn distribute_agents<R: Rng>(&mut self, rng: &mut R) {
        self.groups = ContactGroup::partition(&mut self.roster, self.cfg.group_size, rng);

        for group in &self.groups {
            log::trace!(
                "group {} of {:?} holds {} agents",
                group.id(),
                self.cfg.name,
                group.members().len()
            );
        }
    }

    /// Run one contact round in every group at `multiplier * beta`.
    pub fn run_contacts<R: Rng>(&self, agt_vec: &mut [Agent], multiplier: f64, rng: &mut R) {
        let eff_beta = multiplier * self.cfg.beta;
        for group in &self.groups {
            group.contact_round(agt_vec, eff_beta, rng);
        }
    }
}
