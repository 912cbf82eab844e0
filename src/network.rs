use crate::model::{Agent, Health};
use rand::{Rng, seq::SliceRandom};

/// Fixed cluster of agents inside which every pair can meet.
#[derive(Debug, Clone)]
pub struct ContactGroup {
    id: usize,
    members: Vec<usize>,
}

impl ContactGroup {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Indices into the population of the agents in this group.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Shuffle `roster` in place and cut it into groups of at most `capacity` agents.
    ///
    /// Only the last group may be smaller than `capacity`.
    pub fn partition<R: Rng>(
        roster: &mut [usize],
        capacity: usize,
        rng: &mut R,
    ) -> Vec<ContactGroup> {
        debug_assert!(capacity > 0, "group capacity must be positive");

        roster.shuffle(rng);

        roster
            .chunks(capacity)
            .enumerate()
            .map(|(id, chunk)| ContactGroup {
                id,
                members: chunk.to_vec(),
            })
            .collect()
    }

    /// Evaluate every unordered pair of members once.
    ///
    /// One draw is consumed per pair, in ascending `(i, j)` order, whether or
    /// not the pair is a susceptible-infectious pair. A susceptible member of
    /// such a pair becomes exposed when the draw is below `beta`.
    pub fn contact_round<R: Rng>(&self, agt_vec: &mut [Agent], beta: f64, rng: &mut R) {
        for (i, &i_agt) in self.members.iter().enumerate() {
            for &j_agt in &self.members[i + 1..] {
                let draw: f64 = rng.random();
                let transmits = draw < beta;
                if !transmits {
                    continue;
                }
                match (agt_vec[i_agt].health, agt_vec[j_agt].health) {
                    (Health::Susceptible, Health::Infectious) => {
                        agt_vec[i_agt].health = Health::Exposed;
                    }
                    (Health::Infectious, Health::Susceptible) => {
                        agt_vec[j_agt].health = Health::Exposed;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn population(health_vec: &[Health]) -> Vec<Agent> {
        health_vec.iter().map(|&health| Agent::new(30.0, health)).collect()
    }

    #[test]
    fn partition_covers_roster_exactly_once() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let mut roster: Vec<usize> = (0..103).collect();
        let groups = ContactGroup::partition(&mut roster, 10, &mut rng);

        assert_eq!(groups.len(), 11);
        assert!(groups[..10].iter().all(|grp| grp.members().len() == 10));
        assert_eq!(groups[10].members().len(), 3);

        let mut seen: Vec<usize> = groups.iter().flat_map(|grp| grp.members().to_vec()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..103).collect::<Vec<_>>());

        for (idx, grp) in groups.iter().enumerate() {
            assert_eq!(grp.id(), idx);
        }
    }

    #[test]
    fn partition_of_empty_roster_has_no_groups() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let groups = ContactGroup::partition(&mut [], 4, &mut rng);
        assert!(groups.is_empty());
    }

    #[test]
    fn partition_is_reproducible_under_seed() {
        let mut roster_a: Vec<usize> = (0..50).collect();
        let mut roster_b = roster_a.clone();
        let groups_a = ContactGroup::partition(&mut roster_a, 7, &mut ChaCha12Rng::seed_from_u64(9));
        let groups_b = ContactGroup::partition(&mut roster_b, 7, &mut ChaCha12Rng::seed_from_u64(9));
        let members_a: Vec<_> = groups_a.iter().map(|grp| grp.members().to_vec()).collect();
        let members_b: Vec<_> = groups_b.iter().map(|grp| grp.members().to_vec()).collect();
        assert_eq!(members_a, members_b);
    }

    #[test]
    fn certain_transmission_exposes_every_susceptible() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut agt_vec = population(&[
            Health::Susceptible,
            Health::Infectious,
            Health::Susceptible,
            Health::Recovered,
            Health::Exposed,
        ]);
        let mut roster: Vec<usize> = (0..agt_vec.len()).collect();
        let groups = ContactGroup::partition(&mut roster, 5, &mut rng);
        groups[0].contact_round(&mut agt_vec, 1.0, &mut rng);

        let health_vec: Vec<_> = agt_vec.iter().map(|agt| agt.health).collect();
        assert_eq!(
            health_vec,
            vec![
                Health::Exposed,
                Health::Infectious,
                Health::Exposed,
                Health::Recovered,
                Health::Exposed,
            ]
        );
    }

    #[test]
    fn zero_beta_never_transmits() {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let mut agt_vec = population(&[Health::Infectious; 3]);
        agt_vec.extend(population(&[Health::Susceptible; 20]));
        let mut roster: Vec<usize> = (0..agt_vec.len()).collect();
        let groups = ContactGroup::partition(&mut roster, 23, &mut rng);
        for _ in 0..10 {
            groups[0].contact_round(&mut agt_vec, 0.0, &mut rng);
        }
        assert_eq!(
            agt_vec.iter().filter(|agt| agt.health == Health::Susceptible).count(),
            20
        );
    }

    #[test]
    fn undefined_beta_never_transmits() {
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let mut agt_vec = population(&[Health::Infectious; 5]);
        agt_vec.extend(population(&[Health::Susceptible; 95]));
        let mut roster: Vec<usize> = (0..agt_vec.len()).collect();
        let groups = ContactGroup::partition(&mut roster, 100, &mut rng);
        groups[0].contact_round(&mut agt_vec, f64::NAN, &mut rng);
        assert!(agt_vec[5..].iter().all(|agt| agt.health == Health::Susceptible));
    }

    #[test]
    fn no_infectious_member_means_no_exposure() {
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let mut agt_vec = population(&[Health::Susceptible, Health::Exposed, Health::Recovered]);
        let mut roster = vec![0, 1, 2];
        let groups = ContactGroup::partition(&mut roster, 3, &mut rng);
        groups[0].contact_round(&mut agt_vec, 1.0, &mut rng);
        assert_eq!(agt_vec[0].health, Health::Susceptible);
    }

    #[test]
    fn contact_round_consumes_one_draw_per_pair() {
        let mut agt_vec = population(&[Health::Susceptible; 6]);
        let group = ContactGroup {
            id: 0,
            members: (0..6).collect(),
        };
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        group.contact_round(&mut agt_vec, 0.5, &mut rng);

        let mut expected = ChaCha12Rng::seed_from_u64(6);
        for _ in 0..15 {
            let _: f64 = expected.random();
        }
        assert_eq!(rng.random::<u64>(), expected.random::<u64>());
    }
}
