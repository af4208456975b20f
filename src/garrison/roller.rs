use crate::content::records::{AbilityFlags, FollowerRecord};
use crate::content::{AbilityId, Faction};
use crate::garrison::static_data::GarrisonStaticData;
use rand::seq::index;
use rand::Rng;
use std::collections::BTreeSet;

/// Counter and trait slots per follower quality.
const ABILITIES_FOR_QUALITY: [AbilitySlots; 6] = [
    AbilitySlots { counters: 0, traits: 0 },
    AbilitySlots { counters: 1, traits: 0 },
    AbilitySlots { counters: 1, traits: 2 },
    AbilitySlots { counters: 1, traits: 2 },
    AbilitySlots { counters: 2, traits: 3 },
    AbilitySlots { counters: 2, traits: 3 },
];

pub const MAX_FOLLOWER_QUALITY: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilitySlots {
    pub counters: usize,
    pub traits: usize,
}

impl AbilitySlots {
    pub fn for_quality(quality: u8) -> Self {
        ABILITIES_FOR_QUALITY[usize::from(quality.min(MAX_FOLLOWER_QUALITY))]
    }

    pub fn total(self) -> usize {
        self.counters + self.traits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityCategory {
    ForcedCounter,
    RollableCounter,
    ForcedTrait,
    RollableTrait,
}

impl AbilityCategory {
    pub fn of(flags: AbilityFlags) -> Self {
        match (flags.is_trait, flags.cannot_remove) {
            (false, true) => AbilityCategory::ForcedCounter,
            (false, false) => AbilityCategory::RollableCounter,
            (true, true) => AbilityCategory::ForcedTrait,
            (true, false) => AbilityCategory::RollableTrait,
        }
    }
}

#[derive(Debug, Default)]
struct Buckets {
    forced_counters: Vec<AbilityId>,
    rolled_counters: Vec<AbilityId>,
    forced_traits: Vec<AbilityId>,
    rolled_traits: Vec<AbilityId>,
}

/// Picks the ability set of a follower from its template, quality and faction.
#[derive(Debug, Clone, Copy)]
pub struct FollowerAbilityRoller<'a> {
    data: &'a GarrisonStaticData,
}

impl<'a> FollowerAbilityRoller<'a> {
    pub fn new(data: &'a GarrisonStaticData) -> Self {
        Self { data }
    }

    /// `initial` is set only at recruitment; it locks the template's rolled abilities in
    /// as permanent ones before generic pools are consulted.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        follower: &FollowerRecord,
        quality: u8,
        faction: Faction,
        initial: bool,
        rng: &mut R,
    ) -> Vec<AbilityId> {
        let slots = AbilitySlots::for_quality(quality);
        let mut buckets = self.template_buckets(follower, faction);

        let forced_exclusive_present = buckets
            .forced_traits
            .iter()
            .any(|id| self.is_exclusive(*id));
        if forced_exclusive_present {
            buckets.rolled_traits.retain(|id| !self.is_exclusive(*id));
        }

        random_resize(
            &mut buckets.rolled_counters,
            slots.counters.saturating_sub(buckets.forced_counters.len()),
            rng,
        );
        random_resize(
            &mut buckets.rolled_traits,
            slots.traits.saturating_sub(buckets.forced_traits.len()),
            rng,
        );
        self.retain_single_exclusive(&mut buckets.rolled_traits);

        if initial {
            buckets.forced_counters.append(&mut buckets.rolled_counters);
            buckets.forced_traits.append(&mut buckets.rolled_traits);
        }

        buckets.forced_counters.sort();
        buckets.rolled_counters.sort();
        buckets.forced_traits.sort();
        buckets.rolled_traits.sort();

        let has_forced_exclusive_trait = buckets
            .forced_traits
            .iter()
            .any(|id| self.is_exclusive(*id));

        if slots.counters > buckets.forced_counters.len() + buckets.rolled_counters.len() {
            self.fill_counters_from_class_spec(follower, faction, slots, &mut buckets, rng);
        }

        if slots.traits > buckets.forced_traits.len() + buckets.rolled_traits.len() {
            self.fill_traits_from_random_pool(
                faction,
                slots,
                has_forced_exclusive_trait,
                &mut buckets,
                rng,
            );
        }

        let mut result = Vec::with_capacity(slots.total());
        let mut seen = BTreeSet::new();
        for id in buckets
            .forced_counters
            .into_iter()
            .chain(buckets.rolled_counters)
            .chain(buckets.forced_traits)
            .chain(buckets.rolled_traits)
        {
            if seen.insert(id) {
                result.push(id);
            }
        }
        result
    }

    fn template_buckets(&self, follower: &FollowerRecord, faction: Faction) -> Buckets {
        let mut buckets = Buckets::default();
        let Some(abilities) = self.data.follower_abilities(faction, follower.id) else {
            return buckets;
        };
        for id in abilities.counters.iter().chain(abilities.traits.iter()) {
            let Some(ability) = self.data.ability(*id) else {
                continue;
            };
            if !ability.flags.available_to(faction) {
                continue;
            }
            match AbilityCategory::of(ability.flags) {
                AbilityCategory::ForcedCounter => buckets.forced_counters.push(*id),
                AbilityCategory::RollableCounter => buckets.rolled_counters.push(*id),
                AbilityCategory::ForcedTrait => buckets.forced_traits.push(*id),
                AbilityCategory::RollableTrait => buckets.rolled_traits.push(*id),
            }
        }
        buckets
    }

    fn fill_counters_from_class_spec<R: Rng + ?Sized>(
        &self,
        follower: &FollowerRecord,
        faction: Faction,
        slots: AbilitySlots,
        buckets: &mut Buckets,
        rng: &mut R,
    ) {
        let forced: BTreeSet<AbilityId> = buckets.forced_counters.iter().copied().collect();
        let mut pool: BTreeSet<AbilityId> = self
            .data
            .class_spec_abilities(follower, faction)
            .iter()
            .copied()
            .filter(|id| !forced.contains(id))
            .collect();
        pool.extend(buckets.rolled_counters.drain(..));

        let mut pool: Vec<AbilityId> = pool.into_iter().collect();
        random_resize(
            &mut pool,
            slots.counters.saturating_sub(buckets.forced_counters.len()),
            rng,
        );
        buckets.rolled_counters = pool;
    }

    fn fill_traits_from_random_pool<R: Rng + ?Sized>(
        &self,
        faction: Faction,
        slots: AbilitySlots,
        has_forced_exclusive_trait: bool,
        buckets: &mut Buckets,
        rng: &mut R,
    ) {
        let taken: BTreeSet<AbilityId> = buckets
            .forced_traits
            .iter()
            .chain(buckets.rolled_traits.iter())
            .copied()
            .collect();
        let block_exclusive = has_forced_exclusive_trait
            || buckets.rolled_traits.iter().any(|id| self.is_exclusive(*id));
        let mut candidates: Vec<AbilityId> = self
            .data
            .random_traits()
            .iter()
            .copied()
            .filter(|id| {
                self.data
                    .ability(*id)
                    .map_or(false, |ability| ability.flags.available_to(faction))
            })
            .filter(|id| !taken.contains(id) && !(block_exclusive && self.is_exclusive(*id)))
            .collect();

        // Non-exclusive candidates first, so the eligible window is a prefix.
        candidates.sort_by_key(|id| (self.is_exclusive(*id), *id));
        candidates.dedup();

        let wanted = slots.traits.saturating_sub(buckets.forced_traits.len());
        let mut first_exclusive = candidates
            .iter()
            .position(|id| self.is_exclusive(*id))
            .unwrap_or(candidates.len());
        let mut total = candidates.len();
        while buckets.rolled_traits.len() < wanted && total > 0 {
            let pick = rng.gen_range(0..total);
            total -= 1;
            if self.is_exclusive(candidates[pick]) {
                total = first_exclusive;
            } else {
                first_exclusive -= 1;
            }
            buckets.rolled_traits.push(candidates.remove(pick));
        }
    }

    /// Keeps the first exclusive trait of a rolled bucket and drops the others.
    fn retain_single_exclusive(&self, traits: &mut Vec<AbilityId>) {
        let mut seen_exclusive = false;
        traits.retain(|id| {
            if !self.is_exclusive(*id) {
                return true;
            }
            if seen_exclusive {
                return false;
            }
            seen_exclusive = true;
            true
        });
    }

    fn is_exclusive(&self, id: AbilityId) -> bool {
        self.data
            .ability(id)
            .map_or(false, |ability| ability.flags.exclusive)
    }
}

/// Shrinks `items` to `size` by uniform sampling without replacement, keeping relative order.
fn random_resize<T, R: Rng + ?Sized>(items: &mut Vec<T>, size: usize, rng: &mut R) {
    if items.len() <= size {
        return;
    }
    let mut keep = index::sample(rng, items.len(), size).into_vec();
    keep.sort_unstable();
    let mut keep = keep.into_iter().peekable();
    let mut position = 0usize;
    items.retain(|_| {
        let kept = keep.peek() == Some(&position);
        if kept {
            keep.next();
        }
        position += 1;
        kept
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::records::FollowerAbilityRecord;
    use crate::content::FollowerTemplateId;
    use crate::test_support;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn exclusive_count(data: &GarrisonStaticData, abilities: &[AbilityId]) -> usize {
        abilities
            .iter()
            .filter(|id| data.ability(**id).map_or(false, |a| a.flags.exclusive))
            .count()
    }

    fn trait_count(data: &GarrisonStaticData, abilities: &[AbilityId]) -> usize {
        abilities
            .iter()
            .filter(|id| data.ability(**id).map_or(false, |a| a.flags.is_trait))
            .count()
    }

    #[test]
    fn quality_table_matches_slot_budget() {
        assert_eq!(AbilitySlots::for_quality(0), AbilitySlots { counters: 0, traits: 0 });
        assert_eq!(AbilitySlots::for_quality(2), AbilitySlots { counters: 1, traits: 2 });
        assert_eq!(AbilitySlots::for_quality(5), AbilitySlots { counters: 2, traits: 3 });
        assert_eq!(AbilitySlots::for_quality(200), AbilitySlots::for_quality(5));
    }

    #[test]
    fn category_follows_flags() {
        let forced_trait = AbilityFlags {
            is_trait: true,
            cannot_remove: true,
            ..AbilityFlags::default()
        };
        assert_eq!(AbilityCategory::of(forced_trait), AbilityCategory::ForcedTrait);
        assert_eq!(
            AbilityCategory::of(AbilityFlags::default()),
            AbilityCategory::RollableCounter
        );
    }

    #[test]
    fn rich_pools_fill_every_slot_for_every_quality() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_PLAIN).expect("follower");
        for quality in 0..=MAX_FOLLOWER_QUALITY {
            for seed in 0..50 {
                let mut rng = StdRng::seed_from_u64(seed);
                let abilities = roller.roll(follower, quality, Faction::Horde, true, &mut rng);
                let slots = AbilitySlots::for_quality(quality);
                assert_eq!(abilities.len(), slots.total(), "quality {quality} seed {seed}");
                assert_eq!(trait_count(&data, &abilities), slots.traits);
                let unique: BTreeSet<_> = abilities.iter().collect();
                assert_eq!(unique.len(), abilities.len());
            }
        }
    }

    #[test]
    fn rare_follower_without_forced_abilities_gets_three() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_PLAIN).expect("follower");
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let abilities = roller.roll(follower, 2, Faction::Alliance, true, &mut rng);
            assert_eq!(abilities.len(), 3);
            assert!(exclusive_count(&data, &abilities[1..]) <= 1);
        }
    }

    #[test]
    fn forced_abilities_always_present() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_FORCED).expect("follower");
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let abilities = roller.roll(follower, 4, Faction::Horde, seed % 2 == 0, &mut rng);
            assert_eq!(abilities[0], test_support::COUNTER_FORCED);
            assert!(abilities.contains(&test_support::TRAIT_FORCED_EXCLUSIVE));
            assert_eq!(abilities.len(), 5);
        }
    }

    #[test]
    fn forced_exclusive_trait_blocks_other_exclusives() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_FORCED).expect("follower");
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let abilities = roller.roll(follower, 5, Faction::Horde, true, &mut rng);
            assert_eq!(exclusive_count(&data, &abilities), 1, "seed {seed}");
        }
    }

    #[test]
    fn at_most_one_exclusive_trait_across_seeds() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_ROLLABLE).expect("follower");
        let mut saw_exclusive = false;
        for seed in 0..500 {
            for initial in [true, false] {
                let mut rng = StdRng::seed_from_u64(seed);
                let abilities = roller.roll(follower, 5, Faction::Alliance, initial, &mut rng);
                let exclusive = exclusive_count(&data, &abilities);
                assert!(exclusive <= 1, "seed {seed} initial {initial}: {abilities:?}");
                saw_exclusive |= exclusive == 1;
                assert_eq!(abilities.len(), 5);
            }
        }
        assert!(saw_exclusive);
    }

    #[test]
    fn faction_restricted_abilities_are_filtered() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_ROLLABLE).expect("follower");
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let abilities = roller.roll(follower, 5, Faction::Alliance, true, &mut rng);
            assert!(!abilities.contains(&test_support::COUNTER_HORDE_ONLY));
        }
    }

    #[test]
    fn initial_roll_prefers_template_counters() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_ROLLABLE).expect("follower");
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let abilities = roller.roll(follower, 4, Faction::Horde, true, &mut rng);
            let counters: Vec<_> = abilities[..2].to_vec();
            for counter in counters {
                assert!(
                    test_support::COUNTER_ROLL.contains(&counter),
                    "seed {seed}: {counter:?} not from template"
                );
            }
        }
    }

    #[test]
    fn scarce_pools_never_exceed_budget() {
        let data = test_support::sparse_static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_PLAIN).expect("follower");
        for quality in 0..=MAX_FOLLOWER_QUALITY {
            let mut rng = StdRng::seed_from_u64(u64::from(quality));
            let abilities = roller.roll(follower, quality, Faction::Horde, true, &mut rng);
            assert!(abilities.len() <= AbilitySlots::for_quality(quality).total());
        }
        let mut rng = StdRng::seed_from_u64(9);
        let abilities = roller.roll(follower, 5, Faction::Horde, true, &mut rng);
        assert_eq!(abilities.len(), 2);
    }

    #[test]
    fn same_seed_same_roll() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_ROLLABLE).expect("follower");
        let first = roller.roll(follower, 5, Faction::Horde, true, &mut StdRng::seed_from_u64(7));
        let second = roller.roll(follower, 5, Faction::Horde, true, &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn reroll_keeps_template_trait() {
        let mut content = test_support::content_tables();
        let mut template = content
            .followers
            .iter()
            .find(|record| record.id == test_support::FOLLOWER_PLAIN)
            .cloned()
            .expect("template");
        template.id = FollowerTemplateId(999);
        content.followers.push(template);
        content.follower_abilities.push(FollowerAbilityRecord {
            follower_id: FollowerTemplateId(999),
            ability_id: test_support::TRAIT_PLAIN[5],
            faction_index: 0,
        });
        let data = GarrisonStaticData::initialize(content, test_support::world_tables());
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(FollowerTemplateId(999)).expect("follower");
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let abilities = roller.roll(follower, 5, Faction::Horde, false, &mut rng);
            assert!(
                abilities.contains(&test_support::TRAIT_PLAIN[5]),
                "seed {seed}: {abilities:?}"
            );
            assert_eq!(trait_count(&data, &abilities), 3);
            assert!(exclusive_count(&data, &abilities) <= 1);
        }
    }

    #[test]
    fn rolled_exclusive_blocks_pool_exclusives_on_reroll() {
        let data = test_support::static_data();
        let roller = FollowerAbilityRoller::new(&data);
        let follower = data.follower(test_support::FOLLOWER_ROLLABLE).expect("follower");
        for seed in 0..300 {
            let mut rng = StdRng::seed_from_u64(seed);
            let abilities = roller.roll(follower, 5, Faction::Horde, false, &mut rng);
            assert!(exclusive_count(&data, &abilities) <= 1, "seed {seed}: {abilities:?}");
        }
    }

    #[test]
    fn random_resize_keeps_order_and_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut items: Vec<u32> = (0..10).collect();
        random_resize(&mut items, 4, &mut rng);
        assert_eq!(items.len(), 4);
        assert!(items.windows(2).all(|pair| pair[0] < pair[1]));

        let mut short = vec![1, 2];
        random_resize(&mut short, 5, &mut rng);
        assert_eq!(short, vec![1, 2]);
    }
}
