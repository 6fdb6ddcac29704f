//! Live item registry with capacity-bounded spawning

use std::collections::BTreeMap;

use rand::Rng;

use crate::ws::protocol::{ItemInfo, ItemPos};

use super::spawn::SpawnPlacer;

/// An item lying on the map, pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub id: u64,
    pub x: u32,
    pub y: u32,
}

impl From<Item> for ItemInfo {
    fn from(item: Item) -> Self {
        ItemInfo {
            id: item.id,
            x: item.x,
            y: item.y,
        }
    }
}

/// Why a spawn tick produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnSkip {
    AtCapacity,
    NoFreeTile,
}

pub struct ItemRegistry {
    items: BTreeMap<u64, Item>,
    next_id: u64,
    max_items: usize,
}

impl ItemRegistry {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 0,
            max_items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Place one item if below capacity. Ids are only consumed on success.
    pub fn try_spawn<R: Rng>(
        &mut self,
        placer: &SpawnPlacer,
        rng: &mut R,
    ) -> Result<Item, SpawnSkip> {
        if self.items.len() >= self.max_items {
            return Err(SpawnSkip::AtCapacity);
        }

        let (x, y) = placer.item_position(rng).ok_or(SpawnSkip::NoFreeTile)?;
        let item = Item {
            id: self.next_id,
            x,
            y,
        };
        self.next_id += 1;
        self.items.insert(item.id, item);
        Ok(item)
    }

    /// Remove an item; `None` if it was already gone
    pub fn consume(&mut self, id: u64) -> Option<Item> {
        self.items.remove(&id)
    }

    /// All live items keyed by id, as sent in `item_init`
    pub fn positions(&self) -> BTreeMap<u64, ItemPos> {
        self.items
            .values()
            .map(|item| (item.id, ItemPos { x: item.x, y: item.y }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::map::WallGrid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn placer() -> SpawnPlacer {
        SpawnPlacer::new(WallGrid::open(60, 60), &GameConfig::default())
    }

    #[test]
    fn stops_at_capacity() {
        let placer = placer();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut items = ItemRegistry::new(3);

        for _ in 0..3 {
            assert!(items.try_spawn(&placer, &mut rng).is_ok());
        }
        assert_eq!(items.try_spawn(&placer, &mut rng), Err(SpawnSkip::AtCapacity));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn ids_keep_increasing_after_consumption() {
        let placer = placer();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut items = ItemRegistry::new(2);
        let mut seen = Vec::new();

        for _ in 0..10 {
            let item = items.try_spawn(&placer, &mut rng).unwrap();
            seen.push(item.id);
            assert_eq!(items.consume(item.id), Some(item));
        }

        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert!(items.is_empty());
    }

    #[test]
    fn consume_is_idempotent() {
        let placer = placer();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut items = ItemRegistry::new(5);

        let item = items.try_spawn(&placer, &mut rng).unwrap();
        assert!(items.consume(item.id).is_some());
        assert!(items.consume(item.id).is_none());
        assert!(items.consume(999).is_none());
        assert_eq!(items.len(), 0);
    }

    #[test]
    fn no_free_tile_burns_no_id() {
        let blocked = SpawnPlacer::new(
            WallGrid::from_rows(&vec![vec![1u8; 60]; 60], 60, 60).unwrap(),
            &GameConfig {
                placement_attempts: 5,
                ..GameConfig::default()
            },
        );
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut items = ItemRegistry::new(5);

        assert_eq!(items.try_spawn(&blocked, &mut rng), Err(SpawnSkip::NoFreeTile));
        let item = items.try_spawn(&placer(), &mut rng).unwrap();
        assert_eq!(item.id, 0);
    }

    #[test]
    fn positions_mirror_live_items() {
        let placer = placer();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut items = ItemRegistry::new(5);

        let a = items.try_spawn(&placer, &mut rng).unwrap();
        let b = items.try_spawn(&placer, &mut rng).unwrap();
        items.consume(a.id);

        let positions = items.positions();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[&b.id], ItemPos { x: b.x, y: b.y });
    }
}
