//! Placement of a ground inside a larger world.

use glam::DVec3;

use crate::collector::ItemKey;

/// Where a ground sits when it is explored as part of something bigger.
///
/// `prefix` namespaces the keys of collected items; `offset` is the world
/// position of the ground's origin. Contexts nest by appending segments and
/// adding offsets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExplorationContext {
    prefix: Vec<String>,
    offset: DVec3,
}

impl ExplorationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A nested context with one more key segment.
    #[must_use]
    pub fn with_prefix(&self, segment: impl Into<String>) -> Self {
        let mut prefix = self.prefix.clone();
        prefix.push(segment.into());
        Self {
            prefix,
            offset: self.offset,
        }
    }

    /// A nested context moved by `offset`.
    #[must_use]
    pub fn with_offset(&self, offset: DVec3) -> Self {
        Self {
            prefix: self.prefix.clone(),
            offset: self.offset + offset,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    #[must_use]
    pub fn offset(&self) -> DVec3 {
        self.offset
    }

    /// `key` with this context's prefix in front.
    #[must_use]
    pub fn mutate_key(&self, key: &ItemKey) -> ItemKey {
        ItemKey::new(self.prefix.iter().cloned().chain(key.segments().iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_tiles::TileCoordinates;

    #[test]
    fn test_default_is_identity() {
        let ctx = ExplorationContext::default();
        let key = ItemKey::from_tile(&TileCoordinates::new_2d(1, 2, 3));
        assert_eq!(ctx.mutate_key(&key), key);
        assert_eq!(ctx.offset(), DVec3::ZERO);
    }

    #[test]
    fn test_nesting_accumulates() {
        let ctx = ExplorationContext::new()
            .with_prefix("planet")
            .with_offset(DVec3::new(10.0, 0.0, 0.0))
            .with_prefix("ground")
            .with_offset(DVec3::new(5.0, 1.0, 0.0));
        assert_eq!(ctx.prefix(), ["planet", "ground"]);
        assert_eq!(ctx.offset(), DVec3::new(15.0, 1.0, 0.0));

        let key = ctx.mutate_key(&ItemKey::from_tile(&TileCoordinates::new_2d(0, 0, 0)));
        assert_eq!(key.to_string(), "planet/ground/_0.0.0.0");
    }
}
