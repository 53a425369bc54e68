//! Location resolution — "where is this actor?"
//!
//! A leaf utility consumed everywhere else: resolves a location from a
//! prioritized chain of hints (explicit id → name → designated start).

use crate::types::{Location, LocationId};

/// Resolve a location from the prioritized hint chain.
///
/// 1. An explicit id, if supplied and known.
/// 2. A name (case-insensitive), if supplied and known.
/// 3. The designated start location by name.
///
/// Returns `None` only when even the start location is missing from the
/// collection.
#[must_use]
pub fn resolve_location<'a>(
    locations: &'a [Location],
    explicit: Option<LocationId>,
    name: Option<&str>,
    start_name: &str,
) -> Option<&'a Location> {
    if let Some(id) = explicit
        && let Some(loc) = locations.iter().find(|l| l.id == id)
    {
        return Some(loc);
    }
    if let Some(n) = name
        && let Some(loc) = locations.iter().find(|l| l.name.eq_ignore_ascii_case(n))
    {
        return Some(loc);
    }
    locations
        .iter()
        .find(|l| l.name.eq_ignore_ascii_case(start_name))
}

/// Mutable variant of [`resolve_location`], same chain.
#[must_use]
pub fn resolve_location_mut<'a>(
    locations: &'a mut [Location],
    explicit: Option<LocationId>,
    name: Option<&str>,
    start_name: &str,
) -> Option<&'a mut Location> {
    let idx = {
        let found = if let Some(id) = explicit {
            locations.iter().position(|l| l.id == id)
        } else {
            None
        };
        let found = found.or_else(|| {
            name.and_then(|n| locations.iter().position(|l| l.name.eq_ignore_ascii_case(n)))
        });
        found.or_else(|| {
            locations
                .iter()
                .position(|l| l.name.eq_ignore_ascii_case(start_name))
        })
    };
    idx.map(|i| &mut locations[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LocationType;

    fn world() -> Vec<Location> {
        vec![
            Location::new("Town Gate", LocationType::Gate),
            Location::new("Rusty Flagon", LocationType::Tavern),
            Location::new("Old Temple", LocationType::Temple),
        ]
    }

    #[test]
    fn explicit_id_wins() {
        let locs = world();
        let id = locs[2].id;
        let found =
            resolve_location(&locs, Some(id), Some("Rusty Flagon"), "Town Gate").expect("found");
        assert_eq!(found.name, "Old Temple");
    }

    #[test]
    fn unknown_id_falls_through_to_name() {
        let locs = world();
        let found = resolve_location(
            &locs,
            Some(LocationId::new()),
            Some("rusty flagon"),
            "Town Gate",
        )
        .expect("found");
        assert_eq!(found.name, "Rusty Flagon");
    }

    #[test]
    fn missing_hints_fall_back_to_start() {
        let locs = world();
        let found = resolve_location(&locs, None, None, "Town Gate").expect("found");
        assert_eq!(found.name, "Town Gate");
        let found = resolve_location(&locs, None, Some("Nowhere"), "Town Gate").expect("found");
        assert_eq!(found.name, "Town Gate");
    }

    #[test]
    fn empty_world_resolves_nothing() {
        assert!(resolve_location(&[], None, None, "Town Gate").is_none());
    }

    #[test]
    fn mutable_resolution_same_chain() {
        let mut locs = world();
        let loc =
            resolve_location_mut(&mut locs, None, Some("Old Temple"), "Town Gate").expect("found");
        loc.discovered = true;
        assert!(locs[2].discovered);
    }
}
