//! Product listing logic
//!
//! The catalog is small enough to fetch whole; filtering, ordering and paging
//! happen over the full list. Past a few hundred vehicles this should move into
//! CMS queries.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::vehicle::Vehicle;

/// Page size on the products page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Listing filters, as carried in the products page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(rename = "type", default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

impl CatalogQuery {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(q) = non_empty(&self.q) {
            let needle = q.to_lowercase();
            let hit = [
                &vehicle.brand,
                &vehicle.name,
                &vehicle.vehicle_type,
                &vehicle.description,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(wanted) = non_empty(&self.vehicle_type) {
            if vehicle.vehicle_type != wanted {
                return false;
            }
        }
        if let Some(wanted) = non_empty(&self.brand) {
            if vehicle.brand != wanted {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Stable sort by ascending ranking; unranked vehicles go last.
pub fn sort_by_ranking(vehicles: &mut [Vehicle]) {
    vehicles.sort_by(|a, b| match (a.ranking, b.ranking) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

pub fn filter<'a>(vehicles: &'a [Vehicle], query: &CatalogQuery) -> Vec<&'a Vehicle> {
    vehicles.iter().filter(|v| query.matches(v)).collect()
}

/// Sidebar filter options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub types: Vec<String>,
    pub brands: Vec<String>,
}

pub fn facets(vehicles: &[Vehicle]) -> Facets {
    let mut types = BTreeSet::new();
    let mut brands = BTreeSet::new();
    for vehicle in vehicles {
        if !vehicle.vehicle_type.is_empty() {
            types.insert(vehicle.vehicle_type.clone());
        }
        if !vehicle.brand.is_empty() {
            brands.insert(vehicle.brand.clone());
        }
    }
    Facets {
        types: types.into_iter().collect(),
        brands: brands.into_iter().collect(),
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// 1-based paging. There is always at least one page, and out-of-range page
/// numbers are clamped.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> CatalogPage<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);

    CatalogPage {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        total_pages,
        total_items,
    }
}

/// `(id, ranking)` of a vehicle document, disabled ones included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub id: String,
    pub ranking: Option<i64>,
}

/// A ranking write to apply to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingPatch {
    pub id: String,
    pub ranking: i64,
}

/// Move `target_id` to `new_ranking`, pushing every other vehicle at or below
/// that position down by one. The target's own patch comes first.
pub fn bump_rankings(entries: &[RankingEntry], target_id: &str, new_ranking: i64) -> Vec<RankingPatch> {
    let mut patches = vec![RankingPatch {
        id: target_id.to_string(),
        ranking: new_ranking,
    }];
    patches.extend(entries.iter().filter_map(|entry| match entry.ranking {
        Some(ranking) if entry.id != target_id && ranking >= new_ranking => Some(RankingPatch {
            id: entry.id.clone(),
            ranking: ranking + 1,
        }),
        _ => None,
    }));
    patches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vehicle(id: &str, brand: &str, name: &str, vehicle_type: &str, ranking: Option<i64>) -> Vehicle {
        let mut v = Vehicle::from_document(&json!({
            "_id": id,
            "brand": brand,
            "name": name,
            "type": vehicle_type,
        }))
        .unwrap();
        v.ranking = ranking;
        v
    }

    #[test]
    fn test_sort_unranked_last_and_stable() {
        let mut list = vec![
            vehicle("a", "Tesla", "Model Y", "SUV", None),
            vehicle("b", "Xpeng", "G6", "SUV", Some(2)),
            vehicle("c", "NIO", "L90", "SUV", None),
            vehicle("d", "BYD", "Seal", "Sedan", Some(1)),
        ];
        sort_by_ranking(&mut list);
        let ids: Vec<_> = list.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_filter_search_type_and_brand() {
        let list = vec![
            vehicle("a", "Tesla", "Model Y", "SUV", None),
            vehicle("b", "Xpeng", "G6", "SUV", None),
            vehicle("c", "BYD", "Seal", "Sedan", None),
        ];

        let search = CatalogQuery {
            q: Some("model".into()),
            ..CatalogQuery::default()
        };
        assert_eq!(filter(&list, &search).len(), 1);

        let suv = CatalogQuery {
            vehicle_type: Some("SUV".into()),
            ..CatalogQuery::default()
        };
        assert_eq!(filter(&list, &suv).len(), 2);

        let both = CatalogQuery {
            vehicle_type: Some("SUV".into()),
            brand: Some("Xpeng".into()),
            ..CatalogQuery::default()
        };
        let hits = filter(&list, &both);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");

        let empty = CatalogQuery {
            q: Some(String::new()),
            ..CatalogQuery::default()
        };
        assert_eq!(filter(&list, &empty).len(), 3);
    }

    #[test]
    fn test_facets_sorted_unique() {
        let list = vec![
            vehicle("a", "Xpeng", "G6", "SUV", None),
            vehicle("b", "BYD", "Seal", "Sedan", None),
            vehicle("c", "Xpeng", "P7", "", None),
        ];
        let facets = facets(&list);
        assert_eq!(facets.types, vec!["SUV", "Sedan"]);
        assert_eq!(facets.brands, vec!["BYD", "Xpeng"]);
    }

    #[test]
    fn test_paginate_clamps() {
        let items: Vec<u32> = (1..=23).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);

        let last = paginate(&items, 99, 10);
        assert_eq!(last.page, 3);
        assert_eq!(last.items, vec![21, 22, 23]);

        let zero = paginate(&items, 0, 10);
        assert_eq!(zero.page, 1);

        let none: CatalogPage<u32> = paginate(&[], 1, 10);
        assert_eq!(none.total_pages, 1);
        assert!(none.items.is_empty());
    }

    #[test]
    fn test_bump_rankings() {
        let entries = vec![
            RankingEntry { id: "a".into(), ranking: Some(1) },
            RankingEntry { id: "b".into(), ranking: Some(2) },
            RankingEntry { id: "c".into(), ranking: Some(3) },
            RankingEntry { id: "d".into(), ranking: None },
        ];
        let patches = bump_rankings(&entries, "c", 2);
        assert_eq!(
            patches,
            vec![
                RankingPatch { id: "c".into(), ranking: 2 },
                RankingPatch { id: "b".into(), ranking: 3 },
            ]
        );
    }
}
