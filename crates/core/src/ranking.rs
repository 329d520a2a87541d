//! Composite relevance scoring for catalog items against an element.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::element::Element;
use crate::domain::item::Item;
use crate::domain::rule::ColorPalette;

pub const BENEFICIAL_COLOR_PRIORITIZED: f64 = 30.0;
pub const BENEFICIAL_COLOR_PLAIN: f64 = 20.0;
pub const COMPATIBLE_COLOR: f64 = 15.0;
pub const ELEMENT_MATCH: f64 = 10.0;
pub const SOLD_COUNT_DIVISOR: f64 = 100.0;

/// What an item is scored against.
#[derive(Clone, Debug)]
pub struct RankingContext<'a> {
    pub element: Element,
    pub palette: &'a ColorPalette,
    pub prioritize_beneficial: bool,
}

/// Per-term contributions; `total` is their sum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub beneficial_color: f64,
    pub compatible_color: f64,
    pub element_match: f64,
    pub rating: f64,
    pub popularity: f64,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    pub item: Item,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

pub fn score_item(item: &Item, context: &RankingContext<'_>) -> ScoreBreakdown {
    let beneficial_color = if intersects(&item.colors, &context.palette.beneficial) {
        if context.prioritize_beneficial {
            BENEFICIAL_COLOR_PRIORITIZED
        } else {
            BENEFICIAL_COLOR_PLAIN
        }
    } else {
        0.0
    };
    let compatible_color =
        if intersects(&item.colors, &context.palette.compatible) { COMPATIBLE_COLOR } else { 0.0 };
    let element_match =
        if item.elements.contains(&context.element) { ELEMENT_MATCH } else { 0.0 };
    let rating = item.rating;
    let popularity = f64::from(item.sold_count) / SOLD_COUNT_DIVISOR;

    ScoreBreakdown {
        beneficial_color,
        compatible_color,
        element_match,
        rating,
        popularity,
        total: beneficial_color + compatible_color + element_match + rating + popularity,
    }
}

/// Score, drop non-positive totals, sort (score desc, rating desc, price asc)
/// and truncate to `limit`.
pub fn rank_items(items: Vec<Item>, context: &RankingContext<'_>, limit: usize) -> Vec<RankedItem> {
    let mut ranked = items
        .into_iter()
        .filter_map(|item| {
            let breakdown = score_item(&item, context);
            (breakdown.total > 0.0).then_some(RankedItem { score: breakdown.total, breakdown, item })
        })
        .collect::<Vec<_>>();

    ranked.sort_by(compare_ranked);
    ranked.truncate(limit);
    ranked
}

fn compare_ranked(left: &RankedItem, right: &RankedItem) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| right.item.rating.total_cmp(&left.item.rating))
        .then_with(|| left.item.price.cmp(&right.item.price))
}

fn intersects(left: &[String], right: &[String]) -> bool {
    left.iter().any(|color| right.contains(color))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{rank_items, score_item, RankingContext};
    use crate::domain::element::Element;
    use crate::domain::item::{Item, ItemId};
    use crate::domain::rule::ColorPalette;

    fn palette() -> ColorPalette {
        ColorPalette {
            compatible: vec!["trắng".to_string(), "bạc".to_string(), "vàng".to_string()],
            beneficial: vec!["vàng".to_string(), "nâu".to_string()],
            avoid: vec!["đỏ".to_string()],
        }
    }

    fn item(id: &str, colors: &[&str], elements: &[Element], rating: f64, sold: u32) -> Item {
        Item {
            id: ItemId(id.to_string()),
            name: format!("Item {id}"),
            category: "decor".to_string(),
            colors: colors.iter().map(|color| color.to_string()).collect(),
            elements: elements.to_vec(),
            price: Decimal::new(100_000, 0),
            rating,
            sold_count: sold,
            stock: 5,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn beneficial_color_with_popularity_scores_as_documented() {
        let palette = palette();
        let context =
            RankingContext { element: Element::Metal, palette: &palette, prioritize_beneficial: true };

        let breakdown = score_item(&item("a", &["nâu"], &[Element::Wood], 4.5, 200), &context);

        assert_eq!(breakdown.beneficial_color, 30.0);
        assert_eq!(breakdown.compatible_color, 0.0);
        assert_eq!(breakdown.element_match, 0.0);
        assert!((breakdown.total - 36.5).abs() < 1e-9);
    }

    #[test]
    fn beneficial_and_compatible_terms_stack() {
        let palette = palette();
        let context =
            RankingContext { element: Element::Metal, palette: &palette, prioritize_beneficial: false };

        let breakdown = score_item(&item("a", &["vàng"], &[Element::Metal], 0.0, 0), &context);

        assert_eq!(breakdown.beneficial_color, 20.0);
        assert_eq!(breakdown.compatible_color, 15.0);
        assert_eq!(breakdown.element_match, 10.0);
        assert_eq!(breakdown.total, 45.0);
    }

    #[test]
    fn unmatched_item_without_popularity_is_excluded_regardless_of_limit() {
        let palette = palette();
        let context =
            RankingContext { element: Element::Metal, palette: &palette, prioritize_beneficial: true };
        let items = vec![
            item("dead", &["đỏ"], &[Element::Fire], 0.0, 0),
            item("alive", &["đỏ"], &[Element::Fire], 0.1, 0),
        ];

        let ranked = rank_items(items, &context, 100);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].item.id.0, "alive");
    }

    #[test]
    fn sorts_by_score_then_rating_then_price() {
        let palette = palette();
        let context =
            RankingContext { element: Element::Metal, palette: &palette, prioritize_beneficial: true };

        // Equal totals (31.0) with different ratings.
        let high_rating = item("high-rating", &["nâu"], &[], 1.0, 0);
        let mut low_rating = item("low-rating", &["nâu"], &[], 0.5, 50);
        low_rating.price = Decimal::new(1, 0);
        // Equal totals and ratings, different prices.
        let mut cheap = item("cheap", &["trắng"], &[], 2.0, 0);
        cheap.price = Decimal::new(50_000, 0);
        let mut pricey = item("pricey", &["trắng"], &[], 2.0, 0);
        pricey.price = Decimal::new(90_000, 0);
        let top = item("top", &["vàng"], &[Element::Metal], 5.0, 0);

        let ranked = rank_items(vec![pricey, cheap, low_rating, high_rating, top], &context, 10);
        let order = ranked.iter().map(|entry| entry.item.id.0.as_str()).collect::<Vec<_>>();

        assert_eq!(order, vec!["top", "high-rating", "low-rating", "cheap", "pricey"]);
    }

    #[test]
    fn truncates_to_limit() {
        let palette = palette();
        let context =
            RankingContext { element: Element::Metal, palette: &palette, prioritize_beneficial: true };
        let items = (0..5).map(|n| item(&format!("i{n}"), &["bạc"], &[], f64::from(n), 0)).collect();

        let ranked = rank_items(items, &context, 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item.id.0, "i4");
        assert_eq!(ranked[1].item.id.0, "i3");
    }

    #[test]
    fn raising_rating_never_lowers_score_or_position() {
        let palette = palette();
        let context =
            RankingContext { element: Element::Metal, palette: &palette, prioritize_beneficial: true };
        let others = vec![
            item("o1", &["vàng"], &[], 3.0, 100),
            item("o2", &["bạc"], &[Element::Metal], 1.0, 0),
            item("o3", &["đỏ"], &[], 2.0, 300),
        ];

        let mut previous_score = f64::MIN;
        let mut previous_position = usize::MAX;
        for step in 0..=20 {
            let rating = f64::from(step) * 0.5;
            let subject = item("subject", &["nâu"], &[], rating, 10);
            let mut candidates = others.clone();
            candidates.push(subject);

            let ranked = rank_items(candidates, &context, 10);
            let position = ranked
                .iter()
                .position(|entry| entry.item.id.0 == "subject")
                .expect("subject should be ranked");
            let score = ranked[position].score;

            assert!(score >= previous_score, "score dropped at rating {rating}");
            assert!(position <= previous_position, "position dropped at rating {rating}");
            previous_score = score;
            previous_position = position;
        }
    }
}
