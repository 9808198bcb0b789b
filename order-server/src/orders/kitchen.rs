//! Kitchen aggregation - pure grouping over items-with-status
//!
//! The kitchen display batches identical drinks/dishes across orders so one
//! station run covers several tickets. Grouping is a pure function of the
//! item sequence and an optional zone filter, independent of how orders are
//! persisted.

use serde::Serialize;
use shared::models::product::KitchenZone;
use shared::order::Order;
use shared::order::types::KitchenStatus;

/// Back-reference from an aggregated line to the order it came from
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemRef {
    pub order_id: String,
    pub shortcode: String,
    pub item_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One production line on the kitchen display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AggregatedItem {
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ice_level: Option<String>,
    pub quantity: u32,
    pub orders: Vec<ItemRef>,
}

/// Aggregate not-yet-done items across orders, optionally filtered by zone.
///
/// Items group on (product name, size, sugar, ice); the grouping key
/// deliberately ignores toppings and notes, which are called out per order
/// via the back-references. Output order follows first appearance, so the
/// display is stable as orders stream in.
pub fn aggregate_pending_items<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    zone: Option<KitchenZone>,
) -> Vec<AggregatedItem> {
    let mut lines: Vec<AggregatedItem> = Vec::new();

    for order in orders {
        for (item_index, item) in order.items.iter().enumerate() {
            if item.kitchen_status == KitchenStatus::Done {
                continue;
            }
            if let Some(z) = zone
                && item.kitchen_zone != z
            {
                continue;
            }

            let size = item.size.as_ref().map(|s| s.name.clone());
            let entry = lines.iter_mut().find(|l| {
                l.product_name == item.product_name
                    && l.size == size
                    && l.sugar_level == item.sugar_level
                    && l.ice_level == item.ice_level
            });

            let item_ref = ItemRef {
                order_id: order.id.clone(),
                shortcode: order.shortcode.clone(),
                item_index,
                note: item.note.clone(),
            };

            match entry {
                Some(line) => {
                    line.quantity += item.quantity;
                    line.orders.push(item_ref);
                }
                None => lines.push(AggregatedItem {
                    product_name: item.product_name.clone(),
                    size,
                    sugar_level: item.sugar_level.clone(),
                    ice_level: item.ice_level.clone(),
                    quantity: item.quantity,
                    orders: vec![item_ref],
                }),
            }
        }
    }

    lines
}
