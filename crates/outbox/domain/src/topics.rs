//! Topic Resolution
//!
//! Maps a fully-qualified event type to its destination topic. Known event
//! families use an exact table (needed where the topic name is not a plain
//! prefix, e.g. "order.created" publishes to the pluralized
//! "orders.events"). Anything unmapped falls back to
//! `<prefix-before-first-dot>.events`, so every event type has a
//! deterministic destination even before the table learns about it.

/// Exact event-type to topic pairs for the platform's event families.
const TOPIC_MAP: &[(&str, &str)] = &[
    ("order.created", "orders.events"),
    ("order.updated", "orders.events"),
    ("order.cancelled", "orders.events"),
    ("order.completed", "orders.events"),
    ("campaign.created", "campaigns.events"),
    ("campaign.launched", "campaigns.events"),
    ("campaign.triggered", "campaigns.events"),
    ("campaign.completed", "campaigns.events"),
    ("campaign.failed", "campaigns.events"),
    ("inventory.updated", "inventory.events"),
    ("inventory.low_stock", "inventory.events"),
    ("inventory.out_of_stock", "inventory.events"),
    ("purchase_order.created", "purchase-orders.events"),
    ("purchase_order.updated", "purchase-orders.events"),
    ("purchase_order.status_updated", "purchase-orders.events"),
];

/// Resolve the destination topic for an event type.
pub fn resolve_topic(event_type: &str) -> String {
    if let Some((_, topic)) = TOPIC_MAP.iter().find(|(et, _)| *et == event_type) {
        return (*topic).to_string();
    }

    let prefix = event_type.split('.').next().unwrap_or(event_type);
    format!("{prefix}.events")
}
