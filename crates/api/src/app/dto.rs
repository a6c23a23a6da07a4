use serde::Deserialize;

use tierlink_core::EntitlementRecord;
use tierlink_infra::GuildPremium;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RegisterGuildRequest {
    pub name: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

// Guild ids are rendered as strings: snowflakes overflow JSON number precision.

pub fn record_to_json(r: &EntitlementRecord) -> serde_json::Value {
    serde_json::json!({
        "guild_id": r.guild_id.to_string(),
        "name": r.name,
        "tier": r.tier.as_str(),
        "subscription_start_unix": r.subscription_start_unix,
        "transferred_to": r.transferred_to.map(|id| id.to_string()),
        "inherits_from": r.inherits_from.map(|id| id.to_string()),
    })
}

pub fn premium_to_json(p: &GuildPremium) -> serde_json::Value {
    serde_json::json!({
        "record": record_to_json(&p.record),
        "status": {
            "tier": p.status.tier.as_str(),
            "days_remaining": p.status.days_remaining,
            "active": p.status.active,
        },
    })
}
