//! Map raw Origin and ITSM payloads onto [`ShopRecord`].

use serde_json::Value;

use storehours_core::{FinancialId, ShopRecord};

/// ITSM custom field that stores the opening-hours text.
pub const OPENING_HOURS_FIELD: &str = "godziny_otwarcia";

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// Normalize `{"content": {"results": [...]}}` from Origin.
///
/// Results without an `id` cannot be joined and are skipped. A missing or
/// `null` `workHours` means the store has no opening hours.
pub fn normalize_origin(raw: &Value) -> Vec<ShopRecord> {
    let Some(results) = raw
        .get("content")
        .and_then(|c| c.get("results"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|result| {
            let financial_id = scalar_text(result.get("id")?)?;
            let opening_hours = result
                .get("workHours")
                .filter(|hours| !hours.is_null())
                .map(render_work_hours);
            Some(ShopRecord::new(financial_id, opening_hours))
        })
        .collect()
}

/// Render work-hour entries sorted by `dayOfWeek`, one line per entry.
///
/// Entries without a usable `dayOfWeek` sort first; ties keep input order.
pub fn render_work_hours(work_hours: &Value) -> String {
    let mut entries: Vec<&Value> = work_hours
        .as_array()
        .map(|a| a.iter().collect())
        .unwrap_or_default();
    entries.sort_by(|a, b| {
        let a = a.get("dayOfWeek").and_then(day_key);
        let b = b.get("dayOfWeek").and_then(day_key);
        match (a, b) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (a, b) => a.is_some().cmp(&b.is_some()),
        }
    });

    entries
        .iter()
        .map(|entry| {
            let from = entry.get("hourFrom").and_then(Value::as_str).unwrap_or("");
            let to = entry.get("hourTo").and_then(Value::as_str).unwrap_or("");
            format!(
                "{}: {} - {}",
                char_slice(from, 0, 10),
                char_slice(from, 11, 16),
                char_slice(to, 11, 16)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn day_key(value: &Value) -> Option<f64> {
    let day = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (!day.is_nan()).then_some(day)
}

/// Characters `start..end` of `s`, clamped to its length.
fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

// ---------------------------------------------------------------------------
// ITSM
// ---------------------------------------------------------------------------

/// Normalize the organization list returned by ITSM.
///
/// Organizations without a `financialID` are skipped.
pub fn normalize_itsm(raw: &[Value]) -> Vec<ShopRecord> {
    raw.iter()
        .filter_map(|shop| {
            let financial_id = shop.get("financialID").and_then(scalar_text)?;
            Some(ShopRecord {
                financial_id: FinancialId::from(financial_id),
                id: shop.get("id").and_then(scalar_text),
                name: shop.get("name").and_then(scalar_text),
                opening_hours: custom_field(shop, OPENING_HOURS_FIELD),
            })
        })
        .collect()
}

/// Value of the custom field `field_id`, if the organization carries it.
///
/// A matching entry without `value` reads as the empty string; a `null`
/// value reads as absent.
fn custom_field(shop: &Value, field_id: &str) -> Option<String> {
    let fields = shop.get("custom_fields")?.as_array()?;
    let entry = fields
        .iter()
        .find(|f| f.get("id").and_then(Value::as_str) == Some(field_id))?;
    match entry.get("value") {
        None => Some(String::new()),
        Some(value) => scalar_text(value),
    }
}

/// String form of a JSON scalar; `null` and containers yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
