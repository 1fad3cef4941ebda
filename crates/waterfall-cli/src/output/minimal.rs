use serde_json::Value;

use super::{format_scalar, result_of};

/// Headline figure per command, in priority order. Dotted keys reach one
/// level into nested objects.
const PRIORITY_KEYS: [&str; 8] = [
    "valid",
    "metrics.weighted_avg_cost_bps",
    "concentration.hhi",
    "hhi",
    "total_value",
    "roe",
    "weighted_avg_cost_bps",
    "net_earnings",
];

/// Print just the key answer value from the output.
///
/// A scenario list prints one `scenario: roe` line per entry.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    if let Value::Array(rows) = result {
        for row in rows {
            match (row.get("scenario"), row.get("roe")) {
                (Some(name), Some(roe)) => {
                    println!("{}: {}", format_scalar(name), format_scalar(roe))
                }
                _ => println!("{}", format_scalar(row)),
            }
        }
        return;
    }

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = lookup(result, key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}

fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted.split('.').try_fold(value, |v, k| v.get(k))
}
