use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_of};

/// Format output as tables using the tabled crate.
///
/// Scalars of the result go in one Field/Value table; each nested object and
/// each list of rows gets its own titled table underneath.
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(res_map) => print_sections(res_map),
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", format_scalar(other)),
    }

    if let Value::Object(envelope) = value {
        print_envelope_notes(envelope);
    }
}

fn print_sections(map: &Map<String, Value>) {
    let mut scalars = Builder::default();
    scalars.push_record(["Field", "Value"]);
    let mut has_scalars = false;

    for (key, val) in map {
        if !is_section(val) {
            scalars.push_record([key.as_str(), &format_value(val)]);
            has_scalars = true;
        }
    }
    if has_scalars {
        println!("{}", Table::from(scalars));
    }

    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                println!("\n{}:", key);
                print_key_values(inner);
            }
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                println!("\n{}:", key);
                print_rows(rows);
            }
            _ => {}
        }
    }
}

fn is_section(val: &Value) -> bool {
    match val {
        Value::Object(_) => true,
        Value::Array(rows) => rows.first().is_some_and(Value::is_object),
        _ => false,
    }
}

fn print_key_values(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in rows {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in rows {
            println!("{}", format_value(item));
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Null => "-".to_string(),
        other => format_scalar(other),
    }
}
