use colored::Colorize;
use schema_forms::{coerce_form_data, derive_default, format_issues, safe_parse, FormData, Schema};
use serde_json::{json, Value};

struct Sample {
    label: &'static str,
    body: &'static str,
    valid: bool,
}

fn signup_schema() -> Value {
    json!({
        "kind": "object",
        "entries": {
            "username": { "kind": "string", "pipe": [{ "type": "min_length", "requirement": 3 }] },
            "email": { "kind": "string", "pipe": [{ "type": "email" }] },
            "age": { "kind": "nullish", "wrapped": { "kind": "number", "pipe": [{ "type": "integer" }] } },
            "newsletter": { "kind": "boolean" },
            "plan": { "kind": "enum", "values": ["free", "pro"] },
            "tags": { "kind": "array", "item": { "kind": "string" } },
            "signup_date": { "kind": "date" }
        }
    })
}

/// Realistic urlencoded submissions of a signup form.
fn realistic_samples() -> Vec<Sample> {
    vec![
        Sample {
            label: "complete submission",
            body: "username=ada&email=ada%40example.com&age=36&newsletter=on&plan=pro&tags=math&tags=engines&signup_date=2024-03-01",
            valid: true,
        },
        Sample {
            label: "unchecked checkbox, no tags",
            body: "username=grace&email=grace%40example.com&newsletter=off&plan=free&signup_date=2024-03-01T09%3A30",
            valid: true,
        },
        Sample {
            label: "short name, bad email",
            body: "username=al&email=al-at-example&newsletter=yes&plan=pro&signup_date=2024-03-01",
            valid: false,
        },
        Sample {
            label: "fractional age, unknown plan",
            body: "username=linus&email=l%40example.com&age=3.5&newsletter=true&plan=enterprise&signup_date=2024-03-01",
            valid: false,
        },
        Sample {
            label: "garbled date",
            body: "username=barbara&email=b%40example.com&newsletter=on&plan=free&signup_date=someday",
            valid: false,
        },
    ]
}

fn main() {
    let schema_src = serde_json::to_vec(&signup_schema()).unwrap();
    let schema = match Schema::from_json_slice(&schema_src) {
        Ok(x) => x,
        Err(error) => {
            eprintln!("❌ failed to load schema: {error}");
            std::process::exit(1);
        }
    };

    eprintln!("—— defaults ——");
    println!("{}", serde_json::to_string_pretty(&derive_default(&schema)).unwrap());

    eprintln!("—— submissions ——");
    let mut mismatches = 0;
    for sample in realistic_samples() {
        let form = FormData::from_urlencoded(sample.body.as_bytes());
        let data = match coerce_form_data(&schema, &form) {
            Ok(x) => x,
            Err(error) => {
                eprintln!("❌ {}: coercion failed: {error}", sample.label);
                mismatches += 1;
                continue;
            }
        };
        let result = safe_parse(&schema, &data);
        if result.is_success() == sample.valid {
            eprintln!("{} {}", "✅".green(), sample.label);
        } else {
            mismatches += 1;
            eprintln!("{} {} (expected valid = {})", "❌".red(), sample.label, sample.valid);
        }
        if !result.is_success() {
            let tree = format_issues(result.issues(), |issue| format!("{}: {}", issue.validation, issue.message));
            println!("{}", serde_json::to_string_pretty(&tree).unwrap());
        }
    }

    if mismatches > 0 {
        eprintln!("{}", format!("{mismatches} sample(s) did not behave as expected").red());
        std::process::exit(1);
    }
}
