//! Config redaction: mask credentials before a config is logged or shown.

use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &[
    "clientId",
    "client_id",
    "clientSecret",
    "client_secret",
    "apiKey",
    "api_key",
    "token",
    "secret",
    "password",
];

/// Replace every sensitive string with its first 4 chars plus `***`.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    if s.chars().count() > 4 {
        Value::String(format!("{}***", s.chars().take(4).collect::<String>()))
    } else {
        Value::String("***".to_string())
    }
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Collect the dotted paths of every field [`redact`] would mask.
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths_recursive(value, "", &mut paths);
    paths
}

fn collect_paths_recursive(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => {
            let key = path.rsplit('.').next().unwrap_or("");
            if is_sensitive_key(key) {
                out.push(path.to_string());
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_paths_recursive(v, &child_path, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_papago_credentials() {
        let v = json!({"translation": {"clientId": "abcdefgh", "clientSecret": "xyz", "targetLang": "en"}});
        let r = redact(&v);
        assert_eq!(r["translation"]["clientId"], "abcd***");
        assert_eq!(r["translation"]["clientSecret"], "***");
        assert_eq!(r["translation"]["targetLang"], "en");
    }

    #[test]
    fn lists_redacted_paths() {
        let v = json!({"translation": {"clientId": "abc", "endpoint": "https://x"}});
        assert_eq!(collect_redacted_paths(&v), vec!["translation.clientId"]);
    }
}
