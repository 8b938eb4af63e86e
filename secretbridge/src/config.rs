//! Configuration management

use serde_json::{Map, Value};
use std::path::Path;

/// Environment prefix, e.g. `SECRETBRIDGE_REGION`
const ENV_PREFIX: &str = "SECRETBRIDGE";

/// Settings given on the command line, applied over file and environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

/// Load the connection map from an optional file and the environment.
///
/// The result is the structural value a [`ClientHandle`] is initialized
/// with; validation happens there.
///
/// [`ClientHandle`]: secretbridge_secretsmanager::ClientHandle
pub fn load(path: &Path, overrides: Overrides) -> anyhow::Result<Value> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut map: Map<String, Value> = config.try_deserialize()?;
    normalize_keys(&mut map);

    if let Some(region) = overrides.region {
        map.insert("region".to_string(), Value::String(region));
    }
    if let Some(endpoint_url) = overrides.endpoint_url {
        map.insert("endpointUrl".to_string(), Value::String(endpoint_url));
    }

    Ok(Value::Object(map))
}

/// The config crate lowercases keys; restore the camelCase names the
/// adaptor reads.
fn normalize_keys(map: &mut Map<String, Value>) {
    const CAMEL_CASE: [&str; 4] = [
        "endpointUrl",
        "accessKeyId",
        "secretAccessKey",
        "sessionToken",
    ];

    let renames: Vec<(String, &str)> = map
        .keys()
        .filter_map(|key| {
            let flat = key.replace('_', "");
            CAMEL_CASE
                .iter()
                .find(|name| name.to_lowercase() == flat.to_lowercase() && **name != key.as_str())
                .map(|name| (key.clone(), *name))
        })
        .collect();

    for (from, to) in renames {
        if let Some(value) = map.remove(&from) {
            map.insert(to.to_string(), value);
        }
    }

    for value in map.values_mut() {
        if let Value::Object(nested) = value {
            normalize_keys(nested);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "secretbridge-{}-{}.toml",
            std::process::id(),
            contents.len()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_file_with_static_auth() {
        let path = write_config(
            r#"
region = "eu-west-1"
endpointUrl = "http://localhost:4584"

[auth]
accessKeyId = "AKID"
secretAccessKey = "SECRET"
"#,
        );

        let value = load(&path, Overrides::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(value["region"], "eu-west-1");
        assert_eq!(value["endpointUrl"], "http://localhost:4584");
        assert_eq!(
            value["auth"],
            json!({ "accessKeyId": "AKID", "secretAccessKey": "SECRET" })
        );
    }

    #[test]
    fn test_overrides_win() {
        let path = write_config("region = \"us-east-1\"\nauth = \"ECS_CONTAINER_ROLE\"\n");

        let value = load(
            &path,
            Overrides {
                region: Some("ap-south-1".to_string()),
                endpoint_url: Some("http://127.0.0.1:9000".to_string()),
            },
        )
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(value["region"], "ap-south-1");
        assert_eq!(value["auth"], "ECS_CONTAINER_ROLE");
        assert_eq!(value["endpointUrl"], "http://127.0.0.1:9000");
    }

    #[test]
    fn test_missing_file_is_optional() {
        let value = load(
            Path::new("/nonexistent/secretbridge.toml"),
            Overrides {
                region: Some("us-west-2".to_string()),
                endpoint_url: None,
            },
        )
        .unwrap();

        assert_eq!(value["region"], "us-west-2");
    }

    #[test]
    fn test_normalize_keys() {
        let mut map = json!({
            "endpointurl": "http://x",
            "auth": { "access_key_id": "a", "secretaccesskey": "s" }
        })
        .as_object()
        .cloned()
        .unwrap();

        normalize_keys(&mut map);

        assert_eq!(
            Value::Object(map),
            json!({
                "endpointUrl": "http://x",
                "auth": { "accessKeyId": "a", "secretAccessKey": "s" }
            })
        );
    }
}
