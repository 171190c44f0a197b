use super::model::Vlan;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Load, validate and normalize a VLAN document from a YAML file.
///
/// Validation warnings are logged; validation errors abort the load.
pub fn load_vlan(config_path: &Path) -> Result<Vlan> {
    info!("Loading VLAN configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open config file '{}'", config_path.display()))?;
    let mut vlan: Vlan = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to decode config file '{}'", config_path.display()))?;

    let warnings = vlan.validate().into_result()?;
    for warning in warnings {
        warn!("config warning: {}", warning);
    }

    vlan.normalize()?;
    Ok(vlan)
}

/// Parse a VLAN document without validating it
pub fn parse_vlan(yaml: &str) -> Result<Vlan> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Serialize a VLAN document to YAML text
pub fn vlan_to_yaml(vlan: &Vlan) -> Result<String> {
    Ok(serde_yaml::to_string(vlan)?)
}

/// Write a VLAN document, replacing any existing file
pub fn save_vlan(vlan: &Vlan, config_path: &Path) -> Result<()> {
    let yaml = vlan_to_yaml(vlan)?;
    fs::write(config_path, yaml)
        .wrap_err_with(|| format!("Failed to write config file '{}'", config_path.display()))?;
    info!("Wrote configuration to: {:?}", config_path);
    Ok(())
}

/// Write a new VLAN document, refusing to overwrite an existing file
pub fn create_vlan(vlan: &Vlan, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        bail!("config already exists: {}", config_path.display());
    }
    let yaml = vlan_to_yaml(vlan)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(config_path)
        .wrap_err_with(|| format!("Failed to create config file '{}'", config_path.display()))?;
    file.write_all(yaml.as_bytes())?;
    info!("Wrote configuration to: {:?}", config_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vlan::{VlanError, VlanServer};
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn sample_yaml() -> String {
        let mut vlan = Vlan::new(VlanServer::new("office", "10.20.30.1/24", 51820).unwrap())
            .with_public_endpoint("vpn.example.com:51820");
        vlan.add_client("laptop", None).unwrap();
        vlan.add_client("phone", None).unwrap();
        vlan_to_yaml(&vlan).unwrap()
    }

    #[test]
    fn test_load_round_trip_is_byte_stable() {
        let yaml = sample_yaml();
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let vlan = load_vlan(temp_file.path()).unwrap();
        assert_eq!(vlan.clients.len(), 2);
        assert_eq!(vlan.clients[0].peer_name, "laptop");
        assert_eq!(vlan.clients[1].peer_name, "phone");
        assert_eq!(vlan_to_yaml(&vlan).unwrap(), yaml);
    }

    #[test]
    fn test_load_fills_missing_public_keys() {
        let mut vlan = parse_vlan(&sample_yaml()).unwrap();
        let expected = vlan.server.public_key.clone();
        vlan.server.public_key.clear();

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", vlan_to_yaml(&vlan).unwrap()).unwrap();
        assert!(!std::fs::read_to_string(temp_file.path())
            .unwrap()
            .contains(&expected));

        let loaded = load_vlan(temp_file.path()).unwrap();
        assert_eq!(loaded.server.public_key, expected);
    }

    #[test]
    fn test_unknown_fields_survive() {
        let yaml = format!("{}comment: managed by hand\n", sample_yaml());
        let vlan = parse_vlan(&yaml).unwrap();
        assert_eq!(
            vlan.unknown.get("comment"),
            Some(&serde_yaml::Value::String("managed by hand".to_string()))
        );
        assert!(vlan_to_yaml(&vlan).unwrap().contains("comment: managed by hand"));
    }

    #[test]
    fn test_unknown_entity_fields_survive() {
        // Add a hand-written key right below the line holding `marker`
        fn insert_below(yaml: &str, marker: &str, entry: &str) -> String {
            let mut out = String::new();
            for line in yaml.lines() {
                out.push_str(line);
                out.push('\n');
                let body = line.trim_start();
                if body.trim_start_matches("- ") == marker {
                    let mut indent = line.len() - body.len();
                    if body.starts_with("- ") {
                        indent += 2;
                    }
                    out.push_str(&" ".repeat(indent));
                    out.push_str(entry);
                    out.push('\n');
                }
            }
            out
        }

        let yaml = insert_below(&sample_yaml(), "peer_name: office", "rack: b2");
        let yaml = insert_below(&yaml, "peer_name: laptop", "note: keep-me");
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let vlan = load_vlan(temp_file.path()).unwrap();
        assert_eq!(
            vlan.server.unknown.get("rack"),
            Some(&serde_yaml::Value::String("b2".to_string()))
        );
        assert_eq!(
            vlan.clients[0].unknown.get("note"),
            Some(&serde_yaml::Value::String("keep-me".to_string()))
        );
        assert!(vlan.clients[1].unknown.is_empty());

        let saved = vlan_to_yaml(&vlan).unwrap();
        assert!(saved.contains("rack: b2"));
        assert!(saved.contains("note: keep-me"));
        assert_eq!(parse_vlan(&saved).unwrap(), vlan);
    }

    #[test]
    fn test_load_rejects_invalid_document() {
        let yaml = r#"
server:
  peer_name: ""
  listen_port: 0
  network: "nonsense"
clients: []
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let err = load_vlan(temp_file.path()).unwrap_err();
        let vlan_err = err.downcast_ref::<VlanError>().unwrap();
        let VlanError::Validation(errors) = vlan_err else {
            panic!("expected aggregate error, got {}", vlan_err);
        };
        assert_eq!(errors.errors().len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_vlan(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to open config file"));
    }

    #[test]
    fn test_create_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vlan.yaml");
        let vlan = parse_vlan(&sample_yaml()).unwrap();

        create_vlan(&vlan, &path).unwrap();
        let err = create_vlan(&vlan, &path).unwrap_err();
        assert!(err.to_string().contains("config already exists"));

        save_vlan(&vlan, &path).unwrap();
        assert_eq!(load_vlan(&path).unwrap(), vlan);
    }
}
