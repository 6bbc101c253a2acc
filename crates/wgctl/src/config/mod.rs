//! Tunnel definitions.
//!
//! A tunnel is described by a YAML file, by default
//! `/etc/wireguard/<instance>.yml`:
//!
//! ```yaml
//! description: office uplink
//! interface:
//!   private_key: /etc/wireguard/office.key
//!   listen_port: 51820
//!   address: 10.8.0.2/24
//!   post_up: [ "sysctl -w net.ipv4.ip_forward=1" ]
//! peers:
//!   - public_key: xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=
//!     endpoint: 198.51.100.7:51820
//!     allowed_ips: [ 0.0.0.0/0 ]
//! ```
//!
//! `private_key` names a file whose first line is the base64 key. The loader
//! checks structure only; keys and endpoints are decoded by the tunnel
//! controller before it creates anything.

mod types;

pub use types::{InterfaceConfig, PeerConfig, TunnelConfig};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::netlink::error::{Error, Result};
use types::RawConfig;

/// Directory searched for `<instance>.yml`.
pub const CONFIG_DIR: &str = "/etc/wireguard";

/// Extension of tunnel definition files.
pub const CONFIG_EXT: &str = "yml";

/// Turn a command-line argument into `(instance, path)`.
///
/// An argument naming an existing file is used as is and the instance is
/// the file stem. Anything else is an instance name looked up in
/// [`CONFIG_DIR`].
pub fn resolve(arg: &str) -> (String, PathBuf) {
    resolve_in(Path::new(CONFIG_DIR), arg)
}

fn resolve_in(dir: &Path, arg: &str) -> (String, PathBuf) {
    let candidate = Path::new(arg);
    if candidate.is_file() {
        let path = candidate.canonicalize().unwrap_or_else(|_| candidate.to_path_buf());
        let instance = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| arg.to_string());
        return (instance, path);
    }

    (arg.to_string(), dir.join(format!("{}.{}", arg, CONFIG_EXT)))
}

/// Load and validate the definition for `arg` (instance name or file path).
pub fn load(arg: &str) -> Result<TunnelConfig> {
    let (instance, path) = resolve(arg);
    load_from(&path, &instance)
}

/// Load and validate a definition file for the given instance.
pub fn load_from(path: &Path, instance: &str) -> Result<TunnelConfig> {
    with_private_key(inspect_from(path, instance)?)
}

/// Load a definition without reading its private key file.
///
/// `interface.private_key` holds the key file path. That is enough to tear
/// the tunnel down or display it; call [`with_private_key`] before
/// configuring a device with it.
pub fn inspect(arg: &str) -> Result<TunnelConfig> {
    let (instance, path) = resolve(arg);
    inspect_from(&path, &instance)
}

fn inspect_from(path: &Path, instance: &str) -> Result<TunnelConfig> {
    let validated = read(path, instance)?;
    let mut config = validated.config;
    config.interface.private_key = validated.private_key_path;
    Ok(config)
}

/// Replace the key file path of an inspected definition with the key.
pub fn with_private_key(mut config: TunnelConfig) -> Result<TunnelConfig> {
    config.interface.private_key = read_private_key(Path::new(&config.interface.private_key))?;
    Ok(config)
}

fn read(path: &Path, instance: &str) -> Result<types::Validated> {
    debug!(path = %path.display(), instance, "loading tunnel definition");

    let text = fs::read_to_string(path)
        .map_err(|_| Error::Config(format!("could not read file: {}", path.display())))?;
    parse(&text, path, instance)
}

fn parse(text: &str, path: &Path, instance: &str) -> Result<types::Validated> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|source| Error::ConfigSyntax {
            path: path.to_path_buf(),
            source,
        })?;

    if value.is_null() {
        return Err(Error::Config("could not parse configuration".into()));
    }

    let raw: RawConfig = serde_yaml::from_value(value).map_err(|source| Error::ConfigSyntax {
        path: path.to_path_buf(),
        source,
    })?;
    raw.validate(instance)
}

/// Read the first line of a private key file, trimmed.
pub fn read_private_key(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "could not read private key file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(text.lines().next().unwrap_or_default().trim().to_string())
}

/// Instance names of every definition in [`CONFIG_DIR`], sorted.
pub fn list_instances() -> Result<Vec<String>> {
    list_instances_in(Path::new(CONFIG_DIR))
}

fn list_instances_in(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut instances = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == CONFIG_EXT)
            && let Some(stem) = path.file_stem()
        {
            instances.push(stem.to_string_lossy().into_owned());
        }
    }
    instances.sort();
    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PRIVATE_KEY: &str = "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=";

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_resolve_instance_name() {
        let dir = tempfile::tempdir().unwrap();
        let (instance, path) = resolve_in(dir.path(), "office");
        assert_eq!(instance, "office");
        assert_eq!(path, dir.path().join("office.yml"));
    }

    #[test]
    fn test_resolve_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "home.yml", "");
        let (instance, path) = resolve_in(Path::new(CONFIG_DIR), file.to_str().unwrap());
        assert_eq!(instance, "home");
        assert_eq!(path, file.canonicalize().unwrap());
    }

    #[test]
    fn test_load_reads_private_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let key = write(dir.path(), "wg0.key", &format!("  {}  \nsecond line\n", PRIVATE_KEY));
        let path = write(
            dir.path(),
            "wg0.yml",
            &format!(
                "interface:\n  private_key: {}\n  listen_port: 51820\npeers: []\n",
                key.display()
            ),
        );

        let config = load_from(&path, "wg0").unwrap();
        assert_eq!(config.instance, "wg0");
        assert_eq!(config.interface.private_key, PRIVATE_KEY);
        assert_eq!(config.interface.listen_port, 51820);
    }

    #[test]
    fn test_missing_private_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "wg0.yml",
            "interface:\n  private_key: /nonexistent/wg0.key\n  listen_port: 51820\n",
        );

        let err = load_from(&path, "wg0").unwrap_err();
        assert!(
            err.to_string().starts_with("could not read private key file /nonexistent/wg0.key"),
            "{}",
            err
        );
    }

    #[test]
    fn test_inspect_skips_private_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "office.yml",
            "description: office\ninterface:\n  private_key: /nonexistent/office.key\n  listen_port: 51820\n",
        );

        let config = inspect(path.to_str().unwrap()).unwrap();
        assert_eq!(config.instance, "office");
        assert_eq!(config.description.as_deref(), Some("office"));
        assert_eq!(config.interface.private_key, "/nonexistent/office.key");
    }

    #[test]
    fn test_inspect_then_read_key() {
        let dir = tempfile::tempdir().unwrap();
        let key = write(dir.path(), "office.key", &format!("{}\n", PRIVATE_KEY));
        let path = write(
            dir.path(),
            "office.yml",
            &format!(
                "interface:\n  private_key: {}\n  listen_port: 51820\n",
                key.display()
            ),
        );

        let config = inspect(path.to_str().unwrap()).unwrap();
        assert_eq!(config.interface.private_key, key.display().to_string());

        let config = with_private_key(config).unwrap();
        assert_eq!(config.interface.private_key, PRIVATE_KEY);

        fs::remove_file(&key).unwrap();
        let config = inspect(path.to_str().unwrap()).unwrap();
        assert!(matches!(with_private_key(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = load_from(Path::new("/nonexistent/wg0.yml"), "wg0").unwrap_err();
        assert_eq!(err.to_string(), "could not read file: /nonexistent/wg0.yml");
    }

    #[test]
    fn test_yaml_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "wg0.yml", "interface: [unterminated\n");
        assert!(matches!(
            load_from(&path, "wg0"),
            Err(Error::ConfigSyntax { .. })
        ));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "wg0.yml", "");
        assert_eq!(
            load_from(&path, "wg0").unwrap_err().to_string(),
            "could not parse configuration"
        );
    }

    #[test]
    fn test_list_instances() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "office.yml", "");
        write(dir.path(), "home.yml", "");
        write(dir.path(), "home.key", "");

        assert_eq!(list_instances_in(dir.path()).unwrap(), vec!["home", "office"]);
        assert!(list_instances_in(&dir.path().join("missing")).unwrap().is_empty());
    }
}
