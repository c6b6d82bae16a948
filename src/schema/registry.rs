// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Registry of `.msg` definitions.
//!
//! Definitions come from three places: the predefined types, explicit
//! registrations, and `share/` directories of a ROS installation
//! (`<share>/<package>/msg/<Type>.msg`). Resolving a type collects its
//! transitive dependencies into a [`MessageSchema`] and wraps it in a
//! [`CdrDecoder`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::core::{BagError, Result};
use crate::encoding::cdr::CdrDecoder;
use crate::encoding::registry::{MessageDecoder, SchemaRegistry};
use crate::schema::ast::{canonical_type_name, MessageSchema, MessageType};
use crate::schema::{builtin_types, parser};

/// Environment variable listing ROS install prefixes.
pub const AMENT_PREFIX_PATH: &str = "AMENT_PREFIX_PATH";

/// Thread-safe map of canonical type name to parsed definition.
#[derive(Default)]
pub struct MsgRegistry {
    types: RwLock<HashMap<String, MessageType>>,
}

impl MsgRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the predefined types.
    pub fn with_builtins() -> Result<Self> {
        let registry = Self::new();
        for msg_type in builtin_types::get_all()? {
            registry.register_type(msg_type);
        }
        Ok(registry)
    }

    /// Predefined types plus every package found under `AMENT_PREFIX_PATH`.
    ///
    /// Prefixes whose `share` directory cannot be read are skipped with a
    /// warning.
    pub fn from_ament_prefix_path() -> Result<Self> {
        let registry = Self::with_builtins()?;
        if let Some(prefixes) = std::env::var_os(AMENT_PREFIX_PATH) {
            registry.load_prefixes(std::env::split_paths(&prefixes));
        }
        Ok(registry)
    }

    /// Load `<prefix>/share` for each install prefix, skipping unreadable ones.
    ///
    /// Returns the number of types registered.
    pub fn load_prefixes<I, P>(&self, prefixes: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut loaded = 0;
        for prefix in prefixes {
            let share = prefix.as_ref().join("share");
            if !share.is_dir() {
                continue;
            }
            match self.load_directory(&share) {
                Ok(n) => loaded += n,
                Err(err) => warn!(
                    dir = %share.display(),
                    error = %err,
                    "Skipping unreadable message directory"
                ),
            }
        }
        loaded
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, MessageType>> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, MessageType>> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an already parsed type, replacing any previous definition.
    pub fn register_type(&self, msg_type: MessageType) {
        self.write().insert(msg_type.name.clone(), msg_type);
    }

    /// Parse and register a `.msg` definition.
    ///
    /// Dependency blocks embedded in the text (`MSG: pkg/Type`) are
    /// registered as well. Returns the canonical name of the root type.
    pub fn register_definition(&self, type_name: &str, definition: &str) -> Result<String> {
        let schema = parser::parse(type_name, definition)?;
        let mut types = self.write();
        for (name, msg_type) in schema.types {
            types.insert(name, msg_type);
        }
        Ok(schema.name)
    }

    /// Load every `<package>/msg/*.msg` file under a `share` directory.
    ///
    /// Files that fail to parse are skipped with a warning. Returns the
    /// number of types registered.
    pub fn load_directory(&self, share_dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        for package_dir in sorted_entries(share_dir)? {
            let msg_dir = package_dir.join("msg");
            if !msg_dir.is_dir() {
                continue;
            }
            let Some(package) = package_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            for file in sorted_entries(&msg_dir)? {
                if file.extension().and_then(|e| e.to_str()) != Some("msg") {
                    continue;
                }
                let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let text = std::fs::read_to_string(&file)
                    .map_err(|e| BagError::io(file.display().to_string(), e))?;
                match self.register_definition(&format!("{package}/msg/{stem}"), &text) {
                    Ok(_) => loaded += 1,
                    Err(err) => warn!(
                        file = %file.display(),
                        error = %err,
                        "Skipping unparsable message definition"
                    ),
                }
            }
        }
        debug!(dir = %share_dir.display(), loaded, "Loaded message definitions");
        Ok(loaded)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.read().contains_key(&canonical_type_name(type_name, None))
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Collect `type_name` and everything it references.
    ///
    /// Fails with `UnknownMessageType` naming the first type that is not
    /// registered, whether it is the root or a nested dependency.
    pub fn schema(&self, type_name: &str) -> Result<MessageSchema> {
        let root = canonical_type_name(type_name, None);
        let types = self.read();
        let mut schema = MessageSchema::new(root.clone());
        let mut pending = vec![root];
        let mut seen = HashSet::new();

        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let msg_type = types
                .get(&name)
                .ok_or_else(|| BagError::unknown_type(&name))?;
            pending.extend(msg_type.dependencies().map(str::to_string));
            schema.add_type(msg_type.clone());
        }
        Ok(schema)
    }
}

impl SchemaRegistry for MsgRegistry {
    fn resolve(&self, schema_type: &str) -> Result<Box<dyn MessageDecoder>> {
        let schema = self.schema(schema_type)?;
        Ok(Box::new(CdrDecoder::new(schema)?))
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| BagError::io(dir.display().to_string(), e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BagError::io(dir.display().to_string(), e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CodecValue;

    #[test]
    fn test_builtins_resolve() {
        let registry = MsgRegistry::with_builtins().unwrap();
        assert!(registry.contains("std_msgs/Header"));
        let schema = registry.schema("geometry_msgs/msg/PoseStamped").unwrap();
        for dep in [
            "std_msgs/msg/Header",
            "builtin_interfaces/msg/Time",
            "geometry_msgs/msg/Pose",
            "geometry_msgs/msg/Point",
            "geometry_msgs/msg/Quaternion",
        ] {
            assert!(schema.get_type(dep).is_some(), "missing {dep}");
        }
    }

    #[test]
    fn test_unknown_root_and_nested() {
        let registry = MsgRegistry::new();
        let err = registry.resolve("pkg/msg/Missing").err().unwrap();
        assert!(matches!(err, BagError::UnknownMessageType { ref type_name } if type_name == "pkg/msg/Missing"));

        registry
            .register_definition("pkg/msg/Outer", "pkg/Inner inner\n")
            .unwrap();
        let err = registry.resolve("pkg/msg/Outer").err().unwrap();
        assert!(matches!(err, BagError::UnknownMessageType { ref type_name } if type_name == "pkg/msg/Inner"));
    }

    #[test]
    fn test_register_definition_and_decode() {
        let registry = MsgRegistry::with_builtins().unwrap();
        let name = registry
            .register_definition("demo/Reading", "std_msgs/Header header\nfloat32 value\n")
            .unwrap();
        assert_eq!(name, "demo/msg/Reading");

        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[4, 0, 0, 0, b'm', b'a', b'p', 0]);
        data.extend_from_slice(&0.5f32.to_le_bytes());

        let decoder = registry.resolve("demo/msg/Reading").unwrap();
        let msg = decoder.decode(&data).unwrap();
        assert_eq!(msg["value"], CodecValue::Float32(0.5));
        let frame = CodecValue::Struct(msg.clone());
        assert_eq!(
            frame.get_path("header.frame_id").and_then(|v| v.as_str()),
            Some("map")
        );
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let msg_dir = dir.path().join("demo_msgs").join("msg");
        std::fs::create_dir_all(&msg_dir).unwrap();
        std::fs::write(msg_dir.join("Ping.msg"), "uint32 seq\nPong reply\n").unwrap();
        std::fs::write(msg_dir.join("Pong.msg"), "string text\n").unwrap();
        std::fs::write(msg_dir.join("Broken.msg"), "uint32 [ x\n").unwrap();
        std::fs::write(msg_dir.join("README.md"), "not a message").unwrap();

        let registry = MsgRegistry::new();
        assert_eq!(registry.load_directory(dir.path()).unwrap(), 2);
        assert_eq!(
            registry.type_names(),
            vec!["demo_msgs/msg/Ping", "demo_msgs/msg/Pong"]
        );
        assert!(registry.resolve("demo_msgs/msg/Ping").is_ok());
    }

    #[test]
    fn test_load_prefixes_skips_unreadable_share() {
        let broken = tempfile::tempdir().unwrap();
        let bad_msg_dir = broken.path().join("share").join("bad_msgs").join("msg");
        // A directory named like a definition cannot be read as text.
        std::fs::create_dir_all(bad_msg_dir.join("Bad.msg")).unwrap();

        let good = tempfile::tempdir().unwrap();
        let msg_dir = good.path().join("share").join("demo_msgs").join("msg");
        std::fs::create_dir_all(&msg_dir).unwrap();
        std::fs::write(msg_dir.join("Pong.msg"), "string text\n").unwrap();

        let missing = good.path().join("not_installed");
        let registry = MsgRegistry::new();
        assert!(registry.load_directory(&broken.path().join("share")).is_err());
        let loaded = registry.load_prefixes([broken.path(), missing.as_path(), good.path()]);
        assert_eq!(loaded, 1);
        assert_eq!(registry.type_names(), vec!["demo_msgs/msg/Pong"]);
    }
}
