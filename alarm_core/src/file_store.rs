//! `RemoteStore` backed by a JSON document on disk.
//!
//! Paths are `/`-separated keys into nested objects, so
//! `devices/n1/status/armed` addresses `doc["devices"]["n1"]["status"]["armed"]`.
//! The file is re-read on every access and rewritten atomically on every
//! change, which lets an operator drive a running node by editing the file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use alarm_traits::RemoteStore;
use serde_json::{Map, Value};

use crate::atomic::write_atomic;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole document. A missing or empty file is an empty object.
    pub fn load(&self) -> Result<Value, BoxError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Value::Object(Map::new())),
            Err(e) => return Err(Box::new(e)),
        };
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        let doc: Value = serde_json::from_str(&text)?;
        if !doc.is_object() {
            return Err(format!("{}: top level must be a JSON object", self.path.display()).into());
        }
        Ok(doc)
    }

    fn save(&self, doc: &Value) -> Result<(), BoxError> {
        let mut bytes = serde_json::to_vec_pretty(doc)?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }

    fn lookup(&self, path: &str) -> Result<Option<Value>, BoxError> {
        let doc = self.load()?;
        let mut cur = &doc;
        for key in segments(path) {
            match cur.get(key) {
                Some(next) => cur = next,
                None => return Ok(None),
            }
        }
        Ok(match cur {
            Value::Null => None,
            v => Some(v.clone()),
        })
    }

    fn update(&self, path: &str, value: Option<Value>) -> Result<(), BoxError> {
        let keys: Vec<&str> = segments(path).collect();
        let Some((leaf, parents)) = keys.split_last() else {
            return Err("empty store path".into());
        };
        let mut doc = self.load()?;
        let mut cur = &mut doc;
        for key in parents {
            let map = cur
                .as_object_mut()
                .ok_or_else(|| format!("{path}: parent is not an object"))?;
            let next = map
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !next.is_object() {
                if value.is_none() {
                    return Ok(());
                }
                *next = Value::Object(Map::new());
            }
            cur = next;
        }
        let map = cur
            .as_object_mut()
            .ok_or_else(|| format!("{path}: parent is not an object"))?;
        match value {
            Some(v) => {
                map.insert((*leaf).to_string(), v);
            }
            None => {
                if map.remove(*leaf).is_none() {
                    return Ok(());
                }
            }
        }
        self.save(&doc)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn mismatch(path: &str, want: &str, got: &Value) -> BoxError {
    format!("type mismatch at {path}: expected {want}, found {got}").into()
}

impl RemoteStore for JsonFileStore {
    fn is_ready(&self) -> bool {
        self.load().is_ok()
    }

    fn get_bool(&mut self, path: &str) -> Result<Option<bool>, BoxError> {
        match self.lookup(path)? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(v) => Err(mismatch(path, "bool", &v)),
        }
    }

    fn get_int(&mut self, path: &str) -> Result<Option<i64>, BoxError> {
        match self.lookup(path)? {
            None => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| mismatch(path, "integer", &v)),
        }
    }

    fn get_string(&mut self, path: &str) -> Result<Option<String>, BoxError> {
        match self.lookup(path)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(v) => Err(mismatch(path, "string", &v)),
        }
    }

    fn get_json(&mut self, path: &str) -> Result<Option<String>, BoxError> {
        match self.lookup(path)? {
            None => Ok(None),
            Some(v) => Ok(Some(serde_json::to_string(&v)?)),
        }
    }

    fn set_bool(&mut self, path: &str, value: bool) -> Result<(), BoxError> {
        self.update(path, Some(Value::Bool(value)))
    }

    fn set_int(&mut self, path: &str, value: i64) -> Result<(), BoxError> {
        self.update(path, Some(Value::from(value)))
    }

    fn set_string(&mut self, path: &str, value: &str) -> Result<(), BoxError> {
        self.update(path, Some(Value::String(value.to_string())))
    }

    fn delete_node(&mut self, path: &str) -> Result<(), BoxError> {
        self.update(path, None)
    }
}
