//! In-memory collaborators for tests and simulation.
//!
//! Each mock is a cheap handle over shared state: clone it, hand one copy to
//! the `Node`, and keep the other to drive inputs or inspect outputs.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use alarm_traits::{Buzzer, MotionSensor, RemoteStore, StatusLed, TimeOfDay, WallClock};

use crate::annunciator::BuzzerOutput;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Raw JSON object text.
    Json(String),
}

#[derive(Debug)]
struct StoreInner {
    values: BTreeMap<String, Value>,
    ready: bool,
    fail_reads: bool,
    fail_writes: bool,
    writes: Vec<(String, Option<Value>)>,
}

/// Path-addressed store held in memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A ready, empty store.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                values: BTreeMap::new(),
                ready: true,
                fail_reads: false,
                fail_writes: false,
                writes: Vec::new(),
            })),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.borrow_mut().ready = ready;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    pub fn put_bool(&self, path: &str, v: bool) {
        self.put(path, Value::Bool(v));
    }

    pub fn put_int(&self, path: &str, v: i64) {
        self.put(path, Value::Int(v));
    }

    pub fn put_json(&self, path: &str, json: &str) {
        self.put(path, Value::Json(json.to_string()));
    }

    pub fn put(&self, path: &str, v: Value) {
        self.inner.borrow_mut().values.insert(path.to_string(), v);
    }

    pub fn value(&self, path: &str) -> Option<Value> {
        self.inner.borrow().values.get(path).cloned()
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        match self.value(path) {
            Some(Value::Bool(b)) => Some(b),
            _ => None,
        }
    }

    pub fn string_at(&self, path: &str) -> Option<String> {
        match self.value(path) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Paths currently stored under `prefix`.
    pub fn keys_under(&self, prefix: &str) -> Vec<String> {
        self.inner
            .borrow()
            .values
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Every successful write, in order. Deletes are recorded as `None`.
    pub fn writes(&self) -> Vec<(String, Option<Value>)> {
        self.inner.borrow().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.inner.borrow_mut().writes.clear();
    }

    fn read(&self, path: &str) -> Result<Option<Value>, BoxError> {
        let inner = self.inner.borrow();
        if !inner.ready {
            return Err("remote store not ready".into());
        }
        if inner.fail_reads {
            return Err("injected read failure".into());
        }
        Ok(inner.values.get(path).cloned())
    }

    fn write(&mut self, path: &str, v: Option<Value>) -> Result<(), BoxError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.ready {
            return Err("remote store not ready".into());
        }
        if inner.fail_writes {
            return Err("injected write failure".into());
        }
        match &v {
            Some(val) => {
                inner.values.insert(path.to_string(), val.clone());
            }
            None => {
                let child_prefix = format!("{path}/");
                inner
                    .values
                    .retain(|k, _| k != path && !k.starts_with(&child_prefix));
            }
        }
        inner.writes.push((path.to_string(), v));
        Ok(())
    }
}

fn type_mismatch(path: &str, want: &str) -> BoxError {
    format!("type mismatch at {path}: expected {want}").into()
}

impl RemoteStore for MemoryStore {
    fn is_ready(&self) -> bool {
        self.inner.borrow().ready
    }

    fn get_bool(&mut self, path: &str) -> Result<Option<bool>, BoxError> {
        match self.read(path)? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(_) => Err(type_mismatch(path, "bool")),
        }
    }

    fn get_int(&mut self, path: &str) -> Result<Option<i64>, BoxError> {
        match self.read(path)? {
            None => Ok(None),
            Some(Value::Int(i)) => Ok(Some(i)),
            Some(_) => Err(type_mismatch(path, "int")),
        }
    }

    fn get_string(&mut self, path: &str) -> Result<Option<String>, BoxError> {
        match self.read(path)? {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(_) => Err(type_mismatch(path, "string")),
        }
    }

    fn get_json(&mut self, path: &str) -> Result<Option<String>, BoxError> {
        match self.read(path)? {
            None => Ok(None),
            Some(Value::Json(s)) => Ok(Some(s)),
            Some(_) => Err(type_mismatch(path, "json")),
        }
    }

    fn set_bool(&mut self, path: &str, value: bool) -> Result<(), BoxError> {
        self.write(path, Some(Value::Bool(value)))
    }

    fn set_int(&mut self, path: &str, value: i64) -> Result<(), BoxError> {
        self.write(path, Some(Value::Int(value)))
    }

    fn set_string(&mut self, path: &str, value: &str) -> Result<(), BoxError> {
        self.write(path, Some(Value::Str(value.to_string())))
    }

    fn delete_node(&mut self, path: &str) -> Result<(), BoxError> {
        self.write(path, None)
    }
}

/// Motion line whose level is set by the test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    level: Rc<Cell<bool>>,
    failing: Rc<Cell<bool>>,
}

impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, high: bool) {
        self.level.set(high);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl MotionSensor for ScriptedSensor {
    fn read(&mut self) -> Result<bool, BoxError> {
        if self.failing.get() {
            return Err("sensor read failed".into());
        }
        Ok(self.level.get())
    }
}

/// Buzzer that records every output written to it.
#[derive(Debug, Clone, Default)]
pub struct RecordingBuzzer {
    log: Rc<RefCell<Vec<BuzzerOutput>>>,
}

impl RecordingBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<BuzzerOutput> {
        self.log.borrow().clone()
    }

    pub fn last(&self) -> Option<BuzzerOutput> {
        self.log.borrow().last().copied()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Buzzer for RecordingBuzzer {
    fn tone(&mut self, hz: u32) -> Result<(), BoxError> {
        self.log.borrow_mut().push(BuzzerOutput::Tone(hz));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        self.log.borrow_mut().push(BuzzerOutput::Off);
        Ok(())
    }
}

/// LED that remembers its level.
#[derive(Debug, Clone, Default)]
pub struct RecordingLed {
    on: Rc<Cell<bool>>,
}

impl RecordingLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on.get()
    }
}

impl StatusLed for RecordingLed {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        self.on.set(on);
        Ok(())
    }
}

/// Wall clock pinned to a settable time; unsynchronized until `set` is called.
#[derive(Debug, Clone, Default)]
pub struct FixedWallClock {
    now: Rc<Cell<Option<(TimeOfDay, i64)>>>,
}

impl FixedWallClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(hour: u8, minute: u8) -> Self {
        let c = Self::new();
        c.set(hour, minute);
        c
    }

    /// Set local time; the epoch value is derived from an arbitrary fixed day.
    pub fn set(&self, hour: u8, minute: u8) {
        if let Some(tod) = TimeOfDay::new(hour, minute) {
            let epoch = 1_767_225_600 + i64::from(tod.minutes_of_day()) * 60;
            self.now.set(Some((tod, epoch)));
        }
    }

    pub fn unsync(&self) {
        self.now.set(None);
    }
}

impl WallClock for FixedWallClock {
    fn time_of_day(&self) -> Option<TimeOfDay> {
        self.now.get().map(|(t, _)| t)
    }

    fn unix_seconds(&self) -> Option<i64> {
        self.now.get().map(|(_, s)| s)
    }
}
