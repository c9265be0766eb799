//! Rule Engine Core - boolean business rules as text
//!
//! Parses rules like `age > 30 AND status = 'active'` into an AST, evaluates
//! them against records, combines several rules with AND and renders the
//! result back to text. Python bindings are provided via PyO3.

use pyo3::prelude::*;

pub mod config;
pub mod engine;
pub mod error;
pub mod rule;
pub mod store;

use crate::config::EngineConfig;
use crate::engine::{evaluate_json, RuleEngine};
use crate::error::RuleEngineError;
use crate::rule::{Node, MAX_DEPTH};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::sync::Arc;

// ============================================================================
// Shared Engine
// ============================================================================

/// Global engine holding stored rules and the parse cache
static ENGINE: OnceCell<RwLock<Arc<RuleEngine>>> = OnceCell::new();

fn current_engine() -> PyResult<Arc<RuleEngine>> {
    ENGINE
        .get()
        .map(|engine| engine.read().clone())
        .ok_or_else(|| PyRuntimeError::new_err("Engine not initialized. Call init_engine() first."))
}

/// Limits of the shared engine, or the defaults before `init_engine`
fn current_config() -> EngineConfig {
    ENGINE
        .get()
        .map(|engine| engine.read().config().clone())
        .unwrap_or_default()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a Python value (None, bool, int, float, str, list, tuple, dict) to JSON
fn py_to_json(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    py_to_json_nested(obj, 1)
}

fn py_to_json_nested(obj: &Bound<'_, PyAny>, depth: usize) -> PyResult<Value> {
    if depth > MAX_DEPTH {
        return Err(PyValueError::new_err(format!(
            "Value nests deeper than {} levels",
            MAX_DEPTH
        )));
    }

    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool before int: Python's bool is an int subclass
    if let Ok(flag) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(flag.is_true()));
    }
    if obj.is_instance_of::<PyInt>() {
        if let Ok(n) = obj.extract::<i64>() {
            return Ok(Value::from(n));
        }
        if let Ok(n) = obj.extract::<u64>() {
            return Ok(Value::from(n));
        }
        return Err(PyValueError::new_err(format!(
            "Integer {} does not fit in 64 bits",
            obj
        )));
    }
    if let Ok(float) = obj.downcast::<PyFloat>() {
        return Number::from_f64(float.value())
            .map(Value::Number)
            .ok_or_else(|| PyValueError::new_err(format!("Float {} is not finite", obj)));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(Value::String(obj.extract()?));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut map = Map::new();
        for (key, value) in dict.iter() {
            let key: String = key.extract().map_err(|_| {
                PyTypeError::new_err(format!("Dict keys must be str, got {}", key.get_type()))
            })?;
            map.insert(key, py_to_json_nested(&value, depth + 1)?);
        }
        return Ok(Value::Object(map));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list
            .iter()
            .map(|item| py_to_json_nested(&item, depth + 1))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple
            .iter()
            .map(|item| py_to_json_nested(&item, depth + 1))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array);
    }

    Err(PyTypeError::new_err(format!(
        "Unsupported value type: {}",
        obj.get_type()
    )))
}

fn json_to_py<'py, T: Serialize>(py: Python<'py>, value: &T) -> PyResult<Bound<'py, PyAny>> {
    let value = serde_json::to_value(value).map_err(RuleEngineError::from)?;
    value_to_py(py, &value)
}

fn value_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    let obj = match value {
        Value::Null => py.None().into_bound(py),
        Value::Bool(flag) => PyBool::new(py, *flag).to_owned().into_any(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.into_pyobject(py)?.into_any(),
            (None, Some(u)) => u.into_pyobject(py)?.into_any(),
            _ => PyFloat::new(py, n.as_f64().unwrap_or_default()).into_any(),
        },
        Value::String(text) => PyString::new(py, text).into_any(),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(value_to_py(py, item)?)?;
            }
            list.into_any()
        }
        Value::Object(map) => {
            let dict = PyDict::new(py);
            for (key, item) in map {
                dict.set_item(key, value_to_py(py, item)?)?;
            }
            dict.into_any()
        }
    };
    Ok(obj)
}

/// Records must be dicts with str keys
fn record_from_py(data: &Bound<'_, PyAny>) -> PyResult<Map<String, Value>> {
    match py_to_json(data)? {
        Value::Object(map) => Ok(map),
        _ => Err(PyTypeError::new_err("data must be a dict")),
    }
}

// ============================================================================
// Stateless Functions
// ============================================================================

/// Parse a rule string into its AST dict
///
/// The length limit is the shared engine's, or the default before `init_engine`.
///
/// # Raises
/// ValueError if the rule cannot be parsed or is too long
#[pyfunction]
fn parse_rule<'py>(py: Python<'py>, rule_string: &str) -> PyResult<Bound<'py, PyAny>> {
    current_config()
        .check_length(rule_string)
        .map_err(RuleEngineError::from)?;
    let ast = rule::parse(rule_string).map_err(RuleEngineError::from)?;
    json_to_py(py, &ast)
}

/// Evaluate an AST dict against a data dict
#[pyfunction]
fn evaluate_ast(ast: &Bound<'_, PyAny>, data: &Bound<'_, PyAny>) -> PyResult<bool> {
    let record = record_from_py(data)?;
    Ok(evaluate_json(&py_to_json(ast)?, &record)?)
}

/// Combine rule strings with AND and return the AST dict
#[pyfunction]
fn combine<'py>(py: Python<'py>, rules: Vec<String>) -> PyResult<Bound<'py, PyAny>> {
    let config = current_config();
    for text in &rules {
        config.check_length(text).map_err(RuleEngineError::from)?;
    }
    let ast = rule::combine(rules.as_slice())?;
    json_to_py(py, &ast)
}

/// Render an AST dict back to fully parenthesized rule text
#[pyfunction]
fn ast_to_string(ast: &Bound<'_, PyAny>) -> PyResult<String> {
    let node = Node::from_json(&py_to_json(ast)?)?;
    Ok(node.to_string())
}

// ============================================================================
// Engine Functions
// ============================================================================

/// Initialize the shared engine (call once at startup)
///
/// Calling it again replaces the engine and drops every stored rule.
///
/// # Arguments
/// * `config` - Optional dict with `cache_capacity` and `max_rule_length`
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_engine(config: Option<&Bound<'_, PyDict>>) -> PyResult<()> {
    let config = match config {
        Some(dict) => {
            let text = py_to_json(dict.as_any())?.to_string();
            EngineConfig::from_json(&text)?
        }
        None => EngineConfig::default(),
    };

    let engine = Arc::new(RuleEngine::new(config));

    if let Some(existing) = ENGINE.get() {
        *existing.write() = engine;
    } else {
        let _ = ENGINE.set(RwLock::new(engine));
    }

    Ok(())
}

/// Check if the engine is initialized
#[pyfunction]
fn is_engine_initialized() -> bool {
    ENGINE.get().is_some()
}

/// Parse and store a rule, returning its id
#[pyfunction]
fn create_rule(name: &str, rule_string: &str) -> PyResult<u64> {
    Ok(current_engine()?.create_rule(name, rule_string)?)
}

/// All stored rules as dicts, ordered by id
#[pyfunction]
fn list_rules(py: Python<'_>) -> PyResult<Bound<'_, PyAny>> {
    json_to_py(py, &current_engine()?.list_rules())
}

/// One stored rule as a dict
///
/// # Raises
/// KeyError if no rule has this id
#[pyfunction]
fn get_rule(py: Python<'_>, rule_id: u64) -> PyResult<Bound<'_, PyAny>> {
    json_to_py(py, &current_engine()?.get_rule(rule_id)?)
}

#[pyfunction]
fn delete_rule(rule_id: u64) -> PyResult<()> {
    Ok(current_engine()?.delete_rule(rule_id)?)
}

/// Evaluate a stored rule against a data dict
#[pyfunction]
fn evaluate_rule(rule_id: u64, data: &Bound<'_, PyAny>) -> PyResult<bool> {
    let record = record_from_py(data)?;
    Ok(current_engine()?.evaluate_rule(rule_id, &record)?)
}

/// Evaluate a stored rule asynchronously
///
/// Evaluation runs on Tokio's blocking pool so the asyncio loop stays responsive.
///
/// # Example (Python)
/// ```python
/// ok = await evaluate_rule_async(rule_id, {"age": 35, "status": "active"})
/// ```
#[pyfunction]
fn evaluate_rule_async<'py>(
    py: Python<'py>,
    rule_id: u64,
    data: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyAny>> {
    // Resolve engine and record while holding the GIL
    let engine = current_engine()?;
    let record = record_from_py(data)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let result = tokio::task::spawn_blocking(move || engine.evaluate_rule(rule_id, &record))
            .await
            .map_err(|e| PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e)))??;

        Ok(result)
    })
}

/// Combine stored rules with AND and store the result under `name`
///
/// # Raises
/// KeyError if any id is unknown, ValueError if `rule_ids` is empty
#[pyfunction]
fn combine_rules(rule_ids: Vec<u64>, name: &str) -> PyResult<u64> {
    Ok(current_engine()?.combine_rules(&rule_ids, name)?)
}

/// Text of the stored rules combined with AND, without saving it
#[pyfunction]
fn preview_combined_rules(rule_ids: Vec<u64>) -> PyResult<String> {
    Ok(current_engine()?.preview_combined(&rule_ids)?)
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_ast, m)?)?;
    m.add_function(wrap_pyfunction!(combine, m)?)?;
    m.add_function(wrap_pyfunction!(ast_to_string, m)?)?;
    m.add_function(wrap_pyfunction!(init_engine, m)?)?;
    m.add_function(wrap_pyfunction!(is_engine_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(create_rule, m)?)?;
    m.add_function(wrap_pyfunction!(list_rules, m)?)?;
    m.add_function(wrap_pyfunction!(get_rule, m)?)?;
    m.add_function(wrap_pyfunction!(delete_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule_async, m)?)?;
    m.add_function(wrap_pyfunction!(combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(preview_combined_rules, m)?)?;
    Ok(())
}
