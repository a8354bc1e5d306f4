//! Contract call encoding against a JSON interface definition.
//!
//! # Responsibilities
//! - Resolve a function by name in a `JsonAbi`, picking the overload whose
//!   arity and parameter types fit the arguments
//! - Check typed arguments against the declared parameter types
//! - Produce `selector ++ abi_encode(args)` with the standard head/tail layout
//! - Coerce opaque JSON/YAML arguments into typed values
//! - Decode a payload back into arguments

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi, Param};
use alloy::primitives::Bytes;
use serde_json::Value;

use crate::blockchain::types::{DispatchError, DispatchResult};

/// Overloads of `name` taking exactly `arity` arguments, in interface order.
pub fn find_overloads<'a>(
    abi: &'a JsonAbi,
    name: &str,
    arity: usize,
) -> DispatchResult<Vec<&'a Function>> {
    let overloads = abi.function(name).ok_or_else(|| {
        DispatchError::Encoding(format!("function '{}' not found in interface", name))
    })?;

    let candidates: Vec<&Function> = overloads.iter().filter(|f| f.inputs.len() == arity).collect();
    if candidates.is_empty() {
        let expected: Vec<String> = overloads.iter().map(|f| f.inputs.len().to_string()).collect();
        return Err(DispatchError::Encoding(format!(
            "function '{}' takes {} argument(s), got {}",
            name,
            expected.join(" or "),
            arity
        )));
    }
    Ok(candidates)
}

/// Encode a call to `function` with typed arguments.
///
/// Among overloads of the same arity, the first whose parameter types accept
/// `args` is used. The output is deterministic: the same interface, function
/// and arguments always yield the same bytes.
pub fn encode_call(abi: &JsonAbi, function: &str, args: &[DynSolValue]) -> DispatchResult<Bytes> {
    let candidates = find_overloads(abi, function, args.len())?;
    first_accepting(candidates, |func| encode_typed(func, args))
}

/// Encode a call from untyped JSON arguments.
///
/// Overloads are tried in interface order; the first one the arguments
/// coerce into wins.
pub fn encode_call_json(abi: &JsonAbi, function: &str, args: &[Value]) -> DispatchResult<Bytes> {
    let candidates = find_overloads(abi, function, args.len())?;
    first_accepting(candidates, |func| {
        let values = coerce_args(func, args)?;
        encode_typed(func, &values)
    })
}

// Returns the first success, or the error of the first candidate.
fn first_accepting<'a, T>(
    candidates: Vec<&'a Function>,
    mut attempt: impl FnMut(&'a Function) -> DispatchResult<T>,
) -> DispatchResult<T> {
    let mut first_err = None;
    for func in candidates {
        match attempt(func) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.unwrap_or_else(|| {
        DispatchError::Encoding("no overload left to encode against".to_string())
    }))
}

fn encode_typed(func: &Function, args: &[DynSolValue]) -> DispatchResult<Bytes> {
    for (index, (param, value)) in func.inputs.iter().zip(args).enumerate() {
        let ty = resolve_param(param)?;
        if !ty.matches(value) {
            return Err(DispatchError::Encoding(format!(
                "argument {} ('{}') of {} expects {}",
                index,
                param.name,
                func.signature(),
                ty.sol_type_name()
            )));
        }
    }

    let data = func
        .abi_encode_input(args)
        .map_err(|e| DispatchError::Encoding(format!("{}: {}", func.signature(), e)))?;

    Ok(Bytes::from(data))
}

/// Decode a call payload produced for `function`.
///
/// The selector must match one of the function's overloads.
pub fn decode_call(
    abi: &JsonAbi,
    function: &str,
    payload: &[u8],
) -> DispatchResult<Vec<DynSolValue>> {
    let overloads = abi.function(function).ok_or_else(|| {
        DispatchError::Encoding(format!("function '{}' not found in interface", function))
    })?;

    if payload.len() < 4 {
        return Err(DispatchError::Encoding(format!(
            "payload of {} bytes has no selector",
            payload.len()
        )));
    }
    let (selector, body) = payload.split_at(4);

    let func = overloads
        .iter()
        .find(|f| f.selector().as_slice() == selector)
        .ok_or_else(|| {
            DispatchError::Encoding(format!("selector does not belong to '{}'", function))
        })?;

    func.abi_decode_input(body)
        .map_err(|e| DispatchError::Encoding(format!("{}: {}", func.signature(), e)))
}

/// Convert JSON arguments into typed values following the function's inputs.
///
/// Tuples accept a positional array or an object keyed by component name.
/// Scalars are coerced from their textual form, so numbers may be given as
/// JSON numbers or decimal/hex strings.
pub fn coerce_args(func: &Function, args: &[Value]) -> DispatchResult<Vec<DynSolValue>> {
    if args.len() != func.inputs.len() {
        return Err(DispatchError::Encoding(format!(
            "{} takes {} argument(s), got {}",
            func.signature(),
            func.inputs.len(),
            args.len()
        )));
    }

    func.inputs
        .iter()
        .zip(args)
        .map(|(param, value)| {
            let ty = resolve_param(param)?;
            coerce_value(&ty, &param.components, value).map_err(|msg| {
                DispatchError::Encoding(format!("argument '{}': {}", param.name, msg))
            })
        })
        .collect()
}

// Resolved from the canonical type string so tuples stay plain tuples.
fn resolve_param(param: &Param) -> DispatchResult<DynSolType> {
    let canonical = param.selector_type();
    DynSolType::parse(&canonical).map_err(|e| {
        DispatchError::Encoding(format!("unsupported parameter type '{}': {}", canonical, e))
    })
}

fn coerce_value(
    ty: &DynSolType,
    components: &[Param],
    value: &Value,
) -> Result<DynSolValue, String> {
    match ty {
        DynSolType::Array(inner) => {
            let items = value
                .as_array()
                .ok_or_else(|| format!("expected {}, got {}", ty.sol_type_name(), value))?;
            items
                .iter()
                .map(|item| coerce_value(inner, components, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Array)
        }
        DynSolType::FixedArray(inner, len) => {
            let items = value
                .as_array()
                .ok_or_else(|| format!("expected {}, got {}", ty.sol_type_name(), value))?;
            if items.len() != *len {
                return Err(format!("expected {} elements, got {}", len, items.len()));
            }
            items
                .iter()
                .map(|item| coerce_value(inner, components, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        DynSolType::Tuple(types) => {
            let fields: Vec<&Value> = match value {
                Value::Array(items) if items.len() == types.len() => items.iter().collect(),
                Value::Array(items) => {
                    return Err(format!(
                        "expected {} tuple fields, got {}",
                        types.len(),
                        items.len()
                    ))
                }
                Value::Object(map) if components.len() == types.len() => components
                    .iter()
                    .map(|c| map.get(&c.name).ok_or_else(|| format!("missing field '{}'", c.name)))
                    .collect::<Result<_, _>>()?,
                other => return Err(format!("expected {}, got {}", ty.sol_type_name(), other)),
            };

            types
                .iter()
                .zip(fields)
                .enumerate()
                .map(|(i, (field_ty, field))| {
                    let nested = components.get(i).map(|c| c.components.as_slice()).unwrap_or(&[]);
                    coerce_value(field_ty, nested, field)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        _ => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => return Err(format!("expected {}, got {}", ty.sol_type_name(), other)),
            };
            ty.coerce_str(&text).map_err(|e| e.to_string())
        }
    }
}
