//! Template rendering.
//!
//! Fixtures use `tera` syntax. The engine has no shift or mask operators,
//! so the bit-extraction arithmetic fixtures rely on is provided as
//! filters: `shr`, `shl`, `band`, `bor` and `hex`. A 64-bit constant is
//! typically split like this:
//!
//! ```text
//! set0 r5, r0, {{ value | shr(n=48) | band(n=65535) | hex }}
//! ```

use std::collections::{BTreeMap, HashMap};

use tera::{Context, Tera, Value};

use crate::GenError;

const TEMPLATE_NAME: &str = "fixture";

/// Render an assembly template with `parameters` bound as integer
/// variables. Unknown placeholders are errors.
pub fn render_template(
    template: &str,
    parameters: &BTreeMap<String, u64>,
) -> Result<String, GenError> {
    let mut tera = Tera::default();
    tera.register_filter("shr", shr);
    tera.register_filter("shl", shl);
    tera.register_filter("band", band);
    tera.register_filter("bor", bor);
    tera.register_filter("hex", hex);
    tera.add_raw_template(TEMPLATE_NAME, template)?;

    let mut context = Context::new();
    for (key, value) in parameters {
        context.insert(key.as_str(), value);
    }

    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

/// Render a template, then assemble the result at `base_addr`.
pub fn assemble_template(
    base_addr: u32,
    template: &str,
    parameters: &BTreeMap<String, u64>,
) -> Result<(Vec<u8>, BTreeMap<String, u32>), GenError> {
    let source = render_template(template, parameters)?;
    tracing::debug!(?parameters, "rendered fixture");
    Ok(irisc_asm::assemble(base_addr, &source)?)
}

fn int_value(value: &Value) -> tera::Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| tera::Error::msg("filter expects a non-negative integer input"))
}

fn int_arg(args: &HashMap<String, Value>, name: &str) -> tera::Result<u64> {
    args.get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg(format!("filter expects an integer `{name}` argument")))
}

fn shr(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let n = int_arg(args, "n")?;
    Ok(Value::from(
        int_value(value)?.checked_shr(n as u32).unwrap_or(0),
    ))
}

fn shl(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let n = int_arg(args, "n")?;
    Ok(Value::from(
        int_value(value)?.checked_shl(n as u32).unwrap_or(0),
    ))
}

fn band(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::from(int_value(value)? & int_arg(args, "n")?))
}

fn bor(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::from(int_value(value)? | int_arg(args, "n")?))
}

fn hex(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::from(format!("{:#x}", int_value(value)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn substitutes_plain_placeholders() {
        let rendered =
            render_template("addi r1, r0, {{ imm }}", &params(&[("imm", 42)])).unwrap();
        assert_eq!(rendered, "addi r1, r0, 42");
    }

    #[test]
    fn bit_extraction_filters() {
        let rendered = render_template(
            "set0 r5, r0, {{ v | shr(n=48) | band(n=65535) | hex }}",
            &params(&[("v", 0x8765_4321_1234_5678)]),
        )
        .unwrap();
        assert_eq!(rendered, "set0 r5, r0, 0x8765");
    }

    #[test]
    fn oversized_shift_clears() {
        let rendered =
            render_template("{{ v | shr(n=70) }}", &params(&[("v", 0xffff)])).unwrap();
        assert_eq!(rendered, "0");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = render_template("addi r1, r0, {{ missing }}", &params(&[])).unwrap_err();
        assert!(matches!(err, GenError::Template(_)));
    }

    #[test]
    fn renders_then_assembles() {
        let (code, _) = assemble_template(
            0,
            "addi r5, r0, {{ imm | hex }}",
            &params(&[("imm", 0x1234)]),
        )
        .unwrap();
        assert_eq!(code, 0x0005_1234u32.to_be_bytes());
    }
}
