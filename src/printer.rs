use crate::heap::Arena;
use crate::value::Value;

/// Significant digits used for numbers, as in C's `%.10g`.
const PRECISION: usize = 10;

/// Print a value to a string.
pub fn print_val(val: Value, arena: &Arena) -> String {
    let mut out = String::new();
    print_inner(val, arena, &mut out, 0);
    out
}

fn print_inner(val: Value, arena: &Arena, out: &mut String, depth: usize) {
    if depth > 1000 {
        out.push_str("...");
        return;
    }

    match val {
        Value::Nil => out.push_str("()"),
        Value::Number(n) => out.push_str(&format_number(n)),
        Value::Atom(id) => out.push_str(arena.atom_name(id)),
        Value::Prim(_) => out.push_str("<primitive>"),
        Value::Closure(id) => out.push_str(&format!("{{closure {}}}", id.0)),
        Value::Cons(_) => {
            out.push('(');
            let mut current = val;
            loop {
                print_inner(arena.car(current), arena, out, depth + 1);
                current = arena.cdr(current);
                match current {
                    Value::Nil => break,
                    Value::Cons(_) => out.push(' '),
                    _ => {
                        out.push_str(" . ");
                        print_inner(current, arena, out, depth + 1);
                        break;
                    }
                }
            }
            out.push(')');
        }
    }
}

/// Format a number like C's `%.10g`: ten significant digits, trailing
/// zeros dropped, exponent form below 1e-4 and from 1e10 up.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.into();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.into();
    }

    // The exponent comes from the rounded scientific form, so 9999999999.5
    // is printed as 1e+10 rather than with eleven digits.
    let sci = format!("{:.*e}", PRECISION - 1, n);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
