//! Number conversions
//!
//! Number-to-string follows the shortest round-trip digit rule of the
//! language; string-to-number accepts the StringNumericLiteral grammar and
//! hands the validated decimal text to `lexical-core`.

use crate::lexer::{is_js_whitespace, is_line_terminator};

/// Format a number the way `String(n)` does
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };

    // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e-7"
    let sci = format!("{:e}", n.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return format!("{}", n),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exp + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        format!("{}.{}", &digits[..point as usize], &digits[point as usize..])
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let exp_sign = if point - 1 < 0 { "-" } else { "+" };
        if k == 1 {
            format!("{}e{}{}", digits, exp_sign, (point - 1).abs())
        } else {
            format!("{}.{}e{}{}", &digits[..1], &digits[1..], exp_sign, (point - 1).abs())
        }
    };
    format!("{}{}", sign, body)
}

/// Format a number in the given radix (2..=36), as `Number.prototype.toString`
pub fn number_to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let negative = n < 0.0;
    let n = n.abs();
    let mut int_part = n.trunc();
    let mut frac = n - int_part;

    let mut int_digits = Vec::new();
    if int_part == 0.0 {
        int_digits.push('0');
    }
    while int_part >= 1.0 {
        let d = (int_part % radix as f64) as u32;
        int_digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        int_part = (int_part / radix as f64).trunc();
    }
    int_digits.reverse();

    let mut out: String = int_digits.into_iter().collect();
    if frac > 0.0 {
        out.push('.');
        let mut count = 0;
        while frac > 0.0 && count < 52 {
            frac *= radix as f64;
            let d = frac.trunc() as u32;
            out.push(std::char::from_digit(d, radix).unwrap_or('0'));
            frac -= d as f64;
            count += 1;
        }
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// `Number.prototype.toFixed` for `0 <= digits <= 20`
pub fn number_to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    let x = n.abs();

    // Rust rounds exact ties to even; the language rounds them up
    let long = format!("{:.*}", digits + 25, x);
    let cut = if digits == 0 {
        long.find('.').unwrap_or(long.len())
    } else {
        long.find('.').map(|p| p + 1 + digits).unwrap_or(long.len())
    };
    let rest = long[cut..].trim_start_matches('.');
    let is_tie = rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0');

    let body = if is_tie {
        increment_decimal(&long[..cut])
    } else {
        format!("{:.*}", digits, x)
    };
    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

/// Add one unit in the last place to a plain decimal string
fn increment_decimal(s: &str) -> String {
    let mut bytes: Vec<u8> = s.bytes().collect();
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'.' => continue,
            b'9' => bytes[i] = b'0',
            d => {
                bytes[i] = d + 1;
                return String::from_utf8_lossy(&bytes).into_owned();
            }
        }
    }
    bytes.insert(0, b'1');
    String::from_utf8_lossy(&bytes).into_owned()
}

fn is_space(u: u16) -> bool {
    char::from_u32(u32::from(u)).is_some_and(|c| is_js_whitespace(c) || is_line_terminator(c))
}

/// Strip leading and trailing whitespace and line terminators
pub fn trim_units(units: &[u16]) -> &[u16] {
    let start = units.iter().position(|u| !is_space(*u)).unwrap_or(units.len());
    let end = units.iter().rposition(|u| !is_space(*u)).map_or(start, |p| p + 1);
    &units[start..end]
}

/// Longest prefix that forms a StrDecimalLiteral, with its value and length
pub fn scan_decimal_prefix(units: &[u16]) -> Option<(f64, usize)> {
    let at = |i: usize| units.get(i).and_then(|u| u8::try_from(*u).ok());
    let mut pos = 0;
    let mut negative = false;
    match at(0) {
        Some(b'+') => pos = 1,
        Some(b'-') => {
            negative = true;
            pos = 1;
        }
        _ => {}
    }
    let signed = |v: f64| if negative { -v } else { v };

    let infinity: Vec<u16> = "Infinity".encode_utf16().collect();
    if units[pos..].starts_with(&infinity) {
        return Some((signed(f64::INFINITY), pos + infinity.len()));
    }

    let int_start = pos;
    while matches!(at(pos), Some(b'0'..=b'9')) {
        pos += 1;
    }
    let int_digits = pos - int_start;
    let mut frac_digits = 0;
    let mut frac_start = pos;
    if at(pos) == Some(b'.') {
        frac_start = pos + 1;
        let mut p = frac_start;
        while matches!(at(p), Some(b'0'..=b'9')) {
            p += 1;
        }
        frac_digits = p - frac_start;
        if int_digits > 0 || frac_digits > 0 {
            pos = p;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    let mut exponent = String::new();
    if matches!(at(pos), Some(b'e' | b'E')) {
        let mut p = pos + 1;
        let mut exp_sign = "";
        match at(p) {
            Some(b'+') => p += 1,
            Some(b'-') => {
                exp_sign = "-";
                p += 1;
            }
            _ => {}
        }
        let exp_start = p;
        while matches!(at(p), Some(b'0'..=b'9')) {
            p += 1;
        }
        if p > exp_start {
            exponent = format!("e{}{}", exp_sign, ascii(&units[exp_start..p]));
            pos = p;
        }
    }

    let int_text = if int_digits > 0 {
        ascii(&units[int_start..int_start + int_digits])
    } else {
        "0".to_string()
    };
    let frac_text = if frac_digits > 0 {
        ascii(&units[frac_start..frac_start + frac_digits])
    } else {
        "0".to_string()
    };
    let text = format!("{}.{}{}", int_text, frac_text, exponent);
    let value = lexical_core::parse::<f64>(text.as_bytes()).ok()?;
    Some((signed(value), pos))
}

fn ascii(units: &[u16]) -> String {
    units.iter().map(|u| char::from(*u as u8)).collect()
}

/// ToNumber applied to a string
pub fn string_to_number(units: &[u16]) -> f64 {
    let s = trim_units(units);
    if s.is_empty() {
        return 0.0;
    }
    if s.len() > 2 && s[0] == u16::from(b'0') && (s[1] == u16::from(b'x') || s[1] == u16::from(b'X')) {
        let mut value = 0.0f64;
        for &u in &s[2..] {
            match char::from_u32(u32::from(u)).and_then(|c| c.to_digit(16)) {
                Some(d) => value = value * 16.0 + d as f64,
                None => return f64::NAN,
            }
        }
        return value;
    }
    match scan_decimal_prefix(s) {
        Some((value, len)) if len == s.len() => value,
        _ => f64::NAN,
    }
}

/// ToInteger: truncate toward zero, NaN becomes 0
pub fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else if n.is_infinite() {
        n
    } else {
        n.trunc()
    }
}

/// ToUint32: truncate and reduce modulo 2^32
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(4294967296.0);
    m as u32
}

/// ToInt32: ToUint32 reinterpreted as signed
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ToUint16: truncate and reduce modulo 2^16
pub fn to_uint16(n: f64) -> u16 {
    to_uint32(n) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> f64 {
        string_to_number(&s.encode_utf16().collect::<Vec<_>>())
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(123.456), "123.456");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(4294967295.0), "4294967295");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(num("  42  "), 42.0);
        assert_eq!(num(""), 0.0);
        assert_eq!(num("0x1F"), 31.0);
        assert_eq!(num(".5"), 0.5);
        assert_eq!(num("5."), 5.0);
        assert_eq!(num("-1e3"), -1000.0);
        assert_eq!(num("-Infinity"), f64::NEG_INFINITY);
        assert!(num("12px").is_nan());
        assert!(num(".").is_nan());
        assert!(num("-0x10").is_nan());
    }

    #[test]
    fn test_int_conversions() {
        assert_eq!(to_uint32(-1.0), 4294967295);
        assert_eq!(to_int32(4294967295.0), -1);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_uint32(f64::INFINITY), 0);
        assert_eq!(to_int32(2147483648.0), -2147483648);
        assert_eq!(to_uint32(4294967296.5), 0);
    }

    #[test]
    fn test_radix_and_fixed() {
        assert_eq!(number_to_radix_string(255.0, 16), "ff");
        assert_eq!(number_to_radix_string(-8.0, 2), "-1000");
        assert_eq!(number_to_radix_string(0.5, 2), "0.1");
        assert_eq!(number_to_fixed(1.005, 2), "1.00");
        assert_eq!(number_to_fixed(2.5, 0), "3");
        assert_eq!(number_to_fixed(-1.5, 0), "-2");
        assert_eq!(number_to_fixed(3.14159, 3), "3.142");
    }
}
