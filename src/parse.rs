//! Argument parsing for the shell commands.
//!
//! The base comes from the prefix (`0x` hex, leading `0` octal, otherwise
//! decimal). The whole token must be a number; trailing garbage is an error.

use smoltcp::wire::Ipv4Address;

use crate::error::{Error, Result};

fn split_radix(s: &str) -> (&str, u32) {
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (rest, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    }
}

fn parse_magnitude(s: &str) -> Result<u64> {
    let (digits, radix) = split_radix(s);
    if digits.is_empty() {
        return Err(Error::InvalidNumber);
    }
    let mut value: u64 = 0;
    for c in digits.chars() {
        let d = c.to_digit(radix).ok_or(Error::InvalidNumber)? as u64;
        value = value
            .checked_mul(radix as u64)
            .and_then(|v| v.checked_add(d))
            .ok_or(Error::InvalidNumber)?;
    }
    Ok(value)
}

pub fn parse_u64(s: &str) -> Result<u64> {
    parse_magnitude(s.trim())
}

pub fn parse_u32(s: &str) -> Result<u32> {
    let v = parse_u64(s)?;
    u32::try_from(v).map_err(|_| Error::InvalidNumber)
}

/// Signed 32-bit value. Hex input may use the full 32 bits
/// (`0xC0000000` is accepted and read as a negative number).
pub fn parse_i32(s: &str) -> Result<i32> {
    let s = s.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let magnitude = parse_magnitude(body)?;
    if negative {
        if magnitude > 1 << 31 {
            return Err(Error::InvalidNumber);
        }
        Ok((magnitude as i64).wrapping_neg() as i32)
    } else if magnitude <= u32::MAX as u64 {
        Ok(magnitude as u32 as i32)
    } else {
        Err(Error::InvalidNumber)
    }
}

/// Value of a mandatory argument, range-checked against `0..limit`.
pub fn parse_below(s: &str, limit: u32, what: &'static str) -> Result<u32> {
    if s.trim().is_empty() {
        return Err(Error::MissingArgument(what));
    }
    let v = parse_u32(s)?;
    if v >= limit {
        return Err(Error::OutOfRange { what, max: limit - 1 });
    }
    Ok(v)
}

/// Memory size in KiB. A bare number is KiB; `K`, `M` and `G` suffixes scale it.
pub fn parse_kib(s: &str) -> Result<u32> {
    let s = s.trim();
    let (number, scale) = match s.as_bytes().last() {
        Some(b'K') | Some(b'k') => (&s[..s.len() - 1], 1),
        Some(b'M') | Some(b'm') => (&s[..s.len() - 1], 1024),
        Some(b'G') | Some(b'g') => (&s[..s.len() - 1], 1024 * 1024),
        _ => (s, 1),
    };
    parse_u32(number)?
        .checked_mul(scale)
        .ok_or(Error::InvalidNumber)
}

pub fn parse_ipv4(s: &str) -> Result<Ipv4Address> {
    let mut octets = [0u8; 4];
    let mut parts = s.trim().split('.');
    for octet in octets.iter_mut() {
        let part = parts.next().ok_or(Error::InvalidAddress)?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress);
        }
        *octet = part.parse().map_err(|_| Error::InvalidAddress)?;
    }
    if parts.next().is_some() {
        return Err(Error::InvalidAddress);
    }
    Ok(Ipv4Address(octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_base() {
        assert_eq!(parse_u32("123"), Ok(123));
        assert_eq!(parse_u32("0x1F"), Ok(31));
        assert_eq!(parse_u32("0XA0000000"), Ok(0xA000_0000));
        assert_eq!(parse_u32("017"), Ok(15));
        assert_eq!(parse_u32("0"), Ok(0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_u32("abc"), Err(Error::InvalidNumber));
        assert_eq!(parse_u32("12z"), Err(Error::InvalidNumber));
        assert_eq!(parse_u32("0x"), Err(Error::InvalidNumber));
        assert_eq!(parse_u32("08"), Err(Error::InvalidNumber));
        assert_eq!(parse_u32(""), Err(Error::InvalidNumber));
        assert_eq!(parse_u32("4294967296"), Err(Error::InvalidNumber));
    }

    #[test]
    fn signed_values() {
        assert_eq!(parse_i32("-5"), Ok(-5));
        assert_eq!(parse_i32("0x40000000"), Ok(0x4000_0000));
        assert_eq!(parse_i32("0xFFFFFFFF"), Ok(-1));
        assert_eq!(parse_i32("-2147483648"), Ok(i32::MIN));
        assert_eq!(parse_i32("-2147483649"), Err(Error::InvalidNumber));
    }

    #[test]
    fn range_check_is_exclusive() {
        assert_eq!(parse_below("524287", 1 << 19, "phase"), Ok(524287));
        assert_eq!(
            parse_below("524288", 1 << 19, "phase"),
            Err(Error::OutOfRange { what: "phase", max: 524287 })
        );
        assert_eq!(parse_below(" ", 4, "x"), Err(Error::MissingArgument("x")));
    }

    #[test]
    fn kib_suffixes() {
        assert_eq!(parse_kib("4"), Ok(4));
        assert_eq!(parse_kib("16k"), Ok(16));
        assert_eq!(parse_kib("4M"), Ok(4096));
        assert_eq!(parse_kib("1G"), Ok(1024 * 1024));
        assert_eq!(parse_kib("M"), Err(Error::InvalidNumber));
    }

    #[test]
    fn ipv4_addresses() {
        assert_eq!(parse_ipv4("192.168.0.2"), Ok(Ipv4Address([192, 168, 0, 2])));
        assert_eq!(parse_ipv4("192.168.0.256"), Err(Error::InvalidAddress));
        assert_eq!(parse_ipv4("192.168.0"), Err(Error::InvalidAddress));
        assert_eq!(parse_ipv4("1.2.3.4.5"), Err(Error::InvalidAddress));
    }
}
