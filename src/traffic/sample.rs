use rand::Rng;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from_block: u64,
    pub to_block: u64,
}

impl BlockRange {
    pub fn width(&self) -> u64 {
        self.to_block - self.from_block
    }
}

/// Uniform block number in `[min, max]`, both inclusive.
pub fn random_block_number<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> u64 {
    rng.gen_range(min..=max)
}

/// Starting block in `[min, max]` plus a width in `[min_width, max_width]`.
///
/// `to_block` may land past `max`; the range only needs to start inside known history.
/// `max + max_width` must fit in a `u64`, which `resolve_config` enforces.
pub fn random_block_range<R: Rng + ?Sized>(
    rng: &mut R,
    min: u64,
    max: u64,
    min_width: u64,
    max_width: u64,
) -> BlockRange {
    let from_block = random_block_number(rng, min, max);
    let width = rng.gen_range(min_width..=max_width);
    BlockRange { from_block, to_block: from_block.saturating_add(width) }
}

/// `0x` followed by 40 uniformly drawn lowercase hex nibbles.
///
/// These addresses are practically never funded, so balance lookups exercise the
/// unused-account path of the node rather than any cache.
pub fn random_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut addr = String::with_capacity(42);
    addr.push_str("0x");
    for _ in 0..40 {
        addr.push(HEX_DIGITS[rng.gen_range(0..16)] as char);
    }
    addr
}

pub fn to_hex(n: u64) -> String {
    format!("0x{n:x}")
}

/// Parses `0x`-prefixed hex or plain decimal.
pub fn parse_quantity(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_hex_round_trip_and_decimal() {
        assert_eq!(to_hex(0x1006F40), "0x1006f40");
        assert_eq!(parse_quantity("0x1006F40"), Some(0x1006F40));
        assert_eq!(parse_quantity("137"), Some(137));
        assert_eq!(parse_quantity("0xzz"), None);
    }

    #[test]
    fn test_degenerate_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_block_number(&mut rng, 5, 5), 5);
        let range = random_block_range(&mut rng, 5, 5, 3, 3);
        assert_eq!(range, BlockRange { from_block: 5, to_block: 8 });
    }
}
