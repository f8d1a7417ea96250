//! Utilities.

use std::iter::IntoIterator;

/// Returns ceiling log2.
pub const fn clog2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        (::std::mem::size_of::<usize>() * 8) - (value - 1).leading_zeros() as usize
    }
}

/// Combines all elements into one String, separated by `sep`. Returns `None` if all elements are `None`.
pub fn join_options<I>(sep: &str, iterable: I) -> Option<String>
where I: IntoIterator<Item = Option<String>> {
    let iterable = iterable.into_iter().flatten().collect::<Vec<_>>();
    if iterable.is_empty() {
        None
    } else {
        Some(iterable.join(sep))
    }
}

/// Indents every line in the string.
pub fn indent(str: String, indent: usize) -> String {
    str.lines().map(|l| format!("{}{}", " ".repeat(indent), l)).collect::<Vec<_>>().join("\n")
}

/// Returns a sized binary literal, e.g. `4'b0010`.
pub fn bin_lit(width: usize, value: u64) -> String { format!("{}'b{:0w$b}", width, value, w = width) }

/// Returns a sized hexadecimal literal, e.g. `32'h0000_0004` without the separator.
pub fn hex_lit(width: usize, value: u64) -> String {
    format!("{}'h{:0w$x}", width, value, w = (width + 3) / 4)
}

/// Returns a sized all-zero literal, e.g. `32'b0`.
pub fn zero_lit(width: usize) -> String { format!("{}'b0", width) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clog2_covers_boundaries() {
        assert_eq!(clog2(0), 0, "zero has no address bits");
        assert_eq!(clog2(1), 0, "a single slot needs no address bits");
        assert_eq!(clog2(2), 1);
        assert_eq!(clog2(5), 3);
        assert_eq!(clog2(16), 4);
        assert_eq!(clog2(17), 5);
    }

    #[test]
    fn literals_are_width_padded() {
        assert_eq!(bin_lit(4, 2), "4'b0010");
        assert_eq!(hex_lit(32, 0x1c), "32'h0000001c");
        assert_eq!(zero_lit(32), "32'b0");
    }

    #[test]
    fn join_options_skips_missing_parts() {
        assert_eq!(join_options("_", [Some("S_AXI".to_string()), None, Some("ARADDR".to_string())]), Some("S_AXI_ARADDR".to_string()));
        assert_eq!(join_options("_", [None, None]), None);
    }
}
