/// Pads given buffer size so that it's never zero and always a multiple of
/// 16 bytes, which keeps both uniform and storage bindings happy.
pub fn pad_size(size: usize) -> usize {
    (size.max(1) + 15) & !15
}

/// Rounds `size` up to a multiple of `alignment` (which must be a power of
/// two).
pub fn align_to(size: usize, alignment: usize) -> usize {
    assert!(alignment.is_power_of_two());

    (size + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding() {
        assert_eq!(16, pad_size(0));
        assert_eq!(16, pad_size(4));
        assert_eq!(32, pad_size(17));
        assert_eq!(160, pad_size(160));

        assert_eq!(256, align_to(160, 256));
        assert_eq!(512, align_to(257, 256));
        assert_eq!(160, align_to(160, 16));
    }
}
