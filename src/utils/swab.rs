//! Byte swapping and bit reversal primitives
//!
//! Sample buffers are swapped in place when the file byte order differs
//! from the host, and bit-reversed when the file fill order is LSB-first.

/// Bit-reversal lookup: entry `i` holds `i` with its 8 bits mirrored.
pub static BIT_REV_TABLE: [u8; 256] = build_bit_rev_table(true);

/// Identity lookup, the no-reversal counterpart of [`BIT_REV_TABLE`].
pub static NO_BIT_REV_TABLE: [u8; 256] = build_bit_rev_table(false);

const fn build_bit_rev_table(reversed: bool) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = if reversed { (i as u8).reverse_bits() } else { i as u8 };
        i += 1;
    }
    table
}

/// Returns the reversal table or the identity table
pub fn get_bit_rev_table(reversed: bool) -> &'static [u8; 256] {
    if reversed {
        &BIT_REV_TABLE
    } else {
        &NO_BIT_REV_TABLE
    }
}

/// Mirrors the bits of every byte in place
pub fn reverse_bits(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        *b = BIT_REV_TABLE[*b as usize];
    }
}

pub fn swab_short(value: &mut u16) {
    *value = value.swap_bytes();
}

pub fn swab_long(value: &mut u32) {
    *value = value.swap_bytes();
}

pub fn swab_long8(value: &mut u64) {
    *value = value.swap_bytes();
}

pub fn swab_float(value: &mut f32) {
    *value = f32::from_bits(value.to_bits().swap_bytes());
}

pub fn swab_double(value: &mut f64) {
    *value = f64::from_bits(value.to_bits().swap_bytes());
}

pub fn swab_array_of_short(values: &mut [u16]) {
    values.iter_mut().for_each(swab_short);
}

pub fn swab_array_of_long(values: &mut [u32]) {
    values.iter_mut().for_each(swab_long);
}

pub fn swab_array_of_long8(values: &mut [u64]) {
    values.iter_mut().for_each(swab_long8);
}

pub fn swab_array_of_float(values: &mut [f32]) {
    values.iter_mut().for_each(swab_float);
}

pub fn swab_array_of_double(values: &mut [f64]) {
    values.iter_mut().for_each(swab_double);
}

/// Swaps 24-bit values packed as byte triples; a trailing partial triple is left alone
pub fn swab_array_of_triples(buf: &mut [u8]) {
    for triple in buf.chunks_exact_mut(3) {
        triple.swap(0, 2);
    }
}

/// Swaps every `width`-byte group of a raw sample buffer in place.
///
/// Widths of 1 (or anything unsupported) leave the buffer untouched.
pub fn swab_samples(buf: &mut [u8], width: usize) {
    match width {
        2 | 4 | 8 => {
            for chunk in buf.chunks_exact_mut(width) {
                chunk.reverse();
            }
        }
        3 => swab_array_of_triples(buf),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_rev_table_mirrors_bits() {
        assert_eq!(BIT_REV_TABLE[0x01], 0x80);
        assert_eq!(BIT_REV_TABLE[0x0F], 0xF0);
        assert_eq!(BIT_REV_TABLE[0xA0], 0x05);
        assert_eq!(NO_BIT_REV_TABLE[0xA0], 0xA0);
        for i in 0..256usize {
            assert_eq!(BIT_REV_TABLE[BIT_REV_TABLE[i] as usize] as usize, i);
        }
    }

    #[test]
    fn test_reverse_bits_in_place() {
        let mut buf = [0x01u8, 0x02, 0xFF];
        reverse_bits(&mut buf);
        assert_eq!(buf, [0x80, 0x40, 0xFF]);
    }

    #[test]
    fn test_swab_scalars() {
        let mut s = 0x1234u16;
        swab_short(&mut s);
        assert_eq!(s, 0x3412);

        let mut l = 0x1234_5678u32;
        swab_long(&mut l);
        assert_eq!(l, 0x7856_3412);

        let mut d = 1.5f64;
        swab_double(&mut d);
        swab_double(&mut d);
        assert_eq!(d, 1.5);
    }

    #[test]
    fn test_swab_arrays() {
        let mut shorts = [0x0102u16, 0x0304];
        swab_array_of_short(&mut shorts);
        assert_eq!(shorts, [0x0201, 0x0403]);

        let mut longs = [0x0102_0304u32];
        swab_array_of_long(&mut longs);
        assert_eq!(longs, [0x0403_0201]);

        let mut long8s = [0x0102_0304_0506_0708u64];
        swab_array_of_long8(&mut long8s);
        assert_eq!(long8s, [0x0807_0605_0403_0201]);

        let mut floats = [2.5f32];
        swab_array_of_float(&mut floats);
        assert_eq!(floats[0].to_bits(), 2.5f32.to_bits().swap_bytes());

        let mut doubles = [-3.25f64];
        swab_array_of_double(&mut doubles);
        swab_array_of_double(&mut doubles);
        assert_eq!(doubles, [-3.25]);
    }

    #[test]
    fn test_table_selection() {
        assert_eq!(get_bit_rev_table(true)[0x80], 0x01);
        assert_eq!(get_bit_rev_table(false)[0x80], 0x80);
    }

    #[test]
    fn test_swab_samples_by_width() {
        let mut buf = [1u8, 2, 3, 4, 5, 6];
        swab_samples(&mut buf, 2);
        assert_eq!(buf, [2, 1, 4, 3, 6, 5]);

        let mut buf = [1u8, 2, 3, 4, 5, 6];
        swab_samples(&mut buf, 3);
        assert_eq!(buf, [3, 2, 1, 6, 5, 4]);

        let mut buf = [1u8, 2, 3, 4];
        swab_samples(&mut buf, 4);
        assert_eq!(buf, [4, 3, 2, 1]);

        let mut buf = [1u8, 2, 3];
        swab_samples(&mut buf, 1);
        assert_eq!(buf, [1, 2, 3]);
    }
}
