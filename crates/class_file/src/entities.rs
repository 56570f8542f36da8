//! Builders for runs of records laid out back to back.
//!
//! Each builder returns the parsed records together with the number of bytes they
//! occupy, which is how the decoder finds the start of the following section.

use crate::{ByteData, Result};

/// Parses `count` records of exactly `width` bytes each.
pub fn build_sized<'a, T>(
    data: ByteData<'a>,
    count: usize,
    width: usize,
    mut parse_one: impl FnMut(ByteData<'a>) -> Result<T>,
) -> Result<(Vec<T>, usize)> {
    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        records.push(parse_one(data.window(i * width)?)?);
    }

    Ok((records, count * width))
}

/// Parses `count` variable sized records, each reporting its own size.
pub fn build<'a, T>(
    data: ByteData<'a>,
    count: usize,
    mut parse_one: impl FnMut(ByteData<'a>) -> Result<(T, usize)>,
) -> Result<(Vec<T>, usize)> {
    let mut records = Vec::with_capacity(count);
    let mut length = 0;
    for _ in 0..count {
        let (record, size) = parse_one(data.window(length)?)?;
        records.push(record);
        length += size;
    }

    Ok((records, length))
}
