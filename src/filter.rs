//! PNG row filters.
//!
//! Each serialized row starts with a filter id byte. Filtering subtracts a
//! predictor from every row byte modulo 256; reconstruction adds it back.
//! The predictor sees `a` (previous pixel, same row), `b` (same position,
//! previous row) and `c` (previous pixel, previous row), all zero when out
//! of bounds.

use crate::error::{Error, Result};

/// PNG row filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Predictor 0.
    None,
    /// Predictor `a`.
    Sub,
    /// Predictor `b`.
    Up,
    /// Predictor `⌊(a+b)/2⌋`.
    Average,
    /// Paeth nearest-neighbor predictor.
    Paeth,
}

impl FilterType {
    /// All filters in id order. Selection ties resolve to the earliest.
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    /// Filter id as stored in the row prefix byte.
    pub const fn id(self) -> u8 {
        match self {
            FilterType::None => 0,
            FilterType::Sub => 1,
            FilterType::Up => 2,
            FilterType::Average => 3,
            FilterType::Paeth => 4,
        }
    }

    /// Look up a filter by its row prefix byte.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            _ => Err(Error::InvalidColorConfig(format!("unknown filter id {id}"))),
        }
    }

    #[inline]
    fn predict(self, a: u8, b: u8, c: u8) -> u8 {
        match self {
            FilterType::None => 0,
            FilterType::Sub => a,
            FilterType::Up => b,
            FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
            FilterType::Paeth => paeth_predictor(a, b, c),
        }
    }

    /// Filter one packed row into `out`. `prev` is the unfiltered previous
    /// row of the same pass, absent for the first row.
    pub fn filter_row(
        self,
        row: &[u8],
        prev: Option<&[u8]>,
        pixel_bytes: usize,
        out: &mut Vec<u8>,
    ) {
        out.clear();
        for (i, &x) in row.iter().enumerate() {
            let a = if i >= pixel_bytes { row[i - pixel_bytes] } else { 0 };
            let b = prev.map_or(0, |p| p[i]);
            let c = if i >= pixel_bytes {
                prev.map_or(0, |p| p[i - pixel_bytes])
            } else {
                0
            };
            out.push(x.wrapping_sub(self.predict(a, b, c)));
        }
    }

    /// Reverse this filter in place. Earlier bytes of `row` must already be
    /// reconstructed; `prev` is the reconstructed previous row of the pass.
    pub fn reconstruct_row(self, row: &mut [u8], prev: Option<&[u8]>, pixel_bytes: usize) {
        for i in 0..row.len() {
            let a = if i >= pixel_bytes { row[i - pixel_bytes] } else { 0 };
            let b = prev.map_or(0, |p| p[i]);
            let c = if i >= pixel_bytes {
                prev.map_or(0, |p| p[i - pixel_bytes])
            } else {
                0
            };
            row[i] = row[i].wrapping_add(self.predict(a, b, c));
        }
    }
}

/// Paeth predictor: the neighbor closest to `a + b - c`.
#[inline]
fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let a_i = a as i16;
    let b_i = b as i16;
    let c_i = c as i16;

    let pa = (b_i - c_i).abs();
    let pb = (a_i - c_i).abs();
    let pc = (a_i + b_i - 2 * c_i).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Candidate buffers reused across rows to avoid per-row allocation.
pub struct FilterScratch {
    candidates: [Vec<u8>; 5],
}

impl FilterScratch {
    /// Allocate candidate buffers for rows up to `row_len` bytes.
    pub fn new(row_len: usize) -> Self {
        Self {
            candidates: std::array::from_fn(|_| Vec::with_capacity(row_len)),
        }
    }
}

/// Score a filtered row: sum of absolute values of the bytes read as
/// signed. Lower scores compress better.
#[inline]
fn filter_score(filtered: &[u8]) -> u64 {
    filtered.iter().map(|&b| (b as i8).unsigned_abs() as u64).sum()
}

/// Filter one row with whichever filter minimizes the absolute sum, and
/// append `[filter_id, filtered_bytes...]` to `out`. All five candidates
/// are evaluated; a tie keeps the lowest filter id.
pub fn filter_into(
    out: &mut Vec<u8>,
    row: &[u8],
    prev: Option<&[u8]>,
    pixel_bytes: usize,
    scratch: &mut FilterScratch,
) {
    let mut best = FilterType::None;
    let mut best_score = u64::MAX;
    for (slot, filter) in scratch.candidates.iter_mut().zip(FilterType::ALL) {
        filter.filter_row(row, prev, pixel_bytes, slot);
        let score = filter_score(slot);
        if score < best_score {
            best_score = score;
            best = filter;
        }
    }
    out.push(best.id());
    out.extend_from_slice(&scratch.candidates[best.id() as usize]);
}
