//! Geohash encoding and zoom-dependent bucket lengths.
//!
//! A shared geohash prefix means spatial proximity, so truncating every
//! candidate's hash to a common length and grouping by the result gives a
//! cheap grid clustering whose cell size follows the prefix length.

use crate::geometry::Point;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision of the geohash attached to every candidate. Must be at least the
/// longest [`bucket_length`].
pub const STORED_PRECISION: usize = 8;

/// Geohash prefix length used to cluster at the given map zoom level.
///
/// The thresholds are fixed: `< 9` gives 5, `[9, 10)` gives 6 and `>= 10`
/// gives 8. `NaN` falls into the coarsest bucket.
pub fn bucket_length(zoom: f64) -> usize {
  if zoom >= 10.0 {
    8
  } else if zoom >= 9.0 {
    6
  } else {
    5
  }
}

/// Encode a longitude/latitude point. Out-of-range coordinates are clamped.
pub fn encode(point: Point, precision: usize) -> String {
  let lon = point.x.clamp(-180.0, 180.0);
  let lat = point.y.clamp(-90.0, 90.0);

  let mut lon_range = (-180.0_f64, 180.0_f64);
  let mut lat_range = (-90.0_f64, 90.0_f64);
  let mut hash = String::with_capacity(precision);
  let mut even = true;
  let mut bits = 0u8;
  let mut ch = 0usize;

  while hash.len() < precision {
    let (range, value) = if even {
      (&mut lon_range, lon)
    } else {
      (&mut lat_range, lat)
    };
    let mid = (range.0 + range.1) / 2.0;
    ch <<= 1;
    if value >= mid {
      ch |= 1;
      range.0 = mid;
    } else {
      range.1 = mid;
    }
    even = !even;
    bits += 1;

    if bits == 5 {
      hash.push(BASE32[ch] as char);
      bits = 0;
      ch = 0;
    }
  }
  hash
}

/// The first `len` characters of `hash`, or all of it if shorter.
pub fn prefix(hash: &str, len: usize) -> &str {
  match hash.char_indices().nth(len) {
    Some((end, _)) => &hash[..end],
    None => hash,
  }
}
