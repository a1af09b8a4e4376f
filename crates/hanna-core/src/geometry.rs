//! Planar geometry used by the map search.
//!
//! Geometries are (de)serialised as GeoJSON geometry objects. Coordinates are
//! geographic: `x` is longitude and `y` is latitude. Only the handful of
//! operations the search needs are implemented here: bounding boxes,
//! rectangle intersection and centroids of geometry collections.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Point ───────────────────────────────────────────────────────────────────

/// A single position. Serialised as a GeoJSON position, `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

impl From<[f64; 2]> for Point {
  fn from([x, y]: [f64; 2]) -> Self { Self { x, y } }
}

impl From<Point> for [f64; 2] {
  fn from(p: Point) -> Self { [p.x, p.y] }
}

// ─── Extent ──────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle; the visible map area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
  pub min_x: f64,
  pub min_y: f64,
  pub max_x: f64,
  pub max_y: f64,
}

impl Extent {
  /// Parse the `[minX, minY, maxX, maxY]` wire form.
  pub fn from_slice(values: &[f64]) -> Result<Self> {
    let [min_x, min_y, max_x, max_y] = values else {
      return Err(Error::invalid(format!(
        "map extent must have exactly 4 numbers, got {}",
        values.len()
      )));
    };
    if values.iter().any(|v| !v.is_finite()) {
      return Err(Error::invalid("map extent contains a non-finite number"));
    }
    if min_x > max_x || min_y > max_y {
      return Err(Error::invalid(
        "map extent minimum exceeds maximum",
      ));
    }
    Ok(Self { min_x: *min_x, min_y: *min_y, max_x: *max_x, max_y: *max_y })
  }

  /// Boundary-inclusive point containment.
  pub fn contains(&self, p: Point) -> bool {
    p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
  }

  pub fn intersects_extent(&self, other: &Extent) -> bool {
    self.min_x <= other.max_x
      && other.min_x <= self.max_x
      && self.min_y <= other.max_y
      && other.min_y <= self.max_y
  }

  /// Liang-Barsky clip test of the closed segment from `a` to `b`.
  pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
      (-dx, a.x - self.min_x),
      (dx, self.max_x - a.x),
      (-dy, a.y - self.min_y),
      (dy, self.max_y - a.y),
    ] {
      if p == 0.0 {
        if q < 0.0 {
          return false;
        }
        continue;
      }
      let r = q / p;
      if p < 0.0 {
        if r > t1 {
          return false;
        }
        t0 = t0.max(r);
      } else {
        if r < t0 {
          return false;
        }
        t1 = t1.min(r);
      }
    }
    true
  }

  fn corner(&self) -> Point { Point::new(self.min_x, self.min_y) }
}

// ─── Geometry ────────────────────────────────────────────────────────────────

/// A GeoJSON geometry. Geometry collections are not stored per object; they
/// only arise transiently when clustering, see [`centroid_of_collection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
  Point(Point),
  MultiPoint(Vec<Point>),
  LineString(Vec<Point>),
  MultiLineString(Vec<Vec<Point>>),
  /// Outer ring first, holes after.
  Polygon(Vec<Vec<Point>>),
  MultiPolygon(Vec<Vec<Vec<Point>>>),
}

impl Geometry {
  /// Every position in the geometry, in storage order.
  pub fn coords(&self) -> Box<dyn Iterator<Item = Point> + '_> {
    match self {
      Self::Point(p) => Box::new(std::iter::once(*p)),
      Self::MultiPoint(ps) | Self::LineString(ps) => Box::new(ps.iter().copied()),
      Self::MultiLineString(ls) | Self::Polygon(ls) => {
        Box::new(ls.iter().flatten().copied())
      }
      Self::MultiPolygon(ps) => Box::new(ps.iter().flatten().flatten().copied()),
    }
  }

  pub fn is_empty(&self) -> bool { self.coords().next().is_none() }

  pub fn bounding_box(&self) -> Option<Extent> {
    let mut coords = self.coords();
    let first = coords.next()?;
    let init = Extent { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
    Some(coords.fold(init, |e, p| Extent {
      min_x: e.min_x.min(p.x),
      min_y: e.min_y.min(p.y),
      max_x: e.max_x.max(p.x),
      max_y: e.max_y.max(p.y),
    }))
  }

  /// Whether any part of the geometry touches `extent`.
  pub fn intersects(&self, extent: &Extent) -> bool {
    match self.bounding_box() {
      Some(bbox) if bbox.intersects_extent(extent) => {}
      _ => return false,
    }

    match self {
      Self::Point(p) => extent.contains(*p),
      Self::MultiPoint(ps) => ps.iter().any(|p| extent.contains(*p)),
      Self::LineString(line) => line_intersects(line, extent),
      Self::MultiLineString(lines) => lines.iter().any(|l| line_intersects(l, extent)),
      Self::Polygon(rings) => polygon_intersects(rings, extent),
      Self::MultiPolygon(polys) => polys.iter().any(|r| polygon_intersects(r, extent)),
    }
  }

  /// Centroid of this geometry alone.
  pub fn centroid(&self) -> Option<Point> {
    let mut acc = CentroidAccumulator::default();
    acc.add(self);
    acc.finish()
  }
}

fn line_intersects(line: &[Point], extent: &Extent) -> bool {
  match line {
    [] => false,
    [p] => extent.contains(*p),
    _ => line.windows(2).any(|w| extent.intersects_segment(w[0], w[1])),
  }
}

fn polygon_intersects(rings: &[Vec<Point>], extent: &Extent) -> bool {
  // Edges crossing or vertices inside the rectangle.
  if rings.iter().any(|ring| line_intersects(ring, extent)) {
    return true;
  }
  // Otherwise the rectangle is either fully outside or fully inside.
  polygon_contains(rings, extent.corner())
}

/// Even-odd point-in-ring test.
fn ring_contains(ring: &[Point], p: Point) -> bool {
  if ring.len() < 3 {
    return false;
  }
  let mut inside = false;
  let mut j = ring.len() - 1;
  for i in 0..ring.len() {
    let (a, b) = (ring[i], ring[j]);
    if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
      inside = !inside;
    }
    j = i;
  }
  inside
}

fn polygon_contains(rings: &[Vec<Point>], p: Point) -> bool {
  let mut rings = rings.iter();
  match rings.next() {
    Some(outer) if ring_contains(outer, p) => !rings.any(|hole| ring_contains(hole, p)),
    _ => false,
  }
}

// ─── Centroids ───────────────────────────────────────────────────────────────

/// Running sums for the centroid of a collection. Each dimension is tracked
/// separately; only the highest non-degenerate one is used at the end.
#[derive(Debug, Default)]
struct CentroidAccumulator {
  area:     f64,
  area_x:   f64,
  area_y:   f64,
  length:   f64,
  length_x: f64,
  length_y: f64,
  points:   usize,
  point_x:  f64,
  point_y:  f64,
}

impl CentroidAccumulator {
  fn add(&mut self, geometry: &Geometry) {
    match geometry {
      Geometry::Point(p) => self.add_point(*p),
      Geometry::MultiPoint(ps) => ps.iter().for_each(|p| self.add_point(*p)),
      Geometry::LineString(line) => self.add_line(line),
      Geometry::MultiLineString(lines) => lines.iter().for_each(|l| self.add_line(l)),
      Geometry::Polygon(rings) => self.add_polygon(rings),
      Geometry::MultiPolygon(polys) => polys.iter().for_each(|r| self.add_polygon(r)),
    }
  }

  fn add_point(&mut self, p: Point) {
    self.points += 1;
    self.point_x += p.x;
    self.point_y += p.y;
  }

  fn add_line(&mut self, line: &[Point]) {
    for w in line.windows(2) {
      let len = (w[1].x - w[0].x).hypot(w[1].y - w[0].y);
      self.length += len;
      self.length_x += len * (w[0].x + w[1].x) / 2.0;
      self.length_y += len * (w[0].y + w[1].y) / 2.0;
    }
    line.iter().for_each(|p| self.add_point(*p));
  }

  fn add_polygon(&mut self, rings: &[Vec<Point>]) {
    for (i, ring) in rings.iter().enumerate() {
      let (area, cx, cy) = ring_area_centroid(ring);
      // Holes subtract from the outer ring.
      let sign = if i == 0 { 1.0 } else { -1.0 };
      self.area += sign * area;
      self.area_x += sign * area * cx;
      self.area_y += sign * area * cy;
      self.add_line(ring);
    }
  }

  fn finish(&self) -> Option<Point> {
    if self.area > 0.0 {
      Some(Point::new(self.area_x / self.area, self.area_y / self.area))
    } else if self.length > 0.0 {
      Some(Point::new(self.length_x / self.length, self.length_y / self.length))
    } else if self.points > 0 {
      let n = self.points as f64;
      Some(Point::new(self.point_x / n, self.point_y / n))
    } else {
      None
    }
  }
}

/// Absolute area and centroid of a single ring (shoelace formula).
fn ring_area_centroid(ring: &[Point]) -> (f64, f64, f64) {
  if ring.len() < 3 {
    return (0.0, 0.0, 0.0);
  }
  // Relative to the first vertex, to keep small rings at large coordinates
  // precise.
  let origin = ring[0];
  let mut twice_area = 0.0;
  let mut cx = 0.0;
  let mut cy = 0.0;
  for i in 0..ring.len() {
    let a = ring[i];
    let b = ring[(i + 1) % ring.len()];
    let (ax, ay) = (a.x - origin.x, a.y - origin.y);
    let (bx, by) = (b.x - origin.x, b.y - origin.y);
    let cross = ax * by - bx * ay;
    twice_area += cross;
    cx += (ax + bx) * cross;
    cy += (ay + by) * cross;
  }
  if twice_area == 0.0 {
    return (0.0, 0.0, 0.0);
  }
  let area = twice_area / 2.0;
  (area.abs(), origin.x + cx / (6.0 * area), origin.y + cy / (6.0 * area))
}

/// Centroid of the union of `geometries`, treated as one collection.
///
/// Polygons are weighted by area, lines by length, points equally; lower
/// dimensions only count when every higher-dimension part is degenerate. This
/// is not the mean of the member centroids.
pub fn centroid_of_collection<'a>(
  geometries: impl IntoIterator<Item = &'a Geometry>,
) -> Option<Point> {
  let mut acc = CentroidAccumulator::default();
  geometries.into_iter().for_each(|g| acc.add(g));
  acc.finish()
}
