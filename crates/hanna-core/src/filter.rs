//! Filter fragments and their composition.
//!
//! Each filter class is an independent [`Fragment`] built from the request.
//! A fragment whose filter is absent is a no-op that matches every row. The
//! final [`Filter`] is the conjunction of all fragments; fragments are pure,
//! so evaluation order does not affect the outcome.

use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;

use crate::{
  Result,
  geometry::Extent,
  object::{ObjectRow, ProjectObject},
  query::{DateRange, SearchRequest},
  tokenize::{Tokenizer, full_text_match},
};

/// One independently testable predicate over a store row.
pub trait Fragment: Send + Sync {
  fn matches(&self, row: &ObjectRow) -> bool;

  /// `true` when the fragment was built from an absent filter.
  fn is_noop(&self) -> bool;
}

// ─── Text ────────────────────────────────────────────────────────────────────

/// Full-text prefix match OR case-sensitive substring match.
///
/// Both are tried because literal identifiers (e.g. `"HKR-2019/14"`) do not
/// survive tokenization as a usable query.
pub struct TextFilter {
  query:     Option<TextQuery>,
  tokenizer: Arc<dyn Tokenizer>,
}

struct TextQuery {
  raw:   String,
  terms: Vec<String>,
}

impl TextFilter {
  pub fn new(text: Option<&str>, tokenizer: Arc<dyn Tokenizer>) -> Self {
    let query = text.map(|raw| TextQuery {
      raw:   raw.to_owned(),
      terms: tokenizer.tokens(raw),
    });
    Self { query, tokenizer }
  }

  fn searchable<'a>(object: &'a ProjectObject) -> impl Iterator<Item = &'a str> {
    std::iter::once(object.name.as_str()).chain(object.description.as_deref())
  }
}

impl Fragment for TextFilter {
  fn matches(&self, row: &ObjectRow) -> bool {
    let Some(query) = &self.query else { return true };

    if Self::searchable(&row.object).any(|field| field.contains(query.raw.as_str())) {
      return true;
    }

    let document: Vec<String> = Self::searchable(&row.object)
      .flat_map(|field| self.tokenizer.tokens(field))
      .collect();
    full_text_match(&query.terms, &document, self.tokenizer.min_prefix_length())
  }

  fn is_noop(&self) -> bool { self.query.is_none() }
}

// ─── Facets ──────────────────────────────────────────────────────────────────

/// Which object attribute a facet filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetField {
  ObjectType,
  ObjectCategory,
  ObjectUsage,
  LifecycleState,
  ObjectStage,
  RakennuttajaUser,
  SuunnitteluttajaUser,
}

impl FacetField {
  /// The object's codes for this field. Multi-valued fields may yield several.
  fn values<'a>(self, object: &'a ProjectObject) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    match self {
      Self::ObjectType => Box::new(object.object_types.iter().map(String::as_str)),
      Self::ObjectCategory => Box::new(object.object_categories.iter().map(String::as_str)),
      Self::ObjectUsage => Box::new(object.object_usages.iter().map(String::as_str)),
      Self::LifecycleState => Box::new(std::iter::once(object.lifecycle_state.as_str())),
      Self::ObjectStage => Box::new(std::iter::once(object.object_stage.as_str())),
      Self::RakennuttajaUser => Box::new(object.rakennuttaja_user.as_deref().into_iter()),
      Self::SuunnitteluttajaUser => {
        Box::new(object.suunnitteluttaja_user.as_deref().into_iter())
      }
    }
  }
}

/// Matches when the code set is empty or shares a code with the object.
pub struct FacetFilter {
  field: FacetField,
  codes: BTreeSet<String>,
}

impl FacetFilter {
  pub fn new(field: FacetField, codes: BTreeSet<String>) -> Self { Self { field, codes } }
}

impl Fragment for FacetFilter {
  fn matches(&self, row: &ObjectRow) -> bool {
    self.codes.is_empty() || self.field.values(&row.object).any(|v| self.codes.contains(v))
  }

  fn is_noop(&self) -> bool { self.codes.is_empty() }
}

// ─── Date range ──────────────────────────────────────────────────────────────

/// Closed-interval overlap between the object's lifetime and the range.
pub struct DateRangeFilter {
  range: Option<DateRange>,
}

impl DateRangeFilter {
  pub fn new(range: Option<DateRange>) -> Self {
    Self { range: range.filter(|r| !r.is_unbounded()) }
  }
}

/// `[start, end]` overlaps `range`; a `None` end is open towards the future.
pub fn overlaps(range: &DateRange, start: NaiveDate, end: Option<NaiveDate>) -> bool {
  let begins_in_time = range.end.is_none_or(|range_end| start <= range_end);
  let lasts_long_enough = match (end, range.start) {
    (Some(end), Some(range_start)) => end >= range_start,
    _ => true,
  };
  begins_in_time && lasts_long_enough
}

impl Fragment for DateRangeFilter {
  fn matches(&self, row: &ObjectRow) -> bool {
    self
      .range
      .as_ref()
      .is_none_or(|r| overlaps(r, row.object.start_date, row.object.end_date))
  }

  fn is_noop(&self) -> bool { self.range.is_none() }
}

// ─── Spatial extent ──────────────────────────────────────────────────────────

/// Geometry intersects the map extent, or has no geometry and those are
/// explicitly requested.
pub struct ExtentFilter {
  extent:                   Option<Extent>,
  include_without_geometry: bool,
}

impl ExtentFilter {
  pub fn new(extent: Option<Extent>, include_without_geometry: bool) -> Self {
    Self { extent, include_without_geometry }
  }
}

impl Fragment for ExtentFilter {
  fn matches(&self, row: &ObjectRow) -> bool {
    let Some(extent) = &self.extent else { return true };
    match row.object.geometry.as_ref().filter(|g| !g.is_empty()) {
      Some(geometry) => geometry.intersects(extent),
      None => self.include_without_geometry,
    }
  }

  fn is_noop(&self) -> bool { self.extent.is_none() }
}

// ─── Participant ─────────────────────────────────────────────────────────────

/// The user holds one of the fixed roles or appears in the role join set.
pub struct ParticipantFilter {
  user_id: Option<String>,
}

impl ParticipantFilter {
  pub fn new(user_id: Option<String>) -> Self {
    Self { user_id: user_id.filter(|u| !u.is_empty()) }
  }
}

impl Fragment for ParticipantFilter {
  fn matches(&self, row: &ObjectRow) -> bool {
    self.user_id.as_deref().is_none_or(|u| row.object.has_participant(u))
  }

  fn is_noop(&self) -> bool { self.user_id.is_none() }
}

// ─── Composition ─────────────────────────────────────────────────────────────

/// The conjunction of every fragment built from one request. Immutable once
/// composed.
pub struct Filter {
  fragments: Vec<Box<dyn Fragment>>,
}

impl Filter {
  /// Build every fragment for `request`. Fails only on a malformed extent.
  pub fn compose(request: &SearchRequest, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
    let facets = &request.facet_filters;
    let fragments: Vec<Box<dyn Fragment>> = vec![
      Box::new(TextFilter::new(request.text(), tokenizer)),
      Box::new(FacetFilter::new(FacetField::ObjectType, facets.object_types.clone())),
      Box::new(FacetFilter::new(FacetField::ObjectCategory, facets.object_categories.clone())),
      Box::new(FacetFilter::new(FacetField::ObjectUsage, facets.object_usages.clone())),
      Box::new(FacetFilter::new(FacetField::LifecycleState, facets.lifecycle_states.clone())),
      Box::new(FacetFilter::new(FacetField::ObjectStage, facets.object_stages.clone())),
      Box::new(FacetFilter::new(
        FacetField::RakennuttajaUser,
        facets.rakennuttaja_users.clone(),
      )),
      Box::new(FacetFilter::new(
        FacetField::SuunnitteluttajaUser,
        facets.suunnitteluttaja_users.clone(),
      )),
      Box::new(DateRangeFilter::new(request.date_range)),
      Box::new(ExtentFilter::new(request.extent()?, request.include_items_without_geometry)),
      Box::new(ParticipantFilter::new(request.participant_user_id.clone())),
    ];
    Ok(Self { fragments })
  }

  pub fn matches(&self, row: &ObjectRow) -> bool { self.fragments.iter().all(|f| f.matches(row)) }

  /// Number of fragments that actually narrow the result.
  pub fn active_count(&self) -> usize { self.fragments.iter().filter(|f| !f.is_noop()).count() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    geometry::{Geometry, Point},
    object::ObjectUserRole,
    query::FacetFilters,
    test_support::{date, row},
    tokenize::WordTokenizer,
  };

  fn tokenizer() -> Arc<dyn Tokenizer> { Arc::new(WordTokenizer::default()) }

  fn codes(cs: &[&str]) -> BTreeSet<String> { cs.iter().map(|c| c.to_string()).collect() }

  fn compose(request: SearchRequest) -> Filter { Filter::compose(&request, tokenizer()).unwrap() }

  #[test]
  fn empty_request_matches_everything() {
    let filter = compose(SearchRequest::default());
    assert_eq!(filter.active_count(), 0);
    assert!(filter.matches(&row("Anything")));
    let mut no_geometry = row("No geometry");
    no_geometry.object.geometry = None;
    assert!(filter.matches(&no_geometry));
  }

  #[test]
  fn text_matches_by_token_prefix() {
    let f = TextFilter::new(Some("kadun"), tokenizer());
    assert!(f.matches(&row("Kadunrakennus Itäkeskus")));
    assert!(!f.matches(&row("Siltatyö")));
  }

  #[test]
  fn text_matches_literal_substring_that_does_not_tokenize() {
    let f = TextFilter::new(Some("HKR-2019/14"), tokenizer());
    assert!(f.matches(&row("Hanke HKR-2019/14 vaihe 2")));
    // Substring matching is case-sensitive; the tokens also differ.
    assert!(!f.matches(&row("Hanke hkr-2018/14")));
  }

  #[test]
  fn short_terms_still_match_with_a_minimum_length() {
    let f = TextFilter::new(Some("AB"), Arc::new(WordTokenizer { min_term_length: 3 }));
    assert!(f.matches(&row("ab kohde")));
    assert!(!f.matches(&row("abc kohde")));
  }

  #[test]
  fn text_searches_description() {
    let f = TextFilter::new(Some("viemäri"), tokenizer());
    let mut r = row("Katu");
    r.object.description = Some("Viemärin uusiminen".into());
    assert!(f.matches(&r));
  }

  #[test]
  fn multi_valued_facet_needs_any_overlap() {
    let f = FacetFilter::new(FacetField::ObjectType, codes(&["silta", "tunneli"]));
    let mut r = row("Sillat");
    r.object.object_types = vec!["katu".into(), "silta".into()];
    assert!(f.matches(&r));
    r.object.object_types = vec!["katu".into()];
    assert!(!f.matches(&r));
    r.object.object_types = vec![];
    assert!(!f.matches(&r));
  }

  #[test]
  fn single_valued_facets() {
    let mut r = row("Kohde");
    r.object.lifecycle_state = "02".into();
    r.object.rakennuttaja_user = None;

    assert!(FacetFilter::new(FacetField::LifecycleState, codes(&["01", "02"])).matches(&r));
    assert!(!FacetFilter::new(FacetField::LifecycleState, codes(&["03"])).matches(&r));
    assert!(!FacetFilter::new(FacetField::RakennuttajaUser, codes(&["u1"])).matches(&r));
    assert!(FacetFilter::new(FacetField::RakennuttajaUser, codes(&[])).matches(&r));
  }

  #[test]
  fn facet_with_unknown_codes_matches_nothing() {
    let filter = compose(SearchRequest {
      facet_filters: FacetFilters { object_stages: codes(&["no-such-stage"]), ..Default::default() },
      ..Default::default()
    });
    assert_eq!(filter.active_count(), 1);
    assert!(!filter.matches(&row("Kohde")));
  }

  #[test]
  fn date_overlap_is_closed_on_both_ends() {
    let r2020 = DateRange { start: Some(date("2020-12-31")), end: Some(date("2021-06-01")) };
    assert!(overlaps(&r2020, date("2020-01-01"), Some(date("2020-12-31"))));
    assert!(!overlaps(&r2020, date("2020-01-01"), Some(date("2020-12-30"))));

    // Symmetric: swapping which interval is the "record" gives the same answer.
    let record_as_range = DateRange { start: Some(date("2020-01-01")), end: Some(date("2020-12-31")) };
    assert!(overlaps(&record_as_range, date("2020-12-31"), Some(date("2021-06-01"))));
  }

  #[test]
  fn date_overlap_with_open_ends() {
    let from_2030 = DateRange { start: Some(date("2030-01-01")), end: None };
    assert!(overlaps(&from_2030, date("2020-01-01"), None));
    assert!(!overlaps(&from_2030, date("2020-01-01"), Some(date("2029-12-31"))));

    let until_2019 = DateRange { start: None, end: Some(date("2019-12-31")) };
    assert!(!overlaps(&until_2019, date("2020-01-01"), None));
    assert!(overlaps(&until_2019, date("2019-12-31"), None));
  }

  #[test]
  fn unbounded_date_range_is_noop() {
    let f = DateRangeFilter::new(Some(DateRange::default()));
    assert!(f.is_noop());
    assert!(f.matches(&row("Kohde")));
  }

  #[test]
  fn extent_filter_and_missing_geometry() {
    let extent = Extent { min_x: 24.0, min_y: 60.0, max_x: 25.0, max_y: 61.0 };
    let mut inside = row("Sisällä");
    inside.object.geometry = Some(Geometry::Point(Point::new(24.5, 60.5)));
    let mut outside = row("Ulkona");
    outside.object.geometry = Some(Geometry::Point(Point::new(26.0, 60.5)));
    let mut missing = row("Ei sijaintia");
    missing.object.geometry = None;

    let strict = ExtentFilter::new(Some(extent), false);
    assert!(strict.matches(&inside));
    assert!(!strict.matches(&outside));
    assert!(!strict.matches(&missing));

    let lenient = ExtentFilter::new(Some(extent), true);
    assert!(lenient.matches(&missing));
    assert!(!lenient.matches(&outside));
  }

  #[test]
  fn participant_via_fixed_roles_or_join_set() {
    let f = ParticipantFilter::new(Some("u42".into()));
    let mut r = row("Kohde");
    r.object.rakennuttaja_user = None;
    r.object.suunnitteluttaja_user = None;
    assert!(!f.matches(&r));

    r.object.suunnitteluttaja_user = Some("u42".into());
    assert!(f.matches(&r));

    r.object.suunnitteluttaja_user = None;
    r.object.user_roles = vec![
      ObjectUserRole { user_id: "u1".into(), role_id: "valvoja".into() },
      ObjectUserRole { user_id: "u42".into(), role_id: "urakoitsija".into() },
    ];
    assert!(f.matches(&r));
  }

  #[test]
  fn composition_is_a_conjunction() {
    let filter = compose(SearchRequest {
      text_query: Some("silta".into()),
      facet_filters: FacetFilters { object_stages: codes(&["rakentaminen"]), ..Default::default() },
      ..Default::default()
    });
    assert_eq!(filter.active_count(), 2);

    let mut both = row("Silta 1");
    both.object.object_stage = "rakentaminen".into();
    let mut text_only = row("Silta 2");
    text_only.object.object_stage = "suunnittelu".into();

    assert!(filter.matches(&both));
    assert!(!filter.matches(&text_only));
  }

  #[test]
  fn compose_rejects_malformed_extent() {
    let request = SearchRequest { map_extent: Some(vec![0.0; 3]), ..Default::default() };
    assert!(Filter::compose(&request, tokenizer()).is_err());
  }
}
