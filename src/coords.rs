//! Global coordinate axis for a multi-element genome.
//!
//! Every chromosome/scaffold gets a slot on one linear axis. Slots are
//! ordered by decreasing span (ties keep first-seen order) and placed
//! back to back starting at 0, so a gene's global coordinate is its local
//! position plus the offset of its element.

use crate::error::{DotplotError, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// A feature row as handed over by a loader, numeric fields still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFeature {
    pub chromosome: String,
    pub gene: String,
    pub start: String,
    pub stop: String,
}

impl RawFeature {
    pub fn new(
        chromosome: impl Into<String>,
        gene: impl Into<String>,
        start: impl Into<String>,
        stop: impl Into<String>,
    ) -> Self {
        RawFeature {
            chromosome: chromosome.into(),
            gene: gene.into(),
            start: start.into(),
            stop: stop.into(),
        }
    }
}

/// A chromosome or scaffold placed on the global axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicElement {
    pub id: String,
    /// max(stop) - min(start) over the element's features.
    pub length: u64,
    pub offset: u64,
}

impl GenomicElement {
    /// Grid-line position of the element, which is its offset.
    pub fn bound(&self) -> u64 {
        self.offset
    }

    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// A gene with both its local and its global coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub gene: String,
    pub chromosome: String,
    pub start: u64,
    pub stop: u64,
    pub coord1: u64,
    pub coord2: u64,
    pub element_length: u64,
    pub element_bound: u64,
}

/// Output of [`assemble_coordinates`]: elements in axis order and the
/// enriched features in input order, indexed by gene id.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    elements: Vec<GenomicElement>,
    features: Vec<FeatureRecord>,
    by_gene: FxHashMap<String, usize>,
}

impl CoordinateTable {
    fn from_parts(elements: Vec<GenomicElement>, features: Vec<FeatureRecord>) -> Self {
        let by_gene = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.gene.clone(), i))
            .collect();
        CoordinateTable {
            elements,
            features,
            by_gene,
        }
    }

    pub fn elements(&self) -> &[GenomicElement] {
        &self.elements
    }

    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, gene: &str) -> Option<&FeatureRecord> {
        self.by_gene.get(gene).map(|&i| &self.features[i])
    }

    pub fn coord1(&self, gene: &str) -> Option<u64> {
        self.get(gene).map(|f| f.coord1)
    }

    /// Sum of all element lengths.
    pub fn total_length(&self) -> u64 {
        self.elements.iter().map(|e| e.length).sum()
    }

    pub fn max_coord2(&self) -> Option<u64> {
        self.features.iter().map(|f| f.coord2).max()
    }

    /// Keep only features on elements strictly longer than `min_length`.
    ///
    /// Kept elements retain their offsets: the axis is not re-packed, so
    /// coordinates stay comparable with the unfiltered table.
    pub fn filter_min_length(&self, min_length: u64) -> CoordinateTable {
        let elements: Vec<GenomicElement> = self
            .elements
            .iter()
            .filter(|e| e.length > min_length)
            .cloned()
            .collect();
        let features: Vec<FeatureRecord> = self
            .features
            .iter()
            .filter(|f| f.element_length > min_length)
            .cloned()
            .collect();
        debug!(
            "Length filter > {}: kept {} of {} elements, {} of {} features",
            min_length,
            elements.len(),
            self.elements.len(),
            features.len(),
            self.features.len()
        );
        CoordinateTable::from_parts(elements, features)
    }
}

/// Strip a trailing comma-delimited suffix and parse what is left.
///
/// `"1200,1250"` and `"1200,"` both give 1200.
pub fn clean_coordinate(raw: &str) -> Option<u64> {
    raw.split(',').next().unwrap_or(raw).trim().parse().ok()
}

#[derive(Debug)]
struct ParsedFeature<'a> {
    chromosome: &'a str,
    gene: &'a str,
    start: u64,
    stop: u64,
}

fn parse_feature(raw: &RawFeature) -> Result<ParsedFeature<'_>> {
    let field = |name: &'static str, value: &str| {
        clean_coordinate(value).ok_or_else(|| DotplotError::MalformedCoordinate {
            chromosome: raw.chromosome.clone(),
            gene: raw.gene.clone(),
            field: name,
            value: value.to_string(),
        })
    };
    Ok(ParsedFeature {
        chromosome: &raw.chromosome,
        gene: &raw.gene,
        start: field("start", &raw.start)?,
        stop: field("stop", &raw.stop)?,
    })
}

/// Group features by element in first-seen order and measure each span.
fn element_spans(features: &[ParsedFeature<'_>]) -> Vec<(String, u64)> {
    let mut group_of: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (i, f) in features.iter().enumerate() {
        let g = *group_of.entry(f.chromosome).or_insert_with(|| {
            groups.push((f.chromosome, Vec::new()));
            groups.len() - 1
        });
        groups[g].1.push(i);
    }

    groups
        .par_iter()
        .map(|(chromosome, members)| {
            let min_start = members.iter().map(|&i| features[i].start).min().unwrap_or(0);
            let max_stop = members.iter().map(|&i| features[i].stop).max().unwrap_or(0);
            (chromosome.to_string(), max_stop.saturating_sub(min_start))
        })
        .collect()
}

/// Order elements by decreasing length and assign prefix-sum offsets.
///
/// `spans` must be in first-seen order; equal lengths keep that order.
/// Fails if the total axis length does not fit in a u64.
pub fn layout_elements(spans: Vec<(String, u64)>) -> Result<Vec<GenomicElement>> {
    let mut spans = spans;
    // stable sort
    spans.sort_by(|a, b| b.1.cmp(&a.1));

    let mut offset = 0u64;
    spans
        .into_iter()
        .map(|(id, length)| {
            let next = offset
                .checked_add(length)
                .ok_or_else(|| DotplotError::CoordinateOverflow { element: id.clone() })?;
            let element = GenomicElement { id, length, offset };
            offset = next;
            Ok(element)
        })
        .collect()
}

/// Build the global coordinate table from raw feature rows.
///
/// Any unparseable start/stop aborts the whole run. Repeated gene ids keep
/// their first occurrence.
pub fn assemble_coordinates(raw: &[RawFeature]) -> Result<CoordinateTable> {
    let parsed: Vec<ParsedFeature<'_>> = raw.iter().map(parse_feature).collect::<Result<_>>()?;

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut duplicates = 0usize;
    let parsed: Vec<ParsedFeature<'_>> = parsed
        .into_iter()
        .filter(|f| {
            let fresh = seen.insert(f.gene);
            if !fresh {
                duplicates += 1;
            }
            fresh
        })
        .collect();
    if duplicates > 0 {
        warn!("Ignored {} features with a repeated gene id", duplicates);
    }

    if parsed.is_empty() {
        return Err(DotplotError::EmptyInput("no features to lay out".to_string()));
    }

    let elements = layout_elements(element_spans(&parsed))?;
    let placement: FxHashMap<&str, &GenomicElement> =
        elements.iter().map(|e| (e.id.as_str(), e)).collect();

    let features: Vec<FeatureRecord> = parsed
        .iter()
        .map(|f| {
            let element = placement[f.chromosome];
            let place = |local: u64| {
                local
                    .checked_add(element.offset)
                    .ok_or_else(|| DotplotError::CoordinateOverflow {
                        element: element.id.clone(),
                    })
            };
            Ok(FeatureRecord {
                gene: f.gene.to_string(),
                chromosome: f.chromosome.to_string(),
                start: f.start,
                stop: f.stop,
                coord1: place(f.start)?,
                coord2: place(f.stop)?,
                element_length: element.length,
                element_bound: element.bound(),
            })
        })
        .collect::<Result<_>>()?;

    let table = CoordinateTable::from_parts(elements, features);
    info!(
        "Laid out {} elements, {} features, total length: {} bp",
        table.elements.len(),
        table.features.len(),
        table.total_length()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(chr: &str, gene: &str, start: &str, stop: &str) -> RawFeature {
        RawFeature::new(chr, gene, start, stop)
    }

    #[test]
    fn test_clean_coordinate() {
        assert_eq!(clean_coordinate("1200"), Some(1200));
        assert_eq!(clean_coordinate("1200,1250"), Some(1200));
        assert_eq!(clean_coordinate("1200,"), Some(1200));
        assert_eq!(clean_coordinate(" 7 "), Some(7));
        assert_eq!(clean_coordinate("abc"), None);
        assert_eq!(clean_coordinate(""), None);
        assert_eq!(clean_coordinate("-5"), None);
    }

    #[test]
    fn test_layout_two_elements() {
        let raw = vec![
            feature("small", "s0", "0", "10"),
            feature("small", "s1", "10", "20"),
            feature("small", "s2", "40", "50"),
            feature("big", "b0", "0", "60"),
            feature("big", "b1", "70", "100"),
        ];
        let table = assemble_coordinates(&raw).unwrap();
        let ids: Vec<&str> = table.elements().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["big", "small"]);
        assert_eq!(table.elements()[0].offset, 0);
        assert_eq!(table.elements()[1].offset, 100);
        assert_eq!(table.elements()[1].length, 50);

        let s1 = table.get("s1").unwrap();
        assert_eq!((s1.coord1, s1.coord2), (110, 120));
        assert_eq!(s1.element_bound, 100);
        assert_eq!(s1.element_length, 50);
        assert_eq!(table.total_length(), 150);
        assert_eq!(table.max_coord2(), Some(150));
    }

    #[test]
    fn test_equal_lengths_keep_input_order() {
        let spans = vec![
            ("c".to_string(), 5),
            ("a".to_string(), 10),
            ("b".to_string(), 5),
            ("d".to_string(), 10),
        ];
        let elements = layout_elements(spans).unwrap();
        let ids: Vec<&str> = elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d", "c", "b"]);
        let offsets: Vec<u64> = elements.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 10, 20, 25]);
        let last = elements.last().unwrap();
        assert_eq!(last.end(), 30);
    }

    #[test]
    fn test_axis_overflow_is_fatal() {
        let raw = vec![
            feature("chr1", "huge", "0", &u64::MAX.to_string()),
            feature("chr2", "g", "0", "10"),
        ];
        match assemble_coordinates(&raw) {
            Err(DotplotError::CoordinateOverflow { element }) => assert_eq!(element, "chr2"),
            other => panic!("expected CoordinateOverflow, got {:?}", other),
        }

        let spans = vec![("a".to_string(), u64::MAX), ("b".to_string(), 1)];
        assert!(matches!(
            layout_elements(spans),
            Err(DotplotError::CoordinateOverflow { .. })
        ));
        // a single element spanning the whole range still fits
        let table = assemble_coordinates(&raw[..1]).unwrap();
        assert_eq!(table.max_coord2(), Some(u64::MAX));
        assert!(!table.is_empty());
    }

    #[test]
    fn test_comma_suffixed_coordinates() {
        let raw = vec![feature("1", "g", "100,105", "200,210")];
        let table = assemble_coordinates(&raw).unwrap();
        let g = table.get("g").unwrap();
        assert_eq!((g.start, g.stop), (100, 200));
        assert_eq!(table.elements()[0].length, 100);
    }

    #[test]
    fn test_malformed_coordinate_is_fatal() {
        let raw = vec![
            feature("1", "g1", "0", "10"),
            feature("2", "g2", "x10", "20"),
        ];
        match assemble_coordinates(&raw) {
            Err(DotplotError::MalformedCoordinate {
                chromosome,
                gene,
                field,
                ..
            }) => {
                assert_eq!(chromosome, "2");
                assert_eq!(gene, "g2");
                assert_eq!(field, "start");
            }
            other => panic!("expected MalformedCoordinate, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            assemble_coordinates(&[]),
            Err(DotplotError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_duplicate_gene_keeps_first() {
        let raw = vec![
            feature("1", "g", "0", "10"),
            feature("1", "g", "50", "60"),
        ];
        let table = assemble_coordinates(&raw).unwrap();
        assert_eq!(table.features().len(), 1);
        assert_eq!(table.get("g").unwrap().start, 0);
        assert_eq!(table.elements()[0].length, 10);
    }

    #[test]
    fn test_filter_min_length() {
        let raw = vec![
            feature("big", "b", "0", "1000"),
            feature("tiny", "t", "0", "10"),
        ];
        let table = assemble_coordinates(&raw).unwrap();
        let filtered = table.filter_min_length(10);
        assert_eq!(filtered.elements().len(), 1);
        assert!(filtered.get("t").is_none());
        assert_eq!(filtered.coord1("b"), Some(0));
        // filter is strict
        assert_eq!(table.filter_min_length(9).elements().len(), 2);
    }

    #[test]
    fn test_offsets_strictly_increase() {
        let raw: Vec<RawFeature> = (0..20)
            .map(|i| feature(&format!("chr{}", i), &format!("g{}", i), "0", &format!("{}", 100 + i * 7)))
            .collect();
        let table = assemble_coordinates(&raw).unwrap();
        let elements = table.elements();
        assert_eq!(elements[0].offset, 0);
        for w in elements.windows(2) {
            assert!(w[0].length >= w[1].length);
            assert!(w[0].offset < w[1].offset);
            assert_eq!(w[0].end(), w[1].offset);
        }
        assert_eq!(elements.last().unwrap().end(), table.total_length());
        assert_eq!(table.max_coord2(), Some(table.total_length()));
    }
}
