//! Projection of gene-gene relationships onto the global axis.

use crate::coords::CoordinateTable;
use crate::error::Result;
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fmt;
use std::path::Path;

const PAIR_KEY_SEPARATOR: &str = "__";

/// Order-independent identifier of a relationship between two genes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String);

impl PairKey {
    /// Sort the two ids lexicographically and join them with `__`.
    pub fn new(gene1: &str, gene2: &str) -> Self {
        let (lo, hi) = if gene1 <= gene2 {
            (gene1, gene2)
        } else {
            (gene2, gene1)
        };
        PairKey(format!("{}{}{}", lo, PAIR_KEY_SEPARATOR, hi))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical keys of high-confidence relationships.
pub type AnchorSet = FxHashSet<PairKey>;

/// A raw relationship between two distinct genes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenePair {
    gene1: String,
    gene2: String,
}

impl GenePair {
    /// Returns `None` for a self-pair.
    pub fn new(gene1: impl Into<String>, gene2: impl Into<String>) -> Option<Self> {
        let (gene1, gene2) = (gene1.into(), gene2.into());
        if gene1 == gene2 {
            return None;
        }
        Some(GenePair { gene1, gene2 })
    }

    pub fn gene1(&self) -> &str {
        &self.gene1
    }

    pub fn gene2(&self) -> &str {
        &self.gene2
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.gene1, &self.gene2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    Background,
    Anchor,
}

impl ColorClass {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ColorClass::Background => (0, 0, 0),
            ColorClass::Anchor => (255, 0, 0),
        }
    }

    pub fn svg_name(self) -> &'static str {
        match self {
            ColorClass::Background => "black",
            ColorClass::Anchor => "red",
        }
    }
}

/// A relationship with both genes resolved on the global axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseHit {
    pub key: PairKey,
    pub gene1: String,
    pub gene2: String,
    /// coord1 of gene1
    pub x: u64,
    /// coord1 of gene2
    pub y: u64,
    pub a: u64,
    pub b: u64,
    pub is_anchor: bool,
    pub color: ColorClass,
}

impl PairwiseHit {
    fn new(pair: &GenePair, x: u64, y: u64, anchors: Option<&AnchorSet>) -> Self {
        let key = pair.key();
        let is_anchor = anchors.is_some_and(|set| set.contains(&key));
        PairwiseHit {
            gene1: pair.gene1.clone(),
            gene2: pair.gene2.clone(),
            x,
            y,
            a: x.min(y),
            b: x.max(y),
            is_anchor,
            color: if is_anchor {
                ColorClass::Anchor
            } else {
                ColorClass::Background
            },
            key,
        }
    }
}

/// Counts of the hit-resolution step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitSummary {
    pub total: usize,
    pub accepted: usize,
    pub unresolved: usize,
}

impl fmt::Display for HitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} relationships, {} accepted, {} unresolved",
            self.total, self.accepted, self.unresolved
        )
    }
}

#[derive(Debug, Clone)]
pub struct HitAssembly {
    pub accepted: Vec<PairwiseHit>,
    /// The coordinate table after the element-length filter.
    pub coords: CoordinateTable,
    pub unresolved: Vec<GenePair>,
    pub summary: HitSummary,
}

impl HitAssembly {
    pub fn anchors(&self) -> impl Iterator<Item = &PairwiseHit> {
        self.accepted.iter().filter(|h| h.is_anchor)
    }

    /// Unresolved relationships whose genes are both in `unfiltered`, i.e.
    /// the ones lost to the element-length filter rather than to unknown ids.
    pub fn filtered_out(&self, unfiltered: &CoordinateTable) -> usize {
        self.unresolved
            .iter()
            .filter(|p| unfiltered.get(&p.gene1).is_some() && unfiltered.get(&p.gene2).is_some())
            .count()
    }

    /// Unresolved relationships as a `gene1\tgene2` table with header.
    pub fn unresolved_tsv(&self) -> String {
        let mut content = String::from("gene1\tgene2\n");
        for pair in &self.unresolved {
            content.push_str(&format!("{}\t{}\n", pair.gene1, pair.gene2));
        }
        content
    }

    pub fn write_unresolved(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.unresolved_tsv())?;
        info!("Unresolved pairs saved to {:?}", path);
        Ok(())
    }
}

/// Resolve every relationship against the coordinate table.
///
/// Only features on elements longer than `min_element_length` are
/// visible to the lookup. A relationship with either gene missing ends up
/// in `unresolved`; nothing here is an error.
pub fn assemble_hits(
    coords: &CoordinateTable,
    pairs: &[GenePair],
    min_element_length: u64,
    anchors: Option<&AnchorSet>,
) -> HitAssembly {
    let filtered = coords.filter_min_length(min_element_length);

    let resolved: Vec<Option<PairwiseHit>> = pairs
        .par_iter()
        .map(|pair| {
            let x = filtered.coord1(&pair.gene1)?;
            let y = filtered.coord1(&pair.gene2)?;
            Some(PairwiseHit::new(pair, x, y, anchors))
        })
        .collect();

    let mut accepted = Vec::with_capacity(resolved.len());
    let mut unresolved = Vec::new();
    for (pair, hit) in pairs.iter().zip(resolved) {
        match hit {
            Some(hit) => accepted.push(hit),
            None => unresolved.push(pair.clone()),
        }
    }

    let summary = HitSummary {
        total: pairs.len(),
        accepted: accepted.len(),
        unresolved: unresolved.len(),
    };
    debug!(
        "Resolved hits: {} ({} anchors)",
        summary,
        accepted.iter().filter(|h| h.is_anchor).count()
    );

    HitAssembly {
        accepted,
        coords: filtered,
        unresolved,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{assemble_coordinates, RawFeature};

    fn table() -> CoordinateTable {
        let raw = vec![
            RawFeature::new("chr1", "g1", "0", "10"),
            RawFeature::new("chr1", "g2", "50", "100"),
            RawFeature::new("chr2", "g3", "10", "20"),
            RawFeature::new("chr2", "g4", "0", "50"),
            RawFeature::new("frag", "g5", "0", "5"),
        ];
        assemble_coordinates(&raw).unwrap()
    }

    fn pair(g1: &str, g2: &str) -> GenePair {
        GenePair::new(g1, g2).unwrap()
    }

    #[test]
    fn test_pair_key_is_symmetric() {
        assert_eq!(PairKey::new("g1", "g2"), PairKey::new("g2", "g1"));
        assert_eq!(PairKey::new("b", "a").as_str(), "a__b");
        assert_eq!(pair("z", "y").key().to_string(), "y__z");
    }

    #[test]
    fn test_self_pair_rejected() {
        assert!(GenePair::new("g1", "g1").is_none());
    }

    #[test]
    fn test_mirrored_pairs_canonicalize() {
        let coords = table();
        let pairs = vec![pair("g1", "g3"), pair("g3", "g1")];
        let out = assemble_hits(&coords, &pairs, 0, None);
        assert_eq!(out.accepted.len(), 2);
        let (h1, h2) = (&out.accepted[0], &out.accepted[1]);
        assert_eq!(h1.key, h2.key);
        assert_eq!((h1.a, h1.b), (h2.a, h2.b));
        assert_eq!((h1.x, h1.y), (h2.y, h2.x));
        // g3 starts at 10 on chr2, which follows chr1 (length 100)
        assert_eq!((h1.a, h1.b), (0, 110));
    }

    #[test]
    fn test_missing_gene_is_unresolved() {
        let coords = table();
        let pairs = vec![pair("g1", "g2"), pair("g1", "nope"), pair("g3", "g4")];
        let out = assemble_hits(&coords, &pairs, 0, None);
        assert_eq!(out.unresolved, vec![pair("g1", "nope")]);
        assert_eq!(
            out.summary,
            HitSummary {
                total: 3,
                accepted: 2,
                unresolved: 1
            }
        );
        assert_eq!(out.summary.accepted + out.summary.unresolved, out.summary.total);
        assert_eq!(out.unresolved_tsv(), "gene1\tgene2\ng1\tnope\n");
        assert_eq!(out.filtered_out(&coords), 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unresolved.tsv");
        out.write_unresolved(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), out.unresolved_tsv());
        assert!(out.write_unresolved(&dir.path().join("no/such/dir.tsv")).is_err());
    }

    #[test]
    fn test_length_filter_makes_hits_unresolved() {
        let coords = table();
        let pairs = vec![pair("g1", "g5"), pair("g1", "g2")];
        let out = assemble_hits(&coords, &pairs, 5, None);
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.unresolved, vec![pair("g1", "g5")]);
        assert!(out.coords.get("g5").is_none());
        assert_eq!(out.filtered_out(&coords), 1);
        assert_eq!(out.coords.elements().len(), 2);
    }

    #[test]
    fn test_anchor_membership() {
        let coords = table();
        let pairs = vec![pair("g2", "g1"), pair("g1", "g3"), pair("g4", "g2")];
        let mut anchors = AnchorSet::default();
        anchors.insert(PairKey::new("g1", "g2"));
        anchors.insert(PairKey::new("g5", "g4"));
        let out = assemble_hits(&coords, &pairs, 0, Some(&anchors));
        let flags: Vec<bool> = out.accepted.iter().map(|h| h.is_anchor).collect();
        assert_eq!(flags, vec![true, false, false]);
        assert_eq!(out.accepted[0].color, ColorClass::Anchor);
        assert_eq!(out.accepted[1].color, ColorClass::Background);
        assert_eq!(out.anchors().count(), 1);
    }

    #[test]
    fn test_canonical_order_holds() {
        let coords = table();
        let genes = ["g1", "g2", "g3", "g4", "g5"];
        let pairs: Vec<GenePair> = genes
            .iter()
            .flat_map(|a| genes.iter().filter_map(move |b| GenePair::new(*a, *b)))
            .collect();
        let out = assemble_hits(&coords, &pairs, 0, None);
        assert_eq!(out.accepted.len(), 20);
        for hit in &out.accepted {
            assert!(hit.a <= hit.b);
            assert_ne!(hit.gene1, hit.gene2);
        }
    }
}
