//! Readers for the input files of a dot plot run.
//!
//! Each `read_*` function takes any `BufRead`; the `load_*` wrappers open
//! a path.

use crate::coords::RawFeature;
use crate::error::{DotplotError, Result};
use crate::hits::{AnchorSet, GenePair, PairKey};
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const ALIGNMENT_HEADER: &str = "## Alignment";

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Tab-delimited `chromosome, gene, start, stop` rows. Blank lines and
/// `#` comment lines are skipped.
///
/// Start/stop are kept raw; a value such as `1200,1250` is cleaned later
/// by the coordinate assembler.
pub fn read_feature_table<R: BufRead>(reader: R) -> Result<Vec<RawFeature>> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 4 {
            return Err(DotplotError::parse(
                i + 1,
                format!("expected 4 tab-separated columns, found {}", parts.len()),
            ));
        }
        records.push(RawFeature::new(parts[0], parts[1], parts[2], parts[3]));
    }
    Ok(records)
}

pub fn load_feature_table(path: &Path) -> Result<Vec<RawFeature>> {
    let records = read_feature_table(open(path)?)?;
    info!("Read {} features from {:?}", records.len(), path);
    Ok(records)
}

/// Outcome of looking a key up in a GFF attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeLookup<'a> {
    Found(&'a str),
    NotFound,
}

/// Find `key` among the `key=value;...` pairs of a GFF attribute column.
///
/// Every pair is examined; pairs without `=` are ignored.
pub fn find_attribute<'a>(attributes: &'a str, key: &str) -> AttributeLookup<'a> {
    attributes
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map_or(AttributeLookup::NotFound, |(_, v)| AttributeLookup::Found(v.trim()))
}

fn feature_id<'a>(attributes: &'a str, key: &str) -> Result<&'a str> {
    match find_attribute(attributes, key) {
        AttributeLookup::Found(id) => Ok(id),
        AttributeLookup::NotFound => Err(DotplotError::MissingAttribute {
            attribute: key.to_string(),
        }),
    }
}

/// Features read from a GFF3 file.
#[derive(Debug, Clone, Default)]
pub struct GffFeatures {
    pub records: Vec<RawFeature>,
    /// Rows of the requested type dropped for lacking the id attribute.
    pub missing_attribute: usize,
}

/// Select rows of `feature_type` from a GFF3 stream, naming each by its
/// `attribute` value.
pub fn read_gff<R: BufRead>(reader: R, feature_type: &str, attribute: &str) -> Result<GffFeatures> {
    let mut out = GffFeatures::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with("##FASTA") {
            break;
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 9 {
            return Err(DotplotError::parse(
                i + 1,
                format!("expected 9 GFF columns, found {}", parts.len()),
            ));
        }
        if parts[2] != feature_type {
            continue;
        }
        match feature_id(parts[8], attribute) {
            Ok(id) => out
                .records
                .push(RawFeature::new(parts[0], id, parts[3], parts[4])),
            Err(e) if !e.is_fatal() => {
                debug!("Dropping GFF line {}: {}", i + 1, e);
                out.missing_attribute += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

pub fn load_gff(path: &Path, feature_type: &str, attribute: &str) -> Result<GffFeatures> {
    let gff = read_gff(open(path)?, feature_type, attribute)?;
    info!(
        "Read {} {} features from {:?} ({} without {})",
        gff.records.len(),
        feature_type,
        path,
        gff.missing_attribute,
        attribute
    );
    Ok(gff)
}

/// Anchor pairs from a collinearity file made of `## Alignment` blocks.
///
/// Within a block, each data line names its two genes in the third and
/// fourth whitespace-separated fields. Text before the first block is
/// ignored.
pub fn read_anchor_blocks<R: BufRead>(reader: R) -> Result<AnchorSet> {
    let mut anchors = AnchorSet::default();
    let mut in_block = false;
    let mut blocks = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with(ALIGNMENT_HEADER) {
            in_block = true;
            blocks += 1;
            continue;
        }
        if !in_block || line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(DotplotError::parse(
                i + 1,
                format!("anchor line has {} fields, need at least 4", fields.len()),
            ));
        }
        anchors.insert(PairKey::new(fields[2], fields[3]));
    }
    debug!("Read {} anchors in {} blocks", anchors.len(), blocks);
    Ok(anchors)
}

pub fn load_anchor_blocks(path: &Path) -> Result<AnchorSet> {
    let anchors = read_anchor_blocks(open(path)?)?;
    info!("Read {} anchor pairs from {:?}", anchors.len(), path);
    Ok(anchors)
}

/// Two-column gene pairs, one per line. Self-pairs are skipped.
pub fn read_pairs<R: BufRead>(reader: R) -> Result<Vec<GenePair>> {
    let mut pairs = Vec::new();
    let mut self_pairs = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (g1, g2) = match (fields.next(), fields.next()) {
            (None, _) => continue,
            (Some(g1), Some(g2)) => (g1, g2),
            (Some(_), None) => {
                return Err(DotplotError::parse(i + 1, "expected two gene ids"));
            }
        };
        match GenePair::new(g1, g2) {
            Some(pair) => pairs.push(pair),
            None => self_pairs += 1,
        }
    }
    if self_pairs > 0 {
        debug!("Skipped {} self-pairs", self_pairs);
    }
    Ok(pairs)
}

pub fn load_pairs(path: &Path) -> Result<Vec<GenePair>> {
    let pairs = read_pairs(open(path)?)?;
    info!("Read {} gene pairs from {:?}", pairs.len(), path);
    Ok(pairs)
}

/// One cluster of gene ids per line; every 2-combination becomes a pair.
pub fn read_clusters<R: BufRead>(reader: R) -> Result<Vec<GenePair>> {
    let mut pairs = Vec::new();
    let mut clusters = 0usize;
    for line in reader.lines() {
        let line = line?;
        let genes: Vec<&str> = line.split_whitespace().collect();
        if genes.is_empty() {
            continue;
        }
        clusters += 1;
        for (i, g1) in genes.iter().enumerate() {
            pairs.extend(genes[i + 1..].iter().filter_map(|g2| GenePair::new(*g1, *g2)));
        }
    }
    debug!("Expanded {} clusters into {} pairs", clusters, pairs.len());
    Ok(pairs)
}

pub fn load_clusters(path: &Path) -> Result<Vec<GenePair>> {
    let pairs = read_clusters(open(path)?)?;
    info!("Read {} gene pairs from clusters in {:?}", pairs.len(), path);
    Ok(pairs)
}
