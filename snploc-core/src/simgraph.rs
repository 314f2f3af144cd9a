//! Similarity matrices and graphs.
//!
//! Input is a JSON document with a `records` list and a sparse
//! `similarities` list of `{x, y, val}` entries. The dense symmetric
//! matrix is materialized with a zeroed diagonal (self-similarity is
//! ignored), then turned into a weighted undirected graph whose edges are
//! pairs closer than a distance cutoff.
//!
//! Analyses mirror the exploratory workflow: connected components,
//! isolated nodes, maximal cliques, and a cross-file check that every
//! input produces the same isolate set.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use snploc_geno::reader::open_text;

/// Distances are clamped away from zero so fully similar pairs keep a
/// usable edge weight.
pub const MIN_DISTANCE: f64 = 1e-6;

/// Similarity to graph distance.
pub fn distance(similarity: f64) -> f64 {
    (1.0 - similarity).max(MIN_DISTANCE)
}

#[derive(Debug, Deserialize)]
pub struct RecordEntry {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarityEntry {
    pub x: usize,
    pub y: usize,
    pub val: f64,
}

/// The JSON input document.
#[derive(Debug, Deserialize)]
pub struct SimilarityDoc {
    pub records: Vec<RecordEntry>,
    pub similarities: Vec<SimilarityEntry>,
}

/// Dense symmetric similarity matrix over the document's records.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    names: Vec<String>,
    values: Vec<f64>, // row-major, n x n
}

impl SimilarityMatrix {
    /// Load and materialize a similarity JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = open_text(path)?;
        let doc: SimilarityDoc = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse similarity JSON: {}", path.display()))?;
        Self::from_doc(doc)
    }

    /// Build the dense matrix, validating indices and forcing the
    /// diagonal to zero.
    pub fn from_doc(doc: SimilarityDoc) -> Result<Self> {
        let n = doc.records.len();
        let mut values = vec![0.0; n * n];

        for entry in &doc.similarities {
            if entry.x >= n || entry.y >= n {
                bail!(
                    "Similarity entry ({}, {}) out of range for {} records",
                    entry.x,
                    entry.y,
                    n
                );
            }
            if entry.x == entry.y {
                continue; // diagonal stays zero
            }
            values[entry.x * n + entry.y] = entry.val;
            values[entry.y * n + entry.x] = entry.val;
        }

        Ok(SimilarityMatrix {
            names: doc.records.into_iter().map(|r| r.name).collect(),
            values,
        })
    }

    pub fn n(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n() + j]
    }

    /// Largest off-diagonal similarity.
    pub fn max_similarity(&self) -> f64 {
        let n = self.n();
        let mut max = 0.0f64;
        for i in 0..n {
            for j in (i + 1)..n {
                max = max.max(self.get(i, j));
            }
        }
        max
    }

    /// Write the matrix as TSV with record names on both axes.
    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "record\t{}", self.names.join("\t"))?;
        for i in 0..self.n() {
            write!(writer, "{}", self.names[i])?;
            for j in 0..self.n() {
                write!(writer, "\t{:.6}", self.get(i, j))?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// How record names become graph node labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// Use the record name unchanged.
    Full,
    /// Use the first whitespace token — the enrichment-library term
    /// convention, where names read "GO:0006955 immune response (...)".
    FirstToken,
}

impl LabelMode {
    fn apply(self, name: &str) -> String {
        match self {
            LabelMode::Full => name.to_string(),
            LabelMode::FirstToken => name
                .split_whitespace()
                .next()
                .unwrap_or(name)
                .to_string(),
        }
    }
}

/// Weighted undirected graph over (possibly relabelled) records.
///
/// Relabelling can merge records onto one node; parallel edges keep the
/// smallest distance.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    labels: Vec<String>,
    adjacency: Vec<BTreeSet<usize>>,
    /// Edge distances keyed by (min node, max node).
    edges: BTreeMap<(usize, usize), f64>,
}

impl SimilarityGraph {
    /// Build the graph from a matrix: an edge joins two labels whose
    /// distance is below `max_distance`.
    pub fn from_matrix(
        matrix: &SimilarityMatrix,
        label_mode: LabelMode,
        max_distance: f64,
    ) -> Self {
        // Unique sorted labels become the node set.
        let record_labels: Vec<String> = matrix
            .names()
            .iter()
            .map(|n| label_mode.apply(n))
            .collect();
        let labels: Vec<String> = record_labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let node_of: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut edges: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let n = matrix.n();
        for i in 0..n {
            for j in (i + 1)..n {
                let dist = distance(matrix.get(i, j));
                if dist >= max_distance {
                    continue;
                }
                let a = node_of[record_labels[i].as_str()];
                let b = node_of[record_labels[j].as_str()];
                if a == b {
                    continue; // self-loop after relabelling
                }
                let key = (a.min(b), a.max(b));
                edges
                    .entry(key)
                    .and_modify(|d| *d = d.min(dist))
                    .or_insert(dist);
            }
        }

        let mut adjacency = vec![BTreeSet::new(); labels.len()];
        for &(a, b) in edges.keys() {
            adjacency[a].insert(b);
            adjacency[b].insert(a);
        }

        SimilarityGraph {
            labels,
            adjacency,
            edges,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.labels.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    pub fn is_isolate(&self, node: usize) -> bool {
        self.adjacency[node].is_empty()
    }

    /// Nodes with no edges, ascending.
    pub fn isolates(&self) -> Vec<usize> {
        (0..self.n_nodes()).filter(|&i| self.is_isolate(i)).collect()
    }

    /// Labels of isolated nodes, sorted.
    pub fn isolate_labels(&self) -> Vec<&str> {
        self.isolates()
            .into_iter()
            .map(|i| self.labels[i].as_str())
            .collect()
    }

    /// Connected components, largest first; node lists ascending.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let n = self.n_nodes();
        let mut seen = vec![false; n];
        let mut components = Vec::new();

        for start in 0..n {
            if seen[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = std::collections::VecDeque::from([start]);
            seen[start] = true;
            while let Some(node) = queue.pop_front() {
                component.push(node);
                for &next in &self.adjacency[node] {
                    if !seen[next] {
                        seen[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
        components
    }

    /// The subgraph on non-isolated nodes, reindexed.
    pub fn without_isolates(&self) -> SimilarityGraph {
        let keep: Vec<usize> = (0..self.n_nodes()).filter(|&i| !self.is_isolate(i)).collect();
        let new_index: HashMap<usize, usize> =
            keep.iter().enumerate().map(|(new, &old)| (old, new)).collect();

        let labels = keep.iter().map(|&i| self.labels[i].clone()).collect();
        let mut edges = BTreeMap::new();
        for (&(a, b), &dist) in &self.edges {
            edges.insert((new_index[&a], new_index[&b]), dist);
        }
        let mut adjacency = vec![BTreeSet::new(); keep.len()];
        for &(a, b) in edges.keys() {
            adjacency[a].insert(b);
            adjacency[b].insert(a);
        }

        SimilarityGraph {
            labels,
            adjacency,
            edges,
        }
    }

    /// Maximal cliques via Bron-Kerbosch with pivoting, largest first.
    pub fn maximal_cliques(&self) -> Vec<Vec<usize>> {
        let mut cliques = Vec::new();
        let mut r = Vec::new();
        let p: BTreeSet<usize> = (0..self.n_nodes()).collect();
        let x = BTreeSet::new();
        self.bron_kerbosch(&mut r, p, x, &mut cliques);
        cliques.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        cliques
    }

    fn bron_kerbosch(
        &self,
        r: &mut Vec<usize>,
        mut p: BTreeSet<usize>,
        mut x: BTreeSet<usize>,
        cliques: &mut Vec<Vec<usize>>,
    ) {
        if p.is_empty() && x.is_empty() {
            let mut clique = r.clone();
            clique.sort_unstable();
            cliques.push(clique);
            return;
        }

        // Pivot on the candidate with the most neighbours in P.
        let pivot = p
            .iter()
            .chain(x.iter())
            .copied()
            .max_by_key(|&u| self.adjacency[u].intersection(&p).count());
        let candidates: Vec<usize> = match pivot {
            Some(u) => p.difference(&self.adjacency[u]).copied().collect(),
            None => p.iter().copied().collect(),
        };

        for v in candidates {
            let neighbours = &self.adjacency[v];
            r.push(v);
            self.bron_kerbosch(
                r,
                p.intersection(neighbours).copied().collect(),
                x.intersection(neighbours).copied().collect(),
                cliques,
            );
            r.pop();
            p.remove(&v);
            x.insert(v);
        }
    }

    /// Write the edge list as TSV: labels, similarity and distance.
    pub fn write_edge_list<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "a\tb\tsimilarity\tdistance")?;
        for (&(a, b), &dist) in &self.edges {
            writeln!(
                writer,
                "{}\t{}\t{:.6}\t{:.6}",
                self.labels[a],
                self.labels[b],
                1.0 - dist,
                dist
            )?;
        }
        Ok(())
    }
}

/// Do all graphs share the same isolate label set?
pub fn same_isolates(graphs: &[SimilarityGraph]) -> bool {
    let mut sets = graphs.iter().map(|g| g.isolate_labels());
    match sets.next() {
        Some(first) => sets.all(|s| s == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(names: &[&str], sims: &[(usize, usize, f64)]) -> SimilarityDoc {
        SimilarityDoc {
            records: names
                .iter()
                .map(|n| RecordEntry {
                    name: n.to_string(),
                })
                .collect(),
            similarities: sims
                .iter()
                .map(|&(x, y, val)| SimilarityEntry { x, y, val })
                .collect(),
        }
    }

    fn graph(names: &[&str], sims: &[(usize, usize, f64)]) -> SimilarityGraph {
        let matrix = SimilarityMatrix::from_doc(doc(names, sims)).unwrap();
        SimilarityGraph::from_matrix(&matrix, LabelMode::Full, 1.0)
    }

    #[test]
    fn test_matrix_symmetric_zero_diagonal() {
        let matrix = SimilarityMatrix::from_doc(doc(
            &["a", "b", "c"],
            &[(0, 1, 0.8), (1, 1, 0.9), (2, 0, 0.3)],
        ))
        .unwrap();

        assert_eq!(matrix.get(0, 1), 0.8);
        assert_eq!(matrix.get(1, 0), 0.8);
        assert_eq!(matrix.get(1, 1), 0.0); // diagonal forced to zero
        assert_eq!(matrix.get(0, 2), 0.3);
        assert!((matrix.max_similarity() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_index_out_of_range() {
        assert!(SimilarityMatrix::from_doc(doc(&["a"], &[(0, 3, 0.5)])).is_err());
    }

    #[test]
    fn test_graph_edges_and_isolates() {
        // c has zero similarity everywhere: distance 1.0, no edge.
        let g = graph(&["a", "b", "c"], &[(0, 1, 0.8)]);

        assert_eq!(g.n_nodes(), 3);
        assert_eq!(g.n_edges(), 1);
        assert_eq!(g.isolate_labels(), vec!["c"]);
        assert_eq!(g.degree(0), 1);
    }

    #[test]
    fn test_first_token_labels_merge() {
        // Two records share the first token -> one node, self-loop dropped.
        let matrix = SimilarityMatrix::from_doc(doc(
            &["GO:1 immune", "GO:1 response", "GO:2 cycle"],
            &[(0, 1, 0.9), (1, 2, 0.7)],
        ))
        .unwrap();
        let g = SimilarityGraph::from_matrix(&matrix, LabelMode::FirstToken, 1.0);

        assert_eq!(g.n_nodes(), 2);
        assert_eq!(g.labels(), &["GO:1", "GO:2"]);
        assert_eq!(g.n_edges(), 1);
    }

    #[test]
    fn test_connected_components() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[(0, 1, 0.9), (1, 2, 0.9), (3, 4, 0.5)],
        );

        let comps = g.connected_components();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0], vec![0, 1, 2]);
        assert_eq!(comps[1], vec![3, 4]);
    }

    #[test]
    fn test_without_isolates() {
        let g = graph(&["a", "b", "c"], &[(0, 1, 0.8)]);
        let sub = g.without_isolates();
        assert_eq!(sub.n_nodes(), 2);
        assert_eq!(sub.labels(), &["a", "b"]);
        assert_eq!(sub.n_edges(), 1);
        assert!(sub.isolates().is_empty());
    }

    #[test]
    fn test_maximal_cliques() {
        // Triangle a-b-c plus pendant d attached to c.
        let g = graph(
            &["a", "b", "c", "d"],
            &[(0, 1, 0.9), (0, 2, 0.9), (1, 2, 0.9), (2, 3, 0.9)],
        );

        let cliques = g.maximal_cliques();
        assert_eq!(cliques[0], vec![0, 1, 2]);
        assert!(cliques.contains(&vec![2, 3]));
        assert_eq!(cliques.len(), 2);
    }

    #[test]
    fn test_maximal_cliques_singletons() {
        let g = graph(&["a", "b"], &[]);
        let cliques = g.maximal_cliques();
        assert_eq!(cliques, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_same_isolates() {
        let g1 = graph(&["a", "b", "c"], &[(0, 1, 0.8)]);
        let g2 = graph(&["a", "b", "c"], &[(0, 1, 0.5)]);
        let g3 = graph(&["a", "b", "c"], &[(1, 2, 0.5)]);

        assert!(same_isolates(&[g1.clone(), g2]));
        assert!(!same_isolates(&[g1, g3]));
        assert!(same_isolates(&[]));
    }

    #[test]
    fn test_distance_clamped() {
        assert_eq!(distance(1.0), MIN_DISTANCE);
        assert!((distance(0.25) - 0.75).abs() < 1e-12);
    }
}
