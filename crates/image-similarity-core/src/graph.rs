use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// "This image is similar to `path`, with difference `score`"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub path: PathBuf,
    pub score: f64,
}

impl SimilarityEdge {
    pub fn new(path: impl Into<PathBuf>, score: f64) -> Self {
        Self {
            path: path.into(),
            score,
        }
    }

    /// Order edges by score alone, most similar first.
    ///
    /// Edges pointing at different images compare `Equal` when their scores
    /// match. This is deliberately not the type's `Ord`.
    pub fn cmp_by_score(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score)
    }

    /// Equality under the score ordering
    pub fn same_score(&self, other: &Self) -> bool {
        self.cmp_by_score(other) == Ordering::Equal
    }
}

/// Edges of one image, unique by target path and sorted by score.
///
/// Edges with equal scores keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarSet {
    edges: Vec<SimilarityEdge>,
}

impl SimilarSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `edge`. An existing edge to the same path is kept unless the new
    /// one scores lower. Returns whether the set changed.
    pub fn insert(&mut self, edge: SimilarityEdge) -> bool {
        if let Some(index) = self.edges.iter().position(|e| e.path == edge.path) {
            if edge.cmp_by_score(&self.edges[index]) != Ordering::Less {
                return false;
            }
            self.edges.remove(index);
        }

        let position = self
            .edges
            .partition_point(|e| e.cmp_by_score(&edge) != Ordering::Greater);
        self.edges.insert(position, edge);
        true
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimilarityEdge> {
        self.edges.iter()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn get(&self, path: &Path) -> Option<&SimilarityEdge> {
        self.edges.iter().find(|e| e.path == path)
    }

    /// The most similar image
    pub fn best(&self) -> Option<&SimilarityEdge> {
        self.edges.first()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.edges.iter().map(|e| e.path.as_path())
    }

    pub fn as_slice(&self) -> &[SimilarityEdge] {
        &self.edges
    }
}

impl<'a> IntoIterator for &'a SimilarSet {
    type Item = &'a SimilarityEdge;
    type IntoIter = std::slice::Iter<'a, SimilarityEdge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

/// Similar-sets of every image in a run, keyed by path
#[derive(Debug, Clone, Default)]
pub struct SimilarityGraph {
    nodes: BTreeMap<PathBuf, SimilarSet>,
}

impl SimilarityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image with no edges yet
    pub fn add_node(&mut self, path: &Path) {
        self.nodes.entry(path.to_path_buf()).or_default();
    }

    pub fn add_edge(&mut self, from: &Path, edge: SimilarityEdge) -> bool {
        self.nodes.entry(from.to_path_buf()).or_default().insert(edge)
    }

    pub fn get(&self, path: &Path) -> Option<&SimilarSet> {
        self.nodes.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &SimilarSet)> {
        self.nodes.iter().map(|(path, set)| (path.as_path(), set))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of recorded edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(SimilarSet::len).sum()
    }

    pub(crate) fn take(&mut self, path: &Path) -> SimilarSet {
        self.nodes.remove(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_ordering_ignores_identity() {
        let a = SimilarityEdge::new("/a.png", 0.01);
        let b = SimilarityEdge::new("/b.png", 0.01);
        let c = SimilarityEdge::new("/c.png", 0.02);

        assert!(a.same_score(&b));
        assert_ne!(a, b);
        assert_eq!(a.cmp_by_score(&c), Ordering::Less);
        assert_eq!(c.cmp_by_score(&b), Ordering::Greater);
    }

    #[test]
    fn test_similar_set_sorted_by_score() {
        let mut set = SimilarSet::new();
        set.insert(SimilarityEdge::new("/c.png", 0.015));
        set.insert(SimilarityEdge::new("/a.png", 0.0));
        set.insert(SimilarityEdge::new("/b.png", 0.015));
        set.insert(SimilarityEdge::new("/d.png", 0.005));

        let paths: Vec<&Path> = set.paths().collect();
        assert_eq!(
            paths,
            vec![
                Path::new("/a.png"),
                Path::new("/d.png"),
                Path::new("/c.png"),
                Path::new("/b.png"),
            ]
        );
        assert_eq!(set.best().unwrap().path, PathBuf::from("/a.png"));
    }

    #[test]
    fn test_similar_set_unique_by_path() {
        let mut set = SimilarSet::new();
        assert!(set.insert(SimilarityEdge::new("/a.png", 0.01)));
        assert!(!set.insert(SimilarityEdge::new("/a.png", 0.01)));
        assert!(!set.insert(SimilarityEdge::new("/a.png", 0.02)));
        assert_eq!(set.len(), 1);

        assert!(set.insert(SimilarityEdge::new("/a.png", 0.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(Path::new("/a.png")).unwrap().score, 0.0);
    }

    #[test]
    fn test_graph_keeps_empty_nodes() {
        let mut graph = SimilarityGraph::new();
        graph.add_node(Path::new("/lonely.png"));
        graph.add_edge(Path::new("/a.png"), SimilarityEdge::new("/b.png", 0.0));

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.get(Path::new("/lonely.png")).unwrap().is_empty());
        assert!(graph
            .get(Path::new("/a.png"))
            .unwrap()
            .contains(Path::new("/b.png")));
    }
}
