use crate::shared::face_box::FaceBox;

/// Relative edge tolerance under which two candidates count as neighbors.
pub const DEFAULT_GROUPING_EPS: f64 = 0.2;

/// A raw detector hit, before neighbor grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
}

impl Candidate {
    fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    fn is_neighbor(&self, other: &Candidate, eps: f64) -> bool {
        let delta = eps * (self.width().min(other.width()) + self.height().min(other.height())) * 0.5;
        (self.x1 - other.x1).abs() <= delta
            && (self.y1 - other.y1).abs() <= delta
            && (self.x2 - other.x2).abs() <= delta
            && (self.y2 - other.y2).abs() <= delta
    }
}

/// A face agreed on by `neighbors` candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedFace {
    pub face: FaceBox,
    pub neighbors: usize,
    pub score: f64,
}

/// Clusters overlapping candidates and keeps clusters with at least
/// `min_neighbors` members (a threshold of 0 behaves like 1).
///
/// Each kept cluster is reported as the mean of its members. A cluster that
/// sits inside a larger, at-least-as-supported one is dropped. Output is
/// ordered by support, then by best score.
pub fn group_candidates(candidates: &[Candidate], min_neighbors: u32, eps: f64) -> Vec<GroupedFace> {
    let labels = partition(candidates, eps);
    let class_count = labels.iter().copied().max().map_or(0, |m| m + 1);

    let mut sums = vec![[0.0f64; 4]; class_count];
    let mut counts = vec![0usize; class_count];
    let mut best = vec![0.0f64; class_count];
    for (c, &label) in candidates.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += c.x1;
        s[1] += c.y1;
        s[2] += c.x2;
        s[3] += c.y2;
        counts[label] += 1;
        best[label] = best[label].max(c.score);
    }

    let threshold = min_neighbors.max(1) as usize;
    let groups: Vec<(Candidate, usize)> = (0..class_count)
        .filter(|&i| counts[i] >= threshold)
        .map(|i| {
            let n = counts[i] as f64;
            let mean = Candidate {
                x1: sums[i][0] / n,
                y1: sums[i][1] / n,
                x2: sums[i][2] / n,
                y2: sums[i][3] / n,
                score: best[i],
            };
            (mean, counts[i])
        })
        .collect();

    let mut faces: Vec<GroupedFace> = groups
        .iter()
        .enumerate()
        .filter(|(i, (inner, support))| {
            !groups.iter().enumerate().any(|(j, (outer, outer_support))| {
                j != *i && outer_support >= support && contains(outer, inner, eps)
            })
        })
        .map(|(_, (c, support))| GroupedFace {
            face: FaceBox::new(
                c.x1.round() as i32,
                c.y1.round() as i32,
                c.width().round() as i32,
                c.height().round() as i32,
            ),
            neighbors: *support,
            score: c.score,
        })
        .collect();

    faces.sort_by(|a, b| {
        b.neighbors.cmp(&a.neighbors).then(
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    faces
}

/// Union-find labelling of the neighbor relation. Labels are dense, in
/// order of first appearance.
fn partition(candidates: &[Candidate], eps: f64) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..candidates.len()).collect();

    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if candidates[i].is_neighbor(&candidates[j], eps) {
                let (ri, rj) = (root(&mut parent, i), root(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut dense = vec![usize::MAX; candidates.len()];
    let mut next = 0;
    (0..candidates.len())
        .map(|i| {
            let r = root(&mut parent, i);
            if dense[r] == usize::MAX {
                dense[r] = next;
                next += 1;
            }
            dense[r]
        })
        .collect()
}

fn contains(outer: &Candidate, inner: &Candidate, eps: f64) -> bool {
    let dx = outer.width() * eps;
    let dy = outer.height() * eps;
    outer.width() > inner.width()
        && inner.x1 >= outer.x1 - dx
        && inner.y1 >= outer.y1 - dy
        && inner.x2 <= outer.x2 + dx
        && inner.y2 <= outer.y2 + dy
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cand(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> Candidate {
        Candidate {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    /// `n` jittered candidates around (100,100)-(200,200).
    fn cluster(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| {
                let d = i as f64 * 2.0;
                cand(100.0 + d, 100.0 - d, 200.0 + d, 200.0 - d, 0.6 + i as f64 * 0.05)
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(group_candidates(&[], 5, DEFAULT_GROUPING_EPS).is_empty());
    }

    #[test]
    fn test_cluster_meets_threshold() {
        let faces = group_candidates(&cluster(5), 5, DEFAULT_GROUPING_EPS);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].neighbors, 5);
        // mean offset is 4px
        assert_eq!(faces[0].face, FaceBox::new(104, 96, 100, 100));
        assert_relative_eq!(faces[0].score, 0.8);
    }

    #[test]
    fn test_cluster_below_threshold_is_dropped() {
        assert!(group_candidates(&cluster(4), 5, DEFAULT_GROUPING_EPS).is_empty());
    }

    #[test]
    fn test_isolated_candidate_needs_low_threshold() {
        let mut candidates = cluster(5);
        candidates.push(cand(400.0, 50.0, 460.0, 110.0, 0.99));

        let strict = group_candidates(&candidates, 5, DEFAULT_GROUPING_EPS);
        assert_eq!(strict.len(), 1);

        let loose = group_candidates(&candidates, 1, DEFAULT_GROUPING_EPS);
        assert_eq!(loose.len(), 2);
        // ordered by support, not score
        assert_eq!(loose[0].neighbors, 5);
        assert_eq!(loose[1].face, FaceBox::new(400, 50, 60, 60));
    }

    #[test]
    fn test_zero_threshold_behaves_like_one() {
        let faces = group_candidates(&[cand(0.0, 0.0, 10.0, 10.0, 0.9)], 0, DEFAULT_GROUPING_EPS);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].neighbors, 1);
    }

    #[test]
    fn test_inner_group_is_suppressed() {
        let mut candidates = cluster(3);
        candidates.push(cand(130.0, 130.0, 170.0, 170.0, 0.9));
        let faces = group_candidates(&candidates, 1, DEFAULT_GROUPING_EPS);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].neighbors, 3);
    }

    #[test]
    fn test_neighbor_chain_joins_one_group() {
        // a~b and b~c but a and c are too far apart on their own
        let candidates = vec![
            cand(0.0, 0.0, 100.0, 100.0, 0.5),
            cand(15.0, 0.0, 115.0, 100.0, 0.5),
            cand(30.0, 0.0, 130.0, 100.0, 0.5),
        ];
        assert!(!candidates[0].is_neighbor(&candidates[2], DEFAULT_GROUPING_EPS));
        let faces = group_candidates(&candidates, 3, DEFAULT_GROUPING_EPS);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].face, FaceBox::new(15, 0, 100, 100));
    }
}
