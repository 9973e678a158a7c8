use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fits on the rows named by `indices`. Indices may repeat (bootstrap samples).
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], indices: &[usize], params: TreeParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        if indices.is_empty() {
            tree.nodes.push(Node::Leaf { value: 0.0 });
        } else {
            tree.grow(rows, targets, indices.to_vec(), 0, params);
        }
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, index: usize) -> usize {
        match &self.nodes[index] {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
        }
    }

    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        targets: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: TreeParams,
    ) -> usize {
        let value = indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64;
        let node_index = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        if depth >= params.max_depth || indices.len() < params.min_samples_split.max(2) {
            return node_index;
        }

        let Some(split) = best_split(rows, targets, &indices, params.min_samples_leaf.max(1)) else {
            return node_index;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| rows[i][split.feature] <= split.threshold);
        if left_indices.is_empty() || right_indices.is_empty() {
            return node_index;
        }

        let left = self.grow(rows, targets, left_indices, depth + 1, params);
        let right = self.grow(rows, targets, right_indices, depth + 1, params);
        self.nodes[node_index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_index
    }
}

fn best_split(
    rows: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    if n < min_leaf * 2 {
        return None;
    }
    let feature_count = rows.get(indices[0]).map(Vec::len).unwrap_or(0);

    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let parent_score = total_sum * total_sum / n as f64;
    let mut best: Option<SplitCandidate> = None;

    let mut order = indices.to_vec();
    for feature in 0..feature_count {
        order.sort_by(|&a, &b| {
            rows[a][feature]
                .partial_cmp(&rows[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for position in 1..n {
            left_sum += targets[order[position - 1]];
            let current = rows[order[position - 1]][feature];
            let next = rows[order[position]][feature];
            if position < min_leaf || n - position < min_leaf || current >= next {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let left_n = position as f64;
            let right_n = (n - position) as f64;
            // Maximising sum^2/n per side minimises the summed squared error.
            let gain = left_sum * left_sum / left_n + right_sum * right_sum / right_n - parent_score;
            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (current + next) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}
