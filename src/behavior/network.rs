//! 自适应评分网络：单隐层前馈网络，逐样本在线反向传播
//!
//! 结构是单隐层网络加一条输入直连输出的线性跳连（w_d）：
//! h = tanh(W_h·x + b_h)，score = sigmoid(w_o·h + w_d·x + b_o)。
//! 随机初始化时 w_d = 0，前向与纯单隐层网络完全一致；热启动时线性策略放在 w_d 上，
//! tanh 隐层无法精确表达线性加权和。w_d 与其余参数一起训练。

use rand::Rng;

/// 行主序连续存储的二维矩阵（rows × cols）
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// 每个元素从 [-scale, scale] 均匀采样
    pub fn uniform(rows: usize, cols: usize, scale: f64, rng: &mut impl Rng) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(-scale..=scale))
            .collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|v| *v = value);
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// 输出钳制在 [ε, 1 - ε]：大激活值下 f64 会饱和成 0 或 1
pub fn sigmoid(x: f64) -> f64 {
    (1.0 / (1.0 + (-x).exp())).clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

/// 网络参数：仅由所属网络的训练步修改
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParameters {
    /// hidden_size × input_size
    pub hidden_weights: Matrix,
    pub hidden_bias: Vec<f64>,
    pub output_weights: Vec<f64>,
    /// input_size，输入直连输出
    pub direct_weights: Vec<f64>,
    pub output_bias: f64,
}

/// 单隐层 MLP（tanh 隐层 + sigmoid 输出），在线 SGD 训练
#[derive(Debug, Clone)]
pub struct AdaptiveMlp {
    input_size: usize,
    hidden_size: usize,
    learning_rate: f64,
    params: NetworkParameters,
}

impl AdaptiveMlp {
    /// 缩放均匀初始化：权重 ~ U(±1/√input_size)，偏置与直连通路为 0
    pub fn new(input_size: usize, hidden_size: usize, learning_rate: f64, rng: &mut impl Rng) -> Self {
        let scale = 1.0 / (input_size.max(1) as f64).sqrt();
        let hidden_weights = Matrix::uniform(hidden_size, input_size, scale, rng);
        let output_weights = (0..hidden_size)
            .map(|_| rng.gen_range(-scale..=scale))
            .collect();
        Self {
            input_size,
            hidden_size,
            learning_rate,
            params: NetworkParameters {
                hidden_weights,
                hidden_bias: vec![0.0; hidden_size],
                output_weights,
                direct_weights: vec![0.0; input_size],
                output_bias: 0.0,
            },
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.params
    }

    /// 前向传播，返回 (score, 隐层激活)
    pub fn forward(&self, features: &[f64]) -> (f64, Vec<f64>) {
        let p = &self.params;
        let hidden: Vec<f64> = (0..self.hidden_size)
            .map(|i| (dot(p.hidden_weights.row(i), features) + p.hidden_bias[i]).tanh())
            .collect();
        let activation =
            dot(&p.output_weights, &hidden) + dot(&p.direct_weights, features) + p.output_bias;
        (sigmoid(activation), hidden)
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.forward(features).0
    }

    /// 单样本训练：MSE 损失 0.5·(score − target)²，梯度立即生效；返回本样本损失
    pub fn train_step(&mut self, features: &[f64], target: f64) -> f64 {
        let (score, hidden) = self.forward(features);
        let error = score - target;
        let d_output = error * score * (1.0 - score);
        let lr = self.learning_rate;
        let p = &mut self.params;

        // 隐层梯度需用更新前的输出权重
        let grad_hidden: Vec<f64> = p
            .output_weights
            .iter()
            .zip(&hidden)
            .map(|(w, h)| (1.0 - h * h) * w * d_output)
            .collect();

        for (w, h) in p.output_weights.iter_mut().zip(&hidden) {
            *w -= lr * d_output * h;
        }
        for (w, x) in p.direct_weights.iter_mut().zip(features) {
            *w -= lr * d_output * x;
        }
        p.output_bias -= lr * d_output;

        for (i, grad) in grad_hidden.iter().enumerate() {
            for (w, x) in p.hidden_weights.row_mut(i).iter_mut().zip(features) {
                *w -= lr * grad * x;
            }
            p.hidden_bias[i] -= lr * grad;
        }

        0.5 * error * error
    }

    /// 线性热启动：隐层各单元只保留到第 i 个输入的恒等连接，隐层输出权重置 0，
    /// 直连通路设为给定的逐特征权重，使未训练输出等于 sigmoid(Σ wᵢ·xᵢ + bias)
    pub fn set_linear_mapping(&mut self, feature_weights: &[f64], bias: f64) {
        let p = &mut self.params;
        p.hidden_weights.fill(0.0);
        for i in 0..self.hidden_size.min(self.input_size) {
            p.hidden_weights.set(i, i, 1.0);
        }
        p.hidden_bias.iter_mut().for_each(|b| *b = 0.0);
        p.output_weights.iter_mut().for_each(|w| *w = 0.0);
        for (j, w) in p.direct_weights.iter_mut().enumerate() {
            *w = feature_weights.get(j).copied().unwrap_or(0.0);
        }
        p.output_bias = bias;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn net(seed: u64) -> AdaptiveMlp {
        let mut rng = StdRng::seed_from_u64(seed);
        AdaptiveMlp::new(8, 8, 0.05, &mut rng)
    }

    #[test]
    fn test_init_within_scale() {
        let n = net(1);
        let scale = 1.0 / 8f64.sqrt();
        let p = n.parameters();
        assert_eq!(p.hidden_weights.rows(), 8);
        assert_eq!(p.hidden_weights.cols(), 8);
        for i in 0..8 {
            assert!(p.hidden_weights.row(i).iter().all(|w| w.abs() <= scale));
        }
        assert!(p.output_weights.iter().all(|w| w.abs() <= scale));
        assert!(p.hidden_bias.iter().all(|b| *b == 0.0));
        assert_eq!(p.output_bias, 0.0);
    }

    #[test]
    fn test_predict_open_interval() {
        let n = net(2);
        for x in [[0.0; 8], [1.0; 8], [0.5; 8]] {
            let s = n.predict(&x);
            assert!(s > 0.0 && s < 1.0);
        }
    }

    #[test]
    fn test_predict_open_interval_with_saturating_weights() {
        let mut n = net(6);
        n.set_linear_mapping(&[50.0; 8], 10.0);
        let s = n.predict(&[1.0; 8]);
        assert!(s < 1.0 && s > 0.5);
        n.set_linear_mapping(&[-50.0; 8], -10.0);
        let s = n.predict(&[1.0; 8]);
        assert!(s > 0.0 && s < 0.5);
        assert!(sigmoid(1e6) < 1.0);
        assert!(sigmoid(-1e6) > 0.0);
    }

    #[test]
    fn test_random_init_is_plain_single_hidden_layer() {
        let n = net(7);
        let p = n.parameters();
        assert!(p.direct_weights.iter().all(|w| *w == 0.0));
        let x = [0.9, 0.1, 0.4, 0.6, 0.2, 0.8, 0.5, 0.3];
        let hidden: Vec<f64> = (0..8)
            .map(|i| (dot(p.hidden_weights.row(i), &x) + p.hidden_bias[i]).tanh())
            .collect();
        let expected = sigmoid(dot(&p.output_weights, &hidden) + p.output_bias);
        assert!((n.predict(&x) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_train_step_reduces_loss_on_single_example() {
        let mut n = net(3);
        let x = [1.0, 0.9, 0.8, 0.7, 0.1, 0.2, 0.3, 0.9];
        let first = n.train_step(&x, 0.95);
        let mut last = first;
        for _ in 0..200 {
            last = n.train_step(&x, 0.95);
        }
        assert!(last < first);
    }

    #[test]
    fn test_linear_mapping_matches_weighted_sum() {
        let mut n = net(4);
        let weights = [0.4, 0.3, 0.2, 0.1, -0.1, -0.1, -0.05, 0.05];
        n.set_linear_mapping(&weights, 0.2);
        let x = [1.0, 0.6, 0.5, 0.75, 0.4, 0.5, 0.5, 0.5];
        let expected = sigmoid(dot(&weights, &x) + 0.2);
        assert!((n.predict(&x) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_linear_mapping_identity_rows() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut n = AdaptiveMlp::new(8, 10, 0.05, &mut rng);
        n.set_linear_mapping(&[1.0; 8], 0.0);
        let p = n.parameters();
        for i in 0..10 {
            for j in 0..8 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(p.hidden_weights.get(i, j), expected);
            }
        }
    }
}
