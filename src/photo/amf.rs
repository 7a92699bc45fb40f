//! Adaptive Manifold Filter.
//!
//! An edge-aware smoother guided by a (possibly distinct) joint image. The
//! filter approximates a high-dimensional bilateral/range filter by
//! recursively splitting the image into a binary tree of low-dimensional
//! "manifolds" (via PCA of the pixel residuals), filtering each manifold
//! cheaply with a Domain Transform recursive filter on a downsampled grid,
//! then slicing the aggregated result back to full resolution.
//!
//! Reference: Gastal & Oliveira, "Adaptive Manifolds for Real-Time
//! High-Dimensional Filtering" (SIGGRAPH 2012).

use crate::core::{Mat, MatDepth};
use crate::error::{Error, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const EPS: f32 = 1e-6;

/// A single-channel, row-major float image.
///
/// Distinct from [`Mat`]: the manifold tree does float arithmetic on
/// hundreds of planes per call, and `Mat::at_f32` pays a `Result` and a
/// bounds check on every pixel for that. `Plane` is the crate's internal
/// fast path; `Mat` stays the public, depth-tagged byte buffer.
#[derive(Debug, Clone)]
pub struct Plane {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    fn mul(&self, other: &Plane) -> Plane {
        let mut out = self.clone();
        for (o, r) in out.data.iter_mut().zip(other.data.iter()) {
            *o *= r;
        }
        out
    }

    fn one_minus(&self) -> Plane {
        let mut out = self.clone();
        for v in out.data.iter_mut() {
            *v = 1.0 - *v;
        }
        out
    }

    fn fma_assign(&mut self, a: &Plane, b: &Plane) {
        for ((o, x), y) in self.data.iter_mut().zip(a.data.iter()).zip(b.data.iter()) {
            *o += x * y;
        }
    }

    fn min_in_place(&mut self, other: &Plane) {
        for (o, r) in self.data.iter_mut().zip(other.data.iter()) {
            *o = o.min(*r);
        }
    }
}

/// One plane per channel.
pub type PlaneSet = Vec<Plane>;

/// Bilinear resize of a single float plane, grounded in the same ratio
/// formula `imgproc::geometric::resize_bilinear` uses for `Mat`, without
/// the 0-255 rounding/clamping that function applies for byte images.
fn resize_plane(src: &Plane, new_width: usize, new_height: usize) -> Plane {
    if new_width == src.width && new_height == src.height {
        return src.clone();
    }

    let mut dst = Plane::new(new_width, new_height);
    let x_ratio = (src.width.saturating_sub(1)) as f32 / new_width.max(1) as f32;
    let y_ratio = (src.height.saturating_sub(1)) as f32 / new_height.max(1) as f32;

    for dy in 0..new_height {
        let src_y = dy as f32 * y_ratio;
        let y1 = src_y.floor() as usize;
        let y2 = (y1 + 1).min(src.height - 1);
        let fy = src_y - y1 as f32;

        for dx in 0..new_width {
            let src_x = dx as f32 * x_ratio;
            let x1 = src_x.floor() as usize;
            let x2 = (x1 + 1).min(src.width - 1);
            let fx = src_x - x1 as f32;

            let top = src.get(x1, y1) * (1.0 - fx) + src.get(x2, y1) * fx;
            let bot = src.get(x1, y2) * (1.0 - fx) + src.get(x2, y2) * fx;
            dst.set(dx, dy, top * (1.0 - fy) + bot * fy);
        }
    }

    dst
}

fn resize_plane_set(src: &PlaneSet, new_width: usize, new_height: usize) -> PlaneSet {
    src.iter()
        .map(|p| resize_plane(p, new_width, new_height))
        .collect()
}

/// Separable first-order recursive low-pass (the "h-filter"): two passes
/// of a leaky-integrator IIR, forward then backward, applied along rows
/// and then columns. A cheap, close approximation to Gaussian blur.
fn h_filter(src: &Plane, sigma: f64) -> Plane {
    let a = (-std::f64::consts::SQRT_2 / sigma).exp() as f32;
    let (w, h) = (src.width, src.height);
    let mut out = src.clone();

    if w > 1 {
        for y in 0..h {
            for x in 1..w {
                let (prev, cur) = (out.get(x - 1, y), out.get(x, y));
                out.set(x, y, cur + a * (prev - cur));
            }
            for x in (0..w - 1).rev() {
                let (next, cur) = (out.get(x + 1, y), out.get(x, y));
                out.set(x, y, cur + a * (next - cur));
            }
        }
    }

    if h > 1 {
        for y in 1..h {
            for x in 0..w {
                let (prev, cur) = (out.get(x, y - 1), out.get(x, y));
                out.set(x, y, cur + a * (prev - cur));
            }
        }
        for y in (0..h - 1).rev() {
            for x in 0..w {
                let (next, cur) = (out.get(x, y + 1), out.get(x, y));
                out.set(x, y, cur + a * (next - cur));
            }
        }
    }

    out
}

/// Pixelwise Gaussian range weight between a manifold centroid (`eta`) and
/// the joint image, plus the squared distance used both for the weight and
/// for outlier tracking.
fn compute_w_k(eta: &PlaneSet, joint: &PlaneSet, sigma_r_over_sqrt2: f64) -> (Plane, Plane) {
    let width = joint[0].width;
    let height = joint[0].height;
    let mut w_k = Plane::new(width, height);
    let mut d2 = Plane::new(width, height);
    let denom = 2.0 * sigma_r_over_sqrt2 * sigma_r_over_sqrt2;

    for p in 0..width * height {
        let mut d = 0.0f64;
        for c in 0..joint.len() {
            let diff = f64::from(eta[c].data[p]) - f64::from(joint[c].data[p]);
            d += diff * diff;
        }
        d2.data[p] = d as f32;
        w_k.data[p] = (-d / denom).exp() as f32;
    }

    (w_k, d2)
}

/// Separable recursive Domain Transform filter: an edge-aware smoother
/// whose per-edge feedback coefficient is derived from guide-image
/// gradients rather than a constant, so it blurs within regions and stops
/// at edges. Reusable outside the manifold pipeline.
pub struct DomainTransformFilter {
    edge_h: Vec<f32>,
    edge_v: Vec<f32>,
    width: usize,
    height: usize,
    sigma_s: f64,
    k_iterations: usize,
}

impl DomainTransformFilter {
    /// Derives the horizontal and vertical edge tables from a joint/guide
    /// image on the grid the filter will run on, then builds the filter.
    pub fn new(joint: &PlaneSet, sigma_s: f64, sigma_r: f64, k_iterations: usize) -> Self {
        let width = joint[0].width;
        let height = joint[0].height;
        let ln_alpha = -std::f64::consts::SQRT_2 / sigma_s;
        let ratio2 = (sigma_s / sigma_r).powi(2);

        let mut edge_h = vec![0.0f32; height * width.saturating_sub(1)];
        for y in 0..height {
            for x in 0..width.saturating_sub(1) {
                let mut sum_sq = 0.0f64;
                for c in joint {
                    let d = f64::from(c.get(x + 1, y) - c.get(x, y));
                    sum_sq += d * d;
                }
                let dist = (1.0 + ratio2 * sum_sq).sqrt();
                edge_h[y * (width - 1) + x] = (ln_alpha * dist).exp() as f32;
            }
        }

        let mut edge_v = vec![0.0f32; height.saturating_sub(1) * width];
        for y in 0..height.saturating_sub(1) {
            for x in 0..width {
                let mut sum_sq = 0.0f64;
                for c in joint {
                    let d = f64::from(c.get(x, y + 1) - c.get(x, y));
                    sum_sq += d * d;
                }
                let dist = (1.0 + ratio2 * sum_sq).sqrt();
                edge_v[y * width + x] = (ln_alpha * dist).exp() as f32;
            }
        }

        Self::from_edge_tables(edge_h, edge_v, width, height, sigma_s, k_iterations)
    }

    /// Builds the filter directly from precomputed edge tables, so it can
    /// be reused outside the manifold pipeline by a caller that already has
    /// (or wants to share) `adth`/`adtv`. `edge_h` must have `height *
    /// (width - 1)` entries and `edge_v` must have `(height - 1) * width`
    /// entries, in the same row-major layout `new` produces.
    pub fn from_edge_tables(
        edge_h: Vec<f32>,
        edge_v: Vec<f32>,
        width: usize,
        height: usize,
        sigma_s: f64,
        k_iterations: usize,
    ) -> Self {
        Self {
            edge_h,
            edge_v,
            width,
            height,
            sigma_s,
            k_iterations: k_iterations.max(1),
        }
    }

    /// Runs `k_iterations` alternating horizontal/vertical sweeps over
    /// `src`. With the default `k_iterations == 1` the edge tables are
    /// applied directly as the feedback coefficient (the "raw edge
    /// weights" case); for `k_iterations > 1` each pass uses the
    /// `adt[i]^scale_k` schedule of the standard multi-pass DT-RF.
    #[must_use]
    pub fn filter(&self, src: &Plane) -> Plane {
        let mut out = src.clone();
        let k = self.k_iterations;

        for iter in 1..=k {
            if k == 1 {
                self.pass_horizontal(&mut out, 1.0);
                self.pass_vertical(&mut out, 1.0);
            } else {
                let kf = k as f64;
                let scale = self.sigma_s * 3f64.sqrt() * 2f64.powf(kf - iter as f64)
                    / (4f64.powf(kf) - 1.0).sqrt();
                self.pass_horizontal(&mut out, scale);
                self.pass_vertical(&mut out, scale);
            }
        }

        out
    }

    fn pass_horizontal(&self, plane: &mut Plane, scale: f64) {
        let (w, h) = (self.width, self.height);
        if w < 2 {
            return;
        }
        for y in 0..h {
            for x in 1..w {
                let a = edge_coefficient(self.edge_h[y * (w - 1) + x - 1], scale);
                let (prev, cur) = (plane.get(x - 1, y), plane.get(x, y));
                plane.set(x, y, cur + a * (prev - cur));
            }
            for x in (0..w - 1).rev() {
                let a = edge_coefficient(self.edge_h[y * (w - 1) + x], scale);
                let (next, cur) = (plane.get(x + 1, y), plane.get(x, y));
                plane.set(x, y, cur + a * (next - cur));
            }
        }
    }

    fn pass_vertical(&self, plane: &mut Plane, scale: f64) {
        let (w, h) = (self.width, self.height);
        if h < 2 {
            return;
        }
        for y in 1..h {
            for x in 0..w {
                let a = edge_coefficient(self.edge_v[(y - 1) * w + x], scale);
                let (prev, cur) = (plane.get(x, y - 1), plane.get(x, y));
                plane.set(x, y, cur + a * (prev - cur));
            }
        }
        for y in (0..h - 1).rev() {
            for x in 0..w {
                let a = edge_coefficient(self.edge_v[y * w + x], scale);
                let (next, cur) = (plane.get(x, y + 1), plane.get(x, y));
                plane.set(x, y, cur + a * (next - cur));
            }
        }
    }
}

fn edge_coefficient(base: f32, scale: f64) -> f32 {
    if (scale - 1.0).abs() < f64::EPSILON {
        base
    } else {
        base.powf(scale as f32)
    }
}

/// Dominant eigenvector of the residual field `joint - eta_full`, restricted
/// to `mask`, via power iteration.
fn compute_eigenvector(
    eta_full: &PlaneSet,
    joint: &PlaneSet,
    mask: &[u8],
    num_pca_iterations: usize,
    use_rng: bool,
    rng: &mut SmallRng,
) -> Vec<f32> {
    let cj = joint.len();
    let mut v: Vec<f32> = (0..cj)
        .map(|c| {
            if use_rng {
                rng.gen_range(-0.5f32..0.5f32)
            } else if c % 2 == 0 {
                0.5
            } else {
                -0.5
            }
        })
        .collect();

    for _ in 0..num_pca_iterations.max(1) {
        let mut acc = vec![0.0f32; cj];
        for p in 0..mask.len() {
            if mask[p] == 0 {
                continue;
            }
            let mut dot = 0.0f32;
            for c in 0..cj {
                dot += (joint[c].data[p] - eta_full[c].data[p]) * v[c];
            }
            for c in 0..cj {
                acc[c] += dot * (joint[c].data[p] - eta_full[c].data[p]);
            }
        }
        v = acc;
    }

    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > EPS {
        for x in v.iter_mut() {
            *x /= norm;
        }
    } else {
        log::warn!("amf: eigenvector norm underflowed, degrading cluster split to one branch");
        for x in v.iter_mut() {
            *x = 0.0;
        }
    }
    v
}

/// Splits `mask` by the sign of the residual's projection onto `v`.
fn compute_clusters(
    eta_full: &PlaneSet,
    joint: &PlaneSet,
    mask: &[u8],
    v: &[f32],
) -> (Vec<u8>, Vec<u8>) {
    let n = mask.len();
    let mut minus = vec![0u8; n];
    let mut plus = vec![0u8; n];

    for p in 0..n {
        if mask[p] == 0 {
            continue;
        }
        let mut o = 0.0f32;
        for c in 0..joint.len() {
            o += (joint[c].data[p] - eta_full[c].data[p]) * v[c];
        }
        if o < 0.0 {
            minus[p] = 0xFF;
        } else {
            plus[p] = 0xFF;
        }
    }

    (minus, plus)
}

/// Weighted low-pass of the guide channels, restricted to `mask`, producing
/// the child manifold's centroid at `(small_width, small_height)`.
fn compute_eta(
    teta: &Plane,
    mask: &[u8],
    joint: &PlaneSet,
    sigma: f64,
    small_width: usize,
    small_height: usize,
) -> PlaneSet {
    let mut teta_masked = Plane::new(teta.width, teta.height);
    for p in 0..mask.len() {
        if mask[p] != 0 {
            teta_masked.data[p] = teta.data[p];
        }
    }

    let teta_small = resize_plane(&teta_masked, small_width, small_height);
    let weight = h_filter(&teta_small, sigma);

    joint
        .iter()
        .map(|channel| {
            let weighted = teta_masked.mul(channel);
            let weighted_small = resize_plane(&weighted, small_width, small_height);
            let numerator = h_filter(&weighted_small, sigma);

            let mut out = Plane::new(small_width, small_height);
            for p in 0..out.data.len() {
                let denom = weight.data[p];
                out.data[p] = if denom.abs() > EPS {
                    numerator.data[p] / denom
                } else {
                    0.0
                };
            }
            out
        })
        .collect()
}

/// Running totals the pipeline driver accumulates into at every tree node.
struct Accumulators {
    sum_wk_psi: PlaneSet,
    sum_wk: Plane,
    min_dist2: Option<Plane>,
}

struct PipelineParams<'a> {
    src: &'a PlaneSet,
    joint: &'a PlaneSet,
    width: usize,
    height: usize,
    small_width: usize,
    small_height: usize,
    df: usize,
    sigma_s: f64,
    sigma_r_over_sqrt2: f64,
    tree_height: usize,
    num_pca_iterations: usize,
    use_rng: bool,
    k_iterations: usize,
}

/// Depth-first driver over the binary manifold tree. Each call owns `eta`
/// and `cluster`; both are dropped at the end of the call (after the
/// children that need them have been built), so peak memory is
/// proportional to tree depth rather than 2^depth.
#[allow(clippy::too_many_arguments)]
fn build_manifold(
    params: &PipelineParams,
    rng: &mut SmallRng,
    acc: &mut Accumulators,
    eta: PlaneSet,
    eta_is_full_res: bool,
    cluster: Vec<u8>,
    level: usize,
) {
    log::trace!(
        "amf: node level={level} members={}",
        cluster.iter().filter(|&&m| m != 0).count()
    );

    let (eta_full, eta_small) = if eta_is_full_res {
        (eta.clone(), resize_plane_set(&eta, params.small_width, params.small_height))
    } else {
        let full = resize_plane_set(&eta, params.width, params.height);
        (full, eta)
    };

    let (w_k, d2) = compute_w_k(&eta_full, params.joint, params.sigma_r_over_sqrt2);
    if let Some(min_dist2) = &mut acc.min_dist2 {
        if level == 0 {
            *min_dist2 = d2;
        } else {
            min_dist2.min_in_place(&d2);
        }
    }

    let mut psi_splat = Vec::with_capacity(params.src.len());
    for channel in params.src {
        let weighted = channel.mul(&w_k);
        psi_splat.push(resize_plane(&weighted, params.small_width, params.small_height));
    }
    let psi_splat_0 = resize_plane(&w_k, params.small_width, params.small_height);

    let dt = DomainTransformFilter::new(
        &eta_small,
        params.sigma_s / params.df as f64,
        params.sigma_r_over_sqrt2,
        params.k_iterations,
    );

    for (c, splat) in psi_splat.iter().enumerate() {
        let blurred = dt.filter(splat);
        let upsampled = resize_plane(&blurred, params.width, params.height);
        acc.sum_wk_psi[c].fma_assign(&upsampled, &w_k);
    }
    let blurred_0 = dt.filter(&psi_splat_0);
    let upsampled_0 = resize_plane(&blurred_0, params.width, params.height);
    acc.sum_wk.fma_assign(&upsampled_0, &w_k);

    if level < params.tree_height {
        let v = compute_eigenvector(
            &eta_full,
            params.joint,
            &cluster,
            params.num_pca_iterations,
            params.use_rng,
            rng,
        );
        let (cluster_minus, cluster_plus) = compute_clusters(&eta_full, params.joint, &cluster, &v);

        let teta = w_k.one_minus();
        let eta_sigma = params.sigma_s / params.df as f64;
        let eta_minus = compute_eta(
            &teta,
            &cluster_minus,
            params.joint,
            eta_sigma,
            params.small_width,
            params.small_height,
        );
        let eta_plus = compute_eta(
            &teta,
            &cluster_plus,
            params.joint,
            eta_sigma,
            params.small_width,
            params.small_height,
        );

        drop(eta_full);
        drop(eta_small);
        drop(cluster);

        build_manifold(params, rng, acc, eta_minus, false, cluster_minus, level + 1);
        build_manifold(params, rng, acc, eta_plus, false, cluster_plus, level + 1);
    }
}

/// Divides the accumulated weighted sum by the weight sum, optionally
/// blending toward the input for pixels far from every manifold.
fn gather_result(src: &PlaneSet, acc: &Accumulators, sigma_r: f64, adjust_outliers: bool) -> PlaneSet {
    let width = acc.sum_wk.width;
    let height = acc.sum_wk.height;

    let alpha = if adjust_outliers {
        acc.min_dist2.as_ref().map(|min_dist2| {
            let denom = 2.0 * sigma_r * sigma_r;
            let mut a = Plane::new(width, height);
            for p in 0..width * height {
                a.data[p] = (-f64::from(min_dist2.data[p]) / denom).exp() as f32;
            }
            a
        })
    } else {
        None
    };

    src.iter()
        .enumerate()
        .map(|(c, src_channel)| {
            let mut out = Plane::new(width, height);
            for p in 0..width * height {
                let denom = acc.sum_wk.data[p];
                let g = if denom.abs() > EPS {
                    acc.sum_wk_psi[c].data[p] / denom
                } else {
                    log::warn!("amf: weight sum underflowed at pixel {p}, substituting zero");
                    0.0
                };
                out.data[p] = match &alpha {
                    Some(a) => a.data[p] * (g - src_channel.data[p]) + src_channel.data[p],
                    None => g,
                };
            }
            out
        })
        .collect()
}

fn compute_tree_height(sigma_s: f64, sigma_r: f64) -> usize {
    let h = ((sigma_s.log2().floor() - 1.0) * (1.0 - sigma_r)).ceil();
    h.max(2.0) as usize
}

fn pow2_floor(x: f64) -> usize {
    if x < 1.0 {
        0
    } else {
        2usize.pow(x.log2().floor() as u32)
    }
}

fn compute_df(sigma_s: f64, sigma_r: f64) -> usize {
    pow2_floor((sigma_s / 4.0).min(256.0 * sigma_r)).max(1)
}

fn derive_seed(joint: &PlaneSet, width: usize, height: usize) -> u64 {
    let seed_coef = f64::from(joint[0].get(width / 2, height / 2));
    let scale = u64::MAX as f64 / 65535.0;
    (scale * seed_coef).max(0.0) as u64
}

/// Splits a `Mat` into one normalized float [`Plane`] per channel, reusing
/// [`Mat::convert_to`]'s U8→/255, U16→/65535, F32/F64 passthrough rule.
pub fn channels_to_planes(mat: &Mat) -> Result<PlaneSet> {
    let f32_mat = mat.convert_to(MatDepth::F32)?;
    let (width, height) = (f32_mat.cols(), f32_mat.rows());
    let mut planes = Vec::with_capacity(f32_mat.channels());

    for c in 0..f32_mat.channels() {
        let mut plane = Plane::new(width, height);
        for y in 0..height {
            for x in 0..width {
                plane.set(x, y, f32_mat.at_f32(y, x, c)?);
            }
        }
        planes.push(plane);
    }

    Ok(planes)
}

/// Inverse of [`channels_to_planes`]: merges planes into an F32 `Mat`, then
/// converts to the requested output depth.
pub fn planes_to_mat(planes: &PlaneSet, depth: MatDepth) -> Result<Mat> {
    let width = planes[0].width;
    let height = planes[0].height;
    let mut f32_mat = Mat::new(height, width, planes.len(), MatDepth::F32)?;

    for (c, plane) in planes.iter().enumerate() {
        for y in 0..height {
            for x in 0..width {
                f32_mat.set_f32(y, x, c, plane.get(x, y))?;
            }
        }
    }

    f32_mat.convert_to(depth)
}

fn validate_sigma_s(sigma_s: f64) -> Result<()> {
    if sigma_s >= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "sigma_s must be >= 1, got {sigma_s}"
        )))
    }
}

fn validate_sigma_r(sigma_r: f64) -> Result<()> {
    if sigma_r > 0.0 && sigma_r <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "sigma_r must be in (0, 1], got {sigma_r}"
        )))
    }
}

/// Stateful Adaptive Manifold Filter. Construct with [`create_amf`], tune
/// with the `set_*` methods, then call [`apply`](Self::apply) or
/// [`apply_self`](Self::apply_self) for each image.
#[derive(Debug, Clone)]
pub struct AdaptiveManifoldFilter {
    sigma_s: f64,
    sigma_r: f64,
    /// `<= 0` means "compute automatically from sigma_s/sigma_r".
    tree_height: i32,
    num_pca_iterations: usize,
    adjust_outliers: bool,
    use_rng: bool,
}

impl AdaptiveManifoldFilter {
    fn new(sigma_s: f64, sigma_r: f64, adjust_outliers: bool) -> Result<Self> {
        validate_sigma_s(sigma_s)?;
        validate_sigma_r(sigma_r)?;
        Ok(Self {
            sigma_s,
            sigma_r,
            tree_height: 0,
            num_pca_iterations: 10,
            adjust_outliers,
            use_rng: true,
        })
    }

    #[must_use]
    pub fn sigma_s(&self) -> f64 {
        self.sigma_s
    }

    #[must_use]
    pub fn sigma_r(&self) -> f64 {
        self.sigma_r
    }

    #[must_use]
    pub fn tree_height(&self) -> i32 {
        self.tree_height
    }

    #[must_use]
    pub fn num_pca_iterations(&self) -> usize {
        self.num_pca_iterations
    }

    #[must_use]
    pub fn adjust_outliers(&self) -> bool {
        self.adjust_outliers
    }

    #[must_use]
    pub fn use_rng(&self) -> bool {
        self.use_rng
    }

    pub fn set_sigma_s(&mut self, sigma_s: f64) -> Result<()> {
        validate_sigma_s(sigma_s)?;
        self.sigma_s = sigma_s;
        Ok(())
    }

    pub fn set_sigma_r(&mut self, sigma_r: f64) -> Result<()> {
        validate_sigma_r(sigma_r)?;
        self.sigma_r = sigma_r;
        Ok(())
    }

    /// `height <= 0` re-enables the automatic heuristic.
    pub fn set_tree_height(&mut self, height: i32) -> Result<()> {
        self.tree_height = height;
        Ok(())
    }

    pub fn set_num_pca_iterations(&mut self, iterations: usize) -> Result<()> {
        if iterations == 0 {
            return Err(Error::InvalidParameter(
                "num_pca_iterations must be >= 1".to_string(),
            ));
        }
        self.num_pca_iterations = iterations;
        Ok(())
    }

    pub fn set_adjust_outliers(&mut self, adjust_outliers: bool) -> Result<()> {
        self.adjust_outliers = adjust_outliers;
        Ok(())
    }

    pub fn set_use_rng(&mut self, use_rng: bool) -> Result<()> {
        self.use_rng = use_rng;
        Ok(())
    }

    /// Filters `src`, guided by `joint`. `joint = None` uses `src` as its
    /// own guide (equivalent to passing the same `Mat` as both).
    pub fn apply(&mut self, src: &Mat, dst: &mut Mat, joint: Option<&Mat>) -> Result<()> {
        if src.is_empty() {
            return Err(Error::InvalidParameter("src must not be empty".to_string()));
        }
        if src.channels() == 0 {
            return Err(Error::InvalidParameter("src must have at least one channel".to_string()));
        }
        if src.depth() == MatDepth::F64 {
            return Err(Error::UnsupportedOperation(
                "AdaptiveManifoldFilter supports U8, U16 and F32 src depths".to_string(),
            ));
        }

        let joint_mat = match joint {
            Some(j) if !j.is_empty() => {
                if j.rows() != src.rows() || j.cols() != src.cols() {
                    return Err(Error::InvalidDimensions(
                        "joint must have the same size as src".to_string(),
                    ));
                }
                j
            }
            _ => src,
        };

        let width = src.cols();
        let height = src.rows();

        let src_planes = channels_to_planes(src)?;
        let joint_planes = channels_to_planes(joint_mat)?;

        let df = compute_df(self.sigma_s, self.sigma_r);
        let small_width = ((width as f64 / df as f64).round() as usize).max(1);
        let small_height = ((height as f64 / df as f64).round() as usize).max(1);
        let tree_height = if self.tree_height > 0 {
            self.tree_height as usize
        } else {
            compute_tree_height(self.sigma_s, self.sigma_r)
        };
        let sigma_r_over_sqrt2 = self.sigma_r / std::f64::consts::SQRT_2;

        log::debug!(
            "amf: {width}x{height} src ({} ch), tree_height={tree_height}, df={df}, small={small_width}x{small_height}",
            src_planes.len()
        );

        let seed = derive_seed(&joint_planes, width, height);
        let mut rng = SmallRng::seed_from_u64(seed);

        let root_eta: PlaneSet = joint_planes.iter().map(|p| h_filter(p, self.sigma_s)).collect();
        let root_cluster = vec![0xFFu8; width * height];

        let params = PipelineParams {
            src: &src_planes,
            joint: &joint_planes,
            width,
            height,
            small_width,
            small_height,
            df,
            sigma_s: self.sigma_s,
            sigma_r_over_sqrt2,
            tree_height,
            num_pca_iterations: self.num_pca_iterations,
            use_rng: self.use_rng,
            k_iterations: 1,
        };

        let mut acc = Accumulators {
            sum_wk_psi: vec![Plane::new(width, height); src_planes.len()],
            sum_wk: Plane::new(width, height),
            min_dist2: if self.adjust_outliers {
                Some(Plane::new(width, height))
            } else {
                None
            },
        };

        build_manifold(&params, &mut rng, &mut acc, root_eta, true, root_cluster, 0);

        let result_planes = gather_result(&src_planes, &acc, self.sigma_r, self.adjust_outliers);
        *dst = planes_to_mat(&result_planes, src.depth())?;
        Ok(())
    }

    /// Filters `src` using itself as the guide.
    pub fn apply_self(&mut self, src: &Mat, dst: &mut Mat) -> Result<()> {
        self.apply(src, dst, None)
    }
}

/// Constructs a filter with the given parameters, validating preconditions
/// immediately (`sigma_s >= 1`, `0 < sigma_r <= 1`).
pub fn create_amf(sigma_s: f64, sigma_r: f64, adjust_outliers: bool) -> Result<AdaptiveManifoldFilter> {
    AdaptiveManifoldFilter::new(sigma_s, sigma_r, adjust_outliers)
}

/// One-shot convenience: build a filter and apply it once.
pub fn am_filter(
    joint: &Mat,
    src: &Mat,
    dst: &mut Mat,
    sigma_s: f64,
    sigma_r: f64,
    adjust_outliers: bool,
) -> Result<()> {
    let mut filter = create_amf(sigma_s, sigma_r, adjust_outliers)?;
    filter.apply(src, dst, Some(joint))
}
