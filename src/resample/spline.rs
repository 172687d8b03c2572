//! Cubic spline interpolation of 3-D polylines.
//!
//! [CubicSpline] interpolates locations over a strictly increasing parameter
//! (cumulative arc length when resampling) with not-a-knot end conditions:
//! the third derivative is continuous at the second and second-to-last knot.
//! With fewer knots the spline degrades gracefully:
//! * 2 knots: straight line
//! * 3 knots: the parabola through all three
//!
//! The spline is expressed through its second derivatives `M_i` at the knots,
//! found by solving a tridiagonal system (Thomas algorithm) after eliminating
//! the two not-a-knot rows.

use crate::model::Location;

/// Cubic spline through a sequence of knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Knot parameters, strictly increasing
    knots: Vec<f64>,
    /// Locations at the knots
    values: Vec<Location>,
    /// Second derivatives at the knots
    second_derivs: Vec<Location>,
}

impl CubicSpline {
    /// Fits a spline through `values` at parameters `knots`.
    ///
    /// # Returns
    /// `None` if there are fewer than two knots, the lengths differ or the
    /// knots are not strictly increasing.
    pub fn fit(knots: &[f64], values: &[Location]) -> Option<Self> {
        if knots.len() < 2 || knots.len() != values.len() {
            return None;
        }
        if knots.windows(2).any(|w| !(w[1] > w[0])) {
            return None;
        }

        let second_derivs = match knots.len() {
            2 => vec![Location::default(); 2],
            3 => {
                let h0 = knots[1] - knots[0];
                let h1 = knots[2] - knots[1];
                let rhs = slope_change(values, 1, h0, h1);
                vec![rhs * (1.0 / (3.0 * (h0 + h1))); 3]
            }
            _ => not_a_knot_second_derivs(knots, values),
        };

        if second_derivs.iter().any(|m| !m.is_finite()) {
            return None;
        }

        Some(CubicSpline {
            knots: knots.to_vec(),
            values: values.to_vec(),
            second_derivs,
        })
    }

    /// Parameter range covered by the knots.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// Evaluates the spline at `t`, clamped to the knot range.
    pub fn evaluate(&self, t: f64) -> Location {
        let (start, end) = self.domain();
        let t = t.clamp(start, end);

        // Interval i such that knots[i] <= t <= knots[i + 1]
        let i = match self.knots.partition_point(|&k| k <= t) {
            0 => 0,
            p => (p - 1).min(self.knots.len() - 2),
        };

        let h = self.knots[i + 1] - self.knots[i];
        let a = self.knots[i + 1] - t;
        let b = t - self.knots[i];
        let (m0, m1) = (self.second_derivs[i], self.second_derivs[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);

        m0 * (a * a * a / (6.0 * h))
            + m1 * (b * b * b / (6.0 * h))
            + (y0 * (1.0 / h) - m0 * (h / 6.0)) * a
            + (y1 * (1.0 / h) - m1 * (h / 6.0)) * b
    }
}

/// `6 * (slope_right - slope_left)` at knot `i`.
fn slope_change(values: &[Location], i: usize, h_left: f64, h_right: f64) -> Location {
    let right = (values[i + 1] - values[i]) * (1.0 / h_right);
    let left = (values[i] - values[i - 1]) * (1.0 / h_left);
    (right - left) * 6.0
}

/// Second derivatives for at least four knots.
fn not_a_knot_second_derivs(knots: &[f64], values: &[Location]) -> Vec<Location> {
    let n = knots.len();
    let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();

    // Unknowns M_1 ..= M_{n-2}; row j belongs to knot j + 1
    let size = n - 2;
    let mut lower = vec![0.0; size];
    let mut diag = vec![0.0; size];
    let mut upper = vec![0.0; size];
    let mut rhs = vec![Location::default(); size];

    for j in 0..size {
        let i = j + 1;
        lower[j] = h[i - 1];
        diag[j] = 2.0 * (h[i - 1] + h[i]);
        upper[j] = h[i];
        rhs[j] = slope_change(values, i, h[i - 1], h[i]);
    }

    // M_0 = ((h0 + h1) M_1 - h0 M_2) / h1
    diag[0] += h[0] * (h[0] + h[1]) / h[1];
    upper[0] -= h[0] * h[0] / h[1];
    lower[0] = 0.0;

    // M_{n-1} = ((h_{n-3} + h_{n-2}) M_{n-2} - h_{n-2} M_{n-3}) / h_{n-3}
    let (ha, hb) = (h[n - 3], h[n - 2]);
    diag[size - 1] += hb * (ha + hb) / ha;
    lower[size - 1] -= hb * hb / ha;
    upper[size - 1] = 0.0;

    let interior = solve_tridiagonal(&lower, &diag, &upper, &rhs);

    let m_first = (interior[0] * (h[0] + h[1]) - interior[1] * h[0]) * (1.0 / h[1]);
    let m_last =
        (interior[size - 1] * (ha + hb) - interior[size - 2] * hb) * (1.0 / ha);

    let mut second_derivs = Vec::with_capacity(n);
    second_derivs.push(m_first);
    second_derivs.extend(interior);
    second_derivs.push(m_last);
    second_derivs
}

/// Thomas algorithm; `lower[0]` and `upper[last]` are ignored.
fn solve_tridiagonal(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[Location]) -> Vec<Location> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![Location::default(); n];

    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] * (1.0 / diag[0]);
    for i in 1..n {
        let denom = diag[i] - lower[i] * c[i - 1];
        c[i] = if i + 1 < n { upper[i] / denom } else { 0.0 };
        d[i] = (rhs[i] - d[i - 1] * lower[i]) * (1.0 / denom);
    }

    let mut x = d;
    for i in (0..n - 1).rev() {
        x[i] = x[i] - x[i + 1] * c[i];
    }
    x
}
