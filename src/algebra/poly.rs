use super::Expr;
use num_complex::Complex64;
use num_traits::{One, Zero};
use std::cmp::Ordering;

// =============================================================================
// CONFIGURATION
// =============================================================================
const MAX_DEGREE: usize = 64;
const COEFF_EPSILON: f64 = 1e-13;
const MAX_ITERATIONS: usize = 2000;
const CONVERGENCE: f64 = 1e-15;
const GCD_TOLERANCE: f64 = 1e-12;
const FACTOR_TOLERANCE: f64 = 1e-9;
const SNAP_TOLERANCE: f64 = 1e-10;

// =============================================================================
// POLYNOMIALS (ascending coefficients)
// =============================================================================
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Poly {
    coeffs: Vec<Complex64>,
}

impl Poly {
    pub fn constant(c: Complex64) -> Self {
        Poly { coeffs: vec![c] }.trimmed()
    }

    pub fn identity() -> Self {
        Poly { coeffs: vec![Complex64::zero(), Complex64::one()] }
    }

    fn trimmed(mut self) -> Self {
        let scale = self.coeffs.iter().map(|c| c.norm()).fold(0.0, f64::max);
        for c in self.coeffs.iter_mut() {
            if c.norm() <= COEFF_EPSILON * scale {
                *c = Complex64::zero();
            }
        }
        while self.coeffs.last().is_some_and(|c| c.is_zero()) {
            self.coeffs.pop();
        }
        self
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree, with the zero polynomial reported as 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn eval(&self, z: Complex64) -> Complex64 {
        self.coeffs
            .iter()
            .rev()
            .fold(Complex64::zero(), |acc, c| acc * z + *c)
    }

    fn derivative(&self) -> Poly {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| *c * i as f64)
            .collect();
        Poly { coeffs }
    }

    fn is_real(&self) -> bool {
        self.coeffs.iter().all(|c| c.im == 0.0)
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|i| {
                let a = self.coeffs.get(i).copied().unwrap_or_default();
                let b = other.coeffs.get(i).copied().unwrap_or_default();
                a + b
            })
            .collect();
        Poly { coeffs }.trimmed()
    }

    pub fn neg(&self) -> Poly {
        Poly { coeffs: self.coeffs.iter().map(|c| -*c).collect() }
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        if self.is_zero() || other.is_zero() {
            return Poly { coeffs: Vec::new() };
        }
        let mut coeffs = vec![Complex64::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += *a * *b;
            }
        }
        Poly { coeffs }.trimmed()
    }

    fn pow(&self, n: usize) -> Poly {
        (0..n).fold(Poly::constant(Complex64::one()), |acc, _| acc.mul(self))
    }

    fn monic(&self) -> Poly {
        match self.coeffs.last() {
            Some(lead) => Poly { coeffs: self.coeffs.iter().map(|c| *c / *lead).collect() },
            None => self.clone(),
        }
    }

    // coefficients at or below `tolerance * scale` are dropped
    fn chopped(mut self, scale: f64, tolerance: f64) -> Poly {
        for c in self.coeffs.iter_mut() {
            if c.norm() <= tolerance * scale {
                *c = Complex64::zero();
            }
        }
        while self.coeffs.last().is_some_and(|c| c.is_zero()) {
            self.coeffs.pop();
        }
        self
    }

    /// Quotient and remainder of long division by a nonzero `divisor`. The
    /// remainder is chopped relative to the size of `self`.
    fn div_rem(&self, divisor: &Poly, tolerance: f64) -> (Poly, Poly) {
        let n = self.degree();
        let dn = divisor.degree();
        if self.is_zero() || n < dn {
            return (Poly { coeffs: Vec::new() }, self.clone());
        }
        let lead = divisor.coeffs[dn];
        let mut rem = self.coeffs.clone();
        let mut quot = vec![Complex64::zero(); n - dn + 1];
        for k in (0..=n - dn).rev() {
            let c = rem[k + dn] / lead;
            quot[k] = c;
            for (j, d) in divisor.coeffs.iter().enumerate() {
                rem[k + j] -= c * *d;
            }
        }
        rem.truncate(dn);
        let scale = self.coeffs.iter().map(|c| c.norm()).fold(0.0, f64::max);
        (Poly { coeffs: quot }.trimmed(), Poly { coeffs: rem }.chopped(scale, tolerance))
    }
}

/// Monic greatest common divisor by the Euclidean algorithm, treating
/// remainders within `GCD_TOLERANCE` of the dividend's size as zero.
fn gcd(a: &Poly, b: &Poly) -> Poly {
    let (mut a, mut b) = (a.monic(), b.monic());
    while !b.is_zero() {
        let (_, rem) = a.div_rem(&b, GCD_TOLERANCE);
        a = b;
        b = rem.monic();
    }
    a
}

/// `p` with every repeated factor reduced to a single copy, so its roots are
/// all simple. Falls back to `p` itself when the divisor found does not
/// divide it cleanly.
fn square_free(p: &Poly) -> Poly {
    let common = gcd(p, &p.derivative());
    if common.degree() == 0 {
        return p.clone();
    }
    let (quot, rem) = p.div_rem(&common, FACTOR_TOLERANCE);
    if rem.is_zero() {
        quot
    } else {
        p.clone()
    }
}

// =============================================================================
// RATIONAL FUNCTIONS
// =============================================================================
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rational {
    pub num: Poly,
    pub den: Poly,
}

impl Rational {
    fn poly(num: Poly) -> Self {
        Rational { num, den: Poly::constant(Complex64::one()) }
    }

    fn too_large(&self) -> bool {
        self.num.degree() > MAX_DEGREE || self.den.degree() > MAX_DEGREE
    }

    fn add(&self, other: &Rational) -> Rational {
        if self.den == other.den {
            return Rational { num: self.num.add(&other.num), den: self.den.clone() };
        }
        Rational {
            num: self.num.mul(&other.den).add(&other.num.mul(&self.den)),
            den: self.den.mul(&other.den),
        }
    }

    fn neg(&self) -> Rational {
        Rational { num: self.num.neg(), den: self.den.clone() }
    }

    fn mul(&self, other: &Rational) -> Rational {
        Rational {
            num: self.num.mul(&other.num),
            den: self.den.mul(&other.den),
        }
    }

    fn recip(&self) -> Option<Rational> {
        if self.num.is_zero() {
            return None;
        }
        Some(Rational { num: self.den.clone(), den: self.num.clone() })
    }
}

/// View `expr` as a ratio of polynomials in `var`, if it is one.
///
/// Symbol-free subtrees are evaluated to coefficients; any other dependence
/// on `var` (through a function call or a non-integer power) gives `None`.
pub(crate) fn rational_form(expr: &Expr, var: &str) -> Option<Rational> {
    let result = match expr {
        e if !e.depends_on(var) => {
            let value = e.eval_constant().ok()?;
            if !value.is_finite() {
                return None;
            }
            Rational::poly(Poly::constant(value))
        }
        Expr::Var(_) => Rational::poly(Poly::identity()),
        Expr::Neg(a) => rational_form(a, var)?.neg(),
        Expr::Add(a, b) => rational_form(a, var)?.add(&rational_form(b, var)?),
        Expr::Sub(a, b) => rational_form(a, var)?.add(&rational_form(b, var)?.neg()),
        Expr::Mul(a, b) => rational_form(a, var)?.mul(&rational_form(b, var)?),
        Expr::Div(a, b) => rational_form(a, var)?.mul(&rational_form(b, var)?.recip()?),
        Expr::Pow(base, exp) if !exp.depends_on(var) => {
            let n = exp.eval_constant().ok()?;
            if n.im != 0.0 || n.re.fract() != 0.0 || n.re.abs() > MAX_DEGREE as f64 {
                return None;
            }
            let base = rational_form(base, var)?;
            let k = n.re.abs() as usize;
            let raised = Rational { num: base.num.pow(k), den: base.den.pow(k) };
            if n.re < 0.0 {
                raised.recip()?
            } else {
                raised
            }
        }
        _ => return None,
    };
    (!result.too_large()).then_some(result)
}

// =============================================================================
// ROOT FINDING
// =============================================================================

/// Distinct roots of `p`: real roots ascending, then complex roots ordered by
/// real and then imaginary part. The zero polynomial and nonzero constants
/// have no roots.
pub(crate) fn roots(p: &Poly) -> Vec<Complex64> {
    if p.degree() == 0 {
        return Vec::new();
    }

    let zeros = p.coeffs.iter().take_while(|c| c.is_zero()).count();
    let reduced = square_free(&Poly { coeffs: p.coeffs[zeros..].to_vec() });

    let mut found = match reduced.coeffs.as_slice() {
        [_] => Vec::new(),
        [c0, c1] => vec![-*c0 / *c1],
        [c, b, a] => quadratic(*a, *b, *c),
        _ => durand_kerner(&reduced),
    };
    if zeros > 0 {
        found.push(Complex64::zero());
    }

    if p.is_real() {
        for z in found.iter_mut() {
            if z.im.abs() <= SNAP_TOLERANCE * (1.0 + z.re.abs()) {
                z.im = 0.0;
            }
        }
    }

    found.sort_by(root_order);
    found
}

fn quadratic(a: Complex64, b: Complex64, c: Complex64) -> Vec<Complex64> {
    let disc = b * b - a * c * 4.0;
    if disc.is_zero() {
        return vec![-b / (a * 2.0)];
    }
    if a.im == 0.0 && b.im == 0.0 && c.im == 0.0 {
        let (a, b, c, d) = (a.re, b.re, c.re, disc.re);
        if d > 0.0 {
            // avoids cancellation between -b and sqrt(d)
            let q = -0.5 * (b + b.signum() * d.sqrt());
            let q = if b == 0.0 { -0.5 * d.sqrt() } else { q };
            return vec![Complex64::new(q / a, 0.0), Complex64::new(c / q, 0.0)];
        }
        let re = -b / (2.0 * a);
        let im = (-d).sqrt() / (2.0 * a).abs();
        return vec![Complex64::new(re, -im), Complex64::new(re, im)];
    }
    let root = disc.sqrt();
    vec![(-b - root) / (a * 2.0), (-b + root) / (a * 2.0)]
}

// expects a square-free polynomial; repeated roots stall convergence
fn durand_kerner(p: &Poly) -> Vec<Complex64> {
    let n = p.degree();
    let monic = p.monic();

    let seed = Complex64::new(0.4, 0.9);
    let mut z: Vec<Complex64> = (0..n).map(|k| seed.powi(k as i32)).collect();

    for _ in 0..MAX_ITERATIONS {
        let mut shift = 0.0_f64;
        for i in 0..n {
            let denom = (0..n)
                .filter(|&j| j != i)
                .fold(Complex64::one(), |acc, j| acc * (z[i] - z[j]));
            if denom.is_zero() {
                continue;
            }
            let delta = monic.eval(z[i]) / denom;
            if delta.is_finite() {
                z[i] -= delta;
                shift = shift.max(delta.norm() / (1.0 + z[i].norm()));
            }
        }
        if shift < CONVERGENCE {
            break;
        }
    }

    let slope = monic.derivative();
    for root in z.iter_mut() {
        for _ in 0..3 {
            let d = slope.eval(*root);
            if d.is_zero() {
                break;
            }
            let step = monic.eval(*root) / d;
            if !step.is_finite() {
                break;
            }
            *root -= step;
        }
    }
    z
}

fn root_order(a: &Complex64, b: &Complex64) -> Ordering {
    let a_real = a.im == 0.0;
    let b_real = b.im == 0.0;
    b_real
        .cmp(&a_real)
        .then(a.re.total_cmp(&b.re))
        .then(a.im.total_cmp(&b.im))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::parse;

    fn poly_roots(text: &str) -> Vec<Complex64> {
        let form = rational_form(&parse(text, &["x"]).unwrap(), "x").unwrap();
        roots(&form.num)
    }

    fn real(v: f64) -> Complex64 {
        Complex64::new(v, 0.0)
    }

    fn close(a: &[Complex64], b: &[Complex64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(p, q)| (p - q).norm() < 1e-9)
    }

    #[test]
    fn linear_and_quadratic() {
        assert_eq!(poly_roots("2x - 6"), vec![real(3.0)]);
        assert_eq!(poly_roots("x**2 - 4"), vec![real(-2.0), real(2.0)]);
        assert_eq!(
            poly_roots("x**2 + 1"),
            vec![Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0)]
        );
    }

    #[test]
    fn repeated_roots_are_reported_once() {
        assert_eq!(poly_roots("x**2"), vec![real(0.0)]);
        assert_eq!(poly_roots("(x-1)**2"), vec![real(1.0)]);
        assert!(close(&poly_roots("(x-2)**3"), &[real(2.0)]));
    }

    #[test]
    fn high_multiplicity_roots_are_reported_once() {
        assert!(close(&poly_roots("(x-1)**4"), &[real(1.0)]));
        assert!(close(&poly_roots("(x-1)**5"), &[real(1.0)]));
        assert!(close(&poly_roots("(x-2)**6"), &[real(2.0)]));
        assert!(close(&poly_roots("x**3 - 3x**2 + 3x - 1"), &[real(1.0)]));
        assert!(close(&poly_roots("(x-1)**2 * (x+1)**3"), &[real(-1.0), real(1.0)]));
        assert!(close(&poly_roots("x**2 * (x-3)**3"), &[real(0.0), real(3.0)]));
    }

    #[test]
    fn nearby_roots_stay_apart() {
        let found = poly_roots("(x-1000)(x-1000.005)");
        assert_eq!(found.len(), 2);
        assert!((found[0].re - 1000.0).abs() < 1e-6 && found[0].im == 0.0);
        assert!((found[1].re - 1000.005).abs() < 1e-6 && found[1].im == 0.0);

        let found = poly_roots("x**2 - 0.00000000001");
        assert_eq!(found.len(), 2);
        assert!((found[1].re - 1e-11_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn square_free_part_keeps_one_copy_of_each_factor() {
        let p = rational_form(&parse("(x-1)**3 * (x+2)", &["x"]).unwrap(), "x").unwrap().num;
        let q = square_free(&p);
        assert_eq!(q.degree(), 2);
        assert!(q.eval(real(1.0)).norm() < 1e-9);
        assert!(q.eval(real(-2.0)).norm() < 1e-9);
    }

    #[test]
    fn higher_degrees() {
        let found = poly_roots("(x-1)(x-2)(x-3)(x+4)");
        assert!(close(&found, &[real(-4.0), real(1.0), real(2.0), real(3.0)]));

        let found = poly_roots("x**3 - 1");
        assert_eq!(found.len(), 3);
        assert!((found[0] - real(1.0)).norm() < 1e-9);
        assert!((found[1].re + 0.5).abs() < 1e-9 && found[1].im < 0.0);
        assert!((found[2].re + 0.5).abs() < 1e-9 && found[2].im > 0.0);
    }

    #[test]
    fn constants_have_no_roots() {
        assert!(poly_roots("5").is_empty());
        assert!(poly_roots("x - x").is_empty());
    }

    #[test]
    fn rational_forms() {
        let form = rational_form(&parse("(x**2-1)/(x-1)", &["x"]).unwrap(), "x").unwrap();
        assert_eq!(form.num.degree(), 2);
        assert_eq!(form.den.degree(), 1);
        assert!(rational_form(&parse("1/x + x", &["x"]).unwrap(), "x").is_some());
        assert!(rational_form(&parse("x**-2", &["x"]).unwrap(), "x").is_some());
    }

    #[test]
    fn transcendental_dependence_is_not_rational() {
        for text in ["sin(x)", "2**x", "x**0.5", "sqrt(x)", "x**x"] {
            assert!(rational_form(&parse(text, &["x"]).unwrap(), "x").is_none(), "{text}");
        }
        assert!(rational_form(&parse("sin(2)*x", &["x"]).unwrap(), "x").is_some());
    }

    #[test]
    fn degree_is_capped() {
        assert!(rational_form(&parse("(x+1)**65", &["x"]).unwrap(), "x").is_none());
    }
}
