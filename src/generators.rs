//! Deterministic auxiliary generators for the range proof.
//!
//! `GetGenerators(n)` draws 32-byte keys from an RFC6979 DRBG seeded with
//! the affine coordinates of G, and maps each key to a curve point with
//! two Shallue–van de Woestijne evaluations (`secp256k1_generator_generate`).
//! The first half of the vector serves as the Gi basis, the second half as
//! the Hi basis.

use std::sync::OnceLock;

use k256::{FieldElement, ProjectivePoint};
use sha2::{Digest, Sha256};

use crate::curve::{is_quad, GENERATOR_G};
use crate::drbg::Rfc6979HmacSha256;

/// Generators carried for the 64-bit proof: 128 Gi + 128 Hi.
pub const GENERATOR_COUNT: usize = 256;

// sqrt(-3) mod p and (sqrt(-3) - 1) / 2, the Shallue–van de Woestijne
// constants for b = 7.
const SVW_C: [u8; 32] = [
    0x0a, 0x2d, 0x2b, 0xa9, 0x35, 0x07, 0xf1, 0xdf, 0x23, 0x37, 0x70, 0xc2, 0xa7, 0x97, 0x96,
    0x2c, 0xc6, 0x1f, 0x6d, 0x15, 0xda, 0x14, 0xec, 0xd4, 0x7d, 0x8d, 0x27, 0xae, 0x1c, 0xd5,
    0xf8, 0x52,
];
const SVW_D: [u8; 32] = [
    0x85, 0x16, 0x95, 0xd4, 0x9a, 0x83, 0xf8, 0xef, 0x91, 0x9b, 0xb8, 0x61, 0x53, 0xcb, 0xcb,
    0x16, 0x63, 0x0f, 0xb6, 0x8a, 0xed, 0x0a, 0x76, 0x6a, 0x3e, 0xc6, 0x93, 0xd6, 0x8e, 0x6a,
    0xfa, 0x40,
];

fn fe_from_bytes(bytes: &[u8; 32]) -> FieldElement {
    Option::<FieldElement>::from(FieldElement::from_bytes(&(*bytes).into()))
        .expect("hash output below the field prime")
}

fn inv0(fe: &FieldElement) -> FieldElement {
    Option::<FieldElement>::from(fe.invert())
        .unwrap_or(FieldElement::ZERO)
        .normalize()
}

fn sqrt_quad(fe: &FieldElement) -> Option<FieldElement> {
    let root = Option::<FieldElement>::from(fe.sqrt())?.normalize();
    // Return the residue root; exactly one of ±root qualifies.
    if is_quad(&root) {
        Some(root)
    } else {
        Some((-root).normalize())
    }
}

/// Map a field element to a curve point (Shallue–van de Woestijne, b = 7).
///
/// With `w = c·t / (1 + b + t²)` the candidates are `x1 = d − t·w`,
/// `x2 = −x1 − 1`, `x3 = 1 + 1/w²`; the first whose `x³ + b` is a
/// quadratic residue wins, and y is negated when t is odd.
pub fn shallue_van_de_woestijne(t: &FieldElement) -> ProjectivePoint {
    let c = fe_from_bytes(&SVW_C);
    let d = fe_from_bytes(&SVW_D);
    let b = FieldElement::from(7u64);
    let one = FieldElement::ONE;

    let t = t.normalize();
    let denom = (t.square() + one + b).normalize();
    let w = (c * t * inv0(&denom)).normalize();

    let x1 = (d - t * w).normalize();
    let x2 = (-(x1 + one).normalize()).normalize();
    let x3 = (one + inv0(&w.square().normalize())).normalize();

    for x in [x1, x2, x3] {
        let alpha = (x * x * x + b).normalize();
        if let Some(y_quad) = sqrt_quad(&alpha) {
            let y = if bool::from(t.is_odd()) {
                (-y_quad).normalize()
            } else {
                y_quad
            };
            return point_from_xy(&x, &y);
        }
    }
    // Unreachable: at least one candidate is a residue for every t.
    ProjectivePoint::IDENTITY
}

fn point_from_xy(x: &FieldElement, y: &FieldElement) -> ProjectivePoint {
    use k256::elliptic_curve::sec1::FromEncodedPoint;
    use k256::{AffinePoint, EncodedPoint};

    let mut uncompressed = [0u8; 65];
    uncompressed[0] = 0x04;
    uncompressed[1..33].copy_from_slice(&x.to_bytes());
    uncompressed[33..65].copy_from_slice(&y.to_bytes());
    let encoded = EncodedPoint::from_bytes(uncompressed).expect("65-byte encoding");
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .expect("svw output is on the curve");
    ProjectivePoint::from(affine)
}

/// Derive one auxiliary generator from a 32-byte key.
///
/// `SHA256("1st generation: " ‖ key)` and `SHA256("2nd generation: " ‖ key)`
/// are mapped to the curve and summed.
pub fn generator_generate(key: &[u8; 32]) -> ProjectivePoint {
    let mut sha = Sha256::new();
    sha.update(b"1st generation: ");
    sha.update(key);
    let t1 = fe_from_bytes(&sha.finalize().into());

    let mut sha = Sha256::new();
    sha.update(b"2nd generation: ");
    sha.update(key);
    let t2 = fe_from_bytes(&sha.finalize().into());

    shallue_van_de_woestijne(&t1) + shallue_van_de_woestijne(&t2)
}

/// Produce the first `n` generators of the deterministic vector.
pub fn get_generators(n: usize) -> Vec<ProjectivePoint> {
    let mut drbg = Rfc6979HmacSha256::new(&GENERATOR_G);
    (0..n)
        .map(|_| {
            let key = drbg.generate_32();
            generator_generate(&key)
        })
        .collect()
}

/// The shared 256-generator vector, built once.
pub fn bulletproof_generators() -> &'static [ProjectivePoint] {
    static GENS: OnceLock<Vec<ProjectivePoint>> = OnceLock::new();
    GENS.get_or_init(|| get_generators(GENERATOR_COUNT))
}
