//! Bulletproof range proofs, 64-bit single commitment.
//!
//! Follows the secp256k1-zkp layout: a 675-byte proof holding `tau_x`,
//! `mu`, the four transcript points A/S/T1/T2, and the inner-product
//! argument. Points serialize as a quadratic-residue bit vector followed
//! by bare x-coordinates; challenges come from a SHA-256 transcript; all
//! prover randomness is drawn deterministically from the caller's nonces
//! through the ChaCha20 scalar PRF, which is what makes outputs rewindable.

use k256::{elliptic_curve::ops::MulByGenerator, ProjectivePoint, Scalar};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::chacha::scalar_chacha20;
use crate::curve::{
    generator_h, point_from_x, point_x_bytes, point_y_is_quad, scalar_from_bytes, scalar_reduce,
};
use crate::generators::bulletproof_generators;
use crate::{MwebError, Result, VerifyError};

/// Serialized size of a 64-bit single-commitment proof.
pub const PROOF_SIZE: usize = 675;

/// Bytes of caller data carried inside the proof, recoverable on rewind.
pub const PROOF_MESSAGE_SIZE: usize = 20;

const NBITS: usize = 64;
const IP_AB_SCALARS: usize = 4;

// Byte offsets within the fixed layout.
const POINTS_OFFSET: usize = 64;
const IPP_OFFSET: usize = 64 + 1 + 4 * 32;

/// A serialized range proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeProof(Vec<u8>);

impl RangeProof {
    /// Wrap proof bytes read off the wire.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The serialized proof.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Serialized length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length placeholder.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn sha256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut sha = Sha256::new();
    for part in parts {
        sha.update(part);
    }
    sha.finalize().into()
}

/// Transcript step: absorb two points, keyed by their y residue parity.
fn update_commit(commit: &[u8; 32], l: &ProjectivePoint, r: &ProjectivePoint) -> [u8; 32] {
    let parity: u8 =
        (if point_y_is_quad(l) { 0 } else { 2 }) | (if point_y_is_quad(r) { 0 } else { 1 });
    sha256_parts(&[commit, &[parity], &point_x_bytes(l), &point_x_bytes(r)])
}

/// Serialize points as a residue bit vector then bare x-coordinates.
/// Bit i is set when `points[i].y` is *not* a quadratic residue.
fn serialize_points(points: &[ProjectivePoint], out: &mut Vec<u8>) {
    let header_len = (points.len() + 7) / 8;
    let header_at = out.len();
    out.resize(out.len() + header_len, 0);
    for (i, point) in points.iter().enumerate() {
        if !point_y_is_quad(point) {
            out[header_at + i / 8] |= 1 << (i % 8);
        }
    }
    for point in points {
        out.extend_from_slice(&point_x_bytes(point));
    }
}

fn parse_points(bytes: &[u8], count: usize) -> Result<Vec<ProjectivePoint>> {
    let header_len = (count + 7) / 8;
    if bytes.len() != header_len + 32 * count {
        return Err(MwebError::Verify(VerifyError::MalformedProof));
    }
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let at = header_len + 32 * i;
        let x: [u8; 32] = bytes[at..at + 32].try_into().expect("32-byte x");
        let negate = bytes[i / 8] & (1 << (i % 8)) != 0;
        let point = point_from_x(&x, negate)
            .map_err(|_| MwebError::Verify(VerifyError::MalformedProof))?;
        points.push(point);
    }
    Ok(points)
}

/// Serialized length of the inner-product argument for vector size n.
pub fn inner_product_proof_length(n: usize) -> usize {
    if n < IP_AB_SCALARS / 2 {
        32 * (1 + 2 * n)
    } else {
        let bit_count = n.count_ones() as usize;
        let log = (usize::BITS - 1 - (2 * n / IP_AB_SCALARS).leading_zeros()) as usize;
        32 * (1 + 2 * (bit_count - 1 + log) + IP_AB_SCALARS) + (2 * log + 7) / 8
    }
}

/// Streams l(x), r(x) coefficients for j = 0..64.
///
/// `yn` starts at one (y⁰ for the first row) and `z22n` at z², doubling
/// every step to walk the z²·2^j column of the aggregated form.
struct LrGenerator {
    rewind_nonce: [u8; 32],
    value: u64,
    y: Scalar,
    z: Scalar,
    yn: Scalar,
    z22n: Scalar,
    count: usize,
}

impl LrGenerator {
    fn new(rewind_nonce: &[u8; 32], value: u64, y: &Scalar, z: &Scalar) -> Self {
        Self {
            rewind_nonce: *rewind_nonce,
            value,
            y: *y,
            z: *z,
            yn: Scalar::ONE,
            z22n: z * z,
            count: 0,
        }
    }

    fn next(&mut self, x: &Scalar) -> (Scalar, Scalar) {
        let bit = Scalar::from((self.value >> self.count) & 1);
        let (sl, sr) = scalar_chacha20(&self.rewind_nonce, self.count as u64 + 2);

        let l = bit - self.z + sl * x;
        let r = (bit - Scalar::ONE + self.z + sr * x) * self.yn + self.z22n;

        self.count += 1;
        self.yn *= self.y;
        self.z22n = self.z22n + self.z22n;
        (l, r)
    }
}

fn dot_at(rewind_nonce: &[u8; 32], value: u64, y: &Scalar, z: &Scalar, x: &Scalar) -> Scalar {
    let mut lr = LrGenerator::new(rewind_nonce, value, y, z);
    let mut acc = Scalar::ZERO;
    for _ in 0..NBITS {
        let (l, r) = lr.next(x);
        acc += l * r;
    }
    acc
}

impl RangeProof {
    /// Prove `value ∈ [0, 2^64)` for the commitment `value·H + blind·G`.
    ///
    /// `rewind_nonce` seeds alpha/rho and the s-vectors (shared with the
    /// receiver for rewinding); `private_nonce` seeds tau1/tau2 and stays
    /// with the prover. `proof_message` rides inside alpha and comes back
    /// out of a rewind.
    pub fn create(
        value: u64,
        blind: &Scalar,
        private_nonce: &[u8; 32],
        rewind_nonce: &[u8; 32],
        proof_message: &[u8; PROOF_MESSAGE_SIZE],
        extra_data: &[u8],
    ) -> Result<RangeProof> {
        let gens = bulletproof_generators();
        let h = generator_h();
        let commitment = h * Scalar::from(value) + ProjectivePoint::mul_by_generator(blind);

        let mut commit = update_commit(&[0u8; 32], &commitment, &h);
        if !extra_data.is_empty() {
            commit = sha256_parts(&[&commit, extra_data]);
        }

        let (mut alpha, mut rho) = scalar_chacha20(rewind_nonce, 0);
        let (mut tau1, mut tau2) = scalar_chacha20(private_nonce, 1);

        // Fold value ‖ message into alpha so that -mu decrypts it.
        let mut vmsg_bytes = [0u8; 32];
        vmsg_bytes[24..32].copy_from_slice(&value.to_be_bytes());
        vmsg_bytes[4..24].copy_from_slice(proof_message);
        let vmsg = scalar_from_bytes(&vmsg_bytes).expect("224-bit value is canonical");
        alpha -= vmsg;

        // A = alpha·G + Σ (bit_j ? G_j : -H_j)
        let mut a_pt = ProjectivePoint::mul_by_generator(&alpha);
        for j in 0..NBITS {
            if (value >> j) & 1 == 1 {
                a_pt += gens[j];
            } else {
                a_pt -= gens[j + 128];
            }
        }

        // S = rho·G + Σ (sl_j·G_j + sr_j·H_j)
        let mut s_pt = ProjectivePoint::mul_by_generator(&rho);
        for j in 0..NBITS {
            let (sl, sr) = scalar_chacha20(rewind_nonce, j as u64 + 2);
            s_pt += gens[j] * sl + gens[j + 128] * sr;
        }

        commit = update_commit(&commit, &a_pt, &s_pt);
        let y = scalar_reduce(&commit);
        commit = update_commit(&commit, &a_pt, &s_pt);
        let z = scalar_reduce(&commit);

        // t(x) = t0 + t1·x + t2·x² through evaluations at 0, 1, -1.
        let t0 = dot_at(rewind_nonce, value, &y, &z, &Scalar::ZERO);
        let t_plus = dot_at(rewind_nonce, value, &y, &z, &Scalar::ONE);
        let t_minus = dot_at(rewind_nonce, value, &y, &z, &(-Scalar::ONE));
        let half = crate::curve::scalar_invert(&Scalar::from(2u64))?;
        let t1 = (t_plus - t_minus) * half;
        let t2 = t1 + t_minus - t0;

        let t1_pt = ProjectivePoint::mul_by_generator(&tau1) + h * t1;
        let t2_pt = ProjectivePoint::mul_by_generator(&tau2) + h * t2;

        commit = update_commit(&commit, &t1_pt, &t2_pt);
        let x = scalar_reduce(&commit);

        // The final scalars are stored negated so the verifier adds them.
        let zsq = z * z;
        let tau_x = -(tau1 * x + tau2 * x * x + zsq * blind);
        let mu = -(rho * x + alpha);

        let tau_x_bytes: [u8; 32] = tau_x.to_bytes().into();
        let mu_bytes: [u8; 32] = mu.to_bytes().into();
        let mut proof = Vec::with_capacity(PROOF_SIZE);
        proof.extend_from_slice(&tau_x_bytes);
        proof.extend_from_slice(&mu_bytes);
        serialize_points(&[a_pt, s_pt, t1_pt, t2_pt], &mut proof);
        debug_assert_eq!(proof.len(), IPP_OFFSET);

        // Inner-product argument over l(x), r(x).
        let mut lr = LrGenerator::new(rewind_nonce, value, &y, &z);
        let mut a_vec = Vec::with_capacity(NBITS);
        let mut b_vec = Vec::with_capacity(NBITS);
        for _ in 0..NBITS {
            let (l, r) = lr.next(&x);
            a_vec.push(l);
            b_vec.push(r);
        }

        commit = sha256_parts(&[&commit, &tau_x_bytes, &mu_bytes]);
        let ux = scalar_reduce(&commit);

        let y_inv = crate::curve::scalar_invert(&y)?;
        let mut gens_g: Vec<ProjectivePoint> = gens[..NBITS].to_vec();
        let mut gens_h = Vec::with_capacity(NBITS);
        let mut y_inv_pow = Scalar::ONE;
        for j in 0..NBITS {
            gens_h.push(gens[j + 128] * y_inv_pow);
            y_inv_pow *= y_inv;
        }

        let mut dot = Scalar::ZERO;
        for (l, r) in a_vec.iter().zip(b_vec.iter()) {
            dot += l * r;
        }
        proof.extend_from_slice(&dot.to_bytes());

        let mut lr_points = Vec::new();
        let mut width = NBITS;
        while width > IP_AB_SCALARS / 2 {
            let half_width = width / 2;

            let mut cross_l = Scalar::ZERO;
            let mut cross_r = Scalar::ZERO;
            let mut l_pt = ProjectivePoint::IDENTITY;
            let mut r_pt = ProjectivePoint::IDENTITY;
            for j in 0..half_width {
                cross_l += a_vec[2 * j] * b_vec[2 * j + 1];
                cross_r += a_vec[2 * j + 1] * b_vec[2 * j];
                l_pt += gens_g[2 * j + 1] * a_vec[2 * j] + gens_h[2 * j] * b_vec[2 * j + 1];
                r_pt += gens_g[2 * j] * a_vec[2 * j + 1] + gens_h[2 * j + 1] * b_vec[2 * j];
            }
            l_pt += ProjectivePoint::mul_by_generator(&(ux * cross_l));
            r_pt += ProjectivePoint::mul_by_generator(&(ux * cross_r));

            commit = update_commit(&commit, &l_pt, &r_pt);
            let xk = scalar_reduce(&commit);
            let xk_inv = crate::curve::scalar_invert(&xk)?;
            lr_points.push(l_pt);
            lr_points.push(r_pt);

            for j in 0..half_width {
                a_vec[j] = a_vec[2 * j] * xk + a_vec[2 * j + 1] * xk_inv;
                b_vec[j] = b_vec[2 * j] * xk_inv + b_vec[2 * j + 1] * xk;
                gens_g[j] = gens_g[2 * j] * xk_inv + gens_g[2 * j + 1] * xk;
                gens_h[j] = gens_h[2 * j] * xk + gens_h[2 * j + 1] * xk_inv;
            }
            a_vec.truncate(half_width);
            b_vec.truncate(half_width);
            width = half_width;
        }

        for a in &a_vec {
            proof.extend_from_slice(&a.to_bytes());
        }
        for b in &b_vec {
            proof.extend_from_slice(&b.to_bytes());
        }
        serialize_points(&lr_points, &mut proof);

        assert_eq!(
            proof.len(),
            IPP_OFFSET + inner_product_proof_length(NBITS),
            "proof layout drifted from the fixed 675-byte form"
        );

        alpha.zeroize();
        rho.zeroize();
        tau1.zeroize();
        tau2.zeroize();
        for s in a_vec.iter_mut().chain(b_vec.iter_mut()) {
            s.zeroize();
        }
        vmsg_bytes.zeroize();

        Ok(RangeProof(proof))
    }

    /// Verify this proof against a commitment.
    pub fn verify(&self, commitment: &ProjectivePoint, extra_data: &[u8]) -> Result<()> {
        let parsed = ParsedProof::parse(&self.0)?;
        let gens = bulletproof_generators();
        let h = generator_h();

        let (y, z, x, ux, challenges) = parsed.challenges(commitment, extra_data)?;

        // Polynomial commitment check:
        // t̂·H = z²·C + δ(y,z)·H + x·T1 + x²·T2 + tau_x·G
        let zsq = z * z;
        let mut sum_y = Scalar::ZERO;
        let mut y_pow = Scalar::ONE;
        for _ in 0..NBITS {
            sum_y += y_pow;
            y_pow *= y;
        }
        let delta = (z - zsq) * sum_y - zsq * z * Scalar::from(u64::MAX);

        let lhs = h * parsed.dot;
        let rhs = *commitment * zsq
            + h * delta
            + parsed.t1_pt * x
            + parsed.t2_pt * (x * x)
            + ProjectivePoint::mul_by_generator(&parsed.tau_x);
        if lhs != rhs {
            return Err(MwebError::Verify(VerifyError::RangeProof));
        }

        // Inner-product check against the folded generators.
        let y_inv = crate::curve::scalar_invert(&y)?;
        let mut gens_g: Vec<ProjectivePoint> = gens[..NBITS].to_vec();
        let mut gens_h = Vec::with_capacity(NBITS);
        let mut y_inv_pow = Scalar::ONE;
        for j in 0..NBITS {
            gens_h.push(gens[j + 128] * y_inv_pow);
            y_inv_pow *= y_inv;
        }

        let mut p = parsed.a_pt + parsed.s_pt * x
            + ProjectivePoint::mul_by_generator(&parsed.mu)
            + ProjectivePoint::mul_by_generator(&(ux * parsed.dot));
        let mut y_pow = Scalar::ONE;
        let mut two_pow = Scalar::ONE;
        for j in 0..NBITS {
            p -= gens_g[j] * z;
            p += gens_h[j] * (z * y_pow + zsq * two_pow);
            y_pow *= y;
            two_pow = two_pow + two_pow;
        }

        let mut width = NBITS;
        for (round, xk) in challenges.iter().enumerate() {
            let half_width = width / 2;
            let xk_inv = crate::curve::scalar_invert(xk)?;
            p += parsed.lr_points[2 * round] * (xk * xk)
                + parsed.lr_points[2 * round + 1] * (xk_inv * xk_inv);
            for j in 0..half_width {
                gens_g[j] = gens_g[2 * j] * xk_inv + gens_g[2 * j + 1] * xk;
                gens_h[j] = gens_h[2 * j] * xk + gens_h[2 * j + 1] * xk_inv;
            }
            width = half_width;
        }

        let final_dot = parsed.a_fin[0] * parsed.b_fin[0] + parsed.a_fin[1] * parsed.b_fin[1];
        let expected = gens_g[0] * parsed.a_fin[0]
            + gens_g[1] * parsed.a_fin[1]
            + gens_h[0] * parsed.b_fin[0]
            + gens_h[1] * parsed.b_fin[1]
            + ProjectivePoint::mul_by_generator(&(ux * final_dot));

        if p != expected {
            return Err(MwebError::Verify(VerifyError::RangeProof));
        }
        Ok(())
    }

    /// Recover the committed value and proof message with the rewind nonce.
    ///
    /// Returns `None` when the nonce does not open this proof; scanning
    /// treats that as an unowned output, not an error.
    pub fn rewind(
        &self,
        commitment: &ProjectivePoint,
        rewind_nonce: &[u8; 32],
        extra_data: &[u8],
    ) -> Option<(u64, [u8; PROOF_MESSAGE_SIZE])> {
        let parsed = ParsedProof::parse(&self.0).ok()?;
        let (_, _, x, _, _) = parsed.challenges(commitment, extra_data).ok()?;

        let (alpha, rho) = scalar_chacha20(rewind_nonce, 0);
        let vmsg = alpha + rho * x + parsed.mu;
        let bytes = vmsg.to_bytes();
        if bytes[..4] != [0u8; 4] {
            return None;
        }

        let value = u64::from_be_bytes(bytes[24..32].try_into().expect("8-byte value"));
        let mut message = [0u8; PROOF_MESSAGE_SIZE];
        message.copy_from_slice(&bytes[4..24]);
        Some((value, message))
    }
}

struct ParsedProof {
    tau_x: Scalar,
    mu: Scalar,
    a_pt: ProjectivePoint,
    s_pt: ProjectivePoint,
    t1_pt: ProjectivePoint,
    t2_pt: ProjectivePoint,
    dot: Scalar,
    a_fin: [Scalar; 2],
    b_fin: [Scalar; 2],
    lr_points: Vec<ProjectivePoint>,
}

impl ParsedProof {
    fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PROOF_SIZE {
            return Err(MwebError::Verify(VerifyError::MalformedProof));
        }
        let scalar_at = |at: usize| -> Result<Scalar> {
            let arr: [u8; 32] = bytes[at..at + 32].try_into().expect("32-byte scalar");
            scalar_from_bytes(&arr).map_err(|_| MwebError::Verify(VerifyError::MalformedProof))
        };

        let tau_x = scalar_at(0)?;
        let mu = scalar_at(32)?;

        let head = parse_points(&bytes[POINTS_OFFSET..IPP_OFFSET], 4)?;

        let dot = scalar_at(IPP_OFFSET)?;
        let a_fin = [scalar_at(IPP_OFFSET + 32)?, scalar_at(IPP_OFFSET + 64)?];
        let b_fin = [scalar_at(IPP_OFFSET + 96)?, scalar_at(IPP_OFFSET + 128)?];
        let lr_points = parse_points(&bytes[IPP_OFFSET + 160..], 10)?;

        Ok(Self {
            tau_x,
            mu,
            a_pt: head[0],
            s_pt: head[1],
            t1_pt: head[2],
            t2_pt: head[3],
            dot,
            a_fin,
            b_fin,
            lr_points,
        })
    }

    /// Recompute every transcript challenge for this proof.
    #[allow(clippy::type_complexity)]
    fn challenges(
        &self,
        commitment: &ProjectivePoint,
        extra_data: &[u8],
    ) -> Result<(Scalar, Scalar, Scalar, Scalar, Vec<Scalar>)> {
        let h = generator_h();
        let mut commit = update_commit(&[0u8; 32], commitment, &h);
        if !extra_data.is_empty() {
            commit = sha256_parts(&[&commit, extra_data]);
        }

        commit = update_commit(&commit, &self.a_pt, &self.s_pt);
        let y = scalar_reduce(&commit);
        commit = update_commit(&commit, &self.a_pt, &self.s_pt);
        let z = scalar_reduce(&commit);
        commit = update_commit(&commit, &self.t1_pt, &self.t2_pt);
        let x = scalar_reduce(&commit);

        let tau_x_bytes: [u8; 32] = self.tau_x.to_bytes().into();
        let mu_bytes: [u8; 32] = self.mu.to_bytes().into();
        commit = sha256_parts(&[&commit, &tau_x_bytes, &mu_bytes]);
        let ux = scalar_reduce(&commit);

        if bool::from(y.is_zero()) || bool::from(z.is_zero()) || bool::from(x.is_zero()) {
            return Err(MwebError::Verify(VerifyError::MalformedProof));
        }

        let mut challenges = Vec::with_capacity(5);
        for round in 0..self.lr_points.len() / 2 {
            commit = update_commit(
                &commit,
                &self.lr_points[2 * round],
                &self.lr_points[2 * round + 1],
            );
            challenges.push(scalar_reduce(&commit));
        }
        Ok((y, z, x, ux, challenges))
    }
}
