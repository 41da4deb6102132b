//! # Signature authorization
//!
//! The off-chain signer approves a contributor by signing the tuple
//! `(identity, cap, phase)` with a secp256k1 key, using the same
//! personal-message scheme EVM wallets use:
//!
//! ```text
//! digest  = keccak256( xdr(identity) ‖ uint256_be(cap) ‖ uint8(phase) )
//! prehash = keccak256( "\x19Ethereum Signed Message:\n32" ‖ digest )
//! sig     = r ‖ s ‖ v            (65 bytes, v ∈ {27, 28} or {0, 1})
//! ```
//!
//! The round stores the signer as a 20-byte address
//! (`keccak256(uncompressed_pubkey[1..])[12..]`), so verification recovers
//! the public key from the signature and compares derived addresses.
//!
//! [`verify`] never panics on malformed input. Anything the host recovery
//! would reject is screened out first and reported as `false`: a bad recovery
//! byte, a zero or out-of-range scalar, a high-`s` (malleable) signature, or
//! an `r` that is not the x-coordinate of any curve point.

use soroban_sdk::{crypto::Hash, xdr::ToXdr, Address, Bytes, BytesN, Env};

use crate::types::Phase;

const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// secp256k1 group order `n`, big-endian.
const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// `n / 2`, big-endian. Signatures with `s` above this are malleable.
const HALF_CURVE_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Field prime `p = 2^256 - 2^32 - 977`, little-endian 64-bit limbs.
const FIELD_PRIME: [u64; 4] = [
    0xffff_fffe_ffff_fc2f,
    0xffff_ffff_ffff_ffff,
    0xffff_ffff_ffff_ffff,
    0xffff_ffff_ffff_ffff,
];

/// `(p - 1) / 2`, the Euler's criterion exponent.
const HALF_FIELD_PRIME: [u64; 4] = [
    0xffff_ffff_7fff_fe17,
    0xffff_ffff_ffff_ffff,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
];

/// `2^256 mod p`.
const FIELD_FOLD: u128 = 0x1_0000_03d1;

/// Packed message digest over `(identity, cap, phase)`.
pub fn message_digest(env: &Env, identity: &Address, cap: i128, phase: Phase) -> Hash<32> {
    let mut cap_word = [0u8; 32];
    cap_word[16..].copy_from_slice(&cap.to_be_bytes());

    let mut packed = identity.clone().to_xdr(env);
    packed.extend_from_array(&cap_word);
    packed.push_back(phase.as_u8());
    env.crypto().keccak256(&packed)
}

/// Apply the signed-message envelope to a 32-byte digest.
pub fn signed_message_hash(env: &Env, digest: &Hash<32>) -> Hash<32> {
    let mut message = Bytes::from_slice(env, SIGNED_MESSAGE_PREFIX);
    message.extend_from_array(&digest.to_array());
    env.crypto().keccak256(&message)
}

/// Derive the 20-byte signer address of an uncompressed SEC1 public key.
pub fn address_from_public_key(env: &Env, public_key: &BytesN<65>) -> BytesN<20> {
    let encoded = public_key.to_array();
    let hash = env
        .crypto()
        .keccak256(&Bytes::from_slice(env, &encoded[1..]))
        .to_array();
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    BytesN::from_array(env, &address)
}

/// Recover the address that produced `signature` over `(identity, cap, phase)`.
///
/// Returns `None` for any signature the host would refuse to recover from.
pub fn recover_signer(
    env: &Env,
    identity: &Address,
    cap: i128,
    phase: Phase,
    signature: &BytesN<65>,
) -> Option<BytesN<20>> {
    if cap < 0 {
        return None;
    }

    let raw = signature.to_array();
    let recovery_id = match raw[64] {
        27 | 28 => raw[64] - 27,
        0 | 1 => raw[64],
        _ => return None,
    };

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&raw[..32]);
    s.copy_from_slice(&raw[32..64]);
    if !scalar_in_range(&r) || !scalar_in_range(&s) || s > HALF_CURVE_ORDER {
        return None;
    }
    if !is_curve_x(&r) {
        return None;
    }

    let mut compact = [0u8; 64];
    compact.copy_from_slice(&raw[..64]);

    let digest = message_digest(env, identity, cap, phase);
    let prehash = signed_message_hash(env, &digest);
    let public_key = env.crypto().secp256k1_recover(
        &prehash,
        &BytesN::from_array(env, &compact),
        recovery_id as u32,
    );
    Some(address_from_public_key(env, &public_key))
}

/// Returns whether `signature` over `(identity, cap, phase)` was produced by `signer`.
pub fn verify(
    env: &Env,
    signer: &BytesN<20>,
    identity: &Address,
    cap: i128,
    phase: Phase,
    signature: &BytesN<65>,
) -> bool {
    match recover_signer(env, identity, cap, phase, signature) {
        Some(recovered) => &recovered == signer,
        None => false,
    }
}

/// `0 < scalar < n`
fn scalar_in_range(scalar: &[u8; 32]) -> bool {
    scalar.iter().any(|b| *b != 0) && *scalar < CURVE_ORDER
}

/// Whether some point on `y² = x³ + 7` has x-coordinate `x`. Requires `x < p`,
/// which holds for any `x < n`.
///
/// `x³ + 7` is never zero mod p (the group has no point of order two), so
/// Euler's criterion gives an exact answer.
fn is_curve_x(x: &[u8; 32]) -> bool {
    let x = limbs_from_be(x);
    let rhs = field_add_small(&field_mul(&field_mul(&x, &x), &x), 7);
    field_pow(&rhs, &HALF_FIELD_PRIME) == [1, 0, 0, 0]
}

fn limbs_from_be(bytes: &[u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[24 - 8 * i..32 - 8 * i]);
        *limb = u64::from_be_bytes(word);
    }
    limbs
}

fn ge_field_prime(a: &[u64; 4]) -> bool {
    for i in (0..4).rev() {
        if a[i] != FIELD_PRIME[i] {
            return a[i] > FIELD_PRIME[i];
        }
    }
    true
}

/// `a - p`, for `p <= a < 2^256`.
fn sub_field_prime(a: &[u64; 4]) -> [u64; 4] {
    let mut out = [0u64; 4];
    let mut borrow = 0u64;
    for i in 0..4 {
        let (d, b1) = a[i].overflowing_sub(FIELD_PRIME[i]);
        let (d, b2) = d.overflowing_sub(borrow);
        out[i] = d;
        borrow = (b1 | b2) as u64;
    }
    out
}

/// `a + k mod p` for reduced `a`.
fn field_add_small(a: &[u64; 4], k: u64) -> [u64; 4] {
    let mut out = [0u64; 4];
    let mut carry = k as u128;
    for i in 0..4 {
        let t = a[i] as u128 + carry;
        out[i] = t as u64;
        carry = t >> 64;
    }
    // a < p and k is small, so the sum stays below 2^256.
    if ge_field_prime(&out) {
        sub_field_prime(&out)
    } else {
        out
    }
}

fn field_mul(a: &[u64; 4], b: &[u64; 4]) -> [u64; 4] {
    let mut wide = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0u128;
        for j in 0..4 {
            let t = wide[i + j] as u128 + (a[i] as u128) * (b[j] as u128) + carry;
            wide[i + j] = t as u64;
            carry = t >> 64;
        }
        wide[i + 4] = carry as u64;
    }
    field_reduce(&wide)
}

/// Reduce a 512-bit product using `2^256 ≡ FIELD_FOLD (mod p)`.
fn field_reduce(wide: &[u64; 8]) -> [u64; 4] {
    // lo + hi * FIELD_FOLD fits in five limbs.
    let mut folded = [0u64; 5];
    let mut carry = 0u128;
    for i in 0..4 {
        let t = wide[i] as u128 + (wide[i + 4] as u128) * FIELD_FOLD + carry;
        folded[i] = t as u64;
        carry = t >> 64;
    }
    folded[4] = carry as u64;

    let mut out = [0u64; 4];
    let mut carry = (folded[4] as u128) * FIELD_FOLD;
    for i in 0..4 {
        let t = folded[i] as u128 + carry;
        out[i] = t as u64;
        carry = t >> 64;
    }
    if carry != 0 {
        // Wrapped past 2^256; `out` is tiny here, so one more fold cannot overflow.
        let mut c = FIELD_FOLD;
        for limb in out.iter_mut() {
            let t = *limb as u128 + c;
            *limb = t as u64;
            c = t >> 64;
        }
    }

    if ge_field_prime(&out) {
        sub_field_prime(&out)
    } else {
        out
    }
}

fn field_pow(base: &[u64; 4], exponent: &[u64; 4]) -> [u64; 4] {
    let mut acc = [1u64, 0, 0, 0];
    for i in (0..4).rev() {
        for bit in (0..64).rev() {
            acc = field_mul(&acc, &acc);
            if (exponent[i] >> bit) & 1 == 1 {
                acc = field_mul(&acc, base);
            }
        }
    }
    acc
}
