//! Session codes and player handles.
//!
//! Both are short strings built from a clock reading: the current time in
//! microseconds seeds the first character, and each following character
//! mixes the previous one with the seed. If the result is already taken
//! the generator walks to the next candidate (odometer-style, starting at
//! the first character) and probes again, up to [`MAX_ATTEMPTS`] times.
//!
//! This is NOT cryptographic. Codes are easy to guess and must never be
//! treated as secrets or used for access control.

use std::time::{SystemTime, UNIX_EPOCH};

use livequiz_protocol::{PlayerHandle, SessionCode};

/// Length of a session code.
pub const SESSION_CODE_LEN: usize = 6;

/// Characters a session code is drawn from.
pub const SESSION_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a player handle.
pub const PLAYER_HANDLE_LEN: usize = 10;

/// Characters a player handle is drawn from.
pub const PLAYER_HANDLE_ALPHABET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Upper bound on candidates probed before giving up.
pub const MAX_ATTEMPTS: usize = 4096;

/// Returned when every probed candidate was taken.
///
/// With 36^6 possible codes this only happens when the caller's
/// `is_taken` is broken or the process holds an absurd number of
/// sessions. Treat it as fatal to the request, not to the process.
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier space exhausted after {attempts} attempts")]
    SpaceExhausted { attempts: usize },
}

/// Generates a session code that `is_taken` reports as free.
///
/// Call this while holding whatever lock guards the set `is_taken`
/// consults, and insert the result before releasing it.
pub fn generate_session_code(
    is_taken: impl FnMut(&str) -> bool,
) -> Result<SessionCode, IdentifierError> {
    let code = generate(
        SESSION_CODE_ALPHABET,
        SESSION_CODE_LEN,
        clock_seed(),
        &[],
        MAX_ATTEMPTS,
        is_taken,
    )?;
    Ok(SessionCode::from(code))
}

/// Generates a player handle that `is_taken` reports as free. The
/// player's name is mixed in so two players joining in the same
/// microsecond still start from different candidates.
pub fn generate_player_handle(
    name: &str,
    is_taken: impl FnMut(&str) -> bool,
) -> Result<PlayerHandle, IdentifierError> {
    let handle = generate(
        PLAYER_HANDLE_ALPHABET,
        PLAYER_HANDLE_LEN,
        clock_seed(),
        name.as_bytes(),
        MAX_ATTEMPTS,
        is_taken,
    )?;
    Ok(PlayerHandle::from(handle))
}

/// Microseconds since the Unix epoch.
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default()
}

fn generate(
    alphabet: &[u8],
    len: usize,
    seed: u64,
    salt: &[u8],
    max_attempts: usize,
    mut is_taken: impl FnMut(&str) -> bool,
) -> Result<String, IdentifierError> {
    let radix = alphabet.len() as u64;
    let mut digits = vec![0usize; len];

    digits[0] = (seed % radix) as usize;
    for i in 1..len {
        let prev = alphabet[digits[i - 1]] as u64;
        let salt_byte = match salt {
            [] => 0,
            _ => salt[i % salt.len()] as u64,
        };
        let mixed =
            (prev.wrapping_mul(seed) ^ (seed >> i)).wrapping_add(salt_byte.wrapping_mul(31));
        digits[i] = (mixed % radix) as usize;
    }

    for _ in 0..max_attempts {
        let candidate: String = digits.iter().map(|&d| alphabet[d] as char).collect();
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
        step(&mut digits, alphabet.len());
    }

    Err(IdentifierError::SpaceExhausted {
        attempts: max_attempts,
    })
}

/// Advances `digits` to the next candidate, carrying like an odometer.
/// Visits every combination once before repeating.
fn step(digits: &mut [usize], radix: usize) {
    for digit in digits.iter_mut() {
        *digit = (*digit + 1) % radix;
        if *digit != 0 {
            return;
        }
    }
}
