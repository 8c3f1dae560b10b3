use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use time::{Duration, OffsetDateTime};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Usernames are alphanumeric, 3 to 30 characters.
pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9]{3,30}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub(crate) fn is_valid_password(password: &str) -> bool {
    password.len() >= 8
}

/// Six-digit reset code. Takes the RNG as a parameter so tests can seed it.
pub(crate) fn generate_otp<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:06}", rng.gen_range(0..1_000_000u32))
}

pub(crate) fn otp_expiry(ttl_minutes: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes)
}
