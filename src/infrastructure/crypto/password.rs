//! Password hashing utilities

use bcrypt::{hash, verify};

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

// Full cost makes the in-memory test suites crawl
#[cfg(not(test))]
fn cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Lowest cost bcrypt accepts
#[cfg(test)]
const TEST_COST: u32 = 4;

#[cfg(test)]
fn cost() -> u32 {
    TEST_COST
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hashed = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hashed).unwrap());
        assert!(!verify_password("hunter23", &hashed).unwrap());
    }

    #[test]
    fn test_builds_hash_at_the_lowest_cost() {
        let hashed = hash_password("hunter22").unwrap();
        assert!(hashed.starts_with("$2b$04$"), "{hashed}");
    }
}
