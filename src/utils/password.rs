use pbkdf2::Pbkdf2;
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;

// Moins d'itérations dans les tests: PBKDF2 en debug est très lent
#[cfg(not(test))]
const ITERATIONS: u32 = 260000;
#[cfg(test)]
const ITERATIONS: u32 = 1000;
const KEY_LENGTH: usize = 32;

/// Hash un secret (mot de passe, OTP, token de reset) en PBKDF2-HMAC-SHA256
/// avec un salt aléatoire de 16 bytes.
/// Format PHC: $pbkdf2-sha256$i=260000,l=32$salt$hash
pub fn hash_password(password: &str) -> Result<String, String> {
    // Générer un salt aléatoire de 16 bytes
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| format!("Invalid salt: {}", e))?;

    let params = pbkdf2::Params {
        rounds: ITERATIONS,
        output_length: KEY_LENGTH,
    };

    Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("Failed to hash password: {}", e))
}

/// Vérifie un secret contre un hash PHC.
/// Les itérations sont lues dans le hash; la comparaison est en temps constant.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| format!("Invalid hash format: {}", e))?;

    Ok(Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok())
}
