// Random hex id generation

use rand::RngCore;

use crate::constants::ID_RANDOM_BYTES;

/// Generate an opaque id: `<prefix><unix millis in hex><random hex>`.
pub fn generate_id(prefix: &str) -> String {
    let mut bytes = [0u8; ID_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let random: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    let millis = chrono::Utc::now().timestamp_millis().max(0);

    format!("{}{:x}{}", prefix, millis, random)
}
