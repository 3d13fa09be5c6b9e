// Raffle Program - Utility Functions
use solana_program::pubkey::Pubkey;

/// Seed prefix of raffle accounts
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Find the program derived address of a raffle
pub fn find_raffle_address(program_id: &Pubkey, authority: &Pubkey, nonce: u64) -> (Pubkey, u8) {
    let nonce_bytes = nonce.to_le_bytes();
    Pubkey::find_program_address(&[RAFFLE_SEED, authority.as_ref(), &nonce_bytes], program_id)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}
