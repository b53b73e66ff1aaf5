use super::TileError;
use crate::constants::{FILENAME_MASK1, FILENAME_MASK2};
use crate::coordinates::{TileId, TileKey};

/// Length of the hex hash prefix.
const PREFIX_LEN: usize = 4;
/// Maximum length of the `FILENAME_MASK2` suffix.
const SUFFIX_LEN: usize = 2;

/// `md5(id)[..4] ++ mask1(id) ++ last 2 chars of mask2(id)`, where the masks substitute each decimal digit of `id`.
pub fn encode_filename(id: TileId) -> String {
    let digits = id.to_string();
    let hash = format!("{:x}", md5::compute(digits.as_bytes()));
    let masked = mask_digits(&digits, FILENAME_MASK1);
    let suffix = mask_digits(&digits, FILENAME_MASK2);
    let suffix = &suffix[suffix.len().saturating_sub(SUFFIX_LEN)..];
    format!("{}{}{}", &hash[..PREFIX_LEN], masked, suffix)
}

/// Recovers the tile from the `FILENAME_MASK1` channel of `filename`. The hash prefix and the suffix are not checked.
pub fn decode_filename(filename: &str) -> Result<TileKey, TileError> {
    let bad_filename = || TileError::BadFilename(filename.to_owned());

    let body = filename.as_bytes().get(PREFIX_LEN..).ok_or_else(bad_filename)?;
    // Single digit ids only get a single suffix character.
    let digits = match body.len() {
        0 | 1 => return Err(bad_filename()),
        2 => &body[..1],
        n => &body[..n - SUFFIX_LEN],
    };

    let mut id: u64 = 0;
    for masked in digits {
        let digit = FILENAME_MASK1
            .iter()
            .position(|m| m == masked)
            .ok_or_else(bad_filename)?;
        id = id
            .checked_mul(10)
            .and_then(|id| id.checked_add(digit as u64))
            .ok_or(TileError::IdOutOfRange(u64::MAX))?;
    }

    TileId::try_from(id)
        .ok()
        .and_then(TileKey::from_id)
        .ok_or(TileError::IdOutOfRange(id))
}

fn mask_digits(digits: &str, mask: &[u8; 10]) -> String {
    digits
        .bytes()
        .map(|d| char::from(mask[usize::from(d - b'0')]))
        .collect()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
