//! Content hashing for photo deduplication.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};

use crate::error::StoreResult;

/// Compute the dedup hash of an image: SHA-256 over a canonical lossless
/// PNG re-encoding of the decoded pixels.
///
/// Hashing the re-encoded pixels (rather than the original upload bytes)
/// makes byte-different containers of the same content collide. Two
/// encodings that decode to fractionally different pixels (e.g. chroma
/// subsampling) still hash differently; that is accepted behavior.
pub fn content_hash(image: &DynamicImage) -> StoreResult<String> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;

    let digest = Sha256::digest(&buf);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn test_identical_pixels_hash_identically() {
        let a = solid(4, 4, [200, 10, 10]);
        let b = solid(4, 4, [200, 10, 10]);
        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_different_pixels_hash_differently() {
        let a = solid(4, 4, [200, 10, 10]);
        let b = solid(4, 4, [10, 200, 10]);
        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = content_hash(&solid(2, 2, [0, 0, 0])).unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
